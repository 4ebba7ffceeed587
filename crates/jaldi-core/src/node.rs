//! Node types for the builder canvas.
//!
//! On the wire a node is `{id, type, position, data, zIndex?}` where `type`
//! is a string tag and `data` an untyped object. In memory the tag and the
//! data bag are folded into one closed sum type, [`NodeBody`], with an
//! explicit data schema per variant. Submitted graphs are read leniently:
//! a field that does not fit its schema is dropped and logged, so one bad
//! field never costs the rest of the graph. Editor changes go through the
//! strict [`NodeBody::from_data`] instead.

use std::fmt;

use serde::de::DeserializeOwned;
use serde::{Deserialize, Deserializer, Serialize};
use serde_json::{Map, Value};

use crate::error::CoreError;
use crate::id::NodeId;

// ---------------------------------------------------------------------------
// Geometry
// ---------------------------------------------------------------------------

/// Canvas position of a node's top-left corner.
#[derive(Debug, Clone, Copy, PartialEq, Default, Serialize, Deserialize)]
#[serde(default)]
pub struct Position {
    pub x: f64,
    pub y: f64,
}

impl Position {
    pub fn new(x: f64, y: f64) -> Self {
        Position { x, y }
    }

    /// Coordinates rounded to the nearest integer, halves rounding up.
    pub fn rounded(&self) -> (i64, i64) {
        (round_half_up(self.x), round_half_up(self.y))
    }
}

fn round_half_up(v: f64) -> i64 {
    (v + 0.5).floor() as i64
}

/// Rendered size of a visual node.
#[derive(Debug, Clone, Copy, PartialEq, Default, Serialize, Deserialize)]
#[serde(default)]
pub struct Size {
    pub width: f64,
    pub height: f64,
}

// ---------------------------------------------------------------------------
// Kinds
// ---------------------------------------------------------------------------

/// Form controls that can carry a database column mapping.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum FormControl {
    Input,
    Select,
    Radio,
    Checkbox,
    Textarea,
}

/// Presentational elements placed on a page.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum UiWidget {
    Button,
    Text,
    Image,
    Link,
}

/// The kind of a node, parsed from its wire `type` tag.
///
/// Unrecognized tags are kept verbatim in [`NodeKind::Unknown`] so they can
/// be reported instead of silently dropped.
#[derive(Debug, Clone, PartialEq, Eq, Hash)]
pub enum NodeKind {
    Page,
    Form(FormControl),
    Ui(UiWidget),
    Api,
    Database,
    Validation,
    Unknown(String),
}

impl NodeKind {
    /// Parses a wire `type` tag.
    pub fn from_tag(tag: &str) -> Self {
        match tag {
            "pageNode" => NodeKind::Page,
            "inputElement" => NodeKind::Form(FormControl::Input),
            "selectElement" => NodeKind::Form(FormControl::Select),
            "radioElement" => NodeKind::Form(FormControl::Radio),
            "checkboxElement" => NodeKind::Form(FormControl::Checkbox),
            "textareaElement" => NodeKind::Form(FormControl::Textarea),
            "buttonElement" => NodeKind::Ui(UiWidget::Button),
            "textElement" => NodeKind::Ui(UiWidget::Text),
            "imageElement" => NodeKind::Ui(UiWidget::Image),
            "linkElement" => NodeKind::Ui(UiWidget::Link),
            "apiNode" => NodeKind::Api,
            "databaseNode" => NodeKind::Database,
            "validationNode" => NodeKind::Validation,
            other => NodeKind::Unknown(other.to_string()),
        }
    }

    /// The wire `type` tag for this kind.
    pub fn tag(&self) -> &str {
        match self {
            NodeKind::Page => "pageNode",
            NodeKind::Form(FormControl::Input) => "inputElement",
            NodeKind::Form(FormControl::Select) => "selectElement",
            NodeKind::Form(FormControl::Radio) => "radioElement",
            NodeKind::Form(FormControl::Checkbox) => "checkboxElement",
            NodeKind::Form(FormControl::Textarea) => "textareaElement",
            NodeKind::Ui(UiWidget::Button) => "buttonElement",
            NodeKind::Ui(UiWidget::Text) => "textElement",
            NodeKind::Ui(UiWidget::Image) => "imageElement",
            NodeKind::Ui(UiWidget::Link) => "linkElement",
            NodeKind::Api => "apiNode",
            NodeKind::Database => "databaseNode",
            NodeKind::Validation => "validationNode",
            NodeKind::Unknown(tag) => tag,
        }
    }

    /// Prefix used for editor-allocated ids of this kind.
    pub fn id_prefix(&self) -> &'static str {
        match self {
            NodeKind::Page => "page",
            NodeKind::Form(_) | NodeKind::Ui(_) => "ui",
            NodeKind::Api => "api",
            NodeKind::Database => "db",
            NodeKind::Validation => "validation",
            NodeKind::Unknown(_) => "node",
        }
    }

    /// Data a freshly placed node of this kind starts with.
    pub fn default_data(&self) -> Value {
        let (label, extra) = match self {
            NodeKind::Page => ("New Page", serde_json::json!({ "route": "/" })),
            NodeKind::Form(FormControl::Input) => {
                ("Text Input", serde_json::json!({ "placeholder": "Enter text..." }))
            }
            NodeKind::Form(FormControl::Select) => (
                "Select",
                serde_json::json!({ "options": ["Option 1", "Option 2"] }),
            ),
            NodeKind::Form(FormControl::Radio) => (
                "Radio Group",
                serde_json::json!({ "options": ["Option 1", "Option 2"] }),
            ),
            NodeKind::Form(FormControl::Checkbox) => ("Checkbox", serde_json::json!({})),
            NodeKind::Form(FormControl::Textarea) => {
                ("Text Area", serde_json::json!({ "placeholder": "Enter text..." }))
            }
            NodeKind::Ui(UiWidget::Button) => ("Button", serde_json::json!({ "text": "Click me" })),
            NodeKind::Ui(UiWidget::Text) => ("Text", serde_json::json!({ "text": "Text block" })),
            NodeKind::Ui(UiWidget::Image) => ("Image", serde_json::json!({})),
            NodeKind::Ui(UiWidget::Link) => ("Link", serde_json::json!({ "href": "#" })),
            NodeKind::Api => (
                "API Endpoint",
                serde_json::json!({ "endpoint": "/api/submit", "method": "POST" }),
            ),
            NodeKind::Database => ("Database Table", serde_json::json!({})),
            NodeKind::Validation => ("Validation", serde_json::json!({ "rules": ["required"] })),
            NodeKind::Unknown(_) => return Value::Object(Map::new()),
        };
        let mut data = match extra {
            Value::Object(map) => map,
            _ => Map::new(),
        };
        data.insert("label".to_string(), Value::String(label.to_string()));
        Value::Object(data)
    }
}

impl fmt::Display for NodeKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.tag())
    }
}

// ---------------------------------------------------------------------------
// Per-kind data schemas
// ---------------------------------------------------------------------------

/// Data carried by a page node.
#[derive(Debug, Clone, PartialEq, Default, Serialize, Deserialize)]
#[serde(default, rename_all = "camelCase")]
pub struct PageData {
    #[serde(skip_serializing_if = "Option::is_none")]
    pub label: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub title: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub route: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub size: Option<Size>,
}

/// Maps a form control onto a column of a database table.
#[derive(Debug, Clone, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(default)]
pub struct DatabaseMapping {
    pub table: String,
    pub column: String,
}

/// One entry in a select/radio options list.
///
/// The canvas emits either bare strings or `{label, value}` objects.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(untagged)]
pub enum FieldOption {
    Text(String),
    Labeled {
        label: String,
        #[serde(default, skip_serializing_if = "Option::is_none")]
        value: Option<Value>,
    },
}

impl FieldOption {
    /// The human-readable text of this option.
    pub fn label(&self) -> &str {
        match self {
            FieldOption::Text(text) => text,
            FieldOption::Labeled { label, .. } => label,
        }
    }
}

/// Data carried by a form control.
#[derive(Debug, Clone, PartialEq, Default, Serialize, Deserialize)]
#[serde(default, rename_all = "camelCase")]
pub struct FormFieldData {
    #[serde(skip_serializing_if = "Option::is_none")]
    pub label: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub placeholder: Option<String>,
    #[serde(deserialize_with = "truthy", skip_serializing_if = "is_false")]
    pub required: bool,
    #[serde(skip_serializing_if = "Vec::is_empty")]
    pub options: Vec<FieldOption>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub database: Option<DatabaseMapping>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub size: Option<Size>,
}

/// Data carried by a presentational element.
#[derive(Debug, Clone, PartialEq, Default, Serialize, Deserialize)]
#[serde(default, rename_all = "camelCase")]
pub struct UiData {
    #[serde(skip_serializing_if = "Option::is_none")]
    pub label: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub text: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub src: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub href: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub size: Option<Size>,
}

/// Data carried by an API endpoint node.
#[derive(Debug, Clone, PartialEq, Default, Serialize, Deserialize)]
#[serde(default, rename_all = "camelCase")]
pub struct ApiData {
    #[serde(skip_serializing_if = "Option::is_none")]
    pub label: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub endpoint: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub method: Option<String>,
}

/// Data carried by a database table node.
#[derive(Debug, Clone, PartialEq, Default, Serialize, Deserialize)]
#[serde(default, rename_all = "camelCase")]
pub struct DatabaseData {
    #[serde(skip_serializing_if = "Option::is_none")]
    pub label: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub table: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub connection_string: Option<String>,
}

/// Data carried by a validation node.
#[derive(Debug, Clone, PartialEq, Default, Serialize, Deserialize)]
#[serde(default, rename_all = "camelCase")]
pub struct ValidationData {
    #[serde(skip_serializing_if = "Option::is_none")]
    pub label: Option<String>,
    #[serde(skip_serializing_if = "Vec::is_empty")]
    pub rules: Vec<String>,
}

/// Reads a flag the way the canvas treats it: `false`, `null`, `0`, `NaN`
/// and `""` are false, anything else is true.
fn truthy<'de, D: Deserializer<'de>>(deserializer: D) -> Result<bool, D::Error> {
    Ok(match Value::deserialize(deserializer)? {
        Value::Null => false,
        Value::Bool(b) => b,
        Value::Number(n) => n.as_f64().is_some_and(|f| f != 0.0 && !f.is_nan()),
        Value::String(s) => !s.is_empty(),
        Value::Array(_) | Value::Object(_) => true,
    })
}

fn is_false(b: &bool) -> bool {
    !*b
}

// ---------------------------------------------------------------------------
// NodeBody
// ---------------------------------------------------------------------------

/// A node's kind together with its validated data.
#[derive(Debug, Clone, PartialEq)]
pub enum NodeBody {
    Page(PageData),
    Form(FormControl, FormFieldData),
    Ui(UiWidget, UiData),
    Api(ApiData),
    Database(DatabaseData),
    Validation(ValidationData),
    /// A node whose tag is not recognized. Its data is kept as-is.
    Unknown { tag: String, data: Map<String, Value> },
}

impl NodeBody {
    /// Validates `data` against the schema for `kind`.
    ///
    /// `null` is treated as an empty object and missing fields are absent.
    /// Fields of the wrong type and unusable database mappings are an
    /// error.
    pub fn from_data(id: &NodeId, kind: &NodeKind, data: Value) -> Result<Self, CoreError> {
        let object = match data {
            Value::Null => Map::new(),
            Value::Object(map) => map,
            other => {
                return Err(CoreError::invalid_data(
                    id,
                    kind.tag(),
                    format!("data must be an object, found {}", json_type(&other)),
                ))
            }
        };

        let body = match kind {
            NodeKind::Page => NodeBody::Page(parse(id, kind, object)?),
            NodeKind::Form(control) => {
                let mut field: FormFieldData = parse(id, kind, object)?;
                if let Some(mapping) = field.database.take() {
                    field.database = check_mapping(mapping)
                        .map_err(|reason| CoreError::invalid_data(id, kind.tag(), reason))?;
                }
                NodeBody::Form(*control, field)
            }
            NodeKind::Ui(widget) => NodeBody::Ui(*widget, parse(id, kind, object)?),
            NodeKind::Api => NodeBody::Api(parse(id, kind, object)?),
            NodeKind::Database => NodeBody::Database(parse(id, kind, object)?),
            NodeKind::Validation => NodeBody::Validation(parse(id, kind, object)?),
            NodeKind::Unknown(tag) => NodeBody::Unknown {
                tag: tag.clone(),
                data: object,
            },
        };
        Ok(body)
    }

    /// Reads submitted `data` for `kind`, omitting whatever does not fit.
    ///
    /// Each field that fails its schema is dropped with a warning, an
    /// unusable database mapping becomes no mapping, and data that is not
    /// an object reads as empty.
    pub fn from_data_lossy(id: &NodeId, kind: &NodeKind, data: Value) -> Self {
        let object = match data {
            Value::Null => Map::new(),
            Value::Object(map) => map,
            other => {
                tracing::warn!(node = %id, kind = %kind, "ignoring data: {} is not an object", json_type(&other));
                Map::new()
            }
        };

        match kind {
            NodeKind::Page => NodeBody::Page(parse_lossy(id, kind, object)),
            NodeKind::Form(control) => {
                let mut field: FormFieldData = parse_lossy(id, kind, object);
                field.database = field
                    .database
                    .take()
                    .and_then(|mapping| match check_mapping(mapping) {
                        Ok(mapping) => mapping,
                        Err(reason) => {
                            tracing::warn!(node = %id, kind = %kind, "ignoring database mapping: {}", reason);
                            None
                        }
                    });
                NodeBody::Form(*control, field)
            }
            NodeKind::Ui(widget) => NodeBody::Ui(*widget, parse_lossy(id, kind, object)),
            NodeKind::Api => NodeBody::Api(parse_lossy(id, kind, object)),
            NodeKind::Database => NodeBody::Database(parse_lossy(id, kind, object)),
            NodeKind::Validation => NodeBody::Validation(parse_lossy(id, kind, object)),
            NodeKind::Unknown(tag) => NodeBody::Unknown {
                tag: tag.clone(),
                data: object,
            },
        }
    }

    /// The kind this body belongs to.
    pub fn kind(&self) -> NodeKind {
        match self {
            NodeBody::Page(_) => NodeKind::Page,
            NodeBody::Form(control, _) => NodeKind::Form(*control),
            NodeBody::Ui(widget, _) => NodeKind::Ui(*widget),
            NodeBody::Api(_) => NodeKind::Api,
            NodeBody::Database(_) => NodeKind::Database,
            NodeBody::Validation(_) => NodeKind::Validation,
            NodeBody::Unknown { tag, .. } => NodeKind::Unknown(tag.clone()),
        }
    }

    /// The data object as sent on the wire.
    pub fn to_data(&self) -> Value {
        let value = match self {
            NodeBody::Page(data) => serde_json::to_value(data),
            NodeBody::Form(_, data) => serde_json::to_value(data),
            NodeBody::Ui(_, data) => serde_json::to_value(data),
            NodeBody::Api(data) => serde_json::to_value(data),
            NodeBody::Database(data) => serde_json::to_value(data),
            NodeBody::Validation(data) => serde_json::to_value(data),
            NodeBody::Unknown { data, .. } => return Value::Object(data.clone()),
        };
        value.unwrap_or_default()
    }

    /// The user-facing label, if one was set.
    pub fn label(&self) -> Option<&str> {
        let label = match self {
            NodeBody::Page(data) => data.label.as_deref(),
            NodeBody::Form(_, data) => data.label.as_deref(),
            NodeBody::Ui(_, data) => data.label.as_deref(),
            NodeBody::Api(data) => data.label.as_deref(),
            NodeBody::Database(data) => data.label.as_deref(),
            NodeBody::Validation(data) => data.label.as_deref(),
            NodeBody::Unknown { data, .. } => data.get("label").and_then(Value::as_str),
        };
        label.filter(|l| !l.is_empty())
    }

    /// The rendered size, for kinds that have one.
    pub fn size(&self) -> Option<Size> {
        match self {
            NodeBody::Page(data) => data.size,
            NodeBody::Form(_, data) => data.size,
            NodeBody::Ui(_, data) => data.size,
            _ => None,
        }
    }
}

fn parse<T: DeserializeOwned>(
    id: &NodeId,
    kind: &NodeKind,
    object: Map<String, Value>,
) -> Result<T, CoreError> {
    serde_json::from_value(Value::Object(object))
        .map_err(|e| CoreError::invalid_data(id, kind.tag(), e.to_string()))
}

/// Parses `object`, dropping each field that does not fit `T` on its own.
fn parse_lossy<T: DeserializeOwned + Default>(
    id: &NodeId,
    kind: &NodeKind,
    mut object: Map<String, Value>,
) -> T {
    if let Ok(parsed) = serde_json::from_value(Value::Object(object.clone())) {
        return parsed;
    }
    object.retain(|field, value| {
        let alone: Map<String, Value> = [(field.clone(), value.clone())].into_iter().collect();
        let fits = serde_json::from_value::<T>(Value::Object(alone)).is_ok();
        if !fits {
            tracing::warn!(node = %id, kind = %kind, field = %field, "dropping malformed field");
        }
        fits
    });
    serde_json::from_value(Value::Object(object)).unwrap_or_default()
}

/// Normalizes a mapping. Both halves blank is no mapping; a partial
/// mapping or a name that is not a plain SQL identifier is an error.
fn check_mapping(mapping: DatabaseMapping) -> Result<Option<DatabaseMapping>, String> {
    let table = mapping.table.trim();
    let column = mapping.column.trim();
    match (table.is_empty(), column.is_empty()) {
        (true, true) => return Ok(None),
        (true, false) => return Err("database mapping has no table".to_string()),
        (false, true) => return Err("database mapping has no column".to_string()),
        (false, false) => {}
    }
    for name in [table, column] {
        if !is_sql_identifier(name) {
            return Err(format!("'{}' is not a valid SQL identifier", name));
        }
    }
    Ok(Some(DatabaseMapping {
        table: table.to_string(),
        column: column.to_string(),
    }))
}

fn is_sql_identifier(name: &str) -> bool {
    let mut chars = name.chars();
    match chars.next() {
        Some(c) if c.is_ascii_alphabetic() || c == '_' => {}
        _ => return false,
    }
    chars.all(|c| c.is_ascii_alphanumeric() || c == '_')
}

fn json_type(value: &Value) -> &'static str {
    match value {
        Value::Null => "null",
        Value::Bool(_) => "a boolean",
        Value::Number(_) => "a number",
        Value::String(_) => "a string",
        Value::Array(_) => "an array",
        Value::Object(_) => "an object",
    }
}

// ---------------------------------------------------------------------------
// Node
// ---------------------------------------------------------------------------

/// A node on the canvas.
///
/// Deserializing never fails on the contents of `data`; see
/// [`NodeBody::from_data_lossy`].
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(from = "WireNode", into = "WireNode")]
pub struct Node {
    pub id: NodeId,
    pub position: Position,
    /// Stacking order; higher renders above lower.
    pub z_index: Option<i64>,
    pub body: NodeBody,
}

impl Node {
    /// Builds a node, validating `data` against the schema for `kind`.
    pub fn new(
        id: NodeId,
        kind: &NodeKind,
        position: Position,
        data: Value,
    ) -> Result<Self, CoreError> {
        let body = NodeBody::from_data(&id, kind, data)?;
        Ok(Node {
            id,
            position,
            z_index: None,
            body,
        })
    }

    pub fn kind(&self) -> NodeKind {
        self.body.kind()
    }

    pub fn label(&self) -> Option<&str> {
        self.body.label()
    }
}

#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
struct WireNode {
    id: NodeId,
    #[serde(rename = "type")]
    kind: String,
    #[serde(default)]
    position: Position,
    #[serde(default)]
    data: Value,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    z_index: Option<i64>,
}

impl From<WireNode> for Node {
    fn from(wire: WireNode) -> Self {
        let kind = NodeKind::from_tag(&wire.kind);
        let body = NodeBody::from_data_lossy(&wire.id, &kind, wire.data);
        Node {
            id: wire.id,
            position: wire.position,
            z_index: wire.z_index,
            body,
        }
    }
}

impl From<Node> for WireNode {
    fn from(node: Node) -> Self {
        WireNode {
            kind: node.body.kind().tag().to_string(),
            data: node.body.to_data(),
            id: node.id,
            position: node.position,
            z_index: node.z_index,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    fn node(value: Value) -> Result<Node, serde_json::Error> {
        serde_json::from_value(value)
    }

    #[test]
    fn every_known_tag_roundtrips() {
        let tags = [
            "pageNode",
            "inputElement",
            "selectElement",
            "radioElement",
            "checkboxElement",
            "textareaElement",
            "buttonElement",
            "textElement",
            "imageElement",
            "linkElement",
            "apiNode",
            "databaseNode",
            "validationNode",
        ];
        for tag in tags {
            let kind = NodeKind::from_tag(tag);
            assert!(!matches!(kind, NodeKind::Unknown(_)), "{tag} parsed as unknown");
            assert_eq!(kind.tag(), tag);
        }
    }

    #[test]
    fn unknown_tag_is_kept_verbatim() {
        let n = node(json!({
            "id": "x-1",
            "type": "carouselElement",
            "data": { "label": "Hero", "slides": 3 }
        }))
        .unwrap();
        assert_eq!(n.kind(), NodeKind::Unknown("carouselElement".to_string()));
        assert_eq!(n.label(), Some("Hero"));
        let back = serde_json::to_value(&n).unwrap();
        assert_eq!(back["type"], "carouselElement");
        assert_eq!(back["data"]["slides"], 3);
    }

    #[test]
    fn form_field_parses_mapping_and_flags() {
        let n = node(json!({
            "id": "ui-1",
            "type": "inputElement",
            "position": { "x": 10.4, "y": 20.5 },
            "data": {
                "label": "Username",
                "required": true,
                "database": { "table": "users", "column": "username" }
            }
        }))
        .unwrap();
        let NodeBody::Form(FormControl::Input, field) = &n.body else {
            panic!("expected an input element, got {:?}", n.body);
        };
        assert!(field.required);
        assert_eq!(
            field.database,
            Some(DatabaseMapping {
                table: "users".to_string(),
                column: "username".to_string()
            })
        );
        assert_eq!(n.position.rounded(), (10, 21));
    }

    #[test]
    fn missing_data_degrades_to_defaults() {
        let n = node(json!({ "id": "ui-2", "type": "checkboxElement" })).unwrap();
        assert_eq!(n.position, Position::default());
        assert_eq!(n.label(), None);
        let NodeBody::Form(_, field) = &n.body else {
            panic!("expected a form element");
        };
        assert!(!field.required);
        assert!(field.database.is_none());
    }

    #[test]
    fn null_required_is_false() {
        let n = node(json!({ "id": "a", "type": "inputElement", "data": { "required": null } }))
            .unwrap();
        let NodeBody::Form(_, field) = &n.body else {
            panic!("expected a form element");
        };
        assert!(!field.required);
    }

    #[test]
    fn required_follows_truthiness() {
        let cases = [
            (json!(1), true),
            (json!("yes"), true),
            (json!([]), true),
            (json!(0), false),
            (json!(""), false),
            (json!(false), false),
        ];
        for (value, expected) in cases {
            let n = node(json!({ "id": "a", "type": "inputElement", "data": { "required": value.clone() } }))
                .unwrap();
            let NodeBody::Form(_, field) = &n.body else {
                panic!("expected a form element");
            };
            assert_eq!(field.required, expected, "required: {value}");
        }
    }

    #[test]
    fn malformed_fields_are_dropped_on_read() {
        let n = node(json!({
            "id": "ui-3",
            "type": "selectElement",
            "data": { "label": 42, "placeholder": "Pick", "options": [1, 2] }
        }))
        .unwrap();
        let NodeBody::Form(_, field) = &n.body else {
            panic!("expected a form element");
        };
        assert_eq!(n.label(), None);
        assert!(field.options.is_empty());
        assert_eq!(field.placeholder.as_deref(), Some("Pick"));
    }

    #[test]
    fn non_object_data_reads_as_empty() {
        let n = node(json!({ "id": "p", "type": "pageNode", "data": [1, 2] })).unwrap();
        assert_eq!(n.body, NodeBody::Page(PageData::default()));
    }

    #[test]
    fn unusable_mappings_are_dropped_on_read() {
        for database in [
            json!({ "table": "users" }),
            json!({ "table": "user-profiles", "column": "name" }),
            json!({ "table": 7, "column": "name" }),
        ] {
            let n = node(json!({
                "id": "ui-1",
                "type": "inputElement",
                "data": { "label": "Name", "database": database.clone() }
            }))
            .unwrap();
            let NodeBody::Form(_, field) = &n.body else {
                panic!("expected a form element");
            };
            assert!(field.database.is_none(), "{database}");
            assert_eq!(n.label(), Some("Name"));
        }
    }

    #[test]
    fn strict_data_rejects_wrong_types() {
        let err = NodeBody::from_data(
            &NodeId::from("ui-3"),
            &NodeKind::Form(FormControl::Input),
            json!({ "label": 42 }),
        )
        .unwrap_err();
        assert!(err.to_string().contains("ui-3"), "{err}");

        let err = NodeBody::from_data(&NodeId::from("p"), &NodeKind::Page, json!([1, 2]))
            .unwrap_err();
        assert!(matches!(err, CoreError::InvalidNodeData { .. }));
    }

    #[test]
    fn strict_blank_mapping_is_absent_but_partial_is_rejected() {
        let kind = NodeKind::Form(FormControl::Input);
        let id = NodeId::from("ui-1");

        let blank = NodeBody::from_data(
            &id,
            &kind,
            json!({ "database": { "table": "", "column": " " } }),
        )
        .unwrap();
        let NodeBody::Form(_, field) = blank else {
            panic!("expected a form element");
        };
        assert!(field.database.is_none());

        let partial =
            NodeBody::from_data(&id, &kind, json!({ "database": { "table": "users" } }));
        assert!(partial.is_err());

        let injected = NodeBody::from_data(
            &id,
            &kind,
            json!({ "database": { "table": "users; DROP", "column": "name" } }),
        );
        assert!(injected.is_err());
    }

    #[test]
    fn options_accept_strings_and_objects() {
        let n = node(json!({
            "id": "ui-4",
            "type": "selectElement",
            "data": { "options": ["Red", { "label": "Blue", "value": "b" }] }
        }))
        .unwrap();
        let NodeBody::Form(_, field) = &n.body else {
            panic!("expected a form element");
        };
        let labels: Vec<&str> = field.options.iter().map(FieldOption::label).collect();
        assert_eq!(labels, ["Red", "Blue"]);
    }

    #[test]
    fn serializes_back_to_wire_shape() {
        let mut n = Node::new(
            NodeId::from("api-1"),
            &NodeKind::Api,
            Position::new(1.0, 2.0),
            json!({ "endpoint": "/api/users", "method": "POST" }),
        )
        .unwrap();
        n.z_index = Some(3);
        let wire = serde_json::to_value(&n).unwrap();
        assert_eq!(
            wire,
            json!({
                "id": "api-1",
                "type": "apiNode",
                "position": { "x": 1.0, "y": 2.0 },
                "data": { "endpoint": "/api/users", "method": "POST" },
                "zIndex": 3
            })
        );
    }

    #[test]
    fn rounding_matches_half_up() {
        assert_eq!(Position::new(2.5, -2.5).rounded(), (3, -2));
        assert_eq!(Position::new(-0.4, 99.49).rounded(), (0, 99));
    }

    #[test]
    fn default_data_validates_for_every_kind() {
        let kinds = [
            NodeKind::Page,
            NodeKind::Form(FormControl::Select),
            NodeKind::Ui(UiWidget::Link),
            NodeKind::Api,
            NodeKind::Database,
            NodeKind::Validation,
            NodeKind::Unknown("custom".to_string()),
        ];
        for kind in kinds {
            let body = NodeBody::from_data(&NodeId::from("n"), &kind, kind.default_data());
            assert!(body.is_ok(), "{kind}: {body:?}");
        }
    }
}
