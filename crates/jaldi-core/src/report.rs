//! Plain-text report generation for a submitted graph.
//!
//! [`generate`] classifies nodes into fixed buckets, renders one section
//! per bucket plus the connections and the inferred SQL schema, and counts
//! everything. The output depends only on the graph and the timestamp it is
//! given, so two submissions of the same graph differ only in the
//! `Generated:` line.

use std::collections::HashSet;

use chrono::{DateTime, SecondsFormat, Utc};
use serde::{Deserialize, Serialize};

use crate::graph::{Edge, Graph};
use crate::id::NodeId;
use crate::node::{Node, NodeBody, Size};
use crate::schema::{infer_tables, TableSchema};

const WIDTH: usize = 80;

/// Report section a node is listed under.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum Bucket {
    Pages,
    FormElements,
    UiElements,
    ApiElements,
    DatabaseElements,
}

impl Bucket {
    pub const ALL: [Bucket; 5] = [
        Bucket::Pages,
        Bucket::FormElements,
        Bucket::UiElements,
        Bucket::ApiElements,
        Bucket::DatabaseElements,
    ];

    /// The bucket for a node, or `None` for kinds the report does not list.
    pub fn of(body: &NodeBody) -> Option<Bucket> {
        match body {
            NodeBody::Page(_) => Some(Bucket::Pages),
            NodeBody::Form(..) => Some(Bucket::FormElements),
            NodeBody::Ui(..) => Some(Bucket::UiElements),
            NodeBody::Api(_) => Some(Bucket::ApiElements),
            NodeBody::Database(_) => Some(Bucket::DatabaseElements),
            NodeBody::Validation(_) | NodeBody::Unknown { .. } => None,
        }
    }

    fn title(self) -> &'static str {
        match self {
            Bucket::Pages => "PAGES",
            Bucket::FormElements => "FORM ELEMENTS",
            Bucket::UiElements => "UI ELEMENTS",
            Bucket::ApiElements => "API ELEMENTS",
            Bucket::DatabaseElements => "DATABASE ELEMENTS",
        }
    }

    fn noun(self) -> &'static str {
        match self {
            Bucket::Pages => "pages",
            Bucket::FormElements => "form elements",
            Bucket::UiElements => "UI elements",
            Bucket::ApiElements => "API elements",
            Bucket::DatabaseElements => "database elements",
        }
    }
}

/// Counts returned alongside the report.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct GenerationStats {
    pub total_elements: usize,
    pub pages: usize,
    pub form_elements: usize,
    pub ui_elements: usize,
    pub api_elements: usize,
    pub database_elements: usize,
    pub connections: usize,
    /// Nodes listed in no bucket (validation and unrecognized kinds).
    #[serde(default)]
    pub unclassified: usize,
}

/// Output of [`generate`].
#[derive(Debug, Clone)]
pub struct GeneratedReport {
    pub text: String,
    pub stats: GenerationStats,
    pub tables: Vec<TableSchema>,
}

/// Nodes partitioned by bucket, each list in graph order.
#[derive(Debug, Default)]
pub struct Classified<'a> {
    pub pages: Vec<&'a Node>,
    pub form_elements: Vec<&'a Node>,
    pub ui_elements: Vec<&'a Node>,
    pub api_elements: Vec<&'a Node>,
    pub database_elements: Vec<&'a Node>,
    pub unclassified: Vec<&'a Node>,
}

impl<'a> Classified<'a> {
    pub fn bucket(&self, bucket: Bucket) -> &[&'a Node] {
        match bucket {
            Bucket::Pages => &self.pages,
            Bucket::FormElements => &self.form_elements,
            Bucket::UiElements => &self.ui_elements,
            Bucket::ApiElements => &self.api_elements,
            Bucket::DatabaseElements => &self.database_elements,
        }
    }
}

/// Partitions the graph's nodes into report buckets.
pub fn classify(graph: &Graph) -> Classified<'_> {
    let mut classified = Classified::default();
    for node in &graph.nodes {
        match Bucket::of(&node.body) {
            Some(Bucket::Pages) => classified.pages.push(node),
            Some(Bucket::FormElements) => classified.form_elements.push(node),
            Some(Bucket::UiElements) => classified.ui_elements.push(node),
            Some(Bucket::ApiElements) => classified.api_elements.push(node),
            Some(Bucket::DatabaseElements) => classified.database_elements.push(node),
            None => {
                tracing::warn!(node = %node.id, kind = %node.kind(), "node kind has no report section");
                classified.unclassified.push(node);
            }
        }
    }
    classified
}

/// Renders the report for `graph`, stamped with `generated_at`.
pub fn generate(graph: &Graph, generated_at: DateTime<Utc>) -> GeneratedReport {
    for id in graph.duplicate_node_ids() {
        tracing::warn!(node = %id, "duplicate node id; connections resolve to the first");
    }
    for edge in graph.dangling_edges() {
        tracing::debug!(edge = %edge.id, source = %edge.source, target = %edge.target, "dangling edge");
    }

    let classified = classify(graph);
    let tables = infer_tables(classified.form_elements.iter().copied());
    let stats = GenerationStats {
        total_elements: graph.nodes.len(),
        pages: classified.pages.len(),
        form_elements: classified.form_elements.len(),
        ui_elements: classified.ui_elements.len(),
        api_elements: classified.api_elements.len(),
        database_elements: classified.database_elements.len(),
        connections: graph.edges.len(),
        unclassified: classified.unclassified.len(),
    };

    let mut out = ReportBuilder::default();
    out.banner("WEBSITE BUILDER GENERATION REPORT");
    out.line(format!(
        "Generated: {}",
        generated_at.to_rfc3339_opts(SecondsFormat::Secs, true)
    ));
    out.blank();
    render_summary(&mut out, &stats);

    for bucket in Bucket::ALL {
        render_bucket(&mut out, bucket, classified.bucket(bucket));
    }
    if !classified.unclassified.is_empty() {
        render_unclassified(&mut out, &classified.unclassified);
    }
    render_connections(&mut out, graph);
    render_schema(&mut out, &tables);

    out.rule('=');
    out.line("END OF REPORT");
    out.rule('=');

    tracing::info!(
        nodes = stats.total_elements,
        edges = stats.connections,
        tables = tables.len(),
        "report generated"
    );

    GeneratedReport {
        text: out.finish(),
        stats,
        tables,
    }
}

fn render_summary(out: &mut ReportBuilder, stats: &GenerationStats) {
    out.section("SUMMARY");
    out.line(format!("Total Elements: {}", stats.total_elements));
    out.line(format!("Pages: {}", stats.pages));
    out.line(format!("Form Elements: {}", stats.form_elements));
    out.line(format!("UI Elements: {}", stats.ui_elements));
    out.line(format!("API Elements: {}", stats.api_elements));
    out.line(format!("Database Elements: {}", stats.database_elements));
    out.line(format!("Connections: {}", stats.connections));
    if stats.unclassified > 0 {
        out.line(format!("Unclassified: {}", stats.unclassified));
    }
    out.blank();
}

fn render_bucket(out: &mut ReportBuilder, bucket: Bucket, nodes: &[&Node]) {
    out.section(&format!("{} ({})", bucket.title(), nodes.len()));
    if nodes.is_empty() {
        out.line(format!("No {} found.", bucket.noun()));
        out.blank();
        return;
    }
    for (i, node) in nodes.iter().enumerate() {
        render_entry(out, i + 1, node);
        out.blank();
    }
}

/// One numbered entry. Fields absent from the node's data are left out.
fn render_entry(out: &mut ReportBuilder, number: usize, node: &Node) {
    out.line(format!("{}. {}", number, node.label().unwrap_or("(unlabeled)")));
    out.field("ID", node.id.as_str());
    if matches!(node.body, NodeBody::Form(..) | NodeBody::Ui(..)) {
        out.field("Type", node.kind().tag());
    }
    let (x, y) = node.position.rounded();
    out.field("Position", format!("({}, {})", x, y));
    if let Some(size) = node.body.size() {
        out.field("Size", format_size(size));
    }

    match &node.body {
        NodeBody::Page(page) => {
            out.opt_field("Title", page.title.as_deref());
            out.opt_field("Route", page.route.as_deref());
        }
        NodeBody::Form(_, field) => {
            if let Some(mapping) = &field.database {
                out.field("Database", format!("{}.{}", mapping.table, mapping.column));
            }
            if !field.options.is_empty() {
                let options: Vec<&str> = field.options.iter().map(|o| o.label()).collect();
                out.field("Options", options.join(", "));
            }
            out.opt_field("Placeholder", field.placeholder.as_deref());
            if field.required {
                out.field("Required", "yes");
            }
        }
        NodeBody::Ui(_, ui) => {
            out.opt_field("Text", ui.text.as_deref());
            out.opt_field("Source", ui.src.as_deref());
            out.opt_field("Href", ui.href.as_deref());
        }
        NodeBody::Api(api) => {
            out.opt_field("Endpoint", api.endpoint.as_deref());
            out.opt_field("Method", api.method.as_deref());
        }
        NodeBody::Database(db) => {
            out.opt_field("Table", db.table.as_deref());
            out.opt_field("Connection", db.connection_string.as_deref());
        }
        NodeBody::Validation(_) | NodeBody::Unknown { .. } => {}
    }
}

fn render_unclassified(out: &mut ReportBuilder, nodes: &[&Node]) {
    out.section(&format!("UNCLASSIFIED NODES ({})", nodes.len()));
    for node in nodes {
        out.line(format!("- {} ({})", node.id, node.kind()));
    }
    out.blank();
}

fn render_connections(out: &mut ReportBuilder, graph: &Graph) {
    out.section(&format!("CONNECTIONS ({})", graph.edges.len()));
    if graph.edges.is_empty() {
        out.line("No connections found.");
        out.blank();
        return;
    }
    let mut seen = HashSet::new();
    let first: Vec<&Node> = graph
        .nodes
        .iter()
        .filter(|n| seen.insert(&n.id))
        .collect();
    for (i, edge) in graph.edges.iter().enumerate() {
        out.line(format!("{}. {}", i + 1, describe_edge(edge, &first)));
    }
    out.blank();
}

fn describe_edge(edge: &Edge, nodes: &[&Node]) -> String {
    format!(
        "{} -> {}",
        describe_endpoint(&edge.source, nodes),
        describe_endpoint(&edge.target, nodes)
    )
}

/// `<label or id> (<type>)`, or `<id> (unknown)` when the id is dangling.
fn describe_endpoint(id: &NodeId, nodes: &[&Node]) -> String {
    match nodes.iter().find(|n| &n.id == id) {
        Some(node) => format!(
            "{} ({})",
            node.label().unwrap_or(node.id.as_str()),
            node.kind()
        ),
        None => format!("{} (unknown)", id),
    }
}

fn render_schema(out: &mut ReportBuilder, tables: &[TableSchema]) {
    out.section("DATABASE SCHEMA");
    if tables.is_empty() {
        out.line("No database mappings found.");
        out.blank();
        return;
    }
    for table in tables {
        out.line(table.to_sql());
        out.blank();
    }
}

fn format_size(size: Size) -> String {
    format!("{} x {}", size.width, size.height)
}

#[derive(Default)]
struct ReportBuilder {
    text: String,
}

impl ReportBuilder {
    fn line(&mut self, line: impl AsRef<str>) {
        self.text.push_str(line.as_ref());
        self.text.push('\n');
    }

    fn blank(&mut self) {
        self.text.push('\n');
    }

    fn rule(&mut self, ch: char) {
        let rule: String = std::iter::repeat(ch).take(WIDTH).collect();
        self.line(rule);
    }

    fn banner(&mut self, title: &str) {
        self.rule('=');
        self.line(title);
        self.rule('=');
    }

    fn section(&mut self, title: &str) {
        self.line(title);
        self.rule('-');
    }

    fn field(&mut self, name: &str, value: impl AsRef<str>) {
        self.line(format!("   {}: {}", name, value.as_ref()));
    }

    fn opt_field(&mut self, name: &str, value: Option<&str>) {
        if let Some(value) = value.filter(|v| !v.is_empty()) {
            self.field(name, value);
        }
    }

    fn finish(self) -> String {
        self.text
    }
}
