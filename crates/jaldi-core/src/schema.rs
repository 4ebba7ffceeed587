//! SQL schema inference from form elements' database mappings.
//!
//! Every form control mapped to `{table, column}` becomes one column of that
//! table. Column types come from a fixed map keyed on the control; nothing
//! is checked against an existing database.

use std::fmt;

use indexmap::IndexMap;

use crate::node::{FormControl, Node, NodeBody};

/// Column type chosen for a form control.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum SqlType {
    Text,
    Varchar(u16),
    Boolean,
}

impl SqlType {
    pub fn for_control(control: FormControl) -> Self {
        match control {
            FormControl::Textarea => SqlType::Text,
            FormControl::Select | FormControl::Radio => SqlType::Varchar(100),
            FormControl::Checkbox => SqlType::Boolean,
            FormControl::Input => SqlType::Varchar(255),
        }
    }
}

impl fmt::Display for SqlType {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            SqlType::Text => f.write_str("TEXT"),
            SqlType::Varchar(n) => write!(f, "VARCHAR({})", n),
            SqlType::Boolean => f.write_str("BOOLEAN"),
        }
    }
}

/// One inferred column.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ColumnDef {
    pub name: String,
    pub sql_type: SqlType,
    pub not_null: bool,
}

/// One inferred table. Always has at least one column.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct TableSchema {
    pub name: String,
    pub columns: Vec<ColumnDef>,
}

impl TableSchema {
    /// Renders the `CREATE TABLE` statement.
    ///
    /// The surrogate `id` key and the two timestamp columns are always
    /// present around the inferred columns.
    pub fn to_sql(&self) -> String {
        let mut lines = Vec::with_capacity(self.columns.len() + 3);
        lines.push("  id INT PRIMARY KEY AUTO_INCREMENT".to_string());
        for column in &self.columns {
            let suffix = if column.not_null { " NOT NULL" } else { "" };
            lines.push(format!("  {} {}{}", column.name, column.sql_type, suffix));
        }
        lines.push("  created_at TIMESTAMP DEFAULT CURRENT_TIMESTAMP".to_string());
        lines.push(
            "  updated_at TIMESTAMP DEFAULT CURRENT_TIMESTAMP ON UPDATE CURRENT_TIMESTAMP"
                .to_string(),
        );
        format!("CREATE TABLE {} (\n{}\n);", self.name, lines.join(",\n"))
    }
}

/// Groups mapped form elements by table, in order of first appearance.
///
/// Nodes that are not form elements, or carry no mapping, contribute
/// nothing. A column named twice in one table keeps its first definition.
pub fn infer_tables<'a>(nodes: impl IntoIterator<Item = &'a Node>) -> Vec<TableSchema> {
    let mut tables: IndexMap<&str, Vec<ColumnDef>> = IndexMap::new();

    for node in nodes {
        let NodeBody::Form(control, field) = &node.body else {
            continue;
        };
        let Some(mapping) = &field.database else {
            continue;
        };

        let columns = tables.entry(mapping.table.as_str()).or_default();
        if columns.iter().any(|c| c.name == mapping.column) {
            tracing::warn!(
                node = %node.id,
                table = %mapping.table,
                column = %mapping.column,
                "column already mapped by another element, skipping"
            );
            continue;
        }
        columns.push(ColumnDef {
            name: mapping.column.clone(),
            sql_type: SqlType::for_control(*control),
            not_null: field.required,
        });
    }

    tables
        .into_iter()
        .map(|(name, columns)| TableSchema {
            name: name.to_string(),
            columns,
        })
        .collect()
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::graph::Graph;
    use serde_json::json;

    fn graph(nodes: serde_json::Value) -> Graph {
        serde_json::from_value(json!({ "nodes": nodes, "edges": [] })).unwrap()
    }

    #[test]
    fn type_map_is_fixed_per_control() {
        assert_eq!(SqlType::for_control(FormControl::Textarea).to_string(), "TEXT");
        assert_eq!(SqlType::for_control(FormControl::Select).to_string(), "VARCHAR(100)");
        assert_eq!(SqlType::for_control(FormControl::Radio).to_string(), "VARCHAR(100)");
        assert_eq!(SqlType::for_control(FormControl::Checkbox).to_string(), "BOOLEAN");
        assert_eq!(SqlType::for_control(FormControl::Input).to_string(), "VARCHAR(255)");
    }

    #[test]
    fn groups_by_table_in_first_seen_order() {
        let g = graph(json!([
            { "id": "a", "type": "inputElement",
              "data": { "database": { "table": "orders", "column": "ref" } } },
            { "id": "b", "type": "checkboxElement",
              "data": { "database": { "table": "users", "column": "active" } } },
            { "id": "c", "type": "textareaElement", "data": { "required": true,
              "database": { "table": "orders", "column": "notes" } } },
            { "id": "d", "type": "inputElement", "data": { "label": "unmapped" } },
            { "id": "e", "type": "databaseNode", "data": { "table": "ignored" } }
        ]));
        let tables = infer_tables(&g.nodes);

        let names: Vec<&str> = tables.iter().map(|t| t.name.as_str()).collect();
        assert_eq!(names, ["orders", "users"]);
        assert_eq!(tables[0].columns.len(), 2);
        assert_eq!(tables[0].columns[1].sql_type, SqlType::Text);
        assert!(tables[0].columns[1].not_null);
        assert_eq!(tables[1].columns[0].sql_type, SqlType::Boolean);
    }

    #[test]
    fn no_mappings_no_tables() {
        let g = graph(json!([
            { "id": "a", "type": "inputElement", "data": { "label": "Name" } },
            { "id": "b", "type": "buttonElement", "data": {} }
        ]));
        assert!(infer_tables(&g.nodes).is_empty());
    }

    #[test]
    fn unusable_mappings_emit_no_column() {
        let g = graph(json!([
            { "id": "a", "type": "inputElement",
              "data": { "database": { "table": "users" } } },
            { "id": "b", "type": "inputElement",
              "data": { "database": { "table": "user-profiles", "column": "bio" } } },
            { "id": "c", "type": "inputElement", "data": { "required": 1,
              "database": { "table": "users", "column": "email" } } }
        ]));
        let tables = infer_tables(&g.nodes);
        assert_eq!(tables.len(), 1);
        assert_eq!(tables[0].columns.len(), 1);
        assert_eq!(tables[0].columns[0].name, "email");
        assert!(tables[0].columns[0].not_null);
    }

    #[test]
    fn duplicate_column_keeps_first() {
        let g = graph(json!([
            { "id": "a", "type": "inputElement",
              "data": { "database": { "table": "t", "column": "x" } } },
            { "id": "b", "type": "checkboxElement",
              "data": { "database": { "table": "t", "column": "x" } } }
        ]));
        let tables = infer_tables(&g.nodes);
        assert_eq!(tables[0].columns.len(), 1);
        assert_eq!(tables[0].columns[0].sql_type, SqlType::Varchar(255));
    }

    #[test]
    fn renders_create_table() {
        let table = TableSchema {
            name: "users".to_string(),
            columns: vec![ColumnDef {
                name: "username".to_string(),
                sql_type: SqlType::Varchar(255),
                not_null: true,
            }],
        };
        assert_eq!(
            table.to_sql(),
            "CREATE TABLE users (\n\
             \x20 id INT PRIMARY KEY AUTO_INCREMENT,\n\
             \x20 username VARCHAR(255) NOT NULL,\n\
             \x20 created_at TIMESTAMP DEFAULT CURRENT_TIMESTAMP,\n\
             \x20 updated_at TIMESTAMP DEFAULT CURRENT_TIMESTAMP ON UPDATE CURRENT_TIMESTAMP\n\
             );"
        );
    }
}
