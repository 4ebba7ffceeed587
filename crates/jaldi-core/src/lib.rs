//! Graph model, editor state and report generation for the Jaldi site builder.
//!
//! The editor ([`editor::Editor`]) holds the in-memory graph a user builds on
//! the canvas. [`report::generate`] turns a submitted [`Graph`] into the
//! plain-text report and inferred SQL schema served by `jaldi-server`.

pub mod editor;
pub mod error;
pub mod graph;
pub mod id;
pub mod node;
pub mod report;
pub mod schema;

// Re-export commonly used types
pub use editor::Editor;
pub use error::CoreError;
pub use graph::{Edge, Graph};
pub use id::{EdgeId, IdAllocator, NodeId};
pub use node::{FormControl, Node, NodeBody, NodeKind, Position, Size, UiWidget};
pub use report::{generate, GeneratedReport, GenerationStats};
