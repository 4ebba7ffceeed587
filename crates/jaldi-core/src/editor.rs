//! Editor state for the canvas.
//!
//! [`Editor`] owns the graph the user is building. Every user action (place,
//! configure, drag, connect, delete) is one method call that completes
//! before the next, so there is exactly one writer and no locking. Newly
//! placed nodes get the next value of a running maximum z-index so they
//! render above older ones.

use rand::{Rng, SeedableRng};
use rand_chacha::ChaCha8Rng;
use serde_json::Value;

use crate::error::CoreError;
use crate::graph::{Edge, Graph};
use crate::id::{EdgeId, IdAllocator, NodeId};
use crate::node::{Node, NodeBody, NodeKind, Position};

/// Range of default x coordinates for placed nodes.
const SPAWN_X: std::ops::Range<f64> = 100.0..500.0;
/// Range of default y coordinates for placed nodes.
const SPAWN_Y: std::ops::Range<f64> = 100.0..400.0;

/// In-memory editing session.
#[derive(Debug, Clone)]
pub struct Editor {
    graph: Graph,
    ids: IdAllocator,
    max_z: i64,
    rng: ChaCha8Rng,
}

impl Default for Editor {
    fn default() -> Self {
        Self::new()
    }
}

impl Editor {
    /// Creates an empty editor with entropy-seeded placement.
    pub fn new() -> Self {
        Self::with_rng(ChaCha8Rng::from_entropy())
    }

    /// Creates an empty editor whose default placements are reproducible.
    pub fn with_seed(seed: u64) -> Self {
        Self::with_rng(ChaCha8Rng::seed_from_u64(seed))
    }

    fn with_rng(rng: ChaCha8Rng) -> Self {
        Editor {
            graph: Graph::new(),
            ids: IdAllocator::new(),
            max_z: 0,
            rng,
        }
    }

    /// Editor pre-populated with the starter canvas: a single home page.
    pub fn starter() -> Self {
        let mut editor = Self::new();
        let seeded = editor.add_element_at(
            NodeKind::Page,
            Position::new(250.0, 50.0),
            serde_json::json!({
                "label": "Home Page",
                "route": "/",
                "size": { "width": 800.0, "height": 600.0 }
            }),
        );
        if let Err(err) = seeded {
            tracing::error!(%err, "starter page failed validation");
        }
        editor
    }

    /// Resumes editing an existing graph.
    ///
    /// The id allocator and z counter are advanced past everything already
    /// in the graph so new entities never collide with old ones.
    pub fn from_graph(graph: Graph) -> Self {
        let mut editor = Self::new();
        for node in &graph.nodes {
            editor.ids.observe_node(&node.id);
            if let Some(z) = node.z_index {
                editor.max_z = editor.max_z.max(z);
            }
        }
        for edge in &graph.edges {
            editor.ids.observe_edge(&edge.id);
        }
        editor.graph = graph;
        editor
    }

    pub fn graph(&self) -> &Graph {
        &self.graph
    }

    /// Places a new node of `kind` at a pseudo-random position.
    ///
    /// `initial_data` is shallow-merged over the kind's default data.
    pub fn add_element(&mut self, kind: NodeKind, initial_data: Value) -> Result<&Node, CoreError> {
        let position = Position::new(
            self.rng.gen_range(SPAWN_X),
            self.rng.gen_range(SPAWN_Y),
        );
        self.add_element_at(kind, position, initial_data)
    }

    /// Places a new node of `kind` at `position`.
    pub fn add_element_at(
        &mut self,
        kind: NodeKind,
        position: Position,
        initial_data: Value,
    ) -> Result<&Node, CoreError> {
        let id = self.ids.node_id(kind.id_prefix());
        let data = merge(&id, &kind, kind.default_data(), initial_data)?;
        let mut node = Node::new(id, &kind, position, data)?;

        self.max_z += 1;
        node.z_index = Some(self.max_z);
        tracing::debug!(node = %node.id, kind = %kind, "placed node");

        self.graph.nodes.push(node);
        Ok(&self.graph.nodes[self.graph.nodes.len() - 1])
    }

    /// Connects two nodes. Neither id has to exist.
    pub fn connect(&mut self, source: NodeId, target: NodeId) -> &Edge {
        let edge = Edge::new(self.ids.edge_id(), source, target);
        tracing::debug!(edge = %edge.id, source = %edge.source, target = %edge.target, "connected");
        self.graph.edges.push(edge);
        &self.graph.edges[self.graph.edges.len() - 1]
    }

    /// Shallow-merges `patch` into a node's data and re-validates it.
    ///
    /// On a validation failure the node is left unchanged.
    pub fn update_node_data(&mut self, id: &NodeId, patch: Value) -> Result<&Node, CoreError> {
        let node = self
            .graph
            .node_mut(id)
            .ok_or_else(|| CoreError::NodeNotFound { id: id.clone() })?;
        let kind = node.kind();
        let data = merge(id, &kind, node.body.to_data(), patch)?;
        node.body = NodeBody::from_data(id, &kind, data)?;
        Ok(&*node)
    }

    /// Moves a node to a new position.
    pub fn move_node(&mut self, id: &NodeId, position: Position) -> Result<(), CoreError> {
        let node = self
            .graph
            .node_mut(id)
            .ok_or_else(|| CoreError::NodeNotFound { id: id.clone() })?;
        node.position = position;
        Ok(())
    }

    /// Raises a node above every other node.
    pub fn bring_to_front(&mut self, id: &NodeId) -> Result<(), CoreError> {
        let next = self.max_z + 1;
        let node = self
            .graph
            .node_mut(id)
            .ok_or_else(|| CoreError::NodeNotFound { id: id.clone() })?;
        node.z_index = Some(next);
        self.max_z = next;
        Ok(())
    }

    /// Deletes a node together with every edge touching it.
    pub fn remove_node(&mut self, id: &NodeId) -> Result<Node, CoreError> {
        let index = self
            .graph
            .nodes
            .iter()
            .position(|n| &n.id == id)
            .ok_or_else(|| CoreError::NodeNotFound { id: id.clone() })?;
        let node = self.graph.nodes.remove(index);
        let dropped = self.graph.edges_of(id).count();
        self.graph
            .edges
            .retain(|e| &e.source != id && &e.target != id);
        tracing::debug!(node = %id, edges = dropped, "removed node");
        Ok(node)
    }

    /// Deletes a single edge.
    pub fn remove_edge(&mut self, id: &EdgeId) -> Result<Edge, CoreError> {
        let index = self
            .graph
            .edges
            .iter()
            .position(|e| &e.id == id)
            .ok_or_else(|| CoreError::EdgeNotFound { id: id.clone() })?;
        Ok(self.graph.edges.remove(index))
    }

    /// Snapshot of the graph for submission.
    pub fn submit(&self) -> Graph {
        self.graph.clone()
    }
}

fn merge(id: &NodeId, kind: &NodeKind, base: Value, patch: Value) -> Result<Value, CoreError> {
    let mut merged = match base {
        Value::Object(map) => map,
        _ => serde_json::Map::new(),
    };
    match patch {
        Value::Null => {}
        Value::Object(patch) => merged.extend(patch),
        _ => {
            return Err(CoreError::invalid_data(
                id,
                kind.tag(),
                "data patch must be an object",
            ))
        }
    }
    Ok(Value::Object(merged))
}
