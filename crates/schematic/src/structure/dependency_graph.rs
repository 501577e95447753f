//! Indexed dependency graph over flattened primitives.
//!
//! # Architecture
//!
//! - [`EdgeIndex`]: index of an edge in insertion order
//! - [`Edge`]: source node, target node, and the target's input port
//! - [`DependencyGraph`]: nodes in flattened order plus per-node incoming edges
//!
//! Nodes are addressed by their position in the flattened sequence, so
//! per-node layout state can live in plain vectors. Incoming edges of a node
//! are stored in port declaration order.

use std::collections::HashMap;

use schematic_core::{
    flat::{FlatGraph, FlatPrimitive},
    identifier::Id,
};

use crate::layout::LayoutError;

/// Index of an edge in the graph.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash)]
pub(crate) struct EdgeIndex(usize);

/// A directed dependency: `target` reads the value produced by `source`.
#[derive(Debug, Clone, Copy)]
pub(crate) struct Edge<'a> {
    source: usize,
    target: usize,
    port: &'a str,
}

impl<'a> Edge<'a> {
    pub(crate) fn source(&self) -> usize {
        self.source
    }

    pub(crate) fn target(&self) -> usize {
        self.target
    }

    /// Input port of the target that carries this dependency.
    pub(crate) fn port(&self) -> &'a str {
        self.port
    }
}

/// Dependency graph of one flattened diagram.
///
/// The graph is directed and allows self-loops and multiple edges between
/// the same pair of nodes (one per input port).
#[derive(Debug)]
pub(crate) struct DependencyGraph<'a> {
    nodes: Vec<&'a FlatPrimitive>,
    indices: HashMap<Id, usize>,
    edges: Vec<Edge<'a>>,
    incoming_edges: Vec<Vec<EdgeIndex>>,
}

impl<'a> DependencyGraph<'a> {
    /// Builds the graph of a flattened diagram.
    ///
    /// # Errors
    ///
    /// Returns [`LayoutError::DuplicateId`] when two primitives share an id,
    /// and [`LayoutError::UnknownSource`] when an input names a primitive
    /// that is not part of the graph.
    pub(crate) fn from_flat_graph(graph: &'a FlatGraph) -> Result<Self, LayoutError> {
        let mut dependency_graph = Self {
            nodes: Vec::with_capacity(graph.len()),
            indices: HashMap::with_capacity(graph.len()),
            edges: Vec::new(),
            incoming_edges: Vec::with_capacity(graph.len()),
        };

        for primitive in graph {
            dependency_graph.add_node(primitive)?;
        }

        for (target, primitive) in graph.primitives().iter().enumerate() {
            for (port, port_ref) in primitive.inputs() {
                let source = dependency_graph.index_of(port_ref.source()).ok_or_else(|| {
                    LayoutError::UnknownSource {
                        target: primitive.id(),
                        port: port.clone(),
                        missing: port_ref.source(),
                    }
                })?;
                dependency_graph.add_edge(source, target, port);
            }
        }

        Ok(dependency_graph)
    }

    /// Returns the number of nodes.
    pub(crate) fn len(&self) -> usize {
        self.nodes.len()
    }

    /// Returns the primitive at the given node index.
    ///
    /// # Panics
    /// Panics if the index is out of range.
    pub(crate) fn node(&self, index: usize) -> &'a FlatPrimitive {
        self.nodes[index]
    }

    /// Returns an iterator over node indices and primitives in flattened order.
    pub(crate) fn nodes(&self) -> impl Iterator<Item = (usize, &'a FlatPrimitive)> + '_ {
        self.nodes.iter().copied().enumerate()
    }

    /// Returns the node index of a primitive id, if it exists.
    pub(crate) fn index_of(&self, id: Id) -> Option<usize> {
        self.indices.get(&id).copied()
    }

    /// Returns the edge at the given index.
    pub(crate) fn edge(&self, index: EdgeIndex) -> Edge<'a> {
        self.edges[index.0]
    }

    /// Returns the edges feeding a node, in port declaration order.
    pub(crate) fn incoming_edges(
        &self,
        target: usize,
    ) -> impl Iterator<Item = (EdgeIndex, Edge<'a>)> + '_ {
        self.incoming_edges[target]
            .iter()
            .map(|&index| (index, self.edges[index.0]))
    }

    fn add_node(&mut self, primitive: &'a FlatPrimitive) -> Result<(), LayoutError> {
        let index = self.nodes.len();
        if self.indices.insert(primitive.id(), index).is_some() {
            return Err(LayoutError::DuplicateId(primitive.id()));
        }
        self.nodes.push(primitive);
        self.incoming_edges.push(Vec::new());
        Ok(())
    }

    fn add_edge(&mut self, source: usize, target: usize, port: &'a str) -> EdgeIndex {
        debug_assert!(source < self.nodes.len(), "edge source {source} out of range");
        debug_assert!(target < self.nodes.len(), "edge target {target} out of range");

        self.edges.push(Edge {
            source,
            target,
            port,
        });
        let index = EdgeIndex(self.edges.len() - 1);
        self.incoming_edges[target].push(index);
        index
    }
}
