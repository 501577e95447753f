//! Graph structures built from flattened diagrams.
//!
//! The layout engine never walks [`FlatGraph`](schematic_core::flat::FlatGraph)
//! connections directly; it works on the indexed [`DependencyGraph`] built
//! once per layout call.

mod dependency_graph;

pub(crate) use dependency_graph::{DependencyGraph, EdgeIndex};
