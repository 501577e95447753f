//! Clock-cycle layout of flattened diagrams.
//!
//! The engine assigns every primitive a discrete cycle (horizontal column)
//! and a continuous row (vertical position) in two passes:
//!
//! 1. **Cycles**: `input` primitives sit at cycle 0; every other primitive
//!    sits one cycle after its latest source. A primitive without sources
//!    sits at cycle 0.
//! 2. **Rows**: `input` primitives take rows 0, 1, 2, ... in flattened
//!    order; every other primitive takes the mean row of its sources.
//!
//! Both passes are iterative worklists over the flattened order: a primitive
//! whose sources are not resolved yet is deferred to the next pass. When a
//! pass makes no progress, the first unresolved `reg` that lies on an
//! unresolved loop is resolved from its other inputs, and its inputs from
//! the loop become feedback edges ignored by both passes. A loop without
//! any `reg` is a combinational cycle and fails the layout.

use std::collections::BTreeSet;

use indexmap::IndexMap;
use log::{debug, info, trace};
use serde::Serialize;
use thiserror::Error;

use schematic_core::{flat::FlatGraph, identifier::Id};

use crate::{
    config::LayoutConfig,
    structure::{DependencyGraph, EdgeIndex},
};

/// Errors raised while laying out a flattened diagram.
#[derive(Debug, Clone, PartialEq, Error)]
pub enum LayoutError {
    #[error("dependency cycle through {} is not broken by a `reg`", format_ids(.0))]
    CombinationalCycle(Vec<Id>),

    #[error("primitive `{target}` reads `{missing}` on port `{port}`, which is not part of the diagram")]
    UnknownSource { target: Id, port: String, missing: Id },

    #[error("primitive id `{0}` appears more than once")]
    DuplicateId(Id),
}

fn format_ids(ids: &[Id]) -> String {
    ids.iter()
        .map(|id| format!("`{id}`"))
        .collect::<Vec<_>>()
        .join(", ")
}

/// Grid position of one primitive.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct Position {
    cycle: u32,
    row: f64,
}

impl Position {
    pub fn new(cycle: u32, row: f64) -> Self {
        Self { cycle, row }
    }

    /// Discrete clock-cycle column.
    pub fn cycle(&self) -> u32 {
        self.cycle
    }

    /// Vertical position; a rendering hint only.
    pub fn row(&self) -> f64 {
        self.row
    }

    /// Converts the grid position into drawing units.
    pub fn to_point(&self, config: &LayoutConfig) -> (f64, f64) {
        (
            f64::from(self.cycle) * config.column_spacing(),
            self.row * config.row_spacing(),
        )
    }
}

/// A dependency ignored by layout because it closes a loop through a `reg`.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct FeedbackEdge {
    source: Id,
    target: Id,
    port: String,
}

impl FeedbackEdge {
    /// Primitive producing the fed-back value.
    pub fn source(&self) -> Id {
        self.source
    }

    /// The `reg` primitive receiving the fed-back value.
    pub fn target(&self) -> Id {
        self.target
    }

    pub fn port(&self) -> &str {
        &self.port
    }
}

/// Positions of every primitive of a flattened diagram, in flattened order.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct Layout {
    positions: IndexMap<Id, Position>,
    feedback_edges: Vec<FeedbackEdge>,
}

impl Layout {
    /// Returns the position of a primitive.
    pub fn position(&self, id: Id) -> Option<Position> {
        self.positions.get(&id).copied()
    }

    /// Iterates over ids and positions in flattened order.
    pub fn iter(&self) -> impl Iterator<Item = (Id, Position)> + '_ {
        self.positions.iter().map(|(id, position)| (*id, *position))
    }

    pub fn len(&self) -> usize {
        self.positions.len()
    }

    pub fn is_empty(&self) -> bool {
        self.positions.is_empty()
    }

    /// Dependencies ignored to break loops through `reg` primitives.
    pub fn feedback_edges(&self) -> &[FeedbackEdge] {
        &self.feedback_edges
    }

    /// Number of cycle columns the layout spans.
    pub fn cycle_count(&self) -> u32 {
        self.positions
            .values()
            .map(|position| position.cycle.saturating_add(1))
            .max()
            .unwrap_or(0)
    }
}

/// Layout engine for flattened diagrams.
///
/// # Examples
///
/// ```
/// use schematic::{flat::FlatGraph, layout::LayoutEngine};
///
/// let layout = LayoutEngine::new()
///     .with_output_cycle_offset(1)
///     .layout(&FlatGraph::default())
///     .unwrap();
/// assert!(layout.is_empty());
/// ```
#[derive(Debug, Clone, Default)]
pub struct LayoutEngine {
    output_cycle_offset: u32,
}

impl LayoutEngine {
    pub fn new() -> Self {
        Self::default()
    }

    /// Creates an engine using the settings of a [`LayoutConfig`].
    pub fn from_config(config: &LayoutConfig) -> Self {
        Self::new().with_output_cycle_offset(config.output_cycle_offset())
    }

    /// Sets the extra cycles added to every `output` primitive.
    pub fn with_output_cycle_offset(mut self, offset: u32) -> Self {
        self.output_cycle_offset = offset;
        self
    }

    /// Computes the layout of a flattened diagram.
    ///
    /// # Errors
    ///
    /// Returns [`LayoutError::CombinationalCycle`] when a dependency loop
    /// contains no `reg`, and [`LayoutError::UnknownSource`] or
    /// [`LayoutError::DuplicateId`] when the flat graph is inconsistent.
    pub fn layout(&self, graph: &FlatGraph) -> Result<Layout, LayoutError> {
        info!(primitives = graph.len(); "Computing layout");
        let dependency_graph = DependencyGraph::from_flat_graph(graph)?;

        let mut cycles = CyclePass::new(&dependency_graph);
        cycles.run()?;
        let rows = RowPass::new(&dependency_graph, &cycles.feedback).run()?;

        let positions: IndexMap<_, _> = dependency_graph
            .nodes()
            .zip(cycles.resolved)
            .zip(rows)
            .map(|(((_, primitive), cycle), row)| {
                let mut cycle = cycle.unwrap_or_default();
                if primitive.kind().is_output() {
                    cycle = cycle.saturating_add(self.output_cycle_offset);
                }
                (primitive.id(), Position::new(cycle, row.unwrap_or_default()))
            })
            .collect();

        let feedback_edges = cycles
            .feedback
            .into_iter()
            .map(|index| {
                let edge = dependency_graph.edge(index);
                FeedbackEdge {
                    source: dependency_graph.node(edge.source()).id(),
                    target: dependency_graph.node(edge.target()).id(),
                    port: edge.port().to_string(),
                }
            })
            .collect();

        let layout = Layout {
            positions,
            feedback_edges,
        };
        debug!(
            cycles = layout.cycle_count(),
            feedback_edges = layout.feedback_edges.len();
            "Layout computed"
        );
        Ok(layout)
    }
}

/// Lays out a flattened diagram with default settings.
///
/// # Errors
///
/// See [`LayoutEngine::layout`].
pub fn layout(graph: &FlatGraph) -> Result<Layout, LayoutError> {
    LayoutEngine::new().layout(graph)
}

/// Cycle assignment state.
struct CyclePass<'g, 'a> {
    graph: &'g DependencyGraph<'a>,
    resolved: Vec<Option<u32>>,
    feedback: BTreeSet<EdgeIndex>,
}

impl<'g, 'a> CyclePass<'g, 'a> {
    fn new(graph: &'g DependencyGraph<'a>) -> Self {
        Self {
            graph,
            resolved: vec![None; graph.len()],
            feedback: BTreeSet::new(),
        }
    }

    fn run(&mut self) -> Result<(), LayoutError> {
        let mut pending: Vec<usize> = (0..self.graph.len()).collect();

        // Every round settles at least one node, so the node count bounds the rounds.
        for round in 1..=self.graph.len() {
            if pending.is_empty() {
                break;
            }
            let before = pending.len();
            pending.retain(|&node| match self.try_resolve(node) {
                Some(cycle) => {
                    self.resolved[node] = Some(cycle);
                    false
                }
                None => true,
            });
            trace!(round, pending = pending.len(); "Cycle pass round");

            if pending.len() == before {
                let reg = self.break_loop(&pending)?;
                pending.retain(|&node| node != reg);
            }
        }

        if pending.is_empty() {
            Ok(())
        } else {
            Err(LayoutError::CombinationalCycle(self.loop_members(&pending)))
        }
    }

    /// Returns the cycle of a node once all of its sources are resolved.
    fn try_resolve(&self, node: usize) -> Option<u32> {
        if self.graph.node(node).kind().is_input() {
            return Some(0);
        }

        let mut latest = None;
        for (index, edge) in self.graph.incoming_edges(node) {
            if self.feedback.contains(&index) {
                continue;
            }
            let source = self.resolved[edge.source()]?;
            latest = latest.max(Some(source));
        }
        Some(latest.map_or(0, |cycle| cycle + 1))
    }

    /// Resolves the first pending `reg` on an unresolved loop, turning its
    /// unresolved inputs into feedback edges. Returns the resolved `reg`.
    fn break_loop(&mut self, pending: &[usize]) -> Result<usize, LayoutError> {
        let breakable = pending.iter().copied().find(|&node| {
            self.graph.node(node).kind().is_reg() && self.on_unresolved_loop(node)
        });

        let Some(reg) = breakable else {
            return Err(LayoutError::CombinationalCycle(self.loop_members(pending)));
        };

        let feedback: Vec<_> = self
            .graph
            .incoming_edges(reg)
            .filter(|(index, edge)| {
                !self.feedback.contains(index) && self.resolved[edge.source()].is_none()
            })
            .map(|(index, _)| index)
            .collect();
        debug!(
            reg:% = self.graph.node(reg).id(),
            feedback_edges = feedback.len();
            "Breaking loop at register"
        );
        self.feedback.extend(feedback);

        let cycle = self.try_resolve(reg).unwrap_or_default();
        self.resolved[reg] = Some(cycle);
        Ok(reg)
    }

    /// Returns `true` if `node` can reach itself through unresolved sources.
    fn on_unresolved_loop(&self, node: usize) -> bool {
        let mut visited = vec![false; self.graph.len()];
        let mut stack = vec![node];

        while let Some(current) = stack.pop() {
            for (index, edge) in self.graph.incoming_edges(current) {
                let source = edge.source();
                if self.feedback.contains(&index) || self.resolved[source].is_some() {
                    continue;
                }
                if source == node {
                    return true;
                }
                if !visited[source] {
                    visited[source] = true;
                    stack.push(source);
                }
            }
        }
        false
    }

    /// Ids of pending nodes that lie on an unresolved loop.
    fn loop_members(&self, pending: &[usize]) -> Vec<Id> {
        pending
            .iter()
            .copied()
            .filter(|&node| self.on_unresolved_loop(node))
            .map(|node| self.graph.node(node).id())
            .collect()
    }
}

/// Row assignment over the dependency graph minus feedback edges.
struct RowPass<'g, 'a> {
    graph: &'g DependencyGraph<'a>,
    feedback: &'g BTreeSet<EdgeIndex>,
    resolved: Vec<Option<f64>>,
}

impl<'g, 'a> RowPass<'g, 'a> {
    fn new(graph: &'g DependencyGraph<'a>, feedback: &'g BTreeSet<EdgeIndex>) -> Self {
        Self {
            graph,
            feedback,
            resolved: vec![None; graph.len()],
        }
    }

    fn run(mut self) -> Result<Vec<Option<f64>>, LayoutError> {
        let mut next_input_row = 0.0;
        for (node, primitive) in self.graph.nodes() {
            if primitive.kind().is_input() {
                self.resolved[node] = Some(next_input_row);
                next_input_row += 1.0;
            }
        }

        let mut pending: Vec<usize> = (0..self.graph.len())
            .filter(|&node| self.resolved[node].is_none())
            .collect();

        for round in 1..=self.graph.len() {
            if pending.is_empty() {
                break;
            }
            let before = pending.len();
            pending.retain(|&node| match self.try_resolve(node) {
                Some(row) => {
                    self.resolved[node] = Some(row);
                    false
                }
                None => true,
            });
            trace!(round, pending = pending.len(); "Row pass round");

            if pending.len() == before {
                break;
            }
        }

        if pending.is_empty() {
            Ok(self.resolved)
        } else {
            // Unreachable after a successful cycle pass, which leaves no loop
            // outside the feedback edges.
            let ids = pending
                .iter()
                .map(|&node| self.graph.node(node).id())
                .collect();
            Err(LayoutError::CombinationalCycle(ids))
        }
    }

    /// Returns the mean row of a node's sources once all are resolved.
    fn try_resolve(&self, node: usize) -> Option<f64> {
        let mut sum = 0.0;
        let mut count = 0u32;
        for (index, edge) in self.graph.incoming_edges(node) {
            if self.feedback.contains(&index) {
                continue;
            }
            sum += self.resolved[edge.source()]?;
            count += 1;
        }
        if count == 0 {
            Some(0.0)
        } else {
            Some(sum / f64::from(count))
        }
    }
}
