//! JSON position document.
//!
//! The document lists every flattened primitive in flattened order with its
//! grid position and its position in drawing units:
//!
//! ```json
//! {
//!   "columnSpacing": 100.0,
//!   "rowSpacing": 100.0,
//!   "cycles": 2,
//!   "nodes": [
//!     {"id": "x", "type": "input", "label": "input", "cycle": 0, "row": 0.0,
//!      "x": 0.0, "y": 0.0, "inputs": {}},
//!     {"id": "r", "type": "relu2", "label": "relu2", "cycle": 1, "row": 0.0,
//!      "x": 100.0, "y": 0.0, "inputs": {"a": "x.out"}}
//!   ],
//!   "feedbackEdges": []
//! }
//! ```

use std::io::Write;

use indexmap::IndexMap;
use log::debug;
use serde::Serialize;

use schematic_core::{flat::FlatGraph, identifier::Id};

use crate::{
    config::LayoutConfig,
    export::{Error, Exporter},
    layout::{FeedbackEdge, Layout},
};

#[derive(Serialize)]
#[serde(rename_all = "camelCase")]
struct Document<'a> {
    column_spacing: f64,
    row_spacing: f64,
    cycles: u32,
    nodes: Vec<Node<'a>>,
    feedback_edges: &'a [FeedbackEdge],
}

#[derive(Serialize)]
struct Node<'a> {
    id: Id,
    #[serde(rename = "type")]
    kind: &'a str,
    label: &'a str,
    cycle: u32,
    row: f64,
    x: f64,
    y: f64,
    inputs: IndexMap<&'a str, String>,
}

/// Writes the position document to any [`Write`] sink.
///
/// # Examples
///
/// ```
/// use schematic::{
///     config::LayoutConfig,
///     export::{Exporter, json::JsonExporter},
///     flat::FlatGraph,
///     layout::LayoutEngine,
/// };
///
/// let graph = FlatGraph::default();
/// let layout = LayoutEngine::new().layout(&graph).unwrap();
///
/// let mut buffer = Vec::new();
/// JsonExporter::new(&mut buffer, &LayoutConfig::default())
///     .export_layout(&graph, &layout)
///     .unwrap();
/// assert!(String::from_utf8(buffer).unwrap().contains(r#""nodes":[]"#));
/// ```
pub struct JsonExporter<W> {
    writer: W,
    config: LayoutConfig,
    pretty: bool,
}

impl<W: Write> JsonExporter<W> {
    pub fn new(writer: W, config: &LayoutConfig) -> Self {
        Self {
            writer,
            config: config.clone(),
            pretty: false,
        }
    }

    /// Indents the document for humans.
    pub fn with_pretty(mut self, pretty: bool) -> Self {
        self.pretty = pretty;
        self
    }

    /// Consumes the exporter and returns the underlying writer.
    pub fn into_inner(self) -> W {
        self.writer
    }

    fn document<'a>(&self, graph: &'a FlatGraph, layout: &'a Layout) -> Result<Document<'a>, Error> {
        let nodes = graph
            .primitives()
            .iter()
            .map(|primitive| {
                let position = layout.position(primitive.id()).ok_or_else(|| {
                    Error::Render(format!("primitive `{}` has no layout position", primitive.id()))
                })?;
                let (x, y) = position.to_point(&self.config);
                Ok(Node {
                    id: primitive.id(),
                    kind: primitive.kind().as_str(),
                    label: primitive.label(),
                    cycle: position.cycle(),
                    row: position.row(),
                    x,
                    y,
                    inputs: primitive
                        .inputs()
                        .iter()
                        .map(|(port, port_ref)| (port.as_str(), port_ref.to_string()))
                        .collect(),
                })
            })
            .collect::<Result<Vec<_>, Error>>()?;

        Ok(Document {
            column_spacing: self.config.column_spacing(),
            row_spacing: self.config.row_spacing(),
            cycles: layout.cycle_count(),
            nodes,
            feedback_edges: layout.feedback_edges(),
        })
    }
}

impl<W: Write> Exporter for JsonExporter<W> {
    fn export_layout(&mut self, graph: &FlatGraph, layout: &Layout) -> Result<(), Error> {
        let document = self.document(graph, layout)?;
        if self.pretty {
            serde_json::to_writer_pretty(&mut self.writer, &document)?;
        } else {
            serde_json::to_writer(&mut self.writer, &document)?;
        }
        self.writer.flush()?;

        debug!(nodes = document.nodes.len(), pretty = self.pretty; "Exported layout as JSON");
        Ok(())
    }
}
