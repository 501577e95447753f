//! Schematic - hierarchical dataflow schematics for neural-network graphs.
//!
//! Validation, module flattening, and clock-cycle layout of declarative
//! diagram descriptions. Drawing is left to external renderers, which receive
//! the flattened primitives with their grid positions.

pub mod config;
pub mod export;
pub mod layout;
pub mod resolve;

mod error;
mod structure;

pub use schematic_core::{flat, identifier, model, reference};
pub use schematic_parser::{ValidationReport, error::Diagnostic};

pub use error::SchematicError;

use log::{debug, info, trace};

use config::AppConfig;
use export::{Exporter, json::JsonExporter};
use flat::FlatGraph;
use layout::{Layout, LayoutEngine};
use model::Diagram;

/// Builder for validating, flattening and laying out Schematic diagrams.
///
/// # Examples
///
/// ```rust
/// use schematic::{DiagramBuilder, config::AppConfig};
///
/// let source = r#"[
///     {"id": "x", "type": "input"},
///     {"id": "r", "type": "relu2", "inputs": {"a": "x.out"}},
///     {"id": "o", "type": "output", "inputs": {"a": "r.out"}}
/// ]"#;
///
/// let builder = DiagramBuilder::new(AppConfig::default());
///
/// let diagram = builder.parse(source).expect("Failed to parse");
/// let graph = builder.flatten(&diagram).expect("Failed to flatten");
/// let layout = builder.layout(&graph).expect("Failed to lay out");
///
/// assert_eq!(layout.cycle_count(), 3);
/// ```
#[derive(Default)]
pub struct DiagramBuilder {
    config: AppConfig,
}

impl DiagramBuilder {
    /// Create a new diagram builder with the given configuration.
    ///
    /// # Arguments
    ///
    /// * `config` - Application configuration including layout settings
    pub fn new(config: AppConfig) -> Self {
        Self { config }
    }

    /// Returns the configuration of this builder.
    pub fn config(&self) -> &AppConfig {
        &self.config
    }

    /// Checks a description and reports every problem found.
    ///
    /// Never fails: text that is not JSON yields a report with a single
    /// syntax error.
    ///
    /// # Examples
    ///
    /// ```rust
    /// use schematic::DiagramBuilder;
    ///
    /// let report = DiagramBuilder::default().validate(r#"[{"id": "x"}]"#);
    /// assert!(!report.is_valid());
    /// ```
    pub fn validate(&self, source: &str) -> ValidationReport {
        info!("Validating diagram");
        let report = schematic_parser::validate_source(source);
        debug!(
            valid = report.is_valid(),
            diagnostics = report.diagnostics().len();
            "Validation finished",
        );
        report
    }

    /// Parse a description into the typed diagram model.
    ///
    /// The description is validated first; lowering only happens when no
    /// error was found.
    ///
    /// # Errors
    ///
    /// Returns `SchematicError::Parse` with every error diagnostic.
    pub fn parse(&self, source: &str) -> Result<Diagram, SchematicError> {
        info!("Parsing diagram");

        let diagram = schematic_parser::parse(source)
            .map_err(|err| SchematicError::new_parse_error(err, source))?;

        debug!(shape = diagram.shape(); "Diagram parsed successfully");
        trace!(diagram:?; "Parsed diagram");

        Ok(diagram)
    }

    /// Expand every module instance into a flat graph of primitives.
    ///
    /// # Errors
    ///
    /// Returns `SchematicError::Resolve` when a module type is undefined or
    /// cyclic, or a connection cannot be resolved.
    pub fn flatten(&self, diagram: &Diagram) -> Result<FlatGraph, SchematicError> {
        info!(shape = diagram.shape(); "Flattening diagram");
        let graph = resolve::flatten(diagram)?;
        trace!(graph:?; "Flattened graph");
        Ok(graph)
    }

    /// Compute the cycle column and row of every flattened primitive.
    ///
    /// # Errors
    ///
    /// Returns `SchematicError::Layout` for loops not broken by a `reg`.
    pub fn layout(&self, graph: &FlatGraph) -> Result<Layout, SchematicError> {
        info!(primitives = graph.len(); "Calculating layout");
        let layout = LayoutEngine::from_config(self.config.layout()).layout(graph)?;
        info!(cycles = layout.cycle_count(); "Layout calculated");
        Ok(layout)
    }

    /// Run parsing, flattening and layout in sequence.
    ///
    /// # Errors
    ///
    /// Returns the error of the first stage that fails.
    pub fn build(&self, source: &str) -> Result<(FlatGraph, Layout), SchematicError> {
        let diagram = self.parse(source)?;
        let graph = self.flatten(&diagram)?;
        let layout = self.layout(&graph)?;
        Ok((graph, layout))
    }

    /// Render the JSON position document of a laid-out graph.
    ///
    /// # Errors
    ///
    /// Returns `SchematicError::Export` when the layout does not cover the
    /// graph.
    pub fn export_json(&self, graph: &FlatGraph, layout: &Layout) -> Result<String, SchematicError> {
        let mut exporter = JsonExporter::new(Vec::new(), self.config.layout()).with_pretty(true);
        exporter.export_layout(graph, layout)?;

        let json = String::from_utf8(exporter.into_inner())
            .map_err(|err| export::Error::Render(err.to_string()))?;
        info!(bytes = json.len(); "Position document rendered");
        Ok(json)
    }
}
