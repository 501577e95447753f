//! Reading and validating Schematic diagram descriptions.
//!
//! A description is JSON text in one of two shapes: a flat array of
//! components, or a hierarchical object with an entry point module and a
//! set of module definitions. This crate turns the text into the typed
//! [`Diagram`] model in three steps:
//!
//! 1. **Read**: the text is parsed as JSON. Syntax errors carry a source span.
//! 2. **Validate**: the schema validator checks the raw value and reports
//!    every problem it finds, each located by a JSON path.
//! 3. **Lower**: a valid value is converted into the typed model.
//!
//! Warnings never stop the pipeline; any error does.

pub mod error;
mod span;
mod validate;


use log::{debug, trace, warn};
use serde::Deserialize;
use serde_json::Value;

use schematic_core::model::Diagram;

use error::{Diagnostic, ErrorCode, ParseError};

pub use span::Span;
pub use validate::{ValidationReport, validate};

/// Parses, validates and lowers a diagram description.
///
/// # Errors
///
/// Returns a [`ParseError`] holding every error diagnostic when the text is
/// not JSON, fails schema validation, or cannot be lowered into the model.
pub fn parse(source: &str) -> Result<Diagram, ParseError> {
    let value = read_json(source)?;
    parse_value(&value)
}

/// Validates and lowers an already parsed JSON value.
///
/// # Errors
///
/// Returns a [`ParseError`] when the value fails validation or lowering.
pub fn parse_value(value: &Value) -> Result<Diagram, ParseError> {
    let warnings = validate(value).into_result()?;
    for warning in &warnings {
        warn!(diagnostic:% = warning; "Diagram description warning");
    }

    let diagram = Diagram::deserialize(value).map_err(|err| {
        Diagnostic::error(format!("description could not be read as a diagram: {err}"))
            .with_code(ErrorCode::E002)
    })?;

    debug!(shape = diagram.shape(); "Diagram description lowered");
    Ok(diagram)
}

/// Validates JSON text without lowering it.
///
/// Text that is not JSON yields a report holding a single syntax error.
pub fn validate_source(source: &str) -> ValidationReport {
    match read_json(source) {
        Ok(value) => validate(&value),
        Err(err) => ValidationReport::from(err),
    }
}

fn read_json(source: &str) -> Result<Value, Diagnostic> {
    trace!(bytes = source.len(); "Reading diagram description");
    serde_json::from_str(source).map_err(|err| {
        let span = Span::at_line_column(source, err.line(), err.column());
        Diagnostic::error(format!("description is not valid JSON: {err}"))
            .with_code(ErrorCode::E001)
            .with_label(span, "here")
    })
}
