//! Error types for Schematic operations.
//!
//! This module provides the main error type [`SchematicError`] which wraps
//! the error conditions of every pipeline stage.

use std::io;

use thiserror::Error;

use schematic_parser::error::ParseError;

use crate::{export, layout::LayoutError, resolve::ResolveError};

/// The main error type for Schematic operations.
///
/// # Diagnostic Variants
///
/// The `Parse` variant carries every diagnostic found in the description
/// together with the source text, so callers can render them against it.
#[derive(Debug, Error)]
pub enum SchematicError {
    #[error("I/O error: {0}")]
    Io(#[from] io::Error),

    #[error("{err}")]
    Parse { err: ParseError, src: String },

    #[error("Resolve error: {0}")]
    Resolve(#[from] ResolveError),

    #[error("Layout error: {0}")]
    Layout(#[from] LayoutError),

    #[error("Export error: {0}")]
    Export(#[from] export::Error),
}

impl SchematicError {
    /// Create a new `Parse` error with the associated source text.
    pub fn new_parse_error(err: ParseError, src: impl Into<String>) -> Self {
        Self::Parse {
            err,
            src: src.into(),
        }
    }
}
