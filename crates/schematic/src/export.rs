//! Export of laid-out diagrams.
//!
//! Drawing is left to external renderers. This module hands them the
//! flattened primitives together with their grid positions.
//!
//! # Pipeline Position
//!
//! ```text
//! JSON description
//!     ↓ parse (validate, lower)
//! Diagram
//!     ↓ resolve
//! FlatGraph
//!     ↓ layout
//! Layout
//!     ↓ export (this module)
//! Position document
//! ```
//!
//! # Available Backends
//!
//! - [`json`]: JSON position document via [`json::JsonExporter`]

/// JSON export backend.
pub mod json;

use schematic_core::flat::FlatGraph;

use crate::layout::Layout;

/// Abstraction for export backends.
pub trait Exporter {
    /// Exports a flattened diagram together with its layout.
    ///
    /// # Errors
    ///
    /// Returns [`Error::Render`] if a primitive has no position in `layout`,
    /// [`Error::Serialize`] if the document cannot be encoded, or
    /// [`Error::Io`] if writing the output fails.
    fn export_layout(&mut self, graph: &FlatGraph, layout: &Layout) -> Result<(), Error>;
}

/// Errors that can occur during export.
///
/// Converted into [`SchematicError::Export`] at the crate boundary.
///
/// [`SchematicError::Export`]: crate::SchematicError::Export
#[derive(Debug)]
pub enum Error {
    /// The layout does not match the graph being exported.
    Render(String),
    /// The document could not be encoded.
    Serialize(serde_json::Error),
    /// An I/O error encountered while writing output.
    Io(std::io::Error),
}

impl std::fmt::Display for Error {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            Self::Render(msg) => write!(f, "Render error: {msg}"),
            Self::Serialize(err) => write!(f, "Serialization error: {err}"),
            Self::Io(err) => write!(f, "I/O error: {err}"),
        }
    }
}

impl std::error::Error for Error {
    fn source(&self) -> Option<&(dyn std::error::Error + 'static)> {
        match self {
            Self::Render(_) => None,
            Self::Serialize(err) => Some(err),
            Self::Io(err) => Some(err),
        }
    }
}

impl From<std::io::Error> for Error {
    fn from(err: std::io::Error) -> Self {
        Self::Io(err)
    }
}

impl From<serde_json::Error> for Error {
    fn from(err: serde_json::Error) -> Self {
        Self::Serialize(err)
    }
}
