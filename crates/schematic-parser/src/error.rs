//! Error and diagnostic system for the Schematic parser.
//!
//! This module provides an error handling system with:
//! - Error codes for documentation and searchability
//! - JSON paths locating each problem inside the description
//! - Labeled source spans for syntax errors
//! - Severity levels
//! - Diagnostic collector for accumulating multiple errors
//!
//! # Overview
//!
//! The error system is built around the [`Diagnostic`] type, which represents
//! a single error or warning message with optional error code, location and
//! help text. Multiple diagnostics are wrapped in [`ParseError`] for returning
//! from the parsing lifecycle.
//!
//! # Example
//!
//! ```
//! # use schematic_parser::error::{Diagnostic, ErrorCode};
//!
//! let diag = Diagnostic::error("component id `mul1` is declared more than once")
//!     .with_code(ErrorCode::E208)
//!     .with_path("moduleDefinitions.Neuron.components[3].id")
//!     .with_help("component ids must be unique within their module definition");
//!
//! assert_eq!(
//!     diag.to_string(),
//!     "error[E208]: component id `mul1` is declared more than once \
//!      (at moduleDefinitions.Neuron.components[3].id)"
//! );
//! ```

mod collector;
mod diagnostic;
mod error_code;
mod label;
mod parse_error;
mod severity;

pub(crate) use collector::DiagnosticCollector;

pub use diagnostic::Diagnostic;
pub use error_code::ErrorCode;
pub use label::Label;
pub use parse_error::ParseError;
pub use severity::Severity;
