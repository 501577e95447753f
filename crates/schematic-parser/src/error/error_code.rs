//! Error codes for the Schematic diagnostic system.
//!
//! Error codes are organized by phase:
//! - `E0xx` - Reading the JSON text
//! - `E1xx` - Root shape of the description
//! - `E2xx` - Structure of module definitions and components
//! - `E3xx` - Cross references (module types, ports, connections)

use std::fmt;

/// Error codes for categorizing diagnostics.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum ErrorCode {
    // =========================================================================
    // Input Errors (E0xx)
    // =========================================================================
    /// Invalid JSON.
    ///
    /// The description is not well-formed JSON.
    E001,

    /// Schema mismatch.
    ///
    /// A validated description could not be converted into the typed model.
    E002,

    // =========================================================================
    // Root Shape Errors (E1xx)
    // =========================================================================
    /// Invalid root shape.
    ///
    /// The root must be an array of components or an object with
    /// `entryPointModule` and `moduleDefinitions`.
    E100,

    /// Missing required key.
    E101,

    /// Invalid entry point.
    ///
    /// `entryPointModule` must be a non-empty string.
    E102,

    /// Undefined entry point.
    ///
    /// `entryPointModule` names a definition that does not exist.
    E103,

    // =========================================================================
    // Structure Errors (E2xx)
    // =========================================================================
    /// Invalid field type.
    ///
    /// A field has the wrong JSON type (for example a string where an array
    /// is expected).
    E200,

    /// Invalid input specification.
    ///
    /// An input must be a non-empty string or `{name, size?}`.
    E201,

    /// Invalid bus size.
    ///
    /// `size` must be a positive integer.
    E202,

    /// Invalid output name.
    E203,

    /// Duplicate port name.
    ///
    /// An input or output name is declared twice in one definition.
    E204,

    /// Undeclared output mapping.
    ///
    /// `outputMappings` maps a name that is not listed in `outputs`.
    E205,

    /// Invalid output mapping target.
    ///
    /// An output mapping must be a `component.port` reference to a component
    /// of the same definition.
    E206,

    /// Invalid component id.
    E207,

    /// Duplicate component id.
    E208,

    /// Invalid component type.
    E209,

    /// Unmapped output.
    ///
    /// A declared output has no entry in `outputMappings`.
    E210,

    /// Ignored inputs.
    ///
    /// An `input` primitive declares `inputs`, which are never read.
    E211,

    // =========================================================================
    // Reference Errors (E3xx)
    // =========================================================================
    /// Undefined module type.
    E300,

    /// Missing module input.
    ///
    /// A module instance does not supply a declared input.
    E301,

    /// Connection shape mismatch.
    ///
    /// A scalar input needs one connection string; a bus input needs an
    /// array with exactly one connection per element.
    E302,

    /// Malformed connection.
    E303,

    /// Undefined module input.
    ///
    /// A `$.` reference names an input the enclosing definition does not
    /// declare, or appears outside any module definition.
    E304,

    /// Bus indexing mismatch.
    ///
    /// Bus inputs must be indexed and scalar inputs must not be.
    E305,

    /// Bus index out of bounds.
    E306,

    /// Undefined component reference.
    E307,

    /// Unknown module input.
    ///
    /// A module instance supplies an input its definition does not declare.
    E308,

    /// Invalid connection value.
    ///
    /// A connection must be a string.
    E309,

    /// Undefined module output.
    ///
    /// A reference reads an output port that the module does not declare.
    E310,
}

impl ErrorCode {
    /// Returns the numeric code as a string (e.g., "E001").
    pub fn as_str(&self) -> &'static str {
        match self {
            ErrorCode::E001 => "E001",
            ErrorCode::E002 => "E002",
            ErrorCode::E100 => "E100",
            ErrorCode::E101 => "E101",
            ErrorCode::E102 => "E102",
            ErrorCode::E103 => "E103",
            ErrorCode::E200 => "E200",
            ErrorCode::E201 => "E201",
            ErrorCode::E202 => "E202",
            ErrorCode::E203 => "E203",
            ErrorCode::E204 => "E204",
            ErrorCode::E205 => "E205",
            ErrorCode::E206 => "E206",
            ErrorCode::E207 => "E207",
            ErrorCode::E208 => "E208",
            ErrorCode::E209 => "E209",
            ErrorCode::E210 => "E210",
            ErrorCode::E211 => "E211",
            ErrorCode::E300 => "E300",
            ErrorCode::E301 => "E301",
            ErrorCode::E302 => "E302",
            ErrorCode::E303 => "E303",
            ErrorCode::E304 => "E304",
            ErrorCode::E305 => "E305",
            ErrorCode::E306 => "E306",
            ErrorCode::E307 => "E307",
            ErrorCode::E308 => "E308",
            ErrorCode::E309 => "E309",
            ErrorCode::E310 => "E310",
        }
    }

    /// Returns a short description of what this error code means.
    pub fn description(&self) -> &'static str {
        match self {
            ErrorCode::E001 => "invalid json",
            ErrorCode::E002 => "schema mismatch",
            ErrorCode::E100 => "invalid root shape",
            ErrorCode::E101 => "missing required key",
            ErrorCode::E102 => "invalid entry point",
            ErrorCode::E103 => "undefined entry point",
            ErrorCode::E200 => "invalid field type",
            ErrorCode::E201 => "invalid input specification",
            ErrorCode::E202 => "invalid bus size",
            ErrorCode::E203 => "invalid output name",
            ErrorCode::E204 => "duplicate port name",
            ErrorCode::E205 => "undeclared output mapping",
            ErrorCode::E206 => "invalid output mapping target",
            ErrorCode::E207 => "invalid component id",
            ErrorCode::E208 => "duplicate component id",
            ErrorCode::E209 => "invalid component type",
            ErrorCode::E210 => "unmapped output",
            ErrorCode::E211 => "ignored inputs",
            ErrorCode::E300 => "undefined module type",
            ErrorCode::E301 => "missing module input",
            ErrorCode::E302 => "connection shape mismatch",
            ErrorCode::E303 => "malformed connection",
            ErrorCode::E304 => "undefined module input",
            ErrorCode::E305 => "bus indexing mismatch",
            ErrorCode::E306 => "bus index out of bounds",
            ErrorCode::E307 => "undefined component",
            ErrorCode::E308 => "unknown module input",
            ErrorCode::E309 => "invalid connection value",
            ErrorCode::E310 => "undefined module output",
        }
    }
}

impl fmt::Display for ErrorCode {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.as_str())
    }
}
