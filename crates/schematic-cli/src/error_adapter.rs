//! Error adapter for converting SchematicError to miette diagnostics.
//!
//! Validation failures carry several diagnostics; each one becomes its own
//! [`Reportable`]. Structural diagnostics are located by a JSON path rather
//! than a source span, so only syntax errors point into the source text.
//! Every other [`SchematicError`] becomes a single plain report.

use std::fmt;

use miette::{Diagnostic as MietteDiagnostic, LabeledSpan, Severity, SourceCode, SourceSpan};

use schematic::SchematicError;
use schematic_parser::{Span, error::Diagnostic};

/// One report that miette can render.
#[derive(Debug)]
pub enum Reportable<'a> {
    /// A validation diagnostic together with the description it refers to.
    Diagnostic { diag: &'a Diagnostic, src: &'a str },
    /// Any failure after validation, or before the description was read.
    Error(&'a SchematicError),
}

impl fmt::Display for Reportable<'_> {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::Diagnostic { diag, .. } => {
                write!(f, "{}", diag.message())?;
                if let Some(path) = diag.path() {
                    write!(f, " (at {path})")?;
                }
                Ok(())
            }
            Self::Error(err) => fmt::Display::fmt(err, f),
        }
    }
}

impl std::error::Error for Reportable<'_> {
    fn source(&self) -> Option<&(dyn std::error::Error + 'static)> {
        match self {
            Self::Diagnostic { .. } => None,
            Self::Error(err) => err.source(),
        }
    }
}

impl MietteDiagnostic for Reportable<'_> {
    fn code<'a>(&'a self) -> Option<Box<dyn fmt::Display + 'a>> {
        let code: Box<dyn fmt::Display> = match self {
            Self::Diagnostic { diag, .. } => Box::new(diag.code()?),
            Self::Error(SchematicError::Parse { .. }) => return None,
            Self::Error(SchematicError::Io(_)) => Box::new("schematic::io"),
            Self::Error(SchematicError::Resolve(_)) => Box::new("schematic::resolve"),
            Self::Error(SchematicError::Layout(_)) => Box::new("schematic::layout"),
            Self::Error(SchematicError::Export(_)) => Box::new("schematic::export"),
        };
        Some(code)
    }

    fn severity(&self) -> Option<Severity> {
        match self {
            Self::Diagnostic { diag, .. } if diag.severity().is_warning() => Some(Severity::Warning),
            _ => Some(Severity::Error),
        }
    }

    fn help<'a>(&'a self) -> Option<Box<dyn fmt::Display + 'a>> {
        match self {
            Self::Diagnostic { diag, .. } => diag
                .help()
                .map(|help| Box::new(help) as Box<dyn fmt::Display>),
            Self::Error(_) => None,
        }
    }

    fn source_code(&self) -> Option<&dyn SourceCode> {
        match self {
            Self::Diagnostic { src, .. } => Some(src as &dyn SourceCode),
            Self::Error(_) => None,
        }
    }

    fn labels(&self) -> Option<Box<dyn Iterator<Item = LabeledSpan> + '_>> {
        let Self::Diagnostic { diag, .. } = self else {
            return None;
        };
        if diag.labels().is_empty() {
            return None;
        }

        Some(Box::new(diag.labels().iter().map(|label| {
            LabeledSpan::new_primary_with_span(
                Some(label.message().to_string()),
                span_to_miette(label.span()),
            )
        })))
    }
}

fn span_to_miette(span: Span) -> SourceSpan {
    SourceSpan::new(span.start().into(), span.len())
}

/// Convert a [`SchematicError`] into a list of reportable errors.
///
/// For [`SchematicError::Parse`], this returns one [`Reportable`] for
/// each diagnostic in the error. For other error variants, this returns a
/// single [`Reportable`].
pub fn to_reportables(err: &SchematicError) -> Vec<Reportable<'_>> {
    match err {
        SchematicError::Parse {
            err: parse_err,
            src,
        } => parse_err
            .diagnostics()
            .iter()
            .map(|diag| Reportable::Diagnostic { diag, src })
            .collect(),
        _ => vec![Reportable::Error(err)],
    }
}
