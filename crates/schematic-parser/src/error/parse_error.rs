//! Failure of reading, validating or lowering a description.
//!
//! A [`ParseError`] keeps every diagnostic of the failed attempt, warnings
//! included, in the order they were found. At least one of them is an error.

use std::fmt;

use crate::error::Diagnostic;

/// Every diagnostic of a description that could not be turned into a diagram.
#[derive(Debug)]
pub struct ParseError {
    diagnostics: Vec<Diagnostic>,
}

impl ParseError {
    pub fn new(diagnostics: Vec<Diagnostic>) -> Self {
        Self { diagnostics }
    }

    /// All diagnostics, in the order they were found.
    pub fn diagnostics(&self) -> &[Diagnostic] {
        &self.diagnostics
    }

    /// Diagnostics with error severity.
    pub fn errors(&self) -> impl Iterator<Item = &Diagnostic> {
        self.diagnostics
            .iter()
            .filter(|diagnostic| diagnostic.severity().is_error())
    }
}

impl fmt::Display for ParseError {
    /// Shows the first error, followed by the number of remaining errors.
    /// Warnings are not counted.
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let mut errors = self.errors();
        let Some(first) = errors.next() else {
            return f.write_str("invalid diagram description");
        };
        write!(f, "{first}")?;
        match errors.count() {
            0 => Ok(()),
            1 => f.write_str(" and 1 more error"),
            more => write!(f, " and {more} more errors"),
        }
    }
}

impl std::error::Error for ParseError {}

impl From<Diagnostic> for ParseError {
    fn from(diagnostic: Diagnostic) -> Self {
        Self::new(vec![diagnostic])
    }
}

impl From<Vec<Diagnostic>> for ParseError {
    fn from(diagnostics: Vec<Diagnostic>) -> Self {
        Self::new(diagnostics)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::error::ErrorCode;

    #[test]
    fn test_single_error() {
        let err: ParseError = Diagnostic::error("undefined module type `X`")
            .with_code(ErrorCode::E300)
            .into();

        assert_eq!(err.diagnostics().len(), 1);
        assert_eq!(err.to_string(), "error[E300]: undefined module type `X`");
    }

    #[test]
    fn test_warnings_are_kept_but_not_shown() {
        let err = ParseError::new(vec![
            Diagnostic::warning("output `z` is never mapped"),
            Diagnostic::error("first error"),
            Diagnostic::error("second error"),
            Diagnostic::error("third error"),
        ]);

        assert_eq!(err.diagnostics().len(), 4);
        assert_eq!(err.errors().count(), 3);
        assert_eq!(err.to_string(), "error: first error and 2 more errors");
    }

    #[test]
    fn test_two_errors() {
        let err: ParseError = vec![Diagnostic::error("a"), Diagnostic::error("b")].into();
        assert_eq!(err.to_string(), "error: a and 1 more error");
    }
}
