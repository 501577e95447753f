//! Collector for accumulating diagnostics during a processing phase.
//!
//! The [`DiagnosticCollector`] allows the validator to report every problem
//! it can see instead of failing on the first error encountered.

use crate::error::Diagnostic;

/// A collector for accumulating diagnostics during a processing phase.
#[derive(Debug, Default)]
pub(crate) struct DiagnosticCollector {
    diagnostics: Vec<Diagnostic>,
    has_errors: bool,
}

impl DiagnosticCollector {
    /// Emit a diagnostic to this collector.
    ///
    /// The diagnostic is added to the collection and if it's an error,
    /// the collector is marked as having errors.
    pub(crate) fn emit(&mut self, diagnostic: Diagnostic) {
        if diagnostic.severity().is_error() {
            self.has_errors = true;
        }
        self.diagnostics.push(diagnostic);
    }

    /// Returns `true` once any error has been emitted.
    pub(crate) fn has_errors(&self) -> bool {
        self.has_errors
    }

    /// Finish collection and return every diagnostic in emission order.
    pub(crate) fn into_diagnostics(self) -> Vec<Diagnostic> {
        self.diagnostics
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::error::ErrorCode;

    #[test]
    fn test_collector_default_is_empty() {
        let collector = DiagnosticCollector::default();
        assert!(!collector.has_errors());
        assert!(collector.into_diagnostics().is_empty());
    }

    #[test]
    fn test_collector_emit_error() {
        let mut collector = DiagnosticCollector::default();

        collector.emit(Diagnostic::error("test error"));

        assert!(collector.has_errors());
    }

    #[test]
    fn test_collector_emit_warning() {
        let mut collector = DiagnosticCollector::default();

        collector.emit(Diagnostic::warning("test warning"));

        assert!(!collector.has_errors());
        assert_eq!(collector.into_diagnostics().len(), 1);
    }

    #[test]
    fn test_collector_keeps_emission_order() {
        let mut collector = DiagnosticCollector::default();

        collector.emit(Diagnostic::error("error 1").with_code(ErrorCode::E300));
        collector.emit(Diagnostic::warning("warning 1"));
        collector.emit(Diagnostic::error("error 2"));

        let messages: Vec<_> = collector
            .into_diagnostics()
            .iter()
            .map(|diag| diag.message().to_string())
            .collect();
        assert_eq!(messages, ["error 1", "warning 1", "error 2"]);
    }
}
