//! Labeled source spans for diagnostic messages.
//!
//! A label associates a message with a span in the source text. Only
//! diagnostics raised while reading the raw JSON carry labels; structural
//! diagnostics are located by JSON path instead.

use crate::span::Span;

/// A labeled span in source text.
#[derive(Debug, Clone)]
pub struct Label {
    span: Span,
    message: String,
}

impl Label {
    /// Create a new label.
    pub fn new(span: Span, message: impl Into<String>) -> Self {
        Self {
            span,
            message: message.into(),
        }
    }

    /// Get the span this label applies to.
    pub fn span(&self) -> Span {
        self.span
    }

    /// Get the label message.
    pub fn message(&self) -> &str {
        &self.message
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_label() {
        let label = Label::new(Span::new(10..20), "unexpected end of input");

        assert_eq!(label.span().start(), 10);
        assert_eq!(label.span().end(), 20);
        assert_eq!(label.message(), "unexpected end of input");
    }
}
