//! Errors raised while reading a search expression.

use std::fmt::Write as _;

use thiserror::Error;

use crate::span::Span;

/// A search expression that could not be tokenized, reordered into
/// postfix or assembled into a tree.
#[derive(Debug, Clone, PartialEq, Error)]
#[error("{message} (offset {})", .span.start)]
pub struct ParseError {
    pub message: String,
    /// Offending text; empty when the whole expression is at fault.
    pub span: Span,
    /// How to correct the expression, when there is an obvious fix.
    pub hint: Option<String>,
}

impl ParseError {
    pub fn new(message: impl Into<String>, span: Span) -> Self {
        Self {
            message: message.into(),
            span,
            hint: None,
        }
    }

    pub fn with_hint(mut self, hint: impl Into<String>) -> Self {
        self.hint = Some(hint.into());
        self
    }

    /// Byte offset where the problem starts.
    pub fn position(&self) -> usize {
        self.span.start
    }

    /// Multi-line report echoing `expression` with the span marked:
    ///
    /// ```text
    /// error: operator 'AND' is missing an operand
    ///   pgc:1 and
    ///         ^^^
    ///   column 7
    /// ```
    pub fn render(&self, expression: &str) -> String {
        let column = self.span.column(expression);
        let mut report = String::new();
        let _ = writeln!(report, "error: {}", self.message);
        let _ = writeln!(report, "  {}", expression);
        let _ = writeln!(
            report,
            "  {}{}",
            " ".repeat(column - 1),
            "^".repeat(self.span.width(expression))
        );
        let _ = writeln!(report, "  column {}", column);
        if let Some(hint) = &self.hint {
            let _ = writeln!(report, "  hint: {}", hint);
        }
        report
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_display_names_offset() {
        let err = ParseError::new("unclosed '('", Span::new(13, 14));
        assert_eq!(err.to_string(), "unclosed '(' (offset 13)");
        assert_eq!(err.position(), 13);
    }

    #[test]
    fn test_render_marks_span() {
        let expression = "name:M33 xor pgc:1";
        let report = ParseError::new("unexpected input 'xor'", Span::new(9, 12))
            .with_hint("join search terms with AND or OR")
            .render(expression);
        let lines: Vec<&str> = report.lines().collect();
        assert_eq!(
            lines,
            vec![
                "error: unexpected input 'xor'",
                "  name:M33 xor pgc:1",
                "           ^^^",
                "  column 10",
                "  hint: join search terms with AND or OR",
            ]
        );
    }

    #[test]
    fn test_render_empty_expression() {
        let report = ParseError::new("empty expression", Span::default()).render("");
        assert!(report.contains("  ^\n"));
        assert!(!report.contains("hint"));
    }
}
