//! Byte ranges into a search expression.

use std::ops::Range;

/// Where a token or subexpression sits in the expression text.
///
/// Offsets are bytes, so a span can slice the original `&str` directly.
/// An empty span marks a position rather than a range.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub struct Span {
    pub start: usize,
    pub end: usize,
}

impl Span {
    pub fn new(start: usize, end: usize) -> Self {
        Self { start, end }
    }

    /// Smallest span containing both.
    pub fn merge(self, other: Span) -> Span {
        Span::new(self.start.min(other.start), self.end.max(other.end))
    }

    /// The covered text, or `""` if the span does not fit `expression`.
    pub fn slice(self, expression: &str) -> &str {
        expression.get(self.start..self.end).unwrap_or("")
    }

    /// One-based character column of the start.
    pub fn column(self, expression: &str) -> usize {
        let prefix = expression.get(..self.start).unwrap_or(expression);
        prefix.chars().count() + 1
    }

    /// Width in characters, at least one so a marker is always visible.
    pub fn width(self, expression: &str) -> usize {
        self.slice(expression).chars().count().max(1)
    }
}

impl From<Range<usize>> for Span {
    fn from(range: Range<usize>) -> Self {
        Span::new(range.start, range.end)
    }
}
