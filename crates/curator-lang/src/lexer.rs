//! Tokenizer for search expressions using logos.

use std::fmt;

use crate::error::ParseError;
use crate::span::Span;
use logos::Logos;

/// Search function a predicate applies.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum QueryFunction {
    /// Designation lookup.
    Name,
    /// Position lookup.
    Pos,
    /// Permanent identifier lookup.
    Pgc,
}

impl QueryFunction {
    pub fn as_str(&self) -> &'static str {
        match self {
            QueryFunction::Name => "name",
            QueryFunction::Pos => "pos",
            QueryFunction::Pgc => "pgc",
        }
    }

    fn from_prefix(prefix: &str) -> Option<Self> {
        match prefix {
            "name" => Some(QueryFunction::Name),
            "pos" => Some(QueryFunction::Pos),
            "pgc" => Some(QueryFunction::Pgc),
            _ => None,
        }
    }
}

impl fmt::Display for QueryFunction {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

/// A `function:value` predicate. Quotes around the value are stripped.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct FunctionCall {
    pub function: QueryFunction,
    pub value: String,
}

impl FunctionCall {
    pub fn new(function: QueryFunction, value: impl Into<String>) -> Self {
        Self {
            function,
            value: value.into(),
        }
    }
}

impl fmt::Display for FunctionCall {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let bare = !self.value.is_empty()
            && !self
                .value
                .chars()
                .any(|c| c.is_whitespace() || matches!(c, '(' | ')' | '"'));
        if bare {
            write!(f, "{}:{}", self.function, self.value)
        } else {
            write!(f, "{}:\"{}\"", self.function, self.value)
        }
    }
}

fn function_call(lex: &mut logos::Lexer<Token>) -> Option<FunctionCall> {
    let (prefix, value) = lex.slice().split_once(':')?;
    let function = QueryFunction::from_prefix(prefix)?;
    let value = value
        .strip_prefix('"')
        .and_then(|v| v.strip_suffix('"'))
        .unwrap_or(value);
    Some(FunctionCall::new(function, value))
}

/// Token types for search expressions.
#[derive(Logos, Debug, Clone, PartialEq)]
#[logos(skip r"[ \t\r\n]+")]
pub enum Token {
    #[token("(")]
    LParen,
    #[token(")")]
    RParen,

    // Operators; case-insensitive and followed by whitespace
    #[token("and", ignore(ascii_case))]
    And,
    #[token("or", ignore(ascii_case))]
    Or,

    // function:value or function:"quoted value"
    #[regex(r#"(name|pos|pgc):("[^"]*"|[^ \t\r\n()"]+)"#, function_call)]
    Function(FunctionCall),
}

impl Token {
    /// Binding strength of a binary operator; `None` for anything else.
    pub fn precedence(&self) -> Option<u8> {
        match self {
            Token::And => Some(1),
            Token::Or => Some(0),
            _ => None,
        }
    }
}

impl fmt::Display for Token {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Token::LParen => f.write_str("("),
            Token::RParen => f.write_str(")"),
            Token::And => f.write_str("AND"),
            Token::Or => f.write_str("OR"),
            Token::Function(call) => write!(f, "{}", call),
        }
    }
}

/// A token with its span in the source.
#[derive(Debug, Clone, PartialEq)]
pub struct SpannedToken {
    pub token: Token,
    pub span: Span,
}

impl SpannedToken {
    pub fn new(token: Token, span: Span) -> Self {
        Self { token, span }
    }
}

/// Lexer that produces spanned tokens or the first error.
pub struct Lexer<'source> {
    inner: logos::Lexer<'source, Token>,
    failed: bool,
}

impl<'source> Lexer<'source> {
    /// Create a new lexer for the given source.
    pub fn new(source: &'source str) -> Self {
        Self {
            inner: Token::lexer(source),
            failed: false,
        }
    }

    /// Get the source string.
    pub fn source(&self) -> &'source str {
        self.inner.source()
    }

    fn unexpected(&self, span: Span) -> ParseError {
        let found: String = self.source()[span.start..].chars().take(1).collect();
        let err = ParseError::new(format!("unexpected input '{}'", found), span);
        if found == "\"" {
            err.with_hint("quoted values must be closed and follow a function, e.g. name:\"NGC 224\"")
        } else {
            err.with_hint("expected name:, pos:, pgc:, AND, OR or parentheses")
        }
    }
}

impl Iterator for Lexer<'_> {
    type Item = Result<SpannedToken, ParseError>;

    fn next(&mut self) -> Option<Self::Item> {
        if self.failed {
            return None;
        }
        let result = self.inner.next()?;
        let span: Span = self.inner.span().into();

        let item = match result {
            Ok(token @ (Token::And | Token::Or)) => {
                let followed_by_space = self.source()[span.end..]
                    .chars()
                    .next()
                    .is_some_and(char::is_whitespace);
                if followed_by_space {
                    Ok(SpannedToken::new(token, span))
                } else {
                    Err(ParseError::new(
                        format!("operator '{}' must be followed by whitespace", token),
                        span,
                    ))
                }
            }
            Ok(token) => Ok(SpannedToken::new(token, span)),
            Err(()) => Err(self.unexpected(span)),
        };
        if item.is_err() {
            self.failed = true;
        }
        Some(item)
    }
}

/// Tokenize a whole expression, stopping at the first error.
pub fn tokenize(source: &str) -> Result<Vec<SpannedToken>, ParseError> {
    Lexer::new(source).collect()
}

#[cfg(test)]
mod tests {
    use super::*;

    fn tokens(source: &str) -> Vec<Token> {
        tokenize(source)
            .unwrap()
            .into_iter()
            .map(|t| t.token)
            .collect()
    }

    #[test]
    fn test_function_bare_and_quoted() {
        assert_eq!(
            tokens(r#"name:M33 pos:"01h33m50.9s +30d39m37s""#),
            vec![
                Token::Function(FunctionCall::new(QueryFunction::Name, "M33")),
                Token::Function(FunctionCall::new(
                    QueryFunction::Pos,
                    "01h33m50.9s +30d39m37s"
                )),
            ]
        );
    }

    #[test]
    fn test_operators_case_insensitive() {
        assert_eq!(
            tokens("pgc:1 AND pgc:2 Or pgc:3"),
            vec![
                Token::Function(FunctionCall::new(QueryFunction::Pgc, "1")),
                Token::And,
                Token::Function(FunctionCall::new(QueryFunction::Pgc, "2")),
                Token::Or,
                Token::Function(FunctionCall::new(QueryFunction::Pgc, "3")),
            ]
        );
    }

    #[test]
    fn test_parentheses_end_bare_value() {
        assert_eq!(
            tokens("(name:M31)"),
            vec![
                Token::LParen,
                Token::Function(FunctionCall::new(QueryFunction::Name, "M31")),
                Token::RParen,
            ]
        );
    }

    #[test]
    fn test_spans() {
        let spanned = tokenize("name:M33 or pgc:5818").unwrap();
        assert_eq!(spanned[0].span, Span::new(0, 8));
        assert_eq!(spanned[1].span, Span::new(9, 11));
        assert_eq!(spanned[2].span, Span::new(12, 20));
    }

    #[test]
    fn test_operator_needs_whitespace() {
        let err = tokenize("name:a and(name:b)").unwrap_err();
        assert_eq!(err.span, Span::new(7, 10));
    }

    #[test]
    fn test_unknown_function_reports_position() {
        let err = tokenize("name:M33 and ra:10").unwrap_err();
        assert_eq!(err.position(), 13);
    }

    #[test]
    fn test_display_requotes_values() {
        let call = FunctionCall::new(QueryFunction::Name, "NGC 224");
        assert_eq!(call.to_string(), "name:\"NGC 224\"");
        assert_eq!(Token::And.to_string(), "AND");
    }
}
