//! Expression trees assembled from postfix token streams.

use std::fmt;

use crate::error::ParseError;
use crate::lexer::{FunctionCall, QueryFunction, SpannedToken, Token};
use crate::span::Span;

/// A boolean search expression.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Expr {
    Function(FunctionCall),
    And(Box<Expr>, Box<Expr>),
    Or(Box<Expr>, Box<Expr>),
}

impl Expr {
    pub fn function(function: QueryFunction, value: impl Into<String>) -> Self {
        Expr::Function(FunctionCall::new(function, value))
    }

    pub fn and(left: Expr, right: Expr) -> Self {
        Expr::And(Box::new(left), Box::new(right))
    }

    pub fn or(left: Expr, right: Expr) -> Self {
        Expr::Or(Box::new(left), Box::new(right))
    }

    /// Evaluate with `predicate` deciding each `function:value` leaf.
    ///
    /// Evaluation short-circuits: the right operand of `AND`/`OR` is only
    /// consulted when the left one does not decide the result.
    pub fn evaluate<F>(&self, predicate: &F) -> bool
    where
        F: Fn(QueryFunction, &str) -> bool,
    {
        match self {
            Expr::Function(call) => predicate(call.function, &call.value),
            Expr::And(left, right) => left.evaluate(predicate) && right.evaluate(predicate),
            Expr::Or(left, right) => left.evaluate(predicate) || right.evaluate(predicate),
        }
    }

    /// Leaf predicates from left to right.
    pub fn functions(&self) -> Vec<&FunctionCall> {
        let mut calls = Vec::new();
        self.collect_functions(&mut calls);
        calls
    }

    fn collect_functions<'a>(&'a self, calls: &mut Vec<&'a FunctionCall>) {
        match self {
            Expr::Function(call) => calls.push(call),
            Expr::And(left, right) | Expr::Or(left, right) => {
                left.collect_functions(calls);
                right.collect_functions(calls);
            }
        }
    }
}

impl fmt::Display for Expr {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Expr::Function(call) => write!(f, "{}", call),
            Expr::And(left, right) => write!(f, "({} AND {})", left, right),
            Expr::Or(left, right) => write!(f, "({} OR {})", left, right),
        }
    }
}

/// Assemble a tree from a postfix stream.
///
/// An operator without two operands fails at the operator; operands left
/// without an operator joining them fail at the first stray operand.
pub fn build_tree(postfix: &[SpannedToken]) -> Result<Expr, ParseError> {
    let mut stack: Vec<(Expr, Span)> = Vec::new();

    for spanned in postfix {
        match &spanned.token {
            Token::Function(call) => stack.push((Expr::Function(call.clone()), spanned.span)),
            Token::And | Token::Or => {
                let (Some((right, right_span)), Some((left, left_span))) = (stack.pop(), stack.pop())
                else {
                    return Err(ParseError::new(
                        format!("operator '{}' is missing an operand", spanned.token),
                        spanned.span,
                    ));
                };
                let span = left_span.merge(right_span).merge(spanned.span);
                let expr = if spanned.token == Token::And {
                    Expr::and(left, right)
                } else {
                    Expr::or(left, right)
                };
                stack.push((expr, span));
            }
            Token::LParen | Token::RParen => {
                return Err(ParseError::new(
                    format!("unexpected '{}' in postfix expression", spanned.token),
                    spanned.span,
                ))
            }
        }
    }

    let mut operands = stack.into_iter();
    match (operands.next(), operands.next()) {
        (Some((expr, _)), None) => Ok(expr),
        (None, _) => Err(ParseError::new("empty expression", Span::default())),
        (Some(_), Some((_, stray))) => Err(ParseError::new("expected AND or OR between terms", stray)
            .with_hint("join search terms with AND or OR")),
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::parser::{parse, parse_postfix};

    #[test]
    fn test_tree_shape() {
        let expr = parse("name:M33 or name:M31 and pgc:2557").unwrap();
        assert_eq!(
            expr,
            Expr::or(
                Expr::function(QueryFunction::Name, "M33"),
                Expr::and(
                    Expr::function(QueryFunction::Name, "M31"),
                    Expr::function(QueryFunction::Pgc, "2557"),
                ),
            )
        );
        assert_eq!(expr.to_string(), "(name:M33 OR (name:M31 AND pgc:2557))");
    }

    #[test]
    fn test_evaluate() {
        let expr = parse("(name:M33 or name:Triangulum) and pgc:5818").unwrap();
        let known = |function: QueryFunction, value: &str| match function {
            QueryFunction::Name => value == "Triangulum",
            QueryFunction::Pgc => value == "5818",
            QueryFunction::Pos => false,
        };
        assert!(expr.evaluate(&known));

        let expr = parse("name:M33 and pgc:5818").unwrap();
        assert!(!expr.evaluate(&known));
    }

    #[test]
    fn test_missing_operand() {
        let postfix = parse_postfix("pgc:1 and").unwrap_err();
        // The tokenizer already rejects a trailing operator without whitespace.
        assert_eq!(postfix.position(), 6);

        let err = parse("pgc:1 and ").unwrap_err();
        assert_eq!(err.message, "operator 'AND' is missing an operand");
        assert_eq!(err.position(), 6);
    }

    #[test]
    fn test_adjacent_terms_rejected() {
        let err = parse("name:M33 pgc:5818").unwrap_err();
        assert_eq!(err.position(), 9);
    }

    #[test]
    fn test_empty_expression() {
        assert_eq!(parse("  ").unwrap_err().message, "empty expression");
        assert_eq!(parse("()").unwrap_err().message, "empty expression");
    }

    #[test]
    fn test_functions_in_order() {
        let expr = parse("pos:\"10.68 41.27\" or name:M31").unwrap();
        let values: Vec<&str> = expr.functions().iter().map(|c| c.value.as_str()).collect();
        assert_eq!(values, vec!["10.68 41.27", "M31"]);
    }
}
