//! Shunting-yard conversion of infix token streams to postfix.
//!
//! `AND` binds tighter than `OR`; operators of equal precedence associate
//! to the left.

use crate::ast::{build_tree, Expr};
use crate::error::ParseError;
use crate::lexer::{tokenize, SpannedToken, Token};

/// Reorder tokens into postfix (reverse Polish) order.
///
/// Parentheses are consumed. A `)` without a matching `(` fails at the
/// `)`; a `(` left open at the end fails at the `(`.
pub fn to_postfix(tokens: Vec<SpannedToken>) -> Result<Vec<SpannedToken>, ParseError> {
    let mut output = Vec::with_capacity(tokens.len());
    let mut holding: Vec<SpannedToken> = Vec::new();

    for spanned in tokens {
        match spanned.token {
            Token::Function(_) => output.push(spanned),
            Token::And | Token::Or => {
                let precedence = spanned.token.precedence().unwrap_or_default();
                while let Some(top) = holding.last() {
                    match top.token.precedence() {
                        Some(top_precedence) if top_precedence >= precedence => {
                            if let Some(op) = holding.pop() {
                                output.push(op);
                            }
                        }
                        _ => break,
                    }
                }
                holding.push(spanned);
            }
            Token::LParen => holding.push(spanned),
            Token::RParen => loop {
                match holding.pop() {
                    Some(SpannedToken {
                        token: Token::LParen,
                        ..
                    }) => break,
                    Some(op) => output.push(op),
                    None => {
                        return Err(ParseError::new("unmatched ')'", spanned.span)
                            .with_hint("remove it or add a matching '(' before it"))
                    }
                }
            },
        }
    }

    while let Some(op) = holding.pop() {
        if op.token == Token::LParen {
            return Err(ParseError::new("unclosed '('", op.span).with_hint("add a matching ')'"));
        }
        output.push(op);
    }

    Ok(output)
}

/// Tokenize and convert to postfix.
pub fn parse_postfix(source: &str) -> Result<Vec<SpannedToken>, ParseError> {
    to_postfix(tokenize(source)?)
}

/// Parse an expression into an evaluable tree.
pub fn parse(source: &str) -> Result<Expr, ParseError> {
    let postfix = parse_postfix(source)?;
    build_tree(&postfix)
}
