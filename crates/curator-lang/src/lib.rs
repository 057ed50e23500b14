//! Curator search expressions
//!
//! This crate parses the boolean search language used to look up curated
//! objects by designation, position or permanent identifier.
//!
//! # Syntax
//!
//! ```text
//! name:M33
//! pgc:5818
//! pos:"01h33m50.9s +30d39m37s"
//! name:M33 and pos:"12h 30m 49.32s +12d 23' 33.2''"
//! (name:M31 or name:Andromeda) AND pgc:2557
//! ```
//!
//! `AND` binds tighter than `OR` and both are case-insensitive. An operator
//! must be followed by whitespace.
//!
//! # Usage
//!
//! ```rust
//! use curator_lang::{parse, parse_postfix, QueryFunction};
//!
//! let postfix = parse_postfix("name:M33 or pgc:5818").unwrap();
//! assert_eq!(postfix.len(), 3);
//!
//! let expr = parse("name:M33 or pgc:5818").unwrap();
//! assert!(expr.evaluate(&|function: QueryFunction, value: &str| {
//!     function == QueryFunction::Pgc && value == "5818"
//! }));
//! ```

pub mod ast;
pub mod error;
pub mod lexer;
pub mod parser;
pub mod span;

// Re-export main types
pub use ast::{build_tree, Expr};
pub use error::ParseError;
pub use lexer::{tokenize, FunctionCall, Lexer, QueryFunction, SpannedToken, Token};
pub use parser::{parse, parse_postfix, to_postfix};
pub use span::Span;
