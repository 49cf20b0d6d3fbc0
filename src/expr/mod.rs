//! Expression language for generic `rs-<attr>` bindings
//!
//! A deliberately small grammar evaluated against an explicit [`Frame`]:
//!
//! ```text
//! expr        := logical_or ( "?" expr ":" expr )?
//! logical_or  := logical_and ( "||" logical_and )*
//! logical_and := equality ( "&&" equality )*
//! equality    := relational ( ( "===" | "!==" | "==" | "!=" ) relational )*
//! relational  := unary ( ( "<" | "<=" | ">" | ">=" ) unary )*
//! unary       := ( "!" | "-" | "+" ) unary | postfix
//! postfix     := primary ( "." ident | "[" expr "]" )*
//! primary     := number | string | true | false | null | undefined
//!              | ident | "(" expr ")"
//! ```
//!
//! Identifiers read loop locals first, then store variables. Nothing in an
//! expression can call functions, assign, or reach state outside the frame.

mod eval;
mod lexer;
mod parser;

pub use eval::{evaluate, evaluate_expr, Frame};
pub use lexer::{lex, Token, TokenKind};
pub use parser::{parse, BinaryOp, Expr, LogicalOp, UnaryOp};

use thiserror::Error;

/// Lexing, parsing and evaluation failures
#[derive(Error, Debug, Clone, PartialEq)]
pub enum ExprError {
    #[error("unexpected character '{ch}' at {pos}")]
    UnexpectedChar { pos: usize, ch: char },

    #[error("unexpected token '{found}' at {pos}")]
    UnexpectedToken { pos: usize, found: String },

    #[error("unexpected end of expression")]
    UnexpectedEnd,

    #[error("unterminated string starting at {pos}")]
    UnterminatedString { pos: usize },

    #[error("expression nested deeper than {max} levels")]
    TooDeep { max: usize },

    #[error("'{name}' is not defined")]
    UnknownIdentifier { name: String },

    #[error("cannot read '{property}' of {target}")]
    NullAccess { property: String, target: &'static str },
}
