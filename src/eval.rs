//! Sandboxed evaluation of literal expressions
//!
//! Packed payloads are sometimes nothing more than a string, an array of strings or a
//! concatenation of them. This evaluator understands exactly that subset (literals, arrays,
//! `+`, unary operators and property access on the stub browser globals) and refuses
//! everything else, so untrusted input is never executed.

use thiserror::Error;

pub use context::{DEFAULT_USER_AGENT, EvalContext};
pub use value::Value;

mod context;
mod lexer;
mod parser;
mod value;

/// How deep parenthesised / nested expressions may go before giving up
pub const MAX_DEPTH: usize = 256;

#[derive(Debug, Error, PartialEq)]
pub enum EvalError {
    #[error("Unexpected character `{ch}` at position {pos}")]
    UnexpectedChar { ch: char, pos: usize },

    #[error("Unterminated string literal starting at position {0}")]
    UnterminatedString(usize),

    #[error("Invalid escape sequence at position {0}")]
    InvalidEscape(usize),

    #[error("Invalid number literal `{0}`")]
    InvalidNumber(String),

    #[error("Unexpected token `{token}` at position {pos}")]
    UnexpectedToken { token: String, pos: usize },

    #[error("Unexpected end of input")]
    UnexpectedEnd,

    #[error("{0} is not defined")]
    UndefinedIdentifier(String),

    #[error("Cannot read properties of {target} (reading '{property}')")]
    NullAccess { target: String, property: String },

    #[error("Expression nests deeper than {0} levels")]
    TooDeep(usize),
}

/// Evaluates `source` as a single expression against the given stub globals
///
/// # Errors
/// Errors on anything outside the supported literal subset, including unknown identifiers
pub fn evaluate(source: &str, context: &EvalContext) -> Result<Value, EvalError> {
    let tokens = lexer::tokenize(source)?;
    parser::Parser::new(&tokens, context).program()
}
