//! Error types for query tokenizing and parsing.

use thiserror::Error;

/// A literal that was opened but never closed.
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum LexError {
    #[error("Tokenize error: end of input while reading the regex starting at column {column}")]
    UnterminatedRegex { column: usize },

    #[error("Tokenize error: end of input while reading the string starting at column {column}")]
    UnterminatedString { column: usize },
}

/// The token stream does not fit the query grammar.
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum ParseError {
    #[error("Parse error: expected {expected}, but got {found} at column {column}")]
    Unexpected {
        expected: &'static str,
        found: String,
        column: usize,
    },

    #[error("Parse error: expected {expected}, but reached the end of the query")]
    UnexpectedEnd { expected: &'static str },

    #[error("Parse error: invalid regex /{pattern}/ at column {column}: {reason}")]
    InvalidRegex {
        pattern: String,
        column: usize,
        reason: String,
    },

    #[error("Parse error: unmatched ')' at column {column}")]
    UnbalancedParen { column: usize },
}

/// Any failure turning a query string into a predicate.
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum QueryError {
    #[error(transparent)]
    Lex(#[from] LexError),

    #[error(transparent)]
    Parse(#[from] ParseError),
}
