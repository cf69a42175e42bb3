//! Query language for selecting records.
//!
//! Syntax:
//!   value                   - any field equals value
//!   /regex/                 - any field matches regex
//!   "quoted value"          - any field equals the text (`\"` escapes a quote)
//!   key:value               - field equals value (or matches, with prefer_regex)
//!   key:/regex/             - field matches regex
//!   -key:value              - negated selection
//!   key<n, key>=n, etc.     - numeric comparison
//!   before:date, after:date - bound on the configured date field (`yesterday` works too)
//!   expr1 expr2             - AND
//!   expr1 AND expr2         - AND
//!   expr1 OR expr2          - OR (nests to the right: `a OR b c` is `a OR (b AND c)`)
//!   (expr)                  - grouping

mod ast;
mod compile;
mod lexer;
mod parser;

pub use ast::*;
pub use compile::{Predicate, compile, compile_with_clock};
pub use lexer::{Lexeme, Token, tokenize};
pub use parser::parse;
