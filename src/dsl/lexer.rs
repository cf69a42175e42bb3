//! Lexer/tokenizer for the query language.

use std::fmt;

use winnow::combinator::{alt, cut_err, preceded, repeat, terminated};
use winnow::prelude::*;
use winnow::token::{any, none_of, take_till, take_while};

use super::ast::CompareOp;
use crate::error::LexError;

/// Token types for the query language.
#[derive(Debug, Clone, PartialEq)]
pub enum Token {
    Whitespace,
    Negate, // -

    Number(f64),   // run of digits only
    Atom(String),  // key or bare value
    Regex(String), // /pattern/, raw
    Str(String),   // "text", unescaped

    Compare(CompareOp),

    Colon,  // :
    LParen, // (
    RParen, // )
}

impl fmt::Display for Token {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Token::Whitespace => write!(f, "whitespace"),
            Token::Negate => write!(f, "'-'"),
            Token::Number(n) => write!(f, "number {}", n),
            Token::Atom(s) => write!(f, "atom '{}'", s),
            Token::Regex(s) => write!(f, "regex /{}/", s),
            Token::Str(s) => write!(f, "string \"{}\"", s),
            Token::Compare(op) => write!(f, "'{}'", op),
            Token::Colon => write!(f, "':'"),
            Token::LParen => write!(f, "'('"),
            Token::RParen => write!(f, "')'"),
        }
    }
}

/// A token with its position in the query.
#[derive(Debug, Clone, PartialEq)]
pub struct Lexeme<'a> {
    pub token: Token,
    /// 0-based character column of the first character.
    pub column: usize,
    /// Source text the token was read from.
    pub text: &'a str,
}

type PResult<T> = Result<T, winnow::error::ErrMode<winnow::error::ContextError>>;

/// Characters that may appear in an atom. Covers what a bare regex needs.
fn is_atom_char(c: char) -> bool {
    c.is_ascii_alphanumeric() || matches!(c, '_' | '-' | '.' | '[' | ']' | '*' | '+' | '^' | '$')
}

fn lex_whitespace(input: &mut &str) -> PResult<Token> {
    take_while(1.., ' ').value(Token::Whitespace).parse_next(input)
}

fn lex_compare(input: &mut &str) -> PResult<Token> {
    alt((
        "<=".value(Token::Compare(CompareOp::Lte)),
        "<".value(Token::Compare(CompareOp::Lt)),
        ">=".value(Token::Compare(CompareOp::Gte)),
        ">".value(Token::Compare(CompareOp::Gt)),
    ))
    .parse_next(input)
}

/// Lex an atom, or a number when the run holds nothing but digits.
fn lex_word(input: &mut &str) -> PResult<Token> {
    let word = take_while(1.., is_atom_char).parse_next(input)?;
    if word.bytes().all(|b| b.is_ascii_digit()) {
        let n: f64 = word.parse().map_err(|_| {
            winnow::error::ErrMode::Backtrack(winnow::error::ContextError::default())
        })?;
        Ok(Token::Number(n))
    } else {
        Ok(Token::Atom(word.to_string()))
    }
}

/// `/pattern/` with no escapes.
fn lex_regex(input: &mut &str) -> PResult<Token> {
    preceded('/', cut_err(terminated(take_till(0.., '/'), '/')))
        .map(|pattern: &str| Token::Regex(pattern.to_string()))
        .parse_next(input)
}

/// `"text"` where `\"` is the only escape.
fn lex_string(input: &mut &str) -> PResult<Token> {
    preceded(
        '"',
        cut_err(terminated(
            repeat(0.., alt(("\\\"".value('"'), none_of('"')))),
            '"',
        )),
    )
    .map(|text: String| Token::Str(text))
    .parse_next(input)
}

/// Lex a single token; `None` for characters the language ignores.
fn lex_token(input: &mut &str) -> PResult<Option<Token>> {
    alt((
        lex_whitespace.map(Some),
        '-'.value(Some(Token::Negate)),
        lex_compare.map(Some),
        ':'.value(Some(Token::Colon)),
        '('.value(Some(Token::LParen)),
        ')'.value(Some(Token::RParen)),
        lex_regex.map(Some),
        lex_string.map(Some),
        lex_word.map(Some),
        any.value(None),
    ))
    .parse_next(input)
}

/// Tokenize the entire input.
pub fn tokenize(input: &str) -> Result<Vec<Lexeme<'_>>, LexError> {
    let mut remaining = input;
    let mut lexemes = Vec::new();
    let mut column = 0;

    while !remaining.is_empty() {
        let start = remaining;
        match lex_token(&mut remaining) {
            Ok(token) => {
                let text = &start[..start.len() - remaining.len()];
                if let Some(token) = token {
                    lexemes.push(Lexeme {
                        token,
                        column,
                        text,
                    });
                }
                column += text.chars().count();
            }
            // Only an unclosed regex or string can fail.
            Err(_) if start.starts_with('/') => {
                return Err(LexError::UnterminatedRegex { column });
            }
            Err(_) => return Err(LexError::UnterminatedString { column }),
        }
    }

    tracing::debug!("Tokenized {:?} into {} tokens", input, lexemes.len());
    Ok(lexemes)
}
