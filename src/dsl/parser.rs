//! Parser for the query language.
//!
//! Grammar (in rough EBNF):
//!
//! query       = [ws] [conjunction]
//! conjunction = selection [ws] [("AND" | "OR") [ws]] [conjunction]
//! selection   = "(" conjunction ")"
//!             | ["-"] ATOM ":" (date | value)
//!             | ["-"] ATOM COMPARE NUMBER
//!             | value
//! value       = ATOM | NUMBER | STRING | REGEX
//! date        = any single token, kept as raw text
//!
//! Conjunctions nest to the right, and a missing `AND`/`OR` means `AND`.

use regex::{Regex, RegexBuilder};

use super::ast::{DateKey, Joint, Literal, Node};
use super::lexer::{Lexeme, Token, tokenize};
use crate::config::SelectConfig;
use crate::error::{ParseError, QueryError};

/// Upper bound on the compiled size of a query regex.
const REGEX_SIZE_LIMIT: usize = 1 << 20;

/// Parser state.
struct Parser<'a, 'c> {
    lexemes: Vec<Lexeme<'a>>,
    pos: usize,
    config: &'c SelectConfig,
}

impl<'a, 'c> Parser<'a, 'c> {
    fn new(lexemes: Vec<Lexeme<'a>>, config: &'c SelectConfig) -> Self {
        Parser {
            lexemes,
            pos: 0,
            config,
        }
    }

    fn peek(&self) -> Option<&Lexeme<'a>> {
        self.lexemes.get(self.pos)
    }

    /// Token `n` places ahead of the cursor.
    fn peek_token(&self, n: usize) -> Option<&Token> {
        self.lexemes.get(self.pos + n).map(|lexeme| &lexeme.token)
    }

    fn advance(&mut self) -> Option<Lexeme<'a>> {
        let lexeme = self.lexemes.get(self.pos).cloned();
        if lexeme.is_some() {
            self.pos += 1;
        }
        lexeme
    }

    fn skip_whitespace(&mut self) {
        while matches!(self.peek_token(0), Some(Token::Whitespace)) {
            self.pos += 1;
        }
    }

    fn unexpected(expected: &'static str, lexeme: Option<Lexeme<'_>>) -> ParseError {
        match lexeme {
            Some(lexeme) => ParseError::Unexpected {
                expected,
                found: lexeme.token.to_string(),
                column: lexeme.column,
            },
            None => ParseError::UnexpectedEnd { expected },
        }
    }

    fn expect_atom(&mut self, expected: &'static str) -> Result<String, ParseError> {
        match self.advance() {
            Some(Lexeme {
                token: Token::Atom(text),
                ..
            }) => Ok(text),
            other => Err(Self::unexpected(expected, other)),
        }
    }

    fn expect(&mut self, token: Token, expected: &'static str) -> Result<(), ParseError> {
        match self.advance() {
            Some(lexeme) if lexeme.token == token => Ok(()),
            other => Err(Self::unexpected(expected, other)),
        }
    }

    fn eat_negate(&mut self) -> bool {
        let negate = matches!(self.peek_token(0), Some(Token::Negate));
        if negate {
            self.pos += 1;
        }
        negate
    }

    /// Parse the whole query.
    fn parse_query(&mut self) -> Result<Node, ParseError> {
        self.skip_whitespace();
        if self.peek().is_none() {
            return Ok(Node::Everything);
        }

        let node = self.parse_conjunction()?;

        // A conjunction only stops early at a ')', which has no '(' at this level.
        match self.advance() {
            None => Ok(node),
            Some(Lexeme {
                token: Token::RParen,
                column,
                ..
            }) => Err(ParseError::UnbalancedParen { column }),
            other => Err(Self::unexpected("the end of the query", other)),
        }
    }

    /// Parse conjunction: selection [ws] [("AND" | "OR") [ws]] [conjunction]
    fn parse_conjunction(&mut self) -> Result<Node, ParseError> {
        self.skip_whitespace();
        let left = self.parse_selection()?;
        self.skip_whitespace();

        if matches!(self.peek_token(0), None | Some(Token::RParen)) {
            return Ok(left);
        }

        let joint = match self.peek_joint() {
            Some(joint) => {
                self.pos += 1;
                self.skip_whitespace();
                joint
            }
            None => Joint::And,
        };

        let right = self.parse_conjunction()?;
        Ok(Node::Conjunction {
            joint,
            left: Box::new(left),
            right: Box::new(right),
        })
    }

    /// `AND`/`OR` at the cursor, unless the word starts a selection such as `OR:x`.
    fn peek_joint(&self) -> Option<Joint> {
        let joint = match self.peek_token(0) {
            Some(Token::Atom(word)) if word == "AND" => Joint::And,
            Some(Token::Atom(word)) if word == "OR" => Joint::Or,
            _ => return None,
        };
        match self.peek_token(1) {
            Some(Token::Colon) | Some(Token::Compare(_)) => None,
            _ => Some(joint),
        }
    }

    /// Pick the selection form by looking at most three tokens ahead.
    fn parse_selection(&mut self) -> Result<Node, ParseError> {
        if matches!(self.peek_token(0), Some(Token::LParen)) {
            return self.parse_group();
        }

        let key_at = usize::from(matches!(self.peek_token(0), Some(Token::Negate)));
        if matches!(self.peek_token(key_at), Some(Token::Atom(_))) {
            match self.peek_token(key_at + 1) {
                Some(Token::Colon) => return self.parse_key_selection(),
                Some(Token::Compare(_)) => return self.parse_compare_selection(),
                _ => {}
            }
        }

        self.parse_match_all()
    }

    /// Parse group: "(" conjunction ")"
    fn parse_group(&mut self) -> Result<Node, ParseError> {
        self.advance(); // consume (
        let inner = self.parse_conjunction()?;
        self.expect(Token::RParen, "')'")?;
        Ok(inner)
    }

    /// Parse key selection: ["-"] ATOM ":" (date | value)
    fn parse_key_selection(&mut self) -> Result<Node, ParseError> {
        let negate = self.eat_negate();
        let key = self.expect_atom("a field name")?;
        self.expect(Token::Colon, "':'")?;

        if let Some(date_key) = DateKey::from_key(&key) {
            let value = self.parse_date()?;
            return Ok(Node::DateSelection {
                key: date_key,
                negate,
                value,
            });
        }

        let value = self.parse_literal()?;
        Ok(Node::Selection { key, negate, value })
    }

    /// Parse comparison: ["-"] ATOM COMPARE NUMBER
    fn parse_compare_selection(&mut self) -> Result<Node, ParseError> {
        let negate = self.eat_negate();
        let key = self.expect_atom("a field name")?;

        let op = match self.advance() {
            Some(Lexeme {
                token: Token::Compare(op),
                ..
            }) => op,
            other => {
                return Err(Self::unexpected(
                    "a comparison operator (\"<\", \">\", \"<=\", \">=\")",
                    other,
                ));
            }
        };

        match self.advance() {
            Some(Lexeme {
                token: Token::Number(value),
                ..
            }) => Ok(Node::CompareSelection {
                key,
                op,
                negate,
                value,
            }),
            other => Err(Self::unexpected("a number", other)),
        }
    }

    fn parse_match_all(&mut self) -> Result<Node, ParseError> {
        let value = self.parse_literal()?;
        Ok(Node::MatchAll { value })
    }

    /// The token after `before:`/`after:`, passed through as text.
    fn parse_date(&mut self) -> Result<String, ParseError> {
        let lexeme = self
            .advance()
            .ok_or(ParseError::UnexpectedEnd { expected: "a date" })?;

        Ok(match lexeme.token {
            Token::Atom(text) | Token::Str(text) | Token::Regex(text) => text,
            _ => lexeme.text.to_string(),
        })
    }

    /// Parse value: ATOM | NUMBER | STRING | REGEX
    ///
    /// Bare atoms and numbers become regexes when `prefer_regex` is set and
    /// strings otherwise; quoted and slashed values keep their own kind.
    fn parse_literal(&mut self) -> Result<Literal, ParseError> {
        let lexeme = self.advance();
        match lexeme {
            Some(Lexeme {
                token: Token::Atom(text),
                column,
                ..
            }) => self.cast_bare(text, column),
            Some(Lexeme {
                token: Token::Number(_),
                column,
                text,
            }) => self.cast_bare(text.to_string(), column),
            Some(Lexeme {
                token: Token::Str(text),
                ..
            }) => Ok(Literal::String(text)),
            Some(Lexeme {
                token: Token::Regex(pattern),
                column,
                ..
            }) => self.compile_regex(pattern, column).map(Literal::Regex),
            other => Err(Self::unexpected("a string or a regular expression", other)),
        }
    }

    fn cast_bare(&self, text: String, column: usize) -> Result<Literal, ParseError> {
        if self.config.prefer_regex {
            self.compile_regex(text, column).map(Literal::Regex)
        } else {
            Ok(Literal::String(text))
        }
    }

    fn compile_regex(&self, pattern: String, column: usize) -> Result<Regex, ParseError> {
        RegexBuilder::new(&pattern)
            .case_insensitive(!self.config.case_sensitive)
            .size_limit(REGEX_SIZE_LIMIT)
            .build()
            .map_err(|err| ParseError::InvalidRegex {
                pattern,
                column,
                reason: err.to_string(),
            })
    }
}

/// Parse a query string into an AST.
///
/// Regex literals are compiled here, so `config` decides their case sensitivity.
pub fn parse(input: &str, config: &SelectConfig) -> Result<Node, QueryError> {
    let lexemes = tokenize(input)?;
    let mut parser = Parser::new(lexemes, config);
    let node = parser.parse_query()?;
    tracing::debug!("Parsed query {:?} into {:?}", input, node);
    Ok(node)
}
