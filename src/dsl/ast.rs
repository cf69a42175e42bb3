//! AST types for the query language.

use regex::Regex;
use std::fmt;

/// A parsed query.
#[derive(Debug, Clone, PartialEq)]
pub enum Node {
    /// Two selections joined by `AND`/`OR` (or juxtaposition, which means `AND`).
    Conjunction {
        joint: Joint,
        left: Box<Node>,
        right: Box<Node>,
    },

    /// Field match: `last:cleese`, `-last:/^C/`
    Selection {
        key: String,
        negate: bool,
        value: Literal,
    },

    /// Numeric comparison: `age<83`, `-age>=48`
    CompareSelection {
        key: String,
        op: CompareOp,
        negate: bool,
        value: f64,
    },

    /// Date bound on the configured date field: `before:2020-01-01`, `after:yesterday`
    DateSelection {
        key: DateKey,
        negate: bool,
        value: String,
    },

    /// Bare value tested against every field of a record.
    MatchAll { value: Literal },

    /// Empty query.
    Everything,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Joint {
    And,
    Or,
}

/// Numeric comparison operator.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum CompareOp {
    Lt,  // <
    Gt,  // >
    Lte, // <=
    Gte, // >=
}

impl CompareOp {
    pub fn apply(self, left: f64, right: f64) -> bool {
        match self {
            CompareOp::Lt => left < right,
            CompareOp::Gt => left > right,
            CompareOp::Lte => left <= right,
            CompareOp::Gte => left >= right,
        }
    }
}

impl fmt::Display for CompareOp {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            CompareOp::Lt => write!(f, "<"),
            CompareOp::Gt => write!(f, ">"),
            CompareOp::Lte => write!(f, "<="),
            CompareOp::Gte => write!(f, ">="),
        }
    }
}

/// Reserved keys that select on the configured date field.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum DateKey {
    Before,
    After,
}

impl DateKey {
    pub fn from_key(key: &str) -> Option<Self> {
        match key {
            "before" => Some(DateKey::Before),
            "after" => Some(DateKey::After),
            _ => None,
        }
    }
}

/// A value to match a scalar against.
#[derive(Debug, Clone)]
pub enum Literal {
    String(String),
    Regex(Regex),
}

// Regexes compare by source pattern.
impl PartialEq for Literal {
    fn eq(&self, other: &Self) -> bool {
        match (self, other) {
            (Literal::String(a), Literal::String(b)) => a == b,
            (Literal::Regex(a), Literal::Regex(b)) => a.as_str() == b.as_str(),
            _ => false,
        }
    }
}
