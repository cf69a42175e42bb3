//! Compiles a query AST into a reusable record predicate.

use regex::Regex;
use std::fmt;
use std::sync::Arc;
use time::{Duration, OffsetDateTime};

use super::ast::{DateKey, Joint, Literal, Node};
use crate::clock::{Clock, SystemClock};
use crate::config::SelectConfig;
use crate::record::{Record, Value, parse_date};

/// A compiled query: a pure function from record to bool.
pub struct Predicate(Box<dyn Fn(&Record) -> bool + Send + Sync>);

impl Predicate {
    fn new(f: impl Fn(&Record) -> bool + Send + Sync + 'static) -> Self {
        Predicate(Box::new(f))
    }

    pub fn matches(&self, record: &Record) -> bool {
        (self.0)(record)
    }
}

impl fmt::Debug for Predicate {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str("Predicate")
    }
}

/// Matches a single field value against a literal.
enum ScalarMatcher {
    Exact(String),
    /// Holds the lowercased literal.
    Folded(String),
    Regex(Regex),
}

impl ScalarMatcher {
    fn new(literal: Literal, config: &SelectConfig) -> Self {
        match literal {
            Literal::String(s) if config.case_sensitive => ScalarMatcher::Exact(s),
            Literal::String(s) => ScalarMatcher::Folded(s.to_lowercase()),
            Literal::Regex(regex) => ScalarMatcher::Regex(regex),
        }
    }

    fn matches(&self, value: &Value) -> bool {
        let text = value.text();
        match self {
            ScalarMatcher::Exact(expected) => text == expected.as_str(),
            ScalarMatcher::Folded(expected) => text.to_lowercase() == *expected,
            ScalarMatcher::Regex(regex) => regex.is_match(&text),
        }
    }
}

enum DateBound {
    /// `yesterday`, resolved each time the predicate runs.
    Yesterday(Arc<dyn Clock>),
    Fixed(OffsetDateTime),
}

impl DateBound {
    fn resolve(&self) -> OffsetDateTime {
        match self {
            DateBound::Yesterday(clock) => clock.now().saturating_sub(Duration::DAY),
            DateBound::Fixed(dt) => *dt,
        }
    }
}

/// Compile against the system clock.
pub fn compile(node: Node, config: &SelectConfig) -> Predicate {
    compile_with_clock(node, config, Arc::new(SystemClock))
}

/// Compile with an explicit clock for relative dates.
pub fn compile_with_clock(node: Node, config: &SelectConfig, clock: Arc<dyn Clock>) -> Predicate {
    compile_node(node, config, &clock)
}

fn compile_node(node: Node, config: &SelectConfig, clock: &Arc<dyn Clock>) -> Predicate {
    match node {
        Node::Everything => Predicate::new(|_| true),

        Node::Conjunction { joint, left, right } => {
            let left = compile_node(*left, config, clock);
            let right = compile_node(*right, config, clock);
            match joint {
                Joint::And => {
                    Predicate::new(move |record| left.matches(record) && right.matches(record))
                }
                Joint::Or => {
                    Predicate::new(move |record| left.matches(record) || right.matches(record))
                }
            }
        }

        Node::Selection { key, negate, value } => {
            let matcher = ScalarMatcher::new(value, config);
            Predicate::new(move |record| {
                let hit = record.get(&key).is_some_and(|v| matcher.matches(v));
                hit != negate
            })
        }

        Node::CompareSelection {
            key,
            op,
            negate,
            value,
        } => Predicate::new(move |record| {
            let hit = record
                .get(&key)
                .and_then(Value::as_number)
                .is_some_and(|actual| op.apply(actual, value));
            hit != negate
        }),

        Node::DateSelection { key, negate, value } => {
            compile_date(key, negate, &value, config, clock)
        }

        Node::MatchAll { value } => {
            let matcher = ScalarMatcher::new(value, config);
            Predicate::new(move |record| record.values().any(|v| matcher.matches(v)))
        }
    }
}

fn compile_date(
    key: DateKey,
    negate: bool,
    value: &str,
    config: &SelectConfig,
    clock: &Arc<dyn Clock>,
) -> Predicate {
    let bound = if value.eq_ignore_ascii_case("yesterday") {
        DateBound::Yesterday(Arc::clone(clock))
    } else if let Some(dt) = parse_date(value) {
        DateBound::Fixed(dt)
    } else {
        tracing::warn!(
            "Unrecognized date {:?} in {:?} selection; it matches nothing",
            value,
            key
        );
        return Predicate::new(move |_| negate);
    };

    let date_key = config.date_key.clone();
    Predicate::new(move |record| {
        let resolved = bound.resolve();
        let hit = record
            .get(&date_key)
            .and_then(Value::as_date)
            .is_some_and(|date| match key {
                DateKey::Before => date < resolved,
                DateKey::After => date > resolved,
            });
        hit != negate
    })
}
