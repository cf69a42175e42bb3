//! Filter driver: tokenize, parse, compile, then apply over a collection.

use rayon::prelude::*;
use std::sync::Arc;

use crate::clock::{Clock, SystemClock};
use crate::config::SelectConfig;
use crate::dsl::{Predicate, compile_with_clock, parse};
use crate::error::QueryError;
use crate::record::Record;

/// A compiled query, reusable across record collections.
#[derive(Debug)]
pub struct Query {
    source: String,
    predicate: Predicate,
}

impl Query {
    pub fn compile(query: &str, config: &SelectConfig) -> Result<Self, QueryError> {
        Self::with_clock(query, config, Arc::new(SystemClock))
    }

    /// Compile with an explicit clock; `yesterday` is resolved against it.
    pub fn with_clock(
        query: &str,
        config: &SelectConfig,
        clock: Arc<dyn Clock>,
    ) -> Result<Self, QueryError> {
        let node = parse(query, config)?;
        let predicate = compile_with_clock(node, config, clock);
        tracing::debug!("Compiled query {:?}", query);
        Ok(Query {
            source: query.to_string(),
            predicate,
        })
    }

    pub fn source(&self) -> &str {
        &self.source
    }

    pub fn matches(&self, record: &Record) -> bool {
        self.predicate.matches(record)
    }

    /// Matching records, in their original order.
    pub fn filter<'r>(&self, records: &'r [Record]) -> Vec<&'r Record> {
        let selected: Vec<&Record> = records.iter().filter(|r| self.matches(r)).collect();
        tracing::debug!(
            "Query {:?} selected {} of {} records",
            self.source,
            selected.len(),
            records.len()
        );
        selected
    }

    /// Like [`Query::filter`], spread over the rayon pool. Order is preserved.
    pub fn par_filter<'r>(&self, records: &'r [Record]) -> Vec<&'r Record> {
        let selected: Vec<&Record> = records.par_iter().filter(|r| self.matches(r)).collect();
        tracing::debug!(
            "Query {:?} selected {} of {} records (parallel)",
            self.source,
            selected.len(),
            records.len()
        );
        selected
    }
}

/// Select the records matching `query`, preserving their order.
pub fn select<'r>(
    query: &str,
    records: &'r [Record],
    config: &SelectConfig,
) -> Result<Vec<&'r Record>, QueryError> {
    Ok(Query::compile(query, config)?.filter(records))
}

/// Parallel [`select`].
pub fn select_par<'r>(
    query: &str,
    records: &'r [Record],
    config: &SelectConfig,
) -> Result<Vec<&'r Record>, QueryError> {
    Ok(Query::compile(query, config)?.par_filter(records))
}
