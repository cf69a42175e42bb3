//! Select records with a small, human-typed query language.
//!
//! ```
//! use recsift::{Record, SelectConfig, Value, select};
//!
//! let mut john = Record::new();
//! john.insert("last".into(), Value::from("Cleese"));
//! john.insert("age".into(), Value::from(83.0));
//!
//! let records = vec![john];
//! let selected = select("last:/^c/ age<=83", &records, &SelectConfig::default()).unwrap();
//! assert_eq!(selected.len(), 1);
//! ```

pub mod clock;
pub mod config;
pub mod dsl;
pub mod error;
pub mod record;
mod select;

pub use clock::{Clock, FixedClock, SystemClock};
pub use config::SelectConfig;
pub use error::{LexError, ParseError, QueryError};
pub use record::{Record, Value};
pub use select::{Query, select, select_par};
