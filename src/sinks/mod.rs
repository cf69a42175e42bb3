use anyhow::Result;
use serde_json::Value;

pub mod json;
pub mod jsonl;

pub use self::json::JsonSink;
pub use self::jsonl::JsonlSink;

/// Destination for selected records.
pub trait RecordSink: Send {
    fn add_record(&mut self, record: &Value) -> Result<()>;
    fn finish(&mut self) -> Result<()>;
}
