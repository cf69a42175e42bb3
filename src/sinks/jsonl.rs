use super::RecordSink;
use anyhow::Result;
use serde_json::Value;
use std::fs::File;
use std::io::{BufWriter, Write};
use std::path::Path;

/// One JSON object per line.
pub struct JsonlSink {
    writer: BufWriter<Box<dyn Write + Send>>,
}

impl JsonlSink {
    pub fn new<P: AsRef<Path>>(path: P) -> Result<Self> {
        let file = File::create(path)?;
        Ok(Self::from_writer(Box::new(file)))
    }

    pub fn stdout() -> Result<Self> {
        Ok(Self::from_writer(Box::new(std::io::stdout())))
    }

    pub fn from_writer(writer: Box<dyn Write + Send>) -> Self {
        Self {
            writer: BufWriter::new(writer),
        }
    }
}

impl RecordSink for JsonlSink {
    fn add_record(&mut self, record: &Value) -> Result<()> {
        serde_json::to_writer(&mut self.writer, record)?;
        writeln!(self.writer)?;
        Ok(())
    }

    fn finish(&mut self) -> Result<()> {
        self.writer.flush()?;
        Ok(())
    }
}
