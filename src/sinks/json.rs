use super::RecordSink;
use anyhow::Result;
use serde_json::Value;
use std::fs::File;
use std::io::{BufWriter, Write};
use std::path::Path;

/// A single JSON array, one record per line.
pub struct JsonSink {
    writer: BufWriter<Box<dyn Write + Send>>,
    first_record: bool,
}

impl JsonSink {
    pub fn new<P: AsRef<Path>>(path: P) -> Result<Self> {
        let file = File::create(path)?;
        Self::from_writer(Box::new(file))
    }

    pub fn stdout() -> Result<Self> {
        Self::from_writer(Box::new(std::io::stdout()))
    }

    pub fn from_writer(writer: Box<dyn Write + Send>) -> Result<Self> {
        let mut writer = BufWriter::new(writer);
        write!(writer, "[")?;
        Ok(Self {
            writer,
            first_record: true,
        })
    }
}

impl RecordSink for JsonSink {
    fn add_record(&mut self, record: &Value) -> Result<()> {
        if !self.first_record {
            write!(self.writer, ",")?;
        }
        self.first_record = false;

        writeln!(self.writer)?;
        write!(self.writer, "  ")?;
        serde_json::to_writer(&mut self.writer, record)?;
        Ok(())
    }

    fn finish(&mut self) -> Result<()> {
        // Close the array
        writeln!(self.writer)?;
        writeln!(self.writer, "]")?;
        self.writer.flush()?;
        Ok(())
    }
}
