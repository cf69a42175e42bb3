use anyhow::{Context, Result, anyhow};
use clap::{Parser, ValueEnum};
use rayon::prelude::*;
use serde_json::Value as Json;
use std::io::Read;
use std::path::{Path, PathBuf};

use recsift::record::{Record, from_json};
use recsift::{Query, SelectConfig};

use crate::sinks::{JsonSink, JsonlSink, RecordSink};

#[derive(Parser)]
#[command(author, version, about, long_about = None)]
pub struct Cli {
    /// Query to select records with, e.g. `last:/^C/ age>=48`
    #[arg(short, long, allow_hyphen_values = true)]
    pub query: String,

    /// Input records: a JSON array or JSON lines (`-` for stdin)
    #[arg(short, long, default_value = "-")]
    pub input: PathBuf,

    /// Output file (.json, .jsonl), `-` for stdout
    #[arg(short, long, default_value = "-")]
    pub output: PathBuf,

    /// Query configuration file (YAML, TOML or JSON)
    #[arg(short, long, env = "RECSIFT_CONFIG")]
    pub config: Option<PathBuf>,

    /// Match string and regex literals with exact case
    #[arg(long)]
    pub case_sensitive: bool,

    /// Treat bare values as regular expressions
    #[arg(long)]
    pub prefer_regex: bool,

    /// Record field holding each record's date
    #[arg(long)]
    pub date_key: Option<String>,

    /// Number of threads; filters in parallel when set
    #[arg(short, long)]
    pub threads: Option<usize>,

    /// Enable verbose output
    #[arg(short, long)]
    pub verbose: bool,

    /// Output format (auto-detected if omitted)
    #[arg(long, value_enum)]
    pub format: Option<OutputFormat>,
}

#[derive(Copy, Clone, PartialEq, Eq, PartialOrd, Ord, ValueEnum, Debug)]
pub enum OutputFormat {
    #[value(name = "json")]
    Json,
    #[value(name = "jsonl", alias = "ndjson")]
    Jsonl,
}

/// A record as read, kept next to its original JSON for output.
#[derive(Debug)]
pub struct InputRecord {
    pub json: Json,
    pub record: Record,
}

pub fn output_format_label(format: &OutputFormat) -> &'static str {
    match format {
        OutputFormat::Json => "json",
        OutputFormat::Jsonl => "jsonl",
    }
}

/// Configuration file and environment, then command-line flags on top.
pub fn load_config(cli: &Cli) -> Result<SelectConfig> {
    let mut config = SelectConfig::load(cli.config.as_deref())
        .context("Config: Failed to load query configuration")?;

    if cli.case_sensitive {
        config.case_sensitive = true;
    }
    if cli.prefer_regex {
        config.prefer_regex = true;
    }
    if let Some(date_key) = &cli.date_key {
        config.date_key = date_key.clone();
    }

    Ok(config)
}

pub fn resolve_format(cli: &Cli) -> Result<OutputFormat> {
    if let Some(format) = cli.format {
        return Ok(format);
    }
    if cli.output == Path::new("-") {
        return Ok(OutputFormat::Jsonl);
    }

    let ext = cli
        .output
        .extension()
        .and_then(|ext| ext.to_str())
        .map(|ext| ext.to_lowercase());
    match ext.as_deref() {
        Some("json") => Ok(OutputFormat::Json),
        Some("jsonl") | Some("ndjson") => Ok(OutputFormat::Jsonl),
        _ => Err(anyhow!(
            "CLI: Could not detect output format from extension; use --format"
        )),
    }
}

pub fn init_sink(format: &OutputFormat, output: &Path) -> Result<Box<dyn RecordSink>> {
    let to_stdout = output == Path::new("-");
    if to_stdout {
        tracing::info!("Sink: {} -> stdout", output_format_label(format));
    } else {
        tracing::info!("Sink: {} -> {:?}", output_format_label(format), output);
    }

    let sink: Box<dyn RecordSink> = match (format, to_stdout) {
        (OutputFormat::Json, true) => Box::new(JsonSink::stdout()?),
        (OutputFormat::Json, false) => Box::new(
            JsonSink::new(output).with_context(|| format!("Sink: Failed to create {:?}", output))?,
        ),
        (OutputFormat::Jsonl, true) => Box::new(JsonlSink::stdout()?),
        (OutputFormat::Jsonl, false) => Box::new(
            JsonlSink::new(output).with_context(|| format!("Sink: Failed to create {:?}", output))?,
        ),
    };
    Ok(sink)
}

/// Read records from a file, or stdin for `-`.
pub fn load_input(path: &Path) -> Result<Vec<InputRecord>> {
    let content = if path == Path::new("-") {
        let mut buf = String::new();
        std::io::stdin()
            .read_to_string(&mut buf)
            .context("Input: Failed to read stdin")?;
        buf
    } else {
        std::fs::read_to_string(path)
            .with_context(|| format!("Input: Failed to read {:?}", path))?
    };
    parse_records(&content)
}

/// Parse a JSON array of objects, or one object per line.
pub fn parse_records(content: &str) -> Result<Vec<InputRecord>> {
    let values: Vec<Json> = if content.trim_start().starts_with('[') {
        serde_json::from_str(content).context("Input: Invalid JSON array")?
    } else {
        content
            .lines()
            .enumerate()
            .filter(|(_, line)| !line.trim().is_empty())
            .map(|(i, line)| {
                serde_json::from_str(line)
                    .with_context(|| format!("Input: Invalid JSON on line {}", i + 1))
            })
            .collect::<Result<_>>()?
    };

    values
        .into_iter()
        .enumerate()
        .map(|(i, json)| {
            let record = from_json(json.clone())
                .ok_or_else(|| anyhow!("Input: Record {} is not a JSON object", i + 1))?;
            Ok(InputRecord { json, record })
        })
        .collect()
}

/// Apply the query, keeping input order.
pub fn select_records<'a>(
    query: &Query,
    records: &'a [InputRecord],
    parallel: bool,
) -> Vec<&'a InputRecord> {
    if parallel {
        records
            .par_iter()
            .filter(|input| query.matches(&input.record))
            .collect()
    } else {
        records
            .iter()
            .filter(|input| query.matches(&input.record))
            .collect()
    }
}

pub fn write_records(sink: &mut dyn RecordSink, records: &[&InputRecord]) -> Result<()> {
    for input in records {
        sink.add_record(&input.json)?;
    }
    sink.finish().context("Sink: Failed to finalize output")
}

#[cfg(test)]
mod tests {
    use super::*;

    fn cli(args: &[&str]) -> Cli {
        let mut argv = vec!["recsift"];
        argv.extend_from_slice(args);
        Cli::parse_from(argv)
    }

    #[test]
    fn test_parses_json_array_and_lines() {
        let array = parse_records(r#"[{"a": 1}, {"a": 2}]"#).unwrap();
        let lines = parse_records("{\"a\": 1}\n\n{\"a\": 2}\n").unwrap();
        assert_eq!(array.len(), 2);
        assert_eq!(lines.len(), 2);
        assert_eq!(array[1].record, lines[1].record);
    }

    #[test]
    fn test_rejects_non_objects() {
        let err = parse_records("[1]").unwrap_err();
        assert!(err.to_string().contains("Record 1 is not a JSON object"));

        let err = parse_records("{\"a\": 1}\nnope").unwrap_err();
        assert!(err.to_string().contains("line 2"));
    }

    #[test]
    fn test_detects_format_from_extension() {
        assert_eq!(
            resolve_format(&cli(&["-q", "x", "-o", "out.json"])).unwrap(),
            OutputFormat::Json
        );
        assert_eq!(
            resolve_format(&cli(&["-q", "x", "-o", "out.ndjson"])).unwrap(),
            OutputFormat::Jsonl
        );
        assert_eq!(
            resolve_format(&cli(&["-q", "x"])).unwrap(),
            OutputFormat::Jsonl
        );
        assert!(resolve_format(&cli(&["-q", "x", "-o", "out.csv"])).is_err());
        assert_eq!(
            resolve_format(&cli(&["-q", "x", "-o", "out.csv", "--format", "json"])).unwrap(),
            OutputFormat::Json
        );
    }

    #[test]
    fn test_flags_override_config() {
        let config = load_config(&cli(&[
            "-q",
            "x",
            "--case-sensitive",
            "--date-key",
            "birthday",
        ]))
        .unwrap();
        assert!(config.case_sensitive);
        assert_eq!(config.date_key, "birthday");
    }

    #[test]
    fn test_parallel_selection_keeps_order() {
        let lines: String = (0..200).map(|i| format!("{{\"n\": {i}}}\n")).collect();
        let records = parse_records(&lines).unwrap();
        let query = Query::compile("n>=150", &SelectConfig::default()).unwrap();

        let sequential = select_records(&query, &records, false);
        let parallel = select_records(&query, &records, true);
        assert_eq!(sequential.len(), 50);
        fn ns(selected: &[&InputRecord]) -> Vec<Json> {
            selected.iter().map(|r| r.json["n"].clone()).collect()
        }
        assert_eq!(ns(&sequential), ns(&parallel));
    }
}
