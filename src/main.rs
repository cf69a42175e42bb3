mod app;
mod sinks;

use anyhow::{Context, Result};
use clap::Parser;
use recsift::Query;

use app::{Cli, init_sink, load_config, load_input, resolve_format, select_records, write_records};

fn main() -> Result<()> {
    let cli = Cli::parse();

    let level = if cli.verbose {
        tracing::Level::INFO
    } else {
        tracing::Level::WARN
    };

    tracing_subscriber::fmt()
        .with_env_filter(
            tracing_subscriber::EnvFilter::builder()
                .with_default_directive(level.into())
                .from_env_lossy(),
        )
        .with_writer(std::io::stderr)
        .init();

    if let Some(threads) = cli.threads {
        rayon::ThreadPoolBuilder::new()
            .num_threads(threads)
            .build_global()
            .context("CLI: Failed to initialize thread pool")?;
    }

    let config = load_config(&cli)?;
    tracing::info!(
        "Config: case_sensitive={}, prefer_regex={}, date_key={:?}",
        config.case_sensitive,
        config.prefer_regex,
        config.date_key
    );

    // Malformed queries surface verbatim.
    let query = Query::compile(&cli.query, &config)?;
    let format = resolve_format(&cli)?;

    let records = load_input(&cli.input)?;
    tracing::info!("Loaded {} records from {:?}", records.len(), cli.input);

    let start = std::time::Instant::now();
    let selected = select_records(&query, &records, cli.threads.is_some());

    let mut sink = init_sink(&format, &cli.output)?;
    write_records(sink.as_mut(), &selected)?;

    tracing::info!(
        "Done! Selected {} of {} records in {:.3}s",
        selected.len(),
        records.len(),
        start.elapsed().as_secs_f64()
    );

    Ok(())
}
