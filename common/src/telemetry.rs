//! Provides helper functions for initializing log collection.
use anyhow::Result;
use tracing_subscriber::{filter::LevelFilter, prelude::*, EnvFilter, Layer, Registry};

/// Output format of the log lines written to stderr.
#[derive(clap::ValueEnum, Clone, Copy, Debug, Default, PartialEq, Eq)]
pub enum LogFormat {
    /// Human readable, single line per event.
    #[default]
    Compact,
    /// One JSON object per event.
    Json,
}

/// Initialize logging.
///
/// Logs always go to stderr so stdout stays free for rendered manifests.
pub fn init(format: LogFormat) -> Result<()> {
    // Default to INFO if no env is specified
    let log_filter = EnvFilter::builder()
        .with_default_directive(LevelFilter::INFO.into())
        .from_env()?;

    let logger: Box<dyn Layer<Registry> + Send + Sync> = match format {
        LogFormat::Compact => tracing_subscriber::fmt::layer()
            .with_writer(std::io::stderr)
            .with_ansi(true)
            .compact()
            .with_filter(log_filter)
            .boxed(),
        LogFormat::Json => tracing_subscriber::fmt::layer()
            .with_writer(std::io::stderr)
            .json()
            .with_filter(log_filter)
            .boxed(),
    };

    let collector = Registry::default().with(logger);
    tracing::subscriber::set_global_default(collector)?;

    Ok(())
}
