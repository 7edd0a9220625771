//! Run orchestration: resolve config, build the client, fetch, write.
//!
//! Every stage is terminal on failure and maps to its own exit code.

use std::path::{Path, PathBuf};

use thiserror::Error as ThisError;
use tracing::{debug, error, info};
use tracing_subscriber::EnvFilter;

use crate::channels::{fetch_all_channels, ChannelRecord, PAGE_SIZE};
use crate::client::{ChannelSource, MattermostClient};
use crate::config::{version, Args, Config, ConfigFileStatus, Sources};
use crate::output::{write_csv, write_json, OutputFormat};
use crate::Error;

/// A failed run, tagged with the stage that failed.
#[derive(ThisError, Debug)]
pub enum RunError {
    #[error("{0}")]
    Config(#[source] Error),

    #[error("Failed to retrieve channel data: {0}")]
    Fetch(#[source] Error),

    #[error("Failed to write CSV file: {0}")]
    WriteCsv(#[source] Error),

    #[error("Failed to write JSON file: {0}")]
    WriteJson(#[source] Error),
}

impl RunError {
    /// Process exit status for this failure.
    pub fn exit_code(&self) -> u8 {
        match self {
            RunError::Config(Error::InvalidScheme(_)) => 2,
            RunError::Config(_) => 1,
            RunError::Fetch(_) => 10,
            RunError::WriteCsv(_) => 11,
            RunError::WriteJson(_) => 12,
        }
    }
}

/// What a successful invocation did.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Outcome {
    VersionPrinted,
    Exported { path: PathBuf, channels: usize },
}

/// Install the fmt subscriber; `debug` raises this crate to DEBUG.
///
/// `RUST_LOG` still applies to everything else. Repeated calls are no-ops.
pub fn init_logging(debug: bool) {
    let level = if debug { "debug" } else { "info" };
    let mut filter = EnvFilter::from_default_env();
    if let Ok(directive) = format!("mm_channel_stats={}", level).parse() {
        filter = filter.add_directive(directive);
    }

    let _ = tracing_subscriber::fmt()
        .with_env_filter(filter)
        .with_writer(std::io::stderr)
        .try_init();
}

/// Full invocation from parsed arguments.
pub async fn execute(args: Args) -> Result<Outcome, RunError> {
    if args.version {
        println!("mm-channel-stats version: {}", version());
        return Ok(Outcome::VersionPrinted);
    }

    let sources = Sources::load(args).map_err(|err| {
        init_logging(false);
        RunError::Config(err)
    })?;

    init_logging(sources.debug_requested());
    log_config_source(&sources.config_path, sources.config_file);

    let config = sources.into_config().map_err(RunError::Config)?;
    log_parameters(&config);

    run(&config).await
}

fn log_config_source(path: &Path, status: ConfigFileStatus) {
    match status {
        ConfigFileStatus::Loaded => {
            debug!(path = %path.display(), "Using config file");
        }
        ConfigFileStatus::NotFound => {
            info!(
                path = %path.display(),
                "Config file not found, using defaults and other sources"
            );
        }
    }
}

fn log_parameters(config: &Config) {
    debug!(
        url = %config.url,
        port = config.port,
        scheme = %config.scheme,
        token = "<redacted>",
        csv = config.csv,
        file = %config.file.display(),
        "Parameters"
    );
}

/// Connect to the configured instance and export every channel.
pub async fn run(config: &Config) -> Result<Outcome, RunError> {
    let target = config.target();
    debug!(%target, "Full target for Mattermost");

    let client = MattermostClient::new(target, config.token.clone()).map_err(RunError::Fetch)?;
    info!(version = version(), "Processing started");

    export(&client, config).await
}

/// Fetch from any channel source and write the configured output.
pub async fn export<S: ChannelSource>(source: &S, config: &Config) -> Result<Outcome, RunError> {
    let channels = fetch_all_channels(source, PAGE_SIZE).await.map_err(|e| {
        error!("Failed to retrieve channel data. Aborting!");
        RunError::Fetch(e)
    })?;

    let count = channels.len();
    write_output(config.output_format(), &config.file, channels)?;
    info!(path = %config.file.display(), channels = count, "Channel stats written");

    Ok(Outcome::Exported {
        path: config.file.clone(),
        channels: count,
    })
}

fn write_output(
    format: OutputFormat,
    path: &Path,
    channels: Vec<ChannelRecord>,
) -> Result<(), RunError> {
    match format {
        OutputFormat::Csv => write_csv(path, &channels).map_err(|e| {
            error!("Failed to write CSV file. Aborting.");
            RunError::WriteCsv(e)
        }),
        OutputFormat::Json => write_json(path, &channels).map_err(|e| {
            error!("Failed to write JSON file. Aborting.");
            RunError::WriteJson(e)
        }),
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn exit_codes_per_stage() {
        let io = || Error::IoError(std::io::Error::other("x"));

        assert_eq!(
            RunError::Config(Error::MissingRequired("url".into())).exit_code(),
            1
        );
        assert_eq!(RunError::Config(Error::InvalidScheme("ftp".into())).exit_code(), 2);
        assert_eq!(RunError::Config(Error::ConfigFile("bad".into())).exit_code(), 1);
        assert_eq!(RunError::Fetch(Error::UnexpectedStatus(500)).exit_code(), 10);
        assert_eq!(RunError::WriteCsv(io()).exit_code(), 11);
        assert_eq!(RunError::WriteJson(io()).exit_code(), 12);
    }

    #[test]
    fn run_error_display_names_stage() {
        let err = RunError::Fetch(Error::UnexpectedStatus(502));
        assert_eq!(
            err.to_string(),
            "Failed to retrieve channel data: Unexpected HTTP status: 502"
        );
    }

    #[tokio::test]
    async fn execute_version_skips_validation() {
        let args = Args {
            version: true,
            scheme: Some("gopher".to_string()),
            ..Args::default()
        };
        assert_eq!(execute(args).await.unwrap(), Outcome::VersionPrinted);
    }

    #[tokio::test]
    async fn execute_rejects_unparsable_port_with_usage_exit_code() {
        let dir = tempfile::tempdir().unwrap();
        let args = Args {
            config: Some(dir.path().join("missing.json")),
            url: Some("h".to_string()),
            token: Some("t".to_string()),
            port: Some("not-a-port".to_string()),
            ..Args::default()
        };

        let err = execute(args).await.unwrap_err();
        assert!(matches!(err, RunError::Config(Error::InvalidValue { .. })));
        assert_eq!(err.exit_code(), 1);
    }
}
