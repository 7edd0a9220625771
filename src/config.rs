//! Command-line, environment and config-file settings.
//!
//! Each setting resolves as: explicit flag, then `MM_*` environment
//! variable, then the JSON config file, then the built-in default.

use std::ffi::{OsStr, OsString};
use std::fmt;
use std::fs;
use std::io::ErrorKind;
use std::path::{Path, PathBuf};

use clap::builder::{BoolishValueParser, TypedValueParser};
use clap::{Command, Parser};
use serde::Deserialize;

use crate::output::OutputFormat;
use crate::{Error, Result};

pub const DEFAULT_CONFIG_PATH: &str = "./config.json";
pub const DEFAULT_PORT: u16 = 443;
pub const DEFAULT_SCHEME: &str = "https";
pub const DEFAULT_OUTPUT_BASENAME: &str = "channel_stats";

/// Long option names that may also be spelled with a single dash.
const LONG_FLAGS: [&str; 10] = [
    "config", "url", "port", "scheme", "token", "csv", "file", "debug", "version", "help",
];

const USAGE_NOTES: &str = "\
Configuration Sources:
  - Command-line flags (highest priority)
  - Environment variables (e.g., MM_URL, MM_TOKEN)
  - Config file (default: ./config.json, can be overridden with -config)

Examples:
  Collect stats and output as JSON:
    ./mm-channel-stats -url mattermost.example.com -token YOUR_API_TOKEN

  Collect stats and output as CSV:
    ./mm-channel-stats -url mattermost.example.com -token YOUR_API_TOKEN -csv";

/// Version reported by `-version`, overridable at build time.
pub fn version() -> &'static str {
    option_env!("MM_CHANNEL_STATS_VERSION").unwrap_or(env!("CARGO_PKG_VERSION"))
}

#[derive(Parser, Debug, Clone, Default)]
#[command(name = "mm-channel-stats")]
#[command(
    about = "Collects channel statistics from a Mattermost instance and outputs them in JSON or CSV format.",
    long_about = None
)]
#[command(after_help = USAGE_NOTES)]
pub struct Args {
    /// Alternative config file (JSON)
    #[arg(long, env = "MM_CONFIG", value_name = "PATH")]
    pub config: Option<PathBuf>,

    /// Mattermost instance URL (host name, without scheme)
    #[arg(long, env = "MM_URL")]
    pub url: Option<String>,

    /// Mattermost port [default: 443]
    #[arg(long, env = "MM_PORT")]
    pub port: Option<String>,

    /// HTTP scheme (http/https) [default: https]
    #[arg(long, env = "MM_SCHEME")]
    pub scheme: Option<String>,

    /// API token
    #[arg(long, env = "MM_TOKEN", hide_env_values = true)]
    pub token: Option<String>,

    /// Create CSV output instead of JSON
    #[arg(
        long,
        num_args = 0..=1,
        require_equals = true,
        default_missing_value = "true",
        value_parser = BoolishValueParser::new()
    )]
    pub csv: Option<bool>,

    /// Optional output filename
    #[arg(long, value_name = "PATH")]
    pub file: Option<PathBuf>,

    /// Run in DEBUG mode
    #[arg(
        long,
        env = "MM_DEBUG",
        num_args = 0..=1,
        require_equals = true,
        default_missing_value = "true"
    )]
    pub debug: Option<String>,

    /// Display version and exit
    #[arg(long)]
    pub version: bool,
}

impl Args {
    /// Parse process arguments, accepting single-dash long flags.
    pub fn parse_normalized() -> Self {
        Self::parse_from(normalize_args(std::env::args_os()))
    }
}

/// Rewrite `-name` / `-name=value` into `--name` forms for known options.
///
/// Everything after a bare `--` is left untouched.
pub fn normalize_args<I, T>(args: I) -> Vec<OsString>
where
    I: IntoIterator<Item = T>,
    T: Into<OsString>,
{
    let mut out = Vec::new();
    let mut passthrough = false;

    for (idx, arg) in args.into_iter().enumerate() {
        let arg: OsString = arg.into();
        if idx == 0 || passthrough {
            out.push(arg);
            continue;
        }

        let rewritten = arg.to_str().and_then(|s| {
            if s == "--" {
                return None;
            }
            let rest = s.strip_prefix('-').filter(|r| !r.starts_with('-'))?;
            let name = rest.split('=').next().unwrap_or(rest);
            LONG_FLAGS.contains(&name).then(|| OsString::from(format!("-{}", s)))
        });

        if arg == "--" {
            passthrough = true;
        }
        out.push(rewritten.unwrap_or(arg));
    }

    out
}

/// Shape of the optional JSON config file. Unknown keys are ignored.
#[derive(Debug, Default, Deserialize)]
pub struct FileConfig {
    pub url: Option<String>,
    pub port: Option<u16>,
    pub scheme: Option<String>,
    pub token: Option<String>,
    pub csv: Option<bool>,
    pub file: Option<PathBuf>,
    pub debug: Option<bool>,
}

/// Whether the config file contributed to the resolved settings.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ConfigFileStatus {
    Loaded,
    NotFound,
}

/// Read the config file. A missing file is not an error; a malformed one is.
pub fn load_file_config(path: &Path) -> Result<(FileConfig, ConfigFileStatus)> {
    let content = match fs::read_to_string(path) {
        Ok(content) => content,
        Err(err) if err.kind() == ErrorKind::NotFound => {
            return Ok((FileConfig::default(), ConfigFileStatus::NotFound));
        }
        Err(err) => {
            return Err(Error::ConfigFile(format!(
                "failed to read {}: {}",
                path.display(),
                err
            )));
        }
    };

    let parsed: FileConfig = serde_json::from_str(&content)
        .map_err(|e| Error::ConfigFile(format!("failed to parse {}: {}", path.display(), e)))?;

    Ok((parsed, ConfigFileStatus::Loaded))
}

/// Fully resolved, validated settings for one run.
#[derive(Clone)]
pub struct Config {
    pub url: String,
    pub port: u16,
    pub scheme: String,
    pub token: String,
    pub csv: bool,
    pub file: PathBuf,
    pub debug: bool,
    pub config_path: PathBuf,
    pub config_file: ConfigFileStatus,
}

impl fmt::Debug for Config {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("Config")
            .field("url", &self.url)
            .field("port", &self.port)
            .field("scheme", &self.scheme)
            .field("token", &"<redacted>")
            .field("csv", &self.csv)
            .field("file", &self.file)
            .field("debug", &self.debug)
            .field("config_path", &self.config_path)
            .field("config_file", &self.config_file)
            .finish()
    }
}

impl Config {
    /// Base URL of the Mattermost API, e.g. `https://chat.example.com:443`.
    pub fn target(&self) -> String {
        format!("{}://{}:{}", self.scheme, self.url, self.port)
    }

    pub fn output_format(&self) -> OutputFormat {
        OutputFormat::from_csv_flag(self.csv)
    }
}

/// Outcome of resolving the command line.
#[derive(Debug)]
pub enum Resolution {
    /// `-version` was given; nothing else was looked at.
    Version,
    Run(Config),
}

/// Everything gathered for a run before validation.
///
/// `port` and `debug` stay raw here so a bad `MM_PORT`/`MM_DEBUG` cannot
/// get in the way of `-version` and is reported like any other setting.
pub struct Sources {
    args: Args,
    file: FileConfig,
    pub config_path: PathBuf,
    pub config_file: ConfigFileStatus,
}

impl Sources {
    /// Read the config file named by `-config` / `MM_CONFIG` (or the default).
    pub fn load(args: Args) -> Result<Self> {
        let config_path = args
            .config
            .clone()
            .unwrap_or_else(|| PathBuf::from(DEFAULT_CONFIG_PATH));
        let (file, config_file) = load_file_config(&config_path)?;

        Ok(Self {
            args,
            file,
            config_path,
            config_file,
        })
    }

    /// Debug setting for logging setup; unreadable values count as off.
    pub fn debug_requested(&self) -> bool {
        self.debug().unwrap_or(false)
    }

    fn debug(&self) -> Result<bool> {
        match self.args.debug.as_deref() {
            Some(raw) => parse_bool("debug", raw),
            None => Ok(self.file.debug.unwrap_or(false)),
        }
    }

    fn port(&self) -> Result<u16> {
        match self.args.port.as_deref() {
            Some(raw) => raw.trim().parse().map_err(|_| Error::InvalidValue {
                name: "port".to_string(),
                value: raw.to_string(),
            }),
            None => Ok(self.file.port.unwrap_or(DEFAULT_PORT)),
        }
    }

    /// Apply precedence and validation, producing the run configuration.
    pub fn into_config(self) -> Result<Config> {
        let port = self.port();
        let debug = self.debug();
        let Sources {
            args,
            file,
            config_path,
            config_file,
        } = self;

        let url = args.url.or(file.url).unwrap_or_default();
        let token = args.token.or(file.token).unwrap_or_default();

        let missing: Vec<&str> = [("url", &url), ("token", &token)]
            .into_iter()
            .filter(|(_, value)| value.is_empty())
            .map(|(name, _)| name)
            .collect();
        if !missing.is_empty() {
            return Err(Error::MissingRequired(missing.join(", ")));
        }

        let scheme = args
            .scheme
            .or(file.scheme)
            .unwrap_or_else(|| DEFAULT_SCHEME.to_string())
            .to_lowercase();
        if scheme != "http" && scheme != "https" {
            return Err(Error::InvalidScheme(scheme));
        }

        let csv = args.csv.or(file.csv).unwrap_or(false);
        let file_path = args
            .file
            .or(file.file)
            .filter(|p| !p.as_os_str().is_empty())
            .unwrap_or_else(|| {
                let format = OutputFormat::from_csv_flag(csv);
                PathBuf::from(format!("{}.{}", DEFAULT_OUTPUT_BASENAME, format.extension()))
            });

        Ok(Config {
            url,
            port: port?,
            scheme,
            token,
            csv,
            file: file_path,
            debug: debug?,
            config_path,
            config_file,
        })
    }
}

/// Read a boolean the same way the `-csv` flag is read (`1`, `yes`, `off`, ...).
fn parse_bool(name: &str, raw: &str) -> Result<bool> {
    BoolishValueParser::new()
        .parse_ref(&Command::new("mm-channel-stats"), None, OsStr::new(raw))
        .map_err(|_| Error::InvalidValue {
            name: name.to_string(),
            value: raw.to_string(),
        })
}

/// Merge flags/env (already folded by clap) with the config file and defaults.
pub fn resolve(args: Args) -> Result<Resolution> {
    if args.version {
        return Ok(Resolution::Version);
    }

    Sources::load(args)?.into_config().map(Resolution::Run)
}
