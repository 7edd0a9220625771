//! Mattermost channel statistics exporter
//!
//! This library provides tools to:
//! - Resolve settings from flags, `MM_*` environment variables and a JSON config file
//! - Page through every channel on a Mattermost server via the REST API
//! - Summarise each channel (message counts, header/purpose presence, activity dates)
//! - Export the summaries as CSV or pretty-printed JSON

pub mod app;
pub mod channels;
pub mod client;
pub mod config;
pub mod error;
pub mod format;
pub mod output;

// Re-export common types
pub use channels::{fetch_all_channels, ChannelRecord, PAGE_SIZE};
pub use client::{ChannelSource, MattermostClient};
pub use config::{Args, Config};
pub use error::{Error, Result};
