//! CSV and JSON writers for channel records.

use std::fs::File;
use std::io::{BufWriter, Write};
use std::path::Path;

use tracing::{debug, error};

use crate::channels::ChannelRecord;
use crate::Result;

/// Column titles of the CSV export. Channel and team IDs are JSON-only.
pub const CSV_HEADERS: [&str; 9] = [
    "Channel Name",
    "Team Name",
    "Channel Type",
    "Last Update Date",
    "Last Post Date",
    "Total Message Count",
    "Total Message Count Root",
    "Has Header",
    "Has Purpose",
];

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum OutputFormat {
    Csv,
    Json,
}

impl OutputFormat {
    pub fn from_csv_flag(csv: bool) -> Self {
        if csv {
            Self::Csv
        } else {
            Self::Json
        }
    }

    pub fn extension(&self) -> &'static str {
        match self {
            Self::Csv => "csv",
            Self::Json => "json",
        }
    }
}

fn csv_row(record: &ChannelRecord) -> [String; 9] {
    [
        record.channel_name.clone(),
        record.team_name.clone(),
        record.channel_type.clone(),
        record.last_update_date.clone(),
        record.last_post_date.clone(),
        record.total_message_count.to_string(),
        record.total_message_count_root.to_string(),
        record.has_header.to_string(),
        record.has_purpose.to_string(),
    ]
}

/// Write the header plus one row per record to any sink.
pub fn write_csv_to<W: Write>(sink: W, records: &[ChannelRecord]) -> Result<()> {
    let mut writer = csv::Writer::from_writer(sink);

    writer.write_record(CSV_HEADERS).inspect_err(|e| {
        error!(error = %e, "Failed to write CSV headers");
    })?;

    for record in records {
        writer.write_record(csv_row(record)).inspect_err(|e| {
            error!(channel = %record.channel_name, error = %e, "Failed to write CSV record");
        })?;
    }

    writer.flush()?;
    Ok(())
}

/// Create (or truncate) `path` and write the records as CSV.
pub fn write_csv(path: &Path, records: &[ChannelRecord]) -> Result<()> {
    let file = File::create(path).inspect_err(|e| {
        error!(path = %path.display(), error = %e, "Failed to create CSV file");
    })?;

    write_csv_to(file, records)?;
    debug!(path = %path.display(), rows = records.len(), "CSV written");
    Ok(())
}

/// Write the records as one pretty-printed JSON array followed by a newline.
pub fn write_json_to<W: Write>(sink: W, records: &[ChannelRecord]) -> Result<()> {
    let mut writer = BufWriter::new(sink);

    serde_json::to_writer_pretty(&mut writer, records).inspect_err(|e| {
        error!(error = %e, "Failed to write JSON data");
    })?;
    writer.write_all(b"\n")?;
    writer.flush()?;
    Ok(())
}

/// Create (or truncate) `path` and write the records as JSON.
pub fn write_json(path: &Path, records: &[ChannelRecord]) -> Result<()> {
    let file = File::create(path).inspect_err(|e| {
        error!(path = %path.display(), error = %e, "Failed to create JSON file");
    })?;

    write_json_to(file, records)?;
    debug!(path = %path.display(), records = records.len(), "JSON written");
    Ok(())
}
