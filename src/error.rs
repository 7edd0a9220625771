//! Error types for the channel statistics exporter

use thiserror::Error;

#[derive(Error, Debug)]
pub enum Error {
    #[error("Missing required parameter: {0}")]
    MissingRequired(String),

    #[error("Invalid scheme '{0}': must be either 'http' or 'https'")]
    InvalidScheme(String),

    #[error("Invalid value '{value}' for {name}")]
    InvalidValue { name: String, value: String },

    #[error("Config file error: {0}")]
    ConfigFile(String),

    #[error("HTTP error: {0}")]
    Http(String),

    #[error("Unexpected HTTP status: {0}")]
    UnexpectedStatus(u16),

    #[error("IO error: {0}")]
    IoError(#[from] std::io::Error),

    #[error("Serialization error: {0}")]
    SerializationError(String),

    #[error("CSV error: {0}")]
    CsvError(String),
}

pub type Result<T> = std::result::Result<T, Error>;

impl From<reqwest::Error> for Error {
    fn from(err: reqwest::Error) -> Self {
        Error::Http(err.to_string())
    }
}

impl From<serde_json::Error> for Error {
    fn from(err: serde_json::Error) -> Self {
        Error::SerializationError(err.to_string())
    }
}

impl From<csv::Error> for Error {
    fn from(err: csv::Error) -> Self {
        Error::CsvError(err.to_string())
    }
}
