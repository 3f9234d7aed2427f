//! Error types shared by the loader, analyzers, and session.

use std::path::PathBuf;
use thiserror::Error;

/// All errors produced while collecting filters, loading trips, or computing statistics.
#[derive(Error, Debug)]
pub enum BikeshareError {
    /// A city, month, or day entered by the user is not in its accepted set.
    #[error("Invalid {field}: {value:?}")]
    InvalidInput { field: &'static str, value: String },

    /// The backing file for a city could not be opened or read.
    #[error("Failed to read data file {path}: {source}")]
    DataFile {
        path: PathBuf,
        #[source]
        source: std::io::Error,
    },

    /// The CSV structure of a data file is broken.
    #[error("Malformed CSV in {path}: {source}")]
    Csv {
        path: PathBuf,
        #[source]
        source: csv::Error,
    },

    /// A required column is absent from the header row.
    #[error("Column {column:?} not found in {path}")]
    MissingColumn { path: PathBuf, column: &'static str },

    /// A timestamp cell did not match any accepted format.
    #[error("Invalid timestamp in {path} at row {row}, column {column:?}: {value:?}")]
    Timestamp {
        path: PathBuf,
        row: u64,
        column: &'static str,
        value: String,
    },

    /// A non-empty birth year cell is not a whole year.
    #[error("Invalid birth year in {path} at row {row}: {value:?}")]
    BirthYear {
        path: PathBuf,
        row: u64,
        value: String,
    },

    /// An optional field is not part of the loaded data set.
    #[error("Field not available: {0}")]
    MissingField(&'static str),

    /// A configuration value is missing or invalid.
    #[error("Configuration error: {0}")]
    Config(String),

    /// A report could not be serialized.
    #[error("Failed to serialize report: {0}")]
    Json(#[from] serde_json::Error),

    #[error(transparent)]
    Io(#[from] std::io::Error),
}

impl BikeshareError {
    /// True for errors that abort the current analysis pass because the
    /// backing data could not be turned into a trip table.
    pub fn is_data_format(&self) -> bool {
        matches!(
            self,
            BikeshareError::DataFile { .. }
                | BikeshareError::Csv { .. }
                | BikeshareError::MissingColumn { .. }
                | BikeshareError::Timestamp { .. }
                | BikeshareError::BirthYear { .. }
        )
    }
}

/// Convenience alias used throughout the crate.
pub type Result<T> = std::result::Result<T, BikeshareError>;
