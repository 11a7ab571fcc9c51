use std::path::PathBuf;

use thiserror::Error;

/// Convenient alias for fallible results returned throughout the crate.
pub type Result<T> = std::result::Result<T, ToolError>;

/// Error type covering the different failure cases that can occur when the
/// tool loads inventories, queries catalogues, or writes results.
#[derive(Debug, Error)]
pub enum ToolError {
    /// Wrapper for IO failures such as reading or writing files.
    #[error("I/O error: {0}")]
    Io(#[from] std::io::Error),

    /// Errors bubbled up from the Excel writer implementation.
    #[error("Excel write error: {0}")]
    ExcelWrite(#[from] rust_xlsxwriter::XlsxError),

    /// Errors bubbled up from the Excel reader implementation.
    #[error("Excel read error: {0}")]
    ExcelRead(#[from] calamine::XlsxError),

    /// Raised when a sheet does not carry the expected columns or rows.
    #[error("invalid workbook structure: {0}")]
    InvalidWorkbook(String),

    /// Raised when a cell cannot be converted into the typed record field.
    #[error("invalid literal value '{value}' in column {column}")]
    InvalidLiteral { column: String, value: String },

    /// Raised when the user provides a path that does not exist.
    #[error("input file not found: {0}")]
    MissingInput(PathBuf),

    /// The catalogue could not be reached or does not know the identifier.
    #[error("lookup failed for '{identifier}': {reason}")]
    LookupFailure { identifier: String, reason: String },

    /// The catalogue answered with a payload that could not be understood.
    #[error("malformed catalogue response: {0}")]
    ParseFailure(String),

    /// Transport errors from the HTTP client.
    #[error("HTTP error: {0}")]
    Http(#[from] reqwest::Error),

    /// Raised when the configuration file cannot be parsed.
    #[error("invalid configuration: {0}")]
    Config(String),

    /// Raised when a batch is stopped before completion.
    #[error("operation cancelled")]
    Cancelled,

    /// Raised when the tracing subscriber fails to initialise.
    #[error("failed to initialise logging: {0}")]
    Logging(String),
}

impl ToolError {
    pub(crate) fn lookup(identifier: impl Into<String>, reason: impl Into<String>) -> Self {
        ToolError::LookupFailure {
            identifier: identifier.into(),
            reason: reason.into(),
        }
    }
}
