//! Error types for the splitsmith_core library.

use std::io;

/// Result type alias using our Error type
pub type Result<T> = std::result::Result<T, Error>;

/// Core error type for splitsmith_core operations
#[derive(Debug, thiserror::Error)]
pub enum Error {
    /// IO error occurred
    #[error("IO error: {0}")]
    Io(#[from] io::Error),

    /// JSON serialization/deserialization error
    #[error("JSON error: {0}")]
    Json(#[from] serde_json::Error),

    /// CSV error
    #[error("CSV error: {0}")]
    Csv(#[from] csv::Error),

    /// TOML parsing error
    #[error("TOML error: {0}")]
    Toml(#[from] toml::de::Error),

    /// Configuration validation error
    #[error("Configuration error: {0}")]
    Config(String),

    /// Routine document is not parseable as YAML/JSON at all
    #[error("{source_id}: malformed routine document: {cause}")]
    MalformedSource {
        source_id: String,
        #[source]
        cause: serde_yaml::Error,
    },

    /// Routine document parses but is missing or mistypes a required field
    #[error("{source_id}: schema violation: {detail}")]
    SchemaViolation { source_id: String, detail: String },

    /// Requested week/day variant does not exist; fatal before any step runs
    #[error("selector error: {0}")]
    SelectorResolution(String),

    /// Feedback input failed validation; always resolved by re-prompting,
    /// never surfaces past the collector
    #[error("invalid feedback input: {0}")]
    InvalidFeedback(String),

    /// Journal persistence error
    #[error("storage error: {0}")]
    Storage(String),
}
