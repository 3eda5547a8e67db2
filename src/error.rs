use std::path::PathBuf;

use thiserror::Error;

/// Failure to bring a feature table into memory.  Both variants are fatal
/// for an analysis run.
#[derive(Debug, Error)]
pub enum LoadError {
    /// The path does not resolve to a readable file.
    #[error("cannot read {}: {source}", path.display())]
    Read {
        path: PathBuf,
        #[source]
        source: std::io::Error,
    },
    /// The file exists but is not a table with the expected header.
    #[error("cannot parse {}: {reason}", path.display())]
    Parse { path: PathBuf, reason: String },
}

impl LoadError {
    pub(crate) fn parse(path: &std::path::Path, reason: impl Into<String>) -> Self {
        LoadError::Parse {
            path: path.to_path_buf(),
            reason: reason.into(),
        }
    }
}

/// A single chart could not be built.  Never aborts other charts.
#[derive(Debug, Clone, PartialEq, Error)]
pub enum RenderError {
    #[error("column '{column}' holds no numeric data")]
    NoNumericData { column: String },
    #[error("column '{column}' has no values for group {group}")]
    EmptyGroup { column: String, group: String },
    #[error("signal is empty")]
    EmptySignal,
    #[error("sample rate must be positive")]
    InvalidSampleRate,
}

/// Failure of the audio decoding collaborator.
#[derive(Debug, Error)]
pub enum AudioError {
    #[error("cannot open audio file {}: {source}", path.display())]
    Read {
        path: PathBuf,
        #[source]
        source: std::io::Error,
    },
    #[error("cannot decode {}: {reason}", path.display())]
    Decode { path: PathBuf, reason: String },
}

#[derive(Debug, Error)]
pub enum ConfigError {
    #[error("cannot read config {}: {source}", path.display())]
    Read {
        path: PathBuf,
        #[source]
        source: std::io::Error,
    },
    #[error("invalid config {}: {source}", path.display())]
    Parse {
        path: PathBuf,
        #[source]
        source: serde_json::Error,
    },
    #[error("invalid setting: {0}")]
    Invalid(String),
}
