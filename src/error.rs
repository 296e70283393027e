//! Error types, one enum per concern.
//!
//! Only [`StartupError`] and [`ConfigError`] are fatal. Everything raised
//! while handling a single form submission is folded into [`FormError`]
//! and shown to the user.

use std::path::PathBuf;
use thiserror::Error;

/// Artifact loading failed; the application must not become interactive.
#[derive(Debug, Error)]
pub enum StartupError {
    #[error("failed to read artifact {path}: {source}")]
    Read {
        path: PathBuf,
        #[source]
        source: std::io::Error,
    },

    #[error("failed to decode artifact {path}: {source}")]
    Decode {
        path: PathBuf,
        #[source]
        source: bincode::Error,
    },

    #[error("invalid artifact {path}: {reason}")]
    InvalidArtifact { path: PathBuf, reason: String },
}

#[derive(Debug, Error)]
pub enum ParseError {
    #[error("invalid timestamp {input:?}, expected YYYY-MM-DD HH:MM:SS")]
    Timestamp {
        input: String,
        #[source]
        source: chrono::ParseError,
    },

    #[error("{field} {value} is outside [{min}, {max}]")]
    CoordinateOutOfRange {
        field: &'static str,
        value: f64,
        min: f64,
        max: f64,
    },

    #[error("invalid number for {field}: {input:?}")]
    InvalidNumber { field: &'static str, input: String },
}

#[derive(Debug, Error, PartialEq, Eq)]
pub enum LookupError {
    #[error("unknown place: {name}")]
    UnknownPlace { name: String },

    #[error("place {name} is defined more than once")]
    DuplicatePlace { name: String },
}

#[derive(Debug, Error)]
pub enum InferenceError {
    #[error("shape mismatch in {stage}: expected {expected} columns, got {actual}")]
    ShapeMismatch {
        stage: &'static str,
        expected: usize,
        actual: usize,
    },

    #[error("array error: {0}")]
    Array(#[from] ndarray::ShapeError),

    #[error("model produced a non-finite value")]
    NonFinite,

    #[error("no sample hours to average")]
    NoSamples,

    #[error("timestamp {0} cannot be represented in the configured offset")]
    InvalidTimestamp(chrono::NaiveDateTime),
}

/// Any failure of one form submission.
#[derive(Debug, Error)]
pub enum FormError {
    #[error(transparent)]
    Parse(#[from] ParseError),

    #[error(transparent)]
    Lookup(#[from] LookupError),

    #[error(transparent)]
    Inference(#[from] InferenceError),

    #[error(transparent)]
    Artifacts(#[from] StartupError),
}

impl FormError {
    /// Inline message for the person filling in the form.
    pub fn user_message(&self) -> String {
        match self {
            FormError::Parse(ParseError::Timestamp { .. }) => {
                "Invalid date/time format. Please use YYYY-MM-DD HH:MM:SS".to_string()
            }
            FormError::Parse(e) => format!("Invalid input: {e}"),
            FormError::Lookup(e) => {
                format!("Could not resolve coordinates for the selected place ({e})")
            }
            FormError::Inference(e) => format!("An error occurred during prediction: {e}"),
            FormError::Artifacts(e) => format!("Model resources are unavailable: {e}"),
        }
    }
}

#[derive(Debug, Error)]
pub enum ConfigError {
    #[error("failed to read config {path}: {source}")]
    Read {
        path: PathBuf,
        #[source]
        source: std::io::Error,
    },

    #[error("failed to parse config: {0}")]
    Parse(#[from] toml::de::Error),

    #[error("invalid config: {0}")]
    Invalid(String),
}

/// Chart or CSV output failed.
#[derive(Debug, Error)]
pub enum OutputError {
    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),

    #[error("CSV error: {0}")]
    Csv(#[from] csv::Error),

    #[error("encode error: {0}")]
    Encode(#[from] bincode::Error),

    #[error("plot error: {0}")]
    Plot(String),

    #[error("nothing to output: {0}")]
    Empty(&'static str),
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn timestamp_errors_get_the_format_hint() {
        let source = chrono::NaiveDateTime::parse_from_str("x", "%Y").unwrap_err();
        let err = FormError::from(ParseError::Timestamp {
            input: "x".into(),
            source,
        });
        assert!(err.user_message().contains("YYYY-MM-DD HH:MM:SS"));
    }

    #[test]
    fn inference_errors_include_the_cause() {
        let err = FormError::from(InferenceError::NonFinite);
        assert!(err.user_message().contains("non-finite"));
    }
}
