//! Error types for form schema loading, evaluation, and validation.

use std::path::PathBuf;
use thiserror::Error;

use crate::types::{FormErrors, Operator};

/// Errors while loading a schema or a data snapshot.
#[derive(Debug, Error)]
pub enum LoadError {
    // IO errors (exit code 3)
    #[error("file not found: {path}")]
    FileNotFound { path: PathBuf },

    #[error("cannot read {path}: {source}")]
    ReadError {
        path: PathBuf,
        #[source]
        source: std::io::Error,
    },

    #[cfg(feature = "remote")]
    #[error("failed to fetch {url}: {source}")]
    NetworkError {
        url: String,
        #[source]
        source: reqwest::Error,
    },

    // Parse errors (exit code 2)
    #[error("invalid JSON: {source}")]
    InvalidJson {
        #[source]
        source: serde_json::Error,
    },

    #[error("invalid form schema: {source}")]
    InvalidSchema {
        #[source]
        source: serde_json::Error,
    },

    #[error("form data must be a JSON object, got {actual}")]
    InvalidData { actual: String },
}

/// Faults raised while evaluating a schema against form data.
///
/// These indicate a defect in the schema or the data feed, not a user mistake.
/// User mistakes are reported as messages in [`FormErrors`].
#[derive(Debug, Error)]
pub enum EvalError {
    #[error("field '{field}' has an invalid pattern \"{pattern}\": {source}")]
    InvalidPattern {
        field: String,
        pattern: String,
        #[source]
        source: regex::Error,
    },

    #[error("field '{field}' has an unparsable date \"{value}\"")]
    InvalidDate { field: String, value: String },

    #[error("field '{field}' uses operator \"{operator}\", only \"eq\" is evaluated")]
    UnsupportedOperator { field: String, operator: Operator },
}

/// Errors from whole-form validation.
#[derive(Debug, Error)]
pub enum ValidateError {
    #[error(transparent)]
    Load(#[from] LoadError),

    #[error(transparent)]
    Eval(#[from] EvalError),

    #[error("validation failed for {} field(s)", errors.len())]
    Invalid { errors: FormErrors },
}

impl LoadError {
    /// Returns the exit code for this error type.
    pub fn exit_code(&self) -> i32 {
        match self {
            LoadError::FileNotFound { .. } | LoadError::ReadError { .. } => 3,
            #[cfg(feature = "remote")]
            LoadError::NetworkError { .. } => 3,
            _ => 2,
        }
    }
}

impl EvalError {
    /// Returns the exit code for this error type.
    pub fn exit_code(&self) -> i32 {
        2
    }
}

impl ValidateError {
    /// Returns the exit code for this error type.
    pub fn exit_code(&self) -> i32 {
        match self {
            ValidateError::Load(e) => e.exit_code(),
            ValidateError::Eval(e) => e.exit_code(),
            ValidateError::Invalid { .. } => 1,
        }
    }
}
