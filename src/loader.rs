//! Schema and form data loading from various sources.
//!
//! Handles loading from files, strings, and HTTP URLs.

use std::path::Path;

use serde_json::Value;

use crate::error::LoadError;
use crate::types::{json_type_name, FormData, FormSchema};

#[cfg(feature = "remote")]
use std::time::Duration;

/// Default timeout for HTTP requests (10 seconds).
#[cfg(feature = "remote")]
const HTTP_TIMEOUT: Duration = Duration::from_secs(10);

/// Load a JSON document from a file path.
///
/// # Errors
///
/// Returns `LoadError::FileNotFound` if the file doesn't exist,
/// or `LoadError::InvalidJson` if the file isn't valid JSON.
pub fn load_json(path: &Path) -> Result<Value, LoadError> {
    if !path.exists() {
        return Err(LoadError::FileNotFound {
            path: path.to_path_buf(),
        });
    }

    let content = std::fs::read_to_string(path).map_err(|source| LoadError::ReadError {
        path: path.to_path_buf(),
        source,
    })?;

    serde_json::from_str(&content).map_err(|source| LoadError::InvalidJson { source })
}

/// Interpret a JSON document as a form schema.
///
/// # Errors
///
/// Returns `LoadError::InvalidSchema` if the document doesn't have the form schema shape.
pub fn parse_schema(value: Value) -> Result<FormSchema, LoadError> {
    serde_json::from_value(value).map_err(|source| LoadError::InvalidSchema { source })
}

/// Interpret a JSON document as a form data snapshot.
///
/// # Errors
///
/// Returns `LoadError::InvalidData` if the document isn't a JSON object.
pub fn parse_data(value: Value) -> Result<FormData, LoadError> {
    match value {
        Value::Object(map) => Ok(map),
        other => Err(LoadError::InvalidData {
            actual: json_type_name(&other).to_string(),
        }),
    }
}

/// Load a form schema from a file path.
///
/// # Errors
///
/// Returns `LoadError` if the file can't be read or isn't a form schema.
pub fn load_schema(path: &Path) -> Result<FormSchema, LoadError> {
    parse_schema(load_json(path)?)
}

/// Load a form schema from a JSON string.
///
/// # Errors
///
/// Returns `LoadError::InvalidJson` if the string isn't valid JSON,
/// or `LoadError::InvalidSchema` if it isn't a form schema.
pub fn load_schema_str(content: &str) -> Result<FormSchema, LoadError> {
    let value = serde_json::from_str(content).map_err(|source| LoadError::InvalidJson { source })?;
    parse_schema(value)
}

/// Load a form data snapshot from a file path.
///
/// # Errors
///
/// Returns `LoadError` if the file can't be read or isn't a JSON object.
pub fn load_data(path: &Path) -> Result<FormData, LoadError> {
    parse_data(load_json(path)?)
}

/// Load a form schema from an HTTP/HTTPS URL.
///
/// Requires the `remote` feature (enabled by default).
///
/// # Errors
///
/// Returns `LoadError::NetworkError` if the request fails,
/// or `LoadError::InvalidSchema` if the response isn't a form schema.
#[cfg(feature = "remote")]
pub fn load_schema_url(url: &str) -> Result<FormSchema, LoadError> {
    let client = reqwest::blocking::Client::builder()
        .timeout(HTTP_TIMEOUT)
        .build()
        .map_err(|source| LoadError::NetworkError {
            url: url.to_string(),
            source,
        })?;

    let response = client
        .get(url)
        .send()
        .map_err(|source| LoadError::NetworkError {
            url: url.to_string(),
            source,
        })?;

    // Check for HTTP errors before parsing
    let response = response
        .error_for_status()
        .map_err(|source| LoadError::NetworkError {
            url: url.to_string(),
            source,
        })?;

    let value: Value = response
        .json()
        .map_err(|source| LoadError::NetworkError {
            url: url.to_string(),
            source,
        })?;
    parse_schema(value)
}

/// Check if a string looks like a URL (starts with http:// or https://).
pub fn is_url(s: &str) -> bool {
    s.starts_with("http://") || s.starts_with("https://")
}

/// Load a form schema from a file path or URL.
///
/// # Errors
///
/// Returns `LoadError` if the source can't be loaded or isn't a form schema.
/// Without the `remote` feature a URL source reports `FileNotFound`.
pub fn load_schema_auto(source: &str) -> Result<FormSchema, LoadError> {
    if is_url(source) {
        #[cfg(feature = "remote")]
        {
            load_schema_url(source)
        }
        #[cfg(not(feature = "remote"))]
        {
            Err(LoadError::FileNotFound {
                path: std::path::PathBuf::from(source),
            })
        }
    } else {
        load_schema(Path::new(source))
    }
}
