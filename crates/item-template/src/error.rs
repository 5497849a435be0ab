//! Error types for template loading and rendering.

use std::path::PathBuf;
use thiserror::Error;

/// Errors that can occur while loading or rendering a template.
#[derive(Error, Debug)]
pub enum TemplateError {
    /// Template file could not be read.
    #[error("Failed to read template file {path:?}: {source}")]
    Io {
        path: PathBuf,
        #[source]
        source: std::io::Error,
    },

    /// A `$` that does not start a valid placeholder.
    #[error("Invalid placeholder in template: line {line}, col {column}")]
    InvalidPlaceholder { line: usize, column: usize },

    /// Placeholder name with no value to substitute.
    #[error("Unknown placeholder: ${0}")]
    UnknownPlaceholder(String),

    /// Substituted text is not valid JSON.
    #[error("Rendered item {index} is not valid JSON: {source}")]
    Json {
        index: u64,
        #[source]
        source: serde_json::Error,
    },

    /// Substituted text is valid JSON but not an object.
    #[error("Rendered item {index} is not a JSON object")]
    NotAnObject { index: u64 },
}
