//! Error types for the DynamoDB populator.

use item_template::TemplateError;
use thiserror::Error;

/// Errors that can occur during population.
#[derive(Error, Debug)]
pub enum PopulateError {
    /// Template rendering failed.
    #[error("Template error: {0}")]
    Template(#[from] TemplateError),

    /// A rendered number does not fit in a DynamoDB number attribute.
    #[error("Number {0} has more than 38 significant digits")]
    NumberPrecision(String),

    /// Write request could not be built.
    #[error("Request build error: {0}")]
    Build(#[from] aws_sdk_dynamodb::error::BuildError),

    /// DynamoDB rejected a BatchWriteItem request.
    #[error("DynamoDB error: {0}")]
    DynamoDB(#[from] aws_sdk_dynamodb::Error),

    /// The service kept returning the same items as unprocessed.
    #[error("{pending} items still unprocessed after {rounds} BatchWriteItem requests without progress")]
    Unprocessed { pending: usize, rounds: u32 },

    /// Writing console output failed.
    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),

    /// JSON serialization error.
    #[error("JSON serialization error: {0}")]
    Json(#[from] serde_json::Error),
}
