//! Error types for toolhub.

use thiserror::Error;

/// Failures at the document store boundary and in the services built on it.
#[derive(Error, Debug)]
pub enum StoreError {
    #[error("Store unavailable: {0}")]
    Unavailable(String),

    #[error("Database error: {0}")]
    Database(#[from] rusqlite::Error),

    #[error("Document codec error: {0}")]
    Codec(#[from] serde_json::Error),

    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),

    #[error("Invalid field name: {0}")]
    InvalidField(String),

    #[error("Unsupported filter on {field}: {reason}")]
    UnsupportedFilter { field: String, reason: String },

    #[error("Unsupported pipeline: {0}")]
    UnsupportedPipeline(String),

    #[error("Invalid input: {0}")]
    InvalidInput(String),
}

/// Failures while dispatching a tool call, rendering a prompt or reading a
/// resource.
#[derive(Error, Debug)]
pub enum ToolError {
    #[error("Unknown tool: {0}")]
    UnknownTool(String),

    #[error("Unknown prompt: {0}")]
    UnknownPrompt(String),

    #[error("Unknown resource: {0}")]
    UnknownResource(String),

    #[error("Missing argument: {0}")]
    MissingArg(String),

    #[error("Invalid argument {name}: {reason}")]
    InvalidArg { name: String, reason: String },

    #[error("Tool failed: {0}")]
    Failed(String),
}
