//! Error types for text2sql.
//!
//! Defines the main error enum used throughout the application. Pipeline stages
//! never surface these directly; they turn failures into sentinel values.

use thiserror::Error;

/// Main error type for text2sql operations.
#[derive(Error, Debug)]
pub enum Text2SqlError {
    /// Database connection errors (host unreachable, auth failed, etc.)
    #[error("Connection error: {0}")]
    Connection(String),

    /// Query execution errors (syntax errors, unknown columns, etc.)
    #[error("Query error: {0}")]
    Query(String),

    /// LLM errors (client could not be built, API failures, bad responses)
    #[error("LLM error: {0}")]
    Llm(String),

    /// Configuration errors (invalid config file, unregistered table, etc.)
    #[error("Configuration error: {0}")]
    Config(String),

    /// A condition that must hold before any question is processed.
    #[error("Precondition failed: {0}")]
    Precondition(String),

    /// Failures while writing exported results to disk.
    #[error("Export error: {0}")]
    Export(String),
}

impl Text2SqlError {
    /// Creates a connection error with the given message.
    pub fn connection(msg: impl Into<String>) -> Self {
        Self::Connection(msg.into())
    }

    /// Creates a query error with the given message.
    pub fn query(msg: impl Into<String>) -> Self {
        Self::Query(msg.into())
    }

    /// Creates an LLM error with the given message.
    pub fn llm(msg: impl Into<String>) -> Self {
        Self::Llm(msg.into())
    }

    /// Creates a configuration error with the given message.
    pub fn config(msg: impl Into<String>) -> Self {
        Self::Config(msg.into())
    }

    /// Creates a precondition error with the given message.
    pub fn precondition(msg: impl Into<String>) -> Self {
        Self::Precondition(msg.into())
    }

    /// Creates an export error with the given message.
    pub fn export(msg: impl Into<String>) -> Self {
        Self::Export(msg.into())
    }

    /// Returns the error category as a string for display purposes.
    pub fn category(&self) -> &'static str {
        match self {
            Self::Connection(_) => "Connection Error",
            Self::Query(_) => "Query Error",
            Self::Llm(_) => "LLM Error",
            Self::Config(_) => "Configuration Error",
            Self::Precondition(_) => "Precondition Error",
            Self::Export(_) => "Export Error",
        }
    }

    /// Returns the bare message without the category prefix.
    ///
    /// Used when the message is embedded in a rendered result, where the
    /// `Error: ` prefix is added by the renderer.
    pub fn message(&self) -> &str {
        match self {
            Self::Connection(msg)
            | Self::Query(msg)
            | Self::Llm(msg)
            | Self::Config(msg)
            | Self::Precondition(msg)
            | Self::Export(msg) => msg,
        }
    }
}

/// Result type alias using Text2SqlError.
pub type Result<T> = std::result::Result<T, Text2SqlError>;
