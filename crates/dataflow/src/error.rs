//! Error types for definition processing.
//!
//! This module provides the main error type [`DataflowError`] which wraps
//! the error conditions that can occur while turning definitions into app
//! definitions, graphs and text.

use std::io;

use thiserror::Error;

use dataflow_dsl::{error::ParseError, graph::GraphError};

/// The main error type for definition processing.
///
/// # Diagnostic Variants
///
/// The `Parse` variant contains structured error information with spans into
/// the definition text, which is kept alongside for rich error reporting.
#[derive(Debug, Error)]
pub enum DataflowError {
    #[error("I/O error: {0}")]
    Io(#[from] io::Error),

    #[error("{err}")]
    Parse { err: ParseError, src: String },

    #[error("Graph error: {0}")]
    Graph(#[from] GraphError),

    #[error("Configuration error: {0}")]
    Config(String),

    #[error("JSON error: {0}")]
    Json(#[from] serde_json::Error),
}

impl DataflowError {
    /// Create a new `Parse` error with the associated definition text.
    pub fn new_parse_error(err: ParseError, src: impl Into<String>) -> Self {
        Self::Parse {
            err,
            src: src.into(),
        }
    }
}
