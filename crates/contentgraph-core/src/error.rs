//! Error types for content graph operations.
//!
//! This module provides the common `Error` type and `Result<T>` alias used
//! across all content graph crates. Uses `thiserror` for derive macros.
//!
//! # Taxonomy
//!
//! Absence is never an error: single-node lookups return `Ok(None)`.
//! What remains falls into three groups, each with an inspector method:
//!
//! - precondition violations ([`Error::is_precondition_violation`])
//! - structural integrity violations ([`Error::is_integrity_violation`])
//! - collaborator failures ([`Error::is_collaborator_failure`])

use std::path::{Path, PathBuf};

use thiserror::Error;

/// Boxed error raised by a backing store or schema collaborator.
pub type BoxedSourceError = Box<dyn std::error::Error + Send + Sync + 'static>;

/// Errors that can occur in content graph operations.
#[derive(Error, Debug)]
pub enum Error {
    /// I/O error.
    #[error("I/O error: {0}")]
    Io(#[from] std::io::Error),

    /// I/O error tied to a specific file.
    #[error("I/O error at {path}: {source}")]
    IoWithPath {
        /// The file that could not be read or written.
        path: PathBuf,
        /// Underlying I/O error.
        #[source]
        source: std::io::Error,
    },

    /// Configuration error.
    #[error("Configuration error: {0}")]
    Config(String),

    /// Invalid argument passed by the caller (negative limit, empty id, ...).
    #[error("Invalid argument: {0}")]
    InvalidArgument(String),

    /// Type constraints referenced a node type the schema does not know.
    #[error("Unknown node type: {0}")]
    UnknownNodeType(String),

    /// The hierarchy violates the forest invariant (cycle, second parent,
    /// runaway ancestor chain).
    #[error("Broken hierarchy: {0}")]
    BrokenHierarchy(String),

    /// Failure reported by a backing store or schema collaborator.
    #[error("Backend error: {0}")]
    Backend(#[source] BoxedSourceError),

    /// Parse error.
    #[error("Parse error: {0}")]
    Parse(String),

    /// Serialization error.
    #[error("Serialization error: {0}")]
    Serialization(String),

    /// Generic operation failure (poisoned lock, failed command).
    #[error("Operation failed: {0}")]
    Operation(String),
}

impl Error {
    /// Create a configuration error.
    pub fn config(msg: impl Into<String>) -> Self {
        Self::Config(msg.into())
    }

    /// Create an invalid argument error.
    pub fn invalid_argument(msg: impl Into<String>) -> Self {
        Self::InvalidArgument(msg.into())
    }

    /// Create an unknown node type error.
    pub fn unknown_node_type(name: impl Into<String>) -> Self {
        Self::UnknownNodeType(name.into())
    }

    /// Create a broken hierarchy error.
    pub fn broken_hierarchy(msg: impl Into<String>) -> Self {
        Self::BrokenHierarchy(msg.into())
    }

    /// Wrap a collaborator failure without altering it.
    pub fn backend(source: impl Into<BoxedSourceError>) -> Self {
        Self::Backend(source.into())
    }

    /// Create a parse error.
    pub fn parse(msg: impl Into<String>) -> Self {
        Self::Parse(msg.into())
    }

    /// Create a serialization error.
    pub fn serialization(msg: impl Into<String>) -> Self {
        Self::Serialization(msg.into())
    }

    /// Create an operation error.
    pub fn operation(msg: impl Into<String>) -> Self {
        Self::Operation(msg.into())
    }

    /// Attach a path to an I/O error.
    pub fn io_with_path(source: std::io::Error, path: impl AsRef<Path>) -> Self {
        Self::IoWithPath {
            path: path.as_ref().to_path_buf(),
            source,
        }
    }

    /// True for errors caused by invalid caller input.
    pub fn is_precondition_violation(&self) -> bool {
        matches!(
            self,
            Self::InvalidArgument(_) | Self::UnknownNodeType(_) | Self::Parse(_)
        )
    }

    /// True when the hierarchy itself is corrupt.
    pub fn is_integrity_violation(&self) -> bool {
        matches!(self, Self::BrokenHierarchy(_))
    }

    /// True when a collaborator (store, schema, filesystem) failed.
    pub fn is_collaborator_failure(&self) -> bool {
        matches!(self, Self::Backend(_) | Self::Io(_) | Self::IoWithPath { .. })
    }
}

/// Result type alias using the content graph's Error type.
pub type Result<T> = std::result::Result<T, Error>;
