//! Errors raised by the graph service.

use notegraph_core::error::AppError;
use thiserror::Error;

/// Graph service failures.
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum GraphError {
    /// Requested depth outside `1..=ceiling`.
    #[error("depth {requested} is outside the allowed range 1..={ceiling}")]
    DepthOutOfRange {
        /// Depth asked for.
        requested: u32,
        /// Largest accepted depth.
        ceiling: u32,
    },

    /// Depth parameter could not be parsed.
    #[error("depth must be a positive integer, got '{0}'")]
    InvalidDepth(String),

    /// Node id is empty or escapes the notes root.
    #[error("invalid node id '{0}'")]
    InvalidNodeId(String),

    /// Expansion kind is neither `transient` nor `pinned`.
    #[error("invalid expansion kind '{0}', expected 'transient' or 'pinned'")]
    InvalidKind(String),

    /// Session id is malformed.
    #[error("invalid session id '{0}'")]
    InvalidSession(String),

    /// No note with that id.
    #[error("note not found: {0}")]
    UnknownNode(String),

    /// Session expired or never existed.
    #[error("graph session not found: {0}")]
    UnknownSession(String),
}

impl From<GraphError> for AppError {
    fn from(err: GraphError) -> Self {
        match &err {
            GraphError::UnknownNode(_) | GraphError::UnknownSession(_) => {
                AppError::not_found(err.to_string())
            }
            GraphError::DepthOutOfRange { .. }
            | GraphError::InvalidDepth(_)
            | GraphError::InvalidNodeId(_)
            | GraphError::InvalidKind(_)
            | GraphError::InvalidSession(_) => AppError::validation(err.to_string()),
        }
    }
}
