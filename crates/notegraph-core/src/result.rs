//! Convenience result type alias for NoteGraph.

use crate::error::AppError;

/// A specialized `Result` type for NoteGraph operations.
pub type AppResult<T> = Result<T, AppError>;
