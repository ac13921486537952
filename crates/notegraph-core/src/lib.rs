//! # notegraph-core
//!
//! Core crate for NoteGraph. Contains configuration schemas, the link-graph
//! data structure consumed by extensions, collaborator traits, and the
//! unified error system.
//!
//! This crate has **no** internal dependencies on other NoteGraph crates.

pub mod config;
pub mod error;
pub mod graph;
pub mod result;
pub mod traits;

pub use error::AppError;
pub use result::AppResult;
