//! Core traits defined in `notegraph-core` and implemented by other crates.

pub mod notes;

pub use notes::LinkGraphSource;
