//! Route handlers organized by domain.

pub mod extension;
pub mod health;
pub mod notes;
pub mod plugins;
