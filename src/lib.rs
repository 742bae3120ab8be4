//! What Got Done export aggregator.
//!
//! Reconstructs a complete snapshot of one user's journal data (entries,
//! drafts, reactions, profile, preferences, follows) from a key-value style
//! datastore and renders it as a JSON bundle or a Markdown zip archive.

pub mod application;
pub mod domain;
pub mod infrastructure;

pub use domain::{AppError, Result};
