//! Domain layer - core types and the storage contract.
//!
//! This layer contains pure domain models, export representations and
//! error types without any I/O of its own.

pub mod calendar;
pub mod config;
pub mod datastore;
pub mod error;
pub mod export;
pub mod lookup;
pub mod models;

pub use calendar::WeekCalendar;
pub use config::{AppConfig, ExportConfig, PathConfig, StorageConfig};
pub use datastore::Datastore;
pub use error::{AppError, ExportPhase, Result};
pub use export::{
    ExportBundle, ExportedEntry, ExportedPreferences, ExportedProfile, ExportedReaction,
};
pub use lookup::Lookup;
pub use models::{
    EntryDate, EntryFilter, JournalEntry, Preferences, Reaction, UserProfile, Username, DATE_FORMAT,
};
