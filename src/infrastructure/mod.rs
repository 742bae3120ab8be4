//! Infrastructure layer - storage adapters and configuration files.
//!
//! This layer handles all I/O operations and external dependencies.

pub mod config;
pub mod memory_store;
pub mod sqlite_store;

pub use config::{config_file_path, ensure_config_exists, load_config, load_config_from_file, save_config};
pub use memory_store::MemoryDatastore;
pub use sqlite_store::SqliteDatastore;
