//! Domain-level error types for the export aggregator.
//!
//! All errors are typed with `thiserror`. Callers above the response layer
//! see them verbatim; only the response layer turns them into a status and
//! a user-facing message.

use std::fmt;

use thiserror::Error;

/// Stage of an export during which a hard error occurred.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ExportPhase {
    Drafts,
    Entries,
    Reactions,
    Preferences,
    Profile,
    Following,
}

impl fmt::Display for ExportPhase {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let name = match self {
            Self::Drafts => "unpublished drafts",
            Self::Entries => "published entries",
            Self::Reactions => "reactions",
            Self::Preferences => "preferences",
            Self::Profile => "user profile",
            Self::Following => "followed users",
        };
        f.write_str(name)
    }
}

/// Application-level errors.
#[derive(Error, Debug)]
pub enum AppError {
    /// The storage collaborator failed for a reason other than "not found".
    #[error("Storage error: {message}")]
    Storage {
        message: String,
        #[source]
        source: Option<Box<dyn std::error::Error + Send + Sync>>,
    },

    /// A hard error aborted an export.
    #[error("Export failed while reading {phase}: {source}")]
    Export {
        phase: ExportPhase,
        #[source]
        source: Box<AppError>,
    },

    /// Archive construction or finalization failed.
    #[error("Archive error: {message}")]
    Archive {
        message: String,
        #[source]
        source: Option<zip::result::ZipError>,
    },

    /// A lookup task ended without reporting an outcome.
    #[error("Worker error: {message}")]
    Worker { message: String },

    /// Invalid or corrupted data in storage.
    #[error("Invalid data: {message}")]
    InvalidData { message: String },

    /// Configuration or environment error.
    #[error("Configuration error: {message}")]
    Config { message: String },

    /// IO operation failed.
    #[error("IO error: {message}")]
    Io {
        message: String,
        #[source]
        source: Option<std::io::Error>,
    },
}

impl AppError {
    /// Create a storage error from a rusqlite error.
    pub fn database(err: rusqlite::Error) -> Self {
        Self::Storage {
            message: err.to_string(),
            source: Some(Box::new(err)),
        }
    }

    /// Create a storage error with no underlying cause.
    pub fn storage(message: impl Into<String>) -> Self {
        Self::Storage {
            message: message.into(),
            source: None,
        }
    }

    /// Tag an error with the export phase it aborted.
    #[must_use]
    pub fn during(self, phase: ExportPhase) -> Self {
        Self::Export {
            phase,
            source: Box::new(self),
        }
    }

    /// Phase of the export this error aborted, if any.
    #[must_use]
    pub const fn phase(&self) -> Option<ExportPhase> {
        match self {
            Self::Export { phase, .. } => Some(*phase),
            _ => None,
        }
    }

    /// Create an archive error from a zip error.
    pub fn archive(message: impl Into<String>, err: zip::result::ZipError) -> Self {
        Self::Archive {
            message: message.into(),
            source: Some(err),
        }
    }

    /// Create an IO error with context.
    pub fn io(message: impl Into<String>, err: std::io::Error) -> Self {
        Self::Io {
            message: message.into(),
            source: Some(err),
        }
    }
}

/// Result type alias using `AppError`.
pub type Result<T> = std::result::Result<T, AppError>;
