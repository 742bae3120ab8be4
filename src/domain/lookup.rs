//! Outcome of a point lookup against storage.

use super::error::{AppError, Result};

/// Result of a keyed lookup that may legitimately find nothing.
///
/// `NotFound` is an expected state, distinct from `Failed`.
#[derive(Debug)]
pub enum Lookup<T> {
    Found(T),
    NotFound,
    Failed(AppError),
}

impl<T> Lookup<T> {
    /// Collapses into a `Result`, mapping `NotFound` to `None`.
    ///
    /// # Errors
    /// Returns the underlying error for `Failed`.
    pub fn found(self) -> Result<Option<T>> {
        match self {
            Self::Found(value) => Ok(Some(value)),
            Self::NotFound => Ok(None),
            Self::Failed(err) => Err(err),
        }
    }

    /// Collapses into a `Result`, substituting the default for `NotFound`.
    ///
    /// # Errors
    /// Returns the underlying error for `Failed`.
    pub fn or_default(self) -> Result<T>
    where
        T: Default,
    {
        self.found().map(Option::unwrap_or_default)
    }

    #[must_use]
    pub const fn is_not_found(&self) -> bool {
        matches!(self, Self::NotFound)
    }
}

impl<T> From<Result<Option<T>>> for Lookup<T> {
    fn from(result: Result<Option<T>>) -> Self {
        match result {
            Ok(Some(value)) => Self::Found(value),
            Ok(None) => Self::NotFound,
            Err(err) => Self::Failed(err),
        }
    }
}
