//! Storage collaborator consumed by the export aggregator.

use super::error::Result;
use super::lookup::Lookup;
use super::models::{EntryDate, EntryFilter, JournalEntry, Preferences, Reaction, UserProfile, Username};

/// Point lookups keyed by user, or by user and date.
///
/// Implementations must be safe to call from many threads at once; callers
/// never lock around them. Calls may block.
pub trait Datastore: Send + Sync {
    /// Published entry for `username` on `date`.
    fn get_entry(&self, username: &Username, date: EntryDate) -> Lookup<JournalEntry>;

    /// All published entries matching `filter`.
    ///
    /// # Errors
    /// Returns error if the underlying read fails.
    fn read_entries(&self, filter: &EntryFilter) -> Result<Vec<JournalEntry>>;

    /// Unpublished draft for `username` on `date`.
    fn get_draft(&self, username: &Username, date: EntryDate) -> Lookup<JournalEntry>;

    /// Reactions on the entry `username` wrote for `date`, in no particular
    /// order. No reactions is an empty list, never an error.
    ///
    /// # Errors
    /// Returns error if the underlying read fails.
    fn get_reactions(&self, username: &Username, date: EntryDate) -> Result<Vec<Reaction>>;

    fn get_preferences(&self, username: &Username) -> Lookup<Preferences>;

    fn get_user_profile(&self, username: &Username) -> Lookup<UserProfile>;

    /// Users that `username` follows.
    ///
    /// # Errors
    /// Returns error if the underlying read fails.
    fn following(&self, username: &Username) -> Result<Vec<Username>>;
}
