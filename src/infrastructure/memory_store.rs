//! In-memory datastore.
//!
//! Same semantics as the SQLite store, held in maps behind a mutex. Useful
//! for embedding and for tests.

use std::collections::{BTreeMap, BTreeSet, HashMap};
use std::sync::{Mutex, MutexGuard};

use crate::domain::{
    AppError, Datastore, EntryDate, EntryFilter, JournalEntry, Lookup, Preferences, Reaction,
    Result, UserProfile, Username,
};

type EntryKey = (Username, EntryDate);

#[derive(Debug, Default)]
struct Tables {
    entries: BTreeMap<EntryKey, JournalEntry>,
    drafts: BTreeMap<EntryKey, JournalEntry>,
    reactions: HashMap<EntryKey, Vec<Reaction>>,
    profiles: HashMap<Username, UserProfile>,
    preferences: HashMap<Username, Preferences>,
    follows: BTreeMap<Username, BTreeSet<Username>>,
}

/// Map-backed datastore.
#[derive(Debug, Default)]
pub struct MemoryDatastore {
    tables: Mutex<Tables>,
}

impl MemoryDatastore {
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    fn lock(&self) -> Result<MutexGuard<'_, Tables>> {
        self.tables
            .lock()
            .map_err(|_| AppError::storage("in-memory datastore lock poisoned"))
    }

    /// Insert or replace a published entry.
    ///
    /// # Errors
    /// Returns error if the store lock is poisoned.
    pub fn put_entry(&self, entry: JournalEntry) -> Result<()> {
        let key = (entry.author.clone(), entry.date);
        self.lock()?.entries.insert(key, entry);
        Ok(())
    }

    /// Insert or replace a draft.
    ///
    /// # Errors
    /// Returns error if the store lock is poisoned.
    pub fn put_draft(&self, draft: JournalEntry) -> Result<()> {
        let key = (draft.author.clone(), draft.date);
        self.lock()?.drafts.insert(key, draft);
        Ok(())
    }

    /// Record a reaction on the entry `author` wrote for `date`. A user has at
    /// most one reaction per entry; a newer one replaces the old.
    ///
    /// # Errors
    /// Returns error if the store lock is poisoned.
    pub fn put_reaction(&self, author: &Username, date: EntryDate, reaction: Reaction) -> Result<()> {
        let mut tables = self.lock()?;
        let list = tables.reactions.entry((author.clone(), date)).or_default();
        list.retain(|r| r.username != reaction.username);
        list.push(reaction);
        Ok(())
    }

    /// # Errors
    /// Returns error if the store lock is poisoned.
    pub fn put_user_profile(&self, username: &Username, profile: UserProfile) -> Result<()> {
        self.lock()?.profiles.insert(username.clone(), profile);
        Ok(())
    }

    /// # Errors
    /// Returns error if the store lock is poisoned.
    pub fn put_preferences(&self, username: &Username, prefs: Preferences) -> Result<()> {
        self.lock()?.preferences.insert(username.clone(), prefs);
        Ok(())
    }

    /// # Errors
    /// Returns error if the store lock is poisoned.
    pub fn add_follow(&self, follower: &Username, leader: &Username) -> Result<()> {
        self.lock()?
            .follows
            .entry(follower.clone())
            .or_default()
            .insert(leader.clone());
        Ok(())
    }
}

impl Datastore for MemoryDatastore {
    fn get_entry(&self, username: &Username, date: EntryDate) -> Lookup<JournalEntry> {
        self.lock()
            .map(|t| t.entries.get(&(username.clone(), date)).cloned())
            .into()
    }

    fn read_entries(&self, filter: &EntryFilter) -> Result<Vec<JournalEntry>> {
        let mut entries: Vec<JournalEntry> = self
            .lock()?
            .entries
            .values()
            .filter(|e| filter.matches(&e.author))
            .cloned()
            .collect();
        // Newest first, matching the SQLite store.
        entries.sort_by(|a, b| b.date.cmp(&a.date));
        Ok(entries)
    }

    fn get_draft(&self, username: &Username, date: EntryDate) -> Lookup<JournalEntry> {
        self.lock()
            .map(|t| t.drafts.get(&(username.clone(), date)).cloned())
            .into()
    }

    fn get_reactions(&self, username: &Username, date: EntryDate) -> Result<Vec<Reaction>> {
        Ok(self
            .lock()?
            .reactions
            .get(&(username.clone(), date))
            .cloned()
            .unwrap_or_default())
    }

    fn get_preferences(&self, username: &Username) -> Lookup<Preferences> {
        self.lock()
            .map(|t| t.preferences.get(username).cloned())
            .into()
    }

    fn get_user_profile(&self, username: &Username) -> Lookup<UserProfile> {
        self.lock()
            .map(|t| t.profiles.get(username).cloned())
            .into()
    }

    fn following(&self, username: &Username) -> Result<Vec<Username>> {
        Ok(self
            .lock()?
            .follows
            .get(username)
            .map(|leaders| leaders.iter().cloned().collect())
            .unwrap_or_default())
    }
}
