//! Test doubles shared by the application tests.

use std::collections::HashSet;
use std::sync::{Arc, Mutex};
use std::thread::ThreadId;

use crate::domain::{
    AppError, Datastore, EntryDate, EntryFilter, JournalEntry, Lookup, Preferences, Reaction,
    Result, UserProfile, Username,
};
use crate::infrastructure::MemoryDatastore;

/// Wraps a [`MemoryDatastore`] and fails chosen lookups.
#[derive(Default)]
pub struct FailingDatastore {
    pub inner: MemoryDatastore,
    pub draft_failures: HashSet<EntryDate>,
    pub reaction_failures: HashSet<EntryDate>,
    pub fail_entries: bool,
    pub fail_preferences: bool,
    pub fail_profile: bool,
    pub fail_following: bool,
    /// Threads the single-shot reads (entries, preferences, profile,
    /// following) ran on.
    pub read_threads: Mutex<Vec<ThreadId>>,
}

impl FailingDatastore {
    pub fn shared(self) -> Arc<dyn Datastore> {
        Arc::new(self)
    }

    fn record_thread(&self) {
        if let Ok(mut threads) = self.read_threads.lock() {
            threads.push(std::thread::current().id());
        }
    }
}

fn injected(what: &str) -> AppError {
    AppError::storage(format!("injected {what} failure"))
}

impl Datastore for FailingDatastore {
    fn get_entry(&self, username: &Username, date: EntryDate) -> Lookup<JournalEntry> {
        self.inner.get_entry(username, date)
    }

    fn read_entries(&self, filter: &EntryFilter) -> Result<Vec<JournalEntry>> {
        self.record_thread();
        if self.fail_entries {
            return Err(injected("entries"));
        }
        self.inner.read_entries(filter)
    }

    fn get_draft(&self, username: &Username, date: EntryDate) -> Lookup<JournalEntry> {
        if self.draft_failures.contains(&date) {
            return Lookup::Failed(injected("draft"));
        }
        self.inner.get_draft(username, date)
    }

    fn get_reactions(&self, username: &Username, date: EntryDate) -> Result<Vec<Reaction>> {
        if self.reaction_failures.contains(&date) {
            return Err(injected("reactions"));
        }
        self.inner.get_reactions(username, date)
    }

    fn get_preferences(&self, username: &Username) -> Lookup<Preferences> {
        self.record_thread();
        if self.fail_preferences {
            return Lookup::Failed(injected("preferences"));
        }
        self.inner.get_preferences(username)
    }

    fn get_user_profile(&self, username: &Username) -> Lookup<UserProfile> {
        self.record_thread();
        if self.fail_profile {
            return Lookup::Failed(injected("profile"));
        }
        self.inner.get_user_profile(username)
    }

    fn following(&self, username: &Username) -> Result<Vec<Username>> {
        self.record_thread();
        if self.fail_following {
            return Err(injected("following"));
        }
        self.inner.following(username)
    }
}

pub fn date(raw: &str) -> EntryDate {
    raw.parse().unwrap()
}

pub fn entry(author: &str, date: &str, last_modified: &str, markdown: &str) -> JournalEntry {
    JournalEntry {
        author: author.into(),
        date: date.parse().unwrap(),
        markdown: markdown.into(),
        last_modified: last_modified.parse().unwrap(),
    }
}

pub fn reaction(username: &str, symbol: &str, timestamp: &str) -> Reaction {
    Reaction {
        username: username.into(),
        symbol: symbol.into(),
        timestamp: timestamp.parse().unwrap(),
    }
}
