//! Domain models for journal data.
//!
//! These are read-only snapshots of what the storage collaborator holds.
//! The export aggregator never mutates them.

use std::fmt;
use std::str::FromStr;

use chrono::{DateTime, NaiveDate, Utc};
use serde::{Deserialize, Deserializer, Serialize, Serializer};

/// Canonical calendar-day format used for entry dates.
pub const DATE_FORMAT: &str = "%Y-%m-%d";

/// Name of a journal author.
#[derive(Debug, Clone, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
#[serde(transparent)]
pub struct Username(String);

impl Username {
    pub fn new(name: impl Into<String>) -> Self {
        Self(name.into())
    }

    #[must_use]
    pub fn as_str(&self) -> &str {
        &self.0
    }
}

impl fmt::Display for Username {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.0)
    }
}

impl From<&str> for Username {
    fn from(name: &str) -> Self {
        Self::new(name)
    }
}

/// Calendar day identifying a one-week journal period.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash)]
pub struct EntryDate(NaiveDate);

impl EntryDate {
    #[must_use]
    pub const fn new(date: NaiveDate) -> Self {
        Self(date)
    }

    /// Builds a date from its parts, `None` if the day does not exist.
    #[must_use]
    pub fn from_ymd(year: i32, month: u32, day: u32) -> Option<Self> {
        NaiveDate::from_ymd_opt(year, month, day).map(Self)
    }

    #[must_use]
    pub const fn as_naive(&self) -> NaiveDate {
        self.0
    }
}

impl fmt::Display for EntryDate {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.0.format(DATE_FORMAT))
    }
}

impl FromStr for EntryDate {
    type Err = chrono::ParseError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        NaiveDate::parse_from_str(s, DATE_FORMAT).map(Self)
    }
}

impl From<NaiveDate> for EntryDate {
    fn from(date: NaiveDate) -> Self {
        Self(date)
    }
}

impl Serialize for EntryDate {
    fn serialize<S: Serializer>(&self, serializer: S) -> Result<S::Ok, S::Error> {
        serializer.collect_str(self)
    }
}

impl<'de> Deserialize<'de> for EntryDate {
    fn deserialize<D: Deserializer<'de>>(deserializer: D) -> Result<Self, D::Error> {
        let raw = String::deserialize(deserializer)?;
        raw.parse().map_err(serde::de::Error::custom)
    }
}

/// A journal entry, published or draft.
///
/// Drafts share this shape; whether a value is a draft depends only on
/// which lookup produced it.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct JournalEntry {
    pub author: Username,
    pub date: EntryDate,
    pub markdown: String,
    pub last_modified: DateTime<Utc>,
}

impl JournalEntry {
    /// Calendar day of the last modification, truncated in UTC.
    #[must_use]
    pub fn last_modified_date(&self) -> EntryDate {
        EntryDate(self.last_modified.date_naive())
    }
}

/// A reaction one user left on another user's entry.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Reaction {
    pub username: Username,
    pub symbol: String,
    pub timestamp: DateTime<Utc>,
}

/// Public profile of a user.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct UserProfile {
    pub about_markdown: String,
    pub twitter_handle: Option<String>,
    pub email_address: Option<String>,
    pub mastodon_address: Option<String>,
}

/// Per-user settings.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct Preferences {
    pub entry_template: String,
}

/// Filter for bulk entry reads.
#[derive(Debug, Clone, Default)]
pub struct EntryFilter {
    /// Restrict to entries written by these users. Empty means everyone.
    pub by_users: Vec<Username>,
}

impl EntryFilter {
    #[must_use]
    pub fn by_user(username: &Username) -> Self {
        Self {
            by_users: vec![username.clone()],
        }
    }

    #[must_use]
    pub fn matches(&self, author: &Username) -> bool {
        self.by_users.is_empty() || self.by_users.contains(author)
    }
}
