//! Export-facing representations.
//!
//! These are the shapes serialized into the structured export. Timestamps
//! are RFC 3339 strings and dates are calendar-day strings so the output
//! does not depend on how storage encodes them.

use std::collections::BTreeMap;

use chrono::{DateTime, SecondsFormat, Utc};
use serde::{Deserialize, Serialize};

use super::models::{EntryDate, JournalEntry, Preferences, Reaction, UserProfile, Username};

/// Renders a timestamp the way every exported field does.
#[must_use]
pub fn format_timestamp(ts: &DateTime<Utc>) -> String {
    ts.to_rfc3339_opts(SecondsFormat::Secs, true)
}

/// An exported entry or draft.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct ExportedEntry {
    pub date: EntryDate,
    pub last_modified: String,
    pub markdown: String,
}

impl From<&JournalEntry> for ExportedEntry {
    fn from(entry: &JournalEntry) -> Self {
        Self {
            date: entry.date,
            last_modified: format_timestamp(&entry.last_modified),
            markdown: entry.markdown.clone(),
        }
    }
}

/// An exported reaction.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct ExportedReaction {
    pub username: Username,
    pub symbol: String,
    pub timestamp: String,
}

impl From<&Reaction> for ExportedReaction {
    fn from(reaction: &Reaction) -> Self {
        Self {
            username: reaction.username.clone(),
            symbol: reaction.symbol.clone(),
            timestamp: format_timestamp(&reaction.timestamp),
        }
    }
}

/// Exported profile; absent handles serialize as empty strings.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct ExportedProfile {
    pub about_markdown: String,
    pub twitter_handle: String,
    pub email_address: String,
    pub mastodon_address: String,
}

impl From<&UserProfile> for ExportedProfile {
    fn from(profile: &UserProfile) -> Self {
        Self {
            about_markdown: profile.about_markdown.clone(),
            twitter_handle: profile.twitter_handle.clone().unwrap_or_default(),
            email_address: profile.email_address.clone().unwrap_or_default(),
            mastodon_address: profile.mastodon_address.clone().unwrap_or_default(),
        }
    }
}

#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct ExportedPreferences {
    pub entry_template: String,
}

impl From<&Preferences> for ExportedPreferences {
    fn from(prefs: &Preferences) -> Self {
        Self {
            entry_template: prefs.entry_template.clone(),
        }
    }
}

/// Complete snapshot of one user's data.
///
/// `reactions` never holds an empty list: dates without reactions are
/// absent. The ordered map keeps serialization deterministic.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct ExportBundle {
    pub entries: Vec<ExportedEntry>,
    pub drafts: Vec<ExportedEntry>,
    pub reactions: BTreeMap<EntryDate, Vec<ExportedReaction>>,
    pub following: Vec<Username>,
    pub profile: ExportedProfile,
    pub preferences: ExportedPreferences,
}

impl ExportBundle {
    /// Total number of reactions across all dates.
    #[must_use]
    pub fn reaction_count(&self) -> usize {
        self.reactions.values().map(Vec::len).sum()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_exported_entry_formats_timestamp() {
        let entry = JournalEntry {
            author: "alice".into(),
            date: EntryDate::from_ymd(2025, 7, 4).unwrap(),
            markdown: "shipped it".into(),
            last_modified: "2025-07-04T18:30:00.123456Z".parse().unwrap(),
        };
        let exported = ExportedEntry::from(&entry);
        assert_eq!(exported.last_modified, "2025-07-04T18:30:00Z");
        assert_eq!(exported.date.to_string(), "2025-07-04");
    }

    #[test]
    fn test_empty_bundle_json_shape() {
        let json = serde_json::to_value(ExportBundle::default()).unwrap();
        assert_eq!(
            json,
            serde_json::json!({
                "entries": [],
                "drafts": [],
                "reactions": {},
                "following": [],
                "profile": {
                    "aboutMarkdown": "",
                    "twitterHandle": "",
                    "emailAddress": "",
                    "mastodonAddress": ""
                },
                "preferences": { "entryTemplate": "" }
            })
        );
    }

    #[test]
    fn test_reactions_keyed_by_date_string() {
        let mut bundle = ExportBundle::default();
        bundle.reactions.insert(
            EntryDate::from_ymd(2025, 7, 4).unwrap(),
            vec![ExportedReaction {
                username: "bob".into(),
                symbol: "👍".into(),
                timestamp: "2025-07-05T09:00:00Z".into(),
            }],
        );
        let json = serde_json::to_value(&bundle).unwrap();
        assert_eq!(json["reactions"]["2025-07-04"][0]["username"], "bob");
        assert_eq!(bundle.reaction_count(), 1);
    }
}
