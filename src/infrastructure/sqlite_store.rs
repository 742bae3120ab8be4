//! SQLite-backed journal datastore.
//!
//! Holds entries, drafts, reactions, profiles, preferences and follows.
//! Dates are stored as `YYYY-MM-DD` text and timestamps as RFC 3339 text.

use std::ops::Deref;
use std::path::{Path, PathBuf};
use std::sync::Mutex;
use std::time::Duration;

use chrono::{DateTime, Utc};
use rusqlite::{params, params_from_iter, Connection, OptionalExtension};

use crate::domain::{
    AppError, Datastore, EntryDate, EntryFilter, JournalEntry, Lookup, Preferences, Reaction,
    Result, UserProfile, Username,
};

/// Idle connections kept for reuse.
const MAX_IDLE_CONNECTIONS: usize = 8;

/// How long a connection waits on a locked database before failing.
const BUSY_TIMEOUT: Duration = Duration::from_secs(5);

/// Raw entry or draft row before date/timestamp parsing.
struct EntryRow {
    author: String,
    date: String,
    markdown: String,
    last_modified: String,
}

impl EntryRow {
    fn from_row(row: &rusqlite::Row<'_>) -> rusqlite::Result<Self> {
        Ok(Self {
            author: row.get(0)?,
            date: row.get(1)?,
            markdown: row.get(2)?,
            last_modified: row.get(3)?,
        })
    }

    fn into_entry(self) -> Result<JournalEntry> {
        Ok(JournalEntry {
            author: Username::new(self.author),
            date: parse_date(&self.date)?,
            markdown: self.markdown,
            last_modified: parse_timestamp(&self.last_modified)?,
        })
    }
}

fn parse_date(raw: &str) -> Result<EntryDate> {
    raw.parse().map_err(|e| AppError::InvalidData {
        message: format!("bad entry date '{raw}': {e}"),
    })
}

fn parse_timestamp(raw: &str) -> Result<DateTime<Utc>> {
    DateTime::parse_from_rfc3339(raw)
        .map(|dt| dt.with_timezone(&Utc))
        .map_err(|e| AppError::InvalidData {
            message: format!("bad timestamp '{raw}': {e}"),
        })
}

fn open_connection(path: &Path) -> Result<Connection> {
    let conn = Connection::open(path).map_err(AppError::database)?;
    conn.busy_timeout(BUSY_TIMEOUT).map_err(AppError::database)?;
    conn.execute_batch("PRAGMA synchronous = NORMAL;")
        .map_err(AppError::database)?;
    Ok(conn)
}

/// Journal datastore using SQLite.
///
/// Each call checks out its own connection, so concurrent lookups run in
/// parallel under WAL instead of queueing on one handle.
pub struct SqliteDatastore {
    path: PathBuf,
    idle: Mutex<Vec<Connection>>,
}

/// A connection borrowed from the store; returns to the idle list on drop.
struct PooledConnection<'a> {
    store: &'a SqliteDatastore,
    conn: Option<Connection>,
}

impl Deref for PooledConnection<'_> {
    type Target = Connection;

    fn deref(&self) -> &Connection {
        // Only `drop` takes the connection out.
        self.conn.as_ref().unwrap_or_else(|| unreachable!())
    }
}

impl Drop for PooledConnection<'_> {
    fn drop(&mut self) {
        if let (Some(conn), Ok(mut idle)) = (self.conn.take(), self.store.idle.lock()) {
            if idle.len() < MAX_IDLE_CONNECTIONS {
                idle.push(conn);
            }
        }
    }
}

impl SqliteDatastore {
    /// Opens or creates the journal database.
    ///
    /// # Errors
    /// Returns error if database cannot be opened or schema creation fails.
    pub fn open(path: &Path) -> Result<Self> {
        // Ensure parent directory exists
        if let Some(parent) = path.parent() {
            std::fs::create_dir_all(parent)
                .map_err(|e| AppError::io("Failed to create storage directory", e))?;
        }

        let conn = open_connection(path)?;
        conn.execute_batch("PRAGMA journal_mode = WAL;")
            .map_err(AppError::database)?;

        let store = Self {
            path: path.to_path_buf(),
            idle: Mutex::new(vec![conn]),
        };
        store.init_schema()?;

        tracing::debug!(path = %path.display(), "Opened journal database");

        Ok(store)
    }

    fn conn(&self) -> Result<PooledConnection<'_>> {
        let reused = self
            .idle
            .lock()
            .map_err(|_| AppError::storage("connection pool lock poisoned"))?
            .pop();

        let conn = match reused {
            Some(conn) => conn,
            None => open_connection(&self.path)?,
        };

        Ok(PooledConnection {
            store: self,
            conn: Some(conn),
        })
    }

    /// Initialize database schema.
    fn init_schema(&self) -> Result<()> {
        self.conn()?
            .execute_batch(
                r"
            CREATE TABLE IF NOT EXISTS entries (
                username TEXT NOT NULL,
                date TEXT NOT NULL,
                markdown TEXT NOT NULL DEFAULT '',
                last_modified TEXT NOT NULL,
                PRIMARY KEY (username, date)
            );

            CREATE TABLE IF NOT EXISTS drafts (
                username TEXT NOT NULL,
                date TEXT NOT NULL,
                markdown TEXT NOT NULL DEFAULT '',
                last_modified TEXT NOT NULL,
                PRIMARY KEY (username, date)
            );

            CREATE TABLE IF NOT EXISTS reactions (
                entry_author TEXT NOT NULL,
                entry_date TEXT NOT NULL,
                username TEXT NOT NULL,
                symbol TEXT NOT NULL,
                timestamp TEXT NOT NULL,
                PRIMARY KEY (entry_author, entry_date, username)
            );

            CREATE TABLE IF NOT EXISTS user_profiles (
                username TEXT PRIMARY KEY,
                about_markdown TEXT NOT NULL DEFAULT '',
                twitter_handle TEXT,
                email_address TEXT,
                mastodon_address TEXT
            );

            CREATE TABLE IF NOT EXISTS user_preferences (
                username TEXT PRIMARY KEY,
                entry_template TEXT NOT NULL DEFAULT ''
            );

            CREATE TABLE IF NOT EXISTS follows (
                follower TEXT NOT NULL,
                leader TEXT NOT NULL,
                created TEXT NOT NULL DEFAULT (datetime('now')),
                PRIMARY KEY (follower, leader)
            );

            CREATE INDEX IF NOT EXISTS idx_entries_date
                ON entries(date DESC);
            ",
            )
            .map_err(AppError::database)?;

        Ok(())
    }

    /// Upsert a published entry.
    ///
    /// # Errors
    /// Returns error if the write fails.
    pub fn put_entry(&self, entry: &JournalEntry) -> Result<()> {
        self.upsert_entry_row("entries", entry)
    }

    /// Upsert a draft.
    ///
    /// # Errors
    /// Returns error if the write fails.
    pub fn put_draft(&self, draft: &JournalEntry) -> Result<()> {
        self.upsert_entry_row("drafts", draft)
    }

    fn upsert_entry_row(&self, table: &str, entry: &JournalEntry) -> Result<()> {
        self.conn()?
            .execute(
                &format!(
                    "INSERT INTO {table} (username, date, markdown, last_modified)
                     VALUES (?1, ?2, ?3, ?4)
                     ON CONFLICT(username, date) DO UPDATE SET
                        markdown = excluded.markdown,
                        last_modified = excluded.last_modified"
                ),
                params![
                    entry.author.as_str(),
                    entry.date.to_string(),
                    &entry.markdown,
                    entry.last_modified.to_rfc3339(),
                ],
            )
            .map_err(AppError::database)?;
        Ok(())
    }

    /// Upsert the reaction `reaction.username` left on `author`'s entry.
    ///
    /// # Errors
    /// Returns error if the write fails.
    pub fn put_reaction(&self, author: &Username, date: EntryDate, reaction: &Reaction) -> Result<()> {
        self.conn()?
            .execute(
                "INSERT INTO reactions (entry_author, entry_date, username, symbol, timestamp)
                 VALUES (?1, ?2, ?3, ?4, ?5)
                 ON CONFLICT(entry_author, entry_date, username) DO UPDATE SET
                    symbol = excluded.symbol,
                    timestamp = excluded.timestamp",
                params![
                    author.as_str(),
                    date.to_string(),
                    reaction.username.as_str(),
                    &reaction.symbol,
                    reaction.timestamp.to_rfc3339(),
                ],
            )
            .map_err(AppError::database)?;
        Ok(())
    }

    /// # Errors
    /// Returns error if the write fails.
    pub fn put_user_profile(&self, username: &Username, profile: &UserProfile) -> Result<()> {
        self.conn()?
            .execute(
                "INSERT INTO user_profiles
                    (username, about_markdown, twitter_handle, email_address, mastodon_address)
                 VALUES (?1, ?2, ?3, ?4, ?5)
                 ON CONFLICT(username) DO UPDATE SET
                    about_markdown = excluded.about_markdown,
                    twitter_handle = excluded.twitter_handle,
                    email_address = excluded.email_address,
                    mastodon_address = excluded.mastodon_address",
                params![
                    username.as_str(),
                    &profile.about_markdown,
                    &profile.twitter_handle,
                    &profile.email_address,
                    &profile.mastodon_address,
                ],
            )
            .map_err(AppError::database)?;
        Ok(())
    }

    /// # Errors
    /// Returns error if the write fails.
    pub fn put_preferences(&self, username: &Username, prefs: &Preferences) -> Result<()> {
        self.conn()?
            .execute(
                "INSERT INTO user_preferences (username, entry_template) VALUES (?1, ?2)
                 ON CONFLICT(username) DO UPDATE SET entry_template = excluded.entry_template",
                params![username.as_str(), &prefs.entry_template],
            )
            .map_err(AppError::database)?;
        Ok(())
    }

    /// # Errors
    /// Returns error if the write fails.
    pub fn add_follow(&self, follower: &Username, leader: &Username) -> Result<()> {
        self.conn()?
            .execute(
                "INSERT OR IGNORE INTO follows (follower, leader) VALUES (?1, ?2)",
                params![follower.as_str(), leader.as_str()],
            )
            .map_err(AppError::database)?;
        Ok(())
    }

    fn get_entry_row(&self, table: &str, username: &Username, date: EntryDate) -> Result<Option<JournalEntry>> {
        let row = self
            .conn()?
            .query_row(
                &format!(
                    "SELECT username, date, markdown, last_modified FROM {table}
                     WHERE username = ?1 AND date = ?2"
                ),
                params![username.as_str(), date.to_string()],
                EntryRow::from_row,
            )
            .optional()
            .map_err(AppError::database)?;

        row.map(EntryRow::into_entry).transpose()
    }
}

impl Datastore for SqliteDatastore {
    fn get_entry(&self, username: &Username, date: EntryDate) -> Lookup<JournalEntry> {
        self.get_entry_row("entries", username, date).into()
    }

    fn read_entries(&self, filter: &EntryFilter) -> Result<Vec<JournalEntry>> {
        let where_clause = if filter.by_users.is_empty() {
            String::new()
        } else {
            let placeholders = vec!["?"; filter.by_users.len()].join(", ");
            format!("WHERE username IN ({placeholders})")
        };

        let rows = {
            let conn = self.conn()?;
            let mut stmt = conn
                .prepare(&format!(
                    "SELECT username, date, markdown, last_modified FROM entries
                     {where_clause}
                     ORDER BY date DESC, username"
                ))
                .map_err(AppError::database)?;
            let rows = stmt
                .query_map(
                    params_from_iter(filter.by_users.iter().map(Username::as_str)),
                    EntryRow::from_row,
                )
                .map_err(AppError::database)?
                .collect::<rusqlite::Result<Vec<_>>>()
                .map_err(AppError::database)?;
            rows
        };

        let entries = rows
            .into_iter()
            .map(EntryRow::into_entry)
            .collect::<Result<Vec<_>>>()?;

        tracing::debug!("Read {} entries", entries.len());

        Ok(entries)
    }

    fn get_draft(&self, username: &Username, date: EntryDate) -> Lookup<JournalEntry> {
        self.get_entry_row("drafts", username, date).into()
    }

    fn get_reactions(&self, username: &Username, date: EntryDate) -> Result<Vec<Reaction>> {
        let conn = self.conn()?;
        let mut stmt = conn
            .prepare(
                "SELECT username, symbol, timestamp FROM reactions
                 WHERE entry_author = ?1 AND entry_date = ?2",
            )
            .map_err(AppError::database)?;

        let rows = stmt
            .query_map(params![username.as_str(), date.to_string()], |row| {
                Ok((
                    row.get::<_, String>(0)?,
                    row.get::<_, String>(1)?,
                    row.get::<_, String>(2)?,
                ))
            })
            .map_err(AppError::database)?;

        let mut reactions = Vec::new();
        for row in rows {
            let (reactor, symbol, timestamp) = row.map_err(AppError::database)?;
            reactions.push(Reaction {
                username: Username::new(reactor),
                symbol,
                timestamp: parse_timestamp(&timestamp)?,
            });
        }

        Ok(reactions)
    }

    fn get_preferences(&self, username: &Username) -> Lookup<Preferences> {
        let result = self.conn().and_then(|conn| {
            conn.query_row(
                "SELECT entry_template FROM user_preferences WHERE username = ?1",
                [username.as_str()],
                |row| {
                    Ok(Preferences {
                        entry_template: row.get(0)?,
                    })
                },
            )
            .optional()
            .map_err(AppError::database)
        });
        result.into()
    }

    fn get_user_profile(&self, username: &Username) -> Lookup<UserProfile> {
        let result = self.conn().and_then(|conn| {
            conn.query_row(
                "SELECT about_markdown, twitter_handle, email_address, mastodon_address
                 FROM user_profiles WHERE username = ?1",
                [username.as_str()],
                |row| {
                    Ok(UserProfile {
                        about_markdown: row.get(0)?,
                        twitter_handle: row.get(1)?,
                        email_address: row.get(2)?,
                        mastodon_address: row.get(3)?,
                    })
                },
            )
            .optional()
            .map_err(AppError::database)
        });
        result.into()
    }

    fn following(&self, username: &Username) -> Result<Vec<Username>> {
        let conn = self.conn()?;
        let mut stmt = conn
            .prepare("SELECT leader FROM follows WHERE follower = ?1 ORDER BY leader")
            .map_err(AppError::database)?;

        let leaders = stmt
            .query_map([username.as_str()], |row| row.get::<_, String>(0))
            .map_err(AppError::database)?
            .map(|r| r.map(Username::new))
            .collect::<rusqlite::Result<Vec<_>>>()
            .map_err(AppError::database)?;

        Ok(leaders)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use tempfile::tempdir;

    fn entry(author: &str, date: &str, last_modified: &str) -> JournalEntry {
        JournalEntry {
            author: author.into(),
            date: date.parse().unwrap(),
            markdown: format!("* did things on {date}"),
            last_modified: last_modified.parse().unwrap(),
        }
    }

    #[test]
    fn test_open_creates_schema() {
        let dir = tempdir().unwrap();
        let store = SqliteDatastore::open(&dir.path().join("nested").join("test.db")).unwrap();

        let count: i64 = store
            .conn()
            .unwrap()
            .query_row(
                "SELECT COUNT(*) FROM sqlite_master WHERE type='table'",
                [],
                |row| row.get(0),
            )
            .unwrap();

        assert_eq!(count, 6);
    }

    #[test]
    fn test_entry_and_draft_roundtrip() {
        let dir = tempdir().unwrap();
        let store = SqliteDatastore::open(&dir.path().join("test.db")).unwrap();
        let alice = Username::from("alice");
        let date: EntryDate = "2025-07-04".parse().unwrap();

        let published = entry("alice", "2025-07-04", "2025-07-05T08:00:00Z");
        store.put_entry(&published).unwrap();

        match store.get_entry(&alice, date) {
            Lookup::Found(found) => assert_eq!(found, published),
            other => panic!("expected entry, got {other:?}"),
        }
        assert!(store.get_draft(&alice, date).is_not_found());

        let draft = entry("alice", "2025-07-11", "2025-07-09T10:15:00Z");
        store.put_draft(&draft).unwrap();
        let found = store
            .get_draft(&alice, draft.date)
            .found()
            .unwrap()
            .unwrap();
        assert_eq!(found.markdown, draft.markdown);
    }

    #[test]
    fn test_read_entries_by_user_newest_first() {
        let dir = tempdir().unwrap();
        let store = SqliteDatastore::open(&dir.path().join("test.db")).unwrap();
        store.put_entry(&entry("alice", "2025-06-27", "2025-06-27T09:00:00Z")).unwrap();
        store.put_entry(&entry("alice", "2025-07-04", "2025-07-04T09:00:00Z")).unwrap();
        store.put_entry(&entry("bob", "2025-07-04", "2025-07-04T09:00:00Z")).unwrap();

        let entries = store
            .read_entries(&EntryFilter::by_user(&"alice".into()))
            .unwrap();
        let dates: Vec<String> = entries.iter().map(|e| e.date.to_string()).collect();
        assert_eq!(dates, vec!["2025-07-04", "2025-06-27"]);
    }

    #[test]
    fn test_reactions_profile_preferences_following() {
        let dir = tempdir().unwrap();
        let store = SqliteDatastore::open(&dir.path().join("test.db")).unwrap();
        let alice = Username::from("alice");
        let date: EntryDate = "2025-07-04".parse().unwrap();

        store
            .put_reaction(
                &alice,
                date,
                &Reaction {
                    username: "bob".into(),
                    symbol: "👍".into(),
                    timestamp: "2025-07-05T09:00:00Z".parse().unwrap(),
                },
            )
            .unwrap();
        let reactions = store.get_reactions(&alice, date).unwrap();
        assert_eq!(reactions.len(), 1);
        assert_eq!(reactions[0].username.as_str(), "bob");
        assert!(store
            .get_reactions(&alice, "2025-06-27".parse().unwrap())
            .unwrap()
            .is_empty());

        assert!(store.get_user_profile(&alice).is_not_found());
        let profile = UserProfile {
            about_markdown: "I build things".into(),
            twitter_handle: Some("alice".into()),
            ..UserProfile::default()
        };
        store.put_user_profile(&alice, &profile).unwrap();
        assert_eq!(store.get_user_profile(&alice).found().unwrap(), Some(profile));

        assert!(store.get_preferences(&alice).is_not_found());
        let prefs = Preferences {
            entry_template: "## Done\n".into(),
        };
        store.put_preferences(&alice, &prefs).unwrap();
        assert_eq!(store.get_preferences(&alice).or_default().unwrap(), prefs);

        store.add_follow(&alice, &"carol".into()).unwrap();
        store.add_follow(&alice, &"bob".into()).unwrap();
        store.add_follow(&alice, &"bob".into()).unwrap();
        let following: Vec<String> = store
            .following(&alice)
            .unwrap()
            .iter()
            .map(|u| u.to_string())
            .collect();
        assert_eq!(following, vec!["bob", "carol"]);
    }

    #[test]
    fn test_read_entries_skips_other_users_rows() {
        let dir = tempdir().unwrap();
        let store = SqliteDatastore::open(&dir.path().join("test.db")).unwrap();
        store.put_entry(&entry("alice", "2025-07-04", "2025-07-04T09:00:00Z")).unwrap();
        store
            .conn()
            .unwrap()
            .execute(
                "INSERT INTO entries (username, date, markdown, last_modified)
                 VALUES ('bob', '2025-07-04', '', 'garbage')",
                [],
            )
            .unwrap();

        let entries = store
            .read_entries(&EntryFilter::by_user(&"alice".into()))
            .unwrap();
        assert_eq!(entries.len(), 1);
        assert_eq!(entries[0].author.as_str(), "alice");

        assert!(store.read_entries(&EntryFilter::default()).is_err());
    }

    #[test]
    fn test_read_entries_unfiltered_and_multi_user() {
        let dir = tempdir().unwrap();
        let store = SqliteDatastore::open(&dir.path().join("test.db")).unwrap();
        store.put_entry(&entry("alice", "2025-06-27", "2025-06-27T09:00:00Z")).unwrap();
        store.put_entry(&entry("bob", "2025-07-04", "2025-07-04T09:00:00Z")).unwrap();
        store.put_entry(&entry("carol", "2025-07-04", "2025-07-04T09:00:00Z")).unwrap();

        let everyone = store.read_entries(&EntryFilter::default()).unwrap();
        let authors: Vec<&str> = everyone.iter().map(|e| e.author.as_str()).collect();
        assert_eq!(authors, vec!["bob", "carol", "alice"]);

        let filter = EntryFilter {
            by_users: vec!["alice".into(), "carol".into()],
        };
        let authors: Vec<String> = store
            .read_entries(&filter)
            .unwrap()
            .iter()
            .map(|e| e.author.to_string())
            .collect();
        assert_eq!(authors, vec!["carol", "alice"]);
    }

    #[test]
    fn test_concurrent_lookups_use_separate_connections() {
        let dir = tempdir().unwrap();
        let store = SqliteDatastore::open(&dir.path().join("test.db")).unwrap();
        store.put_draft(&entry("alice", "2025-07-04", "2025-07-04T09:00:00Z")).unwrap();

        let first = store.conn().unwrap();
        let second = store.conn().unwrap();
        assert!(store.get_draft(&"alice".into(), "2025-07-04".parse().unwrap()).found().unwrap().is_some());
        drop(first);
        drop(second);

        assert_eq!(store.idle.lock().unwrap().len(), 3);

        std::thread::scope(|scope| {
            for _ in 0..16 {
                scope.spawn(|| {
                    let found = store
                        .get_draft(&"alice".into(), "2025-07-04".parse().unwrap())
                        .found()
                        .unwrap();
                    assert!(found.is_some());
                });
            }
        });
        assert!(store.idle.lock().unwrap().len() <= MAX_IDLE_CONNECTIONS);
    }

    #[test]
    fn test_corrupt_date_is_an_error_not_a_miss() {
        let dir = tempdir().unwrap();
        let store = SqliteDatastore::open(&dir.path().join("test.db")).unwrap();
        store
            .conn()
            .unwrap()
            .execute(
                "INSERT INTO entries (username, date, markdown, last_modified)
                 VALUES ('alice', 'not-a-date', '', '2025-07-04T00:00:00Z')",
                [],
            )
            .unwrap();

        let err = store
            .read_entries(&EntryFilter::by_user(&"alice".into()))
            .unwrap_err();
        assert!(matches!(err, AppError::InvalidData { .. }));
    }
}
