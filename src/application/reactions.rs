//! Reaction aggregation.

use std::collections::BTreeMap;
use std::sync::Arc;

use crate::domain::{Datastore, EntryDate, JournalEntry, Reaction, Result, Username};

use super::scatter::scatter_gather;

/// Fetches reactions for every entry concurrently.
///
/// Each date maps to its reactions sorted ascending by timestamp. Dates
/// without reactions are left out. Storage reports "no reactions" as an
/// empty list, so every error here is fatal.
///
/// # Errors
/// Returns the first storage error reported by a reaction lookup.
pub async fn aggregate_reactions(
    store: &Arc<dyn Datastore>,
    username: &Username,
    entries: &[JournalEntry],
) -> Result<BTreeMap<EntryDate, Vec<Reaction>>> {
    let dates: Vec<EntryDate> = entries.iter().map(|e| e.date).collect();

    let store = Arc::clone(store);
    let user = username.clone();
    let per_date = scatter_gather(dates, move |date| {
        let mut reactions = store.get_reactions(&user, date)?;
        if reactions.is_empty() {
            return Ok(None);
        }
        reactions.sort_by_key(|r| r.timestamp);
        Ok(Some((date, reactions)))
    })
    .await?;

    Ok(per_date.into_iter().collect())
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::application::testing::{date, entry, reaction, FailingDatastore};

    fn alice_entries(dates: &[&str]) -> Vec<JournalEntry> {
        dates
            .iter()
            .map(|d| entry("alice", d, &format!("{d}T18:00:00Z"), "done"))
            .collect()
    }

    #[tokio::test]
    async fn test_sorted_by_timestamp_and_empty_dates_absent() {
        let store = FailingDatastore::default();
        let alice = Username::from("alice");
        let first = date("2025-06-27");
        for (who, ts) in [
            ("carol", "2025-06-29T08:00:00Z"),
            ("bob", "2025-06-28T08:00:00Z"),
            ("dave", "2025-06-30T08:00:00Z"),
        ] {
            store
                .inner
                .put_reaction(&alice, first, reaction(who, "👍", ts))
                .unwrap();
        }

        let entries = alice_entries(&["2025-07-04", "2025-06-27"]);
        let reactions = aggregate_reactions(&store.shared(), &alice, &entries)
            .await
            .unwrap();

        assert_eq!(reactions.len(), 1);
        assert!(!reactions.contains_key(&date("2025-07-04")));
        let names: Vec<&str> = reactions[&first].iter().map(|r| r.username.as_str()).collect();
        assert_eq!(names, vec!["bob", "carol", "dave"]);
    }

    #[tokio::test]
    async fn test_no_entries_no_lookups() {
        let store = FailingDatastore::default().shared();
        let reactions = aggregate_reactions(&store, &"alice".into(), &[])
            .await
            .unwrap();
        assert!(reactions.is_empty());
    }

    #[tokio::test]
    async fn test_failure_on_one_entry_aborts() {
        let mut store = FailingDatastore::default();
        store.reaction_failures.insert(date("2025-06-27"));

        let entries = alice_entries(&["2025-07-04", "2025-06-27", "2025-06-20"]);
        let err = aggregate_reactions(&store.shared(), &"alice".into(), &entries)
            .await
            .unwrap_err();
        assert_eq!(err.to_string(), "Storage error: injected reactions failure");
    }
}
