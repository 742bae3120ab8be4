//! Draft discovery.
//!
//! Storage has no "list drafts" query, so every week-ending day since launch
//! is checked for a draft and the hits are collected.

use std::sync::Arc;

use crate::domain::{Datastore, EntryDate, JournalEntry, Lookup, Result, Username, WeekCalendar};

use super::scatter::scatter_gather;

/// Finds all drafts `username` has saved up to and including `through`.
///
/// Drafts come back sorted ascending by date. A missing draft is skipped;
/// any other lookup failure aborts the whole discovery.
///
/// # Errors
/// Returns the first storage error reported by a draft lookup.
pub async fn discover_drafts(
    store: &Arc<dyn Datastore>,
    calendar: &WeekCalendar,
    username: &Username,
    through: EntryDate,
) -> Result<Vec<JournalEntry>> {
    let candidates: Vec<EntryDate> = calendar.candidate_dates(through).collect();
    tracing::debug!(
        username = %username,
        candidates = candidates.len(),
        "Probing candidate draft dates"
    );

    let store = Arc::clone(store);
    let user = username.clone();
    let mut drafts = scatter_gather(candidates, move |date| match store.get_draft(&user, date) {
        Lookup::Found(draft) => Ok(Some(draft)),
        Lookup::NotFound => Ok(None),
        Lookup::Failed(err) => {
            tracing::debug!(date = %date, "Draft lookup failed: {}", err);
            Err(err)
        }
    })
    .await?;

    drafts.sort_by_key(|d| d.date);
    Ok(drafts)
}
