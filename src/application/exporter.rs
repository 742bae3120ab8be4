//! Export assembly.
//!
//! Gathers everything one user owns into a single [`ExportBundle`]:
//! drafts, published entries, reactions, preferences, profile and the
//! follow list, in that order.

use std::sync::Arc;

use chrono::NaiveDate;

use crate::domain::{
    AppError, Datastore, EntryFilter, ExportBundle, ExportPhase, ExportedEntry, ExportedPreferences,
    ExportedProfile, ExportedReaction, JournalEntry, Result, Username, WeekCalendar,
};

use super::drafts::discover_drafts;
use super::reactions::aggregate_reactions;

/// Builds full per-user exports from a datastore.
#[derive(Clone)]
pub struct ExportService {
    store: Arc<dyn Datastore>,
    calendar: WeekCalendar,
}

impl ExportService {
    #[must_use]
    pub fn new(store: Arc<dyn Datastore>, calendar: WeekCalendar) -> Self {
        Self { store, calendar }
    }

    #[must_use]
    pub fn store(&self) -> &Arc<dyn Datastore> {
        &self.store
    }

    /// Exports all of `username`'s data as of `today`.
    ///
    /// A missing profile or missing preferences export as empty values.
    /// Any other failure aborts the export.
    ///
    /// # Errors
    /// Returns the first hard error, tagged with the phase it occurred in.
    pub async fn export_user_data(&self, username: &Username, today: NaiveDate) -> Result<ExportBundle> {
        tracing::info!(username = %username, "Starting export");

        log_phase(username, ExportPhase::Drafts);
        let through = self.calendar.week_ending_for(today);
        let drafts = discover_drafts(&self.store, &self.calendar, username, through)
            .await
            .map_err(|e| e.during(ExportPhase::Drafts))?;

        log_phase(username, ExportPhase::Entries);
        let filter = EntryFilter::by_user(username);
        let entries = self
            .blocking(move |store| store.read_entries(&filter))
            .await
            .map_err(|e| e.during(ExportPhase::Entries))?;

        log_phase(username, ExportPhase::Reactions);
        let reactions = aggregate_reactions(&self.store, username, &entries)
            .await
            .map_err(|e| e.during(ExportPhase::Reactions))?;

        log_phase(username, ExportPhase::Preferences);
        let user = username.clone();
        let preferences = self
            .blocking(move |store| store.get_preferences(&user).or_default())
            .await
            .map_err(|e| e.during(ExportPhase::Preferences))?;

        log_phase(username, ExportPhase::Profile);
        let user = username.clone();
        let profile = self
            .blocking(move |store| store.get_user_profile(&user).or_default())
            .await
            .map_err(|e| e.during(ExportPhase::Profile))?;

        log_phase(username, ExportPhase::Following);
        let user = username.clone();
        let following = self
            .blocking(move |store| store.following(&user))
            .await
            .map_err(|e| e.during(ExportPhase::Following))?;

        tracing::info!(
            username = %username,
            entries = entries.len(),
            drafts = drafts.len(),
            reacted_entries = reactions.len(),
            "Finished export"
        );

        Ok(ExportBundle {
            entries: to_exported(&entries),
            drafts: to_exported(&drafts),
            reactions: reactions
                .iter()
                .map(|(date, list)| (*date, list.iter().map(ExportedReaction::from).collect()))
                .collect(),
            following,
            profile: ExportedProfile::from(&profile),
            preferences: ExportedPreferences::from(&preferences),
        })
    }
}

impl ExportService {
    /// Runs one store call on the blocking pool.
    async fn blocking<T, F>(&self, call: F) -> Result<T>
    where
        F: FnOnce(&dyn Datastore) -> Result<T> + Send + 'static,
        T: Send + 'static,
    {
        let store = Arc::clone(&self.store);
        tokio::task::spawn_blocking(move || call(store.as_ref()))
            .await
            .map_err(|e| AppError::Worker {
                message: format!("storage call ended abnormally: {e}"),
            })?
    }
}

fn log_phase(username: &Username, phase: ExportPhase) {
    tracing::info!(username = %username, phase = %phase, "exporting({username}): {phase}");
}

fn to_exported(entries: &[JournalEntry]) -> Vec<ExportedEntry> {
    entries.iter().map(ExportedEntry::from).collect()
}
