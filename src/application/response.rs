//! Response framing for the two export outputs.
//!
//! This is where errors become a status code and a message. Failures are
//! logged here with the username and export phase; the body only ever
//! carries a generic message.

use std::sync::Arc;

use chrono::NaiveDate;

use crate::domain::{Datastore, EntryFilter, Username, DATE_FORMAT};

use super::exporter::ExportService;
use super::packager::package_entries_as_markdown;

pub const STATUS_OK: u16 = 200;
pub const STATUS_INTERNAL_SERVER_ERROR: u16 = 500;

const EXPORT_FAILED: &str = "Failed to export user data";

/// A fully-buffered response ready to hand back to the HTTP layer.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ExportResponse {
    pub status: u16,
    pub content_type: &'static str,
    pub content_disposition: Option<String>,
    pub body: Vec<u8>,
}

impl ExportResponse {
    #[must_use]
    pub const fn is_success(&self) -> bool {
        self.status == STATUS_OK
    }

    fn internal_error(message: &str) -> Self {
        Self {
            status: STATUS_INTERNAL_SERVER_ERROR,
            content_type: "text/plain; charset=utf-8",
            content_disposition: None,
            body: message.as_bytes().to_vec(),
        }
    }
}

/// Download filename for a user's Markdown archive.
#[must_use]
pub fn archive_filename(username: &Username, today: NaiveDate) -> String {
    format!("whatgotdone-{username}-{}.zip", today.format(DATE_FORMAT))
}

/// Structured export: the JSON bundle, or a 500 with a plain-text message.
pub async fn json_export_response(
    service: &ExportService,
    username: &Username,
    today: NaiveDate,
) -> ExportResponse {
    let bundle = match service.export_user_data(username, today).await {
        Ok(bundle) => bundle,
        Err(e) => {
            let phase = e.phase().map(|p| p.to_string()).unwrap_or_default();
            tracing::error!(username = %username, phase = %phase, "Failed to export user data: {}", e);
            return ExportResponse::internal_error(EXPORT_FAILED);
        }
    };

    match serde_json::to_vec(&bundle) {
        Ok(body) => ExportResponse {
            status: STATUS_OK,
            content_type: "application/json",
            content_disposition: None,
            body,
        },
        Err(e) => {
            tracing::error!(username = %username, "Failed to serialize export: {}", e);
            ExportResponse::internal_error(EXPORT_FAILED)
        }
    }
}

/// Archive export: published entries as a zip of Markdown documents.
pub fn markdown_export_response(
    store: &Arc<dyn Datastore>,
    username: &Username,
    today: NaiveDate,
) -> ExportResponse {
    tracing::info!(username = %username, "exporting({username}): published entries");
    let entries = match store.read_entries(&EntryFilter::by_user(username)) {
        Ok(entries) => entries,
        Err(e) => {
            tracing::error!(username = %username, "Failed to retrieve user data: {}", e);
            return ExportResponse::internal_error(EXPORT_FAILED);
        }
    };

    let filename = archive_filename(username, today);
    ExportResponse {
        status: STATUS_OK,
        content_type: "application/zip",
        content_disposition: Some(format!("attachment; filename=\"{filename}\"")),
        body: package_entries_as_markdown(&entries),
    }
}
