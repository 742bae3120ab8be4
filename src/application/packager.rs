//! Markdown archive packaging.
//!
//! Turns published entries into a zip of per-week Markdown documents:
//!
//! ```text
//! 2025-07-04/index.md
//! 2025-06-27/index.md
//! 2025-06-20/index.md
//! ```
//!
//! Each document starts with a front-matter block carrying the entry date,
//! plus `lastmod` when the entry was last edited on a different day.

use std::io::{Cursor, Seek, Write};

use chrono::{DateTime, Datelike, Timelike, Utc};
use zip::write::SimpleFileOptions;
use zip::{CompressionMethod, ZipWriter};

use crate::domain::{AppError, JournalEntry, Result};

/// Destination for archive members.
pub trait ArchiveSink {
    /// Adds one document at `path`.
    ///
    /// # Errors
    /// Returns error if the member cannot be written.
    fn add_document(&mut self, path: &str, modified: DateTime<Utc>, contents: &[u8]) -> Result<()>;

    /// Finalizes the archive and returns its bytes.
    ///
    /// # Errors
    /// Returns error if the archive cannot be finalized.
    fn finish(self) -> Result<Vec<u8>>;
}

/// Seekable destination a [`ZipSink`] writes into.
pub trait ArchiveBuffer: Write + Seek {
    /// The finished archive bytes.
    fn into_bytes(self) -> Vec<u8>;
}

impl ArchiveBuffer for Cursor<Vec<u8>> {
    fn into_bytes(self) -> Vec<u8> {
        self.into_inner()
    }
}

/// Zip archive, in memory by default.
pub struct ZipSink<W: Write + Seek = Cursor<Vec<u8>>> {
    writer: ZipWriter<W>,
}

impl ZipSink {
    #[must_use]
    pub fn new() -> Self {
        Self::with_buffer(Cursor::new(Vec::new()))
    }
}

impl<W: ArchiveBuffer> ZipSink<W> {
    #[must_use]
    pub fn with_buffer(buffer: W) -> Self {
        Self {
            writer: ZipWriter::new(buffer),
        }
    }
}

impl Default for ZipSink {
    fn default() -> Self {
        Self::new()
    }
}

/// Zip timestamps cover 1980 through 2107; anything else keeps the default.
fn zip_timestamp(ts: DateTime<Utc>) -> Option<zip::DateTime> {
    zip::DateTime::from_date_and_time(
        u16::try_from(ts.year()).ok()?,
        u8::try_from(ts.month()).ok()?,
        u8::try_from(ts.day()).ok()?,
        u8::try_from(ts.hour()).ok()?,
        u8::try_from(ts.minute()).ok()?,
        u8::try_from(ts.second()).ok()?,
    )
    .ok()
}

impl<W: ArchiveBuffer> ArchiveSink for ZipSink<W> {
    fn add_document(&mut self, path: &str, modified: DateTime<Utc>, contents: &[u8]) -> Result<()> {
        let mut options = SimpleFileOptions::default().compression_method(CompressionMethod::Deflated);
        if let Some(ts) = zip_timestamp(modified) {
            options = options.last_modified_time(ts);
        }

        self.writer
            .start_file(path, options)
            .map_err(|e| AppError::archive(format!("Failed to create {path} in archive"), e))?;

        if let Err(e) = self.writer.write_all(contents) {
            // Drop the half-written member so the archive stays consistent.
            if let Err(abort) = self.writer.abort_file() {
                tracing::warn!(path, "Failed to discard partial archive member: {}", abort);
            }
            return Err(AppError::io(format!("Failed to write {path} to archive"), e));
        }

        Ok(())
    }

    fn finish(self) -> Result<Vec<u8>> {
        self.writer
            .finish()
            .map(ArchiveBuffer::into_bytes)
            .map_err(|e| AppError::archive("Failed to finalize archive", e))
    }
}

/// Path of an entry's document inside the archive.
#[must_use]
pub fn archive_path(entry: &JournalEntry) -> String {
    format!("{}/index.md", entry.date)
}

/// Renders an entry as a Markdown document with front matter.
#[must_use]
pub fn entry_to_markdown(entry: &JournalEntry) -> String {
    let date = entry.date.to_string();
    let last_mod = entry.last_modified_date().to_string();
    let last_mod_line = if last_mod == date {
        String::new()
    } else {
        format!("lastmod: {last_mod}\n")
    };
    format!("---\ndate: {date}\n{last_mod_line}---\n{}", entry.markdown)
}

/// Packages `entries` into a zip archive of Markdown documents.
///
/// Never fails: an entry that cannot be written is logged and left out, and
/// an archive that cannot be finalized yields an empty byte stream.
#[must_use]
pub fn package_entries_as_markdown(entries: &[JournalEntry]) -> Vec<u8> {
    package_into(entries, ZipSink::new())
}

/// Packages `entries` through an arbitrary sink.
pub fn package_into<S: ArchiveSink>(entries: &[JournalEntry], mut sink: S) -> Vec<u8> {
    let mut packaged = 0_usize;
    for entry in entries {
        let path = archive_path(entry);
        let markdown = entry_to_markdown(entry);
        match sink.add_document(&path, entry.last_modified, markdown.as_bytes()) {
            Ok(()) => packaged += 1,
            Err(e) => tracing::warn!(path = %path, "Skipping entry: {}", e),
        }
    }

    match sink.finish() {
        Ok(bytes) => {
            tracing::debug!(packaged, skipped = entries.len() - packaged, "Packaged entries");
            bytes
        }
        Err(e) => {
            tracing::error!("Failed to close archive: {}", e);
            Vec::new()
        }
    }
}
