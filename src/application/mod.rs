//! Application layer - the export aggregator.
//!
//! Draft discovery and reaction aggregation fan out over the datastore;
//! the exporter sequences them into a bundle and the packager renders
//! entries as a Markdown archive.

pub mod drafts;
pub mod exporter;
pub mod packager;
pub mod reactions;
pub mod response;
pub mod scatter;

#[cfg(test)]
pub(crate) mod testing;

pub use drafts::discover_drafts;
pub use exporter::ExportService;
pub use packager::{
    entry_to_markdown, package_entries_as_markdown, package_into, ArchiveBuffer, ArchiveSink, ZipSink,
};
pub use reactions::aggregate_reactions;
pub use response::{archive_filename, json_export_response, markdown_export_response, ExportResponse};
pub use scatter::scatter_gather;
