//! Core logic for reportdrop
//!
//! Resolves the report date, locates the report email, extracts the CSV
//! attachment and overwrites the output file.

mod config;
mod date;
mod error;
mod extractor;
mod locator;
mod pipeline;
mod writer;

pub use config::ReportConfig;
pub use date::{date_label, resolve_report_date, yesterday, yesterday_label};
pub use error::{CoreError, CoreResult};
pub use extractor::{extract_attachment, Attachment, AttachmentMatcher};
pub use locator::{locate_report, search_query};
pub use pipeline::{ReportOutcome, ReportPipeline};
pub use writer::write_report;
