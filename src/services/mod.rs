//! Preparation services: fetch, convert, verify.

mod convert;
mod fetch;
mod verify;

pub use convert::{ConvertService, ConvertSummary};
pub use fetch::{FetchEvent, FetchService, FetchSummary};
pub use verify::{VerifySummary, verify_files};

use std::path::Path;

use anyhow::{Context, Result};

/// Column names that mark the first CSV row as a header.
const HEADER_NAMES: &[&str] = &["path", "image", "file_name", "filename"];

/// Open the labels CSV for record-at-a-time reading.
///
/// Header handling is done by [`is_header`] on the first record; the
/// upstream CSV is not guaranteed to carry a header row at all.
pub(crate) fn label_reader(path: &Path) -> Result<csv::Reader<std::fs::File>> {
    csv::ReaderBuilder::new()
        .has_headers(false)
        .flexible(true)
        .from_path(path)
        .with_context(|| format!("opening {}", path.display()))
}

/// True when a first CSV record looks like the conventional header row.
pub(crate) fn is_header(record: &csv::StringRecord) -> bool {
    record
        .get(0)
        .map(|field| HEADER_NAMES.contains(&field.trim().to_ascii_lowercase().as_str()))
        .unwrap_or(false)
}
