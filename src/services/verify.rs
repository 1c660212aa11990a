//! Cross-check of the labels CSV against the extracted image tree.

use anyhow::{bail, Context, Result};
use tracing::info;

use crate::config::Settings;
use crate::normalize;

use super::{is_header, label_reader};

/// Result of a verify run.
#[derive(Debug, Default)]
pub struct VerifySummary {
    pub checked: usize,
    pub missing: Vec<String>,
}

/// Check that every CSV row resolves to a file under the extract directory.
///
/// Paths are NFC-normalized before the lookup, mirroring what the convert
/// step writes out.
pub fn verify_files(settings: &Settings) -> Result<VerifySummary> {
    let csv_path = settings.labels_csv_path();
    if !csv_path.exists() {
        bail!(
            "labels CSV not found: {} (run `ocrprep fetch` first)",
            csv_path.display()
        );
    }
    let extract_dir = settings.extract_dir();

    let mut reader = label_reader(&csv_path)?;
    let mut summary = VerifySummary::default();

    for (row, result) in reader.records().enumerate() {
        let record =
            result.with_context(|| format!("reading {} row {}", csv_path.display(), row + 1))?;
        if row == 0 && is_header(&record) {
            continue;
        }
        let Some(field) = record.get(0) else { continue };
        let name = normalize::nfc(field.trim());
        if name.is_empty() {
            continue;
        }
        summary.checked += 1;
        if !extract_dir.join(&name).exists() {
            summary.missing.push(name);
        }
    }

    info!(
        checked = summary.checked,
        missing = summary.missing.len(),
        "verified labels CSV against disk"
    );
    Ok(summary)
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::fs;
    use std::path::Path;
    use tempfile::tempdir;

    fn test_settings(dir: &Path) -> Settings {
        let mut settings = Settings::default();
        settings.data_dir = dir.to_path_buf();
        settings.archive_url = "https://example.com/sample.tar.gz".to_string();
        settings.labels_url = "https://example.com/labels.csv".to_string();
        settings
    }

    #[test]
    fn test_verify_reports_missing_files() {
        let dir = tempdir().unwrap();
        let settings = test_settings(dir.path());
        let extract_dir = settings.extract_dir();
        fs::create_dir_all(&extract_dir).unwrap();
        fs::write(extract_dir.join("a.jpg"), b"img").unwrap();
        fs::write(
            settings.labels_csv_path(),
            "path,label\na.jpg,aa\ngone.jpg,zz\n",
        )
        .unwrap();

        let summary = verify_files(&settings).unwrap();
        assert_eq!(summary.checked, 2);
        assert_eq!(summary.missing, vec!["gone.jpg".to_string()]);
    }

    #[test]
    fn test_verify_matches_nfd_csv_against_nfc_disk() {
        let dir = tempdir().unwrap();
        let settings = test_settings(dir.path());
        let extract_dir = settings.extract_dir();
        fs::create_dir_all(&extract_dir).unwrap();
        // Disk name is composed, CSV references the decomposed spelling
        fs::write(extract_dir.join("s\u{e9}ance.jpg"), b"img").unwrap();
        fs::write(
            settings.labels_csv_path(),
            "path,label\nse\u{301}ance.jpg,aa\n",
        )
        .unwrap();

        let summary = verify_files(&settings).unwrap();
        assert_eq!(summary.checked, 1);
        assert!(summary.missing.is_empty());
    }

    #[test]
    fn test_verify_requires_csv() {
        let dir = tempdir().unwrap();
        let settings = test_settings(dir.path());
        assert!(verify_files(&settings).is_err());
    }
}
