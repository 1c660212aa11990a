//! Dataset download and extraction service.
//!
//! Downloads the archive and labels CSV (skipping files already on disk),
//! extracts the archive, transcodes the CSV to UTF-8, and normalizes
//! extracted names to NFC. Separated from UI concerns - emits events for
//! progress tracking.

use std::fs::File;
use std::io::Write;
use std::path::{Path, PathBuf};
use std::time::Duration;

use anyhow::{bail, Context, Result};
use futures::StreamExt;
use reqwest::Client;
use sha2::{Digest, Sha256};
use tracing::info;

use crate::archive;
use crate::config::Settings;
use crate::encoding;
use crate::normalize;

/// How many archive entry names to log before extraction.
const INSPECT_ENTRIES: usize = 5;

/// Events emitted while downloading a file.
#[derive(Debug, Clone)]
pub enum FetchEvent {
    /// Download started (total size if the server reported one)
    Started { url: String, total: Option<u64> },
    /// Bytes received so far
    Progress { bytes: u64 },
    /// File already on disk, download skipped
    SkippedExisting { path: PathBuf },
    /// Download finished and renamed into place
    Completed {
        path: PathBuf,
        bytes: u64,
        sha256: String,
    },
}

/// Summary of a full fetch run.
#[derive(Debug, Default)]
pub struct FetchSummary {
    pub archive_downloaded: bool,
    pub labels_downloaded: bool,
    pub entries_extracted: usize,
    pub names_renamed: usize,
    pub csv_encoding: &'static str,
}

/// Service for acquiring and unpacking the dataset.
pub struct FetchService {
    client: Client,
    settings: Settings,
}

impl FetchService {
    /// Create a new fetch service.
    pub fn new(settings: Settings) -> Result<Self> {
        let client = Client::builder()
            .user_agent(&settings.user_agent)
            .timeout(Duration::from_secs(settings.request_timeout))
            .gzip(true)
            .brotli(true)
            .build()
            .context("building HTTP client")?;
        Ok(Self { client, settings })
    }

    /// Download `url` to `dest` unless it already exists.
    ///
    /// Returns whether a download actually happened.
    pub async fn download(
        &self,
        url: &str,
        dest: &Path,
        mut on_event: impl FnMut(FetchEvent),
    ) -> Result<bool> {
        if dest.exists() {
            on_event(FetchEvent::SkippedExisting {
                path: dest.to_path_buf(),
            });
            return Ok(false);
        }
        if let Some(parent) = dest.parent() {
            std::fs::create_dir_all(parent)
                .with_context(|| format!("creating {}", parent.display()))?;
        }

        let response = self
            .client
            .get(url)
            .send()
            .await
            .with_context(|| format!("requesting {url}"))?;
        if !response.status().is_success() {
            bail!("HTTP {} fetching {}", response.status(), url);
        }

        on_event(FetchEvent::Started {
            url: url.to_string(),
            total: response.content_length(),
        });

        // Stream to a partial file, then rename into place so an aborted
        // download is never mistaken for a finished one.
        let partial = partial_path(dest);
        let mut out =
            File::create(&partial).with_context(|| format!("creating {}", partial.display()))?;
        let mut hasher = Sha256::new();
        let mut received: u64 = 0;

        let mut stream = response.bytes_stream();
        while let Some(chunk) = stream.next().await {
            let chunk = chunk.with_context(|| format!("reading body of {url}"))?;
            out.write_all(&chunk)
                .with_context(|| format!("writing {}", partial.display()))?;
            hasher.update(&chunk);
            received += chunk.len() as u64;
            on_event(FetchEvent::Progress { bytes: received });
        }
        drop(out);
        std::fs::rename(&partial, dest)
            .with_context(|| format!("renaming {} into place", partial.display()))?;

        let sha256 = hex::encode(hasher.finalize());
        info!(url, sha256 = %sha256, bytes = received, "downloaded");
        on_event(FetchEvent::Completed {
            path: dest.to_path_buf(),
            bytes: received,
            sha256,
        });
        Ok(true)
    }

    /// Run the full fetch pipeline: download both inputs, inspect and
    /// extract the archive, transcode the CSV, NFC-normalize the tree.
    pub async fn run(&self, mut on_event: impl FnMut(FetchEvent)) -> Result<FetchSummary> {
        let settings = &self.settings;
        settings.ensure_directories()?;
        let mut summary = FetchSummary::default();

        let archive_path = settings.archive_path();
        let csv_path = settings.labels_csv_path();
        summary.archive_downloaded = self
            .download(&settings.archive_url, &archive_path, &mut on_event)
            .await?;
        summary.labels_downloaded = self
            .download(&settings.labels_url, &csv_path, &mut on_event)
            .await?;

        for name in archive::inspect_entries(&archive_path, INSPECT_ENTRIES)? {
            info!(entry = %name, "archive entry");
        }

        let extract_dir = settings.extract_dir();
        summary.entries_extracted = archive::extract(&archive_path, &extract_dir)
            .with_context(|| format!("extracting {}", archive_path.display()))?;

        summary.csv_encoding = encoding::ensure_utf8(&csv_path)
            .with_context(|| format!("normalizing encoding of {}", csv_path.display()))?
            .name();

        summary.names_renamed = normalize::normalize_tree(&extract_dir)?;

        Ok(summary)
    }
}

/// Sibling path the download streams into before the final rename.
fn partial_path(dest: &Path) -> PathBuf {
    let name = dest
        .file_name()
        .and_then(|n| n.to_str())
        .unwrap_or("download");
    dest.with_file_name(format!("{name}.part"))
}
