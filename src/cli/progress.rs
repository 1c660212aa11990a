//! Progress display for dataset downloads.

use std::path::Path;

use console::style;
use indicatif::{ProgressBar, ProgressStyle};

use crate::services::FetchEvent;

/// Renders fetch events as a download progress bar.
///
/// Downloads are sequential, so a single bar is recycled per file.
pub struct DownloadProgress {
    bar: Option<ProgressBar>,
}

impl DownloadProgress {
    pub fn new() -> Self {
        Self { bar: None }
    }

    pub fn handle(&mut self, event: FetchEvent) {
        match event {
            FetchEvent::Started { url, total } => {
                let bar = match total {
                    Some(len) => {
                        let bar = ProgressBar::new(len);
                        bar.set_style(
                            ProgressStyle::default_bar()
                                .template(
                                    "{spinner:.green} {msg} [{bar:30.cyan/blue}] {bytes}/{total_bytes}",
                                )
                                .unwrap()
                                .progress_chars("█▓░"),
                        );
                        bar
                    }
                    None => {
                        let bar = ProgressBar::new_spinner();
                        bar.set_style(
                            ProgressStyle::default_spinner()
                                .template("{spinner:.green} {msg} {bytes}")
                                .unwrap(),
                        );
                        bar
                    }
                };
                bar.set_message(short_name(&url));
                self.bar = Some(bar);
            }
            FetchEvent::Progress { bytes } => {
                if let Some(ref bar) = self.bar {
                    bar.set_position(bytes);
                }
            }
            FetchEvent::Completed { path, bytes, .. } => {
                if let Some(bar) = self.bar.take() {
                    bar.finish_and_clear();
                }
                println!(
                    "  {} {} ({} bytes)",
                    style("✓").green(),
                    display_name(&path),
                    bytes
                );
            }
            FetchEvent::SkippedExisting { path } => {
                println!(
                    "  {} {} already exists, skipping download",
                    style("!").yellow(),
                    path.display()
                );
            }
        }
    }
}

impl Default for DownloadProgress {
    fn default() -> Self {
        Self::new()
    }
}

fn short_name(url: &str) -> String {
    url.rsplit('/').next().unwrap_or(url).to_string()
}

fn display_name(path: &Path) -> String {
    path.file_name()
        .map(|n| n.to_string_lossy().into_owned())
        .unwrap_or_else(|| path.display().to_string())
}
