//! Label conversion service.
//!
//! Turns the labels CSV into the tab-separated label files and the character
//! dictionary the training framework reads. Input row order is preserved
//! within each output file; duplicates and empty labels pass through as is.

use std::fs::File;
use std::io::{BufWriter, Write};
use std::path::PathBuf;

use anyhow::{bail, Context, Result};
use tracing::warn;

use crate::config::Settings;
use crate::models::{CharDictionary, LabelRecord};

use super::{is_header, label_reader};

/// Summary of a convert run.
#[derive(Debug, Default)]
pub struct ConvertSummary {
    pub train_records: usize,
    pub eval_records: usize,
    pub skipped_missing: usize,
    pub dict_chars: usize,
}

/// Service converting the labels CSV into training artifacts.
pub struct ConvertService {
    settings: Settings,
    strict: bool,
}

impl ConvertService {
    /// Create a new convert service. With `strict`, a CSV row whose image is
    /// missing on disk is fatal instead of being skipped with a warning.
    pub fn new(settings: Settings, strict: bool) -> Self {
        Self { settings, strict }
    }

    /// Produce `train_labels.txt`, `eval_labels.txt` (when the split is
    /// enabled), and `dict.txt`.
    pub fn run(&self) -> Result<ConvertSummary> {
        let settings = &self.settings;
        let csv_path = settings.labels_csv_path();
        if !csv_path.exists() {
            bail!(
                "labels CSV not found: {} (run `ocrprep fetch` first)",
                csv_path.display()
            );
        }
        let extract_dir = settings.extract_dir();

        let mut reader = label_reader(&csv_path)?;
        let mut train = LabelWriter::create(settings.train_labels_path())?;
        let mut eval = if settings.eval_every > 0 {
            Some(LabelWriter::create(settings.eval_labels_path())?)
        } else {
            None
        };
        let mut dict = CharDictionary::new();
        let mut summary = ConvertSummary::default();
        let mut emitted = 0usize;

        for (row, result) in reader.records().enumerate() {
            let record = result
                .with_context(|| format!("reading {} row {}", csv_path.display(), row + 1))?;
            if row == 0 && is_header(&record) {
                continue;
            }
            if record.len() < 2 {
                bail!(
                    "{} row {}: expected 2 fields (path, label), found {}",
                    csv_path.display(),
                    row + 1,
                    record.len()
                );
            }

            let label = LabelRecord::new(&record[0], &record[1]);
            if !extract_dir.join(&label.path).exists() {
                if self.strict {
                    bail!(
                        "{} row {}: image not found on disk: {}",
                        csv_path.display(),
                        row + 1,
                        label.path
                    );
                }
                warn!(path = %label.path, "image missing on disk, skipping row");
                summary.skipped_missing += 1;
                continue;
            }

            dict.observe(&label.text);
            emitted += 1;
            match eval.as_mut() {
                Some(writer) if emitted % settings.eval_every == 0 => {
                    writer.write(&label)?;
                    summary.eval_records += 1;
                }
                _ => {
                    train.write(&label)?;
                    summary.train_records += 1;
                }
            }
        }

        train.finish()?;
        if let Some(writer) = eval {
            writer.finish()?;
        }

        let dict_path = settings.dict_path();
        std::fs::write(&dict_path, dict.to_contents())
            .with_context(|| format!("writing {}", dict_path.display()))?;
        summary.dict_chars = dict.len();

        Ok(summary)
    }
}

/// Buffered tab-separated label file writer.
struct LabelWriter {
    inner: BufWriter<File>,
    path: PathBuf,
}

impl LabelWriter {
    fn create(path: PathBuf) -> Result<Self> {
        let file = File::create(&path).with_context(|| format!("creating {}", path.display()))?;
        Ok(Self {
            inner: BufWriter::new(file),
            path,
        })
    }

    fn write(&mut self, record: &LabelRecord) -> Result<()> {
        writeln!(self.inner, "{}", record.to_line())
            .with_context(|| format!("writing {}", self.path.display()))
    }

    fn finish(mut self) -> Result<()> {
        self.inner
            .flush()
            .with_context(|| format!("flushing {}", self.path.display()))
    }
}
