//! Configuration for ocrprep.
//!
//! Settings come from built-in defaults, an optional `ocrprep.toml` in the
//! working directory, and finally CLI flags. All dataset paths derive from
//! the data directory so the training framework configuration can point at a
//! single root.

use std::fs;
use std::path::{Path, PathBuf};

use anyhow::{Context, Result};
use serde::Deserialize;
use url::Url;

/// Default archive for the PL-20k hand-labelled dataset.
pub const DEFAULT_ARCHIVE_URL: &str =
    "https://github.com/perechen/htr_lexicography/raw/main/data/PL-20k-hand-labelled.tar.gz";

/// Companion labels CSV for the default archive.
pub const DEFAULT_LABELS_URL: &str =
    "https://raw.githubusercontent.com/perechen/htr_lexicography/main/data/PL-20k-hand-labelled_labels.csv";

/// Config file read from the working directory when present.
const CONFIG_FILENAME: &str = "ocrprep.toml";

/// Runtime settings.
#[derive(Debug, Clone)]
pub struct Settings {
    /// Base data directory.
    pub data_dir: PathBuf,
    /// URL of the dataset archive (tar.gz or zip).
    pub archive_url: String,
    /// URL of the labels CSV.
    pub labels_url: String,
    /// User agent for HTTP requests.
    pub user_agent: String,
    /// Request timeout in seconds.
    pub request_timeout: u64,
    /// Every N-th record goes to the eval split (0 = train only).
    pub eval_every: usize,
}

impl Default for Settings {
    fn default() -> Self {
        Self {
            data_dir: PathBuf::from("data"),
            archive_url: DEFAULT_ARCHIVE_URL.to_string(),
            labels_url: DEFAULT_LABELS_URL.to_string(),
            user_agent: "ocrprep/0.3 (dataset preparation)".to_string(),
            request_timeout: 60,
            eval_every: 10,
        }
    }
}

/// Shape of `ocrprep.toml`. Every field is optional and overlays the defaults.
#[derive(Debug, Default, Deserialize)]
#[serde(deny_unknown_fields)]
struct ConfigFile {
    data_dir: Option<PathBuf>,
    archive_url: Option<String>,
    labels_url: Option<String>,
    user_agent: Option<String>,
    request_timeout: Option<u64>,
    eval_every: Option<usize>,
}

impl Settings {
    /// Load settings, overlaying `ocrprep.toml` when it exists.
    pub fn load() -> Result<Self> {
        let mut settings = Self::default();
        let config_path = Path::new(CONFIG_FILENAME);
        if config_path.exists() {
            let raw = fs::read_to_string(config_path)
                .with_context(|| format!("reading {}", config_path.display()))?;
            let file: ConfigFile = toml::from_str(&raw)
                .with_context(|| format!("parsing {}", config_path.display()))?;
            settings.apply(file);
        }
        Ok(settings)
    }

    fn apply(&mut self, file: ConfigFile) {
        if let Some(v) = file.data_dir {
            self.data_dir = v;
        }
        if let Some(v) = file.archive_url {
            self.archive_url = v;
        }
        if let Some(v) = file.labels_url {
            self.labels_url = v;
        }
        if let Some(v) = file.user_agent {
            self.user_agent = v;
        }
        if let Some(v) = file.request_timeout {
            self.request_timeout = v;
        }
        if let Some(v) = file.eval_every {
            self.eval_every = v;
        }
    }

    /// Replace the data directory (CLI override).
    pub fn set_data_dir(&mut self, data_dir: PathBuf) {
        self.data_dir = data_dir;
    }

    /// Local path the archive downloads to.
    pub fn archive_path(&self) -> PathBuf {
        self.data_dir
            .join(filename_from_url(&self.archive_url, "dataset.tar.gz"))
    }

    /// Local path the labels CSV downloads to.
    pub fn labels_csv_path(&self) -> PathBuf {
        self.data_dir
            .join(filename_from_url(&self.labels_url, "labels.csv"))
    }

    /// Directory the archive is extracted into (archive name minus extension).
    pub fn extract_dir(&self) -> PathBuf {
        let name = filename_from_url(&self.archive_url, "dataset.tar.gz");
        let stem = name
            .strip_suffix(".tar.gz")
            .or_else(|| name.strip_suffix(".tgz"))
            .or_else(|| name.strip_suffix(".zip"))
            .unwrap_or(name.as_str());
        self.data_dir.join(stem)
    }

    /// Label file for the training split.
    pub fn train_labels_path(&self) -> PathBuf {
        self.data_dir.join("train_labels.txt")
    }

    /// Label file for the eval split.
    pub fn eval_labels_path(&self) -> PathBuf {
        self.data_dir.join("eval_labels.txt")
    }

    /// Character dictionary file.
    pub fn dict_path(&self) -> PathBuf {
        self.data_dir.join("dict.txt")
    }

    /// Create the data directory if needed.
    pub fn ensure_directories(&self) -> Result<()> {
        fs::create_dir_all(&self.data_dir)
            .with_context(|| format!("creating {}", self.data_dir.display()))?;
        Ok(())
    }
}

/// Last path segment of a URL, or `fallback` when the URL has none.
fn filename_from_url(url: &str, fallback: &str) -> String {
    Url::parse(url)
        .ok()
        .and_then(|u| {
            u.path_segments().and_then(|segments| {
                segments
                    .last()
                    .filter(|s| !s.is_empty())
                    .map(|s| s.to_string())
            })
        })
        .unwrap_or_else(|| fallback.to_string())
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_default_paths() {
        let settings = Settings::default();
        assert_eq!(
            settings.archive_path(),
            PathBuf::from("data/PL-20k-hand-labelled.tar.gz")
        );
        assert_eq!(
            settings.labels_csv_path(),
            PathBuf::from("data/PL-20k-hand-labelled_labels.csv")
        );
        assert_eq!(
            settings.extract_dir(),
            PathBuf::from("data/PL-20k-hand-labelled")
        );
        assert_eq!(settings.dict_path(), PathBuf::from("data/dict.txt"));
    }

    #[test]
    fn test_extract_dir_strips_known_extensions() {
        let mut settings = Settings::default();
        settings.archive_url = "https://example.com/corpus.zip".to_string();
        assert_eq!(settings.extract_dir(), PathBuf::from("data/corpus"));

        settings.archive_url = "https://example.com/corpus.tgz".to_string();
        assert_eq!(settings.extract_dir(), PathBuf::from("data/corpus"));
    }

    #[test]
    fn test_filename_from_url_fallback() {
        assert_eq!(filename_from_url("not a url", "fallback.bin"), "fallback.bin");
        assert_eq!(filename_from_url("https://example.com/", "fallback.bin"), "fallback.bin");
        assert_eq!(
            filename_from_url("https://example.com/a/b/data.tar.gz?raw=true", "x"),
            "data.tar.gz"
        );
    }

    #[test]
    fn test_config_file_overlay() {
        let mut settings = Settings::default();
        let file: ConfigFile = toml::from_str(
            r#"
            data_dir = "elsewhere"
            eval_every = 5
            "#,
        )
        .unwrap();
        settings.apply(file);
        assert_eq!(settings.data_dir, PathBuf::from("elsewhere"));
        assert_eq!(settings.eval_every, 5);
        // Untouched fields keep their defaults
        assert_eq!(settings.archive_url, DEFAULT_ARCHIVE_URL);
    }
}
