//! Legacy-encoding recovery for the labels CSV.
//!
//! Label exports for this corpus occasionally arrive as Windows-1250 or
//! ISO-8859-2 instead of UTF-8. Everything downstream assumes UTF-8, so the
//! CSV is transcoded in place before any parsing happens.

use std::fs;
use std::path::{Path, PathBuf};

use encoding_rs::{ISO_8859_2, WINDOWS_1250};
use thiserror::Error;

/// Errors that can occur while normalizing the CSV encoding.
#[derive(Debug, Error)]
pub enum TranscodeError {
    #[error("Unable to decode {0} as UTF-8, Windows-1250, or ISO-8859-2")]
    UndecodableInput(PathBuf),

    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),
}

/// The encoding a file's bytes were found to be in.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum DetectedEncoding {
    /// Already valid UTF-8, file untouched.
    Utf8,
    /// Decoded with the named legacy encoding and rewritten as UTF-8.
    Legacy(&'static str),
}

impl DetectedEncoding {
    pub fn name(&self) -> &'static str {
        match self {
            DetectedEncoding::Utf8 => "UTF-8",
            DetectedEncoding::Legacy(name) => name,
        }
    }
}

/// Ensure `path` contains valid UTF-8, rewriting it in place when a legacy
/// encoding decodes cleanly. Returns the encoding the bytes were read as.
pub fn ensure_utf8(path: &Path) -> Result<DetectedEncoding, TranscodeError> {
    let bytes = fs::read(path)?;
    if std::str::from_utf8(&bytes).is_ok() {
        return Ok(DetectedEncoding::Utf8);
    }

    // Windows-1250 has unmapped bytes and can genuinely fail; ISO-8859-2
    // maps every byte, so it is the last resort.
    for encoding in [WINDOWS_1250, ISO_8859_2] {
        if let Some(text) = encoding.decode_without_bom_handling_and_without_replacement(&bytes) {
            fs::write(path, text.as_bytes())?;
            return Ok(DetectedEncoding::Legacy(encoding.name()));
        }
    }

    Err(TranscodeError::UndecodableInput(path.to_path_buf()))
}
