//! ocrprep - OCR training data preparation harness.
//!
//! Downloads a labelled image dataset (archive + CSV), normalizes extracted
//! file names and label text to Unicode NFC, and converts the CSV labels into
//! the tab-separated label files and character dictionary an external OCR
//! training framework consumes.

pub mod archive;
pub mod cli;
pub mod config;
pub mod encoding;
pub mod models;
pub mod normalize;
pub mod services;
