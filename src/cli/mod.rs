//! Command-line interface for ocrprep.

mod commands;
mod progress;

pub use commands::{is_verbose, run};
