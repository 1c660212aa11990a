//! CLI commands implementation.

use std::path::{Path, PathBuf};

use clap::{Parser, Subcommand};
use console::style;

use crate::config::Settings;
use crate::services::{ConvertService, FetchService, verify_files};

use super::progress::DownloadProgress;

#[derive(Parser)]
#[command(name = "ocrprep")]
#[command(about = "OCR training data preparation harness")]
#[command(version)]
pub struct Cli {
    /// Data directory
    #[arg(long, global = true, env = "OCRPREP_DATA_DIR")]
    data_dir: Option<PathBuf>,

    /// Enable verbose logging
    #[arg(short, long, global = true)]
    pub verbose: bool,

    #[command(subcommand)]
    command: Commands,
}

/// Check if verbose mode is enabled (for early logging setup).
pub fn is_verbose() -> bool {
    std::env::args().any(|arg| arg == "-v" || arg == "--verbose")
}

#[derive(Subcommand)]
enum Commands {
    /// Download the dataset archive and labels CSV, extract, and normalize names
    Fetch {
        /// Archive URL (overrides config)
        #[arg(long)]
        archive_url: Option<String>,
        /// Labels CSV URL (overrides config)
        #[arg(long)]
        labels_url: Option<String>,
    },

    /// Convert the labels CSV into label files and the character dictionary
    Convert {
        /// Send every N-th record to eval_labels.txt (0 = train only)
        #[arg(long)]
        eval_every: Option<usize>,
        /// Fail on CSV rows whose image is missing instead of skipping them
        #[arg(long)]
        strict: bool,
    },

    /// Check that every CSV row resolves to an extracted image
    Verify {
        /// Exit non-zero when any file is missing
        #[arg(long)]
        strict: bool,
    },

    /// Show dataset preparation status
    Status,
}

/// Run the CLI.
pub async fn run() -> anyhow::Result<()> {
    let cli = Cli::parse();

    let mut settings = Settings::load()?;
    if let Some(data_dir) = cli.data_dir {
        settings.set_data_dir(data_dir);
    }

    match cli.command {
        Commands::Fetch {
            archive_url,
            labels_url,
        } => {
            if let Some(url) = archive_url {
                settings.archive_url = url;
            }
            if let Some(url) = labels_url {
                settings.labels_url = url;
            }
            cmd_fetch(settings).await
        }
        Commands::Convert { eval_every, strict } => {
            if let Some(n) = eval_every {
                settings.eval_every = n;
            }
            cmd_convert(settings, strict)
        }
        Commands::Verify { strict } => cmd_verify(&settings, strict),
        Commands::Status => cmd_status(&settings),
    }
}

async fn cmd_fetch(settings: Settings) -> anyhow::Result<()> {
    let extract_dir = settings.extract_dir();
    let service = FetchService::new(settings)?;

    let mut progress = DownloadProgress::new();
    let summary = service.run(|event| progress.handle(event)).await?;

    println!(
        "{} Extracted {} entries to {}",
        style("✓").green(),
        summary.entries_extracted,
        extract_dir.display()
    );
    if summary.names_renamed > 0 {
        println!(
            "{} Renamed {} entries to NFC form",
            style("✓").green(),
            summary.names_renamed
        );
    }
    println!(
        "{} Labels CSV decoded as {}",
        style("✓").green(),
        summary.csv_encoding
    );
    Ok(())
}

fn cmd_convert(settings: Settings, strict: bool) -> anyhow::Result<()> {
    let train_path = settings.train_labels_path();
    let dict_path = settings.dict_path();

    let summary = ConvertService::new(settings, strict).run()?;

    println!(
        "{} Wrote {} train / {} eval records to {}",
        style("✓").green(),
        summary.train_records,
        summary.eval_records,
        train_path.display()
    );
    if summary.skipped_missing > 0 {
        println!(
            "{} Skipped {} rows referencing missing images",
            style("!").yellow(),
            summary.skipped_missing
        );
    }
    println!(
        "{} Dictionary has {} characters ({})",
        style("✓").green(),
        summary.dict_chars,
        dict_path.display()
    );
    Ok(())
}

fn cmd_verify(settings: &Settings, strict: bool) -> anyhow::Result<()> {
    let summary = verify_files(settings)?;

    if summary.missing.is_empty() {
        println!(
            "{} All {} CSV rows match files on disk",
            style("✓").green(),
            summary.checked
        );
        return Ok(());
    }

    println!(
        "{} {} of {} CSV rows reference missing files:",
        style("!").yellow(),
        summary.missing.len(),
        summary.checked
    );
    for name in summary.missing.iter().take(10) {
        println!("  {} {}", style("→").dim(), name);
    }
    if summary.missing.len() > 10 {
        println!("  … and {} more", summary.missing.len() - 10);
    }
    if strict {
        anyhow::bail!("{} missing files", summary.missing.len());
    }
    Ok(())
}

fn cmd_status(settings: &Settings) -> anyhow::Result<()> {
    println!("\n{}", style("Dataset preparation status").bold());
    println!("{}", "-".repeat(60));
    file_status("archive", &settings.archive_path());
    file_status("labels CSV", &settings.labels_csv_path());
    dir_status("extracted images", &settings.extract_dir());
    lines_status("train labels", &settings.train_labels_path());
    lines_status("eval labels", &settings.eval_labels_path());
    lines_status("dictionary", &settings.dict_path());
    Ok(())
}

fn file_status(name: &str, path: &Path) {
    match std::fs::metadata(path) {
        Ok(meta) => println!(
            "  {} {:<18} {} ({} bytes)",
            style("✓").green(),
            name,
            path.display(),
            meta.len()
        ),
        Err(_) => println!(
            "  {} {:<18} {} (missing)",
            style("✗").red(),
            name,
            path.display()
        ),
    }
}

fn dir_status(name: &str, path: &Path) {
    if !path.is_dir() {
        println!(
            "  {} {:<18} {} (missing)",
            style("✗").red(),
            name,
            path.display()
        );
        return;
    }
    let files = walkdir::WalkDir::new(path)
        .into_iter()
        .filter_map(|e| e.ok())
        .filter(|e| e.file_type().is_file())
        .count();
    println!(
        "  {} {:<18} {} ({} files)",
        style("✓").green(),
        name,
        path.display(),
        files
    );
}

fn lines_status(name: &str, path: &Path) {
    match std::fs::read_to_string(path) {
        Ok(contents) => println!(
            "  {} {:<18} {} ({} lines)",
            style("✓").green(),
            name,
            path.display(),
            contents.lines().count()
        ),
        Err(_) => println!(
            "  {} {:<18} {} (missing)",
            style("✗").red(),
            name,
            path.display()
        ),
    }
}
