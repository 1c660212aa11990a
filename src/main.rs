//! ocrprep - OCR training data preparation harness.
//!
//! A tool for downloading a labelled image dataset and converting its CSV
//! labels into the files an OCR training framework expects.

use tracing_subscriber::{layer::SubscriberExt, util::SubscriberInitExt};

use ocrprep::cli;

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    // Load .env file if present (before anything else)
    let _ = dotenvy::dotenv();

    // Initialize logging based on verbosity
    let default_filter = if cli::is_verbose() {
        "ocrprep=info"
    } else {
        "ocrprep=warn"
    };

    tracing_subscriber::registry()
        .with(
            tracing_subscriber::EnvFilter::try_from_default_env()
                .unwrap_or_else(|_| default_filter.into()),
        )
        .with(tracing_subscriber::fmt::layer())
        .init();

    // Run CLI
    cli::run().await
}
