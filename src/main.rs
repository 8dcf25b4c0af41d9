use std::path::PathBuf;
use std::process;

use anyhow::{Context, Result};
use clap::Parser;

use boardwatch::{ManifestSource, WatchConfig, Watcher};

/// Watch a chessboard widget on a page and report missing pieces.
#[derive(Parser)]
#[command(name = "boardwatch", version, about = "Headless chessboard reconciliation")]
struct Args {
    /// Page hosting the board widget
    url: String,

    /// Manifest of expected pieces: a URL (absolute or relative to
    /// the page), or a local JSON file with --manifest-file
    #[arg(long, default_value = "pieces.json")]
    manifest: String,

    /// Treat the manifest argument as a local file path
    #[arg(long)]
    manifest_file: bool,

    /// Poll interval in milliseconds
    #[arg(long, default_value_t = 500)]
    interval: u64,

    /// Scan once and exit (status 1 when pieces are missing)
    #[arg(long)]
    once: bool,
}

fn main() -> Result<()> {
    let args = Args::parse();

    let config = WatchConfig {
        poll_interval_ms: args.interval,
        ..Default::default()
    };
    let manifest = if args.manifest_file {
        ManifestSource::Path(PathBuf::from(&args.manifest))
    } else {
        ManifestSource::Url(args.manifest.clone())
    };

    let mut watcher = Watcher::new(config, manifest).context("Failed to create watcher")?;
    watcher.on_report(|report| {
        if report.complete {
            println!("All pieces found with valid squares");
        } else {
            println!("Missing pieces: {}", report.missing.join(", "));
        }
    });
    watcher.on_navigation(|change| {
        println!("Navigated: {} -> {}", change.from, change.to);
    });

    watcher.goto(&args.url).context("Failed to load page")?;

    if args.once {
        let report = watcher
            .latest_report()
            .context("No scan ran; the manifest could not be loaded")?;
        process::exit(if report.complete { 0 } else { 1 });
    }

    println!("Watching {} (Ctrl+C to stop)", args.url);
    watcher.run().context("Watch loop failed")?;
    Ok(())
}
