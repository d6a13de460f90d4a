//! dumptext: plain-text corpus extraction from MediaWiki XML dumps

use anyhow::Result;
use clap::Parser;
use dumptext::{config::Config, corpus::CorpusCoordinator, render::WikiRenderer};
use std::path::PathBuf;
use std::sync::Arc;
use tracing::{info, Level};
use tracing_subscriber::FmtSubscriber;

#[derive(Parser)]
#[command(name = "dumptext")]
#[command(about = "Extract plain-text corpora from MediaWiki XML dumps")]
#[command(version)]
struct Cli {
    /// Path to the XML dump (.xml or .xml.bz2)
    dump: PathBuf,

    /// Output root directory
    out_dir: PathBuf,

    /// Configuration file path
    #[arg(short, long, default_value = "dumptext.toml")]
    config: PathBuf,

    /// Dump language code (overrides config)
    #[arg(short, long)]
    language: Option<String>,

    /// Minimum article size in bytes (overrides config)
    #[arg(long)]
    min_size: Option<usize>,

    /// Worker count, 0 = one per core (overrides config)
    #[arg(short, long)]
    workers: Option<usize>,

    /// Bound on the reader-to-worker queue (overrides config)
    #[arg(long)]
    queue_depth: Option<usize>,

    /// Write run statistics as JSON to this path
    #[arg(long)]
    stats: Option<PathBuf>,

    /// Quiet mode (no progress output)
    #[arg(short, long)]
    quiet: bool,

    /// Verbosity level
    #[arg(short, long, action = clap::ArgAction::Count)]
    verbose: u8,
}

#[tokio::main]
async fn main() -> Result<()> {
    let cli = Cli::parse();

    // Load or create config, then apply flag overrides.
    let mut config = if cli.config.exists() {
        Config::load(&cli.config)?
    } else {
        Config::default()
    };
    if let Some(language) = cli.language {
        config.extraction.language = language;
    }
    if let Some(min_size) = cli.min_size {
        config.extraction.min_size = min_size;
    }
    if let Some(workers) = cli.workers {
        config.runtime.workers = workers;
    }
    if let Some(queue_depth) = cli.queue_depth {
        config.runtime.queue_depth = queue_depth;
    }
    config.validate()?;

    // Setup logging
    let log_level = match cli.verbose {
        0 => config.logging.level.as_tracing_level(),
        1 => Level::DEBUG,
        _ => Level::TRACE,
    };
    let subscriber = FmtSubscriber::builder()
        .with_max_level(log_level)
        .with_target(false)
        .finish();
    tracing::subscriber::set_global_default(subscriber)?;

    if !cli.dump.exists() {
        anyhow::bail!("Dump file not found: {}", cli.dump.display());
    }
    std::fs::create_dir_all(&cli.out_dir)?;

    info!(
        "Language: {}, min size: {} bytes",
        config.extraction.language, config.extraction.min_size
    );

    let renderer = Arc::new(WikiRenderer::new());
    let coordinator = CorpusCoordinator::new(&config, renderer).with_quiet(cli.quiet);
    let stats = coordinator.run(&cli.dump, &cli.out_dir).await?;

    if let Some(stats_path) = cli.stats {
        let json = serde_json::to_string_pretty(&stats)?;
        std::fs::write(&stats_path, json)?;
        info!("Run statistics written to {}", stats_path.display());
    }

    if !cli.quiet {
        println!("\nCorpus written to: {}", cli.out_dir.display());
        println!(
            "{} pages accepted, {} rejected, {} failed",
            stats.pages_written, stats.pages_rejected, stats.pages_failed
        );
    }

    Ok(())
}
