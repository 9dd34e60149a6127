use std::sync::atomic::Ordering;
use std::sync::Arc;
use std::time::Duration;

use clap::{Parser, Subcommand};
use tokio::sync::mpsc::error::TryRecvError;
use tracing::info;

use chembox_checker::channel::{ChannelEvent, Classification};
use chembox_checker::checker::CheckRunner;
use chembox_checker::config::{parse_title_list, RunConfig};
use chembox_checker::fields::FIELD_REGISTRY;
use chembox_checker::logging;
use chembox_checker::sources::{MediaWikiSource, WikidataLinks};
use chembox_checker::wikitext::WikitextParser;

#[derive(Parser)]
#[command(name = "chembox_checker")]
#[command(about = "Cross-wiki chemical infobox consistency checker")]
#[command(version = "0.1.0")]
struct Cli {
    #[command(subcommand)]
    command: Commands,
}

#[derive(Subcommand)]
enum Commands {
    /// Check a list of articles against the target editions
    Check {
        /// Path to a newline-delimited list of article titles
        #[arg(long)]
        titles: String,
        /// Path to a TOML run configuration; defaults apply when omitted
        #[arg(long)]
        config: Option<String>,
    },
    /// List the comparable fields and their per-edition parameter keys
    Fields,
}

#[tokio::main]
async fn main() -> Result<(), Box<dyn std::error::Error>> {
    // Initialize logging
    logging::init_logging();

    let cli = Cli::parse();

    match cli.command {
        Commands::Check { titles, config } => run_check(&titles, config.as_deref()).await?,
        Commands::Fields => list_fields(),
    }
    Ok(())
}

fn list_fields() {
    for spec in FIELD_REGISTRY {
        println!("{:<14} source key '{}'", spec.label, spec.source_key);
        for (edition, keys) in spec.target_keys {
            println!("    {}: {}", edition, keys.join(", "));
        }
    }
}

async fn run_check(
    titles_path: &str,
    config_path: Option<&str>,
) -> Result<(), Box<dyn std::error::Error>> {
    let config = match config_path {
        Some(path) => RunConfig::load(path)?,
        None => RunConfig::default(),
    };
    config.validate()?;

    let raw = std::fs::read_to_string(titles_path)?;
    let titles = parse_title_list(&raw);
    if titles.is_empty() {
        println!("⚠️  No article titles in {}", titles_path);
        return Ok(());
    }

    println!("🔎 Checking {} articles...", titles.len());

    let poll_ms = config.poll_ms;
    let runner = CheckRunner::new(
        Arc::new(MediaWikiSource::new()),
        Arc::new(WikidataLinks::new()),
        Arc::new(WikitextParser),
        config,
    );
    let mut session = runner.start(titles)?;
    info!(run_id = %session.run_id, "run started");

    // ctrl-c requests a stop at the next article boundary
    let cancel = session.cancel_flag();
    tokio::spawn(async move {
        if tokio::signal::ctrl_c().await.is_ok() {
            eprintln!("\n⏹  Stop requested, finishing the article in progress...");
            cancel.store(true, Ordering::SeqCst);
        }
    });

    // Drain the channel on a fixed polling period; the worker never waits
    // for the renderer
    let mut poll = tokio::time::interval(Duration::from_millis(poll_ms));
    'render: loop {
        poll.tick().await;
        loop {
            match session.events.try_recv() {
                Ok(event) => {
                    if render_event(event) {
                        break 'render;
                    }
                }
                Err(TryRecvError::Empty) => break,
                Err(TryRecvError::Disconnected) => break 'render,
            }
        }
    }

    let elapsed = (chrono::Utc::now() - session.started_at).num_seconds();
    println!("   Elapsed: {}s", elapsed);
    Ok(())
}

/// Prints one event; returns true once the run is over.
fn render_event(event: ChannelEvent) -> bool {
    match event {
        ChannelEvent::Log(message) => info!("{}", message),
        ChannelEvent::Progress { fraction, message } => {
            println!("[{:>3.0}%] {}", fraction * 100.0, message);
        }
        ChannelEvent::Result {
            classification,
            text,
        } => {
            let glyph = match classification {
                Classification::Ok => "✅",
                Classification::Error => "⚠️ ",
                Classification::Missing => "❓",
            };
            println!("{} {}", glyph, text);
            if classification == Classification::Error {
                println!("{}", "-".repeat(40));
            }
        }
        ChannelEvent::Done(summary) => {
            println!("\n📊 Run finished:");
            println!("   Mismatches: {}", summary.errors);
            println!("   OK: {}", summary.ok);
            println!("   Missing: {}", summary.missing);
            if summary.cancelled {
                println!(
                    "   Stopped early after {}/{} articles",
                    summary.processed(),
                    summary.total
                );
            }
            if summary.aborted {
                println!(
                    "   Aborted by a systemic failure after {}/{} articles",
                    summary.processed(),
                    summary.total
                );
            }
            return true;
        }
    }
    false
}
