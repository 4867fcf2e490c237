use anyhow::{Context, Result};
use clap::Parser;
use std::path::PathBuf;
use tokio::sync::mpsc;
use url::Url;

use upnext::config::Config;
use upnext::feed::fetcher;
use upnext::provider::{CycleOutcome, MeetingProvider};
use upnext::publish::{Publisher, INFORMATION_MEETING_FEED, PAYLOAD_FIELD_FEED};
use upnext::settings::ProviderSettings;
use upnext::{scheduler, shutdown};

/// Get the default config file path (~/.config/upnext/config.toml)
fn default_config_path() -> Result<PathBuf> {
    let home = std::env::var("HOME").context("HOME environment variable not set")?;
    Ok(PathBuf::from(home)
        .join(".config")
        .join("upnext")
        .join("config.toml"))
}

#[derive(Parser, Debug)]
#[command(
    name = "upnext",
    about = "Polls a calendar feed and republishes upcoming events as a meeting feed"
)]
struct Args {
    /// Path to config file (default: ~/.config/upnext/config.toml)
    #[arg(long, value_name = "FILE")]
    config: Option<PathBuf>,

    /// Run a single refresh cycle, print the feed document, and exit
    #[arg(long)]
    once: bool,
}

#[tokio::main]
async fn main() -> Result<()> {
    // Initialize tracing for debug logging
    tracing_subscriber::fmt()
        .with_env_filter(tracing_subscriber::EnvFilter::from_default_env())
        .init();

    let args = Args::parse();

    let config_path = match args.config {
        Some(path) => path,
        None => default_config_path()?,
    };
    let config = Config::load(&config_path)
        .with_context(|| format!("Failed to load config from {}", config_path.display()))?;

    let feed_url = Url::parse(&config.feed_url).context("Invalid feed_url in configuration")?;
    let settings = ProviderSettings::from_config(&config);
    let client = fetcher::client().context("Failed to build HTTP client")?;

    let (payload_tx, mut payload_rx) = mpsc::channel(8);
    let provider = MeetingProvider::new(feed_url, client, settings, Publisher::new(payload_tx));

    if args.once {
        return match provider.run_cycle().await {
            CycleOutcome::Published { events } => {
                if let Some(payload) = payload_rx.recv().await {
                    if let Some(document) = payload.value(PAYLOAD_FIELD_FEED) {
                        println!("{document}");
                    }
                }
                tracing::info!(events, "Single refresh cycle complete");
                Ok(())
            }
            CycleOutcome::AwaitingAuth => {
                anyhow::bail!(
                    "No auth token configured; set auth_token in {} or the {} env var",
                    config_path.display(),
                    Config::AUTH_TOKEN_ENV
                );
            }
            CycleOutcome::Failed(e) => Err(e).context("Refresh cycle failed"),
        };
    }

    // Daemon mode: the context sink logs each delivery. A real host would
    // dispatch payloads to its subscribers here instead.
    let sink = tokio::spawn(async move {
        while let Some(payload) = payload_rx.recv().await {
            let bytes = payload.value(PAYLOAD_FIELD_FEED).map_or(0, str::len);
            tracing::info!(
                information = INFORMATION_MEETING_FEED,
                object = %payload.object,
                bytes,
                "Delivered context payload"
            );
        }
    });

    let (shutdown_tx, shutdown_rx) = shutdown::channel();
    tokio::spawn(shutdown::handle_signals(shutdown_tx));

    scheduler::run(provider, shutdown_rx).await;

    // Provider (and its payload sender) dropped with the scheduler, so the
    // sink drains and exits on its own.
    let _ = sink.await;

    Ok(())
}
