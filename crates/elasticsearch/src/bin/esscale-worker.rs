//! esscale-worker: polls an Elasticsearch search template and logs the
//! scaling signal the autoscaler would receive.
//!
//! Each tick asks the scaler for its activity flag and its metric value.
//! A failed poll is logged and the previous decision stands; nothing is
//! reported as zero.

use std::path::PathBuf;

use clap::Parser;
use tracing::{info, info_span, warn};

use esscale_core::config::load_dotenv;
use esscale_core::{Scaler, TriggerFile, WorkerConfig};
use esscale_elasticsearch::ElasticsearchScaler;

// ── CLI ─────────────────────────────────────────────────────────────

/// Elasticsearch scaler worker.
#[derive(Parser, Debug)]
#[command(name = "esscale-worker", version, about)]
struct Cli {
    /// Config profile; `{PROFILE}_{KEY}` env vars win over `{KEY}`.
    #[arg(long, env = "ESSCALE_PROFILE", default_value = "")]
    profile: String,

    /// Path to the TOML trigger definition ([metadata] and [auth] tables).
    #[arg(long)]
    trigger: Option<PathBuf>,

    /// Seconds between polls.
    #[arg(long)]
    poll_interval: Option<u64>,

    /// Deadline for each round trip, in milliseconds (0 = none).
    #[arg(long)]
    http_timeout_ms: Option<u64>,

    /// Poll once and exit; a failed poll exits non-zero.
    #[arg(long)]
    once: bool,
}

// ── main ────────────────────────────────────────────────────────────

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    load_dotenv();

    tracing_subscriber::fmt()
        .with_env_filter(
            tracing_subscriber::EnvFilter::try_from_default_env()
                .unwrap_or_else(|_| tracing_subscriber::EnvFilter::new("info")),
        )
        .init();

    let cli = Cli::parse();

    let mut config = WorkerConfig::for_profile(&cli.profile);
    if let Some(path) = cli.trigger {
        config.trigger_file = path;
    }
    if let Some(secs) = cli.poll_interval {
        config.poll_interval_secs = secs;
    }
    if let Some(ms) = cli.http_timeout_ms {
        config.http_timeout_ms = ms;
    }
    config.log_summary();

    let trigger = TriggerFile::from_file(&config.trigger_file)?;
    let scaler_config =
        trigger.into_scaler_config(|name| std::env::var(name).ok(), config.http_timeout());

    let span = info_span!(
        "elasticsearch_scaler",
        trigger = %config.trigger_file.display()
    );
    let scaler = ElasticsearchScaler::connect(scaler_config, span).await?;
    info!(spec = %scaler.metric_spec(), "metric spec registered");

    if cli.once {
        let result = poll(&scaler).await;
        scaler.close().await?;
        return result;
    }

    let mut ticker = tokio::time::interval(config.poll_interval());
    loop {
        tokio::select! {
            _ = ticker.tick() => {
                if let Err(e) = poll(&scaler).await {
                    warn!(error = %e, "poll failed, keeping previous scaling decision");
                }
            }
            _ = tokio::signal::ctrl_c() => {
                info!("shutdown signal received");
                break;
            }
        }
    }

    scaler.close().await?;
    info!("esscale-worker exited cleanly");
    Ok(())
}

async fn poll(scaler: &ElasticsearchScaler) -> anyhow::Result<()> {
    let active = scaler.is_active().await?;
    let metric = scaler.current_value().await?;
    info!(
        active,
        metric = %metric.metric_name,
        value = metric.value,
        observed_at = %metric.timestamp,
        "poll complete"
    );
    Ok(())
}
