//! moi-sync engine entry point.
//!
//! Opens the local cache and remote client, runs the bootstrap
//! reconciliation, and reports the outcome. Embedding applications use
//! [`moi_sync::coordinator::SyncCoordinator`] directly instead.

use std::time::Duration;

use tracing_subscriber::EnvFilter;

use moi_sync::config::SyncConfig;
use moi_sync::coordinator::SyncCoordinator;
use moi_sync::persistence::JsonFileCache;
use moi_sync::remote::HttpRemote;

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    // Initialize tracing
    tracing_subscriber::fmt()
        .with_env_filter(
            EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("info")),
        )
        .init();

    // Load configuration
    let config = SyncConfig::from_env();
    tracing::info!(
        remote = %config.remote_base_url,
        cache_dir = %config.cache_dir.display(),
        "starting moi-sync"
    );

    // Build the ports
    let remote = HttpRemote::new(
        &config.remote_base_url,
        Duration::from_secs(config.remote_timeout_secs),
    )?;
    let cache = JsonFileCache::open(&config.cache_dir)?;

    // Open the coordinator and reconcile
    let coordinator = SyncCoordinator::open(remote, cache)?;
    let report = coordinator.bootstrap().await?;

    if report.remote_reachable {
        tracing::info!(
            pushed_events = report.pushed_events,
            pushed_registrars = report.pushed_registrars,
            pushed_members = report.pushed_members,
            pushed_entries = report.pushed_entries,
            failed = report.failed_pushes,
            "reconciliation finished"
        );
    } else {
        tracing::warn!("remote unreachable; running in local-only mode");
    }

    Ok(())
}
