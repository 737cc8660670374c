//! # courier-replay
//!
//! Replays a recorded backend event log through the list projection of one
//! screen and prints the resulting rows as JSON.
//!
//! An in-memory backend answers the requests the projection issues while
//! the log plays (bulk reloads, activity refreshes, searches, deletes).

mod backend;
mod config;
mod driver;
mod error;
mod event_log;

use tracing::info;
use tracing_subscriber::EnvFilter;

use courier_projection::present;
use courier_shared::constants::APP_NAME;

use crate::backend::MemoryBackend;
use crate::config::ReplayConfig;
use crate::driver::spawn_driver;

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    // -----------------------------------------------------------------------
    // 1. Initialize tracing (respects RUST_LOG env var)
    // -----------------------------------------------------------------------
    tracing_subscriber::fmt()
        .with_env_filter(
            EnvFilter::try_from_default_env().unwrap_or_else(|_| {
                EnvFilter::new("info,courier_projection=debug,courier_replay=debug")
            }),
        )
        .with_writer(std::io::stderr)
        .init();

    info!("Starting {} replay v{}", APP_NAME, env!("CARGO_PKG_VERSION"));

    // -----------------------------------------------------------------------
    // 2. Load configuration and the event log
    // -----------------------------------------------------------------------
    let config = ReplayConfig::from_env();
    info!(?config, "Loaded configuration");

    let events = event_log::read_event_log(&config.event_log_path).await?;
    info!(events = events.len(), "Event log loaded");

    // -----------------------------------------------------------------------
    // 3. Replay
    // -----------------------------------------------------------------------
    let driver = spawn_driver(
        config.projection_config(),
        MemoryBackend::new(),
        config.channel_capacity,
    );
    for event in events {
        driver.send(event).await?;
    }

    let view = driver.snapshot().await?;
    let rows: Vec<_> = view.iter().map(present).collect();
    println!("{}", serde_json::to_string_pretty(&rows)?);
    info!(rows = rows.len(), revision = driver.revision(), "Replay finished");

    // -----------------------------------------------------------------------
    // 4. Optional search and delete sweep
    // -----------------------------------------------------------------------
    if let Some(query) = &config.search_query {
        let sections = driver.search(query, config.search_filter).await?;
        println!("{}", serde_json::to_string_pretty(&sections)?);
        info!(query = %query, sections = sections.len(), "Search view printed");
    }

    if config.delete_all {
        let handle = driver.delete_all().await?;
        let remaining = driver.snapshot().await?.len();
        info!(sweep = %handle.id, requested = handle.pending, remaining, "Delete sweep issued");
    }

    let stats = driver.shutdown().await?;
    info!(
        events = stats.events_applied,
        requests = stats.requests_answered,
        sweeps = stats.sweeps_completed,
        "Projection driver stopped"
    );

    Ok(())
}
