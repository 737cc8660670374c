//! Replay configuration loaded from environment variables.
//!
//! Every setting has a default so a replay can start with nothing but an
//! event log in the working directory.

use std::path::PathBuf;

use courier_projection::{ProjectionConfig, Screen, SearchFilter};
use courier_shared::constants::{DEFAULT_CHANNEL_CAPACITY, MIN_RESULTS_VISIBLE};

#[derive(Debug, Clone)]
pub struct ReplayConfig {
    /// JSON-lines file of backend events.
    /// Env: `EVENT_LOG_PATH`
    /// Default: `./events.jsonl`
    pub event_log_path: PathBuf,

    /// Screen whose projection is replayed.
    /// Env: `SCREEN` (conversations / calls / notifications)
    /// Default: `conversations`
    pub screen: Screen,

    /// Matches shown per search section before "show all".
    /// Env: `MIN_RESULTS_VISIBLE`
    /// Default: `3`
    pub min_results_visible: usize,

    /// Query whose search view is printed after the replay.
    /// Env: `SEARCH_QUERY`
    /// Default: none
    pub search_query: Option<String>,

    /// Partition of the printed search view.
    /// Env: `SEARCH_FILTER` (all / contacts / groups / messages)
    /// Default: `all`
    pub search_filter: SearchFilter,

    /// Delete every listed entity after the replay and wait for the sweep.
    /// Env: `DELETE_ALL` (true/false)
    /// Default: `false`
    pub delete_all: bool,

    /// Capacity of the driver's command channel.
    /// Env: `CHANNEL_CAPACITY`
    /// Default: `256`
    pub channel_capacity: usize,
}

impl Default for ReplayConfig {
    fn default() -> Self {
        Self {
            event_log_path: PathBuf::from("./events.jsonl"),
            screen: Screen::Conversations,
            min_results_visible: MIN_RESULTS_VISIBLE,
            search_query: None,
            search_filter: SearchFilter::All,
            delete_all: false,
            channel_capacity: DEFAULT_CHANNEL_CAPACITY,
        }
    }
}

impl ReplayConfig {
    /// Load configuration from environment variables, falling back to defaults.
    pub fn from_env() -> Self {
        Self::from_vars(|key| std::env::var(key).ok())
    }

    /// Load configuration from an arbitrary variable source.
    pub fn from_vars<F>(var: F) -> Self
    where
        F: Fn(&str) -> Option<String>,
    {
        let mut config = Self::default();

        if let Some(path) = var("EVENT_LOG_PATH") {
            config.event_log_path = PathBuf::from(path);
        }

        if let Some(value) = var("SCREEN") {
            match value.parse::<Screen>() {
                Ok(screen) => config.screen = screen,
                Err(e) => tracing::warn!(error = %e, "Invalid SCREEN, using default"),
            }
        }

        if let Some(value) = var("MIN_RESULTS_VISIBLE") {
            match value.parse::<usize>() {
                Ok(n) if n > 0 => config.min_results_visible = n,
                _ => tracing::warn!(value = %value, "Invalid MIN_RESULTS_VISIBLE, using default"),
            }
        }

        if let Some(query) = var("SEARCH_QUERY") {
            if !query.trim().is_empty() {
                config.search_query = Some(query);
            }
        }

        if let Some(value) = var("SEARCH_FILTER") {
            match value.parse::<SearchFilter>() {
                Ok(filter) => config.search_filter = filter,
                Err(e) => tracing::warn!(error = %e, "Invalid SEARCH_FILTER, using default"),
            }
        }

        if let Some(value) = var("DELETE_ALL") {
            config.delete_all = value == "true" || value == "1";
        }

        if let Some(value) = var("CHANNEL_CAPACITY") {
            match value.parse::<usize>() {
                Ok(n) if n > 0 => config.channel_capacity = n,
                _ => tracing::warn!(value = %value, "Invalid CHANNEL_CAPACITY, using default"),
            }
        }

        // RUST_LOG is read by tracing-subscriber's EnvFilter directly.

        config
    }

    pub fn projection_config(&self) -> ProjectionConfig {
        ProjectionConfig {
            screen: self.screen,
            min_results_visible: self.min_results_visible,
        }
    }
}
