/// Application name
pub const APP_NAME: &str = "Courier";

/// Number of search matches shown per section before "show all"
pub const MIN_RESULTS_VISIBLE: usize = 3;

/// Default capacity of the host's event / request channels
pub const DEFAULT_CHANNEL_CAPACITY: usize = 256;
