//! Default values for configuration

use std::path::PathBuf;

/// Default root for raw dumps and built stores, relative to the working directory
pub fn default_data_dir() -> PathBuf {
    std::env::var("MUSEFED_DATA_DIR")
        .map(PathBuf::from)
        .unwrap_or_else(|_| PathBuf::from("data"))
}

/// Adapters are enabled unless switched off
pub fn default_museum_enabled() -> bool {
    true
}

/// Records per ETL transaction
pub fn default_etl_batch_size() -> usize {
    5000
}

/// Page size when none is requested
pub fn default_search_limit() -> u32 {
    crate::models::DEFAULT_LIMIT
}

/// Upper bound the CLI applies to a requested page size
pub fn default_search_max_limit() -> u32 {
    100
}

/// Maximum HEAD requests in flight
pub fn default_validator_concurrency() -> usize {
    10
}

/// Pause between validation chunks
pub fn default_validator_delay_ms() -> u64 {
    200
}

/// Per-request timeout for image checks
pub fn default_validator_timeout_ms() -> u64 {
    10_000
}

/// User agent sent with image checks
pub fn default_validator_user_agent() -> String {
    format!("musefed/{} (image link checker)", env!("CARGO_PKG_VERSION"))
}
