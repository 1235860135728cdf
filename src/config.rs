//! Engine configuration loaded from environment variables.
//!
//! Follows 12-factor style: all settings come from environment variables
//! (or a `.env` file via `dotenvy`), with sensible defaults for a
//! single-device local setup.

use std::path::PathBuf;

/// Top-level engine configuration.
///
/// Loaded once at startup via [`SyncConfig::from_env`].
#[derive(Debug, Clone)]
pub struct SyncConfig {
    /// Base URL of the remote ledger service (e.g. `http://192.168.1.10:4000`).
    pub remote_base_url: String,

    /// Per-request timeout in seconds; a timed-out request counts as a
    /// remote failure and triggers the local fallback.
    pub remote_timeout_secs: u64,

    /// Directory for the on-device JSON cache.
    pub cache_dir: PathBuf,

    /// Number of approval PINs issued per generation run. The bootstrap
    /// binary never issues PINs; embedding applications read this and pass
    /// it to
    /// [`generate_pins`](crate::coordinator::SyncCoordinator::generate_pins).
    pub pin_count: usize,
}

impl SyncConfig {
    /// Loads configuration from environment variables.
    ///
    /// Falls back to defaults when a variable is not set. Calls
    /// `dotenvy::dotenv().ok()` to optionally load a `.env` file.
    #[must_use]
    pub fn from_env() -> Self {
        dotenvy::dotenv().ok();

        let remote_base_url = std::env::var("REMOTE_BASE_URL")
            .unwrap_or_else(|_| "http://localhost:4000".to_string());
        let remote_timeout_secs = parse_env("REMOTE_TIMEOUT_SECS", 10);
        let cache_dir = PathBuf::from(
            std::env::var("CACHE_DIR").unwrap_or_else(|_| "moi-cache".to_string()),
        );
        let pin_count = parse_env("APPROVAL_PIN_COUNT", crate::pins::DEFAULT_PIN_COUNT);

        Self {
            remote_base_url,
            remote_timeout_secs,
            cache_dir,
            pin_count,
        }
    }
}

/// Parses an environment variable as `T`, returning `default` on missing
/// or invalid values.
fn parse_env<T: std::str::FromStr>(key: &str, default: T) -> T {
    parse_or_default(std::env::var(key).ok(), default)
}

fn parse_or_default<T: std::str::FromStr>(raw: Option<String>, default: T) -> T {
    raw.and_then(|v| v.parse().ok()).unwrap_or(default)
}
