//! Driver configuration loaded from environment variables.

use std::time::Duration;

/// Account the demo history is seeded for when `ACCOUNT_ID` is unset.
pub const DEFAULT_ACCOUNT_ID: &str = "9fd16a83-f0b1-4301-9d63-f3f151ae2dbd";

/// Driver configuration with sensible defaults.
///
/// Reads from environment variables:
/// - `ACCOUNT_ID`: account to seed and operate on (default: [`DEFAULT_ACCOUNT_ID`])
/// - `FLIGHT_MILES`: miles credited by the demo flight (default: `1000`)
/// - `FLIGHT_TIER_POINTS`: tier points credited by the demo flight (default: `3`)
/// - `REPLAY_BUFFER`: read stream channel capacity (default: `16`)
/// - `REPLAY_TIMEOUT_MS`: replay deadline in milliseconds (default: none)
/// - `RUST_LOG`: tracing filter directive (default: `"debug"`)
///
/// Values that don't parse fall back to their default.
#[derive(Debug, Clone)]
pub struct Config {
    pub account_id: String,
    pub flight_miles: i64,
    pub flight_tier_points: i64,
    pub replay_buffer: usize,
    pub replay_timeout: Option<Duration>,
    pub log_level: String,
}

impl Config {
    /// Loads configuration from environment variables, falling back to defaults.
    pub fn from_env() -> Self {
        Self::from_lookup(|key| std::env::var(key).ok())
    }

    /// Loads configuration through `lookup`, falling back to defaults.
    pub fn from_lookup(lookup: impl Fn(&str) -> Option<String>) -> Self {
        let defaults = Self::default();
        Self {
            account_id: lookup("ACCOUNT_ID")
                .filter(|id| !id.is_empty())
                .unwrap_or(defaults.account_id),
            flight_miles: lookup("FLIGHT_MILES")
                .and_then(|v| v.parse().ok())
                .unwrap_or(defaults.flight_miles),
            flight_tier_points: lookup("FLIGHT_TIER_POINTS")
                .and_then(|v| v.parse().ok())
                .unwrap_or(defaults.flight_tier_points),
            replay_buffer: lookup("REPLAY_BUFFER")
                .and_then(|v| v.parse().ok())
                .filter(|&n: &usize| n > 0)
                .unwrap_or(defaults.replay_buffer),
            replay_timeout: lookup("REPLAY_TIMEOUT_MS")
                .and_then(|v| v.parse().ok())
                .map(Duration::from_millis),
            log_level: lookup("RUST_LOG").unwrap_or(defaults.log_level),
        }
    }
}

impl Default for Config {
    fn default() -> Self {
        Self {
            account_id: DEFAULT_ACCOUNT_ID.to_string(),
            flight_miles: 1000,
            flight_tier_points: 3,
            replay_buffer: 16,
            replay_timeout: None,
            log_level: "debug".to_string(),
        }
    }
}
