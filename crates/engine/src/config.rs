use pathfinder_core::constants::{
    CONTEXT_CACHE_TTL_SECS, DEFAULT_ACTIVE_WINDOW_HOURS, DEFAULT_SWEEP_INTERVAL_SECS,
    DEFAULT_SWEEP_LIMIT, PROFILE_CACHE_TTL_SECS,
};
use pathfinder_core::env_parse_with_default;

/// Engine tunables. One instance per process, passed by reference at
/// construction so tests can pick their own windows and TTLs.
#[derive(Debug, Clone)]
pub struct EngineConfig {
    /// Duration after the last message during which a conversation is still
    /// resumable.
    pub active_window: chrono::Duration,
    /// TTL for cached assembled context.
    pub context_cache_ttl: chrono::Duration,
    /// TTL for the lighter profile-snapshot cache.
    pub profile_cache_ttl: chrono::Duration,
    /// Interval between catch-up sweeps.
    pub sweep_interval: std::time::Duration,
    /// Conversations per catch-up sweep.
    pub sweep_limit: usize,
}

impl Default for EngineConfig {
    fn default() -> Self {
        Self {
            active_window: chrono::Duration::hours(DEFAULT_ACTIVE_WINDOW_HOURS),
            context_cache_ttl: chrono::Duration::seconds(CONTEXT_CACHE_TTL_SECS as i64),
            profile_cache_ttl: chrono::Duration::seconds(PROFILE_CACHE_TTL_SECS as i64),
            sweep_interval: std::time::Duration::from_secs(DEFAULT_SWEEP_INTERVAL_SECS),
            sweep_limit: DEFAULT_SWEEP_LIMIT,
        }
    }
}

impl EngineConfig {
    /// Build from `PATHFINDER_*` environment variables, falling back to the
    /// defaults above.
    #[must_use]
    pub fn from_env() -> Self {
        Self {
            active_window: chrono::Duration::hours(env_parse_with_default(
                "PATHFINDER_ACTIVE_WINDOW_HOURS",
                DEFAULT_ACTIVE_WINDOW_HOURS,
            )),
            context_cache_ttl: chrono::Duration::seconds(env_parse_with_default(
                "PATHFINDER_CONTEXT_CACHE_TTL_SECS",
                CONTEXT_CACHE_TTL_SECS as i64,
            )),
            profile_cache_ttl: chrono::Duration::seconds(env_parse_with_default(
                "PATHFINDER_PROFILE_CACHE_TTL_SECS",
                PROFILE_CACHE_TTL_SECS as i64,
            )),
            sweep_interval: std::time::Duration::from_secs(env_parse_with_default(
                "PATHFINDER_SWEEP_INTERVAL_SECS",
                DEFAULT_SWEEP_INTERVAL_SECS,
            )),
            sweep_limit: env_parse_with_default("PATHFINDER_SWEEP_LIMIT", DEFAULT_SWEEP_LIMIT),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn from_env_falls_back_to_defaults() {
        // None of the PATHFINDER_* variables are set in the test environment.
        let config = EngineConfig::from_env();
        assert_eq!(config.active_window, chrono::Duration::hours(4));
        assert_eq!(config.context_cache_ttl, chrono::Duration::minutes(10));
        assert_eq!(config.profile_cache_ttl, chrono::Duration::minutes(5));
        assert_eq!(config.sweep_limit, DEFAULT_SWEEP_LIMIT);
    }
}
