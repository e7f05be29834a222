//! Run settings shared by every concurrency strategy.

use crate::utils::http::get_user_agent;
use std::thread;
use std::time::Duration;

/// Fixed per-request timeout applied by the HTTP fetcher
pub const DEFAULT_TIMEOUT_SECS: u64 = 15;

/// Upper bound for the default number of concurrent fetches
pub const MAX_DEFAULT_JOBS: usize = 32;

/// `min(32, cores + 4)`: downloads are I/O bound, so run a few more than there are cores
pub fn default_jobs() -> usize {
    let cores = thread::available_parallelism().map_or(1, |p| p.get());
    (cores + 4).min(MAX_DEFAULT_JOBS)
}

/// Settings shared by every concurrency strategy
#[derive(Debug, Clone)]
pub struct FetchConfig {
    /// Maximum number of records processed at the same time
    pub jobs: usize,
    pub timeout: Duration,
    pub user_agent: String,
}

impl Default for FetchConfig {
    fn default() -> Self {
        Self {
            jobs: default_jobs(),
            timeout: Duration::from_secs(DEFAULT_TIMEOUT_SECS),
            user_agent: get_user_agent().to_string(),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn default_jobs_stays_within_bounds() {
        let jobs = default_jobs();
        assert!(jobs >= 5);
        assert!(jobs <= MAX_DEFAULT_JOBS);
    }

    #[test]
    fn default_config_uses_fixed_timeout() {
        let config = FetchConfig::default();
        assert_eq!(config.timeout, Duration::from_secs(15));
        assert_eq!(config.user_agent, "SpriteFetch");
    }
}
