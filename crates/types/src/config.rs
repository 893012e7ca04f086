// Copyright (c) 2023-2026 Quorus Labs (quorus.dev)
// This file is part of the Quorus repository.

// You should have received a copy of the MIT License
// along with the Quorus repository. If not, see <https://mit-license.org/>.

//! Runtime configuration for an oracle instance.
//!
//! One immutable [`OracleConfig`] is built at startup and passed by
//! reference into every component; no component reads ambient global state.

use std::{num::NonZeroUsize, path::PathBuf, time::Duration};

use ethereum_types::Address;
use serde::{Deserialize, Serialize};
use url::Url;

use crate::error::OracleError;

/// Whether to run cycles forever or exactly once.
#[derive(Copy, Clone, Debug, PartialEq, Eq, Serialize, Deserialize)]
pub enum ExecutionMode {
    /// Poll forever, sleeping between cycles.
    Daemon,
    /// Run a single cycle and exit.
    OneShot,
}

/// Bounded-retry policy injected into provider clients.
///
/// Applies to reads only; transaction sends are never retried within a
/// cycle, the next cycle's fresh reads are the recovery path.
#[derive(Copy, Clone, Debug, PartialEq, Eq, Serialize, Deserialize)]
pub struct RetryPolicy {
    /// Total attempts, including the first.
    pub max_attempts: u32,
    /// Delay before the first retry; doubles on each subsequent one.
    pub initial_backoff: Duration,
}

impl RetryPolicy {
    /// Backoff to apply after the `attempt`-th failure (0-based).
    #[must_use]
    pub fn backoff_for(&self, attempt: u32) -> Duration {
        self.initial_backoff
            .saturating_mul(2_u32.saturating_pow(attempt))
    }
}

impl Default for RetryPolicy {
    fn default() -> Self {
        Self {
            max_attempts: 3,
            initial_backoff: Duration::from_millis(500),
        }
    }
}

/// Immutable configuration for one oracle module instance.
#[derive(Clone, Debug, PartialEq, Eq, Serialize, Deserialize)]
pub struct OracleConfig {
    /// Daemon or single-pass execution.
    pub execution_mode: ExecutionMode,
    /// Consensus-layer (beacon) node endpoint.
    pub consensus_layer_url: Url,
    /// Consensus-contract gateway endpoint (reads and sends).
    pub gateway_url: Url,
    /// Keys API endpoint.
    pub keys_api_url: Url,
    /// This operator's committee address. `None` runs in dry mode: reports
    /// are computed and compared but nothing is ever sent.
    pub member_address: Option<Address>,
    /// Sleep between poll cycles.
    pub cycle_sleep: Duration,
    /// Wall-clock budget for one whole cycle.
    pub max_cycle_lifetime: Duration,
    /// Slots past the reference slot the rotation submitter waits before
    /// sending the full report, staggering transactions across operators.
    pub submit_delay_slots: u64,
    /// Whether report submission stays enabled while bunker mode is active.
    pub allow_reporting_in_bunker: bool,
    /// Aggregate reward shortfall (Gwei) that flips the bunker flag.
    pub bunker_anomaly_threshold_gwei: u64,
    /// Concurrent historical-epoch fetches inside the csm builder.
    pub csm_max_concurrency: NonZeroUsize,
    /// Maximum items packed into one extra-data chunk.
    pub extra_data_max_items_per_chunk: NonZeroUsize,
    /// Directory for the persisted report-fragment cache. `None` disables
    /// persistence (fragments are recomputed after a restart).
    pub cache_dir: Option<PathBuf>,
    /// Prompt on stdin before any transaction send (one-shot mode only).
    pub confirm_sends: bool,
    /// Retry policy for provider reads.
    pub retry: RetryPolicy,
}

impl OracleConfig {
    /// Check the invariants that must hold before the loop starts.
    ///
    /// # Errors
    ///
    /// Returns [`OracleError::Config`] on the first violated invariant;
    /// callers exit non-zero without entering the poll loop.
    pub fn validate(&self) -> Result<(), OracleError> {
        if self.cycle_sleep.is_zero() {
            return Err(OracleError::Config("cycle sleep must be non-zero".into()));
        }
        if self.max_cycle_lifetime.is_zero() {
            return Err(OracleError::Config(
                "max cycle lifetime must be non-zero".into(),
            ));
        }
        if self.max_cycle_lifetime <= self.cycle_sleep {
            return Err(OracleError::Config(
                "max cycle lifetime must exceed the cycle sleep".into(),
            ));
        }
        if self.retry.max_attempts == 0 {
            return Err(OracleError::Config(
                "retry policy needs at least one attempt".into(),
            ));
        }
        if self.confirm_sends && self.execution_mode == ExecutionMode::Daemon {
            return Err(OracleError::Config(
                "interactive confirmation is only available in one-shot mode".into(),
            ));
        }
        Ok(())
    }

    /// Whether this instance may send transactions at all.
    #[must_use]
    pub fn is_dry_run(&self) -> bool {
        self.member_address.is_none()
    }
}

#[cfg(test)]
mod test {
    use super::*;

    fn base_config() -> OracleConfig {
        OracleConfig {
            execution_mode: ExecutionMode::Daemon,
            consensus_layer_url: Url::parse("http://localhost:5052").unwrap(),
            gateway_url: Url::parse("http://localhost:8545").unwrap(),
            keys_api_url: Url::parse("http://localhost:3600").unwrap(),
            member_address: Some(Address::repeat_byte(1)),
            cycle_sleep: Duration::from_secs(12),
            max_cycle_lifetime: Duration::from_secs(3000),
            submit_delay_slots: 6,
            allow_reporting_in_bunker: false,
            bunker_anomaly_threshold_gwei: 1_000_000,
            csm_max_concurrency: NonZeroUsize::new(4).unwrap(),
            extra_data_max_items_per_chunk: NonZeroUsize::new(32).unwrap(),
            cache_dir: None,
            confirm_sends: false,
            retry: RetryPolicy::default(),
        }
    }

    #[test]
    fn valid_config_passes() {
        base_config().validate().unwrap();
    }

    #[test]
    fn lifetime_must_exceed_sleep() {
        let mut config = base_config();
        config.max_cycle_lifetime = Duration::from_secs(5);
        assert!(config.validate().is_err());
    }

    #[test]
    fn daemon_mode_cannot_prompt() {
        let mut config = base_config();
        config.confirm_sends = true;
        assert!(config.validate().is_err());

        config.execution_mode = ExecutionMode::OneShot;
        config.validate().unwrap();
    }

    #[test]
    fn backoff_doubles() {
        let retry = RetryPolicy {
            max_attempts: 4,
            initial_backoff: Duration::from_millis(100),
        };
        assert_eq!(retry.backoff_for(0), Duration::from_millis(100));
        assert_eq!(retry.backoff_for(1), Duration::from_millis(200));
        assert_eq!(retry.backoff_for(2), Duration::from_millis(400));
    }
}
