// Copyright (c) 2023-2026 Quorus Labs (quorus.dev)
// This file is part of the Quorus repository.

// You should have received a copy of the MIT License
// along with the Quorus repository. If not, see <https://mit-license.org/>.

//! Fixture builders shared by the integration suites.

use std::{
    num::{NonZeroU64, NonZeroUsize},
    time::Duration,
};

use ethereum_types::{Address, H256};
use quorus_types::{
    config::{ExecutionMode, OracleConfig, RetryPolicy},
    consensus::CommitteeRoster,
    data::ReportHash,
    frame::{ChainConfig, FrameConfig},
};
use url::Url;

/// Deterministic member address `n`.
#[must_use]
pub fn addr(n: u8) -> Address {
    Address::repeat_byte(n)
}

/// Deterministic report hash `n`.
#[must_use]
pub fn hash(n: u8) -> ReportHash {
    ReportHash::new(H256::repeat_byte(n))
}

/// Chain timing used across the suites: 11 slots per epoch so that frame
/// reference slots land on round numbers like 1000.
#[must_use]
pub fn chain_config() -> ChainConfig {
    ChainConfig {
        slots_per_epoch: 11,
        seconds_per_slot: 12,
        genesis_time: 0,
    }
}

/// Ten-epoch frames starting at epoch 1: frame 9 has reference slot 1000
/// and deadline slot 1110.
#[must_use]
pub fn frame_config() -> FrameConfig {
    FrameConfig {
        initial_epoch: quorus_types::data::EpochNumber::new(1),
        epochs_per_frame: 10,
    }
}

/// A roster of `n` members with quorum 3.
#[must_use]
pub fn roster(n: u8) -> CommitteeRoster {
    CommitteeRoster::new(
        (1..=n).map(addr).collect(),
        NonZeroU64::new(3).unwrap_or(NonZeroU64::MIN),
    )
}

/// One-shot configuration against placeholder endpoints, running as
/// member `me` (or in dry mode when `None`).
#[must_use]
pub fn test_config(me: Option<Address>) -> OracleConfig {
    let localhost = |port: u16| {
        Url::parse(&format!("http://localhost:{port}")).expect("static test url")
    };
    OracleConfig {
        execution_mode: ExecutionMode::OneShot,
        consensus_layer_url: localhost(5052),
        gateway_url: localhost(8545),
        keys_api_url: localhost(3600),
        member_address: me,
        cycle_sleep: Duration::from_millis(10),
        max_cycle_lifetime: Duration::from_millis(500),
        submit_delay_slots: 6,
        allow_reporting_in_bunker: false,
        bunker_anomaly_threshold_gwei: 1_000_000_000,
        csm_max_concurrency: NonZeroUsize::new(4).unwrap_or(NonZeroUsize::MIN),
        extra_data_max_items_per_chunk: NonZeroUsize::new(32).unwrap_or(NonZeroUsize::MIN),
        cache_dir: None,
        confirm_sends: false,
        retry: RetryPolicy {
            max_attempts: 1,
            initial_backoff: Duration::from_millis(1),
        },
    }
}
