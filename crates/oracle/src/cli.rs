// Copyright (c) 2023-2026 Quorus Labs (quorus.dev)
// This file is part of the Quorus repository.

// You should have received a copy of the MIT License
// along with the Quorus repository. If not, see <https://mit-license.org/>.

//! Command line and configuration-file handling for the `quorus` binary.

use std::{num::NonZeroUsize, path::PathBuf, time::Duration};

use clap::{Parser, ValueEnum};
use ethereum_types::Address;
use quorus_types::{
    config::{ExecutionMode, OracleConfig, RetryPolicy},
    error::{OracleError, Result},
};
use serde::Deserialize;
use url::Url;

/// Which oracle instance to run.
#[derive(Copy, Clone, Debug, PartialEq, Eq, ValueEnum)]
pub enum ModuleCommand {
    /// Validator balances and exits.
    Accounting,
    /// Validator exit requests.
    Ejector,
    /// Community staking performance distribution.
    Csm,
    /// Probe every provider and exit.
    Check,
}

/// Oracle daemon for proof-of-stake reporting.
#[derive(Debug, Parser)]
#[command(name = "quorus", version, about)]
pub struct Args {
    /// Module to run.
    #[arg(value_enum)]
    pub module: ModuleCommand,

    /// Poll forever instead of running a single cycle.
    #[arg(long, env = "QUORUS_DAEMON")]
    pub daemon: bool,

    /// Consensus-layer (beacon) node endpoint.
    #[arg(long, env = "QUORUS_CONSENSUS_LAYER_URL")]
    pub consensus_layer_url: Url,

    /// Consensus-contract gateway endpoint.
    #[arg(long, env = "QUORUS_GATEWAY_URL")]
    pub gateway_url: Url,

    /// Keys API endpoint.
    #[arg(long, env = "QUORUS_KEYS_API_URL")]
    pub keys_api_url: Url,

    /// This operator's committee address; omit for dry mode.
    #[arg(long, env = "QUORUS_MEMBER_ADDRESS")]
    pub member_address: Option<String>,

    /// Directory for the persisted report-fragment cache.
    #[arg(long, env = "QUORUS_CACHE_DIR")]
    pub cache_dir: Option<PathBuf>,

    /// Prompt before any transaction send (one-shot mode only).
    #[arg(long)]
    pub confirm: bool,

    /// Optional TOML file with tuning overrides.
    #[arg(long, env = "QUORUS_CONFIG_FILE")]
    pub config_file: Option<PathBuf>,
}

/// Tuning knobs loadable from a TOML file; every field falls back to a
/// default when absent.
#[derive(Debug, Default, Deserialize)]
pub struct OracleConfigFile {
    /// Sleep between poll cycles, seconds.
    pub cycle_sleep_in_seconds: Option<u64>,
    /// Wall-clock budget per cycle, seconds.
    pub max_cycle_lifetime_in_seconds: Option<u64>,
    /// Submitter stagger delay, slots.
    pub submit_delay_slots: Option<u64>,
    /// Keep reporting while bunker mode is active.
    pub allow_reporting_in_bunker: Option<bool>,
    /// Bunker anomaly threshold, Gwei.
    pub bunker_anomaly_threshold_gwei: Option<u64>,
    /// Concurrent historical-epoch fetches in the csm builder.
    pub csm_max_concurrency: Option<NonZeroUsize>,
    /// Maximum items per extra-data chunk.
    pub extra_data_max_items_per_chunk: Option<NonZeroUsize>,
    /// Provider read retries.
    pub retry_max_attempts: Option<u32>,
    /// First retry backoff, milliseconds.
    pub retry_initial_backoff_ms: Option<u64>,
}

impl OracleConfigFile {
    /// Load overrides from disk.
    ///
    /// # Errors
    ///
    /// [`OracleError::Config`] when the file is unreadable or not valid
    /// TOML; a missing `--config-file` flag is not an error.
    pub fn load(path: &PathBuf) -> Result<Self> {
        let raw = std::fs::read_to_string(path)
            .map_err(|err| OracleError::Config(format!("reading {}: {err}", path.display())))?;
        toml::from_str(&raw)
            .map_err(|err| OracleError::Config(format!("parsing {}: {err}", path.display())))
    }
}

/// Resolve the full instance configuration from CLI arguments, environment
/// and the optional overrides file.
///
/// # Errors
///
/// [`OracleError::Config`] on an unparseable member address or overrides
/// file; both are startup-fatal.
pub fn resolve_config(args: &Args) -> Result<OracleConfig> {
    let file = match &args.config_file {
        Some(path) => OracleConfigFile::load(path)?,
        None => OracleConfigFile::default(),
    };

    let member_address = args
        .member_address
        .as_deref()
        .map(parse_address)
        .transpose()?;

    Ok(OracleConfig {
        execution_mode: if args.daemon {
            ExecutionMode::Daemon
        } else {
            ExecutionMode::OneShot
        },
        consensus_layer_url: args.consensus_layer_url.clone(),
        gateway_url: args.gateway_url.clone(),
        keys_api_url: args.keys_api_url.clone(),
        member_address,
        cycle_sleep: Duration::from_secs(file.cycle_sleep_in_seconds.unwrap_or(12)),
        max_cycle_lifetime: Duration::from_secs(
            file.max_cycle_lifetime_in_seconds.unwrap_or(3000),
        ),
        submit_delay_slots: file.submit_delay_slots.unwrap_or(6),
        allow_reporting_in_bunker: file.allow_reporting_in_bunker.unwrap_or(false),
        bunker_anomaly_threshold_gwei: file
            .bunker_anomaly_threshold_gwei
            .unwrap_or(1_000_000_000),
        csm_max_concurrency: file
            .csm_max_concurrency
            .unwrap_or_else(|| NonZeroUsize::new(4).unwrap_or(NonZeroUsize::MIN)),
        extra_data_max_items_per_chunk: file
            .extra_data_max_items_per_chunk
            .unwrap_or_else(|| NonZeroUsize::new(32).unwrap_or(NonZeroUsize::MIN)),
        cache_dir: args.cache_dir.clone(),
        confirm_sends: args.confirm,
        retry: RetryPolicy {
            max_attempts: file.retry_max_attempts.unwrap_or(3),
            initial_backoff: Duration::from_millis(file.retry_initial_backoff_ms.unwrap_or(500)),
        },
    })
}

/// Parse a 0x-prefixed 20-byte address.
fn parse_address(value: &str) -> Result<Address> {
    let stripped = value.strip_prefix("0x").unwrap_or(value);
    stripped
        .parse::<Address>()
        .map_err(|err| OracleError::Config(format!("bad member address {value:?}: {err}")))
}
