// Copyright (c) 2023-2026 Quorus Labs (quorus.dev)
// This file is part of the Quorus repository.

// You should have received a copy of the MIT License
// along with the Quorus repository. If not, see <https://mit-license.org/>.

//! Bunker-mode detection.
//!
//! Bunker mode is a protocol-level defensive state: when consensus-layer
//! rewards look anomalous (mass slashing, long inactivity leak), report
//! effects are suppressed until a human has looked. The gate is applied at
//! the action-dispatch boundary in the cycle loop, not inside the tracker:
//! hash submission continues so consensus formation is never stalled.

use quorus_types::{
    data::{ReferenceBlockStamp, Validator, ValidatorStatus},
    error::Result,
    traits::chain_reader::ChainReader,
};
use tracing::warn;

/// Detects the reward-rate anomaly that activates bunker mode.
pub struct BunkerDetector {
    /// Aggregate shortfall (Gwei) below effective balance that counts as
    /// anomalous.
    threshold_gwei: u64,
}

impl BunkerDetector {
    /// Create a detector with the configured anomaly threshold.
    #[must_use]
    pub fn new(threshold_gwei: u64) -> Self {
        Self { threshold_gwei }
    }

    /// Whether bunker mode is active at the given reference state.
    ///
    /// # Errors
    ///
    /// Propagates reader failures; the cycle treats them as transient.
    pub async fn is_active(
        &self,
        chain: &dyn ChainReader,
        stamp: &ReferenceBlockStamp,
    ) -> Result<bool> {
        let validators = chain.validators(stamp).await?;
        let shortfall = reward_shortfall_gwei(&validators);
        let active = shortfall > i128::from(self.threshold_gwei);
        if active {
            warn!(
                shortfall_gwei = shortfall,
                threshold_gwei = self.threshold_gwei,
                "reward-rate anomaly detected, bunker mode is active"
            );
        }
        Ok(active)
    }
}

/// Aggregate amount (Gwei) by which attesting validators sit below their
/// effective balance. Healthy validators accrue rewards above it, so a
/// large positive shortfall means the set is being leaked or slashed.
fn reward_shortfall_gwei(validators: &[Validator]) -> i128 {
    validators
        .iter()
        .filter(|validator| {
            matches!(
                validator.status,
                ValidatorStatus::Active | ValidatorStatus::Exiting
            )
        })
        .map(|validator| {
            i128::from(validator.effective_balance_gwei) - i128::from(validator.balance_gwei)
        })
        .sum()
}
