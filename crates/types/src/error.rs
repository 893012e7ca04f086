// Copyright (c) 2023-2026 Quorus Labs (quorus.dev)
// This file is part of the Quorus repository.

// You should have received a copy of the MIT License
// along with the Quorus repository. If not, see <https://mit-license.org/>.

//! Error type for the Quorus oracle.
//!
//! Every failure a cycle can hit is a variant here, so the orchestrator's
//! boundary can make exactly one decision per error: retry next cycle, or
//! stop the process and page a human.

use std::time::Duration;

use ethereum_types::Address;
use thiserror::Error;

use crate::data::{ReportHash, SlotNumber};

/// Error type for the Quorus oracle.
#[derive(Debug, Error)]
#[non_exhaustive]
pub enum OracleError {
    /// A provider did not answer (connection refused, timeout, 5xx).
    #[error("node unavailable: {0}")]
    NodeUnavailable(String),

    /// The requested slot has no block.
    #[error("slot {0} has no block")]
    SlotMissed(SlotNumber),

    /// Finalization data is not available yet (node still syncing, or the
    /// chain has not reached the initial frame epoch).
    #[error("chain not ready: {0}")]
    ChainNotReady(String),

    /// Every slot in the walk-back window was missed. A finalized chain
    /// cannot look like this; the node is contradicting itself.
    #[error("no existing block found walking back from slot {0}")]
    NoSlotsAvailable(SlotNumber),

    /// A slot we expected to be finalized is not.
    #[error("slot {0} is not finalized")]
    SlotNotFinalized(SlotNumber),

    /// Observed chain state moved backward between cycles.
    #[error("inconsistent chain state: {0}")]
    InconsistentChainState(String),

    /// This member's locally computed report hash disagrees with the hash a
    /// quorum of members agreed on. Never auto-resolved: silently adopting
    /// the majority's hash could hide a local bug or an adversarial
    /// majority.
    #[error(
        "local report hash {local} disagrees with quorum hash {quorum} at ref slot {ref_slot}"
    )]
    HashMismatch {
        /// Reference slot of the disputed frame.
        ref_slot: SlotNumber,
        /// Hash computed by this member.
        local: ReportHash,
        /// Hash the quorum agreed on.
        quorum: ReportHash,
    },

    /// The configured account is not on the contract's member roster.
    #[error("account {0} is not a member of the oracle committee")]
    NotInCommittee(Address),

    /// The keys API answered, but with data that contradicts itself or the
    /// consensus layer.
    #[error("keys api returned inconsistent data: {0}")]
    KeysApiInconsistent(String),

    /// Reading or writing the local report cache failed.
    #[error("report cache failure: {0}")]
    Cache(String),

    /// The transaction sender rejected or could not land a transaction.
    #[error("transaction failed: {0}")]
    TxFailed(String),

    /// The whole cycle exceeded its wall-clock budget.
    #[error("cycle exceeded its lifetime of {0:?}")]
    CycleTimeout(Duration),

    /// Invalid or missing configuration, detected at startup.
    #[error("invalid configuration: {0}")]
    Config(String),

    /// Failed to serialize data.
    #[error("failed to serialize: {0}")]
    FailedToSerialize(String),
}

impl OracleError {
    /// Whether this error must terminate the process so an operator can
    /// intervene, as opposed to being retried on the next poll cycle.
    #[must_use]
    pub fn is_fatal(&self) -> bool {
        matches!(
            self,
            Self::HashMismatch { .. } | Self::NotInCommittee(_) | Self::Config(_)
        )
    }

    /// Whether the same call may be retried within the current cycle.
    ///
    /// Everything else either resolves by waiting for the next cycle's
    /// fresh reads or is fatal.
    #[must_use]
    pub fn is_retryable(&self) -> bool {
        matches!(self, Self::NodeUnavailable(_))
    }
}

/// Alias for the result of an oracle operation.
pub type Result<T, E = OracleError> = std::result::Result<T, E>;

#[cfg(test)]
mod test {
    use super::*;

    #[test]
    fn severity_taxonomy() {
        let mismatch = OracleError::HashMismatch {
            ref_slot: SlotNumber::new(1000),
            local: ReportHash::ZERO,
            quorum: ReportHash::ZERO,
        };
        assert!(mismatch.is_fatal());
        assert!(OracleError::Config("x".into()).is_fatal());
        assert!(OracleError::NotInCommittee(Address::zero()).is_fatal());

        assert!(!OracleError::NodeUnavailable("refused".into()).is_fatal());
        assert!(OracleError::NodeUnavailable("refused".into()).is_retryable());
        assert!(!OracleError::SlotMissed(SlotNumber::new(1)).is_retryable());
    }
}
