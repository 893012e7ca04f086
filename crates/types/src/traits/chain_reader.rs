// Copyright (c) 2023-2026 Quorus Labs (quorus.dev)
// This file is part of the Quorus repository.

// You should have received a copy of the MIT License
// along with the Quorus repository. If not, see <https://mit-license.org/>.

//! Read-only access to consensus-layer node state.

use async_trait::async_trait;

use crate::{
    data::{AttestationDuty, BlockStamp, EpochNumber, SlotNumber, Validator},
    error::Result,
};

/// Read-only view of the consensus layer.
///
/// Implementations must distinguish a slot that verifiably has no block
/// ([`OracleError::SlotMissed`](crate::error::OracleError::SlotMissed))
/// from a node that cannot answer
/// ([`OracleError::NodeUnavailable`](crate::error::OracleError::NodeUnavailable));
/// the frame calculator walks past the former and retries the latter.
#[async_trait]
pub trait ChainReader: Send + Sync {
    /// The most recent finalized block.
    async fn finalized_blockstamp(&self) -> Result<BlockStamp>;

    /// Whether `slot` has a canonical block.
    async fn block_exists(&self, slot: SlotNumber) -> Result<bool>;

    /// Full blockstamp for the block at `slot`.
    ///
    /// Fails with `SlotMissed` when the slot has no block.
    async fn blockstamp_at(&self, slot: SlotNumber) -> Result<BlockStamp>;

    /// All validators in the state the given block commits to.
    async fn validators(&self, stamp: &BlockStamp) -> Result<Vec<Validator>>;

    /// Attestation outcomes for every active validator in `epoch`.
    ///
    /// Only meaningful for finalized epochs; callers must not ask about the
    /// unfinalized tip.
    async fn epoch_participation(&self, epoch: EpochNumber) -> Result<Vec<AttestationDuty>>;
}
