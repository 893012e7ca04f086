// Copyright (c) 2023-2026 Quorus Labs (quorus.dev)
// This file is part of the Quorus repository.

// You should have received a copy of the MIT License
// along with the Quorus repository. If not, see <https://mit-license.org/>.

//! Read side of the on-chain hash-consensus contract.

use async_trait::async_trait;
use ethereum_types::Address;

use crate::{
    consensus::{CommitteeRoster, ConsensusSnapshot, MemberInfo, ProcessingState},
    data::SlotNumber,
    error::Result,
    frame::{ChainConfig, FrameConfig},
};

/// Read-only view of the consensus and report contracts.
///
/// The contract is the only shared mutable resource between operators, and
/// this process never assumes exclusive access to it: every value here is
/// re-read each cycle before any write decision is made.
#[async_trait]
pub trait ConsensusContract: Send + Sync {
    /// Chain timing parameters the contract was deployed with.
    async fn chain_config(&self) -> Result<ChainConfig>;

    /// Frame-length parameters currently in force.
    async fn frame_config(&self) -> Result<FrameConfig>;

    /// The ordered committee and quorum threshold.
    async fn member_roster(&self) -> Result<CommitteeRoster>;

    /// All submitted hashes for the frame at `ref_slot`.
    async fn consensus_snapshot(&self, ref_slot: SlotNumber) -> Result<ConsensusSnapshot>;

    /// The contract's view of one member at `ref_slot`.
    async fn member_info(&self, member: Address, ref_slot: SlotNumber) -> Result<MemberInfo>;

    /// Report-delivery progress for the frame at `ref_slot`.
    async fn processing_state(&self, ref_slot: SlotNumber) -> Result<ProcessingState>;
}
