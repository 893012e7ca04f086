// Copyright (c) 2023-2026 Quorus Labs (quorus.dev)
// This file is part of the Quorus repository.

// You should have received a copy of the MIT License
// along with the Quorus repository. If not, see <https://mit-license.org/>.

//! Write side of the oracle protocol.

use async_trait::async_trait;

use crate::{
    data::{ReportHash, SlotNumber},
    error::Result,
    traits::report::ExtraDataChunk,
};

/// Submits oracle transactions on this member's behalf.
///
/// Signing, nonce management and gas pricing are the implementation's
/// concern. Callers never assume a returned `Ok` means the transaction is
/// final: the next cycle's contract reads are the only source of truth, so
/// sends are not retried within a cycle.
#[async_trait]
pub trait TransactionSender: Send + Sync {
    /// Submit this member's report hash for the frame at `ref_slot`.
    async fn submit_report_hash(&self, ref_slot: SlotNumber, hash: ReportHash) -> Result<()>;

    /// Submit the full canonical report payload.
    async fn submit_report(&self, ref_slot: SlotNumber, payload: Vec<u8>) -> Result<()>;

    /// Submit one extra-data chunk.
    async fn submit_extra_data_chunk(
        &self,
        ref_slot: SlotNumber,
        chunk: &ExtraDataChunk,
    ) -> Result<()>;
}
