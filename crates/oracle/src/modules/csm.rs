// Copyright (c) 2023-2026 Quorus Labs (quorus.dev)
// This file is part of the Quorus repository.

// You should have received a copy of the MIT License
// along with the Quorus repository. If not, see <https://mit-license.org/>.

//! The community-staking module: per-operator attestation performance over
//! the frame's epochs.
//!
//! The only module with real history to crunch: one participation query
//! per epoch of the frame. Fetches run through a bounded worker pool and
//! partial per-epoch aggregates are checkpointed into the report cache, so
//! a restart mid-frame resumes instead of refetching everything.

use std::collections::{BTreeMap, BTreeSet};

use async_trait::async_trait;
use bincode::Options;
use committable::{Commitment, Committable, RawCommitmentBuilder};
use futures::{stream, StreamExt};
use quorus_types::{
    data::{EpochNumber, FrameIndex, HasRefSlot, ReferenceBlockStamp, ReportHash, SlotNumber},
    error::{OracleError, Result},
    frame::FrameConfig,
    traits::report::{BuildContext, ExtraDataChunk, ModuleKind, OracleReport, ReportModule},
};
use quorus_utils::bincode::bincode_opts;
use serde::{Deserialize, Serialize};
use tracing::{debug, info, warn};

use super::operator_keys_by_pubkey;

/// Report semantics version understood by the current contract.
const CONSENSUS_VERSION: u64 = 1;

/// Bumped whenever the checkpoint layout changes shape.
const CHECKPOINT_SCHEMA_VERSION: u32 = 1;

/// One operator's share of the frame's performance distribution.
#[derive(Copy, Clone, Debug, PartialEq, Eq, Serialize, Deserialize)]
pub struct DistributionShare {
    /// Node-operator id.
    pub operator_id: u64,
    /// Included attestations credited to the operator.
    pub shares: u64,
}

/// The performance report for one frame.
#[derive(Clone, Debug, PartialEq, Eq, Serialize, Deserialize)]
pub struct CsmReport {
    /// Report semantics version.
    pub consensus_version: u64,
    /// Frame reference slot the report is tagged with.
    pub ref_slot: SlotNumber,
    /// Commitment over the distribution entries.
    pub tree_root: ReportHash,
    /// Per-operator shares, ordered by operator id.
    pub distribution: Vec<DistributionShare>,
}

impl Committable for CsmReport {
    fn commit(&self) -> Commitment<Self> {
        RawCommitmentBuilder::new("CSM report")
            .u64_field("consensus version", self.consensus_version)
            .u64_field("ref slot", *self.ref_slot)
            .var_size_field("tree root", self.tree_root.as_h256().as_bytes())
            .finalize()
    }
}

impl HasRefSlot for CsmReport {
    fn ref_slot(&self) -> SlotNumber {
        self.ref_slot
    }
}

impl OracleReport for CsmReport {
    fn extra_data(&self) -> Vec<ExtraDataChunk> {
        Vec::new()
    }
}

/// Commitment over the ordered distribution entries.
fn distribution_root(distribution: &[DistributionShare]) -> ReportHash {
    let mut builder = RawCommitmentBuilder::<CsmReport>::new("CSM distribution")
        .u64_field("count", distribution.len() as u64);
    for share in distribution {
        builder = builder
            .u64_field("operator", share.operator_id)
            .u64_field("shares", share.shares);
    }
    ReportHash::from_commitment(builder.finalize())
}

/// Persisted partial aggregates for one frame.
#[derive(Clone, Debug, Default, PartialEq, Eq, Serialize, Deserialize)]
struct Checkpoint {
    /// Checkpoint layout version.
    schema_version: u32,
    /// Epochs already folded into the counters.
    processed: BTreeSet<u64>,
    /// Included attestations per validator index.
    included: BTreeMap<u64, u64>,
}

impl Checkpoint {
    /// Decode a cache payload, discarding anything with the wrong schema.
    fn decode(payload: &[u8]) -> Option<Self> {
        let checkpoint: Checkpoint = bincode_opts().deserialize(payload).ok()?;
        (checkpoint.schema_version == CHECKPOINT_SCHEMA_VERSION).then_some(checkpoint)
    }

    /// Canonical cache payload.
    fn encode(&self) -> Result<Vec<u8>> {
        bincode_opts()
            .serialize(self)
            .map_err(|err| OracleError::FailedToSerialize(err.to_string()))
    }
}

/// Report builder for the community staking oracle.
pub struct CsmModule {
    /// Staking module id queried from the keys API.
    staking_module_id: u64,
}

impl CsmModule {
    /// Create a builder for one staking module.
    #[must_use]
    pub fn new(staking_module_id: u64) -> Self {
        Self { staking_module_id }
    }
}

impl Default for CsmModule {
    fn default() -> Self {
        Self::new(3)
    }
}

/// Frame index the given reference epoch belongs to.
///
/// The reference slot is the last slot before the frame's first epoch, so
/// the frame starts at `ref_epoch + 1`.
fn frame_index_of(ref_epoch: EpochNumber, frame_config: &FrameConfig) -> FrameIndex {
    let start_epoch = *ref_epoch + 1;
    FrameIndex::new(
        start_epoch.saturating_sub(*frame_config.initial_epoch) / frame_config.epochs_per_frame,
    )
}

#[async_trait]
impl ReportModule for CsmModule {
    type Report = CsmReport;

    fn kind(&self) -> ModuleKind {
        ModuleKind::Csm
    }

    fn consensus_version(&self) -> u64 {
        CONSENSUS_VERSION
    }

    async fn build_report(
        &self,
        stamp: &ReferenceBlockStamp,
        ctx: &BuildContext<'_>,
    ) -> Result<Self::Report> {
        let frame_id = frame_index_of(stamp.ref_epoch, ctx.frame_config);
        let first_epoch = EpochNumber::new(
            (*stamp.ref_epoch).saturating_sub(ctx.frame_config.epochs_per_frame.saturating_sub(1)),
        );
        let epochs: Vec<u64> = (*first_epoch..=*stamp.ref_epoch).collect();

        let mut checkpoint = ctx
            .cache
            .load(self.consensus_version(), frame_id)?
            .and_then(|payload| {
                let decoded = Checkpoint::decode(&payload);
                if decoded.is_none() {
                    warn!("stale or undecodable checkpoint, starting fresh");
                }
                decoded
            })
            .unwrap_or(Checkpoint {
                schema_version: CHECKPOINT_SCHEMA_VERSION,
                ..Checkpoint::default()
            });

        let pending: Vec<u64> = epochs
            .iter()
            .copied()
            .filter(|epoch| !checkpoint.processed.contains(epoch))
            .collect();
        info!(
            frame = %frame_id,
            total_epochs = epochs.len(),
            pending_epochs = pending.len(),
            "collecting attestation performance"
        );

        // Bounded worker pool; results are folded additively, so the
        // completion order inside a batch cannot affect the outcome.
        let concurrency = ctx.config.csm_max_concurrency.get();
        for batch in pending.chunks(concurrency) {
            let mut results = stream::iter(batch.iter().copied())
                .map(|epoch| async move {
                    let duties = ctx.chain.epoch_participation(EpochNumber::new(epoch)).await;
                    (epoch, duties)
                })
                .buffer_unordered(concurrency);
            while let Some((epoch, duties)) = results.next().await {
                let duties = duties?;
                for duty in duties {
                    if duty.included {
                        *checkpoint.included.entry(duty.validator_index).or_insert(0) += 1;
                    }
                }
                checkpoint.processed.insert(epoch);
            }
            debug!(processed = checkpoint.processed.len(), "checkpoint batch done");
            ctx.cache
                .store(self.consensus_version(), frame_id, &checkpoint.encode()?)?;
        }

        let validators = ctx.chain.validators(stamp).await?;
        let operator_of = operator_keys_by_pubkey(ctx.keys, self.staking_module_id).await?;
        let operator_by_index: BTreeMap<u64, u64> = validators
            .iter()
            .filter_map(|validator| {
                operator_of
                    .get(&validator.pubkey.0)
                    .map(|operator| (validator.index, *operator))
            })
            .collect();

        let mut shares: BTreeMap<u64, u64> = BTreeMap::new();
        for (validator_index, included) in &checkpoint.included {
            if let Some(operator) = operator_by_index.get(validator_index) {
                *shares.entry(*operator).or_insert(0) += *included;
            }
        }
        let distribution: Vec<DistributionShare> = shares
            .into_iter()
            .map(|(operator_id, shares)| DistributionShare {
                operator_id,
                shares,
            })
            .collect();

        Ok(CsmReport {
            consensus_version: CONSENSUS_VERSION,
            ref_slot: stamp.ref_slot,
            tree_root: distribution_root(&distribution),
            distribution,
        })
    }
}
