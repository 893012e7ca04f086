// Copyright (c) 2023-2026 Quorus Labs (quorus.dev)
// This file is part of the Quorus repository.

// You should have received a copy of the MIT License
// along with the Quorus repository. If not, see <https://mit-license.org/>.

//! The effectful half of frame calculation: clamping to finality and
//! resolving missed reference slots against the consensus layer.

use std::{num::NonZeroUsize, sync::Arc};

use lru::LruCache;
use quorus_types::{
    data::{BlockStamp, ReferenceBlockStamp, SlotNumber},
    error::{OracleError, Result},
    frame::{ChainConfig, Frame, FrameConfig},
    traits::chain_reader::ChainReader,
};
use tokio::sync::Mutex;
use tracing::{debug, info, warn};

/// Resolved reference blockstamps are immutable once their slot is
/// finalized, so a single cached entry covers the whole frame.
const RESOLVED_STAMP_CACHE_SIZE: NonZeroUsize = NonZeroUsize::MIN;

/// Whether a frame can be reported on right now.
#[derive(Copy, Clone, Debug, PartialEq, Eq)]
pub enum FrameStatus {
    /// The reference slot is finalized and resolved to an existing block.
    Reportable(ReferenceBlockStamp),
    /// The reference slot is not finalized yet; try again next cycle.
    AwaitingFinality,
    /// The processing deadline has passed; the frame is dead and is never
    /// retried.
    DeadlinePassed,
}

/// Computes the current frame and resolves its reference blockstamp.
pub struct FrameCalculator {
    /// Consensus-layer reader.
    chain: Arc<dyn ChainReader>,
    /// Memoized walk-back results, keyed by nominal reference slot.
    resolved: Mutex<LruCache<SlotNumber, ReferenceBlockStamp>>,
}

impl FrameCalculator {
    /// Create a calculator over the given reader.
    #[must_use]
    pub fn new(chain: Arc<dyn ChainReader>) -> Self {
        Self {
            chain,
            resolved: Mutex::new(LruCache::new(RESOLVED_STAMP_CACHE_SIZE)),
        }
    }

    /// The frame open at the latest finalized slot.
    ///
    /// Using the finalized slot rather than wall-clock time keeps the frame
    /// index monotone across cycles and identical for every operator
    /// observing the same finalized checkpoint.
    ///
    /// # Errors
    ///
    /// Propagates [`OracleError::ChainNotReady`] from the pure frame math
    /// while the chain has not reached the initial frame epoch.
    pub fn current_frame(
        &self,
        finalized: &BlockStamp,
        chain_config: &ChainConfig,
        frame_config: &FrameConfig,
    ) -> Result<Frame> {
        Frame::at_slot(finalized.slot_number, chain_config, frame_config)
    }

    /// Clamp `frame` against finality and resolve its reference blockstamp.
    ///
    /// When the nominal reference slot's block is missing, walks backward
    /// slot by slot to the nearest existing block, bounded by one frame
    /// length. Different consensus clients may disagree on "missed" only
    /// transiently, so the walk always re-derives from finalized state.
    ///
    /// # Errors
    ///
    /// Returns [`OracleError::NoSlotsAvailable`] if every slot in the
    /// walk-back window is missed, which contradicts the finalized
    /// checkpoint we just observed.
    pub async fn resolve(
        &self,
        frame: &Frame,
        finalized: &BlockStamp,
        chain_config: &ChainConfig,
        frame_config: &FrameConfig,
    ) -> Result<FrameStatus> {
        if frame.ref_slot > finalized.slot_number {
            debug!(ref_slot = %frame.ref_slot, "reference slot is not finalized yet");
            return Ok(FrameStatus::AwaitingFinality);
        }
        if finalized.slot_number > frame.report_processing_deadline_slot {
            return Ok(FrameStatus::DeadlinePassed);
        }

        if let Some(stamp) = self.resolved.lock().await.get(&frame.ref_slot) {
            return Ok(FrameStatus::Reportable(*stamp));
        }

        let stamp = self
            .walk_back(frame.ref_slot, frame_config.epochs_per_frame * chain_config.slots_per_epoch)
            .await?;
        let resolved = ReferenceBlockStamp {
            ref_slot: frame.ref_slot,
            ref_epoch: frame.ref_epoch(chain_config),
            stamp,
        };
        if resolved.stamp.slot_number != frame.ref_slot {
            info!(
                ref_slot = %frame.ref_slot,
                resolved_slot = %resolved.stamp.slot_number,
                "reference slot was missed, resolved to nearest preceding block"
            );
        }
        self.resolved.lock().await.put(frame.ref_slot, resolved);
        Ok(FrameStatus::Reportable(resolved))
    }

    /// Find the nearest existing block at or before `slot`, looking back at
    /// most `window` slots.
    async fn walk_back(&self, slot: SlotNumber, window: u64) -> Result<BlockStamp> {
        let floor = slot.saturating_sub(window);
        let mut candidate = slot;
        loop {
            if self.chain.block_exists(candidate).await? {
                return self.chain.blockstamp_at(candidate).await;
            }
            warn!(slot = %candidate, "missed slot, checking the previous one");
            if candidate <= floor || *candidate == 0 {
                return Err(OracleError::NoSlotsAvailable(slot));
            }
            candidate = candidate - 1;
        }
    }
}
