// Copyright (c) 2023-2026 Quorus Labs (quorus.dev)
// This file is part of the Quorus repository.

// You should have received a copy of the MIT License
// along with the Quorus repository. If not, see <https://mit-license.org/>.

//! Pure frame arithmetic.
//!
//! A frame is a fixed run of epochs. Frame `i` covers epochs
//! `[initial_epoch + i * epochs_per_frame, initial_epoch + (i + 1) * epochs_per_frame)`;
//! its reference slot is the slot right before the frame's first epoch, so
//! the reported state is always strictly in the frame's past and can be
//! finalized while the frame is still open. The deadline for processing a
//! frame's report is the next frame's reference slot.
//!
//! Everything here is a total function of its arguments: clamping to
//! finalized state and missed-slot resolution live with the effectful frame
//! calculator in the oracle crate.

use serde::{Deserialize, Serialize};

use crate::{
    data::{EpochNumber, FrameIndex, SlotNumber},
    error::OracleError,
};

/// Timing parameters of the observed chain, read from the consensus
/// contract at startup and on every cycle.
#[derive(Copy, Clone, Debug, PartialEq, Eq, Serialize, Deserialize)]
pub struct ChainConfig {
    /// Slots per epoch.
    pub slots_per_epoch: u64,
    /// Seconds per slot.
    pub seconds_per_slot: u64,
    /// Unix timestamp of slot 0.
    pub genesis_time: u64,
}

/// Frame-length parameters, read from the consensus contract.
#[derive(Copy, Clone, Debug, PartialEq, Eq, Serialize, Deserialize)]
pub struct FrameConfig {
    /// Epoch the zeroth frame starts at.
    pub initial_epoch: EpochNumber,
    /// Frame length in epochs.
    pub epochs_per_frame: u64,
}

/// One reporting period.
///
/// Never mutated: recomputed fresh from the chain head and the contract
/// configuration on every poll cycle.
#[derive(Copy, Clone, Debug, PartialEq, Eq, Serialize, Deserialize)]
pub struct Frame {
    /// Ordinal index since the initial epoch.
    pub index: FrameIndex,
    /// The finalized slot whose state this frame reports on.
    pub ref_slot: SlotNumber,
    /// Last slot at which the frame's report may still be processed.
    pub report_processing_deadline_slot: SlotNumber,
}

impl Frame {
    /// The frame that is open at `now_slot`.
    ///
    /// # Errors
    ///
    /// Returns [`OracleError::ChainNotReady`] while the chain has not yet
    /// reached the frame config's initial epoch.
    pub fn at_slot(
        now_slot: SlotNumber,
        chain: &ChainConfig,
        frame: &FrameConfig,
    ) -> Result<Self, OracleError> {
        if frame.epochs_per_frame == 0 {
            return Err(OracleError::Config(
                "frame config has zero epochs per frame".to_string(),
            ));
        }
        if *frame.initial_epoch == 0 {
            // Frame 0's reference slot would precede genesis.
            return Err(OracleError::Config(
                "frame config initial epoch must be at least 1".to_string(),
            ));
        }
        let now_epoch = now_slot.epoch(chain.slots_per_epoch);
        if now_epoch < frame.initial_epoch {
            return Err(OracleError::ChainNotReady(format!(
                "epoch {now_epoch} is before the initial frame epoch {}",
                frame.initial_epoch
            )));
        }

        let index = (*now_epoch - *frame.initial_epoch) / frame.epochs_per_frame;
        let start_epoch = frame.initial_epoch + index * frame.epochs_per_frame;
        let ref_slot = start_epoch.first_slot(chain.slots_per_epoch) - 1;
        let frame_len_slots = frame.epochs_per_frame * chain.slots_per_epoch;

        Ok(Self {
            index: FrameIndex::new(index),
            ref_slot,
            report_processing_deadline_slot: ref_slot + frame_len_slots,
        })
    }

    /// Epoch of this frame's reference slot.
    #[must_use]
    pub fn ref_epoch(&self, chain: &ChainConfig) -> EpochNumber {
        self.ref_slot.epoch(chain.slots_per_epoch)
    }
}
