// Copyright (c) 2023-2026 Quorus Labs (quorus.dev)
// This file is part of the Quorus repository.

// You should have received a copy of the MIT License
// along with the Quorus repository. If not, see <https://mit-license.org/>.

//! The hash-consensus tracker.
//!
//! Given a fresh [`ConsensusSnapshot`] and this member's locally computed
//! report hash, decides where the frame stands and the single action this
//! member should take now. The tracker is a pure function of its inputs:
//! it is recomputed from scratch every cycle and keeps no transition
//! history that could desync from contract truth, which also makes it
//! naturally resilient to process restarts mid-frame.

use std::collections::HashMap;

use either::Either;
use ethereum_types::Address;
use quorus_types::{
    consensus::{
        CommitteeRoster, ConsensusSnapshot, FrameState, MemberInfo, OracleAction, ProcessingState,
    },
    data::{ReportHash, SlotNumber},
    error::{OracleError, Result},
    frame::Frame,
};
use tracing::{debug, warn};

/// Tally of submitted hashes for one frame.
///
/// Accumulates every member's vote and reports either "no consensus yet"
/// or the winning hash. A member is counted once; the contract already
/// enforces one submission per member, so a duplicate address in the
/// snapshot means the reader glitched and only the first occurrence counts.
pub struct HashTally {
    /// Vote count per distinct hash.
    outcomes: HashMap<ReportHash, u64>,
}

/// Tally result while no hash has reached quorum.
#[derive(Copy, Clone, Debug, PartialEq, Eq)]
pub struct NoQuorum {
    /// Vote count of the best-supported hash so far.
    pub leading_support: u64,
    /// Number of distinct hashes submitted.
    pub distinct_hashes: usize,
}

impl HashTally {
    /// Tally every submission in the snapshot.
    #[must_use]
    pub fn from_snapshot(snapshot: &ConsensusSnapshot) -> Self {
        let mut outcomes: HashMap<ReportHash, u64> = HashMap::new();
        let mut seen: Vec<Address> = Vec::with_capacity(snapshot.submissions.len());
        for (member, hash) in &snapshot.submissions {
            if hash.is_zero() {
                continue;
            }
            if seen.contains(member) {
                warn!(%member, "duplicate submission in consensus snapshot, ignoring");
                continue;
            }
            seen.push(*member);
            *outcomes.entry(*hash).or_insert(0) += 1;
        }
        Self { outcomes }
    }

    /// The winning hash, if any hash gathered at least `quorum` votes.
    ///
    /// When several distinct hashes each fall short of quorum this reports
    /// "no consensus yet" rather than guessing a winner.
    #[must_use]
    pub fn winner(&self, quorum: u64) -> Either<NoQuorum, ReportHash> {
        // Ties below quorum only report a count; at or above quorum the
        // hash ordering makes the pick deterministic across operators.
        let best = self
            .outcomes
            .iter()
            .max_by_key(|(hash, count)| (*count, *hash))
            .map(|(hash, count)| (*hash, *count));
        match best {
            Some((hash, count)) if count >= quorum => Either::Right(hash),
            Some((_, count)) => Either::Left(NoQuorum {
                leading_support: count,
                distinct_hashes: self.outcomes.len(),
            }),
            None => Either::Left(NoQuorum {
                leading_support: 0,
                distinct_hashes: 0,
            }),
        }
    }
}

/// Everything the tracker needs for one evaluation, all read fresh this
/// cycle.
pub struct TrackerContext<'a> {
    /// The frame under evaluation.
    pub frame: &'a Frame,
    /// Latest finalized slot, the tracker's notion of "now".
    pub now_slot: SlotNumber,
    /// This operator's address; `None` runs as a pure observer that never
    /// recommends a transaction.
    pub me: Option<Address>,
    /// This operator's contract-side view, when `me` is set.
    pub member_info: Option<&'a MemberInfo>,
    /// Hash of the locally built report.
    pub local_hash: ReportHash,
    /// All submitted hashes for the frame.
    pub snapshot: &'a ConsensusSnapshot,
    /// Report-delivery progress for the frame.
    pub processing: &'a ProcessingState,
    /// Ordered committee and quorum.
    pub roster: &'a CommitteeRoster,
    /// Slots past the reference slot the submitter holds back before
    /// sending the full report.
    pub submit_delay_slots: u64,
}

/// The tracker's verdict for one cycle.
#[derive(Copy, Clone, Debug, PartialEq, Eq)]
pub struct Resolution {
    /// Where the frame stands.
    pub state: FrameState,
    /// The one action recommended to the caller.
    pub action: OracleAction,
}

/// Evaluate the frame against fresh on-chain state.
///
/// Check order is load-bearing:
/// 1. a passed deadline closes the frame regardless of anything else;
/// 2. a formed quorum that disagrees with the local hash is a fatal
///    data-integrity alert, checked before any submission so a divergent
///    node never votes against a formed consensus;
/// 3. an absent or different on-chain hash for this member triggers (re-)
///    submission;
/// 4. only then do report and extra-data delivery come into play, and only
///    for the rotation submitter once the stagger delay has elapsed.
///
/// # Errors
///
/// [`OracleError::NotInCommittee`] if the configured address is not on the
/// roster, [`OracleError::InconsistentChainState`] if the snapshot is for a
/// different reference slot than the frame or the contract claims this
/// member already reported past it, and [`OracleError::HashMismatch`] on
/// quorum disagreement. The first two abort the cycle; the mismatch
/// terminates the process.
pub fn evaluate(ctx: &TrackerContext<'_>) -> Result<Resolution> {
    if ctx.snapshot.ref_slot != ctx.frame.ref_slot {
        return Err(OracleError::InconsistentChainState(format!(
            "consensus snapshot is for ref slot {} but the frame is at {}",
            ctx.snapshot.ref_slot, ctx.frame.ref_slot
        )));
    }

    if ctx.now_slot > ctx.frame.report_processing_deadline_slot {
        debug!(ref_slot = %ctx.frame.ref_slot, "frame deadline passed, no further actions");
        return Ok(Resolution {
            state: FrameState::Closed,
            action: OracleAction::Noop,
        });
    }

    if let Some(me) = ctx.me {
        let is_member = ctx.member_info.is_some_and(|info| info.is_member);
        if !is_member || !ctx.roster.contains(me) {
            return Err(OracleError::NotInCommittee(me));
        }
    }
    if let Some(info) = ctx.member_info {
        if info.last_report_ref_slot > ctx.frame.ref_slot {
            // The contract claims we already reported past this frame.
            return Err(OracleError::InconsistentChainState(format!(
                "member already reported for ref slot {}, the frame is at {}",
                info.last_report_ref_slot, ctx.frame.ref_slot
            )));
        }
    }

    let tally = HashTally::from_snapshot(ctx.snapshot);
    let outcome = tally.winner(ctx.roster.quorum().get());

    if let Either::Right(winner) = outcome {
        if winner != ctx.local_hash {
            return Err(OracleError::HashMismatch {
                ref_slot: ctx.frame.ref_slot,
                local: ctx.local_hash,
                quorum: winner,
            });
        }
    }

    if let Some(me) = ctx.me {
        // Prefer the contract's member view; the snapshot covers members the
        // reader may have filtered.
        let on_chain = ctx
            .member_info
            .and_then(|info| info.current_frame_member_hash)
            .or_else(|| ctx.snapshot.hash_for(me));
        if on_chain != Some(ctx.local_hash) {
            // Covers both a fresh frame and a recomputation that diverged
            // from our own earlier vote.
            return Ok(Resolution {
                state: FrameState::Collecting,
                action: OracleAction::SubmitHash(ctx.local_hash),
            });
        }
    }

    match outcome {
        Either::Left(no_quorum) => {
            debug!(
                leading = no_quorum.leading_support,
                distinct = no_quorum.distinct_hashes,
                quorum = ctx.roster.quorum().get(),
                "no consensus yet"
            );
            Ok(Resolution {
                state: FrameState::HashSubmitted,
                action: OracleAction::Wait,
            })
        }
        Either::Right(_winner) => {
            let duty = ctx
                .me
                .is_some_and(|me| ctx.roster.submitter(ctx.frame.index) == Some(me));

            if !ctx.processing.main_data_submitted {
                let delay_elapsed =
                    ctx.now_slot >= ctx.frame.ref_slot + ctx.submit_delay_slots;
                let action = if duty && delay_elapsed {
                    OracleAction::SubmitReport
                } else {
                    OracleAction::Wait
                };
                return Ok(Resolution {
                    state: FrameState::QuorumReached,
                    action,
                });
            }

            if ctx.processing.extra_data_pending() {
                let action = if duty {
                    OracleAction::SubmitExtraData {
                        next_chunk: ctx.processing.extra_data_items_submitted,
                    }
                } else {
                    OracleAction::Wait
                };
                return Ok(Resolution {
                    state: FrameState::ReportSubmitted,
                    action,
                });
            }

            Ok(Resolution {
                state: FrameState::ExtraDataSubmitted,
                action: OracleAction::Noop,
            })
        }
    }
}
