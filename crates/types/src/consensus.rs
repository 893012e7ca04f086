// Copyright (c) 2023-2026 Quorus Labs (quorus.dev)
// This file is part of the Quorus repository.

// You should have received a copy of the MIT License
// along with the Quorus repository. If not, see <https://mit-license.org/>.

//! Data model of the on-chain hash-consensus protocol.
//!
//! Everything here is a value read wholesale from the contract each cycle
//! and replaced, never patched in place: the tracker must never act on a
//! partially refreshed view.

use std::num::NonZeroU64;

use ethereum_types::Address;
use serde::{Deserialize, Serialize};

use crate::data::{FrameIndex, HasRefSlot, ReportHash, SlotNumber};

/// The set of `(member, submitted hash)` pairs the contract records for one
/// frame, plus the quorum threshold in force when it was read.
#[derive(Clone, Debug, PartialEq, Eq, Serialize, Deserialize)]
pub struct ConsensusSnapshot {
    /// Reference slot the snapshot was read for.
    pub ref_slot: SlotNumber,
    /// Minimum count of matching hashes that finalizes consensus.
    pub quorum: NonZeroU64,
    /// Submitted hashes, at most one per member. Members that have not
    /// voted are absent (the contract's zero-hash sentinel is filtered out
    /// by the reader).
    pub submissions: Vec<(Address, ReportHash)>,
}

impl ConsensusSnapshot {
    /// The hash `member` submitted for this frame, if any.
    #[must_use]
    pub fn hash_for(&self, member: Address) -> Option<ReportHash> {
        self.submissions
            .iter()
            .find(|(addr, _)| *addr == member)
            .map(|(_, hash)| *hash)
    }

    /// Number of members that submitted exactly `hash`.
    #[must_use]
    pub fn support_for(&self, hash: ReportHash) -> u64 {
        self.submissions
            .iter()
            .filter(|(_, submitted)| *submitted == hash)
            .count() as u64
    }
}

impl HasRefSlot for ConsensusSnapshot {
    fn ref_slot(&self) -> SlotNumber {
        self.ref_slot
    }
}

/// Report-delivery progress the report contract records for one frame.
#[derive(Copy, Clone, Debug, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct ProcessingState {
    /// Reference slot this state describes.
    pub ref_slot: SlotNumber,
    /// Whether the full report data has been submitted by any member.
    pub main_data_submitted: bool,
    /// Number of extra-data chunks the submitted report declared.
    pub extra_data_items_count: u64,
    /// Number of extra-data chunks already processed on-chain.
    pub extra_data_items_submitted: u64,
}

impl ProcessingState {
    /// Whether extra data chunks remain to be delivered.
    #[must_use]
    pub fn extra_data_pending(&self) -> bool {
        self.main_data_submitted && self.extra_data_items_submitted < self.extra_data_items_count
    }

    /// Whether everything the frame requires has landed on-chain.
    #[must_use]
    pub fn fully_processed(&self) -> bool {
        self.main_data_submitted && self.extra_data_items_submitted >= self.extra_data_items_count
    }
}

/// The contract's view of one oracle committee member.
#[derive(Copy, Clone, Debug, PartialEq, Eq, Serialize, Deserialize)]
pub struct MemberInfo {
    /// Whether the address is on the committee roster.
    pub is_member: bool,
    /// The last reference slot this member submitted a report hash for.
    pub last_report_ref_slot: SlotNumber,
    /// The hash this member submitted for the current frame, if any.
    pub current_frame_member_hash: Option<ReportHash>,
}

/// The ordered oracle committee and its quorum threshold.
///
/// The ordering is the contract's submission order and drives the
/// report-submitter rotation; it must be identical across operators.
#[derive(Clone, Debug, PartialEq, Eq, Serialize, Deserialize)]
pub struct CommitteeRoster {
    /// Members in contract submission order.
    members: Vec<Address>,
    /// Minimum count of matching hashes that finalizes consensus.
    quorum: NonZeroU64,
}

impl CommitteeRoster {
    /// Create a roster from the contract's ordered member list.
    #[must_use]
    pub fn new(members: Vec<Address>, quorum: NonZeroU64) -> Self {
        Self { members, quorum }
    }

    /// Members in submission order.
    #[must_use]
    pub fn members(&self) -> &[Address] {
        &self.members
    }

    /// The quorum threshold.
    #[must_use]
    pub fn quorum(&self) -> NonZeroU64 {
        self.quorum
    }

    /// Whether `address` is on the roster.
    #[must_use]
    pub fn contains(&self, address: Address) -> bool {
        self.members.contains(&address)
    }

    /// Number of members.
    #[must_use]
    pub fn len(&self) -> usize {
        self.members.len()
    }

    /// Whether the roster is empty.
    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.members.is_empty()
    }

    /// The member whose turn it is to submit the full report for `frame`.
    ///
    /// Index the ordered roster with the frame index so the duty rotates
    /// one member per frame.
    #[must_use]
    pub fn submitter(&self, frame: FrameIndex) -> Option<Address> {
        if self.members.is_empty() {
            return None;
        }
        let index = (*frame % self.members.len() as u64) as usize;
        Some(self.members[index])
    }
}

/// Where in its lifecycle the current frame stands, as assessed from fresh
/// on-chain reads. Recomputed from scratch every cycle; the tracker keeps no
/// transition history that could desync from contract truth.
#[derive(Copy, Clone, Debug, PartialEq, Eq, Serialize, Deserialize)]
pub enum FrameState {
    /// Member hashes are being collected and ours is not on-chain yet.
    Collecting,
    /// Our hash is on-chain; quorum has not formed.
    HashSubmitted,
    /// A quorum of matching hashes exists; the full report is not on-chain.
    QuorumReached,
    /// The full report is on-chain; extra data is still outstanding.
    ReportSubmitted,
    /// Report and all extra data delivered.
    ExtraDataSubmitted,
    /// Deadline passed; the frame takes no further actions.
    Closed,
}

/// The single action the tracker recommends for this cycle.
///
/// At most one transaction is sent per cycle; the next cycle's fresh reads
/// pick up whatever landed.
#[derive(Copy, Clone, Debug, PartialEq, Eq)]
pub enum OracleAction {
    /// Frame is closed or fully delivered; nothing to do.
    Noop,
    /// Waiting on other members or on the submission-delay window.
    Wait,
    /// Submit our report hash.
    SubmitHash(ReportHash),
    /// Submit the full report data (we are the rotation submitter).
    SubmitReport,
    /// Submit the next extra-data chunk.
    SubmitExtraData {
        /// Index of the first chunk not yet processed on-chain.
        next_chunk: u64,
    },
}

impl OracleAction {
    /// Whether dispatching this action sends a transaction.
    #[must_use]
    pub fn sends_transaction(&self) -> bool {
        !matches!(self, Self::Noop | Self::Wait)
    }
}

#[cfg(test)]
mod test {
    use super::*;

    fn addr(n: u8) -> Address {
        Address::repeat_byte(n)
    }

    fn quorum(n: u64) -> NonZeroU64 {
        NonZeroU64::new(n).unwrap()
    }

    #[test]
    fn snapshot_lookup_and_support() {
        let h1 = ReportHash::new(ethereum_types::H256::repeat_byte(0xab));
        let h2 = ReportHash::new(ethereum_types::H256::repeat_byte(0xcd));
        let snapshot = ConsensusSnapshot {
            ref_slot: SlotNumber::new(1000),
            quorum: quorum(3),
            submissions: vec![(addr(1), h1), (addr(2), h1), (addr(3), h2)],
        };
        assert_eq!(snapshot.hash_for(addr(2)), Some(h1));
        assert_eq!(snapshot.hash_for(addr(9)), None);
        assert_eq!(snapshot.support_for(h1), 2);
        assert_eq!(snapshot.support_for(h2), 1);
    }

    #[test]
    fn rotation_visits_every_member_once_per_lap() {
        let members: Vec<Address> = (1..=5).map(addr).collect();
        let roster = CommitteeRoster::new(members.clone(), quorum(3));
        let mut seen = Vec::new();
        for i in 0..5 {
            seen.push(roster.submitter(FrameIndex::new(i)).unwrap());
        }
        seen.sort();
        let mut expected = members;
        expected.sort();
        assert_eq!(seen, expected);
        // The rotation wraps.
        assert_eq!(
            roster.submitter(FrameIndex::new(0)),
            roster.submitter(FrameIndex::new(5))
        );
    }

    #[test]
    fn empty_roster_has_no_submitter() {
        let roster = CommitteeRoster::new(Vec::new(), quorum(1));
        assert_eq!(roster.submitter(FrameIndex::new(3)), None);
    }

    #[test]
    fn processing_state_progress() {
        let mut state = ProcessingState {
            ref_slot: SlotNumber::new(999),
            main_data_submitted: false,
            extra_data_items_count: 2,
            extra_data_items_submitted: 0,
        };
        assert!(!state.extra_data_pending());
        assert!(!state.fully_processed());

        state.main_data_submitted = true;
        assert!(state.extra_data_pending());

        state.extra_data_items_submitted = 2;
        assert!(state.fully_processed());
    }
}
