// Copyright (c) 2023-2026 Quorus Labs (quorus.dev)
// This file is part of the Quorus repository.

// You should have received a copy of the MIT License
// along with the Quorus repository. If not, see <https://mit-license.org/>.

//! Primitive chain-position types shared by every component.
//!
//! Slots, epochs and frame indices are distinct newtypes so that a frame
//! index can never be fed where a slot is expected; all three deref to `u64`
//! for arithmetic at the call site.

use std::fmt::{self, Display, Formatter};

use committable::{Commitment, Committable};
use ethereum_types::H256;
use serde::{Deserialize, Serialize};

/// A consensus-layer slot number.
#[derive(
    Copy, Clone, Debug, Default, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize,
)]
pub struct SlotNumber(u64);

impl SlotNumber {
    /// Create a new `SlotNumber` with the given value.
    #[must_use]
    pub fn new(n: u64) -> Self {
        Self(n)
    }

    /// The genesis slot (0).
    #[must_use]
    pub fn genesis() -> Self {
        Self(0)
    }

    /// The epoch this slot belongs to, given the chain's slots-per-epoch.
    #[must_use]
    pub fn epoch(self, slots_per_epoch: u64) -> EpochNumber {
        EpochNumber(self.0 / slots_per_epoch)
    }

    /// Saturating backward step, clamped at genesis.
    #[must_use]
    pub fn saturating_sub(self, rhs: u64) -> Self {
        Self(self.0.saturating_sub(rhs))
    }
}

impl std::ops::Deref for SlotNumber {
    type Target = u64;

    fn deref(&self) -> &Self::Target {
        &self.0
    }
}

impl std::ops::Add<u64> for SlotNumber {
    type Output = SlotNumber;

    fn add(self, rhs: u64) -> Self::Output {
        Self(self.0 + rhs)
    }
}

impl std::ops::Sub<u64> for SlotNumber {
    type Output = SlotNumber;

    fn sub(self, rhs: u64) -> Self::Output {
        Self(self.0 - rhs)
    }
}

impl Display for SlotNumber {
    fn fmt(&self, f: &mut Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.0)
    }
}

/// A consensus-layer epoch number.
#[derive(
    Copy, Clone, Debug, Default, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize,
)]
pub struct EpochNumber(u64);

impl EpochNumber {
    /// Create a new `EpochNumber` with the given value.
    #[must_use]
    pub fn new(n: u64) -> Self {
        Self(n)
    }

    /// First slot of this epoch.
    #[must_use]
    pub fn first_slot(self, slots_per_epoch: u64) -> SlotNumber {
        SlotNumber(self.0 * slots_per_epoch)
    }

    /// Last slot of this epoch.
    #[must_use]
    pub fn last_slot(self, slots_per_epoch: u64) -> SlotNumber {
        SlotNumber(self.0 * slots_per_epoch + slots_per_epoch - 1)
    }
}

impl std::ops::Deref for EpochNumber {
    type Target = u64;

    fn deref(&self) -> &Self::Target {
        &self.0
    }
}

impl std::ops::Add<u64> for EpochNumber {
    type Output = EpochNumber;

    fn add(self, rhs: u64) -> Self::Output {
        Self(self.0 + rhs)
    }
}

impl std::ops::Sub<u64> for EpochNumber {
    type Output = EpochNumber;

    fn sub(self, rhs: u64) -> Self::Output {
        Self(self.0 - rhs)
    }
}

impl Display for EpochNumber {
    fn fmt(&self, f: &mut Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.0)
    }
}

/// Ordinal index of a reporting frame, counted from the frame config's
/// initial epoch.
#[derive(
    Copy, Clone, Debug, Default, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize,
)]
pub struct FrameIndex(u64);

impl FrameIndex {
    /// Create a new `FrameIndex` with the given value.
    #[must_use]
    pub fn new(n: u64) -> Self {
        Self(n)
    }
}

impl std::ops::Deref for FrameIndex {
    type Target = u64;

    fn deref(&self) -> &Self::Target {
        &self.0
    }
}

impl Display for FrameIndex {
    fn fmt(&self, f: &mut Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.0)
    }
}

/// The 32-byte canonical hash of a report, as recorded on-chain.
#[derive(
    Copy, Clone, Debug, Default, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize,
)]
pub struct ReportHash(H256);

impl ReportHash {
    /// The all-zeroes hash the contract stores before a member has voted.
    pub const ZERO: ReportHash = ReportHash(H256([0_u8; 32]));

    /// Wrap a raw 32-byte digest.
    #[must_use]
    pub fn new(inner: H256) -> Self {
        Self(inner)
    }

    /// Bridge a local tagged commitment into the on-chain hash domain.
    #[must_use]
    pub fn from_commitment<T: Committable>(commitment: Commitment<T>) -> Self {
        Self(H256::from_slice(commitment.as_ref()))
    }

    /// Whether this is the contract's "no vote yet" sentinel.
    #[must_use]
    pub fn is_zero(&self) -> bool {
        self.0.is_zero()
    }

    /// The raw digest.
    #[must_use]
    pub fn as_h256(&self) -> H256 {
        self.0
    }
}

impl Display for ReportHash {
    fn fmt(&self, f: &mut Formatter<'_>) -> fmt::Result {
        write!(f, "{:#x}", self.0)
    }
}

/// A BLS12-381 validator public key, kept as raw bytes; the oracle never
/// verifies signatures, it only matches keys across providers.
#[derive(Clone, Debug, Default, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
pub struct BlsPubkey(pub Vec<u8>);

impl Display for BlsPubkey {
    fn fmt(&self, f: &mut Formatter<'_>) -> fmt::Result {
        write!(f, "0x")?;
        for byte in &self.0 {
            write!(f, "{byte:02x}")?;
        }
        Ok(())
    }
}

/// Lifecycle phase of a validator as reported by the consensus layer.
#[derive(Copy, Clone, Debug, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum ValidatorStatus {
    /// In the activation queue.
    Pending,
    /// Attesting.
    Active,
    /// Exit initiated but not yet withdrawable.
    Exiting,
    /// Exited or withdrawn.
    Exited,
}

/// One validator row from a consensus-layer state query.
#[derive(Clone, Debug, PartialEq, Eq, Serialize, Deserialize)]
pub struct Validator {
    /// Global validator index.
    pub index: u64,
    /// BLS public key.
    pub pubkey: BlsPubkey,
    /// Current balance, in Gwei.
    pub balance_gwei: u64,
    /// Effective balance, in Gwei.
    pub effective_balance_gwei: u64,
    /// Epoch the validator was activated, if any.
    pub activation_epoch: Option<EpochNumber>,
    /// Lifecycle phase.
    pub status: ValidatorStatus,
}

/// One validator's attestation outcome for a single epoch.
#[derive(Copy, Clone, Debug, PartialEq, Eq, Serialize, Deserialize)]
pub struct AttestationDuty {
    /// Global validator index.
    pub validator_index: u64,
    /// Whether the attestation was included on chain.
    pub included: bool,
}

/// A fully resolved pointer to one block: the consensus-layer roots plus the
/// execution-layer coordinates carried in its payload.
#[derive(Copy, Clone, Debug, PartialEq, Eq, Serialize, Deserialize)]
pub struct BlockStamp {
    /// Slot the block was proposed in.
    pub slot_number: SlotNumber,
    /// Consensus-layer block root.
    pub block_root: H256,
    /// Consensus-layer state root.
    pub state_root: H256,
    /// Execution-layer block number.
    pub block_number: u64,
    /// Execution-layer block hash.
    pub block_hash: H256,
}

/// A [`BlockStamp`] resolved for a frame's reference slot.
///
/// When the nominal reference slot was missed, `stamp` points at the nearest
/// preceding existing block while `ref_slot` keeps the frame's nominal value:
/// the report is tagged with the frame's slot, the data comes from the block
/// that actually exists.
#[derive(Copy, Clone, Debug, PartialEq, Eq, Serialize, Deserialize)]
pub struct ReferenceBlockStamp {
    /// The frame's nominal reference slot.
    pub ref_slot: SlotNumber,
    /// Epoch of the nominal reference slot.
    pub ref_epoch: EpochNumber,
    /// The resolved block.
    pub stamp: BlockStamp,
}

impl std::ops::Deref for ReferenceBlockStamp {
    type Target = BlockStamp;

    fn deref(&self) -> &Self::Target {
        &self.stamp
    }
}

/// Any type that is associated with a reference slot.
pub trait HasRefSlot {
    /// Returns the reference slot the type refers to.
    fn ref_slot(&self) -> SlotNumber;
}

impl HasRefSlot for ReferenceBlockStamp {
    fn ref_slot(&self) -> SlotNumber {
        self.ref_slot
    }
}

#[cfg(test)]
mod test {
    use super::*;

    #[test]
    fn slot_to_epoch_boundaries() {
        assert_eq!(SlotNumber::new(0).epoch(32), EpochNumber::new(0));
        assert_eq!(SlotNumber::new(31).epoch(32), EpochNumber::new(0));
        assert_eq!(SlotNumber::new(32).epoch(32), EpochNumber::new(1));
        assert_eq!(EpochNumber::new(2).first_slot(32), SlotNumber::new(64));
        assert_eq!(EpochNumber::new(2).last_slot(32), SlotNumber::new(95));
    }

    #[test]
    fn zero_hash_sentinel() {
        assert!(ReportHash::ZERO.is_zero());
        assert!(!ReportHash::new(H256::repeat_byte(1)).is_zero());
    }
}
