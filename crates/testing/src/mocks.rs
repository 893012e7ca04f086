// Copyright (c) 2023-2026 Quorus Labs (quorus.dev)
// This file is part of the Quorus repository.

// You should have received a copy of the MIT License
// along with the Quorus repository. If not, see <https://mit-license.org/>.

//! Scripted in-memory collaborators.
//!
//! Each mock holds its state behind a `std::sync::Mutex` and never awaits
//! while locked. Tests mutate the state between cycles to script the
//! behavior of the chain, the contract and the other oracle operators.

use std::{
    collections::{BTreeMap, BTreeSet},
    sync::{
        atomic::{AtomicU64, Ordering},
        Arc, Mutex,
    },
    time::Duration,
};

use async_trait::async_trait;
use ethereum_types::{Address, H256};
use quorus_types::{
    consensus::{CommitteeRoster, ConsensusSnapshot, MemberInfo, ProcessingState},
    data::{AttestationDuty, BlockStamp, EpochNumber, ReportHash, SlotNumber, Validator},
    error::{OracleError, Result},
    frame::{ChainConfig, FrameConfig},
    traits::{
        chain_reader::ChainReader,
        consensus_contract::ConsensusContract,
        keys_api::{KeysApi, OperatorKey},
        report::ExtraDataChunk,
        tx_sender::TransactionSender,
    },
};

/// Deterministic blockstamp for a slot.
#[must_use]
pub fn stamp_for_slot(slot: u64) -> BlockStamp {
    BlockStamp {
        slot_number: SlotNumber::new(slot),
        block_root: H256::from_low_u64_be(slot),
        state_root: H256::from_low_u64_be(slot + 1_000_000),
        block_number: slot,
        block_hash: H256::from_low_u64_be(slot + 2_000_000),
    }
}

/// Mutable script of the fake consensus layer.
#[derive(Default)]
struct ChainScript {
    /// Latest finalized slot.
    finalized: u64,
    /// Slots with no block.
    missed: BTreeSet<u64>,
    /// The validator set at every state.
    validators: Vec<Validator>,
    /// Attestation outcomes per epoch.
    participation: BTreeMap<u64, Vec<AttestationDuty>>,
    /// Artificial latency before answering the finalized query.
    finalized_delay: Option<Duration>,
}

/// Scripted [`ChainReader`].
#[derive(Default)]
pub struct MockChainReader {
    /// The script.
    script: Mutex<ChainScript>,
    /// Number of `block_exists` calls, for cache assertions.
    pub exists_calls: AtomicU64,
    /// Number of `epoch_participation` calls, for resume assertions.
    pub participation_calls: AtomicU64,
}

impl MockChainReader {
    /// A reader finalized at `slot` with no missed slots.
    #[must_use]
    pub fn finalized_at(slot: u64) -> Self {
        let reader = Self::default();
        reader.set_finalized(slot);
        reader
    }

    /// Move the finalized head.
    pub fn set_finalized(&self, slot: u64) {
        self.lock().finalized = slot;
    }

    /// Script a missed slot.
    pub fn mark_missed(&self, slot: u64) {
        self.lock().missed.insert(slot);
    }

    /// Script the validator set.
    pub fn set_validators(&self, validators: Vec<Validator>) {
        self.lock().validators = validators;
    }

    /// Script one epoch's attestation outcomes.
    pub fn set_participation(&self, epoch: u64, duties: Vec<AttestationDuty>) {
        self.lock().participation.insert(epoch, duties);
    }

    /// Delay the finalized query, for cycle-timeout tests.
    pub fn set_finalized_delay(&self, delay: Duration) {
        self.lock().finalized_delay = Some(delay);
    }

    /// Lock the script.
    fn lock(&self) -> std::sync::MutexGuard<'_, ChainScript> {
        self.script.lock().expect("mock lock poisoned")
    }
}

#[async_trait]
impl ChainReader for MockChainReader {
    async fn finalized_blockstamp(&self) -> Result<BlockStamp> {
        let (finalized, delay) = {
            let script = self.lock();
            (script.finalized, script.finalized_delay)
        };
        if let Some(delay) = delay {
            tokio::time::sleep(delay).await;
        }
        Ok(stamp_for_slot(finalized))
    }

    async fn block_exists(&self, slot: SlotNumber) -> Result<bool> {
        self.exists_calls.fetch_add(1, Ordering::SeqCst);
        Ok(!self.lock().missed.contains(&*slot))
    }

    async fn blockstamp_at(&self, slot: SlotNumber) -> Result<BlockStamp> {
        if self.lock().missed.contains(&*slot) {
            return Err(OracleError::SlotMissed(slot));
        }
        Ok(stamp_for_slot(*slot))
    }

    async fn validators(&self, _stamp: &BlockStamp) -> Result<Vec<Validator>> {
        Ok(self.lock().validators.clone())
    }

    async fn epoch_participation(&self, epoch: EpochNumber) -> Result<Vec<AttestationDuty>> {
        self.participation_calls.fetch_add(1, Ordering::SeqCst);
        Ok(self
            .lock()
            .participation
            .get(&*epoch)
            .cloned()
            .unwrap_or_default())
    }
}

/// Mutable script of the fake contracts.
struct ContractScript {
    /// Chain timing parameters.
    chain_config: ChainConfig,
    /// Frame-length parameters.
    frame_config: FrameConfig,
    /// Ordered committee.
    roster: CommitteeRoster,
    /// Submitted hashes per reference slot.
    submissions: BTreeMap<u64, Vec<(Address, ReportHash)>>,
    /// Delivery progress per reference slot.
    processing: BTreeMap<u64, ProcessingState>,
    /// Last reported reference slot per member.
    last_reported: BTreeMap<Address, u64>,
}

/// Scripted [`ConsensusContract`].
pub struct MockContract {
    /// The script.
    script: Mutex<ContractScript>,
}

impl MockContract {
    /// A contract with the given configuration and committee.
    #[must_use]
    pub fn new(
        chain_config: ChainConfig,
        frame_config: FrameConfig,
        roster: CommitteeRoster,
    ) -> Self {
        Self {
            script: Mutex::new(ContractScript {
                chain_config,
                frame_config,
                roster,
                submissions: BTreeMap::new(),
                processing: BTreeMap::new(),
                last_reported: BTreeMap::new(),
            }),
        }
    }

    /// Lock the script.
    fn lock(&self) -> std::sync::MutexGuard<'_, ContractScript> {
        self.script.lock().expect("mock lock poisoned")
    }

    /// Record one member's hash, replacing any earlier submission.
    pub fn record_submission(&self, ref_slot: u64, member: Address, hash: ReportHash) {
        let mut script = self.lock();
        let submissions = script.submissions.entry(ref_slot).or_default();
        submissions.retain(|(addr, _)| *addr != member);
        submissions.push((member, hash));
        script.last_reported.insert(member, ref_slot);
    }

    /// Mark the main report as delivered, declaring `extra_items` chunks.
    pub fn apply_report(&self, ref_slot: u64, extra_items: u64) {
        self.lock().processing.insert(
            ref_slot,
            ProcessingState {
                ref_slot: SlotNumber::new(ref_slot),
                main_data_submitted: true,
                extra_data_items_count: extra_items,
                extra_data_items_submitted: 0,
            },
        );
    }

    /// Mark one more extra-data chunk as processed.
    pub fn apply_extra_data_chunk(&self, ref_slot: u64) {
        if let Some(state) = self.lock().processing.get_mut(&ref_slot) {
            state.extra_data_items_submitted += 1;
        }
    }

    /// The hashes currently recorded for a reference slot.
    #[must_use]
    pub fn submissions(&self, ref_slot: u64) -> Vec<(Address, ReportHash)> {
        self.lock()
            .submissions
            .get(&ref_slot)
            .cloned()
            .unwrap_or_default()
    }
}

#[async_trait]
impl ConsensusContract for MockContract {
    async fn chain_config(&self) -> Result<ChainConfig> {
        Ok(self.lock().chain_config)
    }

    async fn frame_config(&self) -> Result<FrameConfig> {
        Ok(self.lock().frame_config)
    }

    async fn member_roster(&self) -> Result<CommitteeRoster> {
        Ok(self.lock().roster.clone())
    }

    async fn consensus_snapshot(&self, ref_slot: SlotNumber) -> Result<ConsensusSnapshot> {
        let script = self.lock();
        Ok(ConsensusSnapshot {
            ref_slot,
            quorum: script.roster.quorum(),
            submissions: script
                .submissions
                .get(&*ref_slot)
                .cloned()
                .unwrap_or_default(),
        })
    }

    async fn member_info(&self, member: Address, ref_slot: SlotNumber) -> Result<MemberInfo> {
        let script = self.lock();
        let current = script
            .submissions
            .get(&*ref_slot)
            .and_then(|submissions| {
                submissions
                    .iter()
                    .find(|(addr, _)| *addr == member)
                    .map(|(_, hash)| *hash)
            });
        Ok(MemberInfo {
            is_member: script.roster.contains(member),
            last_report_ref_slot: SlotNumber::new(
                script.last_reported.get(&member).copied().unwrap_or(0),
            ),
            current_frame_member_hash: current,
        })
    }

    async fn processing_state(&self, ref_slot: SlotNumber) -> Result<ProcessingState> {
        Ok(self
            .lock()
            .processing
            .get(&*ref_slot)
            .copied()
            .unwrap_or(ProcessingState {
                ref_slot,
                main_data_submitted: false,
                extra_data_items_count: 0,
                extra_data_items_submitted: 0,
            }))
    }
}

/// One transaction handed to the sender.
#[derive(Clone, Debug, PartialEq, Eq)]
pub enum SentTx {
    /// A report-hash submission.
    Hash(SlotNumber, ReportHash),
    /// A main-report submission.
    Report(SlotNumber, Vec<u8>),
    /// An extra-data chunk submission.
    ExtraData(SlotNumber, u64, Vec<u8>),
}

/// Recording [`TransactionSender`] that mirrors accepted transactions into
/// a [`MockContract`], the way the real chain would before the next cycle's
/// reads.
pub struct RecordingSender {
    /// Every accepted transaction, in order.
    sent: Mutex<Vec<SentTx>>,
    /// Contract the effects land on.
    contract: Arc<MockContract>,
    /// This sender's member address.
    member: Address,
    /// Extra-data chunk count declared when the main report lands.
    extra_items_on_report: u64,
    /// When set, every send fails with this message.
    fail_with: Mutex<Option<String>>,
}

impl RecordingSender {
    /// A sender for `member` wired to `contract`.
    #[must_use]
    pub fn wired(contract: Arc<MockContract>, member: Address, extra_items_on_report: u64) -> Self {
        Self {
            sent: Mutex::new(Vec::new()),
            contract,
            member,
            extra_items_on_report,
            fail_with: Mutex::new(None),
        }
    }

    /// Script every subsequent send to fail.
    pub fn fail_sends(&self, message: &str) {
        *self.fail_with.lock().expect("mock lock poisoned") = Some(message.to_string());
    }

    /// Let sends succeed again.
    pub fn clear_failure(&self) {
        *self.fail_with.lock().expect("mock lock poisoned") = None;
    }

    /// Everything sent so far.
    #[must_use]
    pub fn sent(&self) -> Vec<SentTx> {
        self.sent.lock().expect("mock lock poisoned").clone()
    }

    /// Record a send unless scripted to fail.
    fn accept(&self, tx: SentTx) -> Result<()> {
        if let Some(message) = self.fail_with.lock().expect("mock lock poisoned").clone() {
            return Err(OracleError::TxFailed(message));
        }
        self.sent.lock().expect("mock lock poisoned").push(tx);
        Ok(())
    }
}

#[async_trait]
impl TransactionSender for RecordingSender {
    async fn submit_report_hash(&self, ref_slot: SlotNumber, hash: ReportHash) -> Result<()> {
        self.accept(SentTx::Hash(ref_slot, hash))?;
        self.contract.record_submission(*ref_slot, self.member, hash);
        Ok(())
    }

    async fn submit_report(&self, ref_slot: SlotNumber, payload: Vec<u8>) -> Result<()> {
        self.accept(SentTx::Report(ref_slot, payload))?;
        self.contract.apply_report(*ref_slot, self.extra_items_on_report);
        Ok(())
    }

    async fn submit_extra_data_chunk(
        &self,
        ref_slot: SlotNumber,
        chunk: &ExtraDataChunk,
    ) -> Result<()> {
        self.accept(SentTx::ExtraData(ref_slot, chunk.index, chunk.payload.clone()))?;
        self.contract.apply_extra_data_chunk(*ref_slot);
        Ok(())
    }
}

/// [`KeysApi`] serving a fixed key list.
#[derive(Default)]
pub struct StaticKeysApi {
    /// The keys, already in canonical order.
    keys: Vec<OperatorKey>,
}

impl StaticKeysApi {
    /// Serve the given keys.
    #[must_use]
    pub fn new(keys: Vec<OperatorKey>) -> Self {
        Self { keys }
    }
}

#[async_trait]
impl KeysApi for StaticKeysApi {
    async fn operator_keys(&self, _module_id: u64) -> Result<Vec<OperatorKey>> {
        Ok(self.keys.clone())
    }
}
