// Copyright (c) 2023-2026 Quorus Labs (quorus.dev)
// This file is part of the Quorus repository.

// You should have received a copy of the MIT License
// along with the Quorus repository. If not, see <https://mit-license.org/>.

//! Whole-cycle behavior against scripted collaborators.
//!
//! The chain is finalized at slot 1010, inside frame 9 (reference slot
//! 1000, deadline 1110, submitter rotation lands on member 5).

use std::{sync::Arc, time::Duration};

use ethereum_types::Address;
use quorus_oracle::{Collaborators, CycleOrchestrator};
use quorus_testing::{
    helpers::{addr, chain_config, frame_config, hash, roster, test_config},
    mocks::{MockChainReader, MockContract, RecordingSender, SentTx, StaticKeysApi},
    module::TestModule,
};
use quorus_types::{
    config::OracleConfig,
    data::{BlsPubkey, SlotNumber, Validator, ValidatorStatus},
    error::OracleError,
    traits::{metrics::NoMetrics, report::OracleReport, storage::NoCache},
};

/// The frame under test.
const REF_SLOT: u64 = 1000;
/// Member the rotation selects for frame 9 with a five-member roster.
const SUBMITTER: u8 = 5;

/// Everything a cycle test needs to drive and inspect.
struct Harness {
    chain: Arc<MockChainReader>,
    contract: Arc<MockContract>,
    sender: Arc<RecordingSender>,
    orchestrator: CycleOrchestrator<TestModule>,
}

impl Harness {
    fn new(me: Option<Address>, module: TestModule, config: OracleConfig) -> Self {
        let chain = Arc::new(MockChainReader::finalized_at(1010));
        let contract = Arc::new(MockContract::new(
            chain_config(),
            frame_config(),
            roster(5),
        ));
        let sender = Arc::new(RecordingSender::wired(
            Arc::clone(&contract),
            me.unwrap_or_else(|| addr(SUBMITTER)),
            module.chunks,
        ));
        let io = Collaborators {
            chain: chain.clone(),
            contract: contract.clone(),
            sender: sender.clone(),
            keys: Arc::new(StaticKeysApi::default()),
            cache: Arc::new(NoCache),
        };
        let orchestrator = CycleOrchestrator::new(module, io, config, &NoMetrics);
        Self {
            chain,
            contract,
            sender,
            orchestrator,
        }
    }

    /// Run one one-shot cycle.
    async fn cycle(&mut self) -> Result<(), OracleError> {
        self.orchestrator.run().await
    }

    /// Script `count` other members agreeing on `agreed` for the frame.
    fn others_vote(&self, members: &[u8], agreed: quorus_types::data::ReportHash) {
        for member in members {
            self.contract.record_submission(REF_SLOT, addr(*member), agreed);
        }
    }
}

#[tokio::test]
async fn fresh_frame_submits_hash_exactly_once() {
    let module = TestModule::plain(7);
    let expected = module.expected_report(REF_SLOT).hash();
    let mut harness = Harness::new(Some(addr(SUBMITTER)), module, test_config(Some(addr(SUBMITTER))));

    harness.cycle().await.unwrap();
    assert_eq!(
        harness.sender.sent(),
        vec![SentTx::Hash(SlotNumber::new(REF_SLOT), expected)]
    );

    // The hash is on-chain now; repeating the cycle with unchanged inputs
    // must not send it again.
    harness.cycle().await.unwrap();
    assert_eq!(harness.sender.sent().len(), 1);
}

#[tokio::test]
async fn full_lifecycle_lands_report_and_chunks_in_order() {
    let module = TestModule::with_chunks(7, 2);
    let report = module.expected_report(REF_SLOT);
    let expected_hash = report.hash();
    let payload = report.encode().unwrap();
    let mut harness = Harness::new(Some(addr(SUBMITTER)), module, test_config(Some(addr(SUBMITTER))));

    // Cycle 1: our hash goes out.
    harness.cycle().await.unwrap();
    // Two other members agree, forming a quorum of three.
    harness.others_vote(&[1, 2], expected_hash);

    // Cycle 2: quorum reached, we are the submitter, stagger delay has
    // elapsed (finalized 1010 >= 1006): the main report goes out.
    harness.cycle().await.unwrap();
    // Cycles 3 and 4: the two chunks, strictly in order.
    harness.cycle().await.unwrap();
    harness.cycle().await.unwrap();
    // Cycle 5: everything delivered, nothing more to send.
    harness.cycle().await.unwrap();

    let sent = harness.sender.sent();
    assert_eq!(sent.len(), 4);
    assert_eq!(sent[0], SentTx::Hash(SlotNumber::new(REF_SLOT), expected_hash));
    assert_eq!(sent[1], SentTx::Report(SlotNumber::new(REF_SLOT), payload));
    assert!(matches!(sent[2], SentTx::ExtraData(_, 0, _)));
    assert!(matches!(sent[3], SentTx::ExtraData(_, 1, _)));

    // The completed frame advanced the sleep threshold: further cycles at
    // the same finalized head skip early.
    assert_eq!(harness.orchestrator.slot_threshold(), SlotNumber::new(1010));
    harness.cycle().await.unwrap();
    assert_eq!(harness.sender.sent().len(), 4);
}

#[tokio::test]
async fn non_submitter_waits_after_quorum() {
    let module = TestModule::plain(7);
    let expected = module.expected_report(REF_SLOT).hash();
    let mut harness = Harness::new(Some(addr(1)), module, test_config(Some(addr(1))));

    harness.cycle().await.unwrap();
    harness.others_vote(&[2, 3, 4], expected);

    harness.cycle().await.unwrap();
    // Hash only; the report is member 5's turn.
    assert_eq!(harness.sender.sent().len(), 1);
    assert!(matches!(harness.sender.sent()[0], SentTx::Hash(_, _)));
}

#[tokio::test]
async fn quorum_disagreement_is_fatal_and_sends_nothing() {
    let module = TestModule::plain(7);
    let mut harness = Harness::new(Some(addr(SUBMITTER)), module, test_config(Some(addr(SUBMITTER))));
    harness.others_vote(&[1, 2, 3], hash(0x99));

    let err = harness.cycle().await.unwrap_err();
    assert!(matches!(err, OracleError::HashMismatch { .. }));
    assert!(harness.sender.sent().is_empty());
}

#[tokio::test]
async fn cycle_timeout_aborts_before_any_send() {
    let module = TestModule::plain(7);
    let mut config = test_config(Some(addr(SUBMITTER)));
    config.max_cycle_lifetime = Duration::from_millis(50);
    let mut harness = Harness::new(Some(addr(SUBMITTER)), module, config);
    harness.chain.set_finalized_delay(Duration::from_millis(200));

    // The timeout is a recoverable outcome, not a crash.
    harness.cycle().await.unwrap();
    assert!(harness.sender.sent().is_empty());
}

#[tokio::test]
async fn dry_run_evaluates_but_never_sends() {
    let module = TestModule::plain(7);
    let mut harness = Harness::new(None, module, test_config(None));

    harness.cycle().await.unwrap();
    assert!(harness.sender.sent().is_empty());
}

#[tokio::test]
async fn bunker_mode_gates_the_report_but_not_the_hash() {
    let leaking = vec![Validator {
        index: 1,
        pubkey: BlsPubkey(vec![1; 48]),
        balance_gwei: 30_000_000_000,
        effective_balance_gwei: 32_000_000_000,
        activation_epoch: None,
        status: ValidatorStatus::Active,
    }];

    let module = TestModule::plain(7);
    let expected = module.expected_report(REF_SLOT).hash();
    let mut harness = Harness::new(Some(addr(SUBMITTER)), module, test_config(Some(addr(SUBMITTER))));
    harness.chain.set_validators(leaking.clone());

    // Hash submission passes the gate.
    harness.cycle().await.unwrap();
    assert_eq!(harness.sender.sent().len(), 1);

    // Quorum forms, but the report submission is suppressed.
    harness.others_vote(&[1, 2], expected);
    harness.cycle().await.unwrap();
    assert_eq!(harness.sender.sent().len(), 1);

    // With reporting-in-bunker explicitly allowed, the report goes out.
    let module = TestModule::plain(7);
    let mut config = test_config(Some(addr(SUBMITTER)));
    config.allow_reporting_in_bunker = true;
    let mut permissive = Harness::new(Some(addr(SUBMITTER)), module, config);
    permissive.chain.set_validators(leaking);
    permissive.cycle().await.unwrap();
    permissive.others_vote(&[1, 2], expected);
    permissive.cycle().await.unwrap();
    assert!(matches!(
        permissive.sender.sent().last(),
        Some(SentTx::Report(_, _))
    ));
}

#[tokio::test]
async fn failed_send_is_retried_next_cycle() {
    let module = TestModule::plain(7);
    let expected = module.expected_report(REF_SLOT).hash();
    let mut harness = Harness::new(Some(addr(SUBMITTER)), module, test_config(Some(addr(SUBMITTER))));
    harness.sender.fail_sends("reverted");

    // The failed send surfaces as a recoverable cycle outcome.
    harness.cycle().await.unwrap();
    assert!(harness.sender.sent().is_empty());
    assert!(harness.contract.submissions(REF_SLOT).is_empty());

    // Nothing was assumed sent: the next cycle retries the same action.
    harness.sender.clear_failure();
    harness.cycle().await.unwrap();
    assert_eq!(
        harness.sender.sent(),
        vec![SentTx::Hash(SlotNumber::new(REF_SLOT), expected)]
    );
}
