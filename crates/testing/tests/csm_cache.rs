// Copyright (c) 2023-2026 Quorus Labs (quorus.dev)
// This file is part of the Quorus repository.

// You should have received a copy of the MIT License
// along with the Quorus repository. If not, see <https://mit-license.org/>.

//! The csm builder against the persisted checkpoint cache: resume after
//! restart, stale-version invalidation, and distribution determinism.

use std::sync::atomic::Ordering;

use quorus_oracle::{cache::FileReportCache, modules::CsmModule};
use quorus_testing::{
    helpers::{chain_config, frame_config, test_config},
    mocks::{stamp_for_slot, MockChainReader, StaticKeysApi},
};
use quorus_types::{
    data::{
        AttestationDuty, BlsPubkey, EpochNumber, FrameIndex, ReferenceBlockStamp, SlotNumber,
        Validator, ValidatorStatus,
    },
    traits::{
        keys_api::OperatorKey,
        report::{BuildContext, OracleReport, ReportModule},
        storage::ReportCache,
    },
};

/// Reference blockstamp of frame 9: epochs 81..=90.
fn ref_stamp() -> ReferenceBlockStamp {
    ReferenceBlockStamp {
        ref_slot: SlotNumber::new(1000),
        ref_epoch: EpochNumber::new(90),
        stamp: stamp_for_slot(1000),
    }
}

/// A validator owned by the scripted key registry.
fn validator(index: u64) -> Validator {
    Validator {
        index,
        pubkey: BlsPubkey(vec![index as u8; 48]),
        balance_gwei: 32_000_000_000,
        effective_balance_gwei: 32_000_000_000,
        activation_epoch: Some(EpochNumber::new(1)),
        status: ValidatorStatus::Active,
    }
}

/// Keys mapping validator 1 and 2 to operator 1, validator 3 to operator 2.
fn keys() -> StaticKeysApi {
    StaticKeysApi::new(vec![
        OperatorKey {
            operator_id: 1,
            pubkey: BlsPubkey(vec![1; 48]),
            used: true,
        },
        OperatorKey {
            operator_id: 1,
            pubkey: BlsPubkey(vec![2; 48]),
            used: true,
        },
        OperatorKey {
            operator_id: 2,
            pubkey: BlsPubkey(vec![3; 48]),
            used: true,
        },
    ])
}

/// Script the chain: validator 1 attests every epoch, validator 2 half the
/// time, validator 3 never.
fn scripted_chain() -> MockChainReader {
    let chain = MockChainReader::finalized_at(1010);
    chain.set_validators(vec![validator(1), validator(2), validator(3)]);
    for epoch in 81..=90 {
        chain.set_participation(
            epoch,
            vec![
                AttestationDuty {
                    validator_index: 1,
                    included: true,
                },
                AttestationDuty {
                    validator_index: 2,
                    included: epoch % 2 == 0,
                },
                AttestationDuty {
                    validator_index: 3,
                    included: false,
                },
            ],
        );
    }
    chain
}

#[tokio::test]
async fn distribution_counts_included_attestations_per_operator() {
    let chain = scripted_chain();
    let keys = keys();
    let dir = tempfile::tempdir().unwrap();
    let cache = FileReportCache::new(dir.path()).unwrap();
    let config = test_config(None);
    let module = CsmModule::new(3);

    let ctx = BuildContext {
        chain: &chain,
        keys: &keys,
        cache: &cache,
        chain_config: &chain_config(),
        frame_config: &frame_config(),
        config: &config,
    };
    let report = module.build_report(&ref_stamp(), &ctx).await.unwrap();

    // Validator 1: 10 inclusions, validator 2: epochs 82,84,86,88,90 = 5,
    // both operator 1. Validator 3 never attested, so operator 2 is absent.
    assert_eq!(report.distribution.len(), 1);
    assert_eq!(report.distribution[0].operator_id, 1);
    assert_eq!(report.distribution[0].shares, 15);
    assert_eq!(chain.participation_calls.load(Ordering::SeqCst), 10);
}

#[tokio::test]
async fn restart_resumes_from_checkpoint_without_refetching() {
    let chain = scripted_chain();
    let keys = keys();
    let dir = tempfile::tempdir().unwrap();
    let cache = FileReportCache::new(dir.path()).unwrap();
    let config = test_config(None);

    let first = {
        let ctx = BuildContext {
            chain: &chain,
            keys: &keys,
            cache: &cache,
            chain_config: &chain_config(),
            frame_config: &frame_config(),
            config: &config,
        };
        CsmModule::new(3)
            .build_report(&ref_stamp(), &ctx)
            .await
            .unwrap()
    };
    let fetched = chain.participation_calls.load(Ordering::SeqCst);
    assert_eq!(fetched, 10);

    // A fresh module instance (a restarted process) finds the checkpoint
    // and rebuilds the identical report with zero new epoch fetches.
    let second = {
        let ctx = BuildContext {
            chain: &chain,
            keys: &keys,
            cache: &cache,
            chain_config: &chain_config(),
            frame_config: &frame_config(),
            config: &config,
        };
        CsmModule::new(3)
            .build_report(&ref_stamp(), &ctx)
            .await
            .unwrap()
    };
    assert_eq!(chain.participation_calls.load(Ordering::SeqCst), fetched);
    assert_eq!(first, second);
    assert_eq!(first.hash(), second.hash());
}

#[tokio::test]
async fn checkpoint_under_other_state_version_is_ignored() {
    let chain = scripted_chain();
    let keys = keys();
    let dir = tempfile::tempdir().unwrap();
    let cache = FileReportCache::new(dir.path()).unwrap();
    let config = test_config(None);

    // A fragment left by a different consensus version must not be found.
    cache.store(99, FrameIndex::new(9), b"old fragment").unwrap();

    let ctx = BuildContext {
        chain: &chain,
        keys: &keys,
        cache: &cache,
        chain_config: &chain_config(),
        frame_config: &frame_config(),
        config: &config,
    };
    let report = CsmModule::new(3)
        .build_report(&ref_stamp(), &ctx)
        .await
        .unwrap();
    assert_eq!(chain.participation_calls.load(Ordering::SeqCst), 10);
    assert!(!report.hash().is_zero());
}
