// Copyright (c) 2023-2026 Quorus Labs (quorus.dev)
// This file is part of the Quorus repository.

// You should have received a copy of the MIT License
// along with the Quorus repository. If not, see <https://mit-license.org/>.

//! Frame calculation against a scripted consensus layer: finality
//! clamping, missed-slot walk-back and memoization.

use std::sync::{atomic::Ordering, Arc};

use quorus_oracle::frame::{FrameCalculator, FrameStatus};
use quorus_testing::{
    helpers::{chain_config, frame_config},
    mocks::{stamp_for_slot, MockChainReader},
};
use quorus_types::{
    data::{EpochNumber, FrameIndex, SlotNumber},
    error::OracleError,
    frame::Frame,
};

/// With 11-slot epochs and ten-epoch frames from epoch 1, frame 9 starts
/// at epoch 91: reference slot 1000, deadline slot 1110.
fn frame_nine() -> Frame {
    let frame = Frame::at_slot(SlotNumber::new(1005), &chain_config(), &frame_config()).unwrap();
    assert_eq!(frame.index, FrameIndex::new(9));
    assert_eq!(frame.ref_slot, SlotNumber::new(1000));
    assert_eq!(
        frame.report_processing_deadline_slot,
        SlotNumber::new(1110)
    );
    frame
}

#[tokio::test]
async fn reference_slot_with_block_resolves_to_itself() {
    let chain = Arc::new(MockChainReader::finalized_at(1005));
    let calculator = FrameCalculator::new(chain.clone());
    let frame = frame_nine();

    let status = calculator
        .resolve(
            &frame,
            &stamp_for_slot(1005),
            &chain_config(),
            &frame_config(),
        )
        .await
        .unwrap();
    let FrameStatus::Reportable(stamp) = status else {
        panic!("expected a reportable frame, got {status:?}");
    };
    assert_eq!(stamp.ref_slot, SlotNumber::new(1000));
    assert_eq!(stamp.stamp.slot_number, SlotNumber::new(1000));
    assert_eq!(stamp.ref_epoch, EpochNumber::new(90));
}

#[tokio::test]
async fn missed_reference_slot_walks_back_one() {
    let chain = Arc::new(MockChainReader::finalized_at(1005));
    chain.mark_missed(1000);
    let calculator = FrameCalculator::new(chain.clone());

    let status = calculator
        .resolve(
            &frame_nine(),
            &stamp_for_slot(1005),
            &chain_config(),
            &frame_config(),
        )
        .await
        .unwrap();
    let FrameStatus::Reportable(stamp) = status else {
        panic!("expected a reportable frame, got {status:?}");
    };
    // The report stays tagged with the nominal reference slot; the data
    // comes from the nearest preceding existing block.
    assert_eq!(stamp.ref_slot, SlotNumber::new(1000));
    assert_eq!(stamp.stamp.slot_number, SlotNumber::new(999));
}

#[tokio::test]
async fn resolution_is_memoized_per_reference_slot() {
    let chain = Arc::new(MockChainReader::finalized_at(1005));
    chain.mark_missed(1000);
    chain.mark_missed(999);
    let calculator = FrameCalculator::new(chain.clone());
    let frame = frame_nine();

    let first = calculator
        .resolve(&frame, &stamp_for_slot(1005), &chain_config(), &frame_config())
        .await
        .unwrap();
    let walked = chain.exists_calls.load(Ordering::SeqCst);
    assert!(walked >= 3);

    let second = calculator
        .resolve(&frame, &stamp_for_slot(1006), &chain_config(), &frame_config())
        .await
        .unwrap();
    assert_eq!(first, second);
    assert_eq!(chain.exists_calls.load(Ordering::SeqCst), walked);
}

#[tokio::test]
async fn unfinalized_reference_slot_waits() {
    let chain = Arc::new(MockChainReader::finalized_at(1005));
    let calculator = FrameCalculator::new(chain.clone());
    // Frame 10 as seen from a later finalized head.
    let future_frame =
        Frame::at_slot(SlotNumber::new(1120), &chain_config(), &frame_config()).unwrap();
    assert_eq!(future_frame.ref_slot, SlotNumber::new(1110));

    let status = calculator
        .resolve(
            &future_frame,
            &stamp_for_slot(1005),
            &chain_config(),
            &frame_config(),
        )
        .await
        .unwrap();
    assert_eq!(status, FrameStatus::AwaitingFinality);
}

#[tokio::test]
async fn passed_deadline_is_reported() {
    let chain = Arc::new(MockChainReader::finalized_at(1200));
    let calculator = FrameCalculator::new(chain.clone());

    let status = calculator
        .resolve(
            &frame_nine(),
            &stamp_for_slot(1200),
            &chain_config(),
            &frame_config(),
        )
        .await
        .unwrap();
    assert_eq!(status, FrameStatus::DeadlinePassed);
}

#[tokio::test]
async fn fully_missed_window_is_an_error() {
    let chain = Arc::new(MockChainReader::finalized_at(1005));
    // The whole walk-back window (one frame length) has no blocks, which
    // contradicts the finalized checkpoint we just observed.
    for slot in 890..=1000 {
        chain.mark_missed(slot);
    }
    let calculator = FrameCalculator::new(chain.clone());

    let err = calculator
        .resolve(
            &frame_nine(),
            &stamp_for_slot(1005),
            &chain_config(),
            &frame_config(),
        )
        .await
        .unwrap_err();
    assert!(matches!(err, OracleError::NoSlotsAvailable(_)));
}
