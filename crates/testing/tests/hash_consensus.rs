// Copyright (c) 2023-2026 Quorus Labs (quorus.dev)
// This file is part of the Quorus repository.

// You should have received a copy of the MIT License
// along with the Quorus repository. If not, see <https://mit-license.org/>.

//! Property checks over the hash tally: a winner is reported exactly when
//! some hash gathers quorum support, never otherwise.

use std::num::NonZeroU64;

use either::Either;
use quorus_oracle::consensus::HashTally;
use quorus_testing::helpers::{addr, hash};
use quorus_types::{consensus::ConsensusSnapshot, data::SlotNumber};
use rand::{rngs::SmallRng, Rng, SeedableRng};

/// Build a snapshot from `(member, hash)` byte pairs.
fn snapshot(votes: &[(u8, u8)]) -> ConsensusSnapshot {
    ConsensusSnapshot {
        ref_slot: SlotNumber::new(1000),
        quorum: NonZeroU64::new(3).unwrap(),
        submissions: votes
            .iter()
            .map(|(member, value)| (addr(*member), hash(*value)))
            .collect(),
    }
}

#[test]
fn winner_exactly_when_quorum_support_exists() {
    const QUORUM: u64 = 3;
    let mut rng = SmallRng::seed_from_u64(7);

    for _ in 0..500 {
        let members = rng.gen_range(1..=9_u8);
        let votes: Vec<(u8, u8)> = (1..=members)
            .filter_map(|member| {
                if rng.gen_bool(0.8) {
                    Some((member, rng.gen_range(1..=3_u8)))
                } else {
                    None
                }
            })
            .collect();

        // Reference counts, one vote per member.
        let mut counts = [0_u64; 4];
        for (_, value) in &votes {
            counts[*value as usize] += 1;
        }
        let best = counts.iter().copied().max().unwrap_or(0);

        let tally = HashTally::from_snapshot(&snapshot(&votes));
        match tally.winner(QUORUM) {
            Either::Right(winner) => {
                assert!(best >= QUORUM, "winner reported below quorum: {votes:?}");
                // The reported winner really has quorum support.
                let support = votes
                    .iter()
                    .filter(|(_, value)| hash(*value) == winner)
                    .count() as u64;
                assert!(support >= QUORUM, "weak winner for {votes:?}");
            }
            Either::Left(no_quorum) => {
                assert!(best < QUORUM, "missed winner for {votes:?}");
                assert_eq!(no_quorum.leading_support, best);
            }
        }
    }
}

#[test]
fn tally_is_stable_under_submission_order() {
    let votes = [(1, 1), (2, 2), (3, 1), (4, 1), (5, 2)];
    let mut reversed = votes;
    reversed.reverse();

    let forward = HashTally::from_snapshot(&snapshot(&votes)).winner(3);
    let backward = HashTally::from_snapshot(&snapshot(&reversed)).winner(3);
    assert_eq!(forward, backward);
    assert_eq!(forward, Either::Right(hash(1)));
}
