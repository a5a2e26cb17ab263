//! Integration tests for the dice engine.
//!
//! Results are random, so these tests check shape and bounds rather than
//! exact values. Seeded rollers make every run reproducible.

use rolltable_dice::{DiceRoller, RandomRoller};
use rolltable_protocol::DiceRequest;

// =========================================================================
// Shape
// =========================================================================

#[test]
fn test_roll_multiple_returns_one_group_per_request() {
    let mut roller = RandomRoller::seeded(1);
    let request = [
        DiceRequest::new(2, 6),
        DiceRequest::new(1, 20),
        DiceRequest::new(4, 4),
    ];

    let outcome = roller.roll_multiple(&request);

    assert_eq!(outcome.dice.len(), 3);
    for (group, req) in outcome.dice.iter().zip(request.iter()) {
        assert_eq!(group.sides, req.sides);
        assert_eq!(group.count, req.count);
        assert_eq!(group.results.len(), req.count as usize);
    }
}

#[test]
fn test_same_sides_groups_stay_separate() {
    let mut roller = RandomRoller::seeded(2);
    let outcome =
        roller.roll_multiple(&[DiceRequest::new(1, 6), DiceRequest::new(1, 6)]);
    assert_eq!(outcome.dice.len(), 2);
}

// =========================================================================
// Bounds
// =========================================================================

#[test]
fn test_every_result_within_one_and_sides() {
    let mut roller = RandomRoller::seeded(3);
    for sides in [2, 3, 6, 20, 100, 1000] {
        let outcome = roller.roll_multiple(&[DiceRequest::new(100, sides)]);
        assert!(
            outcome.dice[0]
                .results
                .iter()
                .all(|r| (1..=sides).contains(r)),
            "d{sides} produced an out-of-range face"
        );
    }
}

#[test]
fn test_total_is_sum_of_all_results() {
    let mut roller = RandomRoller::seeded(4);
    let outcome = roller
        .roll_multiple(&[DiceRequest::new(10, 8), DiceRequest::new(5, 12)]);
    let expected: u64 = outcome
        .dice
        .iter()
        .flat_map(|g| g.results.iter())
        .map(|r| u64::from(*r))
        .sum();
    assert_eq!(outcome.total, expected);
}

#[test]
fn test_coin_eventually_shows_both_faces() {
    let mut roller = RandomRoller::seeded(5);
    let outcome = roller.roll_multiple(&[DiceRequest::new(100, 2)]);
    let results = &outcome.dice[0].results;
    assert!(results.contains(&1));
    assert!(results.contains(&2));
}

// =========================================================================
// Determinism
// =========================================================================

#[test]
fn test_same_seed_same_results() {
    let request = [DiceRequest::new(20, 20)];
    let a = RandomRoller::seeded(99).roll_multiple(&request);
    let b = RandomRoller::seeded(99).roll_multiple(&request);
    assert_eq!(a, b);
}

#[test]
fn test_os_seeded_roller_rolls() {
    let mut roller = RandomRoller::new();
    let outcome = roller.roll_multiple(&[DiceRequest::new(1, 20)]);
    assert!((1..=20).contains(&outcome.total));
}
