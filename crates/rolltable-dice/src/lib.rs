//! Dice engine for Rolltable.
//!
//! Turns a validated list of [`DiceRequest`]s into rolled [`DiceGroup`]s.
//! Only the host ever calls this; players send requests, never results.
//!
//! # Determinism
//!
//! [`RandomRoller`] draws from a `StdRng`. Production seeds it from the OS;
//! tests seed it explicitly with [`RandomRoller::seeded`] so a failing
//! case can be replayed.
//!
//! ```
//! use rolltable_dice::{DiceRoller, RandomRoller};
//! use rolltable_protocol::DiceRequest;
//!
//! let mut roller = RandomRoller::seeded(7);
//! let outcome = roller.roll_multiple(&[DiceRequest::new(3, 6)]);
//! assert_eq!(outcome.dice[0].results.len(), 3);
//! assert!((3..=18).contains(&outcome.total));
//! ```

mod notation;

pub use notation::{parse_notation, NotationError};

use rand::rngs::StdRng;
use rand::{Rng, SeedableRng};
use rolltable_protocol::{DiceGroup, DiceRequest};
use tracing::trace;

// ---------------------------------------------------------------------------
// Outcome
// ---------------------------------------------------------------------------

/// The result of rolling a whole request.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct RollOutcome {
    /// One group per request entry, in request order.
    pub dice: Vec<DiceGroup>,
    /// Sum of every die in every group.
    pub total: u64,
}

// ---------------------------------------------------------------------------
// Roller
// ---------------------------------------------------------------------------

/// Source of dice results.
///
/// The dispatcher is generic over this trait, so tests can drive it with a
/// scripted roller and assert exact totals.
///
/// ## Contract
///
/// - One [`DiceGroup`] per request, in request order. Groups with the same
///   die size stay separate.
/// - Exactly `count` results per group, each in `1..=sides`.
/// - `total` is the sum of every result.
///
/// Callers validate requests first (see
/// [`validate_dice`](rolltable_protocol::validate::validate_dice)). A
/// zero-sided or empty group is the caller's bug, not something an
/// implementation has to handle gracefully.
///
/// ## Trait bounds
///
/// - `Send + 'static`: the roller is owned by the host actor, a spawned
///   Tokio task. It is never shared, so `Sync` is not required.
/// - `&mut self`: rolling advances RNG state.
pub trait DiceRoller: Send + 'static {
    /// Rolls every group in `request`.
    fn roll_multiple(&mut self, request: &[DiceRequest]) -> RollOutcome;
}

/// Uniform random roller.
pub struct RandomRoller {
    rng: StdRng,
}

impl RandomRoller {
    /// A roller seeded from the operating system.
    pub fn new() -> Self {
        Self {
            rng: StdRng::from_os_rng(),
        }
    }

    /// A reproducible roller.
    pub fn seeded(seed: u64) -> Self {
        Self {
            rng: StdRng::seed_from_u64(seed),
        }
    }

    fn roll_group(&mut self, group: DiceRequest) -> DiceGroup {
        // `max(1)` keeps the range non-empty if an unvalidated request slips
        // through; the result is still a legal face of a 1-sided die.
        let sides = group.sides.max(1);
        let results = (0..group.count)
            .map(|_| self.rng.random_range(1..=sides))
            .collect();
        DiceGroup {
            sides: group.sides,
            count: group.count,
            results,
        }
    }
}

impl Default for RandomRoller {
    fn default() -> Self {
        Self::new()
    }
}

impl DiceRoller for RandomRoller {
    fn roll_multiple(&mut self, request: &[DiceRequest]) -> RollOutcome {
        let dice: Vec<DiceGroup> =
            request.iter().map(|g| self.roll_group(*g)).collect();
        let total = dice.iter().map(DiceGroup::subtotal).sum();
        trace!(groups = dice.len(), total, "dice rolled");
        RollOutcome { dice, total }
    }
}
