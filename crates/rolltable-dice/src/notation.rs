//! `NdS` dice notation, as typed at the host console.
//!
//! Accepts groups joined by `+`, e.g. `2d6+1d20` or `d8` (count defaults
//! to 1). Whitespace around groups is ignored, `D` is accepted for `d`.
//! Modifiers (`+3`) are not supported: every term must be a dice group.

use rolltable_protocol::DiceRequest;
use rolltable_protocol::validate::{self, MAX_DICE_GROUPS};

/// Why a notation string was rejected.
#[derive(Debug, Clone, PartialEq, Eq, thiserror::Error)]
pub enum NotationError {
    #[error("empty dice expression")]
    Empty,

    #[error("`{0}` is not a dice group (expected NdS)")]
    BadTerm(String),

    #[error("{0}")]
    OutOfRange(String),
}

/// Parses `2d6+1d20` into dice requests and checks them against the same
/// limits applied to player requests.
pub fn parse_notation(input: &str) -> Result<Vec<DiceRequest>, NotationError> {
    let input = input.trim();
    if input.is_empty() {
        return Err(NotationError::Empty);
    }

    let mut groups = Vec::new();
    for term in input.split('+') {
        let term = term.trim();
        let Some((count, sides)) = term.split_once(['d', 'D']) else {
            return Err(NotationError::BadTerm(term.to_string()));
        };
        let count = if count.is_empty() {
            1
        } else {
            count
                .parse::<u32>()
                .map_err(|_| NotationError::BadTerm(term.to_string()))?
        };
        let sides = sides
            .parse::<u32>()
            .map_err(|_| NotationError::BadTerm(term.to_string()))?;
        groups.push(DiceRequest::new(count, sides));
        if groups.len() > MAX_DICE_GROUPS {
            break;
        }
    }

    validate::validate_dice(&groups)
        .map_err(|e| NotationError::OutOfRange(e.to_string()))?;
    Ok(groups)
}
