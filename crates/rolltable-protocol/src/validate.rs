//! Inbound validation.
//!
//! Deserialization already guarantees types (integers, known visibility).
//! These checks cover the ranges serde can't express. Callers drop
//! anything that fails here without replying.

use crate::{DiceRequest, ProtocolError};

/// Most dice groups allowed in one request.
pub const MAX_DICE_GROUPS: usize = 20;

/// Most dice allowed in one group.
pub const MAX_DICE_PER_GROUP: u32 = 100;

/// Fewest faces a die may have.
pub const MIN_SIDES: u32 = 2;

/// Longest nickname, in characters, after trimming.
pub const MAX_NICK_CHARS: usize = 32;

/// Largest avatar payload accepted, in bytes.
pub const MAX_AVATAR_BYTES: usize = 512 * 1024;

/// Checks a roll request's dice list.
pub fn validate_dice(dice: &[DiceRequest]) -> Result<(), ProtocolError> {
    if dice.is_empty() {
        return Err(ProtocolError::InvalidMessage(
            "roll request has no dice".into(),
        ));
    }
    if dice.len() > MAX_DICE_GROUPS {
        return Err(ProtocolError::InvalidMessage(format!(
            "too many dice groups: {} > {MAX_DICE_GROUPS}",
            dice.len()
        )));
    }
    for group in dice {
        if group.sides < MIN_SIDES {
            return Err(ProtocolError::InvalidMessage(format!(
                "die must have at least {MIN_SIDES} sides, got {}",
                group.sides
            )));
        }
        if group.count == 0 || group.count > MAX_DICE_PER_GROUP {
            return Err(ProtocolError::InvalidMessage(format!(
                "dice count must be 1..={MAX_DICE_PER_GROUP}, got {}",
                group.count
            )));
        }
    }
    Ok(())
}

/// Trims a nickname and checks its length. Returns the trimmed form.
pub fn normalize_nick(nick: &str) -> Result<String, ProtocolError> {
    let trimmed = nick.trim();
    if trimmed.is_empty() {
        return Err(ProtocolError::InvalidMessage("empty nickname".into()));
    }
    if trimmed.chars().count() > MAX_NICK_CHARS {
        return Err(ProtocolError::InvalidMessage(format!(
            "nickname longer than {MAX_NICK_CHARS} characters"
        )));
    }
    Ok(trimmed.to_string())
}

/// Checks an avatar reference's size.
pub fn validate_avatar(avatar: Option<&str>) -> Result<(), ProtocolError> {
    match avatar {
        Some(data) if data.len() > MAX_AVATAR_BYTES => {
            Err(ProtocolError::InvalidMessage(format!(
                "avatar is {} bytes, limit {MAX_AVATAR_BYTES}",
                data.len()
            )))
        }
        _ => Ok(()),
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_validate_dice_accepts_bounds() {
        assert!(validate_dice(&[DiceRequest::new(1, 2)]).is_ok());
        assert!(validate_dice(&[DiceRequest::new(100, 1000)]).is_ok());
        let twenty = vec![DiceRequest::new(1, 6); MAX_DICE_GROUPS];
        assert!(validate_dice(&twenty).is_ok());
    }

    #[test]
    fn test_validate_dice_rejects_empty() {
        assert!(validate_dice(&[]).is_err());
    }

    #[test]
    fn test_validate_dice_rejects_too_many_groups() {
        let groups = vec![DiceRequest::new(1, 6); MAX_DICE_GROUPS + 1];
        assert!(validate_dice(&groups).is_err());
    }

    #[test]
    fn test_validate_dice_rejects_one_sided_die() {
        assert!(validate_dice(&[DiceRequest::new(1, 1)]).is_err());
    }

    #[test]
    fn test_validate_dice_rejects_count_out_of_range() {
        assert!(validate_dice(&[DiceRequest::new(0, 6)]).is_err());
        assert!(validate_dice(&[DiceRequest::new(101, 6)]).is_err());
    }

    #[test]
    fn test_normalize_nick_trims() {
        assert_eq!(normalize_nick("  Gandalf ").unwrap(), "Gandalf");
    }

    #[test]
    fn test_normalize_nick_rejects_blank_and_long() {
        assert!(normalize_nick("   ").is_err());
        assert!(normalize_nick(&"x".repeat(MAX_NICK_CHARS + 1)).is_err());
        assert!(normalize_nick(&"é".repeat(MAX_NICK_CHARS)).is_ok());
    }

    #[test]
    fn test_validate_avatar_limits_size() {
        assert!(validate_avatar(None).is_ok());
        assert!(validate_avatar(Some("data:image/webp;base64,AAAA")).is_ok());
        let huge = "a".repeat(MAX_AVATAR_BYTES + 1);
        assert!(validate_avatar(Some(&huge)).is_err());
    }
}
