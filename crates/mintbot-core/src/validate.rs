//! Input validation and normalization for collected token fields.
//!
//! Every function here is pure and deterministic. A `ValidationError` means
//! the user is re-prompted and the session does not advance.

use mintbot_types::error::ValidationError;
use mintbot_types::token::{DECIMALS, MAX_NAME_LEN, MAX_SYMBOL_LEN};

/// Token the user types to leave an optional link empty.
pub const SKIP_TOKEN: &str = "skip";

/// Largest whole-token supply whose base-unit amount still fits in a `u64`.
pub const MAX_SUPPLY: u64 = u64::MAX / 10u64.pow(DECIMALS as u32);

/// Trim and truncate a token name to 32 bytes, on a character boundary.
pub fn normalize_name(input: &str) -> Result<String, ValidationError> {
    let trimmed = input.trim();
    if trimmed.is_empty() {
        return Err(ValidationError::EmptyName);
    }
    Ok(truncate_bytes(trimmed, MAX_NAME_LEN).to_string())
}

/// Uppercase and truncate a symbol to 10 bytes, on a character boundary.
///
/// Uppercasing happens before truncation so that applying the function to
/// its own output is a no-op.
pub fn normalize_symbol(input: &str) -> Result<String, ValidationError> {
    let trimmed = input.trim();
    if trimmed.is_empty() {
        return Err(ValidationError::EmptySymbol);
    }
    let upper = trimmed.to_uppercase();
    Ok(truncate_bytes(&upper, MAX_SYMBOL_LEN).to_string())
}

/// Longest prefix of `value` that fits in `max` bytes without splitting a
/// character, with trailing whitespace removed.
fn truncate_bytes(value: &str, max: usize) -> &str {
    if value.len() <= max {
        return value;
    }
    let end = value
        .char_indices()
        .map(|(i, c)| i + c.len_utf8())
        .take_while(|end| *end <= max)
        .last()
        .unwrap_or(0);
    value[..end].trim_end()
}

pub fn normalize_description(input: &str) -> Result<String, ValidationError> {
    let trimmed = input.trim();
    if trimmed.is_empty() {
        return Err(ValidationError::EmptyDescription);
    }
    Ok(trimmed.to_string())
}

/// Parse a whole-token supply.
///
/// Grouping separators (`,`, `_`, whitespace) are stripped, the remainder is
/// parsed as a number which must be finite and positive, and the result is
/// floored. Values that floor to zero or overflow base-unit scaling are
/// rejected.
pub fn parse_supply(input: &str) -> Result<u64, ValidationError> {
    let invalid = || ValidationError::InvalidSupply(input.trim().to_string());

    let cleaned: String = input
        .chars()
        .filter(|c| *c != ',' && *c != '_' && !c.is_whitespace())
        .collect();

    let value: f64 = cleaned.parse().map_err(|_| invalid())?;
    if !value.is_finite() || value <= 0.0 {
        return Err(invalid());
    }

    let floored = value.floor();
    if floored < 1.0 || floored > MAX_SUPPLY as f64 {
        return Err(invalid());
    }
    Ok(floored as u64)
}

/// Accept a link verbatim, or `None` when the user typed `skip`.
pub fn parse_link(input: &str) -> Option<String> {
    let trimmed = input.trim();
    if trimmed.is_empty() || trimmed.eq_ignore_ascii_case(SKIP_TOKEN) {
        None
    } else {
        Some(trimmed.to_string())
    }
}

/// Check that `input` looks like a base58 account address.
///
/// Only the alphabet and length are checked here; the ledger adapter does
/// the real decoding.
pub fn parse_mint_address(input: &str) -> Result<String, ValidationError> {
    let trimmed = input.trim();
    let well_formed = (32..=44).contains(&trimmed.len())
        && trimmed
            .chars()
            .all(|c| c.is_ascii_alphanumeric() && !matches!(c, '0' | 'O' | 'I' | 'l'));

    if well_formed {
        Ok(trimmed.to_string())
    } else {
        Err(ValidationError::InvalidMintAddress(trimmed.to_string()))
    }
}
