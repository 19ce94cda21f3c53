//! Source field packing
//!
//! Callsign, locator and power are reduced to integers and combined into the
//! 50-bit message word.

use crate::types::{Callsign, CallsignParts, GridLocator, PowerLevel};

/// Alphabet size used for callsign tokens (0-9, A-Z, space)
const RADIX: u64 = 37;

/// Value of the padding space character
const SPACE: u64 = 36;

/// Tokens shorter than this are right-padded with spaces
const MIN_TOKEN_LEN: usize = 3;

/// Offset added to the prefix code of a compound callsign
pub const COMPOUND_PREFIX_OFFSET: u64 = 1000 * RADIX * RADIX * RADIX;

/// Bit shift between compound prefix and suffix codes
pub const COMPOUND_SHIFT: u32 = 18;

/// Mask selecting the low 50 bits of the assembled message
pub const MESSAGE_MASK: u64 = (1 << super::MESSAGE_BITS) - 1;

fn char_value(c: u8) -> u64 {
    match c {
        b'0'..=b'9' => u64::from(c - b'0'),
        b'A'..=b'Z' => u64::from(c - b'A') + 10,
        _ => SPACE,
    }
}

/// Pack one callsign token in base 37, right-padded to three characters
#[must_use]
pub fn pack_token(token: &str) -> u64 {
    let mut code = token
        .bytes()
        .fold(0u64, |code, c| code * RADIX + char_value(c.to_ascii_uppercase()));
    for _ in token.len()..MIN_TOKEN_LEN {
        code = code * RADIX + SPACE;
    }
    code
}

/// Pack a validated callsign into its call code
#[must_use]
pub fn pack_callsign(callsign: &Callsign) -> u64 {
    match callsign.parts() {
        CallsignParts::Plain(token) => pack_token(token),
        CallsignParts::Compound { prefix, suffix } => {
            ((pack_token(prefix) + COMPOUND_PREFIX_OFFSET) << COMPOUND_SHIFT) | pack_token(suffix)
        }
    }
}

/// Pack locator and power into the low 32-bit word
#[must_use]
pub fn pack_grid_power(locator: GridLocator, power: PowerLevel) -> u64 {
    let lat = u64::from(locator.lat_field()) * 10 + u64::from(locator.lat_square());
    let lon = u64::from(locator.lon_field()) * 20 + u64::from(locator.lon_square()) * 2;
    (lat << 12) | (lon << 4) | u64::from(power.index())
}

/// Combine call and grid/power codes, truncated to 50 bits
#[must_use]
pub const fn assemble(call_code: u64, grid_power: u64) -> u64 {
    (call_code.wrapping_shl(32) | grid_power) & MESSAGE_MASK
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn short_token_is_padded() {
        assert_eq!(pack_token("A"), 10 * 37 * 37 + 36 * 37 + 36);
        assert_eq!(pack_token("AB"), (10 * 37 + 11) * 37 + 36);
    }

    #[test]
    fn plain_callsign_code() {
        let call = Callsign::parse("N0CALL").unwrap();
        assert_eq!(pack_callsign(&call), 1_595_533_335);
    }

    #[test]
    fn compound_callsign_code() {
        let call = Callsign::parse("AB/CD").unwrap();
        assert_eq!(pack_callsign(&call), 13_282_084_930_097);
    }

    #[test]
    fn grid_power_code() {
        let grid = GridLocator::parse("FN42").unwrap();
        let power = PowerLevel::from_dbm(37).unwrap();
        assert_eq!(pack_grid_power(grid, power), 542_411);
    }

    #[test]
    fn assemble_truncates_to_fifty_bits() {
        assert_eq!(assemble(13_282_084_930_097, 597_003), 72_778_221_427_723);
        assert_eq!(assemble(37_547_982, 542_411), 263_668_042_843_851);
    }
}
