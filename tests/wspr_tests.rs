//! WSPR Encoder Tests
//!
//! Tests for message packing, channel coding and the full symbol sequence.
//! Run with: cargo test --target x86_64-unknown-linux-gnu --no-default-features --features std --test wspr_tests

use wspr_beacon::types::{Callsign, GridLocator, PowerLevel};
use wspr_beacon::wspr::convolution::{encode_message, ConvolutionalEncoder};
use wspr_beacon::wspr::interleave::{interleave, TABLE};
use wspr_beacon::wspr::pack::{assemble, pack_callsign, pack_grid_power, pack_token, MESSAGE_MASK};
use wspr_beacon::wspr::sync::{merge, SYNC_VECTOR};
use wspr_beacon::wspr::{
    encode, tone_offset, EncodeError, WsprMessage, MESSAGE_BITS, SYMBOL_COUNT, SYMBOL_PERIOD_US,
    TONE_SPACING_MILLIHERTZ,
};

/// N0CALL AA00 10 dBm
const N0CALL_AA00_10: [u8; SYMBOL_COUNT] = [
    2, 2, 1, 1, 1, 0, 1, 0, 2, 1, 0, 0, 3, 3, 3, 1, 1, 0, 2, 0, 1, 2, 0, 2, 2, 2, 3, 0, 0, 1, //
    1, 0, 1, 0, 3, 1, 1, 2, 0, 2, 0, 0, 0, 0, 1, 0, 3, 1, 3, 3, 1, 0, 3, 3, 1, 2, 1, 0, 0, 3, //
    2, 1, 2, 1, 1, 1, 1, 3, 3, 1, 3, 1, 2, 0, 2, 0, 3, 0, 0, 2, 1, 0, 3, 1, 2, 3, 1, 1, 0, 2, //
    3, 1, 2, 0, 2, 0, 0, 0, 3, 1, 1, 1, 1, 1, 2, 0, 1, 3, 0, 1, 3, 2, 3, 0, 3, 3, 0, 1, 2, 3, //
    0, 2, 1, 0, 0, 2, 2, 3, 0, 0, 0, 0, 0, 3, 1, 3, 0, 1, 3, 2, 1, 0, 1, 0, 1, 1, 0, 2, 2, 1, //
    2, 1, 2, 3, 1, 1, 0, 2, 2, 0, 1, 0,
];

/// AB/CD JO65 37 dBm
const AB_CD_JO65_37: [u8; SYMBOL_COUNT] = [
    2, 3, 1, 1, 1, 0, 1, 1, 3, 0, 1, 1, 2, 2, 2, 0, 1, 0, 2, 0, 1, 3, 0, 2, 3, 3, 2, 0, 1, 1, //
    0, 0, 0, 0, 2, 1, 1, 3, 0, 3, 1, 1, 1, 1, 0, 1, 3, 0, 3, 2, 0, 1, 2, 2, 1, 3, 0, 1, 0, 2, //
    2, 1, 3, 1, 0, 1, 1, 2, 2, 0, 3, 1, 2, 0, 3, 1, 3, 1, 1, 3, 0, 1, 3, 1, 3, 3, 1, 1, 1, 2, //
    3, 1, 3, 1, 3, 0, 0, 0, 3, 1, 1, 0, 0, 1, 2, 1, 1, 3, 1, 1, 2, 2, 2, 0, 3, 2, 1, 1, 2, 2, //
    0, 3, 0, 1, 0, 3, 2, 3, 0, 0, 1, 0, 1, 2, 1, 3, 0, 0, 3, 3, 0, 0, 1, 1, 1, 1, 1, 2, 3, 0, //
    2, 0, 3, 2, 0, 0, 1, 3, 3, 0, 0, 1,
];

fn call(text: &str) -> Callsign {
    Callsign::parse(text).unwrap()
}

fn grid(text: &str) -> GridLocator {
    GridLocator::parse(text).unwrap()
}

fn dbm(value: u8) -> PowerLevel {
    PowerLevel::from_dbm(value).unwrap()
}

// =============================================================================
// Timing Constants
// =============================================================================

#[test]
fn test_symbol_period_is_8192_over_12000() {
    // 8192 / 12000 s = 682.666... ms
    assert_eq!(SYMBOL_PERIOD_US, 682_667);
    // 162 symbols last about 110.6 s, inside the 120 s slot
    let total_ms = SYMBOL_PERIOD_US * SYMBOL_COUNT as u64 / 1000;
    assert!(total_ms > 110_000 && total_ms < 111_000);
}

#[test]
fn test_tone_spacing() {
    // 12000 / 8192 Hz = 1.4648 Hz
    assert_eq!(TONE_SPACING_MILLIHERTZ, 1_465);
}

// =============================================================================
// Packing
// =============================================================================

#[test]
fn test_pack_token_padding() {
    assert_eq!(pack_token("A"), (10 * 37 + 36) * 37 + 36);
    assert_eq!(pack_token("ABC"), (10 * 37 + 11) * 37 + 12);
    assert_eq!(pack_token("abc"), pack_token("ABC"));
}

#[test]
fn test_pack_plain_callsigns() {
    assert_eq!(pack_callsign(&call("N0CALL")), 1_595_533_335);
    assert_eq!(pack_callsign(&call("K1ABC")), 37_547_982);
}

#[test]
fn test_pack_compound_callsign() {
    assert_eq!(pack_callsign(&call("AB/CD")), 13_282_084_930_097);
}

#[test]
fn test_pack_grid_power() {
    assert_eq!(pack_grid_power(grid("FN42"), dbm(37)), 542_411);
    assert_eq!(pack_grid_power(grid("JO65"), dbm(37)), 597_003);
    assert_eq!(pack_grid_power(grid("AA00"), dbm(0)), 0);
}

#[test]
fn test_assemble_masks_to_message_width() {
    assert_eq!(MESSAGE_MASK, (1 << MESSAGE_BITS) - 1);
    assert_eq!(assemble(13_282_084_930_097, 597_003), 72_778_221_427_723);
    assert!(assemble(u64::MAX, u64::MAX) <= MESSAGE_MASK);
}

#[test]
fn test_message_packed() {
    let message = WsprMessage::new("K1ABC", "FN42", 37).unwrap();
    assert_eq!(message.packed(), assemble(37_547_982, 542_411));
}

// =============================================================================
// Channel Coding
// =============================================================================

#[test]
fn test_convolution_impulse() {
    let mut encoder = ConvolutionalEncoder::new();
    assert_eq!(encoder.push(true), (1, 1));
}

#[test]
fn test_convolution_output_is_bits() {
    let coded = encode_message(MESSAGE_MASK);
    assert!(coded.iter().all(|&b| b <= 1));
}

#[test]
fn test_zero_message_codes_to_zero() {
    let coded = encode_message(0);
    assert!(coded.iter().all(|&b| b == 0));
}

#[test]
fn test_interleave_is_bit_reversal_permutation() {
    assert_eq!(TABLE[0], 0);
    assert_eq!(TABLE[1], 81);
    assert_eq!(TABLE[2], 41);

    let mut sorted = TABLE;
    sorted.sort_unstable();
    for (i, &index) in sorted.iter().enumerate() {
        assert_eq!(usize::from(index), i);
    }
}

#[test]
fn test_interleave_moves_single_bit() {
    let mut coded = [0u8; SYMBOL_COUNT];
    coded[81] = 1;
    let out = interleave(&coded);
    assert_eq!(out[1], 1);
    assert_eq!(out.iter().filter(|&&b| b == 1).count(), 1);
}

#[test]
fn test_sync_merge() {
    let data = [0u8; SYMBOL_COUNT];
    let symbols = merge(&data);
    for (symbol, sync) in symbols.iter().zip(SYNC_VECTOR.iter()) {
        assert_eq!(*symbol, 2 * sync);
    }

    let ones = merge(&[1u8; SYMBOL_COUNT]);
    for (symbol, sync) in ones.iter().zip(SYNC_VECTOR.iter()) {
        assert_eq!(*symbol, 2 * sync + 1);
    }
}

#[test]
fn test_sync_vector_leading_entries() {
    assert_eq!(&SYNC_VECTOR[..8], &[1, 1, 0, 0, 0, 0, 0, 0]);
    assert!(SYNC_VECTOR.iter().all(|&b| b <= 1));
}

#[test]
fn test_sync_vector_covers_every_symbol() {
    assert_eq!(SYNC_VECTOR.len(), SYMBOL_COUNT);
    assert_eq!(
        &SYNC_VECTOR[104..120],
        &[1, 0, 0, 1, 0, 0, 1, 1, 1, 0, 1, 1, 0, 0, 1, 1]
    );
    assert_eq!(&SYNC_VECTOR[150..], &[1, 0, 1, 1, 0, 0, 0, 1, 1, 0, 0, 0]);
}

#[test]
fn test_interleave_fills_every_position() {
    assert_eq!(TABLE.len(), SYMBOL_COUNT);
    let coded = [1u8; SYMBOL_COUNT];
    assert!(interleave(&coded).iter().all(|&b| b == 1));
}

// =============================================================================
// Full Encoding
// =============================================================================

#[test]
fn test_encode_n0call_reference() {
    let symbols = encode("N0CALL", "AA00", 10).unwrap();
    assert_eq!(symbols.as_slice(), &N0CALL_AA00_10);
}

#[test]
fn test_encode_compound_reference() {
    let symbols = encode("AB/CD", "JO65", 37).unwrap();
    assert_eq!(symbols.as_slice(), &AB_CD_JO65_37);
}

#[test]
fn test_encode_lowercase_matches() {
    assert_eq!(encode("n0call", "aa00", 10), encode("N0CALL", "AA00", 10));
}

#[test]
fn test_encode_symbols_in_range() {
    let symbols = encode("K1ABC", "FN42", 37).unwrap();
    assert_eq!(symbols.len(), SYMBOL_COUNT);
    assert!(!symbols.is_empty());
    assert!(symbols.iter().all(|s| s <= 3));
}

#[test]
fn test_encode_carries_sync_in_high_bit() {
    let symbols = encode("K1ABC", "FN42", 37).unwrap();
    for (symbol, &sync) in symbols.iter().zip(SYNC_VECTOR.iter()) {
        assert_eq!(symbol >> 1, sync);
    }
}

#[test]
fn test_message_accessors() {
    let message = WsprMessage::new("pj4/k1a", "fk52", 23).unwrap();
    assert_eq!(message.callsign().as_str(), "PJ4/K1A");
    assert_eq!(message.locator().as_str(), "FK52");
    assert_eq!(message.power().dbm(), 23);

    let same = WsprMessage::from_parts(call("PJ4/K1A"), grid("FK52"), dbm(23));
    assert_eq!(message.symbols(), same.symbols());
}

// =============================================================================
// Validation
// =============================================================================

#[test]
fn test_encode_invalid_locator() {
    assert_eq!(encode("N0CALL", "AA0", 10), Err(EncodeError::InvalidLocator));
    assert_eq!(encode("N0CALL", "1A00", 10), Err(EncodeError::InvalidLocator));
}

#[test]
fn test_encode_invalid_power() {
    assert_eq!(encode("N0CALL", "AA00", 5), Err(EncodeError::InvalidPower));
    assert_eq!(encode("N0CALL", "AA00", 61), Err(EncodeError::InvalidPower));
}

#[test]
fn test_encode_invalid_callsign() {
    assert_eq!(encode("1ABC", "AA00", 10), Err(EncodeError::InvalidCallsign));
    assert_eq!(encode("TOOLONG", "AA00", 10), Err(EncodeError::InvalidCallsign));
}

#[test]
fn test_locator_checked_first() {
    assert_eq!(encode("1ABC", "AA0", 5), Err(EncodeError::InvalidLocator));
    assert_eq!(encode("1ABC", "AA00", 5), Err(EncodeError::InvalidCallsign));
}

// =============================================================================
// Tone Mapping
// =============================================================================

#[test]
fn test_tone_offsets() {
    assert_eq!(tone_offset(0), 0);
    assert_eq!(tone_offset(1), 1);
    assert_eq!(tone_offset(2), -1);
    assert_eq!(tone_offset(3), 0);
}

#[test]
fn test_sequence_tone_offsets() {
    let symbols = encode("N0CALL", "AA00", 10).unwrap();
    let offsets: Vec<i8> = symbols.tone_offsets().collect();
    assert_eq!(offsets.len(), SYMBOL_COUNT);
    assert_eq!(&offsets[..4], &[-1, -1, 1, 1]);
}
