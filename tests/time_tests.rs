//! Time Module Tests
//!
//! Tests for UTC date arithmetic and DS3231 register encoding.
//! Run with: cargo test --target x86_64-unknown-linux-gnu --no-default-features --features std --test time_tests

use wspr_beacon::time::{from_bcd, to_bcd, UtcDateTime, MIN_TRUSTED_YEAR};

fn utc(year: u16, month: u8, day: u8, hour: u8, minute: u8, second: u8) -> UtcDateTime {
    UtcDateTime::new(year, month, day, hour, minute, second).unwrap()
}

// =============================================================================
// Construction
// =============================================================================

#[test]
fn test_valid_dates() {
    assert!(UtcDateTime::new(2024, 2, 29, 0, 0, 0).is_some()); // leap year
    assert!(UtcDateTime::new(2000, 2, 29, 0, 0, 0).is_some()); // divisible by 400
    assert!(UtcDateTime::new(2199, 12, 31, 23, 59, 59).is_some());
}

#[test]
fn test_invalid_dates() {
    assert!(UtcDateTime::new(2023, 2, 29, 0, 0, 0).is_none());
    assert!(UtcDateTime::new(2100, 2, 29, 0, 0, 0).is_none()); // century, not leap
    assert!(UtcDateTime::new(2024, 4, 31, 0, 0, 0).is_none());
    assert!(UtcDateTime::new(2024, 13, 1, 0, 0, 0).is_none());
    assert!(UtcDateTime::new(2024, 0, 1, 0, 0, 0).is_none());
    assert!(UtcDateTime::new(2024, 1, 0, 0, 0, 0).is_none());
    assert!(UtcDateTime::new(1999, 12, 31, 0, 0, 0).is_none());
    assert!(UtcDateTime::new(2200, 1, 1, 0, 0, 0).is_none());
}

#[test]
fn test_invalid_times() {
    assert!(UtcDateTime::new(2024, 1, 1, 24, 0, 0).is_none());
    assert!(UtcDateTime::new(2024, 1, 1, 0, 60, 0).is_none());
    assert!(UtcDateTime::new(2024, 1, 1, 0, 0, 60).is_none());
}

#[test]
fn test_accessors() {
    let t = utc(2024, 6, 2, 12, 34, 56);
    assert_eq!(t.year(), 2024);
    assert_eq!(t.month(), 6);
    assert_eq!(t.day(), 2);
    assert_eq!(t.hour(), 12);
    assert_eq!(t.minute(), 34);
    assert_eq!(t.second(), 56);
}

#[test]
fn test_display() {
    assert_eq!(utc(2024, 6, 2, 9, 5, 7).to_string(), "2024-06-02 09:05:07");
}

#[test]
fn test_default_is_epoch() {
    assert_eq!(UtcDateTime::default(), UtcDateTime::EPOCH);
    assert_eq!(UtcDateTime::EPOCH.to_string(), "2000-01-01 00:00:00");
}

// =============================================================================
// Trust
// =============================================================================

#[test]
fn test_trusted_year() {
    assert!(utc(MIN_TRUSTED_YEAR, 1, 1, 0, 0, 0).is_trusted());
    assert!(!utc(MIN_TRUSTED_YEAR - 1, 12, 31, 23, 59, 59).is_trusted());
    assert!(!UtcDateTime::EPOCH.is_trusted());
}

// =============================================================================
// Epoch Arithmetic
// =============================================================================

#[test]
fn test_seconds_since_epoch() {
    assert_eq!(UtcDateTime::EPOCH.seconds_since_epoch(), 0);
    assert_eq!(utc(2000, 1, 2, 0, 0, 0).seconds_since_epoch(), 86_400);
    // 2024-01-01 is 8766 days after 2000-01-01
    assert_eq!(utc(2024, 1, 1, 0, 0, 0).seconds_since_epoch(), 8_766 * 86_400);
}

#[test]
fn test_epoch_round_trip() {
    for t in [
        utc(2000, 2, 29, 1, 2, 3),
        utc(2024, 2, 29, 23, 59, 59),
        utc(2024, 12, 31, 12, 0, 0),
        utc(2100, 3, 1, 0, 0, 0),
        utc(2199, 12, 31, 23, 59, 59),
    ] {
        assert_eq!(UtcDateTime::from_seconds_since_epoch(t.seconds_since_epoch()), Some(t));
    }
}

#[test]
fn test_from_seconds_out_of_range() {
    assert!(UtcDateTime::from_seconds_since_epoch(-1).is_none());
}

#[test]
fn test_ordering_follows_time() {
    assert!(utc(2024, 6, 2, 12, 0, 0) < utc(2024, 6, 2, 12, 0, 1));
    assert!(utc(2024, 6, 2, 23, 59, 59) < utc(2024, 6, 3, 0, 0, 0));
}

// =============================================================================
// Time Zone Offset
// =============================================================================

#[test]
fn test_offset_hours() {
    let t = utc(2024, 6, 2, 23, 4, 5);
    assert_eq!(t.offset_hours(2), utc(2024, 6, 3, 1, 4, 5));
    assert_eq!(t.offset_hours(-5), utc(2024, 6, 2, 18, 4, 5));
    assert_eq!(t.offset_hours(0), t);
}

#[test]
fn test_offset_across_year_end() {
    let t = utc(2024, 12, 31, 22, 0, 0);
    assert_eq!(t.offset_hours(3), utc(2025, 1, 1, 1, 0, 0));
}

#[test]
fn test_offset_before_epoch_keeps_time() {
    // The shifted value cannot be represented; the original is returned
    assert_eq!(UtcDateTime::EPOCH.offset_hours(-1), UtcDateTime::EPOCH);
}

// =============================================================================
// Weekday
// =============================================================================

#[test]
fn test_weekday() {
    // 1 = Monday ... 7 = Sunday
    assert_eq!(UtcDateTime::EPOCH.weekday(), 6); // Saturday
    assert_eq!(utc(2024, 6, 2, 0, 0, 0).weekday(), 7); // Sunday
    assert_eq!(utc(2024, 6, 3, 0, 0, 0).weekday(), 1); // Monday
}

// =============================================================================
// BCD
// =============================================================================

#[test]
fn test_bcd() {
    assert_eq!(to_bcd(0), 0x00);
    assert_eq!(to_bcd(59), 0x59);
    assert_eq!(from_bcd(0x59), Some(59));
    assert_eq!(from_bcd(0x5A), None);
    assert_eq!(from_bcd(0xA0), None);
}

// =============================================================================
// DS3231 Registers
// =============================================================================

#[test]
fn test_register_encoding() {
    let t = utc(2024, 6, 2, 13, 45, 30);
    assert_eq!(t.to_ds3231_registers(), [0x30, 0x45, 0x13, 7, 0x02, 0x06, 0x24]);
}

#[test]
fn test_register_century_bit() {
    let t = utc(2101, 1, 1, 0, 0, 0);
    let regs = t.to_ds3231_registers();
    assert_eq!(regs[5], 0x81);
    assert_eq!(regs[6], 0x01);
    assert_eq!(UtcDateTime::from_ds3231_registers(&regs), Some(t));
}

#[test]
fn test_register_round_trip() {
    let t = utc(2024, 2, 29, 23, 59, 59);
    assert_eq!(UtcDateTime::from_ds3231_registers(&t.to_ds3231_registers()), Some(t));
}

#[test]
fn test_register_twelve_hour_mode() {
    // 12-hour flag (bit 6) with PM (bit 5): 0x72 is 12-hour, PM, 12 -> 12:00
    let mut regs = [0x00, 0x00, 0x72, 1, 0x02, 0x06, 0x24];
    assert_eq!(UtcDateTime::from_ds3231_registers(&regs).unwrap().hour(), 12);

    // 12 AM is midnight
    regs[2] = 0x52;
    assert_eq!(UtcDateTime::from_ds3231_registers(&regs).unwrap().hour(), 0);

    // 3 PM
    regs[2] = 0x63;
    assert_eq!(UtcDateTime::from_ds3231_registers(&regs).unwrap().hour(), 15);
}

#[test]
fn test_register_invalid_rejected() {
    // 0x5A seconds is not BCD
    assert!(UtcDateTime::from_ds3231_registers(&[0x5A, 0, 0, 1, 1, 1, 0x24]).is_none());
    // Day zero after power loss with cleared registers
    assert!(UtcDateTime::from_ds3231_registers(&[0, 0, 0, 1, 0, 0, 0]).is_none());
}
