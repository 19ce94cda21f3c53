//! Locator Module Tests
//!
//! Tests for latitude/longitude to Maidenhead conversion.
//! Run with: cargo test --target x86_64-unknown-linux-gnu --no-default-features --features std --test locator_tests

use wspr_beacon::locator::to_locator;
use wspr_beacon::types::GridLocator;

fn grid(lat: f32, lon: f32) -> String {
    to_locator(lat, lon).to_string()
}

// =============================================================================
// Known Positions
// =============================================================================

#[test]
fn test_null_island() {
    assert_eq!(grid(0.0, 0.0), "JJ00");
}

#[test]
fn test_known_stations() {
    // Copenhagen
    assert_eq!(grid(55.68, 12.57), "JO65");
    // Newington, CT
    assert_eq!(grid(41.71, -72.73), "FN31");
    // Boston
    assert_eq!(grid(42.36, -71.06), "FN42");
    // Sydney
    assert_eq!(grid(-33.87, 151.21), "QF56");
    // Buenos Aires
    assert_eq!(grid(-34.60, -58.38), "GF05");
    // Tokyo
    assert_eq!(grid(35.68, 139.69), "PM95");
}

#[test]
fn test_nmea_fix_position() {
    // 5919.800 N 01804.200 E as decoded from GGA
    assert_eq!(grid(59.33, 18.07), "JO99");
}

// =============================================================================
// Quadrant Signs
// =============================================================================

#[test]
fn test_just_south_west_of_origin() {
    assert_eq!(grid(-0.5, -0.5), "II99");
}

#[test]
fn test_just_north_east_of_origin() {
    assert_eq!(grid(0.5, 0.5), "JJ00");
}

// =============================================================================
// Edges and Clamping
// =============================================================================

#[test]
fn test_south_west_corner() {
    assert_eq!(grid(-90.0, -180.0), "AA00");
}

#[test]
fn test_north_east_corner_clamped() {
    // +90 / +180 lie on the outer edge and belong to the last square
    assert_eq!(grid(90.0, 180.0), "RR99");
}

#[test]
fn test_out_of_range_clamped() {
    assert_eq!(grid(-95.0, -190.0), "AA00");
    assert_eq!(grid(95.0, 190.0), "RR99");
}

#[test]
fn test_nan_falls_back_to_first_square() {
    assert_eq!(grid(f32::NAN, f32::NAN), "AA00");
}

#[test]
fn test_field_boundary() {
    // Exactly on a field line belongs to the field to the north/east
    assert_eq!(grid(10.0, 20.0), "KK00");
    assert_eq!(grid(9.99, 19.99), "JJ99");
}

#[test]
fn test_result_always_parses() {
    for lat in (-90..=90).step_by(15) {
        for lon in (-180..=180).step_by(30) {
            let locator = to_locator(lat as f32, lon as f32);
            assert_eq!(GridLocator::parse(locator.as_str()), Some(locator));
        }
    }
}
