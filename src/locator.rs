//! Maidenhead locator math
//!
//! Converts a latitude/longitude in decimal degrees into the four-character
//! grid square carried by a WSPR message.

#[cfg(feature = "embedded")]
use micromath::F32Ext;

use crate::types::GridLocator;

/// Degrees of longitude per field
const LON_FIELD_DEG: f32 = 20.0;
/// Degrees of latitude per field
const LAT_FIELD_DEG: f32 = 10.0;
/// Degrees of longitude per square
const LON_SQUARE_DEG: f32 = 2.0;
/// Degrees of latitude per square
const LAT_SQUARE_DEG: f32 = 1.0;

/// Field and square index along one axis
///
/// Values at or beyond the top edge (lat = +90, lon = +180) fall into the
/// last field and square; values below the bottom edge into the first.
fn axis_indices(shifted: f32, field_deg: f32, square_deg: f32) -> (u8, u8) {
    let last_field = GridLocator::FIELDS - 1;
    let last_square = GridLocator::SQUARES - 1;

    if shifted.is_nan() || shifted < 0.0 {
        return (0, 0);
    }

    #[allow(clippy::cast_possible_truncation, clippy::cast_sign_loss)]
    let field = (shifted / field_deg).floor() as u32;
    if field > u32::from(last_field) {
        return (last_field, last_square);
    }

    let within = shifted - field as f32 * field_deg;
    #[allow(clippy::cast_possible_truncation, clippy::cast_sign_loss)]
    let square = ((within / square_deg).floor() as u32).min(u32::from(last_square));

    #[allow(clippy::cast_possible_truncation)]
    (field as u8, square as u8)
}

/// Convert a position to its four-character locator
///
/// Southern latitudes and western longitudes are negative.
#[must_use]
pub fn to_locator(lat: f32, lon: f32) -> GridLocator {
    let (lon_field, lon_square) = axis_indices(lon + 180.0, LON_FIELD_DEG, LON_SQUARE_DEG);
    let (lat_field, lat_square) = axis_indices(lat + 90.0, LAT_FIELD_DEG, LAT_SQUARE_DEG);

    // Indices are clamped above, so construction cannot fail
    GridLocator::from_indices(lon_field, lat_field, lon_square, lat_square)
        .unwrap_or(GridLocator::ORIGIN)
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn origin_is_jj00() {
        assert_eq!(to_locator(0.0, 0.0).as_str(), "JJ00");
    }

    #[test]
    fn known_cities() {
        // Stockholm
        assert_eq!(to_locator(59.33, 18.07).as_str(), "JO99");
        // Newington, CT
        assert_eq!(to_locator(41.71, -72.73).as_str(), "FN31");
        // Sydney
        assert_eq!(to_locator(-33.87, 151.21).as_str(), "QF56");
    }
}
