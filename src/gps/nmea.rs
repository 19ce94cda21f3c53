//! NMEA 0183 sentence decoding
//!
//! Only the two sentences the beacon needs are decoded: RMC for date and
//! time, GGA for position. Any talker id is accepted (`$GP`, `$GN`, `$GL`...).

use core::fmt;

use crate::time::UtcDateTime;

/// Sentence decoding failure
///
/// These never leave the GPS module; a failing sentence is skipped.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum NmeaError {
    /// Line does not start with `$`
    MissingStart,
    /// `*hh` checksum does not match the sentence body
    BadChecksum,
    /// Sentence type is neither RMC nor GGA
    Unsupported,
    /// Fewer fields than the sentence type needs
    TooShort,
    /// Receiver reports no valid fix
    NoFix,
    /// A field that must be numeric is not, or is out of range
    InvalidField,
}

impl fmt::Display for NmeaError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let text = match self {
            Self::MissingStart => "missing '$'",
            Self::BadChecksum => "checksum mismatch",
            Self::Unsupported => "unsupported sentence",
            Self::TooShort => "too few fields",
            Self::NoFix => "no fix",
            Self::InvalidField => "invalid field",
        };
        f.write_str(text)
    }
}

#[cfg(feature = "embedded")]
impl defmt::Format for NmeaError {
    fn format(&self, f: defmt::Formatter) {
        match self {
            Self::MissingStart => defmt::write!(f, "MissingStart"),
            Self::BadChecksum => defmt::write!(f, "BadChecksum"),
            Self::Unsupported => defmt::write!(f, "Unsupported"),
            Self::TooShort => defmt::write!(f, "TooShort"),
            Self::NoFix => defmt::write!(f, "NoFix"),
            Self::InvalidField => defmt::write!(f, "InvalidField"),
        }
    }
}

/// Result type for sentence decoding
pub type NmeaResult<T> = Result<T, NmeaError>;

/// Position report from a GGA sentence
#[derive(Clone, Copy, Debug, PartialEq)]
pub struct GgaData {
    /// UTC time of day in seconds, if the receiver sent one
    pub seconds_of_day: Option<u32>,
    /// Latitude in degrees, south negative
    pub latitude: f32,
    /// Longitude in degrees, west negative
    pub longitude: f32,
    /// Fix quality indicator (1 = GPS, 2 = DGPS, ...)
    pub quality: u8,
    /// Satellites used, 0 if not reported
    pub satellites: u8,
}

/// Decoded sentence
#[derive(Clone, Copy, Debug, PartialEq)]
pub enum Sentence {
    /// Recommended minimum data with status `A`
    Rmc(UtcDateTime),
    /// Fix data with non-zero quality
    Gga(GgaData),
}

/// XOR of every byte between `$` and `*`
#[must_use]
pub fn checksum(body: &[u8]) -> u8 {
    body.iter().fold(0, |acc, &b| acc ^ b)
}

/// Decode one sentence (without the line terminator)
///
/// # Errors
///
/// Returns [`NmeaError`] if the sentence is malformed, reports no fix or is
/// of a type the beacon does not use.
pub fn parse_sentence(line: &str) -> NmeaResult<Sentence> {
    let line = line.trim();
    let body = line.strip_prefix('$').ok_or(NmeaError::MissingStart)?;

    let body = match body.split_once('*') {
        Some((body, sum)) => {
            let expected = u8::from_str_radix(sum.trim(), 16).map_err(|_| NmeaError::BadChecksum)?;
            if sum.trim().len() != 2 || checksum(body.as_bytes()) != expected {
                return Err(NmeaError::BadChecksum);
            }
            body
        }
        None => body,
    };

    let mut fields = body.split(',');
    let address = fields.next().ok_or(NmeaError::TooShort)?;
    if address.len() < 5 || !address.is_ascii() {
        return Err(NmeaError::Unsupported);
    }

    match &address[address.len() - 3..] {
        "RMC" => parse_rmc(fields),
        "GGA" => parse_gga(fields),
        _ => Err(NmeaError::Unsupported),
    }
}

/// `hhmmss[.sss],status,lat,N/S,lon,E/W,speed,course,ddmmyy,...`
fn parse_rmc<'a>(mut fields: impl Iterator<Item = &'a str>) -> NmeaResult<Sentence> {
    let time = fields.next().ok_or(NmeaError::TooShort)?;
    let status = fields.next().ok_or(NmeaError::TooShort)?;
    let date = fields.nth(6).ok_or(NmeaError::TooShort)?;

    if status != "A" {
        return Err(NmeaError::NoFix);
    }

    let (hour, minute, second) = parse_time(time)?;
    if date.len() != 6 || !date.is_ascii() {
        return Err(NmeaError::InvalidField);
    }
    let day = two_digits(&date[0..2])?;
    let month = two_digits(&date[2..4])?;
    let year = 2000 + u16::from(two_digits(&date[4..6])?);

    UtcDateTime::new(year, month, day, hour, minute, second)
        .map(Sentence::Rmc)
        .ok_or(NmeaError::InvalidField)
}

/// `hhmmss[.sss],lat,N/S,lon,E/W,quality,satellites,...`
fn parse_gga<'a>(mut fields: impl Iterator<Item = &'a str>) -> NmeaResult<Sentence> {
    let time = fields.next().ok_or(NmeaError::TooShort)?;
    let lat = fields.next().ok_or(NmeaError::TooShort)?;
    let lat_hemi = fields.next().ok_or(NmeaError::TooShort)?;
    let lon = fields.next().ok_or(NmeaError::TooShort)?;
    let lon_hemi = fields.next().ok_or(NmeaError::TooShort)?;
    let quality = fields.next().ok_or(NmeaError::TooShort)?;
    let satellites = fields.next().unwrap_or("");

    let quality: u8 = match quality {
        "" | "0" => return Err(NmeaError::NoFix),
        q => q.parse().map_err(|_| NmeaError::InvalidField)?,
    };
    if quality == 0 {
        return Err(NmeaError::NoFix);
    }

    let latitude = parse_coordinate(lat, lat_hemi, Axis::Latitude)?;
    let longitude = parse_coordinate(lon, lon_hemi, Axis::Longitude)?;

    let seconds_of_day = parse_time(time)
        .ok()
        .map(|(h, m, s)| u32::from(h) * 3600 + u32::from(m) * 60 + u32::from(s));

    Ok(Sentence::Gga(GgaData {
        seconds_of_day,
        latitude,
        longitude,
        quality,
        satellites: satellites.parse().unwrap_or(0),
    }))
}

/// `hhmmss` with optional fractional seconds
fn parse_time(field: &str) -> NmeaResult<(u8, u8, u8)> {
    if field.len() < 6 || !field.is_ascii() {
        return Err(NmeaError::InvalidField);
    }
    let hour = two_digits(&field[0..2])?;
    let minute = two_digits(&field[2..4])?;
    let second = two_digits(&field[4..6])?;
    if hour > 23 || minute > 59 || second > 59 {
        return Err(NmeaError::InvalidField);
    }
    Ok((hour, minute, second))
}

fn two_digits(field: &str) -> NmeaResult<u8> {
    match field.as_bytes() {
        [a @ b'0'..=b'9', b @ b'0'..=b'9'] => Ok((a - b'0') * 10 + (b - b'0')),
        _ => Err(NmeaError::InvalidField),
    }
}

#[derive(Clone, Copy)]
enum Axis {
    Latitude,
    Longitude,
}

impl Axis {
    const fn degree_digits(self) -> usize {
        match self {
            Self::Latitude => 2,
            Self::Longitude => 3,
        }
    }

    const fn limit(self) -> f32 {
        match self {
            Self::Latitude => 90.0,
            Self::Longitude => 180.0,
        }
    }

    const fn negative(self) -> char {
        match self {
            Self::Latitude => 'S',
            Self::Longitude => 'W',
        }
    }

    const fn positive(self) -> char {
        match self {
            Self::Latitude => 'N',
            Self::Longitude => 'E',
        }
    }
}

/// `ddmm.mmmm` / `dddmm.mmmm` plus hemisphere into signed degrees
fn parse_coordinate(value: &str, hemisphere: &str, axis: Axis) -> NmeaResult<f32> {
    let split = axis.degree_digits();
    let whole = value.split('.').next().unwrap_or("");
    if whole.len() != split + 2 || !value.is_ascii() {
        return Err(NmeaError::InvalidField);
    }

    let degrees: u16 = value[..split].parse().map_err(|_| NmeaError::InvalidField)?;
    let minutes: f32 = value[split..].parse().map_err(|_| NmeaError::InvalidField)?;
    if !(0.0..60.0).contains(&minutes) {
        return Err(NmeaError::InvalidField);
    }

    let magnitude = f32::from(degrees) + minutes / 60.0;
    if magnitude > axis.limit() {
        return Err(NmeaError::InvalidField);
    }

    let mut hemi = hemisphere.chars();
    match (hemi.next(), hemi.next()) {
        (Some(c), None) if c == axis.positive() => Ok(magnitude),
        (Some(c), None) if c == axis.negative() => Ok(-magnitude),
        _ => Err(NmeaError::InvalidField),
    }
}
