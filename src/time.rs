//! UTC date/time and DS3231 register encoding
//!
//! [`UtcDateTime`] is the wall-clock value passed between the GPS parser,
//! the real-time clock and the scheduler. It is always UTC; the display
//! offset from the `tz` setting is applied only when formatting.

use core::fmt;

/// Earliest year a clock reading is trusted
///
/// A DS3231 that lost power restarts in 2000; anything earlier than this
/// means the clock has not been set since.
pub const MIN_TRUSTED_YEAR: u16 = 2024;

/// Seconds in one day
const SECONDS_PER_DAY: i64 = 86_400;

/// Calendar date and time of day, UTC, 2000-2199
#[derive(Clone, Copy, Debug, PartialEq, Eq, PartialOrd, Ord, Hash)]
pub struct UtcDateTime {
    year: u16,
    month: u8,
    day: u8,
    hour: u8,
    minute: u8,
    second: u8,
}

impl UtcDateTime {
    /// First representable instant
    pub const EPOCH: Self = Self {
        year: 2000,
        month: 1,
        day: 1,
        hour: 0,
        minute: 0,
        second: 0,
    };

    /// Create a validated date/time
    #[must_use]
    pub const fn new(year: u16, month: u8, day: u8, hour: u8, minute: u8, second: u8) -> Option<Self> {
        if year < 2000 || year > 2199 || month < 1 || month > 12 {
            return None;
        }
        if day < 1 || day > days_in_month(year, month) {
            return None;
        }
        if hour > 23 || minute > 59 || second > 59 {
            return None;
        }
        Some(Self {
            year,
            month,
            day,
            hour,
            minute,
            second,
        })
    }

    /// Year (2000-2199)
    #[must_use]
    pub const fn year(&self) -> u16 {
        self.year
    }

    /// Month (1-12)
    #[must_use]
    pub const fn month(&self) -> u8 {
        self.month
    }

    /// Day of month (1-31)
    #[must_use]
    pub const fn day(&self) -> u8 {
        self.day
    }

    /// Hour (0-23)
    #[must_use]
    pub const fn hour(&self) -> u8 {
        self.hour
    }

    /// Minute (0-59)
    #[must_use]
    pub const fn minute(&self) -> u8 {
        self.minute
    }

    /// Second (0-59)
    #[must_use]
    pub const fn second(&self) -> u8 {
        self.second
    }

    /// ISO weekday, 1 = Monday through 7 = Sunday
    #[must_use]
    pub const fn weekday(&self) -> u8 {
        // 2000-01-01 was a Saturday (6)
        let days = days_from_civil(self.year, self.month, self.day);
        #[allow(clippy::cast_possible_truncation, clippy::cast_sign_loss)]
        let offset = (days + 5).rem_euclid(7) as u8;
        offset + 1
    }

    /// True once the clock has been set since its last power loss
    #[must_use]
    pub const fn is_trusted(&self) -> bool {
        self.year >= MIN_TRUSTED_YEAR
    }

    /// Seconds since 2000-01-01 00:00:00
    #[must_use]
    pub const fn seconds_since_epoch(&self) -> i64 {
        days_from_civil(self.year, self.month, self.day) * SECONDS_PER_DAY
            + self.hour as i64 * 3600
            + self.minute as i64 * 60
            + self.second as i64
    }

    /// Inverse of [`Self::seconds_since_epoch`], None outside 2000-2199
    #[must_use]
    pub fn from_seconds_since_epoch(seconds: i64) -> Option<Self> {
        let days = seconds.div_euclid(SECONDS_PER_DAY);
        let rem = seconds.rem_euclid(SECONDS_PER_DAY);
        let (year, month, day) = civil_from_days(days)?;
        Self::new(
            year,
            month,
            day,
            u8::try_from(rem / 3600).ok()?,
            u8::try_from(rem % 3600 / 60).ok()?,
            u8::try_from(rem % 60).ok()?,
        )
    }

    /// Shift by whole hours (local-time display); saturates at the range ends
    #[must_use]
    pub fn offset_hours(&self, hours: i8) -> Self {
        let shifted = self.seconds_since_epoch() + i64::from(hours) * 3600;
        Self::from_seconds_since_epoch(shifted).unwrap_or(*self)
    }

    /// Encode the seven DS3231 time registers (0x00-0x06), 24-hour mode
    #[must_use]
    pub const fn to_ds3231_registers(&self) -> [u8; 7] {
        let century = if self.year >= 2100 { 0x80 } else { 0 };
        #[allow(clippy::cast_possible_truncation)]
        let yy = (self.year % 100) as u8;
        [
            to_bcd(self.second),
            to_bcd(self.minute),
            to_bcd(self.hour),
            self.weekday(),
            to_bcd(self.day),
            to_bcd(self.month) | century,
            to_bcd(yy),
        ]
    }

    /// Decode the seven DS3231 time registers, None if any field is invalid
    #[must_use]
    pub fn from_ds3231_registers(regs: &[u8; 7]) -> Option<Self> {
        let second = from_bcd(regs[0] & 0x7F)?;
        let minute = from_bcd(regs[1] & 0x7F)?;
        let hour = decode_hour(regs[2])?;
        let day = from_bcd(regs[4] & 0x3F)?;
        let month = from_bcd(regs[5] & 0x1F)?;
        let century: u16 = if regs[5] & 0x80 == 0 { 2000 } else { 2100 };
        let year = century + u16::from(from_bcd(regs[6])?);
        Self::new(year, month, day, hour, minute, second)
    }
}

impl Default for UtcDateTime {
    fn default() -> Self {
        Self::EPOCH
    }
}

impl fmt::Display for UtcDateTime {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(
            f,
            "{:04}-{:02}-{:02} {:02}:{:02}:{:02}",
            self.year, self.month, self.day, self.hour, self.minute, self.second
        )
    }
}

#[cfg(feature = "embedded")]
impl defmt::Format for UtcDateTime {
    fn format(&self, f: defmt::Formatter) {
        defmt::write!(
            f,
            "{}-{:02}-{:02} {:02}:{:02}:{:02}Z",
            self.year,
            self.month,
            self.day,
            self.hour,
            self.minute,
            self.second
        );
    }
}

/// Binary to packed BCD (0-99)
#[must_use]
pub const fn to_bcd(value: u8) -> u8 {
    ((value / 10) << 4) | (value % 10)
}

/// Packed BCD to binary, None if either nibble is above 9
#[must_use]
pub const fn from_bcd(value: u8) -> Option<u8> {
    let high = value >> 4;
    let low = value & 0x0F;
    if high > 9 || low > 9 {
        None
    } else {
        Some(high * 10 + low)
    }
}

/// Hour register in either 12- or 24-hour mode
fn decode_hour(reg: u8) -> Option<u8> {
    if reg & 0x40 == 0 {
        return from_bcd(reg & 0x3F);
    }
    let hour12 = from_bcd(reg & 0x1F)?;
    if !(1..=12).contains(&hour12) {
        return None;
    }
    let pm = reg & 0x20 != 0;
    Some(match (hour12, pm) {
        (12, false) => 0,
        (12, true) => 12,
        (h, false) => h,
        (h, true) => h + 12,
    })
}

const fn is_leap_year(year: u16) -> bool {
    (year % 4 == 0 && year % 100 != 0) || year % 400 == 0
}

const fn days_in_month(year: u16, month: u8) -> u8 {
    match month {
        2 if is_leap_year(year) => 29,
        2 => 28,
        4 | 6 | 9 | 11 => 30,
        _ => 31,
    }
}

/// Days since 2000-01-01 for a civil date
const fn days_from_civil(year: u16, month: u8, day: u8) -> i64 {
    let y = if month <= 2 { year as i64 - 1 } else { year as i64 };
    let era = y.div_euclid(400);
    let yoe = y - era * 400;
    let m = month as i64;
    let mp = if m > 2 { m - 3 } else { m + 9 };
    let doy = (153 * mp + 2) / 5 + day as i64 - 1;
    let doe = yoe * 365 + yoe / 4 - yoe / 100 + doy;
    // 730_425 days separate 0000-03-01 and 2000-01-01
    era * 146_097 + doe - 730_425
}

/// Civil date for a day count since 2000-01-01
fn civil_from_days(days: i64) -> Option<(u16, u8, u8)> {
    let z = days + 730_425;
    let era = z.div_euclid(146_097);
    let doe = z - era * 146_097;
    let yoe = (doe - doe / 1460 + doe / 36_524 - doe / 146_096) / 365;
    let doy = doe - (365 * yoe + yoe / 4 - yoe / 100);
    let mp = (5 * doy + 2) / 153;
    let day = doy - (153 * mp + 2) / 5 + 1;
    let month = if mp < 10 { mp + 3 } else { mp - 9 };
    let year = yoe + era * 400 + i64::from(month <= 2);
    Some((
        u16::try_from(year).ok()?,
        u8::try_from(month).ok()?,
        u8::try_from(day).ok()?,
    ))
}
