//! `Si5351A` frequency plan calculation
//!
//! Computes PLL and multisynth divider settings for a target output
//! frequency with millihertz resolution. Host-testable; the driver in
//! `drivers::si5351` only turns a [`SynthesisPlan`] into register writes.
//!
//! # Theory of Operation
//!
//! The Si5351 uses a two-stage frequency synthesis:
//! 1. PLL stage: FVCO = FXTAL × (a + b/c) where 15 ≤ a ≤ 90
//! 2. Multisynth stage: FOUT = FVCO / (d × R) with an even integer d
//!
//! The multisynth is kept an even integer and all fine tuning happens in the
//! PLL fraction. A WSPR tone step is tiny compared to the divider spacing, so
//! every tone of a transmission lands on the same multisynth setting and only
//! the PLL numerator/denominator change between symbols.

use crate::types::Frequency;

/// PLL parameters
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub struct PllParams {
    /// Integer part (15-90)
    pub a: u32,
    /// Numerator (0 to c-1)
    pub b: u32,
    /// Denominator (1-1048575)
    pub c: u32,
}

impl PllParams {
    /// Minimum PLL multiplier
    pub const MIN_A: u32 = 15;
    /// Maximum PLL multiplier
    pub const MAX_A: u32 = 90;
    /// Maximum denominator (20 bits)
    pub const MAX_C: u32 = 1_048_575;

    /// VCO frequency in millihertz for a crystal frequency in Hz
    #[must_use]
    pub fn vco_millihertz(&self, xtal_hz: u64) -> u64 {
        let xtal = u128::from(xtal_hz) * 1000;
        let vco = xtal * (u128::from(self.a) * u128::from(self.c) + u128::from(self.b)) / u128::from(self.c);
        u64::try_from(vco).unwrap_or(u64::MAX)
    }

    /// Validate parameters are in range
    #[must_use]
    pub const fn is_valid(&self) -> bool {
        self.a >= Self::MIN_A
            && self.a <= Self::MAX_A
            && self.c >= 1
            && self.c <= Self::MAX_C
            && self.b < self.c
    }

    /// P1, P2, P3 register values
    #[must_use]
    pub const fn to_registers(&self) -> (u32, u32, u32) {
        encode_divider(self.a, self.b, self.c)
    }
}

/// Multisynth divider parameters (even integer only)
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub struct MsParams {
    /// Integer divisor (4, 6-1800, even)
    pub a: u32,
    /// R divider power of 2 (0-7 for 1, 2, 4, ... 128)
    pub r_div: u8,
}

impl MsParams {
    /// Minimum integer divisor
    pub const MIN_A: u32 = 4;
    /// Maximum integer divisor
    pub const MAX_A: u32 = 1800;
    /// Largest R divider exponent
    pub const MAX_R_DIV: u8 = 7;

    /// Total division ratio including the R divider
    #[must_use]
    pub const fn total_divisor(&self) -> u64 {
        (self.a as u64) << self.r_div
    }

    /// Validate parameters are in range
    #[must_use]
    pub const fn is_valid(&self) -> bool {
        // a=5 is not allowed, odd divisors are never produced here
        let a_valid = self.a == 4 || (self.a >= 6 && self.a <= Self::MAX_A);
        a_valid && self.a % 2 == 0 && self.r_div <= Self::MAX_R_DIV
    }

    /// P1, P2, P3 register values
    #[must_use]
    pub const fn to_registers(&self) -> (u32, u32, u32) {
        encode_divider(self.a, 0, 1)
    }
}

/// Datasheet encoding of a + b/c into P1, P2, P3
const fn encode_divider(a: u32, b: u32, c: u32) -> (u32, u32, u32) {
    let floor_128b_c = (128 * b as u64 / c as u64) as u32;
    let p1 = 128 * a + floor_128b_c - 512;
    let p2 = ((128 * b as u64) - (c as u64 * floor_128b_c as u64)) as u32;
    (p1, p2, c)
}

/// Complete divider plan for one output frequency
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub struct SynthesisPlan {
    /// PLL feedback divider
    pub pll: PllParams,
    /// Output multisynth divider
    pub ms: MsParams,
    /// Frequency actually produced, in millihertz
    pub actual_millihertz: u64,
    /// Actual minus requested, in millihertz
    pub error_millihertz: i64,
}

/// Minimum VCO frequency (600 MHz)
pub const VCO_MIN_HZ: u64 = 600_000_000;
/// Maximum VCO frequency (900 MHz)
pub const VCO_MAX_HZ: u64 = 900_000_000;

/// Pick the multisynth divider that puts the VCO as high as possible
#[must_use]
pub fn choose_multisynth(target: Frequency) -> Option<MsParams> {
    let target_mhz = target.as_millihertz();
    for r_div in 0..=MsParams::MAX_R_DIV {
        let effective = target_mhz << r_div;
        // Largest even divisor that keeps the VCO at or under the maximum
        let a = ((VCO_MAX_HZ * 1000 / effective) & !1).min(u64::from(MsParams::MAX_A));
        if a < u64::from(MsParams::MIN_A) {
            return None;
        }
        if effective * a >= VCO_MIN_HZ * 1000 {
            let ms = MsParams {
                a: u32::try_from(a).ok()?,
                r_div,
            };
            return ms.is_valid().then_some(ms);
        }
    }
    None
}

/// Calculate a plan for `target`, reusing the multisynth choice if given
///
/// Passing the divider of the previous symbol keeps the output path fixed so
/// only the PLL needs reprogramming.
#[must_use]
pub fn plan_with_multisynth(xtal_hz: u64, target: Frequency, ms: MsParams) -> Option<SynthesisPlan> {
    let vco_mhz = target.as_millihertz().checked_mul(ms.total_divisor())?;
    if !(VCO_MIN_HZ * 1000..=VCO_MAX_HZ * 1000).contains(&vco_mhz) {
        return None;
    }
    let pll = calculate_pll_params(xtal_hz, vco_mhz)?;
    let actual_millihertz = pll.vco_millihertz(xtal_hz) / ms.total_divisor();
    let error_millihertz = i64::try_from(actual_millihertz).ok()? - i64::try_from(target.as_millihertz()).ok()?;
    Some(SynthesisPlan {
        pll,
        ms,
        actual_millihertz,
        error_millihertz,
    })
}

/// Calculate a full plan for `target`
#[must_use]
pub fn calculate_frequency(xtal_hz: u64, target: Frequency) -> Option<SynthesisPlan> {
    let ms = choose_multisynth(target)?;
    plan_with_multisynth(xtal_hz, target, ms)
}

/// PLL parameters for a VCO frequency given in millihertz
fn calculate_pll_params(xtal_hz: u64, vco_mhz: u64) -> Option<PllParams> {
    let xtal_mhz = xtal_hz.checked_mul(1000)?;
    let mut a = vco_mhz / xtal_mhz;
    let remainder = vco_mhz - a * xtal_mhz;

    let (mut b, mut c) = rational_approximation(remainder, xtal_mhz, PllParams::MAX_C);
    if b >= c {
        // Fraction rounded up to one
        a += 1;
        b = 0;
        c = 1;
    }

    let pll = PllParams {
        a: u32::try_from(a).ok()?,
        b,
        c,
    };
    pll.is_valid().then_some(pll)
}

/// Best rational approximation b/c ≈ num/den with c ≤ `max_c`
///
/// Continued-fraction convergents with a final semiconvergent step.
/// Requires `num < den`.
#[must_use]
pub fn rational_approximation(num: u64, den: u64, max_c: u32) -> (u32, u32) {
    if num == 0 || den == 0 {
        return (0, 1);
    }
    let max_c = u64::from(max_c);

    // Convergents h/k, previous in (h0, k0), current in (h1, k1)
    let (mut h0, mut k0, mut h1, mut k1) = (0u64, 1u64, 1u64, 0u64);
    let (mut n, mut d) = (num, den);

    loop {
        let term = n / d;
        let h2 = term * h1 + h0;
        let k2 = term * k1 + k0;

        if k2 > max_c {
            // Largest semiconvergent that still fits
            let step = (max_c - k0) / k1;
            let (hs, ks) = (h0 + step * h1, k0 + step * k1);
            let (h, k) = if closer(num, den, (hs, ks), (h1, k1)) {
                (hs, ks)
            } else {
                (h1, k1)
            };
            return narrow(h, k);
        }

        (h0, k0, h1, k1) = (h1, k1, h2, k2);
        let rest = n - term * d;
        if rest == 0 {
            return narrow(h1, k1);
        }
        (n, d) = (d, rest);
    }
}

/// True if `a` is strictly closer to num/den than `b`
fn closer(num: u64, den: u64, a: (u64, u64), b: (u64, u64)) -> bool {
    let distance = |(h, k): (u64, u64)| {
        let lhs = u128::from(h) * u128::from(den);
        let rhs = u128::from(num) * u128::from(k);
        lhs.abs_diff(rhs)
    };
    // |h/k - num/den| = distance / (k * den); compare without dividing
    distance(a) * u128::from(b.1) < distance(b) * u128::from(a.1)
}

fn narrow(h: u64, k: u64) -> (u32, u32) {
    match (u32::try_from(h), u32::try_from(k)) {
        (Ok(h), Ok(k)) if k > 0 => (h, k),
        _ => (0, 1),
    }
}
