//! Bit-reversal interleaver
//!
//! Coded bits are scattered across the transmission so that a fade hits
//! non-adjacent bits of the convolutional code. `TABLE[i]` is the coded bit
//! that lands at output position `i`.

use super::SYMBOL_COUNT;

/// Output position to coded-bit index
pub const TABLE: [u8; SYMBOL_COUNT] = build_table();

/// Walk 0..=255, keep the bit-reversed indices below 162 and number them in order
const fn build_table() -> [u8; SYMBOL_COUNT] {
    let mut table = [0u8; SYMBOL_COUNT];
    let mut source = 0u8;
    let mut i: u16 = 0;
    while i < 256 {
        #[allow(clippy::cast_possible_truncation)]
        let j = (i as u8).reverse_bits() as usize;
        if j < SYMBOL_COUNT {
            table[j] = source;
            source += 1;
        }
        i += 1;
    }
    table
}

/// Permute coded bits into transmission order
#[must_use]
pub fn interleave(coded: &[u8; SYMBOL_COUNT]) -> [u8; SYMBOL_COUNT] {
    let mut out = [0u8; SYMBOL_COUNT];
    for (slot, &index) in out.iter_mut().zip(TABLE.iter()) {
        *slot = coded[usize::from(index)];
    }
    out
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn table_is_a_permutation() {
        let mut seen = [false; SYMBOL_COUNT];
        for &index in &TABLE {
            assert!(!seen[usize::from(index)], "duplicate index {index}");
            seen[usize::from(index)] = true;
        }
        assert!(seen.iter().all(|&s| s));
    }

    #[test]
    fn table_leading_entries() {
        assert_eq!(&TABLE[..8], &[0, 81, 41, 122, 21, 102, 61, 142]);
        assert_eq!(&TABLE[SYMBOL_COUNT - 2..], &[4, 85]);
    }
}
