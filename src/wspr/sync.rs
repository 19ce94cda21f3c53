//! Synchronisation vector
//!
//! The receiver locks onto this pseudo-random pattern; it occupies the high
//! bit of every channel symbol.

use super::SYMBOL_COUNT;

/// Sync bit for each symbol position
pub const SYNC_VECTOR: [u8; SYMBOL_COUNT] = [
    1, 1, 0, 0, 0, 0, 0, 0, 1, 0, 0, 0, 1, 1, 1, 0, 0, 0, 1, 0, //
    0, 1, 0, 1, 1, 1, 1, 0, 0, 0, 0, 0, 0, 0, 1, 0, 0, 1, 0, 1, //
    0, 0, 0, 0, 0, 0, 1, 0, 1, 1, 0, 0, 1, 1, 0, 1, 0, 0, 0, 1, //
    1, 0, 1, 0, 0, 0, 0, 1, 1, 0, 1, 0, 1, 0, 1, 0, 1, 0, 0, 1, //
    0, 0, 1, 0, 1, 1, 0, 0, 0, 1, 1, 0, 1, 0, 1, 0, 0, 0, 1, 0, //
    0, 0, 0, 0, 1, 0, 0, 1, 0, 0, 1, 1, 1, 0, 1, 1, 0, 0, 1, 1, //
    0, 1, 0, 0, 0, 1, 1, 1, 0, 0, 0, 0, 0, 1, 0, 1, 0, 0, 1, 1, //
    0, 0, 0, 0, 0, 0, 0, 1, 1, 0, 1, 0, 1, 1, 0, 0, 0, 1, 1, 0, //
    0, 0,
];

/// Combine interleaved data bits with the sync vector: `2 * sync + data`
#[must_use]
pub fn merge(data: &[u8; SYMBOL_COUNT]) -> [u8; SYMBOL_COUNT] {
    let mut symbols = [0u8; SYMBOL_COUNT];
    for ((symbol, &sync), &bit) in symbols.iter_mut().zip(SYNC_VECTOR.iter()).zip(data.iter()) {
        *symbol = 2 * sync + (bit & 1);
    }
    symbols
}
