//! Rate 1/2, constraint length 32 convolutional encoder

use super::{MESSAGE_BITS, SYMBOL_COUNT};

/// First generator polynomial
pub const POLY_A: u32 = 0xF2D0_5351;

/// Second generator polynomial
pub const POLY_B: u32 = 0xE461_3C47;

/// Zero bits clocked in after the message to flush the register
pub const TAIL_BITS: usize = SYMBOL_COUNT / 2 - MESSAGE_BITS;

/// Shift-register convolutional encoder
#[derive(Clone, Copy, Debug, Default)]
pub struct ConvolutionalEncoder {
    register: u32,
}

impl ConvolutionalEncoder {
    /// Create an encoder with a cleared register
    #[must_use]
    pub const fn new() -> Self {
        Self { register: 0 }
    }

    /// Shift one bit in and return the two parity bits
    pub fn push(&mut self, bit: bool) -> (u8, u8) {
        self.register = (self.register << 1) | u32::from(bit);
        (parity(self.register & POLY_A), parity(self.register & POLY_B))
    }
}

#[allow(clippy::cast_possible_truncation)]
const fn parity(value: u32) -> u8 {
    (value.count_ones() & 1) as u8
}

/// Encode a 50-bit message word (MSB first) plus tail into 162 coded bits
#[must_use]
pub fn encode_message(message: u64) -> [u8; SYMBOL_COUNT] {
    let mut encoder = ConvolutionalEncoder::new();
    let mut coded = [0u8; SYMBOL_COUNT];

    let message_bits = (0..MESSAGE_BITS).rev().map(|i| (message >> i) & 1 == 1);
    let tail = core::iter::repeat(false).take(TAIL_BITS);

    for (pair, bit) in coded.chunks_exact_mut(2).zip(message_bits.chain(tail)) {
        let (a, b) = encoder.push(bit);
        pair[0] = a;
        pair[1] = b;
    }
    coded
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn tail_fills_symbol_count() {
        assert_eq!(2 * (MESSAGE_BITS + TAIL_BITS), SYMBOL_COUNT);
    }

    #[test]
    fn zero_message_codes_to_zero() {
        assert!(encode_message(0).iter().all(|&b| b == 0));
    }

    #[test]
    fn single_one_bit_emits_generator_taps() {
        let mut encoder = ConvolutionalEncoder::new();
        // Low bit of both polynomials is set
        assert_eq!(encoder.push(true), (1, 1));
        // Register 0b10: bit 1 of POLY_A is 0, of POLY_B is 1
        assert_eq!(encoder.push(false), (0, 1));
    }
}
