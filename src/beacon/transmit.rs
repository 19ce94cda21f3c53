//! Transmission sequencing
//!
//! Encodes the message and keys it out one symbol per slot. The indicator
//! is set before encoding and cleared however the attempt ends; the carrier
//! is switched on with the first symbol and off afterwards.

use core::fmt;

use super::io::{Indication, SlotTicker, StatusIndicator, Synthesizer};
use crate::types::{ClockOutput, Frequency};
use crate::wspr::{self, EncodeError, TONE_SPACING_MILLIHERTZ};

/// Transmission failure
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum TransmitError<E> {
    /// Message fields did not validate
    Encode(EncodeError),
    /// Synthesizer write failed
    Synthesizer(E),
    /// Abort requested between symbols
    Aborted,
}

impl<E> From<EncodeError> for TransmitError<E> {
    fn from(err: EncodeError) -> Self {
        Self::Encode(err)
    }
}

impl<E> fmt::Display for TransmitError<E> {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::Encode(err) => write!(f, "encode failed: {err}"),
            Self::Synthesizer(_) => f.write_str("synthesizer error"),
            Self::Aborted => f.write_str("aborted"),
        }
    }
}

#[cfg(feature = "embedded")]
impl<E> defmt::Format for TransmitError<E> {
    fn format(&self, f: defmt::Formatter) {
        match self {
            Self::Encode(err) => defmt::write!(f, "Encode({})", err),
            Self::Synthesizer(_) => defmt::write!(f, "Synthesizer"),
            Self::Aborted => defmt::write!(f, "Aborted"),
        }
    }
}

/// Message fields and RF settings for one transmission
#[derive(Clone, Copy, Debug)]
pub struct TransmitRequest<'a> {
    /// Callsign text
    pub callsign: &'a str,
    /// Locator text
    pub locator: &'a str,
    /// Reported power in dBm
    pub power_dbm: u8,
    /// Frequency of tone 0
    pub base: Frequency,
    /// Synthesizer output to key
    pub output: ClockOutput,
}

/// Frequency for a tone offset, staying on `base` if the shift leaves the range
#[must_use]
pub fn tone_frequency(base: Frequency, offset: i8) -> Frequency {
    base.offset_millihertz(i64::from(offset) * TONE_SPACING_MILLIHERTZ)
        .unwrap_or(base)
}

/// Run one transmission
///
/// `abort` is polled between symbol slots. Returns the number of symbols sent.
///
/// # Errors
///
/// See [`TransmitError`]. On every error the indicator returns to
/// [`Indication::Idle`] and the output is switched off (best effort).
pub async fn transmit<S, T, I>(
    request: &TransmitRequest<'_>,
    synth: &mut S,
    ticker: &mut T,
    indicator: &mut I,
    mut abort: impl FnMut() -> bool,
) -> Result<usize, TransmitError<S::Error>>
where
    S: Synthesizer,
    T: SlotTicker,
    I: StatusIndicator,
{
    indicator.set_state(Indication::Transmitting);

    let symbols = match wspr::encode(request.callsign, request.locator, request.power_dbm) {
        Ok(symbols) => symbols,
        Err(err) => {
            indicator.set_state(Indication::Idle);
            return Err(err.into());
        }
    };

    let result = key_symbols(request, &symbols, synth, ticker, &mut abort).await;

    if let Err(_e) = synth.set_output(request.output, false).await {
        warn!("tx: failed to disable output");
    }
    indicator.set_state(Indication::Idle);
    result
}

async fn key_symbols<S, T>(
    request: &TransmitRequest<'_>,
    symbols: &wspr::SymbolSequence,
    synth: &mut S,
    ticker: &mut T,
    abort: &mut impl FnMut() -> bool,
) -> Result<usize, TransmitError<S::Error>>
where
    S: Synthesizer,
    T: SlotTicker,
{
    let mut sent = 0;
    ticker.restart();

    for (index, offset) in symbols.tone_offsets().enumerate() {
        if index > 0 && abort() {
            return Err(TransmitError::Aborted);
        }

        synth
            .set_frequency(request.output, tone_frequency(request.base, offset))
            .await
            .map_err(TransmitError::Synthesizer)?;

        if index == 0 {
            synth
                .set_output(request.output, true)
                .await
                .map_err(TransmitError::Synthesizer)?;
        }

        ticker.next_slot().await;
        sent += 1;
    }

    Ok(sent)
}
