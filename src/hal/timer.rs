//! Timer Abstractions
//!
//! Symbol pacing for transmissions and elapsed-time measurement.

use embassy_time::{Duration, Instant, Ticker};

use crate::beacon::io::SlotTicker;
use crate::wspr::SYMBOL_PERIOD_US;

/// Periodic ticker at the WSPR symbol rate
///
/// Built on [`Ticker`], so slot boundaries do not drift with the time spent
/// programming the synthesizer inside each slot.
pub struct SymbolTicker {
    ticker: Ticker,
}

impl SymbolTicker {
    /// Ticker with the WSPR symbol period
    #[must_use]
    pub fn new() -> Self {
        Self::with_period(Duration::from_micros(SYMBOL_PERIOD_US))
    }

    /// Ticker with a custom period
    #[must_use]
    pub fn with_period(period: Duration) -> Self {
        Self {
            ticker: Ticker::every(period),
        }
    }
}

impl Default for SymbolTicker {
    fn default() -> Self {
        Self::new()
    }
}

impl SlotTicker for SymbolTicker {
    fn restart(&mut self) {
        self.ticker.reset();
    }

    async fn next_slot(&mut self) {
        self.ticker.next().await;
    }
}

/// Allowed difference between measured and nominal transmission time
const TX_TOLERANCE: Duration = Duration::from_millis(500);

/// Measures how long a transmission took against the nominal symbol timing
#[derive(Clone, Copy, Debug, Default)]
pub struct TxTimer {
    started: Option<Instant>,
}

impl TxTimer {
    /// Timer that has not been started
    #[must_use]
    pub const fn new() -> Self {
        Self { started: None }
    }

    /// Mark the start of a loop pass that may transmit
    pub fn start(&mut self) {
        self.started = Some(Instant::now());
    }

    /// Time taken by `symbols` slots at the WSPR symbol rate
    #[must_use]
    pub fn nominal(symbols: usize) -> Duration {
        Duration::from_micros(SYMBOL_PERIOD_US * symbols as u64)
    }

    /// Stop the timer; returns the elapsed time and whether it stayed within
    /// tolerance of the nominal duration for `symbols`
    pub fn finish(&mut self, symbols: usize) -> (Duration, bool) {
        let elapsed = self
            .started
            .take()
            .map_or(Duration::from_ticks(0), |start| Instant::now() - start);
        let nominal = Self::nominal(symbols);
        let drift = if elapsed > nominal { elapsed - nominal } else { nominal - elapsed };
        (elapsed, drift <= TX_TOLERANCE)
    }
}
