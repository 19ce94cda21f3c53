//! Beacon Control Logic
//!
//! [`Beacon`] owns the runtime state and all hardware collaborators, and is
//! driven by the control loop: one [`Beacon::tick`] per loop iteration, plus
//! [`Beacon::handle_command`] for console requests between ticks.
//!
//! ```text
//!  GPS bytes ─► GpsParser ─┬─► ClockSync ─► UtcClock::write_utc
//!                          └─► Position  ─► BeaconState (locator, lock)
//!
//!  UtcClock::read_utc ─► Scheduler ─► transmit() ─► Synthesizer × 162 slots
//! ```

pub mod io;
pub mod scheduler;
pub mod state;
pub mod transmit;

use core::fmt::Write as _;

use crate::config::{BeaconConfig, ConfigKey, TX_CLOCK_OUTPUT};
use crate::gps::{GpsEvent, GpsParser};
use crate::protocol::{self, ConsoleCommand, Response, StatusReport};
use crate::time::UtcDateTime;

use io::{ByteSource, Indication, SlotTicker, StatusIndicator, Synthesizer, UtcClock};
use scheduler::Scheduler;
use state::{BeaconState, TxOutcome};
use transmit::{TransmitError, TransmitRequest};

/// Bytes pulled from the GPS source per read
const GPS_CHUNK: usize = 64;

/// Result of one loop tick
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum TickOutcome {
    /// No slot started; carries the clock reading
    Idle(UtcDateTime),
    /// A transmission ran to completion
    Transmitted {
        /// Symbols keyed
        symbols: usize,
    },
    /// A transmission was attempted and failed or was aborted
    Failed(TxOutcome),
    /// The clock could not be read; the tick was skipped
    ClockUnavailable,
}

/// Follow-up the caller must perform after a console command
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum CommandAction {
    /// Nothing further
    None,
    /// Write the configuration to persistent storage
    Persist,
    /// Reset the MCU once the reply is sent
    Reboot,
}

/// Console reply
#[derive(Clone, Debug, PartialEq, Eq)]
pub struct CommandReply {
    /// Text to send back
    pub text: Response,
    /// Follow-up action
    pub action: CommandAction,
}

impl CommandReply {
    fn text(text: Response) -> Self {
        Self {
            text,
            action: CommandAction::None,
        }
    }
}

/// The beacon context
pub struct Beacon<C, S, I, G, T> {
    clock: C,
    synth: S,
    indicator: I,
    gps: G,
    ticker: T,
    parser: GpsParser,
    scheduler: Scheduler,
    config: BeaconConfig,
    state: BeaconState,
    aborted_since_stop: bool,
}

impl<C, S, I, G, T> Beacon<C, S, I, G, T>
where
    C: UtcClock,
    S: Synthesizer,
    I: StatusIndicator,
    G: ByteSource,
    T: SlotTicker,
{
    /// Assemble a beacon from its collaborators
    pub fn new(config: BeaconConfig, clock: C, synth: S, indicator: I, gps: G, ticker: T) -> Self {
        let state = BeaconState::new(config.grid());
        Self {
            clock,
            synth,
            indicator,
            gps,
            ticker,
            parser: GpsParser::new(),
            scheduler: Scheduler::new(),
            config,
            state,
            aborted_since_stop: false,
        }
    }

    /// Replace the scheduler (custom guard interval)
    #[must_use]
    pub fn with_scheduler(mut self, scheduler: Scheduler) -> Self {
        self.scheduler = scheduler;
        self
    }

    /// Current settings
    pub const fn config(&self) -> &BeaconConfig {
        &self.config
    }

    /// Current runtime state
    pub const fn state(&self) -> &BeaconState {
        &self.state
    }

    /// Slot scheduler
    pub const fn scheduler(&self) -> &Scheduler {
        &self.scheduler
    }

    /// GPS line parser (for sentence statistics)
    pub const fn parser(&self) -> &GpsParser {
        &self.parser
    }

    /// Bring the beacon to its idle state
    ///
    /// Keys the carrier off and checks whether the clock holds a trusted
    /// time. `clock_lost` reports that the clock lost power since it was
    /// last set. An untrusted clock shows [`Indication::Fault`] until GPS
    /// sets it.
    ///
    /// # Errors
    ///
    /// Returns the clock error if the clock cannot be read.
    pub async fn start(&mut self, clock_lost: bool) -> Result<UtcDateTime, C::Error> {
        self.indicator.set_state(Indication::Boot);

        if let Err(_e) = self.synth.set_output(TX_CLOCK_OUTPUT, false).await {
            warn!("beacon: could not key synthesizer off");
        }

        let now = self.clock.read_utc().await?;
        let trusted = !clock_lost && now.is_trusted();
        self.state.set_clock_trusted(trusted);
        if !trusted {
            warn!("beacon: clock not set, waiting for GPS time");
        }
        info!("beacon: started, locator {=str}", self.state.locator());

        self.indicator.set_state(self.idle_indication());
        Ok(now)
    }

    /// Drain every buffered GPS byte and apply any events; returns the event count.
    ///
    /// Only bytes already buffered are read, so the call never waits on the receiver.
    pub async fn poll_gps(&mut self) -> usize {
        let mut buf = [0u8; GPS_CHUNK];
        let mut events = 0;

        loop {
            let n = self.gps.read_buffered(&mut buf).min(GPS_CHUNK);
            if n == 0 {
                break;
            }
            for &byte in &buf[..n] {
                if let Some(event) = self.parser.feed(byte) {
                    self.apply_gps_event(event).await;
                    events += 1;
                }
            }
        }
        events
    }

    async fn apply_gps_event(&mut self, event: GpsEvent) {
        match event {
            GpsEvent::ClockSync(time) => match self.clock.write_utc(time).await {
                Ok(()) => {
                    if !self.state.clock_trusted() {
                        info!("gps: clock set to {}", time);
                    }
                    self.state.record_sync(time);
                }
                Err(_e) => warn!("gps: clock write failed"),
            },
            GpsEvent::Position(fix) => {
                if self.state.apply_fix(fix) {
                    info!("gps: locator now {=str}", self.state.locator());
                }
            }
        }
    }

    /// One pass of the control loop
    ///
    /// Drains the GPS receiver, reads the clock and, at a slot start, runs a
    /// complete transmission before returning. `abort` is polled between
    /// symbol slots.
    pub async fn tick(&mut self, abort: impl FnMut() -> bool) -> TickOutcome {
        self.poll_gps().await;

        let now = match self.clock.read_utc().await {
            Ok(now) => now,
            Err(_e) => {
                warn!("beacon: clock read failed, skipping tick");
                return TickOutcome::ClockUnavailable;
            }
        };

        if !self.scheduler.should_start(&now) {
            self.indicator.set_state(self.idle_indication());
            return TickOutcome::Idle(now);
        }

        self.scheduler.begin(&now);
        self.state.begin_transmission();
        info!(
            "tx: start {=str} {=str} {} dBm at {}",
            self.config.callsign(),
            self.state.locator(),
            self.config.power_dbm(),
            now
        );

        let request = TransmitRequest {
            callsign: self.config.callsign(),
            locator: self.state.locator(),
            power_dbm: self.config.power_dbm(),
            base: self.config.frequency(),
            output: TX_CLOCK_OUTPUT,
        };
        let result = transmit::transmit(
            &request,
            &mut self.synth,
            &mut self.ticker,
            &mut self.indicator,
            abort,
        )
        .await;

        let outcome = match result {
            Ok(symbols) => {
                info!("tx: done, {} symbols", symbols);
                TickOutcome::Transmitted { symbols }
            }
            Err(TransmitError::Encode(err)) => {
                error!("tx: encode failed: {}", err);
                TickOutcome::Failed(TxOutcome::EncodeFailed(err))
            }
            Err(TransmitError::Synthesizer(_)) => {
                error!("tx: synthesizer error");
                TickOutcome::Failed(TxOutcome::SynthesizerFault)
            }
            Err(TransmitError::Aborted) => {
                warn!("tx: aborted");
                self.aborted_since_stop = true;
                TickOutcome::Failed(TxOutcome::Aborted)
            }
        };

        self.state.end_transmission(match outcome {
            TickOutcome::Failed(failure) => failure,
            _ => TxOutcome::Completed,
        });

        let finished = self.clock.read_utc().await.unwrap_or(now);
        self.scheduler.complete(&finished);
        outcome
    }

    /// Execute a console command
    pub async fn handle_command(&mut self, command: ConsoleCommand) -> CommandReply {
        debug!("console: {}", command);
        match command {
            ConsoleCommand::Help => CommandReply::text(protocol::respond(|out| out.write_str(protocol::HELP_TEXT))),
            ConsoleCommand::Status => {
                let utc = self.clock.read_utc().await.ok();
                let report = self.status_report(utc);
                CommandReply::text(protocol::respond(|out| protocol::write_status(&report, out)))
            }
            ConsoleCommand::Config => {
                CommandReply::text(protocol::respond(|out| protocol::write_config(&self.config, out)))
            }
            ConsoleCommand::Set { key, value } => match self.config.set(&key, &value) {
                Ok(updated) => {
                    if updated == ConfigKey::Grid && !self.state.gps_lock() {
                        self.state.set_locator_text(self.config.grid());
                    }
                    info!("config: {=str} updated", updated.name());
                    CommandReply {
                        text: protocol::respond(|out| write!(out, "{} updated\r\n", updated.name())),
                        action: CommandAction::Persist,
                    }
                }
                Err(err) => CommandReply::text(protocol::error_response(err.into())),
            },
            ConsoleCommand::Gps => {
                let events = self.poll_gps().await;
                let lock = if self.state.gps_lock() { "LOCK" } else { "----" };
                let locator = self.state.locator();
                CommandReply::text(protocol::respond(|out| {
                    write!(out, "gps: {events} events, {lock}, grid {locator}\r\n")
                }))
            }
            ConsoleCommand::Stop => {
                let text = if core::mem::take(&mut self.aborted_since_stop) {
                    "transmission aborted\r\n"
                } else {
                    "not transmitting\r\n"
                };
                CommandReply::text(protocol::respond(|out| out.write_str(text)))
            }
            ConsoleCommand::Reboot => CommandReply {
                text: protocol::respond(|out| out.write_str("rebooting\r\n")),
                action: CommandAction::Reboot,
            },
        }
    }

    /// Snapshot for the `status` command and the display
    pub fn status_report(&self, utc: Option<UtcDateTime>) -> StatusReport<'_> {
        StatusReport {
            transmitter: self.state.transmitter(),
            gps_lock: self.state.gps_lock(),
            locator: self.state.locator(),
            frequency: self.config.frequency(),
            utc,
            clock_trusted: self.state.clock_trusted(),
            last_outcome: self.state.last_outcome(),
            transmissions: self.state.transmissions(),
        }
    }

    fn idle_indication(&self) -> Indication {
        if self.state.clock_trusted() {
            Indication::Idle
        } else {
            Indication::Fault
        }
    }
}
