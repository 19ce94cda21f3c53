//! Console Protocol Tests
//!
//! Tests for operator console command parsing and response formatting.

use std::fmt::Write as _;

use wspr_beacon::beacon::state::TxOutcome;
use wspr_beacon::config::{BeaconConfig, ConfigError, ConfigKey, CONSOLE_RESPONSE_SIZE};
use wspr_beacon::protocol::{
    error_response, parse_command, respond, write_config, write_status, ConsoleCommand,
    ConsoleError, StatusReport, HELP_TEXT,
};
use wspr_beacon::time::UtcDateTime;
use wspr_beacon::types::{Frequency, TransmitterState};
use wspr_beacon::wspr::EncodeError;

fn set(key: &str, value: &str) -> ConsoleCommand {
    ConsoleCommand::Set {
        key: key.try_into().unwrap(),
        value: value.try_into().unwrap(),
    }
}

fn report(utc: Option<UtcDateTime>) -> StatusReport<'static> {
    StatusReport {
        transmitter: TransmitterState::Idle,
        gps_lock: true,
        locator: "JO65",
        frequency: Frequency::from_hz(14_097_100).unwrap(),
        utc,
        clock_trusted: true,
        last_outcome: Some(TxOutcome::Completed),
        transmissions: 3,
    }
}

// ============================================================================
// Keyword Tests
// ============================================================================

#[test]
fn test_parse_simple_commands() {
    assert_eq!(parse_command("help"), Ok(Some(ConsoleCommand::Help)));
    assert_eq!(parse_command("?"), Ok(Some(ConsoleCommand::Help)));
    assert_eq!(parse_command("status"), Ok(Some(ConsoleCommand::Status)));
    assert_eq!(parse_command("config"), Ok(Some(ConsoleCommand::Config)));
    assert_eq!(parse_command("gps"), Ok(Some(ConsoleCommand::Gps)));
    assert_eq!(parse_command("stop"), Ok(Some(ConsoleCommand::Stop)));
    assert_eq!(parse_command("reboot"), Ok(Some(ConsoleCommand::Reboot)));
}

#[test]
fn test_parse_case_and_whitespace() {
    assert_eq!(parse_command("  STATUS  "), Ok(Some(ConsoleCommand::Status)));
    assert_eq!(parse_command("Stop\r"), Ok(Some(ConsoleCommand::Stop)));
}

#[test]
fn test_parse_blank_line() {
    assert_eq!(parse_command(""), Ok(None));
    assert_eq!(parse_command("   \t "), Ok(None));
}

#[test]
fn test_parse_unknown() {
    assert_eq!(parse_command("transmit"), Err(ConsoleError::UnknownCommand));
    assert_eq!(parse_command("statuss"), Err(ConsoleError::UnknownCommand));
}

// ============================================================================
// Set Command Tests
// ============================================================================

#[test]
fn test_parse_set() {
    assert_eq!(parse_command("set callsign=K1ABC"), Ok(Some(set("callsign", "K1ABC"))));
    assert_eq!(parse_command("SET grid = jo65 "), Ok(Some(set("grid", "jo65"))));
    assert_eq!(parse_command("set band=20m"), Ok(Some(set("band", "20m"))));
}

#[test]
fn test_parse_set_missing_argument() {
    assert_eq!(parse_command("set"), Err(ConsoleError::MissingArg));
    assert_eq!(parse_command("set callsign"), Err(ConsoleError::MissingArg));
    assert_eq!(parse_command("set callsign="), Err(ConsoleError::MissingArg));
    assert_eq!(parse_command("set =K1ABC"), Err(ConsoleError::MissingArg));
}

#[test]
fn test_parse_set_unknown_key() {
    assert_eq!(
        parse_command("set volume=3"),
        Err(ConsoleError::Config(ConfigError::UnknownKey))
    );
}

#[test]
fn test_parse_set_value_too_long() {
    let line = format!("set callsign={}", "A".repeat(40));
    assert_eq!(parse_command(&line), Err(ConsoleError::LineTooLong));
}

// ============================================================================
// Error Tests
// ============================================================================

#[test]
fn test_error_codes() {
    assert_eq!(ConsoleError::UnknownCommand.code(), "E01");
    assert_eq!(ConsoleError::Config(ConfigError::UnknownKey).code(), "E02");
    assert_eq!(ConsoleError::MissingArg.code(), "E03");
    assert_eq!(ConsoleError::LineTooLong.code(), "E04");
    assert_eq!(ConsoleError::StorageError.code(), "E05");
}

#[test]
fn test_error_messages() {
    assert_eq!(
        ConsoleError::UnknownCommand.to_string(),
        "E01: unknown command (try 'help')"
    );
    assert_eq!(
        ConsoleError::from(ConfigError::InvalidValue(ConfigKey::Power)).to_string(),
        "E02: invalid value for power"
    );
    assert_eq!(ConsoleError::StorageError.to_string(), "E05: settings not saved");
}

#[test]
fn test_error_response_terminated() {
    let text = error_response(ConsoleError::MissingArg);
    assert_eq!(text.as_str(), "E03: usage: set <key>=<value>\r\n");
}

// ============================================================================
// Response Formatting Tests
// ============================================================================

#[test]
fn test_help_lists_every_command() {
    for command in ["status", "config", "set", "gps", "stop", "reboot"] {
        assert!(HELP_TEXT.contains(command), "help missing {command}");
    }
    assert!(HELP_TEXT.len() < CONSOLE_RESPONSE_SIZE);
}

#[test]
fn test_write_status() {
    let utc = UtcDateTime::new(2024, 6, 2, 12, 0, 0).unwrap();
    let mut out = String::new();
    write_status(&report(Some(utc)), &mut out).unwrap();
    assert_eq!(
        out,
        "state: IDLE\r\n\
         gps: LOCK\r\n\
         grid: JO65\r\n\
         freq: 14097100 Hz\r\n\
         utc: 2024-06-02 12:00:00\r\n\
         last tx: completed\r\n\
         sent: 3\r\n"
    );
}

#[test]
fn test_write_status_untrusted_clock() {
    let mut status = report(Some(UtcDateTime::EPOCH));
    status.clock_trusted = false;
    status.gps_lock = false;
    status.last_outcome = None;

    let mut out = String::new();
    write_status(&status, &mut out).unwrap();
    assert!(out.contains("gps: ----\r\n"));
    assert!(out.contains("utc: 2000-01-01 00:00:00 (unset)\r\n"));
    assert!(out.contains("last tx: none\r\n"));
}

#[test]
fn test_write_status_clock_unavailable() {
    let mut status = report(None);
    status.transmitter = TransmitterState::Transmitting;
    status.last_outcome = Some(TxOutcome::EncodeFailed(EncodeError::InvalidLocator));

    let mut out = String::new();
    write_status(&status, &mut out).unwrap();
    assert!(out.starts_with("state: TX\r\n"));
    assert!(out.contains("utc: unavailable\r\n"));
    assert!(out.contains("last tx: invalid locator\r\n"));
}

#[test]
fn test_write_config() {
    let mut out = String::new();
    write_config(&BeaconConfig::default(), &mut out).unwrap();
    assert_eq!(
        out,
        "callsign: N0CALL\r\ngrid: AA00\r\npower: 10\r\nfreq: 50294500\r\ntz: 0\r\n"
    );
}

#[test]
fn test_status_fits_response() {
    let utc = UtcDateTime::new(2024, 6, 2, 12, 0, 0).unwrap();
    let text = respond(|out| write_status(&report(Some(utc)), out));
    assert!(text.ends_with("sent: 3\r\n"));
}

#[test]
fn test_respond_truncates_overflow() {
    let text = respond(|out| {
        for _ in 0..50 {
            out.write_str("0123456789")?;
        }
        Ok(())
    });
    assert!(text.len() <= CONSOLE_RESPONSE_SIZE);
    assert!(text.starts_with("0123456789"));
    assert!(text.ends_with("..."));
}

#[test]
fn test_outcome_descriptions() {
    assert_eq!(TxOutcome::Completed.describe(), "completed");
    assert_eq!(TxOutcome::Aborted.describe(), "aborted");
    assert_eq!(TxOutcome::SynthesizerFault.describe(), "synthesizer fault");
    assert_eq!(
        TxOutcome::EncodeFailed(EncodeError::InvalidPower).describe(),
        "invalid power"
    );
}
