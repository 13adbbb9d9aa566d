//! Variant-specific configuration handshake.
//!
//! The module does not reliably accept a new command before the previous
//! one is processed, so every step is followed by a fixed settle delay.
//! After each settle the buffered response lines are drained and checked
//! against the step's expected acknowledgment; a mismatch aborts the
//! bring-up instead of silently continuing.

use crate::device::{DeviceProfile, Variant};
use crate::protocol::Command;
use crate::transport::{SharedTransport, TransportError};
use std::time::Duration;
use thiserror::Error;
use tracing::{debug, warn};

/// Settle delay after a reset.
const RESET_SETTLE: Duration = Duration::from_secs(2);

/// Settle delay after a configuration command.
const CONFIG_SETTLE: Duration = Duration::from_secs(1);

/// Per-line timeout while draining buffered responses.
const DRAIN_TIMEOUT: Duration = Duration::from_millis(100);

/// Upper bound on drained lines per step.
const MAX_DRAIN_LINES: usize = 100;

/// Errors raised during the configuration handshake. All are fatal for
/// the session.
#[derive(Debug, Error)]
pub enum HandshakeError {
    /// A step's drained response did not match its expected acknowledgment.
    #[error("handshake step {step} failed: expected {expected}, received {received:?}")]
    Failed {
        step: &'static str,
        expected: &'static str,
        received: String,
    },

    #[error(transparent)]
    Transport(#[from] TransportError),
}

/// One step of the bring-up sequence.
#[derive(Debug, Clone)]
pub struct HandshakeStep {
    pub command: Command,
    pub settle: Duration,
    /// Substring that must appear in the drained response. `None` for
    /// reset steps: the two module generations print different (sometimes
    /// no) banners while rebooting, so their output is drained untested.
    pub expect: Option<&'static str>,
}

impl HandshakeStep {
    fn new(command: Command, settle: Duration, expect: Option<&'static str>) -> Self {
        Self {
            command,
            settle,
            expect,
        }
    }
}

/// The ordered bring-up sequence for the profile's variant.
///
/// RYLR993 needs `AT+OPMODE=1` and a second reset before it accepts radio
/// configuration; RYLR998 resets once and goes straight to configuration.
pub fn steps(profile: &DeviceProfile) -> Vec<HandshakeStep> {
    let mut sequence = vec![HandshakeStep::new(Command::Reset, RESET_SETTLE, None)];

    if profile.variant == Variant::Rylr993 {
        sequence.push(HandshakeStep::new(
            Command::OpMode(1),
            RESET_SETTLE,
            Some("+OK"),
        ));
        sequence.push(HandshakeStep::new(Command::Reset, RESET_SETTLE, None));
    }

    sequence.push(HandshakeStep::new(
        Command::Band(profile.frequency_hz),
        CONFIG_SETTLE,
        Some("+OK"),
    ));
    sequence.push(HandshakeStep::new(
        Command::Address(profile.address),
        CONFIG_SETTLE,
        Some("+OK"),
    ));
    sequence.push(HandshakeStep::new(
        Command::Power(profile.power_dbm),
        CONFIG_SETTLE,
        Some("+OK"),
    ));
    sequence.push(HandshakeStep::new(
        Command::Parameter(profile.params),
        CONFIG_SETTLE,
        Some("+OK"),
    ));

    sequence
}

/// Drive the module through the bring-up sequence.
///
/// Each step writes its command, sleeps the settle delay, then drains and
/// checks the buffered responses. Remaining output after the final step is
/// discarded by that step's own drain.
pub async fn run(
    transport: &SharedTransport,
    profile: &DeviceProfile,
) -> Result<(), HandshakeError> {
    for step in steps(profile) {
        let name = step.command.name();
        debug!(step = name, "handshake step");

        transport.lock().write(&step.command.encode())?;
        tokio::time::sleep(step.settle).await;

        let drained = drain(transport)?;
        if let Some(expected) = step.expect {
            let acknowledged = drained.iter().any(|line| line.contains(expected));
            if !acknowledged {
                warn!(step = name, ?drained, "handshake acknowledgment missing");
                return Err(HandshakeError::Failed {
                    step: name,
                    expected,
                    received: drained.join(" | "),
                });
            }
        }
    }

    Ok(())
}

/// Drain buffered response lines until the link goes quiet.
fn drain(transport: &SharedTransport) -> Result<Vec<String>, TransportError> {
    let mut lines = Vec::new();
    let mut guard = transport.lock();

    for _ in 0..MAX_DRAIN_LINES {
        let raw = guard.read_line(DRAIN_TIMEOUT)?;
        if raw.is_empty() {
            break;
        }
        lines.push(String::from_utf8_lossy(&raw).trim().to_string());
    }

    Ok(lines)
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::transport::{MockLink, Transport};
    use pretty_assertions::assert_eq;

    fn profile(variant: Variant) -> DeviceProfile {
        DeviceProfile::new(variant, "MOCK0")
    }

    fn shared_mock() -> (SharedTransport, MockLink) {
        let link = MockLink::new("MOCK0");
        let transport = Transport::from_link(Box::new(link.clone())).into_shared();
        (transport, link)
    }

    /// Script the happy-path module response for every step.
    fn script_acks(link: &MockLink, profile: &DeviceProfile) {
        for step in steps(profile) {
            match step.expect {
                Some(_) => link.respond(b"+OK\r\n"),
                None => link.respond(b"+READY\r\n"),
            }
        }
    }

    #[test]
    fn test_rylr993_sequence() {
        let commands: Vec<Vec<u8>> = steps(&profile(Variant::Rylr993))
            .iter()
            .map(|s| s.command.encode())
            .collect();
        assert_eq!(
            commands,
            vec![
                b"AT+RESET\r\n".to_vec(),
                b"AT+OPMODE=1\r\n".to_vec(),
                b"AT+RESET\r\n".to_vec(),
                b"AT+BAND=867500000\r\n".to_vec(),
                b"AT+ADDRESS=1\r\n".to_vec(),
                b"AT+CRFOP=22\r\n".to_vec(),
                b"AT+PARAMETER=9,7,1,12\r\n".to_vec(),
            ]
        );
    }

    #[test]
    fn test_rylr998_sequence_is_strictly_shorter() {
        let long = steps(&profile(Variant::Rylr993));
        let short = steps(&profile(Variant::Rylr998));
        assert_eq!(long.len(), 7);
        assert_eq!(short.len(), 5);

        // 998 has a single reset and no OPMODE step.
        let resets = |s: &[HandshakeStep]| {
            s.iter()
                .filter(|step| step.command == Command::Reset)
                .count()
        };
        assert_eq!(resets(&long), 2);
        assert_eq!(resets(&short), 1);
        assert!(!short
            .iter()
            .any(|step| matches!(step.command, Command::OpMode(_))));
    }

    #[test]
    fn test_settle_delays_match_step_kind() {
        for step in steps(&profile(Variant::Rylr993)) {
            let expected = match step.command {
                Command::Reset | Command::OpMode(_) => RESET_SETTLE,
                _ => CONFIG_SETTLE,
            };
            assert_eq!(step.settle, expected, "step {}", step.command.name());
        }
    }

    #[tokio::test(start_paused = true)]
    async fn test_run_writes_full_sequence() {
        let (transport, link) = shared_mock();
        let profile = profile(Variant::Rylr993);
        script_acks(&link, &profile);

        run(&transport, &profile).await.expect("handshake");

        let expected: Vec<Vec<u8>> = steps(&profile)
            .iter()
            .map(|s| s.command.encode())
            .collect();
        assert_eq!(link.writes(), expected);
    }

    #[tokio::test(start_paused = true)]
    async fn test_missing_ack_fails_with_step_name() {
        let (transport, link) = shared_mock();
        let profile = profile(Variant::Rylr998);
        // Reset banner, then an error instead of +OK for BAND.
        link.respond(b"+READY\r\n");
        link.respond(b"+ERR=4\r\n");

        let err = run(&transport, &profile).await.unwrap_err();
        match err {
            HandshakeError::Failed { step, received, .. } => {
                assert_eq!(step, "BAND");
                assert!(received.contains("+ERR=4"));
            }
            other => panic!("expected Failed, got {other:?}"),
        }
    }

    #[tokio::test(start_paused = true)]
    async fn test_silent_module_fails_configuration_step() {
        let (transport, link) = shared_mock();
        let profile = profile(Variant::Rylr998);
        link.respond(b"+READY\r\n"); // reset banner only, then silence

        let err = run(&transport, &profile).await.unwrap_err();
        assert!(matches!(err, HandshakeError::Failed { step: "BAND", .. }));
    }
}
