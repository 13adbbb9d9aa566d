//! Repeater relay policy: stateless single-hop rebroadcast.
//!
//! An inbound frame is either dropped (loop guard) or rebroadcast to the
//! broadcast address with a VIA chain tag appended:
//! `"<payload> <sender>VIA<station>"`. There is no seen-message cache and
//! no per-sender rate limiting; the chain tag is the only loop defense.

use crate::protocol::{InboundEvent, OutboundFrame, BROADCAST_ADDRESS};

/// Legacy repeat marker. Frames carrying it anywhere in the payload are
/// never rebroadcast, even when it appears inside an ordinary word.
const REPEAT_MARKER: &[u8] = b"RPT";

/// Decision for one inbound frame.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum RelayDecision {
    /// Do not rebroadcast.
    Drop { reason: DropReason },
    /// Rebroadcast this frame.
    Rebroadcast(OutboundFrame),
}

/// Why a frame was not rebroadcast.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum DropReason {
    /// Payload contains the legacy `RPT` marker.
    RepeatMarker,
    /// This station already appears in the frame's VIA chain.
    AlreadyRelayed,
}

/// Relay policy parameterized by this station's relay identity.
#[derive(Debug, Clone)]
pub struct RelayPolicy {
    station_id: String,
}

impl RelayPolicy {
    pub fn new(station_id: impl Into<String>) -> Self {
        Self {
            station_id: station_id.into(),
        }
    }

    pub fn station_id(&self) -> &str {
        &self.station_id
    }

    /// Decide whether to rebroadcast the event.
    pub fn evaluate(&self, event: &InboundEvent) -> RelayDecision {
        if contains_marker(&event.payload) {
            return RelayDecision::Drop {
                reason: DropReason::RepeatMarker,
            };
        }
        if self.chain_names_station(&event.payload) {
            return RelayDecision::Drop {
                reason: DropReason::AlreadyRelayed,
            };
        }

        let mut payload = event.payload.clone();
        payload.extend_from_slice(
            format!(" {}VIA{}", event.sender, self.station_id).as_bytes(),
        );

        RelayDecision::Rebroadcast(OutboundFrame {
            destination: BROADCAST_ADDRESS,
            payload,
        })
    }

    /// Whether the payload's VIA chain already names this station as a
    /// relaying hop.
    fn chain_names_station(&self, payload: &[u8]) -> bool {
        let text = String::from_utf8_lossy(payload);
        text.split_whitespace()
            .filter(|token| token.contains("VIA"))
            .any(|token| {
                token
                    .split("VIA")
                    .skip(1)
                    .any(|segment| segment == self.station_id)
            })
    }
}

fn contains_marker(payload: &[u8]) -> bool {
    payload
        .windows(REPEAT_MARKER.len())
        .any(|w| w == REPEAT_MARKER)
}
