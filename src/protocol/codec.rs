//! Inbound line decoding and frame encoding.
//!
//! The module notifies received frames as
//! `+RCV=<sender>,<len>,<payload>,<rssi>,<snr>` lines. Anything else on
//! the line is either a module response (`+OK`, `+READY`, ...) or noise;
//! both decode to [`Decoded::NotAnEvent`] and are carried through as raw
//! diagnostic strings. Structurally broken `+RCV` lines decode to
//! [`Decoded::Malformed`] - never a panic.

use super::command::Command;

/// A frame queued for transmission.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct OutboundFrame {
    pub destination: u16,
    pub payload: Vec<u8>,
}

impl OutboundFrame {
    /// Encode as an `AT+SEND` line.
    pub fn encode(&self) -> Vec<u8> {
        Command::Send {
            destination: self.destination,
            payload: self.payload.clone(),
        }
        .encode()
    }
}

/// A decoded receive notification.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct InboundEvent {
    /// Sender's node address.
    pub sender: u16,
    /// Payload bytes as received.
    pub payload: Vec<u8>,
    /// Received signal strength, dBm.
    pub rssi: i32,
    /// Signal-to-noise ratio.
    pub snr: i32,
}

impl InboundEvent {
    /// Payload as lossy UTF-8 for display.
    pub fn payload_text(&self) -> String {
        String::from_utf8_lossy(&self.payload).into_owned()
    }
}

/// Result of decoding one inbound line.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Decoded {
    /// A well-formed receive notification.
    Event(InboundEvent),
    /// Not a receive notification; raw line kept for diagnostics.
    NotAnEvent(String),
    /// Looked like a receive notification but failed to parse.
    Malformed(String),
}

/// Encode a broadcast/send frame for the given destination and payload.
pub fn encode_send(destination: u16, payload: &[u8]) -> Vec<u8> {
    Command::Send {
        destination,
        payload: payload.to_vec(),
    }
    .encode()
}

/// Decode one line from the module.
///
/// The payload may itself contain commas; sender and length are taken
/// from the left, RSSI and SNR from the right, and the middle fields are
/// reassembled as the payload. The advertised length field is not trusted
/// over the payload's actual byte length.
pub fn decode_event(line: &[u8]) -> Decoded {
    let text = String::from_utf8_lossy(line);
    let trimmed = text.trim_end_matches(['\r', '\n']);

    let Some(rcv_at) = trimmed.find("+RCV") else {
        return Decoded::NotAnEvent(trimmed.to_string());
    };

    let after = &trimmed[rcv_at + "+RCV".len()..];
    let Some(fields_str) = after.strip_prefix('=') else {
        return Decoded::Malformed(trimmed.to_string());
    };

    let fields: Vec<&str> = fields_str.split(',').collect();
    if fields.len() < 5 {
        return Decoded::Malformed(trimmed.to_string());
    }

    let Ok(sender) = fields[0].trim().parse::<u16>() else {
        return Decoded::Malformed(trimmed.to_string());
    };
    // fields[1] is the advertised length; the reassembled payload below is
    // authoritative, so a disagreement here is not an error.
    let Ok(rssi) = fields[fields.len() - 2].trim().parse::<i32>() else {
        return Decoded::Malformed(trimmed.to_string());
    };
    let Ok(snr) = fields[fields.len() - 1].trim().parse::<i32>() else {
        return Decoded::Malformed(trimmed.to_string());
    };

    let payload = fields[2..fields.len() - 2].join(",").into_bytes();

    Decoded::Event(InboundEvent {
        sender,
        payload,
        rssi,
        snr,
    })
}
