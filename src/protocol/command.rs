//! Outbound AT command encoding.
//!
//! Each command renders to one `\r\n`-terminated line in the module's
//! textual protocol. `Send` is the only command carrying a payload; its
//! length field is always the payload's byte length.

use crate::device::RadioParams;

/// Broadcast destination address. All current roles transmit to broadcast.
pub const BROADCAST_ADDRESS: u16 = 0;

/// AT commands understood by the RYLR module family.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Command {
    /// `AT+RESET` - full module reset.
    Reset,
    /// `AT+OPMODE=<mode>` - RYLR993 only, required before reconfiguring.
    OpMode(u8),
    /// `AT+BAND=<hz>` - radio frequency.
    Band(u32),
    /// `AT+ADDRESS=<id>` - node address.
    Address(u16),
    /// `AT+CRFOP=<dbm>` - transmit power.
    Power(u8),
    /// `AT+PARAMETER=<sf,bw,cr,preamble>` - radio parameters.
    Parameter(RadioParams),
    /// `AT+SEND=<addr>,<len>,<payload>` - transmit a frame.
    Send {
        destination: u16,
        payload: Vec<u8>,
    },
}

impl Command {
    /// Render the command as wire bytes, terminator included.
    pub fn encode(&self) -> Vec<u8> {
        match self {
            Command::Reset => b"AT+RESET\r\n".to_vec(),
            Command::OpMode(mode) => format!("AT+OPMODE={mode}\r\n").into_bytes(),
            Command::Band(hz) => format!("AT+BAND={hz}\r\n").into_bytes(),
            Command::Address(id) => format!("AT+ADDRESS={id}\r\n").into_bytes(),
            Command::Power(dbm) => format!("AT+CRFOP={dbm}\r\n").into_bytes(),
            Command::Parameter(params) => format!("AT+PARAMETER={params}\r\n").into_bytes(),
            Command::Send {
                destination,
                payload,
            } => {
                // Length is the byte length of the payload, not the
                // character count of whatever text produced it.
                let mut frame =
                    format!("AT+SEND={},{},", destination, payload.len()).into_bytes();
                frame.extend_from_slice(payload);
                frame.extend_from_slice(b"\r\n");
                frame
            }
        }
    }

    /// Short command name used in handshake failure reports.
    pub fn name(&self) -> &'static str {
        match self {
            Command::Reset => "RESET",
            Command::OpMode(_) => "OPMODE",
            Command::Band(_) => "BAND",
            Command::Address(_) => "ADDRESS",
            Command::Power(_) => "CRFOP",
            Command::Parameter(_) => "PARAMETER",
            Command::Send { .. } => "SEND",
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use pretty_assertions::assert_eq;

    #[test]
    fn test_configuration_commands() {
        assert_eq!(Command::Reset.encode(), b"AT+RESET\r\n");
        assert_eq!(Command::OpMode(1).encode(), b"AT+OPMODE=1\r\n");
        assert_eq!(Command::Band(867_500_000).encode(), b"AT+BAND=867500000\r\n");
        assert_eq!(Command::Address(100).encode(), b"AT+ADDRESS=100\r\n");
        assert_eq!(Command::Power(22).encode(), b"AT+CRFOP=22\r\n");
        assert_eq!(
            Command::Parameter(RadioParams::default()).encode(),
            b"AT+PARAMETER=9,7,1,12\r\n"
        );
    }

    #[test]
    fn test_send_length_is_byte_length() {
        // Multi-byte UTF-8: 2 characters, 4 bytes on the wire.
        let cmd = Command::Send {
            destination: BROADCAST_ADDRESS,
            payload: "äö".as_bytes().to_vec(),
        };
        let encoded = cmd.encode();
        assert!(encoded.starts_with(b"AT+SEND=0,4,"));
    }
}
