//! Device profile: hardware variant and radio settings.

use serde::{Deserialize, Serialize};
use std::fmt;
use std::str::FromStr;
use thiserror::Error;

/// Default radio frequency in Hz (EU868 sub-band).
pub const DEFAULT_FREQUENCY_HZ: u32 = 867_500_000;

/// Default transmit power in dBm.
pub const DEFAULT_POWER_DBM: u8 = 22;

/// Default node address for fixed (beacon/messenger) roles.
pub const DEFAULT_NODE_ADDRESS: u16 = 1;

/// Default node address for the repeater role.
pub const DEFAULT_REPEATER_ADDRESS: u16 = 100;

/// The profile named a hardware variant the crate does not support.
#[derive(Debug, Clone, Error, PartialEq, Eq)]
#[error("invalid device variant: {0} (expected RYLR993 or RYLR998)")]
pub struct InvalidVariant(pub String);

/// Supported LoRa module hardware variants.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "UPPERCASE")]
pub enum Variant {
    Rylr993,
    Rylr998,
}

impl Variant {
    /// Serial baud rate for this variant, fixed for the process lifetime.
    pub fn baud(self) -> u32 {
        match self {
            Variant::Rylr993 => 9_600,
            Variant::Rylr998 => 115_200,
        }
    }
}

impl fmt::Display for Variant {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Variant::Rylr993 => write!(f, "RYLR993"),
            Variant::Rylr998 => write!(f, "RYLR998"),
        }
    }
}

impl FromStr for Variant {
    type Err = InvalidVariant;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.to_ascii_uppercase().as_str() {
            "RYLR993" => Ok(Variant::Rylr993),
            "RYLR998" => Ok(Variant::Rylr998),
            other => Err(InvalidVariant(other.to_string())),
        }
    }
}

/// Radio parameter tuple for `AT+PARAMETER`.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct RadioParams {
    pub spreading_factor: u8,
    pub bandwidth: u8,
    pub coding_rate: u8,
    pub preamble_length: u8,
}

impl Default for RadioParams {
    fn default() -> Self {
        Self {
            spreading_factor: 9,
            bandwidth: 7,
            coding_rate: 1,
            preamble_length: 12,
        }
    }
}

impl fmt::Display for RadioParams {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(
            f,
            "{},{},{},{}",
            self.spreading_factor, self.bandwidth, self.coding_rate, self.preamble_length
        )
    }
}

/// Everything needed to bring up one radio module.
///
/// Immutable once the configuration handshake begins; the session owns it
/// for its whole lifetime.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct DeviceProfile {
    pub variant: Variant,
    /// Serial port path, e.g. `/dev/ttyS0`.
    pub port: String,
    pub frequency_hz: u32,
    /// Node address in the module's 0–65535 range.
    pub address: u16,
    pub power_dbm: u8,
    pub params: RadioParams,
}

impl DeviceProfile {
    /// Profile with the stock radio settings for the given variant/port.
    pub fn new(variant: Variant, port: impl Into<String>) -> Self {
        Self {
            variant,
            port: port.into(),
            frequency_hz: DEFAULT_FREQUENCY_HZ,
            address: DEFAULT_NODE_ADDRESS,
            power_dbm: DEFAULT_POWER_DBM,
            params: RadioParams::default(),
        }
    }

    pub fn with_address(mut self, address: u16) -> Self {
        self.address = address;
        self
    }

    pub fn with_frequency(mut self, frequency_hz: u32) -> Self {
        self.frequency_hz = frequency_hz;
        self
    }

    pub fn with_power(mut self, power_dbm: u8) -> Self {
        self.power_dbm = power_dbm;
        self
    }

    pub fn with_params(mut self, params: RadioParams) -> Self {
        self.params = params;
        self
    }
}
