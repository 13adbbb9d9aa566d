//! Configuration schema with serde defaults.

use crate::device::{
    DeviceProfile, RadioParams, Variant, DEFAULT_FREQUENCY_HZ, DEFAULT_NODE_ADDRESS,
    DEFAULT_POWER_DBM,
};
use serde::{Deserialize, Serialize};
use std::time::Duration;

/// Root configuration.
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
#[serde(deny_unknown_fields)]
pub struct Config {
    #[serde(default)]
    pub station: StationConfig,
    #[serde(default)]
    pub beacon: BeaconConfig,
    #[serde(default)]
    pub poll: PollConfig,
}

/// `[station]` - the radio module and its RF settings.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(deny_unknown_fields)]
pub struct StationConfig {
    #[serde(default = "default_port")]
    pub port: String,
    #[serde(default = "default_variant")]
    pub variant: Variant,
    #[serde(default = "default_frequency")]
    pub frequency_hz: u32,
    #[serde(default = "default_address")]
    pub address: u16,
    #[serde(default = "default_power")]
    pub power_dbm: u8,
    #[serde(default)]
    pub parameters: RadioParams,
}

impl Default for StationConfig {
    fn default() -> Self {
        Self {
            port: default_port(),
            variant: default_variant(),
            frequency_hz: default_frequency(),
            address: default_address(),
            power_dbm: default_power(),
            parameters: RadioParams::default(),
        }
    }
}

impl StationConfig {
    /// Build the immutable device profile handed to the session.
    pub fn profile(&self) -> DeviceProfile {
        DeviceProfile::new(self.variant, self.port.clone())
            .with_frequency(self.frequency_hz)
            .with_address(self.address)
            .with_power(self.power_dbm)
            .with_params(self.parameters)
    }
}

/// `[beacon]` - periodic transmission settings.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(deny_unknown_fields)]
pub struct BeaconConfig {
    #[serde(default = "default_beacon_text")]
    pub text: String,
    #[serde(default = "default_beacon_interval_secs")]
    pub interval_secs: u64,
}

impl Default for BeaconConfig {
    fn default() -> Self {
        Self {
            text: default_beacon_text(),
            interval_secs: default_beacon_interval_secs(),
        }
    }
}

impl BeaconConfig {
    pub fn interval(&self) -> Duration {
        Duration::from_secs(self.interval_secs)
    }
}

/// `[poll]` - inbound poll loop tuning.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(deny_unknown_fields)]
pub struct PollConfig {
    #[serde(default = "default_read_timeout_ms")]
    pub read_timeout_ms: u64,
    #[serde(default = "default_idle_delay_ms")]
    pub idle_delay_ms: u64,
}

impl Default for PollConfig {
    fn default() -> Self {
        Self {
            read_timeout_ms: default_read_timeout_ms(),
            idle_delay_ms: default_idle_delay_ms(),
        }
    }
}

fn default_port() -> String {
    "/dev/ttyS0".to_string()
}

fn default_variant() -> Variant {
    Variant::Rylr993
}

fn default_frequency() -> u32 {
    DEFAULT_FREQUENCY_HZ
}

fn default_address() -> u16 {
    DEFAULT_NODE_ADDRESS
}

fn default_power() -> u8 {
    DEFAULT_POWER_DBM
}

fn default_beacon_text() -> String {
    "LRms Beacon".to_string()
}

fn default_beacon_interval_secs() -> u64 {
    60
}

fn default_read_timeout_ms() -> u64 {
    250
}

fn default_idle_delay_ms() -> u64 {
    50
}

#[cfg(test)]
mod tests {
    use super::*;
    use pretty_assertions::assert_eq;

    #[test]
    fn test_defaults() {
        let config = Config::default();
        assert_eq!(config.station.port, "/dev/ttyS0");
        assert_eq!(config.station.variant, Variant::Rylr993);
        assert_eq!(config.station.frequency_hz, 867_500_000);
        assert_eq!(config.station.address, 1);
        assert_eq!(config.station.power_dbm, 22);
        assert_eq!(config.beacon.interval_secs, 60);
    }

    #[test]
    fn test_parse_partial_file() {
        let config: Config = toml::from_str(
            r#"
            [station]
            port = "/dev/ttyUSB0"
            variant = "RYLR998"

            [beacon]
            text = "hilltop relay"
            "#,
        )
        .expect("parse");

        assert_eq!(config.station.port, "/dev/ttyUSB0");
        assert_eq!(config.station.variant, Variant::Rylr998);
        // Unspecified values fall back to defaults.
        assert_eq!(config.station.power_dbm, 22);
        assert_eq!(config.beacon.text, "hilltop relay");
        assert_eq!(config.beacon.interval_secs, 60);
    }

    #[test]
    fn test_profile_from_station_section() {
        let config: Config = toml::from_str(
            r#"
            [station]
            variant = "RYLR998"
            address = 100
            parameters = { spreading_factor = 10, bandwidth = 7, coding_rate = 1, preamble_length = 12 }
            "#,
        )
        .expect("parse");

        let profile = config.station.profile();
        assert_eq!(profile.variant, Variant::Rylr998);
        assert_eq!(profile.address, 100);
        assert_eq!(profile.params.spreading_factor, 10);
    }

    #[test]
    fn test_unknown_field_is_rejected() {
        let result: Result<Config, _> = toml::from_str("[stationn]\nport = \"/dev/ttyS0\"");
        assert!(result.is_err());
    }
}
