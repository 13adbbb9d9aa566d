//! Station configuration: TOML file plus environment overrides.
//!
//! Resolution order (highest priority first):
//!
//! 1. `RYLR_STATION_CONFIG` environment variable (explicit path)
//! 2. `./rylr-station.toml` (current directory)
//! 3. `~/.config/rylr-station/config.toml`
//! 4. Built-in defaults (no file required)
//!
//! Individual fields can be overridden with `RYLR_STATION_PORT`,
//! `RYLR_STATION_VARIANT`, `RYLR_STATION_ADDRESS`, and
//! `RYLR_STATION_FREQUENCY`. CLI flags override everything.

mod error;
mod loader;
mod schema;

pub use error::{ConfigError, ConfigResult};
pub use loader::{load, load_from, resolve_config_path};
pub use schema::{BeaconConfig, Config, PollConfig, StationConfig};
