//! Configuration loading with file resolution and environment overrides.

use super::error::{ConfigError, ConfigResult};
use super::schema::Config;
use std::path::{Path, PathBuf};

/// Environment variable naming an explicit config path.
const CONFIG_PATH_ENV: &str = "RYLR_STATION_CONFIG";

/// Config file name looked up in the current and XDG config directories.
const CONFIG_FILE_NAME: &str = "rylr-station.toml";

/// Load configuration using the standard resolution order.
///
/// Priority (highest to lowest):
/// 1. `RYLR_STATION_CONFIG` environment variable (explicit path)
/// 2. `./rylr-station.toml` (current directory)
/// 3. `~/.config/rylr-station/config.toml` (platform config dir)
/// 4. Built-in defaults (no file required)
///
/// Environment overrides are applied on top of whatever was loaded.
pub fn load() -> ConfigResult<Config> {
    let mut config = match resolve_config_path() {
        Some(path) => load_from_file(&path)?,
        None => Config::default(),
    };
    apply_env_overrides(&mut config)?;
    Ok(config)
}

/// Load configuration from a specific file, then apply env overrides.
pub fn load_from(path: impl AsRef<Path>) -> ConfigResult<Config> {
    let mut config = load_from_file(path.as_ref())?;
    apply_env_overrides(&mut config)?;
    Ok(config)
}

/// Resolve which config file (if any) to load.
pub fn resolve_config_path() -> Option<PathBuf> {
    if let Ok(explicit) = std::env::var(CONFIG_PATH_ENV) {
        let path = PathBuf::from(explicit);
        if path.exists() {
            return Some(path);
        }
    }

    let local = PathBuf::from(CONFIG_FILE_NAME);
    if local.exists() {
        return Some(local);
    }

    if let Some(dirs) = directories::ProjectDirs::from("", "", "rylr-station") {
        let xdg = dirs.config_dir().join("config.toml");
        if xdg.exists() {
            return Some(xdg);
        }
    }

    None
}

fn load_from_file(path: &Path) -> ConfigResult<Config> {
    let raw = std::fs::read_to_string(path).map_err(|source| ConfigError::Read {
        path: path.to_path_buf(),
        source,
    })?;
    toml::from_str(&raw).map_err(|source| ConfigError::Parse {
        path: path.to_path_buf(),
        source,
    })
}

/// Apply `RYLR_STATION_*` environment overrides to an already-loaded
/// configuration.
fn apply_env_overrides(config: &mut Config) -> ConfigResult<()> {
    if let Ok(port) = std::env::var("RYLR_STATION_PORT") {
        config.station.port = port;
    }
    if let Ok(variant) = std::env::var("RYLR_STATION_VARIANT") {
        config.station.variant =
            variant
                .parse()
                .map_err(|_| ConfigError::InvalidOverride {
                    key: "RYLR_STATION_VARIANT",
                    value: variant,
                })?;
    }
    if let Ok(address) = std::env::var("RYLR_STATION_ADDRESS") {
        config.station.address =
            address
                .parse()
                .map_err(|_| ConfigError::InvalidOverride {
                    key: "RYLR_STATION_ADDRESS",
                    value: address,
                })?;
    }
    if let Ok(frequency) = std::env::var("RYLR_STATION_FREQUENCY") {
        config.station.frequency_hz =
            frequency
                .parse()
                .map_err(|_| ConfigError::InvalidOverride {
                    key: "RYLR_STATION_FREQUENCY",
                    value: frequency,
                })?;
    }
    Ok(())
}
