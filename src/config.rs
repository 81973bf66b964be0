//! # Configuration Module
//!
//! Handles loading and validating configuration from TOML files.

use serde::de::Error;
use serde::Deserialize;
use std::fs;
use std::path::Path;
use std::time::Duration;

use crate::error::Result;
use crate::telemetry::settings::{BatterySettings, SettingsSource};

/// Longest loop tick; half the shortest metric period in the standard table
const MAX_TICK_INTERVAL_MS: u64 = 50;

/// Most cells the cell frames can describe (six groups of two)
const MAX_CELL_COUNT: u8 = 12;

/// Main configuration structure
#[derive(Debug, Deserialize, Clone, Default)]
pub struct Config {
    #[serde(default)]
    pub serial: SerialConfig,

    #[serde(default)]
    pub telemetry: TelemetryConfig,

    /// Absent when no battery monitoring is set up
    #[serde(default)]
    pub battery: Option<BatteryConfig>,

    #[serde(default)]
    pub sensors: SensorConfig,
}

/// Serial port configuration
///
/// The baud rate is fixed by the S.Port protocol and not configurable.
#[derive(Debug, Deserialize, Clone, Default)]
#[serde(deny_unknown_fields)]
pub struct SerialConfig {
    /// Device path; auto-detected when absent
    #[serde(default)]
    pub port: Option<String>,
}

/// Telemetry loop configuration
#[derive(Debug, Deserialize, Clone)]
pub struct TelemetryConfig {
    #[serde(default = "default_tick_interval_ms")]
    pub tick_interval_ms: u64,
}

/// Flight battery configuration
#[derive(Debug, Deserialize, Clone)]
pub struct BatteryConfig {
    #[serde(default)]
    pub cell_count: u8,

    #[serde(default)]
    pub capacity_mah: u32,

    #[serde(default = "default_current_sensor")]
    pub current_sensor: bool,
}

/// Sensor presence
#[derive(Debug, Deserialize, Clone)]
pub struct SensorConfig {
    #[serde(default = "default_barometer")]
    pub barometer: bool,
}

// Default value functions
fn default_tick_interval_ms() -> u64 { 10 }

fn default_current_sensor() -> bool { true }

fn default_barometer() -> bool { true }

impl Default for TelemetryConfig {
    fn default() -> Self {
        Self {
            tick_interval_ms: default_tick_interval_ms(),
        }
    }
}

impl Default for SensorConfig {
    fn default() -> Self {
        Self {
            barometer: default_barometer(),
        }
    }
}

impl TelemetryConfig {
    /// Loop tick interval
    pub fn tick_interval(&self) -> Duration {
        Duration::from_millis(self.tick_interval_ms)
    }
}

impl Config {
    /// Load configuration from a TOML file
    ///
    /// # Arguments
    ///
    /// * `path` - Path to the configuration file
    ///
    /// # Errors
    ///
    /// Returns error if:
    /// - File cannot be read
    /// - TOML parsing fails
    /// - Validation fails
    ///
    /// # Examples
    ///
    /// ```no_run
    /// use sport_telemetry::config::Config;
    ///
    /// let config = Config::load("config/default.toml")?;
    /// # Ok::<(), Box<dyn std::error::Error>>(())
    /// ```
    pub fn load<P: AsRef<Path>>(path: P) -> Result<Self> {
        let contents = fs::read_to_string(path)?;
        let config: Config = toml::from_str(&contents)?;
        config.validate()?;
        Ok(config)
    }

    /// Validate configuration values
    ///
    /// # Errors
    ///
    /// Returns error if any configuration value is out of valid range
    fn validate(&self) -> Result<()> {
        if self.serial.port.as_deref().is_some_and(str::is_empty) {
            return Err(crate::error::TelemetryError::Config(
                toml::de::Error::custom("serial port cannot be empty")
            ));
        }

        if self.telemetry.tick_interval_ms == 0
            || self.telemetry.tick_interval_ms > MAX_TICK_INTERVAL_MS
        {
            return Err(crate::error::TelemetryError::Config(
                toml::de::Error::custom(format!(
                    "tick_interval_ms must be between 1 and {}",
                    MAX_TICK_INTERVAL_MS
                ))
            ));
        }

        if let Some(battery) = &self.battery {
            if battery.cell_count > MAX_CELL_COUNT {
                return Err(crate::error::TelemetryError::Config(
                    toml::de::Error::custom(format!("cell_count must be between 0 and {}", MAX_CELL_COUNT))
                ));
            }
        }

        Ok(())
    }
}

impl SettingsSource for Config {
    fn battery_settings(&self) -> Option<BatterySettings> {
        self.battery.as_ref().map(|b| BatterySettings {
            cell_count: b.cell_count,
            capacity_mah: b.capacity_mah,
            current_sensor: b.current_sensor,
        })
    }

    fn barometer_registered(&self) -> bool {
        self.sensors.barometer
    }
}
