//! # S.Port Telemetry
//!
//! Stream flight controller telemetry to a FrSky Taranis over S.Port.
//!
//! The binary opens the S.Port link, starts the telemetry loop, and feeds it
//! vehicle state read as JSON lines from stdin.

use std::sync::Arc;

use anyhow::Result;
use tokio::io::BufReader;
use tracing::{error, info, warn};

use sport_telemetry::config::Config;
use sport_telemetry::serial::SportLink;
use sport_telemetry::telemetry::vehicle::feed_json_lines;
use sport_telemetry::telemetry::{
    LoggingTaskMonitor, MetricRegistry, ModuleStatus, MonotonicClock, SharedVehicleState,
    TelemetryModule,
};

/// Configuration file used when no path is given
const DEFAULT_CONFIG_PATH: &str = "config/default.toml";

/// Main entry point for S.Port telemetry
///
/// # Control Flow
///
/// 1. **Initialization**
///    - Set up logging with a non-blocking tracing subscriber
///    - Load configuration (first argument, or `config/default.toml`)
///    - Acquire the S.Port link and start the telemetry module
///
/// 2. **Running**
///    - Apply vehicle state updates from stdin
///    - The telemetry task sends one frame per tick on its own
///
/// 3. **Shutdown**
///    - Ctrl+C ends the process; the loop itself never stops
///
/// A disabled telemetry module is reported but does not stop the feed.
///
/// # Examples
///
/// ```bash
/// mavlink-to-json | cargo run --release -- config/default.toml
/// ```
///
/// Each stdin line is a partial snapshot:
///
/// ```text
/// {"battery": {"voltage": 16.4, "current": 8.2, "consumed_mah": 410}}
/// {"rssi": 92, "flight_status": {"armed": true, "flight_mode": 1}}
/// ```
#[tokio::main]
async fn main() -> Result<()> {
    let (writer, _guard) = tracing_appender::non_blocking(std::io::stdout());
    tracing_subscriber::fmt()
        .with_writer(writer)
        .with_env_filter(
            tracing_subscriber::EnvFilter::from_default_env()
                .add_directive(tracing::Level::INFO.into())
        )
        .init();

    info!("S.Port telemetry v{} starting...", env!("CARGO_PKG_VERSION"));

    let config_path = std::env::args()
        .nth(1)
        .unwrap_or_else(|| DEFAULT_CONFIG_PATH.to_string());
    let config = Config::load(&config_path)?;
    info!("Loaded configuration from {}", config_path);

    let vehicle = SharedVehicleState::new();

    let module = TelemetryModule::start(
        SportLink::acquire_configured(config.serial.port.as_deref()),
        MetricRegistry::standard(),
        Arc::new(vehicle.clone()),
        MonotonicClock::new(),
        &config,
        &LoggingTaskMonitor,
    );
    if module.status() != ModuleStatus::Running {
        warn!("Telemetry module is {:?}; no frames will be sent", module.status());
    }

    let feed = tokio::spawn(feed_json_lines(BufReader::new(tokio::io::stdin()), vehicle));

    info!("Press Ctrl+C to exit");
    tokio::signal::ctrl_c().await?;
    info!("Received Ctrl+C, shutting down...");

    feed.abort();
    if let Some(task) = module.task() {
        if task.is_finished() {
            error!("Telemetry task exited unexpectedly");
        }
    }

    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_default_config_path() {
        assert_eq!(DEFAULT_CONFIG_PATH, "config/default.toml");
    }

    #[test]
    fn test_shipped_config_is_valid() {
        let path = concat!(env!("CARGO_MANIFEST_DIR"), "/config/default.toml");
        let config = Config::load(path).unwrap();

        assert_eq!(config.serial.port, None, "Shipped config auto-detects the device");
        assert_eq!(config.telemetry.tick_interval_ms, 10);
    }
}
