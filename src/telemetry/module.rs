//! # Telemetry Module Lifecycle
//!
//! Brings the telemetry loop up once and hands it off to its own task.
//!
//! ```text
//! Uninitialized ──(link, state, baud ok)──▶ Running
//!       │
//!       └──────────(any step fails)───────▶ Disabled
//! ```
//!
//! Both outcomes are final. A disabled module leaves nothing behind and does
//! not affect the rest of the process; there is no retry.

use std::sync::Arc;

use tokio::task::JoinHandle;
use tracing::{info, warn};

use super::clock::Clock;
use super::registry::MetricRegistry;
use super::settings::TelemetrySettings;
use super::state::{run_telemetry_loop, TelemetryState};
use super::vehicle::VehicleState;
use crate::config::Config;
use crate::error::Result;
use crate::serial::port_trait::SerialPortIO;
use crate::serial::SportLink;
use crate::sport::protocol::SPORT_BAUD_RATE;

/// Task name reported to the liveness monitor
pub const TASK_NAME: &str = "sport-telemetry";

/// Lifecycle state of the telemetry module
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ModuleStatus {
    Uninitialized,
    /// Start-up failed; permanent
    Disabled,
    /// Loop task spawned
    Running,
}

/// External liveness monitoring hook
#[cfg_attr(test, mockall::automock)]
pub trait TaskMonitor: Send + Sync {
    /// Register a long-lived task
    fn add(&self, task_name: &'static str);
}

/// Monitor that only records the registration in the log
#[derive(Debug, Clone, Copy, Default)]
pub struct LoggingTaskMonitor;

impl TaskMonitor for LoggingTaskMonitor {
    fn add(&self, task_name: &'static str) {
        info!("Task '{}' registered for monitoring", task_name);
    }
}

/// Handle to the telemetry module
#[derive(Debug)]
pub struct TelemetryModule {
    status: ModuleStatus,
    task: Option<JoinHandle<()>>,
}

impl Default for TelemetryModule {
    fn default() -> Self {
        Self {
            status: ModuleStatus::Uninitialized,
            task: None,
        }
    }
}

impl TelemetryModule {
    /// Initialize and start the telemetry module
    ///
    /// Reads the settings once, seeds every metric's trigger time to now,
    /// sets the link baud rate, then spawns the loop and registers it with
    /// `monitor`. Must be called from within a Tokio runtime.
    ///
    /// Any failure is logged and leaves the module [`ModuleStatus::Disabled`].
    ///
    /// # Arguments
    ///
    /// * `link` - Result of acquiring the S.Port link
    /// * `registry` - Metric table
    /// * `vehicle` - Vehicle state the encoders read
    /// * `clock` - Microsecond time base
    /// * `config` - Baud rate, tick interval and the settings source
    /// * `monitor` - Liveness monitor
    ///
    /// # Examples
    ///
    /// ```no_run
    /// use std::sync::Arc;
    /// use sport_telemetry::config::Config;
    /// use sport_telemetry::serial::SportLink;
    /// use sport_telemetry::telemetry::{
    ///     LoggingTaskMonitor, MetricRegistry, MonotonicClock, SharedVehicleState, TelemetryModule,
    /// };
    ///
    /// #[tokio::main]
    /// async fn main() -> anyhow::Result<()> {
    ///     let config = Config::load("config/default.toml")?;
    ///     let module = TelemetryModule::start(
    ///         SportLink::acquire(),
    ///         MetricRegistry::standard(),
    ///         Arc::new(SharedVehicleState::new()),
    ///         MonotonicClock::new(),
    ///         &config,
    ///         &LoggingTaskMonitor,
    ///     );
    ///     println!("{:?}", module.status());
    ///     Ok(())
    /// }
    /// ```
    pub fn start<P, C>(
        link: Result<SportLink<P>>,
        registry: MetricRegistry,
        vehicle: Arc<dyn VehicleState>,
        clock: C,
        config: &Config,
        monitor: &dyn TaskMonitor,
    ) -> Self
    where
        P: SerialPortIO + 'static,
        C: Clock,
    {
        let state = match Self::initialize(link, registry, vehicle, clock, config) {
            Ok(state) => state,
            Err(e) => {
                warn!("S.Port telemetry disabled: {}", e);
                return Self {
                    status: ModuleStatus::Disabled,
                    task: None,
                };
            }
        };

        let settings = state.settings();
        info!(
            "S.Port telemetry starting (current sensor: {}, cells: {}, baro: {})",
            settings.use_current_sensor, settings.batt_cell_count, settings.use_baro_sensor
        );

        let task = tokio::spawn(run_telemetry_loop(state, config.telemetry.tick_interval()));
        monitor.add(TASK_NAME);

        Self {
            status: ModuleStatus::Running,
            task: Some(task),
        }
    }

    fn initialize<P, C>(
        link: Result<SportLink<P>>,
        registry: MetricRegistry,
        vehicle: Arc<dyn VehicleState>,
        clock: C,
        config: &Config,
    ) -> Result<TelemetryState<P, C>>
    where
        P: SerialPortIO,
        C: Clock,
    {
        let link = link?;
        let settings = TelemetrySettings::from_source(config);
        let mut state = TelemetryState::new(link, registry, settings, vehicle, clock)?;
        state.link_mut().configure_baud(SPORT_BAUD_RATE)?;

        Ok(state)
    }

    pub fn status(&self) -> ModuleStatus {
        self.status
    }

    /// Loop task handle, if running
    pub fn task(&self) -> Option<&JoinHandle<()>> {
        self.task.as_ref()
    }
}
