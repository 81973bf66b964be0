//! # Telemetry Module
//!
//! Push scheduler that multiplexes periodically refreshed vehicle metrics
//! onto the S.Port link.
//!
//! This module handles:
//! - The metric table and per-metric encoders
//! - Picking the most overdue metric every tick
//! - Sending the picked metric as an S.Port frame
//! - Starting the loop as a long-lived task

pub mod clock;
pub mod encoders;
pub mod module;
pub mod registry;
pub mod scheduler;
pub mod settings;
pub mod state;
pub mod vehicle;

pub use clock::{Clock, MonotonicClock};
pub use module::{LoggingTaskMonitor, ModuleStatus, TaskMonitor, TelemetryModule};
pub use registry::{MetricArg, MetricDescriptor, MetricRegistry};
pub use settings::{BatterySettings, SettingsSource, TelemetrySettings};
pub use state::{run_telemetry_loop, TelemetryState};
pub use vehicle::{SharedVehicleState, VehicleState};
