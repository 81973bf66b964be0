//! # S.Port Telemetry Library
//!
//! Stream flight controller telemetry to a FrSky Taranis over S.Port.
//!
//! This library schedules battery, altitude, RSSI and flight status values
//! onto the low-bandwidth S.Port downlink, picking the most overdue metric
//! every tick so each one stays close to its own refresh period.

pub mod config;
pub mod error;
pub mod serial;
pub mod sport;
pub mod telemetry;
