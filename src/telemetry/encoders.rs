//! # Metric Encoders
//!
//! Every schedulable metric carries one [`MetricEncoder`]. A single `encode`
//! entry point serves two modes:
//!
//! - [`EncodeMode::Probe`] answers "is data available right now" and must not
//!   have side effects; the scheduler calls it for every metric on every tick.
//! - [`EncodeMode::Produce`] writes the current value into the output slot.
//!   It may still fail after a successful probe if the data went away in
//!   between; nothing is sent then.
//!
//! Keeping both in one method lets availability and value computation share
//! the same lookups.

use std::fmt;

use super::registry::MetricArg;
use super::settings::TelemetrySettings;
use super::vehicle::VehicleState;

/// Cells reported per cell frame
pub const CELLS_PER_GROUP: u8 = 2;

/// Cell voltage resolution: 1/500 V
const CELL_VOLTAGE_SCALE: f32 = 500.0;

/// Cell voltage field width
const CELL_VOLTAGE_MASK: u32 = 0x0FFF;

/// Call mode of [`MetricEncoder::encode`]
#[derive(Debug)]
pub enum EncodeMode<'a> {
    /// Availability check only
    Probe,
    /// Compute the value into the slot
    Produce(&'a mut u32),
}

/// Everything an encoder may read
#[derive(Clone, Copy)]
pub struct EncodeContext<'a> {
    pub settings: &'a TelemetrySettings,
    pub vehicle: &'a dyn VehicleState,
}

impl fmt::Debug for EncodeContext<'_> {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("EncodeContext")
            .field("settings", self.settings)
            .finish_non_exhaustive()
    }
}

/// Per-metric encode capability
pub trait MetricEncoder: Send + Sync {
    /// Short name for logs
    fn name(&self) -> &'static str;

    /// Probe or produce, depending on `mode`
    ///
    /// Returns `true` when data is available (probe) or the slot was written
    /// (produce).
    fn encode(&self, ctx: &EncodeContext<'_>, mode: EncodeMode<'_>, arg: MetricArg) -> bool;
}

/// Store `value` if producing; availability is already established
fn emit(mode: EncodeMode<'_>, value: impl FnOnce() -> u32) -> bool {
    if let EncodeMode::Produce(slot) = mode {
        *slot = value();
    }
    true
}

/// Signed value in the 32-bit two's complement wire form
fn signed(value: f32) -> u32 {
    value.round() as i32 as u32
}

/// Battery current in 0.1 A
#[derive(Debug, Clone, Copy, Default)]
pub struct CurrentEncoder;

impl MetricEncoder for CurrentEncoder {
    fn name(&self) -> &'static str {
        "current"
    }

    fn encode(&self, ctx: &EncodeContext<'_>, mode: EncodeMode<'_>, _arg: MetricArg) -> bool {
        if !ctx.settings.use_current_sensor {
            return false;
        }
        let Some(battery) = ctx.vehicle.battery() else {
            return false;
        };

        emit(mode, || (battery.current.max(0.0) * 10.0).round() as u32)
    }
}

/// Remaining battery capacity in percent
#[derive(Debug, Clone, Copy, Default)]
pub struct FuelEncoder;

impl MetricEncoder for FuelEncoder {
    fn name(&self) -> &'static str {
        "fuel"
    }

    fn encode(&self, ctx: &EncodeContext<'_>, mode: EncodeMode<'_>, _arg: MetricArg) -> bool {
        let capacity = ctx.settings.capacity_mah();
        if !ctx.settings.use_current_sensor || capacity == 0 {
            return false;
        }
        let Some(battery) = ctx.vehicle.battery() else {
            return false;
        };

        emit(mode, || {
            let capacity = capacity as f32;
            let remaining = (capacity - battery.consumed_mah) / capacity * 100.0;
            remaining.clamp(0.0, 100.0).round() as u32
        })
    }
}

/// Link signal strength, 0-100
#[derive(Debug, Clone, Copy, Default)]
pub struct RssiEncoder;

impl MetricEncoder for RssiEncoder {
    fn name(&self) -> &'static str {
        "rssi"
    }

    fn encode(&self, ctx: &EncodeContext<'_>, mode: EncodeMode<'_>, _arg: MetricArg) -> bool {
        let Some(rssi) = ctx.vehicle.rssi() else {
            return false;
        };

        emit(mode, || u32::from(rssi.min(100)))
    }
}

/// Barometric altitude in centimetres
#[derive(Debug, Clone, Copy, Default)]
pub struct AltitudeEncoder;

impl MetricEncoder for AltitudeEncoder {
    fn name(&self) -> &'static str {
        "altitude"
    }

    fn encode(&self, ctx: &EncodeContext<'_>, mode: EncodeMode<'_>, _arg: MetricArg) -> bool {
        if !ctx.settings.use_baro_sensor {
            return false;
        }
        let Some(baro) = ctx.vehicle.baro() else {
            return false;
        };

        emit(mode, || signed(baro.altitude_m * 100.0))
    }
}

/// Vertical speed in cm/s
#[derive(Debug, Clone, Copy, Default)]
pub struct VarioEncoder;

impl MetricEncoder for VarioEncoder {
    fn name(&self) -> &'static str {
        "vario"
    }

    fn encode(&self, ctx: &EncodeContext<'_>, mode: EncodeMode<'_>, _arg: MetricArg) -> bool {
        if !ctx.settings.use_baro_sensor {
            return false;
        }
        let Some(baro) = ctx.vehicle.baro() else {
            return false;
        };

        emit(mode, || signed(baro.vertical_speed_ms * 100.0))
    }
}

/// Flight status packed into the RPM slot
///
/// 100 while disarmed, 200 while armed, plus the flight mode index.
#[derive(Debug, Clone, Copy, Default)]
pub struct FlightStatusEncoder;

impl MetricEncoder for FlightStatusEncoder {
    fn name(&self) -> &'static str {
        "flight_status"
    }

    fn encode(&self, ctx: &EncodeContext<'_>, mode: EncodeMode<'_>, _arg: MetricArg) -> bool {
        let Some(status) = ctx.vehicle.flight_status() else {
            return false;
        };

        emit(mode, || {
            let base = if status.armed { 200 } else { 100 };
            base + u32::from(status.flight_mode)
        })
    }
}

/// Two cell voltages of one cell group
///
/// The pack only reports a total voltage, so every cell carries the average.
///
/// ```text
/// bits  0-3   index of the first cell in the frame
/// bits  4-7   total cell count
/// bits  8-19  first cell voltage, 2 mV units
/// bits 20-31  second cell voltage, 0 if the group has a single cell
/// ```
#[derive(Debug, Clone, Copy, Default)]
pub struct CellsEncoder;

impl MetricEncoder for CellsEncoder {
    fn name(&self) -> &'static str {
        "cells"
    }

    fn encode(&self, ctx: &EncodeContext<'_>, mode: EncodeMode<'_>, arg: MetricArg) -> bool {
        let MetricArg::CellGroup(group) = arg else {
            return false;
        };
        let cell_count = ctx.settings.batt_cell_count;
        let first_cell = u32::from(group) * u32::from(CELLS_PER_GROUP);
        if u32::from(cell_count) <= first_cell {
            return false;
        }
        let Some(battery) = ctx.vehicle.battery() else {
            return false;
        };

        emit(mode, || {
            let cell_voltage = battery.voltage.max(0.0) / f32::from(cell_count);
            let encoded =
                ((cell_voltage * CELL_VOLTAGE_SCALE).round() as u32).min(CELL_VOLTAGE_MASK);
            let second = if first_cell + 1 < u32::from(cell_count) {
                encoded
            } else {
                0
            };

            (second << 20)
                | (encoded << 8)
                | ((u32::from(cell_count) & 0x0F) << 4)
                | (first_cell & 0x0F)
        })
    }
}
