//! # Vehicle State
//!
//! Read-only view of the vehicle quantities the encoders report.
//!
//! Acquisition runs elsewhere at its own cadence. Encoders only see the latest
//! values through [`VehicleState`]; a `None` means the quantity is currently
//! unavailable. [`SharedVehicleState`] is an in-memory store the acquisition
//! side writes into, and [`feed_json_lines`] fills it from a JSON-lines stream.

use serde::Deserialize;
use std::sync::{Arc, RwLock};
use tokio::io::{AsyncBufRead, AsyncBufReadExt};
use tracing::{debug, info, warn};

/// Flight battery measurement
#[derive(Debug, Clone, Copy, PartialEq, Deserialize)]
pub struct BatteryReading {
    /// Pack voltage in volts
    pub voltage: f32,
    /// Current draw in amperes
    pub current: f32,
    /// Energy drawn since power-up in mAh
    pub consumed_mah: f32,
}

/// Barometric altitude estimate
#[derive(Debug, Clone, Copy, PartialEq, Deserialize)]
pub struct BaroReading {
    /// Altitude above the arming point in metres
    pub altitude_m: f32,
    /// Vertical speed in m/s, positive up
    pub vertical_speed_ms: f32,
}

/// Arming state and active flight mode
#[derive(Debug, Clone, Copy, PartialEq, Eq, Deserialize)]
pub struct FlightStatus {
    pub armed: bool,
    /// Index of the active flight mode
    pub flight_mode: u8,
}

/// Query interface over the current vehicle state
#[cfg_attr(test, mockall::automock)]
pub trait VehicleState: Send + Sync {
    fn battery(&self) -> Option<BatteryReading>;

    /// Received signal strength, 0-100
    fn rssi(&self) -> Option<u8>;

    fn baro(&self) -> Option<BaroReading>;

    fn flight_status(&self) -> Option<FlightStatus>;
}

/// Latest known value of every quantity
#[derive(Debug, Clone, Copy, Default, PartialEq, Deserialize)]
#[serde(default)]
pub struct VehicleSnapshot {
    pub battery: Option<BatteryReading>,
    pub rssi: Option<u8>,
    pub baro: Option<BaroReading>,
    pub flight_status: Option<FlightStatus>,
}

impl VehicleSnapshot {
    /// Overwrite every quantity present in `update`
    pub fn merge(&mut self, update: VehicleSnapshot) {
        if update.battery.is_some() {
            self.battery = update.battery;
        }
        if update.rssi.is_some() {
            self.rssi = update.rssi;
        }
        if update.baro.is_some() {
            self.baro = update.baro;
        }
        if update.flight_status.is_some() {
            self.flight_status = update.flight_status;
        }
    }
}

/// Clonable, thread-safe vehicle state store
#[derive(Debug, Clone, Default)]
pub struct SharedVehicleState {
    inner: Arc<RwLock<VehicleSnapshot>>,
}

impl SharedVehicleState {
    pub fn new() -> Self {
        Self::default()
    }

    /// Merge a partial update into the store
    pub fn update(&self, update: VehicleSnapshot) {
        if let Ok(mut snapshot) = self.inner.write() {
            snapshot.merge(update);
        }
    }

    /// Copy of the current contents; empty if the lock is poisoned
    pub fn snapshot(&self) -> VehicleSnapshot {
        self.inner.read().map(|s| *s).unwrap_or_default()
    }
}

impl VehicleState for SharedVehicleState {
    fn battery(&self) -> Option<BatteryReading> {
        self.snapshot().battery
    }

    fn rssi(&self) -> Option<u8> {
        self.snapshot().rssi
    }

    fn baro(&self) -> Option<BaroReading> {
        self.snapshot().baro
    }

    fn flight_status(&self) -> Option<FlightStatus> {
        self.snapshot().flight_status
    }
}

/// Feed vehicle state updates from a JSON-lines stream
///
/// Each line is a partial [`VehicleSnapshot`]. Blank lines are ignored and
/// malformed lines are logged and skipped. Returns the number of applied
/// updates once the stream ends.
///
/// # Examples
///
/// ```
/// use sport_telemetry::telemetry::vehicle::{feed_json_lines, SharedVehicleState, VehicleState};
///
/// # tokio_test::block_on(async {
/// let state = SharedVehicleState::new();
/// let input: &[u8] = b"{\"rssi\": 87}\n";
/// let applied = feed_json_lines(input, state.clone()).await?;
/// assert_eq!(applied, 1);
/// assert_eq!(state.rssi(), Some(87));
/// # Ok::<(), std::io::Error>(())
/// # }).unwrap();
/// ```
pub async fn feed_json_lines<R>(reader: R, state: SharedVehicleState) -> std::io::Result<u64>
where
    R: AsyncBufRead + Unpin,
{
    let mut lines = reader.lines();
    let mut applied: u64 = 0;

    while let Some(line) = lines.next_line().await? {
        let line = line.trim();
        if line.is_empty() {
            continue;
        }

        match serde_json::from_str::<VehicleSnapshot>(line) {
            Ok(update) => {
                state.update(update);
                applied += 1;
            }
            Err(e) => {
                warn!("Ignoring malformed vehicle state line: {}", e);
            }
        }
    }

    debug!("Vehicle state feed closed");
    info!("Applied {} vehicle state updates", applied);
    Ok(applied)
}
