//! Capability flags the encoders consult.

/// Battery configuration as reported by the settings source
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub struct BatterySettings {
    /// Number of series cells
    pub cell_count: u8,
    /// Pack capacity in mAh
    pub capacity_mah: u32,
    /// A current sensor is fitted
    pub current_sensor: bool,
}

/// External configuration queried once at start-up
pub trait SettingsSource {
    /// Battery configuration, if battery monitoring is set up at all
    fn battery_settings(&self) -> Option<BatterySettings>;

    /// A barometer is registered
    fn barometer_registered(&self) -> bool;
}

/// Read-only settings snapshot shared by every encode call
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub struct TelemetrySettings {
    pub use_current_sensor: bool,
    pub batt_cell_count: u8,
    pub use_baro_sensor: bool,
    pub battery: Option<BatterySettings>,
}

impl TelemetrySettings {
    /// Snapshot the settings source
    pub fn from_source(source: &dyn SettingsSource) -> Self {
        let battery = source.battery_settings();

        Self {
            use_current_sensor: battery.map_or(false, |b| b.current_sensor),
            batt_cell_count: battery.map_or(0, |b| b.cell_count),
            use_baro_sensor: source.barometer_registered(),
            battery,
        }
    }

    /// Pack capacity in mAh, 0 when unknown
    pub fn capacity_mah(&self) -> u32 {
        self.battery.map_or(0, |b| b.capacity_mah)
    }
}
