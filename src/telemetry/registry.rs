//! # Metric Registry
//!
//! Ordered, immutable table of schedulable metrics. Indices are stable for the
//! life of the registry; order only matters for breaking urgency ties.

use std::fmt;
use std::sync::Arc;

use super::encoders::{
    AltitudeEncoder, CellsEncoder, CurrentEncoder, FlightStatusEncoder, FuelEncoder,
    MetricEncoder, RssiEncoder, VarioEncoder,
};
use crate::sport::protocol::*;

/// Number of cell groups in the standard table (12 cells max)
pub const CELL_GROUPS: u8 = 6;

/// Disambiguates descriptors that share one value id
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum MetricArg {
    #[default]
    None,
    /// Zero-based group of two battery cells
    CellGroup(u8),
}

/// One schedulable metric
#[derive(Clone)]
pub struct MetricDescriptor {
    /// Protocol value id, not necessarily unique
    pub id: u16,
    /// Target refresh period in milliseconds
    pub period_ms: u32,
    pub encoder: Arc<dyn MetricEncoder>,
    pub arg: MetricArg,
}

impl MetricDescriptor {
    pub fn new(id: u16, period_ms: u32, encoder: Arc<dyn MetricEncoder>, arg: MetricArg) -> Self {
        Self {
            id,
            period_ms,
            encoder,
            arg,
        }
    }

    /// Target period in the scheduler's microsecond time base
    pub fn period_us(&self) -> u32 {
        self.period_ms.wrapping_mul(1000)
    }
}

impl fmt::Debug for MetricDescriptor {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("MetricDescriptor")
            .field("id", &format_args!("0x{:04X}", self.id))
            .field("period_ms", &self.period_ms)
            .field("encoder", &self.encoder.name())
            .field("arg", &self.arg)
            .finish()
    }
}

/// Read-only, cheaply clonable metric table
#[derive(Debug, Clone)]
pub struct MetricRegistry {
    descriptors: Arc<[MetricDescriptor]>,
}

impl MetricRegistry {
    pub fn new(descriptors: Vec<MetricDescriptor>) -> Self {
        Self {
            descriptors: descriptors.into(),
        }
    }

    /// The Taranis downlink table
    ///
    /// | metric | id | period |
    /// |--------|----|--------|
    /// | battery current | `SPORT_CURR_ID` | 300 ms |
    /// | consumed energy | `SPORT_FUEL_ID` | 600 ms |
    /// | RSSI | `SPORT_RSSI_ID` | 100 ms |
    /// | altitude | `SPORT_ALT_ID` | 100 ms |
    /// | vertical speed | `SPORT_VARIO_ID` | 100 ms |
    /// | flight status | `SPORT_RPM_ID` | 1500 ms |
    /// | cells 1-2 .. 11-12 | `SPORT_CELLS_ID` | 850 ms each |
    pub fn standard() -> Self {
        let cells: Arc<dyn MetricEncoder> = Arc::new(CellsEncoder);

        let mut descriptors = vec![
            MetricDescriptor::new(SPORT_CURR_ID, 300, Arc::new(CurrentEncoder), MetricArg::None),
            MetricDescriptor::new(SPORT_FUEL_ID, 600, Arc::new(FuelEncoder), MetricArg::None),
            MetricDescriptor::new(SPORT_RSSI_ID, 100, Arc::new(RssiEncoder), MetricArg::None),
            MetricDescriptor::new(SPORT_ALT_ID, 100, Arc::new(AltitudeEncoder), MetricArg::None),
            MetricDescriptor::new(SPORT_VARIO_ID, 100, Arc::new(VarioEncoder), MetricArg::None),
            MetricDescriptor::new(
                SPORT_RPM_ID,
                1500,
                Arc::new(FlightStatusEncoder),
                MetricArg::None,
            ),
        ];
        descriptors.extend((0..CELL_GROUPS).map(|group| {
            MetricDescriptor::new(SPORT_CELLS_ID, 850, cells.clone(), MetricArg::CellGroup(group))
        }));

        Self::new(descriptors)
    }

    pub fn len(&self) -> usize {
        self.descriptors.len()
    }

    pub fn is_empty(&self) -> bool {
        self.descriptors.is_empty()
    }

    pub fn get(&self, index: usize) -> Option<&MetricDescriptor> {
        self.descriptors.get(index)
    }

    pub fn iter(&self) -> impl Iterator<Item = &MetricDescriptor> {
        self.descriptors.iter()
    }
}
