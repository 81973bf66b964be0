//! # Metric Scheduler
//!
//! Picks the single most overdue metric once per tick.
//!
//! For every metric whose probe reports data available:
//!
//! ```text
//! urgency = (now - last_trigger) - target_period      [microseconds]
//! ```
//!
//! The highest urgency wins; on an exact tie the lowest registry index wins.
//! This bounds worst-case staleness rather than sharing slots by count: a
//! slow metric that has fallen far behind beats a fast one that is only a
//! little late.
//!
//! ## Time arithmetic
//!
//! Timestamps are wrapping 32-bit microsecond counters and urgency is the
//! wrapping difference reinterpreted as `i32`. Once a metric has gone unsent
//! for more than `i32::MAX` µs past its period (about 35.8 minutes) the sign
//! flips and it looks early instead of late. That wrap is part of the time
//! base and is kept as is.

use super::encoders::{EncodeContext, EncodeMode};
use super::registry::MetricRegistry;

/// Signed overdue-ness of one metric in microseconds
///
/// Negative means not yet due.
///
/// # Examples
///
/// ```
/// use sport_telemetry::telemetry::scheduler::urgency;
///
/// // 100 ms period, last sent at 0, now 50 ms
/// assert_eq!(urgency(50_000, 0, 100_000), -50_000);
/// ```
pub fn urgency(now_us: u32, last_trigger_us: u32, period_us: u32) -> i32 {
    now_us.wrapping_sub(last_trigger_us).wrapping_sub(period_us) as i32
}

/// Choose the metric to send on the next tick
///
/// # Arguments
///
/// * `registry` - Metric table
/// * `ctx` - Settings and vehicle view handed to every probe
/// * `last_trigger` - Last send attempt per registry entry, in µs
/// * `now_us` - Current time in µs
///
/// # Returns
///
/// * `Option<usize>` - Registry index of the most overdue available metric,
///   or `None` when no probe reports data
pub fn select_next(
    registry: &MetricRegistry,
    ctx: &EncodeContext<'_>,
    last_trigger: &[u32],
    now_us: u32,
) -> Option<usize> {
    let mut best: Option<(usize, i32)> = None;

    for (index, (descriptor, &last)) in registry.iter().zip(last_trigger).enumerate() {
        if !descriptor
            .encoder
            .encode(ctx, EncodeMode::Probe, descriptor.arg)
        {
            continue;
        }

        let score = urgency(now_us, last, descriptor.period_us());
        // Strict comparison keeps the first of equal scores
        if best.map_or(true, |(_, max)| score > max) {
            best = Some((index, score));
        }
    }

    best.map(|(index, _)| index)
}

#[cfg(test)]
pub(crate) mod test_support {
    use std::sync::atomic::{AtomicBool, AtomicUsize, Ordering};
    use std::sync::Arc;

    use crate::telemetry::encoders::{EncodeContext, EncodeMode, MetricEncoder};
    use crate::telemetry::registry::{MetricArg, MetricDescriptor, MetricRegistry};

    /// Encoder stub recording how it was called
    #[derive(Debug)]
    pub struct StubEncoder {
        pub available: AtomicBool,
        pub produce_ok: AtomicBool,
        pub value: u32,
        pub probes: AtomicUsize,
        pub produces: AtomicUsize,
    }

    impl StubEncoder {
        pub fn new(available: bool, value: u32) -> Arc<Self> {
            Arc::new(Self {
                available: AtomicBool::new(available),
                produce_ok: AtomicBool::new(true),
                value,
                probes: AtomicUsize::new(0),
                produces: AtomicUsize::new(0),
            })
        }

        pub fn set_available(&self, available: bool) {
            self.available.store(available, Ordering::SeqCst);
        }

        pub fn set_produce_ok(&self, ok: bool) {
            self.produce_ok.store(ok, Ordering::SeqCst);
        }

        pub fn probe_count(&self) -> usize {
            self.probes.load(Ordering::SeqCst)
        }

        pub fn produce_count(&self) -> usize {
            self.produces.load(Ordering::SeqCst)
        }
    }

    impl MetricEncoder for StubEncoder {
        fn name(&self) -> &'static str {
            "stub"
        }

        fn encode(&self, _ctx: &EncodeContext<'_>, mode: EncodeMode<'_>, _arg: MetricArg) -> bool {
            match mode {
                EncodeMode::Probe => {
                    self.probes.fetch_add(1, Ordering::SeqCst);
                    self.available.load(Ordering::SeqCst)
                }
                EncodeMode::Produce(slot) => {
                    self.produces.fetch_add(1, Ordering::SeqCst);
                    if !self.produce_ok.load(Ordering::SeqCst) {
                        return false;
                    }
                    *slot = self.value;
                    true
                }
            }
        }
    }

    /// Registry with one stub per `(id, period_ms)` pair
    pub fn stub_registry(items: &[(u16, u32)]) -> (MetricRegistry, Vec<Arc<StubEncoder>>) {
        let stubs: Vec<Arc<StubEncoder>> = items
            .iter()
            .map(|&(id, _)| StubEncoder::new(true, u32::from(id)))
            .collect();
        let descriptors = items
            .iter()
            .zip(&stubs)
            .map(|(&(id, period_ms), stub)| {
                MetricDescriptor::new(id, period_ms, stub.clone(), MetricArg::None)
            })
            .collect();

        (MetricRegistry::new(descriptors), stubs)
    }
}
