//! # Telemetry Session State
//!
//! Owns everything the telemetry loop mutates and drives one tick at a time:
//!
//! 1. [`TelemetryState::send_scheduled`] transmits the metric picked on the
//!    previous tick.
//! 2. [`TelemetryState::select_next`] picks the metric for the next tick.
//! 3. The loop sleeps for the fixed tick interval.
//!
//! Deciding one tick ahead of sending means a send always targets a decision
//! that is already made.

use std::sync::Arc;
use std::time::Duration;

use tracing::{debug, info, trace};

use super::clock::Clock;
use super::encoders::{EncodeContext, EncodeMode};
use super::registry::MetricRegistry;
use super::scheduler;
use super::settings::TelemetrySettings;
use super::vehicle::VehicleState;
use crate::error::Result;
use crate::serial::port_trait::SerialPortIO;
use crate::serial::SportLink;

/// Default loop tick interval
pub const DEFAULT_TICK_INTERVAL: Duration = Duration::from_millis(10);

/// Number of ticks between status log messages (~10 s at the default tick)
const LOG_INTERVAL_TICKS: u64 = 1000;

/// Mutable telemetry session, owned by the loop once it starts
pub struct TelemetryState<P, C> {
    /// Registry index chosen on the previous tick
    scheduled_item: Option<usize>,
    /// Last send attempt per registry entry, µs
    last_trigger: Vec<u32>,
    settings: TelemetrySettings,
    link: SportLink<P>,
    registry: MetricRegistry,
    vehicle: Arc<dyn VehicleState>,
    clock: C,
}

impl<P, C> std::fmt::Debug for TelemetryState<P, C> {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("TelemetryState")
            .field("scheduled_item", &self.scheduled_item)
            .field("metrics", &self.registry.len())
            .field("link", &self.link)
            .finish_non_exhaustive()
    }
}

impl<P: SerialPortIO, C: Clock> TelemetryState<P, C> {
    /// Create the session state
    ///
    /// Every metric starts as if it had just been sent, so nothing is
    /// overdue at boot.
    ///
    /// # Errors
    ///
    /// Returns error if the per-metric table cannot be allocated
    pub fn new(
        link: SportLink<P>,
        registry: MetricRegistry,
        settings: TelemetrySettings,
        vehicle: Arc<dyn VehicleState>,
        clock: C,
    ) -> Result<Self> {
        let mut last_trigger = Vec::new();
        last_trigger.try_reserve_exact(registry.len())?;
        let now = clock.now_us();
        last_trigger.resize(registry.len(), now);

        Ok(Self {
            scheduled_item: None,
            last_trigger,
            settings,
            link,
            registry,
            vehicle,
            clock,
        })
    }

    /// Registry index scheduled for the next send
    pub fn scheduled_item(&self) -> Option<usize> {
        self.scheduled_item
    }

    /// Last send attempt per registry entry, µs
    pub fn last_trigger(&self) -> &[u32] {
        &self.last_trigger
    }

    pub fn settings(&self) -> &TelemetrySettings {
        &self.settings
    }

    pub fn link_mut(&mut self) -> &mut SportLink<P> {
        &mut self.link
    }

    /// Pick the most overdue available metric for the next tick
    pub fn select_next(&mut self) -> Option<usize> {
        let ctx = EncodeContext {
            settings: &self.settings,
            vehicle: self.vehicle.as_ref(),
        };
        let now = self.clock.now_us();

        self.scheduled_item = scheduler::select_next(&self.registry, &ctx, &self.last_trigger, now);
        self.scheduled_item
    }

    /// Send the metric scheduled on the previous tick
    ///
    /// The metric's trigger time is stamped before its value is produced, so
    /// a failed produce still counts as an attempt and the metric is not
    /// picked again straight away.
    ///
    /// # Returns
    ///
    /// * `bool` - `true` if a frame went out; `false` when nothing was
    ///   scheduled, the value was unavailable, or the link write failed
    pub async fn send_scheduled(&mut self) -> bool {
        let Some(index) = self.scheduled_item else {
            return false;
        };
        let Some(descriptor) = self.registry.get(index) else {
            return false;
        };

        self.last_trigger[index] = self.clock.now_us();

        let ctx = EncodeContext {
            settings: &self.settings,
            vehicle: self.vehicle.as_ref(),
        };
        let mut value = 0u32;
        if !descriptor
            .encoder
            .encode(&ctx, EncodeMode::Produce(&mut value), descriptor.arg)
        {
            trace!("No value for {} this tick, skipping", descriptor.encoder.name());
            return false;
        }

        match self.link.write_frame(descriptor.id, value, true).await {
            Ok(()) => true,
            Err(e) => {
                debug!("Failed to send {} frame: {}", descriptor.encoder.name(), e);
                false
            }
        }
    }

    /// One loop iteration minus the sleep
    ///
    /// # Returns
    ///
    /// * `bool` - Whether a frame was sent
    pub async fn tick(&mut self) -> bool {
        let sent = self.send_scheduled().await;
        self.select_next();
        sent
    }
}

/// Run the telemetry loop forever
///
/// The sleep is the only suspension point, and the interval does not depend
/// on any metric period.
pub async fn run_telemetry_loop<P: SerialPortIO, C: Clock>(
    mut state: TelemetryState<P, C>,
    tick_interval: Duration,
) {
    info!(
        "Telemetry loop running: {} metrics, {:?} tick",
        state.registry.len(),
        tick_interval
    );

    let mut ticks: u64 = 0;
    let mut frames: u64 = 0;

    loop {
        if state.tick().await {
            frames += 1;
        }
        ticks += 1;

        if ticks % LOG_INTERVAL_TICKS == 0 {
            debug!("Telemetry: {} frames sent in {} ticks", frames, ticks);
        }

        tokio::time::sleep(tick_interval).await;
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::serial::port_trait::mocks::MockSerialPort;
    use crate::sport::protocol::SPORT_POLL_REQUEST;
    use crate::telemetry::clock::{ManualClock, MonotonicClock};
    use crate::telemetry::scheduler::test_support::{stub_registry, StubEncoder};
    use crate::telemetry::vehicle::SharedVehicleState;
    use std::io;

    const MS: u32 = 1000;

    fn state_with(
        items: &[(u16, u32)],
        clock: ManualClock,
    ) -> (
        TelemetryState<MockSerialPort, ManualClock>,
        MockSerialPort,
        Vec<Arc<StubEncoder>>,
    ) {
        let port = MockSerialPort::new();
        let (registry, stubs) = stub_registry(items);
        let state = TelemetryState::new(
            SportLink::new(port.clone(), "mock"),
            registry,
            TelemetrySettings::default(),
            Arc::new(SharedVehicleState::new()),
            clock,
        )
        .unwrap();

        (state, port, stubs)
    }

    /// Value id carried by a written frame (prelude + header + id)
    fn frame_id(frame: &[u8]) -> u16 {
        assert_eq!(frame[0], SPORT_POLL_REQUEST);
        u16::from_le_bytes([frame[3], frame[4]])
    }

    #[test]
    fn test_new_seeds_triggers_to_now() {
        let (state, _port, _stubs) = state_with(&[(1, 100), (2, 600)], ManualClock::new(1234));

        assert_eq!(state.last_trigger(), &[1234, 1234]);
        assert_eq!(state.scheduled_item(), None);
    }

    #[tokio::test]
    async fn test_send_without_schedule_is_noop() {
        let (mut state, port, stubs) = state_with(&[(1, 100)], ManualClock::new(0));

        assert!(!state.send_scheduled().await);
        assert!(port.get_written_data().is_empty());
        assert_eq!(stubs[0].produce_count(), 0);
    }

    #[tokio::test]
    async fn test_send_writes_scheduled_frame() {
        let clock = ManualClock::new(0);
        let (mut state, port, _stubs) = state_with(&[(0x0101, 100), (0x0202, 600)], clock.clone());

        clock.set_ms(50);
        assert_eq!(state.select_next(), Some(0));
        clock.set_ms(60);
        assert!(state.send_scheduled().await);

        let written = port.get_written_data();
        assert_eq!(written.len(), 1);
        assert_eq!(frame_id(&written[0]), 0x0101);
        assert_eq!(state.last_trigger(), &[60 * MS, 0]);
    }

    #[tokio::test]
    async fn test_failed_produce_still_counts_as_attempt() {
        let clock = ManualClock::new(0);
        let (mut state, port, stubs) = state_with(&[(1, 100), (2, 100)], clock.clone());
        stubs[0].set_produce_ok(false);

        clock.set_ms(500);
        assert_eq!(state.select_next(), Some(0));
        assert!(!state.send_scheduled().await);

        assert!(port.get_written_data().is_empty());
        assert_eq!(state.last_trigger()[0], 500 * MS);

        // The failed metric is no longer the most overdue
        assert_eq!(state.select_next(), Some(1));
    }

    #[tokio::test]
    async fn test_nothing_available_sends_nothing() {
        let clock = ManualClock::new(0);
        let (mut state, port, stubs) = state_with(&[(1, 100), (2, 100)], clock.clone());
        for stub in &stubs {
            stub.set_available(false);
        }

        clock.set_ms(1000);
        assert_eq!(state.select_next(), None);
        assert!(!state.send_scheduled().await);
        assert!(port.get_written_data().is_empty());
        assert_eq!(state.last_trigger(), &[0, 0]);
    }

    #[tokio::test]
    async fn test_link_error_is_a_silent_skip() {
        let clock = ManualClock::new(0);
        let (mut state, port, _stubs) = state_with(&[(1, 100)], clock.clone());
        port.set_write_error(io::ErrorKind::BrokenPipe);

        clock.set_ms(200);
        state.select_next();
        assert!(!state.send_scheduled().await);
        assert_eq!(state.last_trigger()[0], 200 * MS);
    }

    #[tokio::test]
    async fn test_probe_is_side_effect_free() {
        let clock = ManualClock::new(0);
        let (mut state, port, stubs) = state_with(&[(1, 100), (2, 600)], clock.clone());

        clock.set_ms(700);
        for _ in 0..10 {
            state.select_next();
        }

        assert_eq!(state.last_trigger(), &[0, 0]);
        assert!(port.get_written_data().is_empty());
        for stub in &stubs {
            assert_eq!(stub.probe_count(), 10);
            assert_eq!(stub.produce_count(), 0);
        }
    }

    #[tokio::test]
    async fn test_tick_sends_previous_decision_then_reschedules() {
        let clock = ManualClock::new(0);
        let (mut state, port, stubs) = state_with(&[(1, 100), (2, 600)], clock.clone());

        // First tick has nothing scheduled yet
        clock.set_ms(10);
        assert!(!state.tick().await);
        assert_eq!(state.scheduled_item(), Some(0));

        clock.set_ms(20);
        assert!(state.tick().await);
        assert_eq!(stubs[0].produce_count(), 1);
        assert_eq!(port.get_written_data().len(), 1);
    }

    #[tokio::test(start_paused = true)]
    async fn test_loop_services_fast_and_slow_metrics() {
        let port = MockSerialPort::new();
        let (registry, _stubs) = stub_registry(&[(0x0101, 100), (0x0202, 600)]);
        let state = TelemetryState::new(
            SportLink::new(port.clone(), "mock"),
            registry,
            TelemetrySettings::default(),
            Arc::new(SharedVehicleState::new()),
            MonotonicClock::new(),
        )
        .unwrap();

        let task = tokio::spawn(run_telemetry_loop(state, DEFAULT_TICK_INTERVAL));
        tokio::time::sleep(Duration::from_secs(2)).await;
        task.abort();

        let ids: Vec<u16> = port.get_written_data().iter().map(|f| frame_id(f)).collect();
        let fast = ids.iter().filter(|&&id| id == 0x0101).count();
        let slow = ids.iter().filter(|&&id| id == 0x0202).count();

        assert!(slow >= 2, "Slow metric should still be serviced, got {}", slow);
        assert!(fast > slow * 10, "fast={} slow={}", fast, slow);
        // One frame per tick once the first decision is made
        assert!(ids.len() >= 190, "Expected ~200 frames, got {}", ids.len());
    }
}
