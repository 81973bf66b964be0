//! # Serial Communication Module
//!
//! Handles the S.Port serial link to the Taranis receiver.
//!
//! This module handles:
//! - Acquiring the serial device
//! - Switching the line to the S.Port baud rate
//! - Writing encoded data frames

pub mod port_trait;

use crate::error::{Result, TelemetryError};
use crate::sport::encoder::encode_data_frame;
use crate::sport::protocol::SPORT_BAUD_RATE;
use port_trait::{SerialPortIO, TokioSerialPort};
use tokio_serial::SerialPortBuilderExt;
use tracing::{debug, info, warn};

/// Default S.Port device paths to try (in order of preference)
const DEFAULT_DEVICE_PATHS: &[&str] = &[
    "/dev/ttyUSB0", // USB-to-serial adapters with S.Port inverter
    "/dev/ttyACM0", // USB CDC bridges
];

/// S.Port link handle
///
/// Owns the serial port the telemetry loop writes frames to.
pub struct SportLink<P> {
    /// Serial port handle
    port: P,
    /// Device path (e.g., /dev/ttyUSB0)
    device_path: String,
}

impl<P> std::fmt::Debug for SportLink<P> {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("SportLink")
            .field("device_path", &self.device_path)
            .finish_non_exhaustive()
    }
}

impl SportLink<TokioSerialPort> {
    /// Acquire the S.Port link
    ///
    /// Auto-detects the device by trying common paths.
    ///
    /// # Errors
    ///
    /// Returns error if no S.Port device found or connection fails
    ///
    /// # Examples
    ///
    /// ```no_run
    /// use sport_telemetry::serial::SportLink;
    ///
    /// fn main() -> anyhow::Result<()> {
    ///     let link = SportLink::acquire()?;
    ///     Ok(())
    /// }
    /// ```
    pub fn acquire() -> Result<Self> {
        Self::acquire_with_paths(DEFAULT_DEVICE_PATHS)
    }

    /// Acquire the S.Port link with custom device paths
    ///
    /// # Arguments
    ///
    /// * `paths` - Device paths to try (e.g., &["/dev/ttyUSB0"])
    pub fn acquire_with_paths(paths: &[&str]) -> Result<Self> {
        for &path in paths {
            debug!("Trying to open serial port: {}", path);

            match Self::open_port(path) {
                Ok(port) => {
                    info!("Successfully opened S.Port device at {}", path);
                    return Ok(Self::new(TokioSerialPort::new(port), path));
                }
                Err(e) => {
                    warn!("Failed to open {}: {}", path, e);
                    continue;
                }
            }
        }

        Err(TelemetryError::SerialPortNotFound(paths.join(", ")))
    }

    /// Acquire the configured device, or auto-detect when none is set
    ///
    /// # Errors
    ///
    /// Returns error if the device cannot be opened
    pub fn acquire_configured(port: Option<&str>) -> Result<Self> {
        match port {
            Some(path) => Self::acquire_with_paths(&[path]),
            None => Self::acquire(),
        }
    }

    /// Open a specific serial port with S.Port line settings (8N1)
    fn open_port(path: &str) -> Result<tokio_serial::SerialStream> {
        let port = tokio_serial::new(path, SPORT_BAUD_RATE)
            .data_bits(tokio_serial::DataBits::Eight)
            .parity(tokio_serial::Parity::None)
            .stop_bits(tokio_serial::StopBits::One)
            .flow_control(tokio_serial::FlowControl::None)
            .open_native_async()
            .map_err(|e| TelemetryError::Serial(format!("Failed to open {}: {}", path, e)))?;

        Ok(port)
    }
}

impl<P: SerialPortIO> SportLink<P> {
    /// Wrap an already opened port
    pub fn new(port: P, device_path: impl Into<String>) -> Self {
        Self {
            port,
            device_path: device_path.into(),
        }
    }

    /// Set the transmission rate of the link
    ///
    /// # Errors
    ///
    /// Returns error if the port rejects the rate
    pub fn configure_baud(&mut self, baud_rate: u32) -> Result<()> {
        self.port.set_baud_rate(baud_rate).map_err(|e| {
            TelemetryError::Serial(format!("Failed to set baud rate {}: {}", baud_rate, e))
        })?;

        debug!("S.Port link at {} set to {} baud", self.device_path, baud_rate);
        Ok(())
    }

    /// Encode and send one data frame
    ///
    /// # Arguments
    ///
    /// * `id` - Sensor value id
    /// * `value` - Encoded value
    /// * `more` - More frames may follow in the same polling cycle
    ///
    /// # Examples
    ///
    /// ```no_run
    /// use sport_telemetry::serial::SportLink;
    /// use sport_telemetry::sport::protocol::SPORT_RSSI_ID;
    ///
    /// #[tokio::main]
    /// async fn main() -> anyhow::Result<()> {
    ///     let mut link = SportLink::acquire()?;
    ///     link.write_frame(SPORT_RSSI_ID, 87, true).await?;
    ///     Ok(())
    /// }
    /// ```
    pub async fn write_frame(&mut self, id: u16, value: u32, more: bool) -> Result<()> {
        let frame = encode_data_frame(id, value, more);

        self.port
            .write_all(&frame)
            .await
            .map_err(|e| TelemetryError::Serial(format!("Failed to write frame: {}", e)))?;

        self.port
            .flush()
            .await
            .map_err(|e| TelemetryError::Serial(format!("Failed to flush serial port: {}", e)))?;

        debug!("Sent S.Port frame id=0x{:04X} value={} ({} bytes)", id, value, frame.len());
        Ok(())
    }

    /// Get the device path of the opened serial port
    pub fn device_path(&self) -> &str {
        &self.device_path
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::sport::protocol::{SPORT_CURR_ID, SPORT_DATA_FRAME, SPORT_POLL_REQUEST};
    use port_trait::mocks::MockSerialPort;
    use std::io;

    #[test]
    fn test_constants() {
        assert_eq!(DEFAULT_DEVICE_PATHS.len(), 2);
        assert_eq!(DEFAULT_DEVICE_PATHS[0], "/dev/ttyUSB0");
        assert_eq!(DEFAULT_DEVICE_PATHS[1], "/dev/ttyACM0");
    }

    #[test]
    fn test_acquire_with_invalid_paths_returns_error() {
        let invalid_paths = &["/dev/nonexistent0", "/dev/nonexistent1"];
        let result = SportLink::acquire_with_paths(invalid_paths);

        match result {
            Err(TelemetryError::SerialPortNotFound(msg)) => {
                assert!(msg.contains("/dev/nonexistent0"));
                assert!(msg.contains("/dev/nonexistent1"));
            }
            other => panic!("Expected SerialPortNotFound error, got: {:?}", other),
        }
    }

    #[test]
    fn test_acquire_with_empty_paths_returns_error() {
        let empty_paths: &[&str] = &[];
        let result = SportLink::acquire_with_paths(empty_paths);

        assert!(matches!(result, Err(TelemetryError::SerialPortNotFound(_))));
    }

    #[test]
    fn test_acquire_configured_tries_only_that_path() {
        let result = SportLink::acquire_configured(Some("/dev/nonexistent_sport0"));

        match result {
            Err(TelemetryError::SerialPortNotFound(msg)) => {
                assert_eq!(msg, "/dev/nonexistent_sport0");
            }
            other => panic!("Expected SerialPortNotFound error, got: {:?}", other),
        }
    }

    #[test]
    fn test_acquire_configured_without_port_auto_detects() {
        // Without hardware attached every default path is tried and listed
        if let Err(TelemetryError::SerialPortNotFound(msg)) = SportLink::acquire_configured(None) {
            for path in DEFAULT_DEVICE_PATHS {
                assert!(msg.contains(path), "{} should have been tried", path);
            }
        }
    }

    #[test]
    fn test_open_port_with_invalid_path_returns_error() {
        let result = SportLink::open_port("/dev/nonexistent_serial_device_12345");

        match result {
            Err(TelemetryError::Serial(msg)) => {
                assert!(msg.contains("/dev/nonexistent_serial_device_12345"));
                assert!(msg.contains("Failed to open"));
            }
            other => panic!("Expected Serial error, got: {:?}", other.map(|_| ())),
        }
    }

    #[tokio::test]
    async fn test_write_frame_sends_encoded_frame() {
        let port = MockSerialPort::new();
        let mut link = SportLink::new(port.clone(), "mock");

        link.write_frame(SPORT_CURR_ID, 10, true).await.unwrap();

        let written = port.get_written_data();
        assert_eq!(written.len(), 1);
        assert_eq!(written[0][0], SPORT_POLL_REQUEST);
        assert_eq!(written[0][2], SPORT_DATA_FRAME);
        assert_eq!(&written[0][3..5], &SPORT_CURR_ID.to_le_bytes());
    }

    #[tokio::test]
    async fn test_write_frame_reports_write_error() {
        let port = MockSerialPort::new();
        port.set_write_error(io::ErrorKind::BrokenPipe);
        let mut link = SportLink::new(port.clone(), "mock");

        let result = link.write_frame(SPORT_CURR_ID, 10, true).await;

        match result {
            Err(TelemetryError::Serial(msg)) => assert!(msg.contains("Failed to write frame")),
            other => panic!("Expected Serial error, got: {:?}", other),
        }
        assert!(port.get_written_data().is_empty());
    }

    #[tokio::test]
    async fn test_write_frame_reports_flush_error() {
        let port = MockSerialPort::new();
        port.set_flush_error(io::ErrorKind::TimedOut);
        let mut link = SportLink::new(port, "mock");

        let result = link.write_frame(SPORT_CURR_ID, 10, false).await;
        assert!(matches!(result, Err(TelemetryError::Serial(_))));
    }

    #[test]
    fn test_configure_baud() {
        let port = MockSerialPort::new();
        let mut link = SportLink::new(port.clone(), "mock");

        link.configure_baud(SPORT_BAUD_RATE).unwrap();
        assert_eq!(port.get_baud_rates(), vec![57_600]);
    }

    #[test]
    fn test_configure_baud_error() {
        let port = MockSerialPort::new();
        port.set_baud_error(io::ErrorKind::InvalidInput);
        let mut link = SportLink::new(port.clone(), "mock");

        assert!(link.configure_baud(SPORT_BAUD_RATE).is_err());
        assert!(port.get_baud_rates().is_empty());
    }

    #[test]
    fn test_device_path() {
        let link = SportLink::new(MockSerialPort::new(), "/dev/ttyUSB3");
        assert_eq!(link.device_path(), "/dev/ttyUSB3");
    }

    // Integration test - only runs if S.Port hardware is connected
    #[tokio::test]
    #[ignore] // Run with: cargo test -- --ignored
    async fn test_write_frame_with_real_hardware() {
        if let Ok(mut link) = SportLink::acquire() {
            let result = link.write_frame(SPORT_CURR_ID, 10, true).await;
            assert!(result.is_ok(), "Failed to send frame: {:?}", result);
        } else {
            println!("No S.Port hardware detected (skipping send test)");
        }
    }
}
