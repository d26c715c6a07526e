//! One-wire digital temperature probe (DS18B20 family).
//!
//! The bus driver itself lives outside this crate behind
//! [`TemperaturePort`].  This module owns the retry and plausibility
//! policy applied on top of it.

use core::fmt;

use log::debug;

use crate::app::ports::TemperaturePort;
use crate::error::SensorError;

/// Lowest temperature the probe can report (°C).
pub const MIN_PLAUSIBLE_C: f32 = -55.0;
/// Highest temperature the probe can report (°C).
pub const MAX_PLAUSIBLE_C: f32 = 125.0;

/// Upper bound on devices returned by one bus scan.
pub const MAX_BUS_DEVICES: usize = 8;

/// 64-bit one-wire ROM code.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub struct DeviceId(pub [u8; 8]);

impl fmt::Display for DeviceId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        for b in self.0 {
            write!(f, "{b:02X}")?;
        }
        Ok(())
    }
}

/// Reject values the probe cannot physically produce.
pub fn check_plausible(celsius: f32) -> Result<f32, SensorError> {
    if celsius.is_finite() && (MIN_PLAUSIBLE_C..=MAX_PLAUSIBLE_C).contains(&celsius) {
        Ok(celsius)
    } else {
        Err(SensorError::OutOfRange)
    }
}

/// Convert and read `id`, retrying up to `attempts` times back-to-back.
///
/// Returns the last error once the budget is spent.
pub fn read_with_retry(
    port: &mut impl TemperaturePort,
    id: DeviceId,
    attempts: u8,
) -> Result<f32, SensorError> {
    let mut last_err = SensorError::ConversionFailed;
    for attempt in 1..=attempts.max(1) {
        match port.convert_and_read(id).and_then(check_plausible) {
            Ok(celsius) => return Ok(celsius),
            Err(e) => {
                debug!("temp read {attempt}/{attempts} on {id} failed: {e}");
                last_err = e;
            }
        }
    }
    Err(last_err)
}

/// Scan the bus once and return the first device found.
///
/// An empty bus is reported as [`SensorError::NotFound`].
pub fn probe_bus(port: &mut impl TemperaturePort) -> Result<DeviceId, SensorError> {
    let devices = port.scan()?;
    devices.first().copied().ok_or(SensorError::NotFound)
}
