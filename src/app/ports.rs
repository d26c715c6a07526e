//! Port traits — the hexagonal boundary between domain logic and the outside world.
//!
//! ```text
//!   Adapter ──▶ Port trait ──▶ InterlockEngine / ControlService (domain)
//! ```
//!
//! Driven adapters (ADC, one-wire bus, servos, relays, keypad, clock)
//! implement these traits.  The domain core consumes them via generics,
//! so it never touches hardware directly.  Sleeping goes through
//! [`embedded_hal::delay::DelayNs`] rather than a port of our own.

use heapless::Vec;

use crate::error::{ActuatorError, SensorError};
use crate::sensors::level::LevelChannel;
use crate::sensors::temperature::{DeviceId, MAX_BUS_DEVICES};

use super::commands::Key;

/// Raw ADC conversion code.
pub type RawCode = i16;

// ───────────────────────────────────────────────────────────────
// Sensor ports (driven adapter: hardware → domain)
// ───────────────────────────────────────────────────────────────

/// Analog level probes.
pub trait VoltagePort {
    /// Take one conversion on `channel`.
    fn read_raw(&mut self, channel: LevelChannel) -> Result<RawCode, SensorError>;

    /// Convert a raw code from `channel`'s ADC into volts.
    fn raw_to_voltage(&self, channel: LevelChannel, raw: RawCode) -> f32;

    /// Read and convert in one step.
    fn read_voltage(&mut self, channel: LevelChannel) -> Result<f32, SensorError> {
        let raw = self.read_raw(channel)?;
        Ok(self.raw_to_voltage(channel, raw))
    }
}

/// One-wire temperature bus.
pub trait TemperaturePort {
    /// Enumerate devices on the bus.
    fn scan(&mut self) -> Result<Vec<DeviceId, MAX_BUS_DEVICES>, SensorError>;

    /// Blocking conversion + read of one device (°C).  May fail transiently.
    fn convert_and_read(&mut self, id: DeviceId) -> Result<f32, SensorError>;
}

// ───────────────────────────────────────────────────────────────
// Actuator port (driven adapter: domain → hardware)
// ───────────────────────────────────────────────────────────────

/// Valve servos.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum Servo {
    Heater,
    Cooler,
    Main,
}

/// Pump relays.  Relay 1 feeds the heater loop, relay 2 the cooler loop.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum Relay {
    Heater,
    Cooler,
}

/// Write-side port: the domain calls this to command actuators.
///
/// Duties arrive already calibrated by
/// [`DutyMapper`](crate::control::duty::DutyMapper); implementations only
/// forward them.
pub trait ActuatorPort {
    /// Drive a servo to a calibrated 16-bit duty.
    fn set_servo(&mut self, servo: Servo, duty: u16) -> Result<(), ActuatorError>;

    /// Energise (`true`) or release (`false`) a relay.
    fn set_relay(&mut self, relay: Relay, on: bool) -> Result<(), ActuatorError>;
}

/// Everything wired to the process: level probes, temperature bus and
/// actuators.  One value satisfies all three so the control loop can hold
/// a single mutable borrow of the hardware.
pub trait Plant: VoltagePort + TemperaturePort + ActuatorPort {}

impl<T: VoltagePort + TemperaturePort + ActuatorPort> Plant for T {}

// ───────────────────────────────────────────────────────────────
// Operator input and time
// ───────────────────────────────────────────────────────────────

/// Keypad, polled once per tick.  Must never block.
pub trait OperatorInput {
    fn poll(&mut self) -> Option<Key>;
}

/// Monotonic millisecond clock.
pub trait Clock {
    fn now_ms(&self) -> u64;
}

// ───────────────────────────────────────────────────────────────
// Event sink port (driven adapter: domain → logging / display)
// ───────────────────────────────────────────────────────────────

/// The domain emits structured [`AppEvent`](super::events::AppEvent)s
/// through this port.  Adapters decide where they go (serial log, LCD).
pub trait EventSink {
    fn emit(&mut self, event: &super::events::AppEvent);
}
