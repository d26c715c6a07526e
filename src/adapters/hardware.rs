//! Hardware adapter — bridges real peripherals to domain port traits.
//!
//! Owns the level ADC, the temperature bus and all actuator drivers,
//! exposing them as one [`Plant`](crate::app::ports::Plant).  The ADC and
//! bus drivers come from the board crate; this adapter only routes calls.

use embedded_hal::digital::OutputPin;
use embedded_hal::pwm::SetDutyCycle;
use log::info;

use crate::app::ports::{
    ActuatorPort, RawCode, Relay, Servo, TemperaturePort, VoltagePort,
};
use crate::control::duty::DutyMapper;
use crate::drivers::relay::RelayDriver;
use crate::drivers::servo::ServoDriver;
use crate::error::{ActuatorError, Result, SensorError};
use crate::sensors::level::LevelChannel;
use crate::sensors::temperature::{DeviceId, MAX_BUS_DEVICES};

/// Concrete adapter that combines all hardware behind port traits.
pub struct HardwareAdapter<A, T, R, S> {
    adc: A,
    bus: T,
    /// Heater relay, cooler relay.
    relays: [RelayDriver<R>; 2],
    /// Heater, cooler and main valve servos.
    servos: [ServoDriver<S>; 3],
}

impl<A, T, R, S> HardwareAdapter<A, T, R, S>
where
    A: VoltagePort,
    T: TemperaturePort,
    R: OutputPin,
    S: SetDutyCycle,
{
    /// Wire up the peripherals, release both relays and park every valve
    /// at 0 %.
    pub fn new(
        adc: A,
        bus: T,
        [heater_relay, cooler_relay]: [R; 2],
        [heater, cooler, main]: [S; 3],
        duty: &DutyMapper,
    ) -> Result<Self> {
        let mut hw = Self {
            adc,
            bus,
            relays: [RelayDriver::new(heater_relay)?, RelayDriver::new(cooler_relay)?],
            servos: [
                ServoDriver::new(heater),
                ServoDriver::new(cooler),
                ServoDriver::new(main),
            ],
        };
        for servo in [Servo::Heater, Servo::Cooler, Servo::Main] {
            hw.set_servo(servo, duty.to_duty(0.0, servo))?;
        }
        info!("hardware ready: relays released, valves parked");
        Ok(hw)
    }

    pub fn relay_on(&self, relay: Relay) -> bool {
        self.relays[relay as usize].is_on()
    }

    pub fn servo_duty(&self, servo: Servo) -> u16 {
        self.servos[servo as usize].duty()
    }
}

// ── Sensor ports ──────────────────────────────────────────────

impl<A: VoltagePort, T, R, S> VoltagePort for HardwareAdapter<A, T, R, S> {
    fn read_raw(&mut self, channel: LevelChannel) -> core::result::Result<RawCode, SensorError> {
        self.adc.read_raw(channel)
    }

    fn raw_to_voltage(&self, channel: LevelChannel, raw: RawCode) -> f32 {
        self.adc.raw_to_voltage(channel, raw)
    }
}

impl<A, T: TemperaturePort, R, S> TemperaturePort for HardwareAdapter<A, T, R, S> {
    fn scan(
        &mut self,
    ) -> core::result::Result<heapless::Vec<DeviceId, MAX_BUS_DEVICES>, SensorError> {
        self.bus.scan()
    }

    fn convert_and_read(&mut self, id: DeviceId) -> core::result::Result<f32, SensorError> {
        self.bus.convert_and_read(id)
    }
}

// ── ActuatorPort implementation ───────────────────────────────

impl<A, T, R: OutputPin, S: SetDutyCycle> ActuatorPort for HardwareAdapter<A, T, R, S> {
    fn set_servo(&mut self, servo: Servo, duty: u16) -> core::result::Result<(), ActuatorError> {
        self.servos[servo as usize].set_duty(duty)
    }

    fn set_relay(&mut self, relay: Relay, on: bool) -> core::result::Result<(), ActuatorError> {
        self.relays[relay as usize].set(on)
    }
}
