//! Pump relay driver.
//!
//! The relay boards are active-low: pulling the input low energises the
//! coil.  The driver hides that inversion, so callers only ever say
//! on/off.
//!
//! ## Safety contract
//!
//! A relay must stay off while its tank is full.  That rule is enforced
//! by the interlock engine; this driver is a dumb actuator.

use embedded_hal::digital::OutputPin;

use crate::error::ActuatorError;

pub struct RelayDriver<P> {
    pin: P,
    on: bool,
}

impl<P: OutputPin> RelayDriver<P> {
    /// Take ownership of `pin` and release the relay.
    pub fn new(pin: P) -> Result<Self, ActuatorError> {
        let mut relay = Self { pin, on: true };
        relay.set(false)?;
        Ok(relay)
    }

    pub fn set(&mut self, on: bool) -> Result<(), ActuatorError> {
        let result = if on {
            self.pin.set_low()
        } else {
            self.pin.set_high()
        };
        result.map_err(|_| ActuatorError::GpioWriteFailed)?;
        self.on = on;
        Ok(())
    }

    pub fn is_on(&self) -> bool {
        self.on
    }

    /// Give the pin back.
    pub fn release(self) -> P {
        self.pin
    }
}
