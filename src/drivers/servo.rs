//! Valve servo driver.
//!
//! Forwards calibrated 16-bit duties to any `embedded-hal` PWM channel
//! running at the servo frame rate (50 Hz).  Calibration happens upstream
//! in [`DutyMapper`](crate::control::duty::DutyMapper).

use embedded_hal::pwm::SetDutyCycle;

use crate::error::ActuatorError;

pub struct ServoDriver<P> {
    pwm: P,
    duty: u16,
}

impl<P: SetDutyCycle> ServoDriver<P> {
    pub fn new(pwm: P) -> Self {
        Self { pwm, duty: 0 }
    }

    /// Write `duty`, saturated to the channel's maximum.
    pub fn set_duty(&mut self, duty: u16) -> Result<(), ActuatorError> {
        let duty = duty.min(self.pwm.max_duty_cycle());
        self.pwm
            .set_duty_cycle(duty)
            .map_err(|_| ActuatorError::PwmWriteFailed)?;
        self.duty = duty;
        Ok(())
    }

    /// Last duty successfully written.
    pub fn duty(&self) -> u16 {
        self.duty
    }
}
