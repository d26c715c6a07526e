//! System configuration parameters
//!
//! Calibration constants for the regulator: actuator duty ranges, level
//! sensor thresholds, loop timing, and retry budgets.  Nothing here is
//! computed at runtime; values come from [`SystemConfig::default`] or from
//! a JSON document supplied by the integrator.

use serde::{Deserialize, Serialize};

use crate::error::{Error, Result};

/// Calibrated duty range of one servo, in 16-bit PWM counts.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct DutyRange {
    pub min: u16,
    pub max: u16,
}

impl DutyRange {
    pub const fn new(min: u16, max: u16) -> Self {
        Self { min, max }
    }

    /// Width of the range in counts.
    pub fn span(&self) -> f32 {
        f32::from(self.max) - f32::from(self.min)
    }
}

/// Core system configuration
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct SystemConfig {
    // --- Servo calibration ---
    /// Heater valve servo range (maps inversely).
    pub heater_duty: DutyRange,
    /// Cooler valve servo range (maps directly).
    pub cooler_duty: DutyRange,
    /// Main drain valve servo range (maps inversely).
    pub main_duty: DutyRange,

    // --- Level sensors ---
    /// Wet/dry decision voltage for the heater tank probes.
    pub heater_level_threshold_v: f32,
    /// Wet/dry decision voltage for the cooler tank probes.
    pub cooler_level_threshold_v: f32,
    /// Wet/dry decision voltage for the main tank probes.
    pub main_level_threshold_v: f32,
    /// Consecutive samples that must agree before a level changes.
    pub verification_samples: u8,

    // --- Timing ---
    /// Nominal regulation tick period (milliseconds).
    pub tick_period_ms: u32,
    /// Poll period while the servo interlock holds the loop (milliseconds).
    pub locked_backoff_ms: u32,

    // --- Temperature sensor ---
    /// Bus scans attempted before giving up on discovery.
    pub discovery_attempts: u8,
    /// Pause between discovery scans (milliseconds).
    pub discovery_spacing_ms: u32,
    /// Conversions attempted per tick before falling back to the last good value.
    pub temperature_read_attempts: u8,

    // --- Operator ---
    /// Lowest setpoint the operator may enter (°C).
    pub setpoint_min_c: u8,
    /// Highest setpoint the operator may enter (°C).
    pub setpoint_max_c: u8,
}

impl Default for SystemConfig {
    fn default() -> Self {
        Self {
            heater_duty: DutyRange::new(2900, 5000),
            cooler_duty: DutyRange::new(2900, 5500),
            main_duty: DutyRange::new(1400, 4600),

            heater_level_threshold_v: 3.3,
            cooler_level_threshold_v: 3.3,
            main_level_threshold_v: 3.3,
            verification_samples: 3,

            tick_period_ms: 100,    // 10 Hz
            locked_backoff_ms: 500, // 2 Hz while drained

            discovery_attempts: 10,
            discovery_spacing_ms: 200,
            temperature_read_attempts: 2,

            setpoint_min_c: 20,
            setpoint_max_c: 40,
        }
    }
}

impl SystemConfig {
    /// Parse a JSON document.  Missing fields take their defaults; the
    /// result is validated before it is returned.
    pub fn from_json(json: &str) -> Result<Self> {
        let config: Self =
            serde_json::from_str(json).map_err(|_| Error::Config("malformed JSON"))?;
        config.validate()?;
        Ok(config)
    }

    /// Reject values the control loop cannot operate with.
    pub fn validate(&self) -> Result<()> {
        for range in [self.heater_duty, self.cooler_duty, self.main_duty] {
            if range.min >= range.max {
                return Err(Error::Config("duty range min must be below max"));
            }
        }
        for threshold in [
            self.heater_level_threshold_v,
            self.cooler_level_threshold_v,
            self.main_level_threshold_v,
        ] {
            if !threshold.is_finite() || threshold <= 0.0 {
                return Err(Error::Config("level threshold must be a positive voltage"));
            }
        }
        if self.verification_samples == 0 {
            return Err(Error::Config("verification_samples must be at least 1"));
        }
        if self.tick_period_ms == 0 {
            return Err(Error::Config("tick_period_ms must be nonzero"));
        }
        if self.discovery_attempts == 0 {
            return Err(Error::Config("discovery_attempts must be at least 1"));
        }
        if self.temperature_read_attempts == 0 {
            return Err(Error::Config("temperature_read_attempts must be at least 1"));
        }
        if self.setpoint_min_c > self.setpoint_max_c {
            return Err(Error::Config("setpoint bounds are inverted"));
        }
        Ok(())
    }
}
