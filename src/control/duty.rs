//! Percentage → servo duty mapping.
//!
//! Each valve servo has its own calibrated duty window.  Heater and main
//! valves are mounted so that a larger opening needs a *smaller* duty; the
//! cooler valve runs the other way.

use crate::app::ports::Servo;
use crate::config::{DutyRange, SystemConfig};

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Polarity {
    /// 0 % → `min`, 100 % → `max`.
    Direct,
    /// 0 % → `max`, 100 % → `min`.
    Inverse,
}

impl Servo {
    pub const fn polarity(self) -> Polarity {
        match self {
            Self::Heater | Self::Main => Polarity::Inverse,
            Self::Cooler => Polarity::Direct,
        }
    }
}

/// Interpolate `percentage` (clamped to 0–100) into `range`.
pub fn scale(percentage: f32, range: DutyRange, polarity: Polarity) -> u16 {
    let fraction = if percentage.is_nan() {
        0.0
    } else {
        percentage.clamp(0.0, 100.0) / 100.0
    };
    let duty = match polarity {
        Polarity::Direct => f32::from(range.min) + fraction * range.span(),
        Polarity::Inverse => f32::from(range.max) - fraction * range.span(),
    };
    duty as u16
}

/// Per-device calibration table.
#[derive(Debug, Clone, Copy)]
pub struct DutyMapper {
    heater: DutyRange,
    cooler: DutyRange,
    main: DutyRange,
}

impl DutyMapper {
    pub fn new(config: &SystemConfig) -> Self {
        Self {
            heater: config.heater_duty,
            cooler: config.cooler_duty,
            main: config.main_duty,
        }
    }

    pub fn range(&self, device: Servo) -> DutyRange {
        match device {
            Servo::Heater => self.heater,
            Servo::Cooler => self.cooler,
            Servo::Main => self.main,
        }
    }

    pub fn to_duty(&self, percentage: f32, device: Servo) -> u16 {
        scale(percentage, self.range(device), device.polarity())
    }
}
