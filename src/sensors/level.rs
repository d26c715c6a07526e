//! Capacitive liquid-level probes.
//!
//! Each tank (heater, cooler, main) carries two probes: LL near the bottom
//! and LH near the top.  A probe reads as an analog voltage; above the
//! group threshold the probe is wet.
//!
//! The probes are noisy, so a single sample never flips a level.  Instead
//! [`verify`] takes a burst of samples and only reports a definite level if
//! every sample lands on the same side of the threshold.

use core::fmt;

use crate::error::SensorError;

/// Physical tank a probe pair belongs to.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
#[repr(u8)]
pub enum SensorGroup {
    Heater = 0,
    Cooler = 1,
    Main = 2,
}

impl SensorGroup {
    pub const COUNT: usize = 3;
    pub const ALL: [Self; Self::COUNT] = [Self::Heater, Self::Cooler, Self::Main];

    pub const fn low(self) -> LevelChannel {
        LevelChannel { group: self, probe: Probe::Low }
    }

    pub const fn high(self) -> LevelChannel {
        LevelChannel { group: self, probe: Probe::High }
    }
}

/// Position of a probe within its tank.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum Probe {
    /// LL, the bottom probe.
    Low,
    /// LH, the top probe.
    High,
}

/// One of the six level probes.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub struct LevelChannel {
    pub group: SensorGroup,
    pub probe: Probe,
}

impl LevelChannel {
    pub const COUNT: usize = 6;

    /// All channels in ADC read order.
    pub const ALL: [Self; Self::COUNT] = [
        SensorGroup::Heater.high(),
        SensorGroup::Heater.low(),
        SensorGroup::Cooler.high(),
        SensorGroup::Cooler.low(),
        SensorGroup::Main.high(),
        SensorGroup::Main.low(),
    ];

    /// Dense index in `0..COUNT`.
    pub const fn index(self) -> usize {
        let probe = match self.probe {
            Probe::High => 0,
            Probe::Low => 1,
        };
        self.group as usize * 2 + probe
    }

    pub const fn name(self) -> &'static str {
        match (self.group, self.probe) {
            (SensorGroup::Heater, Probe::High) => "LH_Heater",
            (SensorGroup::Heater, Probe::Low) => "LL_Heater",
            (SensorGroup::Cooler, Probe::High) => "LH_Cooler",
            (SensorGroup::Cooler, Probe::Low) => "LL_Cooler",
            (SensorGroup::Main, Probe::High) => "LH_Main",
            (SensorGroup::Main, Probe::Low) => "LL_Main",
        }
    }
}

impl fmt::Display for LevelChannel {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.name())
    }
}

/// Outcome of a sample burst.
#[derive(Debug, Clone, Copy, PartialEq)]
pub enum Verification {
    /// Every sample was above the threshold.  Carries the last sample.
    High(f32),
    /// Every sample was at or below the threshold.  Carries the last sample.
    Low(f32),
    /// Samples disagreed, or a sample could not be read.
    Ambiguous,
}

/// Sample `read` `attempts` times and report a consensus level.
///
/// A failed read poisons the burst: the result is `Ambiguous`, which
/// leaves the latched level untouched.
pub fn verify<F>(mut read: F, threshold: f32, attempts: u8) -> Verification
where
    F: FnMut() -> Result<f32, SensorError>,
{
    if attempts == 0 {
        return Verification::Ambiguous;
    }

    let mut all_high = true;
    let mut all_low = true;
    let mut last = 0.0_f32;

    for _ in 0..attempts {
        let Ok(volts) = read() else {
            return Verification::Ambiguous;
        };
        if volts > threshold {
            all_low = false;
        } else {
            all_high = false;
        }
        last = volts;
    }

    if all_high {
        Verification::High(last)
    } else if all_low {
        Verification::Low(last)
    } else {
        Verification::Ambiguous
    }
}
