//! Liquid-level safety interlock.
//!
//! The interlock runs **every tick before the control loop** and decides,
//! from the six level probes, whether the heater relay, cooler relay and
//! the valve servos may be driven by regulation.
//!
//! ## Per-tick sequence
//!
//! 1. Each probe is sampled in a burst ([`verify`]).  Only a unanimous
//!    burst can move the probe's latch; an ambiguous burst keeps the last
//!    known level.
//! 2. The latched pair of every tank is made physically consistent
//!    ([`apply_consistency`]): a wet top probe over a dry bottom probe is
//!    treated as dry.
//! 3. Each tank's consistent pair drives its actuator branch:
//!
//! ```text
//!   tank      LH wet              LL dry               LL wet, LH dry
//!   heater    lock, relay 1 off   unlock, relay 1 on   no command
//!   cooler    lock, relay 2 off   unlock, relay 2 on   no command
//!   main      lock, drain posture unlock, main 0 %     no command
//! ```
//!
//! A branch only talks to hardware when its decision differs from the one
//! it last applied, so a steady plant produces no command traffic.  A
//! failed command is forgotten and re-issued on the next tick; actuator
//! faults never escape this module.

use log::{debug, error, info, warn};

use crate::app::ports::{ActuatorPort, Relay, Servo, VoltagePort};
use crate::config::SystemConfig;
use crate::control::duty::DutyMapper;
use crate::error::ActuatorError;
use crate::sensors::level::{verify, LevelChannel, SensorGroup, Verification};

/// Lock flags published once per evaluation.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct LockState {
    /// Heater tank over-full; relay 1 held off.
    pub relay1_locked: bool,
    /// Cooler tank over-full; relay 2 held off.
    pub relay2_locked: bool,
    /// Main tank over-full; servos held in the drain posture.
    pub servo_locked: bool,
}

/// Wet/dry state of one tank's probe pair.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct GroupLevels {
    /// LL probe wet.
    pub low: bool,
    /// LH probe wet.
    pub high: bool,
}

impl GroupLevels {
    /// The top probe cannot be wet while the bottom one is dry.
    pub fn is_consistent(&self) -> bool {
        self.low || !self.high
    }
}

/// Force a probe pair into a physically possible state.
///
/// The dry-bottom pass runs first, so a "wet top over dry bottom" pair
/// resolves to dry/dry rather than wet/wet.
pub fn apply_consistency(levels: GroupLevels) -> GroupLevels {
    let mut levels = levels;
    if !levels.low {
        levels.high = false;
    }
    if levels.high {
        levels.low = true;
    }
    levels
}

/// Override the servo branch applies to the valves.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
enum ServoOverride {
    /// Heater 0 %, cooler 0 %, main 100 %.
    Drain,
    /// Main 0 %.
    CloseMain,
}

/// Owns the probe latches and lock flags.
pub struct InterlockEngine {
    latches: [bool; LevelChannel::COUNT],
    locks: LockState,
    thresholds: [f32; SensorGroup::COUNT],
    samples: u8,
    duty: DutyMapper,
    /// Last relay state each relay branch applied (`true` = on).
    applied_relays: [Option<bool>; 2],
    applied_servos: Option<ServoOverride>,
}

impl InterlockEngine {
    pub fn new(config: &SystemConfig) -> Self {
        Self {
            latches: [false; LevelChannel::COUNT],
            locks: LockState::default(),
            thresholds: [
                config.heater_level_threshold_v,
                config.cooler_level_threshold_v,
                config.main_level_threshold_v,
            ],
            samples: config.verification_samples,
            duty: DutyMapper::new(config),
            applied_relays: [None; 2],
            applied_servos: None,
        }
    }

    /// Sample every probe, update latches and locks, and apply overrides.
    pub fn evaluate(&mut self, hw: &mut (impl VoltagePort + ActuatorPort)) -> LockState {
        for channel in LevelChannel::ALL {
            let threshold = self.threshold(channel.group);
            let result = verify(|| hw.read_voltage(channel), threshold, self.samples);
            if matches!(result, Verification::Ambiguous) {
                debug!("{channel}: ambiguous burst, holding {}", self.latched(channel));
            }
            self.latch(channel, result, threshold);
        }

        let heater = apply_consistency(self.levels(SensorGroup::Heater));
        let cooler = apply_consistency(self.levels(SensorGroup::Cooler));
        let main = apply_consistency(self.levels(SensorGroup::Main));

        self.drive_relay(Relay::Heater, heater, hw);
        self.drive_relay(Relay::Cooler, cooler, hw);
        self.drive_servos(main, hw);

        self.locks
    }

    /// Fold one verification result into `channel`'s latch.
    ///
    /// Returns the latched level after the update.
    pub fn latch(&mut self, channel: LevelChannel, result: Verification, threshold: f32) -> bool {
        let latched = &mut self.latches[channel.index()];
        match result {
            Verification::High(volts) if volts > threshold && !*latched => {
                *latched = true;
                debug!("{channel} HIGH ({volts:.2} V)");
            }
            Verification::Low(volts) if volts <= threshold && *latched => {
                *latched = false;
                debug!("{channel} LOW ({volts:.2} V)");
            }
            _ => {}
        }
        *latched
    }

    /// Latched (unreconciled) level of one probe.
    pub fn latched(&self, channel: LevelChannel) -> bool {
        self.latches[channel.index()]
    }

    /// Latched (unreconciled) levels of one tank.
    pub fn levels(&self, group: SensorGroup) -> GroupLevels {
        GroupLevels {
            low: self.latched(group.low()),
            high: self.latched(group.high()),
        }
    }

    /// Most recently published lock flags.
    pub fn locks(&self) -> LockState {
        self.locks
    }

    /// Decision voltage for a tank's probes.
    pub fn threshold(&self, group: SensorGroup) -> f32 {
        self.thresholds[group as usize]
    }

    /// Forget which overrides were applied so the next evaluation
    /// re-asserts every branch that has a decision.
    pub fn reassert(&mut self) {
        self.applied_relays = [None; 2];
        self.applied_servos = None;
    }

    // ── Internal ──────────────────────────────────────────────────

    fn drive_relay(&mut self, relay: Relay, levels: GroupLevels, hw: &mut impl ActuatorPort) {
        let locked = if levels.high {
            true
        } else if !levels.low {
            false
        } else {
            return;
        };

        let (idx, flag) = match relay {
            Relay::Heater => (0, &mut self.locks.relay1_locked),
            Relay::Cooler => (1, &mut self.locks.relay2_locked),
        };
        if *flag != locked {
            if locked {
                warn!("INTERLOCK: {relay:?} tank full, relay locked off");
            } else {
                info!("INTERLOCK: {relay:?} tank low, relay released");
            }
            *flag = locked;
        }

        let on = !locked;
        if self.applied_relays[idx] == Some(on) {
            return;
        }
        match hw.set_relay(relay, on) {
            Ok(()) => self.applied_relays[idx] = Some(on),
            Err(e) => {
                error!("INTERLOCK: {relay:?} relay command failed: {e}, retrying next tick");
                self.applied_relays[idx] = None;
            }
        }
    }

    fn drive_servos(&mut self, main: GroupLevels, hw: &mut impl ActuatorPort) {
        let action = if main.high {
            ServoOverride::Drain
        } else if !main.low {
            ServoOverride::CloseMain
        } else {
            return;
        };

        let locked = action == ServoOverride::Drain;
        if self.locks.servo_locked != locked {
            if locked {
                warn!("INTERLOCK: main tank full, servos forced to drain");
            } else {
                info!("INTERLOCK: main tank low, servo lock released");
            }
            self.locks.servo_locked = locked;
        }

        if self.applied_servos == Some(action) {
            return;
        }
        match self.apply_servo_override(action, hw) {
            Ok(()) => self.applied_servos = Some(action),
            Err(e) => {
                error!("INTERLOCK: servo override {action:?} failed: {e}, retrying next tick");
                self.applied_servos = None;
            }
        }
    }

    fn apply_servo_override(
        &self,
        action: ServoOverride,
        hw: &mut impl ActuatorPort,
    ) -> Result<(), ActuatorError> {
        match action {
            ServoOverride::Drain => {
                // Every valve is attempted even if an earlier one fails.
                let results = [
                    hw.set_servo(Servo::Heater, self.duty.to_duty(0.0, Servo::Heater)),
                    hw.set_servo(Servo::Cooler, self.duty.to_duty(0.0, Servo::Cooler)),
                    hw.set_servo(Servo::Main, self.duty.to_duty(100.0, Servo::Main)),
                ];
                results.into_iter().collect()
            }
            ServoOverride::CloseMain => {
                hw.set_servo(Servo::Main, self.duty.to_duty(0.0, Servo::Main))
            }
        }
    }
}
