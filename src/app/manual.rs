//! Manual actuator control.
//!
//! A maintenance mode outside any regulation session.  The operator
//! toggles each valve and pump relay from the keypad while the level
//! interlock keeps running: it is evaluated before every key, and its lock
//! flags refuse the commands they guard.
//!
//! ```text
//!  key  action                      refused while
//!  1    heater valve 0 % / 100 %    servo_locked
//!  2    cooler valve 0 % / 100 %    servo_locked
//!  3    main valve 0 % / 100 %      never
//!  C    heater pump relay off / on  relay1_locked
//!  D    cooler pump relay off / on  relay2_locked
//!  *    leave manual mode
//! ```
//!
//! Every toggle starts from "off" when the mode is entered.

use log::{debug, info, warn};

use crate::config::SystemConfig;
use crate::control::duty::DutyMapper;
use crate::error::Result;
use crate::interlock::{InterlockEngine, LockState};

use super::commands::Key;
use super::events::AppEvent;
use super::ports::{ActuatorPort, EventSink, OperatorInput, Relay, Servo, VoltagePort};

/// An actuator the operator can toggle.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum ManualTarget {
    Servo(Servo),
    Relay(Relay),
}

impl ManualTarget {
    pub const ALL: [Self; 5] = [
        Self::Servo(Servo::Heater),
        Self::Servo(Servo::Cooler),
        Self::Servo(Servo::Main),
        Self::Relay(Relay::Heater),
        Self::Relay(Relay::Cooler),
    ];

    /// Keypad binding.  `None` for keys manual mode does not use.
    pub fn from_key(key: Key) -> Option<Self> {
        match key {
            Key::Digit(1) => Some(Self::Servo(Servo::Heater)),
            Key::Digit(2) => Some(Self::Servo(Servo::Cooler)),
            Key::Digit(3) => Some(Self::Servo(Servo::Main)),
            Key::C => Some(Self::Relay(Relay::Heater)),
            Key::D => Some(Self::Relay(Relay::Cooler)),
            _ => None,
        }
    }

    /// Whether `locks` forbids commanding this actuator.
    pub fn is_locked(self, locks: LockState) -> bool {
        match self {
            Self::Servo(Servo::Heater | Servo::Cooler) => locks.servo_locked,
            Self::Servo(Servo::Main) => false,
            Self::Relay(Relay::Heater) => locks.relay1_locked,
            Self::Relay(Relay::Cooler) => locks.relay2_locked,
        }
    }

    const fn index(self) -> usize {
        match self {
            Self::Servo(Servo::Heater) => 0,
            Self::Servo(Servo::Cooler) => 1,
            Self::Servo(Servo::Main) => 2,
            Self::Relay(Relay::Heater) => 3,
            Self::Relay(Relay::Cooler) => 4,
        }
    }
}

/// Result of one manual-mode step.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ManualOutcome {
    /// No key, or a key without a binding.
    Idle,
    /// The target was switched; `on` is its new position.
    Applied { target: ManualTarget, on: bool },
    /// The interlock holds the target.  Nothing was commanded.
    Refused(ManualTarget),
    /// `*` pressed.
    Exit,
}

/// Keypad-driven valve and relay toggles, gated by the interlock.
#[derive(Debug)]
pub struct ManualControl {
    duty: DutyMapper,
    on: [bool; ManualTarget::ALL.len()],
    last_locks: LockState,
}

impl ManualControl {
    pub fn new(config: &SystemConfig) -> Self {
        Self {
            duty: DutyMapper::new(config),
            on: [false; ManualTarget::ALL.len()],
            last_locks: LockState::default(),
        }
    }

    /// Believed position of `target` (`true` = open / energised).
    pub fn is_on(&self, target: ManualTarget) -> bool {
        self.on[target.index()]
    }

    /// Lock flags seen by the most recent step.
    pub fn locks(&self) -> LockState {
        self.last_locks
    }

    /// One pass of the manual loop: interlock first, then at most one key.
    ///
    /// An actuator failure is returned as-is; the caller decides whether
    /// to stay in manual mode.
    pub fn step(
        &mut self,
        interlock: &mut InterlockEngine,
        hw: &mut (impl VoltagePort + ActuatorPort),
        input: &mut impl OperatorInput,
        sink: &mut impl EventSink,
    ) -> Result<ManualOutcome> {
        let locks = interlock.evaluate(hw);
        if locks != self.last_locks {
            self.follow_overrides(locks);
            sink.emit(&AppEvent::LocksChanged(locks));
            self.last_locks = locks;
        }

        let Some(key) = input.poll() else {
            return Ok(ManualOutcome::Idle);
        };
        let outcome = self.handle(key, locks, hw)?;
        match outcome {
            ManualOutcome::Applied { target, on } => {
                sink.emit(&AppEvent::ManualCommand { target, on });
            }
            ManualOutcome::Refused(target) => sink.emit(&AppEvent::ManualRefused(target)),
            ManualOutcome::Idle | ManualOutcome::Exit => {}
        }
        Ok(outcome)
    }

    /// Apply one key against a lock snapshot.
    pub fn handle(
        &mut self,
        key: Key,
        locks: LockState,
        hw: &mut impl ActuatorPort,
    ) -> Result<ManualOutcome> {
        if key == Key::Cancel {
            info!("manual mode left");
            return Ok(ManualOutcome::Exit);
        }
        let Some(target) = ManualTarget::from_key(key) else {
            debug!("manual mode: {key:?} is unbound");
            return Ok(ManualOutcome::Idle);
        };
        if target.is_locked(locks) {
            warn!("manual mode: {target:?} held by the interlock");
            return Ok(ManualOutcome::Refused(target));
        }

        let on = !self.is_on(target);
        match target {
            ManualTarget::Servo(servo) => {
                let pct = if on { 100.0 } else { 0.0 };
                hw.set_servo(servo, self.duty.to_duty(pct, servo))?;
            }
            ManualTarget::Relay(relay) => hw.set_relay(relay, on)?,
        }
        self.on[target.index()] = on;
        info!("manual mode: {target:?} {}", if on { "on" } else { "off" });
        Ok(ManualOutcome::Applied { target, on })
    }

    /// Mirror the positions the interlock just forced.
    fn follow_overrides(&mut self, locks: LockState) {
        let prev = self.last_locks;
        if locks.relay1_locked != prev.relay1_locked {
            self.on[ManualTarget::Relay(Relay::Heater).index()] = !locks.relay1_locked;
        }
        if locks.relay2_locked != prev.relay2_locked {
            self.on[ManualTarget::Relay(Relay::Cooler).index()] = !locks.relay2_locked;
        }
        if locks.servo_locked != prev.servo_locked {
            if locks.servo_locked {
                self.on[ManualTarget::Servo(Servo::Heater).index()] = false;
                self.on[ManualTarget::Servo(Servo::Cooler).index()] = false;
            }
            // Drain opens the main valve; release closes it.
            self.on[ManualTarget::Servo(Servo::Main).index()] = locks.servo_locked;
        }
    }
}
