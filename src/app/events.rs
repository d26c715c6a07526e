//! Outbound application events.
//!
//! The [`ControlService`](super::service::ControlService) and
//! [`ManualControl`](super::manual::ManualControl) emit these
//! through the [`EventSink`](super::ports::EventSink) port.  Adapters on
//! the other side decide what to do with them: log to serial or paint the
//! LCD.

use crate::error::Error;
use crate::interlock::LockState;
use crate::sensors::temperature::DeviceId;

use super::manual::ManualTarget;
use super::session::SessionState;

/// Structured events emitted by the control loop.
#[derive(Debug, Clone)]
pub enum AppEvent {
    /// A session began discovery with the given setpoint (°C).
    SessionStarted { setpoint_c: u8 },

    /// Discovery bound the regulation probe.
    SensorBound(DeviceId),

    /// The session moved between states.
    StateChanged { from: SessionState, to: SessionState },

    /// The interlock published different lock flags than last tick.
    LocksChanged(LockState),

    /// One regulated tick completed.
    Regulation(TelemetryData),

    /// The operator confirmed a new setpoint (°C).
    SetpointChanged(u8),

    /// The session reached `Exiting`.
    SessionEnded(ExitReason),

    /// Manual mode switched an actuator; `on` is its new position.
    ManualCommand { target: ManualTarget, on: bool },

    /// Manual mode refused a key because the interlock holds its target.
    ManualRefused(ManualTarget),
}

/// Why a session ended.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ExitReason {
    /// Operator pressed the exit key.
    Operator,
    /// An external scheduler cancelled the session.
    Requested,
    /// No temperature probe answered discovery.
    SensorError,
    /// A tick failed; actuators were forced to 0 %.
    Fault(Error),
}

/// A point-in-time regulation snapshot.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct TelemetryData {
    /// Milliseconds since the session started.
    pub elapsed_ms: u64,
    pub setpoint_c: u8,
    pub temperature_c: f32,
    /// `true` if `temperature_c` is a stale fallback value.
    pub stale: bool,
    pub error: f32,
    pub delta_error: f32,
    /// Fuzzy output ratio (percent).
    pub output_pct: f32,
    pub heater_duty: u16,
    pub cooler_duty: u16,
}
