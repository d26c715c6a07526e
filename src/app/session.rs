//! Regulation session state.
//!
//! ```text
//!  DISCOVERING ──[sensor bound]──▶ REGULATING ◀──[servo lock released]──┐
//!       │                              │                               │
//!  [scan exhausted]             [servo lock engaged]                 LOCKED
//!       │                              └───────────────────────────────▶┘
//!       ▼                                      │
//!    EXITING ◀──[exit key · fault · request]───┘
//! ```
//!
//! `EXITING` is terminal: the caller drops the session and returns to its
//! idle menu.  A new session starts from scratch.

use crate::sensors::temperature::DeviceId;

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum SessionState {
    Discovering,
    Regulating,
    /// Servo interlock engaged; regulation paused this tick.
    Locked,
    Exiting,
}

impl SessionState {
    pub fn is_terminal(self) -> bool {
        self == Self::Exiting
    }

    /// Whether `self → next` is an edge of the session graph.
    pub fn can_transition_to(self, next: Self) -> bool {
        use SessionState::*;
        matches!(
            (self, next),
            (Discovering, Regulating)
                | (Discovering, Exiting)
                | (Regulating, Locked)
                | (Locked, Regulating)
                | (Regulating, Exiting)
                | (Locked, Exiting)
        )
    }
}

/// Mutable per-session regulation data.
#[derive(Debug, Clone)]
pub struct ControlSession {
    /// Target temperature (°C).
    pub setpoint_c: u8,
    /// Error from the previous regulated tick.
    pub prev_error: f32,
    /// Timestamp of the previous regulated tick (ms).  `None` until the
    /// first regulated tick seeds it.
    pub prev_tick_ms: Option<u64>,
    /// Most recent plausible temperature, if any was ever read.
    pub last_good_temp_c: Option<f32>,
    /// Probe bound during discovery.
    pub sensor: Option<DeviceId>,
    /// Timestamp at which the session started (ms).
    pub started_ms: u64,
}

impl ControlSession {
    pub fn new(setpoint_c: u8, now_ms: u64) -> Self {
        Self {
            setpoint_c,
            prev_error: 0.0,
            prev_tick_ms: None,
            last_good_temp_c: None,
            sensor: None,
            started_ms: now_ms,
        }
    }

    /// Record a fresh reading, or fall back to the last good one.
    pub fn temperature(&mut self, reading: Option<f32>) -> Option<f32> {
        if let Some(t) = reading {
            self.last_good_temp_c = Some(t);
        }
        self.last_good_temp_c
    }

    /// Compute `(error, delta_error)` for `temperature_c` at `now_ms` and
    /// remember both for the next tick.
    ///
    /// `delta_error` is 0 on the first regulated tick and whenever no time
    /// has elapsed (clock ties, or a clock that stepped backwards).
    pub fn advance(&mut self, temperature_c: f32, now_ms: u64) -> (f32, f32) {
        let error = f32::from(self.setpoint_c) - temperature_c;
        let delta_error = match self.prev_tick_ms {
            Some(prev_ms) => {
                let dt = now_ms.saturating_sub(prev_ms) as f32 / 1000.0;
                if dt > 0.0 {
                    (error - self.prev_error) / dt
                } else {
                    0.0
                }
            }
            None => 0.0,
        };
        self.prev_error = error;
        self.prev_tick_ms = Some(now_ms);
        (error, delta_error)
    }

    /// Milliseconds since the session started.
    pub fn elapsed_ms(&self, now_ms: u64) -> u64 {
        now_ms.saturating_sub(self.started_ms)
    }
}
