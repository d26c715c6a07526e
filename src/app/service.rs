//! Control service — the hexagonal core.
//!
//! [`ControlService`] owns one regulation session: the interlock engine,
//! duty calibration, session data and the setpoint editor.  It exposes a
//! hardware-agnostic API.  All I/O flows through port traits injected at
//! call sites, so the whole loop runs against mock adapters in tests.
//!
//! ```text
//!  VoltagePort ─────┐  ┌──────────────────────────┐ ──▶ EventSink
//!  TemperaturePort ─┼─▶│      ControlService       │
//!  OperatorInput ───┘  │ Interlock · Fuzzy · Duty  │
//!  ActuatorPort ◀──────└──────────────────────────┘
//! ```
//!
//! Every tick evaluates the interlock first.  Only then may regulation
//! command the heater and cooler valves.

use embedded_hal::delay::DelayNs;
use log::{debug, error, info, warn};

use crate::config::SystemConfig;
use crate::control::duty::DutyMapper;
use crate::control::fuzzy;
use crate::error::{Error, Result, SensorError};
use crate::interlock::{InterlockEngine, LockState};
use crate::sensors::temperature::{self, DeviceId};

use super::commands::Key;
use super::events::{AppEvent, ExitReason, TelemetryData};
use super::ports::{ActuatorPort, Clock, EventSink, OperatorInput, Plant, Servo};
use super::session::{ControlSession, SessionState};
use super::setpoint::{EditOutcome, SetpointEditor};

// ───────────────────────────────────────────────────────────────
// ControlService
// ───────────────────────────────────────────────────────────────

/// Orchestrates one regulation session from discovery to exit.
pub struct ControlService {
    config: SystemConfig,
    interlock: InterlockEngine,
    duty: DutyMapper,
    session: ControlSession,
    state: SessionState,
    editor: SetpointEditor,
    /// Lock flags published by the previous tick.
    last_locks: LockState,
    scans: u8,
    exit_requested: bool,
    exit_reason: Option<ExitReason>,
    tick_count: u64,
}

impl ControlService {
    /// Construct a session targeting `setpoint_c`.
    ///
    /// The interlock engine is lent to the session and handed back by
    /// [`into_interlock`](Self::into_interlock), so probe latches survive
    /// across sessions.
    pub fn new(
        config: SystemConfig,
        setpoint_c: u8,
        interlock: InterlockEngine,
        now_ms: u64,
    ) -> Result<Self> {
        config.validate()?;
        let editor = SetpointEditor::new(config.setpoint_min_c, config.setpoint_max_c);
        if !editor.in_bounds(setpoint_c) {
            return Err(Error::Config("setpoint outside the allowed range"));
        }
        let last_locks = interlock.locks();

        Ok(Self {
            duty: DutyMapper::new(&config),
            config,
            interlock,
            session: ControlSession::new(setpoint_c, now_ms),
            state: SessionState::Discovering,
            editor,
            last_locks,
            scans: 0,
            exit_requested: false,
            exit_reason: None,
            tick_count: 0,
        })
    }

    // ── Lifecycle ─────────────────────────────────────────────

    /// Announce the session.  The first tick re-asserts every interlock
    /// override, whatever was commanded before the session began.
    pub fn start(&mut self, sink: &mut impl EventSink) {
        self.interlock.reassert();
        sink.emit(&AppEvent::SessionStarted {
            setpoint_c: self.session.setpoint_c,
        });
        info!("session started, setpoint {} C", self.session.setpoint_c);
    }

    /// Ask the session to end.  Observed at the next tick.
    pub fn request_exit(&mut self) {
        self.exit_requested = true;
    }

    /// Drive [`tick`](Self::tick) until the session exits, sleeping between
    /// ticks for the cadence of the current state.
    pub fn run(
        &mut self,
        hw: &mut impl Plant,
        input: &mut impl OperatorInput,
        clock: &impl Clock,
        delay: &mut impl DelayNs,
        sink: &mut impl EventSink,
    ) -> ExitReason {
        while !self.tick(hw, input, clock, sink).is_terminal() {
            delay.delay_ms(self.next_delay_ms());
        }
        self.exit_reason.unwrap_or(ExitReason::Requested)
    }

    /// Give the interlock engine back once the session is over.
    pub fn into_interlock(self) -> InterlockEngine {
        self.interlock
    }

    // ── Per-tick orchestration ────────────────────────────────

    /// Run one control cycle: interlock → discovery or regulation →
    /// operator input.
    ///
    /// `hw` satisfies every hardware port at once, which avoids a double
    /// mutable borrow while keeping the port boundary explicit.
    pub fn tick(
        &mut self,
        hw: &mut impl Plant,
        input: &mut impl OperatorInput,
        clock: &impl Clock,
        sink: &mut impl EventSink,
    ) -> SessionState {
        if self.state.is_terminal() {
            return self.state;
        }
        self.tick_count += 1;

        // 1. Interlock, always first
        let locks = self.interlock.evaluate(hw);
        if locks != self.last_locks {
            sink.emit(&AppEvent::LocksChanged(locks));
            self.last_locks = locks;
        }

        if self.exit_requested {
            info!("session exit requested");
            self.finish(ExitReason::Requested, hw, sink);
            return self.state;
        }

        // 2. Discovery or regulation
        let outcome = match self.state {
            SessionState::Discovering => self.discover_step(locks, hw, sink),
            SessionState::Regulating | SessionState::Locked => {
                self.regulate(locks, hw, input, clock, sink)
            }
            SessionState::Exiting => Ok(()),
        };

        if let Err(e) = outcome {
            error!("session fault: {e}, forcing valves to 0 %");
            self.finish(ExitReason::Fault(e), hw, sink);
        }
        self.state
    }

    // ── Queries ───────────────────────────────────────────────

    pub fn state(&self) -> SessionState {
        self.state
    }

    /// Current target temperature (°C).
    pub fn setpoint(&self) -> u8 {
        self.session.setpoint_c
    }

    /// Lock flags published by the most recent tick.
    pub fn locks(&self) -> LockState {
        self.last_locks
    }

    /// Probe bound by discovery, if any.
    pub fn sensor(&self) -> Option<DeviceId> {
        self.session.sensor
    }

    /// Why the session ended, once it has.
    pub fn exit_reason(&self) -> Option<ExitReason> {
        self.exit_reason
    }

    pub fn editor(&self) -> &SetpointEditor {
        &self.editor
    }

    pub fn tick_count(&self) -> u64 {
        self.tick_count
    }

    /// How long [`run`](Self::run) waits before the next tick.
    pub fn next_delay_ms(&self) -> u32 {
        match self.state {
            SessionState::Discovering if self.last_locks.servo_locked => {
                self.config.locked_backoff_ms
            }
            SessionState::Discovering => self.config.discovery_spacing_ms,
            SessionState::Locked => self.config.locked_backoff_ms,
            SessionState::Regulating | SessionState::Exiting => self.config.tick_period_ms,
        }
    }

    // ── Internal ──────────────────────────────────────────────

    /// One bus scan.  A full main tank pauses discovery without spending
    /// an attempt.
    fn discover_step(
        &mut self,
        locks: LockState,
        hw: &mut impl Plant,
        sink: &mut impl EventSink,
    ) -> Result<()> {
        if locks.servo_locked {
            debug!("main tank full, bus scan paused");
            return self.close_valves(hw);
        }
        self.scans += 1;
        match temperature::probe_bus(hw) {
            Ok(id) => {
                info!("temperature probe {id} bound after {} scan(s)", self.scans);
                self.session.sensor = Some(id);
                sink.emit(&AppEvent::SensorBound(id));
                self.transition(SessionState::Regulating, sink);
            }
            Err(e) if self.scans >= self.config.discovery_attempts => {
                error!("no temperature probe after {} scans: {e}", self.scans);
                self.finish(ExitReason::SensorError, hw, sink);
            }
            Err(e) => {
                debug!(
                    "bus scan {}/{} found nothing: {e}",
                    self.scans, self.config.discovery_attempts
                );
            }
        }
        Ok(())
    }

    fn regulate(
        &mut self,
        locks: LockState,
        hw: &mut impl Plant,
        input: &mut impl OperatorInput,
        clock: &impl Clock,
        sink: &mut impl EventSink,
    ) -> Result<()> {
        if locks.servo_locked {
            self.transition(SessionState::Locked, sink);
            return self.close_valves(hw);
        }
        self.transition(SessionState::Regulating, sink);

        // ── Temperature ──────────────────────────────────────
        let id = self.session.sensor.ok_or(SensorError::NotFound)?;
        let reading = match temperature::read_with_retry(
            hw,
            id,
            self.config.temperature_read_attempts,
        ) {
            Ok(celsius) => Some(celsius),
            Err(e) => {
                warn!("temperature read on {id} failed: {e}, using last good value");
                None
            }
        };
        let stale = reading.is_none();
        let Some(temperature_c) = self.session.temperature(reading) else {
            warn!("no temperature reading yet, holding valves at 0 %");
            return self.close_valves(hw);
        };

        // ── Fuzzy regulation ─────────────────────────────────
        let now = clock.now_ms();
        let (error, delta_error) = self.session.advance(temperature_c, now);
        let output_pct = fuzzy::infer(error, delta_error);
        let f = output_pct / 100.0;

        let heater_duty = self.duty.to_duty(f * 100.0, Servo::Heater);
        let cooler_duty = self.duty.to_duty((1.0 - f) * 100.0, Servo::Cooler);
        hw.set_servo(Servo::Heater, heater_duty)?;
        hw.set_servo(Servo::Cooler, cooler_duty)?;

        sink.emit(&AppEvent::Regulation(TelemetryData {
            elapsed_ms: self.session.elapsed_ms(now),
            setpoint_c: self.session.setpoint_c,
            temperature_c,
            stale,
            error,
            delta_error,
            output_pct,
            heater_duty,
            cooler_duty,
        }));

        // ── Operator input ───────────────────────────────────
        if let Some(key) = input.poll() {
            self.handle_key(key, hw, sink);
        }
        Ok(())
    }

    fn handle_key(&mut self, key: Key, hw: &mut impl ActuatorPort, sink: &mut impl EventSink) {
        if self.editor.is_open() {
            if let EditOutcome::Confirmed(setpoint_c) = self.editor.handle(key) {
                self.session.setpoint_c = setpoint_c;
                sink.emit(&AppEvent::SetpointChanged(setpoint_c));
            }
            return;
        }
        match key {
            Key::Cancel => {
                info!("operator ended the session");
                self.finish(ExitReason::Operator, hw, sink);
            }
            Key::Confirm => {
                debug!("setpoint editor opened");
                self.editor.open();
            }
            _ => {}
        }
    }

    /// Heater and cooler valves to 0 %.
    fn close_valves(&self, hw: &mut impl ActuatorPort) -> Result<()> {
        hw.set_servo(Servo::Heater, self.duty.to_duty(0.0, Servo::Heater))?;
        hw.set_servo(Servo::Cooler, self.duty.to_duty(0.0, Servo::Cooler))?;
        Ok(())
    }

    /// Best-effort valve close, then terminate.
    fn finish(&mut self, reason: ExitReason, hw: &mut impl ActuatorPort, sink: &mut impl EventSink) {
        for servo in [Servo::Heater, Servo::Cooler] {
            if let Err(e) = hw.set_servo(servo, self.duty.to_duty(0.0, servo)) {
                error!("could not close {servo:?} valve on exit: {e}");
            }
        }
        self.transition(SessionState::Exiting, sink);
        self.exit_reason = Some(reason);
        sink.emit(&AppEvent::SessionEnded(reason));
    }

    fn transition(&mut self, next: SessionState, sink: &mut impl EventSink) {
        if next == self.state {
            return;
        }
        debug_assert!(
            self.state.can_transition_to(next),
            "illegal transition {:?} -> {next:?}",
            self.state
        );
        info!("session {:?} -> {next:?}", self.state);
        sink.emit(&AppEvent::StateChanged {
            from: self.state,
            to: next,
        });
        self.state = next;
    }
}
