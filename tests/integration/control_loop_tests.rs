//! Integration tests for the ControlService → interlock → actuators
//! pipeline, driven tick by tick against mock hardware.

use fuzzytherm::app::commands::Key;
use fuzzytherm::app::events::{AppEvent, ExitReason};
use fuzzytherm::app::ports::{Relay, Servo};
use fuzzytherm::app::session::SessionState;
use fuzzytherm::config::SystemConfig;
use fuzzytherm::error::{ActuatorError, Error};
use fuzzytherm::interlock::InterlockEngine;
use fuzzytherm::sensors::level::SensorGroup;
use fuzzytherm::ControlService;

use super::mock_hw::{ActuatorCall, FakeClock, FakeDelay, MockKeypad, MockPlant, RecordingSink};

struct Rig {
    svc: ControlService,
    hw: MockPlant,
    keys: MockKeypad,
    clock: FakeClock,
    sink: RecordingSink,
}

impl Rig {
    fn new(setpoint_c: u8) -> Self {
        let config = SystemConfig::default();
        let interlock = InterlockEngine::new(&config);
        let mut svc = ControlService::new(config, setpoint_c, interlock, 0).unwrap();
        let mut sink = RecordingSink::default();
        svc.start(&mut sink);
        Self {
            svc,
            hw: MockPlant::new(),
            keys: MockKeypad::default(),
            clock: FakeClock::default(),
            sink,
        }
    }

    /// A rig that has already bound its probe.
    fn regulating(setpoint_c: u8) -> Self {
        let mut rig = Self::new(setpoint_c);
        assert_eq!(rig.tick(), SessionState::Regulating);
        rig.hw.calls.clear();
        rig.sink.events.clear();
        rig
    }

    fn tick(&mut self) -> SessionState {
        self.svc
            .tick(&mut self.hw, &mut self.keys, &self.clock, &mut self.sink)
    }

    fn regulation_events(&self) -> Vec<fuzzytherm::app::events::TelemetryData> {
        self.sink
            .events
            .iter()
            .filter_map(|e| match e {
                AppEvent::Regulation(t) => Some(*t),
                _ => None,
            })
            .collect()
    }
}

// ── Discovery ─────────────────────────────────────────────────

#[test]
fn discovery_binds_probe_after_empty_scans() {
    let mut rig = Rig::new(30);
    rig.hw.empty_scans = 3;

    for _ in 0..3 {
        assert_eq!(rig.tick(), SessionState::Discovering);
    }
    assert_eq!(rig.tick(), SessionState::Regulating);
    assert_eq!(rig.svc.sensor(), Some(super::mock_hw::PROBE));
    assert!(rig
        .sink
        .events
        .iter()
        .any(|e| matches!(e, AppEvent::SensorBound(id) if *id == super::mock_hw::PROBE)));
}

#[test]
fn discovery_gives_up_after_configured_attempts() {
    let mut rig = Rig::new(30);
    rig.hw.probe_present = false;

    let mut state = SessionState::Discovering;
    while !state.is_terminal() {
        state = rig.tick();
    }

    assert_eq!(rig.hw.scans, u32::from(SystemConfig::default().discovery_attempts));
    assert_eq!(rig.svc.exit_reason(), Some(ExitReason::SensorError));
    assert!(matches!(
        rig.sink.events.last(),
        Some(AppEvent::SessionEnded(ExitReason::SensorError))
    ));
}

#[test]
fn full_main_tank_pauses_discovery_without_spending_attempts() {
    let mut rig = Rig::new(30);
    rig.hw.set_level(SensorGroup::Main, true, true);
    let attempts = SystemConfig::default().discovery_attempts;

    for _ in 0..u32::from(attempts) + 5 {
        assert_eq!(rig.tick(), SessionState::Discovering);
    }
    assert_eq!(rig.hw.scans, 0);
    assert_eq!(rig.hw.last_servo(Servo::Heater), Some(5000));
    assert_eq!(rig.hw.last_servo(Servo::Cooler), Some(2900));
    assert_eq!(rig.svc.next_delay_ms(), 500);

    rig.hw.set_level(SensorGroup::Main, false, false);
    assert_eq!(rig.tick(), SessionState::Regulating);
    assert_eq!(rig.hw.scans, 1);
}

// ── Regulation ────────────────────────────────────────────────

#[test]
fn on_setpoint_with_no_trend_opens_both_valves_halfway() {
    let mut rig = Rig::regulating(30);
    rig.hw.push_temp(30.0);

    rig.tick();

    assert_eq!(
        rig.hw.servo_calls(),
        vec![(Servo::Heater, 3950), (Servo::Cooler, 4200)]
    );
    let telem = rig.regulation_events();
    assert_eq!(telem.len(), 1);
    assert_eq!(telem[0].output_pct, 50.0);
    assert!(!telem[0].stale);
}

#[test]
fn too_warm_with_no_trend_mostly_cools() {
    // error = 22 - 30 = -8 → 60 % VeryCold, 40 % Cold → output 10 %.
    let mut rig = Rig::regulating(22);
    rig.hw.push_temp(30.0);

    rig.tick();

    let telem = rig.regulation_events()[0];
    assert!((telem.output_pct - 10.0).abs() < 1e-3);
    assert!(telem.heater_duty.abs_diff(4790) <= 1);
    assert!(telem.cooler_duty.abs_diff(5240) <= 1);
}

#[test]
fn derivative_uses_wall_clock_between_ticks() {
    let mut rig = Rig::regulating(30);
    rig.hw.push_temp(25.0);
    rig.tick();
    rig.clock.advance(500);
    rig.hw.push_temp(26.0);
    rig.tick();

    let telem = rig.regulation_events();
    assert_eq!(telem[0].delta_error, 0.0);
    assert_eq!(telem[1].error, 4.0);
    assert!((telem[1].delta_error - -2.0).abs() < 1e-4);
    assert_eq!(telem[1].elapsed_ms, 500);
}

#[test]
fn first_regulated_tick_has_no_derivative() {
    let mut rig = Rig::regulating(30);
    rig.clock.advance(100);
    rig.hw.push_temp(20.0);

    rig.tick();

    let telem = rig.regulation_events()[0];
    assert_eq!(telem.error, 10.0);
    assert_eq!(telem.delta_error, 0.0);
    // VeryHot with no trend: full heat.
    assert_eq!(telem.output_pct, 100.0);
    assert_eq!(telem.heater_duty, 2900);
    assert_eq!(telem.cooler_duty, 2900);
}

#[test]
fn failed_read_falls_back_to_last_good_temperature() {
    let mut rig = Rig::regulating(30);
    rig.hw.push_temp(28.0);
    rig.tick();
    // Queue empty: every retry fails.
    rig.tick();

    let telem = rig.regulation_events();
    assert_eq!(telem.len(), 2);
    assert!(telem[1].stale);
    assert_eq!(telem[1].temperature_c, 28.0);
}

#[test]
fn implausible_reading_is_retried_locally() {
    let mut rig = Rig::regulating(30);
    rig.hw.push_temp(200.0);
    rig.hw.push_temp(29.0);

    rig.tick();

    let telem = rig.regulation_events()[0];
    assert_eq!(telem.temperature_c, 29.0);
    assert!(!telem.stale);
}

#[test]
fn no_reading_ever_holds_valves_closed() {
    let mut rig = Rig::regulating(30);

    assert_eq!(rig.tick(), SessionState::Regulating);

    assert!(rig.regulation_events().is_empty());
    assert_eq!(
        rig.hw.servo_calls(),
        vec![(Servo::Heater, 5000), (Servo::Cooler, 2900)]
    );
}

// ── Interlock interaction ─────────────────────────────────────

#[test]
fn main_tank_full_locks_session_and_backs_off() {
    let mut rig = Rig::regulating(30);
    rig.hw.set_level(SensorGroup::Main, true, true);
    rig.hw.push_temp(20.0);

    assert_eq!(rig.tick(), SessionState::Locked);
    assert!(rig.svc.locks().servo_locked);
    assert_eq!(rig.hw.last_servo(Servo::Main), Some(1400));
    assert_eq!(rig.hw.last_servo(Servo::Heater), Some(5000));
    assert_eq!(rig.hw.last_servo(Servo::Cooler), Some(2900));
    assert_eq!(rig.svc.next_delay_ms(), 500);
    assert!(rig.regulation_events().is_empty());
    assert!(rig
        .sink
        .events
        .iter()
        .any(|e| matches!(e, AppEvent::LocksChanged(l) if l.servo_locked)));

    // Drain the tank: regulation resumes with the queued reading.
    rig.hw.set_level(SensorGroup::Main, false, false);
    assert_eq!(rig.tick(), SessionState::Regulating);
    assert_eq!(rig.regulation_events().len(), 1);
    assert_eq!(rig.hw.last_servo(Servo::Main), Some(4600));
}

#[test]
fn locked_session_ignores_keypad() {
    let mut rig = Rig::regulating(30);
    rig.hw.set_level(SensorGroup::Main, true, true);
    rig.keys.press(&[Key::Cancel]);

    assert_eq!(rig.tick(), SessionState::Locked);
    assert_eq!(rig.keys.keys.len(), 1);
}

#[test]
fn relay_interlock_is_applied_before_valve_commands() {
    let mut rig = Rig::regulating(30);
    rig.hw.set_level(SensorGroup::Heater, true, true);
    rig.hw.push_temp(25.0);

    rig.tick();

    let relay_at = rig
        .hw
        .calls
        .iter()
        .position(|c| *c == ActuatorCall::Relay(Relay::Heater, false))
        .unwrap();
    let servo_at = rig
        .hw
        .calls
        .iter()
        .position(|c| matches!(c, ActuatorCall::Servo(Servo::Heater, _)))
        .unwrap();
    assert!(relay_at < servo_at);
    assert!(rig.svc.locks().relay1_locked);
    assert_eq!(rig.svc.state(), SessionState::Regulating);
}

// ── Operator input ────────────────────────────────────────────

#[test]
fn exit_key_closes_valves_and_ends_session() {
    let mut rig = Rig::regulating(30);
    rig.hw.push_temp(25.0);
    rig.keys.press(&[Key::Cancel]);

    assert_eq!(rig.tick(), SessionState::Exiting);
    assert_eq!(rig.svc.exit_reason(), Some(ExitReason::Operator));
    assert_eq!(rig.hw.last_servo(Servo::Heater), Some(5000));
    assert_eq!(rig.hw.last_servo(Servo::Cooler), Some(2900));
}

#[test]
fn requested_exit_applies_interlock_before_ending() {
    let mut rig = Rig::regulating(30);
    rig.hw.set_level(SensorGroup::Heater, true, true);
    rig.svc.request_exit();

    assert_eq!(rig.tick(), SessionState::Exiting);

    let relay_at = rig
        .hw
        .calls
        .iter()
        .position(|c| *c == ActuatorCall::Relay(Relay::Heater, false))
        .unwrap();
    let close_at = rig
        .hw
        .calls
        .iter()
        .position(|c| *c == ActuatorCall::Servo(Servo::Heater, 5000))
        .unwrap();
    assert!(relay_at < close_at);
    assert!(rig.svc.locks().relay1_locked);
    assert_eq!(rig.svc.exit_reason(), Some(ExitReason::Requested));
}

#[test]
fn setpoint_edit_applies_on_confirm() {
    let mut rig = Rig::regulating(30);
    rig.keys
        .press(&[Key::Confirm, Key::Digit(3), Key::Digit(5), Key::Confirm]);
    for _ in 0..4 {
        rig.hw.push_temp(30.0);
        rig.tick();
    }

    assert_eq!(rig.svc.setpoint(), 35);
    assert!(!rig.svc.editor().is_open());
    assert!(rig
        .sink
        .events
        .iter()
        .any(|e| matches!(e, AppEvent::SetpointChanged(35))));

    rig.hw.push_temp(30.0);
    rig.tick();
    assert_eq!(rig.regulation_events().last().unwrap().error, 5.0);
}

#[test]
fn out_of_range_setpoint_keeps_editor_open() {
    let mut rig = Rig::regulating(30);
    rig.keys
        .press(&[Key::Confirm, Key::Digit(4), Key::Digit(5), Key::Confirm]);
    for _ in 0..4 {
        rig.hw.push_temp(30.0);
        rig.tick();
    }

    assert_eq!(rig.svc.setpoint(), 30);
    assert!(rig.svc.editor().is_open());
    assert_eq!(rig.svc.editor().entry(), "");

    // `*` inside the editor only cancels the edit.
    rig.keys.press(&[Key::Cancel]);
    rig.hw.push_temp(30.0);
    assert_eq!(rig.tick(), SessionState::Regulating);
    assert!(!rig.svc.editor().is_open());
}

// ── Faults and lifecycle ──────────────────────────────────────

#[test]
fn valve_failure_ends_session_with_fault() {
    let mut rig = Rig::regulating(30);
    rig.hw.push_temp(25.0);
    rig.hw.fail_servos = true;

    assert_eq!(rig.tick(), SessionState::Exiting);
    assert_eq!(
        rig.svc.exit_reason(),
        Some(ExitReason::Fault(Error::Actuator(ActuatorError::PwmWriteFailed)))
    );

    let before = rig.sink.events.len();
    assert_eq!(rig.tick(), SessionState::Exiting);
    assert_eq!(rig.sink.events.len(), before);
}

#[test]
fn run_paces_ticks_by_state() {
    let mut rig = Rig::new(30);
    rig.hw.empty_scans = 2;
    rig.hw.push_temp(30.0);
    rig.keys.press(&[Key::Cancel]);
    let mut delay = FakeDelay { clock: &rig.clock, slept_ms: Vec::new() };

    let reason = rig
        .svc
        .run(&mut rig.hw, &mut rig.keys, &rig.clock, &mut delay, &mut rig.sink);

    assert_eq!(reason, ExitReason::Operator);
    assert_eq!(delay.slept_ms, vec![200, 200, 100]);
}

#[test]
fn interlock_latches_survive_between_sessions() {
    let mut rig = Rig::regulating(30);
    rig.hw.set_level(SensorGroup::Cooler, true, true);
    rig.hw.push_temp(30.0);
    rig.tick();
    rig.svc.request_exit();
    assert_eq!(rig.tick(), SessionState::Exiting);

    let Rig { svc, .. } = rig;
    let interlock = svc.into_interlock();

    assert!(interlock.locks().relay2_locked);
    assert!(interlock.latched(SensorGroup::Cooler.high()));
}
