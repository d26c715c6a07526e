//! Integration tests for the level interlock against mock hardware.

use fuzzytherm::app::ports::{Relay, Servo};
use fuzzytherm::config::SystemConfig;
use fuzzytherm::error::SensorError;
use fuzzytherm::interlock::{InterlockEngine, LockState};
use fuzzytherm::sensors::level::{verify, SensorGroup, Verification};

use super::mock_hw::{ActuatorCall, MockPlant, DRY, WET};

fn engine() -> InterlockEngine {
    InterlockEngine::new(&SystemConfig::default())
}

#[test]
fn heater_tank_full_turns_relay1_off() {
    let mut il = engine();
    let mut hw = MockPlant::new();
    hw.set_level(SensorGroup::Heater, true, true);

    let locks = il.evaluate(&mut hw);

    assert!(locks.relay1_locked);
    assert_eq!(hw.relay_on(Relay::Heater), Some(false));
    assert_eq!(hw.relay_on(Relay::Cooler), Some(true));
}

#[test]
fn heater_tank_emptied_releases_relay1() {
    let mut il = engine();
    let mut hw = MockPlant::new();
    hw.set_level(SensorGroup::Heater, true, true);
    il.evaluate(&mut hw);

    // LL drops while LH is still latched wet.
    hw.volts[SensorGroup::Heater.low().index()] = DRY;
    let locks = il.evaluate(&mut hw);

    assert!(!locks.relay1_locked);
    assert_eq!(hw.relay_on(Relay::Heater), Some(true));
}

#[test]
fn split_burst_is_ambiguous_and_latch_holds() {
    let mut samples = [WET, DRY, WET].into_iter();
    let result = verify(|| samples.next().ok_or(SensorError::AdcReadFailed), 3.3, 3);
    assert_eq!(result, Verification::Ambiguous);

    let mut il = engine();
    let ch = SensorGroup::Cooler.high();
    assert!(!il.latch(ch, result, 3.3));
    il.latch(ch, Verification::High(WET), 3.3);
    assert!(il.latch(ch, result, 3.3));
}

#[test]
fn steady_plant_produces_no_command_traffic() {
    let mut il = engine();
    let mut hw = MockPlant::new();
    hw.set_level(SensorGroup::Main, true, true);
    hw.set_level(SensorGroup::Cooler, true, false);

    let first = il.evaluate(&mut hw);
    let issued = hw.calls.len();
    for _ in 0..5 {
        assert_eq!(il.evaluate(&mut hw), first);
    }
    assert_eq!(hw.calls.len(), issued);
}

#[test]
fn drain_posture_then_recovery() {
    let mut il = engine();
    let mut hw = MockPlant::new();
    hw.set_level(SensorGroup::Main, true, true);

    assert_eq!(
        il.evaluate(&mut hw),
        LockState { relay1_locked: false, relay2_locked: false, servo_locked: true }
    );
    assert_eq!(hw.last_servo(Servo::Main), Some(1400));

    hw.set_level(SensorGroup::Main, false, false);
    hw.calls.clear();
    assert!(!il.evaluate(&mut hw).servo_locked);
    assert_eq!(hw.calls, vec![ActuatorCall::Servo(Servo::Main, 4600)]);
}

#[test]
fn latched_pairs_may_be_inconsistent_but_decisions_are_not() {
    let mut il = engine();
    let mut hw = MockPlant::new();
    // Wet top probe over a dry bottom probe.
    hw.set_level(SensorGroup::Heater, false, true);

    let locks = il.evaluate(&mut hw);

    assert!(il.latched(SensorGroup::Heater.high()));
    assert!(!locks.relay1_locked);
    assert_eq!(hw.relay_on(Relay::Heater), Some(true));
}
