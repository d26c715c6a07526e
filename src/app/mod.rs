//! Application core — pure domain logic, zero I/O.
//!
//! This module contains the session rules for the regulator: discovery,
//! per-tick regulation, operator input, setpoint editing and manual
//! actuator control.  All interaction with hardware happens through
//! **port traits** defined in [`ports`], keeping this layer fully testable
//! without real peripherals.

pub mod commands;
pub mod events;
pub mod manual;
pub mod ports;
pub mod service;
pub mod session;
pub mod setpoint;
