//! Fuzzy-logic thermal regulator.
//!
//! Blends a heater valve and a cooler valve with a Sugeno fuzzy
//! controller while a liquid-level interlock guards three tanks.  The
//! domain core is hardware-agnostic; boards plug in through the port
//! traits in [`app::ports`].

#![deny(unused_must_use)]

pub mod adapters;
pub mod app;
pub mod config;
pub mod control;
pub mod drivers;
pub mod error;
pub mod interlock;
pub mod sensors;

pub use app::service::ControlService;
pub use config::SystemConfig;
pub use error::{Error, Result};
pub use interlock::InterlockEngine;
