//! Sensor subsystem — level probe verification and temperature acquisition.
//!
//! Raw bus access (ADC, one-wire) stays behind the port traits in
//! [`crate::app::ports`]; this module holds the policy that turns raw
//! readings into values the interlock and control loop can trust.

pub mod level;
pub mod temperature;

pub use level::{LevelChannel, Probe, SensorGroup, Verification};
pub use temperature::DeviceId;
