//! Actuator drivers over `embedded-hal` traits.

pub mod relay;
pub mod servo;
