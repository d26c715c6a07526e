//! Stateless control math: fuzzy inference and duty calibration.

pub mod duty;
pub mod fuzzy;
