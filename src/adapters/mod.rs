//! Adapters — concrete implementations of the hexagonal port traits.
//!
//! | Adapter    | Implements      | Connects to                     |
//! |------------|-----------------|---------------------------------|
//! | `hardware` | VoltagePort     | board level ADC                 |
//! |            | TemperaturePort | board one-wire bus              |
//! |            | ActuatorPort    | relay GPIO, servo PWM channels  |
//! | `log_sink` | EventSink       | `log` backend                   |
//! | `time`     | Clock, DelayNs  | `std::time`, thread sleep       |

pub mod hardware;
pub mod log_sink;
pub mod time;
