//! Log-based event sink adapter.
//!
//! Implements [`EventSink`] by writing structured application events to
//! whatever `log` backend the binary installed (serial console in
//! production).  An LCD adapter would implement the same trait.

use log::{error, info, warn};

use crate::app::events::{AppEvent, ExitReason};
use crate::app::ports::EventSink;

/// Adapter that logs every [`AppEvent`] as a single line.
#[derive(Debug, Default)]
pub struct LogEventSink;

impl LogEventSink {
    pub fn new() -> Self {
        Self
    }
}

impl EventSink for LogEventSink {
    fn emit(&mut self, event: &AppEvent) {
        match event {
            AppEvent::Regulation(t) => {
                info!(
                    "REGUL | t={}ms | SP={}\u{00b0}C | T={:.2}\u{00b0}C{} | e={:.2} de={:.2} | \
                     out={:.1}% | heater={} cooler={}",
                    t.elapsed_ms,
                    t.setpoint_c,
                    t.temperature_c,
                    if t.stale { " (stale)" } else { "" },
                    t.error,
                    t.delta_error,
                    t.output_pct,
                    t.heater_duty,
                    t.cooler_duty,
                );
            }
            AppEvent::StateChanged { from, to } => {
                info!("STATE | {:?} -> {:?}", from, to);
            }
            AppEvent::LocksChanged(locks) => {
                warn!(
                    "LOCKS | relay1={} relay2={} servo={}",
                    locks.relay1_locked, locks.relay2_locked, locks.servo_locked
                );
            }
            AppEvent::SessionStarted { setpoint_c } => {
                info!("START | setpoint={}\u{00b0}C", setpoint_c);
            }
            AppEvent::SensorBound(id) => {
                info!("PROBE | bound {}", id);
            }
            AppEvent::SetpointChanged(setpoint_c) => {
                info!("SETPT | {}\u{00b0}C", setpoint_c);
            }
            AppEvent::SessionEnded(ExitReason::Fault(e)) => {
                error!("END   | fault: {}", e);
            }
            AppEvent::SessionEnded(reason) => {
                info!("END   | {:?}", reason);
            }
            AppEvent::ManualCommand { target, on } => {
                info!("MANUL | {:?} {}", target, if *on { "on" } else { "off" });
            }
            AppEvent::ManualRefused(target) => {
                warn!("MANUL | {:?} locked", target);
            }
        }
    }
}
