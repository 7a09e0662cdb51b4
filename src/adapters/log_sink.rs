//! Log-based event sink adapter.
//!
//! Implements [`EventSink`] by writing structured application events to
//! the ESP-IDF logger (UART / USB-CDC in production). Telemetry is
//! rendered as one JSON line so a serial monitor or a bridge script can
//! pick it up. A display or web adapter would implement the same trait.

use log::{error, info, warn};

use crate::app::events::{AppEvent, CalibrationStep};
use crate::app::ports::EventSink;

/// Adapter that logs every [`AppEvent`] to the serial console.
pub struct LogEventSink;

impl LogEventSink {
    pub fn new() -> Self {
        Self
    }
}

impl Default for LogEventSink {
    fn default() -> Self {
        Self::new()
    }
}

impl EventSink for LogEventSink {
    fn emit(&mut self, event: &AppEvent) {
        match event {
            AppEvent::Telemetry(t) => match serde_json::to_string(t) {
                Ok(json) => info!("TELEM | {}", json),
                Err(e) => warn!("TELEM | encode failed: {}", e),
            },
            AppEvent::MotorStarted { motor, trigger } => {
                info!("MOTOR | {} ON ({:?})", motor, trigger);
            }
            AppEvent::MotorStopped { motor, reason } => {
                info!("MOTOR | {} OFF ({:?})", motor, reason);
            }
            AppEvent::PendingQueued(motor) => {
                info!("MOTOR | {} pending", motor);
            }
            AppEvent::PendingCancelled(motor) => {
                info!("MOTOR | {} pending cancelled", motor);
            }
            AppEvent::StartRejected { motor, reason } => {
                warn!("MOTOR | {} start rejected: {:?}", motor, reason);
            }
            AppEvent::FaultChanged { motor, from, to } => {
                if to.is_fault() {
                    warn!("FAULT | {} {} -> {}", motor, from, to);
                } else {
                    info!("FAULT | {} {} -> {}", motor, from, to);
                }
            }
            AppEvent::ModeChanged { from, to } => match from {
                Some(from) => info!("MODE  | {} -> {}", from, to),
                None => info!("MODE  | {}", to),
            },
            AppEvent::CalibrationProgress { motor, step } => match step {
                CalibrationStep::WarmingUp { remaining_secs } => {
                    info!("CALIB | {} warm-up {}s", motor, remaining_secs);
                }
                CalibrationStep::Sampling { index } => {
                    info!("CALIB | {} sample {}", motor, index + 1);
                }
            },
            AppEvent::CalibrationCompleted { motor, settings } => {
                info!(
                    "CALIB | {} done: OV={:.1} UV={:.1} OC={:.2} UC={:.2} PF={:.2}",
                    motor,
                    settings.over_voltage,
                    settings.under_voltage,
                    settings.over_current,
                    settings.under_current,
                    settings.min_power_factor,
                );
            }
            AppEvent::CalibrationAborted { motor, error: e } => {
                error!("CALIB | {} aborted: {}", motor, e);
            }
            AppEvent::ConfigReset(motor) => {
                warn!("CONFIG| {} settings reset to defaults", motor);
            }
            AppEvent::ConfigSaved => {
                info!("CONFIG| saved");
            }
        }
    }
}
