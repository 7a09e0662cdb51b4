//! Inbound commands to the application service.
//!
//! These represent actions requested by the outside world (front-panel
//! buttons, web page, serial console) that the
//! [`ControllerService`](super::service::ControllerService) interprets and
//! acts upon. Handlers on other tasks never touch motor state directly;
//! they enqueue one of these through [`queue`](super::queue).

use crate::config::MotorSettings;
use crate::motor::MotorId;

/// Commands that external adapters can send into the application core.
#[derive(Debug, Clone, Copy, PartialEq)]
pub enum AppCommand {
    /// Operator toggles a motor on (MANUAL only).
    RequestStart(MotorId),

    /// Operator toggles a motor off. Honoured in every mode.
    RequestStop(MotorId),

    /// Run the calibration routine for one motor (selector must be in
    /// the calibration position).
    Calibrate(MotorId),

    /// Replace one motor's settings; auto-saved after a quiet period.
    UpdateSettings {
        motor: MotorId,
        settings: MotorSettings,
    },

    /// Persist the current settings immediately.
    SaveConfig,
}
