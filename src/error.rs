//! Unified error types for the TwinPump firmware.
//!
//! A single `Error` enum that every subsystem converts into. All variants
//! are `Copy` so they can travel through events and the control loop
//! without allocation.
//!
//! Sensor conditions (tank levels, out-of-range electrical readings) are
//! *not* errors: they are [`FaultCode`](crate::safety::FaultCode)s that
//! drive state transitions.

use core::fmt;

use crate::motor::MotorId;
use crate::safety::FaultCode;

// ---------------------------------------------------------------------------
// Top-level firmware error
// ---------------------------------------------------------------------------

/// Every fallible operation in the firmware funnels into this type.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Error {
    /// A relay or indicator output could not be driven.
    Actuator(ActuatorError),
    /// The calibration routine aborted.
    Calibration(CalibrationError),
    /// Peripheral initialisation failed.
    Init(&'static str),
}

impl fmt::Display for Error {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::Actuator(e) => write!(f, "actuator: {e}"),
            Self::Calibration(e) => write!(f, "calibration: {e}"),
            Self::Init(msg) => write!(f, "init: {msg}"),
        }
    }
}

// ---------------------------------------------------------------------------
// Actuator errors
// ---------------------------------------------------------------------------

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ActuatorError {
    /// GPIO level write failed (carries the ESP-IDF return code).
    GpioWriteFailed(i32),
    /// A start was refused because the other motor owns the line.
    LineBusy(MotorId),
}

impl fmt::Display for ActuatorError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::GpioWriteFailed(rc) => write!(f, "GPIO write failed (rc={rc})"),
            Self::LineBusy(owner) => write!(f, "line busy ({owner} running)"),
        }
    }
}

impl From<ActuatorError> for Error {
    fn from(e: ActuatorError) -> Self {
        Self::Actuator(e)
    }
}

// ---------------------------------------------------------------------------
// Calibration errors
// ---------------------------------------------------------------------------

/// Reasons the calibration routine refuses to run or aborts.
///
/// Every variant leaves the stored settings untouched and the relay off.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum CalibrationError {
    /// A source or level fault is active on either motor.
    SourceFault { bore: FaultCode, sump: FaultCode },
    /// The meter returned NaN for sample `index`.
    InvalidSample { index: usize },
    /// The mode selector is not in the calibration position.
    NotInCalibrationMode,
}

impl fmt::Display for CalibrationError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::SourceFault { bore, sump } => {
                write!(f, "source/level fault active (bore={bore}, sump={sump})")
            }
            Self::InvalidSample { index } => write!(f, "invalid meter reading at sample {index}"),
            Self::NotInCalibrationMode => write!(f, "selector not in calibration position"),
        }
    }
}

impl From<CalibrationError> for Error {
    fn from(e: CalibrationError) -> Self {
        Self::Calibration(e)
    }
}

// ---------------------------------------------------------------------------
// Convenience Result alias
// ---------------------------------------------------------------------------

/// Firmware-wide `Result` alias.
pub type Result<T> = core::result::Result<T, Error>;
