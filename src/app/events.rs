//! Outbound application events.
//!
//! The [`ControllerService`](super::service::ControllerService) and the
//! arbitration engine emit these through the
//! [`EventSink`](super::ports::EventSink) port. Adapters on the other side
//! decide what to do with them: log to serial, refresh a display, push to
//! a web page.

use serde::Serialize;

use crate::config::MotorSettings;
use crate::control::mode::OperatingMode;
use crate::error::CalibrationError;
use crate::motor::MotorId;
use crate::safety::FaultCode;

/// Why a motor was started.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
pub enum StartTrigger {
    /// AUTO scheduling pass.
    Auto,
    /// Operator request with the line free.
    Manual,
    /// A deferred manual request honoured when the line freed up.
    Pending,
    /// Calibration warm-up.
    Calibration,
}

/// Why a motor was stopped.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
pub enum StopReason {
    /// Destination tank full (`FaultCode::Ok`).
    TankFull,
    /// Classifier returned a code `>= SourceEmpty`.
    Fault(FaultCode),
    /// Cyclic ON period elapsed.
    DutyCycle,
    /// Operator request.
    Manual,
    /// Sump stopped so the bore can take the line.
    Preempted,
    /// Calibration mode took over the line.
    Calibration,
}

/// Why a manual start request was refused.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
pub enum RejectReason {
    /// Current classification is not `ShouldRun`.
    Condition(FaultCode),
    /// Manual starts are only accepted with the selector in MANUAL.
    WrongMode(Option<OperatingMode>),
}

/// Calibration progress milestones.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
pub enum CalibrationStep {
    /// Warm-up countdown, emitted once per second.
    WarmingUp { remaining_secs: u32 },
    /// About to take sample `index` (0-based).
    Sampling { index: usize },
}

/// Structured events emitted by the application core.
#[derive(Debug, Clone)]
pub enum AppEvent {
    /// Periodic telemetry snapshot.
    Telemetry(TelemetryData),

    MotorStarted { motor: MotorId, trigger: StartTrigger },
    MotorStopped { motor: MotorId, reason: StopReason },

    /// Manual start deferred because the other motor owns the line.
    PendingQueued(MotorId),
    /// Deferred request dropped (operator stop or mode change).
    PendingCancelled(MotorId),

    StartRejected { motor: MotorId, reason: RejectReason },

    /// The classifier's result for a motor changed.
    FaultChanged { motor: MotorId, from: FaultCode, to: FaultCode },

    /// The selector moved.
    ModeChanged { from: Option<OperatingMode>, to: OperatingMode },

    CalibrationProgress { motor: MotorId, step: CalibrationStep },
    CalibrationCompleted { motor: MotorId, settings: MotorSettings },
    CalibrationAborted { motor: MotorId, error: CalibrationError },

    /// A stored settings record was implausible and replaced by defaults.
    ConfigReset(MotorId),
    /// Settings persisted.
    ConfigSaved,
}

/// Per-motor slice of a telemetry snapshot.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct MotorTelemetry {
    pub running: bool,
    pub pending: bool,
    pub fault: FaultCode,
    pub message: heapless::String<{ crate::safety::MESSAGE_CAPACITY }>,
}

/// A point-in-time telemetry snapshot suitable for logging or transmission.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct TelemetryData {
    pub uptime_ms: u64,
    pub mode: Option<OperatingMode>,
    pub voltage: f32,
    pub current: f32,
    pub power_factor: f32,
    pub power: f32,
    pub energy: f32,
    pub bore: MotorTelemetry,
    pub sump: MotorTelemetry,
}
