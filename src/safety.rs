//! Fault classifier.
//!
//! Runs once per motor per tick and turns the shared meter snapshot, the
//! float switches and the motor's settings into an ordered [`FaultCode`].
//! The arbitration engine consumes the code in the same tick.
//!
//! ## Evaluation order (first match wins)
//!
//! 1. Cool-down latch: while either motor holds a critical code (≥ 4) and
//!    the queried motor's last full evaluation is younger than
//!    [`FAULT_COOLDOWN_MS`], the cached code is returned untouched.
//! 2. Voltage outside `[under_voltage, over_voltage]` → `VoltageFault`
//!    (applies even when stopped).
//! 3. Running + stabilized, current `>` over_current → `OverCurrent`.
//! 4. Running + stabilized, current `<` under_current → `UnderCurrent`.
//! 5. Running + stabilized, current `<` under_current and PF `<` min → `DryRun`.
//! 6. Sump only: source float down → `SourceEmpty`.
//! 7. Destination tank not full → `ShouldRun`.
//! 8. Otherwise `Ok`.
//!
//! Current / power-factor rules are suppressed for
//! [`STABILIZATION_DELAY_MS`] after a start so inrush does not trip them.

use core::fmt;

use heapless::String;
use log::{info, warn};
use serde::Serialize;

use crate::config::{FAULT_COOLDOWN_MS, MotorSettings, STABILIZATION_DELAY_MS};
use crate::motor::{MotorId, MotorRuntimeState, PerMotor};
use crate::sensors::{LevelInputs, MeasurementSnapshot};

/// Display width of the character LCD the messages were sized for.
pub const MESSAGE_CAPACITY: usize = 16;

pub type FaultMessage = String<MESSAGE_CAPACITY>;

// ---------------------------------------------------------------------------
// Fault codes
// ---------------------------------------------------------------------------

/// Ordered classification result. The numeric order is load-bearing (`>= SourceEmpty` stops a motor,
/// `>= OverCurrent` arms the cool-down latch).
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize)]
#[repr(u8)]
pub enum FaultCode {
    #[default]
    Ok = 0,
    /// Destination tank low; the motor is expected to run.
    ShouldRun = 1,
    /// Suction side empty (sump only).
    SourceEmpty = 2,
    VoltageFault = 3,
    OverCurrent = 4,
    UnderCurrent = 5,
    DryRun = 6,
}

impl FaultCode {
    pub const fn code(self) -> u8 {
        self as u8
    }

    /// Arms the cross-motor cool-down latch.
    pub fn is_critical(self) -> bool {
        self >= Self::OverCurrent
    }

    /// A running motor is stopped on every code except `ShouldRun`.
    pub fn requires_stop(self) -> bool {
        self != Self::ShouldRun
    }

    /// Source, supply or protection fault (blocks calibration, drives the
    /// fault indicator pattern).
    pub fn is_fault(self) -> bool {
        self >= Self::SourceEmpty
    }
}

impl fmt::Display for FaultCode {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let name = match self {
            Self::Ok => "OK",
            Self::ShouldRun => "SHOULD_RUN",
            Self::SourceEmpty => "SOURCE_EMPTY",
            Self::VoltageFault => "VOLTAGE_FAULT",
            Self::OverCurrent => "OVER_CURRENT",
            Self::UnderCurrent => "UNDER_CURRENT",
            Self::DryRun => "DRY_RUN",
        };
        f.write_str(name)
    }
}

// ---------------------------------------------------------------------------
// Pure rule evaluation
// ---------------------------------------------------------------------------

/// Rules 2–8 for one motor. `stabilized` must already account for the
/// motor being stopped (a stopped motor counts as stabilized; the running
/// guard on the current rules still applies).
pub fn evaluate(
    motor: MotorId,
    running: bool,
    stabilized: bool,
    settings: &MotorSettings,
    meter: &MeasurementSnapshot,
    levels: &LevelInputs,
) -> (FaultCode, &'static str) {
    let v = meter.voltage;
    let i = meter.current;

    if settings.detect_voltage && (v < settings.under_voltage || v > settings.over_voltage) {
        let msg = if v < settings.under_voltage {
            "LOW Voltage"
        } else {
            "HIGH Voltage"
        };
        return (FaultCode::VoltageFault, msg);
    }

    let loaded = running && stabilized;
    if loaded && settings.detect_current && i > settings.over_current {
        return (FaultCode::OverCurrent, "Over current");
    }
    if loaded && settings.detect_current && i < settings.under_current {
        return (FaultCode::UnderCurrent, "Under current");
    }
    if loaded
        && settings.dry_run_detect
        && i < settings.under_current
        && meter.power_factor < settings.min_power_factor
    {
        return (FaultCode::DryRun, "Dry run");
    }

    if motor == MotorId::Sump && !levels.sump_source_available {
        return (FaultCode::SourceEmpty, "UGT empty");
    }
    if !levels.tank_full(motor) {
        return (FaultCode::ShouldRun, "OHT LOW");
    }

    (FaultCode::Ok, "OK")
}

// ---------------------------------------------------------------------------
// Stateful classifier
// ---------------------------------------------------------------------------

/// Per-motor classifier: owns the human-readable message buffers and
/// applies the stabilization timer and cool-down latch on top of
/// [`evaluate`]. Timing state lives in [`MotorRuntimeState`].
#[derive(Debug, Default)]
pub struct FaultClassifier {
    messages: PerMotor<FaultMessage>,
}

impl FaultClassifier {
    pub fn new() -> Self {
        Self::default()
    }

    /// Classify `motor` at `now_ms`.
    pub fn classify(
        &mut self,
        motor: MotorId,
        motors: &mut PerMotor<MotorRuntimeState>,
        settings: &MotorSettings,
        meter: &MeasurementSnapshot,
        levels: &LevelInputs,
        now_ms: u64,
    ) -> FaultCode {
        let either_critical =
            motors.bore.last_error_code.is_critical() || motors.sump.last_error_code.is_critical();
        let state = &mut motors[motor];

        if either_critical && now_ms.saturating_sub(state.last_error_ms) < FAULT_COOLDOWN_MS {
            return state.last_error_code;
        }

        let stabilized = Self::track_stabilization(state, now_ms);
        let (code, msg) = evaluate(motor, state.running, stabilized, settings, meter, levels);

        let previous = state.last_error_code;
        state.last_error_code = code;
        state.last_error_ms = now_ms;
        self.set_message(motor, msg);

        if code != previous {
            if code.is_fault() {
                warn!("{motor}: {previous} -> {code} ({msg})");
            } else {
                info!("{motor}: {previous} -> {code}");
            }
        }
        code
    }

    /// Message written by the most recent full classification.
    pub fn message(&self, motor: MotorId) -> &str {
        self.messages[motor].as_str()
    }

    // ── Internal ──────────────────────────────────────────────────

    /// Start the stabilization timer on the first tick after a start and
    /// clear it while stopped. Returns whether current rules may fire.
    fn track_stabilization(state: &mut MotorRuntimeState, now_ms: u64) -> bool {
        if !state.running {
            state.stabilization_started_ms = None;
            return true;
        }
        let started = *state.stabilization_started_ms.get_or_insert(now_ms);
        now_ms.saturating_sub(started) >= STABILIZATION_DELAY_MS
    }

    fn set_message(&mut self, motor: MotorId, msg: &str) {
        let buf = &mut self.messages[motor];
        buf.clear();
        // Truncate at capacity.
        for ch in msg.chars() {
            if buf.push(ch).is_err() {
                break;
            }
        }
    }
}
