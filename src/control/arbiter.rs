//! Arbitration engine: one shared line, two motors.
//!
//! Owns every motor's [`MotorRuntimeState`] and the [`FaultClassifier`];
//! nothing else mutates them. Enforces:
//!
//! - **Mutual exclusion**: at most one relay is energised at any instant.
//!   [`Arbiter::start_motor`] refuses while the other motor runs.
//! - **Bore priority**: in AUTO a bore that becomes eligible preempts a
//!   running sump within the same pass; a sump never preempts the bore.
//! - **Pending requests**: a MANUAL start blocked by the other motor is
//!   parked and re-tried (bore first) whenever a stop frees the line.
//!
//! ```text
//!            eligible                 stop condition
//!  STOPPED ───────────▶ RUNNING ───────────────────▶ STOPPED
//!     │                    ▲
//!     │ manual start,      │ line freed and
//!     │ line busy          │ classify == ShouldRun
//!     ▼                    │
//!  PENDING ────────────────┘
//! ```

use log::{debug, info, warn};

use crate::app::events::{AppEvent, RejectReason, StartTrigger, StopReason};
use crate::app::ports::{EventSink, RelayPort};
use crate::config::ControllerConfig;
use crate::error::ActuatorError;
use crate::motor::{MotorId, MotorRuntimeState, MotorStatus, PerMotor};
use crate::safety::{FaultClassifier, FaultCode};
use crate::sensors::{LevelInputs, MeasurementSnapshot};

/// Everything one scheduling pass reads.
#[derive(Debug, Clone, Copy)]
pub struct TickInputs<'a> {
    pub now_ms: u64,
    pub meter: MeasurementSnapshot,
    pub levels: LevelInputs,
    pub config: &'a ControllerConfig,
}

/// Result of a manual start request.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum StartOutcome {
    Started,
    /// Other motor owns the line; request parked.
    Queued,
    AlreadyRunning,
    /// Classification was not `ShouldRun`.
    Rejected(FaultCode),
}

/// Result of a manual stop request.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum StopOutcome {
    Stopped,
    PendingCancelled,
    /// Motor already stopped with nothing pending.
    NoOp,
}

pub struct Arbiter {
    motors: PerMotor<MotorRuntimeState>,
    classifier: FaultClassifier,
    /// Set at boot; lets the first AUTO start ignore the cyclic OFF timer.
    power_failed: bool,
}

impl Arbiter {
    pub fn new() -> Self {
        Self {
            motors: PerMotor::default(),
            classifier: FaultClassifier::new(),
            power_failed: true,
        }
    }

    // ── Classification ────────────────────────────────────────

    /// Classify `motor` and report a change of result through `sink`.
    pub fn classify(
        &mut self,
        motor: MotorId,
        inputs: &TickInputs<'_>,
        sink: &mut impl EventSink,
    ) -> FaultCode {
        let before = self.motors[motor].last_error_code;
        let code = self.classifier.classify(
            motor,
            &mut self.motors,
            inputs.config.motor(motor),
            &inputs.meter,
            &inputs.levels,
            inputs.now_ms,
        );
        if code != before {
            sink.emit(&AppEvent::FaultChanged {
                motor,
                from: before,
                to: code,
            });
        }
        code
    }

    // ── Scheduling pass ───────────────────────────────────────

    /// One scheduling pass for `motor`. Call bore first, then sump.
    ///
    /// In AUTO a stopped motor starts when its classification is
    /// `ShouldRun` and its cyclic OFF period has elapsed (or the boot
    /// power-fail flag is still set). In both modes a running motor stops
    /// on any code other than `ShouldRun`; in AUTO it also stops when its
    /// cyclic ON period has elapsed.
    pub fn schedule(
        &mut self,
        motor: MotorId,
        auto: bool,
        inputs: &TickInputs<'_>,
        relays: &mut impl RelayPort,
        sink: &mut impl EventSink,
    ) {
        let code = self.classify(motor, inputs, sink);
        let settings = inputs.config.motor(motor);
        let state = self.motors[motor];
        let now = inputs.now_ms;

        if !state.running {
            if !auto {
                return;
            }
            // Bore priority: the sump waits while the bore runs.
            if motor == MotorId::Sump && self.motors.bore.running {
                return;
            }
            let off_elapsed = !settings.cyclic_timer_enabled
                || state.ms_since_off(now) >= settings.off_time_ms();
            if !(self.power_failed || off_elapsed) || code != FaultCode::ShouldRun {
                return;
            }
            if motor == MotorId::Bore && self.motors.sump.running {
                self.halt(MotorId::Sump, StopReason::Preempted, now, relays, sink);
            }
            if self.start_motor(motor, StartTrigger::Auto, now, relays, sink).is_ok() {
                self.power_failed = false;
            }
            return;
        }

        let reason = if code.requires_stop() {
            Some(Self::stop_reason_for(code))
        } else if auto
            && settings.cyclic_timer_enabled
            && state.ms_since_on(now) >= settings.on_time_ms()
        {
            Some(StopReason::DutyCycle)
        } else {
            None
        };

        if let Some(reason) = reason {
            self.stop_motor(motor, reason, inputs, relays, sink);
        }
    }

    // ── Manual requests ───────────────────────────────────────

    /// Operator asks for `motor` to run.
    pub fn request_start(
        &mut self,
        motor: MotorId,
        inputs: &TickInputs<'_>,
        relays: &mut impl RelayPort,
        sink: &mut impl EventSink,
    ) -> StartOutcome {
        if self.motors[motor].running {
            debug!("{motor}: start requested while already running");
            return StartOutcome::AlreadyRunning;
        }

        let code = self.classify(motor, inputs, sink);
        let other = motor.other();

        if self.motors[other].running {
            if !self.motors[motor].pending_start {
                self.motors[motor].pending_start = true;
                info!("{motor}: pending, {other} owns the line");
                sink.emit(&AppEvent::PendingQueued(motor));
            }
            return StartOutcome::Queued;
        }

        if code != FaultCode::ShouldRun {
            warn!("{motor}: start rejected, condition {code}");
            sink.emit(&AppEvent::StartRejected {
                motor,
                reason: RejectReason::Condition(code),
            });
            return StartOutcome::Rejected(code);
        }

        match self.start_motor(motor, StartTrigger::Manual, inputs.now_ms, relays, sink) {
            Ok(()) => StartOutcome::Started,
            // Unreachable: the other motor was checked above.
            Err(_) => StartOutcome::Queued,
        }
    }

    /// Operator asks for `motor` to stop. Always honoured immediately.
    ///
    /// Stopping a running motor frees the line and resolves pending
    /// requests. On a stopped motor the only effect is dropping its own
    /// pending request, if any.
    pub fn request_stop(
        &mut self,
        motor: MotorId,
        inputs: &TickInputs<'_>,
        relays: &mut impl RelayPort,
        sink: &mut impl EventSink,
    ) -> StopOutcome {
        if self.motors[motor].running {
            self.stop_motor(motor, StopReason::Manual, inputs, relays, sink);
            return StopOutcome::Stopped;
        }
        if self.motors[motor].pending_start {
            self.motors[motor].pending_start = false;
            info!("{motor}: pending request cancelled");
            sink.emit(&AppEvent::PendingCancelled(motor));
            return StopOutcome::PendingCancelled;
        }
        StopOutcome::NoOp
    }

    // ── Transitions ───────────────────────────────────────────

    /// Energise `motor`. Refuses while the other motor runs.
    pub fn start_motor(
        &mut self,
        motor: MotorId,
        trigger: StartTrigger,
        now_ms: u64,
        relays: &mut impl RelayPort,
        sink: &mut impl EventSink,
    ) -> Result<(), ActuatorError> {
        let other = motor.other();
        if self.motors[other].running {
            return Err(ActuatorError::LineBusy(other));
        }
        let state = &mut self.motors[motor];
        if state.running {
            return Ok(());
        }

        relays.set_relay(motor, true);
        state.running = true;
        state.last_on_ms = now_ms;
        state.pending_start = false;
        state.stabilization_started_ms = None;

        info!("{motor}: ON ({trigger:?})");
        sink.emit(&AppEvent::MotorStarted { motor, trigger });
        Ok(())
    }

    /// De-energise `motor` and try to honour pending requests.
    pub fn stop_motor(
        &mut self,
        motor: MotorId,
        reason: StopReason,
        inputs: &TickInputs<'_>,
        relays: &mut impl RelayPort,
        sink: &mut impl EventSink,
    ) {
        if self.halt(motor, reason, inputs.now_ms, relays, sink) {
            self.resolve_pending(inputs, relays, sink);
        }
    }

    /// De-energise `motor` without touching pending requests.
    /// Returns whether the motor was running.
    pub fn halt(
        &mut self,
        motor: MotorId,
        reason: StopReason,
        now_ms: u64,
        relays: &mut impl RelayPort,
        sink: &mut impl EventSink,
    ) -> bool {
        let state = &mut self.motors[motor];
        if !state.running {
            return false;
        }

        relays.set_relay(motor, false);
        state.running = false;
        state.last_off_ms = now_ms;
        state.stabilization_started_ms = None;

        info!("{motor}: OFF ({reason:?})");
        sink.emit(&AppEvent::MotorStopped { motor, reason });
        true
    }

    /// Halt both motors without pending resolution.
    pub fn halt_all(
        &mut self,
        reason: StopReason,
        now_ms: u64,
        relays: &mut impl RelayPort,
        sink: &mut impl EventSink,
    ) {
        for motor in MotorId::ALL {
            self.halt(motor, reason, now_ms, relays, sink);
        }
    }

    /// Drop every pending request.
    pub fn clear_pending(&mut self, sink: &mut impl EventSink) {
        for motor in MotorId::ALL {
            let state = &mut self.motors[motor];
            if state.pending_start {
                state.pending_start = false;
                sink.emit(&AppEvent::PendingCancelled(motor));
            }
        }
    }

    /// Start the first pending motor (bore first) whose fresh
    /// classification is `ShouldRun`, provided the line is free.
    fn resolve_pending(
        &mut self,
        inputs: &TickInputs<'_>,
        relays: &mut impl RelayPort,
        sink: &mut impl EventSink,
    ) {
        for motor in MotorId::ALL {
            if !self.motors[motor].pending_start || self.running_motor().is_some() {
                continue;
            }
            if self.classify(motor, inputs, sink) == FaultCode::ShouldRun {
                info!("{motor}: starting pending request");
                if self
                    .start_motor(motor, StartTrigger::Pending, inputs.now_ms, relays, sink)
                    .is_ok()
                {
                    return;
                }
            }
        }
    }

    fn stop_reason_for(code: FaultCode) -> StopReason {
        if code == FaultCode::Ok {
            StopReason::TankFull
        } else {
            StopReason::Fault(code)
        }
    }

    // ── Queries ───────────────────────────────────────────────

    /// Code from the most recent classification of `motor`.
    pub fn fault_code(&self, motor: MotorId) -> FaultCode {
        self.motors[motor].last_error_code
    }

    pub fn status(&self, motor: MotorId) -> MotorStatus {
        MotorStatus::from(&self.motors[motor])
    }

    pub fn state(&self, motor: MotorId) -> &MotorRuntimeState {
        &self.motors[motor]
    }

    pub fn message(&self, motor: MotorId) -> &str {
        self.classifier.message(motor)
    }

    pub fn is_running(&self, motor: MotorId) -> bool {
        self.motors[motor].running
    }

    /// The motor owning the line, if any.
    pub fn running_motor(&self) -> Option<MotorId> {
        MotorId::ALL.into_iter().find(|&m| self.motors[m].running)
    }

    pub fn power_failed(&self) -> bool {
        self.power_failed
    }
}

impl Default for Arbiter {
    fn default() -> Self {
        Self::new()
    }
}
