//! Application service: the hexagonal core.
//!
//! [`ControllerService`] owns the settings, the arbitration engine, the
//! operating mode and the indicator engines. It exposes a clean,
//! hardware-agnostic API. All I/O flows through port traits injected at
//! call sites, making the entire service testable with mock adapters.
//!
//! ```text
//!  MeterPort ────────┐                          ┌──▶ RelayPort
//!  LevelSensorPort ──┼─▶ ┌────────────────────┐ ├──▶ IndicatorPort
//!  ModeSelectorPort ─┘   │ ControllerService  │─┴──▶ EventSink
//!  AppCommand ──────────▶│ Arbiter · Mode     │◀───▶ ConfigPort
//!                        └────────────────────┘
//! ```

use embedded_hal::delay::DelayNs;
use log::{debug, error, info, warn};

use crate::config::{
    CONFIG_AUTOSAVE_DELAY_MS, ControllerConfig, MEASUREMENT_INTERVAL_MS, MotorSettings,
    TELEMETRY_INTERVAL_MS,
};
use crate::control::arbiter::{Arbiter, StartOutcome, StopOutcome, TickInputs};
use crate::control::calibration;
use crate::control::mode::OperatingMode;
use crate::drivers::led_patterns::{BlinkEngine, IndicatorMode};
use crate::error::{CalibrationError, Error, Result};
use crate::motor::{MotorId, MotorStatus, PerMotor};
use crate::safety::{FaultCode, FaultMessage};
use crate::sensors::{LevelInputs, MeasurementSnapshot};

use super::commands::AppCommand;
use super::events::{AppEvent, MotorTelemetry, RejectReason, StopReason, TelemetryData};
use super::ports::{Clock, ConfigError, ConfigPort, EventSink, Plant};

/// Where the calibration hold stands while the selector is in the
/// calibration position.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum CalibrationPhase {
    /// Waiting for a `Calibrate` command.
    Ready,
    /// Settings saved; held until the selector moves.
    Saved(MotorId),
    /// Sampling failed; both indicators show the fault pattern.
    Failed(MotorId),
}

// ───────────────────────────────────────────────────────────────
// ControllerService
// ───────────────────────────────────────────────────────────────

/// The application service orchestrates all domain logic.
pub struct ControllerService {
    config: ControllerConfig,
    arbiter: Arbiter,
    mode: Option<OperatingMode>,
    calibration: CalibrationPhase,
    indicators: PerMotor<BlinkEngine>,
    meter: MeasurementSnapshot,
    levels: LevelInputs,
    boot_ms: u64,
    last_measurement_ms: Option<u64>,
    last_telemetry_ms: u64,
    tick_count: u64,
    config_dirty: bool,
    dirty_since_ms: u64,
}

impl ControllerService {
    /// Construct the service around an already-validated configuration.
    pub fn new(config: ControllerConfig, boot_ms: u64) -> Self {
        Self {
            config,
            arbiter: Arbiter::new(),
            mode: None,
            calibration: CalibrationPhase::Ready,
            indicators: PerMotor::default(),
            meter: MeasurementSnapshot::default(),
            levels: LevelInputs::default(),
            boot_ms,
            last_measurement_ms: None,
            last_telemetry_ms: boot_ms,
            tick_count: 0,
            config_dirty: false,
            dirty_since_ms: 0,
        }
    }

    // ── Lifecycle ─────────────────────────────────────────────

    /// Load settings, repair implausible records and write the repaired
    /// record back.
    pub fn boot(store: &impl ConfigPort, now_ms: u64, sink: &mut impl EventSink) -> Self {
        let (mut config, mut write_back) = match store.load() {
            Ok(cfg) => (cfg, false),
            Err(ConfigError::NotFound) => {
                info!("No stored settings, using factory defaults");
                (ControllerConfig::default(), true)
            }
            Err(e) => {
                warn!("Settings load failed ({}), using factory defaults", e);
                (ControllerConfig::default(), true)
            }
        };

        let reset = config.repair();
        for (motor, &was_reset) in reset.iter() {
            if was_reset {
                warn!("{motor}: stored settings implausible, factory defaults restored");
                sink.emit(&AppEvent::ConfigReset(motor));
                write_back = true;
            }
        }

        let mut svc = Self::new(config, now_ms);
        if write_back {
            svc.save_config(store, sink);
        }
        info!("ControllerService booted");
        svc
    }

    // ── Per-tick orchestration ────────────────────────────────

    /// Run one control cycle: mode → measurements → arbitration →
    /// indicators → telemetry.
    pub fn tick(&mut self, now_ms: u64, hw: &mut impl Plant, sink: &mut impl EventSink) {
        self.tick_count += 1;

        // 1. Selector
        match hw.read_mode() {
            Some(selected) if Some(selected) != self.mode => {
                self.change_mode(selected, now_ms, hw, sink);
            }
            Some(_) => {}
            None => debug!("selector in invalid position, keeping {:?}", self.mode),
        }

        // 2. Inputs
        self.refresh_inputs(now_ms, hw);

        // 3. Arbitration (bore first)
        let uptime = now_ms.saturating_sub(self.boot_ms);
        let inputs = TickInputs {
            now_ms,
            meter: self.meter,
            levels: self.levels,
            config: &self.config,
        };
        match self.mode {
            Some(OperatingMode::Auto) => {
                for motor in MotorId::ALL {
                    let delay_over = uptime >= self.config.motor(motor).power_on_delay_ms();
                    if delay_over || self.arbiter.is_running(motor) {
                        self.arbiter.schedule(motor, true, &inputs, hw, sink);
                    } else {
                        self.arbiter.classify(motor, &inputs, sink);
                    }
                }
            }
            Some(OperatingMode::Manual) | None => {
                for motor in MotorId::ALL {
                    self.arbiter.schedule(motor, false, &inputs, hw, sink);
                }
            }
            // No scheduling, but the codes stay current for the
            // calibration precondition.
            Some(OperatingMode::Calibration) => {
                for motor in MotorId::ALL {
                    self.arbiter.classify(motor, &inputs, sink);
                }
            }
        }

        // 4. Indicators
        self.drive_indicators(now_ms, hw);

        // 5. Telemetry
        if now_ms.saturating_sub(self.last_telemetry_ms) >= TELEMETRY_INTERVAL_MS {
            self.last_telemetry_ms = now_ms;
            sink.emit(&AppEvent::Telemetry(self.build_telemetry(now_ms)));
        }
    }

    // ── Command handling ──────────────────────────────────────

    /// Process an external command (buttons, web page, serial console).
    pub fn handle_command(
        &mut self,
        cmd: AppCommand,
        hw: &mut impl Plant,
        timer: &mut (impl Clock + DelayNs),
        store: &impl ConfigPort,
        sink: &mut impl EventSink,
    ) {
        let now_ms = timer.now_ms();
        match cmd {
            AppCommand::RequestStart(motor) => {
                let outcome = self.request_manual_start(motor, now_ms, hw, sink);
                debug!("{motor}: start request -> {:?}", outcome);
            }
            AppCommand::RequestStop(motor) => {
                let outcome = self.request_manual_stop(motor, now_ms, hw, sink);
                debug!("{motor}: stop request -> {:?}", outcome);
            }
            AppCommand::Calibrate(motor) => {
                if let Err(e) = self.calibrate(motor, hw, timer, store, sink) {
                    warn!("{motor}: calibration failed: {}", e);
                }
            }
            AppCommand::UpdateSettings { motor, settings } => {
                *self.config.motor_mut(motor) = settings;
                self.mark_config_dirty(now_ms);
                info!("{motor}: settings updated at runtime");
            }
            AppCommand::SaveConfig => {
                self.save_config(store, sink);
            }
        }
    }

    /// Manual start from the UI layer. `None` when the selector is not in
    /// MANUAL.
    pub fn request_manual_start(
        &mut self,
        motor: MotorId,
        now_ms: u64,
        hw: &mut impl Plant,
        sink: &mut impl EventSink,
    ) -> Option<StartOutcome> {
        if self.mode != Some(OperatingMode::Manual) {
            warn!("{motor}: start ignored, selector not in MANUAL ({:?})", self.mode);
            sink.emit(&AppEvent::StartRejected {
                motor,
                reason: RejectReason::WrongMode(self.mode),
            });
            return None;
        }
        self.refresh_inputs(now_ms, hw);
        let inputs = TickInputs {
            now_ms,
            meter: self.meter,
            levels: self.levels,
            config: &self.config,
        };
        Some(self.arbiter.request_start(motor, &inputs, hw, sink))
    }

    /// Manual stop from the UI layer. Honoured in every mode.
    pub fn request_manual_stop(
        &mut self,
        motor: MotorId,
        now_ms: u64,
        hw: &mut impl Plant,
        sink: &mut impl EventSink,
    ) -> StopOutcome {
        self.refresh_inputs(now_ms, hw);
        let inputs = TickInputs {
            now_ms,
            meter: self.meter,
            levels: self.levels,
            config: &self.config,
        };
        self.arbiter.request_stop(motor, &inputs, hw, sink)
    }

    /// Run the calibration routine for `motor` and persist the result.
    ///
    /// Only accepted with the selector in the calibration position. A
    /// persistence failure after a successful run keeps the new settings
    /// in memory and marks them dirty for the auto-save.
    pub fn calibrate(
        &mut self,
        motor: MotorId,
        hw: &mut impl Plant,
        timer: &mut (impl Clock + DelayNs),
        store: &impl ConfigPort,
        sink: &mut impl EventSink,
    ) -> Result<MotorSettings> {
        if self.mode != Some(OperatingMode::Calibration) {
            let error = CalibrationError::NotInCalibrationMode;
            sink.emit(&AppEvent::CalibrationAborted { motor, error });
            return Err(error.into());
        }

        let base = *self.config.motor(motor);
        match calibration::run(motor, &base, &mut self.arbiter, hw, timer, sink) {
            Ok(settings) => {
                *self.config.motor_mut(motor) = settings;
                self.calibration = CalibrationPhase::Saved(motor);
                if !self.save_config(store, sink) {
                    self.mark_config_dirty(timer.now_ms());
                }
                sink.emit(&AppEvent::CalibrationCompleted { motor, settings });
                info!("{motor}: calibration saved, change mode to resume");
                Ok(settings)
            }
            Err(e) => {
                if let Error::Calibration(error) = e {
                    if matches!(error, CalibrationError::InvalidSample { .. }) {
                        self.calibration = CalibrationPhase::Failed(motor);
                    }
                    sink.emit(&AppEvent::CalibrationAborted { motor, error });
                } else {
                    error!("{motor}: calibration aborted: {}", e);
                }
                Err(e)
            }
        }
    }

    // ── Queries ───────────────────────────────────────────────

    /// Code from the most recent classification of `motor`.
    pub fn get_fault_code(&self, motor: MotorId) -> FaultCode {
        self.arbiter.fault_code(motor)
    }

    pub fn motor_status(&self, motor: MotorId) -> MotorStatus {
        self.arbiter.status(motor)
    }

    /// Human-readable classifier message (≤ 16 chars).
    pub fn message(&self, motor: MotorId) -> &str {
        self.arbiter.message(motor)
    }

    pub fn mode(&self) -> Option<OperatingMode> {
        self.mode
    }

    pub fn calibration_phase(&self) -> CalibrationPhase {
        self.calibration
    }

    pub fn config(&self) -> &ControllerConfig {
        &self.config
    }

    pub fn measurements(&self) -> MeasurementSnapshot {
        self.meter
    }

    /// Total control ticks executed since startup.
    pub fn tick_count(&self) -> u64 {
        self.tick_count
    }

    /// Build a telemetry snapshot from the current state.
    pub fn build_telemetry(&self, now_ms: u64) -> TelemetryData {
        let motor = |m: MotorId| {
            let status = self.arbiter.status(m);
            let mut message = FaultMessage::new();
            // Both buffers share the classifier's capacity.
            let _ = message.push_str(self.arbiter.message(m));
            MotorTelemetry {
                running: status.running,
                pending: status.pending,
                fault: self.arbiter.fault_code(m),
                message,
            }
        };
        TelemetryData {
            uptime_ms: now_ms.saturating_sub(self.boot_ms),
            mode: self.mode,
            voltage: self.meter.voltage,
            current: self.meter.current,
            power_factor: self.meter.power_factor,
            power: self.meter.power,
            energy: self.meter.energy,
            bore: motor(MotorId::Bore),
            sump: motor(MotorId::Sump),
        }
    }

    // ── Internal ──────────────────────────────────────────────

    fn change_mode(
        &mut self,
        to: OperatingMode,
        now_ms: u64,
        hw: &mut impl Plant,
        sink: &mut impl EventSink,
    ) {
        let from = self.mode;
        info!("Mode {:?} -> {}", from, to);

        if to == OperatingMode::Calibration {
            self.arbiter.halt_all(StopReason::Calibration, now_ms, hw, sink);
            self.arbiter.clear_pending(sink);
            self.calibration = CalibrationPhase::Ready;
        }
        if from == Some(OperatingMode::Manual) {
            self.arbiter.clear_pending(sink);
        }
        if from == Some(OperatingMode::Calibration) {
            self.calibration = CalibrationPhase::Ready;
        }

        self.mode = Some(to);
        sink.emit(&AppEvent::ModeChanged { from, to });
    }

    /// Levels every call; meter at most once per measurement interval.
    fn refresh_inputs(&mut self, now_ms: u64, hw: &mut impl Plant) {
        self.levels = hw.read_levels();
        let due = self
            .last_measurement_ms
            .is_none_or(|t| now_ms.saturating_sub(t) >= MEASUREMENT_INTERVAL_MS);
        if due {
            self.refresh_measurement(now_ms, hw);
        }
    }

    fn refresh_measurement(&mut self, now_ms: u64, hw: &mut impl Plant) {
        self.meter = MeasurementSnapshot::from_reading(&hw.read());
        self.last_measurement_ms = Some(now_ms);
    }

    fn drive_indicators(&mut self, now_ms: u64, hw: &mut impl Plant) {
        let forced = match (self.mode, self.calibration) {
            (Some(OperatingMode::Calibration), CalibrationPhase::Failed(_)) => {
                Some(IndicatorMode::Fault)
            }
            (Some(OperatingMode::Calibration), _) => Some(IndicatorMode::Idle),
            _ => None,
        };
        for motor in MotorId::ALL {
            let mode = forced.unwrap_or_else(|| {
                let status = self.arbiter.status(motor);
                IndicatorMode::for_motor(status.running, status.pending, self.arbiter.fault_code(motor))
            });
            let lit = self.indicators[motor].signal(mode, now_ms);
            hw.set_indicator(motor, lit);
        }
    }

    // ── Config dirty-flag management ──────────────────────────

    /// Mark the config as modified; the auto-save window restarts.
    pub fn mark_config_dirty(&mut self, now_ms: u64) {
        self.config_dirty = true;
        self.dirty_since_ms = now_ms;
    }

    /// Save if the config has been dirty for the auto-save delay.
    /// Returns `true` if the config was saved.
    pub fn auto_save_if_needed(
        &mut self,
        now_ms: u64,
        store: &impl ConfigPort,
        sink: &mut impl EventSink,
    ) -> bool {
        if !self.config_dirty
            || now_ms.saturating_sub(self.dirty_since_ms) < CONFIG_AUTOSAVE_DELAY_MS
        {
            return false;
        }
        self.save_config(store, sink)
    }

    /// Persist now. Returns whether the write succeeded.
    pub fn save_config(&mut self, store: &impl ConfigPort, sink: &mut impl EventSink) -> bool {
        match store.save(&self.config) {
            Ok(()) => {
                self.config_dirty = false;
                info!("Settings saved");
                sink.emit(&AppEvent::ConfigSaved);
                true
            }
            Err(e) => {
                warn!("Settings save failed: {}", e);
                false
            }
        }
    }

    /// Whether the config has unsaved changes.
    pub fn is_config_dirty(&self) -> bool {
        self.config_dirty
    }
}
