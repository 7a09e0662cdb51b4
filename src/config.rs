//! System configuration parameters
//!
//! Per-motor protection thresholds and duty-cycle policy, plus the fixed
//! timing constants that the protection logic depends on.
//! Settings are persisted through the [`ConfigPort`](crate::app::ports::ConfigPort)
//! and can be rewritten at runtime by the calibration routine.

use serde::{Deserialize, Serialize};

use crate::motor::{MotorId, PerMotor};

// ---------------------------------------------------------------------------
// Fixed timing constants
// ---------------------------------------------------------------------------

/// Grace period after a motor start during which current / power-factor
/// faults are suppressed (inrush).
pub const STABILIZATION_DELAY_MS: u64 = 10_000;

/// Once either motor reports a critical fault, both classifiers return
/// their cached code for this long.
pub const FAULT_COOLDOWN_MS: u64 = 2 * 60 * 1000;

/// Calibration: motor run time before sampling starts.
pub const CALIBRATION_WARMUP_MS: u64 = 20_000;
/// Calibration: number of meter samples averaged.
pub const CALIBRATION_SAMPLES: usize = 5;
/// Calibration: spacing between samples.
pub const CALIBRATION_SAMPLE_SPACING_MS: u32 = 500;
/// Calibration: +/- margin applied around the measured averages.
pub const CALIBRATION_MARGIN: f32 = 0.20;
pub const CALIBRATION_MIN_POWER_FACTOR: f32 = 0.1;
pub const CALIBRATION_MIN_UNDER_CURRENT: f32 = 0.1;
pub const CALIBRATION_MIN_UNDER_VOLTAGE: f32 = 50.0;

/// Meter refresh interval.
pub const MEASUREMENT_INTERVAL_MS: u64 = 1_000;
/// Telemetry event interval.
pub const TELEMETRY_INTERVAL_MS: u64 = 5_000;
/// A dirty config is flushed this long after the last change.
pub const CONFIG_AUTOSAVE_DELAY_MS: u64 = 5_000;

/// Status indicator: AwaitingStart toggle period.
pub const INDICATOR_SLOW_BLINK_MS: u64 = 500;
/// Status indicator: Fault toggle period.
pub const INDICATOR_FAULT_BLINK_MS: u64 = 250;
/// Status indicator: toggles per fault burst (three flashes).
pub const INDICATOR_FAULT_TOGGLES: u8 = 6;
/// Status indicator: dark pause after a fault burst.
pub const INDICATOR_FAULT_PAUSE_MS: u64 = 2_000;

/// Plausible range for `over_voltage`; anything else means the stored
/// record is garbage and is replaced by factory defaults.
pub const OVER_VOLTAGE_PLAUSIBLE: core::ops::RangeInclusive<f32> = 100.0..=300.0;

// ---------------------------------------------------------------------------
// Per-motor settings
// ---------------------------------------------------------------------------

/// Protection thresholds and timing policy for one motor.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct MotorSettings {
    // --- Voltage window (V) ---
    pub over_voltage: f32,
    pub under_voltage: f32,

    // --- Current window (A) ---
    pub over_current: f32,
    pub under_current: f32,

    /// Dry-run threshold, used together with `under_current`.
    pub min_power_factor: f32,

    // --- Timing ---
    /// Seconds after boot before AUTO may start this motor.
    pub power_on_delay_secs: u32,
    /// Cyclic timer ON period (minutes). Read through [`Self::on_time_minutes`].
    pub on_time_minutes: u32,
    /// Cyclic timer OFF period (minutes). Read through [`Self::off_time_minutes`].
    pub off_time_minutes: u32,

    // --- Enables ---
    pub detect_voltage: bool,
    pub detect_current: bool,
    pub dry_run_detect: bool,
    pub cyclic_timer_enabled: bool,
}

impl Default for MotorSettings {
    fn default() -> Self {
        Self {
            over_voltage: 250.0,
            under_voltage: 180.0,
            over_current: 6.5,
            under_current: 0.3,
            min_power_factor: 0.3,

            power_on_delay_secs: 5,
            on_time_minutes: 5,
            off_time_minutes: 15,

            detect_voltage: false,
            detect_current: false,
            dry_run_detect: false,
            cyclic_timer_enabled: false,
        }
    }
}

impl MotorSettings {
    /// ON period, never below one minute.
    pub fn on_time_minutes(&self) -> u32 {
        self.on_time_minutes.max(1)
    }

    /// OFF period, never below one minute.
    pub fn off_time_minutes(&self) -> u32 {
        self.off_time_minutes.max(1)
    }

    pub fn on_time_ms(&self) -> u64 {
        u64::from(self.on_time_minutes()) * 60_000
    }

    pub fn off_time_ms(&self) -> u64 {
        u64::from(self.off_time_minutes()) * 60_000
    }

    pub fn power_on_delay_ms(&self) -> u64 {
        u64::from(self.power_on_delay_secs) * 1000
    }

    /// The only integrity check applied to a stored record.
    pub fn is_plausible(&self) -> bool {
        OVER_VOLTAGE_PLAUSIBLE.contains(&self.over_voltage)
    }
}

// ---------------------------------------------------------------------------
// Whole-controller configuration
// ---------------------------------------------------------------------------

/// Both motors' settings, persisted as one record.
#[derive(Debug, Clone, Copy, PartialEq, Default, Serialize, Deserialize)]
pub struct ControllerConfig {
    pub bore: MotorSettings,
    pub sump: MotorSettings,
}

impl ControllerConfig {
    pub fn motor(&self, id: MotorId) -> &MotorSettings {
        match id {
            MotorId::Bore => &self.bore,
            MotorId::Sump => &self.sump,
        }
    }

    pub fn motor_mut(&mut self, id: MotorId) -> &mut MotorSettings {
        match id {
            MotorId::Bore => &mut self.bore,
            MotorId::Sump => &mut self.sump,
        }
    }

    /// Reset every implausible motor record to factory defaults.
    /// Returns which motors were reset.
    pub fn repair(&mut self) -> PerMotor<bool> {
        PerMotor::from_fn(|id| {
            let settings = self.motor_mut(id);
            if settings.is_plausible() {
                false
            } else {
                *settings = MotorSettings::default();
                true
            }
        })
    }
}
