//! Sensor subsystem: meter latch, float switches and the mode selector.
//!
//! The types here are the values the core consumes each tick. Drivers in
//! the submodules produce them from GPIO levels or from the external
//! meter task.

pub mod level_switch;
pub mod meter;
pub mod mode_switch;

use serde::Serialize;

use crate::motor::MotorId;

// ---------------------------------------------------------------------------
// Electrical measurements
// ---------------------------------------------------------------------------

/// One decoded reading from the shared power meter. Any field may be NaN
/// when the meter did not answer.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct MeterReading {
    pub voltage: f32,
    pub current: f32,
    pub power_factor: f32,
    pub power: f32,
    pub energy: f32,
}

impl MeterReading {
    /// Every field NaN: what the latch reports before the first publish.
    pub const INVALID: Self = Self {
        voltage: f32::NAN,
        current: f32::NAN,
        power_factor: f32::NAN,
        power: f32::NAN,
        energy: f32::NAN,
    };

    /// The three quantities calibration averages are all numbers.
    pub fn is_valid(&self) -> bool {
        !(self.voltage.is_nan() || self.current.is_nan() || self.power_factor.is_nan())
    }
}

/// Sanitised measurements shared by both motors' classifiers within one
/// tick. There is one meter on the common line, not one per motor.
#[derive(Debug, Clone, Copy, PartialEq, Default, Serialize)]
pub struct MeasurementSnapshot {
    pub voltage: f32,
    pub current: f32,
    pub power_factor: f32,
    pub power: f32,
    pub energy: f32,
}

impl MeasurementSnapshot {
    /// NaN fields become 0.0.
    pub fn from_reading(r: &MeterReading) -> Self {
        fn zero_nan(v: f32) -> f32 {
            if v.is_nan() { 0.0 } else { v }
        }
        Self {
            voltage: zero_nan(r.voltage),
            current: zero_nan(r.current),
            power_factor: zero_nan(r.power_factor),
            power: zero_nan(r.power),
            energy: zero_nan(r.energy),
        }
    }
}

// ---------------------------------------------------------------------------
// Float switches
// ---------------------------------------------------------------------------

/// The three level-switch inputs, already decoded to their meaning.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
pub struct LevelInputs {
    pub bore_tank_full: bool,
    pub sump_source_available: bool,
    pub sump_tank_full: bool,
}

impl LevelInputs {
    /// Destination tank of `motor` is full.
    pub fn tank_full(&self, motor: MotorId) -> bool {
        match motor {
            MotorId::Bore => self.bore_tank_full,
            MotorId::Sump => self.sump_tank_full,
        }
    }
}

impl Default for LevelInputs {
    /// Everything full / available: nothing wants to run.
    fn default() -> Self {
        Self {
            bore_tank_full: true,
            sump_source_available: true,
            sump_tank_full: true,
        }
    }
}
