//! Hardware adapter: bridges the board peripherals to domain port traits.
//!
//! Owns the relay and indicator drivers plus the float and selector
//! inputs, exposing them through the sensor and actuator ports. The
//! meter is read from the latest-value latch the meter task publishes
//! into. On non-espidf targets the drivers fall through to the simulated
//! GPIO levels.

use log::error;

use crate::app::ports::{IndicatorPort, LevelSensorPort, MeterPort, ModeSelectorPort, RelayPort};
use crate::control::mode::OperatingMode;
use crate::drivers::relay::RelayDriver;
use crate::drivers::status_led::StatusLed;
use crate::motor::{MotorId, PerMotor};
use crate::sensors::level_switch::LevelSwitches;
use crate::sensors::mode_switch::ModeSwitch;
use crate::sensors::{LevelInputs, MeterReading, meter};

/// Concrete adapter that combines all board I/O behind port traits.
pub struct BoardHardware {
    relays: PerMotor<RelayDriver>,
    leds: PerMotor<StatusLed>,
    floats: LevelSwitches,
    selector: ModeSwitch,
}

impl BoardHardware {
    pub fn new() -> Self {
        Self {
            relays: PerMotor::from_fn(RelayDriver::new),
            leds: PerMotor::from_fn(StatusLed::new),
            floats: LevelSwitches::new(),
            selector: ModeSwitch::new(),
        }
    }

    /// Whether the driver believes `motor`'s contactor is closed.
    pub fn relay_closed(&self, motor: MotorId) -> bool {
        self.relays[motor].is_closed()
    }

    pub fn indicator_lit(&self, motor: MotorId) -> bool {
        self.leds[motor].is_lit()
    }
}

impl Default for BoardHardware {
    fn default() -> Self {
        Self::new()
    }
}

// ── Sensor ports ──────────────────────────────────────────────

impl MeterPort for BoardHardware {
    fn read(&mut self) -> MeterReading {
        meter::latest()
    }
}

impl LevelSensorPort for BoardHardware {
    fn read_levels(&mut self) -> LevelInputs {
        self.floats.read()
    }
}

impl ModeSelectorPort for BoardHardware {
    fn read_mode(&mut self) -> Option<OperatingMode> {
        self.selector.read()
    }
}

// ── Actuator ports ────────────────────────────────────────────

impl RelayPort for BoardHardware {
    fn set_relay(&mut self, motor: MotorId, energized: bool) {
        if let Err(e) = self.relays[motor].set(energized) {
            error!("{motor}: relay write failed: {}", e);
        }
    }
}

impl IndicatorPort for BoardHardware {
    fn set_indicator(&mut self, motor: MotorId, lit: bool) {
        if let Err(e) = self.leds[motor].set(lit) {
            error!("{motor}: indicator write failed: {}", e);
        }
    }
}
