//! Motor contactor relay driver.
//!
//! One active-HIGH GPIO per motor drives the contactor coil.
//!
//! ## Safety contract
//!
//! Two relays must never be closed at the same time. That is enforced by
//! the arbitration engine; this driver is a dumb actuator.
//!
//! ## Dual-target design
//!
//! On ESP-IDF: drives the real GPIO via hw_init helpers.
//! On host/test: writes the simulated level mask.

use crate::drivers::hw_init;
use crate::error::ActuatorError;
use crate::motor::MotorId;
use crate::pins;

pub struct RelayDriver {
    gpio: i32,
    closed: bool,
}

impl RelayDriver {
    pub fn new(motor: MotorId) -> Self {
        let gpio = match motor {
            MotorId::Bore => pins::BORE_RELAY_GPIO,
            MotorId::Sump => pins::SUMP_RELAY_GPIO,
        };
        Self {
            gpio,
            closed: false,
        }
    }

    /// Close (`true`) or open (`false`) the contactor.
    pub fn set(&mut self, closed: bool) -> Result<(), ActuatorError> {
        hw_init::gpio_write(self.gpio, closed).map_err(ActuatorError::GpioWriteFailed)?;
        self.closed = closed;
        Ok(())
    }

    pub fn is_closed(&self) -> bool {
        self.closed
    }
}
