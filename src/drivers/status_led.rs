//! Per-motor status LED driver.
//!
//! A single active-HIGH GPIO per motor. The blink timing lives in
//! [`led_patterns`](super::led_patterns); this driver only latches a level
//! and skips redundant writes.
//!
//! ## Dual-target design
//!
//! On ESP-IDF: drives the real GPIO via hw_init.
//! On host/test: writes the simulated level mask.

use crate::drivers::hw_init;
use crate::error::ActuatorError;
use crate::motor::MotorId;
use crate::pins;

pub struct StatusLed {
    gpio: i32,
    lit: Option<bool>,
}

impl StatusLed {
    pub fn new(motor: MotorId) -> Self {
        let gpio = match motor {
            MotorId::Bore => pins::BORE_STATUS_LED_GPIO,
            MotorId::Sump => pins::SUMP_STATUS_LED_GPIO,
        };
        Self { gpio, lit: None }
    }

    pub fn set(&mut self, lit: bool) -> Result<(), ActuatorError> {
        if self.lit == Some(lit) {
            return Ok(());
        }
        hw_init::gpio_write(self.gpio, lit).map_err(ActuatorError::GpioWriteFailed)?;
        self.lit = Some(lit);
        Ok(())
    }

    pub fn is_lit(&self) -> bool {
        self.lit.unwrap_or(false)
    }
}
