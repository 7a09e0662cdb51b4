//! Three-position operating-mode selector.
//!
//! Two contacts, each pulled up and shorted to ground in its position:
//!
//! | AUTO pin | MANUAL pin | Mode        |
//! |----------|------------|-------------|
//! | LOW      | HIGH       | Auto        |
//! | HIGH     | LOW        | Manual      |
//! | HIGH     | HIGH       | Calibration |
//! | LOW      | LOW        | (invalid)   |

use crate::control::mode::OperatingMode;
use crate::drivers::hw_init;
use crate::pins;

pub struct ModeSwitch;

impl ModeSwitch {
    pub fn new() -> Self {
        Self
    }

    /// `None` when both contacts are closed at once.
    pub fn read(&self) -> Option<OperatingMode> {
        OperatingMode::from_switches(
            !hw_init::gpio_read(pins::SW_AUTO_GPIO),
            !hw_init::gpio_read(pins::SW_MANUAL_GPIO),
        )
    }
}

impl Default for ModeSwitch {
    fn default() -> Self {
        Self::new()
    }
}
