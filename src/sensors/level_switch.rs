//! Float level switches for the two overhead tanks and the sump source.
//!
//! Each float closes to ground when lowered and is wired to a pull-up
//! input, so a HIGH level means the float is raised (tank full / source
//! water present). No debouncing is performed here.
//!
//! ## Dual-target design
//!
//! On ESP-IDF: reads real GPIO levels via hw_init helpers.
//! On host/test: reads the simulated level mask.

use crate::drivers::hw_init;
use crate::pins;
use crate::sensors::LevelInputs;

pub struct LevelSwitches {
    last: LevelInputs,
}

impl LevelSwitches {
    pub fn new() -> Self {
        Self {
            last: LevelInputs::default(),
        }
    }

    pub fn read(&mut self) -> LevelInputs {
        self.last = LevelInputs {
            bore_tank_full: hw_init::gpio_read(pins::FLOAT_BORE_OHT_GPIO),
            sump_source_available: hw_init::gpio_read(pins::FLOAT_SUMP_UGT_GPIO),
            sump_tank_full: hw_init::gpio_read(pins::FLOAT_SUMP_OHT_GPIO),
        };
        self.last
    }

    /// Levels from the most recent [`read`](Self::read).
    pub fn last(&self) -> LevelInputs {
        self.last
    }
}

impl Default for LevelSwitches {
    fn default() -> Self {
        Self::new()
    }
}
