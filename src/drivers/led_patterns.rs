//! Status indicator pattern engine.
//!
//! Turns a per-motor [`IndicatorMode`] into a time-varying on/off level.
//! The control loop calls [`BlinkEngine::signal`] every tick and feeds the
//! result to the motor's [`StatusLed`](super::status_led::StatusLed).
//! Each motor owns its own engine so the two indicators never share a
//! toggle timer.
//!
//! ## Patterns
//!
//! | Mode          | Output                                              |
//! |---------------|-----------------------------------------------------|
//! | Idle          | off                                                 |
//! | AwaitingStart | toggle every 500 ms                                 |
//! | Fault         | 6 toggles at 250 ms (three flashes), dark for 2 s   |
//! | Running       | solid on                                            |

use serde::Serialize;

use crate::config::{
    INDICATOR_FAULT_BLINK_MS, INDICATOR_FAULT_PAUSE_MS, INDICATOR_FAULT_TOGGLES,
    INDICATOR_SLOW_BLINK_MS,
};
use crate::safety::FaultCode;

/// What the indicator should communicate for one motor.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
pub enum IndicatorMode {
    Idle,
    AwaitingStart,
    Fault,
    Running,
}

impl IndicatorMode {
    /// Running beats fault, fault beats a pending request.
    pub fn for_motor(running: bool, pending: bool, code: FaultCode) -> Self {
        if running {
            Self::Running
        } else if code.is_fault() {
            Self::Fault
        } else if pending || code == FaultCode::ShouldRun {
            Self::AwaitingStart
        } else {
            Self::Idle
        }
    }
}

/// Non-blocking blink generator. Stack-allocated, no heap.
#[derive(Debug, Default)]
pub struct BlinkEngine {
    mode: Option<IndicatorMode>,
    level: bool,
    last_toggle_ms: u64,
    fault_toggles: u8,
}

impl BlinkEngine {
    pub fn new() -> Self {
        Self::default()
    }

    /// Advance the pattern for `mode` at `now_ms` and return the pin level.
    pub fn signal(&mut self, mode: IndicatorMode, now_ms: u64) -> bool {
        if self.mode != Some(mode) {
            self.mode = Some(mode);
            self.level = false;
            self.last_toggle_ms = now_ms;
            self.fault_toggles = 0;
        }

        let elapsed = now_ms.saturating_sub(self.last_toggle_ms);
        match mode {
            IndicatorMode::Idle => self.level = false,
            IndicatorMode::Running => self.level = true,
            IndicatorMode::AwaitingStart => {
                if elapsed >= INDICATOR_SLOW_BLINK_MS {
                    self.toggle(now_ms);
                }
            }
            IndicatorMode::Fault => {
                if self.fault_toggles < INDICATOR_FAULT_TOGGLES {
                    if elapsed >= INDICATOR_FAULT_BLINK_MS {
                        self.toggle(now_ms);
                        self.fault_toggles += 1;
                    }
                } else {
                    self.level = false;
                    if elapsed > INDICATOR_FAULT_PAUSE_MS {
                        self.fault_toggles = 0;
                    }
                }
            }
        }
        self.level
    }

    pub fn mode(&self) -> Option<IndicatorMode> {
        self.mode
    }

    fn toggle(&mut self, now_ms: u64) {
        self.level = !self.level;
        self.last_toggle_ms = now_ms;
    }
}
