//! Operating mode selected on the front-panel switch.

use core::fmt;

use serde::Serialize;

/// Which of the three control regimes is active.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
pub enum OperatingMode {
    /// Arbitration engine schedules both motors from the float switches.
    Auto,
    /// Motors start only on operator request; faults still stop them.
    Manual,
    /// Normal control suspended; the calibration routine may run.
    Calibration,
}

impl OperatingMode {
    /// Decode the two selector contacts (`true` = contact closed).
    /// Both closed is not a valid switch position and yields `None`.
    pub fn from_switches(auto_closed: bool, manual_closed: bool) -> Option<Self> {
        match (auto_closed, manual_closed) {
            (true, false) => Some(Self::Auto),
            (false, true) => Some(Self::Manual),
            (false, false) => Some(Self::Calibration),
            (true, true) => None,
        }
    }
}

impl fmt::Display for OperatingMode {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(match self {
            Self::Auto => "AUTO",
            Self::Manual => "MANUAL",
            Self::Calibration => "CALIBRATION",
        })
    }
}
