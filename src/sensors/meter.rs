//! Latest-value latch between the meter task and the control loop.
//!
//! The external meter driver decodes frames on its own task and calls
//! [`publish`]. The control loop samples the latch through
//! [`MeterPort`](crate::app::ports::MeterPort) once per tick, and
//! calibration samples it directly at its own cadence.
//!
//! ```text
//! ┌────────────┐ publish() ┌──────────┐ latest() ┌──────────────┐
//! │ meter task │──────────▶│  latch   │─────────▶│ control loop │
//! └────────────┘           └──────────┘          └──────────────┘
//! ```

use core::cell::Cell;

use embassy_sync::blocking_mutex::Mutex;
use embassy_sync::blocking_mutex::raw::CriticalSectionRawMutex;

use crate::sensors::MeterReading;

static LATEST: Mutex<CriticalSectionRawMutex, Cell<MeterReading>> =
    Mutex::new(Cell::new(MeterReading::INVALID));

/// Store a freshly decoded reading. Callable from any task.
pub fn publish(reading: MeterReading) {
    LATEST.lock(|cell| cell.set(reading));
}

/// Most recent reading; [`MeterReading::INVALID`] before the first publish
/// or after [`invalidate`].
pub fn latest() -> MeterReading {
    LATEST.lock(Cell::get)
}

/// Mark the meter as not answering.
pub fn invalidate() {
    publish(MeterReading::INVALID);
}
