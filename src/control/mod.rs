//! Motor control: operating mode, arbitration engine and calibration.

pub mod arbiter;
pub mod calibration;
pub mod mode;
