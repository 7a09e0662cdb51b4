//! Application core: pure domain logic, zero I/O.
//!
//! This module contains the business rules for the TwinPump controller:
//! mode handling, arbitration, calibration orchestration, indicator
//! selection and settings persistence policy. All interaction with
//! hardware happens through **port traits** defined in [`ports`], keeping
//! this layer fully testable without real peripherals.

pub mod commands;
pub mod events;
pub mod ports;
pub mod queue;
pub mod service;
