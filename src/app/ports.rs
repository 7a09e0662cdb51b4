//! Port traits: the hexagonal boundary between domain logic and the outside world.
//!
//! ```text
//!   Adapter ──▶ Port trait ──▶ ControllerService (domain)
//! ```
//!
//! Driven adapters (meter latch, float switches, selector, relays,
//! indicators, event sinks, storage) implement these traits. The
//! [`ControllerService`](super::service::ControllerService) consumes them
//! via generics, so the domain core never touches hardware directly.

use crate::config::ControllerConfig;
use crate::control::mode::OperatingMode;
use crate::motor::MotorId;
use crate::sensors::{LevelInputs, MeterReading};

// ───────────────────────────────────────────────────────────────
// Sensor ports (driven adapter: hardware → domain)
// ───────────────────────────────────────────────────────────────

/// Latest decoded reading from the shared power meter.
pub trait MeterPort {
    /// Any field may be NaN; the caller sanitises.
    fn read(&mut self) -> MeterReading;
}

/// The three float switches.
pub trait LevelSensorPort {
    fn read_levels(&mut self) -> LevelInputs;
}

/// Front-panel mode selector.
pub trait ModeSelectorPort {
    /// `None` when the contacts are in an invalid combination.
    fn read_mode(&mut self) -> Option<OperatingMode>;
}

// ───────────────────────────────────────────────────────────────
// Actuator ports (driven adapter: domain → hardware)
// ───────────────────────────────────────────────────────────────

/// Motor contactor relays.
///
/// Only the arbitration engine and the calibration routine call this;
/// they are responsible for never closing both relays at once.
pub trait RelayPort {
    fn set_relay(&mut self, motor: MotorId, energized: bool);
}

/// Per-motor status LEDs.
pub trait IndicatorPort {
    fn set_indicator(&mut self, motor: MotorId, lit: bool);
}

/// Everything the control loop touches on the board, in one borrow.
pub trait Plant:
    MeterPort + LevelSensorPort + ModeSelectorPort + RelayPort + IndicatorPort
{
}

impl<T> Plant for T where
    T: MeterPort + LevelSensorPort + ModeSelectorPort + RelayPort + IndicatorPort
{
}

// ───────────────────────────────────────────────────────────────
// Time port
// ───────────────────────────────────────────────────────────────

/// Monotonic milliseconds since boot. Never goes backwards.
pub trait Clock {
    fn now_ms(&self) -> u64;
}

// ───────────────────────────────────────────────────────────────
// Event sink port (driven adapter: domain → logging / telemetry)
// ───────────────────────────────────────────────────────────────

/// The domain emits structured [`AppEvent`](super::events::AppEvent)s
/// through this port. Adapters decide where they go (serial log, display,
/// web page, etc.).
pub trait EventSink {
    fn emit(&mut self, event: &super::events::AppEvent);
}

// ───────────────────────────────────────────────────────────────
// Configuration port (driven adapter: domain ↔ persistent config)
// ───────────────────────────────────────────────────────────────

/// Loads and persists both motors' settings as one record.
///
/// Plausibility repair is the core's job
/// ([`ControllerConfig::repair`]); implementations store what they are
/// given and return what they stored.
pub trait ConfigPort {
    /// [`ConfigError::NotFound`] on first boot.
    fn load(&self) -> Result<ControllerConfig, ConfigError>;

    fn save(&self, config: &ControllerConfig) -> Result<(), ConfigError>;
}

// ───────────────────────────────────────────────────────────────
// Error types
// ───────────────────────────────────────────────────────────────

/// Errors from [`ConfigPort`] operations.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ConfigError {
    /// No config found in storage (first boot).
    NotFound,
    /// Stored config failed deserialization.
    Corrupted,
    /// Generic I/O error from the storage backend.
    IoError,
}

impl core::fmt::Display for ConfigError {
    fn fmt(&self, f: &mut core::fmt::Formatter<'_>) -> core::fmt::Result {
        match self {
            Self::NotFound => write!(f, "config not found"),
            Self::Corrupted => write!(f, "config corrupted"),
            Self::IoError => write!(f, "I/O error"),
        }
    }
}
