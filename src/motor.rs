//! Motor identity and per-motor runtime bookkeeping.
//!
//! Both pumps share one code path: every per-motor quantity lives in a
//! [`PerMotor`] table indexed by [`MotorId`] instead of parallel
//! bore/sump variables.

use core::fmt;
use core::ops::{Index, IndexMut};

use serde::{Deserialize, Serialize};

use crate::safety::FaultCode;

// ---------------------------------------------------------------------------
// Motor identity
// ---------------------------------------------------------------------------

/// Which physical pump (relay, level sensors, settings record, timers).
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[repr(u8)]
pub enum MotorId {
    Bore = 0,
    Sump = 1,
}

impl MotorId {
    /// Scheduling order: bore first (priority), then sump.
    pub const ALL: [MotorId; 2] = [MotorId::Bore, MotorId::Sump];

    /// The motor competing for the shared line.
    pub const fn other(self) -> Self {
        match self {
            Self::Bore => Self::Sump,
            Self::Sump => Self::Bore,
        }
    }

    pub const fn name(self) -> &'static str {
        match self {
            Self::Bore => "bore",
            Self::Sump => "sump",
        }
    }
}

impl fmt::Display for MotorId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.name())
    }
}

// ---------------------------------------------------------------------------
// Per-motor table
// ---------------------------------------------------------------------------

/// Fixed two-slot table indexed by [`MotorId`].
#[derive(Debug, Clone, Copy, PartialEq, Default, Serialize, Deserialize)]
pub struct PerMotor<T> {
    pub bore: T,
    pub sump: T,
}

impl<T> PerMotor<T> {
    pub const fn new(bore: T, sump: T) -> Self {
        Self { bore, sump }
    }

    /// Build both slots from a constructor.
    pub fn from_fn(mut f: impl FnMut(MotorId) -> T) -> Self {
        Self {
            bore: f(MotorId::Bore),
            sump: f(MotorId::Sump),
        }
    }

    /// Iterate `(id, &value)` in scheduling order.
    pub fn iter(&self) -> impl Iterator<Item = (MotorId, &T)> {
        [(MotorId::Bore, &self.bore), (MotorId::Sump, &self.sump)].into_iter()
    }
}

impl<T> Index<MotorId> for PerMotor<T> {
    type Output = T;

    fn index(&self, id: MotorId) -> &T {
        match id {
            MotorId::Bore => &self.bore,
            MotorId::Sump => &self.sump,
        }
    }
}

impl<T> IndexMut<MotorId> for PerMotor<T> {
    fn index_mut(&mut self, id: MotorId) -> &mut T {
        match id {
            MotorId::Bore => &mut self.bore,
            MotorId::Sump => &mut self.sump,
        }
    }
}

// ---------------------------------------------------------------------------
// Runtime state
// ---------------------------------------------------------------------------

/// Mutable per-motor state. Created once at boot with the motor stopped;
/// written only by the arbitration engine and the fault classifier.
#[derive(Debug, Clone, Copy, PartialEq, Default)]
pub struct MotorRuntimeState {
    pub running: bool,
    /// Monotonic ms of the last start (0 = never).
    pub last_on_ms: u64,
    /// Monotonic ms of the last stop (0 = never).
    pub last_off_ms: u64,
    /// Manual start deferred because the other motor owns the line.
    pub pending_start: bool,
    /// Code returned by the most recent classification.
    pub last_error_code: FaultCode,
    /// Monotonic ms of the most recent full (non-cached) classification.
    pub last_error_ms: u64,
    /// Set on the first classification after a start; `None` while stopped.
    pub stabilization_started_ms: Option<u64>,
}

impl MotorRuntimeState {
    pub fn ms_since_on(&self, now_ms: u64) -> u64 {
        now_ms.saturating_sub(self.last_on_ms)
    }

    pub fn ms_since_off(&self, now_ms: u64) -> u64 {
        now_ms.saturating_sub(self.last_off_ms)
    }
}

/// Read-only view handed to the UI layer.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
pub struct MotorStatus {
    pub running: bool,
    pub pending: bool,
    pub last_on_ms: u64,
    pub last_off_ms: u64,
}

impl From<&MotorRuntimeState> for MotorStatus {
    fn from(s: &MotorRuntimeState) -> Self {
        Self {
            running: s.running,
            pending: s.pending_start,
            last_on_ms: s.last_on_ms,
            last_off_ms: s.last_off_ms,
        }
    }
}
