//! GPIO / peripheral pin assignments for the TwinPump controller board.
//!
//! Single source of truth: every driver references this module rather than
//! hard-coding pin numbers.  Change a pin here and it propagates everywhere.

// ---------------------------------------------------------------------------
// Float switches (INPUT_PULLUP, HIGH = float raised)
// ---------------------------------------------------------------------------

/// Bore overhead tank float. HIGH = tank full.
pub const FLOAT_BORE_OHT_GPIO: i32 = 18;
/// Sump underground tank float. HIGH = source water available.
pub const FLOAT_SUMP_UGT_GPIO: i32 = 12;
/// Sump overhead tank float. HIGH = tank full.
pub const FLOAT_SUMP_OHT_GPIO: i32 = 13;

// ---------------------------------------------------------------------------
// Motor contactor relays (active HIGH)
// ---------------------------------------------------------------------------

pub const BORE_RELAY_GPIO: i32 = 4;
pub const SUMP_RELAY_GPIO: i32 = 19;

// ---------------------------------------------------------------------------
// Per-motor status LEDs (active HIGH)
// ---------------------------------------------------------------------------

pub const BORE_STATUS_LED_GPIO: i32 = 14;
pub const SUMP_STATUS_LED_GPIO: i32 = 2;

// ---------------------------------------------------------------------------
// Operating-mode selector (three-position switch, active LOW with pull-ups)
// ---------------------------------------------------------------------------

/// LOW when the selector is in the AUTO position.
pub const SW_AUTO_GPIO: i32 = 33;
/// LOW when the selector is in the MANUAL position.
pub const SW_MANUAL_GPIO: i32 = 32;
