//! TwinPump firmware entry point.
//!
//! Hexagonal architecture with a single polling control loop.
//!
//! ```text
//! ┌────────────────────────────────────────────────────────────────┐
//! │                      Adapters (outer ring)                     │
//! │                                                                │
//! │  BoardHardware        LogEventSink   NvsAdapter   Esp32Clock   │
//! │  (Meter+Levels+Mode   (EventSink)    (Config)     (Clock+Delay)│
//! │   +Relays+Indicators)                                          │
//! │                                                                │
//! │  ──────────────── Port Trait Boundary ───────────────────      │
//! │                                                                │
//! │  ┌────────────────────────────────────────────────────────┐    │
//! │  │          ControllerService (pure logic)                │    │
//! │  │  Classifier · Arbiter · Calibration · Indicators       │    │
//! │  └────────────────────────────────────────────────────────┘    │
//! │                                                                │
//! │  Command queue (UI / web tasks) · Meter latch (meter task)     │
//! └────────────────────────────────────────────────────────────────┘
//! ```
#![deny(unused_must_use)]

use anyhow::Result;
use embedded_hal::delay::DelayNs;
use log::{error, info, warn};

use twinpump::adapters::hardware::BoardHardware;
use twinpump::adapters::log_sink::LogEventSink;
use twinpump::adapters::nvs::NvsAdapter;
use twinpump::adapters::time::Esp32Clock;
use twinpump::app::ports::Clock;
use twinpump::app::queue;
use twinpump::app::service::ControllerService;
use twinpump::drivers::hw_init;

/// Pause between control ticks.
const LOOP_PERIOD_MS: u32 = 100;

fn main() -> Result<()> {
    // ── 1. ESP-IDF bootstrap ──────────────────────────────────
    esp_idf_svc::sys::link_patches();
    esp_idf_logger::init()?;

    info!("╔══════════════════════════════════════╗");
    info!("║  TwinPump v{}                        ║", env!("CARGO_PKG_VERSION"));
    info!("╚══════════════════════════════════════╝");

    // ── 2. Initialise hardware peripherals ────────────────────
    if let Err(e) = hw_init::init_peripherals() {
        // Relays may be floating; refuse to run the loop.
        error!("HAL init failed: {}, halting", e);
        #[allow(clippy::empty_loop)]
        loop {}
    }

    // ── 3. Load settings from NVS (or defaults) ───────────────
    let nvs = NvsAdapter::new().unwrap_or_else(|e| {
        warn!("NVS init failed ({}), running with defaults and no persistence", e);
        NvsAdapter::unbacked()
    });

    let mut clock = Esp32Clock::new();
    let mut sink = LogEventSink::new();
    let mut hw = BoardHardware::new();
    let mut app = ControllerService::boot(&nvs, clock.now_ms(), &mut sink);

    info!("System ready. Entering control loop.");

    // ── 4. Control loop ───────────────────────────────────────
    loop {
        while let Some(cmd) = queue::next() {
            app.handle_command(cmd, &mut hw, &mut clock, &nvs, &mut sink);
        }

        let now_ms = clock.now_ms();
        app.tick(now_ms, &mut hw, &mut sink);

        // Config auto-save (5 s debounce after last change).
        app.auto_save_if_needed(now_ms, &nvs, &mut sink);

        clock.delay_ms(LOOP_PERIOD_MS);
    }
}
