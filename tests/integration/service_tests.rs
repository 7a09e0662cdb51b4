//! Integration tests for the ControllerService boot, settings and
//! telemetry paths.

use twinpump::app::commands::AppCommand;
use twinpump::app::events::AppEvent;
use twinpump::app::ports::{Clock, ConfigError};
use twinpump::app::queue;
use twinpump::app::service::ControllerService;
use twinpump::config::{ControllerConfig, MotorSettings};
use twinpump::control::mode::OperatingMode;
use twinpump::motor::MotorId;
use twinpump::safety::FaultCode;

use crate::mock_hw::{ManualClock, MemStore, MockPlant, RecordingSink};

// ── Boot ──────────────────────────────────────────────────────

#[test]
fn first_boot_writes_factory_defaults() {
    let store = MemStore::empty();
    let mut sink = RecordingSink::new();
    let app = ControllerService::boot(&store, 0, &mut sink);

    assert_eq!(*app.config(), ControllerConfig::default());
    assert_eq!(store.stored(), Some(ControllerConfig::default()));
    assert!(sink.any(|e| matches!(e, AppEvent::ConfigSaved)));
}

#[test]
fn stored_settings_are_used_verbatim() {
    let mut cfg = ControllerConfig::default();
    cfg.sump.over_current = 3.3;
    cfg.sump.on_time_minutes = 0;
    let store = MemStore::with(cfg);
    let mut sink = RecordingSink::new();
    let app = ControllerService::boot(&store, 0, &mut sink);

    assert_eq!(*app.config(), cfg);
    // Nothing to repair, nothing written back.
    assert_eq!(store.saves.get(), 0);
    // Zero is clamped on read, not rewritten.
    assert_eq!(app.config().sump.on_time_minutes(), 1);
}

#[test]
fn implausible_record_is_reset_and_written_back() {
    let mut cfg = ControllerConfig::default();
    cfg.bore.over_voltage = 400.0;
    cfg.sump.over_current = 2.2;
    let store = MemStore::with(cfg);
    let mut sink = RecordingSink::new();
    let app = ControllerService::boot(&store, 0, &mut sink);

    assert_eq!(app.config().bore, MotorSettings::default());
    assert_eq!(app.config().sump.over_current, 2.2);
    assert_eq!(store.stored(), Some(*app.config()));
    assert_eq!(
        sink.count(|e| matches!(e, AppEvent::ConfigReset(_))),
        1
    );
    assert!(sink.any(|e| matches!(e, AppEvent::ConfigReset(MotorId::Bore))));
}

#[test]
fn corrupted_store_falls_back_to_defaults() {
    let mut store = MemStore::empty();
    store.load_error = Some(ConfigError::Corrupted);
    let mut sink = RecordingSink::new();
    let app = ControllerService::boot(&store, 0, &mut sink);
    assert_eq!(*app.config(), ControllerConfig::default());
}

// ── Settings edits ────────────────────────────────────────────

#[test]
fn settings_update_is_auto_saved_after_quiet_period() {
    let store = MemStore::empty();
    let mut sink = RecordingSink::new();
    let mut app = ControllerService::new(ControllerConfig::default(), 0);
    let mut hw = MockPlant::new(OperatingMode::Auto);
    let mut clock = ManualClock::at(1_000);

    let settings = MotorSettings {
        detect_current: true,
        over_current: 4.0,
        ..MotorSettings::default()
    };
    app.handle_command(
        AppCommand::UpdateSettings { motor: MotorId::Sump, settings },
        &mut hw,
        &mut clock,
        &store,
        &mut sink,
    );
    assert!(app.is_config_dirty());
    assert_eq!(app.config().sump, settings);

    assert!(!app.auto_save_if_needed(5_999, &store, &mut sink));
    assert!(store.stored().is_none());
    assert!(app.auto_save_if_needed(6_000, &store, &mut sink));
    assert!(!app.is_config_dirty());
    assert_eq!(store.stored().map(|c| c.sump), Some(settings));
}

#[test]
fn save_command_persists_immediately() {
    let store = MemStore::empty();
    let mut sink = RecordingSink::new();
    let mut app = ControllerService::new(ControllerConfig::default(), 0);
    let mut hw = MockPlant::new(OperatingMode::Auto);
    let mut clock = ManualClock::at(0);

    app.mark_config_dirty(0);
    app.handle_command(AppCommand::SaveConfig, &mut hw, &mut clock, &store, &mut sink);
    assert!(!app.is_config_dirty());
    assert_eq!(store.saves.get(), 1);
}

// ── Selector ──────────────────────────────────────────────────

#[test]
fn invalid_selector_keeps_previous_mode() {
    let mut sink = RecordingSink::new();
    let mut app = ControllerService::new(ControllerConfig::default(), 0);
    let mut hw = MockPlant::new(OperatingMode::Manual);
    app.tick(0, &mut hw, &mut sink);
    assert_eq!(app.mode(), Some(OperatingMode::Manual));

    hw.mode = None;
    app.tick(1_000, &mut hw, &mut sink);
    assert_eq!(app.mode(), Some(OperatingMode::Manual));
    assert_eq!(
        sink.count(|e| matches!(e, AppEvent::ModeChanged { .. })),
        1
    );
}

// ── Indicators ────────────────────────────────────────────────

#[test]
fn indicators_follow_motor_state() {
    let mut sink = RecordingSink::new();
    let mut app = ControllerService::new(ControllerConfig::default(), 0);
    let mut hw = MockPlant::new(OperatingMode::Manual);
    hw.levels.sump_source_available = false;
    hw.tank_low(MotorId::Bore);
    app.tick(0, &mut hw, &mut sink);
    app.request_manual_start(MotorId::Bore, 0, &mut hw, &mut sink);

    app.tick(100, &mut hw, &mut sink);
    // Running → solid; sump source empty → fault pattern, dark at first.
    assert!(hw.indicators[MotorId::Bore]);
    assert!(!hw.indicators[MotorId::Sump]);
    assert_eq!(app.get_fault_code(MotorId::Sump), FaultCode::SourceEmpty);
    assert_eq!(app.message(MotorId::Sump), "UGT empty");
    app.tick(350, &mut hw, &mut sink);
    assert!(hw.indicators[MotorId::Sump]);
}

#[test]
fn pending_motor_with_dry_source_shows_fault_pattern() {
    let mut sink = RecordingSink::new();
    let mut app = ControllerService::new(ControllerConfig::default(), 0);
    let mut hw = MockPlant::new(OperatingMode::Manual);
    hw.tank_low(MotorId::Bore);
    hw.tank_low(MotorId::Sump);
    app.tick(0, &mut hw, &mut sink);
    app.request_manual_start(MotorId::Bore, 0, &mut hw, &mut sink);
    app.request_manual_start(MotorId::Sump, 0, &mut hw, &mut sink);
    assert!(app.motor_status(MotorId::Sump).pending);

    hw.levels.sump_source_available = false;
    app.tick(100, &mut hw, &mut sink);
    assert_eq!(app.get_fault_code(MotorId::Sump), FaultCode::SourceEmpty);
    assert!(app.motor_status(MotorId::Sump).pending);
    assert!(!hw.indicators[MotorId::Sump]);
    // Fault flashes at 250 ms; the awaiting-start blink would still be dark.
    app.tick(350, &mut hw, &mut sink);
    assert!(hw.indicators[MotorId::Sump]);
}

// ── Telemetry ─────────────────────────────────────────────────

#[test]
fn telemetry_is_emitted_every_five_seconds() {
    let mut sink = RecordingSink::new();
    let mut app = ControllerService::new(ControllerConfig::default(), 0);
    let mut hw = MockPlant::new(OperatingMode::Auto);
    for t in (0..=10_000).step_by(500) {
        app.tick(t, &mut hw, &mut sink);
    }
    let telemetry: Vec<_> = sink
        .events
        .iter()
        .filter_map(|e| match e {
            AppEvent::Telemetry(t) => Some(t),
            _ => None,
        })
        .collect();
    assert_eq!(app.tick_count(), 21);
    assert_eq!(telemetry.len(), 2);
    assert_eq!(telemetry[0].uptime_ms, 5_000);
    assert_eq!(telemetry[0].voltage, 230.0);
    assert_eq!(telemetry[0].mode, Some(OperatingMode::Auto));
    assert_eq!(telemetry[0].sump.message.as_str(), "OK");
}

#[test]
fn nan_meter_reads_as_zero() {
    let mut sink = RecordingSink::new();
    let mut app = ControllerService::new(ControllerConfig::default(), 0);
    let mut hw = MockPlant::new(OperatingMode::Auto);
    hw.meter = twinpump::sensors::MeterReading::INVALID;
    app.tick(0, &mut hw, &mut sink);
    let m = app.measurements();
    assert_eq!((m.voltage, m.current, m.power_factor), (0.0, 0.0, 0.0));
}

// ── Command queue ─────────────────────────────────────────────

#[test]
fn queued_commands_are_drained_in_order() {
    let store = MemStore::empty();
    let mut sink = RecordingSink::new();
    let mut app = ControllerService::new(ControllerConfig::default(), 0);
    let mut hw = MockPlant::new(OperatingMode::Manual);
    hw.tank_low(MotorId::Bore);
    let mut clock = ManualClock::at(0);
    app.tick(clock.now_ms(), &mut hw, &mut sink);

    assert!(queue::submit(AppCommand::RequestStart(MotorId::Bore)));
    assert!(queue::submit(AppCommand::RequestStop(MotorId::Bore)));
    while let Some(cmd) = queue::next() {
        app.handle_command(cmd, &mut hw, &mut clock, &store, &mut sink);
    }
    assert_eq!(
        hw.relay_log,
        vec![(MotorId::Bore, true), (MotorId::Bore, false)]
    );
}
