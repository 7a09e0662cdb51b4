//! Scheduling and arbitration through the full `ControllerService::tick`
//! path: selector → inputs → classifier → arbiter → relays.

use twinpump::app::events::{AppEvent, StartTrigger, StopReason};
use twinpump::app::service::ControllerService;
use twinpump::config::ControllerConfig;
use twinpump::control::arbiter::{StartOutcome, StopOutcome};
use twinpump::control::mode::OperatingMode;
use twinpump::motor::MotorId;
use twinpump::safety::FaultCode;

use crate::mock_hw::{MockPlant, RecordingSink};

const BORE: MotorId = MotorId::Bore;
const SUMP: MotorId = MotorId::Sump;

fn service(config: ControllerConfig) -> (ControllerService, RecordingSink) {
    (ControllerService::new(config, 0), RecordingSink::new())
}

// ── Scenario A: bore tank low in AUTO ─────────────────────────

#[test]
fn auto_starts_bore_when_its_tank_is_low() {
    let (mut app, mut sink) = service(ControllerConfig::default());
    let mut hw = MockPlant::new(OperatingMode::Auto);
    hw.tank_low(BORE);

    // Power-on delay (5 s default) holds the start back.
    app.tick(4_000, &mut hw, &mut sink);
    assert_eq!(app.get_fault_code(BORE), FaultCode::ShouldRun);
    assert!(hw.relay_log.is_empty());

    app.tick(5_000, &mut hw, &mut sink);
    assert!(hw.relays[BORE]);
    assert_eq!(hw.relay_log, vec![(BORE, true)]);
    let status = app.motor_status(BORE);
    assert!(status.running);
    assert_eq!(status.last_on_ms, 5_000);
    assert!(sink.any(|e| matches!(
        e,
        AppEvent::MotorStarted { motor: MotorId::Bore, trigger: StartTrigger::Auto }
    )));
}

#[test]
fn auto_stops_bore_when_tank_fills() {
    let (mut app, mut sink) = service(ControllerConfig::default());
    let mut hw = MockPlant::new(OperatingMode::Auto);
    hw.tank_low(BORE);
    app.tick(5_000, &mut hw, &mut sink);
    assert!(hw.relays[BORE]);

    hw.tank_full(BORE);
    app.tick(6_000, &mut hw, &mut sink);
    assert!(!hw.relays[BORE]);
    assert_eq!(app.get_fault_code(BORE), FaultCode::Ok);
    assert_eq!(app.motor_status(BORE).last_off_ms, 6_000);
    assert!(sink.any(|e| matches!(
        e,
        AppEvent::MotorStopped { motor: MotorId::Bore, reason: StopReason::TankFull }
    )));
}

// ── Scenario B: pending sump resolved when bore stops ─────────

#[test]
fn pending_sump_starts_when_bore_stops_on_tank_full() {
    let (mut app, mut sink) = service(ControllerConfig::default());
    let mut hw = MockPlant::new(OperatingMode::Manual);
    hw.tank_low(BORE);
    hw.tank_low(SUMP);
    app.tick(0, &mut hw, &mut sink);

    assert_eq!(
        app.request_manual_start(BORE, 100, &mut hw, &mut sink),
        Some(StartOutcome::Started)
    );
    assert_eq!(
        app.request_manual_start(SUMP, 200, &mut hw, &mut sink),
        Some(StartOutcome::Queued)
    );
    assert!(app.motor_status(SUMP).pending);
    assert!(!hw.relays[SUMP]);

    hw.tank_full(BORE);
    app.tick(1_000, &mut hw, &mut sink);

    assert!(!hw.relays[BORE]);
    assert!(hw.relays[SUMP]);
    assert!(!app.motor_status(SUMP).pending);
    assert_eq!(hw.relay_log, vec![(BORE, true), (BORE, false), (SUMP, true)]);
    assert!(sink.any(|e| matches!(
        e,
        AppEvent::MotorStarted { motor: MotorId::Sump, trigger: StartTrigger::Pending }
    )));
}

#[test]
fn pending_request_is_dropped_if_no_longer_eligible() {
    let (mut app, mut sink) = service(ControllerConfig::default());
    let mut hw = MockPlant::new(OperatingMode::Manual);
    hw.tank_low(BORE);
    hw.tank_low(SUMP);
    app.tick(0, &mut hw, &mut sink);
    app.request_manual_start(BORE, 0, &mut hw, &mut sink);
    app.request_manual_start(SUMP, 0, &mut hw, &mut sink);

    // Sump source runs dry before the line frees up.
    hw.levels.sump_source_available = false;
    hw.tank_full(BORE);
    app.tick(1_000, &mut hw, &mut sink);

    assert!(!hw.relays[SUMP]);
    assert_eq!(app.get_fault_code(SUMP), FaultCode::SourceEmpty);
    // Still parked; it is retried on the next stop.
    assert!(app.motor_status(SUMP).pending);
}

#[test]
fn manual_stop_of_bore_hands_line_to_pending_sump() {
    let (mut app, mut sink) = service(ControllerConfig::default());
    let mut hw = MockPlant::new(OperatingMode::Manual);
    hw.tank_low(BORE);
    hw.tank_low(SUMP);
    app.tick(0, &mut hw, &mut sink);
    app.request_manual_start(BORE, 0, &mut hw, &mut sink);
    app.request_manual_start(SUMP, 0, &mut hw, &mut sink);

    assert_eq!(
        app.request_manual_stop(BORE, 500, &mut hw, &mut sink),
        StopOutcome::Stopped
    );
    assert!(hw.relays[SUMP]);
}

#[test]
fn manual_mode_never_preempts_running_sump() {
    let (mut app, mut sink) = service(ControllerConfig::default());
    let mut hw = MockPlant::new(OperatingMode::Manual);
    hw.tank_low(BORE);
    hw.tank_low(SUMP);
    app.tick(0, &mut hw, &mut sink);

    app.request_manual_start(SUMP, 0, &mut hw, &mut sink);
    assert_eq!(
        app.request_manual_start(BORE, 0, &mut hw, &mut sink),
        Some(StartOutcome::Queued)
    );
    app.tick(1_000, &mut hw, &mut sink);
    assert!(hw.relays[SUMP] && !hw.relays[BORE]);

    app.request_manual_stop(SUMP, 2_000, &mut hw, &mut sink);
    assert!(hw.relays[BORE]);
    assert!(!app.motor_status(BORE).pending);
}

// ── Scenario C: over-current after stabilization ──────────────

#[test]
fn over_current_stops_bore_and_stays_latched_for_two_minutes() {
    let mut config = ControllerConfig::default();
    config.bore.detect_current = true;
    let (mut app, mut sink) = service(config);
    let mut hw = MockPlant::new(OperatingMode::Auto);
    hw.tank_low(BORE);

    app.tick(5_000, &mut hw, &mut sink);
    assert!(hw.relays[BORE]);

    // First classification while running arms the stabilization timer;
    // inrush is ignored for 10 s.
    hw.current(9.0);
    app.tick(6_000, &mut hw, &mut sink);
    app.tick(15_000, &mut hw, &mut sink);
    assert!(hw.relays[BORE]);
    assert_eq!(app.get_fault_code(BORE), FaultCode::ShouldRun);

    app.tick(16_000, &mut hw, &mut sink);
    assert_eq!(app.get_fault_code(BORE), FaultCode::OverCurrent);
    assert!(!hw.relays[BORE]);
    assert!(sink.any(|e| matches!(
        e,
        AppEvent::MotorStopped {
            motor: MotorId::Bore,
            reason: StopReason::Fault(FaultCode::OverCurrent)
        }
    )));

    // Current back to normal: the cached code holds.
    hw.current(0.0);
    app.tick(17_000, &mut hw, &mut sink);
    app.tick(135_000, &mut hw, &mut sink);
    assert_eq!(app.get_fault_code(BORE), FaultCode::OverCurrent);
    assert!(!hw.relays[BORE]);

    // Latch expires two minutes after the fault was recorded.
    app.tick(136_000, &mut hw, &mut sink);
    assert_eq!(app.get_fault_code(BORE), FaultCode::ShouldRun);
    assert!(hw.relays[BORE]);
}

#[test]
fn critical_fault_on_one_motor_freezes_the_other() {
    let mut config = ControllerConfig::default();
    config.bore.detect_current = true;
    let (mut app, mut sink) = service(config);
    let mut hw = MockPlant::new(OperatingMode::Auto);
    hw.tank_low(BORE);
    app.tick(5_000, &mut hw, &mut sink);
    hw.current(9.0);
    app.tick(6_000, &mut hw, &mut sink);
    app.tick(16_000, &mut hw, &mut sink);
    assert_eq!(app.get_fault_code(BORE), FaultCode::OverCurrent);
    assert_eq!(app.get_fault_code(SUMP), FaultCode::Ok);

    // Sump tank drops while the bore is latched: the sump's cached code
    // is returned until its own window runs out.
    hw.current(0.0);
    hw.tank_low(SUMP);
    app.tick(20_000, &mut hw, &mut sink);
    assert_eq!(app.get_fault_code(SUMP), FaultCode::Ok);
    assert!(!hw.relays[SUMP]);
}

// ── Bore priority ─────────────────────────────────────────────

#[test]
fn bore_preempts_running_sump_in_auto() {
    let (mut app, mut sink) = service(ControllerConfig::default());
    let mut hw = MockPlant::new(OperatingMode::Auto);
    hw.tank_low(SUMP);
    app.tick(5_000, &mut hw, &mut sink);
    assert!(hw.relays[SUMP]);

    hw.tank_low(BORE);
    app.tick(6_000, &mut hw, &mut sink);
    assert!(hw.relays[BORE]);
    assert!(!hw.relays[SUMP]);
    assert_eq!(
        hw.relay_log,
        vec![(SUMP, true), (SUMP, false), (BORE, true)]
    );
    assert!(sink.any(|e| matches!(
        e,
        AppEvent::MotorStopped { motor: MotorId::Sump, reason: StopReason::Preempted }
    )));
}

#[test]
fn sump_waits_while_bore_runs_in_auto() {
    let (mut app, mut sink) = service(ControllerConfig::default());
    let mut hw = MockPlant::new(OperatingMode::Auto);
    hw.tank_low(BORE);
    hw.tank_low(SUMP);
    app.tick(5_000, &mut hw, &mut sink);
    assert!(hw.relays[BORE] && !hw.relays[SUMP]);

    hw.tank_full(BORE);
    app.tick(6_000, &mut hw, &mut sink);
    // Bore stops first in the pass, then the sump takes the free line.
    assert!(!hw.relays[BORE] && hw.relays[SUMP]);
}

// ── Cyclic timer ──────────────────────────────────────────────

#[test]
fn cyclic_timer_bounds_on_and_off_periods() {
    let mut config = ControllerConfig::default();
    config.bore.cyclic_timer_enabled = true;
    config.bore.on_time_minutes = 1;
    config.bore.off_time_minutes = 2;
    let (mut app, mut sink) = service(config);
    let mut hw = MockPlant::new(OperatingMode::Auto);
    hw.tank_low(BORE);

    // First start after boot ignores the OFF period.
    app.tick(5_000, &mut hw, &mut sink);
    assert!(hw.relays[BORE]);

    app.tick(64_000, &mut hw, &mut sink);
    assert!(hw.relays[BORE]);
    app.tick(65_000, &mut hw, &mut sink);
    assert!(!hw.relays[BORE]);
    assert!(sink.any(|e| matches!(
        e,
        AppEvent::MotorStopped { motor: MotorId::Bore, reason: StopReason::DutyCycle }
    )));

    app.tick(184_000, &mut hw, &mut sink);
    assert!(!hw.relays[BORE]);
    app.tick(185_000, &mut hw, &mut sink);
    assert!(hw.relays[BORE]);
}

#[test]
fn cyclic_timer_is_ignored_in_manual() {
    let mut config = ControllerConfig::default();
    config.bore.cyclic_timer_enabled = true;
    config.bore.on_time_minutes = 1;
    let (mut app, mut sink) = service(config);
    let mut hw = MockPlant::new(OperatingMode::Manual);
    hw.tank_low(BORE);
    app.tick(0, &mut hw, &mut sink);
    app.request_manual_start(BORE, 0, &mut hw, &mut sink);

    app.tick(120_000, &mut hw, &mut sink);
    assert!(hw.relays[BORE]);
}

// ── Manual requests ───────────────────────────────────────────

#[test]
fn stop_of_stopped_motor_is_a_no_op() {
    let (mut app, mut sink) = service(ControllerConfig::default());
    let mut hw = MockPlant::new(OperatingMode::Manual);
    app.tick(0, &mut hw, &mut sink);
    sink.clear();

    assert_eq!(
        app.request_manual_stop(BORE, 100, &mut hw, &mut sink),
        StopOutcome::NoOp
    );
    assert_eq!(
        app.request_manual_stop(BORE, 200, &mut hw, &mut sink),
        StopOutcome::NoOp
    );
    assert!(hw.relay_log.is_empty());
    assert!(!sink.any(|e| matches!(e, AppEvent::MotorStopped { .. })));
}

#[test]
fn stop_cancels_own_pending_request() {
    let (mut app, mut sink) = service(ControllerConfig::default());
    let mut hw = MockPlant::new(OperatingMode::Manual);
    hw.tank_low(BORE);
    hw.tank_low(SUMP);
    app.tick(0, &mut hw, &mut sink);
    app.request_manual_start(BORE, 0, &mut hw, &mut sink);
    app.request_manual_start(SUMP, 0, &mut hw, &mut sink);

    assert_eq!(
        app.request_manual_stop(SUMP, 100, &mut hw, &mut sink),
        StopOutcome::PendingCancelled
    );
    assert!(!app.motor_status(SUMP).pending);

    hw.tank_full(BORE);
    app.tick(1_000, &mut hw, &mut sink);
    assert!(!hw.relays[SUMP]);
}

#[test]
fn manual_start_rejected_when_tank_already_full() {
    let (mut app, mut sink) = service(ControllerConfig::default());
    let mut hw = MockPlant::new(OperatingMode::Manual);
    app.tick(0, &mut hw, &mut sink);
    assert_eq!(
        app.request_manual_start(BORE, 0, &mut hw, &mut sink),
        Some(StartOutcome::Rejected(FaultCode::Ok))
    );
    assert!(hw.relay_log.is_empty());
}

#[test]
fn manual_start_outside_manual_mode_is_refused() {
    let (mut app, mut sink) = service(ControllerConfig::default());
    let mut hw = MockPlant::new(OperatingMode::Auto);
    hw.tank_low(BORE);
    app.tick(0, &mut hw, &mut sink);

    assert_eq!(app.request_manual_start(BORE, 100, &mut hw, &mut sink), None);
    assert!(hw.relay_log.is_empty());
    assert!(sink.any(|e| matches!(e, AppEvent::StartRejected { motor: MotorId::Bore, .. })));
}

#[test]
fn leaving_manual_clears_pending_requests() {
    let (mut app, mut sink) = service(ControllerConfig::default());
    let mut hw = MockPlant::new(OperatingMode::Manual);
    hw.tank_low(BORE);
    hw.tank_low(SUMP);
    app.tick(0, &mut hw, &mut sink);
    app.request_manual_start(BORE, 0, &mut hw, &mut sink);
    app.request_manual_start(SUMP, 0, &mut hw, &mut sink);

    hw.mode = Some(OperatingMode::Auto);
    app.tick(1_000, &mut hw, &mut sink);
    assert!(!app.motor_status(SUMP).pending);
    assert!(sink.any(|e| matches!(e, AppEvent::PendingCancelled(MotorId::Sump))));
}
