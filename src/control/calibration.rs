//! Self-calibration routine.
//!
//! Runs one motor on its own for a fixed warm-up, samples the shared
//! meter, and derives that motor's protection thresholds from the
//! averages. Blocking from start to finish: the caller only enters it
//! with the selector in the calibration position, where normal
//! scheduling is suspended.
//!
//! On success the new settings are returned; persisting them is the
//! caller's job. On any abort the relay is left open and nothing is
//! written.

use embedded_hal::delay::DelayNs;
use log::{info, warn};

use crate::app::events::{AppEvent, CalibrationStep, StartTrigger, StopReason};
use crate::app::ports::{Clock, EventSink, MeterPort, RelayPort};
use crate::config::{
    CALIBRATION_MARGIN, CALIBRATION_MIN_POWER_FACTOR, CALIBRATION_MIN_UNDER_CURRENT,
    CALIBRATION_MIN_UNDER_VOLTAGE, CALIBRATION_SAMPLE_SPACING_MS, CALIBRATION_SAMPLES,
    CALIBRATION_WARMUP_MS, MotorSettings,
};
use crate::control::arbiter::Arbiter;
use crate::error::{CalibrationError, Result};
use crate::motor::MotorId;

/// Mean of the calibration samples.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct CalibrationAverages {
    pub voltage: f32,
    pub current: f32,
    pub power_factor: f32,
}

/// Thresholds at ±[`CALIBRATION_MARGIN`] around the averages, with floors
/// on the lower bounds. Both duty-cycle periods are forced to one minute
/// so the new thresholds get exercised quickly. Everything else is kept.
pub fn derive_settings(base: &MotorSettings, avg: &CalibrationAverages) -> MotorSettings {
    let up = 1.0 + CALIBRATION_MARGIN;
    let down = 1.0 - CALIBRATION_MARGIN;
    MotorSettings {
        min_power_factor: (avg.power_factor * down).max(CALIBRATION_MIN_POWER_FACTOR),
        over_current: avg.current * up,
        under_current: (avg.current * down).max(CALIBRATION_MIN_UNDER_CURRENT),
        over_voltage: avg.voltage * up,
        under_voltage: (avg.voltage * down).max(CALIBRATION_MIN_UNDER_VOLTAGE),
        on_time_minutes: 1,
        off_time_minutes: 1,
        ..*base
    }
}

/// Run the full procedure for `motor`.
///
/// 1. Refuse unless both motors' latest codes are below `SourceEmpty`.
///    The refusal touches nothing.
/// 2. Stop both motors (no pending resolution).
/// 3. Energise `motor` and wait out the warm-up.
/// 4. Take [`CALIBRATION_SAMPLES`] readings [`CALIBRATION_SAMPLE_SPACING_MS`]
///    apart; a NaN aborts with the relay open.
/// 5. Open the relay and return the derived settings.
pub fn run(
    motor: MotorId,
    base: &MotorSettings,
    arbiter: &mut Arbiter,
    hw: &mut (impl MeterPort + RelayPort),
    timer: &mut (impl Clock + DelayNs),
    sink: &mut impl EventSink,
) -> Result<MotorSettings> {
    let bore = arbiter.fault_code(MotorId::Bore);
    let sump = arbiter.fault_code(MotorId::Sump);
    if bore.is_fault() || sump.is_fault() {
        warn!("calibration({motor}): refused, bore={bore} sump={sump}");
        return Err(CalibrationError::SourceFault { bore, sump }.into());
    }

    arbiter.halt_all(StopReason::Calibration, timer.now_ms(), hw, sink);
    arbiter.start_motor(motor, StartTrigger::Calibration, timer.now_ms(), hw, sink)?;
    info!("calibration({motor}): warm-up {} s", CALIBRATION_WARMUP_MS / 1000);

    let warmup_secs = (CALIBRATION_WARMUP_MS / 1000) as u32;
    for remaining_secs in (1..=warmup_secs).rev() {
        sink.emit(&AppEvent::CalibrationProgress {
            motor,
            step: CalibrationStep::WarmingUp { remaining_secs },
        });
        timer.delay_ms(1000);
    }

    let mut sum = CalibrationAverages {
        voltage: 0.0,
        current: 0.0,
        power_factor: 0.0,
    };
    for index in 0..CALIBRATION_SAMPLES {
        sink.emit(&AppEvent::CalibrationProgress {
            motor,
            step: CalibrationStep::Sampling { index },
        });
        let r = hw.read();
        if !r.is_valid() {
            warn!("calibration({motor}): NaN at sample {index}, aborting");
            arbiter.halt(motor, StopReason::Calibration, timer.now_ms(), hw, sink);
            return Err(CalibrationError::InvalidSample { index }.into());
        }
        sum.voltage += r.voltage;
        sum.current += r.current;
        sum.power_factor += r.power_factor;
        timer.delay_ms(CALIBRATION_SAMPLE_SPACING_MS);
    }

    arbiter.halt(motor, StopReason::Calibration, timer.now_ms(), hw, sink);

    let n = CALIBRATION_SAMPLES as f32;
    let avg = CalibrationAverages {
        voltage: sum.voltage / n,
        current: sum.current / n,
        power_factor: sum.power_factor / n,
    };
    let derived = derive_settings(base, &avg);
    info!(
        "calibration({motor}): V={:.1} I={:.2} PF={:.2} -> OV={:.1} UV={:.1} OC={:.2} UC={:.2} PF_min={:.2}",
        avg.voltage,
        avg.current,
        avg.power_factor,
        derived.over_voltage,
        derived.under_voltage,
        derived.over_current,
        derived.under_current,
        derived.min_power_factor,
    );
    Ok(derived)
}
