//! Fade engine: computes per-output targets and walks brightness to them
//! with time-paced, batched property writes.
//!
//! Pacing self-corrects against scheduling jitter: after every frame sleep
//! the step index is recomputed from elapsed wall time on a monotonic
//! clock, so a late wakeup skips ahead instead of stretching the fade. The
//! final step always writes the exact computed target.

use std::collections::BTreeMap;
use std::thread;
use std::time::{Duration, Instant};

use anyhow::{Context, Result, anyhow};

use crate::backend::BacklightBackend;
use crate::output::{OutputFilter, OutputId};
use crate::request::BrightnessRequest;
use crate::resolver::{ReadingSet, resolve};

/// Target value per output in native units, computed once per fade and
/// immutable for its duration.
pub type FadePlan = BTreeMap<OutputId, i32>;

/// Frame rate and wall-clock deadline of a fade.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct FadeTiming {
    /// Frames per second; must be positive.
    pub fps: f64,
    pub duration: Duration,
}

impl FadeTiming {
    pub fn from_fps(fps: f64, duration: Duration) -> Self {
        Self { fps, duration }
    }

    /// Derive the frame rate from a total step count over `duration`.
    pub fn from_steps(steps: u32, duration: Duration) -> Self {
        Self {
            fps: f64::from(steps) / duration.as_secs_f64(),
            duration,
        }
    }

    /// Number of write steps: `round(fps * duration)`, floored at one. A
    /// single step is an immediate jump to the target.
    pub fn step_count(&self) -> u32 {
        let steps = (self.fps * self.duration.as_secs_f64()).round();
        if steps < 1.0 { 1 } else { steps as u32 }
    }

    /// One frame interval.
    pub fn frame_interval(&self) -> Duration {
        Duration::from_secs_f64(1.0 / self.fps)
    }
}

/// Compute the target level for every reading.
///
/// Percentage requests map through `(max - min) * (value + min) / 100`;
/// native-unit requests use the value directly; relative requests add the
/// output's current level. A rounded target at or below the minimum is
/// bumped to `min + 1` unless the caller explicitly asked for absolute
/// zero, so a relative or approximate decrease can never hit the hard
/// floor. The result is clamped into the declared range.
pub fn compute_targets(readings: &ReadingSet, request: &BrightnessRequest) -> FadePlan {
    let rel = if request.relative { 1.0 } else { 0.0 };
    let mut plan = FadePlan::new();
    for (id, range) in readings.iter() {
        let raw = if request.percent {
            f64::from(range.max - range.min) * (request.value + f64::from(range.min)) / 100.0
                + rel * f64::from(range.current)
        } else {
            request.value + rel * f64::from(range.current)
        };
        let mut target = raw.round() as i32;
        if target <= range.min && (request.value != 0.0 || request.relative) {
            target = range.min + 1;
        }
        plan.insert(*id, target.clamp(range.min, range.max));
    }
    plan
}

/// Fade every output in `readings` to the requested level, finishing by
/// `timing.duration`.
///
/// Each step writes all outputs' interpolated levels in one batch and
/// flushes before sleeping, so every output updates in the same frame. A
/// transport error aborts immediately; whatever partial fade was already
/// written stays in place. Returns the exact terminal values written.
pub fn fade(
    backend: &mut dyn BacklightBackend,
    readings: &ReadingSet,
    request: &BrightnessRequest,
    timing: &FadeTiming,
) -> Result<FadePlan> {
    let plan = compute_targets(readings, request);
    if plan.is_empty() {
        return Ok(plan);
    }
    let atom = readings
        .atom()
        .ok_or_else(|| anyhow!("reading set carries no backlight atom"))?;

    let steps = timing.step_count();
    let start = Instant::now();
    let mut step: u32 = 1;
    loop {
        let terminal = step == steps;
        for (id, range) in readings.iter() {
            let target = plan[id];
            let level = interpolated(range.current, target, step, steps);
            backend
                .set_level(id.output, atom, level)
                .context("backlight fade aborted")?;
        }
        backend.flush()?;
        if terminal {
            break;
        }
        thread::sleep(timing.frame_interval());
        // Recompute the step from wall time rather than incrementing, so a
        // late wakeup converges on the deadline instead of drifting.
        let elapsed = start.elapsed().as_secs_f64();
        step = ((elapsed * timing.fps).round() as u32).min(steps);
    }
    Ok(plan)
}

/// Resolve outputs matching `filter`, then fade them. Convenience for
/// callers that don't need the pre-fade readings.
pub fn fade_filtered(
    backend: &mut dyn BacklightBackend,
    filter: &OutputFilter,
    request: &BrightnessRequest,
    timing: &FadeTiming,
) -> Result<FadePlan> {
    let readings = resolve(backend, filter)?;
    fade(backend, &readings, request, timing)
}

fn interpolated(current: i32, target: i32, step: u32, steps: u32) -> i32 {
    (f64::from(current)
        + f64::from(target - current) * f64::from(step) / f64::from(steps))
    .round() as i32
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::backend::fake::{FakeBackend, FakeOutput};
    use crate::output::BrightnessRange;

    const ATOM: u32 = 77;

    fn readings_of(entries: &[(u32, i32, i32, i32)]) -> ReadingSet {
        let mut set = ReadingSet::new(Some(ATOM));
        for &(output, min, current, max) in entries {
            set.insert(
                OutputId { screen: 0, output },
                BrightnessRange { min, current, max },
            );
        }
        set
    }

    fn request(value: f64, relative: bool, percent: bool) -> BrightnessRequest {
        BrightnessRequest {
            value,
            relative,
            percent,
        }
    }

    #[test]
    fn test_absolute_percentage_target() {
        // Range [0, 100000], current 50000, "30" => 30000.
        let readings = readings_of(&[(1, 0, 50_000, 100_000)]);
        let plan = compute_targets(&readings, &request(30.0, false, true));
        assert_eq!(plan[&OutputId { screen: 0, output: 1 }], 30_000);
    }

    #[test]
    fn test_percentage_conversion_adds_min_inside_term() {
        // (max - min) * (value + min) / 100 with min = 10, max = 110.
        let readings = readings_of(&[(1, 10, 60, 110)]);
        let plan = compute_targets(&readings, &request(30.0, false, true));
        assert_eq!(plan[&OutputId { screen: 0, output: 1 }], 40);
    }

    #[test]
    fn test_relative_percentage_adds_current() {
        let readings = readings_of(&[(1, 0, 50, 100)]);
        let plan = compute_targets(&readings, &request(10.0, true, true));
        assert_eq!(plan[&OutputId { screen: 0, output: 1 }], 60);
    }

    #[test]
    fn test_absolute_native_target() {
        let readings = readings_of(&[(1, 0, 50, 100)]);
        let plan = compute_targets(&readings, &request(72.0, false, false));
        assert_eq!(plan[&OutputId { screen: 0, output: 1 }], 72);
    }

    #[test]
    fn test_relative_native_decrease() {
        let readings = readings_of(&[(1, 0, 50, 100)]);
        let plan = compute_targets(&readings, &request(-3.0, true, false));
        assert_eq!(plan[&OutputId { screen: 0, output: 1 }], 47);
    }

    #[test]
    fn test_dead_zone_relative_decrease_stops_above_minimum() {
        let readings = readings_of(&[(1, 0, 5, 100)]);
        let plan = compute_targets(&readings, &request(-50.0, true, true));
        assert_eq!(plan[&OutputId { screen: 0, output: 1 }], 1);
    }

    #[test]
    fn test_dead_zone_nonzero_absolute_stops_above_minimum() {
        // 0.2% of [0, 100] rounds to 0, but the raw request was nonzero.
        let readings = readings_of(&[(1, 0, 50, 100)]);
        let plan = compute_targets(&readings, &request(0.2, false, true));
        assert_eq!(plan[&OutputId { screen: 0, output: 1 }], 1);
    }

    #[test]
    fn test_explicit_absolute_zero_reaches_minimum() {
        let readings = readings_of(&[(1, 0, 50, 100)]);
        let plan = compute_targets(&readings, &request(0.0, false, true));
        assert_eq!(plan[&OutputId { screen: 0, output: 1 }], 0);
    }

    #[test]
    fn test_absolute_native_zero_clamps_to_declared_minimum() {
        // Range [1, 4], "0=": the dead-zone rule does not fire (raw value
        // is zero, not relative) and the target clamps to the floor.
        let readings = readings_of(&[(1, 1, 2, 4)]);
        let plan = compute_targets(&readings, &request(0.0, false, false));
        assert_eq!(plan[&OutputId { screen: 0, output: 1 }], 1);
    }

    #[test]
    fn test_target_clamps_to_maximum() {
        let readings = readings_of(&[(1, 0, 50, 100)]);
        let plan = compute_targets(&readings, &request(250.0, false, false));
        assert_eq!(plan[&OutputId { screen: 0, output: 1 }], 100);
    }

    #[test]
    fn test_step_count_floors_at_one() {
        let timing = FadeTiming::from_fps(30.0, Duration::from_millis(10));
        assert_eq!(timing.step_count(), 1);
        let timing = FadeTiming::from_fps(30.0, Duration::ZERO);
        assert_eq!(timing.step_count(), 1);
    }

    #[test]
    fn test_step_count_rounds_fps_times_duration() {
        let timing = FadeTiming::from_fps(30.0, Duration::from_millis(200));
        assert_eq!(timing.step_count(), 6);
    }

    #[test]
    fn test_timing_from_steps_recovers_step_count() {
        let timing = FadeTiming::from_steps(12, Duration::from_millis(300));
        assert_eq!(timing.step_count(), 12);
        assert!((timing.fps - 40.0).abs() < 1e-9);
    }

    #[test]
    fn test_single_step_fade_writes_target_immediately() {
        let mut backend = FakeBackend::new(vec![ATOM]);
        let readings = readings_of(&[(1, 0, 50, 100)]);
        let timing = FadeTiming::from_fps(30.0, Duration::from_millis(1));
        assert_eq!(timing.step_count(), 1);

        let plan = fade(&mut backend, &readings, &request(30.0, false, true), &timing).unwrap();
        assert_eq!(backend.writes, vec![(1, ATOM, 30)]);
        assert_eq!(backend.flushes, 1);
        assert_eq!(plan[&OutputId { screen: 0, output: 1 }], 30);
    }

    #[test]
    fn test_write_error_aborts_fade() {
        let mut backend = FakeBackend::new(vec![ATOM]);
        backend.fail_writes = true;
        let readings = readings_of(&[(1, 0, 50, 100)]);
        let timing = FadeTiming::from_fps(30.0, Duration::from_millis(1));

        assert!(fade(&mut backend, &readings, &request(30.0, false, true), &timing).is_err());
        assert_eq!(backend.flushes, 0);
    }

    #[test]
    fn test_empty_readings_fade_is_a_no_op() {
        let mut backend = FakeBackend::new(vec![ATOM]);
        let readings = ReadingSet::new(None);
        let timing = FadeTiming::from_fps(30.0, Duration::from_millis(200));

        let plan = fade(&mut backend, &readings, &request(30.0, false, true), &timing).unwrap();
        assert!(plan.is_empty());
        assert!(backend.writes.is_empty());
        assert_eq!(backend.flushes, 0);
    }

    #[test]
    fn test_fade_filtered_resolves_then_fades() {
        let mut backend = FakeBackend::new(vec![ATOM]);
        backend.push_output(FakeOutput {
            screen: 0,
            output: 1,
            atoms: vec![ATOM],
            current: 50,
            range: Some((0, 100)),
        });
        let timing = FadeTiming::from_fps(30.0, Duration::from_millis(1));

        let plan = fade_filtered(
            &mut backend,
            &crate::output::OutputFilter::default(),
            &request(30.0, false, true),
            &timing,
        )
        .unwrap();
        assert_eq!(plan[&OutputId { screen: 0, output: 1 }], 30);
        assert_eq!(backend.last_write_for(1), Some(30));
    }

    #[test]
    fn test_interpolation_hits_target_on_terminal_step() {
        assert_eq!(interpolated(50, 30, 6, 6), 30);
        assert_eq!(interpolated(50, 30, 3, 6), 40);
        assert_eq!(interpolated(0, 0, 1, 1), 0);
    }
}
