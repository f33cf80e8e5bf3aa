//! Timeline Controller Tests
//!
//! Tests for:
//! - seek clamping and non-finite repair
//! - play/pause state transitions and position retention
//! - tick stepping, end-of-range clamping and auto-stop
//! - advance() accumulator cadence

use organoid_review::review::{DEFAULT_STEP, Playback, Timeline};

const EPSILON: f32 = 1e-5;

fn approx(a: f32, b: f32) -> bool {
    (a - b).abs() < EPSILON
}

// ============================================================================
// Seek
// ============================================================================

#[test]
fn seek_clamps_above_range() {
    let mut timeline = Timeline::new();
    timeline.seek(1.7);
    assert!(
        (timeline.position() - 1.0).abs() < f32::EPSILON,
        "seek(1.7) should clamp to 1.0, got {}",
        timeline.position()
    );
}

#[test]
fn seek_clamps_below_range() {
    let mut timeline = Timeline::new();
    timeline.seek(0.5);
    timeline.seek(-0.3);
    assert!(
        timeline.position().abs() < f32::EPSILON,
        "seek(-0.3) should clamp to 0.0, got {}",
        timeline.position()
    );
}

#[test]
fn seek_repairs_non_finite_input() {
    let mut timeline = Timeline::new();
    timeline.seek(0.5);
    timeline.seek(f32::NAN);
    assert!(approx(timeline.position(), 0.0), "NaN should default to 0");

    timeline.seek(0.5);
    timeline.seek(f32::INFINITY);
    assert!(approx(timeline.position(), 0.0), "inf should default to 0");
}

#[test]
fn seek_keeps_playback_state() {
    let mut timeline = Timeline::new();
    timeline.play();
    timeline.seek(0.5);
    assert_eq!(timeline.state(), Playback::Playing);

    timeline.pause();
    timeline.seek(0.7);
    assert_eq!(timeline.state(), Playback::Stopped);
}

// ============================================================================
// Play / pause
// ============================================================================

#[test]
fn play_starts_from_current_position() {
    let mut timeline = Timeline::new();
    timeline.seek(0.4);
    timeline.play();
    assert_eq!(timeline.state(), Playback::Playing);
    assert!(
        approx(timeline.position(), 0.4),
        "play must not rewind the position"
    );
}

#[test]
fn play_is_noop_while_playing() {
    let mut timeline = Timeline::new().with_step(0.1).with_tick_interval(0.01);
    timeline.play();
    timeline.advance(0.015);
    let before = timeline.position();

    timeline.play();
    assert_eq!(timeline.state(), Playback::Playing);
    assert!(
        approx(timeline.position(), before),
        "repeated play must not reset anything"
    );
}

#[test]
fn pause_retains_position() {
    let mut timeline = Timeline::new();
    timeline.seek(0.6);
    timeline.play();
    timeline.pause();
    assert_eq!(timeline.state(), Playback::Stopped);
    assert!(approx(timeline.position(), 0.6));
}

// ============================================================================
// Ticking
// ============================================================================

#[test]
fn tick_advances_by_step() {
    let mut timeline = Timeline::new().with_step(0.1);
    timeline.play();
    timeline.tick();
    assert!(approx(timeline.position(), 0.1));
    timeline.tick();
    assert!(approx(timeline.position(), 0.2));
}

#[test]
fn tick_is_inert_while_stopped() {
    let mut timeline = Timeline::new().with_step(0.1);
    timeline.seek(0.3);
    timeline.tick();
    assert!(approx(timeline.position(), 0.3), "no auto-advance when stopped");
}

#[test]
fn reaching_end_clamps_to_one_and_stops() {
    let mut timeline = Timeline::new().with_step(0.01);
    timeline.seek(0.97);
    timeline.play();

    for _ in 0..3 {
        timeline.tick();
        assert!(timeline.position() <= 1.0, "position must never exceed 1.0");
    }

    assert!(
        (timeline.position() - 1.0).abs() < f32::EPSILON,
        "expected exactly 1.0, got {}",
        timeline.position()
    );
    assert_eq!(timeline.state(), Playback::Stopped, "end of range auto-stops");
}

#[test]
fn end_clamp_is_exact_from_any_offset() {
    let mut timeline = Timeline::new().with_step(0.01);
    timeline.seek(0.999);
    timeline.play();
    timeline.tick();
    assert!((timeline.position() - 1.0).abs() < f32::EPSILON);
    assert_eq!(timeline.state(), Playback::Stopped);
}

#[test]
fn no_looping_after_end() {
    let mut timeline = Timeline::new().with_step(0.01);
    timeline.seek(0.995);
    timeline.play();
    timeline.tick();
    assert_eq!(timeline.state(), Playback::Stopped);

    // Further ticks and even play() stay pinned at the end
    timeline.tick();
    assert!((timeline.position() - 1.0).abs() < f32::EPSILON);
    timeline.play();
    timeline.tick();
    assert!(
        (timeline.position() - 1.0).abs() < f32::EPSILON,
        "position 1.0 + step must clamp straight back to 1.0"
    );
}

// ============================================================================
// Wall-time accumulation
// ============================================================================

#[test]
fn advance_fires_whole_ticks_only() {
    let mut timeline = Timeline::new().with_step(0.1).with_tick_interval(0.01);
    timeline.play();

    timeline.advance(0.035);
    assert!(
        approx(timeline.position(), 0.3),
        "35ms at a 10ms cadence is 3 ticks, got {}",
        timeline.position()
    );
}

#[test]
fn advance_carries_the_remainder() {
    let mut timeline = Timeline::new().with_step(0.1).with_tick_interval(0.01);
    timeline.play();

    timeline.advance(0.005);
    assert!(approx(timeline.position(), 0.0), "half an interval is no tick");

    timeline.advance(0.005);
    assert!(
        approx(timeline.position(), 0.1),
        "two halves make one tick, got {}",
        timeline.position()
    );
}

#[test]
fn advance_is_inert_while_stopped() {
    let mut timeline = Timeline::new().with_step(0.1).with_tick_interval(0.01);
    timeline.seek(0.2);
    timeline.advance(1.0);
    assert!(approx(timeline.position(), 0.2));
}

#[test]
fn advance_ignores_bad_dt() {
    let mut timeline = Timeline::new().with_step(0.1).with_tick_interval(0.01);
    timeline.play();
    timeline.advance(f32::NAN);
    timeline.advance(-1.0);
    assert!(approx(timeline.position(), 0.0));
    assert_eq!(timeline.state(), Playback::Playing);
}

#[test]
fn full_run_reaches_end_and_stops() {
    // Default cadence: 0.0005 per 10ms tick, 20 seconds end to end
    let mut timeline = Timeline::new();
    timeline.play();
    timeline.advance(25.0);

    assert!((timeline.position() - 1.0).abs() < f32::EPSILON);
    assert_eq!(timeline.state(), Playback::Stopped);
}

// ============================================================================
// Configuration validation
// ============================================================================

#[test]
fn invalid_step_falls_back_to_default() {
    let timeline = Timeline::new().with_step(-0.5);
    assert!(approx(timeline.step(), DEFAULT_STEP));

    let timeline = Timeline::new().with_step(f32::NAN);
    assert!(approx(timeline.step(), DEFAULT_STEP));
}
