//! Complete per-frame analysis pipeline for one exercise session.
//!
//! This module orchestrates the full data flow from a validated skeleton
//! frame through angle measurement, temporal smoothing, zone
//! classification, repetition counting, and cue selection, with session
//! telemetry accumulated along the way.
//!
//! # Architecture
//!
//! One frame at a time, in a fixed order:
//! 1. **Confidence guard**: reject implausible samples, freeze on
//!    sustained loss
//! 2. **Angle + smoothing**: raw degrees, then a bounded moving average
//! 3. **Zone + repetitions**: hysteretic classification driving the rep
//!    state machine
//! 4. **Cues + telemetry**: prioritized coaching text and session counters
//!
//! All processing is synchronous and O(1) per frame. The analyzer is the
//! single owner of all session-scoped state; the caller drives it from one
//! producer and owns any marshaling to a display thread. There is no I/O
//! and nothing to cancel: a session ends when the caller stops delivering
//! frames.

use crate::confidence::{GuardVerdict, TrackingGuard};
use crate::cues::CueSelector;
use crate::feedback;
use crate::geometry::triple_angle_degrees;
use crate::repetition::RepCounter;
use crate::session::{ControlLabel, SessionTracker};
use crate::smoothing::TemporalSmoother;
use crate::types::{
    AngleState, BodyPart, ConfigError, Exercise, RepState, SessionEvent, SessionFeedback,
    SessionMetrics, SkeletonFrame, TrackingConfig,
};
use crate::zone::ZoneClassifier;

/// Engine-wide tuning knobs, independent of any particular exercise.
#[derive(Debug, Clone)]
pub struct EngineConfig {
    /// Cadence the tracking source delivers frames at (Hz).
    /// Used to convert frame counts into seconds.
    pub frame_rate_hz: f32,

    /// Moving-average window over raw angles, in samples.
    /// 5 samples at 30 Hz keeps added latency under 200 ms.
    pub smoothing_window: usize,

    /// Consecutive invalid frames tolerated before freezing output.
    pub invalid_frame_threshold: u32,

    /// Minimum plausible proximal limb segment length (meters).
    /// Shorter segments indicate a collapsed or occluded skeleton.
    pub min_segment_length_m: f32,
}

impl Default for EngineConfig {
    fn default() -> Self {
        Self {
            frame_rate_hz: 30.0,
            smoothing_window: crate::smoothing::DEFAULT_SMOOTHING_WINDOW,
            invalid_frame_threshold: crate::confidence::DEFAULT_INVALID_FRAME_THRESHOLD,
            min_segment_length_m: crate::confidence::MIN_SEGMENT_LENGTH_M,
        }
    }
}

/// Everything the presentation layer needs after one frame.
#[derive(Debug, Clone)]
pub struct FrameOutput {
    /// Current smoothed angle and zone.
    pub angle: AngleState,
    /// Current repetition progress.
    pub reps: RepState,
    /// New coaching text, present only when it changed this frame.
    pub cue_changed: Option<String>,
    /// False while output is frozen due to sustained tracking loss.
    pub tracking_ok: bool,
    /// Reposition hint, present only while tracking is frozen.
    pub hint: Option<&'static str>,
}

/// Per-session analysis pipeline for one tracked exercise.
///
/// Construct one per exercise selection; call [`reset`](Self::reset) to
/// reuse it for another set of the same exercise.
pub struct ExerciseAnalyzer {
    exercise_name: String,
    body_part: BodyPart,
    config: TrackingConfig,

    // Processing stages
    guard: TrackingGuard,
    smoother: TemporalSmoother,
    zones: ZoneClassifier,
    rep_counter: RepCounter,
    cues: CueSelector,
    session: SessionTracker,

    // Last validated output, held through dropouts and freezes
    angle: AngleState,
    reps: RepState,
}

impl ExerciseAnalyzer {
    /// Build an analyzer for a tracked exercise.
    ///
    /// Fails only on catalog authoring errors in the tracking config;
    /// sensor noise is never an error at this layer.
    pub fn new(
        exercise_name: impl Into<String>,
        body_part: BodyPart,
        config: TrackingConfig,
        engine: EngineConfig,
    ) -> Result<Self, ConfigError> {
        config.validate()?;
        let zones = ZoneClassifier::new(config.target_range, config.rest_angle_deg);
        let initial_angle = AngleState::new(config.rest_angle_deg, zones.current());
        Ok(Self {
            guard: TrackingGuard::new(engine.invalid_frame_threshold, engine.min_segment_length_m),
            smoother: TemporalSmoother::new(engine.smoothing_window),
            rep_counter: RepCounter::new(
                config.hold_seconds,
                config.rep_direction,
                config.rest_angle_deg,
                engine.frame_rate_hz,
            ),
            cues: CueSelector::new(),
            session: SessionTracker::new(engine.frame_rate_hz),
            zones,
            angle: initial_angle,
            reps: RepState::default(),
            exercise_name: exercise_name.into(),
            body_part,
            config,
        })
    }

    /// Build an analyzer for a catalog entry.
    ///
    /// Returns `Ok(None)` for timer-only exercises (no tracking config):
    /// that absence is a meaningful mode handled by the presentation layer,
    /// not an error.
    pub fn for_exercise(
        exercise: &Exercise,
        engine: EngineConfig,
    ) -> Result<Option<Self>, ConfigError> {
        match &exercise.tracking {
            Some(config) => Ok(Some(Self::new(
                exercise.name.clone(),
                exercise.body_part,
                config.clone(),
                engine,
            )?)),
            None => Ok(None),
        }
    }

    /// Process one skeleton frame.
    ///
    /// Invalid samples leave all visible state exactly as it was: the last
    /// validated angle and zone are reported unchanged, and 0° can only
    /// ever come from the angle calculator's degenerate-geometry fallback,
    /// never from a missing sample.
    pub fn process_frame(&mut self, frame: &SkeletonFrame) -> FrameOutput {
        match self.guard.assess(&frame.triple) {
            GuardVerdict::HoldLast | GuardVerdict::Frozen => return self.output(None),
            GuardVerdict::AcceptAfterLoss => self.smoother.reset(),
            GuardVerdict::Accept => {}
        }

        let raw_deg = triple_angle_degrees(&frame.triple);
        self.cues.capture_neutral(&self.config.form_cues, frame);

        let smoothed_deg = self.smoother.smooth(raw_deg);
        let zone = self.zones.update(smoothed_deg);
        self.angle = AngleState::new(smoothed_deg, zone);
        self.reps = self.rep_counter.update(zone, smoothed_deg);
        self.session.update(raw_deg, smoothed_deg, zone);

        let cue_changed = self
            .cues
            .select(zone, &self.config.form_cues, frame, &mut self.session);
        self.output(cue_changed)
    }

    /// Current smoothed angle and zone.
    pub fn angle_state(&self) -> AngleState {
        self.angle
    }

    /// Current repetition progress.
    pub fn rep_state(&self) -> RepState {
        self.reps
    }

    /// Coaching text currently displayed, if any.
    pub fn current_cue(&self) -> Option<&str> {
        self.cues.current()
    }

    /// False while output is frozen due to sustained tracking loss.
    pub fn tracking_ok(&self) -> bool {
        !self.guard.is_frozen()
    }

    /// Reposition hint, present only while tracking is frozen.
    pub fn tracking_hint(&self) -> Option<&'static str> {
        self.guard.hint()
    }

    /// Snapshot of the session counters.
    pub fn metrics(&self) -> SessionMetrics {
        self.session.metrics()
    }

    /// The ordered session event log.
    pub fn events(&self) -> &[SessionEvent] {
        self.session.events()
    }

    /// Fraction of frames spent in the target zone, in [0, 1].
    pub fn quality_score(&self) -> f32 {
        self.session.quality_score()
    }

    /// Smoothness of motion, in [0, 1].
    pub fn control_rating(&self) -> f32 {
        self.session.control_rating()
    }

    /// Qualitative label for the control rating.
    pub fn control_label(&self) -> ControlLabel {
        self.session.control_label()
    }

    /// Synthesize end-of-session feedback from the accumulated telemetry.
    pub fn generate_feedback(&self) -> SessionFeedback {
        feedback::feedback_from_tracker(
            &self.exercise_name,
            self.body_part,
            self.config.target_range,
            &self.session,
        )
    }

    /// Clear all session-scoped accumulation for reuse.
    ///
    /// Must not be interleaved with an in-flight `process_frame`; the
    /// `&mut self` receiver enforces the single-writer discipline.
    pub fn reset(&mut self) {
        self.guard.reset();
        self.smoother.reset();
        self.zones.reset();
        self.rep_counter.reset();
        self.cues.reset();
        self.session.reset();
        self.angle = AngleState::new(self.config.rest_angle_deg, self.zones.current());
        self.reps = RepState::default();
    }

    fn output(&self, cue_changed: Option<String>) -> FrameOutput {
        FrameOutput {
            angle: self.angle,
            reps: self.reps,
            cue_changed,
            tracking_ok: !self.guard.is_frozen(),
            hint: self.guard.hint(),
        }
    }
}
