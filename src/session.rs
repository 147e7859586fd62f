//! Per-session telemetry accumulation and quality scoring.
//!
//! The tracker owns the session's running counters and its append-only
//! event log. It is driven once per valid frame by the pipeline and is the
//! single source the feedback synthesizer reads at session end.
//!
//! Ratio computations are explicitly guarded: a session with zero or one
//! frame yields the documented defaults (quality 0, control 1.0) rather
//! than dividing by zero.

use std::collections::HashSet;

use tracing::debug;

use crate::types::{SessionEvent, SessionMetrics, Zone};

/// Continuous in-target time that earns a `GoodFormHeld` event, in seconds.
pub const GOOD_FORM_STREAK_SECONDS: f32 = 2.0;

/// Mean per-frame jitter (degrees) treated as full-scale roughness; at or
/// above this the control rating bottoms out at 0.
pub const JITTER_FULL_SCALE_DEG: f32 = 15.0;

/// Qualitative label for a control rating.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ControlLabel {
    Excellent,
    Good,
    Fair,
    KeepPracticing,
}

impl ControlLabel {
    /// Boundaries are inclusive: 0.8 is Excellent, 0.6 is Good, 0.4 is Fair.
    pub fn from_rating(rating: f32) -> Self {
        if rating >= 0.8 {
            ControlLabel::Excellent
        } else if rating >= 0.6 {
            ControlLabel::Good
        } else if rating >= 0.4 {
            ControlLabel::Fair
        } else {
            ControlLabel::KeepPracticing
        }
    }

    pub fn as_str(&self) -> &'static str {
        match self {
            ControlLabel::Excellent => "Excellent",
            ControlLabel::Good => "Good",
            ControlLabel::Fair => "Fair",
            ControlLabel::KeepPracticing => "Keep practicing",
        }
    }
}

/// Running counters and event log for one session.
#[derive(Debug, Clone)]
pub struct SessionTracker {
    frame_rate_hz: f32,
    metrics: SessionMetrics,
    events: Vec<SessionEvent>,
    seen_cheat_joints: HashSet<String>,

    prev_raw_deg: Option<f32>,
    streak_frames: u32,
    streak_reported: bool,
}

impl SessionTracker {
    pub fn new(frame_rate_hz: f32) -> Self {
        Self {
            frame_rate_hz: frame_rate_hz.max(1.0),
            metrics: SessionMetrics::default(),
            events: Vec::new(),
            seen_cheat_joints: HashSet::new(),
            prev_raw_deg: None,
            streak_frames: 0,
            streak_reported: false,
        }
    }

    /// Accumulate one valid frame's telemetry.
    ///
    /// Jitter is measured on the raw, unsmoothed angle so the smoother
    /// cannot hide a shaky movement; best angle is taken from the smoothed
    /// signal so a single noise spike cannot claim the record.
    pub fn update(&mut self, raw_deg: f32, smoothed_deg: f32, zone: Zone) {
        self.metrics.total_frames += 1;

        if let Some(prev) = self.prev_raw_deg {
            self.metrics.jitter_accumulated += (raw_deg - prev).abs();
        }
        self.prev_raw_deg = Some(raw_deg);

        self.metrics.best_angle_deg = self.metrics.best_angle_deg.max(smoothed_deg);

        if zone == Zone::Target {
            self.metrics.frames_in_good_form += 1;
            self.streak_frames += 1;
            let streak_seconds = self.streak_frames as f32 / self.frame_rate_hz;
            if streak_seconds >= GOOD_FORM_STREAK_SECONDS && !self.streak_reported {
                debug!(seconds = streak_seconds, "good-form streak reached");
                self.events.push(SessionEvent::GoodFormHeld {
                    seconds: streak_seconds,
                });
                self.streak_reported = true;
            }
        } else {
            self.streak_frames = 0;
            self.streak_reported = false;
        }

        self.metrics.good_form_seconds =
            self.metrics.frames_in_good_form as f32 / self.frame_rate_hz;
    }

    /// Record a compensation event for the given joint.
    ///
    /// Deduplicated via a set of already-seen joint names: each distinct
    /// joint is logged at most once per session. Returns true if the event
    /// was appended.
    pub fn record_cheat(&mut self, joint: &str) -> bool {
        if self.seen_cheat_joints.insert(joint.to_string()) {
            self.events.push(SessionEvent::CheatDetected {
                joint: joint.to_string(),
            });
            true
        } else {
            false
        }
    }

    /// Snapshot of the running counters.
    pub fn metrics(&self) -> SessionMetrics {
        self.metrics
    }

    /// The ordered session event log.
    pub fn events(&self) -> &[SessionEvent] {
        &self.events
    }

    /// Fraction of frames spent in the target zone, in [0, 1].
    /// 0 when no frames have been processed.
    pub fn quality_score(&self) -> f32 {
        if self.metrics.total_frames == 0 {
            0.0
        } else {
            self.metrics.frames_in_good_form as f32 / self.metrics.total_frames as f32
        }
    }

    /// Smoothness of motion, in [0, 1]. 1.0 for sessions of at most one
    /// frame (no movement to judge).
    pub fn control_rating(&self) -> f32 {
        if self.metrics.total_frames <= 1 {
            return 1.0;
        }
        let mean_jitter =
            self.metrics.jitter_accumulated / (self.metrics.total_frames - 1) as f32;
        (1.0 - mean_jitter / JITTER_FULL_SCALE_DEG).clamp(0.0, 1.0)
    }

    /// Qualitative label for the current control rating.
    pub fn control_label(&self) -> ControlLabel {
        ControlLabel::from_rating(self.control_rating())
    }

    /// Discard all accumulation for reuse across exercises.
    pub fn reset(&mut self) {
        self.metrics = SessionMetrics::default();
        self.events.clear();
        self.seen_cheat_joints.clear();
        self.prev_raw_deg = None;
        self.streak_frames = 0;
        self.streak_reported = false;
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use approx::assert_relative_eq;

    #[test]
    fn test_quality_score_zero_without_frames() {
        let tracker = SessionTracker::new(30.0);
        assert_eq!(tracker.quality_score(), 0.0);
    }

    #[test]
    fn test_control_rating_defaults_to_one_for_tiny_sessions() {
        let mut tracker = SessionTracker::new(30.0);
        assert_eq!(tracker.control_rating(), 1.0);
        tracker.update(90.0, 90.0, Zone::Target);
        assert_eq!(tracker.control_rating(), 1.0);
    }

    #[test]
    fn test_quality_score_counts_target_frames() {
        let mut tracker = SessionTracker::new(30.0);
        for _ in 0..8 {
            tracker.update(90.0, 90.0, Zone::Target);
        }
        for _ in 0..2 {
            tracker.update(60.0, 60.0, Zone::BelowTarget);
        }
        assert_relative_eq!(tracker.quality_score(), 0.8, epsilon = 1e-6);
        let metrics = tracker.metrics();
        assert_eq!(metrics.total_frames, 10);
        assert_eq!(metrics.frames_in_good_form, 8);
    }

    #[test]
    fn test_jitter_accumulates_on_raw_angle() {
        let mut tracker = SessionTracker::new(30.0);
        tracker.update(80.0, 80.0, Zone::Target);
        tracker.update(95.0, 85.0, Zone::Target);
        tracker.update(85.0, 86.0, Zone::Target);
        // |95−80| + |85−95| = 25
        assert_relative_eq!(tracker.metrics().jitter_accumulated, 25.0, epsilon = 1e-4);
        // mean jitter 12.5 over full scale 15 → rating 1 − 12.5/15
        assert_relative_eq!(tracker.control_rating(), 1.0 - 12.5 / 15.0, epsilon = 1e-5);
    }

    #[test]
    fn test_best_angle_uses_smoothed_signal() {
        let mut tracker = SessionTracker::new(30.0);
        tracker.update(120.0, 95.0, Zone::Target);
        tracker.update(90.0, 96.0, Zone::Target);
        assert_relative_eq!(tracker.metrics().best_angle_deg, 96.0, epsilon = 1e-5);
    }

    #[test]
    fn test_control_label_boundaries_are_inclusive() {
        assert_eq!(ControlLabel::from_rating(0.8), ControlLabel::Excellent);
        assert_eq!(ControlLabel::from_rating(0.79), ControlLabel::Good);
        assert_eq!(ControlLabel::from_rating(0.6), ControlLabel::Good);
        assert_eq!(ControlLabel::from_rating(0.59), ControlLabel::Fair);
        assert_eq!(ControlLabel::from_rating(0.4), ControlLabel::Fair);
        assert_eq!(ControlLabel::from_rating(0.39), ControlLabel::KeepPracticing);
    }

    #[test]
    fn test_good_form_event_once_per_streak() {
        let mut tracker = SessionTracker::new(30.0);
        // 2 s at 30 Hz = 60 frames; run 90 to confirm a single event.
        for _ in 0..90 {
            tracker.update(90.0, 90.0, Zone::Target);
        }
        let holds = tracker
            .events()
            .iter()
            .filter(|e| matches!(e, SessionEvent::GoodFormHeld { .. }))
            .count();
        assert_eq!(holds, 1);

        // Break the streak, hold again: second event.
        tracker.update(50.0, 50.0, Zone::BelowTarget);
        for _ in 0..60 {
            tracker.update(90.0, 90.0, Zone::Target);
        }
        let holds = tracker
            .events()
            .iter()
            .filter(|e| matches!(e, SessionEvent::GoodFormHeld { .. }))
            .count();
        assert_eq!(holds, 2);
    }

    #[test]
    fn test_cheat_events_deduplicated_per_joint() {
        let mut tracker = SessionTracker::new(30.0);
        assert!(tracker.record_cheat("shoulder"));
        assert!(!tracker.record_cheat("shoulder"));
        assert!(tracker.record_cheat("hip"));
        let cheats = tracker
            .events()
            .iter()
            .filter(|e| matches!(e, SessionEvent::CheatDetected { .. }))
            .count();
        assert_eq!(cheats, 2);
    }

    #[test]
    fn test_scores_stay_in_unit_interval() {
        let mut tracker = SessionTracker::new(30.0);
        // Wildly jittery input.
        for i in 0..50 {
            let raw = if i % 2 == 0 { 0.0 } else { 180.0 };
            tracker.update(raw, 90.0, Zone::BelowTarget);
        }
        assert!((0.0..=1.0).contains(&tracker.quality_score()));
        assert!((0.0..=1.0).contains(&tracker.control_rating()));
        assert_eq!(tracker.control_label(), ControlLabel::KeepPracticing);
    }

    #[test]
    fn test_reset_clears_everything() {
        let mut tracker = SessionTracker::new(30.0);
        for _ in 0..70 {
            tracker.update(90.0, 90.0, Zone::Target);
        }
        tracker.record_cheat("shoulder");
        tracker.reset();
        assert_eq!(tracker.metrics(), SessionMetrics::default());
        assert!(tracker.events().is_empty());
        // Dedup set cleared: the same joint can be reported again.
        assert!(tracker.record_cheat("shoulder"));
    }
}
