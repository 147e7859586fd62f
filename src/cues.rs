//! Real-time coaching cue selection.
//!
//! Evaluates the exercise's ordered cue list against the current frame in
//! strict priority order:
//!
//! 1. Compensation: a watched secondary joint drifted past its allowed
//!    deviation from its neutral position (the user is substituting a
//!    different muscle group). Also records a `CheatDetected` event.
//! 2. Zone match: the first cue declared for the current zone.
//! 3. Fallback: the first cue in the list, regardless of condition.
//!
//! Output is change-gated: the externally visible text updates only when
//! the resolved cue differs from what is already displayed, so re-evaluating
//! every frame with the same result causes no visual flicker.

use std::collections::HashMap;

use tracing::debug;

use crate::session::SessionTracker;
use crate::types::{FormCue, Position, SkeletonFrame, Zone};

/// Selects the coaching cue to display for each frame.
#[derive(Debug, Clone, Default)]
pub struct CueSelector {
    /// Neutral positions of watched joints, captured at session start.
    neutral_positions: HashMap<String, Position>,
    /// Text currently shown to the user.
    displayed: Option<String>,
}

impl CueSelector {
    pub fn new() -> Self {
        Self::default()
    }

    /// Capture neutral positions for any watched joints present in this
    /// frame that do not have a baseline yet.
    ///
    /// The pipeline calls this on validated frames early in the session,
    /// while the user is still near the rest pose; deviation checks measure
    /// drift from these baselines.
    pub fn capture_neutral(&mut self, cues: &[FormCue], frame: &SkeletonFrame) {
        for cue in cues {
            let Some(joint) = cue.watched_joint.as_deref() else {
                continue;
            };
            if self.neutral_positions.contains_key(joint) {
                continue;
            }
            if let Some(position) = frame.joint(joint) {
                debug!(joint, "captured neutral position");
                self.neutral_positions.insert(joint.to_string(), position);
            }
        }
    }

    /// Resolve the cue for this frame and return the new text if it
    /// differs from what is already displayed.
    pub fn select(
        &mut self,
        zone: Zone,
        cues: &[FormCue],
        frame: &SkeletonFrame,
        session: &mut SessionTracker,
    ) -> Option<String> {
        let resolved = self.resolve(zone, cues, frame, session);
        match resolved {
            Some(text) if self.displayed.as_deref() != Some(text) => {
                let text = text.to_string();
                self.displayed = Some(text.clone());
                Some(text)
            }
            _ => None,
        }
    }

    /// The text currently displayed, if any.
    pub fn current(&self) -> Option<&str> {
        self.displayed.as_deref()
    }

    /// Drop displayed text and captured baselines for a fresh session.
    pub fn reset(&mut self) {
        self.neutral_positions.clear();
        self.displayed = None;
    }

    fn resolve<'c>(
        &self,
        zone: Zone,
        cues: &'c [FormCue],
        frame: &SkeletonFrame,
        session: &mut SessionTracker,
    ) -> Option<&'c str> {
        // Priority 1: compensation on a watched joint.
        for cue in cues {
            let (Some(joint), Some(max_deviation)) =
                (cue.watched_joint.as_deref(), cue.max_deviation)
            else {
                continue;
            };
            let (Some(current), Some(neutral)) =
                (frame.joint(joint), self.neutral_positions.get(joint).copied())
            else {
                continue;
            };
            let deviation = (current - neutral).norm();
            if deviation > max_deviation {
                session.record_cheat(joint);
                return Some(&cue.description);
            }
        }

        // Priority 2: first cue declared for the current zone.
        if let Some(cue) = cues.iter().find(|c| c.zone == Some(zone)) {
            return Some(&cue.description);
        }

        // Priority 3: first cue as the fallback.
        cues.first().map(|c| c.description.as_str())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::types::{JointTriple, SessionEvent};
    use nalgebra::Point3;

    fn triple() -> JointTriple {
        JointTriple::new(
            Point3::new(0.0, 0.4, 0.0),
            Point3::origin(),
            Point3::new(0.4, 0.0, 0.0),
        )
    }

    fn cue_list() -> Vec<FormCue> {
        vec![
            FormCue::unconditional("Nice and steady"),
            FormCue::watching("Keep your shoulder still", "shoulder", 0.05),
            FormCue::for_zone("Lift a little higher", Zone::BelowTarget),
            FormCue::for_zone("Hold it right there", Zone::Target),
            FormCue::for_zone("Ease off a touch", Zone::AboveTarget),
        ]
    }

    fn frame_with_shoulder(x: f32) -> SkeletonFrame {
        SkeletonFrame::new(triple()).with_joint("shoulder", Point3::new(x, 1.4, 0.0))
    }

    #[test]
    fn test_zone_matched_cue() {
        let mut selector = CueSelector::new();
        let mut session = SessionTracker::new(30.0);
        let cues = cue_list();
        let frame = SkeletonFrame::new(triple());

        let text = selector.select(Zone::BelowTarget, &cues, &frame, &mut session);
        assert_eq!(text.as_deref(), Some("Lift a little higher"));
        let text = selector.select(Zone::Target, &cues, &frame, &mut session);
        assert_eq!(text.as_deref(), Some("Hold it right there"));
    }

    #[test]
    fn test_change_gating_suppresses_repeats() {
        let mut selector = CueSelector::new();
        let mut session = SessionTracker::new(30.0);
        let cues = cue_list();
        let frame = SkeletonFrame::new(triple());

        assert!(selector
            .select(Zone::Target, &cues, &frame, &mut session)
            .is_some());
        // Same zone, same resolution: no new text.
        assert!(selector
            .select(Zone::Target, &cues, &frame, &mut session)
            .is_none());
        assert_eq!(selector.current(), Some("Hold it right there"));
    }

    #[test]
    fn test_compensation_outranks_zone_match() {
        let mut selector = CueSelector::new();
        let mut session = SessionTracker::new(30.0);
        let cues = cue_list();

        selector.capture_neutral(&cues, &frame_with_shoulder(0.0));
        // Shoulder drifts 10 cm from neutral, past the 5 cm allowance.
        let drifted = frame_with_shoulder(0.10);
        let text = selector.select(Zone::Target, &cues, &drifted, &mut session);
        assert_eq!(text.as_deref(), Some("Keep your shoulder still"));
        assert!(session
            .events()
            .iter()
            .any(|e| matches!(e, SessionEvent::CheatDetected { joint } if joint == "shoulder")));
    }

    #[test]
    fn test_cheat_recorded_once_per_joint() {
        let mut selector = CueSelector::new();
        let mut session = SessionTracker::new(30.0);
        let cues = cue_list();

        selector.capture_neutral(&cues, &frame_with_shoulder(0.0));
        let drifted = frame_with_shoulder(0.10);
        for _ in 0..10 {
            selector.select(Zone::Target, &cues, &drifted, &mut session);
        }
        let cheats = session
            .events()
            .iter()
            .filter(|e| matches!(e, SessionEvent::CheatDetected { .. }))
            .count();
        assert_eq!(cheats, 1);
    }

    #[test]
    fn test_deviation_within_allowance_is_quiet() {
        let mut selector = CueSelector::new();
        let mut session = SessionTracker::new(30.0);
        let cues = cue_list();

        selector.capture_neutral(&cues, &frame_with_shoulder(0.0));
        let slight = frame_with_shoulder(0.03);
        let text = selector.select(Zone::Target, &cues, &slight, &mut session);
        assert_eq!(text.as_deref(), Some("Hold it right there"));
        assert!(session.events().is_empty());
    }

    #[test]
    fn test_missing_watched_joint_skips_compensation() {
        let mut selector = CueSelector::new();
        let mut session = SessionTracker::new(30.0);
        let cues = cue_list();
        // No shoulder in the frame: no baseline, no check, no panic.
        let frame = SkeletonFrame::new(triple());
        selector.capture_neutral(&cues, &frame);
        let text = selector.select(Zone::AboveTarget, &cues, &frame, &mut session);
        assert_eq!(text.as_deref(), Some("Ease off a touch"));
    }

    #[test]
    fn test_first_cue_fallback_when_nothing_matches() {
        let mut selector = CueSelector::new();
        let mut session = SessionTracker::new(30.0);
        let cues = vec![
            FormCue::unconditional("Breathe and keep moving"),
            FormCue::for_zone("Lift a little higher", Zone::BelowTarget),
        ];
        let frame = SkeletonFrame::new(triple());
        let text = selector.select(Zone::AboveTarget, &cues, &frame, &mut session);
        assert_eq!(text.as_deref(), Some("Breathe and keep moving"));
    }

    #[test]
    fn test_empty_cue_list_selects_nothing() {
        let mut selector = CueSelector::new();
        let mut session = SessionTracker::new(30.0);
        let frame = SkeletonFrame::new(triple());
        assert!(selector
            .select(Zone::Target, &[], &frame, &mut session)
            .is_none());
        assert_eq!(selector.current(), None);
    }
}
