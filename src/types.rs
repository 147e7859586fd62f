//! Core data types for the rehabilitation motion engine.
//!
//! This module defines the fundamental types used throughout the per-frame
//! analysis pipeline. All types are carefully designed to minimize
//! allocation and maximize clarity.
//!
//! Design principle: Types should make intent obvious. If a concept exists,
//! it gets a type. Never pass raw tuples or untyped collections across
//! boundaries.
//!
//! Types that cross the engine boundary (exercise catalog in, session
//! results out) derive serde so external collaborators can load and store
//! them without this crate caring how.

use std::collections::HashMap;

use nalgebra::Point3;
use serde::{Deserialize, Serialize};
use thiserror::Error;

/// A single tracked body landmark at one instant, in real-world meters.
///
/// Value-copied per frame, never retained across frames.
pub type Position = Point3<f32>;

/// Three skeletal landmarks defining one bend-angle measurement.
///
/// The angle is measured at `middle`; `proximal` and `distal` are the outer
/// endpoints of the two limb segments. Supplied fresh every frame by the
/// external tracking source.
///
/// Design note: We use f32 for on-device execution to save memory and
/// battery. Sub-degree precision is not needed for coaching feedback.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct JointTriple {
    /// Landmark closer to the torso (e.g. hip for a knee angle).
    pub proximal: Position,
    /// The vertex joint whose angle is measured (e.g. the knee itself).
    pub middle: Position,
    /// Landmark farther from the torso (e.g. ankle for a knee angle).
    pub distal: Position,
}

impl JointTriple {
    pub fn new(proximal: Position, middle: Position, distal: Position) -> Self {
        Self {
            proximal,
            middle,
            distal,
        }
    }

    /// Length of the proximal→middle limb segment in meters.
    ///
    /// Used by the confidence guard to reject collapsed/occluded skeletons.
    pub fn proximal_segment_length(&self) -> f32 {
        (self.proximal - self.middle).norm()
    }

    /// Returns true if all nine coordinates are finite (no NaN/∞).
    pub fn all_finite(&self) -> bool {
        [self.proximal, self.middle, self.distal]
            .iter()
            .all(|p| p.coords.iter().all(|c| c.is_finite()))
    }
}

/// One frame of skeleton data handed to the engine.
///
/// Carries the active exercise's joint triple plus any named secondary
/// joints the exercise's form cues watch for compensation. The tracking
/// collaborator resolves both from its full named-joint skeleton; the
/// engine never sees joints it was not asked to watch.
#[derive(Debug, Clone)]
pub struct SkeletonFrame {
    /// The three landmarks defining the primary angle measurement.
    pub triple: JointTriple,
    /// Secondary joints by name, for compensation checks. May be empty.
    pub secondary_joints: HashMap<String, Position>,
}

impl SkeletonFrame {
    /// Create a frame with only the primary triple (no secondary joints).
    pub fn new(triple: JointTriple) -> Self {
        Self {
            triple,
            secondary_joints: HashMap::new(),
        }
    }

    /// Add a named secondary joint position (builder style, for tests and
    /// callers assembling frames by hand).
    pub fn with_joint(mut self, name: &str, position: Position) -> Self {
        self.secondary_joints.insert(name.to_string(), position);
        self
    }

    /// Look up a secondary joint by name.
    pub fn joint(&self, name: &str) -> Option<Position> {
        self.secondary_joints.get(name).copied()
    }
}

/// Classification of a measured angle relative to the exercise's target
/// range.
///
/// Zone is stateful: the classifier applies hysteresis, so the current zone
/// depends on the previous zone, not only on the instantaneous angle.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum Zone {
    /// Angle has not yet reached the target range.
    BelowTarget,
    /// Angle is inside the target range.
    Target,
    /// Angle has overshot past the target range.
    AboveTarget,
}

/// The live angle measurement exposed to the presentation layer.
///
/// Produced each frame; ephemeral, never persisted by the engine.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct AngleState {
    /// Measured joint angle in degrees, in [0, 180].
    pub degrees: f32,
    /// Hysteretic zone classification of that angle.
    pub zone: Zone,
}

impl AngleState {
    pub fn new(degrees: f32, zone: Zone) -> Self {
        Self { degrees, zone }
    }
}

/// Repetition progress for the current session.
///
/// `reps_completed` is monotonically non-decreasing within a session and
/// resettable only by an explicit session reset.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub struct RepState {
    /// Repetitions credited so far this session.
    pub reps_completed: u32,
    /// True while the user is in the target zone with the current cycle's
    /// rep not yet credited.
    pub is_holding: bool,
}

/// Which way the measured angle moves during the effort phase of a rep.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub enum RepDirection {
    /// Angle grows toward the target (e.g. knee extension).
    Increasing,
    /// Angle shrinks toward the target (e.g. elbow curl).
    Decreasing,
}

/// Closed interval of degrees the exercise aims for.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct TargetRange {
    /// Lower bound in degrees (inclusive).
    pub lower_deg: f32,
    /// Upper bound in degrees (inclusive).
    pub upper_deg: f32,
}

impl TargetRange {
    pub fn new(lower_deg: f32, upper_deg: f32) -> Self {
        Self {
            lower_deg,
            upper_deg,
        }
    }

    /// Center of the range: the nominal target angle.
    pub fn midpoint(&self) -> f32 {
        (self.lower_deg + self.upper_deg) / 2.0
    }

    /// Half-width of the range: the tolerance around the target angle.
    pub fn tolerance(&self) -> f32 {
        (self.upper_deg - self.lower_deg) / 2.0
    }

    /// Plain interval membership, without hysteresis.
    pub fn contains(&self, degrees: f32) -> bool {
        degrees >= self.lower_deg && degrees <= self.upper_deg
    }
}

/// A single coaching cue with its trigger conditions.
///
/// A cue with neither `watched_joint` nor `zone` is an unconditional
/// fallback; the selector uses the first cue in the list as the default
/// text when nothing more specific matches.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct FormCue {
    /// The coaching text shown to the user.
    pub description: String,
    /// Secondary joint to watch for compensation, if any.
    #[serde(default)]
    pub watched_joint: Option<String>,
    /// Maximum allowed drift of the watched joint from its neutral
    /// position, in meters.
    #[serde(default)]
    pub max_deviation: Option<f32>,
    /// Zone this cue applies to, if zone-conditional.
    #[serde(default)]
    pub zone: Option<Zone>,
}

impl FormCue {
    /// An unconditional cue (fallback text).
    pub fn unconditional(description: &str) -> Self {
        Self {
            description: description.to_string(),
            watched_joint: None,
            max_deviation: None,
            zone: None,
        }
    }

    /// A cue shown while the angle is in the given zone.
    pub fn for_zone(description: &str, zone: Zone) -> Self {
        Self {
            description: description.to_string(),
            watched_joint: None,
            max_deviation: None,
            zone: Some(zone),
        }
    }

    /// A compensation cue watching a secondary joint.
    pub fn watching(description: &str, joint: &str, max_deviation_m: f32) -> Self {
        Self {
            description: description.to_string(),
            watched_joint: Some(joint.to_string()),
            max_deviation: Some(max_deviation_m),
            zone: None,
        }
    }
}

/// Body region an exercise trains.
///
/// Feedback synthesis is keyed by this explicit tag. The catalog assigns it
/// per exercise; the engine never infers a body part from the exercise's
/// display name.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum BodyPart {
    Knee,
    Elbow,
    Shoulder,
    Hip,
    Ankle,
    Wrist,
    /// Exercises without a single dominant joint.
    General,
}

impl BodyPart {
    /// Lowercase label used inside feedback sentences.
    pub fn label(&self) -> &'static str {
        match self {
            BodyPart::Knee => "knee",
            BodyPart::Elbow => "elbow",
            BodyPart::Shoulder => "shoulder",
            BodyPart::Hip => "hip",
            BodyPart::Ankle => "ankle",
            BodyPart::Wrist => "wrist",
            BodyPart::General => "body",
        }
    }
}

/// Everything the engine needs to know to track one exercise.
///
/// Owned by the external exercise catalog and supplied once per exercise
/// selection. Read-only from the engine's point of view.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct TrackingConfig {
    /// Named joint resolved by the tracking source into `JointTriple::proximal`.
    pub proximal_joint: String,
    /// Named joint resolved into `JointTriple::middle` (the measured vertex).
    pub middle_joint: String,
    /// Named joint resolved into `JointTriple::distal`.
    pub distal_joint: String,
    /// Degrees the exercise aims for.
    pub target_range: TargetRange,
    /// Minimum seconds in the target zone before a rep can be credited.
    pub hold_seconds: f32,
    /// Direction the angle moves during the effort phase.
    pub rep_direction: RepDirection,
    /// Neutral angle the limb must pass back through to complete a rep.
    pub rest_angle_deg: f32,
    /// Ordered coaching cues, highest priority first within each rule tier.
    pub form_cues: Vec<FormCue>,
}

impl TrackingConfig {
    /// Check the configuration for values the engine cannot operate on.
    ///
    /// These are catalog authoring errors, not sensor errors, so they are
    /// the one place the engine returns `Err` instead of degrading.
    pub fn validate(&self) -> Result<(), ConfigError> {
        if self.proximal_joint.is_empty()
            || self.middle_joint.is_empty()
            || self.distal_joint.is_empty()
        {
            return Err(ConfigError::EmptyJointName);
        }
        if self.target_range.lower_deg >= self.target_range.upper_deg {
            return Err(ConfigError::InvertedTargetRange {
                lower_deg: self.target_range.lower_deg,
                upper_deg: self.target_range.upper_deg,
            });
        }
        if !self.hold_seconds.is_finite() || self.hold_seconds <= 0.0 {
            return Err(ConfigError::NonPositiveHold {
                hold_seconds: self.hold_seconds,
            });
        }
        if !self.rest_angle_deg.is_finite() {
            return Err(ConfigError::NonFiniteRestAngle);
        }
        Ok(())
    }
}

/// Catalog authoring errors caught at analyzer construction.
#[derive(Debug, Error, PartialEq)]
pub enum ConfigError {
    #[error("tracking config names an empty joint")]
    EmptyJointName,
    #[error("target range is inverted or empty: [{lower_deg}, {upper_deg}]")]
    InvertedTargetRange { lower_deg: f32, upper_deg: f32 },
    #[error("hold duration must be positive, got {hold_seconds}")]
    NonPositiveHold { hold_seconds: f32 },
    #[error("rest angle is not a finite number")]
    NonFiniteRestAngle,
}

/// One catalog entry: an exercise as the engine's collaborators see it.
///
/// `tracking: None` is a meaningful state, not an error: exercises whose
/// motion cannot be captured by a 3-point angle (grip force, axial
/// rotation) run in timer-only mode and never reach the analysis pipeline.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Exercise {
    /// Display name shown to the user and echoed into feedback text.
    pub name: String,
    /// Explicit body-part tag used to key feedback synthesis.
    pub body_part: BodyPart,
    /// Angle-tracking configuration, absent for timer-only exercises.
    #[serde(default)]
    pub tracking: Option<TrackingConfig>,
}

impl Exercise {
    /// Returns true if this exercise runs through the analysis pipeline.
    pub fn is_trackable(&self) -> bool {
        self.tracking.is_some()
    }
}

/// Noteworthy moments recorded during one session.
///
/// Appended to an ordered, append-only log, consumed at session end by the
/// feedback synthesizer.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub enum SessionEvent {
    /// The user kept the target zone continuously for this many seconds.
    /// Reported once per streak.
    GoodFormHeld { seconds: f32 },
    /// A watched secondary joint drifted past its allowed deviation.
    /// Reported at most once per joint per session.
    CheatDetected { joint: String },
}

/// Running per-session counters.
///
/// Accumulated strictly within one session; reset only by explicit call.
#[derive(Debug, Clone, Copy, PartialEq, Default, Serialize, Deserialize)]
pub struct SessionMetrics {
    /// Frames processed (valid frames only; frozen frames do not count).
    pub total_frames: u32,
    /// Frames spent in the target zone.
    pub frames_in_good_form: u32,
    /// Sum of |raw(t) − raw(t−1)| over the session, in degrees.
    pub jitter_accumulated: f32,
    /// Seconds spent in the target zone at the configured cadence.
    pub good_form_seconds: f32,
    /// Best smoothed angle reached this session, in degrees.
    pub best_angle_deg: f32,
}

/// The three feedback strings produced once at session end.
///
/// Never partially computed: identical telemetry always yields identical
/// text.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct SessionFeedback {
    /// What went well.
    pub positive_observation: String,
    /// The most useful thing to work on next.
    pub growth_observation: String,
    /// Forward-looking encouragement tied to the trained body part.
    pub journey_message: String,
}

#[cfg(test)]
mod tests {
    use super::*;
    use nalgebra::Point3;

    fn valid_config() -> TrackingConfig {
        TrackingConfig {
            proximal_joint: "hip".to_string(),
            middle_joint: "knee".to_string(),
            distal_joint: "ankle".to_string(),
            target_range: TargetRange::new(75.0, 105.0),
            hold_seconds: 1.0,
            rep_direction: RepDirection::Increasing,
            rest_angle_deg: 30.0,
            form_cues: vec![FormCue::unconditional("Keep going")],
        }
    }

    #[test]
    fn test_target_range_derived_values() {
        let range = TargetRange::new(75.0, 105.0);
        assert_eq!(range.midpoint(), 90.0);
        assert_eq!(range.tolerance(), 15.0);
        assert!(range.contains(75.0));
        assert!(range.contains(105.0));
        assert!(!range.contains(74.9));
    }

    #[test]
    fn test_triple_finiteness_check() {
        let good = JointTriple::new(
            Point3::new(0.0, 1.0, 0.0),
            Point3::origin(),
            Point3::new(1.0, 0.0, 0.0),
        );
        assert!(good.all_finite());

        let bad = JointTriple::new(
            Point3::new(f32::NAN, 1.0, 0.0),
            Point3::origin(),
            Point3::new(1.0, 0.0, 0.0),
        );
        assert!(!bad.all_finite());
    }

    #[test]
    fn test_config_validation_accepts_good_config() {
        assert_eq!(valid_config().validate(), Ok(()));
    }

    #[test]
    fn test_config_validation_rejects_inverted_range() {
        let mut config = valid_config();
        config.target_range = TargetRange::new(105.0, 75.0);
        assert!(matches!(
            config.validate(),
            Err(ConfigError::InvertedTargetRange { .. })
        ));
    }

    #[test]
    fn test_config_validation_rejects_zero_hold() {
        let mut config = valid_config();
        config.hold_seconds = 0.0;
        assert!(matches!(
            config.validate(),
            Err(ConfigError::NonPositiveHold { .. })
        ));
    }

    #[test]
    fn test_timer_only_exercise_is_representable() {
        let exercise = Exercise {
            name: "Grip squeeze".to_string(),
            body_part: BodyPart::Wrist,
            tracking: None,
        };
        assert!(!exercise.is_trackable());
    }

    #[test]
    fn test_catalog_types_round_trip_through_serde() {
        let exercise = Exercise {
            name: "Seated knee extension".to_string(),
            body_part: BodyPart::Knee,
            tracking: Some(valid_config()),
        };
        let json = serde_json::to_string(&exercise).unwrap();
        let back: Exercise = serde_json::from_str(&json).unwrap();
        assert_eq!(back, exercise);
    }
}
