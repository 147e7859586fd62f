//! Motion rehabilitation analysis engine.
//!
//! Turns a stream of three tracked body-landmark positions per frame into
//! a live joint angle with zone and repetition state, guarded by a
//! tracking-confidence check, with prioritized real-time coaching cues and
//! deterministic end-of-session feedback.
//!
//! # Design Philosophy
//!
//! - **Availability over hard failure**: sensor noise never crashes or
//!   propagates an error; every edge case resolves to a defined value.
//! - **Frame-counted, not wall-clock**: the only time-like failure policy
//!   is the confidence guard's consecutive-invalid-frame threshold.
//! - **Deterministic feedback**: identical telemetry always yields
//!   identical coaching text.
//! - **Host-agnostic**: no I/O, no threads, no UI runtime; the caller owns
//!   frame delivery and any display-thread marshaling.
//!
//! # Example
//!
//! ```ignore
//! use rehab_motion::{EngineConfig, ExerciseAnalyzer, SkeletonFrame};
//!
//! let mut analyzer = ExerciseAnalyzer::new(
//!     "Seated knee extension",
//!     body_part,
//!     tracking_config,
//!     EngineConfig::default(),
//! )?;
//!
//! // Driven once per frame by the body-tracking source (~30 Hz):
//! let output = analyzer.process_frame(&frame);
//!
//! // At session end:
//! let feedback = analyzer.generate_feedback();
//! ```

pub mod confidence;
pub mod cues;
pub mod feedback;
pub mod geometry;
pub mod pipeline;
pub mod repetition;
pub mod session;
pub mod smoothing;
pub mod types;
pub mod zone;


// Re-export the primary API surface
pub use confidence::{GuardVerdict, TrackingGuard, REPOSITION_HINT};
pub use cues::CueSelector;
pub use feedback::generate_feedback;
pub use geometry::joint_angle_degrees;
pub use pipeline::{EngineConfig, ExerciseAnalyzer, FrameOutput};
pub use repetition::RepCounter;
pub use session::{ControlLabel, SessionTracker};
pub use smoothing::TemporalSmoother;
pub use types::{
    AngleState, BodyPart, ConfigError, Exercise, FormCue, JointTriple, Position, RepDirection,
    RepState, SessionEvent, SessionFeedback, SessionMetrics, SkeletonFrame, TargetRange,
    TrackingConfig, Zone,
};
pub use zone::ZoneClassifier;
