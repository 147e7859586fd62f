//! Tracking confidence guard.
//!
//! Validates every incoming skeleton frame before any other component sees
//! it, and freezes the engine's output on sustained invalid input so garbage
//! readings never reach the user.
//!
//! Failure policy is frame-counted, not wall-clock: brief dropouts (under
//! the threshold) degrade silently by holding the last validated output;
//! sustained loss enters a frozen state that reports the last good reading
//! unchanged, marks tracking quality as poor, and surfaces a reposition
//! hint. The next valid frame resumes normal flow immediately, with no
//! re-arming delay.
//!
//! The guard owns "no data" semantics: a 0° reading is reserved for the
//! angle calculator's explicit degenerate-geometry fallback and is never
//! emitted as a side effect of a missing or implausible sample.

use tracing::{debug, warn};

use crate::types::JointTriple;

/// Minimum plausible proximal→middle segment length, in meters.
///
/// Anything shorter means the skeleton has collapsed (occlusion, lost
/// tracking) and the sample cannot be trusted.
pub const MIN_SEGMENT_LENGTH_M: f32 = 0.05;

/// Consecutive invalid frames tolerated before freezing output.
pub const DEFAULT_INVALID_FRAME_THRESHOLD: u32 = 5;

/// Hint surfaced to the caller while tracking is frozen.
pub const REPOSITION_HINT: &str =
    "Tracking lost. Move back into the camera's view and hold still for a moment.";

/// Why a sample was rejected.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum RejectReason {
    /// At least one coordinate is NaN or infinite.
    NonFinite,
    /// The proximal limb segment is implausibly short.
    CollapsedSegment,
}

/// What the pipeline should do with the current frame.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum GuardVerdict {
    /// Sample is valid; process it normally.
    Accept,
    /// Sample is valid and tracking was frozen until now; process it, but
    /// reset temporal filters first so stale pre-gap samples are discarded.
    AcceptAfterLoss,
    /// Sample is invalid but under the threshold; hold the last validated
    /// output with no visible change.
    HoldLast,
    /// Sustained invalid input; output stays frozen at the last validated
    /// reading and the caller should surface the reposition hint.
    Frozen,
}

/// Per-session guard state.
#[derive(Debug, Clone)]
pub struct TrackingGuard {
    invalid_threshold: u32,
    min_segment_length_m: f32,
    invalid_streak: u32,
    frozen: bool,
}

impl TrackingGuard {
    pub fn new(invalid_threshold: u32, min_segment_length_m: f32) -> Self {
        Self {
            invalid_threshold: invalid_threshold.max(1),
            min_segment_length_m,
            invalid_streak: 0,
            frozen: false,
        }
    }

    /// Validate one frame and advance the guard state machine.
    pub fn assess(&mut self, triple: &JointTriple) -> GuardVerdict {
        match self.validate(triple) {
            Ok(()) => {
                let was_frozen = self.frozen;
                self.invalid_streak = 0;
                self.frozen = false;
                if was_frozen {
                    debug!("tracking recovered after freeze");
                    GuardVerdict::AcceptAfterLoss
                } else {
                    GuardVerdict::Accept
                }
            }
            Err(reason) => {
                self.invalid_streak += 1;
                if self.invalid_streak >= self.invalid_threshold {
                    if !self.frozen {
                        warn!(
                            ?reason,
                            streak = self.invalid_streak,
                            "sustained tracking loss, freezing output"
                        );
                    }
                    self.frozen = true;
                    GuardVerdict::Frozen
                } else {
                    debug!(?reason, streak = self.invalid_streak, "invalid frame absorbed");
                    GuardVerdict::HoldLast
                }
            }
        }
    }

    /// True while output is frozen due to sustained invalid input.
    pub fn is_frozen(&self) -> bool {
        self.frozen
    }

    /// The reposition hint, present only while frozen.
    pub fn hint(&self) -> Option<&'static str> {
        self.frozen.then_some(REPOSITION_HINT)
    }

    /// Clear streak and freeze state for a fresh session.
    pub fn reset(&mut self) {
        self.invalid_streak = 0;
        self.frozen = false;
    }

    fn validate(&self, triple: &JointTriple) -> Result<(), RejectReason> {
        if !triple.all_finite() {
            return Err(RejectReason::NonFinite);
        }
        if triple.proximal_segment_length() < self.min_segment_length_m {
            return Err(RejectReason::CollapsedSegment);
        }
        Ok(())
    }
}

impl Default for TrackingGuard {
    fn default() -> Self {
        Self::new(DEFAULT_INVALID_FRAME_THRESHOLD, MIN_SEGMENT_LENGTH_M)
    }
}
