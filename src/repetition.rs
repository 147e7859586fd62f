//! Repetition counting state machine.
//!
//! A repetition is credited exactly once per full cycle: the target zone is
//! reached, held continuously for the configured duration, and the angle
//! then crosses back past the rest angle in the configured direction before
//! the zone re-enters target. This debouncing prevents counting one
//! sustained hold as multiple reps and prevents counting a rep that never
//! returns to rest.
//!
//! Hold time is frame-counted: consecutive frames in the target zone
//! converted to seconds at the known cadence. Partial attempts that never
//! satisfy the hold are invisible to the counter.

use tracing::{debug, info};

use crate::types::{RepDirection, RepState, Zone};

/// Where the state machine is within one rep cycle.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
enum RepPhase {
    /// Waiting for the target zone to be reached.
    Resting,
    /// In the target zone, accumulating hold time.
    Holding,
    /// Hold satisfied; waiting for the limb to pass back through rest.
    AwaitingReturn {
        /// True once the zone has left target since the hold completed.
        left_target: bool,
    },
}

/// Tracks hold time and return-to-rest to credit completed repetitions.
#[derive(Debug, Clone)]
pub struct RepCounter {
    hold_seconds: f32,
    rep_direction: RepDirection,
    rest_angle_deg: f32,
    frame_rate_hz: f32,

    phase: RepPhase,
    hold_frames: u32,
    reps_completed: u32,
}

impl RepCounter {
    pub fn new(
        hold_seconds: f32,
        rep_direction: RepDirection,
        rest_angle_deg: f32,
        frame_rate_hz: f32,
    ) -> Self {
        Self {
            hold_seconds,
            rep_direction,
            rest_angle_deg,
            frame_rate_hz: frame_rate_hz.max(1.0),
            phase: RepPhase::Resting,
            hold_frames: 0,
            reps_completed: 0,
        }
    }

    /// Advance the state machine with the frame's classified zone and
    /// smoothed angle, and return the updated rep state.
    pub fn update(&mut self, zone: Zone, smoothed_deg: f32) -> RepState {
        let in_target = zone == Zone::Target;

        self.phase = match self.phase {
            RepPhase::Resting => {
                if in_target {
                    self.hold_frames = 1;
                    RepPhase::Holding
                } else {
                    RepPhase::Resting
                }
            }
            RepPhase::Holding => {
                if in_target {
                    self.hold_frames += 1;
                    if self.hold_elapsed_seconds() >= self.hold_seconds {
                        debug!(
                            held_s = self.hold_elapsed_seconds(),
                            "hold satisfied, awaiting return to rest"
                        );
                        RepPhase::AwaitingReturn { left_target: false }
                    } else {
                        RepPhase::Holding
                    }
                } else {
                    // Hold broken before the threshold: the attempt is lost.
                    self.hold_frames = 0;
                    RepPhase::Resting
                }
            }
            RepPhase::AwaitingReturn { left_target } => {
                if self.crossed_rest(smoothed_deg) {
                    self.reps_completed += 1;
                    self.hold_frames = 0;
                    info!(reps = self.reps_completed, "repetition credited");
                    RepPhase::Resting
                } else if in_target && left_target {
                    // Re-entered target without reaching rest: the old cycle
                    // is void, a fresh hold starts.
                    self.hold_frames = 1;
                    RepPhase::Holding
                } else {
                    RepPhase::AwaitingReturn {
                        left_target: left_target || !in_target,
                    }
                }
            }
        };

        self.state(in_target)
    }

    /// Current rep state without advancing the machine.
    pub fn current(&self) -> RepState {
        self.state(matches!(
            self.phase,
            RepPhase::Holding | RepPhase::AwaitingReturn { left_target: false }
        ))
    }

    /// Clear all cycle state and the rep count.
    pub fn reset(&mut self) {
        self.phase = RepPhase::Resting;
        self.hold_frames = 0;
        self.reps_completed = 0;
    }

    fn state(&self, in_target: bool) -> RepState {
        RepState {
            reps_completed: self.reps_completed,
            // Holding = in the target zone with the current cycle's rep not
            // yet credited.
            is_holding: in_target && self.phase != RepPhase::Resting,
        }
    }

    fn hold_elapsed_seconds(&self) -> f32 {
        self.hold_frames as f32 / self.frame_rate_hz
    }

    /// Has the limb passed back through the rest angle, approaching from
    /// the target side?
    fn crossed_rest(&self, smoothed_deg: f32) -> bool {
        match self.rep_direction {
            RepDirection::Increasing => smoothed_deg <= self.rest_angle_deg,
            RepDirection::Decreasing => smoothed_deg >= self.rest_angle_deg,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    /// 0.5 s hold at 30 Hz = 15 frames; rest at 30°, angle increases toward
    /// a target around 90°.
    fn counter() -> RepCounter {
        RepCounter::new(0.5, RepDirection::Increasing, 30.0, 30.0)
    }

    fn feed(counter: &mut RepCounter, zone: Zone, angle: f32, frames: u32) -> RepState {
        let mut state = counter.current();
        for _ in 0..frames {
            state = counter.update(zone, angle);
        }
        state
    }

    #[test]
    fn test_full_cycle_credits_one_rep() {
        let mut reps = counter();
        feed(&mut reps, Zone::BelowTarget, 35.0, 5);
        let held = feed(&mut reps, Zone::Target, 90.0, 20);
        assert!(held.is_holding);
        assert_eq!(held.reps_completed, 0);
        // Leave target, then cross back below rest.
        feed(&mut reps, Zone::BelowTarget, 50.0, 3);
        let done = feed(&mut reps, Zone::BelowTarget, 28.0, 1);
        assert_eq!(done.reps_completed, 1);
        assert!(!done.is_holding);
    }

    #[test]
    fn test_short_hold_is_never_credited() {
        let mut reps = counter();
        // Repeated brief visits: 5 frames each, below the 15-frame hold.
        for _ in 0..4 {
            feed(&mut reps, Zone::Target, 90.0, 5);
            feed(&mut reps, Zone::BelowTarget, 25.0, 5);
        }
        assert_eq!(reps.current().reps_completed, 0);
    }

    #[test]
    fn test_sustained_hold_counts_once() {
        let mut reps = counter();
        // One very long hold must not accumulate multiple reps.
        feed(&mut reps, Zone::Target, 90.0, 300);
        assert_eq!(reps.current().reps_completed, 0);
        feed(&mut reps, Zone::BelowTarget, 25.0, 1);
        assert_eq!(reps.current().reps_completed, 1);
        // Still at rest: no further credit.
        feed(&mut reps, Zone::BelowTarget, 25.0, 50);
        assert_eq!(reps.current().reps_completed, 1);
    }

    #[test]
    fn test_reentering_target_without_rest_voids_cycle() {
        let mut reps = counter();
        feed(&mut reps, Zone::Target, 90.0, 20);
        // Dips out of target but never reaches the 30° rest angle, then
        // comes back up: no rep, new hold begins.
        feed(&mut reps, Zone::BelowTarget, 60.0, 3);
        let state = feed(&mut reps, Zone::Target, 90.0, 1);
        assert_eq!(state.reps_completed, 0);
        assert!(state.is_holding);
        // Completing the new cycle still works.
        feed(&mut reps, Zone::Target, 90.0, 20);
        feed(&mut reps, Zone::BelowTarget, 25.0, 1);
        assert_eq!(reps.current().reps_completed, 1);
    }

    #[test]
    fn test_decreasing_direction_rest_crossing() {
        // Elbow-curl style: angle shrinks toward the target, rest at 170°.
        let mut reps = RepCounter::new(0.5, RepDirection::Decreasing, 170.0, 30.0);
        feed(&mut reps, Zone::Target, 45.0, 20);
        feed(&mut reps, Zone::BelowTarget, 120.0, 3);
        let done = feed(&mut reps, Zone::BelowTarget, 172.0, 1);
        assert_eq!(done.reps_completed, 1);
    }

    #[test]
    fn test_holding_flag_tracks_target_zone() {
        let mut reps = counter();
        assert!(!reps.current().is_holding);
        let state = feed(&mut reps, Zone::Target, 90.0, 1);
        assert!(state.is_holding);
        let state = feed(&mut reps, Zone::BelowTarget, 40.0, 1);
        assert!(!state.is_holding);
    }

    #[test]
    fn test_reset_clears_count_and_cycle() {
        let mut reps = counter();
        feed(&mut reps, Zone::Target, 90.0, 20);
        feed(&mut reps, Zone::BelowTarget, 25.0, 1);
        assert_eq!(reps.current().reps_completed, 1);
        reps.reset();
        assert_eq!(reps.current().reps_completed, 0);
        assert!(!reps.current().is_holding);
    }
}
