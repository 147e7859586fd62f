//! Hysteretic zone classification.
//!
//! Maps a smoothed angle onto one of three zones relative to the exercise's
//! target range. A dead-band around each boundary requires a genuine
//! crossing before the classifier commits to a new zone: without it, a
//! signal oscillating within a few hundredths of a degree of a boundary
//! would flip zones every frame and corrupt repetition counting.

use tracing::debug;

use crate::types::{TargetRange, Zone};

/// Dead-band width as a fraction of the range tolerance (half-width).
const DEAD_BAND_FRACTION: f32 = 0.3;

/// State machine classifying smoothed angles into zones with hysteresis.
#[derive(Debug, Clone)]
pub struct ZoneClassifier {
    lower_deg: f32,
    upper_deg: f32,
    dead_band_deg: f32,
    initial: Zone,
    current: Zone,
}

impl ZoneClassifier {
    /// Build a classifier for the given target range.
    ///
    /// The initial state is whichever zone the exercise's configured rest
    /// angle falls into, so the first frames of a session classify sanely
    /// before any motion happens.
    pub fn new(range: TargetRange, rest_angle_deg: f32) -> Self {
        let lower_deg = range.lower_deg;
        let upper_deg = range.upper_deg;
        let dead_band_deg = range.tolerance() * DEAD_BAND_FRACTION;
        let initial = classify_static(rest_angle_deg, lower_deg, upper_deg);
        Self {
            lower_deg,
            upper_deg,
            dead_band_deg,
            initial,
            current: initial,
        }
    }

    /// Advance the state machine with a new smoothed angle and return the
    /// resulting zone.
    ///
    /// The current zone persists unless the angle crosses a boundary by
    /// more than the dead-band.
    pub fn update(&mut self, smoothed_deg: f32) -> Zone {
        let next = match self.current {
            Zone::BelowTarget => {
                if smoothed_deg >= self.lower_deg + self.dead_band_deg {
                    Zone::Target
                } else {
                    Zone::BelowTarget
                }
            }
            Zone::Target => {
                if smoothed_deg < self.lower_deg - self.dead_band_deg {
                    Zone::BelowTarget
                } else if smoothed_deg > self.upper_deg + self.dead_band_deg {
                    Zone::AboveTarget
                } else {
                    Zone::Target
                }
            }
            Zone::AboveTarget => {
                if smoothed_deg <= self.upper_deg - self.dead_band_deg {
                    Zone::Target
                } else {
                    Zone::AboveTarget
                }
            }
        };

        if next != self.current {
            debug!(from = ?self.current, to = ?next, angle = smoothed_deg, "zone transition");
            self.current = next;
        }
        self.current
    }

    /// The zone as of the last update.
    pub fn current(&self) -> Zone {
        self.current
    }

    /// Return to the rest-angle zone, discarding hysteresis state.
    pub fn reset(&mut self) {
        self.current = self.initial;
    }

    #[cfg(test)]
    fn force_state(&mut self, zone: Zone) {
        self.current = zone;
    }
}

/// Plain interval classification without hysteresis.
///
/// Used for the initial state only; live classification always goes through
/// [`ZoneClassifier::update`].
fn classify_static(degrees: f32, lower_deg: f32, upper_deg: f32) -> Zone {
    if degrees < lower_deg {
        Zone::BelowTarget
    } else if degrees > upper_deg {
        Zone::AboveTarget
    } else {
        Zone::Target
    }
}
