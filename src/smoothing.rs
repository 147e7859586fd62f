//! Temporal smoothing of raw angle samples.
//!
//! Raw frame-to-frame angle noise from landmark tracking is on the order of
//! ±5°. Averaging over a short window at the ~30 Hz sampling rate reduces
//! this to ±1–2° while keeping added latency under 200 ms, which is
//! acceptable for live coaching feedback.
//!
//! O(1) per sample: a fixed-capacity FIFO and a running sum, no allocation
//! after construction.

use std::collections::VecDeque;

/// Default window length in samples (~165 ms at 30 Hz).
pub const DEFAULT_SMOOTHING_WINDOW: usize = 5;

/// Bounded moving-average filter over successive raw angle samples.
#[derive(Debug, Clone)]
pub struct TemporalSmoother {
    window: VecDeque<f32>,
    capacity: usize,
    sum: f32,
}

impl TemporalSmoother {
    /// Create a smoother with the given window capacity (clamped to ≥ 1).
    pub fn new(capacity: usize) -> Self {
        let capacity = capacity.max(1);
        Self {
            window: VecDeque::with_capacity(capacity),
            capacity,
            sum: 0.0,
        }
    }

    /// Append a raw sample and return the mean of the current window.
    ///
    /// Before the window fills this is a running mean over the samples seen
    /// so far, so early output tracks the input rather than starting at 0.
    pub fn smooth(&mut self, value: f32) -> f32 {
        if self.window.len() == self.capacity {
            if let Some(oldest) = self.window.pop_front() {
                self.sum -= oldest;
            }
        }
        self.window.push_back(value);
        self.sum += value;
        self.sum / self.window.len() as f32
    }

    /// Empty the window. Invoked on exercise switch or after a
    /// tracking-loss recovery, so stale samples from before the gap cannot
    /// drag the next reading.
    pub fn reset(&mut self) {
        self.window.clear();
        self.sum = 0.0;
    }

    /// Number of samples currently buffered.
    pub fn len(&self) -> usize {
        self.window.len()
    }

    /// True if no samples are buffered.
    pub fn is_empty(&self) -> bool {
        self.window.is_empty()
    }
}

impl Default for TemporalSmoother {
    fn default() -> Self {
        Self::new(DEFAULT_SMOOTHING_WINDOW)
    }
}
