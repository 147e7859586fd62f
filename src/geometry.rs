//! Joint angle geometry.
//!
//! Pure functions turning three landmark positions into one bend angle.
//! No state, no side effects, deterministic for identical inputs.
//!
//! Convention: 180° means the three points are colinear with the middle
//! landmark between the outer two (fully extended limb); 0° means the two
//! segments are folded onto each other (fully flexed).

use nalgebra::Vector3;

use crate::types::{JointTriple, Position};

/// Segments shorter than this are treated as degenerate (duplicate or
/// near-duplicate landmarks), in meters.
const DEGENERATE_SEGMENT_M: f32 = 1e-6;

/// Angle at `middle` between the segments middle→proximal and
/// middle→distal, in degrees.
///
/// Degenerate input (either segment has zero length) returns 0.0 as a
/// documented fallback, not an error. The cosine is clamped to [−1, 1]
/// before the inverse cosine to absorb floating-point drift, so the result
/// is never NaN for finite input.
///
/// The result is symmetric under swapping `proximal` and `distal`.
pub fn joint_angle_degrees(proximal: Position, middle: Position, distal: Position) -> f32 {
    let a: Vector3<f32> = proximal - middle;
    let b: Vector3<f32> = distal - middle;

    let mag_a = a.norm();
    let mag_b = b.norm();
    if mag_a < DEGENERATE_SEGMENT_M || mag_b < DEGENERATE_SEGMENT_M {
        return 0.0;
    }

    let cos_angle = (a.dot(&b) / (mag_a * mag_b)).clamp(-1.0, 1.0);
    cos_angle.acos().to_degrees()
}

/// Convenience wrapper measuring the angle of a [`JointTriple`].
pub fn triple_angle_degrees(triple: &JointTriple) -> f32 {
    joint_angle_degrees(triple.proximal, triple.middle, triple.distal)
}
