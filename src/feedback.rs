//! End-of-session feedback synthesis.
//!
//! A deterministic decision table turning session telemetry into three
//! coaching strings: a positive observation, a growth observation, and a
//! forward-looking journey message. Identical telemetry always yields
//! identical text; there is no randomness and no hidden state.
//!
//! Text is keyed by the exercise's explicit body-part tag, never inferred
//! from its display name, so a future exercise named after an unrelated
//! body part cannot be misclassified.

use tracing::info;

use crate::session::SessionTracker;
use crate::types::{BodyPart, SessionEvent, SessionFeedback, SessionMetrics, TargetRange};

/// Degrees of slack under the range top that still count as hitting the
/// full target range.
pub const FULL_RANGE_SLACK_DEG: f32 = 5.0;

/// Gap to the range top (degrees) beyond which feedback focuses on range
/// growth rather than a near-miss nudge.
pub const RANGE_GROWTH_GAP_DEG: f32 = 10.0;

/// Control rating under which feedback asks the user to slow down.
const LOW_CONTROL_RATING: f32 = 0.5;

/// Derived facts the decision table branches on.
#[derive(Debug, Clone, Copy)]
struct SessionFacts<'a> {
    hit_full_range: bool,
    gap_to_best_deg: f32,
    first_cheat_joint: Option<&'a str>,
    held_good_form: bool,
    quality_score: f32,
    control_rating: f32,
}

impl<'a> SessionFacts<'a> {
    fn derive(
        metrics: &SessionMetrics,
        events: &'a [SessionEvent],
        target_range: TargetRange,
        quality_score: f32,
        control_rating: f32,
    ) -> Self {
        let gap_to_best_deg = target_range.upper_deg - metrics.best_angle_deg;
        Self {
            hit_full_range: metrics.best_angle_deg >= target_range.upper_deg - FULL_RANGE_SLACK_DEG,
            gap_to_best_deg,
            first_cheat_joint: events.iter().find_map(|e| match e {
                SessionEvent::CheatDetected { joint } => Some(joint.as_str()),
                _ => None,
            }),
            held_good_form: events
                .iter()
                .any(|e| matches!(e, SessionEvent::GoodFormHeld { .. })),
            quality_score,
            control_rating,
        }
    }
}

/// Synthesize the session feedback triple.
///
/// Pure with respect to its inputs: the metrics snapshot, the ordered event
/// log, the exercise identity, and the two derived scores.
pub fn generate_feedback(
    exercise_name: &str,
    body_part: BodyPart,
    target_range: TargetRange,
    metrics: &SessionMetrics,
    events: &[SessionEvent],
    quality_score: f32,
    control_rating: f32,
) -> SessionFeedback {
    let facts = SessionFacts::derive(metrics, events, target_range, quality_score, control_rating);
    info!(
        exercise = exercise_name,
        hit_full_range = facts.hit_full_range,
        quality = facts.quality_score,
        "generating session feedback"
    );
    SessionFeedback {
        positive_observation: positive_observation(exercise_name, body_part, &facts),
        growth_observation: growth_observation(exercise_name, body_part, &facts),
        journey_message: journey_message(body_part, &facts),
    }
}

/// Convenience wrapper reading scores and events straight off a tracker.
pub fn feedback_from_tracker(
    exercise_name: &str,
    body_part: BodyPart,
    target_range: TargetRange,
    tracker: &SessionTracker,
) -> SessionFeedback {
    generate_feedback(
        exercise_name,
        body_part,
        target_range,
        &tracker.metrics(),
        tracker.events(),
        tracker.quality_score(),
        tracker.control_rating(),
    )
}

fn positive_observation(exercise_name: &str, body_part: BodyPart, facts: &SessionFacts) -> String {
    if facts.hit_full_range && facts.held_good_form {
        format!(
            "Outstanding session—you reached your full target range on {exercise_name} \
             and held the position with real control."
        )
    } else if facts.hit_full_range {
        format!(
            "You reached your complete target range today. Your {} is moving \
             exactly where it needs to.",
            body_part.label()
        )
    } else if facts.held_good_form {
        "You held strong, steady form in the target zone—that kind of hold is what \
         rebuilds stability."
            .to_string()
    } else if facts.quality_score > 0.5 {
        format!(
            "You kept good form for most of the session on {exercise_name}. \
             That consistency is what drives recovery."
        )
    } else {
        format!("You showed up and put in the work on {exercise_name}—every session counts.")
    }
}

fn growth_observation(exercise_name: &str, body_part: BodyPart, facts: &SessionFacts) -> String {
    if let Some(joint) = facts.first_cheat_joint {
        return compensation_coaching(joint);
    }
    if !facts.hit_full_range && facts.gap_to_best_deg > RANGE_GROWTH_GAP_DEG {
        let gap = facts.gap_to_best_deg.round() as i32;
        return range_growth_text(exercise_name, body_part, gap);
    }
    if facts.control_rating < LOW_CONTROL_RATING {
        return "Try slowing each movement down—smooth, deliberate motion does more \
                for recovery than speed."
            .to_string();
    }
    if !facts.hit_full_range {
        return "You were just shy of your full range—a few more degrees and you're there."
            .to_string();
    }
    "Keep an even pace through each rep; a steady rhythm makes every repetition count."
        .to_string()
}

/// Coaching text for a detected compensation, keyed by the first detected
/// joint. Unrecognized joints get a generic isolation reminder naming them.
fn compensation_coaching(joint: &str) -> String {
    match joint {
        "shoulder" => "Your shoulder crept in to help—try to keep it relaxed and low \
                       so the target muscles do the work."
            .to_string(),
        "hip" => "Your hip shifted to assist the movement. Keep your pelvis square \
                  and let the exercise isolate the joint it's meant for."
            .to_string(),
        "back" | "trunk" => "Your back leaned in to compensate. Brace gently through \
                             your core and keep your torso tall."
            .to_string(),
        "elbow" => "Your elbow drifted during the movement—keep it tucked so the \
                    effort stays on the intended joint."
            .to_string(),
        "knee" => "Your knee drifted out of line—keep it tracking straight so the \
                   right muscles carry the load."
            .to_string(),
        other => format!(
            "Your {other} moved to compensate during the exercise. Focus on keeping \
             it still so the target joint does the work."
        ),
    }
}

/// Range-growth encouragement parameterized by the integer gap in degrees.
fn range_growth_text(exercise_name: &str, body_part: BodyPart, gap_deg: i32) -> String {
    match body_part {
        BodyPart::Knee => format!(
            "Your knee bend stopped about {gap_deg}° short of the goal—ease a little \
             deeper into each rep as it loosens up."
        ),
        BodyPart::Elbow => format!(
            "Your elbow came within {gap_deg}° of the full motion—keep working \
             toward a complete bend and straighten."
        ),
        BodyPart::Shoulder => format!(
            "Your shoulder reached {gap_deg}° shy of the target—gentle, gradual \
             reaching will close that gap."
        ),
        BodyPart::Hip => format!(
            "Your hip motion was {gap_deg}° short of the goal—focus on a slow, full \
             sweep through each rep."
        ),
        BodyPart::Ankle => format!(
            "Your ankle stopped {gap_deg}° before the target—keep easing through \
             the full arc of motion."
        ),
        BodyPart::Wrist => format!(
            "Your wrist was {gap_deg}° short of the full range—small, patient reps \
             will get you there."
        ),
        BodyPart::General => format!(
            "You finished about {gap_deg}° short of the target range on \
             {exercise_name}—aim a little further each session."
        ),
    }
}

fn journey_message(body_part: BodyPart, facts: &SessionFacts) -> String {
    let label = body_part.label();
    if facts.hit_full_range && facts.quality_score > 0.6 {
        format!(
            "Your {label} is responding beautifully—sessions like this one are \
             exactly how full strength comes back."
        )
    } else if facts.quality_score > 0.4 {
        format!(
            "Your {label} is making steady progress. Keep stacking sessions like \
             this and the gains will follow."
        )
    } else {
        format!(
            "Recovery is rarely a straight line—your {label} will feel different \
             tomorrow. What matters is that you keep going."
        )
    }
}
