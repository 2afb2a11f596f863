use crate::models::CompatibilityAnswers;

/// Points contributed by each matching answer
pub const POINTS_PER_ANSWER: u8 = 25;

/// Compatibility score between two users' onboarding answers.
///
/// Each of the four questions contributes exactly 25 points when both
/// sides answered and the answers are equal, so the result is always one
/// of {0, 25, 50, 75, 100}. An unanswered question on either side never
/// matches. No side effects, no failure modes.
pub fn compatibility_score(a: &CompatibilityAnswers, b: &CompatibilityAnswers) -> u8 {
    let pairs = [
        (a.q1_smoke, b.q1_smoke),
        (a.q2_serious, b.q2_serious),
        (a.q3_morning, b.q3_morning),
        (a.q4_city, b.q4_city),
    ];

    pairs
        .iter()
        .filter(|(left, right)| matches!((left, right), (Some(l), Some(r)) if l == r))
        .count() as u8
        * POINTS_PER_ANSWER
}
