//! Scoring rules — attempt penalties, score clamping, gap resolution, and
//! exemplar retrieval constants.
//!
//! These are the portable, sync-only building blocks of the evaluation
//! model. The async engines in `viva-runtime` apply them.

// ─────────────────────────────────────────────────────────────────────────────
// Attempt penalties
// ─────────────────────────────────────────────────────────────────────────────

/// First attempt of a chain — the main question.
pub const FIRST_ATTEMPT: u8 = 1;
/// Maximum attempts per question chain (1 main + 2 follow-ups evaluated,
/// the third follow-up being the last evaluated attempt).
pub const MAX_ATTEMPTS: u8 = 3;
/// Maximum follow-up questions per main question.
pub const MAX_FOLLOW_UPS: u8 = 3;

/// Penalty for a given attempt number. Fixed table: 1→0, 2→−5, 3→−15.
///
/// Attempt numbers outside 1–3 never occur (the state machine enforces the
/// cap); values above 3 saturate at the third-attempt penalty.
#[must_use]
pub fn penalty_for_attempt(attempt_number: u8) -> i8 {
    match attempt_number {
        0 | 1 => 0,
        2 => -5,
        _ => -15,
    }
}

/// Final score: `clamp(raw_score + penalty, 0, 100)`.
#[must_use]
pub fn final_score(raw_score: f64, penalty: i8) -> f64 {
    (raw_score + f64::from(penalty)).clamp(0.0, 100.0)
}

// ─────────────────────────────────────────────────────────────────────────────
// Gap resolution
// ─────────────────────────────────────────────────────────────────────────────

/// Final score at or above which all gaps in a chain resolve.
pub const RESOLUTION_SCORE_THRESHOLD: f64 = 80.0;
/// Completeness at or above which all gaps in a chain resolve.
pub const RESOLUTION_COMPLETENESS_THRESHOLD: f64 = 0.8;

/// Whether an evaluation outcome resolves the question chain's gaps.
///
/// Terminal rule: `final_score ≥ 80 OR completeness ≥ 0.8 OR attempt == 3`.
/// Once a gap is resolved it is never reopened.
#[must_use]
pub fn resolves_gaps(final_score: f64, completeness: f64, attempt_number: u8) -> bool {
    final_score >= RESOLUTION_SCORE_THRESHOLD
        || completeness >= RESOLUTION_COMPLETENESS_THRESHOLD
        || attempt_number >= MAX_ATTEMPTS
}

// ─────────────────────────────────────────────────────────────────────────────
// Exemplar retrieval
// ─────────────────────────────────────────────────────────────────────────────

/// Nearest neighbors fetched from the similarity index.
pub const EXEMPLAR_FETCH_K: usize = 5;
/// Minimum similarity score for an exemplar to be usable (strictly greater).
pub const EXEMPLAR_MIN_SIMILARITY: f32 = 0.5;
/// Maximum exemplars passed to question generation.
pub const EXEMPLAR_MAX: usize = 3;

/// Candidate experience band inferred from years of experience.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum ExperienceBand {
    /// Under 2 years.
    Junior,
    /// 2–5 years.
    Mid,
    /// Over 5 years.
    Senior,
}

impl ExperienceBand {
    /// Classify years of experience: junior <2y, mid 2–5y, senior >5y.
    #[must_use]
    pub fn from_years(years: f64) -> Self {
        if years < 2.0 {
            Self::Junior
        } else if years <= 5.0 {
            Self::Mid
        } else {
            Self::Senior
        }
    }

    /// Label used in retrieval queries and prompts.
    #[must_use]
    pub fn as_str(self) -> &'static str {
        match self {
            Self::Junior => "junior",
            Self::Mid => "mid",
            Self::Senior => "senior",
        }
    }
}
