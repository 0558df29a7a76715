use serde::{Deserialize, Serialize};
use std::collections::HashMap;

use crate::model::ids::{OptionId, QuestionId};

/// Chosen option per question. Absent keys are unanswered.
pub type AnswerMap = HashMap<QuestionId, OptionId>;

/// Lifecycle phase of an exam session.
///
/// Legal edges: `Intro -> Active`, `Active -> Review`, `Review -> Intro`
/// (retake) and `Review -> Active` (attempt again).
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Default, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum Phase {
    #[default]
    Intro,
    Active,
    Review,
}

impl Phase {
    #[must_use]
    pub fn can_transition_to(self, next: Phase) -> bool {
        matches!(
            (self, next),
            (Phase::Intro, Phase::Active)
                | (Phase::Active, Phase::Review)
                | (Phase::Review, Phase::Intro)
                | (Phase::Review, Phase::Active)
        )
    }
}

/// How an attempt was submitted.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum SubmissionKind {
    /// The candidate pressed submit.
    Manual,
    /// The countdown reached zero.
    Timeout,
}

impl SubmissionKind {
    #[must_use]
    pub fn is_forced(self) -> bool {
        matches!(self, SubmissionKind::Timeout)
    }

    #[must_use]
    pub fn label(self) -> &'static str {
        match self {
            SubmissionKind::Manual => "Submitted",
            SubmissionKind::Timeout => "Auto submitted",
        }
    }
}

/// Classification of a single question after submission.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum AnswerOutcome {
    Correct,
    Incorrect,
    Unanswered,
}

/// Result of one submitted attempt. Immutable once built.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Scorecard {
    score: f64,
    correct: u32,
    incorrect: u32,
    unanswered: u32,
    accuracy: f64,
    time_taken_secs: u32,
    submission: SubmissionKind,
}

impl Scorecard {
    pub(crate) fn new(
        score: f64,
        correct: u32,
        incorrect: u32,
        unanswered: u32,
        accuracy: f64,
        time_taken_secs: u32,
        submission: SubmissionKind,
    ) -> Self {
        Self {
            score,
            correct,
            incorrect,
            unanswered,
            accuracy,
            time_taken_secs,
            submission,
        }
    }

    #[must_use]
    pub fn score(&self) -> f64 {
        self.score
    }

    #[must_use]
    pub fn correct(&self) -> u32 {
        self.correct
    }

    #[must_use]
    pub fn incorrect(&self) -> u32 {
        self.incorrect
    }

    #[must_use]
    pub fn unanswered(&self) -> u32 {
        self.unanswered
    }

    /// Questions with any answer recorded.
    #[must_use]
    pub fn attempted(&self) -> u32 {
        self.correct + self.incorrect
    }

    /// Percentage of attempted questions answered correctly, 0 when none.
    #[must_use]
    pub fn accuracy(&self) -> f64 {
        self.accuracy
    }

    #[must_use]
    pub fn time_taken_secs(&self) -> u32 {
        self.time_taken_secs
    }

    #[must_use]
    pub fn submission(&self) -> SubmissionKind {
        self.submission
    }

    /// True when the countdown forced the submission.
    #[must_use]
    pub fn is_forced(&self) -> bool {
        self.submission.is_forced()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn only_documented_phase_edges_are_legal() {
        let all = [Phase::Intro, Phase::Active, Phase::Review];
        let legal: Vec<_> = all
            .iter()
            .flat_map(|from| all.iter().map(move |to| (*from, *to)))
            .filter(|(from, to)| from.can_transition_to(*to))
            .collect();
        assert_eq!(
            legal,
            vec![
                (Phase::Intro, Phase::Active),
                (Phase::Active, Phase::Review),
                (Phase::Review, Phase::Intro),
                (Phase::Review, Phase::Active),
            ]
        );
    }

    #[test]
    fn timeout_submission_is_forced() {
        assert!(SubmissionKind::Timeout.is_forced());
        assert!(!SubmissionKind::Manual.is_forced());
        assert_eq!(SubmissionKind::Timeout.label(), "Auto submitted");
    }
}
