use serde::{Deserialize, Serialize};
use thiserror::Error;

#[derive(Debug, Error, Clone, PartialEq)]
#[non_exhaustive]
pub enum MarkingSchemeError {
    #[error("marks per correct answer must be a positive number, got {0}")]
    InvalidCorrect(f64),

    #[error("marks per incorrect answer must be finite, got {0}")]
    InvalidIncorrect(f64),

    #[error("marks per unanswered question must be finite, got {0}")]
    InvalidUnanswered(f64),
}

/// Per-question score deltas.
///
/// The total for an attempt is the count-weighted sum of the three deltas.
/// `unanswered` is usually zero but a non-zero value is honoured.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
#[serde(try_from = "RawMarkingScheme", into = "RawMarkingScheme")]
pub struct MarkingScheme {
    correct: f64,
    incorrect: f64,
    unanswered: f64,
}

#[derive(Debug, Clone, Copy, Serialize, Deserialize)]
struct RawMarkingScheme {
    correct: f64,
    incorrect: f64,
    #[serde(default)]
    unanswered: f64,
}

impl MarkingScheme {
    /// # Errors
    ///
    /// Returns `MarkingSchemeError` if `correct` is not a positive finite
    /// number or either penalty is not finite.
    pub fn new(correct: f64, incorrect: f64, unanswered: f64) -> Result<Self, MarkingSchemeError> {
        if !correct.is_finite() || correct <= 0.0 {
            return Err(MarkingSchemeError::InvalidCorrect(correct));
        }
        if !incorrect.is_finite() {
            return Err(MarkingSchemeError::InvalidIncorrect(incorrect));
        }
        if !unanswered.is_finite() {
            return Err(MarkingSchemeError::InvalidUnanswered(unanswered));
        }
        Ok(Self {
            correct,
            incorrect,
            unanswered,
        })
    }

    /// +2 per correct answer, -0.5 per wrong answer.
    #[must_use]
    pub fn standard_negative() -> Self {
        Self {
            correct: 2.0,
            incorrect: -0.5,
            unanswered: 0.0,
        }
    }

    #[must_use]
    pub fn correct(&self) -> f64 {
        self.correct
    }

    #[must_use]
    pub fn incorrect(&self) -> f64 {
        self.incorrect
    }

    #[must_use]
    pub fn unanswered(&self) -> f64 {
        self.unanswered
    }

    /// Best achievable total for `question_count` questions.
    #[must_use]
    pub fn max_score(&self, question_count: usize) -> f64 {
        question_count as f64 * self.correct
    }

    #[must_use]
    pub fn has_negative_marking(&self) -> bool {
        self.incorrect != 0.0
    }

    /// Short label for catalog cards, e.g. `"-0.5"` or `"No negative"`.
    #[must_use]
    pub fn negative_label(&self) -> String {
        if self.has_negative_marking() {
            format!("{}", self.incorrect)
        } else {
            "No negative".to_string()
        }
    }
}

impl TryFrom<RawMarkingScheme> for MarkingScheme {
    type Error = MarkingSchemeError;

    fn try_from(raw: RawMarkingScheme) -> Result<Self, Self::Error> {
        Self::new(raw.correct, raw.incorrect, raw.unanswered)
    }
}

impl From<MarkingScheme> for RawMarkingScheme {
    fn from(scheme: MarkingScheme) -> Self {
        Self {
            correct: scheme.correct,
            incorrect: scheme.incorrect,
            unanswered: scheme.unanswered,
        }
    }
}
