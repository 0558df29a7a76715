use serde::{Deserialize, Serialize};
use std::collections::HashSet;
use std::fmt;
use thiserror::Error;

use crate::model::ids::{OptionId, QuestionId};

//
// ─── ERRORS ────────────────────────────────────────────────────────────────────
//

#[derive(Debug, Error, Clone, PartialEq, Eq)]
#[non_exhaustive]
pub enum QuestionError {
    #[error("question id cannot be empty")]
    EmptyId,

    #[error("question {0} has an empty prompt")]
    EmptyPrompt(QuestionId),

    #[error("question {0} needs at least two options")]
    TooFewOptions(QuestionId),

    #[error("question {question} has an option with an empty id or label")]
    EmptyOption { question: QuestionId },

    #[error("question {question} repeats option id {option}")]
    DuplicateOption {
        question: QuestionId,
        option: OptionId,
    },

    #[error("question {question} names {answer} as correct but has no such option")]
    UnknownAnswer {
        question: QuestionId,
        answer: OptionId,
    },
}

//
// ─── DIFFICULTY ────────────────────────────────────────────────────────────────
//

/// Difficulty tag shown in the review list and catalog difficulty bar.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum Difficulty {
    Easy,
    Medium,
    Hard,
}

impl Difficulty {
    pub const ALL: [Difficulty; 3] = [Difficulty::Easy, Difficulty::Medium, Difficulty::Hard];

    #[must_use]
    pub fn as_str(self) -> &'static str {
        match self {
            Difficulty::Easy => "easy",
            Difficulty::Medium => "medium",
            Difficulty::Hard => "hard",
        }
    }
}

impl fmt::Display for Difficulty {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

//
// ─── QUESTION TYPES ────────────────────────────────────────────────────────────
//

/// One selectable answer.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct AnswerOption {
    pub id: OptionId,
    pub label: String,
}

impl AnswerOption {
    pub fn new(id: impl Into<String>, label: impl Into<String>) -> Self {
        Self {
            id: OptionId::new(id),
            label: label.into(),
        }
    }
}

/// Unvalidated question as supplied by a catalog source.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct QuestionDraft {
    pub id: QuestionId,
    pub prompt: String,
    pub topic: String,
    pub difficulty: Difficulty,
    pub options: Vec<AnswerOption>,
    pub answer: OptionId,
    #[serde(default)]
    pub explanation: String,
}

/// A validated multiple-choice question.
///
/// The correct option id always matches exactly one option.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Question {
    id: QuestionId,
    prompt: String,
    topic: String,
    difficulty: Difficulty,
    options: Vec<AnswerOption>,
    answer: OptionId,
    explanation: String,
}

impl QuestionDraft {
    /// Validate the draft into a `Question`.
    ///
    /// # Errors
    ///
    /// Returns `QuestionError` if ids are empty or repeated, fewer than two
    /// options are given, or the correct answer names no option.
    pub fn validate(self) -> Result<Question, QuestionError> {
        if self.id.as_str().trim().is_empty() {
            return Err(QuestionError::EmptyId);
        }
        if self.prompt.trim().is_empty() {
            return Err(QuestionError::EmptyPrompt(self.id));
        }
        if self.options.len() < 2 {
            return Err(QuestionError::TooFewOptions(self.id));
        }

        let mut seen = HashSet::with_capacity(self.options.len());
        for option in &self.options {
            if option.id.as_str().trim().is_empty() || option.label.trim().is_empty() {
                return Err(QuestionError::EmptyOption { question: self.id });
            }
            if !seen.insert(&option.id) {
                return Err(QuestionError::DuplicateOption {
                    question: self.id.clone(),
                    option: option.id.clone(),
                });
            }
        }
        if !seen.contains(&self.answer) {
            return Err(QuestionError::UnknownAnswer {
                question: self.id,
                answer: self.answer,
            });
        }

        Ok(Question {
            id: self.id,
            prompt: self.prompt,
            topic: self.topic,
            difficulty: self.difficulty,
            options: self.options,
            answer: self.answer,
            explanation: self.explanation,
        })
    }
}

impl Question {
    #[must_use]
    pub fn id(&self) -> &QuestionId {
        &self.id
    }

    #[must_use]
    pub fn prompt(&self) -> &str {
        &self.prompt
    }

    #[must_use]
    pub fn topic(&self) -> &str {
        &self.topic
    }

    #[must_use]
    pub fn difficulty(&self) -> Difficulty {
        self.difficulty
    }

    #[must_use]
    pub fn options(&self) -> &[AnswerOption] {
        &self.options
    }

    /// Identifier of the correct option.
    #[must_use]
    pub fn answer(&self) -> &OptionId {
        &self.answer
    }

    #[must_use]
    pub fn explanation(&self) -> &str {
        &self.explanation
    }

    #[must_use]
    pub fn has_option(&self, option: &OptionId) -> bool {
        self.options.iter().any(|o| &o.id == option)
    }

    /// Label of the given option, if it belongs to this question.
    #[must_use]
    pub fn option_label(&self, option: &OptionId) -> Option<&str> {
        self.options
            .iter()
            .find(|o| &o.id == option)
            .map(|o| o.label.as_str())
    }

    #[must_use]
    pub fn correct_label(&self) -> &str {
        // validate() guarantees the answer is one of the options
        self.option_label(&self.answer).unwrap_or_default()
    }

    #[must_use]
    pub fn is_correct(&self, option: &OptionId) -> bool {
        &self.answer == option
    }
}

//
// ─── TESTS ─────────────────────────────────────────────────────────────────────
//

#[cfg(test)]
mod tests {
    use super::*;

    fn draft() -> QuestionDraft {
        QuestionDraft {
            id: QuestionId::new("q1"),
            prompt: "2 + 2 = ?".into(),
            topic: "Arithmetic".into(),
            difficulty: Difficulty::Easy,
            options: vec![AnswerOption::new("a", "3"), AnswerOption::new("b", "4")],
            answer: OptionId::new("b"),
            explanation: "Basic addition.".into(),
        }
    }

    #[test]
    fn valid_draft_builds_question() {
        let q = draft().validate().unwrap();
        assert_eq!(q.correct_label(), "4");
        assert!(q.has_option(&OptionId::new("a")));
        assert!(!q.has_option(&OptionId::new("z")));
        assert!(q.is_correct(&OptionId::new("b")));
    }

    #[test]
    fn answer_must_match_an_option() {
        let mut d = draft();
        d.answer = OptionId::new("c");
        assert!(matches!(
            d.validate(),
            Err(QuestionError::UnknownAnswer { .. })
        ));
    }

    #[test]
    fn duplicate_option_ids_are_rejected() {
        let mut d = draft();
        d.options.push(AnswerOption::new("a", "5"));
        let err = d.validate().unwrap_err();
        assert_eq!(
            err,
            QuestionError::DuplicateOption {
                question: QuestionId::new("q1"),
                option: OptionId::new("a"),
            }
        );
    }

    #[test]
    fn single_option_is_rejected() {
        let mut d = draft();
        d.options.truncate(1);
        assert!(matches!(d.validate(), Err(QuestionError::TooFewOptions(_))));
    }

    #[test]
    fn difficulty_deserializes_lowercase() {
        let d: Difficulty = serde_json::from_str("\"medium\"").unwrap();
        assert_eq!(d, Difficulty::Medium);
    }
}
