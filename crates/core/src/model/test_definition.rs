use serde::{Deserialize, Serialize};
use std::collections::HashSet;
use std::fmt;
use std::str::FromStr;
use thiserror::Error;

use crate::model::ids::{QuestionId, TestSlug};
use crate::model::marking::MarkingScheme;
use crate::model::question::{Difficulty, Question, QuestionDraft, QuestionError};

//
// ─── ERRORS ────────────────────────────────────────────────────────────────────
//

#[derive(Debug, Error, Clone, PartialEq, Eq)]
#[non_exhaustive]
pub enum TestDefinitionError {
    #[error("test slug cannot be empty")]
    EmptySlug,

    #[error("test {0} has an empty title")]
    EmptyTitle(TestSlug),

    #[error("test {0} has no questions")]
    NoQuestions(TestSlug),

    #[error("test {0} must last at least one minute")]
    InvalidDuration(TestSlug),

    #[error("test {test} repeats question id {question}")]
    DuplicateQuestion { test: TestSlug, question: QuestionId },

    #[error("test {test}: {source}")]
    Question {
        test: TestSlug,
        #[source]
        source: QuestionError,
    },
}

//
// ─── CATEGORY ──────────────────────────────────────────────────────────────────
//

/// Exam family a test belongs to.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum Category {
    Ssc,
    Railway,
}

impl Category {
    /// Display label, e.g. `"SSC"`.
    #[must_use]
    pub fn label(self) -> &'static str {
        match self {
            Category::Ssc => "SSC",
            Category::Railway => "Railway",
        }
    }
}

impl fmt::Display for Category {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.label())
    }
}

#[derive(Debug, Clone, PartialEq, Eq, Error)]
#[error("unknown category: {0}")]
pub struct ParseCategoryError(String);

impl FromStr for Category {
    type Err = ParseCategoryError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.trim().to_ascii_lowercase().as_str() {
            "ssc" => Ok(Category::Ssc),
            "railway" => Ok(Category::Railway),
            other => Err(ParseCategoryError(other.to_string())),
        }
    }
}

//
// ─── TEST DEFINITION ───────────────────────────────────────────────────────────
//

/// Unvalidated test record as supplied by a catalog source.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct TestDraft {
    pub slug: TestSlug,
    pub title: String,
    #[serde(default)]
    pub description: String,
    pub category: Category,
    pub duration_minutes: u32,
    pub questions: Vec<QuestionDraft>,
    pub marking: MarkingScheme,
    #[serde(default)]
    pub instructions: Vec<String>,
}

/// Immutable, validated test definition.
#[derive(Debug, Clone, PartialEq)]
pub struct TestDefinition {
    slug: TestSlug,
    title: String,
    description: String,
    category: Category,
    duration_minutes: u32,
    questions: Vec<Question>,
    marking: MarkingScheme,
    instructions: Vec<String>,
}

/// Question counts per difficulty level.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct DifficultySplit {
    pub easy: usize,
    pub medium: usize,
    pub hard: usize,
}

impl DifficultySplit {
    #[must_use]
    pub fn count(&self, level: Difficulty) -> usize {
        match level {
            Difficulty::Easy => self.easy,
            Difficulty::Medium => self.medium,
            Difficulty::Hard => self.hard,
        }
    }
}

impl TestDraft {
    /// Validate the draft and every question in it.
    ///
    /// # Errors
    ///
    /// Returns `TestDefinitionError` for empty metadata, a zero duration, no
    /// questions, repeated question ids, or any invalid question.
    pub fn validate(self) -> Result<TestDefinition, TestDefinitionError> {
        if self.slug.as_str().trim().is_empty() {
            return Err(TestDefinitionError::EmptySlug);
        }
        if self.title.trim().is_empty() {
            return Err(TestDefinitionError::EmptyTitle(self.slug));
        }
        if self.duration_minutes == 0 {
            return Err(TestDefinitionError::InvalidDuration(self.slug));
        }
        if self.questions.is_empty() {
            return Err(TestDefinitionError::NoQuestions(self.slug));
        }

        let mut seen = HashSet::with_capacity(self.questions.len());
        let mut questions = Vec::with_capacity(self.questions.len());
        for draft in self.questions {
            if !seen.insert(draft.id.clone()) {
                return Err(TestDefinitionError::DuplicateQuestion {
                    test: self.slug,
                    question: draft.id,
                });
            }
            let question = draft.validate().map_err(|source| TestDefinitionError::Question {
                test: self.slug.clone(),
                source,
            })?;
            questions.push(question);
        }

        Ok(TestDefinition {
            slug: self.slug,
            title: self.title,
            description: self.description,
            category: self.category,
            duration_minutes: self.duration_minutes,
            questions,
            marking: self.marking,
            instructions: self.instructions,
        })
    }
}

impl TestDefinition {
    #[must_use]
    pub fn slug(&self) -> &TestSlug {
        &self.slug
    }

    #[must_use]
    pub fn title(&self) -> &str {
        &self.title
    }

    #[must_use]
    pub fn description(&self) -> &str {
        &self.description
    }

    #[must_use]
    pub fn category(&self) -> Category {
        self.category
    }

    #[must_use]
    pub fn duration_minutes(&self) -> u32 {
        self.duration_minutes
    }

    /// Full attempt length in seconds.
    #[must_use]
    pub fn total_seconds(&self) -> u32 {
        self.duration_minutes.saturating_mul(60)
    }

    #[must_use]
    pub fn questions(&self) -> &[Question] {
        &self.questions
    }

    #[must_use]
    pub fn question_count(&self) -> usize {
        self.questions.len()
    }

    #[must_use]
    pub fn question(&self, index: usize) -> Option<&Question> {
        self.questions.get(index)
    }

    #[must_use]
    pub fn question_by_id(&self, id: &QuestionId) -> Option<&Question> {
        self.questions.iter().find(|q| q.id() == id)
    }

    #[must_use]
    pub fn marking(&self) -> &MarkingScheme {
        &self.marking
    }

    #[must_use]
    pub fn instructions(&self) -> &[String] {
        &self.instructions
    }

    #[must_use]
    pub fn max_score(&self) -> f64 {
        self.marking.max_score(self.questions.len())
    }

    /// Questions per topic, most frequent first. Ties keep first-seen order.
    #[must_use]
    pub fn topic_breakdown(&self) -> Vec<(String, usize)> {
        let mut groups: Vec<(String, usize)> = Vec::new();
        for question in &self.questions {
            match groups.iter_mut().find(|(topic, _)| topic == question.topic()) {
                Some((_, count)) => *count += 1,
                None => groups.push((question.topic().to_string(), 1)),
            }
        }
        // sort_by is stable, so equal counts stay in first-seen order
        groups.sort_by(|left, right| right.1.cmp(&left.1));
        groups
    }

    /// Distinct topics in first-seen order.
    #[must_use]
    pub fn topics(&self) -> Vec<&str> {
        let mut seen = HashSet::new();
        self.questions
            .iter()
            .map(Question::topic)
            .filter(|topic| seen.insert(*topic))
            .collect()
    }

    #[must_use]
    pub fn difficulty_split(&self) -> DifficultySplit {
        self.questions
            .iter()
            .fold(DifficultySplit::default(), |mut acc, question| {
                match question.difficulty() {
                    Difficulty::Easy => acc.easy += 1,
                    Difficulty::Medium => acc.medium += 1,
                    Difficulty::Hard => acc.hard += 1,
                }
                acc
            })
    }

    /// Case-insensitive search over title, description and topics.
    ///
    /// `term` is expected to be trimmed and lowercased already; an empty term
    /// matches everything.
    #[must_use]
    pub fn matches_query(&self, term: &str) -> bool {
        if term.is_empty() {
            return true;
        }
        self.title.to_lowercase().contains(term)
            || self.description.to_lowercase().contains(term)
            || self
                .questions
                .iter()
                .any(|q| q.topic().to_lowercase().contains(term))
    }
}

//
// ─── TESTS ─────────────────────────────────────────────────────────────────────
//
