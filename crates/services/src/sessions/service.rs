use chrono::{DateTime, Utc};
use std::collections::HashSet;
use std::fmt;
use std::sync::Arc;

use exam_core::Clock;
use exam_core::model::{
    AnswerMap, AttemptId, OptionId, Phase, Question, QuestionId, Scorecard, SubmissionKind,
    TestDefinition,
};
use exam_core::scoring;

use super::progress::{NavigatorStatus, SessionProgress};
use super::view::{ReviewItem, SessionSnapshot, TIME_WARNING_SECS};

//
// ─── SESSION ───────────────────────────────────────────────────────────────────
//

/// Attempt state for one test, mutated only through intent methods.
///
/// Intent methods never fail. Calls that are illegal for the current phase or
/// name unknown ids leave the state untouched and return `false`.
pub struct ExamSession {
    test: Arc<TestDefinition>,
    clock: Clock,
    phase: Phase,
    current: usize,
    answers: AnswerMap,
    marked: HashSet<QuestionId>,
    time_remaining: u32,
    scorecard: Option<Scorecard>,
    attempt_id: Option<AttemptId>,
    started_at: Option<DateTime<Utc>>,
    submitted_at: Option<DateTime<Utc>>,
}

impl ExamSession {
    /// Create a session in the intro phase.
    #[must_use]
    pub fn new(test: Arc<TestDefinition>, clock: Clock) -> Self {
        let time_remaining = test.total_seconds();
        Self {
            test,
            clock,
            phase: Phase::Intro,
            current: 0,
            answers: AnswerMap::new(),
            marked: HashSet::new(),
            time_remaining,
            scorecard: None,
            attempt_id: None,
            started_at: None,
            submitted_at: None,
        }
    }

    fn reset_attempt(&mut self) {
        self.current = 0;
        self.answers.clear();
        self.marked.clear();
        self.time_remaining = self.test.total_seconds();
        self.scorecard = None;
        self.attempt_id = None;
        self.started_at = None;
        self.submitted_at = None;
    }

    fn transition(&mut self, next: Phase) -> bool {
        if !self.phase.can_transition_to(next) {
            tracing::debug!(from = ?self.phase, to = ?next, "ignored illegal phase transition");
            return false;
        }
        tracing::debug!(from = ?self.phase, to = ?next, test = %self.test.slug(), "phase change");
        self.phase = next;
        true
    }

    fn is_active(&self) -> bool {
        self.phase == Phase::Active
    }

    // ─── Intents ───────────────────────────────────────────────────────────────

    /// Begin a fresh attempt from the intro or review phase.
    pub fn start(&mut self) -> bool {
        if !self.transition(Phase::Active) {
            return false;
        }
        self.reset_attempt();
        let attempt_id = AttemptId::new_v4();
        self.attempt_id = Some(attempt_id);
        self.started_at = Some(self.clock.now());
        tracing::info!(test = %self.test.slug(), attempt = %attempt_id, "attempt started");
        true
    }

    /// Return from review to the intro screen with cleared state.
    pub fn retake(&mut self) -> bool {
        if !self.transition(Phase::Intro) {
            return false;
        }
        self.reset_attempt();
        true
    }

    /// Record `option` as the answer to `question`, replacing any earlier one.
    pub fn select_option(&mut self, question: &QuestionId, option: &OptionId) -> bool {
        if !self.is_active() {
            return false;
        }
        let Some(q) = self.test.question_by_id(question) else {
            tracing::debug!(%question, "ignored answer for unknown question");
            return false;
        };
        if !q.has_option(option) {
            tracing::debug!(%question, %option, "ignored unknown option");
            return false;
        }
        self.answers.insert(question.clone(), option.clone());
        true
    }

    /// Remove the answer for `question`, if any.
    pub fn clear_answer(&mut self, question: &QuestionId) -> bool {
        if !self.is_active() {
            return false;
        }
        self.answers.remove(question).is_some()
    }

    /// Flip the marked-for-review flag of `question`.
    pub fn toggle_mark(&mut self, question: &QuestionId) -> bool {
        if !self.is_active() || self.test.question_by_id(question).is_none() {
            return false;
        }
        if !self.marked.remove(question) {
            self.marked.insert(question.clone());
        }
        true
    }

    /// Jump to `index`, clamped to the question range. Returns the new index.
    pub fn go_to(&mut self, index: i64) -> usize {
        if self.is_active() {
            let last = self.test.question_count().saturating_sub(1);
            let clamped = index.clamp(0, i64::try_from(last).unwrap_or(i64::MAX));
            self.current = usize::try_from(clamped).unwrap_or(0);
        }
        self.current
    }

    /// Move to the next question; stays put on the last one.
    pub fn next(&mut self) -> usize {
        let target = i64::try_from(self.current).unwrap_or(i64::MAX).saturating_add(1);
        self.go_to(target)
    }

    /// Move to the previous question; stays put on the first one.
    pub fn prev(&mut self) -> usize {
        let target = i64::try_from(self.current).unwrap_or(0) - 1;
        self.go_to(target)
    }

    /// Count down one second, never below zero.
    pub fn tick(&mut self) -> bool {
        if !self.is_active() || self.time_remaining == 0 {
            return false;
        }
        self.time_remaining -= 1;
        true
    }

    /// Score the attempt and enter the review phase.
    ///
    /// Only the first submission of an attempt is honoured; later calls return
    /// `None` and leave the stored scorecard untouched.
    pub fn submit(&mut self, kind: SubmissionKind) -> Option<&Scorecard> {
        if !self.is_active() {
            tracing::debug!(?kind, phase = ?self.phase, "ignored submit outside active phase");
            return None;
        }
        let elapsed = self.test.total_seconds().saturating_sub(self.time_remaining);
        let card = scoring::score(
            self.test.questions(),
            &self.answers,
            self.test.marking(),
            elapsed,
            kind,
        );
        self.transition(Phase::Review);
        self.submitted_at = Some(self.clock.now());
        tracing::info!(
            test = %self.test.slug(),
            score = card.score(),
            correct = card.correct(),
            incorrect = card.incorrect(),
            unanswered = card.unanswered(),
            forced = card.is_forced(),
            "attempt submitted"
        );
        self.scorecard = Some(card);
        self.scorecard.as_ref()
    }

    // ─── Read-only views ───────────────────────────────────────────────────────

    #[must_use]
    pub fn test(&self) -> &TestDefinition {
        &self.test
    }

    #[must_use]
    pub fn phase(&self) -> Phase {
        self.phase
    }

    #[must_use]
    pub fn current_index(&self) -> usize {
        self.current
    }

    #[must_use]
    pub fn current_question(&self) -> Option<&Question> {
        self.test.question(self.current)
    }

    #[must_use]
    pub fn answers(&self) -> &AnswerMap {
        &self.answers
    }

    #[must_use]
    pub fn answer_for(&self, question: &QuestionId) -> Option<&OptionId> {
        self.answers.get(question)
    }

    #[must_use]
    pub fn is_marked(&self, question: &QuestionId) -> bool {
        self.marked.contains(question)
    }

    #[must_use]
    pub fn time_remaining_secs(&self) -> u32 {
        self.time_remaining
    }

    /// Active with the countdown at zero: the next step is a forced submit.
    #[must_use]
    pub fn is_expired(&self) -> bool {
        self.is_active() && self.time_remaining == 0
    }

    #[must_use]
    pub fn is_time_warning(&self) -> bool {
        self.is_active() && self.time_remaining <= TIME_WARNING_SECS
    }

    #[must_use]
    pub fn scorecard(&self) -> Option<&Scorecard> {
        self.scorecard.as_ref()
    }

    #[must_use]
    pub fn attempt_id(&self) -> Option<AttemptId> {
        self.attempt_id
    }

    #[must_use]
    pub fn started_at(&self) -> Option<DateTime<Utc>> {
        self.started_at
    }

    #[must_use]
    pub fn submitted_at(&self) -> Option<DateTime<Utc>> {
        self.submitted_at
    }

    #[must_use]
    pub fn attempted_count(&self) -> usize {
        self.answers.len()
    }

    #[must_use]
    pub fn progress(&self) -> SessionProgress {
        SessionProgress::new(
            self.test.question_count(),
            self.attempted_count(),
            self.marked.len(),
        )
    }

    /// Navigator status of the question at `index`.
    #[must_use]
    pub fn navigator_status(&self, index: usize) -> Option<NavigatorStatus> {
        let question = self.test.question(index)?;
        Some(NavigatorStatus::resolve(
            index == self.current,
            self.marked.contains(question.id()),
            self.answers.contains_key(question.id()),
        ))
    }

    #[must_use]
    pub fn navigator(&self) -> Vec<NavigatorStatus> {
        (0..self.test.question_count())
            .filter_map(|index| self.navigator_status(index))
            .collect()
    }

    /// Per-question breakdown. Empty until the attempt is submitted.
    #[must_use]
    pub fn review_items(&self) -> Vec<ReviewItem> {
        if self.phase != Phase::Review {
            return Vec::new();
        }
        self.test
            .questions()
            .iter()
            .enumerate()
            .map(|(index, question)| ReviewItem {
                number: index + 1,
                question_id: question.id().clone(),
                prompt: question.prompt().to_string(),
                topic: question.topic().to_string(),
                difficulty: question.difficulty(),
                chosen_label: self
                    .answers
                    .get(question.id())
                    .and_then(|chosen| question.option_label(chosen))
                    .map(str::to_string),
                correct_label: question.correct_label().to_string(),
                explanation: question.explanation().to_string(),
                outcome: scoring::classify(question, &self.answers),
            })
            .collect()
    }

    #[must_use]
    pub fn snapshot(&self) -> SessionSnapshot {
        SessionSnapshot {
            phase: self.phase,
            attempt_id: self.attempt_id,
            current_index: self.current,
            selected: self
                .current_question()
                .and_then(|question| self.answers.get(question.id()))
                .cloned(),
            current_marked: self
                .current_question()
                .is_some_and(|question| self.marked.contains(question.id())),
            progress: self.progress(),
            navigator: self.navigator(),
            time_remaining_secs: self.time_remaining,
            time_warning: self.is_time_warning(),
            scorecard: self.scorecard.clone(),
            review: self.review_items(),
        }
    }
}

impl fmt::Debug for ExamSession {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("ExamSession")
            .field("test", self.test.slug())
            .field("phase", &self.phase)
            .field("current", &self.current)
            .field("answers_len", &self.answers.len())
            .field("marked_len", &self.marked.len())
            .field("time_remaining", &self.time_remaining)
            .field("attempt_id", &self.attempt_id)
            .finish_non_exhaustive()
    }
}

//
// ─── TESTS ─────────────────────────────────────────────────────────────────────
//
