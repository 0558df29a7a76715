use exam_core::model::{
    AnswerOutcome, AttemptId, Difficulty, OptionId, Phase, QuestionId, Scorecard,
};
use serde::Serialize;

use super::progress::{NavigatorStatus, SessionProgress};

/// Remaining seconds shown once the timer turns into a warning.
pub const TIME_WARNING_SECS: u32 = 60;

/// Formats seconds as `mm:ss`. Zero and negative values render as `00:00`.
#[must_use]
pub fn format_clock(seconds: i64) -> String {
    let seconds = seconds.max(0);
    format!("{:02}:{:02}", seconds / 60, seconds % 60)
}

/// One row of the post-submission review list.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct ReviewItem {
    /// 1-based position in the test.
    pub number: usize,
    pub question_id: QuestionId,
    pub prompt: String,
    pub topic: String,
    pub difficulty: Difficulty,
    pub chosen_label: Option<String>,
    pub correct_label: String,
    pub explanation: String,
    pub outcome: AnswerOutcome,
}

impl ReviewItem {
    #[must_use]
    pub fn chosen_display(&self) -> &str {
        self.chosen_label.as_deref().unwrap_or("Not attempted")
    }
}

/// Everything the presentation layer needs to render the current state.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct SessionSnapshot {
    pub phase: Phase,
    pub attempt_id: Option<AttemptId>,
    pub current_index: usize,
    /// Answer recorded for the current question.
    pub selected: Option<OptionId>,
    pub current_marked: bool,
    pub progress: SessionProgress,
    pub navigator: Vec<NavigatorStatus>,
    pub time_remaining_secs: u32,
    pub time_warning: bool,
    pub scorecard: Option<Scorecard>,
    /// Empty until the attempt is submitted.
    pub review: Vec<ReviewItem>,
}

impl SessionSnapshot {
    #[must_use]
    pub fn clock_label(&self) -> String {
        format_clock(i64::from(self.time_remaining_secs))
    }
}
