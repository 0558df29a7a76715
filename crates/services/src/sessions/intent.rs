use exam_core::model::{OptionId, QuestionId, SubmissionKind};

use super::service::ExamSession;

/// User actions the presentation layer dispatches into a session.
#[derive(Clone, Debug, PartialEq, Eq)]
pub enum SessionIntent {
    /// Start from intro, or attempt again from review.
    Start,
    /// Leave review for the intro screen.
    Retake,
    SelectOption {
        question: QuestionId,
        option: OptionId,
    },
    ClearAnswer(QuestionId),
    ToggleMark(QuestionId),
    GoTo(i64),
    Next,
    Prev,
    Submit,
}

impl ExamSession {
    /// Apply one intent. Returns `false` when it had no effect.
    pub fn apply(&mut self, intent: &SessionIntent) -> bool {
        match intent {
            SessionIntent::Start => self.start(),
            SessionIntent::Retake => self.retake(),
            SessionIntent::SelectOption { question, option } => {
                self.select_option(question, option)
            }
            SessionIntent::ClearAnswer(question) => self.clear_answer(question),
            SessionIntent::ToggleMark(question) => self.toggle_mark(question),
            SessionIntent::GoTo(index) => {
                let before = self.current_index();
                self.go_to(*index) != before
            }
            SessionIntent::Next => {
                let before = self.current_index();
                self.next() != before
            }
            SessionIntent::Prev => {
                let before = self.current_index();
                self.prev() != before
            }
            SessionIntent::Submit => self.submit(SubmissionKind::Manual).is_some(),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use exam_core::model::Phase;
    use exam_core::time::fixed_clock;
    use std::sync::Arc;

    fn session() -> ExamSession {
        let tests = storage::sample::sample_tests().unwrap();
        ExamSession::new(Arc::new(tests[0].clone()), fixed_clock())
    }

    #[test]
    fn intents_drive_the_session() {
        let mut s = session();
        assert!(s.apply(&SessionIntent::Start));
        assert!(s.apply(&SessionIntent::SelectOption {
            question: QuestionId::new("q1"),
            option: OptionId::new("b"),
        }));
        assert!(s.apply(&SessionIntent::Next));
        assert!(s.apply(&SessionIntent::ToggleMark(QuestionId::new("q2"))));
        assert!(s.apply(&SessionIntent::Prev));
        assert_eq!(s.current_index(), 0);
        assert!(s.apply(&SessionIntent::Submit));
        assert_eq!(s.phase(), Phase::Review);
        assert!(!s.apply(&SessionIntent::Submit));
        assert!(s.apply(&SessionIntent::Retake));
        assert_eq!(s.phase(), Phase::Intro);
    }

    #[test]
    fn navigation_intent_reports_no_change_at_edges() {
        let mut s = session();
        s.apply(&SessionIntent::Start);
        assert!(!s.apply(&SessionIntent::Prev));
        assert!(!s.apply(&SessionIntent::GoTo(-3)));
        assert!(s.apply(&SessionIntent::GoTo(99)));
        assert!(!s.apply(&SessionIntent::Next));
    }
}
