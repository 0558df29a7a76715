//! Pure scoring of a submitted attempt.

use crate::model::{AnswerMap, AnswerOutcome, MarkingScheme, Question, Scorecard, SubmissionKind};

/// Classify one question against the recorded answers.
#[must_use]
pub fn classify(question: &Question, answers: &AnswerMap) -> AnswerOutcome {
    match answers.get(question.id()) {
        None => AnswerOutcome::Unanswered,
        Some(chosen) if question.is_correct(chosen) => AnswerOutcome::Correct,
        Some(_) => AnswerOutcome::Incorrect,
    }
}

/// Score an attempt.
///
/// Total is `correct * scheme.correct + incorrect * scheme.incorrect +
/// unanswered * scheme.unanswered`. Accuracy is `correct / attempted * 100`,
/// or 0 when nothing was attempted. No rounding is applied.
///
/// Answers for ids not present in `questions` are ignored.
#[must_use]
pub fn score(
    questions: &[Question],
    answers: &AnswerMap,
    scheme: &MarkingScheme,
    elapsed_secs: u32,
    submission: SubmissionKind,
) -> Scorecard {
    let mut correct = 0_u32;
    let mut incorrect = 0_u32;
    let mut unanswered = 0_u32;

    for question in questions {
        match classify(question, answers) {
            AnswerOutcome::Correct => correct = correct.saturating_add(1),
            AnswerOutcome::Incorrect => incorrect = incorrect.saturating_add(1),
            AnswerOutcome::Unanswered => unanswered = unanswered.saturating_add(1),
        }
    }

    let total = f64::from(correct) * scheme.correct()
        + f64::from(incorrect) * scheme.incorrect()
        + f64::from(unanswered) * scheme.unanswered();

    let attempted = correct + incorrect;
    let accuracy = if attempted == 0 {
        0.0
    } else {
        f64::from(correct) / f64::from(attempted) * 100.0
    };

    Scorecard::new(
        total,
        correct,
        incorrect,
        unanswered,
        accuracy,
        elapsed_secs,
        submission,
    )
}

//
// ─── TESTS ─────────────────────────────────────────────────────────────────────
//

#[cfg(test)]
mod tests {
    use super::*;
    use crate::model::{AnswerOption, Difficulty, OptionId, QuestionDraft, QuestionId};

    fn question(id: &str, answer: &str) -> Question {
        QuestionDraft {
            id: QuestionId::new(id),
            prompt: format!("Prompt {id}"),
            topic: "General".into(),
            difficulty: Difficulty::Medium,
            options: vec![
                AnswerOption::new("a", "Alpha"),
                AnswerOption::new("b", "Beta"),
                AnswerOption::new("c", "Gamma"),
            ],
            answer: OptionId::new(answer),
            explanation: String::new(),
        }
        .validate()
        .unwrap()
    }

    fn questions() -> Vec<Question> {
        vec![question("q1", "a"), question("q2", "b"), question("q3", "c")]
    }

    fn scheme() -> MarkingScheme {
        MarkingScheme::new(2.0, -0.5, 0.0).unwrap()
    }

    fn answer(map: &mut AnswerMap, q: &str, o: &str) {
        map.insert(QuestionId::new(q), OptionId::new(o));
    }

    #[test]
    fn all_unanswered() {
        let qs = questions();
        let weighted = MarkingScheme::new(1.0, -0.25, -0.1).unwrap();
        for scheme in [scheme(), weighted] {
            let card = score(&qs, &AnswerMap::new(), &scheme, 0, SubmissionKind::Manual);
            assert_eq!(card.correct(), 0);
            assert_eq!(card.incorrect(), 0);
            assert_eq!(card.unanswered(), 3);
            assert_eq!(card.accuracy(), 0.0);
            assert_eq!(card.score(), 3.0 * scheme.unanswered());
        }
    }

    #[test]
    fn all_correct() {
        let qs = questions();
        let mut answers = AnswerMap::new();
        for q in &qs {
            answers.insert(q.id().clone(), q.answer().clone());
        }
        let card = score(&qs, &answers, &scheme(), 30, SubmissionKind::Manual);
        assert_eq!(card.correct(), 3);
        assert_eq!(card.score(), 6.0);
        assert_eq!(card.accuracy(), 100.0);
    }

    #[test]
    fn mixed_answers_apply_negative_marking() {
        let qs = questions();
        let mut answers = AnswerMap::new();
        answer(&mut answers, "q1", "a");
        answer(&mut answers, "q2", "c");
        let card = score(&qs, &answers, &scheme(), 90, SubmissionKind::Timeout);

        assert_eq!(card.correct(), 1);
        assert_eq!(card.incorrect(), 1);
        assert_eq!(card.unanswered(), 1);
        assert_eq!(card.score(), 1.5);
        assert_eq!(card.accuracy(), 50.0);
        assert_eq!(card.time_taken_secs(), 90);
        assert!(card.is_forced());
    }

    #[test]
    fn accuracy_is_not_rounded() {
        let qs = questions();
        let mut answers = AnswerMap::new();
        answer(&mut answers, "q1", "a");
        answer(&mut answers, "q2", "a");
        answer(&mut answers, "q3", "a");
        let card = score(&qs, &answers, &scheme(), 0, SubmissionKind::Manual);
        assert!((card.accuracy() - 100.0 / 3.0).abs() < 1e-12);
        assert_eq!(card.score(), 2.0 - 0.5 - 0.5);
    }

    #[test]
    fn answers_for_unknown_questions_are_ignored() {
        let qs = questions();
        let mut answers = AnswerMap::new();
        answer(&mut answers, "q99", "a");
        let card = score(&qs, &answers, &scheme(), 0, SubmissionKind::Manual);
        assert_eq!(card.unanswered(), 3);
    }

    #[test]
    fn scoring_is_deterministic() {
        let qs = questions();
        let mut answers = AnswerMap::new();
        answer(&mut answers, "q3", "c");
        let first = score(&qs, &answers, &scheme(), 12, SubmissionKind::Manual);
        let second = score(&qs, &answers, &scheme(), 12, SubmissionKind::Manual);
        assert_eq!(first, second);
    }

    #[test]
    fn classify_outcomes() {
        let q = question("q1", "b");
        let mut answers = AnswerMap::new();
        assert_eq!(classify(&q, &answers), AnswerOutcome::Unanswered);
        answer(&mut answers, "q1", "a");
        assert_eq!(classify(&q, &answers), AnswerOutcome::Incorrect);
        answer(&mut answers, "q1", "b");
        assert_eq!(classify(&q, &answers), AnswerOutcome::Correct);
    }
}
