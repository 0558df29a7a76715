use std::sync::Arc;
use std::time::Duration;

use async_trait::async_trait;
use exam_core::model::{
    AnswerOption, Category, Difficulty, MarkingScheme, OptionId, Phase, QuestionDraft, QuestionId,
    SubmissionKind, TestDefinition, TestDraft, TestSlug,
};
use exam_core::time::fixed_clock;
use services::{
    CatalogError, CatalogService, ExamSession, SessionConfig, SessionHandle, SessionIntent,
    SessionRunner,
};
use storage::repository::{CatalogRepository, InMemoryCatalog, StorageError};

fn question(id: &str, answer: &str) -> QuestionDraft {
    QuestionDraft {
        id: QuestionId::new(id),
        prompt: format!("Prompt for {id}"),
        topic: "Arithmetic".into(),
        difficulty: Difficulty::Easy,
        options: vec![
            AnswerOption::new("a", "Alpha"),
            AnswerOption::new("b", "Beta"),
            AnswerOption::new("c", "Gamma"),
        ],
        answer: OptionId::new(answer),
        explanation: String::new(),
    }
}

fn two_question_test() -> TestDefinition {
    TestDraft {
        slug: TestSlug::new("two-question-drill"),
        title: "Two Question Drill".into(),
        description: String::new(),
        category: Category::Ssc,
        duration_minutes: 1,
        questions: vec![question("q1", "a"), question("q2", "b")],
        marking: MarkingScheme::new(2.0, -0.5, 0.0).unwrap(),
        instructions: Vec::new(),
    }
    .validate()
    .unwrap()
}

fn spawn() -> SessionHandle {
    let session = ExamSession::new(Arc::new(two_question_test()), fixed_clock());
    let (handle, _task) = SessionRunner::spawn(session, SessionConfig::default());
    handle
}

fn select(question: &str, option: &str) -> SessionIntent {
    SessionIntent::SelectOption {
        question: QuestionId::new(question),
        option: OptionId::new(option),
    }
}

#[tokio::test(start_paused = true)]
async fn manual_submit_scores_elapsed_time() {
    let mut handle = spawn();
    handle.dispatch(SessionIntent::Start).await.unwrap();
    handle.dispatch(select("q1", "a")).await.unwrap();

    tokio::time::sleep(Duration::from_millis(45_500)).await;
    handle.dispatch(SessionIntent::Submit).await.unwrap();

    let snapshot = handle
        .wait_for(|s| s.phase == Phase::Review)
        .await
        .unwrap();
    let card = snapshot.scorecard.unwrap();
    assert_eq!(card.score(), 2.0);
    assert_eq!(card.accuracy(), 100.0);
    assert_eq!(card.time_taken_secs(), 45);
    assert_eq!(card.submission(), SubmissionKind::Manual);
    assert!(!card.is_forced());
}

#[tokio::test(start_paused = true)]
async fn timeout_auto_submits_once() {
    let mut handle = spawn();
    handle.dispatch(SessionIntent::Start).await.unwrap();
    handle.dispatch(select("q1", "c")).await.unwrap();
    handle.dispatch(select("q2", "b")).await.unwrap();

    let snapshot = handle
        .wait_for(|s| s.phase == Phase::Review)
        .await
        .unwrap();
    let card = snapshot.scorecard.clone().unwrap();
    assert_eq!(card.score(), 1.5);
    assert_eq!(card.accuracy(), 50.0);
    assert_eq!(card.time_taken_secs(), 60);
    assert!(card.is_forced());
    assert_eq!(snapshot.time_remaining_secs, 0);
    assert_eq!(snapshot.clock_label(), "00:00");

    // no second submission, manual or forced
    tokio::time::sleep(Duration::from_secs(10)).await;
    handle.dispatch(SessionIntent::Submit).await.unwrap();
    tokio::time::sleep(Duration::from_secs(1)).await;
    let later = handle.snapshot();
    assert_eq!(later.phase, Phase::Review);
    assert_eq!(later.scorecard, Some(card));
}

#[tokio::test(start_paused = true)]
async fn attempt_again_restarts_the_clock() {
    let mut handle = spawn();
    handle.dispatch(SessionIntent::Start).await.unwrap();
    tokio::time::sleep(Duration::from_millis(30_500)).await;
    handle.dispatch(SessionIntent::Submit).await.unwrap();
    let first = handle
        .wait_for(|s| s.phase == Phase::Review)
        .await
        .unwrap();

    handle.dispatch(SessionIntent::Start).await.unwrap();
    let fresh = handle
        .wait_for(|s| s.phase == Phase::Active)
        .await
        .unwrap();
    assert_eq!(fresh.time_remaining_secs, 60);
    assert_eq!(fresh.progress.attempted, 0);
    assert_ne!(fresh.attempt_id, first.attempt_id);

    // a leftover ticker would make the clock run twice as fast
    tokio::time::sleep(Duration::from_millis(10_500)).await;
    assert_eq!(handle.snapshot().time_remaining_secs, 50);
}

#[tokio::test(start_paused = true)]
async fn retake_returns_to_intro_without_ticking() {
    let mut handle = spawn();
    handle.dispatch(SessionIntent::Start).await.unwrap();
    handle.dispatch(SessionIntent::Submit).await.unwrap();
    handle.dispatch(SessionIntent::Retake).await.unwrap();

    let intro = handle
        .wait_for(|s| s.phase == Phase::Intro)
        .await
        .unwrap();
    assert_eq!(intro.time_remaining_secs, 60);

    tokio::time::sleep(Duration::from_secs(5)).await;
    assert_eq!(handle.snapshot().time_remaining_secs, 60);
}

#[tokio::test(start_paused = true)]
async fn runner_stops_on_shutdown() {
    let session = ExamSession::new(Arc::new(two_question_test()), fixed_clock());
    let (handle, task) = SessionRunner::spawn(session, SessionConfig::default());
    handle.dispatch(SessionIntent::Start).await.unwrap();
    handle.shutdown().await.unwrap();

    let session = task.await.unwrap();
    assert_eq!(session.phase(), Phase::Active);
    assert!(handle.dispatch(SessionIntent::Next).await.is_err());
}

#[tokio::test]
async fn catalog_lookup_reports_missing_tests() {
    let catalog = InMemoryCatalog::from_tests(vec![two_question_test()]).unwrap();
    let service = CatalogService::new(fixed_clock(), Arc::new(catalog));

    let found = service
        .find(&TestSlug::new("two-question-drill"))
        .await
        .unwrap();
    assert_eq!(found.question_count(), 2);

    match service.find(&TestSlug::new("missing")).await {
        Err(CatalogError::NotFound { slug }) => assert_eq!(slug.as_str(), "missing"),
        other => panic!("expected not found, got {other:?}"),
    }
}

struct BrokenCatalog;

#[async_trait]
impl CatalogRepository for BrokenCatalog {
    async fn list_tests(&self) -> Result<Vec<TestDefinition>, StorageError> {
        Err(StorageError::Connection("offline".into()))
    }

    async fn get_test(&self, _slug: &TestSlug) -> Result<TestDefinition, StorageError> {
        Err(StorageError::Connection("offline".into()))
    }
}

#[tokio::test]
async fn storage_failures_are_not_reported_as_missing() {
    let service = CatalogService::new(fixed_clock(), Arc::new(BrokenCatalog));
    let err = service
        .open_session(&TestSlug::new("anything"))
        .await
        .unwrap_err();
    assert!(matches!(err, CatalogError::Storage(_)));
}
