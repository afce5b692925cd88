use std::sync::Arc;

use services::{AdvanceOutcome, SessionFlowService, SessionHistoryService, SessionPhase};
use storage::repository::{InMemoryRepository, TemplateRepository};
use wellness_core::model::{
    AnswerValue, Branch, MoodCapture, OptionId, Question, QuestionId, QuestionOption, Template,
    TemplateId,
};
use wellness_core::time::{fixed_clock, fixed_now};

fn seed_template() -> Template {
    let options = vec![
        QuestionOption::new(OptionId::new("yes"), "Yes", "yes"),
        QuestionOption::new(OptionId::new("no"), "No", "no"),
    ];
    let q1 = Question::multiple_choice(
        QuestionId::new("q1"),
        "Did anything trigger anxiety today?",
        options,
    )
    .unwrap()
    .with_required(true)
    .unwrap()
    .with_branches(vec![Branch::new(OptionId::new("no"), QuestionId::new("q3"))])
    .unwrap();
    let q2 = Question::free_text(QuestionId::new("q2"), "Describe the trigger").unwrap();
    let q3 = Question::free_text(QuestionId::new("q3"), "One thing that went well?").unwrap();

    Template::new(
        TemplateId::new("daily-checkin"),
        "Daily Check-in",
        None,
        vec![q1, q2, q3],
        fixed_now(),
    )
    .unwrap()
}

#[tokio::test]
async fn session_flow_persists_branched_result() {
    let repo = InMemoryRepository::new();
    repo.upsert_template(&seed_template()).await.unwrap();

    let flow = SessionFlowService::new(
        fixed_clock(),
        Arc::new(repo.clone()),
        Arc::new(repo.clone()),
    );
    let history = SessionHistoryService::new(Arc::new(repo.clone()));

    let mut runner = flow
        .start_session(&TemplateId::new("daily-checkin"))
        .await
        .unwrap();

    // "no" branches straight past the trigger description.
    runner
        .record_answer(QuestionId::new("q1"), AnswerValue::text("no"))
        .unwrap();
    assert_eq!(
        runner.advance().unwrap(),
        AdvanceOutcome::Moved(QuestionId::new("q3"))
    );

    runner
        .record_answer(QuestionId::new("q3"), AnswerValue::text("a calm walk"))
        .unwrap();
    assert_eq!(runner.advance().unwrap(), AdvanceOutcome::AwaitingMoodCapture);

    let capture = MoodCapture::new(4, "steadier than yesterday").unwrap();
    let result = flow.complete_session(&mut runner, capture).await.unwrap();
    assert_eq!(runner.phase(), SessionPhase::Completed);

    let recent = history.list_recent(10).await.unwrap();
    assert_eq!(recent.len(), 1);
    let stored = &recent[0];
    assert_eq!(stored.session_id(), result.session_id());
    assert_eq!(stored.template_title(), "Daily Check-in");
    assert_eq!(
        stored.path_taken(),
        &[QuestionId::new("q1"), QuestionId::new("q3")]
    );
    assert_eq!(stored.mood_value(), Some(4));
    assert_eq!(stored.mood_note(), Some("steadier than yesterday"));
    assert_eq!(
        stored.answer(&QuestionId::new("q3")),
        Some(&AnswerValue::text("a calm walk"))
    );
}

#[tokio::test]
async fn retry_persist_is_idempotent_after_success() {
    let repo = InMemoryRepository::new();
    repo.upsert_template(&seed_template()).await.unwrap();

    let flow = SessionFlowService::new(
        fixed_clock(),
        Arc::new(repo.clone()),
        Arc::new(repo.clone()),
    );
    let history = SessionHistoryService::new(Arc::new(repo.clone()));

    let mut runner = flow
        .start_session(&TemplateId::new("daily-checkin"))
        .await
        .unwrap();
    runner
        .record_answer(QuestionId::new("q1"), AnswerValue::text("no"))
        .unwrap();
    runner.advance().unwrap();
    runner.advance().unwrap();

    flow.complete_session(&mut runner, MoodCapture::new(3, "").unwrap())
        .await
        .unwrap();

    // The first write landed; retrying must not duplicate the result.
    flow.retry_persist(&runner).await.unwrap();
    assert_eq!(history.list_recent(10).await.unwrap().len(), 1);
}

#[tokio::test]
async fn starting_a_missing_template_is_not_found() {
    let repo = InMemoryRepository::new();
    let flow = SessionFlowService::new(
        fixed_clock(),
        Arc::new(repo.clone()),
        Arc::new(repo),
    );

    let err = flow
        .start_session(&TemplateId::new("missing"))
        .await
        .unwrap_err();
    assert!(matches!(
        err,
        services::SessionError::Storage(storage::StorageError::NotFound)
    ));
}
