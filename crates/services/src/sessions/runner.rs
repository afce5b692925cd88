use chrono::{DateTime, Utc};
use std::fmt;

use wellness_core::model::{
    AnswerMap, AnswerValue, MOOD_NOTE_KEY, MOOD_VALUE_KEY, MoodCapture, Question, QuestionId,
    SessionId, SessionResult, Template,
};
use wellness_core::routing;

use super::progress::SessionProgress;
use crate::error::SessionError;

//
// ─── PHASES AND OUTCOMES ───────────────────────────────────────────────────────
//

/// Lifecycle phase of a running session.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum SessionPhase {
    /// Walking the template's questions.
    InProgress,
    /// Past the last question; the mood check-in is due.
    AwaitingMoodCapture,
    /// Result emitted; the runner is spent.
    Completed,
}

/// What a call to [`SessionRunner::advance`] did.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum AdvanceOutcome {
    /// Moved to the next question, branch-aware.
    Moved(QuestionId),
    /// End of the question path; the mood check-in is now due.
    AwaitingMoodCapture,
    /// The current question is required and unanswered; nothing changed.
    RequiredUnanswered,
}

/// What a call to [`SessionRunner::back`] did.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum BackOutcome {
    /// Returned to the previously visited question.
    Moved(QuestionId),
    /// Nothing to step back to; nothing changed.
    AtStart,
}

//
// ─── SESSION RUNNER ────────────────────────────────────────────────────────────
//

/// Walks a patient through one template instance.
///
/// Holds the current question pointer, the answers collected so far, and the
/// realized navigation history. Branch tables are consulted only when moving
/// forward; stepping back trusts the recorded history, which is why every
/// forward move pushes onto it first.
pub struct SessionRunner {
    template: Template,
    current: QuestionId,
    answers: AnswerMap,
    history: Vec<QuestionId>,
    phase: SessionPhase,
    started_at: DateTime<Utc>,
    result: Option<SessionResult>,
}

impl SessionRunner {
    /// Start a session at the template's first question.
    ///
    /// `started_at` should come from the services layer clock.
    ///
    /// # Errors
    ///
    /// Returns `SessionError::EmptyTemplate` if the template has no questions.
    pub fn start(template: Template, started_at: DateTime<Utc>) -> Result<Self, SessionError> {
        let Some(first) = template.first_question() else {
            return Err(SessionError::EmptyTemplate);
        };
        let current = first.id().clone();

        Ok(Self {
            template,
            current,
            answers: AnswerMap::new(),
            history: Vec::new(),
            phase: SessionPhase::InProgress,
            started_at,
            result: None,
        })
    }

    fn forbid_completed(&self, operation: &'static str) -> Result<(), SessionError> {
        if self.phase == SessionPhase::Completed {
            return Err(SessionError::InvalidState {
                operation,
                phase: self.phase,
            });
        }
        Ok(())
    }

    /// Record (or overwrite) the answer for a question.
    ///
    /// Does not move the pointer and performs no validation; the required
    /// gate is checked at [`SessionRunner::advance`] time.
    ///
    /// # Errors
    ///
    /// Returns `SessionError::InvalidState` once the session has completed.
    pub fn record_answer(
        &mut self,
        question_id: QuestionId,
        value: AnswerValue,
    ) -> Result<(), SessionError> {
        self.forbid_completed("record_answer")?;
        self.answers.insert(question_id, value);
        Ok(())
    }

    /// Toggle one value in a checkbox answer: absent values are added,
    /// present ones removed. Toggling never triggers branching.
    ///
    /// # Errors
    ///
    /// Returns `SessionError::InvalidState` once the session has completed.
    pub fn toggle_selection(
        &mut self,
        question_id: QuestionId,
        value: impl Into<String>,
    ) -> Result<(), SessionError> {
        self.forbid_completed("toggle_selection")?;
        let value = value.into();
        let entry = self
            .answers
            .entry(question_id)
            .or_insert_with(|| AnswerValue::Selections(Vec::new()));
        if let AnswerValue::Selections(values) = entry {
            if let Some(index) = values.iter().position(|v| *v == value) {
                values.remove(index);
            } else {
                values.push(value);
            }
        } else {
            // A stray scalar under this key gets replaced by a fresh set.
            *entry = AnswerValue::Selections(vec![value]);
        }
        Ok(())
    }

    /// Move past the current question.
    ///
    /// A required question without a usable answer holds the pointer in
    /// place. Otherwise the next question is resolved branch-first, the
    /// current id is pushed onto the history, and the runner either moves on
    /// or, at the end of the path, starts awaiting the mood check-in.
    ///
    /// # Errors
    ///
    /// Returns `SessionError::InvalidState` outside the in-progress phase.
    pub fn advance(&mut self) -> Result<AdvanceOutcome, SessionError> {
        if self.phase != SessionPhase::InProgress {
            return Err(SessionError::InvalidState {
                operation: "advance",
                phase: self.phase,
            });
        }
        let Some(question) = self.template.question(&self.current) else {
            return Err(SessionError::InvalidState {
                operation: "advance",
                phase: self.phase,
            });
        };

        let answer = self.answers.get(&self.current);
        if question.required() && answer.is_none_or(AnswerValue::is_empty) {
            return Ok(AdvanceOutcome::RequiredUnanswered);
        }

        let next = routing::next_question_id(&self.template, question, answer);
        self.history.push(self.current.clone());
        match next {
            Some(next_id) => {
                self.current = next_id.clone();
                Ok(AdvanceOutcome::Moved(next_id))
            }
            None => {
                self.phase = SessionPhase::AwaitingMoodCapture;
                Ok(AdvanceOutcome::AwaitingMoodCapture)
            }
        }
    }

    /// Step back to the previously visited question.
    ///
    /// Pops the history rather than re-deriving branches in reverse: when
    /// several questions branch to the same target, only the recorded path
    /// says which one was actually taken. Answers stay put, so the restored
    /// question shows its prior input. A back-step out of the mood check-in
    /// returns the session to the question flow.
    ///
    /// # Errors
    ///
    /// Returns `SessionError::InvalidState` once the session has completed.
    pub fn back(&mut self) -> Result<BackOutcome, SessionError> {
        self.forbid_completed("back")?;
        let Some(previous) = self.history.pop() else {
            return Ok(BackOutcome::AtStart);
        };
        self.current = previous.clone();
        self.phase = SessionPhase::InProgress;
        Ok(BackOutcome::Moved(previous))
    }

    /// Finish the session with the mood check-in and emit its result.
    ///
    /// The capture is merged into the answers under the reserved keys, a
    /// session id is minted, and the realized path is frozen. The runner
    /// moves to `Completed` and refuses further operations.
    ///
    /// `completed_at` should come from the services layer clock.
    ///
    /// # Errors
    ///
    /// Returns `SessionError::InvalidState` unless the runner is awaiting the
    /// mood check-in; in particular, completing twice fails and leaves the
    /// first result untouched.
    pub fn complete_mood_capture(
        &mut self,
        capture: MoodCapture,
        completed_at: DateTime<Utc>,
    ) -> Result<&SessionResult, SessionError> {
        if self.phase != SessionPhase::AwaitingMoodCapture {
            return Err(SessionError::InvalidState {
                operation: "complete_mood_capture",
                phase: self.phase,
            });
        }

        self.answers.insert(
            QuestionId::new(MOOD_VALUE_KEY),
            AnswerValue::number(f64::from(capture.value())),
        );
        self.answers
            .insert(QuestionId::new(MOOD_NOTE_KEY), AnswerValue::text(capture.note()));

        // The terminal advance already pushed the final question, so the
        // history is the full realized path.
        let result = SessionResult::from_persisted(
            SessionId::generate(),
            self.template.id().clone(),
            self.template.title(),
            completed_at,
            self.answers.clone(),
            self.history.clone(),
        )?;

        self.phase = SessionPhase::Completed;
        Ok(self.result.insert(result))
    }

    /// Abandon the session, discarding all state. No result is emitted and
    /// nothing must be persisted by the caller.
    pub fn exit(self) {}

    // Accessors
    #[must_use]
    pub fn template(&self) -> &Template {
        &self.template
    }

    #[must_use]
    pub fn phase(&self) -> SessionPhase {
        self.phase
    }

    #[must_use]
    pub fn started_at(&self) -> DateTime<Utc> {
        self.started_at
    }

    #[must_use]
    pub fn current_question_id(&self) -> &QuestionId {
        &self.current
    }

    #[must_use]
    pub fn current_question(&self) -> Option<&Question> {
        self.template.question(&self.current)
    }

    #[must_use]
    pub fn answer(&self, question_id: &QuestionId) -> Option<&AnswerValue> {
        self.answers.get(question_id)
    }

    #[must_use]
    pub fn answers(&self) -> &AnswerMap {
        &self.answers
    }

    #[must_use]
    pub fn history(&self) -> &[QuestionId] {
        &self.history
    }

    /// The emitted result, once the session has completed.
    #[must_use]
    pub fn result(&self) -> Option<&SessionResult> {
        self.result.as_ref()
    }

    #[must_use]
    pub fn is_complete(&self) -> bool {
        self.phase == SessionPhase::Completed
    }

    /// Returns a summary of the current session progress.
    #[must_use]
    pub fn progress(&self) -> SessionProgress {
        let total = self.template.question_count();
        let visited = self.history.len();
        let percent = if total == 0 {
            100
        } else {
            u8::try_from((visited * 100 / total).min(100)).unwrap_or(100)
        };
        SessionProgress {
            step: visited + 1,
            total_questions: total,
            percent,
            is_complete: self.is_complete(),
        }
    }
}

impl fmt::Debug for SessionRunner {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("SessionRunner")
            .field("template_id", self.template.id())
            .field("current", &self.current)
            .field("answers_len", &self.answers.len())
            .field("history_len", &self.history.len())
            .field("phase", &self.phase)
            .field("started_at", &self.started_at)
            .finish_non_exhaustive()
    }
}

//
// ─── TESTS ─────────────────────────────────────────────────────────────────────
//

#[cfg(test)]
mod tests {
    use super::*;
    use wellness_core::model::{Branch, OptionId, QuestionOption, TemplateId};
    use wellness_core::time::fixed_now;

    fn ab_options() -> Vec<QuestionOption> {
        vec![
            QuestionOption::new(OptionId::new("opt-a"), "Option A", "A"),
            QuestionOption::new(OptionId::new("opt-b"), "Option B", "B"),
        ]
    }

    /// q1 (required MCQ A/B, branch A -> q3), q2, q3 (required text).
    fn branching_template() -> Template {
        let q1 = Question::multiple_choice(QuestionId::new("q1"), "Pick one", ab_options())
            .unwrap()
            .with_required(true)
            .unwrap()
            .with_branches(vec![Branch::new(
                OptionId::new("opt-a"),
                QuestionId::new("q3"),
            )])
            .unwrap();
        let q2 = Question::free_text(QuestionId::new("q2"), "Elaborate").unwrap();
        let q3 = Question::free_text(QuestionId::new("q3"), "Anything else?")
            .unwrap()
            .with_required(true)
            .unwrap();

        Template::new(
            TemplateId::new("t1"),
            "Branching screen",
            None,
            vec![q1, q2, q3],
            fixed_now(),
        )
        .unwrap()
    }

    fn linear_template(ids: &[&str]) -> Template {
        let questions = ids
            .iter()
            .map(|id| Question::free_text(QuestionId::new(*id), format!("Prompt {id}")).unwrap())
            .collect();
        Template::new(TemplateId::new("t1"), "Linear", None, questions, fixed_now()).unwrap()
    }

    fn mood(value: u8, note: &str) -> MoodCapture {
        MoodCapture::new(value, note).unwrap()
    }

    #[test]
    fn start_on_empty_template_fails() {
        let template =
            Template::new(TemplateId::new("t1"), "Empty", None, Vec::new(), fixed_now()).unwrap();
        let err = SessionRunner::start(template, fixed_now()).unwrap_err();
        assert!(matches!(err, SessionError::EmptyTemplate));
    }

    #[test]
    fn linear_template_visits_every_question_in_order() {
        let template = linear_template(&["q1", "q2", "q3", "q4"]);
        let mut runner = SessionRunner::start(template, fixed_now()).unwrap();

        assert_eq!(
            runner.advance().unwrap(),
            AdvanceOutcome::Moved(QuestionId::new("q2"))
        );
        assert_eq!(
            runner.advance().unwrap(),
            AdvanceOutcome::Moved(QuestionId::new("q3"))
        );
        assert_eq!(
            runner.advance().unwrap(),
            AdvanceOutcome::Moved(QuestionId::new("q4"))
        );
        assert_eq!(runner.advance().unwrap(), AdvanceOutcome::AwaitingMoodCapture);

        let result = runner
            .complete_mood_capture(mood(3, ""), fixed_now())
            .unwrap();
        assert_eq!(
            result.path_taken(),
            &[
                QuestionId::new("q1"),
                QuestionId::new("q2"),
                QuestionId::new("q3"),
                QuestionId::new("q4"),
            ]
        );
    }

    #[test]
    fn branch_answer_jumps_to_target() {
        let mut runner = SessionRunner::start(branching_template(), fixed_now()).unwrap();

        runner
            .record_answer(QuestionId::new("q1"), AnswerValue::text("A"))
            .unwrap();
        assert_eq!(
            runner.advance().unwrap(),
            AdvanceOutcome::Moved(QuestionId::new("q3"))
        );
        assert_eq!(runner.current_question_id(), &QuestionId::new("q3"));
        assert_eq!(runner.history(), &[QuestionId::new("q1")]);

        runner
            .record_answer(QuestionId::new("q3"), AnswerValue::text("hello"))
            .unwrap();
        assert_eq!(runner.advance().unwrap(), AdvanceOutcome::AwaitingMoodCapture);
        assert_eq!(runner.phase(), SessionPhase::AwaitingMoodCapture);
        assert_eq!(
            runner.history(),
            &[QuestionId::new("q1"), QuestionId::new("q3")]
        );
    }

    #[test]
    fn unmatched_branch_follows_default_order() {
        let mut runner = SessionRunner::start(branching_template(), fixed_now()).unwrap();

        runner
            .record_answer(QuestionId::new("q1"), AnswerValue::text("B"))
            .unwrap();
        assert_eq!(
            runner.advance().unwrap(),
            AdvanceOutcome::Moved(QuestionId::new("q2"))
        );
    }

    #[test]
    fn dangling_branch_target_follows_default_order() {
        let q1 = Question::multiple_choice(QuestionId::new("q1"), "Pick one", ab_options())
            .unwrap()
            .with_branches(vec![Branch::new(
                OptionId::new("opt-a"),
                QuestionId::new("deleted"),
            )])
            .unwrap();
        let q2 = Question::free_text(QuestionId::new("q2"), "Next").unwrap();
        let template = Template::new(
            TemplateId::new("t1"),
            "Dangling",
            None,
            vec![q1, q2],
            fixed_now(),
        )
        .unwrap();

        let mut runner = SessionRunner::start(template, fixed_now()).unwrap();
        runner
            .record_answer(QuestionId::new("q1"), AnswerValue::text("A"))
            .unwrap();
        assert_eq!(
            runner.advance().unwrap(),
            AdvanceOutcome::Moved(QuestionId::new("q2"))
        );
    }

    #[test]
    fn required_gate_holds_pointer() {
        let mut runner = SessionRunner::start(branching_template(), fixed_now()).unwrap();

        assert_eq!(runner.advance().unwrap(), AdvanceOutcome::RequiredUnanswered);
        assert_eq!(runner.current_question_id(), &QuestionId::new("q1"));
        assert!(runner.history().is_empty());

        // A present-but-empty answer is still unanswered.
        runner
            .record_answer(QuestionId::new("q1"), AnswerValue::text(""))
            .unwrap();
        assert_eq!(runner.advance().unwrap(), AdvanceOutcome::RequiredUnanswered);
    }

    #[test]
    fn back_restores_question_and_preserves_answer() {
        let template = linear_template(&["q1", "q2", "q3"]);
        let mut runner = SessionRunner::start(template, fixed_now()).unwrap();

        runner
            .record_answer(QuestionId::new("q1"), AnswerValue::text("v1"))
            .unwrap();
        runner.advance().unwrap();
        runner
            .record_answer(QuestionId::new("q2"), AnswerValue::text("v2"))
            .unwrap();
        runner.advance().unwrap();

        assert_eq!(
            runner.back().unwrap(),
            BackOutcome::Moved(QuestionId::new("q2"))
        );
        assert_eq!(runner.current_question_id(), &QuestionId::new("q2"));
        assert_eq!(
            runner.answer(&QuestionId::new("q2")),
            Some(&AnswerValue::text("v2"))
        );
    }

    #[test]
    fn back_at_start_is_a_no_op() {
        let mut runner = SessionRunner::start(linear_template(&["q1"]), fixed_now()).unwrap();
        assert_eq!(runner.back().unwrap(), BackOutcome::AtStart);
        assert_eq!(runner.current_question_id(), &QuestionId::new("q1"));
    }

    #[test]
    fn back_out_of_mood_capture_resumes_questions() {
        let mut runner = SessionRunner::start(linear_template(&["q1", "q2"]), fixed_now()).unwrap();
        runner.advance().unwrap();
        runner.advance().unwrap();
        assert_eq!(runner.phase(), SessionPhase::AwaitingMoodCapture);

        assert_eq!(
            runner.back().unwrap(),
            BackOutcome::Moved(QuestionId::new("q2"))
        );
        assert_eq!(runner.phase(), SessionPhase::InProgress);
        assert_eq!(runner.current_question_id(), &QuestionId::new("q2"));
        assert_eq!(runner.history(), &[QuestionId::new("q1")]);

        // Advancing again re-records the final step exactly once.
        runner.advance().unwrap();
        assert_eq!(
            runner.history(),
            &[QuestionId::new("q1"), QuestionId::new("q2")]
        );
    }

    #[test]
    fn terminal_advance_awaits_capture_not_completion() {
        let mut runner = SessionRunner::start(linear_template(&["q1"]), fixed_now()).unwrap();
        assert_eq!(runner.advance().unwrap(), AdvanceOutcome::AwaitingMoodCapture);
        assert_eq!(runner.phase(), SessionPhase::AwaitingMoodCapture);
        assert!(!runner.is_complete());
    }

    #[test]
    fn completion_merges_mood_and_freezes_path() {
        let mut runner = SessionRunner::start(branching_template(), fixed_now()).unwrap();
        runner
            .record_answer(QuestionId::new("q1"), AnswerValue::text("A"))
            .unwrap();
        runner.advance().unwrap();
        runner
            .record_answer(QuestionId::new("q3"), AnswerValue::text("hello"))
            .unwrap();
        runner.advance().unwrap();

        let result = runner
            .complete_mood_capture(mood(4, "felt okay"), fixed_now())
            .unwrap()
            .clone();

        assert_eq!(result.mood_value(), Some(4));
        assert_eq!(result.mood_note(), Some("felt okay"));
        assert_eq!(
            result.path_taken(),
            &[QuestionId::new("q1"), QuestionId::new("q3")]
        );
        assert_eq!(result.template_id(), &TemplateId::new("t1"));
        assert_eq!(result.template_title(), "Branching screen");
        assert_eq!(result.completed_at(), fixed_now());
        assert_eq!(runner.phase(), SessionPhase::Completed);
        assert!(runner.is_complete());
    }

    #[test]
    fn completing_twice_fails_and_keeps_first_result() {
        let mut runner = SessionRunner::start(linear_template(&["q1"]), fixed_now()).unwrap();
        runner.advance().unwrap();

        let first = runner
            .complete_mood_capture(mood(2, "rough day"), fixed_now())
            .unwrap()
            .clone();

        let err = runner
            .complete_mood_capture(mood(5, "changed my mind"), fixed_now())
            .unwrap_err();
        assert!(matches!(
            err,
            SessionError::InvalidState {
                operation: "complete_mood_capture",
                phase: SessionPhase::Completed,
            }
        ));
        assert_eq!(runner.result(), Some(&first));
    }

    #[test]
    fn completed_runner_refuses_further_operations() {
        let mut runner = SessionRunner::start(linear_template(&["q1"]), fixed_now()).unwrap();
        runner.advance().unwrap();
        runner
            .complete_mood_capture(mood(3, ""), fixed_now())
            .unwrap();

        assert!(matches!(
            runner.advance().unwrap_err(),
            SessionError::InvalidState { .. }
        ));
        assert!(matches!(
            runner.back().unwrap_err(),
            SessionError::InvalidState { .. }
        ));
        assert!(matches!(
            runner
                .record_answer(QuestionId::new("q1"), AnswerValue::text("late"))
                .unwrap_err(),
            SessionError::InvalidState { .. }
        ));
    }

    #[test]
    fn capture_before_end_of_path_fails() {
        let mut runner = SessionRunner::start(linear_template(&["q1", "q2"]), fixed_now()).unwrap();
        let err = runner
            .complete_mood_capture(mood(3, ""), fixed_now())
            .unwrap_err();
        assert!(matches!(
            err,
            SessionError::InvalidState {
                phase: SessionPhase::InProgress,
                ..
            }
        ));
    }

    #[test]
    fn toggle_selection_adds_and_removes_values() {
        let options = vec![
            QuestionOption::new(OptionId::new("sleep"), "Sleep", "sleep"),
            QuestionOption::new(OptionId::new("energy"), "Energy", "energy"),
        ];
        let q1 = Question::checkbox(QuestionId::new("q1"), "Symptoms?", options).unwrap();
        let template =
            Template::new(TemplateId::new("t1"), "Check", None, vec![q1], fixed_now()).unwrap();
        let mut runner = SessionRunner::start(template, fixed_now()).unwrap();

        runner.toggle_selection(QuestionId::new("q1"), "sleep").unwrap();
        runner.toggle_selection(QuestionId::new("q1"), "energy").unwrap();
        assert_eq!(
            runner.answer(&QuestionId::new("q1")),
            Some(&AnswerValue::selections(["sleep", "energy"]))
        );

        runner.toggle_selection(QuestionId::new("q1"), "sleep").unwrap();
        assert_eq!(
            runner.answer(&QuestionId::new("q1")),
            Some(&AnswerValue::selections(["energy"]))
        );
    }

    #[test]
    fn progress_tracks_visited_share() {
        let mut runner =
            SessionRunner::start(linear_template(&["q1", "q2", "q3", "q4"]), fixed_now()).unwrap();

        let progress = runner.progress();
        assert_eq!(progress.step, 1);
        assert_eq!(progress.total_questions, 4);
        assert_eq!(progress.percent, 0);

        runner.advance().unwrap();
        runner.advance().unwrap();
        let progress = runner.progress();
        assert_eq!(progress.step, 3);
        assert_eq!(progress.percent, 50);
        assert!(!progress.is_complete);
    }

    #[test]
    fn overwriting_an_answer_keeps_last_write() {
        let mut runner = SessionRunner::start(linear_template(&["q1", "q2"]), fixed_now()).unwrap();
        runner
            .record_answer(QuestionId::new("q1"), AnswerValue::text("first"))
            .unwrap();
        runner
            .record_answer(QuestionId::new("q1"), AnswerValue::text("second"))
            .unwrap();
        assert_eq!(
            runner.answer(&QuestionId::new("q1")),
            Some(&AnswerValue::text("second"))
        );
    }
}
