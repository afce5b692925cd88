use std::sync::Arc;

use storage::repository::{SessionResultRepository, StorageError, TemplateRepository};
use wellness_core::model::{MoodCapture, SessionResult, TemplateId};

use super::runner::SessionRunner;
use crate::Clock;
use crate::error::SessionError;

/// Orchestrates session start and persisted completion.
#[derive(Clone)]
pub struct SessionFlowService {
    clock: Clock,
    templates: Arc<dyn TemplateRepository>,
    results: Arc<dyn SessionResultRepository>,
}

impl SessionFlowService {
    #[must_use]
    pub fn new(
        clock: Clock,
        templates: Arc<dyn TemplateRepository>,
        results: Arc<dyn SessionResultRepository>,
    ) -> Self {
        Self {
            clock,
            templates,
            results,
        }
    }

    /// Start a new session from a stored template.
    ///
    /// # Errors
    ///
    /// Returns `SessionError::Storage` when the template is missing or the
    /// repository fails, and `SessionError::EmptyTemplate` for a template
    /// with no questions.
    pub async fn start_session(
        &self,
        template_id: &TemplateId,
    ) -> Result<SessionRunner, SessionError> {
        let template = self
            .templates
            .get_template(template_id)
            .await?
            .ok_or(StorageError::NotFound)?;
        SessionRunner::start(template, self.clock.now())
    }

    /// Complete the mood check-in and persist the emitted result.
    ///
    /// The runner is terminal before the write is attempted; if the write
    /// fails, the result stays on the runner and `retry_persist` can try
    /// again without rebuilding anything.
    ///
    /// # Errors
    ///
    /// Returns `SessionError::InvalidState` unless the runner is awaiting
    /// the mood check-in, and `SessionError::Storage` if persistence fails.
    pub async fn complete_session(
        &self,
        runner: &mut SessionRunner,
        capture: MoodCapture,
    ) -> Result<SessionResult, SessionError> {
        let result = runner
            .complete_mood_capture(capture, self.clock.now())?
            .clone();
        self.results.append_result(&result).await?;
        Ok(result)
    }

    /// Complete the mood check-in without persisting anything.
    ///
    /// Preview runs exercise the identical state machine; whether to call
    /// the persistence collaborator is purely this caller-side choice.
    ///
    /// # Errors
    ///
    /// Returns `SessionError::InvalidState` unless the runner is awaiting
    /// the mood check-in.
    pub fn complete_preview(
        &self,
        runner: &mut SessionRunner,
        capture: MoodCapture,
    ) -> Result<SessionResult, SessionError> {
        Ok(runner
            .complete_mood_capture(capture, self.clock.now())?
            .clone())
    }

    /// Re-attempt persistence of an already-emitted result.
    ///
    /// A result that made it to storage on an earlier attempt is treated as
    /// success.
    ///
    /// # Errors
    ///
    /// Returns `SessionError::InvalidState` when the runner has not emitted
    /// a result yet, and `SessionError::Storage` if persistence fails again.
    pub async fn retry_persist(&self, runner: &SessionRunner) -> Result<(), SessionError> {
        let result = runner.result().ok_or(SessionError::InvalidState {
            operation: "retry_persist",
            phase: runner.phase(),
        })?;
        match self.results.append_result(result).await {
            Ok(()) | Err(StorageError::Conflict) => Ok(()),
            Err(err) => Err(err.into()),
        }
    }
}
