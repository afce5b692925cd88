use std::sync::Arc;

use storage::repository::SessionResultRepository;
use wellness_core::model::{SessionId, SessionResult, TemplateId};

use crate::error::SessionError;

/// Read-side queries over completed sessions, for dashboards and history
/// views.
#[derive(Clone)]
pub struct SessionHistoryService {
    results: Arc<dyn SessionResultRepository>,
}

impl SessionHistoryService {
    #[must_use]
    pub fn new(results: Arc<dyn SessionResultRepository>) -> Self {
        Self { results }
    }

    /// List the most recently completed sessions, newest first.
    ///
    /// # Errors
    ///
    /// Returns `SessionError::Storage` if repository access fails.
    pub async fn list_recent(&self, limit: u32) -> Result<Vec<SessionResult>, SessionError> {
        Ok(self.results.list_results(limit).await?)
    }

    /// List completed sessions for one template, newest first.
    ///
    /// # Errors
    ///
    /// Returns `SessionError::Storage` if repository access fails.
    pub async fn list_for_template(
        &self,
        template_id: &TemplateId,
        limit: u32,
    ) -> Result<Vec<SessionResult>, SessionError> {
        Ok(self
            .results
            .list_results_for_template(template_id, limit)
            .await?)
    }

    /// Fetch a single result by session id; `Ok(None)` when missing.
    ///
    /// # Errors
    ///
    /// Returns `SessionError::Storage` if repository access fails.
    pub async fn get(&self, id: &SessionId) -> Result<Option<SessionResult>, SessionError> {
        Ok(self.results.get_result(id).await?)
    }
}
