use std::sync::Arc;

use storage::repository::Storage;

use crate::Clock;
use crate::error::AppServicesError;
use crate::sessions::{SessionFlowService, SessionHistoryService};
use crate::template_draft_service::TemplateDraftService;
use crate::template_service::TemplateService;

/// Assembles app-facing services over a storage backend.
#[derive(Clone)]
pub struct AppServices {
    session_flow: Arc<SessionFlowService>,
    session_history: Arc<SessionHistoryService>,
    templates: Arc<TemplateService>,
    template_drafts: Arc<TemplateDraftService>,
}

impl AppServices {
    /// Wire the services against an existing storage aggregate.
    #[must_use]
    pub fn from_storage(clock: Clock, storage: &Storage) -> Self {
        let session_flow = Arc::new(SessionFlowService::new(
            clock,
            Arc::clone(&storage.templates),
            Arc::clone(&storage.results),
        ));
        let session_history = Arc::new(SessionHistoryService::new(Arc::clone(&storage.results)));
        let templates = Arc::new(TemplateService::new(clock, Arc::clone(&storage.templates)));
        let template_drafts = Arc::new(TemplateDraftService::from_env(clock));

        Self {
            session_flow,
            session_history,
            templates,
            template_drafts,
        }
    }

    /// Build services backed by `SQLite` storage.
    ///
    /// # Errors
    ///
    /// Returns `AppServicesError` if storage initialization fails.
    pub async fn new_sqlite(db_url: &str, clock: Clock) -> Result<Self, AppServicesError> {
        let storage = Storage::sqlite(db_url).await?;
        Ok(Self::from_storage(clock, &storage))
    }

    /// Build services over the in-memory repository, for tests and
    /// prototyping.
    #[must_use]
    pub fn new_in_memory(clock: Clock) -> Self {
        Self::from_storage(clock, &Storage::in_memory())
    }

    #[must_use]
    pub fn session_flow(&self) -> Arc<SessionFlowService> {
        Arc::clone(&self.session_flow)
    }

    #[must_use]
    pub fn session_history(&self) -> Arc<SessionHistoryService> {
        Arc::clone(&self.session_history)
    }

    #[must_use]
    pub fn templates(&self) -> Arc<TemplateService> {
        Arc::clone(&self.templates)
    }

    #[must_use]
    pub fn template_drafts(&self) -> Arc<TemplateDraftService> {
        Arc::clone(&self.template_drafts)
    }
}
