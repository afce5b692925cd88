use std::sync::Arc;

use storage::repository::{StorageError, TemplateRepository};
use wellness_core::model::{Question, Template, TemplateId};

use crate::Clock;
use crate::error::TemplateServiceError;

/// Orchestrates template authoring and persistence.
#[derive(Clone)]
pub struct TemplateService {
    clock: Clock,
    templates: Arc<dyn TemplateRepository>,
}

impl TemplateService {
    #[must_use]
    pub fn new(clock: Clock, templates: Arc<dyn TemplateRepository>) -> Self {
        Self { clock, templates }
    }

    /// Create a new template with a generated id and persist it.
    ///
    /// # Errors
    ///
    /// Returns `TemplateServiceError::Template` for validation failures.
    /// Returns `TemplateServiceError::Storage` if persistence fails.
    pub async fn create_template(
        &self,
        title: String,
        description: Option<String>,
        questions: Vec<Question>,
    ) -> Result<TemplateId, TemplateServiceError> {
        let now = self.clock.now();
        let template = Template::new(TemplateId::generate(), title, description, questions, now)?;
        self.templates.upsert_template(&template).await?;
        Ok(template.id().clone())
    }

    /// Replace a template's content, bumping its version and refreshing
    /// `updated_at`.
    ///
    /// # Errors
    ///
    /// Returns `TemplateServiceError::Template` if validation fails.
    /// Returns `TemplateServiceError::Storage` when the template is missing
    /// or repository access fails.
    pub async fn update_template(
        &self,
        template_id: &TemplateId,
        title: String,
        description: Option<String>,
        questions: Vec<Question>,
    ) -> Result<(), TemplateServiceError> {
        let existing = self
            .templates
            .get_template(template_id)
            .await?
            .ok_or(StorageError::NotFound)?;

        let updated = existing.with_updates(title, description, questions, self.clock.now())?;
        self.templates.upsert_template(&updated).await?;
        Ok(())
    }

    /// Fetch a template by id; `Ok(None)` when it does not exist.
    ///
    /// # Errors
    ///
    /// Returns `TemplateServiceError::Storage` if repository access fails.
    pub async fn get_template(
        &self,
        template_id: &TemplateId,
    ) -> Result<Option<Template>, TemplateServiceError> {
        Ok(self.templates.get_template(template_id).await?)
    }

    /// List templates, most recently updated first.
    ///
    /// # Errors
    ///
    /// Returns `TemplateServiceError::Storage` if repository access fails.
    pub async fn list_templates(&self) -> Result<Vec<Template>, TemplateServiceError> {
        Ok(self.templates.list_templates().await?)
    }

    /// Delete a template; unknown ids are a no-op.
    ///
    /// # Errors
    ///
    /// Returns `TemplateServiceError::Storage` if repository access fails.
    pub async fn delete_template(
        &self,
        template_id: &TemplateId,
    ) -> Result<(), TemplateServiceError> {
        self.templates.delete_template(template_id).await?;
        Ok(())
    }
}
