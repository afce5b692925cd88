//! Shared error types for the services crate.

use thiserror::Error;

use storage::repository::StorageError;
use storage::sqlite::SqliteInitError;
use wellness_core::model::{QuestionError, ResultError, TemplateError};

use crate::sessions::SessionPhase;

/// Errors emitted by the session runner and session flow services.
#[derive(Debug, Error)]
#[non_exhaustive]
pub enum SessionError {
    #[error("template has no questions")]
    EmptyTemplate,
    #[error("{operation} is not allowed while the session is {phase:?}")]
    InvalidState {
        operation: &'static str,
        phase: SessionPhase,
    },
    #[error(transparent)]
    Result(#[from] ResultError),
    #[error(transparent)]
    Storage(#[from] StorageError),
}

/// Errors emitted by `TemplateService`.
#[derive(Debug, Error)]
#[non_exhaustive]
pub enum TemplateServiceError {
    #[error(transparent)]
    Template(#[from] TemplateError),
    #[error(transparent)]
    Storage(#[from] StorageError),
}

/// Errors emitted by `TemplateDraftService`.
#[derive(Debug, Error)]
#[non_exhaustive]
pub enum TemplateDraftError {
    #[error("template drafting is not configured")]
    Disabled,
    #[error("template drafting returned an empty response")]
    EmptyResponse,
    #[error("template drafting request failed with status {0}")]
    HttpStatus(reqwest::StatusCode),
    #[error(transparent)]
    Http(#[from] reqwest::Error),
    #[error("draft payload could not be parsed: {0}")]
    InvalidDraft(#[from] serde_json::Error),
    #[error("draft used an unsupported question type: {0}")]
    UnsupportedQuestionType(String),
    #[error(transparent)]
    Question(#[from] QuestionError),
    #[error(transparent)]
    Template(#[from] TemplateError),
}

/// Errors emitted while bootstrapping app services.
#[derive(Debug, Error)]
#[non_exhaustive]
pub enum AppServicesError {
    #[error(transparent)]
    Sqlite(#[from] SqliteInitError),
    #[error(transparent)]
    Storage(#[from] StorageError),
}
