use thiserror::Error;

use crate::model::{MoodError, QuestionError, ResultError, TemplateError};

#[derive(Debug, Error)]
pub enum Error {
    #[error(transparent)]
    Template(#[from] TemplateError),
    #[error(transparent)]
    Question(#[from] QuestionError),
    #[error(transparent)]
    Mood(#[from] MoodError),
    #[error(transparent)]
    Result(#[from] ResultError),
}
