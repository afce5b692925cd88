use chrono::{DateTime, Utc};
use thiserror::Error;

use crate::model::ids::{QuestionId, TemplateId};
use crate::model::mood::RESERVED_KEY_PREFIX;
use crate::model::question::Question;

//
// ─── ERRORS ────────────────────────────────────────────────────────────────────
//

#[derive(Debug, Error, Clone, PartialEq, Eq)]
#[non_exhaustive]
pub enum TemplateError {
    #[error("template title cannot be empty")]
    EmptyTitle,

    #[error("duplicate question id: {0}")]
    DuplicateQuestionId(String),

    #[error("question id '{0}' uses the reserved '_' prefix")]
    ReservedQuestionId(String),
}

//
// ─── TEMPLATE ──────────────────────────────────────────────────────────────────
//

/// Static, ordered definition of a questionnaire.
///
/// The question order defines the default traversal; multiple-choice branch
/// tables may override it per answer. Loaded read-only by the session runner.
///
/// A template may hold zero questions while it is being authored; the runner
/// rejects such templates at session start.
#[derive(Debug, Clone, PartialEq)]
pub struct Template {
    id: TemplateId,
    title: String,
    description: Option<String>,
    version: u32,
    created_at: DateTime<Utc>,
    updated_at: DateTime<Utc>,
    questions: Vec<Question>,
}

impl Template {
    /// Creates a new template at version 1.
    ///
    /// # Errors
    ///
    /// Returns `TemplateError::EmptyTitle` for a blank title,
    /// `TemplateError::DuplicateQuestionId` when question ids repeat, and
    /// `TemplateError::ReservedQuestionId` when a question id starts with
    /// `_` (those keys are reserved for the mood capture).
    pub fn new(
        id: TemplateId,
        title: impl Into<String>,
        description: Option<String>,
        questions: Vec<Question>,
        created_at: DateTime<Utc>,
    ) -> Result<Self, TemplateError> {
        Self::from_persisted(id, title, description, 1, created_at, created_at, questions)
    }

    /// Rehydrate a template from persisted storage.
    ///
    /// # Errors
    ///
    /// Same validation as [`Template::new`].
    pub fn from_persisted(
        id: TemplateId,
        title: impl Into<String>,
        description: Option<String>,
        version: u32,
        created_at: DateTime<Utc>,
        updated_at: DateTime<Utc>,
        questions: Vec<Question>,
    ) -> Result<Self, TemplateError> {
        let title = title.into();
        if title.trim().is_empty() {
            return Err(TemplateError::EmptyTitle);
        }
        Self::validate_questions(&questions)?;

        let description = description
            .map(|d| d.trim().to_owned())
            .filter(|d| !d.is_empty());

        Ok(Self {
            id,
            title: title.trim().to_owned(),
            description,
            version,
            created_at,
            updated_at,
            questions,
        })
    }

    /// Replace title, description, and questions, bumping the version.
    ///
    /// The template id and creation time are preserved.
    ///
    /// # Errors
    ///
    /// Same validation as [`Template::new`].
    pub fn with_updates(
        self,
        title: impl Into<String>,
        description: Option<String>,
        questions: Vec<Question>,
        updated_at: DateTime<Utc>,
    ) -> Result<Self, TemplateError> {
        Self::from_persisted(
            self.id,
            title,
            description,
            self.version.saturating_add(1),
            self.created_at,
            updated_at,
            questions,
        )
    }

    fn validate_questions(questions: &[Question]) -> Result<(), TemplateError> {
        for (index, question) in questions.iter().enumerate() {
            let id = question.id();
            if id.as_str().starts_with(RESERVED_KEY_PREFIX) {
                return Err(TemplateError::ReservedQuestionId(id.as_str().to_owned()));
            }
            if questions[..index].iter().any(|q| q.id() == id) {
                return Err(TemplateError::DuplicateQuestionId(id.as_str().to_owned()));
            }
        }
        Ok(())
    }

    // Accessors
    #[must_use]
    pub fn id(&self) -> &TemplateId {
        &self.id
    }

    #[must_use]
    pub fn title(&self) -> &str {
        &self.title
    }

    #[must_use]
    pub fn description(&self) -> Option<&str> {
        self.description.as_deref()
    }

    #[must_use]
    pub fn version(&self) -> u32 {
        self.version
    }

    #[must_use]
    pub fn created_at(&self) -> DateTime<Utc> {
        self.created_at
    }

    #[must_use]
    pub fn updated_at(&self) -> DateTime<Utc> {
        self.updated_at
    }

    #[must_use]
    pub fn questions(&self) -> &[Question] {
        &self.questions
    }

    #[must_use]
    pub fn question_count(&self) -> usize {
        self.questions.len()
    }

    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.questions.is_empty()
    }

    /// Lookup a question by id.
    #[must_use]
    pub fn question(&self, id: &QuestionId) -> Option<&Question> {
        self.questions.iter().find(|q| q.id() == id)
    }

    /// The first question in default order, if any.
    #[must_use]
    pub fn first_question(&self) -> Option<&Question> {
        self.questions.first()
    }

    #[must_use]
    pub fn contains(&self, id: &QuestionId) -> bool {
        self.question(id).is_some()
    }

    /// The question immediately following `id` in template order, or `None`
    /// when `id` is last or unknown.
    #[must_use]
    pub fn default_next(&self, id: &QuestionId) -> Option<&QuestionId> {
        let index = self.questions.iter().position(|q| q.id() == id)?;
        self.questions.get(index + 1).map(Question::id)
    }
}

//
// ─── TESTS ─────────────────────────────────────────────────────────────────────
//
