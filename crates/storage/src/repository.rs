use async_trait::async_trait;
use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use serde_json::Value;
use std::collections::HashMap;
use std::sync::{Arc, Mutex};
use thiserror::Error;

use wellness_core::model::{
    AnswerMap, AnswerValue, Branch, OptionId, Question, QuestionId, QuestionOption, QuestionType,
    SessionId, SessionResult, SliderScale, Template, TemplateId,
};

/// Errors surfaced by storage adapters.
#[derive(Debug, Error)]
#[non_exhaustive]
pub enum StorageError {
    #[error("not found")]
    NotFound,

    #[error("conflict")]
    Conflict,

    #[error("connection error: {0}")]
    Connection(String),

    #[error("serialization error: {0}")]
    Serialization(String),
}

fn ser<E: core::fmt::Display>(e: E) -> StorageError {
    StorageError::Serialization(e.to_string())
}

fn is_false(value: &bool) -> bool {
    !*value
}

//
// ─── RECORDS ───────────────────────────────────────────────────────────────────
//
// Persisted mirrors of the domain types. Field names stay camelCase so rows
// remain readable next to exports from the original web client, and so
// repositories can serialize without leaking storage concerns into the domain
// layer.

#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct OptionRecord {
    pub id: String,
    pub label: String,
    pub value: String,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct BranchRecord {
    pub option_id: String,
    pub target_question_id: String,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct QuestionRecord {
    pub id: String,
    #[serde(rename = "type")]
    pub kind: String,
    pub prompt: String,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub description: Option<String>,
    #[serde(default, skip_serializing_if = "Vec::is_empty")]
    pub options: Vec<OptionRecord>,
    #[serde(default, skip_serializing_if = "is_false")]
    pub required: bool,
    #[serde(default, skip_serializing_if = "Vec::is_empty")]
    pub branches: Vec<BranchRecord>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub min: Option<f64>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub max: Option<f64>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub step: Option<f64>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub min_label: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub max_label: Option<String>,
}

const KIND_TEXT: &str = "TEXT";
const KIND_MCQ: &str = "MCQ";
const KIND_SLIDER: &str = "SLIDER";
const KIND_CHECKBOX: &str = "CHECKBOX";
const KIND_INFO: &str = "INFO";

// Defaults the original client applied when slider bounds were left unset.
const SLIDER_DEFAULT_MIN: f64 = 0.0;
const SLIDER_DEFAULT_MAX: f64 = 10.0;
const SLIDER_DEFAULT_STEP: f64 = 1.0;

fn kind_to_str(kind: QuestionType) -> &'static str {
    match kind {
        QuestionType::FreeText => KIND_TEXT,
        QuestionType::MultipleChoice => KIND_MCQ,
        QuestionType::Slider => KIND_SLIDER,
        QuestionType::Checkbox => KIND_CHECKBOX,
        QuestionType::Info => KIND_INFO,
    }
}

impl QuestionRecord {
    #[must_use]
    pub fn from_question(question: &Question) -> Self {
        let scale = question.scale();
        Self {
            id: question.id().as_str().to_owned(),
            kind: kind_to_str(question.kind()).to_owned(),
            prompt: question.prompt().to_owned(),
            description: question.description().map(str::to_owned),
            options: question
                .options()
                .iter()
                .map(|option| OptionRecord {
                    id: option.id().as_str().to_owned(),
                    label: option.label().to_owned(),
                    value: option.value().to_owned(),
                })
                .collect(),
            required: question.required(),
            branches: question
                .branches()
                .iter()
                .map(|branch| BranchRecord {
                    option_id: branch.option_id().as_str().to_owned(),
                    target_question_id: branch.target().as_str().to_owned(),
                })
                .collect(),
            min: scale.map(SliderScale::min),
            max: scale.map(SliderScale::max),
            step: scale.map(SliderScale::step),
            min_label: scale.and_then(|s| s.min_label().map(str::to_owned)),
            max_label: scale.and_then(|s| s.max_label().map(str::to_owned)),
        }
    }

    /// Convert the record back into a domain `Question`.
    ///
    /// # Errors
    ///
    /// Returns `StorageError::Serialization` for unknown kinds or rows that
    /// fail domain validation.
    pub fn into_question(self) -> Result<Question, StorageError> {
        let id = QuestionId::new(self.id);
        let options: Vec<QuestionOption> = self
            .options
            .into_iter()
            .map(|record| QuestionOption::new(OptionId::new(record.id), record.label, record.value))
            .collect();

        let question = match self.kind.as_str() {
            KIND_TEXT => Question::free_text(id, self.prompt).map_err(ser)?,
            KIND_INFO => Question::info(id, self.prompt).map_err(ser)?,
            KIND_MCQ => Question::multiple_choice(id, self.prompt, options).map_err(ser)?,
            KIND_CHECKBOX => Question::checkbox(id, self.prompt, options).map_err(ser)?,
            KIND_SLIDER => {
                let mut scale = SliderScale::new(
                    self.min.unwrap_or(SLIDER_DEFAULT_MIN),
                    self.max.unwrap_or(SLIDER_DEFAULT_MAX),
                    self.step.unwrap_or(SLIDER_DEFAULT_STEP),
                )
                .map_err(ser)?;
                if let (Some(min_label), Some(max_label)) = (self.min_label, self.max_label) {
                    scale = scale.with_labels(min_label, max_label);
                }
                Question::slider(id, self.prompt, scale).map_err(ser)?
            }
            other => {
                return Err(StorageError::Serialization(format!(
                    "unknown question type: {other}"
                )));
            }
        };

        let branches = self
            .branches
            .into_iter()
            .map(|record| {
                Branch::new(
                    OptionId::new(record.option_id),
                    QuestionId::new(record.target_question_id),
                )
            })
            .collect();

        let mut question = question.with_branches(branches).map_err(ser)?;
        if let Some(description) = self.description {
            question = question.with_description(description);
        }
        question.with_required(self.required).map_err(ser)
    }
}

#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct TemplateRecord {
    pub id: String,
    pub title: String,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub description: Option<String>,
    pub version: u32,
    pub created_at: DateTime<Utc>,
    pub updated_at: DateTime<Utc>,
    pub questions: Vec<QuestionRecord>,
}

impl TemplateRecord {
    #[must_use]
    pub fn from_template(template: &Template) -> Self {
        Self {
            id: template.id().as_str().to_owned(),
            title: template.title().to_owned(),
            description: template.description().map(str::to_owned),
            version: template.version(),
            created_at: template.created_at(),
            updated_at: template.updated_at(),
            questions: template
                .questions()
                .iter()
                .map(QuestionRecord::from_question)
                .collect(),
        }
    }

    /// Convert the record back into a domain `Template`.
    ///
    /// # Errors
    ///
    /// Returns `StorageError::Serialization` if any question fails to convert
    /// or the template fails domain validation.
    pub fn into_template(self) -> Result<Template, StorageError> {
        let questions = self
            .questions
            .into_iter()
            .map(QuestionRecord::into_question)
            .collect::<Result<Vec<_>, _>>()?;

        Template::from_persisted(
            TemplateId::new(self.id),
            self.title,
            self.description,
            self.version,
            self.created_at,
            self.updated_at,
            questions,
        )
        .map_err(ser)
    }
}

/// Converts an answer into its persisted JSON shape.
///
/// # Errors
///
/// Returns `StorageError::Serialization` for non-finite numbers.
pub fn answer_to_json(value: &AnswerValue) -> Result<Value, StorageError> {
    match value {
        AnswerValue::Text(text) => Ok(Value::String(text.clone())),
        AnswerValue::Number(number) => serde_json::Number::from_f64(*number)
            .map(Value::Number)
            .ok_or_else(|| StorageError::Serialization("non-finite answer number".into())),
        AnswerValue::Selections(values) => Ok(Value::Array(
            values.iter().cloned().map(Value::String).collect(),
        )),
    }
}

/// Reads an answer back from its persisted JSON shape.
///
/// # Errors
///
/// Returns `StorageError::Serialization` for shapes no question produces.
pub fn answer_from_json(value: &Value) -> Result<AnswerValue, StorageError> {
    match value {
        Value::String(text) => Ok(AnswerValue::Text(text.clone())),
        Value::Number(number) => number
            .as_f64()
            .map(AnswerValue::Number)
            .ok_or_else(|| StorageError::Serialization("unreadable answer number".into())),
        Value::Array(items) => {
            let mut selections = Vec::with_capacity(items.len());
            for item in items {
                match item {
                    Value::String(text) => selections.push(text.clone()),
                    other => {
                        return Err(StorageError::Serialization(format!(
                            "unexpected selection entry: {other}"
                        )));
                    }
                }
            }
            Ok(AnswerValue::Selections(selections))
        }
        other => Err(StorageError::Serialization(format!(
            "unexpected answer shape: {other}"
        ))),
    }
}

#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct SessionResultRecord {
    pub session_id: String,
    pub template_id: String,
    pub template_title: String,
    pub completed_at: DateTime<Utc>,
    pub answers: serde_json::Map<String, Value>,
    pub path_taken: Vec<String>,
}

impl SessionResultRecord {
    /// Mirror a domain result for persistence.
    ///
    /// # Errors
    ///
    /// Returns `StorageError::Serialization` if an answer cannot be encoded.
    pub fn from_result(result: &SessionResult) -> Result<Self, StorageError> {
        let mut answers = serde_json::Map::with_capacity(result.answers().len());
        for (question_id, value) in result.answers() {
            answers.insert(question_id.as_str().to_owned(), answer_to_json(value)?);
        }

        Ok(Self {
            session_id: result.session_id().as_str().to_owned(),
            template_id: result.template_id().as_str().to_owned(),
            template_title: result.template_title().to_owned(),
            completed_at: result.completed_at(),
            answers,
            path_taken: result
                .path_taken()
                .iter()
                .map(|id| id.as_str().to_owned())
                .collect(),
        })
    }

    /// Convert the record back into a domain `SessionResult`.
    ///
    /// # Errors
    ///
    /// Returns `StorageError::Serialization` for unreadable answers or an
    /// empty path.
    pub fn into_result(self) -> Result<SessionResult, StorageError> {
        let mut answers = AnswerMap::with_capacity(self.answers.len());
        for (key, value) in &self.answers {
            answers.insert(QuestionId::new(key.clone()), answer_from_json(value)?);
        }

        SessionResult::from_persisted(
            SessionId::new(self.session_id),
            TemplateId::new(self.template_id),
            self.template_title,
            self.completed_at,
            answers,
            self.path_taken.into_iter().map(QuestionId::new).collect(),
        )
        .map_err(ser)
    }
}

//
// ─── REPOSITORY CONTRACTS ──────────────────────────────────────────────────────
//

/// Repository contract for session templates.
#[async_trait]
pub trait TemplateRepository: Send + Sync {
    /// Persist or update a template.
    ///
    /// # Errors
    ///
    /// Returns `StorageError` if the template cannot be stored.
    async fn upsert_template(&self, template: &Template) -> Result<(), StorageError>;

    /// Fetch a template by id; `Ok(None)` when missing.
    ///
    /// # Errors
    ///
    /// Returns `StorageError` for storage failures.
    async fn get_template(&self, id: &TemplateId) -> Result<Option<Template>, StorageError>;

    /// List templates, most recently updated first.
    ///
    /// # Errors
    ///
    /// Returns `StorageError` for storage failures.
    async fn list_templates(&self) -> Result<Vec<Template>, StorageError>;

    /// Delete a template. Deleting an unknown id is a no-op.
    ///
    /// # Errors
    ///
    /// Returns `StorageError` for storage failures.
    async fn delete_template(&self, id: &TemplateId) -> Result<(), StorageError>;
}

/// Repository contract for completed session results.
#[async_trait]
pub trait SessionResultRepository: Send + Sync {
    /// Append a completed result exactly once.
    ///
    /// # Errors
    ///
    /// Returns `StorageError::Conflict` if the session id already exists,
    /// or other storage errors.
    async fn append_result(&self, result: &SessionResult) -> Result<(), StorageError>;

    /// Fetch a result by session id; `Ok(None)` when missing.
    ///
    /// # Errors
    ///
    /// Returns `StorageError` for storage failures.
    async fn get_result(&self, id: &SessionId) -> Result<Option<SessionResult>, StorageError>;

    /// List results, most recently completed first, up to `limit`.
    ///
    /// # Errors
    ///
    /// Returns `StorageError` for storage failures.
    async fn list_results(&self, limit: u32) -> Result<Vec<SessionResult>, StorageError>;

    /// List results for one template, most recently completed first.
    ///
    /// # Errors
    ///
    /// Returns `StorageError` for storage failures.
    async fn list_results_for_template(
        &self,
        template_id: &TemplateId,
        limit: u32,
    ) -> Result<Vec<SessionResult>, StorageError>;
}

//
// ─── IN-MEMORY REPOSITORY ──────────────────────────────────────────────────────
//

/// Simple in-memory repository implementation for testing and prototyping.
#[derive(Clone, Default)]
pub struct InMemoryRepository {
    templates: Arc<Mutex<HashMap<TemplateId, Template>>>,
    results: Arc<Mutex<Vec<SessionResult>>>,
}

impl InMemoryRepository {
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }
}

#[async_trait]
impl TemplateRepository for InMemoryRepository {
    async fn upsert_template(&self, template: &Template) -> Result<(), StorageError> {
        let mut guard = self
            .templates
            .lock()
            .map_err(|e| StorageError::Connection(e.to_string()))?;
        guard.insert(template.id().clone(), template.clone());
        Ok(())
    }

    async fn get_template(&self, id: &TemplateId) -> Result<Option<Template>, StorageError> {
        let guard = self
            .templates
            .lock()
            .map_err(|e| StorageError::Connection(e.to_string()))?;
        Ok(guard.get(id).cloned())
    }

    async fn list_templates(&self) -> Result<Vec<Template>, StorageError> {
        let guard = self
            .templates
            .lock()
            .map_err(|e| StorageError::Connection(e.to_string()))?;
        let mut templates: Vec<Template> = guard.values().cloned().collect();
        templates.sort_by(|a, b| {
            b.updated_at()
                .cmp(&a.updated_at())
                .then_with(|| a.id().as_str().cmp(b.id().as_str()))
        });
        Ok(templates)
    }

    async fn delete_template(&self, id: &TemplateId) -> Result<(), StorageError> {
        let mut guard = self
            .templates
            .lock()
            .map_err(|e| StorageError::Connection(e.to_string()))?;
        guard.remove(id);
        Ok(())
    }
}

#[async_trait]
impl SessionResultRepository for InMemoryRepository {
    async fn append_result(&self, result: &SessionResult) -> Result<(), StorageError> {
        let mut guard = self
            .results
            .lock()
            .map_err(|e| StorageError::Connection(e.to_string()))?;
        if guard.iter().any(|r| r.session_id() == result.session_id()) {
            return Err(StorageError::Conflict);
        }
        guard.push(result.clone());
        Ok(())
    }

    async fn get_result(&self, id: &SessionId) -> Result<Option<SessionResult>, StorageError> {
        let guard = self
            .results
            .lock()
            .map_err(|e| StorageError::Connection(e.to_string()))?;
        Ok(guard.iter().find(|r| r.session_id() == id).cloned())
    }

    async fn list_results(&self, limit: u32) -> Result<Vec<SessionResult>, StorageError> {
        let guard = self
            .results
            .lock()
            .map_err(|e| StorageError::Connection(e.to_string()))?;
        let mut results: Vec<SessionResult> = guard.clone();
        sort_newest_first(&mut results);
        results.truncate(usize::try_from(limit).unwrap_or(usize::MAX));
        Ok(results)
    }

    async fn list_results_for_template(
        &self,
        template_id: &TemplateId,
        limit: u32,
    ) -> Result<Vec<SessionResult>, StorageError> {
        let guard = self
            .results
            .lock()
            .map_err(|e| StorageError::Connection(e.to_string()))?;
        let mut results: Vec<SessionResult> = guard
            .iter()
            .filter(|r| r.template_id() == template_id)
            .cloned()
            .collect();
        sort_newest_first(&mut results);
        results.truncate(usize::try_from(limit).unwrap_or(usize::MAX));
        Ok(results)
    }
}

fn sort_newest_first(results: &mut [SessionResult]) {
    results.sort_by(|a, b| {
        b.completed_at()
            .cmp(&a.completed_at())
            .then_with(|| b.session_id().as_str().cmp(a.session_id().as_str()))
    });
}

//
// ─── STORAGE AGGREGATE ─────────────────────────────────────────────────────────
//

/// Aggregates repositories behind trait objects for easy backend swapping.
#[derive(Clone)]
pub struct Storage {
    pub templates: Arc<dyn TemplateRepository>,
    pub results: Arc<dyn SessionResultRepository>,
}

impl Storage {
    #[must_use]
    pub fn in_memory() -> Self {
        let repo = InMemoryRepository::new();
        let templates: Arc<dyn TemplateRepository> = Arc::new(repo.clone());
        let results: Arc<dyn SessionResultRepository> = Arc::new(repo);
        Self { templates, results }
    }
}

//
// ─── TESTS ─────────────────────────────────────────────────────────────────────
//
