use chrono::{DateTime, Utc};
use thiserror::Error;

use crate::model::answer::{AnswerMap, AnswerValue};
use crate::model::ids::{QuestionId, SessionId, TemplateId};
use crate::model::mood::{MOOD_NOTE_KEY, MOOD_VALUE_KEY};

#[derive(Debug, Error, Clone, PartialEq, Eq)]
#[non_exhaustive]
pub enum ResultError {
    #[error("a completed session must have visited at least one question")]
    EmptyPath,
}

/// Immutable record emitted once a session completes.
///
/// `path_taken` is the realized traversal (branch-aware), not the template's
/// nominal order; `answers` includes the mood capture under its reserved keys.
#[derive(Debug, Clone, PartialEq)]
pub struct SessionResult {
    session_id: SessionId,
    template_id: TemplateId,
    template_title: String,
    completed_at: DateTime<Utc>,
    answers: AnswerMap,
    path_taken: Vec<QuestionId>,
}

impl SessionResult {
    /// Builds a result, validating the realized path.
    ///
    /// # Errors
    ///
    /// Returns `ResultError::EmptyPath` when `path_taken` is empty.
    pub fn from_persisted(
        session_id: SessionId,
        template_id: TemplateId,
        template_title: impl Into<String>,
        completed_at: DateTime<Utc>,
        answers: AnswerMap,
        path_taken: Vec<QuestionId>,
    ) -> Result<Self, ResultError> {
        if path_taken.is_empty() {
            return Err(ResultError::EmptyPath);
        }
        Ok(Self {
            session_id,
            template_id,
            template_title: template_title.into(),
            completed_at,
            answers,
            path_taken,
        })
    }

    #[must_use]
    pub fn session_id(&self) -> &SessionId {
        &self.session_id
    }

    #[must_use]
    pub fn template_id(&self) -> &TemplateId {
        &self.template_id
    }

    #[must_use]
    pub fn template_title(&self) -> &str {
        &self.template_title
    }

    #[must_use]
    pub fn completed_at(&self) -> DateTime<Utc> {
        self.completed_at
    }

    #[must_use]
    pub fn answers(&self) -> &AnswerMap {
        &self.answers
    }

    #[must_use]
    pub fn path_taken(&self) -> &[QuestionId] {
        &self.path_taken
    }

    /// The answer recorded for a question, if any.
    #[must_use]
    pub fn answer(&self, id: &QuestionId) -> Option<&AnswerValue> {
        self.answers.get(id)
    }

    /// The mood rating merged in at completion, if present.
    #[must_use]
    pub fn mood_value(&self) -> Option<u8> {
        let value = self.answers.get(&QuestionId::new(MOOD_VALUE_KEY))?;
        let number = value.as_number()?;
        u8::try_from(number as i64).ok()
    }

    /// The mood note merged in at completion, if present.
    #[must_use]
    pub fn mood_note(&self) -> Option<&str> {
        self.answers
            .get(&QuestionId::new(MOOD_NOTE_KEY))
            .and_then(AnswerValue::as_text)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::time::fixed_now;

    #[test]
    fn rejects_empty_path() {
        let err = SessionResult::from_persisted(
            SessionId::new("s1"),
            TemplateId::new("t1"),
            "Check-in",
            fixed_now(),
            AnswerMap::new(),
            Vec::new(),
        )
        .unwrap_err();
        assert_eq!(err, ResultError::EmptyPath);
    }

    #[test]
    fn exposes_mood_fields_from_reserved_keys() {
        let mut answers = AnswerMap::new();
        answers.insert(QuestionId::new("q1"), AnswerValue::text("hello"));
        answers.insert(QuestionId::new(MOOD_VALUE_KEY), AnswerValue::number(4.0));
        answers.insert(QuestionId::new(MOOD_NOTE_KEY), AnswerValue::text("felt okay"));

        let result = SessionResult::from_persisted(
            SessionId::new("s1"),
            TemplateId::new("t1"),
            "Check-in",
            fixed_now(),
            answers,
            vec![QuestionId::new("q1")],
        )
        .unwrap();

        assert_eq!(result.mood_value(), Some(4));
        assert_eq!(result.mood_note(), Some("felt okay"));
        assert_eq!(
            result.answer(&QuestionId::new("q1")),
            Some(&AnswerValue::text("hello"))
        );
    }
}
