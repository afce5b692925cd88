use std::collections::HashMap;

use crate::model::ids::QuestionId;

/// A single recorded answer.
///
/// Free-text questions and multiple-choice questions store text (for
/// multiple-choice it is the chosen option's `value`), sliders store a number,
/// and checkbox questions store the set of selected option values.
#[derive(Debug, Clone, PartialEq)]
pub enum AnswerValue {
    Text(String),
    Number(f64),
    Selections(Vec<String>),
}

impl AnswerValue {
    #[must_use]
    pub fn text(value: impl Into<String>) -> Self {
        Self::Text(value.into())
    }

    #[must_use]
    pub fn number(value: f64) -> Self {
        Self::Number(value)
    }

    #[must_use]
    pub fn selections<I, S>(values: I) -> Self
    where
        I: IntoIterator<Item = S>,
        S: Into<String>,
    {
        Self::Selections(values.into_iter().map(Into::into).collect())
    }

    /// True when the answer carries no usable input.
    ///
    /// Empty text and an empty selection set count as unanswered; a number is
    /// always an answer.
    #[must_use]
    pub fn is_empty(&self) -> bool {
        match self {
            Self::Text(value) => value.trim().is_empty(),
            Self::Number(_) => false,
            Self::Selections(values) => values.is_empty(),
        }
    }

    /// The text payload, if this is a text answer.
    #[must_use]
    pub fn as_text(&self) -> Option<&str> {
        match self {
            Self::Text(value) => Some(value),
            _ => None,
        }
    }

    /// The numeric payload, if this is a number answer.
    #[must_use]
    pub fn as_number(&self) -> Option<f64> {
        match self {
            Self::Number(value) => Some(*value),
            _ => None,
        }
    }

    /// The selected values, if this is a checkbox answer.
    #[must_use]
    pub fn as_selections(&self) -> Option<&[String]> {
        match self {
            Self::Selections(values) => Some(values),
            _ => None,
        }
    }
}

/// Answers collected so far, keyed by question id.
///
/// Last write per key wins; navigation never removes entries, so stepping back
/// to a question shows its prior answer.
pub type AnswerMap = HashMap<QuestionId, AnswerValue>;

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn empty_text_counts_as_unanswered() {
        assert!(AnswerValue::text("").is_empty());
        assert!(AnswerValue::text("   ").is_empty());
        assert!(!AnswerValue::text("hello").is_empty());
    }

    #[test]
    fn empty_selections_count_as_unanswered() {
        assert!(AnswerValue::selections(Vec::<String>::new()).is_empty());
        assert!(!AnswerValue::selections(["sleep"]).is_empty());
    }

    #[test]
    fn numbers_are_never_empty() {
        assert!(!AnswerValue::number(0.0).is_empty());
    }

    #[test]
    fn accessors_match_variant() {
        assert_eq!(AnswerValue::text("a").as_text(), Some("a"));
        assert_eq!(AnswerValue::number(3.0).as_number(), Some(3.0));
        assert_eq!(AnswerValue::text("a").as_number(), None);
        assert_eq!(
            AnswerValue::selections(["x", "y"]).as_selections(),
            Some(&["x".to_string(), "y".to_string()][..])
        );
    }
}
