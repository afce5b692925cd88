use thiserror::Error;

use crate::model::answer::AnswerValue;
use crate::model::ids::{OptionId, QuestionId};

//
// ─── ERRORS ────────────────────────────────────────────────────────────────────
//

#[derive(Debug, Error, Clone, PartialEq, Eq)]
#[non_exhaustive]
pub enum QuestionError {
    #[error("question id cannot be empty")]
    EmptyId,

    #[error("question prompt cannot be empty")]
    EmptyPrompt,

    #[error("choice questions need at least one option")]
    NoOptions,

    #[error("duplicate option id: {0}")]
    DuplicateOptionId(String),

    #[error("branches are only supported on multiple-choice questions")]
    BranchesNotSupported,

    #[error("info steps take no input and cannot be required")]
    RequiredInfo,

    #[error("slider minimum must be below maximum")]
    InvalidSliderRange,

    #[error("slider step must be positive")]
    InvalidSliderStep,
}

//
// ─── QUESTION PARTS ────────────────────────────────────────────────────────────
//

/// How a question collects its answer.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum QuestionType {
    FreeText,
    MultipleChoice,
    Checkbox,
    Slider,
    /// Display-only step: no input, never required, never branches.
    Info,
}

/// One selectable option on a multiple-choice or checkbox question.
///
/// `value` is what gets recorded as the answer; `id` is what branch tables
/// key on.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct QuestionOption {
    id: OptionId,
    label: String,
    value: String,
}

impl QuestionOption {
    #[must_use]
    pub fn new(id: OptionId, label: impl Into<String>, value: impl Into<String>) -> Self {
        Self {
            id,
            label: label.into(),
            value: value.into(),
        }
    }

    #[must_use]
    pub fn id(&self) -> &OptionId {
        &self.id
    }

    #[must_use]
    pub fn label(&self) -> &str {
        &self.label
    }

    #[must_use]
    pub fn value(&self) -> &str {
        &self.value
    }
}

/// Override mapping a chosen option to the next question, superseding the
/// template's default order.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Branch {
    option_id: OptionId,
    target: QuestionId,
}

impl Branch {
    #[must_use]
    pub fn new(option_id: OptionId, target: QuestionId) -> Self {
        Self { option_id, target }
    }

    #[must_use]
    pub fn option_id(&self) -> &OptionId {
        &self.option_id
    }

    #[must_use]
    pub fn target(&self) -> &QuestionId {
        &self.target
    }
}

/// Numeric bounds and display labels for a slider question.
#[derive(Debug, Clone, PartialEq)]
pub struct SliderScale {
    min: f64,
    max: f64,
    step: f64,
    min_label: Option<String>,
    max_label: Option<String>,
}

impl SliderScale {
    /// Creates a slider scale.
    ///
    /// # Errors
    ///
    /// Returns `QuestionError::InvalidSliderRange` unless `min < max`, and
    /// `QuestionError::InvalidSliderStep` unless `step > 0`.
    pub fn new(min: f64, max: f64, step: f64) -> Result<Self, QuestionError> {
        if !min.is_finite() || !max.is_finite() || min >= max {
            return Err(QuestionError::InvalidSliderRange);
        }
        if !step.is_finite() || step <= 0.0 {
            return Err(QuestionError::InvalidSliderStep);
        }
        Ok(Self {
            min,
            max,
            step,
            min_label: None,
            max_label: None,
        })
    }

    /// Attach endpoint labels shown at either end of the scale.
    #[must_use]
    pub fn with_labels(
        mut self,
        min_label: impl Into<String>,
        max_label: impl Into<String>,
    ) -> Self {
        self.min_label = Some(min_label.into());
        self.max_label = Some(max_label.into());
        self
    }

    #[must_use]
    pub fn min(&self) -> f64 {
        self.min
    }

    #[must_use]
    pub fn max(&self) -> f64 {
        self.max
    }

    #[must_use]
    pub fn step(&self) -> f64 {
        self.step
    }

    #[must_use]
    pub fn min_label(&self) -> Option<&str> {
        self.min_label.as_deref()
    }

    #[must_use]
    pub fn max_label(&self) -> Option<&str> {
        self.max_label.as_deref()
    }
}

//
// ─── QUESTION ──────────────────────────────────────────────────────────────────
//

/// One step in a session template.
#[derive(Debug, Clone, PartialEq)]
pub struct Question {
    id: QuestionId,
    kind: QuestionType,
    prompt: String,
    description: Option<String>,
    options: Vec<QuestionOption>,
    required: bool,
    branches: Vec<Branch>,
    scale: Option<SliderScale>,
}

impl Question {
    fn base(
        id: QuestionId,
        kind: QuestionType,
        prompt: impl Into<String>,
    ) -> Result<Self, QuestionError> {
        if id.as_str().trim().is_empty() {
            return Err(QuestionError::EmptyId);
        }
        let prompt = prompt.into();
        if prompt.trim().is_empty() {
            return Err(QuestionError::EmptyPrompt);
        }
        Ok(Self {
            id,
            kind,
            prompt: prompt.trim().to_owned(),
            description: None,
            options: Vec::new(),
            required: false,
            branches: Vec::new(),
            scale: None,
        })
    }

    fn validate_options(options: &[QuestionOption]) -> Result<(), QuestionError> {
        if options.is_empty() {
            return Err(QuestionError::NoOptions);
        }
        for (index, option) in options.iter().enumerate() {
            if options[..index].iter().any(|o| o.id() == option.id()) {
                return Err(QuestionError::DuplicateOptionId(
                    option.id().as_str().to_owned(),
                ));
            }
        }
        Ok(())
    }

    /// Creates an open-ended text question.
    ///
    /// # Errors
    ///
    /// Returns `QuestionError` if the id or prompt is empty.
    pub fn free_text(id: QuestionId, prompt: impl Into<String>) -> Result<Self, QuestionError> {
        Self::base(id, QuestionType::FreeText, prompt)
    }

    /// Creates a display-only info step.
    ///
    /// # Errors
    ///
    /// Returns `QuestionError` if the id or prompt is empty.
    pub fn info(id: QuestionId, prompt: impl Into<String>) -> Result<Self, QuestionError> {
        Self::base(id, QuestionType::Info, prompt)
    }

    /// Creates a single-select multiple-choice question.
    ///
    /// # Errors
    ///
    /// Returns `QuestionError` if the id or prompt is empty, the option list
    /// is empty, or option ids repeat.
    pub fn multiple_choice(
        id: QuestionId,
        prompt: impl Into<String>,
        options: Vec<QuestionOption>,
    ) -> Result<Self, QuestionError> {
        Self::validate_options(&options)?;
        let mut question = Self::base(id, QuestionType::MultipleChoice, prompt)?;
        question.options = options;
        Ok(question)
    }

    /// Creates a multi-select checkbox question.
    ///
    /// # Errors
    ///
    /// Returns `QuestionError` if the id or prompt is empty, the option list
    /// is empty, or option ids repeat.
    pub fn checkbox(
        id: QuestionId,
        prompt: impl Into<String>,
        options: Vec<QuestionOption>,
    ) -> Result<Self, QuestionError> {
        Self::validate_options(&options)?;
        let mut question = Self::base(id, QuestionType::Checkbox, prompt)?;
        question.options = options;
        Ok(question)
    }

    /// Creates a slider question over the given scale.
    ///
    /// # Errors
    ///
    /// Returns `QuestionError` if the id or prompt is empty.
    pub fn slider(
        id: QuestionId,
        prompt: impl Into<String>,
        scale: SliderScale,
    ) -> Result<Self, QuestionError> {
        let mut question = Self::base(id, QuestionType::Slider, prompt)?;
        question.scale = Some(scale);
        Ok(question)
    }

    /// Attach secondary display text under the prompt.
    #[must_use]
    pub fn with_description(mut self, description: impl Into<String>) -> Self {
        let description = description.into();
        let trimmed = description.trim();
        self.description = if trimmed.is_empty() {
            None
        } else {
            Some(trimmed.to_owned())
        };
        self
    }

    /// Mark the question as required; the runner refuses to advance past a
    /// required question without a recorded answer.
    ///
    /// # Errors
    ///
    /// Returns `QuestionError::RequiredInfo` for info steps.
    pub fn with_required(mut self, required: bool) -> Result<Self, QuestionError> {
        if required && self.kind == QuestionType::Info {
            return Err(QuestionError::RequiredInfo);
        }
        self.required = required;
        Ok(self)
    }

    /// Attach a branch table.
    ///
    /// # Errors
    ///
    /// Returns `QuestionError::BranchesNotSupported` for anything other than
    /// a multiple-choice question.
    pub fn with_branches(mut self, branches: Vec<Branch>) -> Result<Self, QuestionError> {
        if !branches.is_empty() && self.kind != QuestionType::MultipleChoice {
            return Err(QuestionError::BranchesNotSupported);
        }
        self.branches = branches;
        Ok(self)
    }

    // Accessors
    #[must_use]
    pub fn id(&self) -> &QuestionId {
        &self.id
    }

    #[must_use]
    pub fn kind(&self) -> QuestionType {
        self.kind
    }

    #[must_use]
    pub fn prompt(&self) -> &str {
        &self.prompt
    }

    #[must_use]
    pub fn description(&self) -> Option<&str> {
        self.description.as_deref()
    }

    #[must_use]
    pub fn options(&self) -> &[QuestionOption] {
        &self.options
    }

    #[must_use]
    pub fn required(&self) -> bool {
        self.required
    }

    #[must_use]
    pub fn branches(&self) -> &[Branch] {
        &self.branches
    }

    #[must_use]
    pub fn scale(&self) -> Option<&SliderScale> {
        self.scale.as_ref()
    }

    /// Maps a recorded answer back to the option that produced it.
    ///
    /// Branch tables key on option ids while answers record option values,
    /// so branch resolution needs this reverse lookup. Returns `None` for
    /// values no option produces (stale or edited template) and for
    /// non-text answers.
    #[must_use]
    pub fn resolve_option(&self, value: &AnswerValue) -> Option<&OptionId> {
        let text = value.as_text()?;
        self.options
            .iter()
            .find(|option| option.value() == text)
            .map(QuestionOption::id)
    }
}

//
// ─── TESTS ─────────────────────────────────────────────────────────────────────
//
