use std::env;

use chrono::{DateTime, Utc};
use reqwest::Client;
use serde::{Deserialize, Serialize};

use wellness_core::model::{
    OptionId, Question, QuestionId, QuestionOption, SliderScale, Template, TemplateId,
};

use crate::Clock;
use crate::error::TemplateDraftError;

const SYSTEM_INSTRUCTION: &str = "\
You are an expert CBT therapist creating structured session templates. \
Respond with a single JSON object: {\"title\", \"description\", \"questions\"}. \
Each question has \"type\" (TEXT, MCQ, SLIDER, CHECKBOX, or INFO), \"prompt\", \
and optionally \"description\", \"required\", \"options\" (objects with \
\"label\" and \"value\"), and for sliders \"min\", \"max\", \"step\", \
\"minLabel\", \"maxLabel\". Keep questions clinically relevant and empathetic, \
in a logical progression.";

#[derive(Clone, Debug)]
pub struct TemplateDraftConfig {
    pub base_url: String,
    pub api_key: String,
    pub model: String,
}

impl TemplateDraftConfig {
    #[must_use]
    pub fn from_env() -> Option<Self> {
        let api_key = env::var("WELLNESS_AI_API_KEY").ok()?;
        if api_key.trim().is_empty() {
            return None;
        }
        let base_url =
            env::var("WELLNESS_AI_BASE_URL").unwrap_or_else(|_| "https://api.openai.com/v1".into());
        let model = env::var("WELLNESS_AI_MODEL").unwrap_or_else(|_| "gpt-4o-mini".into());
        Some(Self {
            base_url,
            api_key,
            model,
        })
    }
}

/// Drafts session templates from a topic via an OpenAI-compatible endpoint.
///
/// Model output never carries ids; they are generated here after parsing, so
/// a template fresh off the wire is structurally indistinguishable from a
/// hand-authored one.
#[derive(Clone)]
pub struct TemplateDraftService {
    client: Client,
    clock: Clock,
    config: Option<TemplateDraftConfig>,
}

impl TemplateDraftService {
    #[must_use]
    pub fn from_env(clock: Clock) -> Self {
        Self::new(clock, TemplateDraftConfig::from_env())
    }

    #[must_use]
    pub fn new(clock: Clock, config: Option<TemplateDraftConfig>) -> Self {
        Self {
            client: Client::new(),
            clock,
            config,
        }
    }

    #[must_use]
    pub fn enabled(&self) -> bool {
        self.config.is_some()
    }

    /// Draft a template for the given topic.
    ///
    /// # Errors
    ///
    /// Returns `TemplateDraftError` when the service is disabled, the request
    /// fails, or the draft cannot be turned into a valid template.
    pub async fn draft_template(&self, topic: &str) -> Result<Template, TemplateDraftError> {
        let config = self.config.as_ref().ok_or(TemplateDraftError::Disabled)?;

        let url = format!("{}/chat/completions", config.base_url.trim_end_matches('/'));
        let payload = ChatRequest {
            model: config.model.clone(),
            messages: vec![
                ChatMessage {
                    role: "system",
                    content: SYSTEM_INSTRUCTION.to_string(),
                },
                ChatMessage {
                    role: "user",
                    content: format!("Create a CBT session template for: {topic}"),
                },
            ],
            temperature: 0.2,
        };

        let response = self
            .client
            .post(url)
            .bearer_auth(&config.api_key)
            .json(&payload)
            .send()
            .await?;

        if !response.status().is_success() {
            return Err(TemplateDraftError::HttpStatus(response.status()));
        }

        let body: ChatResponse = response.json().await?;
        let content = body
            .choices
            .into_iter()
            .next()
            .and_then(|choice| choice.message.content)
            .ok_or(TemplateDraftError::EmptyResponse)?;

        let draft: TemplateDraft = serde_json::from_str(content.trim())?;
        build_template(draft, self.clock.now())
    }
}

// Defaults applied when a drafted slider omits its bounds.
const DRAFT_SLIDER_MIN: f64 = 0.0;
const DRAFT_SLIDER_MAX: f64 = 10.0;
const DRAFT_SLIDER_STEP: f64 = 1.0;

fn build_template(draft: TemplateDraft, now: DateTime<Utc>) -> Result<Template, TemplateDraftError> {
    let mut questions = Vec::with_capacity(draft.questions.len());
    for question in draft.questions {
        questions.push(build_question(question)?);
    }

    Ok(Template::new(
        TemplateId::generate(),
        draft.title,
        Some(draft.description),
        questions,
        now,
    )?)
}

fn build_question(draft: QuestionDraft) -> Result<Question, TemplateDraftError> {
    let id = QuestionId::generate();
    let options: Vec<QuestionOption> = draft
        .options
        .into_iter()
        .map(|option| QuestionOption::new(OptionId::generate(), option.label, option.value))
        .collect();

    let question = match draft.kind.as_str() {
        "TEXT" => Question::free_text(id, draft.prompt)?,
        "INFO" => Question::info(id, draft.prompt)?,
        "MCQ" => Question::multiple_choice(id, draft.prompt, options)?,
        "CHECKBOX" => Question::checkbox(id, draft.prompt, options)?,
        "SLIDER" => {
            let mut scale = SliderScale::new(
                draft.min.unwrap_or(DRAFT_SLIDER_MIN),
                draft.max.unwrap_or(DRAFT_SLIDER_MAX),
                draft.step.unwrap_or(DRAFT_SLIDER_STEP),
            )?;
            if let (Some(min_label), Some(max_label)) = (draft.min_label, draft.max_label) {
                scale = scale.with_labels(min_label, max_label);
            }
            Question::slider(id, draft.prompt, scale)?
        }
        other => return Err(TemplateDraftError::UnsupportedQuestionType(other.to_owned())),
    };

    let mut question = question;
    if let Some(description) = draft.description {
        question = question.with_description(description);
    }
    Ok(question.with_required(draft.required.unwrap_or(false))?)
}

#[derive(Debug, Serialize)]
struct ChatRequest {
    model: String,
    messages: Vec<ChatMessage>,
    temperature: f32,
}

#[derive(Debug, Serialize)]
struct ChatMessage {
    role: &'static str,
    content: String,
}

#[derive(Debug, Deserialize)]
struct ChatResponse {
    choices: Vec<ChatChoice>,
}

#[derive(Debug, Deserialize)]
struct ChatChoice {
    message: ChatMessageResponse,
}

#[derive(Debug, Deserialize)]
struct ChatMessageResponse {
    content: Option<String>,
}

#[derive(Debug, Deserialize)]
struct TemplateDraft {
    title: String,
    description: String,
    questions: Vec<QuestionDraft>,
}

#[derive(Debug, Deserialize)]
#[serde(rename_all = "camelCase")]
struct QuestionDraft {
    #[serde(rename = "type")]
    kind: String,
    prompt: String,
    #[serde(default)]
    description: Option<String>,
    #[serde(default)]
    required: Option<bool>,
    #[serde(default)]
    min: Option<f64>,
    #[serde(default)]
    max: Option<f64>,
    #[serde(default)]
    step: Option<f64>,
    #[serde(default)]
    min_label: Option<String>,
    #[serde(default)]
    max_label: Option<String>,
    #[serde(default)]
    options: Vec<OptionDraft>,
}

#[derive(Debug, Deserialize)]
struct OptionDraft {
    label: String,
    value: String,
}
