mod answer;
mod ids;
mod mood;
mod question;
mod result;
mod template;

pub use answer::{AnswerMap, AnswerValue};
pub use ids::{OptionId, QuestionId, SessionId, TemplateId};
pub use mood::{MOOD_NOTE_KEY, MOOD_VALUE_KEY, MoodCapture, MoodError, RESERVED_KEY_PREFIX};
pub use question::{
    Branch, Question, QuestionError, QuestionOption, QuestionType, SliderScale,
};
pub use result::{ResultError, SessionResult};
pub use template::{Template, TemplateError};
