#![forbid(unsafe_code)]

pub mod app_services;
pub mod error;
pub mod sessions;
pub mod template_draft_service;
pub mod template_service;

pub use wellness_core::Clock;

pub use app_services::AppServices;
pub use error::{AppServicesError, SessionError, TemplateDraftError, TemplateServiceError};
pub use sessions::{
    AdvanceOutcome, BackOutcome, SessionFlowService, SessionHistoryService, SessionPhase,
    SessionProgress, SessionRunner,
};
pub use template_draft_service::{TemplateDraftConfig, TemplateDraftService};
pub use template_service::TemplateService;
