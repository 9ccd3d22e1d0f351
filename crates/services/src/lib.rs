#![forbid(unsafe_code)]

pub mod ai;
pub mod app_services;
pub mod auth_service;
pub mod catalog_service;
pub mod error;
pub mod sessions;
pub mod stats_service;

pub use prep_core::Clock;

pub use ai::{DisabledGenerator, GeneratorConfig, OpenAiQuestionGenerator, QuestionGenerator};
pub use app_services::AppServices;
pub use auth_service::AuthService;
pub use catalog_service::{CatalogService, CategoryCounts};
pub use error::{
    AppServicesError, AuthError, CatalogServiceError, GenerationError, HostError,
    StatsServiceError,
};
pub use sessions::{
    ActiveSession, CompletionSummary, HostConfig, HostOutcome, SessionHost, SessionInput,
    SessionUpdate, SubmitReason,
};
pub use stats_service::StatsService;
