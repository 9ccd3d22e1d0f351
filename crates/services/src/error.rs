//! Shared error types for the services crate.

use thiserror::Error;

use prep_core::catalog::CatalogError;
use prep_core::engine::{AttemptResult, AttemptStatus, EngineError};
use prep_core::model::{EmailError, QuestionId, TestId};
use storage::repository::StorageError;
use storage::sqlite::SqliteInitError;

/// Errors emitted by `AuthService`.
#[derive(Debug, Error)]
#[non_exhaustive]
pub enum AuthError {
    #[error("{0} cannot be empty")]
    InvalidInput(&'static str),
    #[error(transparent)]
    InvalidEmail(#[from] EmailError),
    #[error("an account with this email already exists")]
    EmailTaken,
    #[error("invalid email or password")]
    InvalidCredentials,
    #[error(transparent)]
    Storage(#[from] StorageError),
}

/// Errors emitted by `StatsService`.
#[derive(Debug, Error)]
#[non_exhaustive]
pub enum StatsServiceError {
    #[error("score {score} exceeds total {total}")]
    InvalidScore { score: u32, total: u32 },
    #[error(transparent)]
    Storage(#[from] StorageError),
}

/// Errors emitted while loading the question catalog.
#[derive(Debug, Error)]
#[non_exhaustive]
pub enum CatalogServiceError {
    #[error(transparent)]
    Storage(#[from] StorageError),
}

/// Errors emitted by the AI question generator.
#[derive(Debug, Error)]
#[non_exhaustive]
pub enum GenerationError {
    #[error("question generation is not configured")]
    Unavailable,
    #[error("generator returned an empty response")]
    EmptyResponse,
    #[error("generator request failed with status {0}")]
    HttpStatus(reqwest::StatusCode),
    #[error(transparent)]
    Http(#[from] reqwest::Error),
    #[error("generator returned an unusable question: {0}")]
    Malformed(String),
}

/// Errors emitted by `SessionHost`.
#[derive(Debug, Error)]
#[non_exhaustive]
pub enum HostError {
    #[error(transparent)]
    NotFound(#[from] CatalogError),
    #[error("no test with id {0}")]
    UnknownTest(TestId),
    #[error("no question with id {0}")]
    UnknownQuestion(QuestionId),
    #[error("no generated question is available right now")]
    GenerationUnavailable,
    #[error("session is already {status}")]
    SessionClosed { status: AttemptStatus },
    #[error(transparent)]
    Engine(#[from] EngineError),
    #[error("finished attempt could not be recorded: {source}")]
    Stats {
        result: AttemptResult,
        #[source]
        source: StatsServiceError,
    },
}

/// Errors emitted while bootstrapping app services.
#[derive(Debug, Error)]
#[non_exhaustive]
pub enum AppServicesError {
    #[error(transparent)]
    Sqlite(#[from] SqliteInitError),
    #[error(transparent)]
    Catalog(#[from] CatalogServiceError),
}
