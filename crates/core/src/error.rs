use thiserror::Error;

use crate::catalog::CatalogError;
use crate::engine::EngineError;
use crate::model::{EmailError, QuestionError, TestError};

#[derive(Debug, Error)]
#[non_exhaustive]
pub enum Error {
    #[error(transparent)]
    Question(#[from] QuestionError),
    #[error(transparent)]
    Test(#[from] TestError),
    #[error(transparent)]
    Email(#[from] EmailError),
    #[error(transparent)]
    Catalog(#[from] CatalogError),
    #[error(transparent)]
    Engine(#[from] EngineError),
}
