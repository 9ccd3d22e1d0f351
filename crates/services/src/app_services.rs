use std::path::Path;
use std::sync::Arc;

use prep_core::model::Question;
use storage::question_source::{JsonFileQuestionSource, StaticQuestionSource};
use storage::repository::{QuestionSource, Storage};

use crate::Clock;
use crate::ai::{DisabledGenerator, OpenAiQuestionGenerator, QuestionGenerator};
use crate::auth_service::AuthService;
use crate::catalog_service::CatalogService;
use crate::error::AppServicesError;
use crate::sessions::SessionHost;
use crate::stats_service::StatsService;

/// Assembles app-facing services over one storage backend and one catalog.
#[derive(Clone)]
pub struct AppServices {
    auth: Arc<AuthService>,
    stats: Arc<StatsService>,
    catalog: Arc<CatalogService>,
    generator: Arc<dyn QuestionGenerator>,
    host: Arc<SessionHost>,
}

impl AppServices {
    /// Build services backed by `SQLite` storage and a JSON catalog file.
    ///
    /// The question generator is configured from `PREP_AI_*` variables.
    ///
    /// # Errors
    ///
    /// Returns `AppServicesError` if storage initialization or catalog loading fails.
    pub async fn new_sqlite(
        db_url: &str,
        catalog_path: impl AsRef<Path>,
        clock: Clock,
    ) -> Result<Self, AppServicesError> {
        let storage = Storage::sqlite(db_url).await?;
        let source: Arc<dyn QuestionSource> =
            Arc::new(JsonFileQuestionSource::new(catalog_path.as_ref()));
        let catalog = CatalogService::load(source).await?;

        let generator = OpenAiQuestionGenerator::from_env();
        let generator: Arc<dyn QuestionGenerator> = if generator.enabled() {
            Arc::new(generator)
        } else {
            Arc::new(DisabledGenerator)
        };

        Ok(Self::assemble(storage, catalog, generator, clock))
    }

    /// In-memory storage over a fixed question list, with generation disabled.
    ///
    /// # Errors
    ///
    /// Returns `AppServicesError` if the catalog cannot be loaded.
    pub async fn in_memory(questions: Vec<Question>, clock: Clock) -> Result<Self, AppServicesError> {
        let source: Arc<dyn QuestionSource> = Arc::new(StaticQuestionSource::new(questions));
        let catalog = CatalogService::load(source).await?;
        Ok(Self::assemble(
            Storage::in_memory(),
            catalog,
            Arc::new(DisabledGenerator),
            clock,
        ))
    }

    fn assemble(
        storage: Storage,
        catalog: CatalogService,
        generator: Arc<dyn QuestionGenerator>,
        clock: Clock,
    ) -> Self {
        let auth = Arc::new(AuthService::new(clock, Arc::clone(&storage.identity)));
        let stats = Arc::new(StatsService::new(clock, Arc::clone(&storage.stats)));
        let catalog = Arc::new(catalog);
        let host = Arc::new(SessionHost::new(
            Arc::clone(&catalog),
            Arc::clone(&stats),
            Arc::clone(&generator),
        ));

        Self {
            auth,
            stats,
            catalog,
            generator,
            host,
        }
    }

    #[must_use]
    pub fn auth(&self) -> Arc<AuthService> {
        Arc::clone(&self.auth)
    }

    #[must_use]
    pub fn stats(&self) -> Arc<StatsService> {
        Arc::clone(&self.stats)
    }

    #[must_use]
    pub fn catalog(&self) -> Arc<CatalogService> {
        Arc::clone(&self.catalog)
    }

    #[must_use]
    pub fn generator(&self) -> Arc<dyn QuestionGenerator> {
        Arc::clone(&self.generator)
    }

    #[must_use]
    pub fn host(&self) -> Arc<SessionHost> {
        Arc::clone(&self.host)
    }
}
