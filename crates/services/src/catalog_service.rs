use std::sync::Arc;

use prep_core::catalog::{self, CatalogError};
use prep_core::model::{Category, PaperDescriptor, Question, QuestionId, Test, TestId};
use storage::repository::QuestionSource;
use tracing::info;

use crate::error::CatalogServiceError;

/// Question counts per section, for dashboard totals.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct CategoryCounts {
    pub quant: usize,
    pub varc: usize,
    pub dilr: usize,
}

impl CategoryCounts {
    #[must_use]
    pub fn get(&self, category: Category) -> usize {
        match category {
            Category::Quant => self.quant,
            Category::Varc => self.varc,
            Category::Dilr => self.dilr,
        }
    }

    #[must_use]
    pub fn total(&self) -> usize {
        self.quant + self.varc + self.dilr
    }
}

/// Read-only view over the loaded catalog.
///
/// The source is fetched once and the mock set is composed once, so the
/// full-mock shuffle is stable for the lifetime of the service.
#[derive(Debug)]
pub struct CatalogService {
    questions: Vec<Question>,
    mocks: Vec<Test>,
    papers: Vec<PaperDescriptor>,
}

impl CatalogService {
    /// Fetch the catalog and compose mocks and paper listings.
    ///
    /// # Errors
    ///
    /// Returns `CatalogServiceError::Storage` if the source cannot be read.
    pub async fn load(source: Arc<dyn QuestionSource>) -> Result<Self, CatalogServiceError> {
        let questions = source.fetch_all().await?;
        let service = Self::from_questions(questions);
        info!(
            questions = service.questions.len(),
            mocks = service.mocks.len(),
            papers = service.papers.len(),
            "catalog loaded"
        );
        Ok(service)
    }

    #[must_use]
    pub fn from_questions(questions: Vec<Question>) -> Self {
        let mocks = catalog::build_mocks(&questions);
        Self::with_mocks(questions, mocks)
    }

    /// Build with a precomposed mock set, e.g. one drawn from a seeded RNG.
    #[must_use]
    pub fn with_mocks(questions: Vec<Question>, mocks: Vec<Test>) -> Self {
        let papers = catalog::build_paper_descriptors(&questions);
        Self {
            questions,
            mocks,
            papers,
        }
    }

    #[must_use]
    pub fn questions(&self) -> &[Question] {
        &self.questions
    }

    #[must_use]
    pub fn mocks(&self) -> &[Test] {
        &self.mocks
    }

    #[must_use]
    pub fn mock(&self, id: &TestId) -> Option<&Test> {
        self.mocks.iter().find(|t| t.id() == id)
    }

    #[must_use]
    pub fn papers(&self) -> &[PaperDescriptor] {
        &self.papers
    }

    #[must_use]
    pub fn question(&self, id: QuestionId) -> Option<&Question> {
        self.questions.iter().find(|q| q.id() == id)
    }

    /// # Errors
    ///
    /// Returns `CatalogError::NotFound` if no question carries `(year, slot)`.
    pub fn pyq_test(&self, year: &str, slot: &str) -> Result<Test, CatalogError> {
        catalog::build_pyq_test(&self.questions, year, slot)
    }

    #[must_use]
    pub fn practice_test(&self, id: QuestionId) -> Option<Test> {
        self.question(id).map(catalog::build_practice_test)
    }

    #[must_use]
    pub fn category_counts(&self) -> CategoryCounts {
        self.questions
            .iter()
            .fold(CategoryCounts::default(), |mut counts, q| {
                match q.category() {
                    Category::Quant => counts.quant += 1,
                    Category::Varc => counts.varc += 1,
                    Category::Dilr => counts.dilr += 1,
                }
                counts
            })
    }
}
