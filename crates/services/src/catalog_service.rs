use std::sync::Arc;

use exam_core::Clock;
use exam_core::model::{Category, DifficultySplit, TestDefinition, TestSlug};
use serde::Serialize;
use storage::repository::{CatalogRepository, StorageError};

use crate::error::CatalogError;
use crate::sessions::ExamSession;

/// Category and free-text filter for the test list.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct CatalogFilter {
    pub category: Option<Category>,
    pub search: String,
}

impl CatalogFilter {
    #[must_use]
    pub fn category(mut self, category: Category) -> Self {
        self.category = Some(category);
        self
    }

    #[must_use]
    pub fn search(mut self, term: impl Into<String>) -> Self {
        self.search = term.into();
        self
    }

    #[must_use]
    pub fn matches(&self, test: &TestDefinition) -> bool {
        if self.category.is_some_and(|category| category != test.category()) {
            return false;
        }
        test.matches_query(&self.search.trim().to_lowercase())
    }
}

/// Summary card for one test in the catalog listing.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct TestCard {
    pub slug: TestSlug,
    pub title: String,
    pub description: String,
    pub category_label: &'static str,
    pub duration_minutes: u32,
    pub question_count: usize,
    pub max_score: f64,
    pub negative_label: String,
    #[serde(skip)]
    pub difficulty: DifficultySplit,
    pub topics: Vec<String>,
    pub key_rule: String,
}

impl TestCard {
    /// Topics shown on a card.
    pub const TOPIC_LIMIT: usize = 3;

    #[must_use]
    pub fn from_test(test: &TestDefinition) -> Self {
        Self {
            slug: test.slug().clone(),
            title: test.title().to_string(),
            description: test.description().to_string(),
            category_label: test.category().label(),
            duration_minutes: test.duration_minutes(),
            question_count: test.question_count(),
            max_score: test.max_score(),
            negative_label: test.marking().negative_label(),
            difficulty: test.difficulty_split(),
            topics: test
                .topics()
                .into_iter()
                .take(Self::TOPIC_LIMIT)
                .map(str::to_string)
                .collect(),
            key_rule: test
                .instructions()
                .first()
                .cloned()
                .unwrap_or_else(|| "Read the onscreen instructions.".to_string()),
        }
    }
}

/// Looks up tests and opens sessions for them.
#[derive(Clone)]
pub struct CatalogService {
    clock: Clock,
    catalog: Arc<dyn CatalogRepository>,
}

impl CatalogService {
    #[must_use]
    pub fn new(clock: Clock, catalog: Arc<dyn CatalogRepository>) -> Self {
        Self { clock, catalog }
    }

    /// Fetch a test by slug.
    ///
    /// # Errors
    ///
    /// Returns `CatalogError::NotFound` when no test has this slug.
    /// Returns `CatalogError::Storage` if repository access fails.
    pub async fn find(&self, slug: &TestSlug) -> Result<TestDefinition, CatalogError> {
        match self.catalog.get_test(slug).await {
            Ok(test) => Ok(test),
            Err(StorageError::NotFound) => Err(CatalogError::NotFound { slug: slug.clone() }),
            Err(err) => Err(err.into()),
        }
    }

    /// Tests matching `filter`, in catalog order.
    ///
    /// # Errors
    ///
    /// Returns `CatalogError::Storage` if repository access fails.
    pub async fn list(&self, filter: &CatalogFilter) -> Result<Vec<TestCard>, CatalogError> {
        let tests = match filter.category {
            Some(category) => self.catalog.list_by_category(category).await?,
            None => self.catalog.list_tests().await?,
        };
        Ok(tests
            .iter()
            .filter(|test| filter.matches(test))
            .map(TestCard::from_test)
            .collect())
    }

    /// Total number of tests, ignoring filters.
    ///
    /// # Errors
    ///
    /// Returns `CatalogError::Storage` if repository access fails.
    pub async fn count(&self) -> Result<usize, CatalogError> {
        Ok(self.catalog.list_tests().await?.len())
    }

    /// Open a new session in the intro phase for `slug`.
    ///
    /// # Errors
    ///
    /// Returns `CatalogError::NotFound` when no test has this slug.
    pub async fn open_session(&self, slug: &TestSlug) -> Result<ExamSession, CatalogError> {
        let test = self.find(slug).await?;
        tracing::debug!(%slug, questions = test.question_count(), "opening session");
        Ok(ExamSession::new(Arc::new(test), self.clock))
    }
}
