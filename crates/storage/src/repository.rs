use async_trait::async_trait;
use exam_core::model::{Category, TestDefinition, TestDefinitionError, TestSlug};
use std::sync::{Arc, Mutex};
use thiserror::Error;

/// Errors surfaced by catalog adapters.
#[derive(Debug, Error)]
#[non_exhaustive]
pub enum StorageError {
    #[error("not found")]
    NotFound,

    #[error("conflict: slug {0} is already in the catalog")]
    Conflict(TestSlug),

    #[error("connection error: {0}")]
    Connection(String),

    #[error("serialization error: {0}")]
    Serialization(String),

    #[error(transparent)]
    Invalid(#[from] TestDefinitionError),

    #[error(transparent)]
    Io(#[from] std::io::Error),
}

/// Read-only source of test definitions.
#[async_trait]
pub trait CatalogRepository: Send + Sync {
    /// All tests in catalog order.
    ///
    /// # Errors
    ///
    /// Returns `StorageError` if the catalog cannot be read.
    async fn list_tests(&self) -> Result<Vec<TestDefinition>, StorageError>;

    /// Fetch one test by slug.
    ///
    /// # Errors
    ///
    /// Returns `StorageError::NotFound` if no test has this slug, or other storage errors.
    async fn get_test(&self, slug: &TestSlug) -> Result<TestDefinition, StorageError>;

    /// Tests in the given category, in catalog order.
    ///
    /// # Errors
    ///
    /// Returns `StorageError` if the catalog cannot be read.
    async fn list_by_category(
        &self,
        category: Category,
    ) -> Result<Vec<TestDefinition>, StorageError> {
        let tests = self.list_tests().await?;
        Ok(tests
            .into_iter()
            .filter(|test| test.category() == category)
            .collect())
    }
}

/// In-memory catalog keeping insertion order.
#[derive(Debug, Clone, Default)]
pub struct InMemoryCatalog {
    tests: Arc<Mutex<Vec<TestDefinition>>>,
}

impl InMemoryCatalog {
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    /// Build a catalog from already-validated tests.
    ///
    /// # Errors
    ///
    /// Returns `StorageError::Conflict` if two tests share a slug.
    pub fn from_tests(tests: Vec<TestDefinition>) -> Result<Self, StorageError> {
        let catalog = Self::new();
        for test in tests {
            catalog.insert(test)?;
        }
        Ok(catalog)
    }

    /// Add a test to the end of the catalog.
    ///
    /// # Errors
    ///
    /// Returns `StorageError::Conflict` if the slug is taken.
    pub fn insert(&self, test: TestDefinition) -> Result<(), StorageError> {
        let mut guard = self
            .tests
            .lock()
            .map_err(|e| StorageError::Connection(e.to_string()))?;
        if guard.iter().any(|existing| existing.slug() == test.slug()) {
            return Err(StorageError::Conflict(test.slug().clone()));
        }
        guard.push(test);
        Ok(())
    }

    #[must_use]
    pub fn len(&self) -> usize {
        self.tests.lock().map(|guard| guard.len()).unwrap_or(0)
    }

    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.len() == 0
    }
}

#[async_trait]
impl CatalogRepository for InMemoryCatalog {
    async fn list_tests(&self) -> Result<Vec<TestDefinition>, StorageError> {
        let guard = self
            .tests
            .lock()
            .map_err(|e| StorageError::Connection(e.to_string()))?;
        Ok(guard.clone())
    }

    async fn get_test(&self, slug: &TestSlug) -> Result<TestDefinition, StorageError> {
        let guard = self
            .tests
            .lock()
            .map_err(|e| StorageError::Connection(e.to_string()))?;
        guard
            .iter()
            .find(|test| test.slug() == slug)
            .cloned()
            .ok_or(StorageError::NotFound)
    }
}

/// Catalog handle behind a trait object so sources can be swapped.
#[derive(Clone)]
pub struct Storage {
    pub catalog: Arc<dyn CatalogRepository>,
}

impl Storage {
    #[must_use]
    pub fn in_memory(catalog: InMemoryCatalog) -> Self {
        Self {
            catalog: Arc::new(catalog),
        }
    }

    /// Storage backed by the bundled sample catalog.
    ///
    /// # Errors
    ///
    /// Returns `StorageError` if the bundled data fails validation.
    pub fn sample() -> Result<Self, StorageError> {
        Ok(Self::in_memory(crate::sample::sample_catalog()?))
    }

    /// Storage backed by a JSON catalog file.
    ///
    /// # Errors
    ///
    /// Returns `StorageError` if the file cannot be read or fails validation.
    pub async fn from_json_file(path: impl AsRef<std::path::Path>) -> Result<Self, StorageError> {
        let catalog = crate::json::load_catalog_file(path).await?;
        Ok(Self::in_memory(catalog))
    }
}
