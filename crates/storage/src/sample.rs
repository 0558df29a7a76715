//! Bundled sample catalog used by the binary and in tests.

use exam_core::model::TestDefinition;

use crate::json::parse_catalog;
use crate::repository::{InMemoryCatalog, StorageError};

const SAMPLE_CATALOG_JSON: &str = include_str!("../data/sample_catalog.json");

/// Validated tests from the bundled sample catalog.
///
/// # Errors
///
/// Returns `StorageError` if the bundled data fails validation.
pub fn sample_tests() -> Result<Vec<TestDefinition>, StorageError> {
    parse_catalog(SAMPLE_CATALOG_JSON)
}

/// In-memory catalog seeded with [`sample_tests`].
///
/// # Errors
///
/// Returns `StorageError` if the bundled data fails validation.
pub fn sample_catalog() -> Result<InMemoryCatalog, StorageError> {
    InMemoryCatalog::from_tests(sample_tests()?)
}
