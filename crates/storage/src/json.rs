//! JSON catalog source.
//!
//! A catalog file is an array of test records in the camelCase shape of
//! `TestDraft`. Every record is validated before it reaches the catalog.

use exam_core::model::{TestDefinition, TestDraft};
use std::path::Path;

use crate::repository::{InMemoryCatalog, StorageError};

fn ser<E: core::fmt::Display>(e: E) -> StorageError {
    StorageError::Serialization(e.to_string())
}

/// Parse and validate a catalog from a JSON string.
///
/// # Errors
///
/// Returns `StorageError::Serialization` for malformed JSON,
/// `StorageError::Invalid` for records that break test invariants and
/// `StorageError::Conflict` for repeated slugs.
pub fn parse_catalog(raw: &str) -> Result<Vec<TestDefinition>, StorageError> {
    let drafts: Vec<TestDraft> = serde_json::from_str(raw).map_err(ser)?;
    let mut tests = Vec::with_capacity(drafts.len());
    for draft in drafts {
        let test = draft.validate()?;
        if tests
            .iter()
            .any(|existing: &TestDefinition| existing.slug() == test.slug())
        {
            return Err(StorageError::Conflict(test.slug().clone()));
        }
        tests.push(test);
    }
    Ok(tests)
}

/// Read a JSON catalog file into an in-memory catalog.
///
/// # Errors
///
/// Returns `StorageError::Io` if the file cannot be read, otherwise the
/// errors of [`parse_catalog`].
pub async fn load_catalog_file(path: impl AsRef<Path>) -> Result<InMemoryCatalog, StorageError> {
    let path = path.as_ref();
    let raw = tokio::fs::read_to_string(path).await?;
    let tests = parse_catalog(&raw)?;
    tracing::info!(path = %path.display(), tests = tests.len(), "loaded catalog");
    InMemoryCatalog::from_tests(tests)
}
