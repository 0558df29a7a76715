//! Shared error types for the services crate.

use thiserror::Error;

use exam_core::model::TestSlug;
use storage::repository::StorageError;

/// Errors emitted by `CatalogService`.
#[derive(Debug, Error)]
#[non_exhaustive]
pub enum CatalogError {
    #[error("no test with slug {slug}")]
    NotFound { slug: TestSlug },
    #[error(transparent)]
    Storage(#[from] StorageError),
}

/// Errors emitted by a session handle.
#[derive(Debug, Error, Clone, Copy, PartialEq, Eq)]
#[non_exhaustive]
pub enum SessionError {
    #[error("session runner has stopped")]
    Closed,
}
