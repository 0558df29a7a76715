#![forbid(unsafe_code)]

pub mod catalog_service;
pub mod config;
pub mod error;
pub mod sessions;

pub use exam_core::Clock;
pub use sessions as session;

pub use catalog_service::{CatalogFilter, CatalogService, TestCard};
pub use config::SessionConfig;
pub use error::{CatalogError, SessionError};

pub use sessions::{
    ExamSession, NavigatorStatus, ReviewItem, SessionHandle, SessionIntent, SessionProgress,
    SessionRunner, SessionSnapshot,
};
