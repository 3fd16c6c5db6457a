#![forbid(unsafe_code)]

pub mod app_services;
pub mod catalog_service;
pub mod error;
pub mod sessions;

pub use exam_core::Clock;

pub use app_services::AppServices;
pub use catalog_service::{CatalogService, TestSummary};
pub use error::{AppServicesError, CatalogError, SessionError};

pub use sessions::{
    AttemptOutcome, AttemptService, ExamSession, ResultId, ResultListItem, ResultView,
    ResultViewService, SessionProgress,
};
