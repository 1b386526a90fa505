#![forbid(unsafe_code)]

pub mod app_services;
pub mod error;
pub mod progress_service;
pub mod question_cache;
pub mod sessions;

pub use quiz_core::Clock;

pub use app_services::AppServices;
pub use error::{ProgressError, SessionError, TestServiceError};
pub use progress_service::{ProgressReport, ProgressService};
pub use question_cache::QuestionCache;
pub use sessions::{FinishedTest, TestBuilder, TestPlan, TestProgress, TestService, TestSession};
