#![forbid(unsafe_code)]

pub mod achievements;
pub mod model;
pub mod options;
pub mod scoring;
pub mod selection;
pub mod statistics;
pub mod time;

pub use options::{reduce_options, reduce_options_for_all};
pub use selection::{HistorySet, SelectionConfig, select_questions, select_questions_from_results};
pub use time::Clock;
