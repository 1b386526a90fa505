mod ids;
mod preset;
mod question;
mod result;

pub use ids::{ParseIdError, QuestionId, ResultId, UserId};
pub use preset::{PresetError, TestPreset, validate_unseen_fraction};
pub use question::{QuestionError, QuestionRecord};
pub use result::{AnswerRecord, CategoryScore, TestResult, TestResultError};
