use std::sync::Arc;

use quiz_core::Clock;
use quiz_core::achievements::{AchievementStatus, UserStats, check_achievements};
use quiz_core::model::{TestResult, UserId};
use quiz_core::selection::HistorySet;
use quiz_core::statistics::{ProgressSummary, QuestionStatistics, question_statistics};
use storage::repository::{QuestionRepository, ResultRepository};

use crate::error::ProgressError;

/// Everything the progress screen shows for one user.
#[derive(Debug, Clone)]
pub struct ProgressReport {
    pub summary: ProgressSummary,
    pub stats: UserStats,
    pub achievements: Vec<AchievementStatus>,
    pub coverage: QuestionStatistics,
}

impl ProgressReport {
    #[must_use]
    pub fn unlocked_count(&self) -> usize {
        self.achievements.iter().filter(|a| a.unlocked).count()
    }
}

/// Read-only aggregation over a user's results.
#[derive(Clone)]
pub struct ProgressService {
    clock: Clock,
    questions: Arc<dyn QuestionRepository>,
    results: Arc<dyn ResultRepository>,
}

impl ProgressService {
    #[must_use]
    pub fn new(
        clock: Clock,
        questions: Arc<dyn QuestionRepository>,
        results: Arc<dyn ResultRepository>,
    ) -> Self {
        Self {
            clock,
            questions,
            results,
        }
    }

    /// Results for `user`, newest first.
    ///
    /// # Errors
    ///
    /// Returns `ProgressError::Storage` if the results cannot be read.
    pub async fn history(&self, user: &UserId) -> Result<Vec<TestResult>, ProgressError> {
        Ok(self.results.list_results(user).await?)
    }

    /// Build the full progress report for `user`.
    ///
    /// # Errors
    ///
    /// Returns `ProgressError::Storage` if questions or results cannot be read.
    pub async fn report(&self, user: &UserId) -> Result<ProgressReport, ProgressError> {
        let results = self.results.list_results(user).await?;
        let pool = self.questions.list_questions().await?;

        let stats = UserStats::from_results(&results, self.clock.today());
        let history = HistorySet::from_results(&results);

        Ok(ProgressReport {
            summary: ProgressSummary::from_results(&results),
            achievements: check_achievements(&stats),
            coverage: question_statistics(&pool, &history),
            stats,
        })
    }
}
