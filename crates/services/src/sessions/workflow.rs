use std::sync::{Arc, Mutex};

use chrono::Duration;
use rand::SeedableRng;
use rand::rngs::StdRng;

use quiz_core::achievements::{Achievement, UserStats, newly_unlocked};
use quiz_core::model::{AnswerRecord, TestPreset, TestResult, UserId};
use storage::repository::{QuestionRepository, ResultRepository};

use super::plan::{TestBuilder, TestPlan};
use super::service::TestSession;
use crate::Clock;
use crate::error::TestServiceError;
use crate::question_cache::QuestionCache;

/// Outcome of finishing a test.
#[derive(Debug, Clone)]
pub struct FinishedTest {
    pub result: TestResult,
    pub newly_unlocked: Vec<&'static Achievement>,
}

/// Orchestrates test start, answering and persisted finishing.
#[derive(Clone)]
pub struct TestService {
    clock: Clock,
    questions: QuestionCache,
    results: Arc<dyn ResultRepository>,
    rng: Arc<Mutex<StdRng>>,
}

impl TestService {
    #[must_use]
    pub fn new(
        clock: Clock,
        questions: Arc<dyn QuestionRepository>,
        results: Arc<dyn ResultRepository>,
    ) -> Self {
        Self {
            clock,
            questions: QuestionCache::with_default_ttl(questions),
            results,
            rng: Arc::new(Mutex::new(StdRng::from_rng(&mut rand::rng()))),
        }
    }

    /// Use a deterministic random source, e.g. for tests or reproducible runs.
    #[must_use]
    pub fn with_seed(mut self, seed: u64) -> Self {
        self.rng = Arc::new(Mutex::new(StdRng::seed_from_u64(seed)));
        self
    }

    /// Change how long the fetched question bank is reused.
    ///
    /// Call while building the service; it starts over with an empty cache.
    #[must_use]
    pub fn with_cache_ttl(mut self, ttl: Duration) -> Self {
        self.questions = QuestionCache::new(self.questions_source(), ttl);
        self
    }

    fn questions_source(&self) -> Arc<dyn QuestionRepository> {
        self.questions.source()
    }

    #[must_use]
    pub fn question_cache(&self) -> &QuestionCache {
        &self.questions
    }

    /// Select and prepare questions without starting a session.
    ///
    /// # Errors
    ///
    /// Returns `TestServiceError` for storage, selection or validation failures.
    pub async fn plan_test(
        &self,
        user: &UserId,
        preset: TestPreset,
        category: Option<&str>,
    ) -> Result<TestPlan, TestServiceError> {
        let now = self.clock.now();
        let pool = self.questions.get_or_load(now).await?;
        let results = self.results.list_results(user).await?;

        let mut rng = self
            .rng
            .lock()
            .map_err(|e| TestServiceError::RandomSource(e.to_string()))?;
        let plan = TestBuilder::new(preset, &results)
            .with_category(category)
            .build(&mut *rng, &pool)?;

        tracing::debug!(
            %user,
            pool = pool.len(),
            history = results.len(),
            unseen = plan.unseen_selected,
            seen = plan.seen_selected,
            "planned test"
        );
        Ok(plan)
    }

    /// Start a test over the whole bank.
    ///
    /// # Errors
    ///
    /// Returns `TestServiceError::NoQuestions` if nothing could be selected.
    pub async fn start_test(
        &self,
        user: &UserId,
        preset: TestPreset,
    ) -> Result<TestSession, TestServiceError> {
        self.start(user, preset, None).await
    }

    /// Start a test limited to one category.
    ///
    /// # Errors
    ///
    /// Returns `TestServiceError::NoQuestions` if the category has no questions.
    pub async fn start_category_test(
        &self,
        user: &UserId,
        preset: TestPreset,
        category: &str,
    ) -> Result<TestSession, TestServiceError> {
        self.start(user, preset, Some(category)).await
    }

    async fn start(
        &self,
        user: &UserId,
        preset: TestPreset,
        category: Option<&str>,
    ) -> Result<TestSession, TestServiceError> {
        let plan = self.plan_test(user, preset, category).await?;
        if plan.is_empty() {
            return Err(TestServiceError::NoQuestions);
        }
        let total = plan.total();
        let session = TestSession::new(plan.questions, self.clock.now())?;
        tracing::info!(%user, questions = total, category, "test started");
        Ok(session)
    }

    /// Answer the current question and advance to the next one.
    ///
    /// # Errors
    ///
    /// Returns `TestServiceError::Session` if the answer is rejected.
    pub fn answer_current(
        &self,
        session: &mut TestSession,
        selected: usize,
        time_spent_ms: u64,
    ) -> Result<AnswerRecord, TestServiceError> {
        let answer = session.answer_current(selected, time_spent_ms)?.clone();
        session.next();
        Ok(answer)
    }

    /// Finish the test, persist the result and report new achievements.
    ///
    /// # Errors
    ///
    /// Returns `TestServiceError` if the session was already finished or storage fails.
    pub async fn finish_test(
        &self,
        user: &UserId,
        session: &mut TestSession,
    ) -> Result<FinishedTest, TestServiceError> {
        let now = self.clock.now();
        let today = self.clock.today();
        let mut history = self.results.list_results(user).await?;
        let before = UserStats::from_results(&history, today);

        let result = session.tally(now)?;
        self.results.append_result(user, &result).await?;
        session.mark_finished(now);

        history.push(result.clone());
        let after = UserStats::from_results(&history, today);
        let newly_unlocked = newly_unlocked(&before, &after);

        tracing::info!(
            %user,
            result = %result.id(),
            score = result.score(),
            total = result.total_questions(),
            unlocked = newly_unlocked.len(),
            "test finished"
        );
        Ok(FinishedTest {
            result,
            newly_unlocked,
        })
    }
}
