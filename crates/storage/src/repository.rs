use async_trait::async_trait;
use quiz_core::model::{QuestionError, QuestionId, QuestionRecord, TestResult, UserId};
use std::collections::{BTreeSet, HashMap};
use std::sync::{Arc, Mutex};
use thiserror::Error;

/// Errors surfaced by storage adapters.
#[derive(Debug, Error)]
#[non_exhaustive]
pub enum StorageError {
    #[error("not found")]
    NotFound,

    #[error("conflict")]
    Conflict,

    #[error("connection error: {0}")]
    Connection(String),

    #[error("serialization error: {0}")]
    Serialization(String),

    #[error("io error: {0}")]
    Io(String),

    #[error(transparent)]
    InvalidQuestion(#[from] QuestionError),
}

/// Read access to the question bank.
#[async_trait]
pub trait QuestionRepository: Send + Sync {
    /// Every question in the bank, in bank order.
    ///
    /// # Errors
    ///
    /// Returns `StorageError` if the bank cannot be read.
    async fn list_questions(&self) -> Result<Vec<QuestionRecord>, StorageError>;

    /// Fetch a single question.
    ///
    /// # Errors
    ///
    /// Returns `StorageError::NotFound` if missing, or other storage errors.
    async fn get_question(&self, id: &QuestionId) -> Result<QuestionRecord, StorageError> {
        self.list_questions()
            .await?
            .into_iter()
            .find(|q| &q.id == id)
            .ok_or(StorageError::NotFound)
    }

    /// Questions belonging to `category`.
    ///
    /// # Errors
    ///
    /// Returns `StorageError` if the bank cannot be read.
    async fn questions_in_category(
        &self,
        category: &str,
    ) -> Result<Vec<QuestionRecord>, StorageError> {
        let mut questions = self.list_questions().await?;
        questions.retain(|q| q.category == category);
        Ok(questions)
    }

    /// Distinct category labels, sorted.
    ///
    /// # Errors
    ///
    /// Returns `StorageError` if the bank cannot be read.
    async fn categories(&self) -> Result<Vec<String>, StorageError> {
        let categories: BTreeSet<String> = self
            .list_questions()
            .await?
            .into_iter()
            .map(|q| q.category)
            .collect();
        Ok(categories.into_iter().collect())
    }
}

/// Results store for finished tests.
#[async_trait]
pub trait ResultRepository: Send + Sync {
    /// Append a finished test result for a user.
    ///
    /// # Errors
    ///
    /// Returns `StorageError::Conflict` if a result with the same id exists.
    async fn append_result(&self, user: &UserId, result: &TestResult) -> Result<(), StorageError>;

    /// All results for a user, newest first.
    ///
    /// # Errors
    ///
    /// Returns `StorageError` if results cannot be read.
    async fn list_results(&self, user: &UserId) -> Result<Vec<TestResult>, StorageError>;
}

/// Simple in-memory repository implementation for testing and prototyping.
#[derive(Clone, Default)]
pub struct InMemoryRepository {
    questions: Arc<Mutex<Vec<QuestionRecord>>>,
    results: Arc<Mutex<HashMap<UserId, Vec<TestResult>>>>,
}

impl InMemoryRepository {
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    /// Insert or replace a question, keyed by id.
    ///
    /// # Errors
    ///
    /// Returns `StorageError::InvalidQuestion` if the record fails validation.
    pub fn upsert_question(&self, question: QuestionRecord) -> Result<(), StorageError> {
        question.validate()?;
        let mut guard = self
            .questions
            .lock()
            .map_err(|e| StorageError::Connection(e.to_string()))?;
        match guard.iter_mut().find(|q| q.id == question.id) {
            Some(existing) => *existing = question,
            None => guard.push(question),
        }
        Ok(())
    }
}

#[async_trait]
impl QuestionRepository for InMemoryRepository {
    async fn list_questions(&self) -> Result<Vec<QuestionRecord>, StorageError> {
        let guard = self
            .questions
            .lock()
            .map_err(|e| StorageError::Connection(e.to_string()))?;
        Ok(guard.clone())
    }

    async fn get_question(&self, id: &QuestionId) -> Result<QuestionRecord, StorageError> {
        let guard = self
            .questions
            .lock()
            .map_err(|e| StorageError::Connection(e.to_string()))?;
        guard
            .iter()
            .find(|q| &q.id == id)
            .cloned()
            .ok_or(StorageError::NotFound)
    }
}

#[async_trait]
impl ResultRepository for InMemoryRepository {
    async fn append_result(&self, user: &UserId, result: &TestResult) -> Result<(), StorageError> {
        let mut guard = self
            .results
            .lock()
            .map_err(|e| StorageError::Connection(e.to_string()))?;
        let entries = guard.entry(user.clone()).or_default();
        if entries.iter().any(|r| r.id() == result.id()) {
            return Err(StorageError::Conflict);
        }
        entries.push(result.clone());
        Ok(())
    }

    async fn list_results(&self, user: &UserId) -> Result<Vec<TestResult>, StorageError> {
        let guard = self
            .results
            .lock()
            .map_err(|e| StorageError::Connection(e.to_string()))?;
        let mut results = guard.get(user).cloned().unwrap_or_default();
        results.sort_by_key(|r| std::cmp::Reverse(r.completed_at()));
        Ok(results)
    }
}

/// Aggregates question and result repositories behind trait objects for easy backend swapping.
#[derive(Clone)]
pub struct Storage {
    pub questions: Arc<dyn QuestionRepository>,
    pub results: Arc<dyn ResultRepository>,
}

impl Storage {
    #[must_use]
    pub fn in_memory() -> Self {
        Self::from_repository(InMemoryRepository::new())
    }

    /// Serve both questions and results from one in-memory repository.
    #[must_use]
    pub fn from_repository(repo: InMemoryRepository) -> Self {
        let questions: Arc<dyn QuestionRepository> = Arc::new(repo.clone());
        let results: Arc<dyn ResultRepository> = Arc::new(repo);
        Self { questions, results }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use chrono::Duration;
    use quiz_core::model::ResultId;
    use quiz_core::time::fixed_now;
    use std::collections::BTreeMap;

    fn question(id: &str, category: &str) -> QuestionRecord {
        QuestionRecord::new(id, "Prompt", vec!["A".into(), "B".into()], 1, category).unwrap()
    }

    fn result(days_ago: i64) -> TestResult {
        TestResult::from_persisted(
            ResultId::generate(),
            fixed_now() - Duration::days(days_ago),
            1,
            2,
            10_000,
            Vec::new(),
            BTreeMap::new(),
        )
        .unwrap()
    }

    #[tokio::test]
    async fn upsert_replaces_by_id_and_lists_categories() {
        let repo = InMemoryRepository::new();
        repo.upsert_question(question("q1", "Skilt")).unwrap();
        repo.upsert_question(question("q2", "Vikeplikt")).unwrap();
        repo.upsert_question(question("q1", "Fart")).unwrap();

        let all = repo.list_questions().await.unwrap();
        assert_eq!(all.len(), 2);
        assert_eq!(
            repo.get_question(&QuestionId::new("q1")).await.unwrap().category,
            "Fart"
        );
        assert_eq!(repo.categories().await.unwrap(), vec!["Fart", "Vikeplikt"]);
        assert_eq!(repo.questions_in_category("Vikeplikt").await.unwrap().len(), 1);
        assert!(matches!(
            repo.get_question(&QuestionId::new("missing")).await,
            Err(StorageError::NotFound)
        ));
    }

    #[test]
    fn upsert_rejects_invalid_question() {
        let repo = InMemoryRepository::new();
        let mut broken = question("q1", "Skilt");
        broken.correct_index = 9;
        assert!(matches!(
            repo.upsert_question(broken),
            Err(StorageError::InvalidQuestion(_))
        ));
    }

    #[tokio::test]
    async fn results_are_listed_newest_first_per_user() {
        let repo = InMemoryRepository::new();
        let user = UserId::new("u1");
        let older = result(3);
        let newer = result(0);
        repo.append_result(&user, &older).await.unwrap();
        repo.append_result(&user, &newer).await.unwrap();

        let listed = repo.list_results(&user).await.unwrap();
        assert_eq!(listed[0].id(), newer.id());
        assert_eq!(listed[1].id(), older.id());
        assert!(repo.list_results(&UserId::new("other")).await.unwrap().is_empty());

        assert!(matches!(
            repo.append_result(&user, &newer).await,
            Err(StorageError::Conflict)
        ));
    }
}
