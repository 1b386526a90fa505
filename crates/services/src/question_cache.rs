use chrono::{DateTime, Duration, Utc};
use std::sync::{Arc, Mutex};

use quiz_core::model::QuestionRecord;
use storage::repository::{QuestionRepository, StorageError};

#[derive(Debug, Clone)]
struct Snapshot {
    questions: Arc<Vec<QuestionRecord>>,
    loaded_at: DateTime<Utc>,
}

/// Explicit, shareable cache of the question bank.
///
/// Entries expire `ttl` after they were loaded; `invalidate` drops them
/// immediately. Time is always passed in by the caller's clock.
#[derive(Clone)]
pub struct QuestionCache {
    source: Arc<dyn QuestionRepository>,
    ttl: Duration,
    snapshot: Arc<Mutex<Option<Snapshot>>>,
}

impl QuestionCache {
    /// Default time a loaded bank stays fresh.
    pub const DEFAULT_TTL_MINUTES: i64 = 30;

    #[must_use]
    pub fn new(source: Arc<dyn QuestionRepository>, ttl: Duration) -> Self {
        Self {
            source,
            ttl,
            snapshot: Arc::new(Mutex::new(None)),
        }
    }

    #[must_use]
    pub fn with_default_ttl(source: Arc<dyn QuestionRepository>) -> Self {
        Self::new(source, Duration::minutes(Self::DEFAULT_TTL_MINUTES))
    }

    #[must_use]
    pub fn source(&self) -> Arc<dyn QuestionRepository> {
        Arc::clone(&self.source)
    }

    #[must_use]
    pub fn ttl(&self) -> Duration {
        self.ttl
    }

    /// Returns true if a snapshot exists and is younger than the TTL at `now`.
    ///
    /// # Errors
    ///
    /// Returns `StorageError::Connection` if the cache lock is poisoned.
    pub fn is_fresh(&self, now: DateTime<Utc>) -> Result<bool, StorageError> {
        let guard = self
            .snapshot
            .lock()
            .map_err(|e| StorageError::Connection(e.to_string()))?;
        Ok(guard
            .as_ref()
            .is_some_and(|s| now - s.loaded_at < self.ttl))
    }

    /// Serve the cached bank, reloading from the repository when stale.
    ///
    /// # Errors
    ///
    /// Returns `StorageError` if the repository fails or the lock is poisoned.
    pub async fn get_or_load(
        &self,
        now: DateTime<Utc>,
    ) -> Result<Arc<Vec<QuestionRecord>>, StorageError> {
        {
            let guard = self
                .snapshot
                .lock()
                .map_err(|e| StorageError::Connection(e.to_string()))?;
            if let Some(snapshot) = guard.as_ref() {
                if now - snapshot.loaded_at < self.ttl {
                    return Ok(Arc::clone(&snapshot.questions));
                }
            }
        }

        let questions = match self.source.list_questions().await {
            Ok(questions) => Arc::new(questions),
            Err(err) => {
                tracing::warn!(error = %err, "question bank reload failed");
                return Err(err);
            }
        };
        tracing::debug!(count = questions.len(), "question cache refreshed");

        let mut guard = self
            .snapshot
            .lock()
            .map_err(|e| StorageError::Connection(e.to_string()))?;
        *guard = Some(Snapshot {
            questions: Arc::clone(&questions),
            loaded_at: now,
        });
        Ok(questions)
    }

    /// Drop the cached bank so the next read goes to the repository.
    ///
    /// # Errors
    ///
    /// Returns `StorageError::Connection` if the cache lock is poisoned.
    pub fn invalidate(&self) -> Result<(), StorageError> {
        let mut guard = self
            .snapshot
            .lock()
            .map_err(|e| StorageError::Connection(e.to_string()))?;
        *guard = None;
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use async_trait::async_trait;
    use quiz_core::time::fixed_now;
    use std::sync::atomic::{AtomicUsize, Ordering};

    #[derive(Default)]
    struct CountingBank {
        loads: AtomicUsize,
    }

    #[async_trait]
    impl QuestionRepository for CountingBank {
        async fn list_questions(&self) -> Result<Vec<QuestionRecord>, StorageError> {
            let n = self.loads.fetch_add(1, Ordering::SeqCst);
            Ok(vec![
                QuestionRecord::new(format!("q{n}"), "Prompt", vec!["A".into()], 0, "Skilt")
                    .unwrap(),
            ])
        }
    }

    struct BrokenBank;

    #[async_trait]
    impl QuestionRepository for BrokenBank {
        async fn list_questions(&self) -> Result<Vec<QuestionRecord>, StorageError> {
            Err(StorageError::Connection("offline".into()))
        }
    }

    #[tokio::test]
    async fn serves_from_cache_until_ttl_expires() {
        let bank = Arc::new(CountingBank::default());
        let cache = QuestionCache::new(bank.clone(), Duration::minutes(10));
        let now = fixed_now();

        assert!(!cache.is_fresh(now).unwrap());
        let first = cache.get_or_load(now).await.unwrap();
        let again = cache.get_or_load(now + Duration::minutes(9)).await.unwrap();
        assert!(Arc::ptr_eq(&first, &again));
        assert_eq!(bank.loads.load(Ordering::SeqCst), 1);

        let reloaded = cache.get_or_load(now + Duration::minutes(10)).await.unwrap();
        assert_eq!(bank.loads.load(Ordering::SeqCst), 2);
        assert_eq!(reloaded[0].id.as_str(), "q1");
    }

    #[tokio::test]
    async fn invalidate_forces_reload() {
        let bank = Arc::new(CountingBank::default());
        let cache = QuestionCache::with_default_ttl(bank.clone());
        let now = fixed_now();

        cache.get_or_load(now).await.unwrap();
        assert!(cache.is_fresh(now).unwrap());
        cache.invalidate().unwrap();
        assert!(!cache.is_fresh(now).unwrap());
        cache.get_or_load(now).await.unwrap();
        assert_eq!(bank.loads.load(Ordering::SeqCst), 2);
    }

    #[tokio::test]
    async fn load_errors_are_propagated() {
        let cache = QuestionCache::with_default_ttl(Arc::new(BrokenBank));
        assert!(matches!(
            cache.get_or_load(fixed_now()).await,
            Err(StorageError::Connection(_))
        ));
    }
}
