use std::sync::Arc;

use storage::repository::Storage;

use crate::Clock;
use crate::progress_service::ProgressService;
use crate::sessions::TestService;

/// Assembles app-facing services over one storage backend.
#[derive(Clone)]
pub struct AppServices {
    tests: Arc<TestService>,
    progress: Arc<ProgressService>,
}

impl AppServices {
    #[must_use]
    pub fn new(storage: &Storage, clock: Clock) -> Self {
        Self::from_test_service(
            storage,
            clock,
            TestService::new(
                clock,
                Arc::clone(&storage.questions),
                Arc::clone(&storage.results),
            ),
        )
    }

    /// Like [`AppServices::new`] but with reproducible question selection.
    #[must_use]
    pub fn seeded(storage: &Storage, clock: Clock, seed: u64) -> Self {
        Self::from_test_service(
            storage,
            clock,
            TestService::new(
                clock,
                Arc::clone(&storage.questions),
                Arc::clone(&storage.results),
            )
            .with_seed(seed),
        )
    }

    fn from_test_service(storage: &Storage, clock: Clock, tests: TestService) -> Self {
        let progress = ProgressService::new(
            clock,
            Arc::clone(&storage.questions),
            Arc::clone(&storage.results),
        );
        Self {
            tests: Arc::new(tests),
            progress: Arc::new(progress),
        }
    }

    #[must_use]
    pub fn tests(&self) -> Arc<TestService> {
        Arc::clone(&self.tests)
    }

    #[must_use]
    pub fn progress(&self) -> Arc<ProgressService> {
        Arc::clone(&self.progress)
    }
}
