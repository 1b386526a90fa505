use rand::Rng;

use quiz_core::model::{QuestionRecord, TestPreset, TestResult};
use quiz_core::reduce_options_for_all;
use quiz_core::selection::{HistorySet, SelectionConfig, select_with_history};

use crate::error::TestServiceError;

/// Selection result for a test build.
#[derive(Debug, Clone, PartialEq)]
pub struct TestPlan {
    pub questions: Vec<QuestionRecord>,
    pub unseen_selected: usize,
    pub seen_selected: usize,
}

impl TestPlan {
    /// Total number of questions in this plan.
    #[must_use]
    pub fn total(&self) -> usize {
        self.questions.len()
    }

    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.questions.is_empty()
    }
}

/// Builds a practice test: balanced selection first, then option reduction.
pub struct TestBuilder<'a> {
    preset: TestPreset,
    history: HistorySet,
    category: Option<&'a str>,
}

impl<'a> TestBuilder<'a> {
    #[must_use]
    pub fn new(preset: TestPreset, results: &[TestResult]) -> Self {
        Self {
            preset,
            history: HistorySet::from_results(results),
            category: None,
        }
    }

    /// Only draw questions from `category`.
    #[must_use]
    pub fn with_category(mut self, category: Option<&'a str>) -> Self {
        self.category = category;
        self
    }

    /// Build a plan from the full question pool.
    ///
    /// # Errors
    ///
    /// Propagates selection and question validation errors.
    pub fn build<R: Rng + ?Sized>(
        self,
        rng: &mut R,
        pool: &[QuestionRecord],
    ) -> Result<TestPlan, TestServiceError> {
        let filtered: Vec<QuestionRecord>;
        let pool = match self.category {
            Some(category) => {
                filtered = pool
                    .iter()
                    .filter(|q| q.category == category)
                    .cloned()
                    .collect();
                filtered.as_slice()
            }
            None => pool,
        };

        let selected =
            select_with_history(rng, &SelectionConfig::from(self.preset), pool, &self.history)?;
        let questions = reduce_options_for_all(rng, &selected)?;

        let unseen_selected = questions
            .iter()
            .filter(|q| !self.history.contains(&q.id))
            .count();

        Ok(TestPlan {
            seen_selected: questions.len() - unseen_selected,
            unseen_selected,
            questions,
        })
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use quiz_core::model::{AnswerRecord, ResultId};
    use quiz_core::time::fixed_now;
    use rand::SeedableRng;
    use rand::rngs::StdRng;

    fn pool() -> Vec<QuestionRecord> {
        (0..30)
            .map(|i| {
                QuestionRecord::new(
                    format!("q{i}"),
                    format!("Prompt {i}"),
                    (0..6).map(|o| format!("opt{o}")).collect(),
                    i % 6,
                    if i % 3 == 0 { "Skilt" } else { "Fart" },
                )
                .unwrap()
            })
            .collect()
    }

    fn past_result(pool: &[QuestionRecord], count: usize) -> TestResult {
        let questions = &pool[..count];
        let answers = questions
            .iter()
            .map(|q| AnswerRecord::grade(q, 0, 1_000))
            .collect();
        TestResult::tally(ResultId::generate(), fixed_now(), 60_000, questions, answers).unwrap()
    }

    #[test]
    fn builder_selects_and_reduces() {
        let pool = pool();
        let results = vec![past_result(&pool, 10)];
        let mut rng = StdRng::seed_from_u64(4);

        let plan = TestBuilder::new(TestPreset::quick(), &results)
            .build(&mut rng, &pool)
            .unwrap();

        assert_eq!(plan.total(), 10);
        assert_eq!(plan.unseen_selected, 8);
        assert_eq!(plan.seen_selected, 2);
        for question in &plan.questions {
            assert_eq!(question.options.len(), 4);
            let original = pool.iter().find(|q| q.id == question.id).unwrap();
            assert_eq!(
                question.correct_option(),
                original.correct_option(),
                "correct answer changed for {}",
                question.id
            );
        }
    }

    #[test]
    fn builder_limits_to_category() {
        let pool = pool();
        let mut rng = StdRng::seed_from_u64(8);
        let plan = TestBuilder::new(TestPreset::full(), &[])
            .with_category(Some("Skilt"))
            .build(&mut rng, &pool)
            .unwrap();

        assert_eq!(plan.total(), 10);
        assert!(plan.questions.iter().all(|q| q.category == "Skilt"));
    }

    #[test]
    fn unknown_category_yields_empty_plan() {
        let mut rng = StdRng::seed_from_u64(1);
        let plan = TestBuilder::new(TestPreset::quick(), &[])
            .with_category(Some("Nope"))
            .build(&mut rng, &pool())
            .unwrap();
        assert!(plan.is_empty());
    }
}
