use std::collections::BTreeMap;

use crate::model::{CategoryScore, QuestionRecord, TestResult};
use crate::scoring::calculate_percentage;
use crate::selection::HistorySet;

/// How much of one category the user has seen.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct CategoryCoverage {
    pub seen: usize,
    pub total: usize,
}

/// Seen/unseen breakdown of the question bank for a user.
#[derive(Debug, Clone, PartialEq)]
pub struct QuestionStatistics {
    pub total_questions: usize,
    pub seen_questions: usize,
    pub unseen_questions: usize,
    /// 0.0 for an empty bank.
    pub percentage_seen: f64,
    pub category_coverage: BTreeMap<String, CategoryCoverage>,
}

#[must_use]
#[allow(clippy::cast_precision_loss)]
pub fn question_statistics(pool: &[QuestionRecord], history: &HistorySet) -> QuestionStatistics {
    let mut category_coverage: BTreeMap<String, CategoryCoverage> = BTreeMap::new();
    let mut seen_questions = 0;

    for question in pool {
        let coverage = category_coverage
            .entry(question.category.clone())
            .or_default();
        coverage.total += 1;
        if history.contains(&question.id) {
            coverage.seen += 1;
            seen_questions += 1;
        }
    }

    let percentage_seen = if pool.is_empty() {
        0.0
    } else {
        seen_questions as f64 / pool.len() as f64 * 100.0
    };

    QuestionStatistics {
        total_questions: pool.len(),
        seen_questions,
        unseen_questions: pool.len() - seen_questions,
        percentage_seen,
        category_coverage,
    }
}

/// Totals across a user's result history, as shown on the progress screen.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct ProgressSummary {
    pub total_tests: usize,
    pub total_questions: u32,
    pub correct_answers: u32,
    pub average_score: u32,
    pub best_score: u32,
    pub total_time_ms: u64,
    pub category_breakdown: BTreeMap<String, CategoryScore>,
}

impl ProgressSummary {
    #[must_use]
    pub fn from_results(results: &[TestResult]) -> Self {
        let mut summary = ProgressSummary {
            total_tests: results.len(),
            ..ProgressSummary::default()
        };

        for result in results {
            summary.total_questions = summary
                .total_questions
                .saturating_add(result.total_questions());
            summary.correct_answers = summary.correct_answers.saturating_add(result.score());
            summary.total_time_ms = summary.total_time_ms.saturating_add(result.duration_ms());
            summary.best_score = summary
                .best_score
                .max(calculate_percentage(result.score(), result.total_questions()));

            for (category, score) in result.category_breakdown() {
                summary
                    .category_breakdown
                    .entry(category.clone())
                    .or_default()
                    .merge(*score);
            }
        }

        summary.average_score =
            calculate_percentage(summary.correct_answers, summary.total_questions);
        summary
    }

    /// Category with the lowest correct ratio, if any category has answers.
    #[must_use]
    pub fn weakest_category(&self) -> Option<(&str, CategoryScore)> {
        self.category_breakdown
            .iter()
            .filter(|(_, s)| s.total > 0)
            .min_by_key(|(_, s)| calculate_percentage(s.correct, s.total))
            .map(|(name, score)| (name.as_str(), *score))
    }
}
