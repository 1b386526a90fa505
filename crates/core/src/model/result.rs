use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use std::collections::{BTreeMap, HashMap};
use thiserror::Error;

use crate::model::{QuestionId, QuestionRecord, ResultId};

#[derive(Debug, Error, Clone, PartialEq, Eq)]
#[non_exhaustive]
pub enum TestResultError {
    #[error("score ({score}) exceeds total questions ({total})")]
    ScoreExceedsTotal { score: u32, total: u32 },

    #[error("too many answers for a single test: {len}")]
    TooManyAnswers { len: usize },

    #[error("answer references unknown question {0}")]
    UnknownQuestion(QuestionId),
}

//
// ─── ANSWER RECORD ─────────────────────────────────────────────────────────────
//

/// A single answer given during a test.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct AnswerRecord {
    pub question_id: QuestionId,
    #[serde(rename = "selectedAnswer")]
    pub selected_index: usize,
    pub is_correct: bool,
    /// Milliseconds spent on the question.
    #[serde(rename = "timeSpent")]
    pub time_spent_ms: u64,
}

impl AnswerRecord {
    /// Grades `selected_index` against the question's correct option.
    #[must_use]
    pub fn grade(question: &QuestionRecord, selected_index: usize, time_spent_ms: u64) -> Self {
        Self {
            question_id: question.id.clone(),
            selected_index,
            is_correct: question.is_correct(selected_index),
            time_spent_ms,
        }
    }
}

//
// ─── CATEGORY SCORE ────────────────────────────────────────────────────────────
//

/// Correct/total tally for one category.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct CategoryScore {
    pub correct: u32,
    pub total: u32,
}

impl CategoryScore {
    pub fn record(&mut self, is_correct: bool) {
        self.total = self.total.saturating_add(1);
        if is_correct {
            self.correct = self.correct.saturating_add(1);
        }
    }

    pub fn merge(&mut self, other: CategoryScore) {
        self.correct = self.correct.saturating_add(other.correct);
        self.total = self.total.saturating_add(other.total);
    }
}

//
// ─── TEST RESULT ───────────────────────────────────────────────────────────────
//

/// Outcome of a finished practice test.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase", try_from = "PersistedResult")]
pub struct TestResult {
    id: ResultId,
    #[serde(rename = "date")]
    completed_at: DateTime<Utc>,
    score: u32,
    total_questions: u32,
    /// Milliseconds between test start and finish.
    #[serde(rename = "duration")]
    duration_ms: u64,
    answers: Vec<AnswerRecord>,
    #[serde(default)]
    category_breakdown: BTreeMap<String, CategoryScore>,
}

// Wire shape of `TestResult`; deserialisation goes through `from_persisted`.
#[derive(Deserialize)]
#[serde(rename_all = "camelCase")]
struct PersistedResult {
    id: ResultId,
    #[serde(rename = "date")]
    completed_at: DateTime<Utc>,
    score: u32,
    total_questions: u32,
    #[serde(rename = "duration")]
    duration_ms: u64,
    answers: Vec<AnswerRecord>,
    #[serde(default)]
    category_breakdown: BTreeMap<String, CategoryScore>,
}

impl TryFrom<PersistedResult> for TestResult {
    type Error = TestResultError;

    fn try_from(raw: PersistedResult) -> Result<Self, Self::Error> {
        Self::from_persisted(
            raw.id,
            raw.completed_at,
            raw.score,
            raw.total_questions,
            raw.duration_ms,
            raw.answers,
            raw.category_breakdown,
        )
    }
}

impl TestResult {
    /// Rehydrate a result from persisted storage.
    ///
    /// # Errors
    ///
    /// Returns `TestResultError::ScoreExceedsTotal` if the score is larger than the total.
    pub fn from_persisted(
        id: ResultId,
        completed_at: DateTime<Utc>,
        score: u32,
        total_questions: u32,
        duration_ms: u64,
        answers: Vec<AnswerRecord>,
        category_breakdown: BTreeMap<String, CategoryScore>,
    ) -> Result<Self, TestResultError> {
        if score > total_questions {
            return Err(TestResultError::ScoreExceedsTotal {
                score,
                total: total_questions,
            });
        }
        Ok(Self {
            id,
            completed_at,
            score,
            total_questions,
            duration_ms,
            answers,
            category_breakdown,
        })
    }

    /// Build a result by tallying `answers` against the questions of the test.
    ///
    /// `total_questions` is the number of questions in the test, not the number
    /// answered; unanswered questions count as incorrect.
    ///
    /// # Errors
    ///
    /// Returns `TestResultError::UnknownQuestion` if an answer references a question
    /// that is not part of `questions`, or `TooManyAnswers` if counts overflow `u32`.
    pub fn tally(
        id: ResultId,
        completed_at: DateTime<Utc>,
        duration_ms: u64,
        questions: &[QuestionRecord],
        answers: Vec<AnswerRecord>,
    ) -> Result<Self, TestResultError> {
        let by_id: HashMap<&QuestionId, &QuestionRecord> =
            questions.iter().map(|q| (&q.id, q)).collect();

        let mut breakdown: BTreeMap<String, CategoryScore> = BTreeMap::new();
        let mut score = 0_u32;
        for answer in &answers {
            let question = by_id
                .get(&answer.question_id)
                .ok_or_else(|| TestResultError::UnknownQuestion(answer.question_id.clone()))?;
            breakdown
                .entry(question.category.clone())
                .or_default()
                .record(answer.is_correct);
            if answer.is_correct {
                score = score.saturating_add(1);
            }
        }

        let total_questions = u32::try_from(questions.len())
            .map_err(|_| TestResultError::TooManyAnswers { len: questions.len() })?;

        Self::from_persisted(
            id,
            completed_at,
            score,
            total_questions,
            duration_ms,
            answers,
            breakdown,
        )
    }

    #[must_use]
    pub fn id(&self) -> ResultId {
        self.id
    }

    #[must_use]
    pub fn completed_at(&self) -> DateTime<Utc> {
        self.completed_at
    }

    #[must_use]
    pub fn score(&self) -> u32 {
        self.score
    }

    #[must_use]
    pub fn total_questions(&self) -> u32 {
        self.total_questions
    }

    #[must_use]
    pub fn duration_ms(&self) -> u64 {
        self.duration_ms
    }

    #[must_use]
    pub fn answers(&self) -> &[AnswerRecord] {
        &self.answers
    }

    #[must_use]
    pub fn category_breakdown(&self) -> &BTreeMap<String, CategoryScore> {
        &self.category_breakdown
    }

    /// Returns true if every question was answered correctly.
    #[must_use]
    pub fn is_perfect(&self) -> bool {
        self.total_questions > 0 && self.score == self.total_questions
    }
}
