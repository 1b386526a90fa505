use chrono::{DateTime, Utc};
use quiz_core::model::{AnswerRecord, QuestionId, QuestionRecord, ResultId, TestResult};
use quiz_core::time::elapsed_ms;

use super::progress::TestProgress;
use crate::error::SessionError;

//
// ─── SESSION ───────────────────────────────────────────────────────────────────
//

/// In-memory practice test.
///
/// Holds the prepared questions and steps through them; answers may be given
/// in any order but each question only once. Finishing produces a
/// [`TestResult`] ready for the results store.
#[derive(Debug, Clone)]
pub struct TestSession {
    questions: Vec<QuestionRecord>,
    current: usize,
    answers: Vec<AnswerRecord>,
    started_at: DateTime<Utc>,
    finished_at: Option<DateTime<Utc>>,
}

impl TestSession {
    /// Start a test over `questions`.
    ///
    /// `started_at` should come from the services layer clock to keep time deterministic.
    ///
    /// # Errors
    ///
    /// Returns `SessionError::Empty` if no questions are provided.
    pub fn new(
        questions: Vec<QuestionRecord>,
        started_at: DateTime<Utc>,
    ) -> Result<Self, SessionError> {
        if questions.is_empty() {
            return Err(SessionError::Empty);
        }
        Ok(Self {
            questions,
            current: 0,
            answers: Vec::new(),
            started_at,
            finished_at: None,
        })
    }

    #[must_use]
    pub fn questions(&self) -> &[QuestionRecord] {
        &self.questions
    }

    #[must_use]
    pub fn answers(&self) -> &[AnswerRecord] {
        &self.answers
    }

    #[must_use]
    pub fn started_at(&self) -> DateTime<Utc> {
        self.started_at
    }

    #[must_use]
    pub fn finished_at(&self) -> Option<DateTime<Utc>> {
        self.finished_at
    }

    #[must_use]
    pub fn is_finished(&self) -> bool {
        self.finished_at.is_some()
    }

    #[must_use]
    pub fn current_index(&self) -> usize {
        self.current
    }

    #[must_use]
    pub fn current_question(&self) -> Option<&QuestionRecord> {
        self.questions.get(self.current)
    }

    /// The answer already recorded for `id`, if any.
    #[must_use]
    pub fn answer_for(&self, id: &QuestionId) -> Option<&AnswerRecord> {
        self.answers.iter().find(|a| &a.question_id == id)
    }

    #[must_use]
    pub fn progress(&self) -> TestProgress {
        TestProgress {
            total: self.questions.len(),
            answered: self.answers.len(),
            remaining: self.questions.len().saturating_sub(self.answers.len()),
            current_index: self.current,
            is_finished: self.is_finished(),
        }
    }

    /// Move to the next question. Returns false when already on the last one.
    pub fn next(&mut self) -> bool {
        if self.current + 1 < self.questions.len() {
            self.current += 1;
            true
        } else {
            false
        }
    }

    /// Move to the previous question. Returns false when already on the first one.
    pub fn previous(&mut self) -> bool {
        if self.current > 0 {
            self.current -= 1;
            true
        } else {
            false
        }
    }

    /// Record an answer for the current question.
    ///
    /// # Errors
    ///
    /// See [`TestSession::answer_question`].
    pub fn answer_current(
        &mut self,
        selected: usize,
        time_spent_ms: u64,
    ) -> Result<&AnswerRecord, SessionError> {
        let id = match self.current_question() {
            Some(question) => question.id.clone(),
            None => return Err(SessionError::Completed),
        };
        self.answer_question(&id, selected, time_spent_ms)
    }

    /// Record an answer for a specific question of the test.
    ///
    /// # Errors
    ///
    /// - `SessionError::Completed` once the test is finished.
    /// - `SessionError::UnknownQuestion` if `id` is not part of the test.
    /// - `SessionError::AlreadyAnswered` if the question already has an answer.
    /// - `SessionError::InvalidOption` if `selected` is not an option index.
    pub fn answer_question(
        &mut self,
        id: &QuestionId,
        selected: usize,
        time_spent_ms: u64,
    ) -> Result<&AnswerRecord, SessionError> {
        if self.is_finished() {
            return Err(SessionError::Completed);
        }
        let question = self
            .questions
            .iter()
            .find(|q| &q.id == id)
            .ok_or_else(|| SessionError::UnknownQuestion(id.clone()))?;
        if self.answer_for(id).is_some() {
            return Err(SessionError::AlreadyAnswered(id.clone()));
        }
        if selected >= question.options.len() {
            return Err(SessionError::InvalidOption {
                selected,
                len: question.options.len(),
            });
        }

        let answer = AnswerRecord::grade(question, selected, time_spent_ms);
        self.answers.push(answer);
        Ok(&self.answers[self.answers.len() - 1])
    }

    /// Tally the result as of `finished_at` without closing the test.
    ///
    /// # Errors
    ///
    /// Returns `SessionError::Completed` if the test was already finished.
    pub fn tally(&self, finished_at: DateTime<Utc>) -> Result<TestResult, SessionError> {
        if self.is_finished() {
            return Err(SessionError::Completed);
        }
        Ok(TestResult::tally(
            ResultId::generate(),
            finished_at,
            elapsed_ms(self.started_at, finished_at),
            &self.questions,
            self.answers.clone(),
        )?)
    }

    /// Close the test; further answers and finishes are rejected.
    pub fn mark_finished(&mut self, finished_at: DateTime<Utc>) {
        self.finished_at = Some(finished_at);
    }

    /// Close the test and tally the result.
    ///
    /// # Errors
    ///
    /// Returns `SessionError::Completed` if the test was already finished.
    pub fn finish(&mut self, finished_at: DateTime<Utc>) -> Result<TestResult, SessionError> {
        let result = self.tally(finished_at)?;
        self.mark_finished(finished_at);
        Ok(result)
    }
}
