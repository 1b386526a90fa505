use serde::{Deserialize, Serialize};
use thiserror::Error;

use crate::model::ids::QuestionId;

//
// ─── ERRORS ────────────────────────────────────────────────────────────────────
//

#[derive(Debug, Error, Clone, PartialEq, Eq)]
#[non_exhaustive]
pub enum QuestionError {
    #[error("question id cannot be empty")]
    EmptyId,

    #[error("question {id} has no prompt text")]
    EmptyPrompt { id: QuestionId },

    #[error("question {id} has no answer options")]
    NoOptions { id: QuestionId },

    #[error("question {id} has correct index {index} but only {len} options")]
    CorrectIndexOutOfRange {
        id: QuestionId,
        index: usize,
        len: usize,
    },

    #[error("question {id} has no category")]
    EmptyCategory { id: QuestionId },
}

//
// ─── QUESTION ──────────────────────────────────────────────────────────────────
//

/// A multiple-choice theory question as served by the question bank.
///
/// Fields are public so collaborators can build records directly; call
/// [`QuestionRecord::validate`] (or construct through [`QuestionRecord::new`])
/// before relying on the index invariant.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct QuestionRecord {
    pub id: QuestionId,
    #[serde(rename = "question")]
    pub prompt: String,
    pub options: Vec<String>,
    #[serde(rename = "correctAnswer")]
    pub correct_index: usize,
    pub category: String,
    #[serde(default)]
    pub explanation: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub sign_id: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub image_url: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub difficulty: Option<String>,
}

impl QuestionRecord {
    /// Creates a validated question without media references.
    ///
    /// # Errors
    ///
    /// Returns `QuestionError` if any invariant of [`QuestionRecord::validate`] fails.
    pub fn new(
        id: impl Into<QuestionId>,
        prompt: impl Into<String>,
        options: Vec<String>,
        correct_index: usize,
        category: impl Into<String>,
    ) -> Result<Self, QuestionError> {
        let question = Self {
            id: id.into(),
            prompt: prompt.into(),
            options,
            correct_index,
            category: category.into(),
            explanation: None,
            sign_id: None,
            image_url: None,
            difficulty: None,
        };
        question.validate()?;
        Ok(question)
    }

    #[must_use]
    pub fn with_explanation(mut self, explanation: impl Into<String>) -> Self {
        self.explanation = Some(explanation.into());
        self
    }

    #[must_use]
    pub fn with_image(mut self, sign_id: Option<String>, image_url: impl Into<String>) -> Self {
        self.sign_id = sign_id;
        self.image_url = Some(image_url.into());
        self
    }

    /// Checks the record invariants.
    ///
    /// # Errors
    ///
    /// - `QuestionError::EmptyId` / `EmptyPrompt` / `EmptyCategory` for blank text fields.
    /// - `QuestionError::NoOptions` if `options` is empty.
    /// - `QuestionError::CorrectIndexOutOfRange` if `correct_index >= options.len()`.
    pub fn validate(&self) -> Result<(), QuestionError> {
        if self.id.is_blank() {
            return Err(QuestionError::EmptyId);
        }
        if self.prompt.trim().is_empty() {
            return Err(QuestionError::EmptyPrompt {
                id: self.id.clone(),
            });
        }
        if self.options.is_empty() {
            return Err(QuestionError::NoOptions {
                id: self.id.clone(),
            });
        }
        if self.correct_index >= self.options.len() {
            return Err(QuestionError::CorrectIndexOutOfRange {
                id: self.id.clone(),
                index: self.correct_index,
                len: self.options.len(),
            });
        }
        if self.category.trim().is_empty() {
            return Err(QuestionError::EmptyCategory {
                id: self.id.clone(),
            });
        }
        Ok(())
    }

    /// Text of the correct option, if the index is in range.
    #[must_use]
    pub fn correct_option(&self) -> Option<&str> {
        self.options.get(self.correct_index).map(String::as_str)
    }

    /// Returns true when `selected` is the correct option index.
    #[must_use]
    pub fn is_correct(&self, selected: usize) -> bool {
        selected == self.correct_index
    }
}

//
// ─── TESTS ─────────────────────────────────────────────────────────────────────
//

#[cfg(test)]
mod tests {
    use super::*;

    fn options(items: &[&str]) -> Vec<String> {
        items.iter().map(|s| (*s).to_owned()).collect()
    }

    #[test]
    fn new_validates_correct_index() {
        let err = QuestionRecord::new("q1", "Hva betyr skiltet?", options(&["A", "B"]), 2, "Skilt")
            .unwrap_err();
        assert!(matches!(
            err,
            QuestionError::CorrectIndexOutOfRange { index: 2, len: 2, .. }
        ));
    }

    #[test]
    fn new_rejects_empty_options_and_category() {
        let err = QuestionRecord::new("q1", "Prompt", Vec::new(), 0, "Skilt").unwrap_err();
        assert!(matches!(err, QuestionError::NoOptions { .. }));

        let err = QuestionRecord::new("q1", "Prompt", options(&["A"]), 0, "  ").unwrap_err();
        assert!(matches!(err, QuestionError::EmptyCategory { .. }));

        let err = QuestionRecord::new(" ", "Prompt", options(&["A"]), 0, "Skilt").unwrap_err();
        assert_eq!(err, QuestionError::EmptyId);
    }

    #[test]
    fn deserializes_app_json_shape() {
        let raw = r#"{
            "id": "q7",
            "question": "Hvem har vikeplikt?",
            "options": ["Bilen fra høyre", "Du", "Ingen"],
            "correctAnswer": 0,
            "explanation": "Høyreregelen gjelder.",
            "category": "Vikeplikt",
            "imageUrl": "https://example.invalid/sign.png"
        }"#;
        let question: QuestionRecord = serde_json::from_str(raw).unwrap();
        question.validate().unwrap();
        assert_eq!(question.id, QuestionId::new("q7"));
        assert_eq!(question.correct_option(), Some("Bilen fra høyre"));
        assert!(question.is_correct(0));
        assert!(question.sign_id.is_none());
        assert!(question.image_url.is_some());
    }
}
