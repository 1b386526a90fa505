//! Read-only question bank backed by the app's `questions.json` export.

use async_trait::async_trait;
use quiz_core::model::QuestionRecord;
use serde::Deserialize;
use std::collections::HashSet;
use std::path::Path;
use std::sync::Arc;

use crate::repository::{QuestionRepository, StorageError};

#[derive(Debug, Deserialize)]
struct QuestionFile {
    questions: Vec<QuestionRecord>,
}

/// Questions parsed and validated from a JSON document of the form
/// `{ "questions": [ ... ] }`.
#[derive(Debug, Clone)]
pub struct JsonQuestionBank {
    questions: Arc<Vec<QuestionRecord>>,
}

impl JsonQuestionBank {
    /// Parse a bank from a JSON string.
    ///
    /// # Errors
    ///
    /// - `StorageError::Serialization` for malformed JSON.
    /// - `StorageError::InvalidQuestion` if any record breaks its invariants.
    /// - `StorageError::Conflict` if two records share an id.
    pub fn from_json(raw: &str) -> Result<Self, StorageError> {
        let file: QuestionFile =
            serde_json::from_str(raw).map_err(|e| StorageError::Serialization(e.to_string()))?;

        let mut ids = HashSet::with_capacity(file.questions.len());
        for question in &file.questions {
            question.validate()?;
            if !ids.insert(&question.id) {
                tracing::warn!(id = %question.id, "duplicate question id in bank");
                return Err(StorageError::Conflict);
            }
        }

        tracing::debug!(count = file.questions.len(), "loaded question bank");
        Ok(Self {
            questions: Arc::new(file.questions),
        })
    }

    /// Read and parse a bank from disk.
    ///
    /// # Errors
    ///
    /// Returns `StorageError::Io` if the file cannot be read, otherwise see
    /// [`JsonQuestionBank::from_json`].
    pub fn from_path(path: impl AsRef<Path>) -> Result<Self, StorageError> {
        let path = path.as_ref();
        let raw = std::fs::read_to_string(path)
            .map_err(|e| StorageError::Io(format!("{}: {e}", path.display())))?;
        Self::from_json(&raw)
    }

    #[must_use]
    pub fn len(&self) -> usize {
        self.questions.len()
    }

    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.questions.is_empty()
    }
}

#[async_trait]
impl QuestionRepository for JsonQuestionBank {
    async fn list_questions(&self) -> Result<Vec<QuestionRecord>, StorageError> {
        Ok(self.questions.as_ref().clone())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use quiz_core::model::QuestionId;

    const BANK: &str = r#"{
        "questions": [
            {
                "id": "q1",
                "question": "Hva betyr et rødt lys?",
                "options": ["Stopp", "Kjør", "Sakte", "Tut", "Blink"],
                "correctAnswer": 0,
                "explanation": "Rødt betyr stopp.",
                "category": "Lyssignal"
            },
            {
                "id": "q2",
                "question": "Hvor fort i tettbygd strøk?",
                "options": ["30", "50", "80"],
                "correctAnswer": 1,
                "explanation": "",
                "category": "Fart"
            }
        ]
    }"#;

    #[tokio::test]
    async fn parses_bank_and_serves_repository_calls() {
        let bank = JsonQuestionBank::from_json(BANK).unwrap();
        assert_eq!(bank.len(), 2);
        assert_eq!(bank.categories().await.unwrap(), vec!["Fart", "Lyssignal"]);
        let q2 = bank.get_question(&QuestionId::new("q2")).await.unwrap();
        assert_eq!(q2.correct_option(), Some("50"));
    }

    #[test]
    fn rejects_invalid_records_and_duplicates() {
        let broken = BANK.replace("\"correctAnswer\": 1", "\"correctAnswer\": 3");
        assert!(matches!(
            JsonQuestionBank::from_json(&broken),
            Err(StorageError::InvalidQuestion(_))
        ));

        let dupes = BANK.replace("\"id\": \"q2\"", "\"id\": \"q1\"");
        assert!(matches!(
            JsonQuestionBank::from_json(&dupes),
            Err(StorageError::Conflict)
        ));

        assert!(matches!(
            JsonQuestionBank::from_json("{"),
            Err(StorageError::Serialization(_))
        ));
    }

    #[test]
    fn missing_file_is_an_io_error() {
        assert!(matches!(
            JsonQuestionBank::from_path("/definitely/not/here.json"),
            Err(StorageError::Io(_))
        ));
    }
}
