use std::collections::HashSet;
use std::path::{Path, PathBuf};

use async_trait::async_trait;
use prep_core::model::{Question, QuestionDraft};
use tracing::info;

use crate::repository::{QuestionSource, StorageError};

/// Catalog held in memory, e.g. built in tests or bundled with the binary.
#[derive(Debug, Clone, Default)]
pub struct StaticQuestionSource {
    questions: Vec<Question>,
}

impl StaticQuestionSource {
    #[must_use]
    pub fn new(questions: Vec<Question>) -> Self {
        Self { questions }
    }
}

#[async_trait]
impl QuestionSource for StaticQuestionSource {
    async fn fetch_all(&self) -> Result<Vec<Question>, StorageError> {
        Ok(self.questions.clone())
    }
}

/// Catalog stored as a JSON array of question drafts.
#[derive(Debug, Clone)]
pub struct JsonFileQuestionSource {
    path: PathBuf,
}

impl JsonFileQuestionSource {
    #[must_use]
    pub fn new(path: impl Into<PathBuf>) -> Self {
        Self { path: path.into() }
    }

    #[must_use]
    pub fn path(&self) -> &Path {
        &self.path
    }
}

#[async_trait]
impl QuestionSource for JsonFileQuestionSource {
    async fn fetch_all(&self) -> Result<Vec<Question>, StorageError> {
        let raw = std::fs::read_to_string(&self.path).map_err(|err| match err.kind() {
            std::io::ErrorKind::NotFound => StorageError::NotFound,
            _ => StorageError::Connection(format!("{}: {err}", self.path.display())),
        })?;
        let questions = parse_catalog(&raw)?;
        info!(path = %self.path.display(), count = questions.len(), "question catalog loaded");
        Ok(questions)
    }
}

/// Parse and validate a JSON catalog. Question ids must be unique.
///
/// # Errors
///
/// Returns `StorageError::Serialization` for malformed JSON, invalid questions,
/// or duplicate ids.
pub fn parse_catalog(raw: &str) -> Result<Vec<Question>, StorageError> {
    let drafts: Vec<QuestionDraft> =
        serde_json::from_str(raw).map_err(|e| StorageError::Serialization(e.to_string()))?;

    let mut seen = HashSet::with_capacity(drafts.len());
    drafts
        .into_iter()
        .map(|draft| {
            let id = draft.id;
            if !seen.insert(id) {
                return Err(StorageError::Serialization(format!(
                    "duplicate question id {id}"
                )));
            }
            draft
                .validate()
                .map_err(|e| StorageError::Serialization(format!("question {id}: {e}")))
        })
        .collect()
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::io::Write;

    const CATALOG: &str = r#"[
        {"id": 1, "question": "2+2?", "options": ["3", "4"], "correctAnswer": 1, "category": "Quant", "year": "2023"},
        {"id": 2, "question": "Main idea?", "passage": "Text", "options": ["x", "y", "z"], "correctAnswer": 2, "category": "VARC"}
    ]"#;

    #[test]
    fn parses_valid_catalog() {
        let questions = parse_catalog(CATALOG).unwrap();
        assert_eq!(questions.len(), 2);
        assert_eq!(questions[1].passage(), Some("Text"));
    }

    #[test]
    fn rejects_duplicate_ids() {
        let raw = r#"[
            {"id": 1, "question": "a", "options": ["1", "2"], "correctAnswer": 0, "category": "Quant"},
            {"id": 1, "question": "b", "options": ["1", "2"], "correctAnswer": 0, "category": "Quant"}
        ]"#;
        let err = parse_catalog(raw).unwrap_err();
        assert!(err.to_string().contains("duplicate question id 1"));
    }

    #[test]
    fn rejects_invalid_correct_answer() {
        let raw = r#"[{"id": 5, "question": "a", "options": ["1", "2"], "correctAnswer": 2, "category": "DILR"}]"#;
        let err = parse_catalog(raw).unwrap_err();
        assert!(err.to_string().contains("question 5"));
    }

    #[tokio::test]
    async fn reads_catalog_from_file() {
        let mut file = tempfile::NamedTempFile::new().unwrap();
        file.write_all(CATALOG.as_bytes()).unwrap();

        let source = JsonFileQuestionSource::new(file.path());
        let questions = source.fetch_all().await.unwrap();
        assert_eq!(questions.len(), 2);
    }

    #[tokio::test]
    async fn missing_file_is_not_found() {
        let source = JsonFileQuestionSource::new("/definitely/not/here.json");
        assert!(matches!(
            source.fetch_all().await.unwrap_err(),
            StorageError::NotFound
        ));
    }
}
