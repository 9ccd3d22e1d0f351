use serde::{Deserialize, Serialize};
use std::fmt;
use std::str::FromStr;
use thiserror::Error;

use crate::model::ids::QuestionId;
use crate::model::paper::PaperKey;

//
// ─── ERRORS ────────────────────────────────────────────────────────────────────
//

#[derive(Debug, Error, Clone, PartialEq, Eq)]
#[non_exhaustive]
pub enum QuestionError {
    #[error("question text cannot be empty")]
    EmptyText,

    #[error("a question needs at least two options, got {count}")]
    TooFewOptions { count: usize },

    #[error("correct answer index {index} is out of range for {len} options")]
    CorrectAnswerOutOfRange { index: usize, len: usize },

    #[error("option {index} is empty")]
    EmptyOption { index: usize },
}

//
// ─── CATEGORY ──────────────────────────────────────────────────────────────────
//

/// Exam section a question belongs to.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
pub enum Category {
    #[serde(rename = "Quant")]
    Quant,
    #[serde(rename = "VARC")]
    Varc,
    #[serde(rename = "DILR")]
    Dilr,
}

impl Category {
    pub const ALL: [Category; 3] = [Category::Quant, Category::Varc, Category::Dilr];

    #[must_use]
    pub fn label(self) -> &'static str {
        match self {
            Category::Quant => "Quant",
            Category::Varc => "VARC",
            Category::Dilr => "DILR",
        }
    }

    /// Lower-case slug used when building test ids.
    #[must_use]
    pub fn slug(self) -> &'static str {
        match self {
            Category::Quant => "quant",
            Category::Varc => "varc",
            Category::Dilr => "dilr",
        }
    }
}

impl fmt::Display for Category {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.label())
    }
}

/// Error returned when a category label is not one of Quant/VARC/DILR.
#[derive(Debug, Error, Clone, PartialEq, Eq)]
#[error("unknown category: {0}")]
pub struct UnknownCategory(pub String);

impl FromStr for Category {
    type Err = UnknownCategory;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.trim().to_ascii_lowercase().as_str() {
            "quant" | "qa" => Ok(Category::Quant),
            "varc" => Ok(Category::Varc),
            "dilr" | "lrdi" => Ok(Category::Dilr),
            other => Err(UnknownCategory(other.to_string())),
        }
    }
}

//
// ─── DRAFT ─────────────────────────────────────────────────────────────────────
//

/// Unvalidated question as it appears in a catalog file or a generator response.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct QuestionDraft {
    pub id: QuestionId,
    pub question: String,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub passage: Option<String>,
    pub options: Vec<String>,
    pub correct_answer: usize,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub explanation: Option<String>,
    pub category: Category,
    #[serde(default, skip_serializing_if = "std::ops::Not::not")]
    pub is_premium: bool,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub year: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub slot: Option<String>,
}

impl QuestionDraft {
    /// Validate the draft into an immutable `Question`.
    ///
    /// # Errors
    ///
    /// Returns `QuestionError` if the text is blank, there are fewer than two
    /// options, an option is blank, or `correct_answer` does not index `options`.
    pub fn validate(self) -> Result<Question, QuestionError> {
        let body = self.question.trim();
        if body.is_empty() {
            return Err(QuestionError::EmptyText);
        }
        if self.options.len() < 2 {
            return Err(QuestionError::TooFewOptions {
                count: self.options.len(),
            });
        }
        if let Some(index) = self.options.iter().position(|o| o.trim().is_empty()) {
            return Err(QuestionError::EmptyOption { index });
        }
        if self.correct_answer >= self.options.len() {
            return Err(QuestionError::CorrectAnswerOutOfRange {
                index: self.correct_answer,
                len: self.options.len(),
            });
        }

        Ok(Question {
            id: self.id,
            body: body.to_string(),
            passage: non_blank(self.passage),
            options: self.options,
            correct_answer: self.correct_answer,
            explanation: non_blank(self.explanation),
            category: self.category,
            is_premium: self.is_premium,
            year: non_blank(self.year),
            slot: non_blank(self.slot),
        })
    }
}

fn non_blank(value: Option<String>) -> Option<String> {
    value
        .map(|v| v.trim().to_string())
        .filter(|v| !v.is_empty())
}

//
// ─── QUESTION ──────────────────────────────────────────────────────────────────
//

/// A multiple-choice question. Immutable once validated.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Question {
    id: QuestionId,
    body: String,
    passage: Option<String>,
    options: Vec<String>,
    correct_answer: usize,
    explanation: Option<String>,
    category: Category,
    is_premium: bool,
    year: Option<String>,
    slot: Option<String>,
}

impl Question {
    #[must_use]
    pub fn id(&self) -> QuestionId {
        self.id
    }

    #[must_use]
    pub fn body(&self) -> &str {
        &self.body
    }

    #[must_use]
    pub fn passage(&self) -> Option<&str> {
        self.passage.as_deref()
    }

    #[must_use]
    pub fn options(&self) -> &[String] {
        &self.options
    }

    #[must_use]
    pub fn option_count(&self) -> usize {
        self.options.len()
    }

    /// Zero-based index of the correct option. Always valid for `options()`.
    #[must_use]
    pub fn correct_answer(&self) -> usize {
        self.correct_answer
    }

    #[must_use]
    pub fn is_correct(&self, choice: usize) -> bool {
        self.correct_answer == choice
    }

    #[must_use]
    pub fn explanation(&self) -> Option<&str> {
        self.explanation.as_deref()
    }

    #[must_use]
    pub fn category(&self) -> Category {
        self.category
    }

    #[must_use]
    pub fn is_premium(&self) -> bool {
        self.is_premium
    }

    #[must_use]
    pub fn year(&self) -> Option<&str> {
        self.year.as_deref()
    }

    #[must_use]
    pub fn slot(&self) -> Option<&str> {
        self.slot.as_deref()
    }

    /// Grouping key for previous-year papers, with defaults applied.
    #[must_use]
    pub fn paper_key(&self) -> PaperKey {
        PaperKey::from_parts(self.year(), self.slot())
    }
}

impl From<&Question> for QuestionDraft {
    fn from(q: &Question) -> Self {
        Self {
            id: q.id,
            question: q.body.clone(),
            passage: q.passage.clone(),
            options: q.options.clone(),
            correct_answer: q.correct_answer,
            explanation: q.explanation.clone(),
            category: q.category,
            is_premium: q.is_premium,
            year: q.year.clone(),
            slot: q.slot.clone(),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn draft() -> QuestionDraft {
        QuestionDraft {
            id: QuestionId::new(1),
            question: "What is 2 + 2?".into(),
            passage: None,
            options: vec!["3".into(), "4".into(), "5".into(), "6".into()],
            correct_answer: 1,
            explanation: Some("Basic addition.".into()),
            category: Category::Quant,
            is_premium: false,
            year: Some("2023".into()),
            slot: None,
        }
    }

    #[test]
    fn validates_well_formed_draft() {
        let q = draft().validate().unwrap();
        assert_eq!(q.option_count(), 4);
        assert!(q.is_correct(1));
        assert!(!q.is_correct(0));
        assert_eq!(q.year(), Some("2023"));
    }

    #[test]
    fn rejects_correct_answer_out_of_range() {
        let mut d = draft();
        d.correct_answer = 4;
        assert_eq!(
            d.validate().unwrap_err(),
            QuestionError::CorrectAnswerOutOfRange { index: 4, len: 4 }
        );
    }

    #[test]
    fn rejects_single_option() {
        let mut d = draft();
        d.options.truncate(1);
        d.correct_answer = 0;
        assert_eq!(
            d.validate().unwrap_err(),
            QuestionError::TooFewOptions { count: 1 }
        );
    }

    #[test]
    fn rejects_blank_text() {
        let mut d = draft();
        d.question = "   ".into();
        assert_eq!(d.validate().unwrap_err(), QuestionError::EmptyText);
    }

    #[test]
    fn blank_optional_fields_collapse_to_none() {
        let mut d = draft();
        d.passage = Some("  ".into());
        d.slot = Some(String::new());
        let q = d.validate().unwrap();
        assert_eq!(q.passage(), None);
        assert_eq!(q.slot(), None);
    }

    #[test]
    fn deserializes_catalog_json() {
        let json = r#"{
            "id": 7,
            "question": "Pick the odd one out",
            "options": ["a", "b"],
            "correctAnswer": 0,
            "category": "DILR",
            "isPremium": true,
            "slot": "Slot 2"
        }"#;
        let d: QuestionDraft = serde_json::from_str(json).unwrap();
        let q = d.validate().unwrap();
        assert_eq!(q.category(), Category::Dilr);
        assert!(q.is_premium());
        assert_eq!(q.paper_key().year(), "Unknown");
        assert_eq!(q.paper_key().slot(), "Slot 2");
    }

    #[test]
    fn category_parses_loose_labels() {
        assert_eq!("varc".parse::<Category>().unwrap(), Category::Varc);
        assert_eq!(" LRDI ".parse::<Category>().unwrap(), Category::Dilr);
        assert!("history".parse::<Category>().is_err());
    }
}
