use std::env;
use std::sync::atomic::{AtomicU64, Ordering};

use async_trait::async_trait;
use prep_core::model::{Category, Question, QuestionDraft, QuestionId};
use reqwest::Client;
use serde::{Deserialize, Serialize};
use tracing::{debug, warn};

use crate::error::GenerationError;

/// First id handed to generated questions; catalog ids stay below it.
pub const GENERATED_ID_BASE: u64 = 9_000_000_000;

/// Best-effort source of fresh practice questions.
#[async_trait]
pub trait QuestionGenerator: Send + Sync {
    /// A new question on `topic`, or `None` if nothing usable came back.
    async fn generate(&self, topic: &str) -> Option<Question>;
}

/// Generator used when no API key is configured.
#[derive(Debug, Clone, Copy, Default)]
pub struct DisabledGenerator;

#[async_trait]
impl QuestionGenerator for DisabledGenerator {
    async fn generate(&self, topic: &str) -> Option<Question> {
        debug!(topic, "question generation disabled");
        None
    }
}

#[derive(Clone, Debug)]
pub struct GeneratorConfig {
    pub base_url: String,
    pub api_key: String,
    pub model: String,
}

impl GeneratorConfig {
    #[must_use]
    pub fn from_env() -> Option<Self> {
        let api_key = env::var("PREP_AI_API_KEY").ok()?;
        if api_key.trim().is_empty() {
            return None;
        }
        let base_url =
            env::var("PREP_AI_BASE_URL").unwrap_or_else(|_| "https://api.openai.com/v1".into());
        let model = env::var("PREP_AI_MODEL").unwrap_or_else(|_| "gpt-4o-mini".into());
        Some(Self {
            base_url,
            api_key,
            model,
        })
    }
}

/// Chat-completions backed generator.
pub struct OpenAiQuestionGenerator {
    client: Client,
    config: Option<GeneratorConfig>,
    next_id: AtomicU64,
}

impl OpenAiQuestionGenerator {
    #[must_use]
    pub fn from_env() -> Self {
        Self::new(GeneratorConfig::from_env())
    }

    #[must_use]
    pub fn new(config: Option<GeneratorConfig>) -> Self {
        Self {
            client: Client::new(),
            config,
            next_id: AtomicU64::new(GENERATED_ID_BASE),
        }
    }

    #[must_use]
    pub fn enabled(&self) -> bool {
        self.config.is_some()
    }

    /// Request one question on `topic`.
    ///
    /// # Errors
    ///
    /// Returns `GenerationError` when the generator is not configured, the
    /// request fails, or the reply is not a valid question.
    pub async fn try_generate(&self, topic: &str) -> Result<Question, GenerationError> {
        let config = self.config.as_ref().ok_or(GenerationError::Unavailable)?;

        let url = format!("{}/chat/completions", config.base_url.trim_end_matches('/'));
        let payload = ChatRequest {
            model: config.model.clone(),
            messages: vec![
                ChatMessage {
                    role: "system",
                    content: SYSTEM_PROMPT.to_string(),
                },
                ChatMessage {
                    role: "user",
                    content: format!("Topic: {}", topic.trim()),
                },
            ],
            temperature: 0.7,
        };

        let response = self
            .client
            .post(url)
            .bearer_auth(&config.api_key)
            .json(&payload)
            .send()
            .await?;

        if !response.status().is_success() {
            return Err(GenerationError::HttpStatus(response.status()));
        }

        let body: ChatResponse = response.json().await?;
        let content = body
            .choices
            .into_iter()
            .next()
            .and_then(|choice| choice.message.content)
            .filter(|c| !c.trim().is_empty())
            .ok_or(GenerationError::EmptyResponse)?;

        let id = QuestionId::new(self.next_id.fetch_add(1, Ordering::Relaxed));
        parse_generated(&content, id, category_for_topic(topic))
    }
}

#[async_trait]
impl QuestionGenerator for OpenAiQuestionGenerator {
    async fn generate(&self, topic: &str) -> Option<Question> {
        match self.try_generate(topic).await {
            Ok(question) => {
                debug!(topic, id = %question.id(), "question generated");
                Some(question)
            }
            Err(err) => {
                warn!(topic, error = %err, "question generation failed");
                None
            }
        }
    }
}

/// Section a free-text topic belongs to. Unrecognised topics are Quant.
#[must_use]
pub fn category_for_topic(topic: &str) -> Category {
    if let Ok(category) = topic.parse::<Category>() {
        return category;
    }
    let topic = topic.to_ascii_lowercase();
    let mentions = |words: &[&str]| words.iter().any(|w| topic.contains(w));
    if mentions(&["verbal", "reading", "comprehension", "para", "grammar", "vocab"]) {
        Category::Varc
    } else if mentions(&["logic", "reasoning", "puzzle", "data interpretation", "arrangement"]) {
        Category::Dilr
    } else {
        Category::Quant
    }
}

const SYSTEM_PROMPT: &str = "You write multiple-choice questions for MBA entrance exam practice. \
Reply with a single JSON object and nothing else, using the keys \
\"question\" (string), \"passage\" (string or null), \"options\" (array of 4 strings), \
\"correctAnswer\" (zero-based index into options) and \"explanation\" (string).";

/// Fields the model is asked to produce; the rest are filled in locally.
#[derive(Debug, Deserialize)]
#[serde(rename_all = "camelCase")]
struct GeneratedDraft {
    question: String,
    #[serde(default)]
    passage: Option<String>,
    options: Vec<String>,
    correct_answer: usize,
    #[serde(default)]
    explanation: Option<String>,
}

fn parse_generated(
    content: &str,
    id: QuestionId,
    category: Category,
) -> Result<Question, GenerationError> {
    let generated: GeneratedDraft = serde_json::from_str(strip_code_fence(content))
        .map_err(|e| GenerationError::Malformed(e.to_string()))?;
    QuestionDraft {
        id,
        question: generated.question,
        passage: generated.passage,
        options: generated.options,
        correct_answer: generated.correct_answer,
        explanation: generated.explanation,
        category,
        is_premium: false,
        year: None,
        slot: None,
    }
    .validate()
    .map_err(|e| GenerationError::Malformed(e.to_string()))
}

fn strip_code_fence(content: &str) -> &str {
    let trimmed = content.trim();
    let Some(rest) = trimmed.strip_prefix("```") else {
        return trimmed;
    };
    // Drop the language tag line, e.g. "```json".
    let body = rest.split_once('\n').map_or("", |(_, body)| body);
    body.trim_end().strip_suffix("```").unwrap_or(body).trim()
}

#[derive(Debug, Serialize)]
struct ChatRequest {
    model: String,
    messages: Vec<ChatMessage>,
    temperature: f32,
}

#[derive(Debug, Serialize)]
struct ChatMessage {
    role: &'static str,
    content: String,
}

#[derive(Debug, Deserialize)]
struct ChatResponse {
    choices: Vec<ChatChoice>,
}

#[derive(Debug, Deserialize)]
struct ChatChoice {
    message: ChatMessageResponse,
}

#[derive(Debug, Deserialize)]
struct ChatMessageResponse {
    content: Option<String>,
}
