//! LLM-backed reflection.

use std::sync::{Arc, LazyLock};
use std::time::Duration;

use async_trait::async_trait;
use regex::Regex;
use tracing::{debug, info};

use super::{Reflection, ReflectionProvider};
use crate::error::ReflectionError;
use crate::llm::{ChatMessage, CompletionRequest, LlmProvider};
use crate::readings::ReadingSet;

/// Substituted when the model's answer carries no question marker.
pub const DEFAULT_QUESTION: &str = "How is God speaking to you through today's Gospel?";

static QUESTION_MARKER: LazyLock<Regex> = LazyLock::new(|| {
    Regex::new(r"(?im)^\s*(?:\*\*)?(?:reflection\s+)?question(?:\*\*)?\s*:(?:\*\*)?").expect("static regex")
});

const SYSTEM_PROMPT: &str = "You write brief, warm Catholic reflections on the daily Gospel \
     for an email newsletter. Stay faithful to the text, avoid jargon, and do not invent \
     quotations.";

/// Sampling settings for the reflection call.
#[derive(Debug, Clone)]
pub struct GenerativeConfig {
    pub max_tokens: u32,
    pub temperature: f32,
    /// Upper bound on the model call.
    pub timeout: Duration,
}

impl Default for GenerativeConfig {
    fn default() -> Self {
        Self {
            max_tokens: 300,
            temperature: 0.7,
            timeout: Duration::from_secs(30),
        }
    }
}

/// Asks an LLM for a commentary and a reflection question.
pub struct GenerativeReflection {
    llm: Arc<dyn LlmProvider>,
    config: GenerativeConfig,
}

impl GenerativeReflection {
    pub fn new(llm: Arc<dyn LlmProvider>, config: GenerativeConfig) -> Self {
        Self { llm, config }
    }

    fn build_request(&self, readings: &ReadingSet) -> CompletionRequest {
        let user_prompt = format!(
            "Today is {date}. Here is today's Gospel:\n\n{gospel}\n\n\
             Write a 3-4 sentence reflection on this Gospel for ordinary readers. \
             Then, on a new line starting with \"Question:\", give one short reflection \
             question for the reader to carry through the day.",
            date = readings.date,
            gospel = readings.gospel,
        );

        CompletionRequest::new(vec![
            ChatMessage::system(SYSTEM_PROMPT),
            ChatMessage::user(user_prompt),
        ])
        .with_max_tokens(self.config.max_tokens)
        .with_temperature(self.config.temperature)
    }
}

#[async_trait]
impl ReflectionProvider for GenerativeReflection {
    fn name(&self) -> &str {
        "generative"
    }

    async fn reflect(&self, readings: &ReadingSet) -> Result<Reflection, ReflectionError> {
        let request = self.build_request(readings);
        debug!(model = self.llm.model_name(), date = %readings.date, "Requesting reflection");

        let response = tokio::time::timeout(self.config.timeout, self.llm.complete(request))
            .await
            .map_err(|_| ReflectionError::Timeout(self.config.timeout))??;

        let text = response.content.trim();
        if text.is_empty() {
            return Err(ReflectionError::EmptyResponse);
        }

        info!(
            finish_reason = ?response.finish_reason,
            input_tokens = response.input_tokens,
            output_tokens = response.output_tokens,
            "Reflection generated"
        );
        Ok(split_reflection(text))
    }
}

/// Split model output on the first line starting with a `Question:` label.
///
/// Without a marker the whole text is the commentary and [`DEFAULT_QUESTION`]
/// is used.
pub fn split_reflection(text: &str) -> Reflection {
    let text = text.trim();
    if let Some(m) = QUESTION_MARKER.find(text) {
        let commentary = text[..m.start()].trim();
        let question = text[m.end()..].trim();
        if !commentary.is_empty() && !question.is_empty() {
            return Reflection {
                commentary: commentary.to_string(),
                question: question.to_string(),
            };
        }
        if !question.is_empty() {
            return Reflection {
                commentary: question.to_string(),
                question: DEFAULT_QUESTION.to_string(),
            };
        }
        if !commentary.is_empty() {
            return Reflection {
                commentary: commentary.to_string(),
                question: DEFAULT_QUESTION.to_string(),
            };
        }
    }

    Reflection {
        commentary: text.to_string(),
        question: DEFAULT_QUESTION.to_string(),
    }
}
