//! Reflection providers: a short commentary and question on the day's gospel.
//!
//! Two variants sit behind [`ReflectionProvider`]:
//! - [`FallbackReflection`]: a fixed pair, no I/O, cannot fail
//! - [`GenerativeReflection`]: asks an LLM, splits the answer into parts
//!
//! The variant is chosen once at startup (see [`from_llm`]); the pipeline only
//! sees the trait.

mod generative;

pub use generative::{DEFAULT_QUESTION, GenerativeConfig, GenerativeReflection, split_reflection};

use std::sync::Arc;

use async_trait::async_trait;
use serde::{Deserialize, Serialize};

use crate::error::ReflectionError;
use crate::llm::LlmProvider;
use crate::readings::ReadingSet;

pub const FALLBACK_COMMENTARY: &str = "Take a quiet moment today to sit with the Gospel. \
     Read it slowly, notice the word or phrase that stays with you, and carry it with you \
     through the day.";
pub const FALLBACK_QUESTION: &str =
    "What word or phrase from today's Gospel is calling for your attention?";

/// Commentary plus a question, always both populated.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Reflection {
    pub commentary: String,
    pub question: String,
}

/// Produces the reflection for a reading set.
#[async_trait]
pub trait ReflectionProvider: Send + Sync {
    /// Short label for logging.
    fn name(&self) -> &str;

    async fn reflect(&self, readings: &ReadingSet) -> Result<Reflection, ReflectionError>;
}

/// Fixed reflection used when no generative capability is configured.
#[derive(Debug, Clone, Copy, Default)]
pub struct FallbackReflection;

impl FallbackReflection {
    pub fn reflection() -> Reflection {
        Reflection {
            commentary: FALLBACK_COMMENTARY.to_string(),
            question: FALLBACK_QUESTION.to_string(),
        }
    }
}

#[async_trait]
impl ReflectionProvider for FallbackReflection {
    fn name(&self) -> &str {
        "fallback"
    }

    async fn reflect(&self, _readings: &ReadingSet) -> Result<Reflection, ReflectionError> {
        Ok(Self::reflection())
    }
}

/// Select the reflection variant: generative when an LLM is available.
pub fn from_llm(llm: Option<Arc<dyn LlmProvider>>) -> Arc<dyn ReflectionProvider> {
    match llm {
        Some(llm) => {
            tracing::info!(model = llm.model_name(), "Reflections: generative");
            Arc::new(GenerativeReflection::new(llm, GenerativeConfig::default()))
        }
        None => {
            tracing::info!("Reflections: fixed fallback (no LLM configured)");
            Arc::new(FallbackReflection)
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn readings(gospel: &str) -> ReadingSet {
        ReadingSet {
            date: "2026-10-15".to_string(),
            source_url: "https://example.org/101526.cfm".to_string(),
            feast_name: "Feast".to_string(),
            liturgical_color: "White".to_string(),
            first_reading: "R".to_string(),
            psalm: "P".to_string(),
            gospel: gospel.to_string(),
        }
    }

    #[tokio::test]
    async fn fallback_is_fixed_regardless_of_input() {
        let provider = FallbackReflection;
        let a = provider.reflect(&readings("one gospel")).await.unwrap();
        let b = provider.reflect(&readings("another gospel")).await.unwrap();
        assert_eq!(a, b);
        assert_eq!(a.commentary, FALLBACK_COMMENTARY);
        assert_eq!(a.question, FALLBACK_QUESTION);
    }

    #[test]
    fn from_llm_none_selects_fallback() {
        assert_eq!(from_llm(None).name(), "fallback");
    }
}
