//! Response generation: hosted chat-completion providers with an offline fallback.
//!
//! `ResponseGenerator::generate` never fails. Provider errors, timeouts and
//! empty completions are logged and answered by the deterministic offline
//! fallback instead.

use std::collections::BTreeSet;
use std::time::Duration;

use async_trait::async_trait;
use serde_json::json;
use tracing::{debug, info, warn};

use helpdesk_core::config::LlmConfig;
use helpdesk_core::types::ContextChunk;

/// Characters of the top chunk quoted by the offline fallback.
const FALLBACK_PREVIEW_CHARS: usize = 200;

/// Errors from a text-generation provider.
#[derive(Debug, thiserror::Error)]
pub enum GenerationError {
    #[error("HTTP request failed: {0}")]
    HttpError(#[from] reqwest::Error),
    #[error("API error {status}: {body}")]
    ApiError { status: u16, body: String },
    #[error("failed to parse response: {0}")]
    ParseError(String),
    #[error("request timed out after {0}s")]
    Timeout(u64),
    #[error("provider not configured: {0}")]
    NotConfigured(String),
}

/// A hosted or local model that turns a prompt into text.
#[async_trait]
pub trait TextGenerator: Send + Sync {
    /// Short provider name for logs.
    fn name(&self) -> &str;

    async fn complete(&self, prompt: &str) -> Result<String, GenerationError>;
}

/// Client for any OpenAI-compatible `/v1/chat/completions` endpoint.
///
/// The whole prompt travels as a single system message.
pub struct OpenAiCompatibleProvider {
    client: reqwest::Client,
    name: String,
    api_key: String,
    model: String,
    base_url: String,
    temperature: f32,
    max_tokens: u32,
    timeout_secs: u64,
}

impl OpenAiCompatibleProvider {
    pub fn new(
        name: impl Into<String>,
        api_key: impl Into<String>,
        model: impl Into<String>,
        base_url: impl Into<String>,
        cfg: &LlmConfig,
    ) -> Result<Self, GenerationError> {
        let api_key = api_key.into();
        let name = name.into();
        if api_key.trim().is_empty() {
            return Err(GenerationError::NotConfigured(format!(
                "{} API key is not set",
                name
            )));
        }
        let client = reqwest::Client::builder()
            .timeout(Duration::from_secs(cfg.timeout_secs.max(1)))
            .build()?;
        Ok(Self {
            client,
            name,
            api_key,
            model: model.into(),
            base_url: base_url.into().trim_end_matches('/').to_string(),
            temperature: cfg.temperature,
            max_tokens: cfg.max_tokens,
            timeout_secs: cfg.timeout_secs.max(1),
        })
    }

    pub fn model(&self) -> &str {
        &self.model
    }
}

#[async_trait]
impl TextGenerator for OpenAiCompatibleProvider {
    fn name(&self) -> &str {
        &self.name
    }

    async fn complete(&self, prompt: &str) -> Result<String, GenerationError> {
        let url = format!("{}/v1/chat/completions", self.base_url);
        let body = json!({
            "model": self.model,
            "messages": [{ "role": "system", "content": prompt }],
            "temperature": self.temperature,
            "max_tokens": self.max_tokens,
        });

        debug!(provider = %self.name, "Chat completion request to {}", url);

        let response = self
            .client
            .post(&url)
            .header("Authorization", format!("Bearer {}", self.api_key))
            .json(&body)
            .send()
            .await
            .map_err(|e| self.classify(e))?;

        let status = response.status().as_u16();
        if status != 200 {
            let body = response.text().await.unwrap_or_default();
            return Err(GenerationError::ApiError { status, body });
        }

        let resp: serde_json::Value = response.json().await.map_err(|e| self.classify(e))?;
        let content = resp["choices"][0]["message"]["content"]
            .as_str()
            .ok_or_else(|| {
                GenerationError::ParseError("missing choices[0].message.content".into())
            })?
            .trim()
            .to_string();

        Ok(content)
    }
}

impl OpenAiCompatibleProvider {
    fn classify(&self, err: reqwest::Error) -> GenerationError {
        if err.is_timeout() {
            GenerationError::Timeout(self.timeout_secs)
        } else {
            GenerationError::HttpError(err)
        }
    }
}

/// Where a generated answer came from.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum GenerationSource {
    Provider(String),
    Fallback,
}

/// A generated answer plus its origin.
#[derive(Debug, Clone)]
pub struct Generated {
    pub text: String,
    pub source: GenerationSource,
}

/// Produces the answer text for the grounded-answer route.
pub struct ResponseGenerator {
    provider: Option<Box<dyn TextGenerator>>,
}

impl ResponseGenerator {
    /// A generator that always answers with the offline fallback.
    pub fn offline() -> Self {
        Self { provider: None }
    }

    pub fn with_provider(provider: Box<dyn TextGenerator>) -> Self {
        Self {
            provider: Some(provider),
        }
    }

    /// Pick the configured provider, falling back to offline mode when its
    /// key is missing or the provider name is unknown.
    pub fn from_config(cfg: &LlmConfig) -> Self {
        let built = match cfg.provider.as_str() {
            "openai" => Some(OpenAiCompatibleProvider::new(
                "openai",
                cfg.openai_api_key.clone(),
                cfg.openai_model.clone(),
                cfg.openai_base_url.clone(),
                cfg,
            )),
            "groq" => Some(OpenAiCompatibleProvider::new(
                "groq",
                cfg.groq_api_key.clone(),
                cfg.groq_model.clone(),
                cfg.groq_base_url.clone(),
                cfg,
            )),
            "stub" | "offline" | "" => None,
            other => {
                warn!(provider = %other, "Unknown LLM provider, using offline answers");
                None
            }
        };

        match built {
            Some(Ok(provider)) => {
                info!(provider = %provider.name(), model = %provider.model(), "LLM provider enabled");
                Self::with_provider(Box::new(provider))
            }
            Some(Err(e)) => {
                warn!(error = %e, "LLM provider unavailable, using offline answers");
                Self::offline()
            }
            None => {
                info!("Using offline answers");
                Self::offline()
            }
        }
    }

    /// Name of the active provider, or `None` in offline mode.
    pub fn provider_name(&self) -> Option<&str> {
        self.provider.as_deref().map(|p| p.name())
    }

    /// Answer a prompt. Never fails.
    pub async fn generate(&self, prompt: &str, chunks: &[ContextChunk]) -> Generated {
        if let Some(provider) = &self.provider {
            match provider.complete(prompt).await {
                Ok(text) if !text.trim().is_empty() => {
                    return Generated {
                        text,
                        source: GenerationSource::Provider(provider.name().to_string()),
                    };
                }
                Ok(_) => warn!(provider = %provider.name(), "Empty completion, using fallback"),
                Err(e) => {
                    warn!(provider = %provider.name(), error = %e, "Generation failed, using fallback")
                }
            }
        }

        Generated {
            text: fallback_answer(chunks),
            source: GenerationSource::Fallback,
        }
    }
}

impl std::fmt::Debug for ResponseGenerator {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("ResponseGenerator")
            .field("provider", &self.provider_name())
            .finish()
    }
}

/// Deterministic answer used when no provider is available.
///
/// With context it names the distinct source documents (sorted) and quotes
/// the start of the best chunk. Without context it asks whether to open a
/// ticket.
pub fn fallback_answer(chunks: &[ContextChunk]) -> String {
    let Some(top) = chunks.first() else {
        return "(Offline) I don't have enough context. Would you like me to create a support ticket?"
            .to_string();
    };

    let sources: BTreeSet<&str> = chunks.iter().map(|c| c.source_document.as_str()).collect();
    let sources: Vec<&str> = sources.into_iter().collect();
    let preview: String = top.content.chars().take(FALLBACK_PREVIEW_CHARS).collect();

    format!(
        "(Offline) I found relevant info in: {}. Based on that context, here's a brief answer: {}",
        sources.join(", "),
        preview
    )
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::sync::atomic::{AtomicUsize, Ordering};

    fn chunk(doc: &str, content: &str) -> ContextChunk {
        ContextChunk {
            source_document: doc.to_string(),
            chunk_index: 0,
            content: content.to_string(),
            relevance_score: 0.9,
        }
    }

    struct FixedProvider(&'static str);

    #[async_trait]
    impl TextGenerator for FixedProvider {
        fn name(&self) -> &str {
            "fixed"
        }
        async fn complete(&self, _prompt: &str) -> Result<String, GenerationError> {
            Ok(self.0.to_string())
        }
    }

    struct FailingProvider {
        calls: AtomicUsize,
    }

    #[async_trait]
    impl TextGenerator for FailingProvider {
        fn name(&self) -> &str {
            "failing"
        }
        async fn complete(&self, _prompt: &str) -> Result<String, GenerationError> {
            self.calls.fetch_add(1, Ordering::SeqCst);
            Err(GenerationError::ApiError {
                status: 503,
                body: "overloaded".to_string(),
            })
        }
    }

    #[test]
    fn test_fallback_without_context() {
        let text = fallback_answer(&[]);
        assert!(text.contains("don't have enough context"));
        assert!(text.contains("support ticket"));
    }

    #[test]
    fn test_fallback_lists_sorted_distinct_sources() {
        let chunks = vec![
            chunk("shipping.md", "Orders ship in 2 days."),
            chunk("billing.md", "Refunds take 5 days."),
            chunk("shipping.md", "Tracking is emailed."),
        ];
        let text = fallback_answer(&chunks);
        assert!(text.contains("billing.md, shipping.md."));
        assert!(text.ends_with("Orders ship in 2 days."));
    }

    #[test]
    fn test_fallback_preview_is_truncated() {
        let long = "é".repeat(500);
        let text = fallback_answer(&[chunk("a.md", &long)]);
        let preview = text.rsplit(": ").next().unwrap();
        assert_eq!(preview.chars().count(), FALLBACK_PREVIEW_CHARS);
    }

    #[tokio::test]
    async fn test_offline_generator_uses_fallback() {
        let generator = ResponseGenerator::offline();
        assert!(generator.provider_name().is_none());
        let out = generator.generate("prompt", &[chunk("a.md", "text")]).await;
        assert_eq!(out.source, GenerationSource::Fallback);
        assert!(out.text.contains("a.md"));
    }

    #[tokio::test]
    async fn test_provider_answer_is_used() {
        let generator = ResponseGenerator::with_provider(Box::new(FixedProvider("Use settings.")));
        let out = generator.generate("prompt", &[]).await;
        assert_eq!(out.text, "Use settings.");
        assert_eq!(out.source, GenerationSource::Provider("fixed".to_string()));
    }

    #[tokio::test]
    async fn test_provider_failure_falls_back() {
        let generator = ResponseGenerator::with_provider(Box::new(FailingProvider {
            calls: AtomicUsize::new(0),
        }));
        let out = generator.generate("prompt", &[chunk("faq.md", "Reset")]).await;
        assert_eq!(out.source, GenerationSource::Fallback);
        assert!(out.text.contains("faq.md"));
    }

    #[tokio::test]
    async fn test_empty_completion_falls_back() {
        let generator = ResponseGenerator::with_provider(Box::new(FixedProvider("   ")));
        let out = generator.generate("prompt", &[]).await;
        assert_eq!(out.source, GenerationSource::Fallback);
    }

    #[tokio::test]
    async fn test_unreachable_endpoint_falls_back() {
        let cfg = LlmConfig {
            provider: "openai".to_string(),
            openai_api_key: "sk-test".to_string(),
            openai_base_url: "http://127.0.0.1:1".to_string(),
            timeout_secs: 2,
            ..Default::default()
        };
        let generator = ResponseGenerator::from_config(&cfg);
        assert_eq!(generator.provider_name(), Some("openai"));

        let out = generator.generate("prompt", &[]).await;
        assert_eq!(out.source, GenerationSource::Fallback);
    }

    #[test]
    fn test_from_config_selection() {
        assert!(ResponseGenerator::from_config(&LlmConfig::default())
            .provider_name()
            .is_none());

        let missing_key = LlmConfig {
            provider: "groq".to_string(),
            ..Default::default()
        };
        assert!(ResponseGenerator::from_config(&missing_key)
            .provider_name()
            .is_none());

        let groq = LlmConfig {
            provider: "groq".to_string(),
            groq_api_key: "gsk-test".to_string(),
            ..Default::default()
        };
        assert_eq!(
            ResponseGenerator::from_config(&groq).provider_name(),
            Some("groq")
        );

        let unknown = LlmConfig {
            provider: "mystery".to_string(),
            openai_api_key: "sk-test".to_string(),
            ..Default::default()
        };
        assert!(ResponseGenerator::from_config(&unknown)
            .provider_name()
            .is_none());
    }

    #[test]
    fn test_provider_requires_key() {
        let cfg = LlmConfig::default();
        let err = OpenAiCompatibleProvider::new("openai", "", "m", "http://x", &cfg)
            .err()
            .unwrap();
        assert!(matches!(err, GenerationError::NotConfigured(_)));
    }
}
