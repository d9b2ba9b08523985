//! Text generator abstraction.
//!
//! Supports multiple generator backends:
//! - Local: Ollama (default)
//! - Remote: OpenAI (feature-flagged)

use async_trait::async_trait;
use serde::{Deserialize, Serialize};
use tracing::{debug, warn};

use super::GeneratorError;

/// Generator backend configuration.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(tag = "backend")]
pub enum GeneratorConfig {
    /// Local Ollama instance
    #[serde(rename = "ollama")]
    Ollama {
        base_url: String,
        model: String,
        #[serde(default = "default_timeout")]
        timeout_seconds: u64,
    },

    /// OpenAI API (requires feature flag)
    #[cfg(feature = "remote-ai")]
    #[serde(rename = "openai")]
    OpenAi {
        api_key_env: String,
        model: String,
        #[serde(default = "default_timeout")]
        timeout_seconds: u64,
    },
}

fn default_timeout() -> u64 {
    120
}

impl Default for GeneratorConfig {
    fn default() -> Self {
        GeneratorConfig::Ollama {
            base_url: "http://localhost:11434".to_string(),
            model: "llama3.2".to_string(),
            timeout_seconds: 120,
        }
    }
}

/// Trait for text generators.
#[async_trait]
pub trait TextGenerator: Send + Sync {
    /// Generator name for logging.
    fn name(&self) -> &'static str;

    /// Produce analysis prose for one prompt.
    async fn generate(&self, prompt: &str) -> Result<String, GeneratorError>;

    /// Check if the generator is reachable.
    async fn health_check(&self) -> Result<bool, GeneratorError>;
}

/// Ollama generator implementation.
pub struct OllamaGenerator {
    client: reqwest::Client,
    base_url: String,
    model: String,
}

impl OllamaGenerator {
    pub fn new(base_url: String, model: String, timeout_seconds: u64) -> Self {
        let client = reqwest::Client::builder()
            .timeout(std::time::Duration::from_secs(timeout_seconds))
            .build()
            .expect("Failed to build HTTP client");

        Self {
            client,
            base_url,
            model,
        }
    }
}

/// Ollama API request format.
#[derive(Debug, Serialize)]
struct OllamaRequest {
    model: String,
    prompt: String,
    stream: bool,
}

/// Ollama API response format.
#[derive(Debug, Deserialize)]
struct OllamaResponse {
    response: String,
}

#[async_trait]
impl TextGenerator for OllamaGenerator {
    fn name(&self) -> &'static str {
        "ollama"
    }

    async fn generate(&self, prompt: &str) -> Result<String, GeneratorError> {
        let url = format!("{}/api/generate", self.base_url);

        let request = OllamaRequest {
            model: self.model.clone(),
            prompt: prompt.to_string(),
            stream: false,
        };

        debug!("Sending request to Ollama: {}", url);

        let response = self
            .client
            .post(&url)
            .json(&request)
            .send()
            .await
            .map_err(|e| GeneratorError::BackendUnavailable(e.to_string()))?;

        if !response.status().is_success() {
            let status = response.status();
            let body = response.text().await.unwrap_or_default();
            return Err(GeneratorError::BackendUnavailable(format!(
                "Ollama returned {}: {}",
                status, body
            )));
        }

        let parsed: OllamaResponse = response
            .json()
            .await
            .map_err(|e| GeneratorError::ResponseParse(e.to_string()))?;

        Ok(parsed.response)
    }

    async fn health_check(&self) -> Result<bool, GeneratorError> {
        let url = format!("{}/api/tags", self.base_url);

        match self.client.get(&url).send().await {
            Ok(response) => Ok(response.status().is_success()),
            Err(e) => {
                warn!("Ollama health check failed: {}", e);
                Ok(false)
            }
        }
    }
}

// --- OpenAI generator ---

#[cfg(feature = "remote-ai")]
#[derive(Debug, Serialize)]
struct OpenAiRequest {
    model: String,
    messages: Vec<OpenAiMessage>,
    #[serde(skip_serializing_if = "Option::is_none")]
    temperature: Option<f32>,
}

#[cfg(feature = "remote-ai")]
#[derive(Debug, Serialize, Deserialize)]
struct OpenAiMessage {
    role: String,
    content: String,
}

#[cfg(feature = "remote-ai")]
#[derive(Debug, Deserialize)]
struct OpenAiResponse {
    choices: Vec<OpenAiChoice>,
}

#[cfg(feature = "remote-ai")]
#[derive(Debug, Deserialize)]
struct OpenAiChoice {
    message: OpenAiChoiceMessage,
}

#[cfg(feature = "remote-ai")]
#[derive(Debug, Deserialize)]
struct OpenAiChoiceMessage {
    content: String,
}

/// OpenAI API generator implementation.
#[cfg(feature = "remote-ai")]
pub struct OpenAiGenerator {
    client: reqwest::Client,
    model: String,
    api_key: String,
}

#[cfg(feature = "remote-ai")]
impl OpenAiGenerator {
    pub fn new(api_key: String, model: String, timeout_seconds: u64) -> Self {
        let client = reqwest::Client::builder()
            .timeout(std::time::Duration::from_secs(timeout_seconds))
            .build()
            .expect("Failed to build HTTP client");

        Self {
            client,
            model,
            api_key,
        }
    }
}

#[cfg(feature = "remote-ai")]
#[async_trait]
impl TextGenerator for OpenAiGenerator {
    fn name(&self) -> &'static str {
        "openai"
    }

    async fn generate(&self, prompt: &str) -> Result<String, GeneratorError> {
        let url = "https://api.openai.com/v1/chat/completions";

        let request = OpenAiRequest {
            model: self.model.clone(),
            messages: vec![OpenAiMessage {
                role: "user".to_string(),
                content: prompt.to_string(),
            }],
            temperature: Some(0.7),
        };

        debug!("Sending request to OpenAI API");

        let response = self
            .client
            .post(url)
            .bearer_auth(&self.api_key)
            .json(&request)
            .send()
            .await
            .map_err(|e| GeneratorError::BackendUnavailable(e.to_string()))?;

        if !response.status().is_success() {
            let status = response.status();
            let body = response.text().await.unwrap_or_default();
            return Err(GeneratorError::BackendUnavailable(format!(
                "OpenAI API returned {}: {}",
                status, body
            )));
        }

        let parsed: OpenAiResponse = response
            .json()
            .await
            .map_err(|e| GeneratorError::ResponseParse(e.to_string()))?;

        parsed
            .choices
            .into_iter()
            .next()
            .map(|choice| choice.message.content)
            .ok_or_else(|| GeneratorError::ResponseParse("empty choices array".to_string()))
    }

    async fn health_check(&self) -> Result<bool, GeneratorError> {
        // No health endpoint; assume available if a key is configured
        Ok(!self.api_key.is_empty())
    }
}

/// Create a text generator from configuration.
pub fn create_generator(config: &GeneratorConfig) -> Box<dyn TextGenerator> {
    match config {
        GeneratorConfig::Ollama {
            base_url,
            model,
            timeout_seconds,
        } => Box::new(OllamaGenerator::new(
            base_url.clone(),
            model.clone(),
            *timeout_seconds,
        )),
        #[cfg(feature = "remote-ai")]
        GeneratorConfig::OpenAi {
            api_key_env,
            model,
            timeout_seconds,
        } => {
            let api_key = std::env::var(api_key_env).unwrap_or_else(|_| {
                panic!("Environment variable {} not set", api_key_env);
            });
            Box::new(OpenAiGenerator::new(
                api_key,
                model.clone(),
                *timeout_seconds,
            ))
        }
    }
}

/// Mock generator for testing.
#[cfg(test)]
pub struct MockGenerator {
    response: String,
    calls: std::sync::atomic::AtomicU32,
}

#[cfg(test)]
impl MockGenerator {
    pub fn new(response: impl Into<String>) -> Self {
        Self {
            response: response.into(),
            calls: std::sync::atomic::AtomicU32::new(0),
        }
    }

    pub fn calls(&self) -> u32 {
        self.calls.load(std::sync::atomic::Ordering::Relaxed)
    }
}

#[cfg(test)]
#[async_trait]
impl TextGenerator for MockGenerator {
    fn name(&self) -> &'static str {
        "mock"
    }

    async fn generate(&self, _prompt: &str) -> Result<String, GeneratorError> {
        self.calls
            .fetch_add(1, std::sync::atomic::Ordering::Relaxed);
        Ok(self.response.clone())
    }

    async fn health_check(&self) -> Result<bool, GeneratorError> {
        Ok(true)
    }
}
