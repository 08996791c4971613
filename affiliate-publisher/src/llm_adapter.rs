use async_trait::async_trait;
use reqwest::Client;
use serde_json::{json, Value};
use std::sync::atomic::{AtomicU32, Ordering};
use std::time::Duration;
use tracing::debug;

/// The only provider the drafting step knows how to call.
pub const HUGGINGFACE_PROVIDER: &str = "huggingface_free";

#[derive(Debug, thiserror::Error)]
pub enum GenerationError {
    #[error("HTTP error: {0}")]
    Http(#[from] reqwest::Error),

    #[error("Provider returned an error: {0}")]
    Api(String),

    #[error("Unexpected response format: {0}")]
    UnexpectedFormat(String),
}

/// Trait for external text-generation collaborators
#[async_trait]
pub trait TextGenerator: Send + Sync {
    /// Get the name of this generator
    fn generator_name(&self) -> String;

    /// Generate text for `prompt` with `model`, authenticating with `credential`
    async fn generate(
        &self,
        model: &str,
        credential: &str,
        prompt: &str,
    ) -> Result<String, GenerationError>;
}

/// Hugging Face serverless inference API client
pub struct HuggingFaceGenerator {
    client: Client,
    endpoint: String,
    max_new_tokens: u32,
    temperature: f64,
}

impl HuggingFaceGenerator {
    pub fn new(endpoint: impl Into<String>, timeout_seconds: u64) -> Result<Self, GenerationError> {
        let client = Client::builder()
            .user_agent("affiliate-publisher/0.1")
            .timeout(Duration::from_secs(timeout_seconds))
            .gzip(true)
            .build()?;

        Ok(Self {
            client,
            endpoint: endpoint.into().trim_end_matches('/').to_string(),
            max_new_tokens: 1500,
            temperature: 0.7,
        })
    }

    pub fn with_max_new_tokens(mut self, max_new_tokens: u32) -> Self {
        self.max_new_tokens = max_new_tokens;
        self
    }

    pub fn with_temperature(mut self, temperature: f64) -> Self {
        self.temperature = temperature;
        self
    }

    fn model_url(&self, model: &str) -> String {
        format!("{}/{}", self.endpoint, model)
    }
}

#[async_trait]
impl TextGenerator for HuggingFaceGenerator {
    fn generator_name(&self) -> String {
        format!("Hugging Face ({})", self.endpoint)
    }

    async fn generate(
        &self,
        model: &str,
        credential: &str,
        prompt: &str,
    ) -> Result<String, GenerationError> {
        let url = self.model_url(model);
        debug!("Requesting generation from {}", url);

        let payload = json!({
            "inputs": prompt,
            "parameters": {
                "max_new_tokens": self.max_new_tokens,
                "temperature": self.temperature,
                "return_full_text": false,
            },
        });

        let response = self
            .client
            .post(&url)
            .bearer_auth(credential)
            .json(&payload)
            .send()
            .await?
            .error_for_status()?;

        let data: Value = response.json().await.map_err(|e| {
            if e.is_decode() {
                GenerationError::UnexpectedFormat(e.to_string())
            } else {
                GenerationError::Http(e)
            }
        })?;

        extract_generated_text(&data)
    }
}

/// Pull the generated text out of an inference API response body.
///
/// Accepts `[{"generated_text": ..}]`, `[{"summary_text": ..}]` and
/// `{"generated_text": ..}`; `{"error": ..}` becomes [`GenerationError::Api`].
pub fn extract_generated_text(data: &Value) -> Result<String, GenerationError> {
    if let Some(error) = data.get("error").filter(|e| is_truthy(e)) {
        let message = error.as_str().map(str::to_string).unwrap_or_else(|| error.to_string());
        return Err(GenerationError::Api(message));
    }

    if let Some(first) = data.as_array().and_then(|items| items.first()) {
        let generated = ["generated_text", "summary_text"]
            .iter()
            .filter_map(|key| first.get(*key).and_then(Value::as_str))
            .find(|text| !text.is_empty());
        if let Some(text) = generated {
            return Ok(text.trim().to_string());
        }
    }

    if let Some(text) = data.get("generated_text").filter(|v| is_truthy(v)) {
        let text = text.as_str().map(str::to_string).unwrap_or_else(|| text.to_string());
        return Ok(text.trim().to_string());
    }

    Err(GenerationError::UnexpectedFormat(
        "no generated_text in response".to_string(),
    ))
}

fn is_truthy(value: &Value) -> bool {
    match value {
        Value::Null => false,
        Value::Bool(flag) => *flag,
        Value::String(text) => !text.is_empty(),
        Value::Array(items) => !items.is_empty(),
        Value::Object(map) => !map.is_empty(),
        Value::Number(_) => true,
    }
}

/// Canned generator for development and testing
pub struct MockGenerator {
    name: String,
    response: Result<String, String>,
    call_count: AtomicU32,
}

impl MockGenerator {
    pub fn new(name: impl Into<String>) -> Self {
        Self {
            name: name.into(),
            response: Ok("Mock title\nMock body".to_string()),
            call_count: AtomicU32::new(0),
        }
    }

    /// Respond with `text` on every call.
    pub fn with_response(mut self, text: impl Into<String>) -> Self {
        self.response = Ok(text.into());
        self
    }

    /// Fail every call with a provider error carrying `message`.
    pub fn with_failure(mut self, message: impl Into<String>) -> Self {
        self.response = Err(message.into());
        self
    }

    pub fn call_count(&self) -> u32 {
        self.call_count.load(Ordering::SeqCst)
    }
}

#[async_trait]
impl TextGenerator for MockGenerator {
    fn generator_name(&self) -> String {
        format!("Mock Generator ({})", self.name)
    }

    async fn generate(
        &self,
        _model: &str,
        _credential: &str,
        _prompt: &str,
    ) -> Result<String, GenerationError> {
        self.call_count.fetch_add(1, Ordering::SeqCst);
        match &self.response {
            Ok(text) => Ok(text.clone()),
            Err(message) => Err(GenerationError::Api(message.clone())),
        }
    }
}
