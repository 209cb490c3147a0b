//! HTTP clients for an OpenAI-compatible embeddings and chat completions API.
//!
//! Both clients are plain `reqwest` clients with a per-request timeout.
//! Non-2xx responses become [`Error::Service`] carrying the HTTP status so
//! that [`RetryPolicy`](super::RetryPolicy) can tell rate limits and server
//! errors from permanent failures.

use std::time::Duration;

use async_trait::async_trait;
use reqwest::Client;
use serde::{Deserialize, Serialize};

use super::{Embedder, SamplingParams, TextGenerator};
use crate::config::ServiceConfig;
use crate::error::{Error, Result};

#[derive(Debug, Serialize)]
struct EmbeddingRequest<'a> {
    model: &'a str,
    input: &'a [String],
}

#[derive(Debug, Deserialize)]
struct EmbeddingResponse {
    data: Vec<EmbeddingData>,
}

#[derive(Debug, Deserialize)]
struct EmbeddingData {
    index: usize,
    embedding: Vec<f32>,
}

#[derive(Debug, Serialize)]
struct ChatRequest<'a> {
    model: &'a str,
    messages: Vec<Message<'a>>,
    temperature: f32,
    max_tokens: u32,
}

#[derive(Debug, Serialize)]
struct Message<'a> {
    role: &'a str,
    content: &'a str,
}

#[derive(Debug, Deserialize)]
struct ChatResponse {
    choices: Vec<Choice>,
}

#[derive(Debug, Deserialize)]
struct Choice {
    message: ResponseMessage,
}

#[derive(Debug, Deserialize)]
struct ResponseMessage {
    content: Option<String>,
}

/// Shared HTTP plumbing of both clients.
#[derive(Debug, Clone)]
struct ApiClient {
    client: Client,
    base_url: String,
    api_key: String,
}

impl ApiClient {
    fn new(base_url: &str, api_key: String, timeout: Duration) -> Result<Self> {
        let client = Client::builder().timeout(timeout).build()?;
        Ok(Self {
            client,
            base_url: base_url.trim_end_matches('/').to_string(),
            api_key,
        })
    }

    async fn post<Req, Resp>(&self, service: &'static str, path: &str, body: &Req) -> Result<Resp>
    where
        Req: Serialize + ?Sized,
        Resp: serde::de::DeserializeOwned,
    {
        let response = self
            .client
            .post(format!("{}/{}", self.base_url, path))
            .bearer_auth(&self.api_key)
            .json(body)
            .send()
            .await?;

        let status = response.status();
        if !status.is_success() {
            let message = response.text().await.unwrap_or_default();
            return Err(Error::Service {
                service,
                status: Some(status.as_u16()),
                message,
            });
        }

        Ok(response.json().await?)
    }
}

fn api_key_from_env(config: &ServiceConfig) -> Result<String> {
    std::env::var(&config.api_key_env).map_err(|_| {
        Error::Config(format!("environment variable {} is not set", config.api_key_env))
    })
}

/// Embedding client (`POST {base_url}/embeddings`).
#[derive(Debug, Clone)]
pub struct OpenAiEmbedder {
    api: ApiClient,
    model: String,
}

impl OpenAiEmbedder {
    /// Create an embedding client.
    pub fn new(
        base_url: &str,
        api_key: impl Into<String>,
        model: impl Into<String>,
        timeout: Duration,
    ) -> Result<Self> {
        Ok(Self {
            api: ApiClient::new(base_url, api_key.into(), timeout)?,
            model: model.into(),
        })
    }

    /// Create an embedding client from the service settings, reading the API
    /// key from the configured environment variable.
    pub fn from_config(config: &ServiceConfig) -> Result<Self> {
        Self::new(
            &config.base_url,
            api_key_from_env(config)?,
            config.embedding_model.clone(),
            config.timeout(),
        )
    }
}

#[async_trait]
impl Embedder for OpenAiEmbedder {
    async fn embed(&self, inputs: &[String]) -> Result<Vec<Vec<f32>>> {
        if inputs.is_empty() {
            return Ok(Vec::new());
        }

        let request = EmbeddingRequest {
            model: &self.model,
            input: inputs,
        };
        let response: EmbeddingResponse = self.api.post("embedding", "embeddings", &request).await?;
        order_embeddings(response.data, inputs.len())
    }
}

/// Put embeddings back in input order and check that each input got one.
fn order_embeddings(mut data: Vec<EmbeddingData>, expected: usize) -> Result<Vec<Vec<f32>>> {
    if data.len() != expected {
        return Err(Error::Embedding(format!(
            "expected {} embeddings, got {}",
            expected,
            data.len()
        )));
    }
    data.sort_by_key(|d| d.index);
    if data.iter().enumerate().any(|(i, d)| d.index != i) {
        return Err(Error::Embedding("embedding indices are not 0..n".to_string()));
    }
    Ok(data.into_iter().map(|d| d.embedding).collect())
}

/// Chat completions client (`POST {base_url}/chat/completions`).
#[derive(Debug, Clone)]
pub struct OpenAiChatGenerator {
    api: ApiClient,
    model: String,
}

impl OpenAiChatGenerator {
    /// Create a generation client.
    pub fn new(
        base_url: &str,
        api_key: impl Into<String>,
        model: impl Into<String>,
        timeout: Duration,
    ) -> Result<Self> {
        Ok(Self {
            api: ApiClient::new(base_url, api_key.into(), timeout)?,
            model: model.into(),
        })
    }

    /// Create a generation client from the service settings, reading the API
    /// key from the configured environment variable.
    pub fn from_config(config: &ServiceConfig) -> Result<Self> {
        Self::new(
            &config.base_url,
            api_key_from_env(config)?,
            config.generation_model.clone(),
            config.timeout(),
        )
    }
}

#[async_trait]
impl TextGenerator for OpenAiChatGenerator {
    async fn generate(&self, prompt: &str, params: &SamplingParams) -> Result<String> {
        let request = ChatRequest {
            model: &self.model,
            messages: vec![Message {
                role: "user",
                content: prompt,
            }],
            temperature: params.temperature,
            max_tokens: params.max_tokens,
        };

        let response: ChatResponse = self
            .api
            .post("generation", "chat/completions", &request)
            .await?;

        response
            .choices
            .into_iter()
            .next()
            .and_then(|c| c.message.content)
            .ok_or_else(|| Error::service("generation", "response has no message content"))
    }
}
