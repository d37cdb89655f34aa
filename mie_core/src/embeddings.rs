//! Pluggable embedding pipeline.
//!
//! A provider turns text into a fixed-dimension vector. Three providers are
//! supported: a local HTTP provider (Ollama-compatible), a cloud HTTP
//! provider (OpenAI-compatible, API-key authenticated, batch of one), and a
//! deterministic mock used in tests. The [`EmbeddingGenerator`] bounds
//! concurrent provider calls with a semaphore sized to the configured worker
//! count.

use async_trait::async_trait;
use reqwest::header::{AUTHORIZATION, CONTENT_TYPE};
use reqwest::Client;
use serde::{Deserialize, Serialize};
use tokio::sync::Semaphore;

use crate::error::{MemoryError, Result};

/// A single-operation embedding provider.
#[async_trait]
pub trait EmbeddingProvider: Send + Sync + std::fmt::Debug {
    /// Produce a vector for the given text, or fail with a provider error.
    async fn embed(&self, text: &str) -> Result<Vec<f32>>;

    /// Provider name for diagnostics.
    fn name(&self) -> &'static str;
}

/// Build a provider from its configured name. Legacy provider names are
/// accepted as aliases (`ollama` for local, `openai`/`nomic` for cloud).
pub fn create_provider(
    provider: &str,
    base_url: &str,
    model: &str,
    api_key: &str,
    dimensions: usize,
) -> Result<Box<dyn EmbeddingProvider>> {
    match provider {
        "local" | "ollama" => Ok(Box::new(LocalProvider::new(base_url, model))),
        "cloud" | "openai" | "nomic" => {
            if api_key.is_empty() {
                return Err(MemoryError::invalid_argument(
                    "cloud embedding provider requires an API key",
                ));
            }
            Ok(Box::new(CloudProvider::new(base_url, model, api_key)))
        }
        "mock" => Ok(Box::new(MockProvider::new(dimensions))),
        other => Err(MemoryError::invalid_argument(format!(
            "unknown embedding provider {other:?} (supported: local, cloud, mock)"
        ))),
    }
}

// --- Local (Ollama-compatible) provider ---

const DEFAULT_LOCAL_BASE_URL: &str = "http://localhost:11434";

#[derive(Debug, Serialize)]
struct LocalEmbedRequest<'a> {
    model: &'a str,
    prompt: &'a str,
}

#[derive(Debug, Deserialize)]
struct LocalEmbedResponse {
    embedding: Vec<f32>,
}

/// Local HTTP provider speaking the Ollama embeddings API: a single prompt
/// in, a single vector out.
#[derive(Debug)]
pub struct LocalProvider {
    base_url: String,
    model: String,
    client: Client,
}

impl LocalProvider {
    pub fn new(base_url: &str, model: &str) -> Self {
        let base_url = if base_url.is_empty() {
            DEFAULT_LOCAL_BASE_URL.to_string()
        } else {
            base_url.trim_end_matches('/').to_string()
        };
        Self {
            base_url,
            model: model.to_string(),
            client: Client::new(),
        }
    }
}

#[async_trait]
impl EmbeddingProvider for LocalProvider {
    async fn embed(&self, text: &str) -> Result<Vec<f32>> {
        let url = format!("{}/api/embeddings", self.base_url);
        let request = LocalEmbedRequest {
            model: &self.model,
            prompt: text,
        };

        let response = self
            .client
            .post(&url)
            .header(CONTENT_TYPE, "application/json")
            .json(&request)
            .send()
            .await
            .map_err(|e| MemoryError::provider(format!("local request failed: {e}")))?;

        if !response.status().is_success() {
            let status = response.status();
            let body = response.text().await.unwrap_or_default();
            return Err(MemoryError::provider(format!(
                "local provider error ({status}): {body}"
            )));
        }

        let parsed: LocalEmbedResponse = response
            .json()
            .await
            .map_err(|e| MemoryError::provider(format!("cannot parse local response: {e}")))?;
        Ok(parsed.embedding)
    }

    fn name(&self) -> &'static str {
        "local"
    }
}

// --- Cloud (OpenAI-compatible) provider ---

const DEFAULT_CLOUD_BASE_URL: &str = "https://api.openai.com";

#[derive(Debug, Serialize)]
struct CloudEmbedRequest<'a> {
    model: &'a str,
    input: [&'a str; 1],
}

#[derive(Debug, Deserialize)]
struct CloudEmbedResponse {
    data: Vec<CloudEmbedRow>,
}

#[derive(Debug, Deserialize)]
struct CloudEmbedRow {
    embedding: Vec<f32>,
}

/// Cloud HTTP provider speaking the OpenAI embeddings API with a batch of one.
#[derive(Debug)]
pub struct CloudProvider {
    base_url: String,
    model: String,
    api_key: String,
    client: Client,
}

impl CloudProvider {
    pub fn new(base_url: &str, model: &str, api_key: &str) -> Self {
        let base_url = if base_url.is_empty() {
            DEFAULT_CLOUD_BASE_URL.to_string()
        } else {
            base_url.trim_end_matches('/').to_string()
        };
        Self {
            base_url,
            model: model.to_string(),
            api_key: api_key.to_string(),
            client: Client::new(),
        }
    }
}

#[async_trait]
impl EmbeddingProvider for CloudProvider {
    async fn embed(&self, text: &str) -> Result<Vec<f32>> {
        let url = format!("{}/v1/embeddings", self.base_url);
        let request = CloudEmbedRequest {
            model: &self.model,
            input: [text],
        };

        let response = self
            .client
            .post(&url)
            .header(AUTHORIZATION, format!("Bearer {}", self.api_key))
            .header(CONTENT_TYPE, "application/json")
            .json(&request)
            .send()
            .await
            .map_err(|e| MemoryError::provider(format!("cloud request failed: {e}")))?;

        if !response.status().is_success() {
            let status = response.status();
            let body = response.text().await.unwrap_or_default();
            return Err(MemoryError::provider(format!(
                "cloud provider error ({status}): {body}"
            )));
        }

        let parsed: CloudEmbedResponse = response
            .json()
            .await
            .map_err(|e| MemoryError::provider(format!("cannot parse cloud response: {e}")))?;
        parsed
            .data
            .into_iter()
            .next()
            .map(|row| row.embedding)
            .ok_or_else(|| MemoryError::provider("cloud response contained no embedding"))
    }

    fn name(&self) -> &'static str {
        "cloud"
    }
}

// --- Deterministic mock provider ---

/// Deterministic embedder for tests and offline use.
///
/// Hashes overlapping character trigrams of the lowercased text into a
/// signed bag-of-features vector, then L2-normalizes. Identical text yields
/// identical vectors; texts sharing most of their characters land close in
/// cosine space.
#[derive(Debug)]
pub struct MockProvider {
    dimensions: usize,
}

impl MockProvider {
    pub fn new(dimensions: usize) -> Self {
        Self { dimensions }
    }
}

#[async_trait]
impl EmbeddingProvider for MockProvider {
    async fn embed(&self, text: &str) -> Result<Vec<f32>> {
        Ok(mock_embedding(text, self.dimensions))
    }

    fn name(&self) -> &'static str {
        "mock"
    }
}

fn fnv1a(data: &[u8]) -> u64 {
    let mut hash: u64 = 0xcbf2_9ce4_8422_2325;
    for &b in data {
        hash ^= b as u64;
        hash = hash.wrapping_mul(0x0000_0100_0000_01b3);
    }
    hash
}

/// The mock projection: trigram hashing with sign, L2-normalized.
pub fn mock_embedding(text: &str, dimensions: usize) -> Vec<f32> {
    let mut v = vec![0.0f32; dimensions.max(1)];
    let lower = text.to_lowercase();
    let bytes = lower.as_bytes();

    if bytes.len() < 3 {
        let h = fnv1a(bytes);
        let idx = (h as usize) % v.len();
        v[idx] = 1.0;
        return v;
    }

    for gram in bytes.windows(3) {
        let h = fnv1a(gram);
        let idx = (h as usize) % v.len();
        let sign = if h & (1 << 63) == 0 { 1.0 } else { -1.0 };
        v[idx] += sign;
    }

    let norm: f32 = v.iter().map(|x| x * x).sum::<f32>().sqrt();
    if norm > 0.0 {
        for x in &mut v {
            *x /= norm;
        }
    }
    v
}

// --- Generator ---

/// Wraps a provider with dimension validation and a concurrency bound.
pub struct EmbeddingGenerator {
    provider: Box<dyn EmbeddingProvider>,
    dimensions: usize,
    permits: Semaphore,
}

impl EmbeddingGenerator {
    pub fn new(provider: Box<dyn EmbeddingProvider>, dimensions: usize, workers: usize) -> Self {
        Self {
            provider,
            dimensions,
            permits: Semaphore::new(workers.max(1)),
        }
    }

    pub fn dimensions(&self) -> usize {
        self.dimensions
    }

    pub fn provider_name(&self) -> &'static str {
        self.provider.name()
    }

    /// Embed node text for storage.
    pub async fn generate(&self, text: &str) -> Result<Vec<f32>> {
        let _permit = self
            .permits
            .acquire()
            .await
            .map_err(|_| MemoryError::provider("embedding workers shut down"))?;
        let vector = self.provider.embed(text).await?;
        if vector.len() != self.dimensions {
            return Err(MemoryError::provider(format!(
                "provider {} returned {} dimensions, expected {}",
                self.provider.name(),
                vector.len(),
                self.dimensions
            )));
        }
        Ok(vector)
    }

    /// Embed query text for search. Same projection as stored nodes.
    pub async fn generate_query(&self, text: &str) -> Result<Vec<f32>> {
        self.generate(text).await
    }
}

/// The text that gets embedded for each node variant.
pub fn fact_projection(content: &str) -> String {
    content.to_string()
}

pub fn decision_projection(title: &str, rationale: &str) -> String {
    format!("{title}\n\n{rationale}")
}

pub fn entity_projection(name: &str, description: &str) -> String {
    if description.is_empty() {
        name.to_string()
    } else {
        format!("{name}\n{description}")
    }
}

pub fn event_projection(title: &str, description: &str) -> String {
    if description.is_empty() {
        title.to_string()
    } else {
        format!("{title}\n{description}")
    }
}
