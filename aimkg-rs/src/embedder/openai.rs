//! OpenAI-compatible embedding client.
//!
//! Wraps [`async_openai`] to provide [`EmbedderClient`] for any server speaking
//! the OpenAI Embeddings API (hosted OpenAI, or a local server hosting the
//! sentence model), with chunked batch support, exponential-backoff retry and
//! a dimension check on every returned vector.

use async_openai::{
    config::OpenAIConfig,
    error::OpenAIError,
    types::CreateEmbeddingRequestArgs,
    Client,
};
use backoff::{future::retry, ExponentialBackoffBuilder};
use std::time::Duration;

use crate::embedder::{Embedding, EmbedderClient};
use crate::errors::{AimkgError, Result};

/// Maximum number of inputs per embeddings API call.
const BATCH_CHUNK_SIZE: usize = 256;

/// Classify an [`OpenAIError`] as transient (should retry) or permanent.
fn classify_error(err: OpenAIError) -> backoff::Error<AimkgError> {
    let msg = err.to_string();
    match &err {
        // Network-level failures (timeouts, connection refused) are transient.
        OpenAIError::Reqwest(e) if e.is_timeout() || e.is_connect() => {
            backoff::Error::transient(AimkgError::Embedder(msg))
        }
        // Everything else (auth errors, bad requests, …) is permanent.
        _ => backoff::Error::permanent(AimkgError::Embedder(msg)),
    }
}

/// Embedding client that implements [`EmbedderClient`].
pub struct OpenAiEmbedder {
    client: Client<OpenAIConfig>,
    model: String,
    dim: usize,
    max_elapsed: Duration,
}

impl OpenAiEmbedder {
    /// Create a new embedder.
    ///
    /// # Arguments
    /// * `api_base` – Base URL, e.g. `http://localhost:8080/v1`.
    /// * `api_key`  – Bearer key; servers that need none accept any value.
    /// * `model`    – Model name sent with every request.
    /// * `dim`      – Expected vector length; responses of any other length fail.
    pub fn new(
        api_base: impl Into<String>,
        api_key: Option<String>,
        model: impl Into<String>,
        dim: usize,
    ) -> Self {
        let config = OpenAIConfig::new()
            .with_api_base(api_base.into())
            .with_api_key(api_key.unwrap_or_default());
        Self {
            client: Client::with_config(config),
            model: model.into(),
            dim,
            max_elapsed: Duration::from_secs(60),
        }
    }

    /// Override the total retry budget (default 60 s).
    pub fn with_retry_budget(mut self, max_elapsed: Duration) -> Self {
        self.max_elapsed = max_elapsed;
        self
    }

    /// Issue a single embeddings API call for up to [`BATCH_CHUNK_SIZE`] texts.
    ///
    /// Retries on transient network failures with exponential back-off
    /// (initial 500 ms, cap 10 s, total budget `max_elapsed`).
    async fn embed_chunk(&self, texts: &[&str]) -> Result<Vec<Embedding>> {
        let backoff_policy = ExponentialBackoffBuilder::new()
            .with_initial_interval(Duration::from_millis(500))
            .with_max_interval(Duration::from_secs(10))
            .with_max_elapsed_time(Some(self.max_elapsed))
            .build();

        // Materialise owned data before entering the retry closure.
        let input: Vec<String> = texts.iter().map(|s| (*s).to_owned()).collect();
        let model = self.model.clone();
        let client = self.client.clone();

        let embeddings: Vec<Embedding> = retry(backoff_policy, move || {
            let input = input.clone();
            let model = model.clone();
            let client = client.clone();
            async move {
                let request = CreateEmbeddingRequestArgs::default()
                    .model(model.as_str())
                    .input(input)
                    .build()
                    .map_err(|e| {
                        backoff::Error::permanent(AimkgError::Embedder(e.to_string()))
                    })?;

                let response = client
                    .embeddings()
                    .create(request)
                    .await
                    .map_err(classify_error)?;

                let mut data = response.data;
                data.sort_by_key(|item| item.index);
                Ok::<Vec<Embedding>, backoff::Error<AimkgError>>(
                    data.into_iter()
                        .map(|item| item.embedding.into_iter().map(|x| x as f32).collect())
                        .collect(),
                )
            }
        })
        .await?;

        if embeddings.len() != texts.len() {
            return Err(AimkgError::Embedder(format!(
                "expected {} embeddings, got {}",
                texts.len(),
                embeddings.len()
            )));
        }
        if let Some(bad) = embeddings.iter().find(|e| e.len() != self.dim) {
            return Err(AimkgError::Embedder(format!(
                "model '{}' returned {}-dim vectors, configured for {}",
                self.model,
                bad.len(),
                self.dim
            )));
        }
        Ok(embeddings)
    }
}

impl EmbedderClient for OpenAiEmbedder {
    /// Embed a single text string.
    async fn embed(&self, text: &str) -> Result<Embedding> {
        let mut embeddings = self.embed_chunk(&[text]).await?;
        embeddings
            .pop()
            .ok_or_else(|| AimkgError::Embedder("empty response from embedding API".to_string()))
    }

    /// Embed multiple texts, automatically splitting into chunks of at most
    /// [`BATCH_CHUNK_SIZE`] items.
    async fn embed_batch(&self, texts: &[&str]) -> Result<Vec<Embedding>> {
        let mut result = Vec::with_capacity(texts.len());
        for chunk in texts.chunks(BATCH_CHUNK_SIZE) {
            let chunk_embeddings = self.embed_chunk(chunk).await?;
            result.extend(chunk_embeddings);
        }
        Ok(result)
    }

    fn dim(&self) -> usize {
        self.dim
    }

    fn model(&self) -> &str {
        &self.model
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use wiremock::{
        matchers::{method, path},
        Mock, MockServer, ResponseTemplate,
    };

    const MODEL: &str = "all-mpnet-base-v2";

    /// Build a JSON body mimicking a real embeddings response.
    fn make_response(count: usize, dim: usize) -> serde_json::Value {
        let data: Vec<serde_json::Value> = (0..count)
            .map(|i| {
                serde_json::json!({
                    "object": "embedding",
                    "index": i,
                    "embedding": vec![0.1_f32; dim],
                })
            })
            .collect();
        serde_json::json!({
            "object": "list",
            "data": data,
            "model": MODEL,
            "usage": { "prompt_tokens": 8, "total_tokens": 8 },
        })
    }

    /// Mount a successful `POST /embeddings` mock returning `count` embeddings
    /// of `dim` dimensions each.
    async fn mount_ok(server: &MockServer, count: usize, dim: usize) {
        Mock::given(method("POST"))
            .and(path("/embeddings"))
            .respond_with(ResponseTemplate::new(200).set_body_json(make_response(count, dim)))
            .mount(server)
            .await;
    }

    fn embedder(server: &MockServer, dim: usize) -> OpenAiEmbedder {
        OpenAiEmbedder::new(server.uri(), None, MODEL, dim)
            .with_retry_budget(Duration::from_secs(1))
    }

    // ── dim() ──────────────────────────────────────────────────────────────

    #[test]
    fn dim_is_the_configured_value() {
        let e = OpenAiEmbedder::new("http://localhost:8080/v1", None, MODEL, 768);
        assert_eq!(e.dim(), 768);
        assert_eq!(e.model(), MODEL);
    }

    // ── embed() ────────────────────────────────────────────────────────────

    #[tokio::test]
    async fn embed_returns_vector_of_correct_length() {
        let server = MockServer::start().await;
        mount_ok(&server, 1, 4).await;

        let embedding = embedder(&server, 4).embed("image net").await.unwrap();
        assert_eq!(embedding.len(), 4);
    }

    #[tokio::test]
    async fn embed_values_match_mocked_response() {
        let server = MockServer::start().await;
        mount_ok(&server, 1, 3).await;

        let embedding = embedder(&server, 3).embed("test").await.unwrap();
        for &v in &embedding {
            assert!((v - 0.1_f32).abs() < 1e-5, "expected ≈0.1, got {v}");
        }
    }

    #[tokio::test]
    async fn embed_wrong_dimension_is_error() {
        let server = MockServer::start().await;
        mount_ok(&server, 1, 5).await;

        let result = embedder(&server, 4).embed("test").await;
        match result {
            Err(AimkgError::Embedder(msg)) => assert!(msg.contains("5-dim")),
            other => panic!("expected Embedder error, got {other:?}"),
        }
    }

    #[tokio::test]
    async fn embed_empty_data_is_error() {
        let server = MockServer::start().await;
        Mock::given(method("POST"))
            .and(path("/embeddings"))
            .respond_with(ResponseTemplate::new(200).set_body_json(serde_json::json!({
                "object": "list",
                "data": [],
                "model": MODEL,
                "usage": { "prompt_tokens": 0, "total_tokens": 0 },
            })))
            .mount(&server)
            .await;

        let result = embedder(&server, 4).embed("test").await;
        assert!(matches!(result, Err(AimkgError::Embedder(_))));
    }

    // ── embed_batch() ──────────────────────────────────────────────────────

    #[tokio::test]
    async fn embed_batch_returns_one_embedding_per_input() {
        let server = MockServer::start().await;
        mount_ok(&server, 3, 4).await;

        let texts = ["ImageNet", "CIFAR-10", "COCO"];
        let embeddings = embedder(&server, 4).embed_batch(&texts).await.unwrap();
        assert_eq!(embeddings.len(), 3);
        for emb in &embeddings {
            assert_eq!(emb.len(), 4);
        }
    }

    #[tokio::test]
    async fn embed_batch_orders_vectors_by_response_index() {
        let server = MockServer::start().await;
        Mock::given(method("POST"))
            .and(path("/embeddings"))
            .respond_with(ResponseTemplate::new(200).set_body_json(serde_json::json!({
                "object": "list",
                "data": [
                    { "object": "embedding", "index": 1, "embedding": [0.0, 1.0] },
                    { "object": "embedding", "index": 0, "embedding": [1.0, 0.0] },
                ],
                "model": MODEL,
                "usage": { "prompt_tokens": 4, "total_tokens": 4 },
            })))
            .mount(&server)
            .await;

        let embeddings = embedder(&server, 2)
            .embed_batch(&["first", "second"])
            .await
            .unwrap();
        assert_eq!(embeddings, vec![vec![1.0, 0.0], vec![0.0, 1.0]]);
    }

    #[tokio::test]
    async fn embed_batch_empty_slice_returns_empty_vec() {
        // No HTTP call should be made for an empty input slice.
        let server = MockServer::start().await;
        let embeddings = embedder(&server, 4).embed_batch(&[]).await.unwrap();
        assert!(embeddings.is_empty());
    }

    // ── error mapping ──────────────────────────────────────────────────────

    #[tokio::test]
    async fn api_error_maps_to_embedder_variant() {
        let server = MockServer::start().await;
        Mock::given(method("POST"))
            .and(path("/embeddings"))
            .respond_with(ResponseTemplate::new(401).set_body_json(serde_json::json!({
                "error": {
                    "message": "Incorrect API key provided.",
                    "type": "authentication_error",
                    "param": null,
                    "code": "invalid_api_key",
                }
            })))
            .mount(&server)
            .await;

        let result = embedder(&server, 4).embed("test").await;
        assert!(matches!(result, Err(AimkgError::Embedder(_))));
    }
}
