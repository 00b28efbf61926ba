//! Remote embedding client for HTTP inference endpoints.

use std::thread;
use std::time::Duration;

use reqwest::blocking::Client;
use reqwest::header::{HeaderMap, HeaderValue, AUTHORIZATION, CONTENT_TYPE};
use reqwest::StatusCode;
use serde::{Deserialize, Serialize};

use crate::normalize::l2_normalize_in_place;
use crate::{EmbeddingConfig, EmbeddingError, EmbeddingProvider};

/// Blocking embeddings client that talks to a remote inference endpoint.
///
/// Sends `{model, input}` and accepts either the OpenAI-style
/// `{data: [{embedding, index}]}` shape or a bare `{embeddings: [[..]]}`
/// shape. Every call is bounded by the configured timeout; 429 and 5xx
/// responses and transport errors are retried with exponential backoff up to
/// the configured attempt limit.
pub struct HttpEmbedder {
    client: Client,
    endpoint: String,
    model: String,
    dimension: usize,
    normalize: bool,
    max_retries: usize,
    batch_size: usize,
}

impl HttpEmbedder {
    pub fn new(cfg: &EmbeddingConfig) -> Result<Self, EmbeddingError> {
        let endpoint = cfg
            .api_url
            .as_deref()
            .ok_or_else(|| EmbeddingError::InvalidConfig("api mode requires api_url".into()))?;
        if !endpoint.starts_with("http://") && !endpoint.starts_with("https://") {
            return Err(EmbeddingError::InvalidConfig(
                "api_url must be an http(s) URL".into(),
            ));
        }

        let mut headers = HeaderMap::new();
        headers.insert(CONTENT_TYPE, HeaderValue::from_static("application/json"));
        if let Some(auth) = cfg.api_auth_header.as_deref() {
            let value = HeaderValue::from_str(auth.trim())
                .map_err(|_| EmbeddingError::InvalidConfig("invalid auth header".into()))?;
            headers.insert(AUTHORIZATION, value);
        }

        let client = Client::builder()
            .timeout(Duration::from_secs(cfg.api_timeout_secs))
            .default_headers(headers)
            .build()
            .map_err(|err| EmbeddingError::InvalidConfig(err.to_string()))?;

        Ok(Self {
            client,
            endpoint: endpoint.trim_end_matches('/').to_string(),
            model: cfg.model_name.clone(),
            dimension: cfg.dimension,
            normalize: cfg.normalize,
            max_retries: cfg.max_retries.max(1),
            batch_size: cfg.batch_size.max(1),
        })
    }

    fn request_batch(&self, inputs: &[&str]) -> Result<Vec<Vec<f32>>, EmbeddingError> {
        let mut attempt = 0usize;
        loop {
            let request = InferenceRequest {
                model: &self.model,
                inputs,
            };
            let response = self.client.post(&self.endpoint).json(&request).send();
            match response {
                Ok(resp) => {
                    let status = resp.status();
                    if status.is_success() {
                        let payload: InferenceResponse = resp.json().map_err(|err| {
                            EmbeddingError::Unavailable(format!(
                                "failed to parse inference response: {err}"
                            ))
                        })?;
                        return payload.into_embeddings(inputs.len());
                    }
                    let body = resp
                        .text()
                        .unwrap_or_else(|_| "<body unavailable>".to_string());
                    if should_retry(status) && attempt + 1 < self.max_retries {
                        attempt += 1;
                        tracing::warn!(%status, attempt, "embedding request failed, retrying");
                        thread::sleep(retry_backoff(attempt));
                        continue;
                    }
                    return Err(EmbeddingError::Unavailable(format!(
                        "inference request failed ({status}): {body}"
                    )));
                }
                Err(err) => {
                    if (err.is_connect() || err.is_timeout() || err.is_request())
                        && attempt + 1 < self.max_retries
                    {
                        attempt += 1;
                        tracing::warn!(error = %err, attempt, "embedding transport error, retrying");
                        thread::sleep(retry_backoff(attempt));
                        continue;
                    }
                    return Err(EmbeddingError::Unavailable(err.to_string()));
                }
            }
        }
    }

    fn finish(&self, mut vector: Vec<f32>) -> Result<Vec<f32>, EmbeddingError> {
        if vector.len() != self.dimension {
            return Err(EmbeddingError::DimensionMismatch {
                expected: self.dimension,
                got: vector.len(),
            });
        }
        if self.normalize {
            l2_normalize_in_place(&mut vector);
        }
        Ok(vector)
    }
}

impl EmbeddingProvider for HttpEmbedder {
    fn dimension(&self) -> usize {
        self.dimension
    }

    fn embed(&self, text: &str) -> Result<Vec<f32>, EmbeddingError> {
        let mut vectors = self.embed_batch(&[text])?;
        vectors
            .pop()
            .ok_or_else(|| EmbeddingError::Unavailable("empty embedding response".into()))
    }

    fn embed_batch(&self, texts: &[&str]) -> Result<Vec<Vec<f32>>, EmbeddingError> {
        let mut out = Vec::with_capacity(texts.len());
        for chunk in texts.chunks(self.batch_size) {
            let vectors = self.request_batch(chunk)?;
            for vector in vectors {
                out.push(self.finish(vector)?);
            }
        }
        Ok(out)
    }
}

fn should_retry(status: StatusCode) -> bool {
    status == StatusCode::TOO_MANY_REQUESTS || status.is_server_error()
}

fn retry_backoff(attempt: usize) -> Duration {
    let capped = attempt.min(5) as u32;
    Duration::from_millis(250 * (1 << capped))
}

#[derive(Serialize)]
struct InferenceRequest<'a> {
    model: &'a str,
    #[serde(rename = "input")]
    inputs: &'a [&'a str],
}

#[derive(Debug, Deserialize)]
struct InferenceResponse {
    #[serde(default)]
    data: Vec<InferenceData>,
    #[serde(default)]
    embeddings: Vec<Vec<f32>>,
}

#[derive(Debug, Deserialize)]
struct InferenceData {
    embedding: Vec<f32>,
    #[serde(default)]
    index: Option<usize>,
}

impl InferenceResponse {
    fn into_embeddings(self, expected_len: usize) -> Result<Vec<Vec<f32>>, EmbeddingError> {
        if !self.data.is_empty() {
            if self.data.len() != expected_len {
                return Err(EmbeddingError::Unavailable(format!(
                    "endpoint returned {} embeddings for {} inputs",
                    self.data.len(),
                    expected_len
                )));
            }
            let mut data = self.data;
            data.sort_by_key(|d| d.index.unwrap_or(0));
            return Ok(data.into_iter().map(|d| d.embedding).collect());
        }
        if !self.embeddings.is_empty() {
            if self.embeddings.len() != expected_len {
                return Err(EmbeddingError::Unavailable(format!(
                    "endpoint returned {} embeddings for {} inputs",
                    self.embeddings.len(),
                    expected_len
                )));
            }
            return Ok(self.embeddings);
        }
        Err(EmbeddingError::Unavailable(
            "response missing embedding payloads".into(),
        ))
    }
}
