//! Remote vector-store backend speaking a Qdrant-style REST protocol.

use std::sync::RwLock;
use std::time::Duration;

use reqwest::blocking::Client;
use reqwest::header::{HeaderMap, HeaderValue, CONTENT_TYPE};
use reqwest::StatusCode;
use serde::{Deserialize, Serialize};
use serde_json::{json, Value};

use crate::{CollectionSpec, Filter, IndexError, ScoredPoint, VectorIndex, VectorRecord};

/// Connection settings for a remote index.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
pub struct HttpIndexConfig {
    /// Base URL of the service, e.g. `https://cluster-id.cloud.example.com`.
    pub url: String,
    /// Value for the `api-key` header, when the service requires one.
    #[serde(default)]
    pub api_key: Option<String>,
    /// Per-call timeout in seconds. Every index call is bounded by this
    /// budget; a timeout surfaces as a backend error, never a hang.
    #[serde(default = "default_timeout_secs")]
    pub timeout_secs: u64,
}

fn default_timeout_secs() -> u64 {
    30
}

/// Blocking client for a Qdrant-style REST vector store.
///
/// No retry is attempted at this layer: transient index failures propagate
/// immediately and the caller decides what to do.
pub struct HttpIndex {
    client: Client,
    base_url: String,
    /// Collection bound by `ensure_collection`; operations before that
    /// return `CollectionMissing`.
    collection: RwLock<Option<CollectionSpec>>,
}

impl HttpIndex {
    pub fn new(cfg: HttpIndexConfig) -> Result<Self, IndexError> {
        if !cfg.url.starts_with("http://") && !cfg.url.starts_with("https://") {
            return Err(IndexError::backend("index url must be an http(s) URL"));
        }
        let mut headers = HeaderMap::new();
        headers.insert(CONTENT_TYPE, HeaderValue::from_static("application/json"));
        if let Some(key) = cfg.api_key.as_deref() {
            let value = HeaderValue::from_str(key.trim())
                .map_err(|_| IndexError::backend("invalid api key header"))?;
            headers.insert("api-key", value);
        }
        let client = Client::builder()
            .timeout(Duration::from_secs(cfg.timeout_secs))
            .default_headers(headers)
            .build()
            .map_err(|err| IndexError::backend(err.to_string()))?;
        Ok(Self {
            client,
            base_url: cfg.url.trim_end_matches('/').to_string(),
            collection: RwLock::new(None),
        })
    }

    fn collection_name(&self) -> Result<String, IndexError> {
        let guard = self
            .collection
            .read()
            .map_err(|_| IndexError::backend("poisoned lock"))?;
        guard
            .as_ref()
            .map(|spec| spec.name.clone())
            .ok_or_else(|| IndexError::CollectionMissing("call ensure_collection first".into()))
    }

    fn url(&self, path: &str) -> String {
        format!("{}{path}", self.base_url)
    }

    fn read_body(resp: reqwest::blocking::Response) -> String {
        resp.text()
            .unwrap_or_else(|_| "<body unavailable>".to_string())
    }

    fn send_json(
        &self,
        request: reqwest::blocking::RequestBuilder,
    ) -> Result<Value, IndexError> {
        let resp = request
            .send()
            .map_err(|err| IndexError::backend(err.to_string()))?;
        let status = resp.status();
        if !status.is_success() {
            return Err(IndexError::backend(format!(
                "index request failed ({status}): {}",
                Self::read_body(resp)
            )));
        }
        resp.json()
            .map_err(|err| IndexError::Serialization(err.to_string()))
    }

    fn filter_clause(filter: &Filter) -> Value {
        let mut must = Vec::new();
        if let Some(category) = filter.category.as_deref() {
            must.push(json!({"key": "category", "match": {"value": category}}));
        }
        if filter.price_min.is_some() || filter.price_max.is_some() {
            let mut range = serde_json::Map::new();
            if let Some(min) = filter.price_min {
                range.insert("gte".into(), json!(min));
            }
            if let Some(max) = filter.price_max {
                range.insert("lte".into(), json!(max));
            }
            must.push(json!({"key": "price", "range": Value::Object(range)}));
        }
        json!({"must": must})
    }

    fn record_from_point(point: &Value) -> Result<VectorRecord, IndexError> {
        let id = point
            .get("id")
            .map(id_to_string)
            .ok_or_else(|| IndexError::Serialization("point missing id".into()))?;
        let vector = point
            .get("vector")
            .and_then(|v| v.as_array())
            .map(|values| {
                values
                    .iter()
                    .filter_map(|v| v.as_f64())
                    .map(|v| v as f32)
                    .collect()
            })
            .unwrap_or_default();
        let payload = point.get("payload").cloned().unwrap_or(Value::Null);
        Ok(VectorRecord {
            id,
            vector,
            payload,
        })
    }
}

fn id_to_string(id: &Value) -> String {
    match id {
        Value::String(s) => s.clone(),
        other => other.to_string(),
    }
}

impl VectorIndex for HttpIndex {
    fn ensure_collection(&self, spec: &CollectionSpec) -> Result<(), IndexError> {
        let body = json!({
            "vectors": {
                "size": spec.dimension,
                "distance": "Cosine",
            }
        });
        let resp = self
            .client
            .put(self.url(&format!("/collections/{}", spec.name)))
            .json(&body)
            .send()
            .map_err(|err| IndexError::backend(err.to_string()))?;
        let status = resp.status();
        // CONFLICT means the collection already exists, which is exactly
        // what idempotent bootstrap wants.
        if !status.is_success() && status != StatusCode::CONFLICT {
            return Err(IndexError::backend(format!(
                "collection bootstrap failed ({status}): {}",
                Self::read_body(resp)
            )));
        }
        let mut guard = self
            .collection
            .write()
            .map_err(|_| IndexError::backend("poisoned lock"))?;
        *guard = Some(spec.clone());
        tracing::debug!(collection = %spec.name, dimension = spec.dimension, "collection ready");
        Ok(())
    }

    fn upsert(&self, records: Vec<VectorRecord>) -> Result<(), IndexError> {
        if records.is_empty() {
            return Ok(());
        }
        let name = self.collection_name()?;
        let points: Vec<Value> = records
            .iter()
            .map(|record| {
                json!({
                    "id": record.id,
                    "vector": record.vector,
                    "payload": record.payload,
                })
            })
            .collect();
        self.send_json(
            self.client
                .put(self.url(&format!("/collections/{name}/points")))
                .json(&json!({"points": points})),
        )?;
        Ok(())
    }

    fn query(
        &self,
        vector: &[f32],
        top_k: usize,
        filter: Option<&Filter>,
    ) -> Result<Vec<ScoredPoint>, IndexError> {
        if top_k == 0 {
            return Ok(Vec::new());
        }
        let name = self.collection_name()?;
        let mut body = json!({
            "vector": vector,
            "limit": top_k,
            "with_payload": true,
        });
        if let Some(filter) = filter.filter(|f| !f.is_empty()) {
            body["filter"] = Self::filter_clause(filter);
        }
        let response = self.send_json(
            self.client
                .post(self.url(&format!("/collections/{name}/points/search")))
                .json(&body),
        )?;
        let hits = response
            .get("result")
            .and_then(|r| r.as_array())
            .ok_or_else(|| IndexError::Serialization("search response missing result".into()))?;
        hits.iter()
            .map(|hit| {
                let id = hit
                    .get("id")
                    .map(id_to_string)
                    .ok_or_else(|| IndexError::Serialization("hit missing id".into()))?;
                let score = hit.get("score").and_then(|v| v.as_f64()).unwrap_or(0.0) as f32;
                let payload = hit.get("payload").cloned().unwrap_or(Value::Null);
                Ok(ScoredPoint { id, score, payload })
            })
            .collect()
    }

    fn fetch(&self, id: &str) -> Result<Option<VectorRecord>, IndexError> {
        let name = self.collection_name()?;
        let resp = self
            .client
            .get(self.url(&format!("/collections/{name}/points/{id}")))
            .send()
            .map_err(|err| IndexError::backend(err.to_string()))?;
        if resp.status() == StatusCode::NOT_FOUND {
            return Ok(None);
        }
        let status = resp.status();
        if !status.is_success() {
            return Err(IndexError::backend(format!(
                "fetch failed ({status}): {}",
                Self::read_body(resp)
            )));
        }
        let body: Value = resp
            .json()
            .map_err(|err| IndexError::Serialization(err.to_string()))?;
        match body.get("result") {
            Some(Value::Null) | None => Ok(None),
            Some(point) => Ok(Some(Self::record_from_point(point)?)),
        }
    }

    fn scan(&self, limit: usize, offset: usize) -> Result<Vec<VectorRecord>, IndexError> {
        if limit == 0 {
            return Ok(Vec::new());
        }
        let name = self.collection_name()?;
        let body = json!({
            "limit": limit,
            "offset": offset,
            "with_payload": true,
            "with_vector": true,
        });
        let response = self.send_json(
            self.client
                .post(self.url(&format!("/collections/{name}/points/scroll")))
                .json(&body),
        )?;
        let points = response
            .get("result")
            .and_then(|r| r.get("points"))
            .and_then(|p| p.as_array())
            .ok_or_else(|| IndexError::Serialization("scroll response missing points".into()))?;
        points.iter().map(Self::record_from_point).collect()
    }
}
