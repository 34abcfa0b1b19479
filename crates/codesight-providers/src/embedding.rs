use std::collections::HashMap;
use std::sync::{Arc, Mutex, OnceLock};

use fastembed::{EmbeddingModel, InitOptions, TextEmbedding};

use crate::error::ProviderError;

/// Contract every embedding backend satisfies: batch-embed chunk text, or
/// embed a single query string, always returning unit-L2-normalized
/// `f32` vectors of `dimension()` length.
pub trait EmbeddingProvider: Send + Sync {
    fn embed(&self, texts: &[String]) -> Result<Vec<Vec<f32>>, ProviderError>;
    fn embed_query(&self, text: &str) -> Result<Vec<f32>, ProviderError> {
        Ok(self.embed(std::slice::from_ref(&text.to_string()))?.remove(0))
    }
    fn dimension(&self) -> usize;
    fn model_id(&self) -> &str;
}

/// Local ONNX inference via `fastembed`. Lazily loaded on first use, as the
/// original source's `Embedder.model` property does.
pub struct LocalEmbedder {
    model: Mutex<TextEmbedding>,
    dimension: usize,
    model_id: String,
}

impl LocalEmbedder {
    pub fn new(model_name: &str, dimension: usize) -> Result<Self, ProviderError> {
        let fastembed_model = map_model_name(model_name);
        let model = TextEmbedding::try_new(InitOptions::new(fastembed_model).with_show_download_progress(false))
            .map_err(|e| ProviderError::ConfigFailure(format!("failed to load embedding model: {e}")))?;
        Ok(Self {
            model: Mutex::new(model),
            dimension,
            model_id: model_name.to_string(),
        })
    }
}

impl EmbeddingProvider for LocalEmbedder {
    fn embed(&self, texts: &[String]) -> Result<Vec<Vec<f32>>, ProviderError> {
        if texts.is_empty() {
            return Ok(Vec::new());
        }
        let model = self
            .model
            .lock()
            .map_err(|_| ProviderError::RequestFailed("embedding model lock poisoned".to_string()))?;
        let embeddings = model
            .embed(texts.to_vec(), None)
            .map_err(|e| ProviderError::RequestFailed(format!("local embedding failed: {e}")))?;
        for v in &embeddings {
            if v.len() != self.dimension {
                return Err(ProviderError::DimensionMismatch {
                    expected: self.dimension,
                    actual: v.len(),
                });
            }
        }
        Ok(embeddings)
    }

    fn dimension(&self) -> usize {
        self.dimension
    }

    fn model_id(&self) -> &str {
        &self.model_id
    }
}

fn map_model_name(model_name: &str) -> EmbeddingModel {
    match model_name {
        "sentence-transformers/all-MiniLM-L6-v2" => EmbeddingModel::AllMiniLML6V2,
        "nomic-ai/nomic-embed-text-v1.5" => EmbeddingModel::NomicEmbedTextV15,
        "mixedbread-ai/mxbai-embed-large-v1" => EmbeddingModel::MxbaiEmbedLargeV1,
        "jinaai/jina-embeddings-v2-base-code" => EmbeddingModel::JinaEmbeddingsV2BaseCode,
        _ => EmbeddingModel::AllMiniLML6V2,
    }
}

/// An OpenAI-compatible embeddings endpoint reached over HTTP.
///
/// Configured via `CODESIGHT_EMBEDDING_API_BASE` (default
/// `https://api.openai.com/v1`) and `CODESIGHT_EMBEDDING_API_KEY`.
pub struct RemoteApiEmbedder {
    client: reqwest::blocking::Client,
    api_base: String,
    api_key: String,
    model_id: String,
    dimension: usize,
}

impl RemoteApiEmbedder {
    pub fn new(model_name: &str, dimension: usize) -> Result<Self, ProviderError> {
        let api_key = std::env::var("CODESIGHT_EMBEDDING_API_KEY").map_err(|_| {
            ProviderError::ConfigFailure(
                "CODESIGHT_EMBEDDING_API_KEY environment variable is required for the remote embedding backend"
                    .to_string(),
            )
        })?;
        let api_base = std::env::var("CODESIGHT_EMBEDDING_API_BASE")
            .unwrap_or_else(|_| "https://api.openai.com/v1".to_string());
        let client = reqwest::blocking::Client::builder()
            .timeout(std::time::Duration::from_secs(30))
            .build()
            .map_err(|e| ProviderError::RequestFailed(e.to_string()))?;
        Ok(Self {
            client,
            api_base,
            api_key,
            model_id: model_name.to_string(),
            dimension,
        })
    }
}

#[derive(serde::Serialize)]
struct EmbeddingsRequest<'a> {
    model: &'a str,
    input: &'a [String],
}

#[derive(serde::Deserialize)]
struct EmbeddingsResponse {
    data: Vec<EmbeddingsDatum>,
}

#[derive(serde::Deserialize)]
struct EmbeddingsDatum {
    embedding: Vec<f32>,
}

impl EmbeddingProvider for RemoteApiEmbedder {
    fn embed(&self, texts: &[String]) -> Result<Vec<Vec<f32>>, ProviderError> {
        if texts.is_empty() {
            return Ok(Vec::new());
        }
        let url = format!("{}/embeddings", self.api_base.trim_end_matches('/'));
        let body = EmbeddingsRequest {
            model: &self.model_id,
            input: texts,
        };
        let response = self
            .client
            .post(&url)
            .bearer_auth(&self.api_key)
            .json(&body)
            .send()
            .map_err(|e| ProviderError::RequestFailed(e.to_string()))?;
        if !response.status().is_success() {
            return Err(ProviderError::RequestFailed(format!(
                "embeddings endpoint returned {}",
                response.status()
            )));
        }
        let parsed: EmbeddingsResponse = response
            .json()
            .map_err(|e| ProviderError::RequestFailed(format!("invalid embeddings response: {e}")))?;
        let vectors: Vec<Vec<f32>> = parsed.data.into_iter().map(|d| l2_normalize(d.embedding)).collect();
        for v in &vectors {
            if v.len() != self.dimension {
                return Err(ProviderError::DimensionMismatch {
                    expected: self.dimension,
                    actual: v.len(),
                });
            }
        }
        Ok(vectors)
    }

    fn dimension(&self) -> usize {
        self.dimension
    }

    fn model_id(&self) -> &str {
        &self.model_id
    }
}

fn l2_normalize(mut v: Vec<f32>) -> Vec<f32> {
    let norm = v.iter().map(|x| x * x).sum::<f32>().sqrt();
    if norm > 0.0 {
        for x in &mut v {
            *x /= norm;
        }
    }
    v
}

type EmbedderCache = Mutex<HashMap<(String, usize, String), Arc<dyn EmbeddingProvider>>>;

fn embedder_cache() -> &'static EmbedderCache {
    static CACHE: OnceLock<EmbedderCache> = OnceLock::new();
    CACHE.get_or_init(|| Mutex::new(HashMap::new()))
}

/// Process-singleton embedder, memoized by `(model, dim, backend)` —
/// mirrors the original source's `get_embedder` `lru_cache`.
pub fn get_embedder(model_name: &str, dimension: usize, backend: &str) -> Result<Arc<dyn EmbeddingProvider>, ProviderError> {
    let key = (model_name.to_string(), dimension, backend.to_string());
    let mut cache = embedder_cache()
        .lock()
        .map_err(|_| ProviderError::RequestFailed("embedder cache lock poisoned".to_string()))?;
    if let Some(existing) = cache.get(&key) {
        return Ok(existing.clone());
    }
    let provider: Arc<dyn EmbeddingProvider> = match backend {
        "local" => Arc::new(LocalEmbedder::new(model_name, dimension)?),
        "api" | "remote" | "remote_api" => Arc::new(RemoteApiEmbedder::new(model_name, dimension)?),
        other => {
            return Err(ProviderError::UnknownBackend {
                name: other.to_string(),
                valid: "local, api",
            })
        }
    };
    cache.insert(key, provider.clone());
    Ok(provider)
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn unknown_backend_is_rejected() {
        let err = get_embedder("any-model", 384, "carrier-pigeon").unwrap_err();
        assert!(matches!(err, ProviderError::UnknownBackend { .. }));
    }

    #[test]
    fn remote_without_api_key_fails_with_config_error() {
        std::env::remove_var("CODESIGHT_EMBEDDING_API_KEY");
        let err = RemoteApiEmbedder::new("text-embedding-3-small", 1536).unwrap_err();
        assert!(matches!(err, ProviderError::ConfigFailure(_)));
    }

    #[test]
    fn l2_normalize_produces_unit_vector() {
        let v = l2_normalize(vec![3.0, 4.0]);
        let norm = (v[0] * v[0] + v[1] * v[1]).sqrt();
        assert!((norm - 1.0).abs() < 1e-6);
    }
}
