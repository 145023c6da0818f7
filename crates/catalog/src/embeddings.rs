//! Dense embeddings for the semantic search stage
//!
//! Talks to an Ollama-compatible `/api/embed` endpoint. Entry vectors are
//! computed from each entry's search blob at rebuild; queries are embedded
//! from their normalized text at search time.

use std::time::Duration;

use async_trait::async_trait;
use catalog_chat_config::EmbeddingConfig;
use reqwest::Client;
use serde::{Deserialize, Serialize};

use crate::CatalogError;

/// Turns texts into dense vectors, one per input, in input order
#[async_trait]
pub trait Embedder: Send + Sync {
    async fn embed(&self, texts: &[String]) -> Result<Vec<Vec<f32>>, CatalogError>;

    fn model(&self) -> &str;
}

#[derive(Debug, Serialize)]
struct EmbedRequest<'a> {
    model: &'a str,
    input: &'a [String],
}

#[derive(Debug, Deserialize)]
struct EmbedResponse {
    embeddings: Vec<Vec<f32>>,
}

/// Ollama embedding client
pub struct OllamaEmbedder {
    client: Client,
    endpoint: String,
    model: String,
}

impl OllamaEmbedder {
    pub fn new(config: &EmbeddingConfig) -> Result<Self, CatalogError> {
        let client = Client::builder()
            .timeout(Duration::from_millis(config.timeout_ms))
            .build()
            .map_err(|e| CatalogError::Embedding(format!("Failed to build client: {}", e)))?;

        Ok(Self {
            client,
            endpoint: config.endpoint.trim_end_matches('/').to_string(),
            model: config.model.clone(),
        })
    }
}

#[async_trait]
impl Embedder for OllamaEmbedder {
    async fn embed(&self, texts: &[String]) -> Result<Vec<Vec<f32>>, CatalogError> {
        if texts.is_empty() {
            return Ok(Vec::new());
        }

        let url = format!("{}/api/embed", self.endpoint);
        let response = self
            .client
            .post(&url)
            .json(&EmbedRequest {
                model: &self.model,
                input: texts,
            })
            .send()
            .await
            .map_err(|e| CatalogError::Embedding(format!("Request failed: {}", e)))?;

        if !response.status().is_success() {
            let status = response.status();
            let body = response.text().await.unwrap_or_default();
            return Err(CatalogError::Embedding(format!("{} - {}", status, body)));
        }

        let parsed: EmbedResponse = response
            .json()
            .await
            .map_err(|e| CatalogError::Embedding(format!("Failed to parse response: {}", e)))?;

        if parsed.embeddings.len() != texts.len() {
            return Err(CatalogError::Embedding(format!(
                "Expected {} vectors, got {}",
                texts.len(),
                parsed.embeddings.len()
            )));
        }
        Ok(parsed.embeddings)
    }

    fn model(&self) -> &str {
        &self.model
    }
}

/// Cosine similarity; 0.0 for mismatched lengths or zero vectors
pub fn cosine_similarity(a: &[f32], b: &[f32]) -> f32 {
    if a.len() != b.len() || a.is_empty() {
        return 0.0;
    }
    let dot: f32 = a.iter().zip(b).map(|(x, y)| x * y).sum();
    let norm_a = a.iter().map(|x| x * x).sum::<f32>().sqrt();
    let norm_b = b.iter().map(|x| x * x).sum::<f32>().sqrt();
    if norm_a == 0.0 || norm_b == 0.0 {
        return 0.0;
    }
    dot / (norm_a * norm_b)
}

#[cfg(test)]
mod tests {
    use super::*;
    use axum::{http::StatusCode, routing::post, Json, Router};
    use serde_json::{json, Value};

    async fn serve(app: Router) -> String {
        let listener = tokio::net::TcpListener::bind("127.0.0.1:0").await.unwrap();
        let addr = listener.local_addr().unwrap();
        tokio::spawn(async move {
            axum::serve(listener, app).await.unwrap();
        });
        format!("http://{}", addr)
    }

    fn config(endpoint: String) -> EmbeddingConfig {
        EmbeddingConfig {
            enabled: true,
            endpoint,
            ..EmbeddingConfig::default()
        }
    }

    #[test]
    fn test_cosine_similarity() {
        assert!((cosine_similarity(&[1.0, 0.0], &[2.0, 0.0]) - 1.0).abs() < 1e-6);
        assert!(cosine_similarity(&[1.0, 0.0], &[0.0, 3.0]).abs() < 1e-6);
        assert_eq!(cosine_similarity(&[0.0, 0.0], &[1.0, 1.0]), 0.0);
        assert_eq!(cosine_similarity(&[1.0], &[1.0, 0.0]), 0.0);
    }

    #[tokio::test]
    async fn test_embed_batch_keeps_order() {
        let app = Router::new().route(
            "/api/embed",
            post(|Json(body): Json<Value>| async move {
                assert_eq!(body["model"], "paraphrase-multilingual");
                let vectors: Vec<Vec<f32>> = body["input"]
                    .as_array()
                    .unwrap()
                    .iter()
                    .map(|t| vec![t.as_str().unwrap().len() as f32, 1.0])
                    .collect();
                Json(json!({ "embeddings": vectors }))
            }),
        );
        let embedder = OllamaEmbedder::new(&config(serve(app).await)).unwrap();

        let vectors = embedder
            .embed(&["kelle".to_string(), "fugbrett".to_string()])
            .await
            .unwrap();
        assert_eq!(vectors, vec![vec![5.0, 1.0], vec![8.0, 1.0]]);
        assert!(embedder.embed(&[]).await.unwrap().is_empty());
    }

    #[tokio::test]
    async fn test_embed_server_error() {
        let app = Router::new().route(
            "/api/embed",
            post(|| async { (StatusCode::NOT_FOUND, "model not found") }),
        );
        let embedder = OllamaEmbedder::new(&config(serve(app).await)).unwrap();

        let err = embedder.embed(&["kelle".to_string()]).await.unwrap_err();
        assert!(matches!(err, CatalogError::Embedding(ref m) if m.contains("model not found")));
    }

    #[tokio::test]
    async fn test_embed_count_mismatch() {
        let app = Router::new().route(
            "/api/embed",
            post(|| async { Json(json!({ "embeddings": [] })) }),
        );
        let embedder = OllamaEmbedder::new(&config(serve(app).await)).unwrap();
        assert!(embedder.embed(&["kelle".to_string()]).await.is_err());
    }
}
