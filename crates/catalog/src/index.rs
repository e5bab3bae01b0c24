//! Vector index client.

use crate::product::Payload;
use crate::{Error, Result};
use serde::{Deserialize, Serialize};
use std::future::Future;

/// A point to upsert: catalog product id, embedding vector, payload.
#[derive(Debug, Clone, Serialize)]
pub struct Point {
    pub id: u64,
    pub vector: Vec<f32>,
    pub payload: Payload,
}

/// A nearest-neighbor hit, ranked by descending similarity.
#[derive(Debug, Clone, Deserialize)]
pub struct ScoredPoint {
    pub id: u64,
    pub score: f32,
    pub payload: Payload,
}

/// A point fetched by id.
#[derive(Debug, Clone, Deserialize)]
pub struct RetrievedPoint {
    pub id: u64,
    pub payload: Payload,
}

/// Trait for vector index backends.
///
/// Stores `(id, vector, payload)` triples and serves similarity
/// queries over them. Implementations must be safe to share across
/// concurrently running conversations.
pub trait VectorIndex: Send + Sync {
    /// Insert or replace points.
    fn upsert(&self, points: Vec<Point>) -> impl Future<Output = Result<()>> + Send;

    /// The `limit` nearest neighbors of `vector`, best first. An empty
    /// result is not an error.
    fn query(&self, vector: &[f32], limit: usize)
    -> impl Future<Output = Result<Vec<ScoredPoint>>> + Send;

    /// Fetch points by id. Absent ids are simply omitted.
    fn retrieve(&self, ids: &[u64]) -> impl Future<Output = Result<Vec<RetrievedPoint>>> + Send;

    /// The configured vector dimension of the collection.
    fn dimension(&self) -> impl Future<Output = Result<usize>> + Send;

    /// Create the collection if it does not exist yet.
    fn ensure_collection(&self, dimension: usize) -> impl Future<Output = Result<()>> + Send;
}

// ─────────────────────────────────────────────────────────────────────────────
// API Wire Types
// ─────────────────────────────────────────────────────────────────────────────

#[derive(Debug, Serialize)]
struct UpsertRequest<'a> {
    points: &'a [Point],
}

#[derive(Debug, Serialize)]
struct QueryRequest<'a> {
    query: &'a [f32],
    limit: usize,
    with_payload: bool,
}

#[derive(Debug, Serialize)]
struct RetrieveRequest<'a> {
    ids: &'a [u64],
    with_payload: bool,
}

#[derive(Debug, Serialize)]
struct CreateCollectionRequest {
    vectors: VectorParams,
}

#[derive(Debug, Serialize, Deserialize)]
struct VectorParams {
    size: usize,
    distance: String,
}

#[derive(Debug, Deserialize)]
struct ApiEnvelope<T> {
    result: T,
}

#[derive(Debug, Deserialize)]
struct QueryResult {
    points: Vec<ScoredPoint>,
}

#[derive(Debug, Deserialize)]
struct CollectionInfo {
    config: CollectionConfig,
}

#[derive(Debug, Deserialize)]
struct CollectionConfig {
    params: CollectionParams,
}

#[derive(Debug, Deserialize)]
struct CollectionParams {
    vectors: VectorParams,
}

// ─────────────────────────────────────────────────────────────────────────────
// Qdrant Implementation
// ─────────────────────────────────────────────────────────────────────────────

/// Qdrant REST API client for a single collection.
pub struct QdrantIndex {
    client: reqwest::Client,
    base_url: String,
    collection: String,
}

impl QdrantIndex {
    /// Create a client for `collection` at `base_url`
    /// (e.g. `http://localhost:6333`).
    pub fn new(base_url: impl Into<String>, collection: impl Into<String>) -> Self {
        let base_url = base_url.into();
        Self {
            client: reqwest::Client::new(),
            base_url: base_url.trim_end_matches('/').to_string(),
            collection: collection.into(),
        }
    }

    fn collection_url(&self, suffix: &str) -> String {
        format!("{}/collections/{}{suffix}", self.base_url, self.collection)
    }

    async fn check(response: reqwest::Response) -> Result<reqwest::Response> {
        if response.status().is_success() {
            Ok(response)
        } else {
            let status = response.status();
            let body = response.text().await.unwrap_or_default();
            Err(Error::Api(format!("{status}: {body}")))
        }
    }
}

impl VectorIndex for QdrantIndex {
    async fn upsert(&self, points: Vec<Point>) -> Result<()> {
        let response = self
            .client
            .put(self.collection_url("/points?wait=true"))
            .json(&UpsertRequest { points: &points })
            .send()
            .await
            .map_err(|e| Error::Network(e.to_string()))?;

        Self::check(response).await?;
        Ok(())
    }

    async fn query(&self, vector: &[f32], limit: usize) -> Result<Vec<ScoredPoint>> {
        let request = QueryRequest {
            query: vector,
            limit,
            with_payload: true,
        };

        let response = self
            .client
            .post(self.collection_url("/points/query"))
            .json(&request)
            .send()
            .await
            .map_err(|e| Error::Network(e.to_string()))?;

        let envelope: ApiEnvelope<QueryResult> = Self::check(response)
            .await?
            .json()
            .await
            .map_err(|e| Error::InvalidResponse(e.to_string()))?;

        Ok(envelope.result.points)
    }

    async fn retrieve(&self, ids: &[u64]) -> Result<Vec<RetrievedPoint>> {
        let request = RetrieveRequest {
            ids,
            with_payload: true,
        };

        let response = self
            .client
            .post(self.collection_url("/points"))
            .json(&request)
            .send()
            .await
            .map_err(|e| Error::Network(e.to_string()))?;

        let envelope: ApiEnvelope<Vec<RetrievedPoint>> = Self::check(response)
            .await?
            .json()
            .await
            .map_err(|e| Error::InvalidResponse(e.to_string()))?;

        Ok(envelope.result)
    }

    async fn dimension(&self) -> Result<usize> {
        let response = self
            .client
            .get(self.collection_url(""))
            .send()
            .await
            .map_err(|e| Error::Network(e.to_string()))?;

        let envelope: ApiEnvelope<CollectionInfo> = Self::check(response)
            .await?
            .json()
            .await
            .map_err(|e| Error::InvalidResponse(e.to_string()))?;

        Ok(envelope.result.config.params.vectors.size)
    }

    async fn ensure_collection(&self, dimension: usize) -> Result<()> {
        let response = self
            .client
            .get(self.collection_url(""))
            .send()
            .await
            .map_err(|e| Error::Network(e.to_string()))?;

        if response.status().is_success() {
            return Ok(());
        }
        if response.status() != reqwest::StatusCode::NOT_FOUND {
            Self::check(response).await?;
            return Ok(());
        }

        let request = CreateCollectionRequest {
            vectors: VectorParams {
                size: dimension,
                distance: "Cosine".to_string(),
            },
        };

        let response = self
            .client
            .put(self.collection_url(""))
            .json(&request)
            .send()
            .await
            .map_err(|e| Error::Network(e.to_string()))?;

        Self::check(response).await?;
        Ok(())
    }
}

/// Verify that the embedder's output dimension matches the index's
/// collection dimension. Mismatch is a fatal configuration error, not
/// a per-call condition.
pub async fn check_dimensions<E, I>(embedder: &E, index: &I) -> Result<()>
where
    E: crate::Embedder,
    I: VectorIndex,
{
    let collection_dim = index.dimension().await?;
    if collection_dim != embedder.dimension() {
        return Err(Error::Config(format!(
            "embedding dimension {} does not match collection dimension {collection_dim}",
            embedder.dimension()
        )));
    }
    Ok(())
}
