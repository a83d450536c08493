use reqwest::Client;
use serde::{Deserialize, Serialize};

use super::error::{decode_json, ensure_success, ClientError};
use crate::config::join_url;

const API_PREFIX: &str = "api/v1";

/// Handle to one collection of the vector index
#[derive(Debug, Clone, PartialEq, Eq, Deserialize)]
pub struct Collection {
    pub id: String,
    pub name: String,
    #[serde(default)]
    pub metadata: Option<serde_json::Value>,
}

/// Name of the collection holding a source's indexed articles
pub fn collection_name(source: &str) -> String {
    format!("real_news_data_{}", source)
}

#[derive(Debug, Serialize)]
struct CreateCollectionRequest<'a> {
    name: &'a str,
    get_or_create: bool,
}

#[derive(Debug, Serialize)]
struct QueryRequest<'a> {
    query_embeddings: &'a [Vec<f32>],
    n_results: usize,
    include: [&'static str; 1],
}

#[derive(Debug, Deserialize)]
struct QueryResponse {
    /// One list per query embedding
    #[serde(default)]
    documents: Option<Vec<Vec<Option<String>>>>,
}

#[derive(Debug, Serialize)]
struct AddRequest<'a> {
    ids: &'a [String],
    embeddings: &'a [Vec<f32>],
    documents: &'a [String],
}

#[derive(Debug, Deserialize)]
struct Heartbeat {
    #[serde(rename = "nanosecond heartbeat")]
    nanos: u64,
}

/// Client for a Chroma vector index server (REST v1)
#[derive(Debug, Clone)]
pub struct ChromaClient {
    client: Client,
    base_url: String,
}

impl ChromaClient {
    pub fn new(client: Client, base_url: impl Into<String>) -> Self {
        Self {
            client,
            base_url: base_url.into(),
        }
    }

    fn url(&self, path: &str) -> String {
        join_url(&self.base_url, &format!("{}/{}", API_PREFIX, path))
    }

    /// Server heartbeat in nanoseconds
    pub async fn heartbeat(&self) -> Result<u64, ClientError> {
        let url = self.url("heartbeat");
        let response = self
            .client
            .get(&url)
            .send()
            .await
            .map_err(|e| ClientError::transport(&url, e))?;
        let response = ensure_success(&url, response).await?;
        let beat: Heartbeat = decode_json(&url, response).await?;
        Ok(beat.nanos)
    }

    pub async fn get_or_create_collection(&self, name: &str) -> Result<Collection, ClientError> {
        let url = self.url("collections");
        let response = self
            .client
            .post(&url)
            .json(&CreateCollectionRequest {
                name,
                get_or_create: true,
            })
            .send()
            .await
            .map_err(|e| ClientError::transport(&url, e))?;
        let response = ensure_success(&url, response).await?;
        decode_json(&url, response).await
    }

    pub async fn list_collections(&self) -> Result<Vec<Collection>, ClientError> {
        let url = self.url("collections");
        let response = self
            .client
            .get(&url)
            .send()
            .await
            .map_err(|e| ClientError::transport(&url, e))?;
        let response = ensure_success(&url, response).await?;
        decode_json(&url, response).await
    }

    /// Number of documents stored in a collection
    pub async fn count(&self, collection: &Collection) -> Result<usize, ClientError> {
        let url = self.url(&format!("collections/{}/count", collection.id));
        let response = self
            .client
            .get(&url)
            .send()
            .await
            .map_err(|e| ClientError::transport(&url, e))?;
        let response = ensure_success(&url, response).await?;
        decode_json(&url, response).await
    }

    /// Documents nearest to `embedding`, closest first
    pub async fn query(
        &self,
        collection: &Collection,
        embedding: Vec<f32>,
        n_results: usize,
    ) -> Result<Vec<String>, ClientError> {
        let url = self.url(&format!("collections/{}/query", collection.id));
        let embeddings = [embedding];
        let response = self
            .client
            .post(&url)
            .json(&QueryRequest {
                query_embeddings: &embeddings,
                n_results,
                include: ["documents"],
            })
            .send()
            .await
            .map_err(|e| ClientError::transport(&url, e))?;
        let response = ensure_success(&url, response).await?;
        let result: QueryResponse = decode_json(&url, response).await?;

        Ok(result
            .documents
            .and_then(|per_query| per_query.into_iter().next())
            .unwrap_or_default()
            .into_iter()
            .flatten()
            .collect())
    }

    pub async fn add(
        &self,
        collection: &Collection,
        ids: &[String],
        embeddings: &[Vec<f32>],
        documents: &[String],
    ) -> Result<(), ClientError> {
        let url = self.url(&format!("collections/{}/add", collection.id));
        let response = self
            .client
            .post(&url)
            .json(&AddRequest {
                ids,
                embeddings,
                documents,
            })
            .send()
            .await
            .map_err(|e| ClientError::transport(&url, e))?;
        ensure_success(&url, response).await?;
        Ok(())
    }
}
