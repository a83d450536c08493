use tracing::{debug, warn};

use crate::io::{collection_name, ChromaClient, ClientError, Collection};
use crate::llm::OllamaClient;

/// Top-K similarity lookup against one source's vector collection.
///
/// Built once per source and shared read-only by all of that source's tasks.
#[derive(Debug, Clone)]
pub struct ContextRetriever {
    chroma: ChromaClient,
    embedder: OllamaClient,
    embedding_model: String,
    collection: Option<Collection>,
    top_k: usize,
}

impl ContextRetriever {
    /// Fetch or create the source's collection.
    ///
    /// If the index cannot be reached the retriever still works but every
    /// lookup yields an empty context.
    pub async fn for_source(
        chroma: ChromaClient,
        embedder: OllamaClient,
        embedding_model: impl Into<String>,
        source: &str,
        top_k: usize,
    ) -> Self {
        let name = collection_name(source);
        let collection = match chroma.get_or_create_collection(&name).await {
            Ok(collection) => Some(collection),
            Err(e) => {
                warn!(source, collection = %name, "vector collection unavailable: {}", e);
                None
            }
        };
        Self {
            chroma,
            embedder,
            embedding_model: embedding_model.into(),
            collection,
            top_k,
        }
    }

    pub fn collection(&self) -> Option<&Collection> {
        self.collection.as_ref()
    }

    /// Ordered context texts for a headline; empty on any failure
    pub async fn query_context(&self, headline: &str) -> Vec<String> {
        match self.try_query(headline).await {
            Ok(context) => {
                debug!(headline, found = context.len(), "context retrieved");
                context
            }
            Err(e) => {
                warn!(headline, "context lookup failed, continuing without context: {}", e);
                Vec::new()
            }
        }
    }

    async fn try_query(&self, headline: &str) -> Result<Vec<String>, ClientError> {
        let Some(collection) = &self.collection else {
            return Ok(Vec::new());
        };
        let mut embeddings = self
            .embedder
            .embed(&self.embedding_model, &[headline.to_string()])
            .await?;
        let embedding = embeddings.pop().unwrap_or_default();
        self.chroma.query(collection, embedding, self.top_k).await
    }
}
