use reqwest::{Client, StatusCode};
use tracing::{debug, warn};

use super::error::ClientError;
use crate::config::join_url;
use crate::models::SyntheticDocument;

/// Result of one publish call
#[derive(Debug)]
pub enum PublishOutcome {
    /// The storage API answered 201
    Created,
    /// The call completed but the API did not accept the document
    Rejected { status: StatusCode, body: String },
    /// The request never completed
    Unreachable(ClientError),
}

impl PublishOutcome {
    pub fn is_created(&self) -> bool {
        matches!(self, PublishOutcome::Created)
    }

    /// Whether the storage API answered at all
    pub fn completed(&self) -> bool {
        !matches!(self, PublishOutcome::Unreachable(_))
    }
}

/// Client for the synthetic document storage API
#[derive(Debug, Clone)]
pub struct StorageClient {
    client: Client,
    base_url: String,
}

impl StorageClient {
    pub fn new(client: Client, base_url: impl Into<String>) -> Self {
        Self {
            client,
            base_url: base_url.into(),
        }
    }

    /// POST a document to the source's collection. No retry.
    pub async fn publish(&self, source: &str, document: &SyntheticDocument) -> PublishOutcome {
        let url = join_url(&self.base_url, &format!("newsLLM/{}", source));

        let response = match self.client.post(&url).json(document).send().await {
            Ok(response) => response,
            Err(e) => {
                let err = ClientError::transport(&url, e);
                warn!(source, article_id = %document.article_id, "publish failed: {}", err);
                return PublishOutcome::Unreachable(err);
            }
        };

        let status = response.status();
        if status == StatusCode::CREATED {
            debug!(
                source,
                article_id = %document.article_id,
                rag = document.rag.label(),
                "document stored"
            );
            return PublishOutcome::Created;
        }

        let body = response.text().await.unwrap_or_default();
        warn!(
            source,
            article_id = %document.article_id,
            rag = document.rag.label(),
            "storage API returned {}: {}",
            status,
            body
        );
        PublishOutcome::Rejected { status, body }
    }
}
