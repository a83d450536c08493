pub mod orchestrator;
pub mod task;

pub use orchestrator::*;
pub use task::*;

use crate::config::EndpointConfig;
use crate::io::{ArticleApiClient, ChromaClient, ClientError, StorageClient};
use crate::llm::OllamaClient;

/// Service clients shared by every task of a run
#[derive(Debug, Clone)]
pub struct PipelineClients {
    pub articles: ArticleApiClient,
    pub chroma: ChromaClient,
    pub generator: OllamaClient,
    pub storage: StorageClient,
    pub embedding_model: String,
}

impl PipelineClients {
    pub fn from_config(config: &EndpointConfig) -> Result<Self, ClientError> {
        let http = config.http_client()?;
        Ok(Self {
            articles: ArticleApiClient::new(http.clone(), &config.news_api_url),
            chroma: ChromaClient::new(http.clone(), &config.chroma_url),
            generator: OllamaClient::new(http.clone(), &config.ollama_url),
            storage: StorageClient::new(http, &config.storage_api_url),
            embedding_model: config.embedding_model.clone(),
        })
    }
}
