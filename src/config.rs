use std::time::Duration;

use reqwest::Client;

use crate::io::ClientError;

pub const DEFAULT_NEWS_API_URL: &str = "http://localhost:5010";
pub const DEFAULT_CHROMA_URL: &str = "http://localhost:8001";
pub const DEFAULT_OLLAMA_URL: &str = "http://localhost:11434";
pub const DEFAULT_STORAGE_API_URL: &str = "http://localhost:6002";
/// Multilingual embedder; the article corpus is mostly Spanish
pub const DEFAULT_EMBEDDING_MODEL: &str = "bge-m3";
pub const DEFAULT_REQUEST_TIMEOUT_SECS: u64 = 300;
pub const DEFAULT_TOP_K: usize = 10;

/// Addresses of the external services the pipeline talks to
#[derive(Debug, Clone)]
pub struct EndpointConfig {
    /// Article store API
    pub news_api_url: String,
    /// Vector index service
    pub chroma_url: String,
    /// Generation and embedding backend
    pub ollama_url: String,
    /// Synthetic document storage API
    pub storage_api_url: String,
    /// Model used to embed headlines and indexed descriptions
    pub embedding_model: String,
    /// Upper bound for any single HTTP call
    pub request_timeout: Duration,
}

impl Default for EndpointConfig {
    fn default() -> Self {
        Self {
            news_api_url: DEFAULT_NEWS_API_URL.to_string(),
            chroma_url: DEFAULT_CHROMA_URL.to_string(),
            ollama_url: DEFAULT_OLLAMA_URL.to_string(),
            storage_api_url: DEFAULT_STORAGE_API_URL.to_string(),
            embedding_model: DEFAULT_EMBEDDING_MODEL.to_string(),
            request_timeout: Duration::from_secs(DEFAULT_REQUEST_TIMEOUT_SECS),
        }
    }
}

impl EndpointConfig {
    /// HTTP client shared by all service clients
    pub fn http_client(&self) -> Result<Client, ClientError> {
        Client::builder()
            .user_agent(concat!("newsynth/", env!("CARGO_PKG_VERSION")))
            .timeout(self.request_timeout)
            .build()
            .map_err(|e| ClientError::transport("<client builder>", e))
    }
}

/// Parameters of one generation run
#[derive(Debug, Clone)]
pub struct RunConfig {
    /// Prefix of the backend model names, e.g. `QWEN_7B_`
    pub model_prefix: String,
    /// Numeric identifier of the LLM recorded on every document
    pub llm_id: u32,
    /// Number of context documents retrieved per headline
    pub top_k: usize,
}

impl Default for RunConfig {
    fn default() -> Self {
        Self {
            model_prefix: "QWEN_7B_".to_string(),
            llm_id: 2,
            top_k: DEFAULT_TOP_K,
        }
    }
}

/// Join a base URL and a path without doubling slashes
pub(crate) fn join_url(base: &str, path: &str) -> String {
    format!(
        "{}/{}",
        base.trim_end_matches('/'),
        path.trim_start_matches('/')
    )
}
