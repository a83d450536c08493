pub mod config;
pub mod indexer;
pub mod inspect;
pub mod io;
pub mod llm;
pub mod models;
pub mod pipeline;
pub mod stages;

pub use config::{EndpointConfig, RunConfig};
pub use indexer::{IndexReport, Indexer};
pub use io::{ArticleApiClient, ChromaClient, ClientError, PublishOutcome, StorageClient};
pub use llm::{GenerationOutcome, ModelNames, OllamaClient};
pub use models::{
    Article, DateWindow, Feature, RagFlag, RunStatistics, StatsSnapshot, SyntheticDocument,
};
pub use pipeline::{GenerationTask, Orchestrator, PipelineClients, RunSummary, TaskReport};
pub use stages::{sanitize, ContextRetriever};
