use std::sync::Arc;

use anyhow::{Context, Result};
use tokio::task::JoinSet;
use tokio_util::sync::CancellationToken;
use tracing::{info, warn};

use super::{GenerationTask, PipelineClients, TaskReport};
use crate::config::RunConfig;
use crate::llm::ModelNames;
use crate::models::{DateWindow, Feature, RunStatistics, StatsSnapshot};
use crate::stages::ContextRetriever;

/// Outcome of a whole run
#[derive(Debug, Clone)]
pub struct RunSummary {
    pub sources_processed: usize,
    pub tasks: Vec<TaskReport>,
    pub stats: StatsSnapshot,
    pub cancelled: bool,
}

/// Drives generation source by source, one concurrent task per feature
pub struct Orchestrator {
    clients: PipelineClients,
    run: RunConfig,
    features: Vec<Feature>,
    window: DateWindow,
    stats: RunStatistics,
    cancel: CancellationToken,
}

impl Orchestrator {
    pub fn new(
        clients: PipelineClients,
        run: RunConfig,
        features: Vec<Feature>,
        window: DateWindow,
    ) -> Self {
        Self {
            clients,
            run,
            features,
            window,
            stats: RunStatistics::new(),
            cancel: CancellationToken::new(),
        }
    }

    /// Use an externally owned cancellation token
    pub fn with_cancellation(mut self, cancel: CancellationToken) -> Self {
        self.cancel = cancel;
        self
    }

    /// Handle to the counters of this run
    pub fn stats(&self) -> RunStatistics {
        self.stats.clone()
    }

    pub fn cancellation_token(&self) -> CancellationToken {
        self.cancel.clone()
    }

    /// Enumerate sources from the article store and process each of them
    pub async fn run(&self) -> Result<RunSummary> {
        let sources = self
            .clients
            .articles
            .list_sources()
            .await
            .context("Failed to list sources from the article store")?;
        info!("Found {} sources", sources.len());
        Ok(self.run_sources(&sources).await)
    }

    /// Process the given sources one after another
    pub async fn run_sources(&self, sources: &[String]) -> RunSummary {
        let mut tasks = Vec::new();
        let mut sources_processed = 0;

        for source in sources {
            if self.cancel.is_cancelled() {
                warn!("Run cancelled, {} sources left", sources.len() - sources_processed);
                break;
            }
            tasks.extend(self.run_source(source).await);
            sources_processed += 1;
        }

        let stats = self.stats.snapshot();
        info!(
            errors = stats.errors,
            rag = stats.rag_generated,
            no_rag = stats.no_rag_generated,
            "Run complete"
        );

        RunSummary {
            sources_processed,
            tasks,
            stats,
            cancelled: self.cancel.is_cancelled(),
        }
    }

    /// Start one task per feature for `source` and wait for all of them
    pub async fn run_source(&self, source: &str) -> Vec<TaskReport> {
        let retriever = Arc::new(
            ContextRetriever::for_source(
                self.clients.chroma.clone(),
                self.clients.generator.clone(),
                self.clients.embedding_model.clone(),
                source,
                self.run.top_k,
            )
            .await,
        );

        let mut set = JoinSet::new();
        for &feature in &self.features {
            info!(source, %feature, "Launching generation task");
            let task = GenerationTask::new(
                source,
                feature,
                self.window,
                ModelNames::for_feature(&self.run.model_prefix, feature),
                self.run.llm_id,
                self.clients.clone(),
                Arc::clone(&retriever),
                self.stats.clone(),
                self.cancel.child_token(),
            );
            set.spawn(task.run());
        }

        let mut reports = Vec::with_capacity(self.features.len());
        while let Some(joined) = set.join_next().await {
            match joined {
                Ok(report) => reports.push(report),
                Err(e) => warn!(source, "generation task aborted: {}", e),
            }
        }
        reports.sort_by_key(|r| r.feature);
        reports
    }
}
