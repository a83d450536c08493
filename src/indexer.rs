use std::collections::HashSet;

use anyhow::{Context, Result};
use tracing::{info, warn};

use crate::io::{collection_name, Collection};
use crate::models::{Article, DateWindow};
use crate::pipeline::PipelineClients;
use crate::stages::sanitize;

/// What indexing one source added to its collection
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct IndexReport {
    pub source: String,
    pub days: usize,
    pub articles_seen: usize,
    pub added: usize,
    /// Descriptions already indexed earlier in this run
    pub duplicates: usize,
    /// Days whose fetch, embedding or insert failed
    pub failed_days: usize,
}

/// Populates per-source vector collections with sanitized article bodies
pub struct Indexer {
    clients: PipelineClients,
}

impl Indexer {
    pub fn new(clients: PipelineClients) -> Self {
        Self { clients }
    }

    /// Index every day of `window` for one source.
    ///
    /// Bodies already seen for this source in this run are not added again.
    pub async fn index_source(&self, source: &str, window: &DateWindow) -> Result<IndexReport> {
        let name = collection_name(source);
        let collection = self
            .clients
            .chroma
            .get_or_create_collection(&name)
            .await
            .with_context(|| format!("Failed to open collection {}", name))?;

        let mut seen = HashSet::new();
        let mut report = IndexReport {
            source: source.to_string(),
            ..Default::default()
        };

        for day in window.days() {
            report.days += 1;
            let batch = match self
                .clients
                .articles
                .fetch_articles(source, day, window.start_hour, 0, window.end_hour, 0)
                .await
            {
                Ok(batch) => batch,
                Err(e) => {
                    warn!(source, %day, "article fetch failed: {}", e);
                    report.failed_days += 1;
                    continue;
                }
            };
            report.articles_seen += batch.items.len();

            let (fresh, duplicates) = unique_bodies(&batch.items, &seen);
            report.duplicates += duplicates;
            if fresh.is_empty() {
                continue;
            }

            // Only bodies that reached the collection count as seen
            match self.add_documents(&collection, &fresh).await {
                Ok(()) => {
                    report.added += fresh.len();
                    seen.extend(fresh);
                }
                Err(e) => {
                    warn!(source, %day, "indexing failed: {:#}", e);
                    report.failed_days += 1;
                }
            }
        }

        info!(
            source,
            added = report.added,
            duplicates = report.duplicates,
            "Indexed source"
        );
        Ok(report)
    }

    async fn add_documents(&self, collection: &Collection, documents: &[String]) -> Result<()> {
        let embeddings = self
            .clients
            .generator
            .embed(&self.clients.embedding_model, documents)
            .await
            .context("Failed to embed documents")?;
        let ids: Vec<String> = documents
            .iter()
            .map(|_| uuid::Uuid::new_v4().to_string())
            .collect();
        self.clients
            .chroma
            .add(collection, &ids, &embeddings, documents)
            .await
            .context("Failed to add documents")?;
        Ok(())
    }
}

/// Sanitized, non-empty bodies neither in `seen` nor repeated within `articles`,
/// plus how many were repeats
fn unique_bodies(articles: &[Article], seen: &HashSet<String>) -> (Vec<String>, usize) {
    let mut batch = HashSet::new();
    let mut fresh = Vec::new();
    let mut duplicates = 0;
    for body in articles.iter().filter_map(Article::body).map(sanitize) {
        if body.is_empty() {
            continue;
        }
        if seen.contains(&body) || !batch.insert(body.clone()) {
            duplicates += 1;
        } else {
            fresh.push(body);
        }
    }
    (fresh, duplicates)
}
