use anyhow::{Context, Result};
use tracing::warn;

use crate::io::{ArticleApiClient, ChromaClient, Collection};
use crate::models::DateWindow;

/// A vector collection and its document count, if it could be read
#[derive(Debug, Clone)]
pub struct CollectionStat {
    pub collection: Collection,
    pub documents: Option<usize>,
}

/// List every collection of the vector index with its document count
pub async fn collection_stats(chroma: &ChromaClient) -> Result<Vec<CollectionStat>> {
    let collections = chroma
        .list_collections()
        .await
        .context("Failed to list vector collections")?;

    let mut stats = Vec::with_capacity(collections.len());
    for collection in collections {
        let documents = match chroma.count(&collection).await {
            Ok(n) => Some(n),
            Err(e) => {
                warn!(collection = %collection.name, "count failed: {}", e);
                None
            }
        };
        stats.push(CollectionStat {
            collection,
            documents,
        });
    }
    Ok(stats)
}

/// Items stored by one source over a window
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct SourceCount {
    pub source: String,
    pub total_items: usize,
    /// Days whose count could not be read
    pub failed_days: usize,
}

/// Sum the article store's per-day item counts for each source
pub async fn count_items(
    articles: &ArticleApiClient,
    sources: &[String],
    window: &DateWindow,
) -> Vec<SourceCount> {
    let mut counts: Vec<SourceCount> = sources
        .iter()
        .map(|s| SourceCount {
            source: s.clone(),
            total_items: 0,
            failed_days: 0,
        })
        .collect();

    for day in window.days() {
        for entry in counts.iter_mut() {
            match articles.count_items(&entry.source, day).await {
                Ok(n) => entry.total_items += n,
                Err(e) => {
                    warn!(source = %entry.source, %day, "count failed: {}", e);
                    entry.failed_days += 1;
                }
            }
        }
    }
    counts
}
