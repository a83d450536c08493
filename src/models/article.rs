use serde::Deserialize;

/// A news article as served by the article store API
#[derive(Debug, Clone, Deserialize)]
pub struct Article {
    /// Store identifier (stringified document id)
    #[serde(rename = "_id")]
    pub id: String,
    /// Article headline
    #[serde(default)]
    pub headline: String,
    /// Article body, often carrying markup; absent or null for some feeds
    #[serde(default)]
    pub description: Option<String>,
    /// Upstream ingestion timestamp
    #[serde(default)]
    pub date_stored: Option<String>,
}

impl Article {
    /// The description if it carries any text at all
    pub fn body(&self) -> Option<&str> {
        self.description.as_deref().filter(|d| !d.is_empty())
    }
}

/// One day's worth of articles for a source
#[derive(Debug, Clone, Default, Deserialize)]
pub struct ArticleBatch {
    #[serde(default)]
    pub items: Vec<Article>,
    /// Item count reported by the API
    #[serde(default)]
    pub total_items: Option<usize>,
}

impl ArticleBatch {
    /// Reported count, falling back to the number of returned items
    pub fn total(&self) -> usize {
        self.total_items.unwrap_or(self.items.len())
    }
}

/// Catalogue of sources known to the article store
#[derive(Debug, Clone, Default, Deserialize)]
pub struct SourceCatalogue {
    #[serde(rename = "newspapers", default)]
    pub sources: Vec<String>,
}
