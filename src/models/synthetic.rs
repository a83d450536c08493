use serde::{Deserialize, Serialize};

use super::Feature;

/// Whether a document was conditioned on retrieved context
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum RagFlag {
    NoRag,
    Rag,
}

impl RagFlag {
    pub fn as_u8(self) -> u8 {
        match self {
            RagFlag::NoRag => 0,
            RagFlag::Rag => 1,
        }
    }

    pub fn label(self) -> &'static str {
        match self {
            RagFlag::NoRag => "NO-RAG",
            RagFlag::Rag => "RAG",
        }
    }
}

impl Serialize for RagFlag {
    fn serialize<S: serde::Serializer>(&self, serializer: S) -> Result<S::Ok, S::Error> {
        serializer.serialize_u8(self.as_u8())
    }
}

impl<'de> Deserialize<'de> for RagFlag {
    fn deserialize<D: serde::Deserializer<'de>>(deserializer: D) -> Result<Self, D::Error> {
        match u8::deserialize(deserializer)? {
            0 => Ok(RagFlag::NoRag),
            1 => Ok(RagFlag::Rag),
            other => Err(serde::de::Error::custom(format!(
                "RAG flag must be 0 or 1, got {}",
                other
            ))),
        }
    }
}

/// A generated description plus its provenance, as persisted by the storage API
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct SyntheticDocument {
    #[serde(rename = "RAG")]
    pub rag: RagFlag,
    /// Id of the source article
    #[serde(rename = "id_news")]
    pub article_id: String,
    /// Unix seconds at generation time
    #[serde(rename = "timestamp_llm")]
    pub generated_at: i64,
    #[serde(rename = "id_feature")]
    pub feature_id: u32,
    #[serde(rename = "id_llm")]
    pub model_id: u32,
    pub synthetic_description: String,
    /// Retrieved context texts (RAG documents only)
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub context: Option<Vec<String>>,
}

impl SyntheticDocument {
    pub fn no_rag(article_id: &str, feature: Feature, model_id: u32, description: String) -> Self {
        Self {
            rag: RagFlag::NoRag,
            article_id: article_id.to_string(),
            generated_at: chrono::Utc::now().timestamp(),
            feature_id: feature.0,
            model_id,
            synthetic_description: description,
            context: None,
        }
    }

    pub fn rag(
        article_id: &str,
        feature: Feature,
        model_id: u32,
        description: String,
        context: Vec<String>,
    ) -> Self {
        Self {
            rag: RagFlag::Rag,
            context: Some(context),
            ..Self::no_rag(article_id, feature, model_id, description)
        }
    }
}
