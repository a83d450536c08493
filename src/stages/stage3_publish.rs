use crate::io::{PublishOutcome, StorageClient};
use crate::models::{RunStatistics, SyntheticDocument};

/// Publish one document and account for it.
///
/// A completed call counts as generated whatever the status; only a 201
/// counts as persisted. Unreachable storage counts as neither.
pub async fn publish_document(
    storage: &StorageClient,
    stats: &RunStatistics,
    source: &str,
    document: &SyntheticDocument,
) -> PublishOutcome {
    let outcome = storage.publish(source, document).await;
    if outcome.completed() {
        stats.record_publish(document.rag, outcome.is_created());
    }
    outcome
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::models::Feature;
    use reqwest::Client;
    use wiremock::matchers::method;
    use wiremock::{Mock, MockServer, ResponseTemplate};

    #[tokio::test]
    async fn test_rejected_publish_still_counts_as_generated() {
        let server = MockServer::start().await;
        Mock::given(method("POST"))
            .respond_with(ResponseTemplate::new(500))
            .mount(&server)
            .await;

        let storage = StorageClient::new(Client::new(), server.uri());
        let stats = RunStatistics::new();
        let doc = SyntheticDocument::rag("n1", Feature(1), 2, "d".to_string(), vec![]);

        let outcome = publish_document(&storage, &stats, "ABC", &doc).await;

        assert!(!outcome.is_created());
        let snap = stats.snapshot();
        assert_eq!(snap.rag_generated, 1);
        assert_eq!(snap.rag_persisted, 0);
    }

    #[tokio::test]
    async fn test_unreachable_publish_is_not_counted() {
        let storage = StorageClient::new(Client::new(), "http://127.0.0.1:9");
        let stats = RunStatistics::new();
        let doc = SyntheticDocument::no_rag("n1", Feature(1), 2, "d".to_string());

        publish_document(&storage, &stats, "ABC", &doc).await;

        assert_eq!(stats.snapshot().no_rag_generated, 0);
    }
}
