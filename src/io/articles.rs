use chrono::NaiveDate;
use reqwest::Client;
use tracing::debug;

use super::error::{decode_json, ensure_success, ClientError};
use crate::config::join_url;
use crate::models::{format_date, ArticleBatch, SourceCatalogue};

/// Client for the article store API
#[derive(Debug, Clone)]
pub struct ArticleApiClient {
    client: Client,
    base_url: String,
}

impl ArticleApiClient {
    pub fn new(client: Client, base_url: impl Into<String>) -> Self {
        Self {
            client,
            base_url: base_url.into(),
        }
    }

    /// List the sources known to the store
    pub async fn list_sources(&self) -> Result<Vec<String>, ClientError> {
        let url = join_url(&self.base_url, "newspapers");
        let response = self
            .client
            .get(&url)
            .send()
            .await
            .map_err(|e| ClientError::transport(&url, e))?;
        let response = ensure_success(&url, response).await?;
        let catalogue: SourceCatalogue = decode_json(&url, response).await?;
        Ok(catalogue.sources)
    }

    /// Fetch the articles a source stored on `date` between the given times
    pub async fn fetch_articles(
        &self,
        source: &str,
        date: NaiveDate,
        start_hour: u32,
        start_minute: u32,
        end_hour: u32,
        end_minute: u32,
    ) -> Result<ArticleBatch, ClientError> {
        let url = join_url(&self.base_url, &format!("news/{}", source));
        let date = format_date(date);
        debug!(source, %date, start_hour, end_hour, "fetching articles");

        let response = self
            .client
            .get(&url)
            .query(&[
                ("date", date),
                ("shour", start_hour.to_string()),
                ("sminute", format!("{:02}", start_minute)),
                ("ehour", end_hour.to_string()),
                ("eminute", format!("{:02}", end_minute)),
            ])
            .send()
            .await
            .map_err(|e| ClientError::transport(&url, e))?;
        let response = ensure_success(&url, response).await?;
        decode_json(&url, response).await
    }

    /// Number of items a source stored over a whole day
    pub async fn count_items(&self, source: &str, date: NaiveDate) -> Result<usize, ClientError> {
        let batch = self.fetch_articles(source, date, 0, 0, 23, 0).await?;
        Ok(batch.total())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use wiremock::matchers::{method, path, query_param};
    use wiremock::{Mock, MockServer, ResponseTemplate};

    #[tokio::test]
    async fn test_list_sources() {
        let server = MockServer::start().await;
        Mock::given(method("GET"))
            .and(path("/newspapers"))
            .respond_with(
                ResponseTemplate::new(200)
                    .set_body_json(serde_json::json!({"newspapers": ["ABC", "El_Pais"]})),
            )
            .mount(&server)
            .await;

        let client = ArticleApiClient::new(Client::new(), server.uri());
        let sources = client.list_sources().await.unwrap();

        assert_eq!(sources, vec!["ABC", "El_Pais"]);
    }

    #[tokio::test]
    async fn test_fetch_articles_sends_window_params() {
        let server = MockServer::start().await;
        Mock::given(method("GET"))
            .and(path("/news/ABC"))
            .and(query_param("date", "05-11-2025"))
            .and(query_param("shour", "0"))
            .and(query_param("sminute", "00"))
            .and(query_param("ehour", "23"))
            .and(query_param("eminute", "00"))
            .respond_with(ResponseTemplate::new(200).set_body_json(serde_json::json!({
                "total_items": 1,
                "items": [{"_id": "n1", "headline": "H", "description": "D"}]
            })))
            .expect(1)
            .mount(&server)
            .await;

        let client = ArticleApiClient::new(Client::new(), server.uri());
        let date = NaiveDate::from_ymd_opt(2025, 11, 5).unwrap();
        let batch = client.fetch_articles("ABC", date, 0, 0, 23, 0).await.unwrap();

        assert_eq!(batch.items.len(), 1);
        assert_eq!(batch.items[0].id, "n1");
    }

    #[tokio::test]
    async fn test_fetch_articles_http_error() {
        let server = MockServer::start().await;
        Mock::given(method("GET"))
            .respond_with(ResponseTemplate::new(500).set_body_string("boom"))
            .mount(&server)
            .await;

        let client = ArticleApiClient::new(Client::new(), server.uri());
        let date = NaiveDate::from_ymd_opt(2025, 11, 5).unwrap();
        let err = client
            .fetch_articles("ABC", date, 0, 0, 23, 0)
            .await
            .unwrap_err();

        match err {
            ClientError::Status { status, body, .. } => {
                assert_eq!(status.as_u16(), 500);
                assert_eq!(body, "boom");
            }
            other => panic!("unexpected error: {other}"),
        }
    }

    #[tokio::test]
    async fn test_count_items_uses_reported_total() {
        let server = MockServer::start().await;
        Mock::given(method("GET"))
            .and(path("/news/ABC"))
            .respond_with(
                ResponseTemplate::new(200)
                    .set_body_json(serde_json::json!({"total_items": 42, "items": []})),
            )
            .mount(&server)
            .await;

        let client = ArticleApiClient::new(Client::new(), server.uri());
        let date = NaiveDate::from_ymd_opt(2025, 9, 26).unwrap();
        assert_eq!(client.count_items("ABC", date).await.unwrap(), 42);
    }
}
