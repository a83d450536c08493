use futures::StreamExt;
use reqwest::Client;
use serde::{Deserialize, Serialize};
use tracing::debug;

use super::parsing::FragmentAssembler;
use crate::config::join_url;
use crate::io::error::{decode_json, ensure_success};
use crate::io::ClientError;

#[derive(Debug, Serialize)]
struct GenerateRequest<'a> {
    model: &'a str,
    prompt: &'a str,
    stream: bool,
}

#[derive(Debug, Serialize)]
struct EmbedRequest<'a> {
    model: &'a str,
    input: &'a [String],
}

#[derive(Debug, Deserialize)]
struct EmbedResponse {
    embeddings: Vec<Vec<f32>>,
}

/// Client for an Ollama server: streamed generation and embeddings
#[derive(Debug, Clone)]
pub struct OllamaClient {
    client: Client,
    base_url: String,
}

impl OllamaClient {
    pub fn new(client: Client, base_url: impl Into<String>) -> Self {
        Self {
            client,
            base_url: base_url.into(),
        }
    }

    /// Run a generation and return the text reassembled from the token stream
    pub async fn generate(&self, model: &str, prompt: &str) -> Result<String, ClientError> {
        let url = join_url(&self.base_url, "api/generate");
        let response = self
            .client
            .post(&url)
            .json(&GenerateRequest {
                model,
                prompt,
                stream: true,
            })
            .send()
            .await
            .map_err(|e| ClientError::transport(&url, e))?;
        let response = ensure_success(&url, response).await?;

        let mut assembler = FragmentAssembler::new();
        let mut stream = response.bytes_stream();
        while let Some(chunk) = stream.next().await {
            let chunk = chunk.map_err(|e| ClientError::transport(&url, e))?;
            if assembler.push_chunk(&chunk) {
                break;
            }
        }

        if assembler.skipped() > 0 {
            debug!(model, skipped = assembler.skipped(), "ignored non-fragment lines");
        }
        Ok(assembler.finish())
    }

    /// Embed each input text
    pub async fn embed(&self, model: &str, input: &[String]) -> Result<Vec<Vec<f32>>, ClientError> {
        let url = join_url(&self.base_url, "api/embed");
        let response = self
            .client
            .post(&url)
            .json(&EmbedRequest { model, input })
            .send()
            .await
            .map_err(|e| ClientError::transport(&url, e))?;
        let response = ensure_success(&url, response).await?;
        let body: EmbedResponse = decode_json(&url, response).await?;

        if body.embeddings.len() != input.len() {
            return Err(ClientError::decode(
                &url,
                format!(
                    "expected {} embeddings, got {}",
                    input.len(),
                    body.embeddings.len()
                ),
            ));
        }
        Ok(body.embeddings)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use wiremock::matchers::{body_partial_json, method, path};
    use wiremock::{Mock, MockServer, ResponseTemplate};

    #[tokio::test]
    async fn test_generate_reassembles_stream() {
        let server = MockServer::start().await;
        let body = concat!(
            "{\"model\":\"m\",\"response\":\"{\\\"synthetic_\",\"done\":false}\n",
            "garbage line\n",
            "{\"model\":\"m\",\"response\":\"description\\\":\\\"ok\\\"}\",\"done\":false}\n",
            "{\"model\":\"m\",\"response\":\"\",\"done\":true}\n",
        );
        Mock::given(method("POST"))
            .and(path("/api/generate"))
            .and(body_partial_json(serde_json::json!({"model": "m", "prompt": "p"})))
            .respond_with(ResponseTemplate::new(200).set_body_string(body))
            .mount(&server)
            .await;

        let client = OllamaClient::new(Client::new(), server.uri());
        let text = client.generate("m", "p").await.unwrap();

        assert_eq!(text, r#"{"synthetic_description":"ok"}"#);
    }

    #[tokio::test]
    async fn test_generate_http_error() {
        let server = MockServer::start().await;
        Mock::given(method("POST"))
            .respond_with(ResponseTemplate::new(404).set_body_string("model not found"))
            .mount(&server)
            .await;

        let client = OllamaClient::new(Client::new(), server.uri());
        let err = client.generate("missing", "p").await.unwrap_err();

        assert!(matches!(err, ClientError::Status { .. }));
    }

    #[tokio::test]
    async fn test_embed() {
        let server = MockServer::start().await;
        Mock::given(method("POST"))
            .and(path("/api/embed"))
            .respond_with(
                ResponseTemplate::new(200)
                    .set_body_json(serde_json::json!({"embeddings": [[0.5, 0.25]]})),
            )
            .mount(&server)
            .await;

        let client = OllamaClient::new(Client::new(), server.uri());
        let vectors = client.embed("e", &["text".to_string()]).await.unwrap();

        assert_eq!(vectors, vec![vec![0.5, 0.25]]);
    }

    #[tokio::test]
    async fn test_embed_count_mismatch() {
        let server = MockServer::start().await;
        Mock::given(method("POST"))
            .and(path("/api/embed"))
            .respond_with(
                ResponseTemplate::new(200).set_body_json(serde_json::json!({"embeddings": []})),
            )
            .mount(&server)
            .await;

        let client = OllamaClient::new(Client::new(), server.uri());
        let err = client.embed("e", &["text".to_string()]).await.unwrap_err();

        assert!(matches!(err, ClientError::Decode { .. }));
    }
}
