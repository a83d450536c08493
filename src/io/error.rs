use reqwest::{Response, StatusCode};
use thiserror::Error;

/// Failure talking to one of the external HTTP services
#[derive(Debug, Error)]
pub enum ClientError {
    #[error("request to {url} failed: {source}")]
    Transport {
        url: String,
        #[source]
        source: reqwest::Error,
    },

    #[error("{url} returned {status}: {body}")]
    Status {
        url: String,
        status: StatusCode,
        body: String,
    },

    #[error("could not decode response from {url}: {message}")]
    Decode { url: String, message: String },
}

impl ClientError {
    pub(crate) fn transport(url: &str, source: reqwest::Error) -> Self {
        Self::Transport {
            url: url.to_string(),
            source,
        }
    }

    pub(crate) fn decode(url: &str, message: impl ToString) -> Self {
        Self::Decode {
            url: url.to_string(),
            message: message.to_string(),
        }
    }
}

/// Turn a non-2xx response into `ClientError::Status`, keeping the body for logs
pub(crate) async fn ensure_success(url: &str, response: Response) -> Result<Response, ClientError> {
    let status = response.status();
    if status.is_success() {
        return Ok(response);
    }
    let body = response.text().await.unwrap_or_default();
    Err(ClientError::Status {
        url: url.to_string(),
        status,
        body,
    })
}

/// Decode a JSON body, mapping failures to `ClientError::Decode`
pub(crate) async fn decode_json<T: serde::de::DeserializeOwned>(
    url: &str,
    response: Response,
) -> Result<T, ClientError> {
    response
        .json::<T>()
        .await
        .map_err(|e| ClientError::decode(url, e))
}
