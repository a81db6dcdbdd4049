use reqwest::{Method, RequestBuilder, Response};
use serde::de::DeserializeOwned;
use serde::Deserialize;
use std::sync::Arc;

pub type Result<T> = std::result::Result<T, ApiError>;

/// Returns the current bearer credential. Injected rather than hardcoded so
/// that real auth can be wired in without touching the call sites.
pub type TokenProvider = Arc<dyn Fn() -> String + Send + Sync>;

#[derive(Debug, Clone, thiserror::Error)]
pub enum ApiError {
    #[error("server returned {status}")]
    Status { status: u16, detail: Option<String> },

    #[error("request failed: {0}")]
    Transport(String),
}

impl ApiError {
    pub fn status(&self) -> Option<u16> {
        match self {
            ApiError::Status { status, .. } => Some(*status),
            ApiError::Transport(_) => None,
        }
    }
}

/// Error body the server attaches to 4xx responses.
#[derive(Deserialize)]
struct ErrorBody {
    detail: String,
}

#[derive(Clone)]
pub struct ApiClient {
    http: reqwest::Client,
    base_url: String,
    token: TokenProvider,
}

impl ApiClient {
    pub fn new(base_url: impl Into<String>, token: TokenProvider) -> Self {
        Self {
            http: reqwest::Client::new(),
            base_url: base_url.into(),
            token,
        }
    }

    pub fn with_static_token(base_url: impl Into<String>, token: impl Into<String>) -> Self {
        let token = token.into();
        Self::new(base_url, Arc::new(move || token.clone()))
    }

    pub fn base_url(&self) -> &str {
        &self.base_url
    }

    /// Request builder with the bearer credential applied. Components own
    /// their endpoints and wire types; this stays generic.
    pub fn request(&self, method: Method, path: &str) -> RequestBuilder {
        self.http
            .request(method, format!("{}{}", self.base_url, path))
            .bearer_auth((self.token)())
    }

    pub async fn get_json<T: DeserializeOwned>(&self, path: &str) -> Result<T> {
        let response = self.send(self.request(Method::GET, path)).await?;
        Self::decode(response).await
    }

    pub async fn delete(&self, path: &str) -> Result<()> {
        let response = self.send(self.request(Method::DELETE, path)).await?;
        if response.status().is_success() {
            Ok(())
        } else {
            Err(Self::status_error(response).await)
        }
    }

    async fn send(&self, request: RequestBuilder) -> Result<Response> {
        request
            .send()
            .await
            .map_err(|e| ApiError::Transport(e.to_string()))
    }

    async fn decode<T: DeserializeOwned>(response: Response) -> Result<T> {
        if !response.status().is_success() {
            return Err(Self::status_error(response).await);
        }
        response
            .json::<T>()
            .await
            .map_err(|e| ApiError::Transport(format!("invalid response body: {e}")))
    }

    /// Pulls the `{detail}` message out of an error response when present.
    pub async fn status_error(response: Response) -> ApiError {
        let status = response.status().as_u16();
        let detail = response
            .json::<ErrorBody>()
            .await
            .ok()
            .map(|body| body.detail);
        ApiError::Status { status, detail }
    }
}
