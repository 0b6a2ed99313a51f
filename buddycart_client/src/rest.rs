use std::sync::Arc;

use buddycart_common::Secret;
use log::*;
use reqwest::{
    header::{HeaderMap, HeaderValue},
    Client,
    Method,
    StatusCode,
};
use serde::{de::DeserializeOwned, Serialize};
use tokio::sync::RwLock;
use url::Url;

use crate::{config::ClientConfig, errors::message_from_body, ClientError};

/// Thin wrapper over reqwest that owns the base URL and the bearer token. The token slot is shared between clones,
/// so signing in through one handle authenticates every API built over the same client.
#[derive(Debug, Clone)]
pub struct RestClient {
    client: Client,
    base_url: Url,
    token: Arc<RwLock<Option<Secret<String>>>>,
}

impl RestClient {
    pub fn new(config: &ClientConfig) -> Result<Self, ClientError> {
        let base_url = Url::parse(&config.server)
            .map_err(|e| ClientError::Initialization(format!("Invalid server URL '{}': {e}", config.server)))?;
        let mut headers = HeaderMap::with_capacity(2);
        headers.insert("Accept", HeaderValue::from_static("application/json"));
        headers.insert("Content-Type", HeaderValue::from_static("application/json"));
        let client = Client::builder()
            .user_agent("BuddyCart Client")
            .default_headers(headers)
            .timeout(config.request_timeout)
            .build()
            .map_err(|e| ClientError::Initialization(e.to_string()))?;
        Ok(Self { client, base_url, token: Arc::new(RwLock::new(None)) })
    }

    /// Replaces the bearer token used on every subsequent request. `None` makes the client anonymous again.
    pub async fn set_token(&self, token: Option<Secret<String>>) {
        *self.token.write().await = token;
    }

    pub async fn has_token(&self) -> bool {
        self.token.read().await.is_some()
    }

    pub fn url(&self, path: &str) -> Result<Url, ClientError> {
        self.base_url.join(path).map_err(|e| ClientError::Initialization(format!("Failed to join URL: {e}")))
    }

    /// Sends a request and maps the response onto the error taxonomy: 401 becomes [`ClientError::Auth`], 404
    /// [`ClientError::NotFound`], any other non-success [`ClientError::Rejection`] with the backend's message, and
    /// transport failures [`ClientError::Network`].
    pub async fn request<T: DeserializeOwned, B: Serialize>(
        &self,
        method: Method,
        path: &str,
        body: Option<B>,
    ) -> Result<T, ClientError> {
        let url = self.url(path)?;
        trace!("Sending {method} {url}");
        let mut req = self.client.request(method, url);
        if let Some(token) = self.token.read().await.as_ref() {
            req = req.bearer_auth(token.reveal());
        }
        if let Some(body) = body {
            req = req.json(&body);
        }
        let response = req.send().await.map_err(|e| ClientError::Network(e.to_string()))?;
        let status = response.status();
        if status.is_success() {
            trace!("{path} responded {status}");
            response.json::<T>().await.map_err(|e| ClientError::JsonError(e.to_string()))
        } else {
            let body = response.text().await.map_err(|e| ClientError::Network(e.to_string()))?;
            Err(error_for_response(status, &body))
        }
    }

    pub async fn get<T: DeserializeOwned>(&self, path: &str) -> Result<T, ClientError> {
        self.request::<T, ()>(Method::GET, path, None).await
    }

    pub async fn post<T: DeserializeOwned, B: Serialize>(&self, path: &str, body: &B) -> Result<T, ClientError> {
        self.request(Method::POST, path, Some(body)).await
    }

    /// POST with an empty body, for endpoints that take all their input from the path.
    pub async fn post_empty<T: DeserializeOwned>(&self, path: &str) -> Result<T, ClientError> {
        self.request::<T, ()>(Method::POST, path, None).await
    }

    pub async fn put<T: DeserializeOwned, B: Serialize>(&self, path: &str, body: &B) -> Result<T, ClientError> {
        self.request(Method::PUT, path, Some(body)).await
    }

    /// PUT with an empty body, for endpoints that take all their input from the path or query string.
    pub async fn put_empty<T: DeserializeOwned>(&self, path: &str) -> Result<T, ClientError> {
        self.request::<T, ()>(Method::PUT, path, None).await
    }

    pub async fn delete<T: DeserializeOwned>(&self, path: &str) -> Result<T, ClientError> {
        self.request::<T, ()>(Method::DELETE, path, None).await
    }
}

fn error_for_response(status: StatusCode, body: &str) -> ClientError {
    let message = message_from_body(status.as_u16(), body);
    match status {
        StatusCode::UNAUTHORIZED => ClientError::Auth(message),
        StatusCode::NOT_FOUND => ClientError::NotFound(message),
        _ => ClientError::Rejection { status: status.as_u16(), message },
    }
}
