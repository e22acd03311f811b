//! HTTP transport over reqwest.
//!
//! The server wraps every successful response as `{"data": ...}`.

use async_trait::async_trait;
use reqwest::{Client, RequestBuilder};
use serde_json::Value;
use tracing::debug;

use super::Transport;
use crate::error::TransportError;

pub struct HttpTransport {
    client: Client,
    api_root: String,
}

impl HttpTransport {
    /// `base_url` like `http://localhost:8080`, `api_prefix` like `api`
    pub fn new(base_url: &str, api_prefix: &str) -> Self {
        Self::with_client(Client::new(), base_url, api_prefix)
    }

    pub fn with_client(client: Client, base_url: &str, api_prefix: &str) -> Self {
        let base = base_url.trim_end_matches('/');
        let prefix = api_prefix.trim_matches('/');
        let api_root = if prefix.is_empty() {
            base.to_string()
        } else {
            format!("{}/{}", base, prefix)
        };
        Self { client, api_root }
    }

    pub fn url(&self, path: &str) -> String {
        format!("{}/{}", self.api_root, path.trim_start_matches('/'))
    }

    async fn send(&self, request: RequestBuilder) -> Result<Value, TransportError> {
        let response = request.send().await?;
        let status = response.status();
        debug!(url = %response.url(), status = status.as_u16(), "http response");

        if !status.is_success() {
            let body = response.text().await.unwrap_or_default();
            return Err(TransportError::Status {
                status: status.as_u16(),
                body,
            });
        }

        let body: Value = response.json().await?;
        unwrap_envelope(body)
    }
}

/// Take the `data` member out of a response body
fn unwrap_envelope(mut body: Value) -> Result<Value, TransportError> {
    body.get_mut("data")
        .map(Value::take)
        .ok_or(TransportError::Envelope)
}

#[async_trait(?Send)]
impl Transport for HttpTransport {
    async fn get(&self, path: &str) -> Result<Value, TransportError> {
        self.send(self.client.get(self.url(path))).await
    }

    async fn post(&self, path: &str, body: Value) -> Result<Value, TransportError> {
        self.send(self.client.post(self.url(path)).json(&body)).await
    }

    async fn patch(&self, path: &str, body: Value) -> Result<Value, TransportError> {
        self.send(self.client.patch(self.url(path)).json(&body)).await
    }

    async fn delete(&self, path: &str) -> Result<Value, TransportError> {
        self.send(self.client.delete(self.url(path))).await
    }
}
