//! HTTP client for the GraphRec API
//!
//! Thin wrapper over `reqwest` that owns the base address and maps every
//! failure onto [`GatewayError`]. Gateways build on it; it holds no session
//! state.

use crate::error::{GatewayError, GatewayResult};
use graphrec_common::config::ClientConfig;
use graphrec_common::{ItemId, UserId};
use reqwest::{RequestBuilder, Response, Url};
use serde::de::DeserializeOwned;
use serde::{Deserialize, Serialize};
use std::time::Duration;

const USER_AGENT: &str = concat!("graphrec-client/", env!("CARGO_PKG_VERSION"));

/// Body of `POST /interaction/` and `DELETE /interaction/`
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct InteractionRequest {
    pub user_id: serde_json::Value,
    pub item_id: ItemId,
}

/// Body of `POST /recommend/preferences`
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct PreferenceRequest {
    pub user_id: serde_json::Value,
    pub genres: Vec<String>,
}

/// Acknowledgement returned by write endpoints
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct Ack {
    #[serde(default)]
    pub status: Option<String>,
    #[serde(default)]
    pub msg: Option<String>,
}

impl Ack {
    /// Read an acknowledgement from any JSON body
    ///
    /// `status` and `msg` are picked up when the body is an object carrying
    /// them as strings; any other JSON value is an acknowledgement without
    /// details.
    pub fn from_body(body: &serde_json::Value) -> Self {
        let field = |name: &str| {
            body.get(name)
                .and_then(serde_json::Value::as_str)
                .map(str::to_string)
        };
        Self {
            status: field("status"),
            msg: field("msg"),
        }
    }
}

/// Response of `GET /`
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ServiceStatus {
    pub status: String,
    #[serde(default)]
    pub message: Option<String>,
    #[serde(default)]
    pub docs_url: Option<String>,
}

impl ServiceStatus {
    pub fn is_online(&self) -> bool {
        self.status == "online"
    }
}

/// GraphRec API client
#[derive(Debug, Clone)]
pub struct ApiClient {
    http_client: reqwest::Client,
    base_url: Url,
}

impl ApiClient {
    /// Create a client for the service at `base_url`
    pub fn new(base_url: &str, timeout: Duration) -> GatewayResult<Self> {
        let base_url = normalize_base_url(base_url)?;

        let http_client = reqwest::Client::builder()
            .user_agent(USER_AGENT)
            .timeout(timeout)
            .build()
            .map_err(|e| GatewayError::Network(e.to_string()))?;

        Ok(Self {
            http_client,
            base_url,
        })
    }

    pub fn from_config(config: &ClientConfig) -> GatewayResult<Self> {
        Self::new(
            &config.base_url,
            Duration::from_secs(config.request_timeout_secs),
        )
    }

    pub fn base_url(&self) -> &Url {
        &self.base_url
    }

    /// Resolve a path relative to the base address (e.g. `"metrics/"`)
    pub(crate) fn endpoint(&self, path: &str) -> GatewayResult<Url> {
        self.base_url
            .join(path)
            .map_err(|e| GatewayError::InvalidRequest(format!("bad endpoint '{}': {}", path, e)))
    }

    /// Resolve `<prefix>/<user id>` with the user id percent-encoded as one segment
    pub(crate) fn user_endpoint(&self, prefix: &str, user_id: &UserId) -> GatewayResult<Url> {
        let mut url = self.endpoint(prefix)?;
        url.path_segments_mut()
            .map_err(|_| GatewayError::InvalidRequest(format!("cannot extend '{}'", self.base_url)))?
            .pop_if_empty()
            .push(user_id.as_str());
        Ok(url)
    }

    pub(crate) fn get(&self, url: Url) -> RequestBuilder {
        self.http_client.get(url)
    }

    pub(crate) fn post(&self, url: Url) -> RequestBuilder {
        self.http_client.post(url)
    }

    pub(crate) fn delete(&self, url: Url) -> RequestBuilder {
        self.http_client.delete(url)
    }

    /// Send a request, mapping transport failures and non-success statuses
    pub(crate) async fn send(&self, request: RequestBuilder) -> GatewayResult<Response> {
        let response = request
            .send()
            .await
            .map_err(|e| GatewayError::Network(e.to_string()))?;

        let status = response.status();
        if !status.is_success() {
            let error_text = response.text().await.unwrap_or_default();
            return Err(GatewayError::Status(status.as_u16(), error_text));
        }

        Ok(response)
    }

    /// Send a request and decode the JSON body
    pub(crate) async fn send_json<T: DeserializeOwned>(
        &self,
        request: RequestBuilder,
    ) -> GatewayResult<T> {
        let response = self.send(request).await?;
        response
            .json::<T>()
            .await
            .map_err(|e| GatewayError::Parse(e.to_string()))
    }

    /// Probe `GET /`
    pub async fn status(&self) -> GatewayResult<ServiceStatus> {
        let url = self.endpoint("")?;
        tracing::debug!(url = %url, "Checking service status");
        self.send_json(self.get(url)).await
    }
}

/// Parse the base address and make sure its path ends in `/` so relative
/// joins append instead of replacing the last segment
fn normalize_base_url(raw: &str) -> GatewayResult<Url> {
    let mut url = Url::parse(raw.trim())
        .map_err(|e| GatewayError::InvalidRequest(format!("invalid base URL '{}': {}", raw, e)))?;

    if url.cannot_be_a_base() {
        return Err(GatewayError::InvalidRequest(format!(
            "base URL '{}' cannot carry paths",
            raw
        )));
    }

    if !url.path().ends_with('/') {
        let path = format!("{}/", url.path());
        url.set_path(&path);
    }
    url.set_query(None);
    url.set_fragment(None);
    Ok(url)
}
