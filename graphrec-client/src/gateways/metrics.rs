//! Operational metrics snapshot

use crate::api::ApiClient;
use crate::error::GatewayResult;
use chrono::{DateTime, Utc};
use serde::Serialize;
use serde_json::{Map, Value};
use tracing::{debug, warn};

const METRICS_PATH: &str = "metrics/";

/// Metrics as reported by the service, passed through unvalidated
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct MetricsSnapshot {
    pub values: Map<String, Value>,
    /// When the client received the snapshot
    pub fetched_at: DateTime<Utc>,
}

impl MetricsSnapshot {
    pub fn get(&self, key: &str) -> Option<&Value> {
        self.values.get(key)
    }
}

/// Metrics gateway
#[derive(Clone)]
pub struct MetricsGateway {
    api: ApiClient,
}

impl MetricsGateway {
    pub fn new(api: ApiClient) -> Self {
        Self { api }
    }

    /// Fetch the current snapshot; `Err` means metrics are unavailable
    pub async fn fetch(&self) -> GatewayResult<MetricsSnapshot> {
        let url = self.api.endpoint(METRICS_PATH)?;
        debug!(url = %url, "Fetching metrics");

        let values: Map<String, Value> = self
            .api
            .send_json(self.api.get(url))
            .await
            .map_err(|e| {
                warn!(kind = e.kind(), error = %e, "Metrics unavailable");
                e
            })?;

        Ok(MetricsSnapshot {
            values,
            fetched_at: Utc::now(),
        })
    }
}
