//! Top-level client
//!
//! [`GraphRecClient`] owns the session state and hands the same
//! `Arc<SessionState>` to every gateway, so all of them observe identity
//! changes immediately. Independent clients (e.g. in tests) share nothing
//! unless they are given the same durable store.

use crate::api::{ApiClient, ServiceStatus};
use crate::binder::IdentityBinder;
use crate::error::{ClientError, GatewayResult};
use crate::gateways::{
    CatalogGateway, InteractionGateway, MetricsGateway, PreferenceGateway,
    RecommendationGateway, RecommendationList,
};
use crate::notify::FailureNotifier;
use crate::session::SessionState;
use graphrec_common::config::ClientConfig;
use graphrec_common::store::{DurableStore, TomlFileStore};
use std::sync::Arc;
use tracing::info;

/// GraphRec client
#[derive(Clone)]
pub struct GraphRecClient {
    config: ClientConfig,
    api: ApiClient,
    session: Arc<SessionState>,
    interactions: InteractionGateway,
    preferences: PreferenceGateway,
    recommendations: RecommendationGateway,
    metrics: MetricsGateway,
    catalog: CatalogGateway,
}

impl GraphRecClient {
    /// Build a client over an explicit durable store
    pub fn new(config: ClientConfig, store: Arc<dyn DurableStore>) -> Result<Self, ClientError> {
        config.validate()?;

        let api = ApiClient::from_config(&config)?;
        let session = Arc::new(SessionState::load(store));

        let interactions = InteractionGateway::new(api.clone(), Arc::clone(&session));
        let preferences = PreferenceGateway::new(api.clone(), Arc::clone(&session));
        let recommendations =
            RecommendationGateway::new(api.clone(), Arc::clone(&session), preferences.clone());
        let metrics = MetricsGateway::new(api.clone());
        let catalog = CatalogGateway::new(api.clone());

        info!(
            base_url = %api.base_url(),
            user_id = %session.user_id(),
            "GraphRec client ready"
        );

        Ok(Self {
            config,
            api,
            session,
            interactions,
            preferences,
            recommendations,
            metrics,
            catalog,
        })
    }

    /// Build a client persisting its session to the configured state file
    pub fn open(config: ClientConfig) -> Result<Self, ClientError> {
        let store = TomlFileStore::open(config.state_file_or_default())?;
        Self::new(config, Arc::new(store))
    }

    /// Route like failures to a front-end specific notifier
    pub fn with_notifier(mut self, notifier: Arc<dyn FailureNotifier>) -> Self {
        self.interactions = self.interactions.with_notifier(notifier);
        self
    }

    pub fn config(&self) -> &ClientConfig {
        &self.config
    }

    pub fn api(&self) -> &ApiClient {
        &self.api
    }

    pub fn session(&self) -> &Arc<SessionState> {
        &self.session
    }

    pub fn interactions(&self) -> &InteractionGateway {
        &self.interactions
    }

    pub fn preferences(&self) -> &PreferenceGateway {
        &self.preferences
    }

    pub fn recommendations(&self) -> &RecommendationGateway {
        &self.recommendations
    }

    pub fn metrics(&self) -> &MetricsGateway {
        &self.metrics
    }

    pub fn catalog(&self) -> &CatalogGateway {
        &self.catalog
    }

    /// Bind `field_count` identity input fields to this client's session
    pub fn bind_identity(&self, field_count: usize) -> IdentityBinder {
        IdentityBinder::bind(Arc::clone(&self.session), field_count)
    }

    /// Recommendations using the configured default `k`
    pub async fn recommend(&self) -> GatewayResult<RecommendationList> {
        self.recommendations.fetch(self.config.default_k).await
    }

    /// Probe the service root
    pub async fn status(&self) -> GatewayResult<ServiceStatus> {
        self.api.status().await
    }
}
