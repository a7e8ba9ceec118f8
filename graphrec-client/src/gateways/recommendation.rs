//! Ranked recommendations
//!
//! A recommendation request is always preceded by a settled preference push
//! so the remote ranking reflects the latest local selection. The ordering
//! is enforced by the type system: [`RecommendationGateway::request_recommendations`]
//! takes the [`PreferencesPushed`] token that only a finished push produces.

use super::preference::{PreferenceGateway, PreferencesPushed};
use crate::api::ApiClient;
use crate::error::{GatewayError, GatewayResult};
use crate::session::SessionState;
use graphrec_common::{ItemId, UserId};
use serde::{Deserialize, Serialize};
use std::sync::Arc;
use tracing::{debug, info, warn};

const RECOMMEND_PATH: &str = "recommend/";

/// One ranked entry
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct RecommendedItem {
    pub id: ItemId,
    #[serde(default)]
    pub title: Option<String>,
    #[serde(default)]
    pub category: Option<String>,
    /// Strategy that produced the entry (e.g. "Global Trending (Popular)")
    #[serde(default)]
    pub reason: Option<String>,
}

impl From<ItemId> for RecommendedItem {
    fn from(id: ItemId) -> Self {
        Self {
            id,
            title: None,
            category: None,
            reason: None,
        }
    }
}

/// Ranked recommendations, best first, at most `k` long
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct RecommendationList {
    /// User the service ranked for, when it echoes one
    pub user_id: Option<UserId>,
    pub items: Vec<RecommendedItem>,
    /// Server-side ranking latency, when reported
    pub latency_ms: Option<f64>,
}

impl RecommendationList {
    pub fn item_ids(&self) -> Vec<ItemId> {
        self.items.iter().map(|item| item.id).collect()
    }

    pub fn len(&self) -> usize {
        self.items.len()
    }

    pub fn is_empty(&self) -> bool {
        self.items.is_empty()
    }
}

/// Accepted response shapes
#[derive(Deserialize)]
#[serde(untagged)]
enum RecommendationPayload {
    Envelope {
        #[serde(default)]
        user_id: Option<UserId>,
        recommendations: Vec<RecommendedItem>,
        #[serde(default)]
        latency_ms: Option<f64>,
    },
    Items(Vec<RecommendedItem>),
    Ids(Vec<ItemId>),
}

impl RecommendationPayload {
    fn into_list(self, k: usize) -> RecommendationList {
        let (user_id, mut items, latency_ms) = match self {
            RecommendationPayload::Envelope {
                user_id,
                recommendations,
                latency_ms,
            } => (user_id, recommendations, latency_ms),
            RecommendationPayload::Items(items) => (None, items, None),
            RecommendationPayload::Ids(ids) => (
                None,
                ids.into_iter().map(RecommendedItem::from).collect(),
                None,
            ),
        };
        items.truncate(k);
        RecommendationList {
            user_id,
            items,
            latency_ms,
        }
    }
}

fn check_k(k: usize) -> GatewayResult<()> {
    if k == 0 {
        return Err(GatewayError::InvalidRequest(
            "k must be greater than zero".to_string(),
        ));
    }
    Ok(())
}

/// Recommendation gateway
#[derive(Clone)]
pub struct RecommendationGateway {
    api: ApiClient,
    session: Arc<SessionState>,
    preferences: PreferenceGateway,
}

impl RecommendationGateway {
    pub fn new(api: ApiClient, session: Arc<SessionState>, preferences: PreferenceGateway) -> Self {
        Self {
            api,
            session,
            preferences,
        }
    }

    /// Push preferences, then request `k` recommendations
    ///
    /// `Err` means recommendations are unavailable; no earlier result is
    /// substituted. A failed push does not block the request.
    pub async fn fetch(&self, k: usize) -> GatewayResult<RecommendationList> {
        check_k(k)?;
        let pushed = self.preferences.prepare_preferences().await;
        self.request_recommendations(pushed, k).await
    }

    /// Request `k` recommendations for the active user
    pub async fn request_recommendations(
        &self,
        pushed: PreferencesPushed,
        k: usize,
    ) -> GatewayResult<RecommendationList> {
        check_k(k)?;

        let snapshot = self.session.snapshot();
        if &snapshot.user_id != pushed.user_id() {
            debug!(
                pushed_for = %pushed.user_id(),
                user_id = %snapshot.user_id,
                "Identity changed since preference push"
            );
        }

        let mut url = self.api.user_endpoint(RECOMMEND_PATH, &snapshot.user_id)?;
        {
            let mut query = url.query_pairs_mut();
            query.append_pair("k", &k.to_string());
            if let Some(algo) = &snapshot.algorithm {
                query.append_pair("algo", algo);
            }
        }

        debug!(
            user_id = %snapshot.user_id,
            k,
            algo = ?snapshot.algorithm,
            preferences_saved = pushed.is_saved(),
            url = %url,
            "Requesting recommendations"
        );

        let result = self
            .api
            .send_json::<RecommendationPayload>(self.api.get(url))
            .await
            .map(|payload| payload.into_list(k));

        if let Ok(list) = &result {
            if let Some(ranked_for) = list.user_id.as_ref().filter(|u| **u != snapshot.user_id) {
                warn!(
                    user_id = %snapshot.user_id,
                    ranked_for = %ranked_for,
                    "Service ranked for a different user"
                );
            }
        }

        match &result {
            Ok(list) => info!(
                user_id = %snapshot.user_id,
                count = list.len(),
                latency_ms = ?list.latency_ms,
                "Recommendations received"
            ),
            Err(e) => warn!(
                user_id = %snapshot.user_id,
                kind = e.kind(),
                error = %e,
                "Recommendations unavailable"
            ),
        }

        result
    }
}
