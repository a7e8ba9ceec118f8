//! Genre preference push
//!
//! Pushing preferences establishes the completion point that recommendation
//! requests are sequenced after. The push itself never fails from the
//! caller's point of view; its outcome travels inside the
//! [`PreferencesPushed`] token for callers that want to look.

use crate::api::{Ack, ApiClient, PreferenceRequest};
use crate::error::GatewayResult;
use crate::session::SessionState;
use graphrec_common::UserId;
use std::sync::Arc;
use tracing::{debug, warn};

const PREFERENCES_PATH: &str = "recommend/preferences";

/// Proof that a preference push has settled
///
/// Only [`PreferenceGateway::prepare_preferences`] can create one, and
/// [`RecommendationGateway::request_recommendations`] consumes it, so a
/// recommendation request cannot be issued without a completed push.
///
/// [`RecommendationGateway::request_recommendations`]: super::RecommendationGateway::request_recommendations
#[derive(Debug)]
#[must_use = "pass the token to RecommendationGateway::request_recommendations"]
pub struct PreferencesPushed {
    user_id: UserId,
    genres: Vec<String>,
    outcome: GatewayResult<()>,
}

impl PreferencesPushed {
    /// User the preferences were pushed for
    pub fn user_id(&self) -> &UserId {
        &self.user_id
    }

    /// Tags that were sent
    pub fn genres(&self) -> &[String] {
        &self.genres
    }

    /// Result of the push
    pub fn outcome(&self) -> &GatewayResult<()> {
        &self.outcome
    }

    pub fn is_saved(&self) -> bool {
        self.outcome.is_ok()
    }
}

/// Preference gateway
#[derive(Clone)]
pub struct PreferenceGateway {
    api: ApiClient,
    session: Arc<SessionState>,
}

impl PreferenceGateway {
    pub fn new(api: ApiClient, session: Arc<SessionState>) -> Self {
        Self { api, session }
    }

    /// Push the current selection, ignoring the outcome
    pub async fn push(&self) {
        let _ = self.prepare_preferences().await;
    }

    /// Push the current selection and return a completion token
    ///
    /// The tag set is snapshotted before the request is sent; later
    /// selections are not part of this push.
    pub async fn prepare_preferences(&self) -> PreferencesPushed {
        let snapshot = self.session.snapshot();
        let genres: Vec<String> = snapshot.selected_genres.into_iter().collect();
        let outcome = self.send(&snapshot.user_id, &genres).await;

        if let Err(e) = &outcome {
            warn!(
                user_id = %snapshot.user_id,
                kind = e.kind(),
                error = %e,
                "Preference push failed"
            );
        }

        PreferencesPushed {
            user_id: snapshot.user_id,
            genres,
            outcome,
        }
    }

    async fn send(&self, user_id: &UserId, genres: &[String]) -> GatewayResult<()> {
        let url = self.api.endpoint(PREFERENCES_PATH)?;
        let body = PreferenceRequest {
            user_id: user_id.wire_value(),
            genres: genres.to_vec(),
        };

        debug!(user_id = %user_id, genres = ?genres, url = %url, "Pushing preferences");
        let response = self.api.send(self.api.post(url).json(&body)).await?;
        let ack = response.json::<Ack>().await.unwrap_or_default();
        debug!(user_id = %user_id, status = ack.status.as_deref().unwrap_or(""), "Preferences saved");
        Ok(())
    }
}
