//! Like/unlike interactions
//!
//! The remote service is authoritative over like-state. The client keeps no
//! local copy: `toggle` reports whether the service acknowledged the change,
//! and callers resynchronize with `fetch_likes` after any doubtful outcome.

use crate::api::{Ack, ApiClient, InteractionRequest};
use crate::error::GatewayResult;
use crate::notify::{FailureNotifier, LogNotifier, LIKE_FAILED_MESSAGE};
use crate::session::SessionState;
use graphrec_common::ItemId;
use std::sync::Arc;
use tracing::{debug, info, warn};

const INTERACTION_PATH: &str = "interaction/";

/// Interaction gateway
#[derive(Clone)]
pub struct InteractionGateway {
    api: ApiClient,
    session: Arc<SessionState>,
    notifier: Arc<dyn FailureNotifier>,
}

impl InteractionGateway {
    pub fn new(api: ApiClient, session: Arc<SessionState>) -> Self {
        Self {
            api,
            session,
            notifier: Arc::new(LogNotifier),
        }
    }

    /// Replace the notifier used when a like fails
    pub fn with_notifier(mut self, notifier: Arc<dyn FailureNotifier>) -> Self {
        self.notifier = notifier;
        self
    }

    /// Like (`unlike == false`) or unlike (`unlike == true`) an item
    ///
    /// Returns whether the service acknowledged the change. Nothing is rolled
    /// back locally on failure. A failed like is also reported through the
    /// notifier.
    pub async fn toggle(&self, item_id: ItemId, unlike: bool) -> bool {
        match self.try_toggle(item_id, unlike).await {
            Ok(_) => true,
            Err(e) => {
                warn!(
                    item_id = %item_id,
                    unlike,
                    kind = e.kind(),
                    error = %e,
                    "Interaction not recorded"
                );
                if !unlike {
                    self.notifier.notify(LIKE_FAILED_MESSAGE);
                }
                false
            }
        }
    }

    /// Like or unlike an item, returning the failure reason on error
    ///
    /// A like must be acknowledged with a JSON body of any shape; an unlike
    /// only needs a success status.
    pub async fn try_toggle(&self, item_id: ItemId, unlike: bool) -> GatewayResult<Ack> {
        let user_id = self.session.user_id();
        let url = self.api.endpoint(INTERACTION_PATH)?;
        let body = InteractionRequest {
            user_id: user_id.wire_value(),
            item_id,
        };

        if unlike {
            debug!(user_id = %user_id, item_id = %item_id, url = %url, "Sending unlike");
            let response = self.api.send(self.api.delete(url).json(&body)).await?;
            // Status is what counts; the body is informational
            let ack = response.json::<Ack>().await.unwrap_or_default();
            info!(user_id = %user_id, item_id = %item_id, "Interaction removed");
            Ok(ack)
        } else {
            debug!(user_id = %user_id, item_id = %item_id, url = %url, "Sending like");
            // Any JSON body acknowledges the like; only a non-JSON body is a failure
            let reply: serde_json::Value = self.api.send_json(self.api.post(url).json(&body)).await?;
            let ack = Ack::from_body(&reply);
            info!(
                user_id = %user_id,
                item_id = %item_id,
                msg = ack.msg.as_deref().unwrap_or(""),
                "Interaction logged"
            );
            Ok(ack)
        }
    }

    /// Items liked by the active user
    ///
    /// Returns an empty list on any failure, which is indistinguishable from
    /// "no likes"; use [`InteractionGateway::try_fetch_likes`] to tell them apart.
    pub async fn fetch_likes(&self) -> Vec<ItemId> {
        match self.try_fetch_likes().await {
            Ok(likes) => likes,
            Err(e) => {
                warn!(kind = e.kind(), error = %e, "Could not fetch likes");
                Vec::new()
            }
        }
    }

    /// Items liked by the active user, or the failure reason
    pub async fn try_fetch_likes(&self) -> GatewayResult<Vec<ItemId>> {
        let user_id = self.session.user_id();
        let url = self.api.user_endpoint(INTERACTION_PATH, &user_id)?;

        debug!(user_id = %user_id, url = %url, "Fetching likes");
        let likes: Vec<ItemId> = self.api.send_json(self.api.get(url)).await?;
        debug!(user_id = %user_id, count = likes.len(), "Likes fetched");
        Ok(likes)
    }
}
