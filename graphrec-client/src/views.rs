//! View state fed by the gateways
//!
//! These hold what a front end renders. They add no ordering of their own:
//! overlapping refreshes resolve in arrival order and the last response to
//! arrive is what stays on screen, even if it answers an older request.

use crate::error::GatewayError;
use crate::gateways::{InteractionGateway, RecommendationGateway, RecommendationList};
use graphrec_common::ItemId;
use std::collections::BTreeSet;
use std::sync::{Mutex, MutexGuard};
use tracing::debug;

fn lock<T>(m: &Mutex<T>) -> MutexGuard<'_, T> {
    m.lock().unwrap_or_else(|e| e.into_inner())
}

/// What the recommendation board shows
#[derive(Debug, Clone, PartialEq)]
pub enum BoardContent {
    /// Nothing requested yet
    Empty,
    Ranked { k: usize, list: RecommendationList },
    Unavailable { k: usize, reason: GatewayError },
}

#[derive(Debug)]
struct BoardState {
    content: BoardContent,
    updates: u64,
}

/// Recommendation panel with last-response-wins semantics
#[derive(Debug)]
pub struct RecommendationBoard {
    state: Mutex<BoardState>,
}

impl Default for RecommendationBoard {
    fn default() -> Self {
        Self::new()
    }
}

impl RecommendationBoard {
    pub fn new() -> Self {
        Self {
            state: Mutex::new(BoardState {
                content: BoardContent::Empty,
                updates: 0,
            }),
        }
    }

    /// Fetch `k` recommendations and show the outcome when it arrives
    ///
    /// Returns the update sequence number assigned on arrival.
    pub async fn refresh(&self, gateway: &RecommendationGateway, k: usize) -> u64 {
        let result = gateway.fetch(k).await;
        self.show(k, result)
    }

    /// Replace the board content with a fetch outcome
    pub fn show(&self, k: usize, result: Result<RecommendationList, GatewayError>) -> u64 {
        let mut state = lock(&self.state);
        state.updates += 1;
        state.content = match result {
            Ok(list) => BoardContent::Ranked { k, list },
            Err(reason) => BoardContent::Unavailable { k, reason },
        };
        debug!(k, update = state.updates, "Recommendation board updated");
        state.updates
    }

    pub fn content(&self) -> BoardContent {
        lock(&self.state).content.clone()
    }

    /// Number of responses applied so far
    pub fn updates(&self) -> u64 {
        lock(&self.state).updates
    }
}

/// Liked-items panel with optimistic toggling
///
/// A press flips the item immediately. If the service does not acknowledge
/// the change, the flip is reverted and the panel resynchronizes from the
/// service.
#[derive(Debug, Default)]
pub struct LikeBoard {
    liked: Mutex<BTreeSet<ItemId>>,
}

impl LikeBoard {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn is_liked(&self, item_id: ItemId) -> bool {
        lock(&self.liked).contains(&item_id)
    }

    pub fn liked(&self) -> BTreeSet<ItemId> {
        lock(&self.liked).clone()
    }

    /// Reload likes from the service
    ///
    /// On failure the current content is kept and `false` is returned, so a
    /// failed read is never mistaken for "no likes".
    pub async fn sync(&self, gateway: &InteractionGateway) -> bool {
        match gateway.try_fetch_likes().await {
            Ok(likes) => {
                *lock(&self.liked) = likes.into_iter().collect();
                true
            }
            Err(_) => false,
        }
    }

    /// Toggle an item; returns whether the service acknowledged it
    pub async fn press(&self, gateway: &InteractionGateway, item_id: ItemId) -> bool {
        let unlike = {
            let mut liked = lock(&self.liked);
            let was_liked = !liked.insert(item_id);
            if was_liked {
                liked.remove(&item_id);
            }
            was_liked
        };

        if gateway.toggle(item_id, unlike).await {
            return true;
        }

        {
            let mut liked = lock(&self.liked);
            if unlike {
                liked.insert(item_id);
            } else {
                liked.remove(&item_id);
            }
        }
        debug!(item_id = %item_id, "Reverted optimistic toggle");
        self.sync(gateway).await;
        false
    }

    /// Forget everything (e.g. after the identity changed)
    pub fn clear(&self) {
        lock(&self.liked).clear();
    }
}
