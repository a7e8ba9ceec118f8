//! Session state for the active user
//!
//! Holds the active identity, the selected genre tags and the optional
//! ranking strategy label. Identity and strategy label are persisted to a
//! [`DurableStore`]; genre selection lives in memory only.
//!
//! All mutation goes through the setters below. Each setter takes the lock
//! for one synchronous step and releases it before listeners run, so a
//! listener may read the state it is being notified about.

use graphrec_common::events::{EventBus, ListenerRegistry, SessionEvent, Subscription};
use graphrec_common::store::{DurableStore, ALGORITHM_KEY, USER_ID_KEY};
use graphrec_common::{Result, UserId};
use std::collections::BTreeSet;
use std::sync::{Arc, RwLock, RwLockReadGuard, RwLockWriteGuard};
use tokio::sync::broadcast;
use tracing::{debug, info, warn};

const EVENT_BUS_CAPACITY: usize = 16;

#[derive(Debug, Clone, PartialEq, Eq)]
struct SessionData {
    user_id: UserId,
    selected_genres: BTreeSet<String>,
    algorithm: Option<String>,
}

/// Point-in-time copy of the session
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct SessionSnapshot {
    pub user_id: UserId,
    pub selected_genres: BTreeSet<String>,
    pub algorithm: Option<String>,
}

/// The active user session
pub struct SessionState {
    data: RwLock<SessionData>,
    store: Arc<dyn DurableStore>,
    listeners: ListenerRegistry,
    event_bus: EventBus,
}

impl SessionState {
    /// Seed session state from durable storage
    ///
    /// Falls back to user `1` when no usable identity is stored.
    pub fn load(store: Arc<dyn DurableStore>) -> Self {
        let user_id = match store.get(USER_ID_KEY) {
            Some(raw) => UserId::new(&raw).unwrap_or_else(|_| {
                warn!("Stored user id is blank, using fallback identity");
                UserId::fallback()
            }),
            None => UserId::fallback(),
        };

        let algorithm = store
            .get(ALGORITHM_KEY)
            .map(|s| s.trim().to_string())
            .filter(|s| !s.is_empty());

        debug!(user_id = %user_id, algorithm = ?algorithm, "Session state loaded");

        Self {
            data: RwLock::new(SessionData {
                user_id,
                selected_genres: BTreeSet::new(),
                algorithm,
            }),
            store,
            listeners: ListenerRegistry::new(),
            event_bus: EventBus::new(EVENT_BUS_CAPACITY),
        }
    }

    fn read(&self) -> RwLockReadGuard<'_, SessionData> {
        self.data.read().unwrap_or_else(|e| e.into_inner())
    }

    fn write(&self) -> RwLockWriteGuard<'_, SessionData> {
        self.data.write().unwrap_or_else(|e| e.into_inner())
    }

    // ------------------------------------------------------------------
    // Identity
    // ------------------------------------------------------------------

    /// Current user identifier
    pub fn user_id(&self) -> UserId {
        self.read().user_id.clone()
    }

    /// Switch the active identity
    ///
    /// The new identity is applied in memory and observers are notified
    /// even when persisting fails; the persistence error is returned so the
    /// caller can report it.
    pub fn set_user_id(&self, id: UserId) -> Result<()> {
        {
            let mut data = self.write();
            data.user_id = id.clone();
        }

        let persisted = self.store.set(USER_ID_KEY, id.as_str());
        if let Err(e) = &persisted {
            warn!(user_id = %id, error = %e, "Failed to persist user id");
        }

        info!(user_id = %id, "Active user changed");
        self.publish(SessionEvent::IdentityChanged);
        persisted
    }

    // ------------------------------------------------------------------
    // Strategy label
    // ------------------------------------------------------------------

    /// Selected ranking strategy, if any
    pub fn algorithm(&self) -> Option<String> {
        self.read().algorithm.clone()
    }

    /// Select a ranking strategy; a blank label clears the selection
    pub fn set_algorithm(&self, label: impl AsRef<str>) -> Result<()> {
        let label = label.as_ref().trim();
        if label.is_empty() {
            return self.clear_algorithm();
        }

        self.write().algorithm = Some(label.to_string());
        debug!(algorithm = %label, "Ranking strategy selected");
        self.store.set(ALGORITHM_KEY, label)
    }

    /// Drop the strategy selection
    pub fn clear_algorithm(&self) -> Result<()> {
        self.write().algorithm = None;
        self.store.remove(ALGORITHM_KEY)
    }

    // ------------------------------------------------------------------
    // Genre preferences
    // ------------------------------------------------------------------

    /// Snapshot of the selected genre tags
    pub fn selected_genres(&self) -> BTreeSet<String> {
        self.read().selected_genres.clone()
    }

    pub fn is_genre_selected(&self, tag: &str) -> bool {
        self.read().selected_genres.contains(tag)
    }

    /// Add a tag; returns `false` if it was already selected
    pub fn select_genre(&self, tag: impl Into<String>) -> bool {
        self.write().selected_genres.insert(tag.into())
    }

    /// Remove a tag; returns `false` if it was not selected
    pub fn deselect_genre(&self, tag: &str) -> bool {
        self.write().selected_genres.remove(tag)
    }

    /// Flip a tag; returns whether it is selected afterwards
    pub fn toggle_genre(&self, tag: impl Into<String>) -> bool {
        let tag = tag.into();
        let mut data = self.write();
        if data.selected_genres.remove(&tag) {
            false
        } else {
            data.selected_genres.insert(tag);
            true
        }
    }

    /// Replace the whole selection
    pub fn set_genres<I, S>(&self, tags: I)
    where
        I: IntoIterator<Item = S>,
        S: Into<String>,
    {
        let tags: BTreeSet<String> = tags.into_iter().map(Into::into).collect();
        self.write().selected_genres = tags;
    }

    pub fn clear_genres(&self) {
        self.write().selected_genres.clear();
    }

    /// Copy of the whole session
    pub fn snapshot(&self) -> SessionSnapshot {
        let data = self.read();
        SessionSnapshot {
            user_id: data.user_id.clone(),
            selected_genres: data.selected_genres.clone(),
            algorithm: data.algorithm.clone(),
        }
    }

    // ------------------------------------------------------------------
    // Observers
    // ------------------------------------------------------------------

    /// Register a synchronous observer
    ///
    /// The listener runs on the thread calling the setter, after the state
    /// has been updated. Keep the returned handle alive for as long as the
    /// listener should stay registered.
    #[must_use = "dropping the Subscription unregisters the listener"]
    pub fn subscribe<F>(&self, listener: F) -> Subscription
    where
        F: Fn(&SessionEvent) + Send + Sync + 'static,
    {
        self.listeners.subscribe(listener)
    }

    /// Receive session events asynchronously
    pub fn events(&self) -> broadcast::Receiver<SessionEvent> {
        self.event_bus.subscribe()
    }

    fn publish(&self, event: SessionEvent) {
        let notified = self.listeners.notify(&event);
        match self.event_bus.emit(event) {
            Ok(receivers) => debug!(
                event = event.event_type(),
                listeners = notified,
                receivers,
                "Session event published"
            ),
            Err(_) => debug!(
                event = event.event_type(),
                listeners = notified,
                "Session event published, no async receivers"
            ),
        }
    }
}

impl std::fmt::Debug for SessionState {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("SessionState")
            .field("data", &*self.read())
            .field("listeners", &self.listeners.listener_count())
            .field("receivers", &self.event_bus.subscriber_count())
            .finish()
    }
}
