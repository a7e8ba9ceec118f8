//! Event types for the GraphRec session layer
//!
//! Two delivery paths share the same [`SessionEvent`] type:
//! - [`ListenerRegistry`]: synchronous callbacks invoked on the mutating call
//! - [`EventBus`]: tokio broadcast channel for async consumers

use serde::{Deserialize, Serialize};
use std::sync::atomic::{AtomicU64, Ordering};
use std::sync::{Arc, Mutex, MutexGuard, Weak};
use tokio::sync::broadcast;

/// Session events
///
/// Events carry no payload; observers re-read the current session state.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(tag = "type")]
pub enum SessionEvent {
    /// The active user identifier changed
    IdentityChanged,
}

impl SessionEvent {
    /// Get event type as string
    pub fn event_type(&self) -> &str {
        match self {
            SessionEvent::IdentityChanged => "IdentityChanged",
        }
    }
}

type Listener = Arc<dyn Fn(&SessionEvent) + Send + Sync>;

struct Registered {
    id: u64,
    listener: Listener,
}

#[derive(Default)]
struct RegistryInner {
    next_id: AtomicU64,
    listeners: Mutex<Vec<Registered>>,
}

impl RegistryInner {
    fn listeners(&self) -> MutexGuard<'_, Vec<Registered>> {
        // A panicking listener must not disable notification for everyone else
        self.listeners.lock().unwrap_or_else(|e| e.into_inner())
    }
}

/// Synchronous observer registry
///
/// Listeners run in registration order on the thread that calls
/// [`ListenerRegistry::notify`]. The listener list is snapshotted before
/// dispatch, so a listener may subscribe or unsubscribe from inside its callback.
#[derive(Clone, Default)]
pub struct ListenerRegistry {
    inner: Arc<RegistryInner>,
}

impl ListenerRegistry {
    pub fn new() -> Self {
        Self::default()
    }

    /// Register a listener
    ///
    /// The listener stays registered until the returned [`Subscription`] is
    /// dropped or explicitly unsubscribed.
    #[must_use = "dropping the Subscription unregisters the listener"]
    pub fn subscribe<F>(&self, listener: F) -> Subscription
    where
        F: Fn(&SessionEvent) + Send + Sync + 'static,
    {
        let id = self.inner.next_id.fetch_add(1, Ordering::Relaxed);
        self.inner.listeners().push(Registered {
            id,
            listener: Arc::new(listener),
        });
        Subscription {
            id,
            registry: Arc::downgrade(&self.inner),
        }
    }

    /// Invoke every registered listener with `event`
    ///
    /// Returns the number of listeners notified.
    pub fn notify(&self, event: &SessionEvent) -> usize {
        let snapshot: Vec<Listener> = self
            .inner
            .listeners()
            .iter()
            .map(|r| Arc::clone(&r.listener))
            .collect();

        for listener in &snapshot {
            listener(event);
        }
        snapshot.len()
    }

    /// Get the current number of registered listeners
    pub fn listener_count(&self) -> usize {
        self.inner.listeners().len()
    }
}

/// Handle returned by [`ListenerRegistry::subscribe`]
pub struct Subscription {
    id: u64,
    registry: Weak<RegistryInner>,
}

impl Subscription {
    /// Unregister the listener now
    pub fn unsubscribe(self) {
        // Drop does the work
    }
}

impl Drop for Subscription {
    fn drop(&mut self) {
        if let Some(inner) = self.registry.upgrade() {
            inner.listeners().retain(|r| r.id != self.id);
        }
    }
}

impl std::fmt::Debug for Subscription {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("Subscription").field("id", &self.id).finish()
    }
}

// ========================================
// EventBus Implementation
// ========================================

/// Async event distribution bus for session events
///
/// Uses tokio::broadcast internally, providing:
/// - Non-blocking publish (slow subscribers don't block the session)
/// - Multiple concurrent subscribers
/// - Lagged message detection for slow subscribers
///
/// # Examples
///
/// ```
/// use graphrec_common::events::{EventBus, SessionEvent};
///
/// let bus = EventBus::new(16);
/// let mut rx = bus.subscribe();
/// assert_eq!(bus.emit(SessionEvent::IdentityChanged).unwrap(), 1);
/// assert_eq!(rx.try_recv().unwrap(), SessionEvent::IdentityChanged);
/// ```
#[derive(Clone)]
pub struct EventBus {
    tx: broadcast::Sender<SessionEvent>,
}

impl EventBus {
    /// Creates a new EventBus with specified channel capacity
    pub fn new(capacity: usize) -> Self {
        let (tx, _) = broadcast::channel(capacity);
        Self { tx }
    }

    /// Subscribe to all future events
    ///
    /// Events emitted before subscription are not received.
    pub fn subscribe(&self) -> broadcast::Receiver<SessionEvent> {
        self.tx.subscribe()
    }

    /// Emit an event to all subscribers
    ///
    /// Returns `Err` if no subscribers are listening.
    pub fn emit(
        &self,
        event: SessionEvent,
    ) -> Result<usize, broadcast::error::SendError<SessionEvent>> {
        self.tx.send(event)
    }

    /// Get the current number of active subscribers
    pub fn subscriber_count(&self) -> usize {
        self.tx.receiver_count()
    }
}
