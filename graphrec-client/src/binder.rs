//! Identity binder
//!
//! Connects identity input fields to [`SessionState`]. Each field is either
//! idle (showing the active identity) or being edited (showing a draft).
//! Leaving a field commits its draft; the confirm key forces the field to
//! lose focus, so "press Enter" and "edit then tab away" share one path.
//!
//! ```text
//!          focus / typing
//!   Idle ──────────────────▶ Editing { draft }
//!    ▲                           │
//!    └─────── blur / Enter / Tab ┘  (commit draft → set_user_id)
//! ```

use crate::session::SessionState;
use graphrec_common::events::Subscription;
use graphrec_common::UserId;
use std::sync::{Arc, Mutex, MutexGuard, Weak};
use tracing::{debug, warn};

/// Handle to one identity field
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub struct FieldId(usize);

/// Key presses the binder reacts to
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Key {
    /// Commit key: forces the field to lose focus
    Enter,
    /// Moves focus away, which also commits
    Tab,
    Backspace,
    Char(char),
}

/// What happened when a field lost focus
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum CommitOutcome {
    /// The field was not being edited
    NotEditing,
    /// Draft equals the active identity; nothing propagated
    Unchanged,
    /// Draft was blank; field reverted to the active identity
    Rejected,
    /// Identity switched; `persisted` is false if durable storage failed
    Committed { user_id: UserId, persisted: bool },
}

#[derive(Debug, Clone)]
struct IdentityField {
    displayed: String,
    /// `Some` while the field is being edited
    draft: Option<String>,
}

impl IdentityField {
    fn idle(displayed: String) -> Self {
        Self {
            displayed,
            draft: None,
        }
    }

    fn shown(&self) -> &str {
        self.draft.as_deref().unwrap_or(&self.displayed)
    }

    /// Draft being edited, entering edit mode if needed
    fn draft_mut(&mut self) -> &mut String {
        self.draft.get_or_insert_with(|| self.displayed.clone())
    }
}

type Fields = Arc<Mutex<Vec<IdentityField>>>;

fn lock(fields: &Fields) -> MutexGuard<'_, Vec<IdentityField>> {
    fields.lock().unwrap_or_else(|e| e.into_inner())
}

/// Binds identity input fields to the session
pub struct IdentityBinder {
    session: Arc<SessionState>,
    fields: Fields,
    _subscription: Subscription,
}

impl IdentityBinder {
    /// Bind `field_count` fields, each initialized to the active identity
    pub fn bind(session: Arc<SessionState>, field_count: usize) -> Self {
        let current = session.user_id().to_string();
        let fields: Fields = Arc::new(Mutex::new(
            (0..field_count)
                .map(|_| IdentityField::idle(current.clone()))
                .collect(),
        ));

        // Weak: the session owns this listener
        let weak_session: Weak<SessionState> = Arc::downgrade(&session);
        let listener_fields = Arc::clone(&fields);
        let subscription = session.subscribe(move |_event| {
            let Some(session) = weak_session.upgrade() else {
                return;
            };
            let current = session.user_id().to_string();
            for field in lock(&listener_fields).iter_mut() {
                // A field under edit keeps its draft
                field.displayed = current.clone();
            }
        });

        Self {
            session,
            fields,
            _subscription: subscription,
        }
    }

    /// Add another identity field
    pub fn add_field(&self) -> FieldId {
        let mut fields = lock(&self.fields);
        fields.push(IdentityField::idle(self.session.user_id().to_string()));
        FieldId(fields.len() - 1)
    }

    pub fn field(&self, index: usize) -> Option<FieldId> {
        (index < lock(&self.fields).len()).then_some(FieldId(index))
    }

    pub fn field_count(&self) -> usize {
        lock(&self.fields).len()
    }

    /// Text currently shown in the field
    pub fn display(&self, field: FieldId) -> Option<String> {
        lock(&self.fields).get(field.0).map(|f| f.shown().to_string())
    }

    pub fn is_editing(&self, field: FieldId) -> bool {
        lock(&self.fields)
            .get(field.0)
            .map(|f| f.draft.is_some())
            .unwrap_or(false)
    }

    /// Field gains focus; the draft starts from the shown value
    pub fn focus(&self, field: FieldId) {
        if let Some(f) = lock(&self.fields).get_mut(field.0) {
            f.draft_mut();
        }
    }

    /// Replace the draft (paste, programmatic input)
    pub fn input(&self, field: FieldId, text: &str) {
        if let Some(f) = lock(&self.fields).get_mut(field.0) {
            *f.draft_mut() = text.to_string();
        }
    }

    /// Handle a key press; returns the commit outcome when the key ends editing
    pub fn key(&self, field: FieldId, key: Key) -> Option<CommitOutcome> {
        match key {
            Key::Enter | Key::Tab => Some(self.blur(field)),
            Key::Backspace => {
                if let Some(f) = lock(&self.fields).get_mut(field.0) {
                    f.draft_mut().pop();
                }
                None
            }
            Key::Char(c) => {
                if let Some(f) = lock(&self.fields).get_mut(field.0) {
                    f.draft_mut().push(c);
                }
                None
            }
        }
    }

    /// Field loses focus: commit the draft into the session
    pub fn blur(&self, field: FieldId) -> CommitOutcome {
        let draft = {
            let mut fields = lock(&self.fields);
            let Some(f) = fields.get_mut(field.0) else {
                return CommitOutcome::NotEditing;
            };
            match f.draft.take() {
                Some(draft) => draft,
                None => return CommitOutcome::NotEditing,
            }
        };
        // Lock released: set_user_id notifies our own listener

        let current = self.session.user_id();
        let user_id = match UserId::new(&draft) {
            Ok(id) => id,
            Err(_) => {
                debug!("Blank identity rejected");
                self.show(field, current.as_str());
                return CommitOutcome::Rejected;
            }
        };

        if user_id == current {
            self.show(field, current.as_str());
            return CommitOutcome::Unchanged;
        }

        let persisted = match self.session.set_user_id(user_id.clone()) {
            Ok(()) => true,
            Err(e) => {
                warn!(user_id = %user_id, error = %e, "Identity applied but not persisted");
                false
            }
        };
        CommitOutcome::Committed { user_id, persisted }
    }

    fn show(&self, field: FieldId, value: &str) {
        if let Some(f) = lock(&self.fields).get_mut(field.0) {
            f.displayed = value.to_string();
        }
    }
}
