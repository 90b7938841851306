//! Authentication session context
//!
//! The session is an explicit object handed to every component that needs
//! the signed-in user or the access credential. Auth events replace the
//! current session and are broadcast to subscribers. Tokens are issued
//! elsewhere; this type only carries them.

use std::sync::Arc;

use tokio::sync::{broadcast, watch};
use tracing::{debug, info};

use crate::models::UserId;
use crate::{Error, Result};

/// Default broadcast buffer for auth events
const DEFAULT_EVENT_CAPACITY: usize = 16;

/// Signed-in user and the credential sent with store calls
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Session {
    pub user_id: UserId,
    pub access_token: String,
    pub email: Option<String>,
}

/// Authentication state changes
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum AuthEvent {
    SignedIn(Session),
    TokenRefreshed(Session),
    SignedOut,
}

impl AuthEvent {
    fn session(&self) -> Option<Session> {
        match self {
            AuthEvent::SignedIn(s) | AuthEvent::TokenRefreshed(s) => Some(s.clone()),
            AuthEvent::SignedOut => None,
        }
    }
}

/// Process-wide authentication state, passed explicitly
#[derive(Debug)]
pub struct SessionContext {
    current: watch::Sender<Option<Session>>,
    events: broadcast::Sender<AuthEvent>,
}

impl SessionContext {
    /// Context with no signed-in user
    pub fn new() -> Arc<Self> {
        Self::with_session(None)
    }

    /// Context starting from a restored session
    pub fn with_session(session: Option<Session>) -> Arc<Self> {
        let (current, _) = watch::channel(session);
        let (events, _) = broadcast::channel(DEFAULT_EVENT_CAPACITY);
        Arc::new(Self { current, events })
    }

    /// Snapshot of the current session
    pub fn current(&self) -> Option<Session> {
        self.current.borrow().clone()
    }

    /// Current user id, or `Unauthenticated`
    pub fn require_user(&self) -> Result<UserId> {
        self.current
            .borrow()
            .as_ref()
            .map(|s| s.user_id)
            .ok_or(Error::Unauthenticated)
    }

    /// Access token of the current session
    pub fn access_token(&self) -> Option<String> {
        self.current.borrow().as_ref().map(|s| s.access_token.clone())
    }

    /// Apply an auth event: replace the session, then notify subscribers
    pub fn apply(&self, event: AuthEvent) {
        let session = event.session();
        match &session {
            Some(s) => info!(user_id = %s.user_id, "Session updated"),
            None => info!("Session cleared"),
        }
        self.current.send_replace(session);

        // No subscribers is fine; the state above is already replaced
        if self.events.send(event).is_err() {
            debug!("Auth event emitted with no subscribers");
        }
    }

    /// Listen for future auth events
    pub fn subscribe(self: &Arc<Self>) -> SessionSubscription {
        SessionSubscription {
            events: Some(self.events.subscribe()),
            current: self.current.subscribe(),
        }
    }

    /// Number of live subscriptions
    pub fn subscriber_count(&self) -> usize {
        self.events.receiver_count()
    }
}

/// Live listener on a [`SessionContext`]
///
/// Dropping the subscription, or calling [`unsubscribe`](Self::unsubscribe),
/// tears the listener down.
#[derive(Debug)]
pub struct SessionSubscription {
    events: Option<broadcast::Receiver<AuthEvent>>,
    current: watch::Receiver<Option<Session>>,
}

impl SessionSubscription {
    /// Wait for the next auth event. `None` once unsubscribed or when the
    /// context is gone.
    pub async fn next_event(&mut self) -> Option<AuthEvent> {
        let events = self.events.as_mut()?;
        loop {
            match events.recv().await {
                Ok(event) => return Some(event),
                Err(broadcast::error::RecvError::Lagged(skipped)) => {
                    // Intermediate events are superseded by later ones
                    debug!(skipped, "Auth subscriber lagged");
                }
                Err(broadcast::error::RecvError::Closed) => return None,
            }
        }
    }

    /// Session as last published
    pub fn session(&self) -> Option<Session> {
        self.current.borrow().clone()
    }

    pub fn is_active(&self) -> bool {
        self.events.is_some()
    }

    /// Stop listening
    pub fn unsubscribe(&mut self) {
        self.events = None;
    }
}
