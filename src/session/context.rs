//! Session state shared with every consumer of the client.
//!
//! The context owns the remembered identity and its lifecycle: hydrating it
//! from the credential store, confirming it with the server, and tearing it
//! down on logout or when the gateway reports that the refresh credential was
//! rejected. State changes are published on a `watch` channel so guards and
//! views can react without holding a reference to the context.

use crate::{
    error::{Error, Result},
    session::{
        events::SessionEvent,
        gateway::Gateway,
        store::CredentialStore,
        token::{self, Claims},
    },
    transport::{ApiRequest, Transport},
};
use std::sync::Arc;
use tokio::{
    sync::{broadcast, broadcast::error::RecvError, watch},
    task::JoinHandle,
};
use tracing::{debug, info, warn};

pub const ME_PATH: &str = "/auth/me";
pub const LOGOUT_PATH: &str = "/auth/logout";

#[derive(Clone, Debug, Default, PartialEq, Eq)]
pub enum SessionState {
    /// Authentication status has not been determined yet.
    #[default]
    Unknown,
    /// A verification call is outstanding.
    Checking,
    Authenticated(Claims),
    Unauthenticated,
}

impl SessionState {
    #[must_use]
    pub fn claims(&self) -> Option<&Claims> {
        match self {
            Self::Authenticated(claims) => Some(claims),
            _ => None,
        }
    }

    #[must_use]
    pub fn is_authenticated(&self) -> bool {
        matches!(self, Self::Authenticated(_))
    }

    /// True until a check has settled.
    #[must_use]
    pub fn is_pending(&self) -> bool {
        matches!(self, Self::Unknown | Self::Checking)
    }
}

struct Inner<T> {
    gateway: Arc<Gateway<T>>,
    store: Arc<dyn CredentialStore>,
    state: watch::Sender<SessionState>,
}

impl<T: Transport> Inner<T> {
    fn set(&self, next: SessionState) {
        let previous = self.state.send_replace(next);
        debug!("session state {previous:?} -> {:?}", *self.state.borrow());
    }

    /// Clears storage and memory together; neither is ever cleared alone.
    /// The store is touched while the state is locked so a concurrent
    /// refresh cannot write it back in between.
    fn end_session(&self) {
        self.state.send_modify(|state| {
            self.store.clear();
            debug!("session state {state:?} -> Unauthenticated");
            *state = SessionState::Unauthenticated;
        });
    }

    /// Checks and updates under the state lock; see [`Self::end_session`].
    fn apply_refreshed(&self, claims: Claims) {
        self.state.send_if_modified(|state| match state {
            SessionState::Authenticated(current) => {
                if let Err(err) = self.store.save(&claims) {
                    warn!("failed to persist refreshed session: {err}");
                }
                *current = claims;
                true
            }
            SessionState::Checking => {
                if let Err(err) = self.store.save(&claims) {
                    warn!("failed to persist refreshed session: {err}");
                }
                false
            }
            SessionState::Unknown | SessionState::Unauthenticated => false,
        });
    }
}

pub struct SessionContext<T: Transport> {
    inner: Arc<Inner<T>>,
    listener: JoinHandle<()>,
}

impl<T: Transport> SessionContext<T> {
    /// Create the context and subscribe to the gateway's session events.
    ///
    /// Must be called from within a Tokio runtime.
    pub fn new(gateway: Arc<Gateway<T>>, store: Arc<dyn CredentialStore>) -> Self {
        let (state, _) = watch::channel(SessionState::Unknown);
        let inner = Arc::new(Inner {
            gateway,
            store,
            state,
        });
        let events = inner.gateway.subscribe();
        let listener = tokio::spawn(listen(Arc::clone(&inner), events));

        Self { inner, listener }
    }

    #[must_use]
    pub fn gateway(&self) -> &Arc<Gateway<T>> {
        &self.inner.gateway
    }

    #[must_use]
    pub fn state(&self) -> SessionState {
        self.inner.state.borrow().clone()
    }

    #[must_use]
    pub fn claims(&self) -> Option<Claims> {
        self.inner.state.borrow().claims().cloned()
    }

    #[must_use]
    pub fn is_authenticated(&self) -> bool {
        self.inner.state.borrow().is_authenticated()
    }

    /// Observe state transitions.
    #[must_use]
    pub fn subscribe(&self) -> watch::Receiver<SessionState> {
        self.inner.state.subscribe()
    }

    /// Determine whether the remembered identity is still accepted by the
    /// server. Without a remembered identity no request is made.
    pub async fn check_auth(&self) -> SessionState {
        let Some(claims) = self.inner.store.load() else {
            self.inner.set(SessionState::Unauthenticated);
            return self.state();
        };

        self.inner.set(SessionState::Checking);
        match self.inner.gateway.send(ApiRequest::get(ME_PATH)).await {
            Ok(_) => {
                // A refresh during the check may have stored newer claims.
                let claims = self.inner.store.load().unwrap_or(claims);
                if let Err(err) = self.inner.store.save(&claims) {
                    warn!("failed to persist confirmed session: {err}");
                }
                info!("session confirmed for {}", claims.sub);
                self.inner.set(SessionState::Authenticated(claims));
            }
            Err(err) => {
                info!("session check failed: {err}");
                self.inner.end_session();
            }
        }
        self.state()
    }

    /// Adopt the access token returned by a completed credential exchange.
    /// The server has already set the session cookies; no request is made.
    ///
    /// # Errors
    /// Returns `Error::MalformedToken` or `Error::TokenExpired` when the token
    /// cannot identify a live session, and `Error::Storage` if it cannot be
    /// persisted. The session is unauthenticated afterwards in every case.
    pub fn login(&self, raw_token: &str) -> Result<Claims> {
        let claims = match token::decode(raw_token) {
            Ok(claims) if claims.is_expired() => {
                self.inner.end_session();
                return Err(Error::TokenExpired);
            }
            Ok(claims) => claims,
            Err(err) => {
                self.inner.end_session();
                return Err(err);
            }
        };

        if let Err(err) = self.inner.store.save(&claims) {
            self.inner.end_session();
            return Err(err);
        }

        let session = self.inner.gateway.start_session();
        info!(session, "signed in as {} ({})", claims.sub, claims.role);
        self.inner.set(SessionState::Authenticated(claims.clone()));
        Ok(claims)
    }

    /// Invalidate the session on the server when possible, then always clear
    /// it locally. Calling it while signed out only clears stale storage.
    pub async fn logout(&self) {
        if let Err(err) = self.inner.gateway.send(ApiRequest::post(LOGOUT_PATH)).await {
            warn!("logout request failed: {err}");
        }
        self.inner.end_session();
        info!("signed out");
    }
}

impl<T: Transport> Drop for SessionContext<T> {
    fn drop(&mut self) {
        self.listener.abort();
    }
}

async fn listen<T: Transport>(inner: Arc<Inner<T>>, mut events: broadcast::Receiver<SessionEvent>) {
    loop {
        let event = match events.recv().await {
            Ok(event) => event,
            Err(RecvError::Lagged(skipped)) => {
                warn!("missed {skipped} session events");
                continue;
            }
            Err(RecvError::Closed) => break,
        };

        let current = inner.gateway.session_id();
        if event.session() != current {
            debug!(
                "ignoring event from session {} (current {current})",
                event.session()
            );
            continue;
        }

        match event {
            SessionEvent::Expired { .. } => {
                info!("session expired, signing out");
                inner.end_session();
            }
            SessionEvent::Refreshed { claims, .. } => inner.apply_refreshed(claims),
        }
    }
}
