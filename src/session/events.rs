use crate::session::token::Claims;
use tokio::sync::broadcast;

/// Capacity of the session event channel. Events are rare; a lagging receiver
/// only needs the most recent ones.
pub const EVENT_CAPACITY: usize = 16;

/// Notifications published by the gateway and consumed by every session
/// observer without a direct reference to the publisher.
///
/// Each event carries the id of the session it was raised in, so an observer
/// can ignore events that outlived a later login.
#[derive(Clone, Debug, PartialEq, Eq)]
pub enum SessionEvent {
    /// The refresh credential was rejected; the session is over.
    Expired { session: u64 },
    /// A refresh returned a new access token with these claims.
    Refreshed { session: u64, claims: Claims },
}

impl SessionEvent {
    #[must_use]
    pub fn session(&self) -> u64 {
        match self {
            Self::Expired { session } | Self::Refreshed { session, .. } => *session,
        }
    }
}

#[must_use]
pub fn channel() -> broadcast::Sender<SessionEvent> {
    broadcast::channel(EVENT_CAPACITY).0
}
