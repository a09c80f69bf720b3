//! Synchronous gates over the current session state.
//!
//! Guards only decide what a surface may show; they never touch the network.
//! Access control proper is enforced by the API on every request.

use crate::session::{context::SessionState, token::Role};

/// Surfaces a guard can send the user to.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum Surface {
    Login,
    /// Landing surface for signed-in users without the required privilege.
    Dashboard,
}

impl Surface {
    #[must_use]
    pub fn path(self) -> &'static str {
        match self {
            Self::Login => "/login",
            Self::Dashboard => "/dashboard",
        }
    }
}

#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum GuardOutcome {
    Allow,
    /// Authentication status is still being determined.
    Pending,
    Redirect(Surface),
}

/// Result of rendering through a guard.
#[derive(Debug, PartialEq, Eq)]
pub enum Gated<R> {
    Rendered(R),
    Pending,
    Redirect(Surface),
}

pub trait Guard {
    fn evaluate(&self, state: &SessionState) -> GuardOutcome;

    /// Both guards must allow; the first outcome that does not allow wins.
    fn and<G: Guard>(self, other: G) -> Both<Self, G>
    where
        Self: Sized,
    {
        Both(self, other)
    }

    /// Invoke `render` only when the guard allows.
    fn gate<R, F>(&self, state: &SessionState, render: F) -> Gated<R>
    where
        Self: Sized,
        F: FnOnce() -> R,
    {
        match self.evaluate(state) {
            GuardOutcome::Allow => Gated::Rendered(render()),
            GuardOutcome::Pending => Gated::Pending,
            GuardOutcome::Redirect(surface) => Gated::Redirect(surface),
        }
    }
}

#[derive(Clone, Copy, Debug, Default)]
pub struct RequireAuthenticated;

impl Guard for RequireAuthenticated {
    fn evaluate(&self, state: &SessionState) -> GuardOutcome {
        match state {
            SessionState::Unknown | SessionState::Checking => GuardOutcome::Pending,
            SessionState::Authenticated(_) => GuardOutcome::Allow,
            SessionState::Unauthenticated => GuardOutcome::Redirect(Surface::Login),
        }
    }
}

#[derive(Clone, Copy, Debug)]
pub struct RequireRole(pub Role);

impl Guard for RequireRole {
    fn evaluate(&self, state: &SessionState) -> GuardOutcome {
        if state.is_pending() {
            return GuardOutcome::Pending;
        }
        match state.claims() {
            Some(claims) if claims.role == self.0 => GuardOutcome::Allow,
            _ => GuardOutcome::Redirect(Surface::Dashboard),
        }
    }
}

#[derive(Clone, Copy, Debug)]
pub struct Both<A, B>(A, B);

impl<A: Guard, B: Guard> Guard for Both<A, B> {
    fn evaluate(&self, state: &SessionState) -> GuardOutcome {
        match self.0.evaluate(state) {
            GuardOutcome::Allow => self.1.evaluate(state),
            blocked => blocked,
        }
    }
}

/// Guard attached to a route by path prefix.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum RouteGuard {
    Open,
    Authenticated,
    Admin,
}

impl Guard for RouteGuard {
    fn evaluate(&self, state: &SessionState) -> GuardOutcome {
        match self {
            Self::Open => GuardOutcome::Allow,
            Self::Authenticated => RequireAuthenticated.evaluate(state),
            Self::Admin => RequireAuthenticated
                .and(RequireRole(Role::Admin))
                .evaluate(state),
        }
    }
}

#[must_use]
pub fn guard_for_path(path: &str) -> RouteGuard {
    if has_prefix(path, "/admin") {
        RouteGuard::Admin
    } else if has_prefix(path, "/dashboard") {
        RouteGuard::Authenticated
    } else {
        RouteGuard::Open
    }
}

fn has_prefix(path: &str, prefix: &str) -> bool {
    path.strip_prefix(prefix)
        .is_some_and(|rest| rest.is_empty() || rest.starts_with('/') || rest.starts_with('?'))
}
