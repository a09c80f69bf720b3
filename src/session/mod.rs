//! Client-side session lifecycle.
//!
//! - [`token`] decodes access-token claims without verifying the signature.
//! - [`store`] persists the claims of the signed-in user.
//! - [`gateway`] is the only request path to the API: CSRF decoration and
//!   401 recovery through a single-flight [`refresh`].
//! - [`context`] owns the session state and reacts to gateway [`events`].
//! - [`guards`] gate surfaces on that state.

pub mod context;
pub mod events;
pub mod gateway;
pub mod guards;
pub mod refresh;
pub mod store;
pub mod token;

#[cfg(test)]
pub(crate) mod testing;

pub use self::context::{SessionContext, SessionState};
pub use self::events::SessionEvent;
pub use self::gateway::Gateway;
pub use self::guards::{guard_for_path, Guard, GuardOutcome, RouteGuard, Surface};
pub use self::store::{CredentialStore, FileStore, MemoryStore};
pub use self::token::{Claims, Role};
