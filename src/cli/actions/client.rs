//! Wiring shared by every action: one gateway over the HTTP transport, the
//! session context over the configured state file, and the sign-in and guard
//! steps a command runs before touching the API.

use crate::{
    api,
    cli::globals::GlobalArgs,
    session::{guard_for_path, FileStore, Gateway, Guard, GuardOutcome, SessionContext, SessionState, Surface},
    transport::{HttpTransport, Transport},
};
use anyhow::{bail, Context, Result};
use secrecy::ExposeSecret;
use std::sync::Arc;
use tracing::{debug, info};

pub struct Client<T: Transport = HttpTransport> {
    pub gateway: Arc<Gateway<T>>,
    pub session: SessionContext<T>,
}

impl Client {
    /// Build the client described by the global arguments.
    ///
    /// # Errors
    /// Returns an error if the API base URL is invalid.
    pub fn connect(globals: &GlobalArgs) -> Result<Self> {
        let transport = HttpTransport::new(&globals.config).context("failed to build HTTP client")?;
        debug!("using API at {}", transport.base_url());
        Ok(Self::with_transport(transport, globals))
    }
}

impl<T: Transport> Client<T> {
    pub fn with_transport(transport: T, globals: &GlobalArgs) -> Self {
        let gateway = Arc::new(Gateway::new(transport));
        let store = Arc::new(FileStore::new(&globals.config.state_file));
        let session = SessionContext::new(Arc::clone(&gateway), store);
        Self { gateway, session }
    }

    /// Confirm the remembered session, or sign in with the supplied
    /// credentials when there is none.
    ///
    /// # Errors
    /// Returns an error if the credentials are rejected.
    pub async fn resume(&self, globals: &GlobalArgs) -> Result<SessionState> {
        let state = self.session.check_auth().await;
        if state.is_authenticated() {
            return Ok(state);
        }
        match globals.credentials() {
            Some((username, password)) => {
                self.sign_in(username, password.expose_secret()).await?;
                Ok(self.session.state())
            }
            None => Ok(state),
        }
    }

    /// Exchange credentials and adopt the returned access token.
    ///
    /// # Errors
    /// Returns an error if the credentials are rejected or the token is unusable.
    pub async fn sign_in(&self, username: &str, password: &str) -> Result<()> {
        let token = api::auth::sign_in(&self.gateway, username, password)
            .await
            .context("sign in failed")?;
        let claims = self.session.login(&token.access_token)?;
        info!("signed in as {}", claims.sub);
        Ok(())
    }

    /// Evaluate the guard of `path` against the current session.
    ///
    /// # Errors
    /// Returns an error naming what is missing when the guard does not allow.
    pub fn authorize(&self, path: &str) -> Result<()> {
        match guard_for_path(path).evaluate(&self.session.state()) {
            GuardOutcome::Allow => Ok(()),
            GuardOutcome::Pending => bail!("session status is still being checked"),
            GuardOutcome::Redirect(Surface::Login) => {
                bail!("not signed in: pass --username and --password")
            }
            GuardOutcome::Redirect(Surface::Dashboard) => bail!("{path} requires the admin role"),
        }
    }
}
