use crate::config::AppConfig;
use secrecy::SecretString;

/// Settings every action needs: the resolved client configuration and the
/// credentials to sign in with when no session is active.
#[derive(Debug, Clone)]
pub struct GlobalArgs {
    pub config: AppConfig,
    pub username: Option<String>,
    pub password: Option<SecretString>,
}

impl GlobalArgs {
    #[must_use]
    pub fn new(config: AppConfig) -> Self {
        Self {
            config,
            username: None,
            password: None,
        }
    }

    pub fn set_credentials(&mut self, username: String, password: SecretString) {
        self.username = Some(username);
        self.password = Some(password);
    }

    /// Both halves of the credentials, when supplied.
    #[must_use]
    pub fn credentials(&self) -> Option<(&str, &SecretString)> {
        self.username.as_deref().zip(self.password.as_ref())
    }
}
