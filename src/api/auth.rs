//! Credential exchange and account endpoints.

use crate::{
    api::types::{ResponseBoolean, TokenResponse, User},
    error::{Error, Result},
    session::Gateway,
    transport::{ApiRequest, Transport},
};
use regex::Regex;
use thiserror::Error as ThisError;
use tracing::{debug, info};

pub const TOKEN_PATH: &str = "/auth/token";
pub const REGISTER_PATH: &str = "/auth/register";
pub const CHECK_USER_PATH: &str = "/auth/check-user-exists";
pub const ME_PATH: &str = "/auth/me";

const MIN_USERNAME_LEN: usize = 5;
const MIN_PASSWORD_LEN: usize = 8;
const PASSWORD_SPECIALS: &str = "!@#$%^&*";

/// Exchange credentials for an access token. The server also sets the session
/// cookies, which stay in the transport's jar.
///
/// # Errors
/// Returns `Error::Unauthorized` for rejected credentials.
pub async fn sign_in<T: Transport>(gateway: &Gateway<T>, username: &str, password: &str) -> Result<TokenResponse> {
    debug!("signing in as {username}");
    let request = ApiRequest::post(TOKEN_PATH).form(&[("username", username), ("password", password)]);
    gateway.send_json(request).await
}

/// Create an account. Run [`validate_registration`] first.
///
/// # Errors
/// Returns `Error::Http` when the server refuses the registration.
pub async fn register<T: Transport>(gateway: &Gateway<T>, username: &str, password: &str) -> Result<User> {
    let request = ApiRequest::post(REGISTER_PATH).form(&[("username", username), ("password", password)]);
    let user: User = gateway.send_json(request).await?;
    info!("registered {}", user.username);
    Ok(user)
}

/// Whether the username is already registered.
///
/// # Errors
/// Returns `Error::Rejected` if the server cannot answer.
pub async fn username_taken<T: Transport>(gateway: &Gateway<T>, username: &str) -> Result<bool> {
    let request = ApiRequest::get(CHECK_USER_PATH).query("username", username);
    let response: ResponseBoolean = gateway.send_json(request).await?;
    if response.success {
        Ok(response.message)
    } else {
        Err(Error::Rejected(
            response
                .error
                .unwrap_or_else(|| "Registration check failed".to_string()),
        ))
    }
}

/// The user behind the current session.
///
/// # Errors
/// Returns `Error::Unauthorized` when there is no session to recover.
pub async fn me<T: Transport>(gateway: &Gateway<T>) -> Result<User> {
    gateway.send_json(ApiRequest::get(ME_PATH)).await
}

#[derive(Clone, Copy, Debug, PartialEq, Eq, ThisError)]
pub enum RegistrationError {
    #[error("Username or Password is too short.")]
    TooShort,
    #[error("Password must contain at least one number and one special character.")]
    PasswordCharacters,
    #[error("The passwords do not match.")]
    PasswordMismatch,
    #[error("Username can only contain letters, numbers, and underscores.")]
    UsernameCharacters,
    #[error("Password must contain both uppercase and lowercase letters.")]
    PasswordCase,
}

/// Check a registration form before it is submitted. Rules are applied in a
/// fixed order and the first failure is returned.
///
/// # Errors
/// Returns the first rule the form breaks.
pub fn validate_registration(username: &str, password: &str, confirm: &str) -> Result<(), RegistrationError> {
    if username.chars().count() < MIN_USERNAME_LEN
        || password.chars().count() < MIN_PASSWORD_LEN
        || confirm.chars().count() < MIN_PASSWORD_LEN
    {
        return Err(RegistrationError::TooShort);
    }

    let allowed = Regex::new(r"^[a-zA-Z0-9!@#$%^&*]{8,}$").is_ok_and(|re| re.is_match(password));
    let has_digit = password.chars().any(|c| c.is_ascii_digit());
    let has_special = password.chars().any(|c| PASSWORD_SPECIALS.contains(c));
    if !(allowed && has_digit && has_special) {
        return Err(RegistrationError::PasswordCharacters);
    }

    if password != confirm {
        return Err(RegistrationError::PasswordMismatch);
    }

    if !Regex::new(r"^[a-zA-Z0-9_]+$").is_ok_and(|re| re.is_match(username)) {
        return Err(RegistrationError::UsernameCharacters);
    }

    if !password.chars().any(|c| c.is_ascii_uppercase()) || !password.chars().any(|c| c.is_ascii_lowercase()) {
        return Err(RegistrationError::PasswordCase);
    }

    Ok(())
}
