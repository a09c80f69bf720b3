use crate::{
    api::types::{UserSummary, UsersResponse},
    error::Result,
    session::Gateway,
    transport::{ApiRequest, Transport},
};

pub const USERS_PATH: &str = "/admin/users";

/// Every registered account. The server rejects non-admin sessions.
///
/// # Errors
/// Returns `Error::Http` with status 403 for non-admin sessions and
/// `Error::Rejected` when the server reports a failure.
pub async fn list_users<T: Transport>(gateway: &Gateway<T>) -> Result<Vec<UserSummary>> {
    let response: UsersResponse = gateway.send_json(ApiRequest::get(USERS_PATH)).await?;
    response.into_users()
}
