//! Typed wrappers over the task API endpoints.
//!
//! Every call goes through a [`Gateway`](crate::session::Gateway), so expired
//! access tokens are refreshed and mutating calls carry the CSRF header without
//! the wrappers knowing about either.

pub mod admin;
pub mod auth;
pub mod tasks;
pub mod types;

pub use self::types::{
    ResponseBoolean, Task, TaskInput, TaskListResponse, TaskPage, TaskResponse, TokenResponse, User,
    UserSummary, UsersResponse,
};
