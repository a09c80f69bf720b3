use crate::{
    error::{Error, Result},
    session::Role,
};
use serde::{Deserialize, Serialize};

#[derive(Clone, Debug, Deserialize, Serialize, PartialEq, Eq)]
pub struct Task {
    pub id: i64,
    pub task: String,
    /// Due date, `YYYY-MM-DD`.
    pub date: String,
}

/// Body of task create and update requests.
#[derive(Clone, Debug, Deserialize, Serialize, PartialEq, Eq)]
pub struct TaskInput {
    pub desc: String,
    pub date: String,
}

#[derive(Clone, Debug, Deserialize, Serialize, PartialEq, Eq)]
pub struct TaskResponse {
    pub success: bool,
    #[serde(default)]
    pub task: Option<Task>,
    #[serde(default)]
    pub error: Option<String>,
}

impl TaskResponse {
    /// Unwrap the envelope.
    ///
    /// # Errors
    /// Returns `Error::Rejected` when the server reports a failure or omits the
    /// task.
    pub fn into_task(self) -> Result<Task> {
        match (self.success, self.task) {
            (true, Some(task)) => Ok(task),
            _ => Err(rejected(self.error)),
        }
    }
}

#[derive(Clone, Debug, Deserialize, Serialize, PartialEq, Eq)]
pub struct TaskListResponse {
    pub success: bool,
    #[serde(default)]
    pub tasks: Vec<Task>,
    #[serde(default)]
    pub error: Option<String>,
    #[serde(default)]
    pub total: Option<u64>,
    #[serde(default)]
    pub total_pages: Option<u64>,
    #[serde(default)]
    pub page: Option<u64>,
}

/// One page of tasks.
#[derive(Clone, Debug, PartialEq, Eq)]
pub struct TaskPage {
    pub tasks: Vec<Task>,
    pub page: u64,
    pub total_pages: u64,
    pub total: u64,
}

impl TaskListResponse {
    /// Unwrap the envelope, filling pagination fields older servers omit.
    ///
    /// # Errors
    /// Returns `Error::Rejected` when the server reports a failure.
    pub fn into_page(self, requested_page: u64) -> Result<TaskPage> {
        if !self.success {
            return Err(rejected(self.error));
        }
        let count = self.tasks.len() as u64;
        Ok(TaskPage {
            page: self.page.unwrap_or(requested_page),
            total_pages: self.total_pages.unwrap_or(1),
            total: self.total.unwrap_or(count),
            tasks: self.tasks,
        })
    }
}

#[derive(Clone, Debug, Deserialize, Serialize, PartialEq, Eq)]
pub struct TokenResponse {
    pub access_token: String,
    pub token_type: String,
}

/// The signed-in user as reported by `/auth/me`.
#[derive(Clone, Debug, Deserialize, Serialize, PartialEq, Eq)]
pub struct User {
    pub username: String,
    #[serde(default)]
    pub role: Option<Role>,
    #[serde(default)]
    pub disabled: bool,
}

#[derive(Clone, Debug, Deserialize, Serialize, PartialEq, Eq)]
pub struct UserSummary {
    pub id: i64,
    pub username: String,
    pub role: Role,
    pub disabled: bool,
}

#[derive(Clone, Debug, Deserialize, Serialize, PartialEq, Eq)]
pub struct UsersResponse {
    pub success: bool,
    #[serde(default)]
    pub error: Option<String>,
    #[serde(default)]
    pub users: Vec<UserSummary>,
}

impl UsersResponse {
    /// # Errors
    /// Returns `Error::Rejected` when the server reports a failure.
    pub fn into_users(self) -> Result<Vec<UserSummary>> {
        if self.success {
            Ok(self.users)
        } else {
            Err(rejected(self.error))
        }
    }
}

#[derive(Clone, Debug, Deserialize, Serialize, PartialEq, Eq)]
pub struct ResponseBoolean {
    pub message: bool,
    #[serde(default)]
    pub error: Option<String>,
    pub success: bool,
}

fn rejected(error: Option<String>) -> Error {
    Error::Rejected(error.unwrap_or_else(|| "Request failed.".to_string()))
}
