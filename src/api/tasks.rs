//! Task endpoints. All of them require a session.

use crate::{
    api::types::{Task, TaskInput, TaskListResponse, TaskPage, TaskResponse},
    error::Result,
    session::Gateway,
    transport::{ApiRequest, Transport},
};

pub const TASKS_PATH: &str = "/tasks/";
pub const DEFAULT_PAGE_SIZE: u64 = 10;

fn task_path(id: i64) -> String {
    format!("{TASKS_PATH}{id}")
}

/// Fetch one page of the signed-in user's tasks. Pages start at 1.
///
/// # Errors
/// Returns `Error::Rejected` when the server reports a failure, and gateway
/// errors unchanged.
pub async fn list<T: Transport>(gateway: &Gateway<T>, page: u64, page_size: u64) -> Result<TaskPage> {
    let page = page.max(1);
    let request = ApiRequest::get(TASKS_PATH)
        .query("page", page)
        .query("page_size", page_size.max(1));
    let response: TaskListResponse = gateway.send_json(request).await?;
    response.into_page(page)
}

/// # Errors
/// Returns `Error::Rejected` when the task does not exist.
pub async fn get<T: Transport>(gateway: &Gateway<T>, id: i64) -> Result<Task> {
    let response: TaskResponse = gateway.send_json(ApiRequest::get(task_path(id))).await?;
    response.into_task()
}

/// # Errors
/// Returns `Error::Rejected` when the server refuses the task.
pub async fn create<T: Transport>(gateway: &Gateway<T>, input: &TaskInput) -> Result<Task> {
    let request = ApiRequest::post(TASKS_PATH).json(input)?;
    let response: TaskResponse = gateway.send_json(request).await?;
    response.into_task()
}

/// # Errors
/// Returns `Error::Rejected` when the task does not exist.
pub async fn update<T: Transport>(gateway: &Gateway<T>, id: i64, input: &TaskInput) -> Result<Task> {
    let request = ApiRequest::put(task_path(id)).json(input)?;
    let response: TaskResponse = gateway.send_json(request).await?;
    response.into_task()
}

/// Delete a task and return it as it was.
///
/// # Errors
/// Returns `Error::Rejected` when the task does not exist.
pub async fn delete<T: Transport>(gateway: &Gateway<T>, id: i64) -> Result<Task> {
    let response: TaskResponse = gateway.send_json(ApiRequest::delete(task_path(id))).await?;
    response.into_task()
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::{
        error::Error,
        session::{
            gateway::{CSRF_COOKIE, REFRESH_PATH},
            testing::ScriptedTransport,
        },
    };

    fn input() -> TaskInput {
        TaskInput {
            desc: "file taxes".to_string(),
            date: "2025-04-15".to_string(),
        }
    }

    #[tokio::test]
    async fn list_reports_pagination() {
        let gateway = Gateway::new(ScriptedTransport::new());

        let page = list(&gateway, 2, DEFAULT_PAGE_SIZE).await.expect("list");

        assert_eq!(page.page, 2);
        assert_eq!(page.total_pages, 2);
        assert_eq!(page.total, 11);
        assert_eq!(page.tasks[0].task, "write report");
    }

    #[tokio::test]
    async fn crud_calls_carry_csrf_only_when_mutating() {
        let gateway = Gateway::new(ScriptedTransport::new().with_cookie(CSRF_COOKIE, "abc123"));

        let created = create(&gateway, &input()).await.expect("create");
        assert_eq!(created.task, "file taxes");
        let fetched = get(&gateway, 7).await.expect("get");
        assert_eq!(fetched.id, 7);
        let updated = update(&gateway, 7, &input()).await.expect("update");
        assert_eq!(updated.date, "2025-04-15");
        delete(&gateway, 7).await.expect("delete");

        let csrf: Vec<_> = gateway
            .transport()
            .log()
            .into_iter()
            .map(|entry| (entry.method, entry.csrf.is_some()))
            .collect();
        assert_eq!(
            csrf,
            vec![
                ("POST".to_string(), true),
                ("GET".to_string(), false),
                ("PUT".to_string(), true),
                ("DELETE".to_string(), true),
            ]
        );
    }

    #[tokio::test]
    async fn expired_access_is_recovered_transparently() {
        let gateway = Gateway::new(ScriptedTransport::new().with_access(false));

        let task = get(&gateway, 3).await.expect("get after refresh");

        assert_eq!(task.id, 3);
        assert_eq!(gateway.transport().calls(REFRESH_PATH), 1);
    }

    #[tokio::test]
    async fn terminal_session_failure_surfaces_as_unauthorized() {
        let gateway = Gateway::new(ScriptedTransport::new().with_access(false).with_refresh(false));

        let result = list(&gateway, 1, DEFAULT_PAGE_SIZE).await;

        assert!(matches!(result, Err(Error::Unauthorized(_))));
    }
}
