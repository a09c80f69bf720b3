//! In-memory API double used by the session tests.

use crate::{
    error::Result,
    session::gateway::{CSRF_HEADER, REFRESH_PATH},
    session::token::unsigned_token,
    transport::{ApiRequest, ApiResponse, RequestBody, Transport},
};
use serde_json::{json, Value};
use std::{
    collections::HashMap,
    sync::{Mutex, MutexGuard, PoisonError},
    time::Duration,
};

#[derive(Clone, Debug)]
pub(crate) struct Recorded {
    pub method: String,
    pub path: String,
    pub retried: bool,
    pub csrf: Option<String>,
    /// Refresh calls that had completed when this request was executed.
    pub refreshes_settled: usize,
}

struct Server {
    access_valid: bool,
    refresh_valid: bool,
    refresh_grants_access: bool,
    refresh_body: Value,
    refresh_delay: Duration,
    logout_status: u16,
    refreshes_settled: usize,
    cookies: HashMap<String, String>,
    log: Vec<Recorded>,
}

pub(crate) struct ScriptedTransport {
    server: Mutex<Server>,
}

impl ScriptedTransport {
    pub(crate) fn new() -> Self {
        Self {
            server: Mutex::new(Server {
                access_valid: true,
                refresh_valid: true,
                refresh_grants_access: true,
                refresh_body: json!({}),
                refresh_delay: Duration::ZERO,
                logout_status: 200,
                refreshes_settled: 0,
                cookies: HashMap::new(),
                log: Vec::new(),
            }),
        }
    }

    pub(crate) fn with_access(self, valid: bool) -> Self {
        self.lock().access_valid = valid;
        self
    }

    pub(crate) fn with_refresh(self, valid: bool) -> Self {
        self.lock().refresh_valid = valid;
        self
    }

    pub(crate) fn with_refresh_grants_access(self, grants: bool) -> Self {
        self.lock().refresh_grants_access = grants;
        self
    }

    pub(crate) fn with_refresh_body(self, body: Value) -> Self {
        self.lock().refresh_body = body;
        self
    }

    pub(crate) fn with_refresh_delay_ms(self, millis: u64) -> Self {
        self.lock().refresh_delay = Duration::from_millis(millis);
        self
    }

    pub(crate) fn with_logout_status(self, status: u16) -> Self {
        self.lock().logout_status = status;
        self
    }

    pub(crate) fn with_cookie(self, name: &str, value: &str) -> Self {
        self.lock()
            .cookies
            .insert(name.to_string(), value.to_string());
        self
    }

    pub(crate) fn log(&self) -> Vec<Recorded> {
        self.lock().log.clone()
    }

    pub(crate) fn calls(&self, path: &str) -> usize {
        self.lock()
            .log
            .iter()
            .filter(|entry| entry.path == path)
            .count()
    }

    pub(crate) fn total_calls(&self) -> usize {
        self.lock().log.len()
    }

    fn lock(&self) -> MutexGuard<'_, Server> {
        self.server.lock().unwrap_or_else(PoisonError::into_inner)
    }

    fn record(&self, request: &ApiRequest) {
        let mut server = self.lock();
        let refreshes_settled = server.refreshes_settled;
        server.log.push(Recorded {
            method: request.method.to_string(),
            path: request.path.clone(),
            retried: request.retried,
            csrf: request.header_value(CSRF_HEADER).map(str::to_string),
            refreshes_settled,
        });
    }

    async fn refresh(&self) -> ApiResponse {
        let delay = self.lock().refresh_delay;
        if !delay.is_zero() {
            tokio::time::sleep(delay).await;
        }

        let mut server = self.lock();
        server.refreshes_settled += 1;
        if !server.refresh_valid {
            return ApiResponse::new(401, r#"{"detail":"Invalid refresh token"}"#);
        }
        if server.refresh_grants_access {
            server.access_valid = true;
        }
        ApiResponse::new(200, server.refresh_body.to_string())
    }

    fn respond(&self, request: &ApiRequest) -> ApiResponse {
        let mut server = self.lock();
        let method = request.method.as_str();
        let path = request.path.as_str();

        match (method, path) {
            ("POST", "/auth/logout") => {
                server.access_valid = false;
                return ApiResponse::new(server.logout_status, "{}");
            }
            ("POST", "/auth/token") => return server.sign_in(request),
            ("POST", "/auth/register") => return register(request),
            ("GET", "/auth/check-user-exists") => {
                let taken = query_value(request, "username") == Some(TAKEN_USERNAME);
                return ApiResponse::new(200, json!({"message": taken, "success": true}).to_string());
            }
            _ => {}
        }

        let protected = path == "/auth/me" || path.starts_with("/tasks") || path.starts_with("/admin");
        if !protected {
            return ApiResponse::new(404, r#"{"detail":"Not Found"}"#);
        }
        if !server.access_valid {
            return ApiResponse::new(401, r#"{"detail":"Could not validate credentials"}"#);
        }

        match (method, path) {
            ("GET", "/auth/me") => {
                ApiResponse::new(200, r#"{"username":"alice","role":"user","disabled":false}"#)
            }
            ("GET", "/admin/users") => ApiResponse::new(
                200,
                json!({"success": true, "users": [
                    {"id": 1, "username": "root", "role": "admin", "disabled": false},
                    {"id": 2, "username": "alice", "role": "user", "disabled": false},
                ]})
                .to_string(),
            ),
            ("GET", "/tasks/") => {
                let page = query_value(request, "page").and_then(|page| page.parse::<u64>().ok());
                ApiResponse::new(
                    200,
                    json!({
                        "success": true,
                        "tasks": [{"id": 1, "task": "write report", "date": "2025-01-31"}],
                        "total": 11,
                        "total_pages": 2,
                        "page": page,
                    })
                    .to_string(),
                )
            }
            ("POST", "/tasks/") => task_response(1, request),
            (_, task_path) => match task_path.strip_prefix("/tasks/").and_then(|id| id.parse::<i64>().ok()) {
                Some(id) => task_response(id, request),
                None => ApiResponse::new(404, r#"{"detail":"Not Found"}"#),
            },
        }
    }
}

pub(crate) const VALID_PASSWORD: &str = "S3cret!pw";
pub(crate) const TAKEN_USERNAME: &str = "alice";
const FUTURE_EXP: i64 = 4_102_444_800;

impl Server {
    fn sign_in(&mut self, request: &ApiRequest) -> ApiResponse {
        let username = form_value(request, "username").unwrap_or_default().to_string();
        if form_value(request, "password") != Some(VALID_PASSWORD) {
            return ApiResponse::new(401, r#"{"detail":"Incorrect username or password"}"#);
        }
        self.access_valid = true;
        self.cookies.insert("csrf_token".to_string(), format!("csrf-{username}"));
        let role = if username == "root" { "admin" } else { "user" };
        let access = unsigned_token(&json!({"sub": username, "role": role, "exp": FUTURE_EXP, "type": "access"}));
        ApiResponse::new(200, json!({"access_token": access, "token_type": "bearer"}).to_string())
    }
}

fn register(request: &ApiRequest) -> ApiResponse {
    let username = form_value(request, "username").unwrap_or_default();
    if username == TAKEN_USERNAME {
        return ApiResponse::new(400, r#"{"detail":"Username already registered"}"#);
    }
    ApiResponse::new(
        200,
        json!({"username": username, "role": "user", "disabled": false}).to_string(),
    )
}

fn task_response(id: i64, request: &ApiRequest) -> ApiResponse {
    let (desc, date) = match &request.body {
        RequestBody::Json(body) => (
            body.get("desc").and_then(Value::as_str).unwrap_or_default().to_string(),
            body.get("date").and_then(Value::as_str).unwrap_or_default().to_string(),
        ),
        _ => ("write report".to_string(), "2025-01-31".to_string()),
    };
    ApiResponse::new(
        200,
        json!({"success": true, "task": {"id": id, "task": desc, "date": date}}).to_string(),
    )
}

fn form_value<'a>(request: &'a ApiRequest, name: &str) -> Option<&'a str> {
    match &request.body {
        RequestBody::Form(fields) => fields
            .iter()
            .find(|(key, _)| key == name)
            .map(|(_, value)| value.as_str()),
        _ => None,
    }
}

fn query_value<'a>(request: &'a ApiRequest, name: &str) -> Option<&'a str> {
    request
        .query
        .iter()
        .find(|(key, _)| key == name)
        .map(|(_, value)| value.as_str())
}

impl Transport for ScriptedTransport {
    async fn execute(&self, request: &ApiRequest) -> Result<ApiResponse> {
        self.record(request);
        if request.method.as_str() == "POST" && request.path == REFRESH_PATH {
            return Ok(self.refresh().await);
        }
        Ok(self.respond(request))
    }

    fn cookie(&self, name: &str) -> Option<String> {
        self.lock().cookies.get(name).cloned()
    }
}
