//! The single request path to the task API.
//!
//! Outbound, mutating requests are decorated with the anti-forgery header read
//! from the `csrf_token` cookie. Inbound, a 401 is recovered by refreshing the
//! session once and resubmitting the request, unless the request is the refresh
//! call itself or has already been retried. A rejected refresh ends the session
//! and is broadcast to every subscriber.

use crate::{
    error::{Error, Result},
    session::{
        events::{self, SessionEvent},
        refresh::RefreshCoordinator,
        token,
    },
    transport::{ApiRequest, ApiResponse, Transport},
};
use serde::de::DeserializeOwned;
use serde_json::Value;
use std::sync::atomic::{AtomicU64, Ordering};
use tokio::sync::broadcast;
use tracing::{debug, error, info, warn};

pub const CSRF_COOKIE: &str = "csrf_token";
pub const CSRF_HEADER: &str = "X-CSRF-Token";
pub const REFRESH_PATH: &str = "/auth/refresh";
/// Credential exchanges answer 401 for bad credentials, not for an expired
/// session, so they are never recovered.
const CREDENTIAL_PATHS: [&str; 2] = ["/auth/token", "/auth/register"];

/// Maximum number of error body characters surfaced to callers.
const MAX_ERROR_CHARS: usize = 200;

pub struct Gateway<T> {
    transport: T,
    refresh: RefreshCoordinator,
    events: broadcast::Sender<SessionEvent>,
    session: AtomicU64,
}

impl<T: Transport> Gateway<T> {
    #[must_use]
    pub fn new(transport: T) -> Self {
        Self {
            transport,
            refresh: RefreshCoordinator::new(),
            events: events::channel(),
            session: AtomicU64::new(0),
        }
    }

    #[must_use]
    pub fn transport(&self) -> &T {
        &self.transport
    }

    /// Subscribe to session events published by this gateway.
    #[must_use]
    pub fn subscribe(&self) -> broadcast::Receiver<SessionEvent> {
        self.events.subscribe()
    }

    /// Number of live event subscribers.
    #[must_use]
    pub fn observers(&self) -> usize {
        self.events.receiver_count()
    }

    /// Id of the current session; events raised now carry this id.
    #[must_use]
    pub fn session_id(&self) -> u64 {
        self.session.load(Ordering::SeqCst)
    }

    /// Start a new session after a credential exchange and return its id.
    /// Events raised during earlier sessions become stale.
    pub fn start_session(&self) -> u64 {
        self.session.fetch_add(1, Ordering::SeqCst) + 1
    }

    #[must_use]
    pub fn refresh_in_flight(&self) -> bool {
        self.refresh.in_flight()
    }

    /// Send a request, recovering from an expired access token.
    ///
    /// # Errors
    /// Returns `Error::Unauthorized` when the session cannot be recovered,
    /// `Error::Http` for any other non-success status, and transport errors
    /// unchanged.
    pub async fn send(&self, request: ApiRequest) -> Result<ApiResponse> {
        let mut request = request;
        loop {
            let response = self.dispatch(&request).await?;
            if response.status != 401 {
                return check_status(response);
            }

            if is_refresh_path(&request.path) {
                error!("refresh credential rejected, ending session");
                self.publish_expired();
                return Err(status_error(&response));
            }
            if is_credential_exchange(&request.path) {
                return Err(status_error(&response));
            }
            if request.retried {
                warn!("{} {} rejected after session refresh", request.method, request.path);
                return Err(status_error(&response));
            }

            self.refresh.refresh(|| self.refresh_session()).await?;
            request.retried = true;
        }
    }

    /// Send a request and decode its JSON body.
    ///
    /// # Errors
    /// Same as [`Gateway::send`], plus `Error::Parse` for an unexpected body.
    pub async fn send_json<R: DeserializeOwned>(&self, request: ApiRequest) -> Result<R> {
        self.send(request).await?.json()
    }

    /// Runs only on the leader of a refresh; followers share its outcome.
    async fn refresh_session(&self) -> Result<()> {
        info!("access token rejected, refreshing session");
        let outcome = match self.dispatch(&ApiRequest::post(REFRESH_PATH)).await {
            Ok(response) if response.is_success() => {
                self.publish_refreshed(&response);
                Ok(())
            }
            Ok(response) => Err(status_error(&response)),
            Err(err) => Err(err),
        };

        if let Err(err) = &outcome {
            error!("session refresh failed: {err}");
            self.publish_expired();
        }
        outcome
    }

    async fn dispatch(&self, request: &ApiRequest) -> Result<ApiResponse> {
        let mut request = request.clone();
        self.decorate(&mut request);
        debug!("dispatching {} {}", request.method, request.path);
        self.transport.execute(&request).await
    }

    fn decorate(&self, request: &mut ApiRequest) {
        if !request.is_mutating() || request.header_value(CSRF_HEADER).is_some() {
            return;
        }
        match self.transport.cookie(CSRF_COOKIE) {
            Some(csrf) => request.headers.push((CSRF_HEADER.to_string(), csrf)),
            None => debug!("no {CSRF_COOKIE} cookie for {} {}", request.method, request.path),
        }
    }

    fn publish_refreshed(&self, response: &ApiResponse) {
        let Ok(body) = serde_json::from_str::<Value>(&response.body) else {
            return;
        };
        let Some(raw) = body.get("access_token").and_then(Value::as_str) else {
            return;
        };
        match token::decode(raw) {
            Ok(claims) => self.publish(SessionEvent::Refreshed {
                session: self.session_id(),
                claims,
            }),
            Err(err) => warn!("ignoring refreshed access token: {err}"),
        }
    }

    fn publish_expired(&self) {
        self.publish(SessionEvent::Expired {
            session: self.session_id(),
        });
    }

    fn publish(&self, event: SessionEvent) {
        if self.events.send(event).is_err() {
            debug!("no session observers subscribed");
        }
    }
}

fn is_refresh_path(path: &str) -> bool {
    normalize_path(path) == REFRESH_PATH
}

fn is_credential_exchange(path: &str) -> bool {
    CREDENTIAL_PATHS.contains(&normalize_path(path))
}

fn normalize_path(path: &str) -> &str {
    let path = path.split('?').next().unwrap_or(path);
    path.trim_end_matches('/')
}

fn check_status(response: ApiResponse) -> Result<ApiResponse> {
    if response.is_success() {
        Ok(response)
    } else {
        Err(status_error(&response))
    }
}

fn status_error(response: &ApiResponse) -> Error {
    let message = sanitize_body(&response.body);
    if response.status == 401 {
        Error::Unauthorized(message)
    } else {
        Error::Http {
            status: response.status,
            message,
        }
    }
}

/// Sanitizes HTTP error bodies by preferring the API's `detail` field, then
/// trimming and truncating.
fn sanitize_body(body: &str) -> String {
    let detail = serde_json::from_str::<Value>(body)
        .ok()
        .and_then(|value| value.get("detail").and_then(Value::as_str).map(str::to_string));
    let message = detail.as_deref().unwrap_or(body).trim();

    if message.is_empty() {
        "Request failed.".to_string()
    } else {
        message.chars().take(MAX_ERROR_CHARS).collect()
    }
}
