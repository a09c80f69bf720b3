//! HTTP transport for the task API.
//!
//! A transport performs exactly one exchange per call and owns the cookie jar.
//! The session core reads only script-readable cookies through
//! [`Transport::cookie`]; the `HttpOnly` access and refresh cookies set by the
//! server stay inside the jar and are replayed by the client without ever
//! being inspected.
//!
//! [`HttpTransport`] mirrors its jar to [`AppConfig::cookie_file`] so a session
//! started by one process can be resumed by the next. The file is readable by
//! the owner only.

use crate::{
    config::AppConfig,
    error::{Error, Result},
    APP_USER_AGENT,
};
use reqwest::{cookie::CookieStore as _, header::SET_COOKIE, Client, Method};
use reqwest_cookie_store::{CookieStore, CookieStoreMutex};
use serde::{de::DeserializeOwned, Serialize};
use serde_json::Value;
use std::{
    fs::{self, File, OpenOptions},
    future::Future,
    io::{BufReader, ErrorKind, Write},
    path::{Path, PathBuf},
    sync::{Arc, PoisonError},
    time::Duration,
};
use tracing::{debug, warn, Instrument};
use url::Url;

#[derive(Clone, Debug, PartialEq)]
pub enum RequestBody {
    Empty,
    Json(Value),
    Form(Vec<(String, String)>),
}

/// A request as seen by the gateway interceptors.
#[derive(Clone, Debug)]
pub struct ApiRequest {
    pub method: Method,
    pub path: String,
    pub query: Vec<(String, String)>,
    pub headers: Vec<(String, String)>,
    pub body: RequestBody,
    /// Set once the request has been resubmitted after a session refresh.
    pub retried: bool,
}

impl ApiRequest {
    #[must_use]
    pub fn new(method: Method, path: impl Into<String>) -> Self {
        Self {
            method,
            path: path.into(),
            query: Vec::new(),
            headers: Vec::new(),
            body: RequestBody::Empty,
            retried: false,
        }
    }

    #[must_use]
    pub fn get(path: impl Into<String>) -> Self {
        Self::new(Method::GET, path)
    }

    #[must_use]
    pub fn post(path: impl Into<String>) -> Self {
        Self::new(Method::POST, path)
    }

    #[must_use]
    pub fn put(path: impl Into<String>) -> Self {
        Self::new(Method::PUT, path)
    }

    #[must_use]
    pub fn delete(path: impl Into<String>) -> Self {
        Self::new(Method::DELETE, path)
    }

    #[must_use]
    pub fn query(mut self, name: impl Into<String>, value: impl ToString) -> Self {
        self.query.push((name.into(), value.to_string()));
        self
    }

    #[must_use]
    pub fn header(mut self, name: impl Into<String>, value: impl Into<String>) -> Self {
        self.headers.push((name.into(), value.into()));
        self
    }

    /// Attach a JSON body.
    ///
    /// # Errors
    /// Returns `Error::Serialization` if the body cannot be encoded.
    pub fn json<B: Serialize + ?Sized>(mut self, body: &B) -> Result<Self> {
        let value = serde_json::to_value(body)
            .map_err(|err| Error::Serialization(format!("Failed to encode request: {err}")))?;
        self.body = RequestBody::Json(value);
        Ok(self)
    }

    #[must_use]
    pub fn form(mut self, fields: &[(&str, &str)]) -> Self {
        self.body = RequestBody::Form(
            fields
                .iter()
                .map(|(name, value)| ((*name).to_string(), (*value).to_string()))
                .collect(),
        );
        self
    }

    /// Methods that change server state and therefore carry the CSRF header.
    #[must_use]
    pub fn is_mutating(&self) -> bool {
        self.method == Method::POST
            || self.method == Method::PUT
            || self.method == Method::PATCH
            || self.method == Method::DELETE
    }

    #[must_use]
    pub fn header_value(&self, name: &str) -> Option<&str> {
        self.headers
            .iter()
            .find(|(key, _)| key.eq_ignore_ascii_case(name))
            .map(|(_, value)| value.as_str())
    }
}

#[derive(Clone, Debug, PartialEq, Eq)]
pub struct ApiResponse {
    pub status: u16,
    pub body: String,
}

impl ApiResponse {
    #[must_use]
    pub fn new(status: u16, body: impl Into<String>) -> Self {
        Self {
            status,
            body: body.into(),
        }
    }

    #[must_use]
    pub fn is_success(&self) -> bool {
        (200..300).contains(&self.status)
    }

    /// Decode the body as JSON.
    ///
    /// # Errors
    /// Returns `Error::Parse` if the body does not match `T`.
    pub fn json<T: DeserializeOwned>(&self) -> Result<T> {
        serde_json::from_str(&self.body)
            .map_err(|err| Error::Parse(format!("Failed to decode response: {err}")))
    }
}

/// One HTTP exchange with the API.
pub trait Transport: Send + Sync + 'static {
    /// Perform the request. Non-2xx statuses are returned as responses, not
    /// errors; only connectivity failures are `Err`.
    fn execute(&self, request: &ApiRequest) -> impl Future<Output = Result<ApiResponse>> + Send;

    /// Value of a script-readable cookie for the API origin.
    fn cookie(&self, name: &str) -> Option<String>;
}

/// `reqwest` transport with a persistent cookie jar scoped to the API base URL.
#[derive(Clone)]
pub struct HttpTransport {
    client: Client,
    jar: Arc<CookieStoreMutex>,
    cookie_file: PathBuf,
    base_url: Url,
    timeout: Option<Duration>,
}

impl HttpTransport {
    /// # Errors
    /// Returns `Error::Config` if the base URL is invalid or the client cannot
    /// be built.
    pub fn new(config: &AppConfig) -> Result<Self> {
        let base_url = Url::parse(config.api_base_url.trim())
            .map_err(|err| Error::Config(format!("invalid API base URL: {err}")))?;
        let cookie_file = config.cookie_file();
        let jar = Arc::new(CookieStoreMutex::new(load_cookies(&cookie_file)));
        let client = Client::builder()
            .user_agent(APP_USER_AGENT)
            .cookie_provider(Arc::clone(&jar))
            .build()
            .map_err(|err| Error::Config(format!("Failed to build HTTP client: {err}")))?;

        Ok(Self {
            client,
            jar,
            cookie_file,
            base_url,
            timeout: config.timeout,
        })
    }

    #[must_use]
    pub fn base_url(&self) -> &Url {
        &self.base_url
    }

    #[must_use]
    pub fn cookie_file(&self) -> &Path {
        &self.cookie_file
    }

    /// Write the jar back to disk. Failures only cost the next process its
    /// session, so they are logged rather than returned.
    fn persist_cookies(&self) {
        let jar = self.jar.lock().unwrap_or_else(PoisonError::into_inner);
        match save_cookies(&self.cookie_file, &jar) {
            Ok(()) => debug!("cookies saved to {}", self.cookie_file.display()),
            Err(err) => warn!("failed to persist cookies: {err}"),
        }
    }
}

// The jar holds session cookies; keep it out of debug output.
impl std::fmt::Debug for HttpTransport {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("HttpTransport")
            .field("base_url", &self.base_url.as_str())
            .field("cookie_file", &self.cookie_file.display().to_string())
            .field("timeout", &self.timeout)
            .finish_non_exhaustive()
    }
}

impl Transport for HttpTransport {
    async fn execute(&self, request: &ApiRequest) -> Result<ApiResponse> {
        let url = build_url_with_base(self.base_url.as_str(), &request.path);
        let span = tracing::debug_span!(
            "api.request",
            http.method = %request.method,
            url = %url,
            retried = request.retried
        );

        let mut builder = self.client.request(request.method.clone(), &url);
        if let Some(timeout) = self.timeout {
            builder = builder.timeout(timeout);
        }
        if !request.query.is_empty() {
            builder = builder.query(&request.query);
        }
        for (name, value) in &request.headers {
            builder = builder.header(name.as_str(), value.as_str());
        }
        builder = match &request.body {
            RequestBody::Empty => builder,
            RequestBody::Json(value) => builder.json(value),
            RequestBody::Form(fields) => builder.form(fields),
        };

        let response = builder
            .send()
            .instrument(span)
            .await
            .map_err(map_request_error)?;
        let status = response.status().as_u16();
        if response.headers().contains_key(SET_COOKIE) {
            self.persist_cookies();
        }
        let body = response.text().await.map_err(map_request_error)?;
        debug!("{} {} -> {}", request.method, request.path, status);

        Ok(ApiResponse { status, body })
    }

    fn cookie(&self, name: &str) -> Option<String> {
        let header = self.jar.cookies(&self.base_url)?;
        let header = header.to_str().ok()?;
        find_cookie(header, name)
    }
}

/// Read a saved jar. A missing file is an empty jar; an unreadable one is
/// discarded so it cannot wedge later sign-ins.
fn load_cookies(path: &Path) -> CookieStore {
    let file = match File::open(path) {
        Ok(file) => file,
        Err(err) if err.kind() == ErrorKind::NotFound => return CookieStore::default(),
        Err(err) => {
            warn!("unreadable cookie jar {}: {err}", path.display());
            return CookieStore::default();
        }
    };

    match cookie_store::serde::json::load_all(BufReader::new(file)) {
        Ok(store) => store,
        Err(err) => {
            warn!("discarding corrupt cookie jar {}: {err}", path.display());
            if let Err(err) = fs::remove_file(path) {
                warn!("failed to remove cookie jar {}: {err}", path.display());
            }
            CookieStore::default()
        }
    }
}

/// Session cookies carry no expiry, so they are saved as well; the CLI has no
/// other way to keep them between runs.
fn save_cookies(path: &Path, store: &CookieStore) -> Result<()> {
    let mut payload = Vec::new();
    cookie_store::serde::json::save_incl_expired_and_nonpersistent(store, &mut payload)
        .map_err(|err| Error::Serialization(format!("Failed to encode cookies: {err}")))?;

    if let Some(parent) = path.parent().filter(|p| !p.as_os_str().is_empty()) {
        fs::create_dir_all(parent).map_err(|err| Error::Storage(format!("{}: {err}", parent.display())))?;
    }
    write_private(path, &payload).map_err(|err| Error::Storage(format!("{}: {err}", path.display())))
}

#[cfg(unix)]
fn write_private(path: &Path, payload: &[u8]) -> std::io::Result<()> {
    use std::os::unix::fs::{OpenOptionsExt, PermissionsExt};

    let mut file = OpenOptions::new()
        .write(true)
        .create(true)
        .truncate(true)
        .mode(0o600)
        .open(path)?;
    // `mode` only applies on creation.
    file.set_permissions(fs::Permissions::from_mode(0o600))?;
    file.write_all(payload)
}

#[cfg(not(unix))]
fn write_private(path: &Path, payload: &[u8]) -> std::io::Result<()> {
    let mut file = OpenOptions::new().write(true).create(true).truncate(true).open(path)?;
    file.write_all(payload)
}

/// Builds a URL from an explicit base URL and the provided path.
fn build_url_with_base(base_url: &str, path: &str) -> String {
    let base = base_url.trim().trim_end_matches('/');
    let path = path.trim();

    if base.is_empty() {
        path.to_string()
    } else {
        format!("{}/{}", base, path.trim_start_matches('/'))
    }
}

/// Picks one cookie out of a `Cookie:` header value.
fn find_cookie(header: &str, name: &str) -> Option<String> {
    header.split(';').find_map(|pair| {
        let (key, value) = pair.trim().split_once('=')?;
        (key == name).then(|| value.to_string())
    })
}

fn map_request_error(err: reqwest::Error) -> Error {
    if err.is_timeout() {
        Error::Timeout("Request timed out. Please try again.".to_string())
    } else {
        Error::Network(format!("Unable to reach the server: {err}"))
    }
}
