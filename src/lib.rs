//! # Taskdesk
//!
//! Client for the task manager API. The interesting part is the session core
//! in [`session`]: the server keeps the credentials in cookies, the client
//! only remembers who is signed in, and every request goes through one
//! gateway that adds the anti-forgery header and transparently refreshes an
//! expired access token, at most once at a time.
//!
//! ```no_run
//! use std::sync::Arc;
//! use taskdesk::{
//!     api, config::AppConfig,
//!     session::{FileStore, Gateway, SessionContext},
//!     transport::HttpTransport,
//! };
//!
//! # async fn run() -> taskdesk::Result<()> {
//! let config = AppConfig::load();
//! let gateway = Arc::new(Gateway::new(HttpTransport::new(&config)?));
//! let session = SessionContext::new(Arc::clone(&gateway), Arc::new(FileStore::new(&config.state_file)));
//!
//! let token = api::auth::sign_in(&gateway, "alice", "S3cret!pw").await?;
//! session.login(&token.access_token)?;
//! let page = api::tasks::list(&gateway, 1, 10).await?;
//! # let _ = page;
//! # Ok(())
//! # }
//! ```

pub mod api;
pub mod cli;
pub mod config;
pub mod error;
pub mod session;
pub mod transport;

pub use self::error::{Error, Result};

#[allow(clippy::doc_markdown, clippy::needless_raw_string_hashes)]
pub mod built_info {
    include!(concat!(env!("OUT_DIR"), "/built.rs"));
}

pub const GIT_COMMIT_HASH: &str = match built_info::GIT_COMMIT_HASH {
    Some(hash) => hash,
    None => "unknown",
};

pub const APP_USER_AGENT: &str = concat!(env!("CARGO_PKG_NAME"), "/", env!("CARGO_PKG_VERSION"));
