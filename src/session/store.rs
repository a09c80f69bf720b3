//! Persistence for the remembered identity.
//!
//! The store keeps at most one decoded claims object in a fixed slot. It is
//! not proof of identity: the access and refresh secrets live in `HttpOnly`
//! cookies owned by the transport and are never written here.

use crate::error::{Error, Result};
use crate::session::token::Claims;
use std::{
    fs,
    io::ErrorKind,
    path::{Path, PathBuf},
    sync::Mutex,
};
use tracing::{debug, warn};

pub trait CredentialStore: Send + Sync {
    /// Replace the stored claims.
    ///
    /// # Errors
    /// Returns `Error::Storage` if the record cannot be written.
    fn save(&self, claims: &Claims) -> Result<()>;

    /// Load the stored claims. Unreadable records are cleared and reported as
    /// absent so they cannot block a later login.
    fn load(&self) -> Option<Claims>;

    fn clear(&self);
}

/// Claims persisted as a JSON document on disk.
#[derive(Debug, Clone)]
pub struct FileStore {
    path: PathBuf,
}

impl FileStore {
    #[must_use]
    pub fn new(path: impl Into<PathBuf>) -> Self {
        Self { path: path.into() }
    }

    #[must_use]
    pub fn path(&self) -> &Path {
        &self.path
    }
}

impl CredentialStore for FileStore {
    fn save(&self, claims: &Claims) -> Result<()> {
        if let Some(parent) = self.path.parent().filter(|p| !p.as_os_str().is_empty()) {
            fs::create_dir_all(parent)
                .map_err(|err| Error::Storage(format!("{}: {err}", parent.display())))?;
        }
        let payload = serde_json::to_vec(claims)
            .map_err(|err| Error::Serialization(format!("Failed to encode claims: {err}")))?;
        fs::write(&self.path, payload)
            .map_err(|err| Error::Storage(format!("{}: {err}", self.path.display())))?;

        debug!("session record saved to {}", self.path.display());
        Ok(())
    }

    fn load(&self) -> Option<Claims> {
        let bytes = match fs::read(&self.path) {
            Ok(bytes) => bytes,
            Err(err) if err.kind() == ErrorKind::NotFound => return None,
            Err(err) => {
                warn!("unreadable session record {}: {err}", self.path.display());
                self.clear();
                return None;
            }
        };

        match serde_json::from_slice(&bytes) {
            Ok(claims) => Some(claims),
            Err(err) => {
                warn!("discarding corrupt session record {}: {err}", self.path.display());
                self.clear();
                None
            }
        }
    }

    fn clear(&self) {
        match fs::remove_file(&self.path) {
            Ok(()) => debug!("session record removed from {}", self.path.display()),
            Err(err) if err.kind() == ErrorKind::NotFound => {}
            Err(err) => warn!("failed to remove session record {}: {err}", self.path.display()),
        }
    }
}

/// In-process slot, for embedding and tests.
#[derive(Debug, Default)]
pub struct MemoryStore {
    slot: Mutex<Option<Claims>>,
}

impl MemoryStore {
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    #[must_use]
    pub fn with_claims(claims: Claims) -> Self {
        Self {
            slot: Mutex::new(Some(claims)),
        }
    }
}

impl CredentialStore for MemoryStore {
    fn save(&self, claims: &Claims) -> Result<()> {
        let mut slot = self
            .slot
            .lock()
            .map_err(|_| Error::Storage("session slot poisoned".to_string()))?;
        *slot = Some(claims.clone());
        Ok(())
    }

    fn load(&self) -> Option<Claims> {
        self.slot.lock().ok().and_then(|slot| slot.clone())
    }

    fn clear(&self) {
        if let Ok(mut slot) = self.slot.lock() {
            slot.take();
        }
    }
}
