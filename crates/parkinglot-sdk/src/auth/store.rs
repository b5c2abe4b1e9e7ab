//! Session persistence
//!
//! The session survives process restarts the same way the browser SDK keeps
//! its user in local storage. The file store is the default; the memory store
//! is for tests and embedders that manage persistence themselves.

use super::types::{default_data_dir, AuthError, AuthResult, Session};
use async_trait::async_trait;
use std::path::{Path, PathBuf};
use std::sync::Mutex;
use tokio::io::AsyncWriteExt;
use tracing::debug;

/// Storage backend for the current session
#[async_trait]
pub trait SessionStore: Send + Sync {
    /// Load the persisted session, if any
    async fn load(&self) -> AuthResult<Option<Session>>;

    /// Persist the session, replacing any previous one
    async fn save(&self, session: &Session) -> AuthResult<()>;

    /// Remove the persisted session
    async fn clear(&self) -> AuthResult<()>;
}

/// JSON file store
pub struct FileSessionStore {
    path: PathBuf,
}

impl FileSessionStore {
    pub const FILE_NAME: &'static str = "session.json";

    /// Store under the given directory
    pub fn new(dir: impl AsRef<Path>) -> Self {
        Self {
            path: dir.as_ref().join(Self::FILE_NAME),
        }
    }

    /// Store under the platform data directory
    pub fn default_location() -> AuthResult<Self> {
        Ok(Self::new(default_data_dir()?))
    }

    pub fn path(&self) -> &Path {
        &self.path
    }
}

#[async_trait]
impl SessionStore for FileSessionStore {
    async fn load(&self) -> AuthResult<Option<Session>> {
        if !tokio::fs::try_exists(&self.path).await? {
            debug!("No persisted session at {}", self.path.display());
            return Ok(None);
        }

        let content = tokio::fs::read_to_string(&self.path).await?;
        let session = serde_json::from_str(&content)
            .map_err(|e| AuthError::Storage(format!("Corrupt session file: {e}")))?;
        Ok(Some(session))
    }

    async fn save(&self, session: &Session) -> AuthResult<()> {
        if let Some(parent) = self.path.parent() {
            tokio::fs::create_dir_all(parent).await?;
        }

        let content = serde_json::to_string_pretty(session)
            .map_err(|e| AuthError::Storage(format!("Failed to serialize session: {e}")))?;

        let mut options = tokio::fs::OpenOptions::new();
        options.write(true).create(true).truncate(true);
        #[cfg(unix)]
        options.mode(0o600);
        let mut file = options.open(&self.path).await?;

        // `mode` only applies on creation; an existing file keeps its old mode
        #[cfg(unix)]
        {
            use std::os::unix::fs::PermissionsExt;
            file.set_permissions(std::fs::Permissions::from_mode(0o600))
                .await?;
        }

        file.write_all(content.as_bytes()).await?;
        file.flush().await?;

        debug!("Session persisted to {}", self.path.display());
        Ok(())
    }

    async fn clear(&self) -> AuthResult<()> {
        match tokio::fs::remove_file(&self.path).await {
            Ok(()) => Ok(()),
            Err(e) if e.kind() == std::io::ErrorKind::NotFound => Ok(()),
            Err(e) => Err(e.into()),
        }
    }
}

/// In-memory store
#[derive(Default)]
pub struct MemorySessionStore {
    session: Mutex<Option<Session>>,
}

impl MemorySessionStore {
    pub fn new() -> Self {
        Self::default()
    }

    /// Seed the store with an existing session
    pub fn with_session(session: Session) -> Self {
        Self {
            session: Mutex::new(Some(session)),
        }
    }

    fn lock(&self) -> AuthResult<std::sync::MutexGuard<'_, Option<Session>>> {
        self.session
            .lock()
            .map_err(|_| AuthError::Storage("session store lock poisoned".to_string()))
    }
}

#[async_trait]
impl SessionStore for MemorySessionStore {
    async fn load(&self) -> AuthResult<Option<Session>> {
        Ok(self.lock()?.clone())
    }

    async fn save(&self, session: &Session) -> AuthResult<()> {
        *self.lock()? = Some(session.clone());
        Ok(())
    }

    async fn clear(&self) -> AuthResult<()> {
        *self.lock()? = None;
        Ok(())
    }
}
