use crate::db::models::{User, UserMap};
use crate::error::StoreError;
use async_trait::async_trait;
use std::path::{Path, PathBuf};
use tokio::sync::RwLock;
use tracing::{debug, error, warn};

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum InsertOutcome {
    /// Record accepted. `persisted` is false when the write to the backing
    /// store failed and the record may be lost.
    Inserted { persisted: bool },
    AlreadyExists,
}

/// Storage capability for the user document.
#[cfg_attr(test, mockall::automock)]
#[async_trait]
pub trait UserStore: Send + Sync {
    /// Full username → user mapping. Never fails; unreadable state is an empty map.
    async fn load(&self) -> UserMap;

    /// Replace the stored mapping with `users`.
    async fn save(&self, users: &UserMap) -> Result<(), StoreError>;

    /// Read-check-write insert. Not atomic: two callers can both pass the
    /// existence check and the last save wins. Stores that can do better
    /// override this.
    async fn insert_user(&self, user: User) -> InsertOutcome {
        let mut users = self.load().await;
        if users.contains_key(&user.username) {
            return InsertOutcome::AlreadyExists;
        }

        let username = user.username.clone();
        users.insert(username.clone(), user);

        match self.save(&users).await {
            Ok(()) => InsertOutcome::Inserted { persisted: true },
            Err(e) => {
                error!("Failed to persist user {}: {}", username, e);
                InsertOutcome::Inserted { persisted: false }
            }
        }
    }
}

/// User document kept as a single pretty-printed JSON file.
pub struct JsonFileStore {
    path: PathBuf,
}

impl JsonFileStore {
    pub fn new(path: impl Into<PathBuf>) -> Self {
        Self { path: path.into() }
    }

    pub fn path(&self) -> &Path {
        &self.path
    }

    fn io_error(&self, source: std::io::Error) -> StoreError {
        StoreError::Io {
            path: self.path.display().to_string(),
            source,
        }
    }
}

#[async_trait]
impl UserStore for JsonFileStore {
    async fn load(&self) -> UserMap {
        match tokio::fs::try_exists(&self.path).await {
            Ok(true) => {}
            Ok(false) => {
                debug!("User store {} does not exist yet", self.path.display());
                return UserMap::new();
            }
            Err(e) => {
                warn!("Cannot stat user store {}: {}", self.path.display(), e);
                return UserMap::new();
            }
        }

        let contents = match tokio::fs::read_to_string(&self.path).await {
            Ok(contents) => contents,
            Err(e) => {
                warn!("Cannot read user store {}, treating as empty: {}", self.path.display(), e);
                return UserMap::new();
            }
        };

        match serde_json::from_str(&contents) {
            Ok(users) => users,
            Err(e) => {
                warn!("Corrupt user store {}, treating as empty: {}", self.path.display(), e);
                UserMap::new()
            }
        }
    }

    async fn save(&self, users: &UserMap) -> Result<(), StoreError> {
        if let Some(parent) = self.path.parent() {
            if !parent.as_os_str().is_empty() {
                tokio::fs::create_dir_all(parent)
                    .await
                    .map_err(|e| self.io_error(e))?;
            }
        }

        let mut json = serde_json::to_string_pretty(users)?;
        json.push('\n');

        tokio::fs::write(&self.path, json)
            .await
            .map_err(|e| self.io_error(e))
    }
}

/// Process-local store. Inserts are atomic under a single write lock.
#[derive(Default)]
pub struct MemoryStore {
    users: RwLock<UserMap>,
}

impl MemoryStore {
    pub fn new() -> Self {
        Self::default()
    }
}

#[async_trait]
impl UserStore for MemoryStore {
    async fn load(&self) -> UserMap {
        self.users.read().await.clone()
    }

    async fn save(&self, users: &UserMap) -> Result<(), StoreError> {
        *self.users.write().await = users.clone();
        Ok(())
    }

    async fn insert_user(&self, user: User) -> InsertOutcome {
        let mut users = self.users.write().await;
        if users.contains_key(&user.username) {
            return InsertOutcome::AlreadyExists;
        }
        users.insert(user.username.clone(), user);
        InsertOutcome::Inserted { persisted: true }
    }
}
