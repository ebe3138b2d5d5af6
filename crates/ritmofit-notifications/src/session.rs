//! Session storage.
//!
//! [`KeyValueStore`] is the durable key-value capability the client runs on;
//! [`SessionStore`] layers the typed session entries on top of it: the
//! signed-in user, the API token and the last fetched notification batch.

use std::collections::HashMap;
use std::io::ErrorKind;
use std::path::{Path, PathBuf};
use std::sync::Arc;

use async_trait::async_trait;
use serde::{Deserialize, Serialize};
use serde_json::{Map, Value};
use tokio::sync::{Mutex, RwLock};

use crate::error::NotificationError;
use crate::types::{NotificationRecord, UserId};

pub const USER_KEY: &str = "user";
pub const TOKEN_KEY: &str = "auth_token";
pub const LOCAL_NOTIFICATIONS_KEY: &str = "local_notifications";

#[async_trait]
pub trait KeyValueStore: Send + Sync {
    async fn get(&self, key: &str) -> Result<Option<String>, NotificationError>;

    async fn set(&self, key: &str, value: String) -> Result<(), NotificationError>;

    /// Returns whether the key existed
    async fn remove(&self, key: &str) -> Result<bool, NotificationError>;
}

/// Process-local store, nothing survives a restart
#[derive(Debug, Default)]
pub struct MemoryKeyValueStore {
    entries: RwLock<HashMap<String, String>>,
}

impl MemoryKeyValueStore {
    pub fn new() -> Self {
        Self::default()
    }
}

#[async_trait]
impl KeyValueStore for MemoryKeyValueStore {
    async fn get(&self, key: &str) -> Result<Option<String>, NotificationError> {
        Ok(self.entries.read().await.get(key).cloned())
    }

    async fn set(&self, key: &str, value: String) -> Result<(), NotificationError> {
        self.entries.write().await.insert(key.to_string(), value);
        Ok(())
    }

    async fn remove(&self, key: &str) -> Result<bool, NotificationError> {
        Ok(self.entries.write().await.remove(key).is_some())
    }
}

/// Store backed by a single JSON object file.
///
/// Every write rewrites the whole file through a temporary sibling and a
/// rename, so a crash never leaves a half-written document behind.
#[derive(Debug)]
pub struct FileKeyValueStore {
    path: PathBuf,
    lock: Mutex<()>,
}

impl FileKeyValueStore {
    pub fn new(path: impl Into<PathBuf>) -> Self {
        Self {
            path: path.into(),
            lock: Mutex::new(()),
        }
    }

    /// `~/.ritmofit/session.json`
    pub fn default_path() -> Result<PathBuf, NotificationError> {
        let home = dirs::home_dir().ok_or_else(|| {
            NotificationError::Storage("Cannot determine home directory".into())
        })?;
        Ok(home.join(".ritmofit").join("session.json"))
    }

    pub fn path(&self) -> &Path {
        &self.path
    }

    async fn read_all(&self) -> Result<HashMap<String, String>, NotificationError> {
        let content = match tokio::fs::read_to_string(&self.path).await {
            Ok(content) => content,
            Err(e) if e.kind() == ErrorKind::NotFound => return Ok(HashMap::new()),
            Err(e) => return Err(storage_error(&self.path, e)),
        };
        if content.trim().is_empty() {
            return Ok(HashMap::new());
        }
        serde_json::from_str(&content).map_err(|e| {
            NotificationError::Storage(format!("{}: {e}", self.path.display()))
        })
    }

    async fn write_all(&self, entries: &HashMap<String, String>) -> Result<(), NotificationError> {
        if let Some(parent) = self.path.parent()
            && !parent.as_os_str().is_empty()
        {
            tokio::fs::create_dir_all(parent)
                .await
                .map_err(|e| storage_error(parent, e))?;
        }
        let content = serde_json::to_string_pretty(entries)
            .map_err(|e| NotificationError::Storage(e.to_string()))?;
        let tmp = self.path.with_extension("json.tmp");
        tokio::fs::write(&tmp, content)
            .await
            .map_err(|e| storage_error(&tmp, e))?;
        tokio::fs::rename(&tmp, &self.path)
            .await
            .map_err(|e| storage_error(&self.path, e))
    }
}

fn storage_error(path: &Path, e: std::io::Error) -> NotificationError {
    NotificationError::Storage(format!("{}: {e}", path.display()))
}

#[async_trait]
impl KeyValueStore for FileKeyValueStore {
    async fn get(&self, key: &str) -> Result<Option<String>, NotificationError> {
        let _guard = self.lock.lock().await;
        Ok(self.read_all().await?.remove(key))
    }

    async fn set(&self, key: &str, value: String) -> Result<(), NotificationError> {
        let _guard = self.lock.lock().await;
        let mut entries = self.read_all().await?;
        entries.insert(key.to_string(), value);
        self.write_all(&entries).await
    }

    async fn remove(&self, key: &str) -> Result<bool, NotificationError> {
        let _guard = self.lock.lock().await;
        let mut entries = self.read_all().await?;
        if entries.remove(key).is_none() {
            return Ok(false);
        }
        self.write_all(&entries).await?;
        Ok(true)
    }
}

/// Stored identity of the signed-in user
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct SessionUser {
    #[serde(default)]
    pub id: Option<UserId>,

    #[serde(flatten)]
    pub extra: Map<String, Value>,
}

impl SessionUser {
    pub fn new(id: UserId) -> Self {
        Self {
            id: Some(id),
            extra: Map::new(),
        }
    }
}

/// Typed access to the session entries
#[derive(Clone)]
pub struct SessionStore {
    kv: Arc<dyn KeyValueStore>,
}

impl SessionStore {
    pub fn new(kv: Arc<dyn KeyValueStore>) -> Self {
        Self { kv }
    }

    pub fn in_memory() -> Self {
        Self::new(Arc::new(MemoryKeyValueStore::new()))
    }

    pub async fn user(&self) -> Result<Option<SessionUser>, NotificationError> {
        self.get_json(USER_KEY).await
    }

    pub async fn user_id(&self) -> Result<Option<UserId>, NotificationError> {
        Ok(self.user().await?.and_then(|user| user.id))
    }

    pub async fn save_user(&self, user: &SessionUser) -> Result<(), NotificationError> {
        self.set_json(USER_KEY, user).await
    }

    pub async fn token(&self) -> Result<Option<String>, NotificationError> {
        Ok(self.kv.get(TOKEN_KEY).await?.filter(|t| !t.is_empty()))
    }

    pub async fn save_token(&self, token: &str) -> Result<(), NotificationError> {
        self.kv.set(TOKEN_KEY, token.to_string()).await
    }

    /// Last fetched batch; empty when nothing was stored yet
    pub async fn notifications(&self) -> Result<Vec<NotificationRecord>, NotificationError> {
        Ok(self
            .get_json(LOCAL_NOTIFICATIONS_KEY)
            .await?
            .unwrap_or_default())
    }

    /// Overwrites the previous batch
    pub async fn save_notifications(
        &self,
        records: &[NotificationRecord],
    ) -> Result<(), NotificationError> {
        self.set_json(LOCAL_NOTIFICATIONS_KEY, records).await
    }

    /// Drop user, token and batch
    pub async fn clear(&self) -> Result<(), NotificationError> {
        for key in [USER_KEY, TOKEN_KEY, LOCAL_NOTIFICATIONS_KEY] {
            self.kv.remove(key).await?;
        }
        Ok(())
    }

    async fn get_json<T: serde::de::DeserializeOwned>(
        &self,
        key: &str,
    ) -> Result<Option<T>, NotificationError> {
        match self.kv.get(key).await? {
            Some(raw) => serde_json::from_str(&raw)
                .map(Some)
                .map_err(|e| NotificationError::Decode(format!("{key}: {e}"))),
            None => Ok(None),
        }
    }

    async fn set_json<T: Serialize + ?Sized>(
        &self,
        key: &str,
        value: &T,
    ) -> Result<(), NotificationError> {
        let raw = serde_json::to_string(value)
            .map_err(|e| NotificationError::Storage(format!("{key}: {e}")))?;
        self.kv.set(key, raw).await
    }
}
