//! Durable session storage behind a narrow async trait.
//!
//! The manager only ever talks to `SessionStore`, so the backing medium is
//! swappable: an in-memory map for tests and ephemeral deployments, a
//! directory of JSON files for anything that must survive a restart.

use std::collections::HashMap;
use std::path::PathBuf;

use async_trait::async_trait;
use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use tokio::sync::Mutex;

use crate::error::{CallguideError, Result};
use crate::machine::CallState;

/// The snapshot written to storage: the full call state plus the caller's
/// phone number, flattened into one JSON object.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct PersistedSession {
    #[serde(default)]
    pub phone: Option<String>,
    #[serde(flatten)]
    pub state: CallState,
}

/// Async storage port for session snapshots.
#[async_trait]
pub trait SessionStore: Send + Sync {
    /// Fetch a snapshot, `None` when the id is unknown.
    async fn load(&self, call_id: &str) -> Result<Option<PersistedSession>>;

    /// Write a snapshot, replacing any previous one for the same call.
    async fn save(&self, session: &PersistedSession) -> Result<()>;

    /// Remove a snapshot. Removing an unknown id is not an error.
    async fn delete(&self, call_id: &str) -> Result<()>;

    /// Remove every snapshot last updated before `cutoff`, returning how
    /// many were removed.
    async fn delete_older_than(&self, cutoff: DateTime<Utc>) -> Result<usize>;
}

/// In-memory store. Nothing survives a restart.
#[derive(Default)]
pub struct MemorySessionStore {
    sessions: Mutex<HashMap<String, PersistedSession>>,
}

impl MemorySessionStore {
    pub fn new() -> Self {
        Self::default()
    }

    pub async fn len(&self) -> usize {
        self.sessions.lock().await.len()
    }

    pub async fn is_empty(&self) -> bool {
        self.sessions.lock().await.is_empty()
    }
}

#[async_trait]
impl SessionStore for MemorySessionStore {
    async fn load(&self, call_id: &str) -> Result<Option<PersistedSession>> {
        Ok(self.sessions.lock().await.get(call_id).cloned())
    }

    async fn save(&self, session: &PersistedSession) -> Result<()> {
        self.sessions
            .lock()
            .await
            .insert(session.state.call_id.clone(), session.clone());
        Ok(())
    }

    async fn delete(&self, call_id: &str) -> Result<()> {
        self.sessions.lock().await.remove(call_id);
        Ok(())
    }

    async fn delete_older_than(&self, cutoff: DateTime<Utc>) -> Result<usize> {
        let mut sessions = self.sessions.lock().await;
        let before = sessions.len();
        sessions.retain(|_, s| s.state.updated_at >= cutoff);
        Ok(before - sessions.len())
    }
}

/// File-backed store: one pretty-printed JSON file per call under `dir`.
pub struct FileSessionStore {
    dir: PathBuf,
}

impl FileSessionStore {
    pub fn new(dir: impl Into<PathBuf>) -> Self {
        Self { dir: dir.into() }
    }

    fn path_for(&self, call_id: &str) -> Result<PathBuf> {
        // Call ids become file names; anything that could escape the
        // directory is refused outright.
        if call_id.is_empty()
            || call_id.contains('/')
            || call_id.contains('\\')
            || call_id.contains("..")
        {
            return Err(CallguideError::StorageWrite {
                call_id: call_id.to_string(),
                message: "call id is not a valid file name".to_string(),
            });
        }
        Ok(self.dir.join(format!("{call_id}.json")))
    }
}

#[async_trait]
impl SessionStore for FileSessionStore {
    async fn load(&self, call_id: &str) -> Result<Option<PersistedSession>> {
        let path = self.path_for(call_id)?;
        match tokio::fs::read_to_string(&path).await {
            Ok(json) => {
                let session =
                    serde_json::from_str(&json).map_err(|e| CallguideError::StorageRead {
                        call_id: call_id.to_string(),
                        message: e.to_string(),
                    })?;
                Ok(Some(session))
            }
            Err(e) if e.kind() == std::io::ErrorKind::NotFound => Ok(None),
            Err(e) => Err(CallguideError::StorageRead {
                call_id: call_id.to_string(),
                message: e.to_string(),
            }),
        }
    }

    async fn save(&self, session: &PersistedSession) -> Result<()> {
        let call_id = session.state.call_id.clone();
        let path = self.path_for(&call_id)?;
        let storage_err = |message: String| CallguideError::StorageWrite {
            call_id: call_id.clone(),
            message,
        };
        tokio::fs::create_dir_all(&self.dir)
            .await
            .map_err(|e| storage_err(e.to_string()))?;
        let json =
            serde_json::to_string_pretty(session).map_err(|e| storage_err(e.to_string()))?;
        tokio::fs::write(&path, json)
            .await
            .map_err(|e| storage_err(e.to_string()))
    }

    async fn delete(&self, call_id: &str) -> Result<()> {
        let path = self.path_for(call_id)?;
        match tokio::fs::remove_file(&path).await {
            Ok(()) => Ok(()),
            Err(e) if e.kind() == std::io::ErrorKind::NotFound => Ok(()),
            Err(e) => Err(CallguideError::StorageDelete {
                call_id: call_id.to_string(),
                message: e.to_string(),
            }),
        }
    }

    async fn delete_older_than(&self, cutoff: DateTime<Utc>) -> Result<usize> {
        let sweep_err = |message: String| CallguideError::StorageSweep { message };
        let mut entries = match tokio::fs::read_dir(&self.dir).await {
            Ok(entries) => entries,
            Err(e) if e.kind() == std::io::ErrorKind::NotFound => return Ok(0),
            Err(e) => return Err(sweep_err(e.to_string())),
        };

        let mut removed = 0;
        while let Some(entry) = entries.next_entry().await.map_err(|e| sweep_err(e.to_string()))? {
            let path = entry.path();
            if path.extension().and_then(|e| e.to_str()) != Some("json") {
                continue;
            }
            let json = match tokio::fs::read_to_string(&path).await {
                Ok(json) => json,
                Err(_) => continue,
            };
            // Unparseable files are left in place for inspection.
            let session: PersistedSession = match serde_json::from_str(&json) {
                Ok(session) => session,
                Err(_) => continue,
            };
            if session.state.updated_at < cutoff {
                if tokio::fs::remove_file(&path).await.is_ok() {
                    removed += 1;
                }
            }
        }
        Ok(removed)
    }
}

/// Store whose every operation fails, for exercising persistence error
/// handling without touching a disk.
#[derive(Default)]
pub struct FailingStore;

impl FailingStore {
    pub fn new() -> Self {
        Self
    }
}

#[async_trait]
impl SessionStore for FailingStore {
    async fn load(&self, call_id: &str) -> Result<Option<PersistedSession>> {
        Err(CallguideError::StorageRead {
            call_id: call_id.to_string(),
            message: "store unavailable".to_string(),
        })
    }

    async fn save(&self, session: &PersistedSession) -> Result<()> {
        Err(CallguideError::StorageWrite {
            call_id: session.state.call_id.clone(),
            message: "store unavailable".to_string(),
        })
    }

    async fn delete(&self, call_id: &str) -> Result<()> {
        Err(CallguideError::StorageDelete {
            call_id: call_id.to_string(),
            message: "store unavailable".to_string(),
        })
    }

    async fn delete_older_than(&self, _cutoff: DateTime<Utc>) -> Result<usize> {
        Err(CallguideError::StorageSweep {
            message: "store unavailable".to_string(),
        })
    }
}
