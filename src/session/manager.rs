//! Live session registry over a durable store.
//!
//! Each active call holds one `CallStateMachine` behind an async mutex so
//! telephony handlers and the streaming classifier can share it. The cache
//! is authoritative while a call is live; the store is for restart recovery
//! and post-call retention.
//!
//! Persistence policy: writes on the call path are best effort (a logged
//! warning, never a dropped call), while explicit saves and call teardown
//! propagate storage errors to the caller.

use std::collections::HashMap;
use std::sync::Arc;

use chrono::{Duration, Utc};
use tokio::sync::Mutex;
use tokio::task::JoinHandle;

use crate::error::{CallguideError, Result};
use crate::machine::CallStateMachine;
use crate::session::metadata::SessionMetadata;
use crate::session::store::{PersistedSession, SessionStore};

struct Entry {
    machine: Arc<Mutex<CallStateMachine>>,
    metadata: SessionMetadata,
}

pub struct SessionManager {
    sessions: std::sync::Mutex<HashMap<String, Entry>>,
    store: Arc<dyn SessionStore>,
    cleanup_task: std::sync::Mutex<Option<JoinHandle<()>>>,
}

impl SessionManager {
    pub fn new(store: Arc<dyn SessionStore>) -> Self {
        Self {
            sessions: std::sync::Mutex::new(HashMap::new()),
            store,
            cleanup_task: std::sync::Mutex::new(None),
        }
    }

    fn lock_sessions(&self) -> std::sync::MutexGuard<'_, HashMap<String, Entry>> {
        self.sessions.lock().unwrap_or_else(|e| e.into_inner())
    }

    /// Create a session for `call_id`, or return the existing one. The
    /// initial snapshot is written best effort.
    pub async fn create_session(
        &self,
        call_id: &str,
        phone: Option<&str>,
    ) -> Arc<Mutex<CallStateMachine>> {
        let (machine, created) = {
            let mut sessions = self.lock_sessions();
            if let Some(entry) = sessions.get_mut(call_id) {
                entry.metadata.touch();
                (Arc::clone(&entry.machine), false)
            } else {
                let machine = Arc::new(Mutex::new(CallStateMachine::new(call_id)));
                sessions.insert(
                    call_id.to_string(),
                    Entry {
                        machine: Arc::clone(&machine),
                        metadata: SessionMetadata::new(phone.map(str::to_string)),
                    },
                );
                (machine, true)
            }
        };
        if created {
            log::info!("session created for call {call_id}");
            if let Err(e) = self.persist_session(call_id).await {
                log::warn!("initial snapshot for call {call_id} failed: {e}");
            }
        }
        machine
    }

    /// Fetch a live session and mark it active.
    pub fn get_session(&self, call_id: &str) -> Option<Arc<Mutex<CallStateMachine>>> {
        let mut sessions = self.lock_sessions();
        sessions.get_mut(call_id).map(|entry| {
            entry.metadata.touch();
            Arc::clone(&entry.machine)
        })
    }

    pub fn has_session(&self, call_id: &str) -> bool {
        self.lock_sessions().contains_key(call_id)
    }

    pub fn get_active_session_ids(&self) -> Vec<String> {
        self.lock_sessions().keys().cloned().collect()
    }

    pub fn get_active_session_count(&self) -> usize {
        self.lock_sessions().len()
    }

    pub fn touch_session(&self, call_id: &str) -> bool {
        let mut sessions = self.lock_sessions();
        match sessions.get_mut(call_id) {
            Some(entry) => {
                entry.metadata.touch();
                true
            }
            None => false,
        }
    }

    /// Find a live session by caller phone number.
    pub fn find_session_by_phone(&self, phone: &str) -> Option<Arc<Mutex<CallStateMachine>>> {
        let sessions = self.lock_sessions();
        sessions
            .values()
            .find(|entry| entry.metadata.phone.as_deref() == Some(phone))
            .map(|entry| Arc::clone(&entry.machine))
    }

    fn snapshot_phone(&self, call_id: &str) -> Result<Option<String>> {
        let sessions = self.lock_sessions();
        let entry = sessions
            .get(call_id)
            .ok_or_else(|| CallguideError::SessionNotFound {
                call_id: call_id.to_string(),
            })?;
        Ok(entry.metadata.phone.clone())
    }

    /// Write the current snapshot for a live session. Unlike the call-path
    /// writes, a failure here is returned to the caller.
    pub async fn persist_session(&self, call_id: &str) -> Result<()> {
        let phone = self.snapshot_phone(call_id)?;
        let machine = self
            .get_session(call_id)
            .ok_or_else(|| CallguideError::SessionNotFound {
                call_id: call_id.to_string(),
            })?;
        let state = machine.lock().await.state().clone();
        self.store.save(&PersistedSession { phone, state }).await
    }

    /// Persist and evict a finished call. The final snapshot is best effort:
    /// a dead store must not pin a finished call in the live cache. The
    /// stored snapshot stays until the retention sweep removes it.
    pub async fn end_session(&self, call_id: &str) -> Result<()> {
        if !self.has_session(call_id) {
            return Err(CallguideError::SessionNotFound {
                call_id: call_id.to_string(),
            });
        }
        if let Err(e) = self.persist_session(call_id).await {
            log::warn!("final snapshot for call {call_id} failed: {e}");
        }
        self.lock_sessions().remove(call_id);
        log::info!("session ended for call {call_id}");
        Ok(())
    }

    /// Bring a session back: the live cache first, then the store. Returns
    /// `None` when neither knows the call.
    pub async fn restore_session(
        &self,
        call_id: &str,
    ) -> Result<Option<Arc<Mutex<CallStateMachine>>>> {
        if let Some(machine) = self.get_session(call_id) {
            return Ok(Some(machine));
        }
        let persisted = match self.store.load(call_id).await {
            Ok(persisted) => persisted,
            Err(e) => {
                return Err(CallguideError::SessionRestore {
                    call_id: call_id.to_string(),
                    message: e.to_string(),
                })
            }
        };
        let Some(persisted) = persisted else {
            return Ok(None);
        };
        let mut metadata = SessionMetadata::new(persisted.phone.clone());
        metadata.created_at = persisted.state.created_at;
        let machine = Arc::new(Mutex::new(CallStateMachine::from_state(persisted.state)));
        let mut sessions = self.lock_sessions();
        // A concurrent restore may have won the race; keep the cached one.
        if let Some(entry) = sessions.get_mut(call_id) {
            entry.metadata.touch();
            return Ok(Some(Arc::clone(&entry.machine)));
        }
        sessions.insert(
            call_id.to_string(),
            Entry {
                machine: Arc::clone(&machine),
                metadata,
            },
        );
        log::info!("session restored for call {call_id}");
        Ok(Some(machine))
    }

    pub async fn get_or_create_session(
        &self,
        call_id: &str,
        phone: Option<&str>,
    ) -> Arc<Mutex<CallStateMachine>> {
        match self.restore_session(call_id).await {
            Ok(Some(machine)) => machine,
            Ok(None) => self.create_session(call_id, phone).await,
            Err(e) => {
                log::warn!("restore for call {call_id} failed, starting fresh: {e}");
                self.create_session(call_id, phone).await
            }
        }
    }

    /// Remove and return the entry for `call_id` iff it is still stale at
    /// the moment of removal. The check and the remove happen under one
    /// lock acquisition, so a touch that lands in between keeps the entry.
    fn take_if_stale(&self, call_id: &str, max_age: Duration) -> Option<Entry> {
        let mut sessions = self.lock_sessions();
        let still_stale = sessions
            .get(call_id)
            .map(|entry| entry.metadata.is_stale(max_age))
            .unwrap_or(false);
        if still_stale {
            sessions.remove(call_id)
        } else {
            None
        }
    }

    /// Evict sessions idle for at least `max_age`, snapshotting each one on
    /// the way out (best effort). Returns how many were evicted.
    pub async fn cleanup_stale_sessions(&self, max_age: Duration) -> usize {
        let candidates: Vec<String> = {
            let sessions = self.lock_sessions();
            sessions
                .iter()
                .filter(|(_, entry)| entry.metadata.is_stale(max_age))
                .map(|(id, _)| id.clone())
                .collect()
        };

        let mut evicted = 0;
        for call_id in candidates {
            // Staleness is re-verified at removal time; activity since the
            // scan keeps the session live.
            let Some(entry) = self.take_if_stale(&call_id, max_age) else {
                continue;
            };
            let state = entry.machine.lock().await.state().clone();
            let snapshot = PersistedSession {
                phone: entry.metadata.phone.clone(),
                state,
            };
            if let Err(e) = self.store.save(&snapshot).await {
                log::warn!("snapshot for evicted stale call {call_id} failed: {e}");
            }
            log::info!("evicted stale session for call {call_id}");
            evicted += 1;
        }
        evicted
    }

    /// Sweep stored snapshots older than `retention` out of the store.
    pub async fn cleanup_old_db_sessions(&self, retention: Duration) -> Result<usize> {
        self.store.delete_older_than(Utc::now() - retention).await
    }

    pub async fn delete_session_from_db(&self, call_id: &str) -> Result<()> {
        self.store.delete(call_id).await
    }

    /// Drop every live session without persisting. Stored snapshots are
    /// untouched.
    pub fn clear_all(&self) {
        self.lock_sessions().clear();
    }

    /// Start the periodic background sweep: stale live sessions are evicted
    /// and expired snapshots removed. Restarting replaces a running sweep.
    pub fn start_cleanup_interval(
        self: &Arc<Self>,
        every: std::time::Duration,
        max_age: Duration,
        retention: Duration,
    ) {
        let manager = Arc::clone(self);
        let handle = tokio::spawn(async move {
            let mut ticker = tokio::time::interval(every);
            // The first tick fires immediately; skip it.
            ticker.tick().await;
            loop {
                ticker.tick().await;
                let evicted = manager.cleanup_stale_sessions(max_age).await;
                if evicted > 0 {
                    log::info!("cleanup pass evicted {evicted} stale sessions");
                }
                match manager.cleanup_old_db_sessions(retention).await {
                    Ok(0) => {}
                    Ok(removed) => log::info!("cleanup pass removed {removed} stored snapshots"),
                    Err(e) => log::warn!("stored snapshot sweep failed: {e}"),
                }
            }
        });
        let mut slot = self.cleanup_task.lock().unwrap_or_else(|e| e.into_inner());
        if let Some(old) = slot.replace(handle) {
            old.abort();
        }
    }

    pub fn stop_cleanup_interval(&self) {
        let mut slot = self.cleanup_task.lock().unwrap_or_else(|e| e.into_inner());
        if let Some(handle) = slot.take() {
            handle.abort();
        }
    }
}

impl Drop for SessionManager {
    fn drop(&mut self) {
        self.stop_cleanup_interval();
    }
}
