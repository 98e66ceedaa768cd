//! Bookkeeping the manager keeps alongside each live machine.

use chrono::{DateTime, Utc};

/// Per-session metadata, tracked in memory only.
#[derive(Debug, Clone, PartialEq)]
pub struct SessionMetadata {
    pub phone: Option<String>,
    pub created_at: DateTime<Utc>,
    pub last_activity_at: DateTime<Utc>,
}

impl SessionMetadata {
    pub fn new(phone: Option<String>) -> Self {
        let now = Utc::now();
        Self {
            phone,
            created_at: now,
            last_activity_at: now,
        }
    }

    pub fn touch(&mut self) {
        self.last_activity_at = Utc::now();
    }

    /// Whether the session has seen no activity for at least `max_age`.
    pub fn is_stale(&self, max_age: chrono::Duration) -> bool {
        Utc::now() - self.last_activity_at >= max_age
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_new_metadata_is_fresh() {
        let meta = SessionMetadata::new(Some("+447700900000".to_string()));
        assert!(!meta.is_stale(chrono::Duration::seconds(1)));
        assert_eq!(meta.created_at, meta.last_activity_at);
    }

    #[test]
    fn test_stale_with_zero_threshold() {
        let meta = SessionMetadata::new(None);
        assert!(meta.is_stale(chrono::Duration::zero()));
    }

    #[test]
    fn test_touch_moves_activity_forward() {
        let mut meta = SessionMetadata::new(None);
        let before = meta.last_activity_at;
        meta.touch();
        assert!(meta.last_activity_at >= before);
        assert!(meta.created_at <= meta.last_activity_at);
    }
}
