use serde::{Deserialize, Serialize};
use std::fs;
use std::path::{Path, PathBuf};

use crate::defaults;

/// Root configuration structure
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq, Default)]
#[serde(default)]
pub struct Config {
    pub classifier: ClassifierConfig,
    pub session: SessionConfig,
    pub storage: StorageConfig,
}

/// Segment classifier configuration
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
#[serde(default)]
pub struct ClassifierConfig {
    /// Quiet period before the streaming classifier re-runs, in milliseconds.
    pub debounce_ms: u64,
    /// Whether to consult the semantic (tier-2) classifier on low or
    /// ambiguous tier-1 confidence.
    pub use_tier2: bool,
}

/// Session lifecycle configuration
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
#[serde(default)]
pub struct SessionConfig {
    /// Idle age after which an in-memory session is evicted, in seconds.
    pub stale_after_secs: u64,
    /// Interval between background stale-session sweeps, in seconds.
    pub cleanup_interval_secs: u64,
    /// Age after which a durable call record is deleted, in seconds.
    pub db_retention_secs: u64,
}

/// Durable storage configuration
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq, Default)]
#[serde(default)]
pub struct StorageConfig {
    /// Directory for the file-backed session store. `None` selects the
    /// in-memory store.
    pub dir: Option<PathBuf>,
}

impl Default for ClassifierConfig {
    fn default() -> Self {
        Self {
            debounce_ms: defaults::CLASSIFY_DEBOUNCE_MS,
            use_tier2: false,
        }
    }
}

impl Default for SessionConfig {
    fn default() -> Self {
        Self {
            stale_after_secs: defaults::STALE_SESSION_SECS,
            cleanup_interval_secs: defaults::CLEANUP_INTERVAL_SECS,
            db_retention_secs: defaults::DB_RETENTION_SECS,
        }
    }
}

impl Config {
    /// Load configuration from a TOML file
    ///
    /// Returns an error if the file contains invalid TOML.
    /// Missing fields will use default values.
    pub fn load(path: &Path) -> anyhow::Result<Self> {
        let contents = fs::read_to_string(path)?;
        let config: Config = toml::from_str(&contents)?;
        Ok(config)
    }

    /// Load configuration from a file or return defaults if file doesn't exist
    ///
    /// Only returns defaults if the file is missing.
    /// Returns errors for invalid TOML.
    pub fn load_or_default(path: &Path) -> anyhow::Result<Self> {
        match Self::load(path) {
            Ok(config) => Ok(config),
            Err(e) => {
                if e.downcast_ref::<std::io::Error>()
                    .map(|io_err| io_err.kind() == std::io::ErrorKind::NotFound)
                    .unwrap_or(false)
                {
                    Ok(Self::default())
                } else {
                    Err(e)
                }
            }
        }
    }

    /// Apply environment variable overrides
    ///
    /// Supported environment variables:
    /// - CALLGUIDE_DEBOUNCE_MS → classifier.debounce_ms
    /// - CALLGUIDE_USE_TIER2 → classifier.use_tier2 ("1"/"true")
    /// - CALLGUIDE_STORAGE_DIR → storage.dir
    pub fn with_env_overrides(mut self) -> Self {
        if let Ok(raw) = std::env::var("CALLGUIDE_DEBOUNCE_MS") {
            if let Ok(ms) = raw.parse::<u64>() {
                self.classifier.debounce_ms = ms;
            }
        }

        if let Ok(raw) = std::env::var("CALLGUIDE_USE_TIER2") {
            if !raw.is_empty() {
                self.classifier.use_tier2 = raw == "1" || raw.eq_ignore_ascii_case("true");
            }
        }

        if let Ok(dir) = std::env::var("CALLGUIDE_STORAGE_DIR") {
            if !dir.is_empty() {
                self.storage.dir = Some(PathBuf::from(dir));
            }
        }

        self
    }

    /// Get the default configuration file path
    ///
    /// Returns ~/.config/callguide/config.toml on Linux
    #[cfg(feature = "cli")]
    pub fn default_path() -> Option<PathBuf> {
        dirs::config_dir().map(|dir| dir.join("callguide").join("config.toml"))
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::io::Write;
    use std::sync::Mutex;
    use tempfile::NamedTempFile;

    // Mutex to serialize tests that modify environment variables
    static ENV_LOCK: Mutex<()> = Mutex::new(());

    // Only called with ENV_LOCK held, so tests never race on the
    // environment.
    fn set_env(key: &str, value: &str) {
        std::env::set_var(key, value);
    }

    fn remove_env(key: &str) {
        std::env::remove_var(key);
    }

    fn clear_callguide_env() {
        remove_env("CALLGUIDE_DEBOUNCE_MS");
        remove_env("CALLGUIDE_USE_TIER2");
        remove_env("CALLGUIDE_STORAGE_DIR");
    }

    #[test]
    fn test_default_config_has_correct_values() {
        let config = Config::default();

        assert_eq!(
            config.classifier.debounce_ms,
            crate::defaults::CLASSIFY_DEBOUNCE_MS
        );
        assert!(!config.classifier.use_tier2);

        assert_eq!(
            config.session.stale_after_secs,
            crate::defaults::STALE_SESSION_SECS
        );
        assert_eq!(
            config.session.cleanup_interval_secs,
            crate::defaults::CLEANUP_INTERVAL_SECS
        );
        assert_eq!(
            config.session.db_retention_secs,
            crate::defaults::DB_RETENTION_SECS
        );

        assert_eq!(config.storage.dir, None);
    }

    #[test]
    fn test_load_from_toml_file() {
        let toml_content = r#"
            [classifier]
            debounce_ms = 150
            use_tier2 = true

            [session]
            stale_after_secs = 600
            cleanup_interval_secs = 60
            db_retention_secs = 3600

            [storage]
            dir = "/var/lib/callguide"
        "#;

        let mut temp_file = NamedTempFile::new().unwrap();
        temp_file.write_all(toml_content.as_bytes()).unwrap();

        let config = Config::load(temp_file.path()).unwrap();

        assert_eq!(config.classifier.debounce_ms, 150);
        assert!(config.classifier.use_tier2);
        assert_eq!(config.session.stale_after_secs, 600);
        assert_eq!(config.session.cleanup_interval_secs, 60);
        assert_eq!(config.session.db_retention_secs, 3600);
        assert_eq!(config.storage.dir, Some(PathBuf::from("/var/lib/callguide")));
    }

    #[test]
    fn test_load_partial_config_uses_defaults() {
        let toml_content = r#"
            [classifier]
            debounce_ms = 500
        "#;

        let mut temp_file = NamedTempFile::new().unwrap();
        temp_file.write_all(toml_content.as_bytes()).unwrap();

        let config = Config::load(temp_file.path()).unwrap();

        // Only debounce should be overridden
        assert_eq!(config.classifier.debounce_ms, 500);

        // Everything else should be defaults
        assert!(!config.classifier.use_tier2);
        assert_eq!(
            config.session.stale_after_secs,
            crate::defaults::STALE_SESSION_SECS
        );
        assert_eq!(config.storage.dir, None);
    }

    #[test]
    fn test_env_override_debounce() {
        let _lock = ENV_LOCK.lock().unwrap();
        clear_callguide_env();

        set_env("CALLGUIDE_DEBOUNCE_MS", "42");
        let config = Config::default().with_env_overrides();

        assert_eq!(config.classifier.debounce_ms, 42);
        assert!(!config.classifier.use_tier2); // Not overridden

        clear_callguide_env();
    }

    #[test]
    fn test_env_override_tier2() {
        let _lock = ENV_LOCK.lock().unwrap();
        clear_callguide_env();

        set_env("CALLGUIDE_USE_TIER2", "true");
        let config = Config::default().with_env_overrides();
        assert!(config.classifier.use_tier2);

        set_env("CALLGUIDE_USE_TIER2", "0");
        let config = Config::default().with_env_overrides();
        assert!(!config.classifier.use_tier2);

        clear_callguide_env();
    }

    #[test]
    fn test_env_override_storage_dir() {
        let _lock = ENV_LOCK.lock().unwrap();
        clear_callguide_env();

        set_env("CALLGUIDE_STORAGE_DIR", "/tmp/callguide-store");
        let config = Config::default().with_env_overrides();

        assert_eq!(
            config.storage.dir,
            Some(PathBuf::from("/tmp/callguide-store"))
        );

        clear_callguide_env();
    }

    #[test]
    fn test_env_override_invalid_debounce_ignored() {
        let _lock = ENV_LOCK.lock().unwrap();
        clear_callguide_env();

        set_env("CALLGUIDE_DEBOUNCE_MS", "not-a-number");
        let config = Config::default().with_env_overrides();

        assert_eq!(
            config.classifier.debounce_ms,
            crate::defaults::CLASSIFY_DEBOUNCE_MS
        );

        clear_callguide_env();
    }

    #[test]
    fn test_invalid_toml_returns_error() {
        let invalid_toml = r#"
            [classifier
            debounce_ms = "broken
        "#;

        let mut temp_file = NamedTempFile::new().unwrap();
        temp_file.write_all(invalid_toml.as_bytes()).unwrap();

        let result = Config::load(temp_file.path());

        assert!(result.is_err());
    }

    #[test]
    fn test_load_or_default_returns_default_for_missing_file() {
        let missing_path = Path::new("/tmp/nonexistent_callguide_config_12345.toml");
        let config = Config::load_or_default(missing_path).unwrap();

        assert_eq!(config, Config::default());
    }

    #[test]
    fn test_load_or_default_errors_on_invalid_toml() {
        let invalid_toml = r#"
            [classifier
            debounce_ms = "broken
        "#;

        let mut temp_file = NamedTempFile::new().unwrap();
        temp_file.write_all(invalid_toml.as_bytes()).unwrap();

        // Invalid TOML must surface as an error, not silently become defaults
        assert!(Config::load_or_default(temp_file.path()).is_err());
    }
}
