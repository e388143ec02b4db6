//! # Configuration
//!
//! `StratumConfig` is read from an optional TOML file, then overridden by
//! `STRATUM_*` environment variables, then by CLI flags. Every field has a
//! default, so an empty file (or no file) is a valid configuration.
//!
//! ## Environment Variables
//!
//! - `STRATUM_DATA_DIR`: durable store root and boot-cache location
//! - `STRATUM_BLOB_PATH`: durable path of the database blob
//! - `STRATUM_WRITER_ID`: identity of this context in broadcasts
//! - `STRATUM_BOOT_CACHE`: `false` disables the boot cache
//! - `STRATUM_DEBOUNCE_MS`, `STRATUM_MAX_WAIT_MS`: flush scheduling
//! - `STRATUM_PHASE_WAIT_SECS`, `STRATUM_HYDRATION_WAIT_MS`,
//!   `STRATUM_SHUTDOWN_FLUSH_MS`: wait bounds
//! - `STRATUM_WARM_ATTEMPTS`, `STRATUM_WARM_BACKOFF_MS`: boot-cache retry

use crate::sync::SyncSettings;
use serde::{Deserialize, Serialize};
use std::path::{Path, PathBuf};
use std::str::FromStr;
use std::time::Duration;
use stratum_core::{StratumError, primitives};

/// Maximum configuration file size (1 MB).
const MAX_CONFIG_FILE_SIZE: u64 = 1024 * 1024;

/// File name of the redb boot cache inside the data directory.
pub const BOOT_CACHE_FILE: &str = "boot-cache.redb";

/// Runtime configuration.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default, deny_unknown_fields)]
pub struct StratumConfig {
    pub data_dir: PathBuf,
    pub blob_path: String,
    pub writer_id: String,
    pub boot_cache: bool,
    pub debounce_ms: u64,
    pub max_wait_ms: u64,
    pub phase_wait_secs: u64,
    pub hydration_wait_ms: u64,
    pub shutdown_flush_ms: u64,
    pub warm_attempts: u32,
    pub warm_backoff_ms: u64,
}

impl Default for StratumConfig {
    fn default() -> Self {
        Self {
            data_dir: PathBuf::from("stratum-data"),
            blob_path: primitives::DEFAULT_BLOB_PATH.to_string(),
            writer_id: format!("stratum-{}", std::process::id()),
            boot_cache: true,
            debounce_ms: primitives::DEFAULT_DEBOUNCE_MS,
            max_wait_ms: primitives::DEFAULT_MAX_WAIT_MS,
            phase_wait_secs: primitives::DEFAULT_PHASE_WAIT_SECS,
            hydration_wait_ms: primitives::DEFAULT_HYDRATION_WAIT_MS,
            shutdown_flush_ms: primitives::DEFAULT_SHUTDOWN_FLUSH_MS,
            warm_attempts: primitives::DEFAULT_WARM_ATTEMPTS,
            warm_backoff_ms: 50,
        }
    }
}

impl StratumConfig {
    /// Load from an optional file and the process environment, then validate.
    pub fn load(path: Option<&Path>) -> Result<Self, StratumError> {
        let base = match path {
            Some(path) => Self::from_file(path)?,
            None => Self::default(),
        };
        let config = base.with_env(|key| std::env::var(key).ok())?;
        config.validate()?;
        Ok(config)
    }

    /// Parse a TOML file.
    pub fn from_file(path: &Path) -> Result<Self, StratumError> {
        let metadata = std::fs::metadata(path).map_err(|e| {
            StratumError::Config(format!("Cannot read '{}': {}", path.display(), e))
        })?;
        if metadata.len() > MAX_CONFIG_FILE_SIZE {
            return Err(StratumError::Config(format!(
                "'{}' is {} bytes, maximum is {}",
                path.display(),
                metadata.len(),
                MAX_CONFIG_FILE_SIZE
            )));
        }

        let text = std::fs::read_to_string(path).map_err(|e| {
            StratumError::Config(format!("Cannot read '{}': {}", path.display(), e))
        })?;
        Self::from_toml(&text)
    }

    /// Parse TOML text.
    pub fn from_toml(text: &str) -> Result<Self, StratumError> {
        toml::from_str(text).map_err(|e| StratumError::Config(format!("Invalid TOML: {}", e)))
    }

    /// Apply `STRATUM_*` overrides read through `lookup`.
    pub fn with_env<F>(mut self, lookup: F) -> Result<Self, StratumError>
    where
        F: Fn(&str) -> Option<String>,
    {
        if let Some(v) = lookup("STRATUM_DATA_DIR") {
            self.data_dir = PathBuf::from(v);
        }
        if let Some(v) = lookup("STRATUM_BLOB_PATH") {
            self.blob_path = v;
        }
        if let Some(v) = lookup("STRATUM_WRITER_ID") {
            self.writer_id = v;
        }
        override_parsed(&lookup, "STRATUM_BOOT_CACHE", &mut self.boot_cache)?;
        override_parsed(&lookup, "STRATUM_DEBOUNCE_MS", &mut self.debounce_ms)?;
        override_parsed(&lookup, "STRATUM_MAX_WAIT_MS", &mut self.max_wait_ms)?;
        override_parsed(&lookup, "STRATUM_PHASE_WAIT_SECS", &mut self.phase_wait_secs)?;
        override_parsed(&lookup, "STRATUM_HYDRATION_WAIT_MS", &mut self.hydration_wait_ms)?;
        override_parsed(&lookup, "STRATUM_SHUTDOWN_FLUSH_MS", &mut self.shutdown_flush_ms)?;
        override_parsed(&lookup, "STRATUM_WARM_ATTEMPTS", &mut self.warm_attempts)?;
        override_parsed(&lookup, "STRATUM_WARM_BACKOFF_MS", &mut self.warm_backoff_ms)?;
        Ok(self)
    }

    /// Reject configurations the coordinator cannot honor.
    pub fn validate(&self) -> Result<(), StratumError> {
        if self.blob_path.trim().is_empty() {
            return Err(StratumError::Config("blob_path must not be empty".to_string()));
        }
        if self.writer_id.trim().is_empty() {
            return Err(StratumError::Config("writer_id must not be empty".to_string()));
        }
        for (name, value) in [
            ("debounce_ms", self.debounce_ms),
            ("max_wait_ms", self.max_wait_ms),
            ("phase_wait_secs", self.phase_wait_secs),
            ("hydration_wait_ms", self.hydration_wait_ms),
            ("shutdown_flush_ms", self.shutdown_flush_ms),
        ] {
            if value == 0 {
                return Err(StratumError::Config(format!("{} must be non-zero", name)));
            }
        }
        if self.max_wait_ms < self.debounce_ms {
            return Err(StratumError::Config(format!(
                "max_wait_ms ({}) must be >= debounce_ms ({})",
                self.max_wait_ms, self.debounce_ms
            )));
        }
        if self.warm_attempts == 0 {
            return Err(StratumError::Config(
                "warm_attempts must be at least 1".to_string(),
            ));
        }
        Ok(())
    }

    /// Sync coordinator settings derived from this configuration.
    #[must_use]
    pub fn sync_settings(&self) -> SyncSettings {
        SyncSettings {
            blob_path: self.blob_path.clone(),
            writer_id: self.writer_id.clone(),
            debounce: Duration::from_millis(self.debounce_ms),
            max_wait: Duration::from_millis(self.max_wait_ms),
            shutdown_flush: Duration::from_millis(self.shutdown_flush_ms),
        }
    }

    #[must_use]
    pub fn phase_wait(&self) -> Duration {
        Duration::from_secs(self.phase_wait_secs)
    }

    #[must_use]
    pub fn hydration_wait(&self) -> Duration {
        Duration::from_millis(self.hydration_wait_ms)
    }

    #[must_use]
    pub fn warm_backoff(&self) -> Duration {
        Duration::from_millis(self.warm_backoff_ms)
    }

    /// Location of the boot cache file.
    #[must_use]
    pub fn boot_cache_path(&self) -> PathBuf {
        self.data_dir.join(BOOT_CACHE_FILE)
    }
}

fn override_parsed<F, T>(lookup: &F, key: &str, slot: &mut T) -> Result<(), StratumError>
where
    F: Fn(&str) -> Option<String>,
    T: FromStr,
    T::Err: std::fmt::Display,
{
    if let Some(raw) = lookup(key) {
        *slot = raw
            .trim()
            .parse()
            .map_err(|e| StratumError::Config(format!("{}='{}': {}", key, raw, e)))?;
    }
    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::collections::BTreeMap;

    fn env(pairs: &[(&str, &str)]) -> impl Fn(&str) -> Option<String> {
        let map: BTreeMap<String, String> = pairs
            .iter()
            .map(|(k, v)| (k.to_string(), v.to_string()))
            .collect();
        move |key| map.get(key).cloned()
    }

    #[test]
    fn defaults_are_valid() {
        StratumConfig::default().validate().expect("valid");
    }

    #[test]
    fn partial_toml_keeps_defaults() {
        let config = StratumConfig::from_toml("debounce_ms = 500\nboot_cache = false\n")
            .expect("parse");
        assert_eq!(config.debounce_ms, 500);
        assert!(!config.boot_cache);
        assert_eq!(config.max_wait_ms, primitives::DEFAULT_MAX_WAIT_MS);
    }

    #[test]
    fn unknown_keys_rejected() {
        assert!(StratumConfig::from_toml("debounce = 5").is_err());
    }

    #[test]
    fn env_overrides_file() {
        let config = StratumConfig::from_toml("debounce_ms = 500")
            .expect("parse")
            .with_env(env(&[
                ("STRATUM_DEBOUNCE_MS", "750"),
                ("STRATUM_WRITER_ID", "ctx-a"),
            ]))
            .expect("env");
        assert_eq!(config.debounce_ms, 750);
        assert_eq!(config.writer_id, "ctx-a");
    }

    #[test]
    fn malformed_env_value_is_config_error() {
        let result =
            StratumConfig::default().with_env(env(&[("STRATUM_MAX_WAIT_MS", "soon")]));
        assert!(matches!(result, Err(StratumError::Config(_))));
    }

    #[test]
    fn max_wait_below_debounce_rejected() {
        let config = StratumConfig {
            debounce_ms: 5_000,
            max_wait_ms: 1_000,
            ..StratumConfig::default()
        };
        assert!(config.validate().is_err());
    }

    #[test]
    fn zero_bounds_rejected() {
        let config = StratumConfig {
            hydration_wait_ms: 0,
            ..StratumConfig::default()
        };
        assert!(config.validate().is_err());
    }

    #[test]
    fn load_reads_file() {
        let dir = tempfile::tempdir().expect("tempdir");
        let path = dir.path().join("stratum.toml");
        std::fs::write(&path, "blob_path = \"notes.db\"\n").expect("write");

        let config = StratumConfig::from_file(&path).expect("load");
        assert_eq!(config.blob_path, "notes.db");
        assert_eq!(config.sync_settings().blob_path, "notes.db");
    }
}
