//! Configuration types.
//!
//! Values come from an optional `vault.yaml` at the vault root; command-line
//! flags override them.

use std::io;
use std::time::Duration;

use serde::Deserialize;

use crate::error::VaultError;
use crate::policy::DEFAULT_APPROVAL_THRESHOLD;
use crate::ports::FileSystem;
use crate::vault::Vault;

/// Pipeline configuration.
#[derive(Debug, Clone, PartialEq, Deserialize)]
#[serde(default, deny_unknown_fields)]
pub struct VaultConfig {
    /// Seconds between inbox scans.
    pub poll_interval_secs: u64,
    /// Dollar amount above which a payment needs approval.
    pub approval_threshold: f64,
    /// Value written to `processed_by` on completed tasks.
    pub processor_id: String,
    /// OS housekeeping files the watcher never ingests.
    pub ignored_files: Vec<String>,
}

impl Default for VaultConfig {
    fn default() -> Self {
        Self {
            poll_interval_secs: 10,
            approval_threshold: DEFAULT_APPROVAL_THRESHOLD,
            processor_id: "reasoning-loop".to_string(),
            ignored_files: [".DS_Store", ".gitkeep", "desktop.ini", "Thumbs.db"]
                .into_iter()
                .map(String::from)
                .collect(),
        }
    }
}

impl VaultConfig {
    /// Loads `vault.yaml`, falling back to defaults when it does not exist.
    ///
    /// # Errors
    ///
    /// Returns an error if the file exists but cannot be read or parsed.
    pub fn load(fs: &dyn FileSystem, vault: &Vault) -> Result<Self, VaultError> {
        let path = vault.config_file();
        let text = match fs.read_to_string(&path) {
            Ok(text) => text,
            Err(e) if e.kind() == io::ErrorKind::NotFound => return Ok(Self::default()),
            Err(source) => return Err(VaultError::ReadConfig { path, source }),
        };
        if text.trim().is_empty() {
            return Ok(Self::default());
        }
        serde_yaml::from_str(&text).map_err(|source| VaultError::ParseConfig { path, source })
    }

    /// Poll interval as a [`Duration`].
    #[must_use]
    pub fn poll_interval(&self) -> Duration {
        Duration::from_secs(self.poll_interval_secs.max(1))
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::adapters::memory::MemoryFileSystem;

    #[test]
    fn missing_file_gives_defaults() {
        let fs = MemoryFileSystem::new();
        let config = VaultConfig::load(&fs, &Vault::new("/v")).unwrap();
        assert_eq!(config, VaultConfig::default());
        assert_eq!(config.poll_interval(), Duration::from_secs(10));
        assert!(config.ignored_files.iter().any(|f| f == "Thumbs.db"));
    }

    #[test]
    fn partial_file_overrides_only_given_keys() {
        let fs = MemoryFileSystem::new();
        fs.insert("/v/vault.yaml", "poll_interval_secs: 3\nprocessor_id: night-shift\n");
        let config = VaultConfig::load(&fs, &Vault::new("/v")).unwrap();
        assert_eq!(config.poll_interval_secs, 3);
        assert_eq!(config.processor_id, "night-shift");
        assert!((config.approval_threshold - 100.0).abs() < f64::EPSILON);
    }

    #[test]
    fn unknown_keys_are_rejected() {
        let fs = MemoryFileSystem::new();
        fs.insert("/v/vault.yaml", "poll_interval: 3\n");
        let err = VaultConfig::load(&fs, &Vault::new("/v")).unwrap_err();
        assert!(matches!(err, VaultError::ParseConfig { .. }));
    }

    #[test]
    fn zero_interval_is_clamped() {
        let config = VaultConfig { poll_interval_secs: 0, ..VaultConfig::default() };
        assert_eq!(config.poll_interval(), Duration::from_secs(1));
    }
}
