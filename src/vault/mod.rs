//! Vault layout: the fixed folder structure under a configurable root.
//!
//! ```text
//! <root>/
//!   ├── Inbox/          dropped files waiting for ingestion
//!   ├── Needs_Action/   task records (pending, awaiting_approval)
//!   ├── Done/           completed task records
//!   ├── Logs/           stage log files
//!   ├── Dashboard.md
//!   └── vault.yaml      optional configuration
//! ```

use std::path::{Path, PathBuf};

use tracing::{error, info};

use crate::error::VaultError;
use crate::ports::{FileSystem, FolderCounts};

/// Paths of one vault.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Vault {
    root: PathBuf,
}

impl Vault {
    /// Creates a layout rooted at `root`. Nothing is touched on disk.
    #[must_use]
    pub fn new(root: impl Into<PathBuf>) -> Self {
        Self { root: root.into() }
    }

    /// The vault root.
    #[must_use]
    pub fn root(&self) -> &Path {
        &self.root
    }

    /// Where files are dropped.
    #[must_use]
    pub fn inbox(&self) -> PathBuf {
        self.root.join("Inbox")
    }

    /// Where task records wait for disposition.
    #[must_use]
    pub fn needs_action(&self) -> PathBuf {
        self.root.join("Needs_Action")
    }

    /// Where completed task records end up.
    #[must_use]
    pub fn done(&self) -> PathBuf {
        self.root.join("Done")
    }

    /// Stage log files.
    #[must_use]
    pub fn logs(&self) -> PathBuf {
        self.root.join("Logs")
    }

    /// The status document.
    #[must_use]
    pub fn dashboard(&self) -> PathBuf {
        self.root.join("Dashboard.md")
    }

    /// Optional YAML configuration.
    #[must_use]
    pub fn config_file(&self) -> PathBuf {
        self.root.join("vault.yaml")
    }

    /// Creates every pipeline folder that is missing.
    ///
    /// # Errors
    ///
    /// Returns [`VaultError::CreateFolder`] for the first folder that cannot
    /// be created; the stages cannot run without it.
    pub fn ensure_layout(&self, fs: &dyn FileSystem) -> Result<(), VaultError> {
        for folder in [self.inbox(), self.needs_action(), self.done(), self.logs()] {
            fs.create_dir_all(&folder).map_err(|source| {
                error!(folder = %folder.display(), %source, "cannot create folder");
                VaultError::CreateFolder { path: folder.clone(), source }
            })?;
        }
        info!(root = %self.root.display(), "vault layout ready");
        Ok(())
    }

    /// Counts files in the three watched folders.
    ///
    /// # Errors
    ///
    /// Returns the first listing error.
    pub fn counts(&self, fs: &dyn FileSystem) -> std::io::Result<FolderCounts> {
        Ok(FolderCounts {
            inbox: fs.list_files(&self.inbox())?.len(),
            needs_action: fs.list_files(&self.needs_action())?.len(),
            done: fs.list_files(&self.done())?.len(),
        })
    }
}
