//! Error types for the vault pipeline.

use std::io;
use std::path::PathBuf;

use crate::task::TaskStatus;

/// Setup failures. These are the only errors that stop a stage.
#[derive(Debug, thiserror::Error)]
pub enum VaultError {
    /// A pipeline folder is missing and could not be created.
    #[error("Cannot create folder {path}: {source}")]
    CreateFolder {
        /// Folder that was being created.
        path: PathBuf,
        /// Underlying I/O error.
        source: io::Error,
    },

    /// `vault.yaml` exists but could not be read.
    #[error("Failed to read config {path}: {source}")]
    ReadConfig {
        /// Path of the config file.
        path: PathBuf,
        /// Underlying I/O error.
        source: io::Error,
    },

    /// `vault.yaml` is not valid YAML or has unknown keys.
    #[error("Failed to parse config {path}: {source}")]
    ParseConfig {
        /// Path of the config file.
        path: PathBuf,
        /// Parser error, with location.
        source: serde_yaml::Error,
    },
}

/// Failures while turning a dropped file into a task record.
#[derive(Debug, thiserror::Error)]
pub enum IngestError {
    /// The dropped file could not be read.
    #[error("Failed reading {path}: {source}")]
    Read {
        /// Dropped file in `Inbox/`.
        path: PathBuf,
        /// Underlying I/O error.
        source: io::Error,
    },

    /// The task record could not be written.
    #[error("Failed writing {path}: {source}")]
    Write {
        /// Record path in `Needs_Action/`.
        path: PathBuf,
        /// Underlying I/O error.
        source: io::Error,
    },
}

/// A status change that the lifecycle does not allow.
#[derive(Debug, Clone, PartialEq, Eq, thiserror::Error)]
#[error("Illegal status transition: {from} -> {to}")]
pub struct TransitionError {
    /// Current status.
    pub from: TaskStatus,
    /// Requested status.
    pub to: TaskStatus,
}

/// Failures while evaluating and relocating a pending task.
#[derive(Debug, thiserror::Error)]
pub enum DisposeError {
    /// The task record could not be read.
    #[error("Cannot read {path}: {source}")]
    Read {
        /// Task record.
        path: PathBuf,
        /// Underlying I/O error.
        source: io::Error,
    },

    /// The record has no `---` header zone.
    #[error("Task {path} has no header")]
    MissingHeader {
        /// Task record.
        path: PathBuf,
    },

    /// The `status` header value is not a known status.
    #[error("Task {path} has unrecognised status {status:?}")]
    UnknownStatus {
        /// Task record.
        path: PathBuf,
        /// Raw header value, empty when the key is absent.
        status: String,
    },

    /// The task is not pending.
    #[error(transparent)]
    Transition(#[from] TransitionError),

    /// The updated record could not be written.
    #[error("Cannot write {path}: {source}")]
    Write {
        /// Destination that failed.
        path: PathBuf,
        /// Underlying I/O error.
        source: io::Error,
    },

    /// The completed copy reached `Done/` but the original could not be
    /// deleted, even after a retry. A missing original is not this error.
    #[error("Task copied to {copy} but {original} could not be removed: {source}")]
    OrphanedDuplicate {
        /// Record still in `Needs_Action/`.
        original: PathBuf,
        /// Completed copy in `Done/`.
        copy: PathBuf,
        /// Error from the last delete attempt.
        source: io::Error,
    },
}
