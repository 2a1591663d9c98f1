//! Engine error types using thiserror
//!
//! Error taxonomy:
//! - ProbeError: detection failed — absorbed locally, degrades to "not installed"
//! - InstallError: installation command failed — surfaced in outcomes, never panics
//! - TimeoutError: external command exceeded its budget
//! - SecurityCheckError: audit tool unavailable/failed — silently downgrades the flag
//! - BackupError: snapshot/restore failure — fatal for that operation only
//! - ConfigError: configuration file problems

use std::path::PathBuf;
use thiserror::Error;

use crate::domain::{DependencyKind, Ecosystem};

/// Top-level engine error type
#[derive(Error, Debug)]
pub enum EngineError {
    /// Dependency detection errors
    #[error(transparent)]
    Probe(#[from] ProbeError),

    /// Installation errors
    #[error(transparent)]
    Install(#[from] InstallError),

    /// External command timeout errors
    #[error(transparent)]
    Timeout(#[from] TimeoutError),

    /// Security audit errors
    #[error(transparent)]
    SecurityCheck(#[from] SecurityCheckError),

    /// Backup and restore errors
    #[error(transparent)]
    Backup(#[from] BackupError),

    /// Configuration errors
    #[error(transparent)]
    Config(#[from] ConfigError),
}

/// Errors raised while probing for an installed dependency
#[derive(Error, Debug)]
pub enum ProbeError {
    /// The probe command could not be executed
    #[error("probe command '{command}' failed: {message}")]
    CommandFailed { command: String, message: String },

    /// Command ran but its output could not be interpreted
    #[error("failed to parse probe output for '{package}': {message}")]
    ParseFailure { package: String, message: String },

    /// The dependency is not present in the catalog
    #[error("unknown dependency: {name}")]
    UnknownDependency { name: String },
}

/// Errors raised while installing or updating a dependency
#[derive(Error, Debug)]
pub enum InstallError {
    /// The install command exited with a failure status
    #[error("install command '{command}' failed for '{package}': {stderr}")]
    CommandFailed {
        package: String,
        command: String,
        stderr: String,
    },

    /// No installation strategy exists for this dependency kind
    #[error("no installation strategy for '{package}' ({kind})")]
    NoStrategy {
        package: String,
        kind: DependencyKind,
    },

    /// The dependency can only be installed manually
    #[error("'{package}' requires manual installation: {guidance}")]
    ManualInstallRequired { package: String, guidance: String },

    /// The install command claimed success but the re-probe found nothing
    #[error("'{package}' not detected after installation")]
    VerificationFailed { package: String },
}

/// An external command exceeded its time budget
#[derive(Error, Debug)]
pub enum TimeoutError {
    /// Command was killed after running too long
    #[error("command '{command}' timed out after {seconds}s")]
    Command { command: String, seconds: u64 },
}

/// Errors raised by the best-effort security audit integration
#[derive(Error, Debug)]
pub enum SecurityCheckError {
    /// The audit tool is not installed
    #[error("audit tool '{tool}' is not available")]
    ToolUnavailable { tool: String },

    /// The audit ran but produced unusable output
    #[error("security audit failed for {ecosystem}: {message}")]
    AuditFailed {
        ecosystem: Ecosystem,
        message: String,
    },
}

/// Errors raised by the backup manager
#[derive(Error, Debug)]
pub enum BackupError {
    /// No backup directory with this id exists
    #[error("backup '{id}' not found")]
    NotFound { id: String },

    /// The backup exists but has no metadata file (incomplete snapshot)
    #[error("backup '{id}' has no metadata and cannot be trusted")]
    MetadataMissing { id: String },

    /// The backup is missing files listed in its metadata
    #[error("backup '{id}' is incomplete: missing {file}")]
    Incomplete { id: String, file: String },

    /// Filesystem error while copying backup files
    #[error("backup IO error at {path}: {source}")]
    Io {
        path: PathBuf,
        #[source]
        source: std::io::Error,
    },

    /// Metadata file could not be parsed
    #[error("failed to parse backup metadata for '{id}': {message}")]
    MetadataParse { id: String, message: String },
}

/// Errors related to configuration files
#[derive(Error, Debug)]
pub enum ConfigError {
    /// Failed to read or write the configuration file
    #[error("config IO error at {path}: {source}")]
    Io {
        path: PathBuf,
        #[source]
        source: std::io::Error,
    },

    /// Configuration file content is invalid
    #[error("failed to parse config {path}: {message}")]
    Parse { path: PathBuf, message: String },
}

impl ProbeError {
    /// Creates a new CommandFailed error
    pub fn command_failed(command: impl Into<String>, message: impl Into<String>) -> Self {
        ProbeError::CommandFailed {
            command: command.into(),
            message: message.into(),
        }
    }

    /// Creates a new ParseFailure error
    pub fn parse_failure(package: impl Into<String>, message: impl Into<String>) -> Self {
        ProbeError::ParseFailure {
            package: package.into(),
            message: message.into(),
        }
    }

    /// Creates a new UnknownDependency error
    pub fn unknown(name: impl Into<String>) -> Self {
        ProbeError::UnknownDependency { name: name.into() }
    }
}

impl InstallError {
    /// Creates a new CommandFailed error
    pub fn command_failed(
        package: impl Into<String>,
        command: impl Into<String>,
        stderr: impl Into<String>,
    ) -> Self {
        InstallError::CommandFailed {
            package: package.into(),
            command: command.into(),
            stderr: stderr.into(),
        }
    }

    /// Creates a new ManualInstallRequired error
    pub fn manual(package: impl Into<String>, guidance: impl Into<String>) -> Self {
        InstallError::ManualInstallRequired {
            package: package.into(),
            guidance: guidance.into(),
        }
    }

    /// Creates a new VerificationFailed error
    pub fn verification_failed(package: impl Into<String>) -> Self {
        InstallError::VerificationFailed {
            package: package.into(),
        }
    }
}

impl TimeoutError {
    /// Creates a new Command timeout error
    pub fn command(command: impl Into<String>, seconds: u64) -> Self {
        TimeoutError::Command {
            command: command.into(),
            seconds,
        }
    }
}

impl BackupError {
    /// Creates a new NotFound error
    pub fn not_found(id: impl Into<String>) -> Self {
        BackupError::NotFound { id: id.into() }
    }

    /// Creates a new MetadataMissing error
    pub fn metadata_missing(id: impl Into<String>) -> Self {
        BackupError::MetadataMissing { id: id.into() }
    }

    /// Creates a new Incomplete error
    pub fn incomplete(id: impl Into<String>, file: impl Into<String>) -> Self {
        BackupError::Incomplete {
            id: id.into(),
            file: file.into(),
        }
    }

    /// Creates a new Io error
    pub fn io(path: impl Into<PathBuf>, source: std::io::Error) -> Self {
        BackupError::Io {
            path: path.into(),
            source,
        }
    }
}
