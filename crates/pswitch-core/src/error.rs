//! Error taxonomy shared by every pswitch operation.

use std::path::PathBuf;

use thiserror::Error;

/// Errors raised by graph parsing, the switch engine and the solution CLI wrapper.
///
/// None of these are retried. A failure in a multi-step operation leaves
/// earlier steps applied; re-running re-derives the state from disk.
#[derive(Debug, Error)]
pub enum SwitchError {
    #[error("solution file not found '{0}'")]
    ManifestNotFound(String),

    #[error("project file not found '{0}'")]
    ProjectNotFound(PathBuf),

    #[error("package '{package}' is not referenced in '{project}'")]
    PackageNotFound { project: String, package: String },

    #[error("no switched reference for package '{package}' in '{project}'")]
    SwitchStateNotFound { project: String, package: String },

    #[error("package '{package}' is already switched in '{project}'")]
    AlreadySwitched { project: String, package: String },

    #[error("failed to parse '{}': {message}", path.display())]
    ParseFailure { path: PathBuf, message: String },

    #[error("error executing command: {command}\nError: {message}")]
    ExternalToolFailure { command: String, message: String },

    #[error("I/O error on '{}': {source}", path.display())]
    Io {
        path: PathBuf,
        #[source]
        source: std::io::Error,
    },

    #[error("failed to serialise report: {0}")]
    Serialization(#[from] serde_json::Error),
}

impl SwitchError {
    pub(crate) fn io(path: impl Into<PathBuf>, source: std::io::Error) -> Self {
        Self::Io {
            path: path.into(),
            source,
        }
    }

    /// True for the "something is absent" family of errors.
    pub fn is_not_found(&self) -> bool {
        matches!(
            self,
            Self::ManifestNotFound(_)
                | Self::ProjectNotFound(_)
                | Self::PackageNotFound { .. }
                | Self::SwitchStateNotFound { .. }
        )
    }
}

pub type Result<T> = std::result::Result<T, SwitchError>;
