//! Error kinds for a deploy run.
//!
//! Command plumbing reports failures as `anyhow::Error` (exit code plus
//! captured stderr). The orchestrator wraps those into a [`DeployError`]
//! naming the phase and step that failed.

use thiserror::Error;

/// Result type alias for deploy phases.
pub type DeployResult<T> = Result<T, DeployError>;

/// A fatal deploy failure. Every variant aborts the run.
#[derive(Error, Debug)]
pub enum DeployError {
    /// Bad invocation, detected before any command runs.
    #[error("invalid argument: {0}")]
    InvalidArgument(String),

    /// Workspace cleanup, version lookup or the build tool failed.
    #[error("build failed at '{step}': {cause:#}")]
    BuildTool {
        step: &'static str,
        cause: anyhow::Error,
    },

    /// The loaded-extension query or the unload request failed.
    #[error("cannot unload {bundle_id}: {cause:#}")]
    Unload {
        bundle_id: String,
        cause: anyhow::Error,
    },

    /// Directory creation or artifact copy failed.
    #[error("install failed at '{step}': {cause:#}")]
    Install {
        step: &'static str,
        cause: anyhow::Error,
    },

    /// Set-user-ID or ownership fixup failed.
    #[error("permission fixup failed at '{step}': {cause:#}")]
    Permission {
        step: &'static str,
        cause: anyhow::Error,
    },
}

impl DeployError {
    pub fn build(step: &'static str) -> impl FnOnce(anyhow::Error) -> Self {
        move |cause| Self::BuildTool { step, cause }
    }

    pub fn install(step: &'static str) -> impl FnOnce(anyhow::Error) -> Self {
        move |cause| Self::Install { step, cause }
    }

    pub fn permission(step: &'static str) -> impl FnOnce(anyhow::Error) -> Self {
        move |cause| Self::Permission { step, cause }
    }

    /// Short kind name, used in the failure banner.
    pub fn kind(&self) -> &'static str {
        match self {
            Self::InvalidArgument(_) => "InvalidArgument",
            Self::BuildTool { .. } => "BuildToolError",
            Self::Unload { .. } => "UnloadError",
            Self::Install { .. } => "InstallError",
            Self::Permission { .. } => "PermissionError",
        }
    }
}
