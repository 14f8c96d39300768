//! Option resolution: turns parsed flags into [`InvocationOptions`].
//!
//! This is the only phase allowed to reject an invocation, and it does so
//! before any command has run.

use serde::Serialize;
use std::fmt;
use std::path::PathBuf;

use crate::cli::DeployArgs;
use crate::error::{DeployError, DeployResult};

/// Build profile. Distribution adds SDK targeting, version stamping and the
/// helper install on top of the development workflow.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
pub enum Profile {
    Development,
    Distribution,
}

/// Build tool configuration name.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
pub enum Configuration {
    Debug,
    Release,
    Distribution,
}

impl Configuration {
    /// Name passed to `-configuration` and used as the output subdirectory.
    pub fn name(self) -> &'static str {
        match self {
            Self::Debug => "Debug",
            Self::Release => "Release",
            Self::Distribution => "Distribution",
        }
    }
}

impl fmt::Display for Configuration {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.name())
    }
}

/// Resolved invocation.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct InvocationOptions {
    pub clean: bool,
    pub profile: Profile,
    pub configuration: Configuration,
    /// Staging root. None means deploy to the live machine.
    pub install_root: Option<PathBuf>,
    pub dry_run: bool,
}

impl InvocationOptions {
    /// Resolve flags. `--root` must name an existing directory.
    pub fn resolve(args: &DeployArgs) -> DeployResult<Self> {
        if args.debug && args.release {
            return Err(DeployError::InvalidArgument(
                "--debug and --release cannot be combined".to_string(),
            ));
        }

        if let Some(root) = &args.root {
            if root.as_os_str().is_empty() {
                return Err(DeployError::InvalidArgument(
                    "--root requires a directory".to_string(),
                ));
            }
            if !root.exists() {
                return Err(DeployError::InvalidArgument(format!(
                    "root directory {} does not exist",
                    root.display()
                )));
            }
            if !root.is_dir() {
                return Err(DeployError::InvalidArgument(format!(
                    "root {} is not a directory",
                    root.display()
                )));
            }
        }

        let (profile, configuration, clean) = if args.release {
            (Profile::Distribution, Configuration::Distribution, true)
        } else if args.debug {
            (Profile::Development, Configuration::Debug, args.clean)
        } else {
            (Profile::Development, Configuration::Release, args.clean)
        };

        Ok(Self {
            clean,
            profile,
            configuration,
            install_root: args.root.clone(),
            dry_run: args.dry_run,
        })
    }

    /// True when this run replaces the extension on the running system.
    pub fn targets_live_system(&self) -> bool {
        self.install_root.is_none()
    }
}
