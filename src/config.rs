//! Configuration management for fuse4x-deploy.
//!
//! Reads configuration from .env file and environment variables.
//! Environment variables take precedence over .env file.

use serde::Serialize;
use std::collections::HashMap;
use std::path::{Path, PathBuf};

/// File name of the extension bundle produced by the build.
pub const KEXT_NAME: &str = "fuse4x.kext";

/// Bundle identifier used for load/unload queries.
pub const BUNDLE_IDENTIFIER: &str = "org.fuse4x.kext.fuse4x";

/// Companion helper shipped in the bundle's `Support` directory.
pub const HELPER_NAME: &str = "load_fuse4x";

/// Preprocessor macro the kext stringifies into its version string.
pub const VERSION_MACRO: &str = "FUSE4X_VERSION_LITERAL";

pub const DEFAULT_KEXT_DIR: &str = "/System/Library/Extensions";
pub const DEFAULT_OWNER: &str = "root:wheel";
pub const DEFAULT_BUILD_TOOL: &str = "xcodebuild";
pub const DEFAULT_GIT: &str = "git";
pub const DEFAULT_SUDO: &str = "sudo";

/// Kernel extensions must be built against the SDK of the oldest OS they
/// support.
pub const DEFAULT_DIST_SDK: &str = "macosx10.5";
pub const DEFAULT_DEPLOYMENT_TARGET: &str = "10.5";

/// Deploy configuration.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct Config {
    /// Directory holding the Xcode project; `build/` lives under it.
    pub project_dir: PathBuf,
    /// Build tool binary (default: xcodebuild)
    pub build_tool: String,
    /// Source control binary (default: git)
    pub git: String,
    /// Elevation wrapper for privileged commands. None runs them directly.
    pub sudo: Option<String>,
    /// Live system extension directory.
    pub kext_dir: PathBuf,
    /// `user:group` the installed bundle is handed to.
    pub owner: String,
    /// SDK for distribution builds.
    pub distribution_sdk: String,
    /// MACOSX_DEPLOYMENT_TARGET for distribution builds.
    pub deployment_target: String,
}

impl Config {
    /// Load configuration from .env file and environment.
    ///
    /// The .env file is looked up in `base_dir`. A malformed .env is
    /// reported and ignored.
    pub fn load(base_dir: &Path) -> Self {
        let mut env_vars = HashMap::new();

        let env_path = base_dir.join(".env");
        if env_path.exists() {
            match dotenvy::from_path_iter(&env_path) {
                Ok(iter) => {
                    for item in iter {
                        match item {
                            Ok((key, value)) => {
                                env_vars.insert(key, value);
                            }
                            Err(e) => {
                                eprintln!("[WARN] Skipping line in {}: {}", env_path.display(), e);
                            }
                        }
                    }
                }
                Err(e) => eprintln!("[WARN] Cannot read {}: {}", env_path.display(), e),
            }
        }

        // Environment variables override .env file
        for (key, value) in std::env::vars() {
            env_vars.insert(key, value);
        }

        Self::from_vars(base_dir, &env_vars)
    }

    /// Build config from an already merged variable map.
    pub fn from_vars(base_dir: &Path, vars: &HashMap<String, String>) -> Self {
        let get = |key: &str, default: &str| {
            vars.get(key)
                .cloned()
                .unwrap_or_else(|| default.to_string())
        };

        let project_dir = vars
            .get("FUSE4X_PROJECT_DIR")
            .map(|s| {
                let path = PathBuf::from(s);
                if path.is_absolute() {
                    path
                } else {
                    base_dir.join(path)
                }
            })
            .unwrap_or_else(|| base_dir.to_path_buf());

        // Empty FUSE4X_SUDO means "already privileged"
        let sudo = Some(get("FUSE4X_SUDO", DEFAULT_SUDO)).filter(|s| !s.trim().is_empty());

        Self {
            project_dir,
            build_tool: get("FUSE4X_BUILD_TOOL", DEFAULT_BUILD_TOOL),
            git: get("FUSE4X_GIT", DEFAULT_GIT),
            sudo,
            kext_dir: PathBuf::from(get("FUSE4X_KEXT_DIR", DEFAULT_KEXT_DIR)),
            owner: get("FUSE4X_OWNER", DEFAULT_OWNER),
            distribution_sdk: get("FUSE4X_DIST_SDK", DEFAULT_DIST_SDK),
            deployment_target: get("FUSE4X_DEPLOYMENT_TARGET", DEFAULT_DEPLOYMENT_TARGET),
        }
    }

    pub fn sudo(&self) -> Option<&str> {
        self.sudo.as_deref()
    }

    /// Directory the build tool writes `<Configuration>/` outputs into.
    pub fn build_dir(&self) -> PathBuf {
        self.project_dir.join("build")
    }

    /// Print configuration for debugging.
    pub fn print(&self) {
        println!("Configuration:");
        println!("  FUSE4X_PROJECT_DIR: {}", self.project_dir.display());
        println!("  FUSE4X_BUILD_TOOL: {}", self.build_tool);
        println!("  FUSE4X_GIT: {}", self.git);
        println!("  FUSE4X_SUDO: {}", self.sudo().unwrap_or("(disabled)"));
        println!("  FUSE4X_KEXT_DIR: {}", self.kext_dir.display());
        println!("  FUSE4X_OWNER: {}", self.owner);
        println!("  FUSE4X_DIST_SDK: {}", self.distribution_sdk);
        println!("  FUSE4X_DEPLOYMENT_TARGET: {}", self.deployment_target);
        println!("  Bundle identifier: {}", BUNDLE_IDENTIFIER);
    }
}
