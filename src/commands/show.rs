//! Show command - displays information.

use anyhow::Result;
use serde::Serialize;
use std::os::unix::fs::PermissionsExt;
use std::path::{Path, PathBuf};

use crate::config::{Config, BUNDLE_IDENTIFIER, HELPER_NAME, KEXT_NAME};
use crate::digest;
use crate::kext::{KextRegistry, KextTools};
use crate::process::SystemRunner;

/// Show target for the show command.
pub enum ShowTarget {
    /// Show configuration
    Config { json: bool },
    /// Show load and install state
    Status { json: bool },
}

/// Load and install state of the kext on this machine.
#[derive(Debug, Serialize)]
pub struct Status {
    pub bundle_id: &'static str,
    /// None if the registry could not be queried.
    pub loaded: Option<bool>,
    pub installed_path: PathBuf,
    pub installed: bool,
    pub digest: Option<String>,
    /// None if no helper is installed.
    pub helper_setuid: Option<bool>,
}

impl Status {
    pub fn collect(config: &Config, registry: &dyn KextRegistry) -> Self {
        let loaded = match registry.is_loaded(BUNDLE_IDENTIFIER) {
            Ok(loaded) => Some(loaded),
            Err(e) => {
                eprintln!("[WARN] Cannot query loaded extensions: {:#}", e);
                None
            }
        };

        let installed_path = config.kext_dir.join(KEXT_NAME);
        let installed = installed_path.is_dir();
        let digest = digest::try_tree_digest(&installed_path);
        let helper_setuid = helper_setuid(&installed_path.join("Support").join(HELPER_NAME));

        Self {
            bundle_id: BUNDLE_IDENTIFIER,
            loaded,
            installed_path,
            installed,
            digest,
            helper_setuid,
        }
    }

    pub fn print(&self) {
        println!("Status:");
        println!("  Bundle: {}", self.bundle_id);
        let loaded = match self.loaded {
            Some(true) => "yes",
            Some(false) => "no",
            None => "unknown",
        };
        println!("  Loaded: {}", loaded);
        if self.installed {
            println!("  Installed: {}", self.installed_path.display());
        } else {
            println!("  Installed: NO ({} not found)", self.installed_path.display());
        }
        if let Some(digest) = &self.digest {
            println!("  Digest: {}", digest);
        }
        match self.helper_setuid {
            Some(true) => println!("  Helper: {} (set-user-ID)", HELPER_NAME),
            Some(false) => println!("  Helper: {} (MISSING set-user-ID bit)", HELPER_NAME),
            None => {}
        }
    }
}

/// Whether the helper at `path` carries the set-user-ID bit.
pub fn helper_setuid(path: &Path) -> Option<bool> {
    let metadata = std::fs::metadata(path).ok()?;
    Some(metadata.permissions().mode() & 0o4000 != 0)
}

/// Execute the show command.
pub fn cmd_show(target: ShowTarget, config: &Config) -> Result<()> {
    match target {
        ShowTarget::Config { json } => {
            if json {
                println!("{}", serde_json::to_string_pretty(config)?);
            } else {
                config.print();
            }
        }
        ShowTarget::Status { json } => {
            let runner = SystemRunner;
            let registry = KextTools::new(&runner, config);
            let status = Status::collect(config, &registry);
            if json {
                println!("{}", serde_json::to_string_pretty(&status)?);
            } else {
                status.print();
            }
        }
    }
    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::fs;

    #[test]
    fn test_helper_setuid() {
        let dir = tempfile::tempdir().unwrap();
        let helper = dir.path().join(HELPER_NAME);
        fs::write(&helper, "#!/bin/sh\n").unwrap();

        fs::set_permissions(&helper, fs::Permissions::from_mode(0o755)).unwrap();
        assert_eq!(helper_setuid(&helper), Some(false));

        fs::set_permissions(&helper, fs::Permissions::from_mode(0o4755)).unwrap();
        assert_eq!(helper_setuid(&helper), Some(true));

        assert_eq!(helper_setuid(&dir.path().join("missing")), None);
    }
}
