//! Loaded-extension registry.
//!
//! Whether the kext is currently loaded is global OS state, so it is
//! reached through [`KextRegistry`] rather than tracked in-process.

use anyhow::Result;

use crate::config::Config;
use crate::error::{DeployError, DeployResult};
use crate::process::{Cmd, CommandRunner};

/// Query and unload kernel extensions by bundle identifier.
pub trait KextRegistry {
    fn is_loaded(&self, bundle_id: &str) -> Result<bool>;
    fn unload(&self, bundle_id: &str) -> Result<()>;
}

/// Registry backed by `kextstat` and `kextunload`.
pub struct KextTools<'a> {
    runner: &'a dyn CommandRunner,
    sudo: Option<&'a str>,
}

impl<'a> KextTools<'a> {
    pub fn new(runner: &'a dyn CommandRunner, config: &'a Config) -> Self {
        Self {
            runner,
            sudo: config.sudo(),
        }
    }
}

impl KextRegistry for KextTools<'_> {
    fn is_loaded(&self, bundle_id: &str) -> Result<bool> {
        let cmd = Cmd::new("kextstat")
            .arg("-l")
            .read_only()
            .error_msg("kextstat failed");
        let result = self.runner.run(&cmd)?;
        Ok(is_listed(&result.stdout, bundle_id))
    }

    fn unload(&self, bundle_id: &str) -> Result<()> {
        let cmd = Cmd::elevated(self.sudo, "kextunload")
            .args(["-b", bundle_id])
            .error_msg(format!("kextunload -b {} failed", bundle_id));
        self.runner.run_interactive(&cmd)?;
        Ok(())
    }
}

/// True if a `kextstat` listing has an entry for `bundle_id`.
///
/// Each entry is one line; the bundle identifier is a whitespace-separated
/// column, so a prefix such as `org.fuse4x.kext.fuse4x.debug` is not a
/// match.
pub fn is_listed(kextstat_output: &str, bundle_id: &str) -> bool {
    kextstat_output
        .lines()
        .any(|line| line.split_whitespace().any(|field| field == bundle_id))
}

/// What the unload phase did.
#[derive(Debug, Clone, Copy, PartialEq, Eq, serde::Serialize)]
pub enum UnloadOutcome {
    /// Staging run; the live registry was not consulted.
    Skipped,
    NotLoaded,
    Unloaded,
}

/// Unload `bundle_id` if it is loaded.
pub fn unload_if_loaded(
    registry: &dyn KextRegistry,
    bundle_id: &str,
) -> DeployResult<UnloadOutcome> {
    let unload_error = |cause| DeployError::Unload {
        bundle_id: bundle_id.to_string(),
        cause,
    };

    if !registry.is_loaded(bundle_id).map_err(unload_error)? {
        println!("  {} is not loaded", bundle_id);
        return Ok(UnloadOutcome::NotLoaded);
    }

    println!("  Unloading {}...", bundle_id);
    registry.unload(bundle_id).map_err(unload_error)?;
    Ok(UnloadOutcome::Unloaded)
}

#[cfg(test)]
mod tests {
    use super::*;

    const KEXTSTAT: &str = "\
   12    0 0xffffff7f80a3c000 0x10000    0x10000    com.apple.iokit.IOPCIFamily (2.6.5) <7 6 5 4 3 1>
   98    0 0xffffff7f81a3c000 0x1c000    0x1c000    org.fuse4x.kext.fuse4x (0.8.5) <7 5 4 3 1>
";

    #[test]
    fn test_finds_loaded_bundle() {
        assert!(is_listed(KEXTSTAT, "org.fuse4x.kext.fuse4x"));
        assert!(is_listed(KEXTSTAT, "com.apple.iokit.IOPCIFamily"));
    }

    #[test]
    fn test_prefix_is_not_a_match() {
        assert!(!is_listed(KEXTSTAT, "org.fuse4x.kext"));
        assert!(!is_listed(KEXTSTAT, "org.fuse4x"));
    }

    #[test]
    fn test_empty_listing() {
        assert!(!is_listed("", "org.fuse4x.kext.fuse4x"));
    }
}
