//! Artifact installation and ownership normalization.

use serde::Serialize;
use std::path::{Component, Path, PathBuf};

use crate::build::BuildConfiguration;
use crate::config::{Config, HELPER_NAME, KEXT_NAME};
use crate::error::{DeployError, DeployResult};
use crate::options::{InvocationOptions, Profile};
use crate::process::{Cmd, CommandRunner};

/// Source and destination of the helper executable.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct HelperTarget {
    pub source: PathBuf,
    pub dest: PathBuf,
}

/// Where the build outputs come from and where they go.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct InstallTarget {
    /// `build/<Configuration>/fuse4x.kext`
    pub package_source: PathBuf,
    /// Extension directory the bundle is copied into.
    pub install_dir: PathBuf,
    /// `<install_dir>/fuse4x.kext`
    pub package_dest: PathBuf,
    /// Distribution builds only.
    pub helper: Option<HelperTarget>,
    /// True when `install_dir` is under a staging root and may not exist.
    pub staged: bool,
}

impl InstallTarget {
    pub fn compute(
        config: &Config,
        options: &InvocationOptions,
        build: &BuildConfiguration,
    ) -> Self {
        let output_dir = build.output_dir(config);
        let install_dir = match &options.install_root {
            Some(root) => rebase(root, &config.kext_dir),
            None => config.kext_dir.clone(),
        };
        let package_dest = install_dir.join(KEXT_NAME);

        let helper = match options.profile {
            Profile::Distribution => Some(HelperTarget {
                source: output_dir.join(HELPER_NAME),
                dest: package_dest.join("Support").join(HELPER_NAME),
            }),
            Profile::Development => None,
        };

        Self {
            package_source: output_dir.join(KEXT_NAME),
            install_dir,
            package_dest,
            helper,
            staged: options.install_root.is_some(),
        }
    }
}

/// Place an absolute system path under `root`.
///
/// `Path::join` would discard `root` for an absolute argument.
pub fn rebase(root: &Path, path: &Path) -> PathBuf {
    let relative: PathBuf = path
        .components()
        .filter(|c| !matches!(c, Component::RootDir | Component::Prefix(_)))
        .collect();
    root.join(relative)
}

/// Copy the bundle (and helper) into place.
///
/// The previous bundle is removed first so files dropped from the build do
/// not survive a reinstall. Nothing is removed until every build output
/// has been found.
pub fn install(
    runner: &dyn CommandRunner,
    config: &Config,
    target: &InstallTarget,
) -> DeployResult<()> {
    let sudo = config.sudo();

    locate_build_output(runner, "-d", &target.package_source)?;
    if let Some(helper) = &target.helper {
        locate_build_output(runner, "-f", &helper.source)?;
    }

    if target.staged {
        println!("  Creating {}...", target.install_dir.display());
        let cmd = Cmd::elevated(sudo, "mkdir")
            .arg("-p")
            .arg_path(&target.install_dir);
        runner
            .run_interactive(&cmd)
            .map_err(DeployError::install("create install directory"))?;
    }

    let cmd = Cmd::elevated(sudo, "rm")
        .arg("-rf")
        .arg_path(&target.package_dest);
    runner
        .run_interactive(&cmd)
        .map_err(DeployError::install("remove previous package"))?;

    println!(
        "  Copying {} -> {}",
        target.package_source.display(),
        target.install_dir.display()
    );
    let cmd = Cmd::elevated(sudo, "cp")
        .arg("-R")
        .arg_path(&target.package_source)
        .arg_path(&target.install_dir);
    runner
        .run_interactive(&cmd)
        .map_err(DeployError::install("copy package"))?;

    if let Some(helper) = &target.helper {
        install_helper(runner, sudo, helper)?;
    }

    Ok(())
}

/// Fail unless `path` passes `test <kind>`.
///
/// Not read-only: a dry run skips the build, so the output may not exist yet.
fn locate_build_output(
    runner: &dyn CommandRunner,
    kind: &str,
    path: &Path,
) -> DeployResult<()> {
    let cmd = Cmd::new("test")
        .arg(kind)
        .arg_path(path)
        .error_msg(format!("build output {} not found", path.display()));
    runner
        .run(&cmd)
        .map_err(DeployError::install("locate build output"))?;
    Ok(())
}

/// Install the helper into `Support/` and mark it set-user-ID so
/// unprivileged mounts can still load the kext.
fn install_helper(
    runner: &dyn CommandRunner,
    sudo: Option<&str>,
    helper: &HelperTarget,
) -> DeployResult<()> {
    if let Some(support_dir) = helper.dest.parent() {
        let cmd = Cmd::elevated(sudo, "mkdir").arg("-p").arg_path(support_dir);
        runner
            .run_interactive(&cmd)
            .map_err(DeployError::install("create Support directory"))?;
    }

    println!("  Installing helper {}", helper.dest.display());
    let cmd = Cmd::elevated(sudo, "cp")
        .arg_path(&helper.source)
        .arg_path(&helper.dest);
    runner
        .run_interactive(&cmd)
        .map_err(DeployError::install("copy helper"))?;

    let cmd = Cmd::elevated(sudo, "chmod").arg("u+s").arg_path(&helper.dest);
    runner
        .run_interactive(&cmd)
        .map_err(DeployError::permission("set-user-ID on helper"))?;

    Ok(())
}

/// Hand the whole installed bundle to the configured owner.
pub fn fix_ownership(
    runner: &dyn CommandRunner,
    config: &Config,
    target: &InstallTarget,
) -> DeployResult<()> {
    println!("  chown -R {} {}", config.owner, target.package_dest.display());
    let cmd = Cmd::elevated(config.sudo(), "chown")
        .arg("-R")
        .arg(&config.owner)
        .arg_path(&target.package_dest);
    runner
        .run_interactive(&cmd)
        .map_err(DeployError::permission("chown"))?;
    Ok(())
}
