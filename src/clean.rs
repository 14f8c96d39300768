//! Workspace cleaning.

use crate::config::Config;
use crate::error::{DeployError, DeployResult};
use crate::process::{Cmd, CommandRunner};

/// Remove every untracked and ignored file from the project tree,
/// including previous build outputs.
///
/// Irreversible. A failure aborts the run rather than building on a
/// half-cleaned tree.
pub fn clean_workspace(runner: &dyn CommandRunner, config: &Config) -> DeployResult<()> {
    println!("Removing untracked files from {}...", config.project_dir.display());

    let cmd = Cmd::new(&config.git)
        .args(["clean", "-xdf"])
        .dir(&config.project_dir)
        .error_msg("git clean failed");

    runner
        .run_interactive(&cmd)
        .map_err(DeployError::build("clean"))?;

    println!("Clean complete.");
    Ok(())
}
