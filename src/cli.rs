//! Command-line definitions.
//!
//! Running with only flags performs a deploy. `preflight` and `show` are
//! read-only helpers.

use clap::{Args, Parser, Subcommand};
use std::path::PathBuf;

#[derive(Parser, Debug)]
#[command(name = "fuse4x-deploy")]
#[command(about = "Build the fuse4x kernel extension and install it")]
#[command(args_conflicts_with_subcommands = true)]
#[command(
    after_help = "QUICK START:\n  fuse4x-deploy --debug             Debug build, reinstall on this machine\n  fuse4x-deploy --release           Clean distribution build with version tag\n  fuse4x-deploy --root /tmp/stage   Stage the install without touching the live system\n  fuse4x-deploy preflight           Check host tools"
)]
pub struct Cli {
    #[command(flatten)]
    pub deploy: DeployArgs,

    #[command(subcommand)]
    pub command: Option<Commands>,
}

/// Flags of the deploy workflow.
#[derive(Args, Debug, Clone, Default)]
pub struct DeployArgs {
    /// Build the Debug configuration (default: Release)
    #[arg(long, conflicts_with = "release")]
    pub debug: bool,

    /// Remove all untracked and ignored files before building (git clean -xdf)
    #[arg(long)]
    pub clean: bool,

    /// Clean distribution build: Distribution configuration, version tag, helper install
    #[arg(long)]
    pub release: bool,

    /// Install under DIR instead of the live system; leaves the loaded kext alone
    #[arg(long, value_name = "DIR")]
    pub root: Option<PathBuf>,

    /// Print privileged and mutating commands instead of running them
    #[arg(long)]
    pub dry_run: bool,
}

#[derive(Subcommand, Debug)]
pub enum Commands {
    /// Check host tools and project layout
    Preflight {
        /// Fail if any checks fail (exit code 1)
        #[arg(long)]
        strict: bool,
    },

    /// Show information
    Show {
        #[command(subcommand)]
        what: ShowTarget,
    },
}

#[derive(Subcommand, Debug)]
pub enum ShowTarget {
    /// Show current configuration
    Config {
        #[arg(long)]
        json: bool,
    },
    /// Show whether the kext is loaded and what is installed
    Status {
        #[arg(long)]
        json: bool,
    },
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_flags_without_subcommand() {
        let cli = Cli::try_parse_from(["fuse4x-deploy", "--debug", "--clean"]).unwrap();
        assert!(cli.command.is_none());
        assert!(cli.deploy.debug);
        assert!(cli.deploy.clean);
        assert!(!cli.deploy.release);
    }

    #[test]
    fn test_root_requires_value() {
        assert!(Cli::try_parse_from(["fuse4x-deploy", "--root"]).is_err());
    }

    #[test]
    fn test_debug_conflicts_with_release() {
        assert!(Cli::try_parse_from(["fuse4x-deploy", "--debug", "--release"]).is_err());
    }

    #[test]
    fn test_show_status_json() {
        let cli = Cli::try_parse_from(["fuse4x-deploy", "show", "status", "--json"]).unwrap();
        assert!(matches!(
            cli.command,
            Some(Commands::Show {
                what: ShowTarget::Status { json: true }
            })
        ));
    }

    #[test]
    fn test_deploy_flags_conflict_with_subcommand() {
        assert!(Cli::try_parse_from(["fuse4x-deploy", "--debug", "preflight"]).is_err());
    }
}
