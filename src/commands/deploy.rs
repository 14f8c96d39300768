//! Deploy command - builds the kext and installs it.

use anyhow::Result;
use std::time::Instant;

use crate::cli::DeployArgs;
use crate::config::{Config, BUNDLE_IDENTIFIER};
use crate::deploy::{self, DeployReport};
use crate::error::DeployResult;
use crate::kext::{KextRegistry, KextTools, UnloadOutcome};
use crate::options::InvocationOptions;
use crate::process::{CommandRunner, DryRunRunner, SystemRunner};
use crate::timing::format_duration;

/// Execute the deploy command against the host.
pub fn cmd_deploy(args: &DeployArgs, config: &Config) -> Result<()> {
    let start = Instant::now();

    let report = if args.dry_run {
        let runner = DryRunRunner::new();
        let registry = KextTools::new(&runner, config);
        execute(args, config, &runner, &registry)
    } else {
        let runner = SystemRunner;
        let registry = KextTools::new(&runner, config);
        execute(args, config, &runner, &registry)
    };

    let report = match report {
        Ok(report) => report,
        Err(e) => {
            eprintln!("\n[{}] Deploy aborted.", e.kind());
            return Err(e.into());
        }
    };

    print_summary(&report);
    println!("\nDone in {}.", format_duration(start.elapsed()));
    Ok(())
}

/// Resolve options, then run the workflow with the given runner and
/// registry.
///
/// An invalid invocation fails here before the runner sees any command.
pub fn execute(
    args: &DeployArgs,
    config: &Config,
    runner: &dyn CommandRunner,
    registry: &dyn KextRegistry,
) -> DeployResult<DeployReport> {
    let options = InvocationOptions::resolve(args)?;

    println!("=== fuse4x deploy ===");
    println!("  Project: {}", config.project_dir.display());
    println!("  Profile: {:?}", options.profile);
    match &options.install_root {
        Some(root) => println!("  Staging under {}", root.display()),
        None => println!("  Target: live system ({})", BUNDLE_IDENTIFIER),
    }
    if options.dry_run {
        println!("  Dry run: privileged and mutating commands are printed, not run");
    }

    deploy::deploy(config, &options, runner, registry)
}

fn print_summary(report: &DeployReport) {
    println!("\n=== Summary ===");
    println!("  Configuration: {}", report.build.configuration_name());
    if let Some(version) = report.version() {
        println!("  Version: {}", version);
    }
    let unload = match report.unload {
        UnloadOutcome::Skipped => "skipped (staging)",
        UnloadOutcome::NotLoaded => "not loaded",
        UnloadOutcome::Unloaded => "unloaded",
    };
    println!("  Previous kext: {}", unload);
    println!("  Installed: {}", report.target.package_dest.display());
    if let Some(helper) = &report.target.helper {
        println!("  Helper: {} (set-user-ID)", helper.dest.display());
    }
    if let Some(digest) = &report.package_digest {
        println!("  Bundle digest: {}", digest);
    }
}
