//! The deploy workflow.
//!
//! ```text
//! Start → OptionsResolved → [Cleaned|CleanSkipped] → Built
//!       → [Unloaded|UnloadSkipped] → Installed → OwnershipFixed
//! ```
//!
//! Phases run strictly in order. The first failure ends the run; nothing
//! already done is rolled back and nothing is retried.

use serde::Serialize;

use crate::build::{self, BuildConfiguration, VersionTag};
use crate::clean;
use crate::config::{Config, BUNDLE_IDENTIFIER};
use crate::digest;
use crate::error::DeployResult;
use crate::install::{self, InstallTarget};
use crate::kext::{self, KextRegistry, UnloadOutcome};
use crate::options::InvocationOptions;
use crate::process::CommandRunner;
use crate::timing::Timer;

/// States reached by a run, in order.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
pub enum Stage {
    OptionsResolved,
    Cleaned,
    CleanSkipped,
    Built,
    Unloaded,
    UnloadSkipped,
    Installed,
    OwnershipFixed,
}

/// Outcome of a successful run.
#[derive(Debug, Clone, Serialize)]
pub struct DeployReport {
    pub options: InvocationOptions,
    pub build: BuildConfiguration,
    pub unload: UnloadOutcome,
    pub target: InstallTarget,
    pub stages: Vec<Stage>,
    /// Tree digest of the bundle that was copied, when readable.
    pub package_digest: Option<String>,
}

impl DeployReport {
    pub fn version(&self) -> Option<&VersionTag> {
        self.build.version.as_ref()
    }
}

/// Run phases 2-5 for already resolved options.
pub fn deploy(
    config: &Config,
    options: &InvocationOptions,
    runner: &dyn CommandRunner,
    registry: &dyn KextRegistry,
) -> DeployResult<DeployReport> {
    let mut stages = vec![Stage::OptionsResolved];

    // =======================================================================
    // Clean
    // =======================================================================
    if options.clean {
        println!("\n=== Clean ===");
        let timer = Timer::start("Clean");
        clean::clean_workspace(runner, config)?;
        timer.finish();
        stages.push(Stage::Cleaned);
    } else {
        stages.push(Stage::CleanSkipped);
    }

    // =======================================================================
    // Build
    // =======================================================================
    println!("\n=== Build ===");
    let timer = Timer::start("Build");
    let build = build::run_build(runner, config, options)?;
    timer.finish();
    stages.push(Stage::Built);

    // =======================================================================
    // Unload (live system only)
    // =======================================================================
    let unload = if options.targets_live_system() {
        println!("\n=== Unload ===");
        kext::unload_if_loaded(registry, BUNDLE_IDENTIFIER)?
    } else {
        UnloadOutcome::Skipped
    };
    stages.push(match unload {
        UnloadOutcome::Unloaded => Stage::Unloaded,
        UnloadOutcome::NotLoaded | UnloadOutcome::Skipped => Stage::UnloadSkipped,
    });

    // =======================================================================
    // Install
    // =======================================================================
    println!("\n=== Install ===");
    let timer = Timer::start("Install");
    let target = InstallTarget::compute(config, options, &build);
    let package_digest = digest::try_tree_digest(&target.package_source);
    install::install(runner, config, &target)?;
    stages.push(Stage::Installed);

    install::fix_ownership(runner, config, &target)?;
    timer.finish();
    stages.push(Stage::OwnershipFixed);

    Ok(DeployReport {
        options: options.clone(),
        build,
        unload,
        target,
        stages,
        package_digest,
    })
}
