//! Build invocation.
//!
//! [`BuildConfiguration::resolve`] is a pure function of the options; only
//! [`run_build`] talks to the outside world.

pub mod version;

use serde::Serialize;
use std::path::PathBuf;

use crate::config::Config;
use crate::error::{DeployError, DeployResult};
use crate::options::{Configuration, InvocationOptions, Profile};
use crate::process::{Cmd, CommandRunner};

pub use version::VersionTag;

/// Stops the build at the first failing target instead of carrying on with
/// unrelated ones.
pub const HALT_ON_FIRST_FAILURE: &str = "-PBXBuildsContinueAfterErrors=NO";

/// What the build tool is asked to build.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct BuildConfiguration {
    pub configuration: Configuration,
    /// Extra flags and build settings, in the order they are passed.
    pub compiler_flags: Vec<String>,
    pub version: Option<VersionTag>,
}

impl BuildConfiguration {
    /// Derive the configuration from the options.
    ///
    /// Distribution builds target the oldest supported SDK (kernel
    /// extensions are bound to the kernel ABI they were compiled against)
    /// and carry the version tag when one is given.
    pub fn resolve(
        options: &InvocationOptions,
        config: &Config,
        version: Option<VersionTag>,
    ) -> Self {
        let mut compiler_flags = Vec::new();

        if options.profile == Profile::Distribution {
            compiler_flags.push("-sdk".to_string());
            compiler_flags.push(config.distribution_sdk.clone());
            compiler_flags.push(format!(
                "MACOSX_DEPLOYMENT_TARGET={}",
                config.deployment_target
            ));
            compiler_flags.push(HALT_ON_FIRST_FAILURE.to_string());
            if let Some(tag) = &version {
                compiler_flags.push(format!(
                    "GCC_PREPROCESSOR_DEFINITIONS={}",
                    tag.preprocessor_definition()
                ));
            }
        }

        Self {
            configuration: options.configuration,
            compiler_flags,
            version,
        }
    }

    pub fn configuration_name(&self) -> &'static str {
        self.configuration.name()
    }

    /// Full argument list: build all targets, in parallel, in this
    /// configuration, then the extra flags.
    pub fn command_args(&self) -> Vec<String> {
        let mut args = vec![
            "-parallelizeTargets".to_string(),
            "-configuration".to_string(),
            self.configuration_name().to_string(),
            "-alltargets".to_string(),
        ];
        args.extend(self.compiler_flags.iter().cloned());
        args
    }

    /// `build/<Configuration>` under the project.
    pub fn output_dir(&self, config: &Config) -> PathBuf {
        config.build_dir().join(self.configuration_name())
    }
}

/// Resolve the configuration (describing the tree for distribution builds)
/// and run the build tool.
pub fn run_build(
    runner: &dyn CommandRunner,
    config: &Config,
    options: &InvocationOptions,
) -> DeployResult<BuildConfiguration> {
    let version = match options.profile {
        Profile::Distribution => {
            let tag =
                VersionTag::describe(runner, config).map_err(DeployError::build("version"))?;
            println!("  Version: {}", tag);
            if tag.is_dirty() {
                println!("  [WARN] Tree has uncommitted changes; version is marked dirty");
            }
            Some(tag)
        }
        Profile::Development => None,
    };

    let build = BuildConfiguration::resolve(options, config, version);
    println!("  Configuration: {}", build.configuration_name());

    let cmd = Cmd::new(&config.build_tool)
        .args(build.command_args())
        .dir(&config.project_dir)
        .error_msg("cannot build kext");

    runner
        .run_interactive(&cmd)
        .map_err(DeployError::build("xcodebuild"))?;

    Ok(build)
}
