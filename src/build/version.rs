//! Version stamping from source control.

use anyhow::{bail, Result};
use serde::Serialize;
use std::fmt;

use crate::config::{Config, VERSION_MACRO};
use crate::process::{Cmd, CommandRunner};

/// Output of `git describe --tags --dirty`, kept verbatim.
///
/// The kext stringifies it with its own macro, so it is passed to the
/// compiler without quoting.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct VersionTag(String);

impl VersionTag {
    pub fn new(tag: impl Into<String>) -> Result<Self> {
        let tag: String = tag.into();
        let tag = tag.trim();
        if tag.is_empty() {
            bail!("empty version tag");
        }
        if tag.contains(char::is_whitespace) {
            bail!("version tag '{}' contains whitespace", tag);
        }
        Ok(Self(tag.to_string()))
    }

    /// Ask git to describe the project tree.
    pub fn describe(runner: &dyn CommandRunner, config: &Config) -> Result<Self> {
        let cmd = Cmd::new(&config.git)
            .args(["describe", "--tags", "--dirty"])
            .dir(&config.project_dir)
            .read_only()
            .error_msg("git describe failed (is there a tag?)");

        let result = runner.run(&cmd)?;
        Self::new(result.stdout_trimmed())
    }

    pub fn as_str(&self) -> &str {
        &self.0
    }

    /// The tree had uncommitted changes when described.
    pub fn is_dirty(&self) -> bool {
        self.0.ends_with("-dirty")
    }

    /// `NAME=value` definition for the compiler.
    pub fn preprocessor_definition(&self) -> String {
        format!("{}={}", VERSION_MACRO, self.0)
    }
}

impl fmt::Display for VersionTag {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.0)
    }
}
