//! Shared test utilities for fuse4x-deploy tests.

#![allow(dead_code)]

use anyhow::{bail, Result};
use std::cell::RefCell;
use std::collections::HashMap;
use std::fs;
use std::os::unix::fs::PermissionsExt;
use std::path::{Path, PathBuf};
use tempfile::TempDir;

use fuse4x_deploy::config::Config;
use fuse4x_deploy::kext::KextRegistry;
use fuse4x_deploy::process::{Cmd, CommandResult, CommandRunner, OutputMode};

/// A `kextstat -l` listing with fuse4x loaded.
pub const KEXTSTAT_LOADED: &str = "\
   12    0 0xffffff7f80a3c000 0x10000    0x10000    com.apple.iokit.IOPCIFamily (2.6.5) <7 6 5 4 3 1>
   98    0 0xffffff7f81a3c000 0x1c000    0x1c000    org.fuse4x.kext.fuse4x (0.8.5) <7 5 4 3 1>
";

/// A `kextstat -l` listing without fuse4x.
pub const KEXTSTAT_NOT_LOADED: &str = "\
   12    0 0xffffff7f80a3c000 0x10000    0x10000    com.apple.iokit.IOPCIFamily (2.6.5) <7 6 5 4 3 1>
";

/// Runner that records command lines instead of spawning processes.
///
/// Canned results are matched by substring against the full command line;
/// the first matching rule wins. Unmatched commands succeed with no output.
#[derive(Default)]
pub struct RecordingRunner {
    log: RefCell<Vec<String>>,
    rules: Vec<(String, CommandResult)>,
}

impl RecordingRunner {
    pub fn new() -> Self {
        Self::default()
    }

    /// Answer commands containing `needle` with `result`.
    pub fn respond(mut self, needle: &str, result: CommandResult) -> Self {
        self.rules.push((needle.to_string(), result));
        self
    }

    /// Make commands containing `needle` exit with status 1.
    pub fn fail(self, needle: &str) -> Self {
        self.respond(needle, CommandResult::failed(1, format!("{} failed", needle)))
    }

    /// Command lines seen so far, in order.
    pub fn commands(&self) -> Vec<String> {
        self.log.borrow().clone()
    }

    /// Index of the first command containing `needle`.
    pub fn position(&self, needle: &str) -> Option<usize> {
        self.log.borrow().iter().position(|c| c.contains(needle))
    }

    pub fn ran(&self, needle: &str) -> bool {
        self.position(needle).is_some()
    }

    /// The full command line of the first command containing `needle`.
    pub fn find(&self, needle: &str) -> Option<String> {
        self.log.borrow().iter().find(|c| c.contains(needle)).cloned()
    }
}

impl CommandRunner for RecordingRunner {
    fn spawn(&self, cmd: &Cmd, _mode: OutputMode) -> Result<CommandResult> {
        let line = cmd.to_string();
        self.log.borrow_mut().push(line.clone());

        let result = self
            .rules
            .iter()
            .find(|(needle, _)| line.contains(needle.as_str()))
            .map(|(_, result)| result.clone())
            .unwrap_or_else(|| CommandResult::ok(""));
        Ok(result)
    }
}

/// In-memory registry.
pub struct FakeRegistry {
    pub loaded: RefCell<bool>,
    pub unload_fails: bool,
    pub unload_calls: RefCell<usize>,
}

impl FakeRegistry {
    pub fn new(loaded: bool) -> Self {
        Self {
            loaded: RefCell::new(loaded),
            unload_fails: false,
            unload_calls: RefCell::new(0),
        }
    }
}

impl KextRegistry for FakeRegistry {
    fn is_loaded(&self, _bundle_id: &str) -> Result<bool> {
        Ok(*self.loaded.borrow())
    }

    fn unload(&self, bundle_id: &str) -> Result<()> {
        *self.unload_calls.borrow_mut() += 1;
        if self.unload_fails {
            bail!("kextunload -b {} failed (exit code 1)", bundle_id);
        }
        *self.loaded.borrow_mut() = false;
        Ok(())
    }
}

/// Test environment with a temporary project and staging root.
pub struct TestEnv {
    /// Temporary directory (kept alive for lifetime of TestEnv)
    pub _temp_dir: TempDir,
    /// Mock project directory (holds build/)
    pub project: PathBuf,
    /// Existing staging root for --root
    pub stage: PathBuf,
}

impl TestEnv {
    /// Create a new test environment with temporary directories.
    pub fn new() -> Self {
        let temp_dir = TempDir::new().expect("Failed to create temp dir");
        let project = temp_dir.path().join("fuse4x");
        let stage = temp_dir.path().join("stage");

        fs::create_dir_all(&project).expect("Failed to create project dir");
        fs::create_dir_all(&stage).expect("Failed to create stage dir");

        Self {
            _temp_dir: temp_dir,
            project,
            stage,
        }
    }

    /// Config pointing at the mock project, with extra variables applied.
    pub fn config_with(&self, extra: &[(&str, &str)]) -> Config {
        let mut vars: HashMap<String, String> = extra
            .iter()
            .map(|(k, v)| (k.to_string(), v.to_string()))
            .collect();
        vars.insert(
            "FUSE4X_PROJECT_DIR".to_string(),
            self.project.to_string_lossy().into_owned(),
        );
        Config::from_vars(&self.project, &vars)
    }

    pub fn config(&self) -> Config {
        self.config_with(&[])
    }

    /// Lay out `build/<configuration>/fuse4x.kext` (and the helper).
    pub fn create_build_output(&self, configuration: &str) -> PathBuf {
        let out = self.project.join("build").join(configuration);
        create_mock_kext(&out.join("fuse4x.kext"));
        create_mock_binary(&out.join("load_fuse4x"));
        out
    }
}

/// Create a minimal kext bundle.
pub fn create_mock_kext(path: &Path) {
    let contents = path.join("Contents");
    fs::create_dir_all(contents.join("MacOS")).expect("Failed to create kext dirs");
    fs::write(
        contents.join("Info.plist"),
        "<plist><dict><key>CFBundleIdentifier</key><string>org.fuse4x.kext.fuse4x</string></dict></plist>\n",
    )
    .expect("Failed to create Info.plist");
    fs::write(contents.join("MacOS/fuse4x"), b"\xcf\xfa\xed\xfe mock kext")
        .expect("Failed to create kext binary");
}

/// Create a mock executable file.
pub fn create_mock_binary(path: &Path) {
    if let Some(parent) = path.parent() {
        fs::create_dir_all(parent).expect("Failed to create parent dir for binary");
    }
    fs::write(path, "#!/bin/sh\necho mock\n").expect("Failed to create mock binary");

    let mut perms = fs::metadata(path).expect("Failed to get metadata").permissions();
    perms.set_mode(0o755);
    fs::set_permissions(path, perms).expect("Failed to set permissions");
}

/// Assert that `earlier` ran, `later` ran, and in that order.
pub fn assert_ran_before(runner: &RecordingRunner, earlier: &str, later: &str) {
    let a = runner
        .position(earlier)
        .unwrap_or_else(|| panic!("'{}' never ran: {:#?}", earlier, runner.commands()));
    let b = runner
        .position(later)
        .unwrap_or_else(|| panic!("'{}' never ran: {:#?}", later, runner.commands()));
    assert!(
        a < b,
        "Expected '{}' before '{}': {:#?}",
        earlier,
        later,
        runner.commands()
    );
}

/// Assert that a directory exists.
pub fn assert_dir_exists(path: &Path) {
    assert!(
        path.is_dir(),
        "Expected directory to exist: {}",
        path.display()
    );
}
