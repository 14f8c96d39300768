//! Project environment checks (host OS, Xcode project, git metadata).

use std::fs;
use std::path::Path;

use crate::config::Config;
use crate::process::Cmd;

use super::types::CheckResult;

/// Check the host and the project tree.
pub fn check_environment(config: &Config) -> Vec<CheckResult> {
    let mut results = Vec::new();

    if std::env::consts::OS == "macos" {
        results.push(CheckResult::pass("host OS"));
    } else {
        results.push(CheckResult::warn(
            "host OS",
            &format!(
                "{} - only --root staging with --dry-run is meaningful off macOS",
                std::env::consts::OS
            ),
        ));
    }

    results.push(check_xcode_project(&config.project_dir));

    // git work tree, then tags for `describe`
    let work_tree = Cmd::new(&config.git)
        .args(["rev-parse", "--is-inside-work-tree"])
        .dir(&config.project_dir)
        .allow_fail()
        .run();
    match work_tree {
        Ok(r) if r.success() && r.stdout_trimmed() == "true" => {
            results.push(CheckResult::pass("git work tree"));

            let describe = Cmd::new(&config.git)
                .args(["describe", "--tags", "--dirty"])
                .dir(&config.project_dir)
                .allow_fail()
                .run();
            match describe {
                Ok(r) if r.success() => {
                    results.push(CheckResult::pass_with("version tag", r.stdout_trimmed()))
                }
                _ => results.push(CheckResult::warn(
                    "version tag",
                    "git describe found no tag - --release will fail",
                )),
            }
        }
        _ => results.push(CheckResult::fail(
            "git work tree",
            &format!("{} is not a git checkout", config.project_dir.display()),
        )),
    }

    if config.kext_dir.is_dir() {
        results.push(CheckResult::pass_with(
            "extension directory",
            &config.kext_dir.to_string_lossy(),
        ));
    } else {
        results.push(CheckResult::warn(
            "extension directory",
            &format!(
                "{} not found - live deploys will fail, use --root",
                config.kext_dir.display()
            ),
        ));
    }

    results
}

/// The project directory must hold an `.xcodeproj` bundle.
fn check_xcode_project(project_dir: &Path) -> CheckResult {
    let entries = match fs::read_dir(project_dir) {
        Ok(entries) => entries,
        Err(e) => {
            return CheckResult::fail(
                "Xcode project",
                &format!("Cannot read {}: {}", project_dir.display(), e),
            )
        }
    };

    let project = entries
        .filter_map(|e| e.ok())
        .map(|e| e.path())
        .find(|p| p.extension().map(|ext| ext == "xcodeproj").unwrap_or(false));

    match project {
        Some(path) => CheckResult::pass_with(
            "Xcode project",
            &path
                .file_name()
                .map(|n| n.to_string_lossy().into_owned())
                .unwrap_or_default(),
        ),
        None => CheckResult::fail(
            "Xcode project",
            &format!("No .xcodeproj in {}", project_dir.display()),
        ),
    }
}
