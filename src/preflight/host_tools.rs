//! Host tool availability checks.

use crate::config::Config;

use super::types::CheckResult;

/// Check host tools are installed.
pub fn check_host_tools(config: &Config) -> Vec<CheckResult> {
    let mut results = Vec::new();

    let required_tools = [
        (config.build_tool.as_str(), "Install Xcode and its command line tools"),
        (config.git.as_str(), "Required for cleaning and version tags"),
        ("kextstat", "Required to detect a loaded kext"),
        ("kextunload", "Required to unload the running kext"),
        ("cp", "Required to copy the bundle"),
        ("chown", "Required to normalize ownership"),
        ("chmod", "Required to mark the helper set-user-ID"),
    ];

    for (tool, purpose) in required_tools {
        results.push(check_tool_exists(tool, purpose, true));
    }

    match config.sudo() {
        Some(sudo) => results.push(check_tool_exists(
            sudo,
            "Required for privileged install steps",
            true,
        )),
        None => results.push(CheckResult::warn(
            "sudo",
            "Disabled (FUSE4X_SUDO is empty); privileged steps run as the current user",
        )),
    }

    results
}

/// Check if a tool exists in PATH.
fn check_tool_exists(tool: &str, purpose: &str, required: bool) -> CheckResult {
    match which::which(tool) {
        Ok(path) => CheckResult::pass_with(tool, &path.to_string_lossy()),
        Err(_) => {
            let msg = format!("Not found in PATH. {}", purpose);
            if required {
                CheckResult::fail(tool, &msg)
            } else {
                CheckResult::warn(tool, &msg)
            }
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::preflight::CheckStatus;

    #[test]
    fn test_existing_tool_passes() {
        let result = check_tool_exists("sh", "shell", true);
        assert_eq!(result.status, CheckStatus::Pass);
        assert!(result.details.is_some());
    }

    #[test]
    fn test_missing_tool_severity() {
        let required = check_tool_exists("nonexistent_program_12345", "x", true);
        assert_eq!(required.status, CheckStatus::Fail);

        let optional = check_tool_exists("nonexistent_program_12345", "x", false);
        assert_eq!(optional.status, CheckStatus::Warn);
    }
}
