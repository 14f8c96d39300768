//! Centralized command execution with consistent error handling.
//!
//! Every external command (git, xcodebuild, kextstat, the privileged file
//! operations) is described by a [`Cmd`] and executed through a
//! [`CommandRunner`]. The orchestrator only ever sees the runner trait, so a
//! dry run or a test can swap the real process spawner out.

use anyhow::{bail, Context, Result};
use std::cell::RefCell;
use std::fmt;
use std::path::{Path, PathBuf};
use std::process::{Command, Stdio};

/// Result of a command execution.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct CommandResult {
    /// Exit code, or None if terminated by signal.
    pub code: Option<i32>,
    /// Captured stdout as a string. Empty when stdio was inherited.
    pub stdout: String,
    /// Captured stderr as a string. Empty when stdio was inherited.
    pub stderr: String,
}

impl CommandResult {
    /// A successful result with the given stdout.
    pub fn ok(stdout: impl Into<String>) -> Self {
        Self {
            code: Some(0),
            stdout: stdout.into(),
            stderr: String::new(),
        }
    }

    /// A failed result with the given exit code and stderr.
    pub fn failed(code: i32, stderr: impl Into<String>) -> Self {
        Self {
            code: Some(code),
            stdout: String::new(),
            stderr: stderr.into(),
        }
    }

    /// Returns true if the command exited successfully.
    pub fn success(&self) -> bool {
        self.code == Some(0)
    }

    /// Get the exit code, or -1 if terminated by signal.
    pub fn code(&self) -> i32 {
        self.code.unwrap_or(-1)
    }

    /// Get stdout, trimmed of whitespace.
    pub fn stdout_trimmed(&self) -> &str {
        self.stdout.trim()
    }

    /// Get stderr, trimmed of whitespace.
    pub fn stderr_trimmed(&self) -> &str {
        self.stderr.trim()
    }
}

/// How the child's stdout/stderr are wired.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum OutputMode {
    /// Capture into the [`CommandResult`].
    Capture,
    /// Stream to the terminal (build logs, sudo prompts).
    Inherit,
}

/// Builder for configuring command execution.
#[derive(Debug, Clone)]
pub struct Cmd {
    program: String,
    args: Vec<String>,
    current_dir: Option<PathBuf>,
    /// If true, don't fail on non-zero exit.
    allow_fail: bool,
    /// Custom error message prefix.
    error_prefix: Option<String>,
    /// Query with no side effects; dry runs still execute it.
    read_only: bool,
}

impl Cmd {
    /// Create a new command builder.
    pub fn new(program: impl AsRef<str>) -> Self {
        Self {
            program: program.as_ref().to_string(),
            args: Vec::new(),
            current_dir: None,
            allow_fail: false,
            error_prefix: None,
            read_only: false,
        }
    }

    /// Create a command that runs `program` through the elevation wrapper,
    /// or directly when no wrapper is configured.
    pub fn elevated(sudo: Option<&str>, program: impl AsRef<str>) -> Self {
        match sudo {
            Some(wrapper) => Self::new(wrapper).arg(program),
            None => Self::new(program),
        }
    }

    /// Add a single argument.
    pub fn arg(mut self, arg: impl AsRef<str>) -> Self {
        self.args.push(arg.as_ref().to_string());
        self
    }

    /// Add multiple arguments.
    pub fn args<I, S>(mut self, args: I) -> Self
    where
        I: IntoIterator<Item = S>,
        S: AsRef<str>,
    {
        for arg in args {
            self.args.push(arg.as_ref().to_string());
        }
        self
    }

    /// Add a path as an argument.
    pub fn arg_path(mut self, path: &Path) -> Self {
        self.args.push(path.to_string_lossy().into_owned());
        self
    }

    /// Set the working directory.
    pub fn dir(mut self, dir: &Path) -> Self {
        self.current_dir = Some(dir.to_path_buf());
        self
    }

    /// Allow non-zero exit codes without failing.
    pub fn allow_fail(mut self) -> Self {
        self.allow_fail = true;
        self
    }

    /// Set a custom error message prefix.
    pub fn error_msg(mut self, msg: impl AsRef<str>) -> Self {
        self.error_prefix = Some(msg.as_ref().to_string());
        self
    }

    /// Mark the command as a side-effect-free query.
    pub fn read_only(mut self) -> Self {
        self.read_only = true;
        self
    }

    pub fn program(&self) -> &str {
        &self.program
    }

    pub fn arguments(&self) -> &[String] {
        &self.args
    }

    pub fn current_dir(&self) -> Option<&Path> {
        self.current_dir.as_deref()
    }

    pub fn is_read_only(&self) -> bool {
        self.read_only
    }

    /// Turn a non-zero exit into an error unless `allow_fail` was set.
    pub fn check(&self, result: &CommandResult) -> Result<()> {
        if self.allow_fail || result.success() {
            return Ok(());
        }

        let prefix = self
            .error_prefix
            .clone()
            .unwrap_or_else(|| format!("'{}' failed", self.program));

        let stderr = result.stderr_trimmed();
        if stderr.is_empty() {
            bail!("{} (exit code {})", prefix, result.code());
        } else {
            bail!("{} (exit code {}):\n{}", prefix, result.code(), stderr);
        }
    }

    /// Run the command on the host and capture output.
    pub fn run(self) -> Result<CommandResult> {
        SystemRunner.run(&self)
    }

    /// Run the command on the host with inherited stdio.
    pub fn run_interactive(self) -> Result<CommandResult> {
        SystemRunner.run_interactive(&self)
    }
}

impl fmt::Display for Cmd {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.program)?;
        for arg in &self.args {
            if arg.is_empty() || arg.contains(char::is_whitespace) {
                write!(f, " '{}'", arg)?;
            } else {
                write!(f, " {}", arg)?;
            }
        }
        Ok(())
    }
}

// =============================================================================
// Runners
// =============================================================================

/// Executes [`Cmd`]s.
///
/// Implementors only provide [`spawn`](CommandRunner::spawn), which must not
/// treat a non-zero exit as an error. The provided methods apply the
/// command's own failure policy.
pub trait CommandRunner {
    /// Spawn the command, wait for it and report how it exited.
    fn spawn(&self, cmd: &Cmd, mode: OutputMode) -> Result<CommandResult>;

    /// Run and capture output. Fails with stderr on non-zero exit.
    fn run(&self, cmd: &Cmd) -> Result<CommandResult> {
        let result = self.spawn(cmd, OutputMode::Capture)?;
        cmd.check(&result)?;
        Ok(result)
    }

    /// Run with output going directly to the terminal.
    ///
    /// Use for long-running commands where the user should see progress
    /// (xcodebuild) and for anything that may prompt (sudo).
    fn run_interactive(&self, cmd: &Cmd) -> Result<CommandResult> {
        let result = self.spawn(cmd, OutputMode::Inherit)?;
        cmd.check(&result)?;
        Ok(result)
    }
}

/// Spawns real processes on the host.
#[derive(Debug, Default, Clone, Copy)]
pub struct SystemRunner;

impl CommandRunner for SystemRunner {
    fn spawn(&self, cmd: &Cmd, mode: OutputMode) -> Result<CommandResult> {
        let mut command = Command::new(&cmd.program);
        command.args(&cmd.args);

        if let Some(ref dir) = cmd.current_dir {
            command.current_dir(dir);
        }

        let not_installed = || format!("Failed to execute '{}'. Is it installed?", cmd.program);

        match mode {
            OutputMode::Capture => {
                let output = command.output().with_context(not_installed)?;
                Ok(CommandResult {
                    code: output.status.code(),
                    stdout: String::from_utf8_lossy(&output.stdout).into_owned(),
                    stderr: String::from_utf8_lossy(&output.stderr).into_owned(),
                })
            }
            OutputMode::Inherit => {
                command.stdin(Stdio::inherit());
                command.stdout(Stdio::inherit());
                command.stderr(Stdio::inherit());
                let status = command.status().with_context(not_installed)?;
                Ok(CommandResult {
                    code: status.code(),
                    stdout: String::new(),
                    stderr: String::new(),
                })
            }
        }
    }
}

/// Prints mutating commands instead of running them.
///
/// Read-only queries (`git describe`, `kextstat`) still go to the host so
/// the printed plan reflects the real tree and registry state.
#[derive(Debug, Default)]
pub struct DryRunRunner {
    skipped: RefCell<Vec<String>>,
}

impl DryRunRunner {
    pub fn new() -> Self {
        Self::default()
    }

    /// Command lines that were printed but not executed, in order.
    pub fn skipped(&self) -> Vec<String> {
        self.skipped.borrow().clone()
    }
}

impl CommandRunner for DryRunRunner {
    fn spawn(&self, cmd: &Cmd, mode: OutputMode) -> Result<CommandResult> {
        if cmd.is_read_only() {
            return SystemRunner.spawn(cmd, mode);
        }
        let line = cmd.to_string();
        println!("  [DRY-RUN] {}", line);
        self.skipped.borrow_mut().push(line);
        Ok(CommandResult::ok(""))
    }
}

// =============================================================================
// Tests
// =============================================================================

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_run_success() {
        let result = Cmd::new("echo").arg("hello").run().unwrap();
        assert!(result.success());
        assert_eq!(result.stdout_trimmed(), "hello");
    }

    #[test]
    fn test_run_captures_stderr() {
        // `ls` on a non-existent file writes to stderr
        let result = Cmd::new("ls")
            .arg("/nonexistent_path_12345")
            .allow_fail()
            .run()
            .unwrap();

        assert!(!result.success());
        assert!(!result.stderr.is_empty());
    }

    #[test]
    fn test_run_failure_includes_stderr() {
        let err = Cmd::new("ls")
            .arg("/nonexistent_path_12345")
            .run()
            .unwrap_err();
        let msg = err.to_string();

        assert!(msg.contains("No such file") || msg.contains("cannot access"));
    }

    #[test]
    fn test_missing_program_is_reported() {
        let err = Cmd::new("nonexistent_program_12345").run().unwrap_err();
        assert!(err.to_string().contains("Is it installed?"));
    }

    #[test]
    fn test_cmd_args_iterator() {
        let result = Cmd::new("echo")
            .args(["one", "two", "three"])
            .run()
            .unwrap();

        assert_eq!(result.stdout_trimmed(), "one two three");
    }

    #[test]
    fn test_custom_error_message() {
        let err = Cmd::new("false") // `false` always exits with 1
            .error_msg("Custom build step failed")
            .run()
            .unwrap_err();

        assert!(err.to_string().contains("Custom build step failed"));
        assert!(err.to_string().contains("exit code 1"));
    }

    #[test]
    fn test_allow_fail() {
        let result = Cmd::new("false").allow_fail().run().unwrap();

        assert!(!result.success());
        assert_eq!(result.code(), 1);
    }

    #[test]
    fn test_run_in_directory() {
        let result = Cmd::new("pwd").dir(Path::new("/tmp")).run().unwrap();
        assert!(result.stdout_trimmed().contains("tmp"));
    }

    #[test]
    fn test_interactive_reports_exit_code() {
        let result = Cmd::new("true").run_interactive().unwrap();
        assert!(result.success());
        assert!(result.stdout.is_empty());

        assert!(Cmd::new("false").run_interactive().is_err());
    }

    #[test]
    fn test_elevated_prepends_wrapper() {
        let cmd = Cmd::elevated(Some("sudo"), "chown").args(["-R", "root:wheel"]);
        assert_eq!(cmd.program(), "sudo");
        assert_eq!(cmd.arguments(), ["chown", "-R", "root:wheel"]);

        let cmd = Cmd::elevated(None, "chown");
        assert_eq!(cmd.program(), "chown");
        assert!(cmd.arguments().is_empty());
    }

    #[test]
    fn test_display_quotes_whitespace() {
        let cmd = Cmd::new("cp").arg("-R").arg("/a b").arg("");
        assert_eq!(cmd.to_string(), "cp -R '/a b' ''");
    }

    #[test]
    fn test_dry_run_skips_mutating_commands() {
        let runner = DryRunRunner::new();
        let dir = tempfile::tempdir().unwrap();
        let marker = dir.path().join("marker");

        let touch = Cmd::new("touch").arg_path(&marker);
        let result = runner.run(&touch).unwrap();

        assert!(result.success());
        assert!(!marker.exists());
        assert_eq!(runner.skipped(), vec![touch.to_string()]);
    }

    #[test]
    fn test_dry_run_executes_queries() {
        let runner = DryRunRunner::new();
        let result = runner
            .run(&Cmd::new("echo").arg("query").read_only())
            .unwrap();

        assert_eq!(result.stdout_trimmed(), "query");
        assert!(runner.skipped().is_empty());
    }
}
