use std::env;
use std::fmt::Write;
use std::path::{Path, PathBuf};
use std::process::Command;
use std::time::Duration;

use crate::capture::{Captured, run_captured};
use crate::command::{CommandList, command_list};
use crate::command_call::{CommandCall, Route};
use crate::config::ShellConfig;
use crate::error::ShellError;
use crate::output::OutputBuffer;

const NO_COMMAND: &str = "No command entered.\n";
const NO_OUTPUT: &str = "Command executed successfully (no output).\n";

/// How a line finished. The output text stays the primary report; this is
/// for callers that want to branch without reading it.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ExecStatus {
    /// Blank input, nothing ran.
    NoOp,
    Success,
    /// A built-in reported a usage or filesystem error.
    Error,
    /// External program missing from `PATH`.
    NotFound,
    /// A child exited unsuccessfully; `None` if a signal ended it.
    ChildFailed(Option<i32>),
    TimedOut,
    /// `exit` was entered; the front end should terminate.
    Exit,
}

/// Owned result of [`Shell::run`].
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct CommandOutput {
    pub text: String,
    pub status: ExecStatus,
    pub truncated: bool,
}

/// The execution engine. Holds its own working directory, so two shells
/// never see each other's `cd`.
pub struct Shell {
    cwd: PathBuf,
    config: ShellConfig,
    commands: CommandList,
}

impl Shell {
    /// Starts in the hosting process's current directory.
    pub fn new(config: ShellConfig) -> Result<Self, ShellError> {
        Ok(Self::with_dir(config, env::current_dir()?))
    }

    pub fn with_dir(config: ShellConfig, cwd: impl Into<PathBuf>) -> Self {
        Self {
            cwd: cwd.into(),
            config,
            commands: command_list(),
        }
    }

    pub fn cwd(&self) -> &Path {
        &self.cwd
    }

    pub fn config(&self) -> &ShellConfig {
        &self.config
    }

    /// Runs one line and writes its result into `out`, which is cleared
    /// first. Failures are reported as text inside `out`.
    pub fn execute(&mut self, line: &str, out: &mut OutputBuffer) -> ExecStatus {
        out.clear();

        match Route::classify(line) {
            Route::Empty => {
                out.push_str(NO_COMMAND);
                ExecStatus::NoOp
            }
            Route::Shell(line) => {
                tracing::debug!(line, "delegating to shell");
                self.run_shell(line, out)
            }
            Route::Direct(line) => match self.commands.dispatch(line, &mut self.cwd, out) {
                Some(status) => status,
                None => self.run_external(line, out),
            },
        }
    }

    /// Like [`execute`](Self::execute) with a buffer sized from the config.
    pub fn run(&mut self, line: &str) -> CommandOutput {
        let mut out = OutputBuffer::with_capacity(self.config.output_capacity);
        let status = self.execute(line, &mut out);
        CommandOutput {
            truncated: out.is_truncated(),
            text: out.as_str().to_string(),
            status,
        }
    }

    fn run_external(&self, line: &str, out: &mut OutputBuffer) -> ExecStatus {
        let Some(call) = CommandCall::parse(line, self.config.max_args) else {
            out.push_str(NO_COMMAND);
            return ExecStatus::NoOp;
        };
        tracing::debug!(program = %call.program, args = ?call.args, "external dispatch");

        let mut command = Command::new(&call.program);
        command.args(&call.args);
        let status = self.capture(command, out);

        // Silent programs still get a visible line, whatever their exit status.
        if out.is_empty() {
            out.push_str(NO_OUTPUT);
        }
        status
    }

    fn run_shell(&self, line: &str, out: &mut OutputBuffer) -> ExecStatus {
        let mut command = Command::new(&self.config.shell);
        command.arg("-c").arg(line);
        self.capture(command, out)
    }

    fn capture(&self, mut command: Command, out: &mut OutputBuffer) -> ExecStatus {
        command.current_dir(&self.cwd);

        match run_captured(command, out.remaining(), self.config.command_timeout) {
            Ok(captured) => report(captured, self.config.command_timeout, out),
            Err(ShellError::NotFound { program }) => {
                let _ = writeln!(out, "Command not found: {}", program);
                ExecStatus::NotFound
            }
            Err(err) => {
                tracing::warn!("command failed to run: {err}");
                let _ = writeln!(out, "Error: {}", err);
                ExecStatus::Error
            }
        }
    }
}

fn report(
    captured: Captured,
    timeout: Option<Duration>,
    out: &mut OutputBuffer,
) -> ExecStatus {
    out.push_str(&captured.text());
    if captured.truncated {
        out.mark_truncated();
    }

    match captured.status {
        None => {
            let _ = writeln!(out, "Error: command timed out after {:?}", timeout.unwrap_or_default());
            ExecStatus::TimedOut
        }
        Some(status) if status.success() => ExecStatus::Success,
        Some(status) => ExecStatus::ChildFailed(status.code()),
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::fs;
    use tempfile::TempDir;

    fn shell_in(dir: &Path) -> Shell {
        Shell::with_dir(ShellConfig::default(), dir.canonicalize().unwrap())
    }

    #[test]
    fn test_empty_line_is_noop() {
        let tmp = TempDir::new().unwrap();
        let mut shell = shell_in(tmp.path());
        let result = shell.run("");
        assert_eq!(result.status, ExecStatus::NoOp);
        assert_eq!(result.text, "No command entered.\n");
    }

    #[test]
    fn test_builtins_without_arguments_produce_text() {
        let tmp = TempDir::new().unwrap();
        let mut shell = shell_in(tmp.path());
        for line in ["date", "pwd", "roll", "joke", "about", "help"] {
            let result = shell.run(line);
            assert_eq!(result.status, ExecStatus::Success, "{}", line);
            assert!(!result.text.is_empty(), "{} printed nothing", line);
        }
    }

    #[test]
    fn test_date_is_structurally_stable() {
        let tmp = TempDir::new().unwrap();
        let mut shell = shell_in(tmp.path());
        let first = shell.run("date").text;
        let second = shell.run("date").text;
        assert!(first.starts_with("Current Date & Time: "));
        assert!(second.starts_with("Current Date & Time: "));
        assert_eq!(first.len(), second.len());
    }

    #[test]
    fn test_echo_builtin() {
        let tmp = TempDir::new().unwrap();
        let mut shell = shell_in(tmp.path());
        assert_eq!(shell.run("echo hello world").text, "hello world\n");
    }

    #[test]
    fn test_redirection_goes_to_shell() {
        let tmp = TempDir::new().unwrap();
        let mut shell = shell_in(tmp.path());
        let result = shell.run("echo hello > out.txt");
        assert_eq!(result.status, ExecStatus::Success);
        assert_eq!(result.text, "");
        assert_eq!(fs::read_to_string(tmp.path().join("out.txt")).unwrap(), "hello\n");
    }

    #[test]
    fn test_pipeline_counted_by_shell() {
        let tmp = TempDir::new().unwrap();
        let mut shell = shell_in(tmp.path());
        let result = shell.run("echo abc | wc -c");
        assert_eq!(result.status, ExecStatus::Success);
        assert_eq!(result.text.trim(), "4");
    }

    #[test]
    fn test_input_redirection() {
        let tmp = TempDir::new().unwrap();
        fs::write(tmp.path().join("in.txt"), "a\nb\nc\n").unwrap();
        let mut shell = shell_in(tmp.path());
        assert_eq!(shell.run("wc -l < in.txt").text.trim(), "3");
    }

    #[test]
    fn test_external_runs_in_shell_cwd() {
        let tmp = TempDir::new().unwrap();
        fs::write(tmp.path().join("marker.txt"), "").unwrap();
        let mut shell = shell_in(tmp.path());
        let result = shell.run("ls");
        assert_eq!(result.status, ExecStatus::Success);
        assert_eq!(result.text, "marker.txt\n");
    }

    #[test]
    fn test_external_without_output() {
        let tmp = TempDir::new().unwrap();
        let mut shell = shell_in(tmp.path());
        let result = shell.run("true");
        assert_eq!(result.status, ExecStatus::Success);
        assert_eq!(result.text, "Command executed successfully (no output).\n");
    }

    #[test]
    fn test_silent_failure_gets_placeholder() {
        let tmp = TempDir::new().unwrap();
        let mut shell = shell_in(tmp.path());
        let result = shell.run("false");
        assert_eq!(result.status, ExecStatus::ChildFailed(Some(1)));
        assert_eq!(result.text, "Command executed successfully (no output).\n");
    }

    #[test]
    fn test_help_truncates_to_prefix() {
        let tmp = TempDir::new().unwrap();
        let full = shell_in(tmp.path()).run("help").text;
        for capacity in [1, 3, 5, 60, 200] {
            let config = ShellConfig {
                output_capacity: capacity,
                ..ShellConfig::default()
            };
            let result = Shell::with_dir(config, tmp.path()).run("help");
            assert!(full.starts_with(&result.text), "capacity {}: {:?}", capacity, result.text);
            assert!(result.truncated);
        }
    }

    #[test]
    fn test_background_job_does_not_outlive_timeout() {
        let tmp = TempDir::new().unwrap();
        let config = ShellConfig {
            command_timeout: Some(Duration::from_millis(200)),
            ..ShellConfig::default()
        };
        let mut shell = Shell::with_dir(config, tmp.path());
        let started = std::time::Instant::now();
        let result = shell.run("sleep 4 & echo hi | cat");
        assert_eq!(result.text, "hi\n");
        assert!(started.elapsed() < Duration::from_secs(2));
    }

    #[test]
    fn test_greet_prefix() {
        let tmp = TempDir::new().unwrap();
        let mut shell = shell_in(tmp.path());
        let result = shell.run("greeting");
        assert_eq!(result.status, ExecStatus::Success);
        assert_eq!(result.text, "Hello, User! Welcome to Mini Linux Shell!\n");
    }

    #[test]
    fn test_external_failure_keeps_its_stderr() {
        let tmp = TempDir::new().unwrap();
        let mut shell = shell_in(tmp.path());
        let result = shell.run("ls definitely-missing-entry");
        assert!(matches!(result.status, ExecStatus::ChildFailed(Some(code)) if code != 0));
        assert!(result.text.contains("definitely-missing-entry"));
    }

    #[test]
    fn test_missing_program_is_distinct() {
        let tmp = TempDir::new().unwrap();
        let mut shell = shell_in(tmp.path());
        let result = shell.run("no-such-program-xyz --flag");
        assert_eq!(result.status, ExecStatus::NotFound);
        assert_eq!(result.text, "Command not found: no-such-program-xyz\n");
    }

    #[test]
    fn test_cd_affects_later_commands() {
        let tmp = TempDir::new().unwrap();
        fs::create_dir(tmp.path().join("work")).unwrap();
        fs::write(tmp.path().join("work").join("inside.txt"), "").unwrap();
        let mut shell = shell_in(tmp.path());

        assert_eq!(shell.run("cd work").status, ExecStatus::Success);
        assert_eq!(shell.cwd(), tmp.path().canonicalize().unwrap().join("work"));
        assert_eq!(shell.run("ls").text, "inside.txt\n");
        assert_eq!(shell.run("touch made.txt").status, ExecStatus::Success);
        assert!(tmp.path().join("work").join("made.txt").exists());
    }

    #[test]
    fn test_shells_do_not_share_cwd() {
        let tmp = TempDir::new().unwrap();
        fs::create_dir(tmp.path().join("a")).unwrap();
        let mut first = shell_in(tmp.path());
        let second = shell_in(tmp.path());
        first.run("cd a");
        assert_ne!(first.cwd(), second.cwd());
    }

    #[test]
    fn test_output_is_bounded() {
        let tmp = TempDir::new().unwrap();
        let config = ShellConfig {
            output_capacity: 32,
            ..ShellConfig::default()
        };
        let mut shell = Shell::with_dir(config, tmp.path());
        let result = shell.run("seq 1 1000");
        assert_eq!(result.text.len(), 32);
        assert!(result.truncated);
    }

    #[test]
    fn test_stale_output_never_leaks() {
        let tmp = TempDir::new().unwrap();
        let mut shell = shell_in(tmp.path());
        let mut out = OutputBuffer::with_capacity(256);
        shell.execute("echo first", &mut out);
        shell.execute("echo hi > f.txt", &mut out);
        assert_eq!(out.as_str(), "");
    }

    #[test]
    fn test_timeout_is_reported() {
        let tmp = TempDir::new().unwrap();
        let config = ShellConfig {
            command_timeout: Some(Duration::from_millis(200)),
            ..ShellConfig::default()
        };
        let mut shell = Shell::with_dir(config, tmp.path());
        let result = shell.run("sleep 5");
        assert_eq!(result.status, ExecStatus::TimedOut);
        assert_eq!(result.text, "Error: command timed out after 200ms\n");
    }

    #[test]
    fn test_exit_returns_to_caller() {
        let tmp = TempDir::new().unwrap();
        let mut shell = shell_in(tmp.path());
        let result = shell.run("exit");
        assert_eq!(result.status, ExecStatus::Exit);
        assert_eq!(result.text, "Session closed.\n");
    }
}
