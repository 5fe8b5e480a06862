//! External process execution.
//!
//! Every tool the pipeline drives (git, package managers, extractors) is run
//! through the [`CommandRunner`] trait so tests can replace real processes
//! with scripted results.
//!
//! Operations that have alternatives (install with pnpm, then npm) are
//! written as a [`FallbackChain`]: an ordered list of commands where the
//! first success wins.
//!
//! ```rust,no_run
//! use sdkref_core::process::{CommandSpec, FallbackChain, SystemRunner};
//! use std::path::Path;
//!
//! # async fn example() -> sdkref_core::Result<()> {
//! let chain = FallbackChain::new("build")
//!     .then(CommandSpec::new("pnpm").args(["run", "build"]))
//!     .then(CommandSpec::new("npx").args(["tsup"]));
//! let outcome = chain.run(&SystemRunner, Path::new("packages/cli")).await?;
//! println!("built with attempt {}", outcome.index);
//! # Ok(())
//! # }
//! ```

use crate::{Error, Result};
use async_trait::async_trait;
use std::fmt;
use std::path::Path;
use tokio::process::Command;
use tracing::{debug, instrument, warn};

/// A program invocation, independent of where it runs.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct CommandSpec {
    /// Executable name or path.
    pub program: String,
    /// Arguments in order.
    pub args: Vec<String>,
    /// Extra environment variables.
    pub envs: Vec<(String, String)>,
}

impl CommandSpec {
    /// Start a command for `program`.
    pub fn new(program: impl Into<String>) -> Self {
        Self {
            program: program.into(),
            args: Vec::new(),
            envs: Vec::new(),
        }
    }

    /// Append one argument.
    #[must_use]
    pub fn arg(mut self, arg: impl Into<String>) -> Self {
        self.args.push(arg.into());
        self
    }

    /// Append several arguments.
    #[must_use]
    pub fn args<I, S>(mut self, args: I) -> Self
    where
        I: IntoIterator<Item = S>,
        S: Into<String>,
    {
        self.args.extend(args.into_iter().map(Into::into));
        self
    }

    /// Set an environment variable for the child.
    #[must_use]
    pub fn env(mut self, key: impl Into<String>, value: impl Into<String>) -> Self {
        self.envs.push((key.into(), value.into()));
        self
    }
}

impl fmt::Display for CommandSpec {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.program)?;
        for arg in &self.args {
            if arg.contains(char::is_whitespace) {
                write!(f, " {arg:?}")?;
            } else {
                write!(f, " {arg}")?;
            }
        }
        Ok(())
    }
}

/// Captured result of a finished process.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct CommandOutput {
    /// Exit code, `None` when killed by a signal.
    pub code: Option<i32>,
    /// Whether the process exited successfully.
    pub success: bool,
    /// Captured stdout, lossily decoded.
    pub stdout: String,
    /// Captured stderr, lossily decoded.
    pub stderr: String,
}

impl CommandOutput {
    /// A successful output with the given stdout.
    pub fn ok(stdout: impl Into<String>) -> Self {
        Self {
            code: Some(0),
            success: true,
            stdout: stdout.into(),
            stderr: String::new(),
        }
    }

    /// A failed output with the given stderr.
    pub fn failed(code: i32, stderr: impl Into<String>) -> Self {
        Self {
            code: Some(code),
            success: false,
            stdout: String::new(),
            stderr: stderr.into(),
        }
    }
}

/// Runs commands to completion.
///
/// Implementations return `Err` only when the process could not be started.
/// A non-zero exit is reported through [`CommandOutput::success`].
#[async_trait]
pub trait CommandRunner: Send + Sync {
    /// Run `spec` in `cwd` and capture its output.
    async fn run(&self, spec: &CommandSpec, cwd: &Path) -> Result<CommandOutput>;
}

/// [`CommandRunner`] backed by real child processes.
#[derive(Debug, Clone, Copy, Default)]
pub struct SystemRunner;

#[async_trait]
impl CommandRunner for SystemRunner {
    #[instrument(level = "debug", skip(self, spec, cwd), fields(command = %spec, cwd = %cwd.display()))]
    async fn run(&self, spec: &CommandSpec, cwd: &Path) -> Result<CommandOutput> {
        let output = Command::new(&spec.program)
            .args(&spec.args)
            .envs(spec.envs.iter().map(|(k, v)| (k.as_str(), v.as_str())))
            .current_dir(cwd)
            .kill_on_drop(true)
            .output()
            .await
            .map_err(Error::Io)?;

        let result = CommandOutput {
            code: output.status.code(),
            success: output.status.success(),
            stdout: String::from_utf8_lossy(&output.stdout).into_owned(),
            stderr: String::from_utf8_lossy(&output.stderr).into_owned(),
        };
        debug!(exit_code = ?result.code, "command finished");
        Ok(result)
    }
}

/// Run `spec` and turn a non-zero exit into [`Error::CommandFailed`].
pub async fn run_checked<R>(runner: &R, spec: &CommandSpec, cwd: &Path) -> Result<CommandOutput>
where
    R: CommandRunner + ?Sized,
{
    let output = runner.run(spec, cwd).await?;
    if output.success {
        return Ok(output);
    }
    let stderr = output.stderr.trim().to_string();
    warn!(command = %spec, exit_code = ?output.code, stderr = %stderr, "command failed");
    Err(Error::CommandFailed {
        command: spec.to_string(),
        code: output.code,
        stderr,
    })
}

/// Which attempt of a [`FallbackChain`] succeeded.
#[derive(Debug, Clone)]
pub struct FallbackOutcome {
    /// Zero-based index of the winning attempt.
    pub index: usize,
    /// Output of the winning attempt.
    pub output: CommandOutput,
}

impl FallbackOutcome {
    /// Whether a fallback, not the primary command, succeeded.
    #[must_use]
    pub const fn used_fallback(&self) -> bool {
        self.index > 0
    }
}

/// Ordered alternatives for one operation.
#[derive(Debug, Clone)]
pub struct FallbackChain {
    operation: String,
    attempts: Vec<CommandSpec>,
}

impl FallbackChain {
    /// Empty chain for `operation`, used in logs and errors.
    pub fn new(operation: impl Into<String>) -> Self {
        Self {
            operation: operation.into(),
            attempts: Vec::new(),
        }
    }

    /// Append an attempt.
    #[must_use]
    pub fn then(mut self, spec: CommandSpec) -> Self {
        self.attempts.push(spec);
        self
    }

    /// Attempts in order.
    #[must_use]
    pub fn attempts(&self) -> &[CommandSpec] {
        &self.attempts
    }

    /// Run attempts until one succeeds.
    ///
    /// # Errors
    ///
    /// Returns [`Error::AllAttemptsFailed`] listing every failure when no
    /// attempt succeeds.
    pub async fn run<R>(&self, runner: &R, cwd: &Path) -> Result<FallbackOutcome>
    where
        R: CommandRunner + ?Sized,
    {
        let mut failures = Vec::with_capacity(self.attempts.len());
        for (index, spec) in self.attempts.iter().enumerate() {
            if index > 0 {
                warn!(operation = %self.operation, command = %spec, "falling back");
            }
            match run_checked(runner, spec, cwd).await {
                Ok(output) => return Ok(FallbackOutcome { index, output }),
                Err(e) => failures.push(e.to_string()),
            }
        }
        Err(Error::AllAttemptsFailed {
            operation: self.operation.clone(),
            attempts: failures,
        })
    }
}


#[cfg(test)]
#[allow(clippy::unwrap_used)]
mod tests {
    use super::testing::ScriptedRunner;
    use super::*;

    #[test]
    fn test_command_display_quotes_whitespace() {
        let spec = CommandSpec::new("python").args(["-c", "print(1)", "a b"]);
        assert_eq!(spec.to_string(), "python -c print(1) \"a b\"");
    }

    #[tokio::test]
    async fn test_fallback_stops_at_first_success() {
        // Given: the primary fails and the second attempt succeeds
        let runner = ScriptedRunner::new(vec![
            CommandOutput::failed(1, "ERR_PNPM_ENGINE"),
            CommandOutput::ok("done"),
            CommandOutput::ok("never used"),
        ]);
        let chain = FallbackChain::new("install")
            .then(CommandSpec::new("pnpm").arg("install"))
            .then(CommandSpec::new("pnpm").args(["install", "--config.engine-strict=false"]))
            .then(CommandSpec::new("npm").arg("install"));

        // When
        let outcome = chain.run(&runner, Path::new(".")).await.unwrap();

        // Then: the third attempt never ran
        assert_eq!(outcome.index, 1);
        assert!(outcome.used_fallback());
        assert_eq!(outcome.output.stdout, "done");
        assert_eq!(runner.commands().len(), 2);
    }

    #[tokio::test]
    async fn test_fallback_reports_every_failure() {
        let runner = ScriptedRunner::new(vec![
            CommandOutput::failed(1, "first"),
            CommandOutput::failed(2, "second"),
        ]);
        let chain = FallbackChain::new("build")
            .then(CommandSpec::new("pnpm").args(["run", "build"]))
            .then(CommandSpec::new("npx").arg("tsup"));

        let err = chain.run(&runner, Path::new(".")).await.unwrap_err();

        match err {
            Error::AllAttemptsFailed { operation, attempts } => {
                assert_eq!(operation, "build");
                assert_eq!(attempts.len(), 2);
                assert!(attempts[0].contains("first"));
                assert!(attempts[1].contains("npx tsup"));
            },
            other => unreachable!("unexpected error: {other}"),
        }
    }

    #[tokio::test]
    async fn test_run_checked_maps_failure() {
        let runner = ScriptedRunner::new(vec![CommandOutput::failed(127, "  not found \n")]);
        let err = run_checked(&runner, &CommandSpec::new("typedoc"), Path::new("."))
            .await
            .unwrap_err();
        match err {
            Error::CommandFailed { code, stderr, .. } => {
                assert_eq!(code, Some(127));
                assert_eq!(stderr, "not found");
            },
            other => unreachable!("unexpected error: {other}"),
        }
    }

    #[tokio::test]
    async fn test_system_runner_reports_spawn_failure() {
        let result = SystemRunner
            .run(
                &CommandSpec::new("sdkref-definitely-not-a-real-binary"),
                Path::new("."),
            )
            .await;
        assert!(matches!(result, Err(Error::Io(_))));
    }
}
