//! Read-only access to SDK source repositories.
//!
//! Repositories are only ever shallow-cloned, fetched and checked out at
//! release tags. The [`Git`] trait exposes single git invocations; the free
//! functions in this module add tag parsing, error classification and the
//! clone retry policy on top.
//!
//! ## Clone failures
//!
//! A freshly published release can briefly be missing from the remote, so
//! "no such ref" style failures are retried with a linear backoff. Anything
//! else (DNS, TLS, authentication) fails immediately with
//! [`Error::CloneFailed`].

use crate::process::{CommandRunner, CommandSpec, SystemRunner, run_checked};
use crate::{Error, Result, version};
use async_trait::async_trait;
use std::path::Path;
use std::time::Duration;
use tracing::{info, instrument, warn};

/// Sentinel version resolved to the newest remote tag.
pub const LATEST: &str = "latest";

/// Single git operations against a remote or a working copy.
///
/// Each method returns [`Error::Git`] with git's stderr on failure.
#[async_trait]
pub trait Git: Send + Sync {
    /// Raw `git ls-remote --tags --refs` output.
    async fn ls_remote_tags(&self, repo: &str) -> Result<String>;

    /// Shallow, single-branch clone of `tag` into `dest`.
    async fn clone_tag(&self, repo: &str, tag: &str, dest: &Path) -> Result<()>;

    /// Fetch just `tag` into an existing shallow clone.
    async fn fetch_tag(&self, repo_dir: &Path, tag: &str) -> Result<()>;

    /// Force-checkout `tag`, discarding local changes.
    async fn checkout(&self, repo_dir: &Path, tag: &str) -> Result<()>;

    /// Remove untracked files and directories.
    async fn clean(&self, repo_dir: &Path) -> Result<()>;
}

/// [`Git`] implementation that shells out to the `git` binary.
#[derive(Debug, Clone, Default)]
pub struct GitCli<R = SystemRunner> {
    runner: R,
}

impl GitCli<SystemRunner> {
    /// Git backed by real processes.
    #[must_use]
    pub const fn new() -> Self {
        Self {
            runner: SystemRunner,
        }
    }
}

impl<R: CommandRunner> GitCli<R> {
    /// Git backed by a custom runner.
    pub const fn with_runner(runner: R) -> Self {
        Self { runner }
    }

    async fn git(&self, cwd: &Path, args: &[&str]) -> Result<String> {
        let spec = CommandSpec::new("git").args(args.iter().copied());
        match run_checked(&self.runner, &spec, cwd).await {
            Ok(output) => Ok(output.stdout),
            Err(Error::CommandFailed { stderr, code, .. }) => Err(Error::Git(if stderr.is_empty() {
                format!("git {} exited with {code:?}", args.first().unwrap_or(&""))
            } else {
                stderr
            })),
            Err(other) => Err(other),
        }
    }
}

#[async_trait]
impl<R: CommandRunner> Git for GitCli<R> {
    async fn ls_remote_tags(&self, repo: &str) -> Result<String> {
        self.git(Path::new("."), &["ls-remote", "--tags", "--refs", repo])
            .await
    }

    async fn clone_tag(&self, repo: &str, tag: &str, dest: &Path) -> Result<()> {
        let dest = dest.to_string_lossy();
        self.git(
            Path::new("."),
            &["clone", "--depth", "1", "--branch", tag, repo, dest.as_ref()],
        )
        .await
        .map(drop)
    }

    async fn fetch_tag(&self, repo_dir: &Path, tag: &str) -> Result<()> {
        let refspec = format!("refs/tags/{tag}:refs/tags/{tag}");
        self.git(repo_dir, &["fetch", "--depth", "1", "origin", &refspec])
            .await
            .map(drop)
    }

    async fn checkout(&self, repo_dir: &Path, tag: &str) -> Result<()> {
        self.git(repo_dir, &["checkout", "--force", tag]).await.map(drop)
    }

    async fn clean(&self, repo_dir: &Path) -> Result<()> {
        self.git(repo_dir, &["clean", "-f", "-d"]).await.map(drop)
    }
}

/// Bounded retry for tag-not-found clone failures.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct RetryPolicy {
    /// Total clone attempts, including the first.
    pub max_attempts: u32,
    /// Delay after attempt `n` is `n * backoff_step`.
    pub backoff_step: Duration,
}

impl Default for RetryPolicy {
    fn default() -> Self {
        Self {
            max_attempts: 3,
            backoff_step: Duration::from_millis(1000),
        }
    }
}

impl RetryPolicy {
    /// Delay before the attempt following `attempt` (1-based).
    #[must_use]
    pub fn backoff(&self, attempt: u32) -> Duration {
        self.backoff_step.saturating_mul(attempt)
    }
}

/// Whether a git error message means the requested ref does not exist.
#[must_use]
pub fn is_tag_not_found(message: &str) -> bool {
    let lower = message.to_lowercase();
    (lower.contains("remote branch") && lower.contains("not found"))
        || lower.contains("couldn't find remote ref")
        || lower.contains("invalid refspec")
        || lower.contains("reference is not a tree")
}

/// Extract `v`-prefixed versions from `ls-remote` output.
///
/// Only tags starting with `tag_pattern` are kept. The result
/// is sorted newest first and free of duplicates.
#[must_use]
pub fn parse_remote_tags(ls_remote: &str, tag_pattern: &str) -> Vec<String> {
    let mut versions: Vec<String> = ls_remote
        .lines()
        .filter_map(|line| line.split_whitespace().nth(1))
        .filter_map(|reference| reference.strip_prefix("refs/tags/"))
        .filter_map(|tag| tag.strip_prefix(tag_pattern))
        .filter(|bare| !bare.is_empty() && !bare.eq_ignore_ascii_case("v"))
        .map(version::normalize)
        .filter(|v| version::is_valid(v))
        .collect();
    versions = version::sort_descending(&versions);
    versions.dedup();
    versions
}

/// Remote versions for an SDK, newest first.
#[instrument(level = "debug", skip(git))]
pub async fn fetch_remote_tags<G: Git + ?Sized>(
    git: &G,
    repo: &str,
    tag_pattern: &str,
) -> Result<Vec<String>> {
    let output = git.ls_remote_tags(repo).await?;
    Ok(parse_remote_tags(&output, tag_pattern))
}

/// Resolve the [`LATEST`] sentinel to the newest remote version.
///
/// Any other value is returned unchanged. Returns `None` when `latest` was
/// requested but the remote has no matching tags.
pub async fn resolve_latest_version<G: Git + ?Sized>(
    git: &G,
    repo: &str,
    tag_pattern: &str,
    requested: &str,
) -> Result<Option<String>> {
    if requested != LATEST {
        return Ok(Some(requested.to_string()));
    }
    let tags = fetch_remote_tags(git, repo, tag_pattern).await?;
    Ok(tags.into_iter().next())
}

/// Clone `repo` at `tag` into `dest`, retrying missing-tag failures.
///
/// `dest` is removed before every attempt so a half-written clone never
/// blocks the next one.
///
/// # Errors
///
/// - [`Error::CloneFailed`] on the first non-tag failure
/// - [`Error::TagNotFound`] once `policy.max_attempts` missing-tag failures
///   have been seen
#[instrument(level = "debug", skip(git, policy, dest), fields(dest = %dest.display()))]
pub async fn clone_at_tag<G: Git + ?Sized>(
    git: &G,
    policy: &RetryPolicy,
    repo: &str,
    tag: &str,
    dest: &Path,
) -> Result<()> {
    let max_attempts = policy.max_attempts.max(1);
    let mut attempt = 1;
    loop {
        remove_dir_if_exists(dest).await?;
        let message = match git.clone_tag(repo, tag, dest).await {
            Ok(()) => {
                info!(tag, attempt, "cloned repository");
                return Ok(());
            },
            Err(Error::Git(message)) => message,
            Err(other) => other.to_string(),
        };

        if !is_tag_not_found(&message) {
            return Err(Error::CloneFailed(message.trim().to_string()));
        }
        if attempt >= max_attempts {
            return Err(Error::TagNotFound {
                tag: tag.to_string(),
                repo: repo.to_string(),
                attempts: attempt,
                message: message.trim().to_string(),
            });
        }

        let delay = policy.backoff(attempt);
        warn!(tag, attempt, max_attempts, delay_ms = delay.as_millis(), "tag not found, retrying");
        tokio::time::sleep(delay).await;
        attempt += 1;
    }
}

/// Switch an existing clone to `tag`: fetch the ref, force checkout, clean.
#[instrument(level = "debug", skip(git, repo_dir), fields(repo_dir = %repo_dir.display()))]
pub async fn checkout_tag<G: Git + ?Sized>(git: &G, repo_dir: &Path, tag: &str) -> Result<()> {
    git.fetch_tag(repo_dir, tag).await?;
    git.checkout(repo_dir, tag).await?;
    git.clean(repo_dir).await
}

async fn remove_dir_if_exists(dir: &Path) -> Result<()> {
    match tokio::fs::remove_dir_all(dir).await {
        Err(e) if e.kind() != std::io::ErrorKind::NotFound => Err(Error::Io(e)),
        _ => Ok(()),
    }
}
