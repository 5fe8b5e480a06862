//! Error types and handling for sdkref-core operations.
//!
//! Every fallible operation in the pipeline returns [`Result<T>`]. The error
//! variants mirror the stages of a generation run so callers can tell a
//! missing tag apart from a broken network, or a failing extractor apart from
//! an aborted SDK batch.
//!
//! ## Error Categories
//!
//! - **Git**: remote tag listing, clone, fetch and checkout failures
//! - **Commands**: dependency installs, builds and extractor invocations
//! - **Configuration**: invalid descriptors, ranges or settings files
//! - **Generation**: per-version output problems and SDK-level aborts
//!
//! ## Recovery Hints
//!
//! ```rust
//! use sdkref_core::Error;
//!
//! let err = Error::Git("fatal: Remote branch e2b@9.9.9 not found in upstream origin".into());
//! assert!(err.is_recoverable());
//! assert_eq!(err.category(), "git");
//! ```

use crate::git::is_tag_not_found;
use thiserror::Error;

/// The main error type for sdkref-core operations.
#[derive(Error, Debug)]
pub enum Error {
    /// I/O operation failed.
    ///
    /// Covers filesystem work on checkouts, generated output and the
    /// destination page tree.
    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),

    /// A single git invocation failed.
    ///
    /// Carries the raw stderr text so callers can classify it with
    /// [`crate::git::is_tag_not_found`].
    #[error("Git error: {0}")]
    Git(String),

    /// The requested tag never appeared on the remote.
    ///
    /// Raised once clone retries are exhausted. Publishing docs for the wrong
    /// ref is worse than publishing nothing, so this is terminal.
    #[error(
        "Tag {tag} not found in repository {repo} after {attempts} attempts. Cancelling generation to avoid publishing incorrect documentation. Original error: {message}"
    )]
    TagNotFound {
        /// Tag that was requested.
        tag: String,
        /// Remote repository URL.
        repo: String,
        /// Number of clone attempts made.
        attempts: u32,
        /// Last git error message.
        message: String,
    },

    /// Clone failed for a reason other than a missing tag.
    ///
    /// Network, DNS and authentication failures land here and are never
    /// retried.
    #[error(
        "Failed to clone repository: {0}. This appears to be a network, authentication, or system error, not a missing tag."
    )]
    CloneFailed(String),

    /// An external command exited unsuccessfully.
    #[error("Command `{command}` failed (exit code {code:?}): {stderr}")]
    CommandFailed {
        /// Rendered command line.
        command: String,
        /// Exit code, if the process exited normally.
        code: Option<i32>,
        /// Trimmed stderr output.
        stderr: String,
    },

    /// Every command in a fallback chain failed.
    #[error("All attempts failed for {operation}: {}", attempts.join("; "))]
    AllAttemptsFailed {
        /// Name of the operation (e.g. `install`, `build`).
        operation: String,
        /// One message per failed attempt, in the order tried.
        attempts: Vec<String>,
    },

    /// A version switch was requested before the SDK was cloned.
    #[error("Checkout not initialized for {0}")]
    CheckoutNotInitialized(String),

    /// Configuration is invalid or inaccessible.
    ///
    /// ## Common Causes
    ///
    /// - Unparseable override range
    /// - Tag template without a `{version}` placeholder
    /// - Settings file that cannot be read
    #[error("Configuration error: {0}")]
    Config(String),

    /// A version string could not be interpreted.
    #[error("Invalid version: {0}")]
    InvalidVersion(String),

    /// Requested resource was not found.
    #[error("Not found: {0}")]
    NotFound(String),

    /// A generator ran but its output is unusable.
    #[error("Generation error: {0}")]
    Generation(String),

    /// The failure policy stopped the run after an SDK batch.
    #[error("Generation aborted for {sdk}: {reason}")]
    Aborted {
        /// SDK key whose batch triggered the abort.
        sdk: String,
        /// Human readable policy reason.
        reason: String,
        /// Versions that failed in the batch.
        failed_versions: Vec<String>,
    },

    /// Serialization or deserialization failed.
    #[error("Serialization error: {0}")]
    Serialization(String),

    /// Generic error for cases not covered by specific variants.
    #[error("{0}")]
    Other(String),
}

impl From<serde_json::Error> for Error {
    fn from(err: serde_json::Error) -> Self {
        Self::Serialization(err.to_string())
    }
}

impl From<toml::de::Error> for Error {
    fn from(err: toml::de::Error) -> Self {
        Self::Serialization(err.to_string())
    }
}

impl From<toml::ser::Error> for Error {
    fn from(err: toml::ser::Error) -> Self {
        Self::Serialization(err.to_string())
    }
}

impl Error {
    /// Check if the error might be resolved by retrying the operation.
    ///
    /// A git failure that looks like a missing ref is recoverable because
    /// tags can lag behind a release. Everything else that touches git is
    /// treated as infrastructure trouble.
    #[must_use]
    pub fn is_recoverable(&self) -> bool {
        match self {
            Self::Git(message) => is_tag_not_found(message),
            Self::Io(e) => matches!(
                e.kind(),
                std::io::ErrorKind::TimedOut | std::io::ErrorKind::Interrupted
            ),
            _ => false,
        }
    }

    /// Get the error category as a string identifier.
    ///
    /// Used as a structured logging field and by the CLI to choose an exit
    /// code.
    #[must_use]
    pub const fn category(&self) -> &'static str {
        match self {
            Self::Io(_) => "io",
            Self::Git(_) | Self::TagNotFound { .. } | Self::CloneFailed(_) => "git",
            Self::CommandFailed { .. } | Self::AllAttemptsFailed { .. } => "command",
            Self::CheckoutNotInitialized(_) => "contract",
            Self::Config(_) | Self::InvalidVersion(_) => "config",
            Self::NotFound(_) => "not_found",
            Self::Generation(_) => "generation",
            Self::Aborted { .. } => "aborted",
            Self::Serialization(_) => "serialization",
            Self::Other(_) => "other",
        }
    }
}

/// Convenience type alias for `std::result::Result<T, Error>`.
pub type Result<T> = std::result::Result<T, Error>;

#[cfg(test)]
#[allow(clippy::panic, clippy::unwrap_used)]
mod tests {
    use super::*;
    use std::io;

    #[test]
    fn test_tag_not_found_message() {
        let err = Error::TagNotFound {
            tag: "e2b@2.0.0".to_string(),
            repo: "https://github.com/e2b-dev/e2b.git".to_string(),
            attempts: 3,
            message: "Remote branch e2b@2.0.0 not found".to_string(),
        };

        let text = err.to_string();
        assert!(text.starts_with("Tag e2b@2.0.0 not found in repository"));
        assert!(text.contains("after 3 attempts"));
        assert!(text.contains("Original error: Remote branch"));
    }

    #[test]
    fn test_clone_failed_names_infrastructure() {
        let err = Error::CloneFailed("Could not resolve host: github.com".to_string());
        let text = err.to_string();
        assert!(text.contains("Could not resolve host"));
        assert!(text.contains("not a missing tag"));
    }

    #[test]
    fn test_recoverability() {
        // Given: a missing-ref git error and an auth failure
        let missing = Error::Git("fatal: couldn't find remote ref refs/tags/v9".to_string());
        let auth = Error::Git("fatal: Authentication failed".to_string());

        // Then: only the missing ref is worth retrying
        assert!(missing.is_recoverable());
        assert!(!auth.is_recoverable());
        assert!(!Error::CloneFailed("x".into()).is_recoverable());
        assert!(Error::Io(io::Error::new(io::ErrorKind::Interrupted, "x")).is_recoverable());
        assert!(!Error::Io(io::Error::new(io::ErrorKind::NotFound, "x")).is_recoverable());
    }

    #[test]
    fn test_categories() {
        let cases = vec![
            (Error::Config("x".into()), "config"),
            (Error::CheckoutNotInitialized("js-sdk".into()), "contract"),
            (
                Error::Aborted {
                    sdk: "cli".into(),
                    reason: "All versions failed".into(),
                    failed_versions: vec![],
                },
                "aborted",
            ),
            (Error::CloneFailed("x".into()), "git"),
            (
                Error::AllAttemptsFailed {
                    operation: "install".into(),
                    attempts: vec![],
                },
                "command",
            ),
        ];

        for (error, expected) in cases {
            assert_eq!(error.category(), expected, "category for {error}");
        }
    }

    #[test]
    fn test_json_error_conversion() {
        let json_err = serde_json::from_str::<serde_json::Value>("{ nope").unwrap_err();
        let err: Error = json_err.into();
        assert!(matches!(err, Error::Serialization(_)));
    }

    #[test]
    fn test_all_attempts_failed_joins_messages() {
        let err = Error::AllAttemptsFailed {
            operation: "install".into(),
            attempts: vec!["pnpm: boom".into(), "npm: bang".into()],
        };
        assert_eq!(
            err.to_string(),
            "All attempts failed for install: pnpm: boom; npm: bang"
        );
    }
}
