//! CLI error handling with semantic exit codes.
//!
//! # Exit Code Categories
//!
//! | Code | Category | Description |
//! |------|----------|-------------|
//! | 0 | Success | Run completed and verified |
//! | 1 | `Internal` | Unexpected/internal error |
//! | 2 | `Usage` | Invalid arguments or settings |
//! | 3 | `NotFound` | Missing tags, paths or files |
//! | 5 | `Network` | Clone or fetch failed for infrastructure reasons |
//! | 6 | `Generation` | A failure policy aborted the run |
//! | 7 | `Verification` | Published pages or docs.json failed checks |
//!
//! # Usage
//!
//! ```bash
//! sdkref --sdk cli
//! case $? in
//!     0) echo "published" ;;
//!     6) echo "generation aborted" ;;
//!     *) echo "other error" ;;
//! esac
//! ```

use std::fmt;
use std::process::ExitCode;

/// Semantic error category determining the exit code.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash)]
#[repr(u8)]
pub enum ErrorCategory {
    /// Unexpected or internal error (exit code 1).
    Internal = 1,

    /// Invalid arguments or configuration (exit code 2).
    ///
    /// Unknown SDK keys, malformed version selectors and unreadable or
    /// invalid settings files.
    Usage = 2,

    /// Requested resource not found (exit code 3).
    NotFound = 3,

    /// Network or clone failure (exit code 5).
    Network = 5,

    /// Generation aborted (exit code 6).
    ///
    /// A required SDK had a failed version, every version of an optional
    /// SDK failed, or a tag never appeared on the remote.
    Generation = 6,

    /// Output failed verification (exit code 7).
    Verification = 7,
}

impl ErrorCategory {
    /// Get the exit code for this category.
    #[must_use]
    pub const fn exit_code(self) -> u8 {
        self as u8
    }

    /// Create an `ExitCode` from this category.
    #[must_use]
    pub fn as_exit_code(self) -> ExitCode {
        ExitCode::from(self.exit_code())
    }

    /// Get a short description of this error category.
    #[must_use]
    pub const fn description(self) -> &'static str {
        match self {
            Self::Internal => "internal error",
            Self::Usage => "usage error",
            Self::NotFound => "not found",
            Self::Network => "network error",
            Self::Generation => "generation aborted",
            Self::Verification => "verification failed",
        }
    }

    /// Category for a core library error.
    #[must_use]
    pub const fn from_core(err: &sdkref_core::Error) -> Self {
        use sdkref_core::Error;
        match err {
            Error::Config(_) | Error::InvalidVersion(_) => Self::Usage,
            Error::NotFound(_) => Self::NotFound,
            Error::Git(_) | Error::CloneFailed(_) => Self::Network,
            Error::TagNotFound { .. }
            | Error::Aborted { .. }
            | Error::Generation(_)
            | Error::CommandFailed { .. }
            | Error::AllAttemptsFailed { .. } => Self::Generation,
            Error::Io(_)
            | Error::CheckoutNotInitialized(_)
            | Error::Serialization(_)
            | Error::Other(_) => Self::Internal,
        }
    }
}

impl fmt::Display for ErrorCategory {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.description())
    }
}

/// A CLI error with a semantic category for exit code mapping.
#[derive(Debug)]
pub struct CliError {
    /// The semantic category of this error.
    pub category: ErrorCategory,
    /// The underlying error with full context.
    pub source: anyhow::Error,
}

impl CliError {
    /// Create a new CLI error with explicit category.
    pub fn new(category: ErrorCategory, source: impl Into<anyhow::Error>) -> Self {
        Self {
            category,
            source: source.into(),
        }
    }

    /// Create a usage error.
    pub fn usage(source: impl Into<anyhow::Error>) -> Self {
        Self::new(ErrorCategory::Usage, source)
    }

    /// Create a verification error.
    pub fn verification(source: impl Into<anyhow::Error>) -> Self {
        Self::new(ErrorCategory::Verification, source)
    }

    /// Get the exit code for this error.
    #[must_use]
    pub const fn exit_code(&self) -> u8 {
        self.category.exit_code()
    }
}

impl fmt::Display for CliError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.source)
    }
}

impl std::error::Error for CliError {
    fn source(&self) -> Option<&(dyn std::error::Error + 'static)> {
        Some(self.source.as_ref())
    }
}

/// Determine the exit code from an `anyhow::Error`.
///
/// Explicit [`CliError`] categories win, then core library errors found in
/// the chain. Anything else is internal.
#[must_use]
pub fn exit_code_from_error(err: &anyhow::Error) -> u8 {
    if let Some(cli_err) = err.downcast_ref::<CliError>() {
        return cli_err.exit_code();
    }
    err.chain()
        .find_map(|cause| cause.downcast_ref::<sdkref_core::Error>())
        .map_or(ErrorCategory::Internal, ErrorCategory::from_core)
        .exit_code()
}
