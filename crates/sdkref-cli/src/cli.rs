//! # CLI Structure and Argument Parsing
//!
//! `sdkref` has a single mode of operation: generate reference pages for
//! one SDK or all of them, rebuild the site navigation and verify the
//! result.
//!
//! ## Usage Patterns
//!
//! ```bash
//! # Every SDK, every version not yet published
//! sdkref
//!
//! # One SDK, newest release only
//! sdkref --sdk js-sdk --version latest
//!
//! # Regenerate a single version
//! sdkref --sdk python-sdk --version 2.1.0 --force
//!
//! # Only the five newest versions of each SDK
//! sdkref --limit 5
//! ```
//!
//! `--version` selects SDK versions, so the usual version flag is disabled.

use clap::Parser;
use std::path::PathBuf;

/// Sentinel accepted by `--sdk` and `--version` for "everything".
pub const ALL: &str = "all";

/// Command-line interface for the `sdkref` binary.
#[derive(Parser, Clone, Debug)]
#[command(name = "sdkref")]
#[command(about = "sdkref - Versioned SDK reference documentation generator", long_about = None)]
#[command(disable_version_flag = true)]
#[allow(clippy::struct_excessive_bools)]
pub struct Cli {
    /// SDK key to generate, or `all`
    #[arg(long, value_name = "KEY", default_value = ALL)]
    pub sdk: String,

    /// Versions to generate: `all`, `latest` or a version such as `2.1.0`
    #[arg(long = "version", value_name = "VERSION", default_value = ALL)]
    pub sdk_version: String,

    /// Keep only the newest N versions per SDK (0 means no limit)
    #[arg(long, value_name = "N")]
    pub limit: Option<usize>,

    /// Regenerate versions that are already published
    #[arg(long)]
    pub force: bool,

    /// Documentation site root (overrides settings and `SDKREF_DOCS_DIR`)
    #[arg(long = "docs-dir", value_name = "DIR")]
    pub docs_dir: Option<PathBuf>,

    /// Settings file. Also via `SDKREF_CONFIG`.
    #[arg(long, value_name = "FILE", env = "SDKREF_CONFIG")]
    pub config: Option<PathBuf>,

    /// Enable debug logging
    #[arg(short = 'v', long, conflicts_with = "quiet")]
    pub verbose: bool,

    /// Suppress informational messages (only show errors)
    #[arg(short = 'q', long)]
    pub quiet: bool,

    /// Disable all ANSI colors in output (also respects `NO_COLOR` env)
    #[arg(long = "no-color")]
    pub no_color: bool,
}

impl Cli {
    /// The requested SDK key, or `None` for every SDK.
    #[must_use]
    pub fn sdk_filter(&self) -> Option<&str> {
        let sdk = self.sdk.trim();
        if sdk.is_empty() || sdk == ALL {
            None
        } else {
            Some(sdk)
        }
    }
}
