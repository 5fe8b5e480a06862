//! Documentation generator drivers.
//!
//! Each driver takes a located SDK directory plus its resolved configuration
//! and leaves raw pages in a directory it returns. Drivers never normalize;
//! that is [`crate::normalize`]'s job.
//!
//! | Kind      | Tool                           | Output        |
//! |-----------|--------------------------------|---------------|
//! | `typedoc` | `typedoc` + markdown plugin    | `sdk_ref/`    |
//! | `pydoc`   | `pydoc-markdown` per package   | `sdk_ref/`    |
//! | `cli`     | the SDK's own CLI, `-cmd2md`   | `sdk_ref/` or `sdk-ref/` |

pub mod cli;
pub mod pydoc;
pub mod typedoc;

use crate::install::PythonToolchain;
use crate::process::CommandRunner;
use crate::resolver::ResolvedConfig;
use crate::Result;
use std::path::{Path, PathBuf};

pub use pydoc::ContentThresholds;

/// Everything a driver needs besides the SDK directory and configuration.
pub struct GeneratorContext<'a, R: CommandRunner + ?Sized> {
    /// Process runner for the extractor tools.
    pub runner: &'a R,
    /// Directory holding shared generator assets such as the typedoc theme.
    pub configs_dir: &'a Path,
    /// How to invoke Python tools, decided by the install step.
    pub python: PythonToolchain,
    /// Content cutoffs for Python extraction.
    pub thresholds: ContentThresholds,
}

/// Run the driver matching `config` against `sdk_dir`.
///
/// Returns the directory holding the raw generated pages.
pub async fn run_generator<R: CommandRunner + ?Sized>(
    ctx: &GeneratorContext<'_, R>,
    config: &ResolvedConfig,
    sdk_dir: &Path,
) -> Result<PathBuf> {
    match config {
        ResolvedConfig::Typedoc(config) => typedoc::generate(ctx, sdk_dir, config).await,
        ResolvedConfig::Pydoc(config) => pydoc::generate(ctx, sdk_dir, config).await,
        ResolvedConfig::Cli => cli::generate(ctx, sdk_dir).await,
    }
}
