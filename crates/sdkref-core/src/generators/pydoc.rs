//! Python package extraction with `pydoc-markdown`.
//!
//! Packages are discovered by importing the base package and listing its
//! direct children. When discovery yields nothing, the configured package
//! list is used instead. Every package is extracted on its own; a package
//! that produces almost nothing is skipped rather than failing the version.

use super::GeneratorContext;
use crate::layout::{GENERATED_DIR, SITE_EXTENSION};
use crate::process::CommandRunner;
use crate::sdk::PydocConfig;
use crate::{Error, Result};
use regex::Regex;
use std::path::{Path, PathBuf};
use std::sync::OnceLock;
use tracing::{debug, info, instrument, warn};

/// Lists the direct sub-packages of `sys.argv[1]`, one per line.
const DISCOVERY_SCRIPT: &str = r"
import importlib
import pkgutil
import sys
import warnings

warnings.filterwarnings('ignore')

try:
    base = importlib.import_module(sys.argv[1])
    names = [name for _, name, _ in pkgutil.iter_modules(base.__path__, base.__name__ + '.')]
    if names:
        print('\n'.join(sorted(names)))
except ImportError:
    pass
";

/// Size cutoffs below which an extracted page is treated as empty.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct ContentThresholds {
    /// Minimum trimmed extractor output, in characters.
    pub min_raw_chars: usize,
    /// Minimum size of the post-processed page, in bytes.
    pub min_file_bytes: u64,
}

impl Default for ContentThresholds {
    fn default() -> Self {
        Self {
            min_raw_chars: 50,
            min_file_bytes: 100,
        }
    }
}

fn anchor_tag() -> &'static Regex {
    static RE: OnceLock<Regex> = OnceLock::new();
    #[allow(clippy::expect_used)]
    RE.get_or_init(|| Regex::new(r"<a[^>]*>.*?</a>").expect("valid anchor regex"))
}

fn objects_heading() -> &'static Regex {
    static RE: OnceLock<Regex> = OnceLock::new();
    #[allow(clippy::expect_used)]
    RE.get_or_init(|| Regex::new(r"(?m)^(## .+) Objects$").expect("valid heading regex"))
}

fn fourth_level_heading() -> &'static Regex {
    static RE: OnceLock<Regex> = OnceLock::new();
    #[allow(clippy::expect_used)]
    RE.get_or_init(|| Regex::new(r"(?m)^####").expect("valid heading regex"))
}

/// Clean raw extractor output into a site page body.
///
/// Inline anchors go, top-level headings go, `## X Objects` becomes `## X`
/// and fourth-level headings move up one level.
#[must_use]
pub fn post_process(raw: &str) -> String {
    let without_anchors = anchor_tag().replace_all(raw, "");
    let without_titles = without_anchors
        .split('\n')
        .filter(|line| !line.starts_with("# "))
        .collect::<Vec<_>>()
        .join("\n");
    let renamed = objects_heading().replace_all(&without_titles, "${1}");
    fourth_level_heading()
        .replace_all(&renamed, "###")
        .into_owned()
}

/// Page name for a dotted package path: the last segment minus `strip_prefix`.
#[must_use]
pub fn page_name(package: &str, strip_prefix: Option<&str>) -> String {
    let last = package.rsplit('.').next().unwrap_or(package);
    strip_prefix
        .and_then(|prefix| last.strip_prefix(prefix))
        .filter(|rest| !rest.is_empty())
        .unwrap_or(last)
        .to_string()
}

/// Parse discovery output, dropping blanks and bytecode caches.
#[must_use]
pub fn parse_discovered(stdout: &str) -> Vec<String> {
    stdout
        .lines()
        .map(str::trim)
        .filter(|line| !line.is_empty())
        .filter(|line| !line.contains("__pycache__"))
        .map(str::to_string)
        .collect()
}

async fn discover_packages<R: CommandRunner + ?Sized>(
    ctx: &GeneratorContext<'_, R>,
    sdk_dir: &Path,
    base_package: &str,
) -> Vec<String> {
    let spec = ctx
        .python
        .python()
        .args(["-W", "ignore", "-c", DISCOVERY_SCRIPT, base_package]);
    match ctx.runner.run(&spec, sdk_dir).await {
        Ok(output) if output.success => {
            let packages = parse_discovered(&output.stdout);
            if !packages.is_empty() {
                info!(base_package, count = packages.len(), "discovered python packages");
            }
            packages
        },
        Ok(output) => {
            warn!(base_package, code = ?output.code, "package discovery failed, using fallback list");
            Vec::new()
        },
        Err(e) => {
            warn!(base_package, error = %e, "package discovery failed, using fallback list");
            Vec::new()
        },
    }
}

async fn remove_if_present(path: &Path) {
    if let Err(e) = tokio::fs::remove_file(path).await {
        if e.kind() != std::io::ErrorKind::NotFound {
            warn!(file = %path.display(), error = %e, "failed to remove page");
        }
    }
}

/// Extract one package into `out_dir`. `Ok(false)` means skipped as empty.
async fn extract_package<R: CommandRunner + ?Sized>(
    ctx: &GeneratorContext<'_, R>,
    sdk_dir: &Path,
    out_dir: &Path,
    package: &str,
    strip_prefix: Option<&str>,
) -> Result<bool> {
    let page = out_dir.join(format!("{}.{SITE_EXTENSION}", page_name(package, strip_prefix)));
    let spec = ctx.python.command("pydoc-markdown").args(["-p", package]);

    let output = ctx.runner.run(&spec, sdk_dir).await?;
    if !output.success {
        return Err(Error::CommandFailed {
            command: spec.to_string(),
            code: output.code,
            stderr: output.stderr.trim().to_string(),
        });
    }
    if output.stdout.trim().chars().count() < ctx.thresholds.min_raw_chars {
        warn!(package, "extractor produced no content, skipping");
        return Ok(false);
    }

    tokio::fs::write(&page, post_process(&output.stdout)).await?;
    let size = tokio::fs::metadata(&page).await?.len();
    if size < ctx.thresholds.min_file_bytes {
        warn!(package, size, "page has no meaningful content, removing");
        remove_if_present(&page).await;
        return Ok(false);
    }
    debug!(package, page = %page.display(), "extracted package");
    Ok(true)
}

async fn process_package<R: CommandRunner + ?Sized>(
    ctx: &GeneratorContext<'_, R>,
    sdk_dir: &Path,
    out_dir: &Path,
    package: &str,
    strip_prefix: Option<&str>,
) -> bool {
    match extract_package(ctx, sdk_dir, out_dir, package, strip_prefix).await {
        Ok(produced) => produced,
        Err(e) => {
            warn!(package, error = %e, "failed to generate docs for package");
            let page = out_dir.join(format!("{}.{SITE_EXTENSION}", page_name(package, strip_prefix)));
            remove_if_present(&page).await;
            false
        },
    }
}

#[instrument(level = "debug", skip(ctx, sdk_dir, config), fields(sdk_dir = %sdk_dir.display()))]
pub(super) async fn generate<R: CommandRunner + ?Sized>(
    ctx: &GeneratorContext<'_, R>,
    sdk_dir: &Path,
    config: &PydocConfig,
) -> Result<PathBuf> {
    let out_dir = sdk_dir.join(GENERATED_DIR);
    tokio::fs::create_dir_all(&out_dir).await?;

    let discovered = match &config.base_package {
        Some(base) => discover_packages(ctx, sdk_dir, base).await,
        None => Vec::new(),
    };
    let packages = if discovered.is_empty() {
        info!(count = config.allowed_packages.len(), "using configured package list");
        config.allowed_packages.clone()
    } else {
        discovered
    };

    let strip_prefix = config.strip_prefix.as_deref();
    let mut produced = 0usize;
    for package in &packages {
        if process_package(ctx, sdk_dir, &out_dir, package, strip_prefix).await {
            produced += 1;
        }
    }
    info!(produced, total = packages.len(), "generated python package docs");

    for (parent, children) in &config.submodules {
        for child in children {
            let unit = format!("{parent}.{child}");
            if process_package(ctx, sdk_dir, &out_dir, &unit, strip_prefix).await {
                produced += 1;
            }
        }
    }

    if produced == 0 {
        return Err(Error::Generation(
            "no python package produced documentation".to_string(),
        ));
    }
    Ok(out_dir)
}
