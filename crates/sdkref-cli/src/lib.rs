//! sdkref CLI - versioned SDK reference documentation generator
//!
//! A run loads settings, generates every selected SDK in descriptor order,
//! rebuilds the site navigation from the published tree and verifies the
//! result. The binary entry point only maps the outcome to an exit code.
use anyhow::{Result, anyhow};
use clap::Parser;
use colored::Colorize;
use sdkref_core::{
    DependencyCache, Error, GeneratorSettings, GitCli, Orchestrator, RunTotals, SdkEntry,
    SdkRegistry, SystemRunner, VersionSelector, build_navigation, layout, merge_navigation,
    verify_docs_json, verify_generated_docs,
};
use std::path::Path;
use tracing::{info, warn};

pub mod cli;
pub mod error;
mod logging;
mod output;

use crate::cli::Cli;
use crate::error::CliError;
use crate::logging::initialize_logging;

/// Site configuration file merged with the rebuilt navigation.
pub const DOCS_JSON: &str = "docs.json";

/// Prefix of the per-run temporary directory holding shared checkouts.
pub const WORK_DIR_PREFIX: &str = "sdk-gen-";

/// Execute the sdkref CLI with the current process arguments and environment.
///
/// # Errors
///
/// Returns a [`CliError`] carrying the exit category for usage problems,
/// aborted generation and failed verification. Other failures come from
/// the core library and are categorized by
/// [`error::exit_code_from_error`].
pub async fn run() -> Result<()> {
    let cli = Cli::parse();
    initialize_logging(&cli)?;
    execute(&cli).await
}

/// Run generation, navigation and verification for parsed arguments.
///
/// # Errors
///
/// See [`run`].
pub async fn execute(cli: &Cli) -> Result<()> {
    let mut settings = GeneratorSettings::load(cli.config.as_deref()).map_err(CliError::usage)?;
    if let Some(dir) = &cli.docs_dir {
        settings.paths.docs_dir.clone_from(dir);
    }
    let registry = settings.registry().map_err(CliError::usage)?;
    let targets = select_sdks(&registry, cli.sdk_filter())?;
    let selector: VersionSelector = cli.sdk_version.parse().map_err(CliError::usage)?;

    let mut options = settings.generation_options().with_force(cli.force);
    if cli.limit.is_some() {
        options = options.with_limit(cli.limit);
    }
    let docs_dir = options.docs_dir.clone();
    info!(
        docs = %docs_dir.display(),
        sdks = targets.len(),
        selector = %selector,
        "starting generation"
    );

    let work = tempfile::Builder::new().prefix(WORK_DIR_PREFIX).tempdir()?;
    let git = GitCli::new();
    let runner = SystemRunner;
    let orchestrator = Orchestrator::new(
        &git,
        &runner,
        DependencyCache::new(&settings.paths.cache_dir),
        work.path(),
        options,
    );

    let mut totals = RunTotals::default();
    for entry in targets {
        match orchestrator
            .generate_sdk(&entry.key, &entry.descriptor, &selector)
            .await
        {
            Ok(result) => totals.record(&entry.key, result),
            Err(err) => {
                if let Error::Aborted {
                    sdk,
                    reason,
                    failed_versions,
                } = &err
                {
                    output::print_summary(&totals);
                    output::print_abort(sdk, reason, failed_versions);
                }
                return Err(err.into());
            },
        }
    }
    work.close()?;

    output::print_summary(&totals);
    publish_navigation(&docs_dir, &registry)?;
    verify(&docs_dir)
}

/// Descriptor entries selected by `--sdk`, in registry order.
///
/// # Errors
///
/// An unknown key is a usage error listing the known keys.
pub fn select_sdks<'r>(
    registry: &'r SdkRegistry,
    filter: Option<&str>,
) -> Result<Vec<&'r SdkEntry>> {
    let Some(key) = filter else {
        return Ok(registry.iter().collect());
    };
    let selected: Vec<&SdkEntry> = registry.iter().filter(|e| e.key == key).collect();
    if selected.is_empty() {
        return Err(CliError::usage(anyhow!(
            "Unknown SDK '{key}'. Available: {}",
            registry.keys().join(", ")
        ))
        .into());
    }
    Ok(selected)
}

fn publish_navigation(docs_dir: &Path, registry: &SdkRegistry) -> Result<()> {
    let docs_json = docs_dir.join(DOCS_JSON);
    if !docs_json.is_file() {
        warn!(path = %docs_json.display(), "docs.json not found, skipping navigation merge");
        return Ok(());
    }
    let dropdowns = build_navigation(docs_dir, registry);
    if merge_navigation(&docs_json, &dropdowns)? {
        println!("{} {}", "Updated".green(), docs_json.display());
    }
    Ok(())
}

fn verify(docs_dir: &Path) -> Result<()> {
    if !layout::sdk_reference_root(docs_dir).is_dir() {
        warn!("nothing published yet, skipping verification");
        return Ok(());
    }
    let report = verify_generated_docs(docs_dir);
    let docs_json = docs_dir.join(DOCS_JSON);
    let docs_json_errors = if docs_json.is_file() {
        verify_docs_json(&docs_json)
    } else {
        Vec::new()
    };
    output::print_verification(&report, &docs_json_errors);

    let errors = report.errors.len() + docs_json_errors.len();
    if errors > 0 {
        return Err(CliError::verification(anyhow!("verification found {errors} error(s)")).into());
    }
    Ok(())
}
