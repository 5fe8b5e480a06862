//! Per-SDK generation pipeline.
//!
//! For one SDK the [`Orchestrator`] decides which versions need pages, runs
//! each of them through checkout, install, generation, normalization and
//! copy, and then applies the failure policy to the batch.
//!
//! Versions are processed one at a time in the order version selection
//! returns them. A failing version is recorded and its siblings still run;
//! only the policy check at the end of the batch can stop the whole run.
//!
//! ## Example
//!
//! ```rust,no_run
//! use sdkref_core::git::GitCli;
//! use sdkref_core::orchestrator::{GenerationOptions, Orchestrator, VersionSelector};
//! use sdkref_core::process::SystemRunner;
//! use sdkref_core::{DependencyCache, SdkRegistry};
//!
//! # async fn example() -> sdkref_core::Result<()> {
//! let registry = SdkRegistry::builtin();
//! let git = GitCli::new();
//! let runner = SystemRunner;
//! let options = GenerationOptions::new("./docs", "./configs").with_limit(Some(3));
//! let orchestrator = Orchestrator::new(
//!     &git,
//!     &runner,
//!     DependencyCache::new("/tmp/sdkref"),
//!     "/tmp/sdkref-work",
//!     options,
//! );
//!
//! if let Some(descriptor) = registry.get("js-sdk") {
//!     let result = orchestrator
//!         .generate_sdk("js-sdk", descriptor, &VersionSelector::Latest)
//!         .await?;
//!     println!("generated {}", result.generated);
//! }
//! # Ok(())
//! # }
//! ```

use crate::cache::DependencyCache;
use crate::checkout::{CheckoutManager, locate_sdk_dir};
use crate::generators::{ContentThresholds, GeneratorContext, run_generator};
use crate::git::{self, Git, LATEST, RetryPolicy};
use crate::install::install_dependencies;
use crate::layout::{self, GENERATED_DIR};
use crate::normalize::{copy_to_docs, normalize_output};
use crate::process::CommandRunner;
use crate::resolver::resolve_config;
use crate::sdk::SdkDescriptor;
use crate::{Error, Result, version};
use serde::Serialize;
use std::fmt;
use std::path::{Path, PathBuf};
use std::str::FromStr;
use tracing::{debug, error, info, instrument, warn};

/// Policy reason when a required SDK has any failed version.
pub const REQUIRED_FAILURE_REASON: &str = "Required SDK has failures";

/// Policy reason when every version of an optional SDK failed.
pub const ALL_FAILED_REASON: &str = "All versions failed";

// ============================================================
// Selection and options
// ============================================================

/// Which versions of an SDK a run targets.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum VersionSelector {
    /// Every remote version not yet present locally.
    All,
    /// The newest remote version.
    Latest,
    /// One version, in `v`-prefixed form.
    Exact(String),
}

impl FromStr for VersionSelector {
    type Err = Error;

    fn from_str(s: &str) -> Result<Self> {
        match s.trim() {
            "all" => Ok(Self::All),
            LATEST => Ok(Self::Latest),
            literal if version::is_valid(literal) => Ok(Self::Exact(version::normalize(literal))),
            other => Err(Error::InvalidVersion(format!(
                "'{other}' is not 'all', 'latest' or a semantic version"
            ))),
        }
    }
}

impl fmt::Display for VersionSelector {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::All => f.write_str("all"),
            Self::Latest => f.write_str(LATEST),
            Self::Exact(v) => f.write_str(v),
        }
    }
}

/// Run-wide knobs shared by every SDK.
#[derive(Debug, Clone)]
pub struct GenerationOptions {
    /// Documentation site root; pages go under `docs/sdk-reference`.
    pub docs_dir: PathBuf,
    /// Shared generator assets such as the typedoc theme.
    pub configs_dir: PathBuf,
    /// Keep only the newest N remote versions when selecting all.
    pub limit: Option<usize>,
    /// Regenerate versions that already exist locally.
    pub force: bool,
    /// Python extraction cutoffs.
    pub thresholds: ContentThresholds,
    /// Clone retry behavior.
    pub retry: RetryPolicy,
}

impl GenerationOptions {
    /// Options with default thresholds and retry policy.
    pub fn new(docs_dir: impl Into<PathBuf>, configs_dir: impl Into<PathBuf>) -> Self {
        Self {
            docs_dir: docs_dir.into(),
            configs_dir: configs_dir.into(),
            limit: None,
            force: false,
            thresholds: ContentThresholds::default(),
            retry: RetryPolicy::default(),
        }
    }

    /// Set the version count limit. Zero means no limit.
    #[must_use]
    pub fn with_limit(mut self, limit: Option<usize>) -> Self {
        self.limit = limit.filter(|n| *n > 0);
        self
    }

    /// Set force regeneration.
    #[must_use]
    pub const fn with_force(mut self, force: bool) -> Self {
        self.force = force;
        self
    }

    /// Set Python extraction cutoffs.
    #[must_use]
    pub const fn with_thresholds(mut self, thresholds: ContentThresholds) -> Self {
        self.thresholds = thresholds;
        self
    }

    /// Set clone retry behavior.
    #[must_use]
    pub const fn with_retry(mut self, retry: RetryPolicy) -> Self {
        self.retry = retry;
        self
    }
}

// ============================================================
// Results
// ============================================================

/// Outcome of one SDK batch.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct GenerationResult {
    /// Versions whose pages were written.
    pub generated: usize,
    /// Versions that failed.
    pub failed: usize,
    /// The failed versions, in processing order.
    pub failed_versions: Vec<String>,
}

impl GenerationResult {
    /// Record one successful version.
    pub fn record_success(&mut self) {
        self.generated += 1;
    }

    /// Record one failed version.
    pub fn record_failure(&mut self, version: &str) {
        self.failed += 1;
        self.failed_versions.push(version.to_string());
    }
}

/// Per-SDK results of a whole run, in processing order.
#[derive(Debug, Clone, Default, Serialize)]
pub struct RunTotals {
    /// `(sdk key, batch result)` pairs.
    pub sdks: Vec<(String, GenerationResult)>,
}

impl RunTotals {
    /// Add one SDK's result.
    pub fn record(&mut self, key: &str, result: GenerationResult) {
        self.sdks.push((key.to_string(), result));
    }

    /// Versions generated across all SDKs.
    #[must_use]
    pub fn generated(&self) -> usize {
        self.sdks.iter().map(|(_, r)| r.generated).sum()
    }

    /// Versions failed across all SDKs.
    #[must_use]
    pub fn failed(&self) -> usize {
        self.sdks.iter().map(|(_, r)| r.failed).sum()
    }
}

/// Abort decision for a finished batch.
///
/// Required SDKs tolerate no failures. Optional SDKs abort only when nothing
/// succeeded. A batch without failures never aborts.
pub fn apply_failure_policy(
    key: &str,
    descriptor: &SdkDescriptor,
    result: &GenerationResult,
) -> Result<()> {
    if result.failed == 0 {
        return Ok(());
    }
    let reason = if descriptor.required {
        REQUIRED_FAILURE_REASON
    } else if result.generated == 0 {
        ALL_FAILED_REASON
    } else {
        warn!(
            sdk = key,
            failed = result.failed,
            "optional SDK partially failed, continuing"
        );
        return Ok(());
    };
    error!(sdk = key, reason, failed = ?result.failed_versions, "aborting run");
    Err(Error::Aborted {
        sdk: key.to_string(),
        reason: reason.to_string(),
        failed_versions: result.failed_versions.clone(),
    })
}

// ============================================================
// Orchestrator
// ============================================================

/// Drives generation for one SDK at a time.
pub struct Orchestrator<'a, G: Git + ?Sized, R: CommandRunner + ?Sized> {
    git: &'a G,
    runner: &'a R,
    cache: DependencyCache,
    work_dir: PathBuf,
    options: GenerationOptions,
}

impl<'a, G: Git + ?Sized, R: CommandRunner + ?Sized> Orchestrator<'a, G, R> {
    /// Orchestrator cloning into `work_dir`.
    pub fn new(
        git: &'a G,
        runner: &'a R,
        cache: DependencyCache,
        work_dir: impl Into<PathBuf>,
        options: GenerationOptions,
    ) -> Self {
        Self {
            git,
            runner,
            cache,
            work_dir: work_dir.into(),
            options,
        }
    }

    /// Run options.
    #[must_use]
    pub const fn options(&self) -> &GenerationOptions {
        &self.options
    }

    /// Select, generate and apply the failure policy for one SDK.
    ///
    /// # Errors
    ///
    /// Selection errors (such as a required SDK without tags) and policy
    /// aborts. Individual version failures are reported in the result.
    #[instrument(skip(self, key, descriptor, selector), fields(sdk = key, selector = %selector))]
    pub async fn generate_sdk(
        &self,
        key: &str,
        descriptor: &SdkDescriptor,
        selector: &VersionSelector,
    ) -> Result<GenerationResult> {
        info!(sdk = key, name = %descriptor.display_name, %selector, "generating sdk");
        let versions = self.select_versions(key, descriptor, selector).await?;
        if versions.is_empty() {
            info!(sdk = key, "nothing to generate");
            return Ok(GenerationResult::default());
        }

        let result = self.process_batch(key, descriptor, &versions).await;
        info!(
            sdk = key,
            generated = result.generated,
            failed = result.failed,
            "sdk batch finished"
        );
        apply_failure_policy(key, descriptor, &result)?;
        Ok(result)
    }

    /// Versions to generate for `selector`, in processing order.
    pub async fn select_versions(
        &self,
        key: &str,
        descriptor: &SdkDescriptor,
        selector: &VersionSelector,
    ) -> Result<Vec<String>> {
        match selector {
            VersionSelector::All => self.discover_missing(key, descriptor).await,
            VersionSelector::Latest => {
                let resolved = git::resolve_latest_version(
                    self.git,
                    &descriptor.repo,
                    &descriptor.tag_pattern,
                    LATEST,
                )
                .await?;
                match resolved {
                    Some(v) => Ok(self.unless_present(key, v)),
                    None => no_tags(key, descriptor),
                }
            },
            VersionSelector::Exact(v) => Ok(self.unless_present(key, version::normalize(v))),
        }
    }

    async fn discover_missing(&self, key: &str, descriptor: &SdkDescriptor) -> Result<Vec<String>> {
        let remote =
            git::fetch_remote_tags(self.git, &descriptor.repo, &descriptor.tag_pattern).await?;
        if remote.is_empty() {
            return no_tags(key, descriptor);
        }

        let mut remote = version::filter_by_minimum(&remote, descriptor.min_version.as_deref());
        if let Some(limit) = self.options.limit {
            remote.truncate(limit);
        }
        let local = layout::local_versions(&self.options.docs_dir, key);

        let missing = if self.options.force {
            if !local.is_empty() {
                warn!(sdk = key, "force mode, regenerating existing versions");
            }
            remote.clone()
        } else {
            version::diff(&remote, &local)
        };
        info!(
            sdk = key,
            remote = remote.len(),
            local = local.len(),
            missing = missing.len(),
            "version discovery"
        );
        Ok(missing)
    }

    fn unless_present(&self, key: &str, resolved: String) -> Vec<String> {
        if !self.options.force && layout::version_exists(&self.options.docs_dir, key, &resolved) {
            info!(sdk = key, version = %resolved, "version already exists");
            return Vec::new();
        }
        vec![resolved]
    }

    /// Generate every version in `versions`, recording failures.
    ///
    /// The batch's checkouts are removed afterwards whatever happened.
    pub async fn process_batch(
        &self,
        key: &str,
        descriptor: &SdkDescriptor,
        versions: &[String],
    ) -> GenerationResult {
        let mut result = GenerationResult::default();
        let mut manager = CheckoutManager::new(self.git, self.options.retry, &self.work_dir);

        for version in versions {
            match self
                .generate_version(&mut manager, key, descriptor, version)
                .await
            {
                Ok(pages) => {
                    info!(sdk = key, version = %version, pages, "version complete");
                    result.record_success();
                },
                Err(e) => {
                    error!(sdk = key, version = %version, error = %e, "version failed");
                    result.record_failure(version);
                },
            }
        }

        manager.cleanup().await;
        result
    }

    /// Generate one version and return the number of pages published.
    #[instrument(skip(self, manager, key, descriptor, version), fields(sdk = key, version = version))]
    pub async fn generate_version(
        &self,
        manager: &mut CheckoutManager<'_, G>,
        key: &str,
        descriptor: &SdkDescriptor,
        version: &str,
    ) -> Result<usize> {
        let tag = descriptor.tag_for(version);
        let repo_dir = manager.acquire(key, &descriptor.repo, &tag).await?;

        let sdk_dir = locate_sdk_dir(&repo_dir, &descriptor.sdk_paths).ok_or_else(|| {
            Error::Generation(format!(
                "SDK path not found: {}",
                descriptor.sdk_paths.join(", ")
            ))
        })?;
        let output_dir = sdk_dir.join(GENERATED_DIR);
        remove_dir_if_exists(&output_dir).await?;

        let installed =
            install_dependencies(self.runner, &self.cache, &sdk_dir, descriptor.kind()).await?;
        let config = resolve_config(descriptor, version)?;
        let ctx = GeneratorContext {
            runner: self.runner,
            configs_dir: &self.options.configs_dir,
            python: installed.python,
            thresholds: self.options.thresholds,
        };
        let generated = run_generator(&ctx, &config, &sdk_dir).await?;

        if generated != output_dir {
            debug!(from = %generated.display(), "moving generator output to {GENERATED_DIR}");
            remove_dir_if_exists(&output_dir).await?;
            tokio::fs::rename(&generated, &output_dir).await?;
        }

        let report = normalize_output(&output_dir)?;
        if !report.collisions.is_empty() {
            warn!(
                collisions = report.collisions.len(),
                "flattening renamed colliding pages"
            );
        }

        let dest = layout::version_dir(&self.options.docs_dir, key, version);
        let pages = copy_to_docs(&output_dir, &dest)?;
        if pages == 0 {
            return Err(Error::Generation("No MDX files generated".to_string()));
        }
        Ok(pages)
    }
}

fn no_tags(key: &str, descriptor: &SdkDescriptor) -> Result<Vec<String>> {
    if descriptor.required {
        return Err(Error::NotFound(format!("no tags found for required SDK {key}")));
    }
    warn!(sdk = key, "no tags found, skipping");
    Ok(Vec::new())
}

async fn remove_dir_if_exists(dir: &Path) -> Result<()> {
    match tokio::fs::remove_dir_all(dir).await {
        Err(e) if e.kind() != std::io::ErrorKind::NotFound => Err(Error::Io(e)),
        _ => Ok(()),
    }
}

// ============================================================
// Tests
// ============================================================
