//! Generator settings.
//!
//! Settings are layered: built-in defaults, then an optional TOML file, then
//! environment variables. Command-line flags are applied on top by the
//! binary.
//!
//! ## Environment
//!
//! | Variable            | Effect                        |
//! |---------------------|-------------------------------|
//! | `SDKREF_CONFIG`     | settings file to load         |
//! | `SDKREF_DOCS_DIR`   | overrides `paths.docs_dir`    |
//! | `SDKREF_CACHE_DIR`  | overrides `paths.cache_dir`   |
//!
//! ## Example file
//!
//! ```toml
//! [paths]
//! docs_dir = "../docs"
//! configs_dir = "./configs"
//!
//! [generation]
//! min_raw_chars = 50
//! min_file_bytes = 100
//! clone_attempts = 3
//! backoff_step_ms = 1000
//! ```
//!
//! A `[sdks.<key>]` table (see [`crate::sdk`]) replaces the built-in SDK set
//! entirely.

use crate::generators::ContentThresholds;
use crate::git::RetryPolicy;
use crate::orchestrator::GenerationOptions;
use crate::registry::SdkRegistry;
use crate::sdk::SdkDescriptor;
use crate::{Error, Result};
use serde::{Deserialize, Serialize};
use std::collections::BTreeMap;
use std::path::{Path, PathBuf};
use std::time::Duration;
use tracing::debug;

/// Settings file location override.
pub const CONFIG_ENV: &str = "SDKREF_CONFIG";
/// Docs directory override.
pub const DOCS_DIR_ENV: &str = "SDKREF_DOCS_DIR";
/// Cache directory override.
pub const CACHE_DIR_ENV: &str = "SDKREF_CACHE_DIR";

/// Top-level settings.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct GeneratorSettings {
    /// Filesystem locations.
    #[serde(default)]
    pub paths: PathsConfig,
    /// Generation tuning.
    #[serde(default)]
    pub generation: GenerationConfig,
    /// SDK descriptors replacing the built-in set when non-empty.
    #[serde(default, skip_serializing_if = "BTreeMap::is_empty")]
    pub sdks: BTreeMap<String, SdkDescriptor>,
}

/// Filesystem locations.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct PathsConfig {
    /// Documentation site root.
    pub docs_dir: PathBuf,
    /// Shared generator assets.
    pub configs_dir: PathBuf,
    /// Root of the dependency install cache.
    pub cache_dir: PathBuf,
}

impl Default for PathsConfig {
    fn default() -> Self {
        Self {
            docs_dir: PathBuf::from("."),
            configs_dir: PathBuf::from("configs"),
            cache_dir: default_cache_dir(),
        }
    }
}

/// Generation tuning knobs.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct GenerationConfig {
    /// Python extractor output shorter than this is ignored.
    pub min_raw_chars: usize,
    /// Python pages smaller than this after cleanup are removed.
    pub min_file_bytes: u64,
    /// Clone attempts for missing tags.
    pub clone_attempts: u32,
    /// Linear backoff step between clone attempts.
    pub backoff_step_ms: u64,
    /// Newest-N limit when generating all versions.
    #[serde(skip_serializing_if = "Option::is_none")]
    pub limit: Option<usize>,
}

impl Default for GenerationConfig {
    fn default() -> Self {
        let thresholds = ContentThresholds::default();
        let retry = RetryPolicy::default();
        Self {
            min_raw_chars: thresholds.min_raw_chars,
            min_file_bytes: thresholds.min_file_bytes,
            clone_attempts: retry.max_attempts,
            backoff_step_ms: u64::try_from(retry.backoff_step.as_millis()).unwrap_or(1000),
            limit: None,
        }
    }
}

fn default_cache_dir() -> PathBuf {
    directories::ProjectDirs::from("dev", "e2b", "sdkref").map_or_else(
        || std::env::temp_dir().join("sdkref"),
        |dirs| dirs.cache_dir().to_path_buf(),
    )
}

impl GeneratorSettings {
    /// Parse settings from TOML text.
    pub fn from_toml_str(content: &str) -> Result<Self> {
        toml::from_str(content).map_err(|e| Error::Config(format!("Failed to parse config: {e}")))
    }

    /// Load settings using the process environment.
    ///
    /// `explicit` wins over `SDKREF_CONFIG`. With neither, defaults are used.
    pub fn load(explicit: Option<&Path>) -> Result<Self> {
        Self::load_with_env(explicit, |key| std::env::var(key).ok())
    }

    /// Load settings, reading environment variables through `env`.
    pub fn load_with_env<F>(explicit: Option<&Path>, env: F) -> Result<Self>
    where
        F: Fn(&str) -> Option<String>,
    {
        let path = explicit
            .map(Path::to_path_buf)
            .or_else(|| env(CONFIG_ENV).filter(|v| !v.is_empty()).map(PathBuf::from));

        let mut settings = match path {
            Some(path) => {
                let content = std::fs::read_to_string(&path).map_err(|e| {
                    Error::Config(format!("Failed to read config {}: {e}", path.display()))
                })?;
                debug!(path = %path.display(), "loaded settings file");
                Self::from_toml_str(&content)?
            },
            None => Self::default(),
        };
        settings.apply_env(env);
        Ok(settings)
    }

    /// Apply `SDKREF_DOCS_DIR` and `SDKREF_CACHE_DIR` overrides.
    pub fn apply_env<F>(&mut self, env: F)
    where
        F: Fn(&str) -> Option<String>,
    {
        if let Some(dir) = env(DOCS_DIR_ENV).filter(|v| !v.is_empty()) {
            self.paths.docs_dir = PathBuf::from(dir);
        }
        if let Some(dir) = env(CACHE_DIR_ENV).filter(|v| !v.is_empty()) {
            self.paths.cache_dir = PathBuf::from(dir);
        }
    }

    /// The SDK set: configured descriptors, or the built-in table.
    pub fn registry(&self) -> Result<SdkRegistry> {
        if self.sdks.is_empty() {
            Ok(SdkRegistry::builtin())
        } else {
            SdkRegistry::from_map(self.sdks.clone())
        }
    }

    /// Python extraction cutoffs.
    #[must_use]
    pub const fn thresholds(&self) -> ContentThresholds {
        ContentThresholds {
            min_raw_chars: self.generation.min_raw_chars,
            min_file_bytes: self.generation.min_file_bytes,
        }
    }

    /// Clone retry policy.
    #[must_use]
    pub const fn retry_policy(&self) -> RetryPolicy {
        RetryPolicy {
            max_attempts: self.generation.clone_attempts,
            backoff_step: Duration::from_millis(self.generation.backoff_step_ms),
        }
    }

    /// Orchestrator options derived from these settings.
    #[must_use]
    pub fn generation_options(&self) -> GenerationOptions {
        GenerationOptions::new(&self.paths.docs_dir, &self.paths.configs_dir)
            .with_limit(self.generation.limit)
            .with_thresholds(self.thresholds())
            .with_retry(self.retry_policy())
    }
}
