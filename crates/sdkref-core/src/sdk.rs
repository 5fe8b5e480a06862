//! SDK descriptors and generator configuration shapes.
//!
//! A descriptor says where an SDK lives, how its release tags are spelled and
//! which generator documents it. The generator is a tagged variant: each kind
//! carries its own default configuration and its own override shape, so an
//! override meant for one kind cannot be attached to another.
//!
//! ## TOML shape
//!
//! ```toml
//! [sdks.js-sdk]
//! display_name = "SDK (JavaScript)"
//! icon = "square-js"
//! order = 1
//! repo = "https://github.com/e2b-dev/e2b.git"
//! tag_pattern = "e2b@"
//! tag_format = "e2b@{version}"
//! sdk_paths = ["packages/js-sdk"]
//! required = true
//! min_version = "1.0.0"
//!
//! [sdks.js-sdk.generator]
//! kind = "typedoc"
//! default_config = { entry_points = ["src/index.ts"] }
//!
//! [[sdks.js-sdk.generator.overrides]]
//! range = ">=1.1.0 <2.3.0"
//! entry_points = ["src/sandbox/index.ts"]
//! ```

use crate::range::VersionRange;
use crate::{Error, Result, version};
use serde::{Deserialize, Serialize};
use std::collections::BTreeMap;
use std::fmt;

/// Placeholder substituted into [`SdkDescriptor::tag_format`].
pub const VERSION_PLACEHOLDER: &str = "{version}";

/// Which extractor documents an SDK.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum GeneratorKind {
    /// Typed-API extractor for TypeScript sources.
    Typedoc,
    /// Doc-comment extractor for Python packages.
    Pydoc,
    /// Command tree exporter built from the SDK's own CLI.
    Cli,
}

impl GeneratorKind {
    /// Stable lowercase name, used in cache keys and logs.
    #[must_use]
    pub const fn as_str(self) -> &'static str {
        match self {
            Self::Typedoc => "typedoc",
            Self::Pydoc => "pydoc",
            Self::Cli => "cli",
        }
    }
}

impl fmt::Display for GeneratorKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

/// Configuration for the typed-API extractor.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct TypedocConfig {
    /// Source files documented as modules, relative to the SDK directory.
    pub entry_points: Vec<String>,
    /// Exclude globs replacing the built-in exclusion list.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub exclude: Option<Vec<String>>,
}

/// Partial [`TypedocConfig`] applied by a version range.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct TypedocOverride {
    /// Replacement entry points.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub entry_points: Option<Vec<String>>,
    /// Replacement exclude globs.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub exclude: Option<Vec<String>>,
}

/// Configuration for the Python doc extractor.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct PydocConfig {
    /// Packages documented when discovery finds nothing.
    pub allowed_packages: Vec<String>,
    /// Parent package to list sub-packages of. `None` skips discovery.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub base_package: Option<String>,
    /// Prefix removed from page names (`e2b_` turns `e2b_desktop` into `desktop`).
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub strip_prefix: Option<String>,
    /// Extra `parent -> [submodule]` units documented after the main list.
    #[serde(default, skip_serializing_if = "BTreeMap::is_empty")]
    pub submodules: BTreeMap<String, Vec<String>>,
}

/// Partial [`PydocConfig`] applied by a version range.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct PydocOverride {
    /// Replacement fallback package list.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub allowed_packages: Option<Vec<String>>,
    /// Replacement discovery root.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub base_package: Option<String>,
    /// Replacement name prefix.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub strip_prefix: Option<String>,
    /// Replacement submodule map.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub submodules: Option<BTreeMap<String, Vec<String>>>,
}

/// A configuration that can be patched by a partial override.
///
/// Patches replace whole fields. Lists are never merged element-wise.
pub trait Overridable: Clone {
    /// Partial shape carried by an override.
    type Patch;

    /// Return `self` with every field present in `patch` replaced.
    #[must_use]
    fn patched(&self, patch: &Self::Patch) -> Self;
}

impl Overridable for TypedocConfig {
    type Patch = TypedocOverride;

    fn patched(&self, patch: &TypedocOverride) -> Self {
        Self {
            entry_points: patch
                .entry_points
                .clone()
                .unwrap_or_else(|| self.entry_points.clone()),
            exclude: patch.exclude.clone().or_else(|| self.exclude.clone()),
        }
    }
}

impl Overridable for PydocConfig {
    type Patch = PydocOverride;

    fn patched(&self, patch: &PydocOverride) -> Self {
        Self {
            allowed_packages: patch
                .allowed_packages
                .clone()
                .unwrap_or_else(|| self.allowed_packages.clone()),
            base_package: patch.base_package.clone().or_else(|| self.base_package.clone()),
            strip_prefix: patch.strip_prefix.clone().or_else(|| self.strip_prefix.clone()),
            submodules: patch
                .submodules
                .clone()
                .unwrap_or_else(|| self.submodules.clone()),
        }
    }
}

/// One `range -> partial config` pair.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ConfigOverride<P> {
    /// Range expression, see [`crate::range`].
    pub range: String,
    /// Fields replaced when the range matches.
    #[serde(flatten)]
    pub patch: P,
}

impl<P> ConfigOverride<P> {
    /// Create an override for `range`.
    pub fn new(range: &str, patch: P) -> Self {
        Self {
            range: range.to_string(),
            patch,
        }
    }
}

/// Generator selection plus its kind-specific configuration.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(tag = "kind", rename_all = "lowercase")]
pub enum GeneratorSpec {
    /// Typed-API extraction.
    Typedoc {
        /// Configuration used when no override matches.
        default_config: TypedocConfig,
        /// Overrides checked in declaration order.
        #[serde(default, skip_serializing_if = "Vec::is_empty")]
        overrides: Vec<ConfigOverride<TypedocOverride>>,
    },
    /// Python package extraction.
    Pydoc {
        /// Configuration used when no override matches.
        default_config: PydocConfig,
        /// Overrides checked in declaration order.
        #[serde(default, skip_serializing_if = "Vec::is_empty")]
        overrides: Vec<ConfigOverride<PydocOverride>>,
    },
    /// CLI command tree export. Takes no configuration.
    Cli,
}

impl GeneratorSpec {
    /// Typed-API generator without overrides.
    pub fn typedoc<S: AsRef<str>>(entry_points: &[S]) -> Self {
        Self::Typedoc {
            default_config: TypedocConfig {
                entry_points: to_strings(entry_points),
                exclude: None,
            },
            overrides: Vec::new(),
        }
    }

    /// Python generator without overrides.
    pub fn pydoc<S: AsRef<str>>(allowed_packages: &[S]) -> Self {
        Self::Pydoc {
            default_config: PydocConfig {
                allowed_packages: to_strings(allowed_packages),
                base_package: None,
                strip_prefix: None,
                submodules: BTreeMap::new(),
            },
            overrides: Vec::new(),
        }
    }

    /// The discriminant.
    #[must_use]
    pub const fn kind(&self) -> GeneratorKind {
        match self {
            Self::Typedoc { .. } => GeneratorKind::Typedoc,
            Self::Pydoc { .. } => GeneratorKind::Pydoc,
            Self::Cli => GeneratorKind::Cli,
        }
    }

    /// Range expressions of all overrides, in declaration order.
    #[must_use]
    pub fn override_ranges(&self) -> Vec<&str> {
        match self {
            Self::Typedoc { overrides, .. } => overrides.iter().map(|o| o.range.as_str()).collect(),
            Self::Pydoc { overrides, .. } => overrides.iter().map(|o| o.range.as_str()).collect(),
            Self::Cli => Vec::new(),
        }
    }
}

/// Static description of one trackable SDK.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct SdkDescriptor {
    /// Name shown in site navigation.
    pub display_name: String,
    /// Navigation icon name.
    pub icon: String,
    /// Ascending sort position in navigation and processing.
    pub order: u32,
    /// Git remote URL.
    pub repo: String,
    /// Substring identifying this SDK's tags (`e2b@`, `@e2b/cli@`).
    pub tag_pattern: String,
    /// Tag name template containing `{version}`.
    pub tag_format: String,
    /// Candidate SDK directories inside the checkout, first existing wins.
    /// Empty means the checkout root.
    #[serde(default)]
    pub sdk_paths: Vec<String>,
    /// Whether any failed version aborts the run.
    #[serde(default)]
    pub required: bool,
    /// Oldest version worth documenting.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub min_version: Option<String>,
    /// Generator and its configuration.
    pub generator: GeneratorSpec,
}

impl SdkDescriptor {
    /// Create an optional descriptor whose tag template is `<pattern>{version}`.
    pub fn new(
        display_name: &str,
        icon: &str,
        order: u32,
        repo: &str,
        tag_pattern: &str,
        generator: GeneratorSpec,
    ) -> Self {
        Self {
            display_name: display_name.to_string(),
            icon: icon.to_string(),
            order,
            repo: repo.to_string(),
            tag_pattern: tag_pattern.to_string(),
            tag_format: format!("{tag_pattern}{VERSION_PLACEHOLDER}"),
            sdk_paths: Vec::new(),
            required: false,
            min_version: None,
            generator,
        }
    }

    /// Set candidate SDK directories.
    #[must_use]
    pub fn with_sdk_paths<S: AsRef<str>>(mut self, paths: &[S]) -> Self {
        self.sdk_paths = to_strings(paths);
        self
    }

    /// Mark the SDK as required.
    #[must_use]
    pub const fn required(mut self) -> Self {
        self.required = true;
        self
    }

    /// Set the minimum documented version.
    #[must_use]
    pub fn with_min_version(mut self, min: &str) -> Self {
        self.min_version = Some(min.to_string());
        self
    }

    /// Override the tag template.
    #[must_use]
    pub fn with_tag_format(mut self, format: &str) -> Self {
        self.tag_format = format.to_string();
        self
    }

    /// Generator kind of this SDK.
    #[must_use]
    pub const fn kind(&self) -> GeneratorKind {
        self.generator.kind()
    }

    /// Git tag for `version`; the `v` prefix is dropped before substitution.
    #[must_use]
    pub fn tag_for(&self, version: &str) -> String {
        self.tag_format
            .replace(VERSION_PLACEHOLDER, version::strip(version))
    }

    /// Check internal consistency.
    ///
    /// # Errors
    ///
    /// Returns [`Error::Config`] naming `key` when the tag template lacks a
    /// placeholder, the minimum version is malformed, or an override range
    /// does not parse.
    pub fn validate(&self, key: &str) -> Result<()> {
        if !self.tag_format.contains(VERSION_PLACEHOLDER) {
            return Err(Error::Config(format!(
                "SDK '{key}': tag_format '{}' has no {VERSION_PLACEHOLDER} placeholder",
                self.tag_format
            )));
        }
        if self.tag_pattern.is_empty() {
            return Err(Error::Config(format!("SDK '{key}': tag_pattern is empty")));
        }
        if let Some(min) = &self.min_version {
            if version::parse(min).is_none() {
                return Err(Error::Config(format!(
                    "SDK '{key}': min_version '{min}' is not a semantic version"
                )));
            }
        }
        for range in self.generator.override_ranges() {
            VersionRange::parse(range)
                .map_err(|e| Error::Config(format!("SDK '{key}': {e}")))?;
        }
        Ok(())
    }
}

fn to_strings<S: AsRef<str>>(items: &[S]) -> Vec<String> {
    items.iter().map(|s| s.as_ref().to_string()).collect()
}
