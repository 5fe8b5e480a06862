//! Per-version generator configuration.
//!
//! Overrides are scanned in declaration order and the first range that
//! admits the version wins, even when a later range is narrower. Descriptor
//! authors put the special cases first.

use crate::range::VersionRange;
use crate::sdk::{ConfigOverride, GeneratorSpec, Overridable, PydocConfig, SdkDescriptor, TypedocConfig};
use crate::{Result, version};
use tracing::debug;

/// A generator configuration resolved for one version.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum ResolvedConfig {
    /// Typed-API extractor configuration.
    Typedoc(TypedocConfig),
    /// Python extractor configuration.
    Pydoc(PydocConfig),
    /// CLI exporter, which takes no configuration.
    Cli,
}

/// Apply the first matching override to `defaults`.
///
/// The version's `v` prefix is ignored. With no match the defaults come back
/// unchanged.
///
/// # Errors
///
/// Returns [`crate::Error::Config`] when an override range does not parse.
pub fn resolve_overrides<C: Overridable>(
    defaults: &C,
    overrides: &[ConfigOverride<C::Patch>],
    version: &str,
) -> Result<C> {
    let bare = version::strip(version);
    for candidate in overrides {
        let range = VersionRange::parse(&candidate.range)?;
        if range.matches(bare) {
            debug!(version = bare, range = %range, "config override matched");
            return Ok(defaults.patched(&candidate.patch));
        }
    }
    Ok(defaults.clone())
}

/// Resolve the generator configuration of `descriptor` for `version`.
pub fn resolve_config(descriptor: &SdkDescriptor, version: &str) -> Result<ResolvedConfig> {
    match &descriptor.generator {
        GeneratorSpec::Typedoc {
            default_config,
            overrides,
        } => resolve_overrides(default_config, overrides, version).map(ResolvedConfig::Typedoc),
        GeneratorSpec::Pydoc {
            default_config,
            overrides,
        } => resolve_overrides(default_config, overrides, version).map(ResolvedConfig::Pydoc),
        GeneratorSpec::Cli => Ok(ResolvedConfig::Cli),
    }
}

#[cfg(test)]
#[allow(clippy::unwrap_used, clippy::panic)]
mod tests {
    use super::*;
    use crate::registry::SdkRegistry;
    use crate::sdk::TypedocOverride;

    fn entry_points(items: &[&str]) -> TypedocOverride {
        TypedocOverride {
            entry_points: Some(items.iter().map(ToString::to_string).collect()),
            exclude: None,
        }
    }

    fn defaults() -> TypedocConfig {
        TypedocConfig {
            entry_points: vec!["src/index.ts".into()],
            exclude: None,
        }
    }

    #[test]
    fn test_first_declared_range_wins() {
        // Given: overlapping ranges with the wider one declared second
        let overrides = vec![
            ConfigOverride::new(">=1.0.0 <1.5.0", entry_points(&["first.ts"])),
            ConfigOverride::new(">=1.0.0", entry_points(&["second.ts"])),
        ];

        // When: resolving a version both ranges admit
        let resolved = resolve_overrides(&defaults(), &overrides, "1.2.0").unwrap();

        // Then: the first declaration is used
        assert_eq!(resolved.entry_points, vec!["first.ts".to_string()]);

        let later = resolve_overrides(&defaults(), &overrides, "v1.6.0").unwrap();
        assert_eq!(later.entry_points, vec!["second.ts".to_string()]);
    }

    #[test]
    fn test_no_match_returns_defaults() {
        let overrides = vec![ConfigOverride::new("<1.0.0", entry_points(&["old.ts"]))];
        let resolved = resolve_overrides(&defaults(), &overrides, "2.0.0").unwrap();
        assert_eq!(resolved, defaults());
    }

    #[test]
    fn test_bad_range_is_an_error() {
        let overrides = vec![ConfigOverride::new(">=x.y", entry_points(&["a.ts"]))];
        assert!(resolve_overrides(&defaults(), &overrides, "1.0.0").is_err());
    }

    #[test]
    fn test_builtin_js_sdk_ranges() {
        let registry = SdkRegistry::builtin();
        let js = registry.get("js-sdk").unwrap();

        let ResolvedConfig::Typedoc(exact) = resolve_config(js, "v1.0.0").unwrap() else {
            panic!("js-sdk resolves to typedoc");
        };
        assert!(exact.entry_points.contains(&"src/sandbox/pty.ts".to_string()));
        assert_eq!(exact.entry_points.len(), 5);

        let ResolvedConfig::Typedoc(mid) = resolve_config(js, "2.2.0").unwrap() else {
            panic!("js-sdk resolves to typedoc");
        };
        assert!(mid.entry_points.contains(&"src/sandbox/commands/index.ts".to_string()));
        assert!(!mid.entry_points.contains(&"src/template/index.ts".to_string()));

        let ResolvedConfig::Typedoc(current) = resolve_config(js, "2.3.0").unwrap() else {
            panic!("js-sdk resolves to typedoc");
        };
        assert_eq!(current.entry_points.len(), 8);
    }

    #[test]
    fn test_builtin_python_sdk_ranges() {
        let registry = SdkRegistry::builtin();
        let py = registry.get("python-sdk").unwrap();

        let ResolvedConfig::Pydoc(old) = resolve_config(py, "1.5.0").unwrap() else {
            panic!("python-sdk resolves to pydoc");
        };
        assert_eq!(old.allowed_packages.len(), 3);
        // Untouched fields come from the defaults
        assert_eq!(old.base_package.as_deref(), Some("e2b"));

        let ResolvedConfig::Pydoc(new) = resolve_config(py, "2.1.0").unwrap() else {
            panic!("python-sdk resolves to pydoc");
        };
        assert_eq!(new.allowed_packages.len(), 8);
    }

    #[test]
    fn test_cli_has_no_config() {
        let registry = SdkRegistry::builtin();
        let cli = registry.get("cli").unwrap();
        assert_eq!(resolve_config(cli, "1.0.0").unwrap(), ResolvedConfig::Cli);
    }
}
