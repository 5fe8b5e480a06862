//! Site navigation built from the published page tree.
//!
//! Navigation is never accumulated during generation. It is rebuilt from
//! whatever is on disk under `docs/sdk-reference`, so it always matches what
//! the site will actually serve.

use crate::layout::{self, DOCS_SDK_REF_PATH};
use crate::normalize::page_stems;
use crate::registry::SdkRegistry;
use crate::{Error, Result, version};
use serde::{Deserialize, Serialize};
use serde_json::{Value, json};
use std::collections::HashSet;
use std::path::Path;
use tracing::{debug, info, warn};

/// Name of the docs.json anchor owned by this tool.
pub const SDK_REFERENCE_ANCHOR: &str = "SDK Reference";

/// Icon written on the owned anchor.
pub const SDK_REFERENCE_ICON: &str = "brackets-curly";

/// One version's page group.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct NavigationVersion {
    /// `v`-prefixed version label.
    pub version: String,
    /// Whether this is the version shown first.
    pub default: bool,
    /// Site-relative page paths without extension, alphabetical.
    pub pages: Vec<String>,
}

/// One SDK's dropdown.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct NavigationDropdown {
    /// Display name.
    pub dropdown: String,
    /// Icon name.
    pub icon: String,
    /// Versions, newest first.
    pub versions: Vec<NavigationVersion>,
}

impl NavigationDropdown {
    /// Pages across every version.
    #[must_use]
    pub fn page_count(&self) -> usize {
        self.versions.iter().map(|v| v.pages.len()).sum()
    }
}

/// Scan the published tree under `docs_dir` into dropdowns, in registry order.
///
/// Versions without pages are left out, and so are SDKs left without
/// versions.
#[must_use]
pub fn build_navigation(docs_dir: &Path, registry: &SdkRegistry) -> Vec<NavigationDropdown> {
    let root = layout::sdk_reference_root(docs_dir);
    if !root.is_dir() {
        warn!(dir = %root.display(), "sdk reference directory not found");
        return Vec::new();
    }

    let mut dropdowns = Vec::new();
    for entry in registry.iter() {
        let sdk_dir = root.join(&entry.key);
        // `v1.0.0` sorts ahead of `1.0.0` so it wins the tie below.
        let mut dir_names = layout::version_dir_names(&sdk_dir);
        dir_names.sort_unstable_by(|a, b| b.cmp(a));

        let mut seen: HashSet<String> = HashSet::new();
        let mut versions: Vec<NavigationVersion> = Vec::new();
        for dir_name in version::sort_descending(&dir_names) {
            let normalized = version::normalize(&dir_name);
            if seen.contains(&normalized) {
                warn!(sdk = %entry.key, dir = %dir_name, "duplicate version directory ignored");
                continue;
            }
            let pages: Vec<String> = page_stems(&sdk_dir.join(&dir_name))
                .into_iter()
                .map(|stem| format!("{DOCS_SDK_REF_PATH}/{}/{dir_name}/{stem}", entry.key))
                .collect();
            if pages.is_empty() {
                debug!(sdk = %entry.key, version = %dir_name, "skipping version without pages");
                continue;
            }
            seen.insert(normalized.clone());
            versions.push(NavigationVersion {
                version: normalized,
                default: versions.is_empty(),
                pages,
            });
        }

        if versions.is_empty() {
            debug!(sdk = %entry.key, "no published versions");
            continue;
        }
        info!(sdk = %entry.key, versions = versions.len(), "found published versions");
        dropdowns.push(NavigationDropdown {
            dropdown: entry.descriptor.display_name.clone(),
            icon: entry.descriptor.icon.clone(),
            versions,
        });
    }
    dropdowns
}

/// Replace the owned anchor's dropdowns inside a docs.json document.
///
/// Returns `false` when `dropdowns` is empty and the document was left alone.
pub fn merge_into(doc: &mut Value, dropdowns: &[NavigationDropdown]) -> Result<bool> {
    let anchors = doc
        .get_mut("navigation")
        .and_then(|nav| nav.get_mut("anchors"))
        .and_then(Value::as_array_mut)
        .ok_or_else(|| Error::Config("docs.json has no navigation.anchors array".to_string()))?;

    if dropdowns.is_empty() {
        return Ok(false);
    }

    let anchor = json!({
        "anchor": SDK_REFERENCE_ANCHOR,
        "icon": SDK_REFERENCE_ICON,
        "dropdowns": serde_json::to_value(dropdowns)?,
    });
    match anchors
        .iter_mut()
        .find(|a| a.get("anchor").and_then(Value::as_str) == Some(SDK_REFERENCE_ANCHOR))
    {
        Some(existing) => *existing = anchor,
        None => anchors.push(anchor),
    }
    Ok(true)
}

/// Merge `dropdowns` into the docs.json at `path` and write it back.
///
/// Output uses 2-space indentation and ends with a newline. Other anchors
/// and key order are preserved.
pub fn merge_navigation(path: &Path, dropdowns: &[NavigationDropdown]) -> Result<bool> {
    if !path.is_file() {
        return Err(Error::NotFound(format!("docs.json not found at {}", path.display())));
    }
    let mut doc: Value = serde_json::from_str(&std::fs::read_to_string(path)?)?;

    if !merge_into(&mut doc, dropdowns)? {
        warn!("no SDK versions found, keeping existing docs.json");
        return Ok(false);
    }

    let mut rendered = serde_json::to_string_pretty(&doc)?;
    rendered.push('\n');
    std::fs::write(path, rendered)?;

    for dropdown in dropdowns {
        info!(
            sdk = %dropdown.dropdown,
            versions = dropdown.versions.len(),
            pages = dropdown.page_count(),
            "navigation updated"
        );
    }
    Ok(true)
}
