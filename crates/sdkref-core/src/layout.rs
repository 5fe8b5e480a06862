//! Destination page tree layout.
//!
//! Generated pages live under `<docs_dir>/docs/sdk-reference/<sdk>/<version>`
//! where `<version>` is the `v`-prefixed form. The helpers here are the only
//! place that knows this shape.

use crate::version;
use std::path::{Path, PathBuf};

/// Site-relative directory holding all SDK reference pages.
pub const DOCS_SDK_REF_PATH: &str = "docs/sdk-reference";

/// Directory name every generator's output is moved to inside the SDK tree.
pub const GENERATED_DIR: &str = "sdk_ref";

/// Extension of published pages.
pub const SITE_EXTENSION: &str = "mdx";

/// Extension most extractors emit.
pub const SOURCE_EXTENSION: &str = "md";

/// Root of the SDK reference tree inside the docs directory.
#[must_use]
pub fn sdk_reference_root(docs_dir: &Path) -> PathBuf {
    docs_dir.join(DOCS_SDK_REF_PATH)
}

/// Destination directory for one SDK version.
#[must_use]
pub fn version_dir(docs_dir: &Path, sdk_key: &str, version: &str) -> PathBuf {
    sdk_reference_root(docs_dir).join(sdk_key).join(version)
}

/// Whether `path` has the site page extension.
#[must_use]
pub fn is_site_page(path: &Path) -> bool {
    path.extension().is_some_and(|ext| ext == SITE_EXTENSION)
}

/// Whether `dir` contains at least one site page at its top level.
pub fn has_site_pages(dir: &Path) -> bool {
    std::fs::read_dir(dir).is_ok_and(|entries| {
        entries
            .filter_map(std::result::Result::ok)
            .any(|entry| is_site_page(&entry.path()))
    })
}

/// Valid version directory names under one SDK, unsorted.
pub(crate) fn version_dir_names(sdk_dir: &Path) -> Vec<String> {
    let Ok(entries) = std::fs::read_dir(sdk_dir) else {
        return Vec::new();
    };
    entries
        .filter_map(std::result::Result::ok)
        .filter(|entry| entry.path().is_dir())
        .filter_map(|entry| entry.file_name().into_string().ok())
        .filter(|name| version::is_valid(name))
        .collect()
}

/// Versions already published for `sdk_key`.
///
/// Only directories with a valid version name and at least one page count.
/// Results are `v`-prefixed and sorted newest first.
pub fn local_versions(docs_dir: &Path, sdk_key: &str) -> Vec<String> {
    let sdk_dir = sdk_reference_root(docs_dir).join(sdk_key);
    let published: Vec<String> = version_dir_names(&sdk_dir)
        .into_iter()
        .filter(|name| has_site_pages(&sdk_dir.join(name)))
        .map(|name| version::normalize(&name))
        .collect();
    let mut sorted = version::sort_descending(&published);
    sorted.dedup();
    sorted
}

/// Whether `version` is already published, under either spelling.
pub fn version_exists(docs_dir: &Path, sdk_key: &str, version: &str) -> bool {
    let sdk_dir = sdk_reference_root(docs_dir).join(sdk_key);
    let prefixed = version::normalize(version);
    let bare = version::strip(&prefixed).to_string();
    [prefixed, bare]
        .iter()
        .any(|name| has_site_pages(&sdk_dir.join(name)))
}
