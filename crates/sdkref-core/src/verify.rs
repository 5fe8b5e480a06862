//! Post-run checks over the published tree and docs.json.

use crate::layout;
use crate::navigation::SDK_REFERENCE_ANCHOR;
use crate::normalize::has_frontmatter;
use crate::version;
use serde::Serialize;
use serde_json::Value;
use std::path::Path;

/// Counts gathered while verifying.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct VerificationStats {
    /// Non-empty pages seen.
    pub total_pages: usize,
    /// SDK directories seen.
    pub total_sdks: usize,
    /// Version directories seen.
    pub total_versions: usize,
}

/// Findings of [`verify_generated_docs`].
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize)]
pub struct VerificationReport {
    /// Problems that make the output unpublishable.
    pub errors: Vec<String>,
    /// Suspicious but tolerable findings.
    pub warnings: Vec<String>,
    /// Counts.
    pub stats: VerificationStats,
}

impl VerificationReport {
    /// True when no errors were found.
    #[must_use]
    pub fn is_valid(&self) -> bool {
        self.errors.is_empty()
    }
}

fn sorted_subdirs(dir: &Path) -> Vec<String> {
    let Ok(entries) = std::fs::read_dir(dir) else {
        return Vec::new();
    };
    let mut names: Vec<String> = entries
        .filter_map(std::result::Result::ok)
        .filter(|e| e.path().is_dir())
        .filter_map(|e| e.file_name().into_string().ok())
        .collect();
    names.sort();
    names
}

/// Check every published page under `docs_dir`.
///
/// Empty pages and pages without front-matter are errors. A version
/// directory without pages is a warning.
#[must_use]
pub fn verify_generated_docs(docs_dir: &Path) -> VerificationReport {
    let mut report = VerificationReport::default();
    let root = layout::sdk_reference_root(docs_dir);
    if !root.is_dir() {
        report
            .errors
            .push("SDK reference directory does not exist".to_string());
        return report;
    }

    for sdk in sorted_subdirs(&root) {
        report.stats.total_sdks += 1;
        let sdk_dir = root.join(&sdk);
        for ver in sorted_subdirs(&sdk_dir) {
            if !version::is_valid(&ver) {
                continue;
            }
            report.stats.total_versions += 1;
            let version_dir = sdk_dir.join(&ver);
            let mut pages: Vec<_> = std::fs::read_dir(&version_dir)
                .map(|entries| {
                    entries
                        .filter_map(std::result::Result::ok)
                        .map(|e| e.path())
                        .filter(|p| p.is_file() && layout::is_site_page(p))
                        .collect()
                })
                .unwrap_or_default();
            pages.sort();

            if pages.is_empty() {
                report.warnings.push(format!("{sdk}/{ver} has no MDX files"));
                continue;
            }
            for page in pages {
                let name = page
                    .file_name()
                    .map(|n| n.to_string_lossy().into_owned())
                    .unwrap_or_default();
                let label = format!("{sdk}/{ver}/{name}");
                match std::fs::read_to_string(&page) {
                    Ok(content) if content.is_empty() => {
                        report.errors.push(format!("Empty file: {label}"));
                    },
                    Ok(content) => {
                        report.stats.total_pages += 1;
                        if !has_frontmatter(&content) {
                            report.errors.push(format!("Missing frontmatter: {label}"));
                        }
                    },
                    Err(e) => report.errors.push(format!("Unreadable file: {label}: {e}")),
                }
            }
        }
    }
    report
}

/// Problems with docs.json's owned anchor. Empty means valid.
#[must_use]
pub fn verify_docs_json(path: &Path) -> Vec<String> {
    let content = match std::fs::read_to_string(path) {
        Ok(content) => content,
        Err(e) => return vec![format!("docs.json not readable at {}: {e}", path.display())],
    };
    let doc: Value = match serde_json::from_str(&content) {
        Ok(doc) => doc,
        Err(e) => return vec![format!("Failed to parse docs.json: {e}")],
    };
    let Some(anchors) = doc
        .get("navigation")
        .and_then(|n| n.get("anchors"))
        .and_then(Value::as_array)
    else {
        return vec!["Invalid docs.json: navigation.anchors is not an array".to_string()];
    };
    let Some(anchor) = anchors
        .iter()
        .find(|a| a.get("anchor").and_then(Value::as_str) == Some(SDK_REFERENCE_ANCHOR))
    else {
        return vec![format!("{SDK_REFERENCE_ANCHOR} anchor not found in docs.json")];
    };
    if !anchor.get("dropdowns").is_some_and(Value::is_array) {
        return vec![format!("{SDK_REFERENCE_ANCHOR} anchor has no dropdowns array")];
    }
    Vec::new()
}
