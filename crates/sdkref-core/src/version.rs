//! Semantic version helpers for release tags and output directories.
//!
//! Versions travel through the pipeline as plain strings because they come
//! from git tag names and directory listings. `v1.2.3` and `1.2.3` name the
//! same release; the `v`-prefixed form is what lands on disk.
//!
//! Nothing here fails on malformed input. Ordering falls back to string
//! comparison so a stray branch name never aborts a run.

use regex::Regex;
use semver::Version;
use std::cmp::Ordering;
use std::collections::HashSet;
use std::sync::OnceLock;

fn version_pattern() -> &'static Regex {
    static RE: OnceLock<Regex> = OnceLock::new();
    #[allow(clippy::expect_used)]
    RE.get_or_init(|| {
        Regex::new(r"^v?\d+\.\d+\.\d+(?:[-+][0-9A-Za-z.+-]*)?$").expect("valid version regex")
    })
}

/// Ensure a version carries the `v` prefix.
#[must_use]
pub fn normalize(version: &str) -> String {
    if version.starts_with('v') {
        version.to_string()
    } else {
        format!("v{version}")
    }
}

/// Remove a single leading `v`, if present.
#[must_use]
pub fn strip(version: &str) -> &str {
    version.strip_prefix('v').unwrap_or(version)
}

/// Whether `version` looks like `X.Y.Z`, optionally `v`-prefixed and with a
/// prerelease or build suffix.
///
/// Branch-like names (`main`, `latest`) and partial versions (`1.0`) are
/// rejected.
#[must_use]
pub fn is_valid(version: &str) -> bool {
    version_pattern().is_match(version)
}

/// Parse a possibly `v`-prefixed version.
#[must_use]
pub fn parse(version: &str) -> Option<Version> {
    Version::parse(strip(version)).ok()
}

/// Descending comparator used by [`sort_descending`].
///
/// Parseable versions order by semantic precedence, newest first, with
/// prereleases below their release. Unparseable entries sort after every
/// parseable one, in reverse lexicographic order. Keeping the two groups
/// apart makes this a total order.
#[must_use]
pub fn compare_descending(a: &str, b: &str) -> Ordering {
    match (parse(a), parse(b)) {
        (Some(va), Some(vb)) => vb.cmp(&va).then_with(|| b.cmp(a)),
        (Some(_), None) => Ordering::Less,
        (None, Some(_)) => Ordering::Greater,
        (None, None) => b.cmp(a),
    }
}

/// Sort versions newest first. Never fails.
#[must_use]
pub fn sort_descending<S: AsRef<str>>(versions: &[S]) -> Vec<String> {
    let mut sorted: Vec<String> = versions.iter().map(|v| v.as_ref().to_string()).collect();
    sorted.sort_by(|a, b| compare_descending(a, b));
    sorted
}

/// `a >= b` after stripping prefixes.
///
/// False when either side is not semver, so tokens like `next` never pass a
/// minimum-version floor.
#[must_use]
pub fn gte(a: &str, b: &str) -> bool {
    match (parse(a), parse(b)) {
        (Some(va), Some(vb)) => va >= vb,
        _ => false,
    }
}

/// Keep versions at or above `floor`; `None` keeps everything.
#[must_use]
pub fn filter_by_minimum(versions: &[String], floor: Option<&str>) -> Vec<String> {
    match floor {
        Some(min) => versions.iter().filter(|v| gte(v, min)).cloned().collect(),
        None => versions.to_vec(),
    }
}

/// Versions in `remote` that are missing from `local`, in `remote` order.
///
/// Prefixed and bare spellings of the same version are treated as equal.
#[must_use]
pub fn diff(remote: &[String], local: &[String]) -> Vec<String> {
    let present: HashSet<String> = local.iter().map(|v| normalize(v)).collect();
    remote
        .iter()
        .filter(|v| !present.contains(&normalize(v)))
        .cloned()
        .collect()
}
