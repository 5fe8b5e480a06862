//! Semantic version range expressions used by configuration overrides.
//!
//! Override ranges are written the way npm-style tooling writes them:
//! whitespace separates AND-ed comparators and `||` separates alternatives.
//!
//! | Expression          | Meaning                         |
//! |---------------------|---------------------------------|
//! | `1.0.0`             | exactly 1.0.0                   |
//! | `>=1.1.0 <2.3.0`    | both comparators must hold      |
//! | `~1.2.0`            | `>=1.2.0 <1.3.0`                |
//! | `^1.2.0`            | `>=1.2.0 <2.0.0`                |
//! | `<1.0.0 \|\| >=3.0.0` | either side                    |
//! | `*` or empty        | any version                     |
//!
//! Matching is delegated to [`semver::VersionReq`]. The only translation
//! needed is that a bare version means "exactly" here, while `semver` would
//! read it as a caret requirement.

use crate::{Error, Result, version};
use semver::{Version, VersionReq};
use std::fmt;

const OPERATOR_CHARS: &[char] = &['<', '>', '=', '~', '^'];

/// A parsed range expression.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct VersionRange {
    source: String,
    alternatives: Vec<VersionReq>,
}

impl VersionRange {
    /// Parse a range expression.
    ///
    /// # Errors
    ///
    /// Returns [`Error::Config`] when any comparator cannot be parsed.
    pub fn parse(expr: &str) -> Result<Self> {
        let alternatives = expr
            .split("||")
            .map(|alt| parse_conjunction(alt).map_err(|e| invalid(expr, &e)))
            .collect::<Result<Vec<_>>>()?;
        Ok(Self {
            source: expr.trim().to_string(),
            alternatives,
        })
    }

    /// The expression as written.
    #[must_use]
    pub fn as_str(&self) -> &str {
        &self.source
    }

    /// Whether `version` (optionally `v`-prefixed) satisfies the range.
    ///
    /// Unparseable versions never match.
    #[must_use]
    pub fn matches(&self, version: &str) -> bool {
        version::parse(version).is_some_and(|v| self.matches_version(&v))
    }

    /// Whether a parsed version satisfies the range.
    #[must_use]
    pub fn matches_version(&self, version: &Version) -> bool {
        self.alternatives.iter().any(|req| req.matches(version))
    }
}

impl fmt::Display for VersionRange {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.source)
    }
}

fn invalid(expr: &str, reason: &str) -> Error {
    Error::Config(format!("invalid version range '{expr}': {reason}"))
}

/// Convert one whitespace-separated conjunction into a `VersionReq`.
fn parse_conjunction(expr: &str) -> std::result::Result<VersionReq, String> {
    let mut comparators: Vec<String> = Vec::new();
    let mut pending_op: Option<&str> = None;

    for token in expr.split_whitespace() {
        if token == "*" || token.eq_ignore_ascii_case("x") {
            continue;
        }
        if token.chars().all(|c| OPERATOR_CHARS.contains(&c)) {
            // Detached operator as in `>= 1.0.0`
            if pending_op.replace(token).is_some() {
                return Err(format!("dangling operator before '{token}'"));
            }
            continue;
        }
        let (op, operand) = match pending_op.take() {
            Some(op) => (op, token),
            None => split_operator(token),
        };
        let operand = version::strip(operand);
        if operand.is_empty() {
            return Err(format!("missing version after '{op}'"));
        }
        let op = if op.is_empty() { "=" } else { op };
        comparators.push(format!("{op}{operand}"));
    }

    if let Some(op) = pending_op {
        return Err(format!("operator '{op}' has no version"));
    }
    if comparators.is_empty() {
        return Ok(VersionReq::STAR);
    }
    VersionReq::parse(&comparators.join(", ")).map_err(|e| e.to_string())
}

fn split_operator(token: &str) -> (&str, &str) {
    let split = token
        .find(|c: char| !OPERATOR_CHARS.contains(&c))
        .unwrap_or(token.len());
    token.split_at(split)
}
