//! Content-addressed marker store for dependency installs.
//!
//! Installing Python dependencies for every version is the slowest step of a
//! run. When the lockfile governing an SDK directory hashes to a value that
//! was already installed, the install is skipped.
//!
//! Markers live at `<root>/.deps-cache/<kind>-<sha256>/.installed`. A missing
//! or unreadable marker is always a miss.

use crate::Result;
use crate::sdk::GeneratorKind;
use sha2::{Digest, Sha256};
use std::path::{Path, PathBuf};
use tracing::debug;

const CACHE_DIR: &str = ".deps-cache";
const MARKER_FILE: &str = ".installed";

/// Lockfile names consulted for each generator kind, in priority order.
#[must_use]
pub const fn lockfiles_for(kind: GeneratorKind) -> &'static [&'static str] {
    match kind {
        GeneratorKind::Typedoc | GeneratorKind::Cli => &["pnpm-lock.yaml", "package-lock.json"],
        GeneratorKind::Pydoc => &["poetry.lock"],
    }
}

/// Nearest lockfile for `kind`, searching `start` and then its ancestors.
#[must_use]
pub fn find_lockfile(start: &Path, kind: GeneratorKind) -> Option<PathBuf> {
    start.ancestors().find_map(|dir| {
        lockfiles_for(kind)
            .iter()
            .map(|name| dir.join(name))
            .find(|candidate| candidate.is_file())
    })
}

/// Hex SHA-256 of the nearest lockfile for `kind`, if there is one.
pub fn hash_lockfile(start: &Path, kind: GeneratorKind) -> Result<Option<String>> {
    let Some(lockfile) = find_lockfile(start, kind) else {
        return Ok(None);
    };
    let content = std::fs::read(&lockfile)?;
    let digest = Sha256::digest(&content);
    debug!(lockfile = %lockfile.display(), "hashed lockfile");
    Ok(Some(format!("{digest:x}")))
}

/// Marker store rooted at a cache directory.
#[derive(Debug, Clone)]
pub struct DependencyCache {
    root: PathBuf,
}

impl DependencyCache {
    /// Store under `root/.deps-cache`.
    pub fn new(root: impl AsRef<Path>) -> Self {
        Self {
            root: root.as_ref().join(CACHE_DIR),
        }
    }

    fn marker(&self, kind: GeneratorKind, hash: &str) -> PathBuf {
        self.root.join(format!("{kind}-{hash}")).join(MARKER_FILE)
    }

    /// Whether dependencies for this lockfile hash were installed before.
    #[must_use]
    pub fn is_installed(&self, kind: GeneratorKind, hash: &str) -> bool {
        self.marker(kind, hash).is_file()
    }

    /// Record a successful install.
    pub fn mark_installed(&self, kind: GeneratorKind, hash: &str) -> Result<()> {
        let marker = self.marker(kind, hash);
        if let Some(parent) = marker.parent() {
            std::fs::create_dir_all(parent)?;
        }
        std::fs::write(&marker, hash)?;
        Ok(())
    }
}
