//! Shared working copies for a batch of versions.
//!
//! Cloning a large monorepo once per version is slow, so a batch clones each
//! SDK once and then switches the same working copy from tag to tag. A
//! [`CheckoutManager`] is created per batch and owns every directory it
//! clones; [`CheckoutManager::cleanup`] removes them, and dropping the
//! manager removes anything still left behind.

use crate::git::{Git, RetryPolicy, checkout_tag, clone_at_tag};
use crate::{Error, Result};
use std::collections::HashMap;
use std::path::{Path, PathBuf};
use tracing::{debug, info, warn};

/// Owner of the working copies used by one batch.
pub struct CheckoutManager<'a, G: Git + ?Sized> {
    git: &'a G,
    policy: RetryPolicy,
    base_dir: PathBuf,
    checkouts: HashMap<String, PathBuf>,
}

impl<'a, G: Git + ?Sized> CheckoutManager<'a, G> {
    /// Manager that clones into subdirectories of `base_dir`.
    pub fn new(git: &'a G, policy: RetryPolicy, base_dir: impl Into<PathBuf>) -> Self {
        Self {
            git,
            policy,
            base_dir: base_dir.into(),
            checkouts: HashMap::new(),
        }
    }

    /// Working copy location for `key`.
    #[must_use]
    pub fn checkout_path(&self, key: &str) -> PathBuf {
        self.base_dir.join(format!("shared-{key}"))
    }

    /// Tracked working copy for `key`, if any.
    #[must_use]
    pub fn repo_dir(&self, key: &str) -> Option<&Path> {
        self.checkouts.get(key).map(PathBuf::as_path)
    }

    /// Clone `repo` at `tag` for `key` unless a working copy already exists.
    ///
    /// An existing working copy is returned as is, on whatever tag it holds.
    pub async fn get_or_clone(&mut self, key: &str, repo: &str, tag: &str) -> Result<PathBuf> {
        if let Some(existing) = self.checkouts.get(key) {
            debug!(sdk = key, "reusing shared checkout");
            return Ok(existing.clone());
        }
        let dest = self.checkout_path(key);
        info!(sdk = key, tag, "cloning repository");
        clone_at_tag(self.git, &self.policy, repo, tag, &dest).await?;
        self.checkouts.insert(key.to_string(), dest.clone());
        Ok(dest)
    }

    /// Switch the working copy of `key` to `tag`.
    ///
    /// # Errors
    ///
    /// Returns [`Error::CheckoutNotInitialized`] when `key` was never cloned.
    pub async fn switch_version(&mut self, key: &str, tag: &str) -> Result<PathBuf> {
        let dir = self
            .checkouts
            .get(key)
            .cloned()
            .ok_or_else(|| Error::CheckoutNotInitialized(key.to_string()))?;
        info!(sdk = key, tag, "switching shared checkout");
        checkout_tag(self.git, &dir, tag).await?;
        Ok(dir)
    }

    /// Clone on first use, switch tags afterwards.
    pub async fn acquire(&mut self, key: &str, repo: &str, tag: &str) -> Result<PathBuf> {
        if self.checkouts.contains_key(key) {
            self.switch_version(key, tag).await
        } else {
            self.get_or_clone(key, repo, tag).await
        }
    }

    /// Remove every tracked working copy and forget about it.
    pub async fn cleanup(&mut self) {
        for (key, dir) in self.checkouts.drain() {
            match tokio::fs::remove_dir_all(&dir).await {
                Ok(()) => debug!(sdk = %key, dir = %dir.display(), "removed checkout"),
                Err(e) if e.kind() == std::io::ErrorKind::NotFound => {},
                Err(e) => warn!(sdk = %key, error = %e, "failed to remove checkout"),
            }
        }
    }
}

/// SDK directory inside a checkout.
///
/// Candidates are tried in order and the first existing one wins. With no
/// candidates the checkout root is the SDK directory.
#[must_use]
pub fn locate_sdk_dir(repo_dir: &Path, sdk_paths: &[String]) -> Option<PathBuf> {
    if sdk_paths.is_empty() {
        return Some(repo_dir.to_path_buf());
    }
    sdk_paths
        .iter()
        .map(|candidate| repo_dir.join(candidate))
        .find(|dir| dir.is_dir())
}

/// Best-effort synchronous removal used when a manager is dropped.
///
/// Returns `false` when the directory could not be removed; an already
/// missing directory counts as removed.
fn remove_leftover(key: &str, dir: &Path) -> bool {
    match std::fs::remove_dir_all(dir) {
        Ok(()) => {
            debug!(sdk = %key, dir = %dir.display(), "removed leftover checkout");
            true
        },
        Err(e) if e.kind() == std::io::ErrorKind::NotFound => true,
        Err(e) => {
            warn!(sdk = %key, dir = %dir.display(), error = %e, "failed to remove leftover checkout");
            false
        },
    }
}

impl<G: Git + ?Sized> Drop for CheckoutManager<'_, G> {
    fn drop(&mut self) {
        for (key, dir) in self.checkouts.drain() {
            remove_leftover(&key, &dir);
        }
    }
}
