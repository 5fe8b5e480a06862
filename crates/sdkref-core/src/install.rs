//! Dependency installation before running a generator.
//!
//! JavaScript SDKs try progressively looser installs. Python SDKs install
//! through poetry and, if that fails, fall back to a global install of the
//! extractor alone; in that case the extractor must then be run directly
//! instead of through `poetry run`.

use crate::cache::{DependencyCache, hash_lockfile};
use crate::process::{CommandRunner, CommandSpec, FallbackChain};
use crate::sdk::GeneratorKind;
use crate::Result;
use std::path::Path;
use tracing::{info, instrument, warn};

/// How the Python tooling should be invoked after installation.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum PythonToolchain {
    /// Run tools inside the project environment via `poetry run`.
    Poetry,
    /// Run globally installed tools directly.
    Global,
}

impl PythonToolchain {
    /// Wrap `program args…` for this toolchain.
    #[must_use]
    pub fn command(self, program: &str) -> CommandSpec {
        match self {
            Self::Poetry => CommandSpec::new("poetry").args(["run", program]),
            Self::Global => CommandSpec::new(program),
        }
    }

    /// The Python interpreter for this toolchain.
    #[must_use]
    pub fn python(self) -> CommandSpec {
        match self {
            Self::Poetry => self.command("python"),
            Self::Global => CommandSpec::new("python3"),
        }
    }
}

/// Result of an install step.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct InstallOutcome {
    /// Whether the install was skipped thanks to a cache marker.
    pub cached: bool,
    /// Toolchain to use for Python generators.
    pub python: PythonToolchain,
}

/// Fallback chain used for JavaScript-based kinds.
#[must_use]
pub fn node_install_chain(kind: GeneratorKind) -> FallbackChain {
    let ignore_scripts = kind == GeneratorKind::Typedoc;
    let pnpm = |extra: &[&str]| {
        let mut spec = CommandSpec::new("pnpm").arg("install");
        if ignore_scripts {
            spec = spec.arg("--ignore-scripts");
        }
        spec.arg("--prefer-offline").args(extra.iter().copied())
    };

    FallbackChain::new("install")
        .then(pnpm(&["--frozen-lockfile"]))
        .then(pnpm(&["--config.engine-strict=false"]))
        .then(CommandSpec::new("npm").args([
            "install",
            "--legacy-peer-deps",
            "--force",
            "--prefer-offline",
        ]))
}

/// Fallback chain used for Python SDKs.
#[must_use]
pub fn python_install_chain() -> FallbackChain {
    FallbackChain::new("install")
        .then(CommandSpec::new("poetry").args(["install", "--no-interaction"]))
        .then(CommandSpec::new("pip").args([
            "install",
            "--break-system-packages",
            "pydoc-markdown",
        ]))
}

/// Install dependencies needed to run the `kind` generator in `sdk_dir`.
///
/// Python installs consult `cache` first and record successful poetry
/// installs in it.
#[instrument(level = "debug", skip(runner, cache, sdk_dir), fields(sdk_dir = %sdk_dir.display()))]
pub async fn install_dependencies<R: CommandRunner + ?Sized>(
    runner: &R,
    cache: &DependencyCache,
    sdk_dir: &Path,
    kind: GeneratorKind,
) -> Result<InstallOutcome> {
    match kind {
        GeneratorKind::Typedoc | GeneratorKind::Cli => {
            info!(%kind, "installing node dependencies");
            node_install_chain(kind).run(runner, sdk_dir).await?;
            Ok(InstallOutcome {
                cached: false,
                python: PythonToolchain::Poetry,
            })
        },
        GeneratorKind::Pydoc => install_python(runner, cache, sdk_dir).await,
    }
}

async fn install_python<R: CommandRunner + ?Sized>(
    runner: &R,
    cache: &DependencyCache,
    sdk_dir: &Path,
) -> Result<InstallOutcome> {
    let hash = match hash_lockfile(sdk_dir, GeneratorKind::Pydoc) {
        Ok(hash) => hash,
        Err(e) => {
            warn!(error = %e, "could not hash lockfile, installing without cache");
            None
        },
    };

    if let Some(hash) = &hash {
        if cache.is_installed(GeneratorKind::Pydoc, hash) {
            info!(hash = %hash, "dependencies cached, skipping install");
            return Ok(InstallOutcome {
                cached: true,
                python: PythonToolchain::Poetry,
            });
        }
    }

    info!("installing python dependencies");
    let outcome = python_install_chain().run(runner, sdk_dir).await?;
    if outcome.used_fallback() {
        warn!("poetry install failed, using globally installed pydoc-markdown");
        return Ok(InstallOutcome {
            cached: false,
            python: PythonToolchain::Global,
        });
    }

    if let Some(hash) = &hash {
        if let Err(e) = cache.mark_installed(GeneratorKind::Pydoc, hash) {
            warn!(error = %e, "failed to write install marker");
        }
    }
    Ok(InstallOutcome {
        cached: false,
        python: PythonToolchain::Poetry,
    })
}

#[cfg(test)]
#[allow(clippy::unwrap_used)]
mod tests {
    use super::*;
    use crate::process::CommandOutput;
    use crate::process::testing::ScriptedRunner;
    use std::fs;
    use tempfile::TempDir;

    #[test]
    fn test_node_chain_order() {
        let typedoc: Vec<String> = node_install_chain(GeneratorKind::Typedoc)
            .attempts()
            .iter()
            .map(ToString::to_string)
            .collect();
        assert_eq!(
            typedoc,
            vec![
                "pnpm install --ignore-scripts --prefer-offline --frozen-lockfile",
                "pnpm install --ignore-scripts --prefer-offline --config.engine-strict=false",
                "npm install --legacy-peer-deps --force --prefer-offline",
            ]
        );

        let cli = node_install_chain(GeneratorKind::Cli);
        assert!(!cli.attempts()[0].args.contains(&"--ignore-scripts".to_string()));
    }

    #[tokio::test]
    async fn test_python_install_is_cached_by_lockfile() {
        // Given: an SDK with a poetry lockfile and an empty cache
        let temp = TempDir::new().unwrap();
        let sdk = temp.path().join("sdk");
        fs::create_dir_all(&sdk).unwrap();
        fs::write(sdk.join("poetry.lock"), "locked").unwrap();
        let cache = DependencyCache::new(temp.path().join("cache"));
        let runner = ScriptedRunner::new(vec![]);

        // When: installing twice
        let first = install_dependencies(&runner, &cache, &sdk, GeneratorKind::Pydoc)
            .await
            .unwrap();
        let second = install_dependencies(&runner, &cache, &sdk, GeneratorKind::Pydoc)
            .await
            .unwrap();

        // Then: only the first run invoked poetry
        assert!(!first.cached);
        assert!(second.cached);
        assert_eq!(runner.commands(), vec!["poetry install --no-interaction"]);
    }

    #[tokio::test]
    async fn test_python_fallback_switches_toolchain_and_skips_marker() {
        let temp = TempDir::new().unwrap();
        let sdk = temp.path().join("sdk");
        fs::create_dir_all(&sdk).unwrap();
        fs::write(sdk.join("poetry.lock"), "locked").unwrap();
        let cache = DependencyCache::new(temp.path().join("cache"));
        let runner = ScriptedRunner::new(vec![
            CommandOutput::failed(1, "poetry: command not found"),
            CommandOutput::ok(""),
        ]);

        let outcome = install_dependencies(&runner, &cache, &sdk, GeneratorKind::Pydoc)
            .await
            .unwrap();

        assert_eq!(outcome.python, PythonToolchain::Global);
        let hash = hash_lockfile(&sdk, GeneratorKind::Pydoc).unwrap().unwrap();
        assert!(!cache.is_installed(GeneratorKind::Pydoc, &hash));
    }

    #[tokio::test]
    async fn test_node_install_failure_propagates() {
        let temp = TempDir::new().unwrap();
        let cache = DependencyCache::new(temp.path());
        let runner = ScriptedRunner::new(vec![
            CommandOutput::failed(1, "a"),
            CommandOutput::failed(1, "b"),
            CommandOutput::failed(1, "c"),
        ]);

        let result = install_dependencies(&runner, &cache, temp.path(), GeneratorKind::Cli).await;

        assert!(result.is_err());
        assert_eq!(runner.commands().len(), 3);
    }

    #[test]
    fn test_toolchain_command() {
        assert_eq!(
            PythonToolchain::Poetry
                .command("pydoc-markdown")
                .arg("-p")
                .to_string(),
            "poetry run pydoc-markdown -p"
        );
        assert_eq!(
            PythonToolchain::Global.command("python").to_string(),
            "python"
        );
    }
}
