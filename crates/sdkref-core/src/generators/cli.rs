//! Command tree export from the SDK's own CLI.
//!
//! The CLI is built from the checked-out sources and then asked to print its
//! commands as markdown. Depending on the CLI release, pages land in either
//! `sdk_ref/` or `sdk-ref/`.

use super::GeneratorContext;
use crate::layout::GENERATED_DIR;
use crate::process::{CommandRunner, CommandSpec, FallbackChain, run_checked};
use crate::{Error, Result};
use std::path::{Path, PathBuf};
use tracing::{debug, info};

/// Output directory names the exporter has used, preferred first.
pub const OUTPUT_DIRS: [&str; 2] = [GENERATED_DIR, "sdk-ref"];

/// Build commands for the CLI package.
#[must_use]
pub fn build_chain() -> FallbackChain {
    FallbackChain::new("build cli")
        .then(CommandSpec::new("pnpm").args(["run", "build"]))
        .then(CommandSpec::new("npx").arg("tsup"))
}

/// Invocation that makes the built CLI write its command reference.
#[must_use]
pub fn export_command() -> CommandSpec {
    CommandSpec::new("node")
        .args(["dist/index.js", "-cmd2md"])
        .env("NODE_ENV", "development")
}

fn has_files(dir: &Path) -> bool {
    std::fs::read_dir(dir).is_ok_and(|mut entries| {
        entries.any(|entry| entry.is_ok_and(|e| e.path().is_file()))
    })
}

/// First conventional output directory under `sdk_dir` holding any file.
#[must_use]
pub fn find_output_dir(sdk_dir: &Path) -> Option<PathBuf> {
    OUTPUT_DIRS
        .iter()
        .map(|name| sdk_dir.join(name))
        .find(|dir| has_files(dir))
}

pub(super) async fn generate<R: CommandRunner + ?Sized>(
    ctx: &GeneratorContext<'_, R>,
    sdk_dir: &Path,
) -> Result<PathBuf> {
    info!("building cli");
    let build = build_chain().run(ctx.runner, sdk_dir).await?;
    if build.used_fallback() {
        debug!("pnpm build failed, built with tsup");
    }

    tokio::fs::create_dir_all(sdk_dir.join(GENERATED_DIR)).await?;
    info!("exporting cli command reference");
    run_checked(ctx.runner, &export_command(), sdk_dir).await?;

    find_output_dir(sdk_dir).ok_or_else(|| {
        Error::Generation(format!(
            "cli export produced no pages in {}",
            OUTPUT_DIRS.join(" or ")
        ))
    })
}

#[cfg(test)]
#[allow(clippy::unwrap_used)]
mod tests {
    use super::*;
    use crate::generators::ContentThresholds;
    use crate::install::PythonToolchain;
    use crate::process::CommandOutput;
    use crate::process::testing::ScriptedRunner;
    use std::fs;
    use tempfile::TempDir;

    #[tokio::test]
    async fn test_build_falls_back_and_accepts_alternate_dir() {
        // Given: pnpm build fails and the exporter writes to sdk-ref/
        let temp = TempDir::new().unwrap();
        let runner = ScriptedRunner::with_hook(|spec, cwd| {
            match spec.program.as_str() {
                "pnpm" => return CommandOutput::failed(1, "no build script"),
                "node" => {
                    let dir = cwd.join("sdk-ref");
                    fs::create_dir_all(&dir).unwrap();
                    fs::write(dir.join("sandbox.md"), "## e2b sandbox").unwrap();
                },
                _ => {},
            }
            CommandOutput::ok("")
        });
        let ctx = GeneratorContext {
            runner: &runner,
            configs_dir: temp.path(),
            python: PythonToolchain::Poetry,
            thresholds: ContentThresholds::default(),
        };

        // When
        let out = generate(&ctx, temp.path()).await.unwrap();

        // Then
        assert_eq!(out, temp.path().join("sdk-ref"));
        assert_eq!(
            runner.commands(),
            vec!["pnpm run build", "npx tsup", "node dist/index.js -cmd2md"]
        );
    }

    #[tokio::test]
    async fn test_empty_export_is_an_error() {
        let temp = TempDir::new().unwrap();
        let runner = ScriptedRunner::new(vec![]);
        let ctx = GeneratorContext {
            runner: &runner,
            configs_dir: temp.path(),
            python: PythonToolchain::Poetry,
            thresholds: ContentThresholds::default(),
        };

        let err = generate(&ctx, temp.path()).await.unwrap_err();

        assert!(matches!(err, Error::Generation(_)));
    }

    #[test]
    fn test_export_command_sets_environment() {
        let spec = export_command();
        assert_eq!(
            spec.envs,
            vec![("NODE_ENV".to_string(), "development".to_string())]
        );
    }
}
