//! Typed-API extraction with TypeDoc and its markdown plugin.
//!
//! Checked-out repositories often ship their own TypeDoc configuration, which
//! would silently win over ours. Those files are deleted and a generated
//! configuration is written next to them instead.

use super::GeneratorContext;
use crate::layout::GENERATED_DIR;
use crate::process::{CommandRunner, CommandSpec, run_checked};
use crate::sdk::TypedocConfig;
use crate::Result;
use serde_json::{Map, Value, json};
use std::path::{Path, PathBuf};
use tracing::{debug, info};

/// File name of the synthesized configuration.
pub const GENERATED_CONFIG_NAME: &str = "typedoc.generated.json";

/// Markdown filter plugin expected in the configs directory.
pub const THEME_PLUGIN: &str = "typedoc-theme.cjs";

const REPO_CONFIG_FILES: [&str; 3] = ["typedoc.json", "typedoc.config.js", "typedoc.config.cjs"];

/// Fixed formatting options shared by every SDK.
#[must_use]
pub fn formatting_defaults() -> Map<String, Value> {
    let Value::Object(map) = json!({
        "out": GENERATED_DIR,
        "exclude": [
            "**/*.test.ts",
            "**/*.spec.ts",
            "**/__tests__/**",
            "**/node_modules/**",
        ],
        "excludeExternals": true,
        "excludeInternal": true,
        "excludePrivate": true,
        "excludeProtected": true,
        "outputFileStrategy": "modules",
        "readme": "none",
        "disableSources": true,
        "classPropertiesFormat": "table",
        "interfacePropertiesFormat": "table",
        "parametersFormat": "table",
        "enumMembersFormat": "table",
        "hidePageTitle": true,
        "hideBreadcrumbs": true,
    }) else {
        return Map::new();
    };
    map
}

/// Formatting defaults plus the per-version entry points and excludes.
#[must_use]
pub fn build_config(resolved: &TypedocConfig) -> Value {
    let mut config = formatting_defaults();
    config.insert("entryPoints".to_string(), json!(resolved.entry_points));
    if let Some(exclude) = &resolved.exclude {
        config.insert("exclude".to_string(), json!(exclude));
    }
    Value::Object(config)
}

/// Delete repository-provided TypeDoc configuration files.
pub async fn remove_repo_configs(sdk_dir: &Path) -> Result<()> {
    for name in REPO_CONFIG_FILES {
        let path = sdk_dir.join(name);
        if tokio::fs::try_exists(&path).await? {
            info!(file = name, "removing repository typedoc config");
            tokio::fs::remove_file(&path).await?;
        }
    }
    Ok(())
}

/// The TypeDoc invocation for a prepared SDK directory.
#[must_use]
pub fn command(configs_dir: &Path, theme_available: bool) -> CommandSpec {
    let mut spec = CommandSpec::new("npx").args([
        "typedoc".to_string(),
        "--options".to_string(),
        format!("./{GENERATED_CONFIG_NAME}"),
        "--plugin".to_string(),
        "typedoc-plugin-markdown".to_string(),
    ]);
    if theme_available {
        spec = spec
            .arg("--plugin")
            .arg(configs_dir.join(THEME_PLUGIN).to_string_lossy().into_owned());
    }
    spec
}

pub(super) async fn generate<R: CommandRunner + ?Sized>(
    ctx: &GeneratorContext<'_, R>,
    sdk_dir: &Path,
    config: &TypedocConfig,
) -> Result<PathBuf> {
    remove_repo_configs(sdk_dir).await?;

    let generated = serde_json::to_string_pretty(&build_config(config))?;
    tokio::fs::write(sdk_dir.join(GENERATED_CONFIG_NAME), generated).await?;

    let theme_available = ctx.configs_dir.join(THEME_PLUGIN).is_file();
    if !theme_available {
        debug!(configs_dir = %ctx.configs_dir.display(), "typedoc theme not found, using plain markdown output");
    }
    info!(entry_points = config.entry_points.len(), "running typedoc");
    run_checked(ctx.runner, &command(ctx.configs_dir, theme_available), sdk_dir).await?;

    Ok(sdk_dir.join(GENERATED_DIR))
}

#[cfg(test)]
#[allow(clippy::unwrap_used)]
mod tests {
    use super::*;
    use crate::generators::ContentThresholds;
    use crate::install::PythonToolchain;
    use crate::process::testing::ScriptedRunner;
    use std::fs;
    use tempfile::TempDir;

    #[test]
    fn test_formatting_defaults() {
        let defaults = formatting_defaults();
        assert_eq!(defaults["out"], "sdk_ref");
        for flag in [
            "excludeExternals",
            "excludeInternal",
            "excludePrivate",
            "excludeProtected",
            "disableSources",
            "hidePageTitle",
            "hideBreadcrumbs",
        ] {
            assert_eq!(defaults[flag], true, "{flag}");
        }
        assert_eq!(defaults["outputFileStrategy"], "modules");
        assert_eq!(defaults["readme"], "none");
        assert_eq!(defaults["classPropertiesFormat"], "table");
    }

    #[test]
    fn test_build_config_exclude_handling() {
        let without = build_config(&TypedocConfig {
            entry_points: vec!["src/index.ts".into()],
            exclude: None,
        });
        assert_eq!(without["entryPoints"], json!(["src/index.ts"]));
        assert_eq!(without["exclude"], formatting_defaults()["exclude"]);

        let with = build_config(&TypedocConfig {
            entry_points: vec!["src/index.ts".into()],
            exclude: Some(vec!["**/internal/**".into()]),
        });
        assert_eq!(with["exclude"], json!(["**/internal/**"]));
    }

    #[tokio::test]
    async fn test_generate_replaces_repo_configs() {
        // Given: a checkout carrying its own typedoc.json
        let temp = TempDir::new().unwrap();
        let sdk = temp.path().join("sdk");
        fs::create_dir_all(&sdk).unwrap();
        fs::write(sdk.join("typedoc.json"), "{}").unwrap();
        fs::write(sdk.join("typedoc.config.cjs"), "module.exports = {}").unwrap();
        let configs = temp.path().join("configs");
        fs::create_dir_all(&configs).unwrap();
        fs::write(configs.join(THEME_PLUGIN), "").unwrap();

        let runner = ScriptedRunner::new(vec![]);
        let ctx = GeneratorContext {
            runner: &runner,
            configs_dir: &configs,
            python: PythonToolchain::Poetry,
            thresholds: ContentThresholds::default(),
        };
        let config = TypedocConfig {
            entry_points: vec!["src/index.ts".into()],
            exclude: None,
        };

        // When
        let out = generate(&ctx, &sdk, &config).await.unwrap();

        // Then: repo configs are gone and ours governs the run
        assert_eq!(out, sdk.join("sdk_ref"));
        assert!(!sdk.join("typedoc.json").exists());
        assert!(!sdk.join("typedoc.config.cjs").exists());
        let written: Value =
            serde_json::from_str(&fs::read_to_string(sdk.join(GENERATED_CONFIG_NAME)).unwrap())
                .unwrap();
        assert_eq!(written["entryPoints"], json!(["src/index.ts"]));

        let commands = runner.commands();
        assert_eq!(commands.len(), 1);
        assert!(commands[0].starts_with(
            "npx typedoc --options ./typedoc.generated.json --plugin typedoc-plugin-markdown --plugin"
        ));
        assert!(commands[0].ends_with("typedoc-theme.cjs"));
    }

    #[test]
    fn test_command_without_theme() {
        let spec = command(Path::new("/configs"), false);
        assert_eq!(
            spec.to_string(),
            "npx typedoc --options ./typedoc.generated.json --plugin typedoc-plugin-markdown"
        );
    }
}
