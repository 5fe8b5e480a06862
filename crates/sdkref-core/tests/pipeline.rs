//! End-to-end generation runs against in-memory git and process fakes.

#![allow(clippy::unwrap_used, clippy::panic)]

use async_trait::async_trait;
use sdkref_core::git::Git;
use sdkref_core::{
    CommandOutput, CommandRunner, CommandSpec, DependencyCache, Error, GenerationOptions,
    GeneratorSettings, Orchestrator, Result, RetryPolicy, RunTotals, VersionSelector,
    build_navigation, layout, merge_navigation, verify_docs_json, verify_generated_docs,
};
use std::collections::HashSet;
use std::fs;
use std::path::Path;
use std::sync::Mutex;
use std::time::Duration;
use tempfile::TempDir;

const SETTINGS: &str = r#"
[sdks.python-sdk]
display_name = "SDK (Python)"
icon = "python"
order = 2
repo = "https://example.com/e2b.git"
tag_pattern = "@e2b/python-sdk@"
sdk_paths = ["packages/python-sdk"]
min_version = "2.0.0"
tag_format = "@e2b/python-sdk@{version}"

[sdks.python-sdk.generator]
kind = "pydoc"
default_config = { allowed_packages = ["e2b.sandbox_sync"], strip_prefix = "e2b_" }

[sdks.cli]
display_name = "CLI"
icon = "terminal"
order = 1
repo = "https://example.com/e2b.git"
tag_pattern = "@e2b/cli@"
tag_format = "@e2b/cli@{version}"
sdk_paths = ["packages/cli"]
required = true

[sdks.cli.generator]
kind = "cli"
"#;

const LS_REMOTE: &str = "\
a1\trefs/tags/@e2b/python-sdk@1.9.0
a2\trefs/tags/@e2b/python-sdk@2.0.0
a3\trefs/tags/@e2b/python-sdk@2.1.0
a4\trefs/tags/@e2b/python-sdk@2.2.0
b1\trefs/tags/@e2b/cli@1.4.0
";

/// Git fake: every clone lays out both SDK directories.
#[derive(Default)]
struct FakeGit {
    missing_tags: HashSet<String>,
    clones: Mutex<Vec<String>>,
}

#[async_trait]
impl Git for FakeGit {
    async fn ls_remote_tags(&self, _repo: &str) -> Result<String> {
        Ok(LS_REMOTE.to_string())
    }

    async fn clone_tag(&self, _repo: &str, tag: &str, dest: &Path) -> Result<()> {
        self.clones.lock().unwrap().push(tag.to_string());
        if self.missing_tags.contains(tag) {
            return Err(Error::Git(format!(
                "fatal: Remote branch {tag} not found in upstream origin"
            )));
        }
        fs::create_dir_all(dest.join("packages/python-sdk")).unwrap();
        fs::create_dir_all(dest.join("packages/cli")).unwrap();
        fs::write(dest.join("packages/python-sdk/poetry.lock"), "lock").unwrap();
        Ok(())
    }

    async fn fetch_tag(&self, _repo_dir: &Path, tag: &str) -> Result<()> {
        if self.missing_tags.contains(tag) {
            return Err(Error::Git(format!("fatal: couldn't find remote ref {tag}")));
        }
        Ok(())
    }

    async fn checkout(&self, _repo_dir: &Path, _tag: &str) -> Result<()> {
        Ok(())
    }

    async fn clean(&self, _repo_dir: &Path) -> Result<()> {
        Ok(())
    }
}

/// Process fake emulating poetry, pydoc-markdown, pnpm and the CLI exporter.
#[derive(Default)]
struct FakeTools {
    calls: Mutex<Vec<String>>,
}

#[async_trait]
impl CommandRunner for FakeTools {
    async fn run(&self, spec: &CommandSpec, cwd: &Path) -> Result<CommandOutput> {
        self.calls.lock().unwrap().push(spec.to_string());
        let args: Vec<&str> = spec.args.iter().map(String::as_str).collect();

        if args.contains(&"-c") {
            return Ok(CommandOutput::failed(1, "No module named e2b"));
        }
        if args.contains(&"pydoc-markdown") {
            let package = args.last().copied().unwrap_or_default();
            return Ok(CommandOutput::ok(format!(
                "# {package}\n\n<a id=\"{package}\"></a>\n\n## Sandbox Objects\n\n#### kill\n\n{}",
                "Kill the sandbox and release every resource it holds. ".repeat(3)
            )));
        }
        if spec.program == "node" {
            let out = cwd.join("sdk_ref");
            fs::create_dir_all(&out).unwrap();
            fs::write(out.join("auth.md"), "## e2b auth login\n").unwrap();
            fs::write(out.join("sandbox.md"), "## e2b sandbox list\n").unwrap();
        }
        Ok(CommandOutput::ok(""))
    }
}

fn options(docs: &Path) -> GenerationOptions {
    GenerationOptions::new(docs, docs.join("configs")).with_retry(RetryPolicy {
        max_attempts: 2,
        backoff_step: Duration::ZERO,
    })
}

#[tokio::test]
async fn test_full_run_publishes_navigates_and_verifies() {
    // Given: two SDKs configured from TOML, one python version already on disk
    let temp = TempDir::new().unwrap();
    let docs = temp.path().join("docs");
    let existing = layout::version_dir(&docs, "python-sdk", "v2.0.0");
    fs::create_dir_all(&existing).unwrap();
    fs::write(existing.join("sandbox_sync.mdx"), "---\nsidebarTitle: \"Sandbox Sync\"\n---\n\nx").unwrap();
    fs::write(
        docs.join("docs.json"),
        r#"{"navigation":{"anchors":[{"anchor":"Documentation"},{"anchor":"SDK Reference","dropdowns":[]}]}}"#,
    )
    .unwrap();

    let settings = GeneratorSettings::from_toml_str(SETTINGS).unwrap();
    let registry = settings.registry().unwrap();
    let git = FakeGit::default();
    let tools = FakeTools::default();
    let orchestrator = Orchestrator::new(
        &git,
        &tools,
        DependencyCache::new(temp.path().join("cache")),
        temp.path().join("work"),
        options(&docs),
    );

    // When: every SDK is generated, then navigation is rebuilt
    let mut totals = RunTotals::default();
    for entry in registry.iter() {
        let result = orchestrator
            .generate_sdk(&entry.key, &entry.descriptor, &VersionSelector::All)
            .await
            .unwrap();
        totals.record(&entry.key, result);
    }
    let nav = build_navigation(&docs, &registry);
    assert!(merge_navigation(&docs.join("docs.json"), &nav).unwrap());

    // Then: only missing versions were generated, newest first
    assert_eq!(totals.generated(), 3);
    assert_eq!(totals.failed(), 0);
    assert_eq!(
        *git.clones.lock().unwrap(),
        vec!["@e2b/cli@1.4.0", "@e2b/python-sdk@2.2.0"]
    );

    let py = layout::version_dir(&docs, "python-sdk", "v2.2.0");
    let page = fs::read_to_string(py.join("sandbox_sync.mdx")).unwrap();
    assert!(page.starts_with("---\nsidebarTitle: \"Sandbox Sync\"\n---\n\n"));
    assert!(page.contains("## Sandbox\n"));
    assert!(page.contains("### kill"));

    let cli = layout::version_dir(&docs, "cli", "v1.4.0");
    assert!(cli.join("auth.mdx").is_file());
    assert!(cli.join("sandbox.mdx").is_file());

    // Navigation follows descriptor order and version order
    assert_eq!(nav.len(), 2);
    assert_eq!(nav[0].dropdown, "CLI");
    let versions: Vec<&str> = nav[1].versions.iter().map(|v| v.version.as_str()).collect();
    assert_eq!(versions, vec!["v2.2.0", "v2.1.0", "v2.0.0"]);

    let report = verify_generated_docs(&docs);
    assert!(report.is_valid(), "{:?}", report.errors);
    assert_eq!(report.stats.total_versions, 4);
    assert!(verify_docs_json(&docs.join("docs.json")).is_empty());

    // Shared checkouts are gone
    assert_eq!(fs::read_dir(temp.path().join("work")).unwrap().count(), 0);
}

#[tokio::test]
async fn test_second_run_is_idempotent() {
    let temp = TempDir::new().unwrap();
    let docs = temp.path().join("docs");
    let registry = GeneratorSettings::from_toml_str(SETTINGS)
        .unwrap()
        .registry()
        .unwrap();
    let descriptor = registry.get("cli").unwrap();
    let git = FakeGit::default();
    let tools = FakeTools::default();
    let orchestrator = Orchestrator::new(
        &git,
        &tools,
        DependencyCache::new(temp.path().join("cache")),
        temp.path().join("work"),
        options(&docs),
    );

    let first = orchestrator
        .generate_sdk("cli", descriptor, &VersionSelector::All)
        .await
        .unwrap();
    let second = orchestrator
        .generate_sdk("cli", descriptor, &VersionSelector::All)
        .await
        .unwrap();

    assert_eq!(first.generated, 1);
    assert_eq!(second.generated, 0);
    assert_eq!(git.clones.lock().unwrap().len(), 1);
}

#[tokio::test]
async fn test_required_sdk_with_missing_tag_aborts() {
    // Given: the only CLI tag cannot be cloned
    let temp = TempDir::new().unwrap();
    let docs = temp.path().join("docs");
    let registry = GeneratorSettings::from_toml_str(SETTINGS)
        .unwrap()
        .registry()
        .unwrap();
    let git = FakeGit {
        missing_tags: HashSet::from(["@e2b/cli@1.4.0".to_string()]),
        ..FakeGit::default()
    };
    let tools = FakeTools::default();
    let orchestrator = Orchestrator::new(
        &git,
        &tools,
        DependencyCache::new(temp.path().join("cache")),
        temp.path().join("work"),
        options(&docs),
    );

    // When
    let err = orchestrator
        .generate_sdk("cli", registry.get("cli").unwrap(), &VersionSelector::All)
        .await
        .unwrap_err();

    // Then: retried up to the policy, then aborted by the required policy
    assert_eq!(git.clones.lock().unwrap().len(), 2);
    match err {
        Error::Aborted {
            sdk,
            reason,
            failed_versions,
        } => {
            assert_eq!(sdk, "cli");
            assert_eq!(reason, "Required SDK has failures");
            assert_eq!(failed_versions, vec!["v1.4.0"]);
        },
        other => panic!("expected abort, got {other}"),
    }
    assert!(!layout::version_dir(&docs, "cli", "v1.4.0").exists());
}

#[tokio::test]
async fn test_optional_sdk_partial_failure_continues() {
    // Given: one of three python versions cannot be switched to
    let temp = TempDir::new().unwrap();
    let docs = temp.path().join("docs");
    let registry = GeneratorSettings::from_toml_str(SETTINGS)
        .unwrap()
        .registry()
        .unwrap();
    let git = FakeGit {
        missing_tags: HashSet::from(["@e2b/python-sdk@2.1.0".to_string()]),
        ..FakeGit::default()
    };
    let tools = FakeTools::default();
    let orchestrator = Orchestrator::new(
        &git,
        &tools,
        DependencyCache::new(temp.path().join("cache")),
        temp.path().join("work"),
        options(&docs),
    );

    // When
    let result = orchestrator
        .generate_sdk(
            "python-sdk",
            registry.get("python-sdk").unwrap(),
            &VersionSelector::All,
        )
        .await
        .unwrap();

    // Then
    assert_eq!(result.generated, 2);
    assert_eq!(result.failed_versions, vec!["v2.1.0"]);
    assert!(layout::version_exists(&docs, "python-sdk", "2.2.0"));
    assert!(layout::version_exists(&docs, "python-sdk", "2.0.0"));

    // The python lockfile was installed once and cached afterwards
    let installs = tools
        .calls
        .lock()
        .unwrap()
        .iter()
        .filter(|c| c.starts_with("poetry install"))
        .count();
    assert_eq!(installs, 1);
}
