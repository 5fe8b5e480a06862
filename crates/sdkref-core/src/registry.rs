//! The table of tracked SDKs.
//!
//! [`SdkRegistry::builtin`] carries the SDKs documented by default. A
//! settings file may replace it with its own `[sdks.<key>]` tables, see
//! [`crate::config`]. Entries are kept in ascending `order`, which is both
//! the processing order and the navigation order.

use crate::sdk::{
    ConfigOverride, GeneratorSpec, PydocConfig, PydocOverride, SdkDescriptor, TypedocConfig,
    TypedocOverride,
};
use crate::{Error, Result};
use std::collections::BTreeMap;

const E2B_REPO: &str = "https://github.com/e2b-dev/e2b.git";
const CODE_INTERPRETER_REPO: &str = "https://github.com/e2b-dev/code-interpreter.git";
const DESKTOP_REPO: &str = "https://github.com/e2b-dev/desktop.git";

/// A keyed descriptor.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct SdkEntry {
    /// Identifier used on the command line and in output paths.
    pub key: String,
    /// The descriptor itself.
    pub descriptor: SdkDescriptor,
}

/// Ordered set of SDK descriptors.
#[derive(Debug, Clone, Default)]
pub struct SdkRegistry {
    entries: Vec<SdkEntry>,
}

impl SdkRegistry {
    /// Build a registry from keyed descriptors, validating each one.
    ///
    /// # Errors
    ///
    /// Returns the first validation error, or [`Error::Config`] for duplicate
    /// keys.
    pub fn from_entries<I>(entries: I) -> Result<Self>
    where
        I: IntoIterator<Item = (String, SdkDescriptor)>,
    {
        let mut collected: Vec<SdkEntry> = Vec::new();
        for (key, descriptor) in entries {
            if collected.iter().any(|e| e.key == key) {
                return Err(Error::Config(format!("duplicate SDK key '{key}'")));
            }
            descriptor.validate(&key)?;
            collected.push(SdkEntry { key, descriptor });
        }
        collected.sort_by(|a, b| {
            a.descriptor
                .order
                .cmp(&b.descriptor.order)
                .then_with(|| a.key.cmp(&b.key))
        });
        Ok(Self { entries: collected })
    }

    /// Build a registry from a `key -> descriptor` map, as found in settings files.
    pub fn from_map(map: BTreeMap<String, SdkDescriptor>) -> Result<Self> {
        Self::from_entries(map)
    }

    /// Look up a descriptor by key.
    #[must_use]
    pub fn get(&self, key: &str) -> Option<&SdkDescriptor> {
        self.entries
            .iter()
            .find(|e| e.key == key)
            .map(|e| &e.descriptor)
    }

    /// Entries in ascending order.
    pub fn iter(&self) -> impl Iterator<Item = &SdkEntry> {
        self.entries.iter()
    }

    /// Keys in ascending order.
    #[must_use]
    pub fn keys(&self) -> Vec<&str> {
        self.entries.iter().map(|e| e.key.as_str()).collect()
    }

    /// Number of entries.
    #[must_use]
    pub fn len(&self) -> usize {
        self.entries.len()
    }

    /// Whether the registry is empty.
    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.entries.is_empty()
    }

    /// The default SDK table.
    #[must_use]
    pub fn builtin() -> Self {
        let js_entry_points = [
            "src/sandbox/index.ts",
            "src/sandbox/filesystem/index.ts",
            "src/sandbox/process/index.ts",
            "src/sandbox/commands/index.ts",
            "src/errors.ts",
            "src/template/index.ts",
            "src/template/readycmd.ts",
            "src/template/logger.ts",
        ];

        let js_sdk = SdkDescriptor::new(
            "SDK (JavaScript)",
            "square-js",
            1,
            E2B_REPO,
            "e2b@",
            GeneratorSpec::Typedoc {
                default_config: TypedocConfig {
                    entry_points: strings(&js_entry_points),
                    exclude: None,
                },
                overrides: vec![
                    ConfigOverride::new(
                        "1.0.0",
                        TypedocOverride {
                            entry_points: Some(strings(&[
                                "src/sandbox/index.ts",
                                "src/sandbox/filesystem/index.ts",
                                "src/sandbox/process/index.ts",
                                "src/sandbox/pty.ts",
                                "src/errors.ts",
                            ])),
                            exclude: None,
                        },
                    ),
                    ConfigOverride::new(
                        ">=1.1.0 <2.3.0",
                        TypedocOverride {
                            entry_points: Some(strings(&js_entry_points[..5])),
                            exclude: None,
                        },
                    ),
                ],
            },
        )
        .with_sdk_paths(&["packages/js-sdk"])
        .required()
        .with_min_version("1.0.0");

        let python_sdk = SdkDescriptor::new(
            "SDK (Python)",
            "python",
            2,
            E2B_REPO,
            "@e2b/python-sdk@",
            GeneratorSpec::Pydoc {
                default_config: PydocConfig {
                    allowed_packages: strings(&[
                        "e2b.sandbox_sync",
                        "e2b.sandbox_async",
                        "e2b.exceptions",
                        "e2b.template",
                        "e2b.template_sync",
                        "e2b.template_async",
                        "e2b.template.logger",
                        "e2b.template.readycmd",
                    ]),
                    base_package: Some("e2b".to_string()),
                    strip_prefix: Some("e2b_".to_string()),
                    submodules: BTreeMap::new(),
                },
                overrides: vec![ConfigOverride::new(
                    ">=1.0.0 <2.1.0",
                    PydocOverride {
                        allowed_packages: Some(strings(&[
                            "e2b.sandbox_sync",
                            "e2b.sandbox_async",
                            "e2b.exceptions",
                        ])),
                        ..PydocOverride::default()
                    },
                )],
            },
        )
        .with_sdk_paths(&["packages/python-sdk"])
        .required()
        .with_min_version("1.0.0");

        let code_interpreter_js = SdkDescriptor::new(
            "Code Interpreter SDK (JavaScript)",
            "square-js",
            3,
            CODE_INTERPRETER_REPO,
            "@e2b/code-interpreter@",
            GeneratorSpec::typedoc(&["src/index.ts"]),
        )
        .with_sdk_paths(&["js"])
        .with_min_version("1.0.0");

        let code_interpreter_python = SdkDescriptor::new(
            "Code Interpreter SDK (Python)",
            "python",
            4,
            CODE_INTERPRETER_REPO,
            "@e2b/code-interpreter-python@",
            python_package("e2b_code_interpreter"),
        )
        .with_sdk_paths(&["python"])
        .with_min_version("1.0.0");

        let desktop_js = SdkDescriptor::new(
            "Desktop SDK (JavaScript)",
            "square-js",
            5,
            DESKTOP_REPO,
            "@e2b/desktop@",
            GeneratorSpec::typedoc(&["src/index.ts"]),
        )
        .with_sdk_paths(&["packages/js-sdk"])
        .with_min_version("1.0.0");

        let desktop_python = SdkDescriptor::new(
            "Desktop SDK (Python)",
            "python",
            6,
            DESKTOP_REPO,
            "@e2b/desktop-python@",
            python_package("e2b_desktop"),
        )
        .with_sdk_paths(&["packages/python-sdk"])
        .with_min_version("1.0.0");

        let cli = SdkDescriptor::new(
            "CLI",
            "terminal",
            7,
            E2B_REPO,
            "@e2b/cli@",
            GeneratorSpec::Cli,
        )
        .with_sdk_paths(&["packages/cli"])
        .required()
        .with_min_version("1.0.0");

        let entries = vec![
            ("js-sdk", js_sdk),
            ("python-sdk", python_sdk),
            ("code-interpreter-js-sdk", code_interpreter_js),
            ("code-interpreter-python-sdk", code_interpreter_python),
            ("desktop-js-sdk", desktop_js),
            ("desktop-python-sdk", desktop_python),
            ("cli", cli),
        ];

        Self {
            entries: entries
                .into_iter()
                .map(|(key, descriptor)| SdkEntry {
                    key: key.to_string(),
                    descriptor,
                })
                .collect(),
        }
    }
}

fn python_package(package: &str) -> GeneratorSpec {
    GeneratorSpec::Pydoc {
        default_config: PydocConfig {
            allowed_packages: vec![package.to_string()],
            base_package: None,
            strip_prefix: Some("e2b_".to_string()),
            submodules: BTreeMap::new(),
        },
        overrides: Vec::new(),
    }
}

fn strings(items: &[&str]) -> Vec<String> {
    items.iter().map(|s| (*s).to_string()).collect()
}
