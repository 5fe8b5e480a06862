//! # sdkref-core
//!
//! Core library for generating versioned SDK reference documentation.
//!
//! Tagged releases of several SDK repositories are checked out, run through
//! a language-appropriate documentation extractor, normalized into a flat
//! set of pages with front-matter, and published under
//! `docs/sdk-reference/<sdk>/<version>`. A navigation description is then
//! rebuilt from the published tree and merged into the site's `docs.json`.
//!
//! ## Architecture
//!
//! - **Versions**: [`version`] and [`range`] handle `v`-prefixed version
//!   strings, ordering, set difference and range matching
//! - **Descriptors**: [`sdk`], [`registry`] and [`resolver`] describe each SDK
//!   and pick the extractor configuration for a version
//! - **Acquisition**: [`git`] and [`checkout`] list tags, clone with retry and
//!   switch one shared working copy between tags
//! - **Generation**: [`install`], [`cache`] and [`generators`] prepare the
//!   tree and run `typedoc`, `pydoc-markdown` or the CLI exporter
//! - **Output**: [`normalize`], [`navigation`] and [`verify`] shape, index and
//!   check the published pages
//! - **Coordination**: [`orchestrator`] ties the above together per SDK
//!
//! ## Quick Start
//!
//! ```rust
//! use sdkref_core::{SdkRegistry, resolve_config, ResolvedConfig, Result};
//!
//! let registry = SdkRegistry::builtin();
//! let js = registry.get("js-sdk").expect("builtin js-sdk");
//!
//! assert_eq!(js.tag_for("v2.1.0"), "e2b@2.1.0");
//! match resolve_config(js, "v1.0.0")? {
//!     ResolvedConfig::Typedoc(config) => assert!(!config.entry_points.is_empty()),
//!     other => panic!("unexpected {other:?}"),
//! }
//! # Ok::<(), sdkref_core::Error>(())
//! ```
//!
//! ## Error Handling
//!
//! Operations return [`Result<T, Error>`]. Per-version failures are turned
//! into data by the orchestrator; only selection errors and failure-policy
//! aborts ([`Error::Aborted`]) escape an SDK batch.

/// Dependency install marker cache keyed by lockfile hash
pub mod cache;
/// Shared working copies per batch
pub mod checkout;
/// Layered generator settings
pub mod config;
/// Error types and result aliases
pub mod error;
/// Extractor drivers
pub mod generators;
/// Git collaborator and tag handling
pub mod git;
/// Dependency installation before generation
pub mod install;
/// Destination page tree layout
pub mod layout;
/// Site navigation from the published tree
pub mod navigation;
/// Generator output normalization
pub mod normalize;
/// Per-SDK generation pipeline
pub mod orchestrator;
/// External process execution
pub mod process;
/// Version range expressions
pub mod range;
/// Built-in and configured SDK descriptors
pub mod registry;
/// Version-specific configuration resolution
pub mod resolver;
/// SDK descriptors and generator configuration shapes
pub mod sdk;
/// Published output checks
pub mod verify;
/// Version string handling
pub mod version;

// Re-export commonly used types
pub use cache::DependencyCache;
pub use checkout::{CheckoutManager, locate_sdk_dir};
pub use config::{GenerationConfig, GeneratorSettings, PathsConfig};
pub use error::{Error, Result};
pub use generators::{ContentThresholds, GeneratorContext, run_generator};
pub use git::{Git, GitCli, RetryPolicy};
pub use navigation::{NavigationDropdown, NavigationVersion, build_navigation, merge_navigation};
pub use normalize::{NormalizeReport, normalize_output};
pub use orchestrator::{
    GenerationOptions, GenerationResult, Orchestrator, RunTotals, VersionSelector,
    apply_failure_policy,
};
pub use process::{CommandOutput, CommandRunner, CommandSpec, SystemRunner};
pub use range::VersionRange;
pub use registry::{SdkEntry, SdkRegistry};
pub use resolver::{ResolvedConfig, resolve_config};
pub use sdk::{GeneratorKind, GeneratorSpec, SdkDescriptor};
pub use verify::{VerificationReport, verify_docs_json, verify_generated_docs};
