//! Turns raw generator output into a flat directory of site pages.
//!
//! Generators disagree on layout: TypeDoc nests pages per module, the CLI
//! exporter writes `.md`, the Python driver writes finished `.mdx`. After
//! [`normalize_output`] every page sits at the top level of one directory,
//! carries the site extension and starts with a front-matter block.
//!
//! Steps, in order:
//!
//! 1. Remove root index pages (`README`, `index`).
//! 2. Flatten nested pages. `dir/page.md` and `dir/index.md` become
//!    `dir.md`; anything else becomes `a-b-Name.md` for `a/b/Name.md`.
//! 3. Remove empty directories, deepest first.
//! 4. Convert `.md` pages to `.mdx` with a `sidebarTitle` front-matter.
//! 5. Add front-matter to `.mdx` pages that lack it.
//!
//! Two sources flattening to the same name are a collision. The later page
//! gets a numeric suffix and the collision is logged and reported, so no
//! page is silently lost.

use crate::layout::{SITE_EXTENSION, SOURCE_EXTENSION, is_site_page};
use crate::Result;
use regex::Regex;
use std::collections::BTreeSet;
use std::path::{Path, PathBuf};
use std::sync::OnceLock;
use tracing::{debug, info, warn};
use walkdir::WalkDir;

const ROOT_INDEX_STEMS: [&str; 2] = ["README", "index"];
const DIRECTORY_PAGE_STEMS: [&str; 2] = ["page", "index"];
const FRONTMATTER_MARKER: &str = "---";

/// Two nested pages that wanted the same flattened name.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Collision {
    /// Path of the later page, relative to the output directory.
    pub source: PathBuf,
    /// Name both pages mapped to.
    pub target: String,
    /// Name the later page was given instead.
    pub renamed_to: String,
}

/// What [`normalize_output`] did.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct NormalizeReport {
    /// Root index pages removed.
    pub removed: Vec<String>,
    /// Nested pages moved to the top level.
    pub flattened: usize,
    /// Flattening collisions.
    pub collisions: Vec<Collision>,
    /// Pages converted from the source extension.
    pub converted: usize,
    /// Site pages that needed front-matter added.
    pub frontmatter_added: usize,
}

fn prefix_pattern() -> &'static Regex {
    static RE: OnceLock<Regex> = OnceLock::new();
    #[allow(clippy::expect_used)]
    RE.get_or_init(|| Regex::new(r"^([a-z]+-)+(.+)$").expect("valid prefix regex"))
}

fn collision_suffix_pattern() -> &'static Regex {
    static RE: OnceLock<Regex> = OnceLock::new();
    #[allow(clippy::expect_used)]
    RE.get_or_init(|| Regex::new(r"^(.+)-\d+$").expect("valid suffix regex"))
}

/// Split on `_` and upper-case each word's first character only.
#[must_use]
pub fn title_case(name: &str) -> String {
    name.split('_')
        .map(|word| {
            let mut chars = word.chars();
            chars.next().map_or_else(String::new, |first| {
                first.to_uppercase().chain(chars).collect()
            })
        })
        .collect::<Vec<_>>()
        .join(" ")
}

/// Human-readable title for a page file stem.
///
/// Lowercase `word-` prefixes added by flattening are dropped first, so
/// `modules-sandbox_sync` reads as `Sandbox Sync`. A numeric collision
/// suffix is ignored: `a-b-c-2` titles like `a-b-c`.
#[must_use]
pub fn extract_title(stem: &str) -> String {
    let stem = collision_suffix_pattern()
        .captures(stem)
        .and_then(|caps| caps.get(1))
        .map_or(stem, |m| m.as_str());
    let remainder = prefix_pattern()
        .captures(stem)
        .and_then(|caps| caps.get(2))
        .map_or(stem, |m| m.as_str());
    title_case(remainder)
}

/// Front-matter block carrying `title` as the sidebar title.
#[must_use]
pub fn frontmatter(title: &str) -> String {
    let escaped = title.replace('\\', "\\\\").replace('"', "\\\"");
    format!("{FRONTMATTER_MARKER}\nsidebarTitle: \"{escaped}\"\n{FRONTMATTER_MARKER}\n\n")
}

/// Whether `content` already opens with a front-matter block.
#[must_use]
pub fn has_frontmatter(content: &str) -> bool {
    content.starts_with(FRONTMATTER_MARKER)
}

fn is_page(path: &Path) -> bool {
    path.extension()
        .is_some_and(|ext| ext == SOURCE_EXTENSION || ext == SITE_EXTENSION)
}

fn file_stem(path: &Path) -> String {
    path.file_stem()
        .map(|s| s.to_string_lossy().into_owned())
        .unwrap_or_default()
}

/// Flattened file name for a page nested at `relative`.
#[must_use]
pub fn flattened_name(relative: &Path) -> String {
    let ext = relative
        .extension()
        .map(|e| e.to_string_lossy().into_owned())
        .unwrap_or_else(|| SOURCE_EXTENSION.to_string());
    let stem = file_stem(relative);
    let dirs: Vec<String> = relative
        .parent()
        .map(|parent| {
            parent
                .components()
                .map(|c| c.as_os_str().to_string_lossy().into_owned())
                .collect()
        })
        .unwrap_or_default();

    if DIRECTORY_PAGE_STEMS.contains(&stem.as_str()) {
        if let Some(parent) = dirs.last() {
            return format!("{parent}.{ext}");
        }
    }
    if dirs.is_empty() {
        return format!("{stem}.{ext}");
    }
    format!("{}-{stem}.{ext}", dirs.join("-"))
}

/// First free `name`, `name-2`, `name-3`… in `dir`, honoring `taken`.
fn free_name(dir: &Path, name: &str, taken: &BTreeSet<String>) -> String {
    let path = Path::new(name);
    let stem = file_stem(path);
    let ext = path
        .extension()
        .map(|e| e.to_string_lossy().into_owned())
        .unwrap_or_default();
    (2..)
        .map(|n| format!("{stem}-{n}.{ext}"))
        .find(|candidate| !taken.contains(candidate) && !dir.join(candidate).exists())
        .unwrap_or_else(|| name.to_string())
}

fn remove_root_indexes(dir: &Path, report: &mut NormalizeReport) -> Result<()> {
    for stem in ROOT_INDEX_STEMS {
        for ext in [SOURCE_EXTENSION, SITE_EXTENSION] {
            let name = format!("{stem}.{ext}");
            let path = dir.join(&name);
            if path.is_file() {
                std::fs::remove_file(&path)?;
                debug!(file = %name, "removed root index page");
                report.removed.push(name);
            }
        }
    }
    Ok(())
}

fn flatten_nested(dir: &Path, report: &mut NormalizeReport) -> Result<()> {
    let nested: Vec<PathBuf> = WalkDir::new(dir)
        .min_depth(2)
        .sort_by_file_name()
        .into_iter()
        .filter_map(std::result::Result::ok)
        .filter(|entry| entry.file_type().is_file() && is_page(entry.path()))
        .map(walkdir::DirEntry::into_path)
        .collect();

    let mut taken: BTreeSet<String> = BTreeSet::new();
    for path in nested {
        let Ok(relative) = path.strip_prefix(dir) else {
            continue;
        };
        let relative = relative.to_path_buf();
        let target = flattened_name(&relative);
        let name = if taken.contains(&target) || dir.join(&target).exists() {
            let renamed = free_name(dir, &target, &taken);
            warn!(
                source = %relative.display(),
                target = %target,
                renamed = %renamed,
                "flattened page name collision"
            );
            report.collisions.push(Collision {
                source: relative.clone(),
                target,
                renamed_to: renamed.clone(),
            });
            renamed
        } else {
            target
        };
        std::fs::rename(&path, dir.join(&name))?;
        taken.insert(name);
        report.flattened += 1;
    }
    Ok(())
}

fn remove_empty_dirs(dir: &Path) -> Result<()> {
    let dirs: Vec<PathBuf> = WalkDir::new(dir)
        .min_depth(1)
        .contents_first(true)
        .into_iter()
        .filter_map(std::result::Result::ok)
        .filter(|entry| entry.file_type().is_dir())
        .map(walkdir::DirEntry::into_path)
        .collect();
    for sub in dirs {
        let empty = std::fs::read_dir(&sub).is_ok_and(|mut entries| entries.next().is_none());
        if empty {
            std::fs::remove_dir(&sub)?;
        }
    }
    Ok(())
}

fn top_level_files(dir: &Path, extension: &str) -> Result<Vec<PathBuf>> {
    let mut files: Vec<PathBuf> = std::fs::read_dir(dir)?
        .filter_map(std::result::Result::ok)
        .map(|entry| entry.path())
        .filter(|path| path.is_file() && path.extension().is_some_and(|ext| ext == extension))
        .collect();
    files.sort();
    Ok(files)
}

fn convert_sources(dir: &Path, report: &mut NormalizeReport) -> Result<()> {
    for source in top_level_files(dir, SOURCE_EXTENSION)? {
        let stem = file_stem(&source);
        let content = std::fs::read_to_string(&source)?;
        let body = if has_frontmatter(&content) {
            content
        } else {
            frontmatter(&extract_title(&stem)) + &content
        };

        let mut target = source.with_extension(SITE_EXTENSION);
        if target.exists() {
            let name = format!("{stem}.{SITE_EXTENSION}");
            let renamed = free_name(dir, &name, &BTreeSet::new());
            warn!(target = %name, renamed = %renamed, "converted page name collision");
            report.collisions.push(Collision {
                source: PathBuf::from(format!("{stem}.{SOURCE_EXTENSION}")),
                target: name,
                renamed_to: renamed.clone(),
            });
            target = dir.join(renamed);
        }
        std::fs::write(&target, body)?;
        std::fs::remove_file(&source)?;
        report.converted += 1;
    }
    Ok(())
}

fn ensure_frontmatter(dir: &Path, report: &mut NormalizeReport) -> Result<()> {
    for page in top_level_files(dir, SITE_EXTENSION)? {
        let content = std::fs::read_to_string(&page)?;
        if has_frontmatter(&content) {
            continue;
        }
        let title = extract_title(&file_stem(&page));
        std::fs::write(&page, frontmatter(&title) + &content)?;
        report.frontmatter_added += 1;
    }
    Ok(())
}

/// Normalize the generator output in `dir` in place.
pub fn normalize_output(dir: &Path) -> Result<NormalizeReport> {
    let mut report = NormalizeReport::default();
    remove_root_indexes(dir, &mut report)?;
    flatten_nested(dir, &mut report)?;
    remove_empty_dirs(dir)?;
    convert_sources(dir, &mut report)?;
    ensure_frontmatter(dir, &mut report)?;

    if !report.collisions.is_empty() {
        warn!(count = report.collisions.len(), "page name collisions were disambiguated");
    }
    debug!(
        flattened = report.flattened,
        converted = report.converted,
        frontmatter_added = report.frontmatter_added,
        "normalized generator output"
    );
    Ok(report)
}

/// Copy non-empty site pages from `src` into `dest`.
///
/// `dest` is emptied first so pages from an earlier run cannot linger. When
/// there is nothing to copy, `dest` is left alone and `0` is returned.
pub fn copy_to_docs(src: &Path, dest: &Path) -> Result<usize> {
    let pages: Vec<PathBuf> = top_level_files(src, SITE_EXTENSION)?
        .into_iter()
        .filter(|page| std::fs::metadata(page).is_ok_and(|meta| meta.len() > 0))
        .collect();
    if pages.is_empty() {
        return Ok(0);
    }

    if dest.exists() {
        std::fs::remove_dir_all(dest)?;
    }
    std::fs::create_dir_all(dest)?;
    for page in &pages {
        if let Some(name) = page.file_name() {
            std::fs::copy(page, dest.join(name))?;
        }
    }
    info!(pages = pages.len(), dest = %dest.display(), "copied pages");
    Ok(pages.len())
}

/// Site pages directly inside `dir`, as sorted file stems.
pub fn page_stems(dir: &Path) -> Vec<String> {
    let Ok(entries) = std::fs::read_dir(dir) else {
        return Vec::new();
    };
    let mut stems: Vec<String> = entries
        .filter_map(std::result::Result::ok)
        .map(|entry| entry.path())
        .filter(|path| path.is_file() && is_site_page(path))
        .map(|path| file_stem(&path))
        .collect();
    stems.sort();
    stems
}

#[cfg(test)]
#[allow(clippy::unwrap_used)]
mod tests {
    use super::*;
    use std::fs;
    use tempfile::TempDir;

    fn write(dir: &Path, relative: &str, content: &str) {
        let path = dir.join(relative);
        fs::create_dir_all(path.parent().unwrap()).unwrap();
        fs::write(path, content).unwrap();
    }

    #[test]
    fn test_extract_title() {
        assert_eq!(extract_title("modules-Sandbox"), "Sandbox");
        assert_eq!(extract_title("classes-MyClass"), "MyClass");
        assert_eq!(extract_title("sandbox_sync"), "Sandbox Sync");
        assert_eq!(extract_title("modules-sandbox_sync"), "Sandbox Sync");
        assert_eq!(extract_title("SANDBOX"), "SANDBOX");
        assert_eq!(extract_title(""), "");
        assert_eq!(extract_title("a-b-c-2"), "C");
        assert_eq!(extract_title("modules-Sandbox-3"), "Sandbox");
    }

    #[test]
    fn test_flattened_name() {
        assert_eq!(
            flattened_name(Path::new("modules/sandbox/Sandbox.md")),
            "modules-sandbox-Sandbox.md"
        );
        assert_eq!(flattened_name(Path::new("sandbox/page.md")), "sandbox.md");
        assert_eq!(flattened_name(Path::new("a/b/index.mdx")), "b.mdx");
    }

    #[test]
    fn test_nested_page_round_trip() {
        // Given: typical nested typedoc output
        let temp = TempDir::new().unwrap();
        let dir = temp.path();
        write(dir, "README.md", "readme");
        write(dir, "modules/sandbox/Sandbox.md", "# Sandbox\n");
        write(dir, "sandbox/page.md", "page body\n");

        // When
        let report = normalize_output(dir).unwrap();

        // Then
        assert_eq!(report.removed, vec!["README.md"]);
        assert_eq!(report.flattened, 2);
        assert!(report.collisions.is_empty());
        let page = fs::read_to_string(dir.join("modules-sandbox-Sandbox.mdx")).unwrap();
        assert!(page.starts_with("---\nsidebarTitle: \"Sandbox\"\n---\n\n# Sandbox"));
        assert!(dir.join("sandbox.mdx").is_file());
        assert!(!dir.join("modules").exists());
        assert!(!dir.join("sandbox").exists());
        assert!(!dir.join("README.md").exists());
    }

    #[test]
    fn test_frontmatter_is_never_duplicated() {
        let temp = TempDir::new().unwrap();
        let dir = temp.path();
        write(dir, "sandbox.mdx", "---\nsidebarTitle: \"Custom\"\n---\n\nbody");
        write(dir, "filesystem.md", "---\ntitle: x\n---\nbody");
        write(dir, "commands.mdx", "body");

        let report = normalize_output(dir).unwrap();

        for name in ["sandbox.mdx", "filesystem.mdx", "commands.mdx"] {
            let content = fs::read_to_string(dir.join(name)).unwrap();
            assert_eq!(content.matches("---").count(), 2, "{name}");
        }
        assert_eq!(report.frontmatter_added, 1);
        assert!(
            fs::read_to_string(dir.join("commands.mdx"))
                .unwrap()
                .contains("sidebarTitle: \"Commands\"")
        );
    }

    #[test]
    fn test_collisions_are_disambiguated() {
        // Given: `a/b-c.md` and `a-b/c.md` both flatten to `a-b-c.md`
        let temp = TempDir::new().unwrap();
        let dir = temp.path();
        write(dir, "a/b-c.md", "first");
        write(dir, "a-b/c.md", "second");

        let report = normalize_output(dir).unwrap();

        assert_eq!(report.collisions.len(), 1);
        let collision = &report.collisions[0];
        assert_eq!(collision.target, "a-b-c.md");
        assert_eq!(collision.renamed_to, "a-b-c-2.md");
        assert!(dir.join("a-b-c.mdx").is_file());
        assert!(dir.join("a-b-c-2.mdx").is_file());

        // And: the renamed page keeps a readable title
        let renamed = fs::read_to_string(dir.join("a-b-c-2.mdx")).unwrap();
        assert!(renamed.contains("sidebarTitle: \"C\""), "{renamed}");
    }

    #[test]
    fn test_copy_to_docs_replaces_destination() {
        let temp = TempDir::new().unwrap();
        let src = temp.path().join("src");
        let dest = temp.path().join("dest");
        write(&src, "a.mdx", "content");
        write(&src, "empty.mdx", "");
        write(&src, "notes.txt", "ignored");
        write(&dest, "stale.mdx", "old");

        let copied = copy_to_docs(&src, &dest).unwrap();

        assert_eq!(copied, 1);
        assert!(dest.join("a.mdx").is_file());
        assert!(!dest.join("empty.mdx").exists());
        assert!(!dest.join("stale.mdx").exists());
    }

    #[test]
    fn test_copy_with_nothing_leaves_destination() {
        let temp = TempDir::new().unwrap();
        let src = temp.path().join("src");
        let dest = temp.path().join("dest");
        write(&src, "empty.mdx", "");
        write(&dest, "kept.mdx", "old");

        assert_eq!(copy_to_docs(&src, &dest).unwrap(), 0);
        assert!(dest.join("kept.mdx").is_file());
    }

    #[test]
    fn test_page_stems_sorted() {
        let temp = TempDir::new().unwrap();
        write(temp.path(), "b.mdx", "x");
        write(temp.path(), "a.mdx", "x");
        write(temp.path(), "c.md", "x");
        assert_eq!(page_stems(temp.path()), vec!["a", "b"]);
    }
}
