use std::collections::BTreeSet;
use std::path::{Path, PathBuf};

use ignore::gitignore::{Gitignore, GitignoreBuilder};

use crate::error::{Result, ScanError};

/// Include pattern used when the caller supplies none.
pub const DEFAULT_INCLUDE: &str = "**/*";

/// Extensions kept by default: source files the lenses understand plus
/// the config formats the infrastructure lens audits.
pub const DEFAULT_EXTENSIONS: &[&str] = &[
    "js", "jsx", "ts", "tsx", "mjs", "cjs", "py", "java", "php", "rb", "go", "json", "yml",
    "yaml", "toml", "env", "sh", "tf", "html", "htm", "vue", "svelte", "xml", "properties",
    "cfg", "ini", "conf",
];

/// Crawl inputs besides the root and the resolved ignore set.
#[derive(Debug, Clone)]
pub struct CrawlOptions {
    pub include: Vec<String>,
    pub extensions: Vec<String>,
}

impl Default for CrawlOptions {
    fn default() -> Self {
        Self {
            include: vec![DEFAULT_INCLUDE.to_string()],
            extensions: DEFAULT_EXTENSIONS.iter().map(|s| s.to_string()).collect(),
        }
    }
}

/// Expand include globs under `root`, drop anything the ignore set
/// matches, filter by extension or special-case name, and keep regular
/// files only.
///
/// Every per-pattern and per-entry failure is downgraded to a warning;
/// the only hard error is a root that does not exist.
pub fn crawl(
    root: &Path,
    ignore_set: &BTreeSet<String>,
    options: &CrawlOptions,
) -> Result<Vec<PathBuf>> {
    if !root.exists() {
        return Err(ScanError::RootNotFound(root.to_path_buf()));
    }

    let matcher = build_ignore_matcher(root, ignore_set);

    // Union of all include-pattern expansions, deduplicated by path.
    let mut candidates: BTreeSet<PathBuf> = BTreeSet::new();
    for pattern in &options.include {
        let full = root.join(pattern);
        let expanded = match glob::glob(&full.to_string_lossy()) {
            Ok(paths) => paths,
            Err(e) => {
                tracing::warn!(pattern = %pattern, error = %e, "skipping invalid include pattern");
                continue;
            }
        };
        for entry in expanded {
            match entry {
                Ok(path) => {
                    candidates.insert(path);
                }
                Err(e) => {
                    tracing::warn!(pattern = %pattern, error = %e, "unreadable glob entry, skipping");
                }
            }
        }
    }

    let mut files = Vec::new();
    for path in candidates {
        let rel = path.strip_prefix(root).unwrap_or(&path);
        if matcher.matched_path_or_any_parents(rel, false).is_ignore() {
            continue;
        }
        if !keep_by_name(&path, &options.extensions) {
            continue;
        }
        match std::fs::symlink_metadata(&path) {
            Ok(md) if md.file_type().is_file() => files.push(path),
            Ok(_) => {
                tracing::warn!(path = %path.display(), "skipping non-regular file");
            }
            Err(e) => {
                tracing::warn!(path = %path.display(), error = %e, "cannot stat candidate, skipping");
            }
        }
    }

    Ok(files)
}

/// Compile the pattern set into one gitignore-style matcher rooted at
/// the scan root. A pattern that fails to compile is logged and dropped.
fn build_ignore_matcher(root: &Path, ignore_set: &BTreeSet<String>) -> Gitignore {
    let mut builder = GitignoreBuilder::new(root);
    for pattern in ignore_set {
        if let Err(e) = builder.add_line(None, pattern) {
            tracing::warn!(pattern = %pattern, error = %e, "skipping invalid ignore pattern");
        }
    }
    builder.build().unwrap_or_else(|e| {
        tracing::warn!(error = %e, "ignore matcher failed to build, continuing without excludes");
        Gitignore::empty()
    })
}

/// Extension allow-list plus the name rules: any "dockerfile" variant is
/// kept regardless of extension, as are ".env"-style files (which have no
/// extension the allow-list could see).
fn keep_by_name(path: &Path, extensions: &[String]) -> bool {
    let name = path
        .file_name()
        .map(|n| n.to_string_lossy().to_lowercase())
        .unwrap_or_default();

    if name.contains("dockerfile") || name.starts_with(".env") {
        return true;
    }

    path.extension()
        .and_then(|e| e.to_str())
        .map(|ext| {
            let ext = ext.to_lowercase();
            extensions.iter().any(|allowed| allowed.eq_ignore_ascii_case(&ext))
        })
        .unwrap_or(false)
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::discovery::resolve_ignores;
    use std::fs;

    fn touch(path: &Path) {
        if let Some(parent) = path.parent() {
            fs::create_dir_all(parent).unwrap();
        }
        fs::write(path, "x\n").unwrap();
    }

    fn names(files: &[PathBuf]) -> Vec<String> {
        let mut v: Vec<String> = files
            .iter()
            .map(|p| p.file_name().unwrap().to_string_lossy().into_owned())
            .collect();
        v.sort();
        v
    }

    #[test]
    fn finds_source_files_and_skips_unknown_extensions() {
        let dir = tempfile::tempdir().unwrap();
        touch(&dir.path().join("app.js"));
        touch(&dir.path().join("notes.txt"));
        touch(&dir.path().join("lib/util.py"));

        let ignores = resolve_ignores(dir.path(), &[]);
        let files = crawl(dir.path(), &ignores, &CrawlOptions::default()).unwrap();
        assert_eq!(names(&files), vec!["app.js", "util.py"]);
    }

    #[test]
    fn ignore_file_excludes_matching_subtree() {
        let dir = tempfile::tempdir().unwrap();
        touch(&dir.path().join("src/main.js"));
        touch(&dir.path().join("third_party/lib.js"));
        fs::write(dir.path().join(".lenscanignore"), "third_party/\n").unwrap();

        let ignores = resolve_ignores(dir.path(), &[]);
        let files = crawl(dir.path(), &ignores, &CrawlOptions::default()).unwrap();
        assert_eq!(names(&files), vec!["main.js"]);
    }

    #[test]
    fn default_excludes_hide_dependency_dirs() {
        let dir = tempfile::tempdir().unwrap();
        touch(&dir.path().join("index.ts"));
        touch(&dir.path().join("node_modules/dep/index.js"));
        touch(&dir.path().join("vendor/pkg/pkg.go"));

        let ignores = resolve_ignores(dir.path(), &[]);
        let files = crawl(dir.path(), &ignores, &CrawlOptions::default()).unwrap();
        assert_eq!(names(&files), vec!["index.ts"]);
    }

    #[test]
    fn dockerfile_and_env_kept_without_listed_extension() {
        let dir = tempfile::tempdir().unwrap();
        touch(&dir.path().join("Dockerfile"));
        touch(&dir.path().join("Dockerfile.prod"));
        touch(&dir.path().join(".env"));
        touch(&dir.path().join(".env.local"));

        let ignores = resolve_ignores(dir.path(), &[]);
        let files = crawl(dir.path(), &ignores, &CrawlOptions::default()).unwrap();
        assert_eq!(
            names(&files),
            vec![".env", ".env.local", "Dockerfile", "Dockerfile.prod"]
        );
    }

    #[test]
    fn directories_are_not_reported_as_files() {
        let dir = tempfile::tempdir().unwrap();
        fs::create_dir_all(dir.path().join("thing.js")).unwrap();
        touch(&dir.path().join("real.js"));

        let ignores = resolve_ignores(dir.path(), &[]);
        let files = crawl(dir.path(), &ignores, &CrawlOptions::default()).unwrap();
        assert_eq!(names(&files), vec!["real.js"]);
    }

    #[test]
    fn invalid_include_pattern_does_not_stop_others() {
        let dir = tempfile::tempdir().unwrap();
        touch(&dir.path().join("ok.js"));

        let ignores = resolve_ignores(dir.path(), &[]);
        let options = CrawlOptions {
            include: vec!["[".into(), "**/*.js".into()],
            ..CrawlOptions::default()
        };
        let files = crawl(dir.path(), &ignores, &options).unwrap();
        assert_eq!(names(&files), vec!["ok.js"]);
    }

    #[test]
    fn union_of_include_patterns_deduplicates() {
        let dir = tempfile::tempdir().unwrap();
        touch(&dir.path().join("one.py"));

        let ignores = resolve_ignores(dir.path(), &[]);
        let options = CrawlOptions {
            include: vec!["**/*.py".into(), "**/*".into()],
            ..CrawlOptions::default()
        };
        let files = crawl(dir.path(), &ignores, &options).unwrap();
        assert_eq!(names(&files), vec!["one.py"]);
    }

    #[test]
    fn missing_root_is_the_only_hard_error() {
        let err = crawl(
            Path::new("/definitely/not/a/real/root"),
            &BTreeSet::new(),
            &CrawlOptions::default(),
        )
        .unwrap_err();
        assert!(matches!(err, ScanError::RootNotFound(_)));
    }
}
