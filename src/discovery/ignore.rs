use std::collections::BTreeSet;
use std::io::ErrorKind;
use std::path::Path;

/// Project-local ignore file, one pattern per line.
pub const PROJECT_IGNORE_FILE: &str = ".lenscanignore";
/// VCS ignore file consumed with the same line format.
pub const VCS_IGNORE_FILE: &str = ".gitignore";

/// Build, dependency, cache and VCS-metadata directories nobody wants
/// scanned, plus common log output.
const DEFAULT_EXCLUDES: &[&str] = &[
    "node_modules",
    "target",
    "dist",
    "build",
    "out",
    "vendor",
    ".git",
    ".hg",
    ".svn",
    "__pycache__",
    ".venv",
    "venv",
    ".cache",
    ".next",
    ".nuxt",
    "coverage",
    ".nyc_output",
    "logs",
    "*.log",
    ".DS_Store",
];

/// Merge default excludes, the project ignore file, the VCS ignore file
/// and caller-supplied extras into one deduplicated pattern set.
///
/// Absent ignore files are not an error; an unreadable one is logged and
/// skipped. The result is a set, so duplicates across sources collapse
/// and ordering carries no meaning.
pub fn resolve_ignores(root: &Path, extra: &[String]) -> BTreeSet<String> {
    let mut patterns: BTreeSet<String> =
        DEFAULT_EXCLUDES.iter().map(|s| s.to_string()).collect();

    for name in [PROJECT_IGNORE_FILE, VCS_IGNORE_FILE] {
        patterns.extend(read_ignore_file(&root.join(name)));
    }

    patterns.extend(extra.iter().map(|p| p.trim().to_string()).filter(|p| !p.is_empty()));
    patterns
}

/// Read one line-oriented ignore file: blank lines and `#` comments
/// stripped, remaining lines returned verbatim.
fn read_ignore_file(path: &Path) -> Vec<String> {
    let content = match std::fs::read_to_string(path) {
        Ok(c) => c,
        Err(e) if e.kind() == ErrorKind::NotFound => return Vec::new(),
        Err(e) => {
            tracing::warn!(file = %path.display(), error = %e, "cannot read ignore file, skipping");
            return Vec::new();
        }
    };

    content
        .lines()
        .map(str::trim)
        .filter(|l| !l.is_empty() && !l.starts_with('#'))
        .map(str::to_string)
        .collect()
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::fs;

    #[test]
    fn defaults_present_without_ignore_files() {
        let dir = tempfile::tempdir().unwrap();
        let patterns = resolve_ignores(dir.path(), &[]);
        assert!(patterns.contains("node_modules"));
        assert!(patterns.contains(".git"));
        assert!(patterns.contains("*.log"));
    }

    #[test]
    fn merges_project_and_vcs_files_with_comments_stripped() {
        let dir = tempfile::tempdir().unwrap();
        fs::write(
            dir.path().join(PROJECT_IGNORE_FILE),
            "# generated artifacts\nartifacts/\n\nfixtures\n",
        )
        .unwrap();
        fs::write(dir.path().join(VCS_IGNORE_FILE), "dist\nfixtures\n").unwrap();

        let patterns = resolve_ignores(dir.path(), &["manual".into()]);
        assert!(patterns.contains("artifacts/"));
        assert!(patterns.contains("fixtures"));
        assert!(patterns.contains("manual"));
        assert!(!patterns.iter().any(|p| p.starts_with('#')));
    }

    #[test]
    fn duplicates_across_sources_collapse() {
        let dir = tempfile::tempdir().unwrap();
        fs::write(dir.path().join(VCS_IGNORE_FILE), "node_modules\nvendor\n").unwrap();

        let patterns = resolve_ignores(dir.path(), &["vendor".into()]);
        assert_eq!(patterns.iter().filter(|p| *p == "vendor").count(), 1);
        assert_eq!(patterns.iter().filter(|p| *p == "node_modules").count(), 1);
    }

    #[test]
    fn blank_extras_dropped() {
        let dir = tempfile::tempdir().unwrap();
        let with_blank = resolve_ignores(dir.path(), &["  ".into()]);
        let without = resolve_ignores(dir.path(), &[]);
        assert_eq!(with_blank, without);
    }
}
