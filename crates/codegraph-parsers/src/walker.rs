//! Repository file discovery.
//!
//! Walks the repo root honoring a static ignore list plus user-supplied
//! globs, classifies files by extension, and skips oversized files. The
//! output is deterministic: entries are sorted by relative path.

use std::path::{Path, PathBuf};

use globset::{Glob, GlobSet, GlobSetBuilder};
use ignore::WalkBuilder;

use crate::registry::language_for_extension;

/// Directory names never descended into.
const STATIC_IGNORES: &[&str] = &[
    ".git",
    "node_modules",
    "target",
    "__pycache__",
    "build",
    ".venv",
    "venv",
    "dist",
    ".idea",
    ".vscode",
];

/// One discovered source file.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct SourceFile {
    pub rel_path: PathBuf,
    pub abs_path: PathBuf,
    pub language: &'static str,
}

/// Discovery output: files, the directory set, and skip diagnostics.
#[derive(Debug, Default)]
pub struct Discovery {
    pub files: Vec<SourceFile>,
    /// Repo-relative directories encountered (root excluded), sorted.
    pub directories: Vec<PathBuf>,
    pub skipped: Vec<(PathBuf, String)>,
}

pub struct FileDiscoverer {
    root: PathBuf,
    max_file_size: u64,
    ignore_set: Option<GlobSet>,
    include_set: Option<GlobSet>,
}

fn build_globset(globs: &[String]) -> Option<GlobSet> {
    if globs.is_empty() {
        return None;
    }
    let mut builder = GlobSetBuilder::new();
    let mut any = false;
    for pattern in globs {
        match Glob::new(pattern) {
            Ok(g) => {
                builder.add(g);
                any = true;
            }
            Err(e) => {
                tracing::warn!(pattern = %pattern, error = %e, "invalid glob, ignored");
            }
        }
    }
    if !any {
        return None;
    }
    builder.build().ok()
}

impl FileDiscoverer {
    pub fn new(root: &Path) -> Self {
        Self {
            root: root.to_path_buf(),
            max_file_size: u64::MAX,
            ignore_set: None,
            include_set: None,
        }
    }

    pub fn with_max_file_size(mut self, bytes: u64) -> Self {
        self.max_file_size = bytes;
        self
    }

    /// User-supplied ignore globs, matched against repo-relative paths.
    pub fn with_ignore_globs(mut self, globs: &[String]) -> Self {
        self.ignore_set = build_globset(globs);
        self
    }

    /// Include filters (`--folder-filter`, `--file-pattern`). When present,
    /// only matching files are kept.
    pub fn with_include_globs(mut self, globs: &[String]) -> Self {
        self.include_set = build_globset(globs);
        self
    }

    /// Walks the root and returns the classified file list plus directories.
    pub fn discover(&self) -> Discovery {
        let mut out = Discovery::default();

        let walker = WalkBuilder::new(&self.root)
            .hidden(true)
            .git_ignore(true)
            .git_global(false)
            .git_exclude(true)
            .filter_entry(|entry| {
                let name = entry.file_name().to_string_lossy();
                !STATIC_IGNORES.contains(&name.as_ref())
            })
            .build();

        for result in walker {
            let entry = match result {
                Ok(e) => e,
                Err(_) => continue,
            };
            let path = entry.path().to_path_buf();
            let Ok(rel) = path.strip_prefix(&self.root) else {
                continue;
            };
            let rel = rel.to_path_buf();

            if entry.file_type().is_some_and(|ft| ft.is_dir()) {
                if !rel.as_os_str().is_empty() {
                    out.directories.push(rel);
                }
                continue;
            }
            if !entry.file_type().is_some_and(|ft| ft.is_file()) {
                continue;
            }
            if let Some(set) = &self.ignore_set {
                if set.is_match(&rel) {
                    continue;
                }
            }
            if let Some(set) = &self.include_set {
                if !set.is_match(&rel) {
                    continue;
                }
            }

            let Some(language) = rel
                .extension()
                .and_then(|e| e.to_str())
                .and_then(language_for_extension)
            else {
                continue;
            };

            if let Ok(meta) = entry.metadata() {
                if meta.len() > self.max_file_size {
                    out.skipped
                        .push((rel, "exceeds max_file_size".to_string()));
                    continue;
                }
            }

            out.files.push(SourceFile {
                rel_path: rel,
                abs_path: path,
                language,
            });
        }

        out.files.sort_by(|a, b| a.rel_path.cmp(&b.rel_path));
        out.directories.sort();
        out
    }
}
