//! Qualified-name construction and normalization.
//!
//! Every entity is addressed by a dotted path rooted at the project name:
//! `<project>.<dir-or-pkg>….<module>[.<Class>][.<member>]`. Languages with
//! other native separators (`::`, `/`, `:`) are normalized to dots at parse
//! time; the original spelling survives only in display attributes.

use std::path::Path;

/// The internal qualified-name separator.
pub const SEP: char = '.';

/// Joins a child name onto a parent qualified name. Either side may be
/// empty (a root-level `__init__.py` collapses onto its parent).
pub fn join(parent: &str, name: &str) -> String {
    if parent.is_empty() {
        name.to_string()
    } else if name.is_empty() {
        parent.to_string()
    } else {
        format!("{parent}{SEP}{name}")
    }
}

/// Joins with an explicit separator. Lua colon-declared methods keep `:`
/// between class and method segment.
pub fn join_with(parent: &str, name: &str, sep: char) -> String {
    if parent.is_empty() {
        name.to_string()
    } else if name.is_empty() {
        parent.to_string()
    } else {
        format!("{parent}{sep}{name}")
    }
}

/// Normalizes native separators (`::`, `/`) to dots.
pub fn normalize_separators(raw: &str) -> String {
    raw.replace("::", ".").replace('/', ".")
}

/// Synthetic name for anonymous classes/functions/IIFEs, derived from the
/// source position so qualified names stay stable under identical input.
pub fn anon_name(line: u32, col: u32) -> String {
    format!("<anon@{line}:{col}>")
}

/// Converts a repo-relative path into its dotted form, stripping the
/// extension: `storage/Storage.lua` → `storage.Storage`.
pub fn dotted_path(rel: &Path) -> String {
    let no_ext = rel.with_extension("");
    no_ext
        .components()
        .map(|c| c.as_os_str().to_string_lossy().to_string())
        .collect::<Vec<_>>()
        .join(".")
}

/// First segment of a qualified or dotted name.
pub fn root(qn: &str) -> &str {
    qn.split(SEP).next().unwrap_or(qn)
}

/// Last segment of a qualified name. Splits on the internal separator only,
/// so a Lua `Class:method` tail stays intact.
pub fn last_segment(qn: &str) -> &str {
    qn.rsplit(SEP).next().unwrap_or(qn)
}

/// Everything before the last segment, or `None` for a single-segment name.
pub fn parent(qn: &str) -> Option<&str> {
    qn.rfind(SEP).map(|idx| &qn[..idx])
}

/// Truncates a dotted path to its first `n` segments.
pub fn truncate_segments(qn: &str, n: usize) -> String {
    qn.split(SEP).take(n).collect::<Vec<_>>().join(".")
}
