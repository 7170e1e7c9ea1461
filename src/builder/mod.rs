//! Builder — the generate → validate → repair pipeline over project files.
//!
//! DESIGN
//! ======
//! Model replies are parsed into [`FileUpdate`]s ([`parser`]), checked against
//! a fixed catalogue of local defect patterns ([`validator`]) and, where a
//! defect is mechanical, rewritten without another model call ([`repair`]).
//! Updates are full-content replacements merged into a [`ProjectFileSet`] by
//! path; nothing here performs I/O.

pub mod parser;
pub mod repair;
pub mod validator;

use std::collections::BTreeMap;

use serde::{Deserialize, Serialize};

// =============================================================================
// PATHS
// =============================================================================

/// Normalize a project path: trim, drop wrapping quotes/backticks and a
/// leading `./`, force a single leading slash. Returns `None` for empty input.
#[must_use]
pub fn normalize_path(raw: &str) -> Option<String> {
    let trimmed = raw
        .trim()
        .trim_matches(|c| c == '`' || c == '"' || c == '\'')
        .trim();
    let stripped = trimmed.strip_prefix("./").unwrap_or(trimmed);
    let body = stripped.trim_start_matches('/');
    if body.is_empty() {
        return None;
    }
    Some(format!("/{body}"))
}

/// `.tsx` / `.jsx` — files that hold components and markup.
#[must_use]
pub fn is_component_file(path: &str) -> bool {
    path.ends_with(".tsx") || path.ends_with(".jsx")
}

/// Any file the script rules apply to. Declaration files are skipped.
#[must_use]
pub fn is_script_file(path: &str) -> bool {
    if path.ends_with(".d.ts") {
        return false;
    }
    is_component_file(path) || path.ends_with(".ts") || path.ends_with(".js")
}

// =============================================================================
// FILE UPDATE
// =============================================================================

/// One full-content file write produced by a turn.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct FileUpdate {
    pub path: String,
    pub content: String,
}

impl FileUpdate {
    #[must_use]
    pub fn new(path: impl Into<String>, content: impl Into<String>) -> Self {
        Self { path: path.into(), content: content.into() }
    }
}

// =============================================================================
// PROJECT FILE SET
// =============================================================================

/// The project: normalized path → file content. Last write wins.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(from = "BTreeMap<String, String>", into = "BTreeMap<String, String>")]
pub struct ProjectFileSet {
    files: BTreeMap<String, String>,
}

impl From<BTreeMap<String, String>> for ProjectFileSet {
    fn from(raw: BTreeMap<String, String>) -> Self {
        let mut set = Self::default();
        for (path, content) in raw {
            set.insert(&path, content);
        }
        set
    }
}

impl From<ProjectFileSet> for BTreeMap<String, String> {
    fn from(set: ProjectFileSet) -> Self {
        set.files
    }
}

impl ProjectFileSet {
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    /// Insert or replace a file. Paths that normalize to nothing are ignored.
    pub fn insert(&mut self, path: &str, content: impl Into<String>) {
        if let Some(path) = normalize_path(path) {
            self.files.insert(path, content.into());
        }
    }

    #[must_use]
    pub fn get(&self, path: &str) -> Option<&str> {
        let path = normalize_path(path)?;
        self.files.get(&path).map(String::as_str)
    }

    #[must_use]
    pub fn contains(&self, path: &str) -> bool {
        self.get(path).is_some()
    }

    #[must_use]
    pub fn len(&self) -> usize {
        self.files.len()
    }

    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.files.is_empty()
    }

    /// Files in path order.
    pub fn iter(&self) -> impl Iterator<Item = (&str, &str)> {
        self.files.iter().map(|(p, c)| (p.as_str(), c.as_str()))
    }

    pub fn paths(&self) -> impl Iterator<Item = &str> {
        self.files.keys().map(String::as_str)
    }

    /// Return a copy of this set with `updates` merged in, in order.
    #[must_use]
    pub fn with_updates(&self, updates: &[FileUpdate]) -> Self {
        let mut next = self.clone();
        for update in updates {
            next.insert(&update.path, update.content.clone());
        }
        next
    }

    /// Every file as a [`FileUpdate`], e.g. to validate a whole project.
    #[must_use]
    pub fn to_updates(&self) -> Vec<FileUpdate> {
        self.iter().map(|(p, c)| FileUpdate::new(p, c)).collect()
    }
}
