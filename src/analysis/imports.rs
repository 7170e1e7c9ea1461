//! Import statements and top-level declarations of a script file.

use std::collections::BTreeSet;
use std::sync::LazyLock;

use regex::Regex;

use super::jsx::{Span, line_of};

static IMPORT_RE: LazyLock<Regex> = LazyLock::new(|| {
    Regex::new(r#"(?m)^[ \t]*import\s+(?:(type)\s+)?(?:([^'";]*?)\s+from\s+)?['"]([^'"\n]+)['"][ \t]*;?"#)
        .expect("import pattern is valid")
});

static NAMED_DECL_RE: LazyLock<Regex> = LazyLock::new(|| {
    Regex::new(r"\b(?:function\*?|class|const|let|var|interface|type|enum)\s+([A-Za-z_$][\w$]*)")
        .expect("declaration pattern is valid")
});

static DESTRUCTURE_RE: LazyLock<Regex> = LazyLock::new(|| {
    Regex::new(r"\b(?:const|let|var)\s*[\[{]([^=;]*?)[\]}]\s*(?::[^=;]*)?=").expect("destructure pattern is valid")
});

/// Object-destructured parameters: `function Card({ icon: Icon, title })`,
/// `({ children }) =>`.
static PARAM_RE: LazyLock<Regex> =
    LazyLock::new(|| Regex::new(r"\(\s*\{([^{}()]*)\}").expect("parameter pattern is valid"));

/// Single bare arrow parameter: `skill => ...`.
static BARE_ARROW_RE: LazyLock<Regex> =
    LazyLock::new(|| Regex::new(r"\b([A-Za-z_$][\w$]*)\s*=>").expect("arrow pattern is valid"));

/// Flat parameter lists of arrows and functions: `(skill, i) =>`,
/// `function item(label: string)`.
static PARAM_LIST_RE: LazyLock<Regex> = LazyLock::new(|| {
    Regex::new(r"(?:\bfunction\b\*?\s*[\w$]*\s*\(([^(){}]*)\)|\(([^(){}]*)\)\s*(?::[^=(){};]*)?=>)")
        .expect("parameter list pattern is valid")
});

#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Imported {
    Default,
    Namespace,
    Named(String),
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ImportBinding {
    /// Name bound in the importing module.
    pub local: String,
    pub imported: Imported,
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ImportDecl {
    pub source: String,
    pub bindings: Vec<ImportBinding>,
    /// The whole statement, including a trailing `;`.
    pub span: Span,
    pub line: usize,
    pub type_only: bool,
}

impl ImportDecl {
    #[must_use]
    pub fn binds(&self, local: &str) -> bool {
        self.bindings.iter().any(|b| b.local == local)
    }
}

/// Every `import` statement in source order, including side-effect imports
/// (`import './globals.css'`), which carry no bindings.
#[must_use]
pub fn parse_imports(src: &str) -> Vec<ImportDecl> {
    IMPORT_RE
        .captures_iter(src)
        .filter_map(|caps| {
            let whole = caps.get(0)?;
            let lead = whole.as_str().len() - whole.as_str().trim_start().len();
            let start = whole.start() + lead;
            Some(ImportDecl {
                source: caps.get(3)?.as_str().to_string(),
                bindings: caps.get(2).map(|c| parse_clause(c.as_str())).unwrap_or_default(),
                span: Span { start, end: whole.end() },
                line: line_of(src, start),
                type_only: caps.get(1).is_some(),
            })
        })
        .collect()
}

fn parse_clause(clause: &str) -> Vec<ImportBinding> {
    let clause = clause.trim();
    let (head, named) = match clause.find('{') {
        Some(open) => {
            let close = clause.rfind('}').unwrap_or(clause.len());
            (&clause[..open], Some(&clause[open + 1..close.max(open + 1)]))
        }
        None => (clause, None),
    };
    let mut bindings = Vec::new();
    for part in head.split(',').map(str::trim).filter(|p| !p.is_empty()) {
        if let Some(ns) = part.strip_prefix('*') {
            let local = ns.trim().trim_start_matches("as").trim();
            if is_identifier(local) {
                bindings.push(ImportBinding { local: local.to_string(), imported: Imported::Namespace });
            }
        } else if is_identifier(part) {
            bindings.push(ImportBinding { local: part.to_string(), imported: Imported::Default });
        }
    }
    for part in named.into_iter().flat_map(|n| n.split(',')) {
        let part = part.trim();
        let part = part.strip_prefix("type ").map_or(part, str::trim);
        let (imported, local) = match part.split_once(" as ") {
            Some((imported, local)) => (imported.trim(), local.trim()),
            None => (part, part),
        };
        if is_identifier(local) {
            bindings.push(ImportBinding { local: local.to_string(), imported: Imported::Named(imported.to_string()) });
        }
    }
    bindings
}

#[must_use]
pub fn is_identifier(s: &str) -> bool {
    let mut chars = s.chars();
    chars
        .next()
        .is_some_and(|c| c.is_ascii_alphabetic() || c == '_' || c == '$')
        && chars.all(|c| c.is_ascii_alphanumeric() || c == '_' || c == '$')
}

/// Names declared anywhere in the file: functions, classes, variables,
/// destructuring patterns and parameters. Scope is ignored.
#[must_use]
pub fn declared_names(src: &str) -> BTreeSet<String> {
    let mut names: BTreeSet<String> = NAMED_DECL_RE
        .captures_iter(src)
        .filter_map(|c| c.get(1))
        .map(|m| m.as_str().to_string())
        .collect();
    for caps in DESTRUCTURE_RE.captures_iter(src).chain(PARAM_RE.captures_iter(src)) {
        if let Some(pattern) = caps.get(1) {
            names.extend(pattern_names(pattern.as_str()));
        }
    }
    names.extend(BARE_ARROW_RE.captures_iter(src).filter_map(|c| c.get(1)).map(|m| m.as_str().to_string()));
    for caps in PARAM_LIST_RE.captures_iter(src) {
        if let Some(list) = caps.get(1).or_else(|| caps.get(2)) {
            names.extend(parameter_names(list.as_str()));
        }
    }
    names
}

/// Names bound by a flat parameter list (`a, b: T, c = 1, ...rest`).
fn parameter_names(list: &str) -> Vec<String> {
    list.split(',')
        .filter_map(|piece| {
            let piece = piece.split('=').next()?.split(':').next()?;
            let local = piece.trim().trim_start_matches("...").trim_end_matches('?').trim();
            is_identifier(local).then(|| local.to_string())
        })
        .collect()
}

/// Local names bound by a flat destructuring pattern body (`a, b: B, c = 1, ...rest`).
fn pattern_names(pattern: &str) -> Vec<String> {
    pattern
        .split(',')
        .filter_map(|piece| {
            let piece = piece.split('=').next()?.trim();
            let local = piece.rsplit(':').next()?.trim().trim_start_matches("...").trim();
            is_identifier(local).then(|| local.to_string())
        })
        .collect()
}
