//! Static validator: a fixed catalogue of local, pattern-level defects.
//!
//! `detect_errors` is pure. It reads only the updates it is given, executes
//! nothing, and reports each defect with the rule that fired so the repairer
//! can dispatch on it. The finders below are shared with [`super::repair`],
//! which recomputes locations from the content it is rewriting.

use std::collections::BTreeSet;
use std::ops::Range;
use std::sync::LazyLock;

use regex::Regex;
use serde::{Deserialize, Serialize};

use super::{FileUpdate, is_component_file, is_script_file};
use crate::analysis::imports::{declared_names, parse_imports};
use crate::analysis::jsx::{AttrValue, Element, Span, find_markup, line_of, string_literal};
use crate::catalog::{component_default, is_known_icon};

static HOOK_RE: LazyLock<Regex> = LazyLock::new(|| {
    Regex::new(
        r"\b(useState|useEffect|useRef|useReducer|useCallback|useMemo|useContext|useLayoutEffect|useTransition)\s*[(<]",
    )
    .expect("hook pattern is valid")
});

static EVENT_RE: LazyLock<Regex> =
    LazyLock::new(|| Regex::new(r"\b(on[A-Z]\w*)\s*=\s*\{").expect("event pattern is valid"));

static MOTION_RE: LazyLock<Regex> = LazyLock::new(|| {
    Regex::new(r"\b(motion\.[a-z]\w*|AnimatePresence|useScroll|useInView|useAnimation|useMotionValue|useTransform|useSpring)\b")
        .expect("motion pattern is valid")
});

static DIRECTIVE_RE: LazyLock<Regex> =
    LazyLock::new(|| Regex::new(r#"^['"]use client['"]\s*;?$"#).expect("directive pattern is valid"));

static NONDETERMINISTIC_RE: LazyLock<Regex> = LazyLock::new(|| {
    Regex::new(r"\bnew\s+Date\s*\(|\bDate\.now\s*\(|\bMath\.random\s*\(").expect("nondeterminism pattern is valid")
});

static GLOBAL_RE: LazyLock<Regex> = LazyLock::new(|| {
    Regex::new(r"\b(window|document|localStorage|sessionStorage)\s*\??\.\s*[A-Za-z_$]").expect("global pattern is valid")
});

/// Member chain after a global's name that ends in an assignment or update.
static ASSIGN_RE: LazyLock<Regex> = LazyLock::new(|| {
    Regex::new(
        r"^(?:\s*\??\.\s*[A-Za-z_$][\w$]*|\s*\[[^\]\n]*\])+\s*(?:(?:\*\*|<<|>>>?|&&|\|\||\?\?|[-+*/%&|^])?=(?:[^=>]|$)|\+\+|--)",
    )
    .expect("assignment pattern is valid")
});

static EFFECT_RE: LazyLock<Regex> =
    LazyLock::new(|| Regex::new(r"\buse(?:Layout)?Effect\s*\(").expect("effect pattern is valid"));

static HANDLER_ATTR_RE: LazyLock<Regex> =
    LazyLock::new(|| Regex::new(r"\bon[A-Z]\w*\s*=\s*\{").expect("handler pattern is valid"));

// =============================================================================
// TYPES
// =============================================================================

/// Which catalogue rule produced a [`ValidationError`].
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
#[serde(rename_all = "kebab-case")]
pub enum Rule {
    InlineStyle,
    NondeterministicRender,
    BrowserGlobal,
    MissingClientDirective,
    DeadInteractive,
    UnresolvedSymbol,
    MissingSectionId,
}

impl Rule {
    #[must_use]
    pub fn as_str(self) -> &'static str {
        match self {
            Self::InlineStyle => "inline-style",
            Self::NondeterministicRender => "nondeterministic-render",
            Self::BrowserGlobal => "browser-global",
            Self::MissingClientDirective => "missing-client-directive",
            Self::DeadInteractive => "dead-interactive",
            Self::UnresolvedSymbol => "unresolved-symbol",
            Self::MissingSectionId => "missing-section-id",
        }
    }
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct ValidationError {
    pub file: String,
    pub message: String,
    pub fixable: bool,
    pub rule: Rule,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub line: Option<usize>,
}

impl ValidationError {
    fn new(file: &str, rule: Rule, fixable: bool, line: usize, message: impl Into<String>) -> Self {
        Self { file: file.to_string(), message: message.into(), fixable, rule, line: Some(line) }
    }
}

// =============================================================================
// DETECT
// =============================================================================

/// Check every script file in `updates`. Other files (stylesheets, JSON) are
/// skipped. Results are in update order, then catalogue order.
#[must_use]
pub fn detect_errors(updates: &[FileUpdate]) -> Vec<ValidationError> {
    updates
        .iter()
        .filter(|u| is_script_file(&u.path))
        .flat_map(|u| check_file(&u.path, &u.content))
        .collect()
}

fn check_file(path: &str, content: &str) -> Vec<ValidationError> {
    let markup = find_markup(content);
    let component = is_component_file(path);
    let mut errors = Vec::new();

    if component {
        for span in style_elements(&markup) {
            errors.push(ValidationError::new(
                path,
                Rule::InlineStyle,
                true,
                line_of(content, span.start),
                "Inline <style> tag in a component; use utility classes or a stylesheet instead",
            ));
        }
    }

    for span in nondeterministic_exprs(&markup) {
        let source = &content[span.start..span.end];
        errors.push(ValidationError::new(
            path,
            Rule::NondeterministicRender,
            true,
            line_of(content, span.start),
            format!("Nondeterministic value rendered directly: {source}"),
        ));
    }

    let uses = global_uses(content);
    let mut flagged_lines = BTreeSet::new();
    for found in &uses {
        if !flagged_lines.insert(found.line) {
            continue;
        }
        // A line is only repairable when every use on it can be guarded.
        let fixable = uses.iter().filter(|u| u.line == found.line).all(GlobalUse::guardable);
        let message = if fixable {
            format!("`{}` is accessed outside useEffect without a typeof guard", found.global)
        } else {
            format!("`{}` is assigned outside useEffect without a typeof guard; move it into an effect", found.global)
        };
        errors.push(ValidationError::new(path, Rule::BrowserGlobal, fixable, found.line, message));
    }

    if component {
        if let Some(trigger) = client_trigger(content) {
            match directive_status(content) {
                DirectiveStatus::Leading => {}
                DirectiveStatus::Missing => errors.push(ValidationError::new(
                    path,
                    Rule::MissingClientDirective,
                    true,
                    1,
                    format!("Uses `{trigger}` but is missing the 'use client' directive"),
                )),
                DirectiveStatus::Misplaced(line) => errors.push(ValidationError::new(
                    path,
                    Rule::MissingClientDirective,
                    true,
                    line,
                    "'use client' must be the first statement in the file",
                )),
            }
        }
    }

    for root in &markup {
        root.visit(&mut |el| {
            if let Some(problem) = dead_interactive(el) {
                errors.push(ValidationError::new(
                    path,
                    Rule::DeadInteractive,
                    false,
                    line_of(content, el.span.start),
                    problem,
                ));
            }
        });
    }

    for symbol in unresolved_symbols(content, &markup) {
        let message = match symbol.fix {
            Some(ImportFix::Icon) => format!("`{}` is used in markup but never imported (lucide-react icon)", symbol.name),
            Some(ImportFix::Default(source)) => {
                format!("`{}` is used in markup but never imported (default export of {source})", symbol.name)
            }
            None => format!("`{}` is used in markup but never imported or declared", symbol.name),
        };
        errors.push(ValidationError::new(path, Rule::UnresolvedSymbol, symbol.fix.is_some(), symbol.line, message));
    }

    for name_end in sections_without_id(&markup) {
        errors.push(ValidationError::new(
            path,
            Rule::MissingSectionId,
            true,
            line_of(content, name_end),
            "<section> has no id anchor",
        ));
    }

    errors
}

// =============================================================================
// FINDERS
// =============================================================================

pub(crate) fn style_elements(markup: &[Element]) -> Vec<Span> {
    let mut spans = Vec::new();
    for root in markup {
        root.visit(&mut |el| {
            if el.name == "style" {
                spans.push(el.span);
            }
        });
    }
    spans
}

/// Child expressions holding a time or random value, not already inside an
/// element that opts out of hydration checks.
pub(crate) fn nondeterministic_exprs(markup: &[Element]) -> Vec<Span> {
    let mut spans = Vec::new();
    for root in markup {
        root.visit_exprs(&mut |expr, parent| {
            if expr.markup.is_empty()
                && NONDETERMINISTIC_RE.is_match(&expr.source)
                && !parent.has_attr("suppressHydrationWarning")
            {
                spans.push(expr.span);
            }
        });
    }
    spans
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub(crate) struct GlobalUse {
    pub global: String,
    /// Offset of the global's name.
    pub offset: usize,
    pub line: usize,
    /// The use opens a statement, so the whole line can be guarded.
    pub statement_start: bool,
    /// Already written as `x?.`.
    pub optional: bool,
    /// The member chain is assigned to (`document.title = ...`).
    pub assignment: bool,
}

impl GlobalUse {
    /// An optional chain cannot be assigned through, so a mid-line
    /// assignment has no safe rewrite.
    pub fn guardable(&self) -> bool {
        self.statement_start || !self.assignment
    }
}

/// Unguarded browser-global accesses outside effect bodies and event handlers.
pub(crate) fn global_uses(content: &str) -> Vec<GlobalUse> {
    let effects = effect_ranges(content);
    let mut uses = Vec::new();
    let mut prev_code_line: Option<&str> = None;
    let mut line_start = 0;

    for (idx, line) in content.split('\n').enumerate() {
        let trimmed = line.trim();
        let comment = trimmed.starts_with("//") || trimmed.starts_with('*') || trimmed.starts_with("/*");
        if !comment {
            for caps in GLOBAL_RE.captures_iter(line) {
                let Some(name) = caps.get(1) else { continue };
                let global = name.as_str();
                let offset = line_start + name.start();
                let before = &line[..name.start()];
                if line.contains(&format!("typeof {global}"))
                    || before.trim_end().ends_with('.')
                    || before.chars().filter(|&c| c == '\'' || c == '"').count() % 2 == 1
                    || HANDLER_ATTR_RE.is_match(before)
                    || effects.iter().any(|r| r.contains(&offset))
                {
                    continue;
                }
                let statement_start = before.trim().is_empty()
                    && prev_code_line.is_none_or(|p| p.ends_with([';', '{', '}', ')']));
                let rest = &line[name.end()..];
                let optional = rest.trim_start().starts_with('?');
                let assignment = ASSIGN_RE.is_match(rest);
                uses.push(GlobalUse {
                    global: global.to_string(),
                    offset,
                    line: idx + 1,
                    statement_start,
                    optional,
                    assignment,
                });
            }
        }
        if !trimmed.is_empty() && !comment {
            prev_code_line = Some(trimmed);
        }
        line_start += line.len() + 1;
    }
    uses
}

/// Byte ranges of `useEffect(...)` / `useLayoutEffect(...)` calls.
fn effect_ranges(content: &str) -> Vec<Range<usize>> {
    let bytes = content.as_bytes();
    EFFECT_RE
        .find_iter(content)
        .map(|m| {
            let mut depth = 0usize;
            let mut end = content.len();
            for (i, &b) in bytes.iter().enumerate().skip(m.end() - 1) {
                match b {
                    b'(' => depth += 1,
                    b')' => {
                        depth -= 1;
                        if depth == 0 {
                            end = i + 1;
                            break;
                        }
                    }
                    _ => {}
                }
            }
            m.start()..end
        })
        .collect()
}

/// The first construct that requires client rendering, if any.
pub(crate) fn client_trigger(content: &str) -> Option<String> {
    [&*HOOK_RE, &*EVENT_RE, &*MOTION_RE]
        .iter()
        .filter_map(|re| re.captures(content).and_then(|c| c.get(1)).map(|m| (m.start(), m.as_str())))
        .min_by_key(|(start, _)| *start)
        .map(|(_, name)| name.to_string())
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub(crate) enum DirectiveStatus {
    Leading,
    /// Present, but not the first statement (1-based line).
    Misplaced(usize),
    Missing,
}

pub(crate) fn directive_status(content: &str) -> DirectiveStatus {
    let mut in_block = false;
    let mut first_statement = true;
    let mut misplaced = None;
    for (idx, line) in content.lines().enumerate() {
        let t = line.trim();
        if in_block {
            in_block = !t.contains("*/");
            continue;
        }
        if t.is_empty() || t.starts_with("//") {
            continue;
        }
        if t.starts_with("/*") {
            in_block = !t.contains("*/");
            continue;
        }
        if is_directive_line(t) {
            if first_statement {
                return DirectiveStatus::Leading;
            }
            misplaced.get_or_insert(idx + 1);
        }
        first_statement = false;
    }
    misplaced.map_or(DirectiveStatus::Missing, DirectiveStatus::Misplaced)
}

pub(crate) fn is_directive_line(trimmed: &str) -> bool {
    DIRECTIVE_RE.is_match(trimmed)
}

/// Why an interactive element does nothing, if it does nothing.
fn dead_interactive(el: &Element) -> Option<String> {
    if el.has_spread() {
        return None;
    }
    let tag = el.name.strip_prefix("motion.").unwrap_or(&el.name);
    match tag {
        "button" => {
            let submit = el.static_attr("type").is_some_and(|t| t == "submit");
            let text = el.static_text();
            let label = match text.trim() {
                "" => String::new(),
                t => format!(" \"{t}\""),
            };
            (!el.has_attr("onClick") && !submit)
                .then(|| format!("<button>{label} has no onClick handler and is not a submit button"))
        }
        "a" | "Link" => {
            if el.has_attr("onClick") {
                return None;
            }
            let placeholder = |s: &str| matches!(s.trim(), "" | "#");
            match el.attr("href") {
                None => Some(format!("<{tag}> has neither an href nor an onClick handler")),
                Some(AttrValue::Str(s)) if placeholder(s) => Some(format!("<{tag}> links to the placeholder href \"{s}\"")),
                Some(AttrValue::Expr(e)) if string_literal(e).is_some_and(|s| placeholder(&s)) => {
                    Some(format!("<{tag}> links to a placeholder href"))
                }
                Some(_) => None,
            }
        }
        _ => None,
    }
}

/// The import the repairer can synthesize for an unresolved name.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub(crate) enum ImportFix {
    /// Named import from the icon library.
    Icon,
    /// Default import from a whitelisted package (`import Link from 'next/link'`).
    Default(&'static str),
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub(crate) struct Unresolved {
    pub name: String,
    pub line: usize,
    pub fix: Option<ImportFix>,
}

/// `Link` and `Image` are both icons and package components; an element
/// that links, loads a source or wraps children is the component.
fn import_fix(name: &str, el: &Element) -> Option<ImportFix> {
    if let Some(source) = component_default(name) {
        if !el.children.is_empty() || el.has_attr("href") || el.has_attr("src") {
            return Some(ImportFix::Default(source));
        }
    }
    is_known_icon(name).then_some(ImportFix::Icon)
}

/// Component tags (and roots of member tags such as `motion.div`) with no
/// import binding or declaration. One entry per name, first use wins.
pub(crate) fn unresolved_symbols(content: &str, markup: &[Element]) -> Vec<Unresolved> {
    let mut known: BTreeSet<String> = parse_imports(content)
        .into_iter()
        .flat_map(|decl| decl.bindings.into_iter().map(|b| b.local))
        .collect();
    known.extend(declared_names(content));
    known.insert("React".into());

    let mut seen = BTreeSet::new();
    let mut out = Vec::new();
    for root in markup {
        root.visit(&mut |el| {
            if el.is_fragment() {
                return;
            }
            let (head, member) = match el.name.split_once('.') {
                Some((head, _)) => (head, true),
                None => (el.name.as_str(), false),
            };
            let is_component = head.chars().next().is_some_and(char::is_uppercase);
            if (is_component || member) && !known.contains(head) && seen.insert(head.to_string()) {
                out.push(Unresolved {
                    name: head.to_string(),
                    line: line_of(content, el.span.start),
                    fix: if member { None } else { import_fix(head, el) },
                });
            }
        });
    }
    out
}

/// `<section>` elements with no `id`, as tag-name end offsets.
pub(crate) fn sections_without_id(markup: &[Element]) -> Vec<usize> {
    let mut out = Vec::new();
    for root in markup {
        root.visit(&mut |el| {
            if el.name == "section" && !el.has_attr("id") && !el.has_spread() {
                out.push(el.name_end);
            }
        });
    }
    out
}

#[cfg(test)]
#[path = "validator_test.rs"]
mod tests;
