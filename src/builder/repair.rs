//! Auto-repair: deterministic rewrites for fixable validation errors.
//!
//! One pass per turn. Each fix recomputes its targets from the content it is
//! rewriting, so fixes compose in any order; the order below only keeps the
//! output stable. A fix that cannot find its anchor leaves the file alone.

use std::collections::BTreeSet;
use std::path::Path;

use tracing::debug;

use super::FileUpdate;
use super::validator::{
    DirectiveStatus, ImportFix, Rule, ValidationError, directive_status, global_uses, is_directive_line,
    nondeterministic_exprs, sections_without_id, style_elements, unresolved_symbols,
};
use crate::analysis::imports::{Imported, parse_imports};
use crate::analysis::jsx::find_markup;
use crate::catalog::ICON_LIBRARY;

const FIX_ORDER: [Rule; 6] = [
    Rule::InlineStyle,
    Rule::NondeterministicRender,
    Rule::BrowserGlobal,
    Rule::UnresolvedSymbol,
    Rule::MissingSectionId,
    Rule::MissingClientDirective,
];

/// Apply every fixable error to its file. Returns the same paths, in the same
/// order; files with nothing to fix are returned unchanged.
#[must_use]
pub fn auto_fix_errors(updates: &[FileUpdate], errors: &[ValidationError]) -> Vec<FileUpdate> {
    updates
        .iter()
        .map(|update| {
            let rules: BTreeSet<Rule> = errors
                .iter()
                .filter(|e| e.fixable && e.file == update.path)
                .map(|e| e.rule)
                .collect();
            if rules.is_empty() {
                return update.clone();
            }
            FileUpdate::new(update.path.clone(), repair_file(&update.path, &update.content, &rules))
        })
        .collect()
}

fn repair_file(path: &str, content: &str, rules: &BTreeSet<Rule>) -> String {
    let mut content = content.to_string();
    for rule in FIX_ORDER.iter().filter(|r| rules.contains(r)) {
        let next = match rule {
            Rule::InlineStyle => strip_style_blocks(&content),
            Rule::NondeterministicRender => wrap_nondeterministic(&content),
            Rule::BrowserGlobal => guard_globals(&content),
            Rule::UnresolvedSymbol => import_missing(&content),
            Rule::MissingSectionId => add_section_ids(path, &content),
            Rule::MissingClientDirective => hoist_client_directive(&content),
            Rule::DeadInteractive => None,
        };
        match next {
            Some(next) => {
                debug!(path, rule = rule.as_str(), "repair: applied fix");
                content = next;
            }
            None => debug!(path, rule = rule.as_str(), "repair: anchor not found, skipped"),
        }
    }
    content
}

/// Replace byte ranges, last first so earlier offsets stay valid.
fn splice(content: &str, mut edits: Vec<(usize, usize, String)>) -> String {
    edits.sort_by(|a, b| b.0.cmp(&a.0));
    let mut out = content.to_string();
    for (start, end, text) in edits {
        out.replace_range(start..end, &text);
    }
    out
}

// =============================================================================
// FIXES
// =============================================================================

fn strip_style_blocks(content: &str) -> Option<String> {
    let mut spans = style_elements(&find_markup(content));
    if spans.is_empty() {
        return None;
    }
    spans.sort_by(|a, b| b.start.cmp(&a.start));
    let mut out = content.to_string();
    for span in spans {
        out.replace_range(span.start..span.end, "");
        let line_start = out[..span.start].rfind('\n').map_or(0, |i| i + 1);
        let line_end = out[span.start..].find('\n').map_or(out.len(), |i| span.start + i);
        if out[line_start..line_end].trim().is_empty() {
            let remove_end = (line_end + 1).min(out.len());
            out.replace_range(line_start..remove_end, "");
        }
    }
    Some(out)
}

fn wrap_nondeterministic(content: &str) -> Option<String> {
    let spans = nondeterministic_exprs(&find_markup(content));
    if spans.is_empty() {
        return None;
    }
    let edits = spans
        .into_iter()
        .map(|s| {
            let wrapped = format!("<span suppressHydrationWarning>{}</span>", &content[s.start..s.end]);
            (s.start, s.end, wrapped)
        })
        .collect();
    Some(splice(content, edits))
}

/// Guard every use on lines where all uses can be guarded. Lines holding a
/// mid-statement assignment are left as written.
fn guard_globals(content: &str) -> Option<String> {
    let uses = global_uses(content);
    let blocked: BTreeSet<usize> = uses.iter().filter(|u| !u.guardable()).map(|u| u.line).collect();
    let edits: Vec<_> = uses
        .into_iter()
        .filter(|u| !blocked.contains(&u.line))
        .map(|u| {
            let end = u.offset + u.global.len();
            let text = if u.statement_start {
                format!("if (typeof {g} !== 'undefined') {g}", g = u.global)
            } else if u.optional {
                format!("globalThis.{}", u.global)
            } else {
                format!("globalThis.{}?", u.global)
            };
            (u.offset, end, text)
        })
        .collect();
    if edits.is_empty() {
        return None;
    }
    Some(splice(content, edits))
}

/// Synthesize imports for unresolved names that have a known source. Both
/// kinds anchor on the existing import block.
fn import_missing(content: &str) -> Option<String> {
    let unresolved = unresolved_symbols(content, &find_markup(content));
    let icons: BTreeSet<String> = unresolved
        .iter()
        .filter(|u| u.fix == Some(ImportFix::Icon))
        .map(|u| u.name.clone())
        .collect();
    let defaults: Vec<(String, &str)> = unresolved
        .iter()
        .filter_map(|u| match u.fix {
            Some(ImportFix::Default(source)) => Some((u.name.clone(), source)),
            _ => None,
        })
        .collect();

    let with_icons = import_icons(content, icons);
    let base = with_icons.as_deref().unwrap_or(content);
    import_defaults(base, &defaults).or(with_icons)
}

/// Merge icon names into an existing icon import, or add one after the last
/// import.
fn import_icons(content: &str, icons: BTreeSet<String>) -> Option<String> {
    if icons.is_empty() {
        return None;
    }
    let imports = parse_imports(content);
    let existing = imports.iter().find(|d| {
        d.source == ICON_LIBRARY && !d.type_only && !d.bindings.iter().any(|b| b.imported == Imported::Namespace)
    });

    if let Some(decl) = existing {
        let mut default = None;
        let mut named = Vec::new();
        for binding in &decl.bindings {
            match &binding.imported {
                Imported::Default => default = Some(binding.local.clone()),
                Imported::Named(name) if *name == binding.local => named.push(name.clone()),
                Imported::Named(name) => named.push(format!("{name} as {}", binding.local)),
                Imported::Namespace => {}
            }
        }
        named.extend(icons.into_iter().filter(|icon| !decl.binds(icon)));
        let head = default.map(|d| format!("{d}, ")).unwrap_or_default();
        let statement = format!("import {head}{{ {} }} from '{ICON_LIBRARY}';", named.join(", "));
        return Some(splice(content, vec![(decl.span.start, decl.span.end, statement)]));
    }

    let last = imports.last()?;
    let names: Vec<String> = icons.into_iter().collect();
    let statement = format!("\nimport {{ {} }} from '{ICON_LIBRARY}';", names.join(", "));
    Some(splice(content, vec![(last.span.end, last.span.end, statement)]))
}

fn import_defaults(content: &str, defaults: &[(String, &str)]) -> Option<String> {
    if defaults.is_empty() {
        return None;
    }
    let last = parse_imports(content).last()?.span.end;
    let statements: String = defaults
        .iter()
        .map(|(name, source)| format!("\nimport {name} from '{source}';"))
        .collect();
    Some(splice(content, vec![(last, last, statements)]))
}

fn add_section_ids(path: &str, content: &str) -> Option<String> {
    let tree = find_markup(content);
    let targets = sections_without_id(&tree);
    if targets.is_empty() {
        return None;
    }
    let mut taken = BTreeSet::new();
    for root in &tree {
        root.visit(&mut |el| {
            if let Some(id) = el.static_attr("id") {
                taken.insert(id);
            }
        });
    }
    let base = section_slug(path);
    let mut edits = Vec::new();
    for name_end in targets {
        let mut n = 1;
        let id = loop {
            let candidate = if n == 1 { base.clone() } else { format!("{base}-{n}") };
            if taken.insert(candidate.clone()) {
                break candidate;
            }
            n += 1;
        };
        edits.push((name_end, name_end, format!(" id=\"{id}\"")));
    }
    Some(splice(content, edits))
}

/// Kebab-case file stem: `/components/AboutMe.tsx` → `about-me`.
fn section_slug(path: &str) -> String {
    let stem = Path::new(path).file_stem().and_then(|s| s.to_str()).unwrap_or_default();
    let mut slug = String::new();
    let mut prev_lower = false;
    for c in stem.chars() {
        if c.is_ascii_alphanumeric() {
            if c.is_ascii_uppercase() && prev_lower {
                slug.push('-');
            }
            slug.push(c.to_ascii_lowercase());
            prev_lower = c.is_ascii_lowercase() || c.is_ascii_digit();
        } else {
            if !slug.ends_with('-') {
                slug.push('-');
            }
            prev_lower = false;
        }
    }
    let slug = slug.trim_matches('-');
    if slug.is_empty() { "section".to_string() } else { slug.to_string() }
}

/// Drop any misplaced directive and put `'use client';` on line 1.
fn hoist_client_directive(content: &str) -> Option<String> {
    if directive_status(content) == DirectiveStatus::Leading {
        return None;
    }
    let body: Vec<&str> = content.lines().filter(|l| !is_directive_line(l.trim())).collect();
    let body = body.join("\n");
    let mut out = String::from("'use client';\n\n");
    out.push_str(body.trim_start_matches(['\n', '\r']));
    if content.ends_with('\n') && !out.ends_with('\n') {
        out.push('\n');
    }
    Some(out)
}

#[cfg(test)]
#[path = "repair_test.rs"]
mod tests;
