//! Module compilation: source text → [`CompiledModule`].
//!
//! The transform mirrors what a bundler does before evaluation. Directive
//! pragmas are blanked, imports become `const` bindings against the
//! `__modules` table, exports are stripped. Components are then extracted
//! from the transformed text together with the markup they return. Line
//! numbers are preserved so diagnostics point at the original source.

use std::collections::{BTreeMap, BTreeSet};
use std::sync::LazyLock;

use regex::{Captures, Regex};

use super::error::CompileError;
use crate::analysis::imports::{ImportDecl, Imported, is_identifier, parse_imports};
use crate::analysis::jsx::{Element, line_of, matching_brace, parse_element};

/// Binding name given to anonymous default exports.
pub const ANONYMOUS_DEFAULT: &str = "__Default";

static DIRECTIVE_LINE_RE: LazyLock<Regex> = LazyLock::new(|| {
    Regex::new(r#"(?m)^[ \t]*['"]use (?:client|server)['"][ \t]*;?[ \t]*$"#).expect("directive pattern is valid")
});

static EXPORT_DEFAULT_FN_RE: LazyLock<Regex> = LazyLock::new(|| {
    Regex::new(r"(?m)^([ \t]*)export\s+default\s+(async\s+)?function\b\s*(\*?)\s*([A-Za-z_$][\w$]*)?")
        .expect("export pattern is valid")
});

static EXPORT_DEFAULT_IDENT_RE: LazyLock<Regex> = LazyLock::new(|| {
    Regex::new(r"(?m)^[ \t]*export\s+default\s+([A-Za-z_$][\w$]*)[ \t]*;?[ \t]*$").expect("export pattern is valid")
});

static EXPORT_DEFAULT_EXPR_RE: LazyLock<Regex> =
    LazyLock::new(|| Regex::new(r"(?m)^([ \t]*)export\s+default\s+").expect("export pattern is valid"));

static EXPORT_DECL_RE: LazyLock<Regex> = LazyLock::new(|| {
    Regex::new(r"(?m)^([ \t]*)export\s+((?:async\s+)?(?:const|let|var|function|class|interface|type|enum|abstract)\b)")
        .expect("export pattern is valid")
});

static EXPORT_LIST_RE: LazyLock<Regex> = LazyLock::new(|| {
    Regex::new(r#"(?m)^[ \t]*export\s*(?:type\s*)?\{([^}]*)\}\s*(?:from\s*['"][^'"]*['"])?[ \t]*;?"#)
        .expect("export pattern is valid")
});

static FN_COMPONENT_RE: LazyLock<Regex> = LazyLock::new(|| {
    Regex::new(r"(?m)^[ \t]*(?:async\s+)?function\s*\*?\s*([A-Z_][\w$]*)\s*(?:<[^>(]*>)?\s*\(")
        .expect("component pattern is valid")
});

static ARROW_COMPONENT_RE: LazyLock<Regex> = LazyLock::new(|| {
    Regex::new(
        r"(?m)^[ \t]*(?:const|let|var)\s+([A-Z_][\w$]*)\s*(?::[^=\n]+)?=\s*(?:(?:React\.)?(?:memo|forwardRef)\s*(?:<[^>(]*>)?\s*\(\s*)?(?:async\s*)?(function\s*[\w$]*\s*)?\(",
    )
    .expect("component pattern is valid")
});

static ALIAS_RE: LazyLock<Regex> = LazyLock::new(|| {
    Regex::new(
        r"(?m)^[ \t]*(?:const|let|var)\s+([A-Z_][\w$]*)\s*=\s*(?:(?:React\.)?(?:memo|forwardRef)\s*\(\s*)?([A-Z][\w$]*)\s*\)?[ \t]*;?[ \t]*$",
    )
    .expect("alias pattern is valid")
});

static VALUE_RE: LazyLock<Regex> = LazyLock::new(|| {
    Regex::new(r"(?m)^(?:const|let|var)\s+([A-Z][\w$]*)\s*(?::[^=\n]+)?=").expect("value pattern is valid")
});

static STRING_CONST_RE: LazyLock<Regex> = LazyLock::new(|| {
    Regex::new(
        r#"(?m)^[ \t]*(?:const|let|var)\s+([A-Za-z_$][\w$]*)\s*(?::\s*string\s*)?=\s*(?:'([^'\n]*)'|"([^"\n]*)"|`([^`$]*)`)[ \t]*;?[ \t]*$"#,
    )
    .expect("string constant pattern is valid")
});

static RETURN_MARKUP_RE: LazyLock<Regex> =
    LazyLock::new(|| Regex::new(r"\breturn\s*(?:\(\s*)?<").expect("return pattern is valid"));

// =============================================================================
// TYPES
// =============================================================================

/// How a component receives its props.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum PropsPattern {
    None,
    /// `function Card(props)`
    Ident(String),
    /// `function Card({ title, icon: Icon, tone = 'dark', ...rest })`
    Destructured(Vec<PropBinding>),
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct PropBinding {
    pub key: String,
    pub local: String,
    /// Default value source, if any.
    pub default: Option<String>,
    pub rest: bool,
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Component {
    pub name: String,
    pub props: PropsPattern,
    /// The markup the component returns; `None` when it returns no markup.
    pub markup: Option<Element>,
    pub line: usize,
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct CompiledModule {
    pub path: String,
    /// Transformed source. Markup spans index into this text.
    pub source: String,
    pub imports: Vec<ImportDecl>,
    pub components: BTreeMap<String, Component>,
    /// `const Hero = memo(HeroInner)` style aliases: name → target.
    pub aliases: BTreeMap<String, String>,
    pub default_export: Option<String>,
    pub string_consts: BTreeMap<String, String>,
    /// Capitalized module-level values that are not components.
    pub values: BTreeSet<String>,
}

impl CompiledModule {
    /// Follow aliases to a component declared in this module.
    #[must_use]
    pub fn component(&self, name: &str) -> Option<&Component> {
        let mut name = name;
        for _ in 0..8 {
            if let Some(c) = self.components.get(name) {
                return Some(c);
            }
            name = self.aliases.get(name)?;
        }
        None
    }

    #[must_use]
    pub fn is_value(&self, name: &str) -> bool {
        self.values.contains(name)
    }
}

// =============================================================================
// COMPILE
// =============================================================================

/// Compile one script module.
///
/// # Errors
///
/// Returns a [`CompileError`] when a component body has unbalanced braces or
/// its returned markup does not parse.
pub fn compile_module(path: &str, source: &str) -> Result<CompiledModule, CompileError> {
    let imports = parse_imports(source);
    let mut text = rewrite_imports(source, &imports);
    text = DIRECTIVE_LINE_RE.replace_all(&text, "").into_owned();

    let mut default_export = None;
    text = EXPORT_DEFAULT_FN_RE
        .replace_all(&text, |caps: &Captures| {
            let name = caps.get(4).map_or(ANONYMOUS_DEFAULT, |m| m.as_str());
            default_export = Some(name.to_string());
            format!("{}{}function{} {name}", &caps[1], caps.get(2).map_or("", |m| m.as_str()), &caps[3])
        })
        .into_owned();
    text = EXPORT_DEFAULT_IDENT_RE
        .replace_all(&text, |caps: &Captures| {
            default_export = Some(caps[1].to_string());
            String::new()
        })
        .into_owned();
    text = EXPORT_DEFAULT_EXPR_RE
        .replace_all(&text, |caps: &Captures| {
            default_export = Some(ANONYMOUS_DEFAULT.to_string());
            format!("{}const {ANONYMOUS_DEFAULT} = ", &caps[1])
        })
        .into_owned();
    text = EXPORT_DECL_RE.replace_all(&text, "$1$2").into_owned();
    text = EXPORT_LIST_RE
        .replace_all(&text, |caps: &Captures| {
            for item in caps[1].split(',') {
                if let Some((local, exported)) = item.split_once(" as ") {
                    if exported.trim() == "default" {
                        default_export = Some(local.trim().to_string());
                    }
                }
            }
            "\n".repeat(caps[0].matches('\n').count())
        })
        .into_owned();

    let components = extract_components(path, &text)?;
    let aliases: BTreeMap<String, String> = ALIAS_RE
        .captures_iter(&text)
        .filter(|c| !components.contains_key(&c[1]))
        .map(|c| (c[1].to_string(), c[2].to_string()))
        .collect();
    let values = VALUE_RE
        .captures_iter(&text)
        .map(|c| c[1].to_string())
        .filter(|n| !components.contains_key(n) && !aliases.contains_key(n))
        .collect();
    let string_consts = STRING_CONST_RE
        .captures_iter(&text)
        .filter_map(|c| {
            let value = c.get(2).or_else(|| c.get(3)).or_else(|| c.get(4))?;
            Some((c[1].to_string(), value.as_str().to_string()))
        })
        .collect();

    Ok(CompiledModule {
        path: path.to_string(),
        source: text,
        imports,
        components,
        aliases,
        default_export,
        string_consts,
        values,
    })
}

/// Replace each import with `const` bindings against `__modules`, keeping
/// the statement's line count.
fn rewrite_imports(source: &str, imports: &[ImportDecl]) -> String {
    let mut out = source.to_string();
    for decl in imports.iter().rev() {
        let newlines = source[decl.span.start..decl.span.end].matches('\n').count();
        let mut replacement = binding_statement(decl);
        replacement.push_str(&"\n".repeat(newlines));
        out.replace_range(decl.span.start..decl.span.end, &replacement);
    }
    out
}

fn binding_statement(decl: &ImportDecl) -> String {
    if decl.type_only || decl.bindings.is_empty() {
        return String::new();
    }
    let module = format!("__modules[{:?}]", decl.source);
    let mut parts = Vec::new();
    let mut named = Vec::new();
    for binding in &decl.bindings {
        match &binding.imported {
            Imported::Default => parts.push(format!("const {} = {module}.default;", binding.local)),
            Imported::Namespace => parts.push(format!("const {} = {module};", binding.local)),
            Imported::Named(name) if *name == binding.local => named.push(name.clone()),
            Imported::Named(name) => named.push(format!("{name}: {}", binding.local)),
        }
    }
    if !named.is_empty() {
        parts.push(format!("const {{ {} }} = {module};", named.join(", ")));
    }
    parts.join(" ")
}

// =============================================================================
// COMPONENTS
// =============================================================================

fn extract_components(path: &str, text: &str) -> Result<BTreeMap<String, Component>, CompileError> {
    let mut components = BTreeMap::new();
    let fn_matches = FN_COMPONENT_RE.captures_iter(text).map(|c| (c, true));
    let arrow_matches = ARROW_COMPONENT_RE.captures_iter(text).map(|c| {
        let is_function_expr = c.get(2).is_some();
        (c, is_function_expr)
    });
    for (caps, function_body) in fn_matches.chain(arrow_matches) {
        let (Some(whole), Some(name)) = (caps.get(0), caps.get(1)) else { continue };
        let line = line_of(text, name.start());
        let open_paren = whole.end() - 1;
        let Some(close_paren) = matching_paren(text, open_paren) else {
            return Err(CompileError::new(path, line, format!("Unclosed parameter list of `{}`", name.as_str())));
        };
        let props = parse_props(&text[open_paren + 1..close_paren]);
        let Some(body) = component_body(text, close_paren + 1, function_body) else { continue };
        let markup = match body {
            Body::Block(open) => {
                let close = matching_brace(text, open).map_err(|_| {
                    CompileError::new(path, line, format!("Unexpected end of file: missing '}}' closing `{}`", name.as_str()))
                })?;
                returned_markup(path, text, open, close)?
            }
            Body::Expr(start) => expression_markup(path, text, start)?,
        };
        components.insert(
            name.as_str().to_string(),
            Component { name: name.as_str().to_string(), props, markup, line },
        );
    }
    Ok(components)
}

enum Body {
    /// Offset of the opening `{`.
    Block(usize),
    /// Offset where an arrow's expression body starts.
    Expr(usize),
}

/// Locate the body after a parameter list. `None` if what follows is not a
/// function body, e.g. `const Items = (data).map(...)`.
fn component_body(text: &str, after_params: usize, function_body: bool) -> Option<Body> {
    let rest = &text[after_params..];
    if function_body {
        let open = rest.find('{')?;
        let between = rest[..open].trim();
        return (between.is_empty() || between.starts_with(':')).then_some(Body::Block(after_params + open));
    }
    let arrow = rest.find("=>")?;
    let between = rest[..arrow].trim();
    if !(between.is_empty() || between.starts_with(':')) {
        return None;
    }
    let body_start = after_params + arrow + 2;
    let lead = text[body_start..].len() - text[body_start..].trim_start().len();
    let start = body_start + lead;
    if text[start..].starts_with('{') { Some(Body::Block(start)) } else { Some(Body::Expr(start)) }
}

/// The last top-level `return <...>` in a block body.
fn returned_markup(path: &str, text: &str, open: usize, close: usize) -> Result<Option<Element>, CompileError> {
    let mut roots: Vec<Element> = Vec::new();
    for m in RETURN_MARKUP_RE.find_iter(&text[open..close]) {
        let lt = open + m.end() - 1;
        if roots.iter().any(|r| r.span.start <= lt && lt < r.span.end) {
            continue;
        }
        let el = parse_element(text, lt).map_err(|e| CompileError::new(path, line_of(text, e.offset), e.message))?;
        roots.retain(|r| !(el.span.start <= r.span.start && r.span.end <= el.span.end));
        roots.push(el);
    }
    Ok(roots.pop())
}

/// Markup of an arrow expression body: `=> <div/>` or `=> (\n <div/> \n)`.
fn expression_markup(path: &str, text: &str, start: usize) -> Result<Option<Element>, CompileError> {
    let rest = text[start..].strip_prefix('(').unwrap_or(&text[start..]);
    let skipped = text.len() - rest.len();
    let lead = rest.len() - rest.trim_start().len();
    let lt = skipped + lead;
    if !text[lt..].starts_with('<') {
        return Ok(None);
    }
    parse_element(text, lt)
        .map(Some)
        .map_err(|e| CompileError::new(path, line_of(text, e.offset), e.message))
}

fn matching_paren(text: &str, open: usize) -> Option<usize> {
    let mut depth = 0usize;
    for (i, b) in text.bytes().enumerate().skip(open) {
        match b {
            b'(' => depth += 1,
            b')' => {
                depth -= 1;
                if depth == 0 {
                    return Some(i);
                }
            }
            _ => {}
        }
    }
    None
}

/// Read a parameter list: an identifier, a flat destructuring pattern, or nothing.
/// Type annotations are dropped.
fn parse_props(params: &str) -> PropsPattern {
    let params = params.trim();
    if params.is_empty() {
        return PropsPattern::None;
    }
    let Some(inner) = params.strip_prefix('{') else {
        let ident = params.split([':', ',', '=']).next().unwrap_or_default().trim();
        return if is_identifier(ident) { PropsPattern::Ident(ident.to_string()) } else { PropsPattern::None };
    };
    let inner = inner.rfind('}').map_or(inner, |close| &inner[..close]);
    let bindings = split_top_level(inner)
        .into_iter()
        .filter_map(|piece| {
            let piece = piece.trim();
            if let Some(rest) = piece.strip_prefix("...") {
                let local = rest.trim();
                return is_identifier(local)
                    .then(|| PropBinding { key: local.to_string(), local: local.to_string(), default: None, rest: true });
            }
            let (pattern, default) = match piece.split_once('=') {
                Some((p, d)) => (p.trim(), Some(d.trim().to_string())),
                None => (piece, None),
            };
            let (key, local) = match pattern.split_once(':') {
                Some((k, l)) => (k.trim(), l.trim()),
                None => (pattern, pattern),
            };
            (is_identifier(key) && is_identifier(local))
                .then(|| PropBinding { key: key.to_string(), local: local.to_string(), default, rest: false })
        })
        .collect();
    PropsPattern::Destructured(bindings)
}

/// Split on commas that are not nested in brackets, braces or parens.
fn split_top_level(s: &str) -> Vec<&str> {
    let mut parts = Vec::new();
    let mut depth = 0i32;
    let mut start = 0;
    for (i, c) in s.char_indices() {
        match c {
            '(' | '[' | '{' => depth += 1,
            ')' | ']' | '}' => depth -= 1,
            ',' if depth == 0 => {
                parts.push(&s[start..i]);
                start = i + 1;
            }
            _ => {}
        }
    }
    parts.push(&s[start..]);
    parts.into_iter().filter(|p| !p.trim().is_empty()).collect()
}

#[cfg(test)]
#[path = "transform_test.rs"]
mod tests;
