//! Structural JSX interpreter.
//!
//! Renders the entry module's default export into a [`DomTree`]. There is no
//! script engine: props flow as strings, markup and component references;
//! expressions the interpreter cannot evaluate render nothing. Unknown
//! symbols render a stub placeholder (see [`super::libraries`]).

use std::collections::{BTreeMap, BTreeSet};
use std::rc::Rc;
use std::sync::LazyLock;

use regex::Regex;
use tracing::debug;

use super::dom::{DomTree, NodeId, ROOT};
use super::error::RuntimeError;
use super::libraries::{Resolved, SymbolTable};
use super::transform::{Component, CompiledModule, PropsPattern};
use crate::analysis::imports::is_identifier;
use crate::analysis::jsx::{AttrValue, Element, MAX_NESTING, Node, jsx_text, parse_element, string_literal};
use crate::builder::is_component_file;

/// Deepest component nesting rendered before giving up.
pub const MAX_DEPTH: usize = 64;

/// Entry modules, in priority order. Without a match the first component
/// file (path order) with a default export is used.
pub const ENTRY_CANDIDATES: &[&str] = &[
    "/app/page.tsx",
    "/app/page.jsx",
    "/src/app/page.tsx",
    "/pages/index.tsx",
    "/pages/index.jsx",
    "/App.tsx",
    "/App.jsx",
    "/src/App.tsx",
    "/src/App.jsx",
];

/// Props consumed by React or framer-motion, never forwarded to the DOM.
const NON_DOM_PROPS: &[&str] = &[
    "key",
    "ref",
    "style",
    "suppressHydrationWarning",
    "dangerouslySetInnerHTML",
    "initial",
    "animate",
    "exit",
    "transition",
    "variants",
    "viewport",
    "whileHover",
    "whileTap",
    "whileInView",
    "whileFocus",
    "whileDrag",
    "layout",
    "layoutId",
    "drag",
    "dragConstraints",
    "priority",
    "fill",
    "sizes",
    "quality",
];

const CLASS_HELPERS: &[&str] = &["clsx(", "cn(", "classNames("];

static STRING_ARG_RE: LazyLock<Regex> =
    LazyLock::new(|| Regex::new(r#"'([^'\n]*)'|"([^"\n]*)""#).expect("string pattern is valid"));

static NUMBER_RE: LazyLock<Regex> =
    LazyLock::new(|| Regex::new(r"^-?\d+(?:\.\d+)?$").expect("number pattern is valid"));

// =============================================================================
// VALUES
// =============================================================================

#[derive(Debug, Clone)]
enum Value {
    Text(String),
    /// Markup passed as a prop (usually `children`) with the scope it was written in.
    Nodes(Rc<[Node]>, Rc<Scope>),
    /// A component reference, e.g. `icon={Github}`.
    Type(Resolved),
    /// A component to mount in place, e.g. the page inside a layout.
    Mount(Resolved),
    Missing,
}

#[derive(Debug)]
struct Scope {
    module: String,
    locals: BTreeMap<String, Value>,
}

pub struct RenderOutput {
    pub tree: DomTree,
    /// Path of the entry module.
    pub entry: String,
    /// Names rendered as stub placeholders.
    pub stubs: BTreeSet<String>,
}

// =============================================================================
// ENTRY
// =============================================================================

fn default_component(module: &CompiledModule) -> Option<String> {
    let name = module.default_export.as_deref()?;
    module.component(name).map(|_| name.to_string())
}

/// The module and component to render.
///
/// # Errors
///
/// Returns a [`RuntimeError`] when no module default-exports a component.
pub fn entry_point(modules: &BTreeMap<String, CompiledModule>) -> Result<(String, String), RuntimeError> {
    let candidates = ENTRY_CANDIDATES
        .iter()
        .filter_map(|path| modules.get(*path))
        .chain(modules.values().filter(|m| is_component_file(&m.path)));
    for module in candidates {
        if let Some(name) = default_component(module) {
            return Ok((module.path.clone(), name));
        }
    }
    Err(RuntimeError::new(
        "No entry point found: add /app/page.tsx with a default-exported component",
    ))
}

/// A `layout` next to an app-router `page`, if it default-exports a component.
fn layout_for(entry: &str, modules: &BTreeMap<String, CompiledModule>) -> Option<(String, String)> {
    let (dir, file) = entry.rsplit_once('/')?;
    if !file.starts_with("page.") {
        return None;
    }
    ["tsx", "jsx"].iter().find_map(|ext| {
        let module = modules.get(&format!("{dir}/layout.{ext}"))?;
        default_component(module).map(|name| (module.path.clone(), name))
    })
}

/// Render the project's entry point.
///
/// # Errors
///
/// Returns a [`RuntimeError`] when there is no entry point, component nesting
/// exceeds [`MAX_DEPTH`], the rendered tree nests deeper than [`MAX_NESTING`]
/// elements, or a non-component value is used as an element type.
pub fn render_project(modules: &BTreeMap<String, CompiledModule>) -> Result<RenderOutput, RuntimeError> {
    let (entry, name) = entry_point(modules)?;
    let tables = modules
        .iter()
        .map(|(path, module)| (path.clone(), SymbolTable::build(module, modules)))
        .collect();
    let mut renderer = Renderer { modules, tables, tree: DomTree::new(), stubs: BTreeSet::new(), nesting: 0 };

    match layout_for(&entry, modules) {
        Some((layout, layout_name)) => {
            let page = Resolved::Component { module: entry.clone(), name };
            let props = BTreeMap::from([("children".to_string(), Value::Mount(page))]);
            renderer.render_component(&layout, &layout_name, props, ROOT, 0)?;
        }
        None => renderer.render_component(&entry, &name, BTreeMap::new(), ROOT, 0)?,
    }

    debug!(entry = %entry, nodes = renderer.tree.len(), stubs = renderer.stubs.len(), "sandbox: rendered");
    Ok(RenderOutput { tree: renderer.tree, entry, stubs: renderer.stubs })
}

// =============================================================================
// RENDERER
// =============================================================================

struct Renderer<'m> {
    modules: &'m BTreeMap<String, CompiledModule>,
    tables: BTreeMap<String, SymbolTable>,
    tree: DomTree,
    stubs: BTreeSet<String>,
    /// Elements on the render stack, across component boundaries.
    nesting: usize,
}

impl Renderer<'_> {
    fn render_component(
        &mut self,
        module: &str,
        name: &str,
        props: BTreeMap<String, Value>,
        parent: NodeId,
        depth: usize,
    ) -> Result<(), RuntimeError> {
        if depth > MAX_DEPTH {
            return Err(RuntimeError::new(format!(
                "Maximum component depth ({MAX_DEPTH}) exceeded while rendering `{name}`"
            ))
            .in_file(module));
        }
        let modules = self.modules;
        let Some(compiled) = modules.get(module) else {
            self.stub(name, parent);
            return Ok(());
        };
        let Some(component) = compiled.component(name) else {
            if compiled.is_value(name) {
                return Err(not_a_component(name, module));
            }
            self.stub(name, parent);
            return Ok(());
        };
        let scope = Rc::new(bind_props(module, component, props));
        match &component.markup {
            Some(markup) => self.render_element(markup, &scope, parent, depth),
            None => Ok(()),
        }
    }

    fn render_element(&mut self, el: &Element, scope: &Rc<Scope>, parent: NodeId, depth: usize) -> Result<(), RuntimeError> {
        if self.nesting >= MAX_NESTING {
            return Err(
                RuntimeError::new(format!("Markup nested deeper than {MAX_NESTING} elements")).in_file(&scope.module)
            );
        }
        self.nesting += 1;
        let result = self.render_element_body(el, scope, parent, depth);
        self.nesting -= 1;
        result
    }

    fn render_element_body(
        &mut self,
        el: &Element,
        scope: &Rc<Scope>,
        parent: NodeId,
        depth: usize,
    ) -> Result<(), RuntimeError> {
        if el.is_fragment() {
            return self.render_children(&el.children, scope, parent, depth);
        }
        match self.resolve_tag(&el.name, scope) {
            Resolved::Passthrough => self.render_children(&el.children, scope, parent, depth),
            Resolved::Intrinsic(tag) => self.render_intrinsic(&tag, el, scope, parent, depth),
            Resolved::Icon(name) => {
                self.render_icon(&name, el, scope, parent);
                Ok(())
            }
            Resolved::Component { module, name } => {
                let props = self.collect_props(el, scope);
                self.render_component(&module, &name, props, parent, depth + 1)
            }
            Resolved::Value(name) => Err(not_a_component(&name, &scope.module)),
            Resolved::Stub(name) => {
                let id = self.stub(&name, parent);
                self.render_children(&el.children, scope, id, depth)
            }
            Resolved::MotionNamespace | Resolved::LibraryNamespace(_) => {
                let id = self.stub(&el.name, parent);
                self.render_children(&el.children, scope, id, depth)
            }
        }
    }

    fn render_children(&mut self, nodes: &[Node], scope: &Rc<Scope>, parent: NodeId, depth: usize) -> Result<(), RuntimeError> {
        for node in nodes {
            match node {
                Node::Text(raw) => {
                    if let Some(text) = jsx_text(raw) {
                        self.tree.append_text(parent, &text);
                    }
                }
                Node::Element(el) => self.render_element(el, scope, parent, depth)?,
                Node::Expr(expr) => {
                    // Markup inside an expression (a `.map` body, a `cond &&` branch) renders once.
                    if let Some(first) = expr.markup.first() {
                        self.render_element(first, scope, parent, depth)?;
                        continue;
                    }
                    match self.eval(&expr.source, scope) {
                        Value::Text(text) => self.tree.append_text(parent, &text),
                        Value::Nodes(nodes, captured) => self.render_children(&nodes, &captured, parent, depth)?,
                        Value::Mount(Resolved::Component { module, name }) => {
                            self.render_component(&module, &name, BTreeMap::new(), parent, depth + 1)?;
                        }
                        Value::Mount(_) | Value::Type(_) | Value::Missing => {}
                    }
                }
            }
        }
        Ok(())
    }

    fn render_intrinsic(
        &mut self,
        tag: &str,
        el: &Element,
        scope: &Rc<Scope>,
        parent: NodeId,
        depth: usize,
    ) -> Result<(), RuntimeError> {
        match tag {
            // The document shell belongs to the sandbox, not the page.
            "html" | "body" => return self.render_children(&el.children, scope, parent, depth),
            "head" | "script" => return Ok(()),
            _ => {}
        }
        let attrs = self.dom_attrs(el, scope);
        let id = self.tree.append_element(parent, tag, attrs);
        self.render_children(&el.children, scope, id, depth)
    }

    fn render_icon(&mut self, name: &str, el: &Element, scope: &Rc<Scope>, parent: NodeId) {
        let size = match el.attr("size") {
            Some(AttrValue::Str(s)) => s.clone(),
            Some(AttrValue::Expr(e)) => match self.eval(e, scope) {
                Value::Text(t) => t,
                _ => "24".into(),
            },
            _ => "24".into(),
        };
        let mut attrs: Vec<(String, String)> = [
            ("xmlns", "http://www.w3.org/2000/svg"),
            ("width", size.as_str()),
            ("height", size.as_str()),
            ("viewBox", "0 0 24 24"),
            ("fill", "none"),
            ("stroke", "currentColor"),
            ("stroke-width", "2"),
            ("aria-hidden", "true"),
            ("data-icon", name),
        ]
        .into_iter()
        .map(|(k, v)| (k.to_string(), v.to_string()))
        .collect();
        attrs.extend(self.dom_attrs(el, scope).into_iter().filter(|(k, _)| k == "class"));
        self.tree.append_element(parent, "svg", attrs);
    }

    fn stub(&mut self, name: &str, parent: NodeId) -> NodeId {
        if self.stubs.insert(name.to_string()) {
            debug!(symbol = name, "sandbox: rendering stub");
        }
        self.tree
            .append_element(parent, "div", vec![("data-sandbox-stub".into(), name.to_string())])
    }

    fn resolve_tag(&self, name: &str, scope: &Scope) -> Resolved {
        if name.starts_with(char::is_uppercase) || name.contains('.') {
            match scope.locals.get(name) {
                Some(Value::Type(r) | Value::Mount(r)) => return r.clone(),
                Some(Value::Text(_) | Value::Nodes(..)) => return Resolved::Value(name.to_string()),
                Some(Value::Missing) => return Resolved::Stub(name.to_string()),
                None => {}
            }
        }
        self.tables
            .get(&scope.module)
            .map_or_else(|| Resolved::Stub(name.to_string()), |t| t.resolve(name))
    }

    fn collect_props(&self, el: &Element, scope: &Rc<Scope>) -> BTreeMap<String, Value> {
        let mut props = BTreeMap::new();
        for attr in &el.attrs {
            match &attr.value {
                AttrValue::Expr(e) if attr.name == "..." => {
                    let prefix = format!("{}.", e.trim());
                    for (k, v) in &scope.locals {
                        if let Some(key) = k.strip_prefix(&prefix) {
                            props.insert(key.to_string(), v.clone());
                        }
                    }
                }
                AttrValue::Str(s) => {
                    props.insert(attr.name.clone(), Value::Text(s.clone()));
                }
                AttrValue::Flag => {
                    props.insert(attr.name.clone(), Value::Text("true".into()));
                }
                AttrValue::Expr(e) => {
                    props.insert(attr.name.clone(), self.eval(e, scope));
                }
            }
        }
        if !el.children.is_empty() {
            props.insert("children".into(), Value::Nodes(Rc::from(el.children.clone()), Rc::clone(scope)));
        }
        props
    }

    fn dom_attrs(&self, el: &Element, scope: &Rc<Scope>) -> Vec<(String, String)> {
        let mut attrs = Vec::new();
        for attr in &el.attrs {
            let name = attr.name.as_str();
            if name == "..." || NON_DOM_PROPS.contains(&name) || is_event_handler(name) {
                continue;
            }
            let value = match &attr.value {
                AttrValue::Str(s) => Some(s.clone()),
                AttrValue::Flag => Some(String::new()),
                AttrValue::Expr(e) => match self.eval(e, scope) {
                    Value::Text(t) => Some(t),
                    _ => None,
                },
            };
            let name = match name {
                "className" => "class",
                "htmlFor" => "for",
                other => other,
            };
            if let Some(value) = value {
                attrs.push((name.to_string(), value));
            }
        }
        attrs
    }

    /// Evaluate the small expression subset the preview understands.
    fn eval(&self, source: &str, scope: &Rc<Scope>) -> Value {
        let s = source.trim();
        if s.is_empty() || (s.starts_with("/*") && s.ends_with("*/")) {
            return Value::Missing;
        }
        if let Some(text) = string_literal(s) {
            return Value::Text(text);
        }
        if s.len() >= 2 && s.starts_with('`') && s.ends_with('`') {
            return Value::Text(self.interpolate(&s[1..s.len() - 1], scope));
        }
        if s.starts_with('<') {
            return match parse_element(s, 0) {
                Ok(el) => Value::Nodes(Rc::from(vec![Node::Element(el)]), Rc::clone(scope)),
                Err(_) => Value::Missing,
            };
        }
        if let Some(inner) = s.strip_prefix('(').and_then(|r| r.strip_suffix(')')) {
            return self.eval(inner, scope);
        }
        if NUMBER_RE.is_match(s) {
            return Value::Text(s.to_string());
        }
        if CLASS_HELPERS.iter().any(|h| s.starts_with(h)) {
            let classes: Vec<&str> = STRING_ARG_RE
                .captures_iter(s)
                .filter_map(|c| c.get(1).or_else(|| c.get(2)))
                .map(|m| m.as_str().trim())
                .filter(|c| !c.is_empty())
                .collect();
            return Value::Text(classes.join(" "));
        }
        if s.split('.').all(is_identifier) {
            if let Some(value) = scope.locals.get(s) {
                return value.clone();
            }
            let table = self.tables.get(&scope.module);
            if let Some(text) = table.and_then(|t| t.string(s)) {
                return Value::Text(text.to_string());
            }
            if s.starts_with(char::is_uppercase) {
                if let Some(table) = table {
                    return Value::Type(table.resolve(s));
                }
            }
        }
        Value::Missing
    }

    /// Template literal body with `${...}` parts evaluated; unknown parts are dropped.
    fn interpolate(&self, body: &str, scope: &Rc<Scope>) -> String {
        let mut out = String::new();
        let mut rest = body;
        while let Some(start) = rest.find("${") {
            out.push_str(&rest[..start]);
            let after = &rest[start + 2..];
            let Some(end) = after.find('}') else {
                rest = "";
                break;
            };
            if let Value::Text(t) = self.eval(&after[..end], scope) {
                out.push_str(&t);
            }
            rest = &after[end + 1..];
        }
        out.push_str(rest);
        out
    }
}

fn is_event_handler(name: &str) -> bool {
    name.strip_prefix("on").is_some_and(|rest| rest.starts_with(char::is_uppercase))
}

fn not_a_component(name: &str, module: &str) -> RuntimeError {
    RuntimeError::new(format!("Element type is invalid: `{name}` is a value, not a component")).in_file(module)
}

fn bind_props(module: &str, component: &Component, props: BTreeMap<String, Value>) -> Scope {
    let mut locals = BTreeMap::new();
    match &component.props {
        PropsPattern::None => {}
        PropsPattern::Ident(ident) => {
            for (key, value) in props {
                locals.insert(format!("{ident}.{key}"), value);
            }
        }
        PropsPattern::Destructured(bindings) => {
            for binding in bindings {
                if binding.rest {
                    for (key, value) in &props {
                        locals.insert(format!("{}.{key}", binding.local), value.clone());
                    }
                    continue;
                }
                let value = props
                    .get(&binding.key)
                    .cloned()
                    .or_else(|| binding.default.as_deref().and_then(string_literal).map(Value::Text))
                    .unwrap_or(Value::Missing);
                locals.insert(binding.local.clone(), value);
            }
        }
    }
    Scope { module: module.to_string(), locals }
}

#[cfg(test)]
#[path = "render_test.rs"]
mod tests;
