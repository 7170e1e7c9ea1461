//! Symbol resolution for the preview.
//!
//! Each module gets a [`SymbolTable`] mapping local names to what they render
//! as. Whitelisted libraries resolve to in-process stand-ins; anything the
//! table cannot place (unknown exports, packages outside the whitelist,
//! missing project files, free identifiers) resolves to [`Resolved::Stub`],
//! which renders a neutral placeholder instead of failing.

use std::collections::BTreeMap;

use super::transform::CompiledModule;
use crate::analysis::imports::Imported;
use crate::catalog::{MOTION_PASSTHROUGH, is_known_icon, is_whitelisted};

#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Resolved {
    /// A component declared in a project module.
    Component { module: String, name: String },
    /// A plain DOM element.
    Intrinsic(String),
    /// `motion` from framer-motion: `motion.div` renders a `div`.
    MotionNamespace,
    /// `import * as X from '<library>'`.
    LibraryNamespace(String),
    /// Renders its children only (`Fragment`, `AnimatePresence`, ...).
    Passthrough,
    Icon(String),
    /// A module-level value that is not a component.
    Value(String),
    Stub(String),
}

/// What an export of a whitelisted library renders as.
#[must_use]
pub fn library_export(source: &str, export: &str) -> Resolved {
    let stub = || Resolved::Stub(export.to_string());
    match source {
        "react" => match export {
            "Fragment" | "StrictMode" | "Suspense" | "Profiler" => Resolved::Passthrough,
            "default" => Resolved::LibraryNamespace(source.to_string()),
            _ => stub(),
        },
        "framer-motion" => match export {
            "motion" | "m" => Resolved::MotionNamespace,
            e if MOTION_PASSTHROUGH.contains(&e) => Resolved::Passthrough,
            _ => stub(),
        },
        "lucide-react" => {
            if export == "default" {
                Resolved::LibraryNamespace(source.to_string())
            } else if is_known_icon(export) {
                Resolved::Icon(export.strip_suffix("Icon").filter(|b| !b.is_empty()).unwrap_or(export).to_string())
            } else {
                stub()
            }
        }
        "next/link" if export == "default" => Resolved::Intrinsic("a".into()),
        "next/image" if export == "default" => Resolved::Intrinsic("img".into()),
        "react-intersection-observer" if export == "InView" => Resolved::Passthrough,
        _ => stub(),
    }
}

/// Resolve an import specifier from `from` to a project file path.
///
/// Handles relative paths and the `@/` alias (project root, then `/src`),
/// trying the usual extensions and `index` files.
#[must_use]
pub fn resolve_module_path<'a>(from: &str, specifier: &str, paths: impl Iterator<Item = &'a str> + Clone) -> Option<String> {
    let bases: Vec<String> = if let Some(rest) = specifier.strip_prefix("@/") {
        vec![format!("/{rest}"), format!("/src/{rest}")]
    } else if specifier.starts_with("./") || specifier.starts_with("../") {
        let dir = from.rsplit_once('/').map_or("", |(dir, _)| dir);
        vec![normalize_dots(&format!("{dir}/{specifier}"))]
    } else if specifier.starts_with('/') {
        vec![normalize_dots(specifier)]
    } else {
        return None;
    };
    bases.iter().find_map(|base| {
        MODULE_SUFFIXES.iter().find_map(|suffix| {
            let candidate = format!("{base}{suffix}");
            paths.clone().any(|p| p == candidate).then_some(candidate)
        })
    })
}

const MODULE_SUFFIXES: [&str; 9] =
    ["", ".tsx", ".jsx", ".ts", ".js", "/index.tsx", "/index.jsx", "/index.ts", "/index.js"];

fn normalize_dots(path: &str) -> String {
    let mut parts: Vec<&str> = Vec::new();
    for seg in path.split('/') {
        match seg {
            "" | "." => {}
            ".." => {
                parts.pop();
            }
            s => parts.push(s),
        }
    }
    format!("/{}", parts.join("/"))
}

// =============================================================================
// SYMBOL TABLE
// =============================================================================

/// Per-module bindings, built once per render.
#[derive(Debug, Clone, Default)]
pub struct SymbolTable {
    bindings: BTreeMap<String, Resolved>,
    strings: BTreeMap<String, String>,
}

impl SymbolTable {
    #[must_use]
    pub fn build(module: &CompiledModule, modules: &BTreeMap<String, CompiledModule>) -> Self {
        let mut table = Self::default();
        for name in module.components.keys().chain(module.aliases.keys()) {
            table.bindings.insert(
                name.clone(),
                Resolved::Component { module: module.path.clone(), name: name.clone() },
            );
        }
        for name in &module.values {
            table.bindings.insert(name.clone(), Resolved::Value(name.clone()));
        }
        table.strings.extend(module.string_consts.clone());

        for decl in module.imports.iter().filter(|d| !d.type_only) {
            let target = resolve_module_path(&module.path, &decl.source, modules.keys().map(String::as_str))
                .and_then(|path| modules.get(&path));
            for binding in &decl.bindings {
                let resolved = match (target, &binding.imported) {
                    (Some(target), imported) => {
                        if let Imported::Named(name) = imported {
                            if let Some(value) = target.string_consts.get(name) {
                                table.strings.insert(binding.local.clone(), value.clone());
                            }
                        }
                        project_export(target, imported, &binding.local)
                    }
                    (None, Imported::Namespace) if is_whitelisted(&decl.source) => {
                        Resolved::LibraryNamespace(decl.source.clone())
                    }
                    (None, Imported::Default) if is_whitelisted(&decl.source) => library_export(&decl.source, "default"),
                    (None, Imported::Named(name)) if is_whitelisted(&decl.source) => library_export(&decl.source, name),
                    (None, _) => Resolved::Stub(binding.local.clone()),
                };
                table.bindings.insert(binding.local.clone(), resolved);
            }
        }
        table
    }

    /// Resolve a tag name. Lowercase names are DOM elements; member names
    /// resolve through their namespace; anything unknown is a stub.
    #[must_use]
    pub fn resolve(&self, name: &str) -> Resolved {
        if let Some((head, member)) = name.split_once('.') {
            return match self.bindings.get(head) {
                Some(Resolved::MotionNamespace) => {
                    Resolved::Intrinsic(member.split('.').next().unwrap_or(member).to_string())
                }
                Some(Resolved::LibraryNamespace(lib)) => library_export(lib, member),
                _ => Resolved::Stub(name.to_string()),
            };
        }
        if name.chars().next().is_some_and(char::is_lowercase) {
            return Resolved::Intrinsic(name.to_string());
        }
        self.bindings.get(name).cloned().unwrap_or_else(|| Resolved::Stub(name.to_string()))
    }

    /// A string constant visible under `name` (declared or imported).
    #[must_use]
    pub fn string(&self, name: &str) -> Option<&str> {
        self.strings.get(name).map(String::as_str)
    }
}

fn project_export(target: &CompiledModule, imported: &Imported, local: &str) -> Resolved {
    let name = match imported {
        Imported::Default => target.default_export.as_deref(),
        Imported::Named(name) => Some(name.as_str()),
        Imported::Namespace => None,
    };
    match name {
        Some(name) if target.component(name).is_some() => {
            Resolved::Component { module: target.path.clone(), name: name.to_string() }
        }
        Some(name) if target.is_value(name) => Resolved::Value(local.to_string()),
        _ => Resolved::Stub(local.to_string()),
    }
}
