//! Visual-edit mode: hover highlighting and click-to-select.
//!
//! ```text
//! disabled ──toggle(on)──▶ enabled-idle ──over──▶ enabled-hover
//!                               ▲   ◀──out────────┘   │
//!                               │                     click
//!                               └── enabled-selected ◀┘
//! any ──toggle(off)──▶ disabled (outlines, cursor and listeners cleared)
//! ```

use std::collections::BTreeMap;

use super::dom::{DomTree, NodeId, ROOT};
use super::protocol::SelectedElement;

pub const HOVER_OUTLINE: &str = "outline: 2px dashed #60a5fa; outline-offset: 2px";
pub const SELECTED_OUTLINE: &str = "outline: 2px solid #a855f7; outline-offset: 2px";
pub const EDIT_CURSOR: &str = "crosshair";
pub const MAX_TEXT_CONTENT: usize = 100;

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum EditState {
    Disabled,
    EnabledIdle,
    EnabledHover,
    EnabledSelected,
}

/// Result of a pointer click while visual editing.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ClickOutcome {
    /// The click's default action (link navigation, form submit) was suppressed.
    pub default_prevented: bool,
    pub selected: Option<SelectedElement>,
}

#[derive(Debug, Clone, Default)]
pub struct VisualEditor {
    enabled: bool,
    listening: bool,
    cursor: Option<&'static str>,
    hovered: Option<NodeId>,
    selected: Option<NodeId>,
    /// Author `style` values displaced by an outline.
    saved_styles: BTreeMap<NodeId, Option<String>>,
}

impl VisualEditor {
    #[must_use]
    pub fn state(&self) -> EditState {
        match (self.enabled, self.hovered, self.selected) {
            (false, _, _) => EditState::Disabled,
            (true, Some(_), _) => EditState::EnabledHover,
            (true, None, Some(_)) => EditState::EnabledSelected,
            (true, None, None) => EditState::EnabledIdle,
        }
    }

    #[must_use]
    pub fn cursor(&self) -> Option<&'static str> {
        self.cursor
    }

    pub fn set_enabled(&mut self, tree: &mut DomTree, enabled: bool) {
        if enabled {
            self.enabled = true;
            self.listening = true;
            self.cursor = Some(EDIT_CURSOR);
            return;
        }
        for id in [self.hovered.take(), self.selected.take()].into_iter().flatten() {
            self.clear_outline(tree, id);
        }
        *self = Self::default();
    }

    pub fn pointer_over(&mut self, tree: &mut DomTree, id: NodeId) {
        if !self.listening || id == ROOT || tree.tag(id).is_none() {
            return;
        }
        if let Some(prev) = self.hovered.take() {
            self.restore(tree, prev);
        }
        if self.selected != Some(id) {
            self.outline(tree, id, HOVER_OUTLINE);
        }
        self.hovered = Some(id);
    }

    pub fn pointer_out(&mut self, tree: &mut DomTree, id: NodeId) {
        if !self.listening || self.hovered != Some(id) {
            return;
        }
        self.hovered = None;
        self.restore(tree, id);
    }

    /// Select `id`. Outside visual-edit mode the click is left alone.
    pub fn click(&mut self, tree: &mut DomTree, id: NodeId) -> ClickOutcome {
        if !self.listening || tree.tag(id).is_none() {
            return ClickOutcome { default_prevented: false, selected: None };
        }
        if let Some(prev) = self.selected.take() {
            self.clear_outline(tree, prev);
        }
        if let Some(hovered) = self.hovered.take() {
            self.clear_outline(tree, hovered);
        }
        self.outline(tree, id, SELECTED_OUTLINE);
        self.selected = Some(id);
        ClickOutcome { default_prevented: true, selected: Some(describe(tree, id)) }
    }

    /// Nodes currently carrying an outline.
    #[must_use]
    pub fn outlined(&self) -> impl Iterator<Item = NodeId> + '_ {
        self.saved_styles.keys().copied()
    }

    fn restore(&mut self, tree: &mut DomTree, id: NodeId) {
        if self.selected == Some(id) {
            self.outline(tree, id, SELECTED_OUTLINE);
        } else {
            self.clear_outline(tree, id);
        }
    }

    fn outline(&mut self, tree: &mut DomTree, id: NodeId, css: &str) {
        let original = tree.attr(id, "style").map(str::to_string);
        let original = self.saved_styles.entry(id).or_insert(original);
        let style = match original.as_deref() {
            Some(author) if !author.trim().is_empty() => format!("{}; {css}", author.trim_end_matches([';', ' '])),
            _ => css.to_string(),
        };
        tree.set_attr(id, "style", style);
    }

    fn clear_outline(&mut self, tree: &mut DomTree, id: NodeId) {
        match self.saved_styles.remove(&id) {
            Some(Some(author)) => tree.set_attr(id, "style", author),
            Some(None) => tree.remove_attr(id, "style"),
            None => {}
        }
    }
}

/// Build the selection payload for a node.
#[must_use]
pub fn describe(tree: &DomTree, id: NodeId) -> SelectedElement {
    let tag = tree.tag(id).unwrap_or_default().to_string();
    let dom_id = tree.element_id(id).map(str::to_string);
    let class_name = tree.class_name(id).map(str::to_string);
    let text = collapse_whitespace(&tree.text_content(id));
    SelectedElement {
        selector_path: selector_path(&tag, dom_id.as_deref(), class_name.as_deref()),
        tag,
        id: dom_id,
        class_name,
        text_content: (!text.is_empty()).then(|| truncate_chars(&text, MAX_TEXT_CONTENT)),
    }
}

/// `#id`, else `tag.first-class`, else `tag`.
#[must_use]
pub fn selector_path(tag: &str, id: Option<&str>, class_name: Option<&str>) -> String {
    if let Some(id) = id {
        return format!("#{id}");
    }
    match class_name.and_then(|c| c.split_whitespace().next()) {
        Some(class) => format!("{tag}.{class}"),
        None => tag.to_string(),
    }
}

fn collapse_whitespace(s: &str) -> String {
    s.split_whitespace().collect::<Vec<_>>().join(" ")
}

fn truncate_chars(s: &str, max: usize) -> String {
    match s.char_indices().nth(max) {
        Some((cut, _)) => s[..cut].to_string(),
        None => s.to_string(),
    }
}

#[cfg(test)]
#[path = "visual_edit_test.rs"]
mod tests;
