//! Arena-backed document tree the renderer writes into.
//!
//! Node ids are indices into the arena; node 0 is the `<div id="root">`
//! mount point. Serialized HTML carries each element's id in `data-vf-node`
//! so pointer events from the host can be routed back to a node.

pub type NodeId = usize;

pub const ROOT: NodeId = 0;

const VOID_ELEMENTS: &[&str] = &[
    "area", "base", "br", "col", "embed", "hr", "img", "input", "link", "meta", "source", "track", "wbr",
];

#[derive(Debug, Clone, PartialEq, Eq)]
pub enum NodeKind {
    Element { tag: String, attrs: Vec<(String, String)> },
    Text(String),
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct DomNode {
    pub kind: NodeKind,
    pub parent: Option<NodeId>,
    pub children: Vec<NodeId>,
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct DomTree {
    nodes: Vec<DomNode>,
}

impl Default for DomTree {
    fn default() -> Self {
        Self::new()
    }
}

impl DomTree {
    #[must_use]
    pub fn new() -> Self {
        let root = DomNode {
            kind: NodeKind::Element { tag: "div".into(), attrs: vec![("id".into(), "root".into())] },
            parent: None,
            children: Vec::new(),
        };
        Self { nodes: vec![root] }
    }

    fn push(&mut self, parent: NodeId, kind: NodeKind) -> NodeId {
        let id = self.nodes.len();
        self.nodes.push(DomNode { kind, parent: Some(parent), children: Vec::new() });
        if let Some(p) = self.nodes.get_mut(parent) {
            p.children.push(id);
        }
        id
    }

    pub fn append_element(&mut self, parent: NodeId, tag: &str, attrs: Vec<(String, String)>) -> NodeId {
        self.push(parent, NodeKind::Element { tag: tag.to_string(), attrs })
    }

    /// Append text, merging with a preceding text sibling.
    pub fn append_text(&mut self, parent: NodeId, text: &str) {
        if text.is_empty() {
            return;
        }
        let last = self.nodes.get(parent).and_then(|p| p.children.last().copied());
        if let Some(last) = last {
            if let Some(DomNode { kind: NodeKind::Text(existing), .. }) = self.nodes.get_mut(last) {
                existing.push_str(text);
                return;
            }
        }
        self.push(parent, NodeKind::Text(text.to_string()));
    }

    #[must_use]
    pub fn node(&self, id: NodeId) -> Option<&DomNode> {
        self.nodes.get(id)
    }

    #[must_use]
    pub fn len(&self) -> usize {
        self.nodes.len()
    }

    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.nodes.len() <= 1
    }

    #[must_use]
    pub fn tag(&self, id: NodeId) -> Option<&str> {
        match &self.nodes.get(id)?.kind {
            NodeKind::Element { tag, .. } => Some(tag),
            NodeKind::Text(_) => None,
        }
    }

    #[must_use]
    pub fn attr(&self, id: NodeId, name: &str) -> Option<&str> {
        match &self.nodes.get(id)?.kind {
            NodeKind::Element { attrs, .. } => attrs.iter().find(|(k, _)| k == name).map(|(_, v)| v.as_str()),
            NodeKind::Text(_) => None,
        }
    }

    pub fn set_attr(&mut self, id: NodeId, name: &str, value: impl Into<String>) {
        if let Some(DomNode { kind: NodeKind::Element { attrs, .. }, .. }) = self.nodes.get_mut(id) {
            let value = value.into();
            match attrs.iter_mut().find(|(k, _)| k == name) {
                Some(slot) => slot.1 = value,
                None => attrs.push((name.to_string(), value)),
            }
        }
    }

    pub fn remove_attr(&mut self, id: NodeId, name: &str) {
        if let Some(DomNode { kind: NodeKind::Element { attrs, .. }, .. }) = self.nodes.get_mut(id) {
            attrs.retain(|(k, _)| k != name);
        }
    }

    /// Non-empty `id` attribute.
    #[must_use]
    pub fn element_id(&self, id: NodeId) -> Option<&str> {
        self.attr(id, "id").filter(|v| !v.trim().is_empty())
    }

    /// Non-empty `class` attribute.
    #[must_use]
    pub fn class_name(&self, id: NodeId) -> Option<&str> {
        self.attr(id, "class").filter(|v| !v.trim().is_empty())
    }

    /// Concatenated text of the subtree, in document order.
    #[must_use]
    pub fn text_content(&self, id: NodeId) -> String {
        let mut out = String::new();
        self.collect_text(id, &mut out);
        out
    }

    fn collect_text(&self, id: NodeId, out: &mut String) {
        let Some(node) = self.nodes.get(id) else { return };
        match &node.kind {
            NodeKind::Text(t) => out.push_str(t),
            NodeKind::Element { .. } => {
                for &child in &node.children {
                    self.collect_text(child, out);
                }
            }
        }
    }

    /// First element (document order) whose `id` attribute equals `dom_id`.
    #[must_use]
    pub fn find_by_id(&self, dom_id: &str) -> Option<NodeId> {
        self.find(ROOT, &|tree, id| tree.attr(id, "id") == Some(dom_id))
    }

    fn find(&self, from: NodeId, pred: &dyn Fn(&Self, NodeId) -> bool) -> Option<NodeId> {
        if pred(self, from) {
            return Some(from);
        }
        let node = self.nodes.get(from)?;
        node.children.iter().find_map(|&child| self.find(child, pred))
    }

    #[must_use]
    pub fn to_html(&self) -> String {
        let mut out = String::new();
        self.write_html(ROOT, &mut out);
        out
    }

    fn write_html(&self, id: NodeId, out: &mut String) {
        let Some(node) = self.nodes.get(id) else { return };
        match &node.kind {
            NodeKind::Text(t) => out.push_str(&escape_html(t)),
            NodeKind::Element { tag, attrs } => {
                out.push('<');
                out.push_str(tag);
                for (name, value) in attrs {
                    out.push(' ');
                    out.push_str(name);
                    out.push_str("=\"");
                    out.push_str(&escape_html(value));
                    out.push('"');
                }
                if id != ROOT {
                    out.push_str(&format!(" data-vf-node=\"{id}\""));
                }
                out.push('>');
                if VOID_ELEMENTS.contains(&tag.as_str()) {
                    return;
                }
                for &child in &node.children {
                    self.write_html(child, out);
                }
                out.push_str("</");
                out.push_str(tag);
                out.push('>');
            }
        }
    }
}

#[must_use]
pub fn escape_html(s: &str) -> String {
    let mut out = String::with_capacity(s.len());
    for c in s.chars() {
        match c {
            '&' => out.push_str("&amp;"),
            '<' => out.push_str("&lt;"),
            '>' => out.push_str("&gt;"),
            '"' => out.push_str("&quot;"),
            _ => out.push(c),
        }
    }
    out
}
