//! Preview sandbox.
//!
//! Compiles a snapshot of the project, renders the entry component into a
//! document tree and hosts the visual-edit protocol. Failures never escape:
//! compile errors, render errors and interpreter panics all become an
//! [`ErrorOverlay`] inside the preview document.

pub mod document;
pub mod dom;
pub mod error;
pub mod libraries;
pub mod overlay;
pub mod protocol;
pub mod render;
pub mod transform;
pub mod visual_edit;

use std::collections::{BTreeMap, BTreeSet};
use std::panic::{AssertUnwindSafe, catch_unwind};

use tracing::{debug, warn};

use crate::builder::{ProjectFileSet, is_script_file};
use dom::{DomTree, NodeId};
pub use error::{CompileError, RuntimeError, SandboxError};
pub use overlay::ErrorOverlay;
pub use protocol::{FramePatch, HostMessage, SandboxMessage, SelectedElement};
use protocol::StylePatch;
use transform::CompiledModule;
pub use visual_edit::{ClickOutcome, EditState};
use visual_edit::VisualEditor;

/// Compile every script module in the snapshot.
///
/// # Errors
///
/// Returns the first [`CompileError`] in path order.
pub fn compile_project(files: &ProjectFileSet) -> Result<BTreeMap<String, CompiledModule>, CompileError> {
    files
        .iter()
        .filter(|(path, _)| is_script_file(path))
        .map(|(path, source)| transform::compile_module(path, source).map(|m| (path.to_string(), m)))
        .collect()
}

fn panic_message(payload: &(dyn std::any::Any + Send)) -> String {
    payload
        .downcast_ref::<&str>()
        .map(|s| (*s).to_string())
        .or_else(|| payload.downcast_ref::<String>().cloned())
        .unwrap_or_else(|| "render panicked".to_string())
}

// =============================================================================
// HOST
// =============================================================================

pub struct PreviewSandbox {
    files: ProjectFileSet,
    tree: DomTree,
    overlay: Option<ErrorOverlay>,
    stubs: BTreeSet<String>,
    editor: VisualEditor,
    outbox: Vec<SandboxMessage>,
}

impl PreviewSandbox {
    /// Mount a copy of `files`. The caller's file set is never touched.
    #[must_use]
    pub fn mount(files: &ProjectFileSet) -> Self {
        let mut sandbox = Self {
            files: files.clone(),
            tree: DomTree::new(),
            overlay: None,
            stubs: BTreeSet::new(),
            editor: VisualEditor::default(),
            outbox: Vec::new(),
        };
        sandbox.render();
        sandbox
    }

    /// Re-render from a new snapshot. Visual-edit mode stays on if it was on;
    /// hover and selection are dropped with the old tree.
    pub fn reload(&mut self, files: &ProjectFileSet) {
        let was_enabled = self.editor.state() != EditState::Disabled;
        self.files = files.clone();
        self.editor = VisualEditor::default();
        self.render();
        if was_enabled {
            self.editor.set_enabled(&mut self.tree, true);
        }
    }

    fn render(&mut self) {
        self.tree = DomTree::new();
        self.overlay = None;
        self.stubs.clear();

        match compile_project(&self.files) {
            Err(err) => {
                warn!(file = %err.file, line = err.line, error = %err.message, "sandbox: compilation failed");
                self.overlay = Some(ErrorOverlay::compilation(&err));
            }
            Ok(modules) => match catch_unwind(AssertUnwindSafe(|| render::render_project(&modules))) {
                Ok(Ok(output)) => {
                    debug!(entry = %output.entry, stubs = ?output.stubs, "sandbox: mounted");
                    self.tree = output.tree;
                    self.stubs = output.stubs;
                }
                Ok(Err(err)) => {
                    warn!(error = %err, file = ?err.file, "sandbox: runtime error");
                    self.overlay = Some(ErrorOverlay::runtime(&err));
                }
                Err(payload) => {
                    let err = RuntimeError::new(panic_message(payload.as_ref()));
                    warn!(error = %err, "sandbox: render panicked");
                    self.overlay = Some(ErrorOverlay::runtime(&err));
                }
            },
        }
        self.outbox.push(SandboxMessage::VisualEditingReady);
    }

    /// Apply one host message and report the style changes the live frame
    /// needs to mirror.
    ///
    /// # Errors
    ///
    /// Returns [`SandboxError::UnknownNode`] for pointer events on ids not in
    /// the current tree.
    pub fn handle_message(&mut self, message: HostMessage) -> Result<FramePatch, SandboxError> {
        let before: BTreeSet<NodeId> = self.editor.outlined().collect();
        match message {
            HostMessage::VisualEditingToggle { enabled } => {
                debug!(enabled, "sandbox: visual editing toggled");
                self.editor.set_enabled(&mut self.tree, enabled);
            }
            HostMessage::PointerOver { node } => self.pointer_over(node)?,
            HostMessage::PointerOut { node } => self.pointer_out(node)?,
            HostMessage::Click { node } => {
                self.click(node)?;
            }
        }
        let mut touched = before;
        touched.extend(self.editor.outlined());
        let styles = touched
            .into_iter()
            .map(|node| StylePatch { node, style: self.tree.attr(node, "style").map(str::to_string) })
            .collect();
        Ok(FramePatch { styles, cursor: self.editor.cursor().map(str::to_string) })
    }

    /// Handle a JSON message posted by the host.
    ///
    /// # Errors
    ///
    /// Returns [`SandboxError::InvalidMessage`] for malformed or unknown
    /// messages, and whatever [`Self::handle_message`] returns.
    pub fn handle_raw_message(&mut self, raw: &str) -> Result<FramePatch, SandboxError> {
        let message: HostMessage = serde_json::from_str(raw)?;
        self.handle_message(message)
    }

    fn check_node(&self, id: NodeId) -> Result<(), SandboxError> {
        match self.tree.node(id) {
            Some(_) => Ok(()),
            None => Err(SandboxError::UnknownNode(id)),
        }
    }

    /// # Errors
    ///
    /// Returns [`SandboxError::UnknownNode`] for ids not in the current tree.
    pub fn pointer_over(&mut self, id: NodeId) -> Result<(), SandboxError> {
        self.check_node(id)?;
        self.editor.pointer_over(&mut self.tree, id);
        Ok(())
    }

    /// # Errors
    ///
    /// Returns [`SandboxError::UnknownNode`] for ids not in the current tree.
    pub fn pointer_out(&mut self, id: NodeId) -> Result<(), SandboxError> {
        self.check_node(id)?;
        self.editor.pointer_out(&mut self.tree, id);
        Ok(())
    }

    /// Click a node. A selection is also queued as `ELEMENT_SELECTED`.
    ///
    /// # Errors
    ///
    /// Returns [`SandboxError::UnknownNode`] for ids not in the current tree.
    pub fn click(&mut self, id: NodeId) -> Result<ClickOutcome, SandboxError> {
        self.check_node(id)?;
        let outcome = self.editor.click(&mut self.tree, id);
        if let Some(selected) = &outcome.selected {
            self.outbox.push(SandboxMessage::ElementSelected { payload: selected.clone() });
        }
        Ok(outcome)
    }

    /// Drain outbound messages.
    pub fn take_messages(&mut self) -> Vec<SandboxMessage> {
        std::mem::take(&mut self.outbox)
    }

    #[cfg(test)]
    #[must_use]
    pub fn tree(&self) -> &DomTree {
        &self.tree
    }

    #[must_use]
    pub fn overlay(&self) -> Option<&ErrorOverlay> {
        self.overlay.as_ref()
    }

    /// Names rendered as stub placeholders in the current tree.
    #[must_use]
    pub fn stubs(&self) -> &BTreeSet<String> {
        &self.stubs
    }

    #[must_use]
    pub fn editor_state(&self) -> EditState {
        self.editor.state()
    }

    #[cfg(test)]
    #[must_use]
    pub fn find_by_id(&self, dom_id: &str) -> Option<NodeId> {
        self.tree.find_by_id(dom_id)
    }

    #[must_use]
    pub fn document(&self) -> String {
        document::render_document(&self.files, &self.tree, self.overlay.as_ref(), self.editor.cursor())
    }
}

#[cfg(test)]
#[path = "mod_test.rs"]
mod tests;
