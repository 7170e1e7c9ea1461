//! Messages exchanged between the host page and the preview sandbox.
//!
//! Both directions are JSON objects tagged by `type`:
//!
//! - host → sandbox: `{"type":"VISUAL_EDITING_TOGGLE","enabled":true}`, and
//!   the frame bridge's pointer events `POINTER_OVER` / `POINTER_OUT` /
//!   `CLICK` carrying the `data-vf-node` id
//! - sandbox → host: `{"type":"VISUAL_EDITING_READY"}`,
//!   `{"type":"ELEMENT_SELECTED","payload":{...}}`
//! - sandbox → frame: `{"type":"PATCH","styles":[...],"cursor":...}` after
//!   each host message

use serde::{Deserialize, Serialize};

use super::dom::NodeId;

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(tag = "type")]
pub enum HostMessage {
    #[serde(rename = "VISUAL_EDITING_TOGGLE")]
    VisualEditingToggle { enabled: bool },
    #[serde(rename = "POINTER_OVER")]
    PointerOver { node: NodeId },
    #[serde(rename = "POINTER_OUT")]
    PointerOut { node: NodeId },
    #[serde(rename = "CLICK")]
    Click { node: NodeId },
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(tag = "type")]
pub enum SandboxMessage {
    #[serde(rename = "VISUAL_EDITING_READY")]
    VisualEditingReady,
    #[serde(rename = "ELEMENT_SELECTED")]
    ElementSelected { payload: SelectedElement },
}

/// Live-frame update: the current `style` of every node whose outline
/// changed, and the body cursor (`None` outside visual-edit mode).
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize)]
#[serde(tag = "type", rename = "PATCH")]
pub struct FramePatch {
    pub styles: Vec<StylePatch>,
    pub cursor: Option<String>,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct StylePatch {
    pub node: NodeId,
    /// `None` removes the attribute.
    pub style: Option<String>,
}

/// The element the user clicked in visual-edit mode. Sent to the host and fed
/// into the next turn's prompt.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct SelectedElement {
    pub tag: String,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub id: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub class_name: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub text_content: Option<String>,
    pub selector_path: String,
}
