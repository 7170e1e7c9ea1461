//! Diagnostic overlay rendered inside the preview document.

use serde::Serialize;

use super::dom::escape_html;
use super::error::{CompileError, RuntimeError};

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(rename_all = "lowercase")]
pub enum OverlayKind {
    Compilation,
    Runtime,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct ErrorOverlay {
    pub kind: OverlayKind,
    pub label: &'static str,
    pub message: String,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub file: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub line: Option<usize>,
}

impl ErrorOverlay {
    #[must_use]
    pub fn compilation(err: &CompileError) -> Self {
        Self {
            kind: OverlayKind::Compilation,
            label: "Compilation Error",
            message: err.message.clone(),
            file: Some(err.file.clone()),
            line: Some(err.line),
        }
    }

    #[must_use]
    pub fn runtime(err: &RuntimeError) -> Self {
        Self { kind: OverlayKind::Runtime, label: "Runtime Error", message: err.message.clone(), file: err.file.clone(), line: None }
    }

    #[must_use]
    pub fn to_html(&self) -> String {
        let location = match (&self.file, self.line) {
            (Some(file), Some(line)) => format!("<div class=\"vf-overlay-location\">{}:{line}</div>", escape_html(file)),
            (Some(file), None) => format!("<div class=\"vf-overlay-location\">{}</div>", escape_html(file)),
            _ => String::new(),
        };
        format!(
            "<div id=\"vf-error-overlay\" data-kind=\"{kind}\" style=\"position:fixed;inset:0;z-index:2147483647;\
             background:rgba(24,24,27,0.92);color:#fecaca;font-family:ui-monospace,monospace;padding:24px;overflow:auto\">\
             <div class=\"vf-overlay-label\" style=\"color:#f87171;font-weight:700;margin-bottom:8px\">{label}</div>\
             {location}<pre style=\"white-space:pre-wrap\">{message}</pre></div>",
            kind = match self.kind {
                OverlayKind::Compilation => "compilation",
                OverlayKind::Runtime => "runtime",
            },
            label = self.label,
            message = escape_html(&self.message),
        )
    }
}
