//! Assembles the preview document served to the host frame.

use super::dom::{DomTree, escape_html};
use super::overlay::ErrorOverlay;
use crate::builder::ProjectFileSet;

const TAILWIND_CDN: &str = "https://cdn.tailwindcss.com";

/// Frame-side half of the visual-edit protocol. Pointer events over rendered
/// elements are posted to the host as `POINTER_OVER` / `POINTER_OUT` /
/// `CLICK` with the element's `data-vf-node` id; `PATCH` messages from the
/// host are applied to the live nodes. Events are only posted while a patch
/// has set an edit cursor.
const BRIDGE_SCRIPT: &str = r#"<script data-vf-bridge>(function () {
  var editing = document.body.style.cursor !== '';
  function nodeOf(event) {
    var el = event.target instanceof Element ? event.target.closest('[data-vf-node]') : null;
    return el ? Number(el.getAttribute('data-vf-node')) : null;
  }
  function relay(type) {
    return function (event) {
      if (!editing) return;
      var node = nodeOf(event);
      if (node === null) return;
      if (type === 'CLICK') { event.preventDefault(); event.stopPropagation(); }
      window.parent.postMessage({ type: type, node: node }, '*');
    };
  }
  document.addEventListener('mouseover', relay('POINTER_OVER'), true);
  document.addEventListener('mouseout', relay('POINTER_OUT'), true);
  document.addEventListener('click', relay('CLICK'), true);
  window.addEventListener('message', function (event) {
    var data = event.data;
    if (!data || data.type !== 'PATCH') return;
    (data.styles || []).forEach(function (patch) {
      var el = document.querySelector('[data-vf-node="' + patch.node + '"]');
      if (!el) return;
      if (patch.style === null) el.removeAttribute('style'); else el.setAttribute('style', patch.style);
    });
    document.body.style.cursor = data.cursor || '';
    editing = data.cursor !== null && data.cursor !== undefined;
  });
})();</script>"#;

/// Project stylesheets as `<style>` blocks, in path order.
fn stylesheets(files: &ProjectFileSet) -> String {
    files
        .iter()
        .filter(|(path, _)| path.ends_with(".css"))
        .map(|(path, css)| {
            format!(
                "<style data-file=\"{}\">{}</style>",
                escape_html(path),
                css.replace("</style", "<\\/style")
            )
        })
        .collect()
}

/// Full HTML for the sandbox frame. With an overlay the tree is left empty.
#[must_use]
pub fn render_document(
    files: &ProjectFileSet,
    tree: &DomTree,
    overlay: Option<&ErrorOverlay>,
    cursor: Option<&str>,
) -> String {
    let body_attrs = cursor.map(|c| format!(" style=\"cursor: {c}\"")).unwrap_or_default();
    let body = match overlay {
        Some(overlay) => format!("{}{}", DomTree::new().to_html(), overlay.to_html()),
        None => tree.to_html(),
    };
    format!(
        "<!DOCTYPE html><html lang=\"en\"><head><meta charset=\"utf-8\">\
         <meta name=\"viewport\" content=\"width=device-width, initial-scale=1\">\
         <title>Preview</title><script src=\"{TAILWIND_CDN}\"></script>{styles}</head>\
         <body{body_attrs}>{body}{BRIDGE_SCRIPT}</body></html>",
        styles = stylesheets(files),
    )
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::sandbox::dom::ROOT;
    use crate::sandbox::error::RuntimeError;

    #[test]
    fn injects_stylesheets_and_cursor() {
        let mut files = ProjectFileSet::new();
        files.insert("/app/globals.css", "body { margin: 0 } </style><script>");
        files.insert("/app/page.tsx", "export default function P() { return <main/> }");
        let mut tree = DomTree::new();
        tree.append_element(ROOT, "main", Vec::new());

        let html = render_document(&files, &tree, None, Some("crosshair"));
        assert!(html.contains("<style data-file=\"/app/globals.css\">body { margin: 0 } <\\/style><script></style>"));
        assert!(html.contains("<body style=\"cursor: crosshair\">"));
        assert!(html.contains("<main data-vf-node=\"1\"></main>"));
        assert!(!html.contains("export default"));
        assert!(html.ends_with("</script></body></html>"));
    }

    #[test]
    fn bridge_relays_pointer_events_and_applies_patches() {
        let html = render_document(&ProjectFileSet::new(), &DomTree::new(), None, None);
        let bridge = &html[html.find("<script data-vf-bridge>").unwrap()..];
        for needle in ["'POINTER_OVER'", "'POINTER_OUT'", "'CLICK'", "'PATCH'", "[data-vf-node]", "window.parent.postMessage"] {
            assert!(bridge.contains(needle), "bridge is missing {needle}");
        }
    }

    #[test]
    fn overlay_replaces_the_tree() {
        let mut tree = DomTree::new();
        tree.append_element(ROOT, "main", Vec::new());
        let overlay = ErrorOverlay::runtime(&RuntimeError::new("boom"));
        let html = render_document(&ProjectFileSet::new(), &tree, Some(&overlay), None);
        assert!(html.contains("<body><div id=\"root\"></div><div id=\"vf-error-overlay\""));
        assert!(!html.contains("<main"));
    }
}
