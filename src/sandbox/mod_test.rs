use super::*;

const PAGE: &str = r#"'use client';
import { motion } from 'framer-motion';
import Link from 'next/link';

export default function Page() {
  return (
    <main className="min-h-screen">
      <section id="hero">
        <motion.h1 id="hero-title" className="text-5xl font-bold" animate={{ opacity: 1 }}>
          Jane   Doe
        </motion.h1>
        <Link href="/work" className="btn primary">Work</Link>
      </section>
    </main>
  );
}
"#;

fn files(entries: &[(&str, &str)]) -> ProjectFileSet {
    let mut files = ProjectFileSet::new();
    for (path, content) in entries {
        files.insert(path, *content);
    }
    files
}

#[test]
fn mount_renders_and_announces_readiness() {
    let mut sandbox = PreviewSandbox::mount(&files(&[("/app/page.tsx", PAGE)]));
    assert!(sandbox.overlay().is_none());
    assert!(sandbox.find_by_id("hero-title").is_some());
    assert_eq!(sandbox.take_messages(), vec![SandboxMessage::VisualEditingReady]);
    assert!(sandbox.take_messages().is_empty());
    assert_eq!(sandbox.editor_state(), EditState::Disabled);
}

#[test]
fn unresolved_imports_render_stubs_instead_of_failing() {
    let page = r"import { Marquee } from 'some-ui-kit';
import { Sparkle } from 'framer-motion';

export default function Page() {
  return (
    <main>
      <Marquee speed={2}><span>Hi</span></Marquee>
      <Sparkle />
      <Undeclared />
    </main>
  );
}
";
    let sandbox = PreviewSandbox::mount(&files(&[("/app/page.tsx", page)]));
    assert!(sandbox.overlay().is_none());
    let stubs: Vec<&str> = sandbox.stubs().iter().map(String::as_str).collect();
    assert_eq!(stubs, vec!["Marquee", "Sparkle", "Undeclared"]);
    let html = sandbox.document();
    assert!(html.contains("data-sandbox-stub=\"Marquee\""));
    assert!(html.contains("<span data-vf-node=\"3\">Hi</span>"));
}

#[test]
fn compile_errors_show_a_compilation_overlay() {
    let broken = "export default function Page() {\n  return <main><p>oops</main>;\n}\n";
    let sandbox = PreviewSandbox::mount(&files(&[("/app/page.tsx", broken)]));
    let overlay = sandbox.overlay().unwrap();
    assert_eq!(overlay.kind, overlay::OverlayKind::Compilation);
    assert_eq!(overlay.file.as_deref(), Some("/app/page.tsx"));
    assert_eq!(overlay.line, Some(2));
    assert!(sandbox.document().contains("Compilation Error"));
    assert!(sandbox.tree().is_empty());
}

#[test]
fn runtime_errors_show_a_runtime_overlay() {
    let sandbox = PreviewSandbox::mount(&files(&[("/lib/data.ts", "export const data = [];\n")]));
    let overlay = sandbox.overlay().unwrap();
    assert_eq!(overlay.kind, overlay::OverlayKind::Runtime);
    assert!(overlay.message.starts_with("No entry point found"));
    assert!(sandbox.document().contains("Runtime Error"));
}

#[test]
fn visual_edit_round_trip() {
    let mut sandbox = PreviewSandbox::mount(&files(&[("/app/page.tsx", PAGE)]));
    sandbox.take_messages();

    sandbox.handle_raw_message(r#"{"type":"VISUAL_EDITING_TOGGLE","enabled":true}"#).unwrap();
    assert_eq!(sandbox.editor_state(), EditState::EnabledIdle);
    assert!(sandbox.document().contains("<body style=\"cursor: crosshair\">"));

    let title = sandbox.find_by_id("hero-title").unwrap();
    sandbox.pointer_over(title).unwrap();
    assert_eq!(sandbox.editor_state(), EditState::EnabledHover);

    let outcome = sandbox.click(title).unwrap();
    assert!(outcome.default_prevented);
    assert_eq!(sandbox.editor_state(), EditState::EnabledSelected);

    let messages = sandbox.take_messages();
    let [SandboxMessage::ElementSelected { payload }] = messages.as_slice() else {
        panic!("expected one selection message, got {messages:?}");
    };
    assert_eq!(payload.tag, "h1");
    assert_eq!(payload.selector_path, "#hero-title");
    assert_eq!(payload.class_name.as_deref(), Some("text-5xl font-bold"));
    assert_eq!(payload.text_content.as_deref(), Some("Jane Doe"));

    let json = serde_json::to_value(&messages[0]).unwrap();
    assert_eq!(json["type"], "ELEMENT_SELECTED");
    assert_eq!(json["payload"]["selectorPath"], "#hero-title");

    sandbox.handle_message(HostMessage::VisualEditingToggle { enabled: false }).unwrap();
    assert_eq!(sandbox.editor_state(), EditState::Disabled);
    assert!(!sandbox.document().contains("outline"));
    assert!(!sandbox.document().contains("crosshair"));
}

#[test]
fn clicks_outside_visual_edit_mode_are_ignored() {
    let mut sandbox = PreviewSandbox::mount(&files(&[("/app/page.tsx", PAGE)]));
    sandbox.take_messages();
    let title = sandbox.find_by_id("hero-title").unwrap();
    let outcome = sandbox.click(title).unwrap();
    assert!(!outcome.default_prevented);
    assert!(sandbox.take_messages().is_empty());
}

#[test]
fn boundary_errors() {
    let mut sandbox = PreviewSandbox::mount(&files(&[("/app/page.tsx", PAGE)]));
    let err = sandbox.handle_raw_message(r#"{"type":"RELOAD"}"#).unwrap_err();
    assert!(matches!(err, SandboxError::InvalidMessage(_)));
    let err = sandbox.pointer_over(10_000).unwrap_err();
    assert!(matches!(err, SandboxError::UnknownNode(10_000)));
}

#[test]
fn pointer_messages_return_style_patches() {
    let mut sandbox = PreviewSandbox::mount(&files(&[("/app/page.tsx", PAGE)]));
    let title = sandbox.find_by_id("hero-title").unwrap();

    let patch = sandbox.handle_message(HostMessage::VisualEditingToggle { enabled: true }).unwrap();
    assert!(patch.styles.is_empty());
    assert_eq!(patch.cursor.as_deref(), Some("crosshair"));

    let patch = sandbox.handle_raw_message(&format!(r#"{{"type":"POINTER_OVER","node":{title}}}"#)).unwrap();
    let [StylePatch { node, style: Some(style) }] = patch.styles.as_slice() else {
        panic!("expected one outlined node, got {patch:?}");
    };
    assert_eq!(*node, title);
    assert!(style.contains("outline"));

    let patch = sandbox.handle_message(HostMessage::Click { node: title }).unwrap();
    assert_eq!(patch.styles.len(), 1);
    assert_eq!(sandbox.editor_state(), EditState::EnabledSelected);
    assert!(matches!(sandbox.take_messages().last(), Some(SandboxMessage::ElementSelected { .. })));

    let patch = sandbox.handle_message(HostMessage::VisualEditingToggle { enabled: false }).unwrap();
    let [StylePatch { node, style }] = patch.styles.as_slice() else {
        panic!("expected the selection to be cleared, got {patch:?}");
    };
    assert_eq!(*node, title);
    assert!(!style.as_deref().unwrap_or_default().contains("outline"));
    assert_eq!(patch.cursor, None);

    let err = sandbox.handle_message(HostMessage::PointerOut { node: 10_000 }).unwrap_err();
    assert!(matches!(err, SandboxError::UnknownNode(10_000)));
}

#[test]
fn reload_keeps_edit_mode_and_works_on_a_copy() {
    let mut project = files(&[("/app/page.tsx", PAGE)]);
    let mut sandbox = PreviewSandbox::mount(&project);
    sandbox.handle_message(HostMessage::VisualEditingToggle { enabled: true }).unwrap();
    let title = sandbox.find_by_id("hero-title").unwrap();
    sandbox.click(title).unwrap();

    project.insert("/app/page.tsx", "export default function Page() {\n  return <main id=\"next\" />;\n}\n");
    assert!(sandbox.find_by_id("next").is_none());

    sandbox.reload(&project);
    assert!(sandbox.find_by_id("next").is_some());
    assert_eq!(sandbox.editor_state(), EditState::EnabledIdle);
    assert_eq!(project.get("/app/page.tsx").map(|s| s.contains("next")), Some(true));
}
