use super::*;

fn page() -> (DomTree, NodeId, NodeId, NodeId) {
    let mut tree = DomTree::new();
    let section = tree.append_element(ROOT, "section", vec![("class".into(), "hero  dark".into())]);
    let h1 = tree.append_element(section, "h1", vec![("id".into(), "hero-title".into())]);
    tree.append_text(h1, "  Jane\n   Doe ");
    let a = tree.append_element(section, "a", vec![("href".into(), "/work".into())]);
    tree.append_text(a, "Work");
    (tree, section, h1, a)
}

#[test]
fn starts_disabled_and_ignores_pointer_events() {
    let (mut tree, _, h1, _) = page();
    let mut editor = VisualEditor::default();
    editor.pointer_over(&mut tree, h1);
    let outcome = editor.click(&mut tree, h1);
    assert_eq!(editor.state(), EditState::Disabled);
    assert!(!outcome.default_prevented);
    assert_eq!(outcome.selected, None);
    assert_eq!(tree.attr(h1, "style"), None);
}

#[test]
fn hover_then_click_selects() {
    let (mut tree, _, h1, _) = page();
    let mut editor = VisualEditor::default();
    editor.set_enabled(&mut tree, true);
    assert_eq!(editor.state(), EditState::EnabledIdle);
    assert_eq!(editor.cursor(), Some("crosshair"));

    editor.pointer_over(&mut tree, h1);
    assert_eq!(editor.state(), EditState::EnabledHover);
    assert_eq!(tree.attr(h1, "style"), Some(HOVER_OUTLINE));

    let outcome = editor.click(&mut tree, h1);
    assert!(outcome.default_prevented);
    assert_eq!(editor.state(), EditState::EnabledSelected);
    assert_eq!(tree.attr(h1, "style"), Some(SELECTED_OUTLINE));
    let selected = outcome.selected.unwrap();
    assert_eq!(selected.tag, "h1");
    assert_eq!(selected.id.as_deref(), Some("hero-title"));
    assert_eq!(selected.selector_path, "#hero-title");
    assert_eq!(selected.text_content.as_deref(), Some("Jane Doe"));
}

#[test]
fn pointer_out_reverts_to_idle() {
    let (mut tree, section, _, _) = page();
    let mut editor = VisualEditor::default();
    editor.set_enabled(&mut tree, true);
    editor.pointer_over(&mut tree, section);
    editor.pointer_out(&mut tree, section);
    assert_eq!(editor.state(), EditState::EnabledIdle);
    assert_eq!(tree.attr(section, "style"), None);
}

#[test]
fn root_is_never_highlighted() {
    let (mut tree, _, _, _) = page();
    let mut editor = VisualEditor::default();
    editor.set_enabled(&mut tree, true);
    editor.pointer_over(&mut tree, ROOT);
    assert_eq!(editor.state(), EditState::EnabledIdle);
    assert_eq!(tree.attr(ROOT, "style"), None);
}

#[test]
fn new_selection_clears_the_previous_one() {
    let (mut tree, section, h1, a) = page();
    let mut editor = VisualEditor::default();
    editor.set_enabled(&mut tree, true);
    editor.click(&mut tree, h1);
    let outcome = editor.click(&mut tree, section);
    assert_eq!(tree.attr(h1, "style"), None);
    assert_eq!(tree.attr(section, "style"), Some(SELECTED_OUTLINE));
    assert_eq!(outcome.selected.unwrap().selector_path, "section.hero");

    // Hovering away from and back over the selection keeps its outline.
    editor.pointer_over(&mut tree, a);
    editor.pointer_out(&mut tree, a);
    assert_eq!(tree.attr(a, "style"), None);
    assert_eq!(editor.state(), EditState::EnabledSelected);
}

#[test]
fn disabling_clears_everything() {
    let (mut tree, section, h1, _) = page();
    let mut editor = VisualEditor::default();
    editor.set_enabled(&mut tree, true);
    editor.click(&mut tree, h1);
    editor.pointer_over(&mut tree, section);
    editor.set_enabled(&mut tree, false);
    assert_eq!(editor.state(), EditState::Disabled);
    assert_eq!(editor.cursor(), None);
    assert!(!editor.listening);
    assert_eq!(tree.attr(h1, "style"), None);
    assert_eq!(tree.attr(section, "style"), None);
}

#[test]
fn selector_fallbacks_and_truncation() {
    assert_eq!(selector_path("p", None, None), "p");
    assert_eq!(selector_path("div", None, Some(" card  shadow")), "div.card");
    let long = "x".repeat(150);
    assert_eq!(truncate_chars(&long, MAX_TEXT_CONTENT).len(), 100);
    assert_eq!(truncate_chars("héllo", 2), "hé");
}

#[test]
fn author_styles_survive_outlines() {
    let mut tree = DomTree::new();
    let div = tree.append_element(ROOT, "div", vec![("style".into(), "color: red;".into())]);
    let mut editor = VisualEditor::default();
    editor.set_enabled(&mut tree, true);
    editor.pointer_over(&mut tree, div);
    assert_eq!(tree.attr(div, "style"), Some(format!("color: red; {HOVER_OUTLINE}").as_str()));
    editor.click(&mut tree, div);
    assert_eq!(tree.attr(div, "style"), Some(format!("color: red; {SELECTED_OUTLINE}").as_str()));
    editor.set_enabled(&mut tree, false);
    assert_eq!(tree.attr(div, "style"), Some("color: red;"));
}

#[test]
fn hovering_the_selection_then_disabling_keeps_author_style() {
    let mut tree = DomTree::new();
    let div = tree.append_element(ROOT, "div", vec![("style".into(), "color: red".into())]);
    let mut editor = VisualEditor::default();
    editor.set_enabled(&mut tree, true);
    editor.click(&mut tree, div);
    editor.pointer_over(&mut tree, div);
    editor.set_enabled(&mut tree, false);
    assert_eq!(tree.attr(div, "style"), Some("color: red"));
}
