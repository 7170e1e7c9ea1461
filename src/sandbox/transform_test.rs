use super::*;

const HERO: &str = r#"'use client';

import { motion } from 'framer-motion';
import {
  Github,
  Mail,
} from 'lucide-react';
import Link from 'next/link';

export const TAGLINE = 'Designer & developer';

export default function Hero({ name, role = 'Engineer', icon: Icon }: HeroProps) {
  const items = links.map((l) => {
    return <li key={l}>{l}</li>;
  });
  return (
    <section id="hero">
      <h1>{name}</h1>
    </section>
  );
}
"#;

#[test]
fn strips_directives_and_rewrites_imports() {
    let module = compile_module("/components/Hero.tsx", HERO).unwrap();
    assert!(!module.source.contains("use client"));
    assert!(!module.source.contains("import "));
    assert!(module.source.contains(r#"const { motion } = __modules["framer-motion"];"#));
    assert!(module.source.contains(r#"const { Github, Mail } = __modules["lucide-react"];"#));
    assert!(module.source.contains(r#"const Link = __modules["next/link"].default;"#));
    assert!(!module.source.contains("export "));
    assert_eq!(module.source.lines().count(), HERO.lines().count());
}

#[test]
fn extracts_default_component_and_its_markup() {
    let module = compile_module("/components/Hero.tsx", HERO).unwrap();
    assert_eq!(module.default_export.as_deref(), Some("Hero"));
    let hero = module.component("Hero").unwrap();
    assert_eq!(hero.line, 12);
    let markup = hero.markup.as_ref().unwrap();
    assert_eq!(markup.name, "section");
    let PropsPattern::Destructured(props) = &hero.props else { panic!("expected destructured props") };
    let locals: Vec<_> = props.iter().map(|p| p.local.as_str()).collect();
    assert_eq!(locals, vec!["name", "role", "Icon"]);
    assert_eq!(props[1].default.as_deref(), Some("'Engineer'"));
    assert_eq!(props[2].key, "icon");
    assert_eq!(module.string_consts.get("TAGLINE").map(String::as_str), Some("Designer & developer"));
}

#[test]
fn arrow_components_and_aliases() {
    let src = "const Card = ({ title }) => (\n  <div>{title}</div>\n);\nconst Plain = () => <p>x</p>;\nconst Nothing = () => null;\nexport default memo(Card);\n";
    let module = compile_module("/components/Card.tsx", src).unwrap();
    assert_eq!(module.component("Card").and_then(|c| c.markup.as_ref()).map(|m| m.name.as_str()), Some("div"));
    assert_eq!(module.component("Plain").and_then(|c| c.markup.as_ref()).map(|m| m.name.as_str()), Some("p"));
    assert!(module.component("Nothing").unwrap().markup.is_none());
    assert_eq!(module.default_export.as_deref(), Some(ANONYMOUS_DEFAULT));
    assert_eq!(module.component(ANONYMOUS_DEFAULT).map(|c| c.name.as_str()), Some("Card"));
}

#[test]
fn default_export_forms() {
    let anon = compile_module("/a.tsx", "export default function () { return <main />; }").unwrap();
    assert_eq!(anon.default_export.as_deref(), Some(ANONYMOUS_DEFAULT));
    assert!(anon.component(ANONYMOUS_DEFAULT).is_some());

    let ident = compile_module("/b.tsx", "function Page() { return <main />; }\nexport default Page;\n").unwrap();
    assert_eq!(ident.default_export.as_deref(), Some("Page"));

    let listed = compile_module("/c.tsx", "function Page() { return <main />; }\nexport { Page as default };\n").unwrap();
    assert_eq!(listed.default_export.as_deref(), Some("Page"));
}

#[test]
fn capitalized_values_are_not_components() {
    let src = "const Skills = ['Rust', 'Go'];\nexport default function A() { return <ul />; }";
    let module = compile_module("/a.tsx", src).unwrap();
    assert!(module.is_value("Skills"));
    assert!(module.component("Skills").is_none());
}

#[test]
fn malformed_markup_is_a_compile_error() {
    let src = "export default function Broken() {\n  return (\n    <div>\n      <p>oops</div>\n  );\n}\n";
    let err = compile_module("/components/Broken.tsx", src).unwrap_err();
    assert_eq!(err.file, "/components/Broken.tsx");
    assert_eq!(err.line, 4);
    assert!(err.message.contains("</p>"));
}

#[test]
fn unbalanced_braces_are_a_compile_error() {
    let err = compile_module("/a.tsx", "export default function A() {\n  if (x) {\n  return <p />;\n").unwrap_err();
    assert!(err.message.contains("missing '}'"));
    assert_eq!(err.line, 1);
}

#[test]
fn identifier_props() {
    let module = compile_module("/a.tsx", "function A(props: Props) { return <p>{props.title}</p>; }").unwrap();
    assert_eq!(module.component("A").unwrap().props, PropsPattern::Ident("props".into()));
}
