use super::*;
use crate::builder::parser::parse_reply;
use crate::builder::validator::detect_errors;

fn fix(path: &str, content: &str) -> (String, Vec<ValidationError>) {
    let updates = vec![FileUpdate::new(path, content)];
    let errors = detect_errors(&updates);
    let fixed = auto_fix_errors(&updates, &errors);
    let after = detect_errors(&fixed);
    (fixed[0].content.clone(), after)
}

#[test]
fn missing_directive_is_repaired_silently() {
    let reply = "Added a counter.\n\n### FILE: /components/Hero.tsx\nimport { useState } from 'react';\n\nexport default function Hero() {\n  const [count, setCount] = useState(0);\n  return <section id=\"hero\"><h1>{count}</h1></section>;\n}\n";
    let parsed = parse_reply(reply);
    let errors = detect_errors(&parsed.updates);
    assert_eq!(errors.len(), 1);
    assert_eq!(errors[0].rule, Rule::MissingClientDirective);
    assert!(errors[0].fixable);

    let fixed = auto_fix_errors(&parsed.updates, &errors);
    assert_eq!(fixed[0].content.lines().next(), Some("'use client';"));
    assert!(detect_errors(&fixed).is_empty());
}

#[test]
fn clean_files_are_left_untouched() {
    let updates = vec![
        FileUpdate::new("/components/Nav.tsx", "export default function Nav() {\n  return <nav><a href=\"/\">Home</a></nav>;\n}\n"),
        FileUpdate::new("/app/globals.css", "body { margin: 0; }"),
    ];
    let errors = detect_errors(&updates);
    assert!(errors.is_empty());
    assert_eq!(auto_fix_errors(&updates, &errors), updates);
}

#[test]
fn paths_are_preserved_and_unfixable_files_untouched() {
    let updates = vec![
        FileUpdate::new("/components/Cta.tsx", "export default () => <button>Go</button>;"),
        FileUpdate::new("/components/About.tsx", "export default () => <section><p>x</p></section>;"),
        FileUpdate::new("/README.md", "# hi"),
    ];
    let errors = detect_errors(&updates);
    let fixed = auto_fix_errors(&updates, &errors);
    let paths: Vec<_> = fixed.iter().map(|u| u.path.as_str()).collect();
    assert_eq!(paths, vec!["/components/Cta.tsx", "/components/About.tsx", "/README.md"]);
    assert_eq!(fixed[0], updates[0]);
    assert_eq!(fixed[1].content, "export default () => <section id=\"about\"><p>x</p></section>;");
    assert_eq!(fixed[2], updates[2]);
}

#[test]
fn inline_style_block_is_stripped() {
    let src = "export default function A() {\n  return (\n    <div>\n      <style>{`.x { color: red; }`}</style>\n      <p>x</p>\n    </div>\n  );\n}";
    let (out, after) = fix("/components/A.tsx", src);
    assert_eq!(out, "export default function A() {\n  return (\n    <div>\n      <p>x</p>\n    </div>\n  );\n}");
    assert!(after.is_empty());
}

#[test]
fn nondeterministic_value_is_wrapped() {
    let src = "export default function F() {\n  return <footer>© {new Date().getFullYear()}</footer>;\n}";
    let (out, after) = fix("/components/F.tsx", src);
    assert!(out.contains("<footer>© <span suppressHydrationWarning>{new Date().getFullYear()}</span></footer>"));
    assert!(after.is_empty());
}

#[test]
fn browser_globals_are_guarded() {
    let src = "import { onResize } from '@/lib/resize';\nwindow.addEventListener('resize', onResize);\n\nexport function width() {\n  const w = window.innerWidth;\n  return w;\n}\n";
    let (out, after) = fix("/lib/size.ts", src);
    assert!(out.contains("\nif (typeof window !== 'undefined') window.addEventListener('resize', onResize);\n"));
    assert!(out.contains("const w = globalThis.window?.innerWidth;"));
    assert!(after.is_empty(), "{after:?}");
}

#[test]
fn icon_is_merged_into_existing_import() {
    let src = "import { Mail } from 'lucide-react';\n\nexport default function C() {\n  return <p><Mail /><Github /></p>;\n}";
    let (out, after) = fix("/components/C.tsx", src);
    assert!(out.starts_with("import { Mail, Github } from 'lucide-react';\n"));
    assert!(after.is_empty());
}

#[test]
fn icon_import_is_added_after_last_import() {
    let src = "import Link from 'next/link';\nimport clsx from 'clsx';\n\nexport default function C() {\n  return <Link href=\"/\"><Star /><Zap /></Link>;\n}";
    let (out, after) = fix("/components/C.tsx", src);
    assert!(out.starts_with("import Link from 'next/link';\nimport clsx from 'clsx';\nimport { Star, Zap } from 'lucide-react';\n\n"));
    assert!(after.is_empty());
}

#[test]
fn icon_fix_without_imports_is_a_no_op() {
    let src = "export default function C() {\n  return <p><Star /></p>;\n}";
    let (out, after) = fix("/components/C.tsx", src);
    assert_eq!(out, src);
    assert_eq!(after.len(), 1);
    assert_eq!(after[0].rule, Rule::UnresolvedSymbol);
}

#[test]
fn section_ids_are_unique_per_file() {
    let src = "export default function AboutMe() {\n  return <>\n    <section className=\"a\">A</section>\n    <section>B</section>\n  </>;\n}";
    let (out, after) = fix("/components/AboutMe.tsx", src);
    assert!(out.contains("<section id=\"about-me\" className=\"a\">A</section>"));
    assert!(out.contains("<section id=\"about-me-2\">B</section>"));
    assert!(after.is_empty());
}

#[test]
fn misplaced_directive_is_moved_to_the_top() {
    let src = "import { useState } from 'react';\n'use client';\n\nexport default function A() {\n  useState(0);\n  return null;\n}\n";
    let (out, after) = fix("/components/A.tsx", src);
    assert_eq!(out, "'use client';\n\nimport { useState } from 'react';\n\nexport default function A() {\n  useState(0);\n  return null;\n}\n");
    assert!(after.is_empty());
}

#[test]
fn slugs_from_file_stems() {
    assert_eq!(section_slug("/components/AboutMe.tsx"), "about-me");
    assert_eq!(section_slug("/components/hero_section.tsx"), "hero-section");
    assert_eq!(section_slug("/components/FAQ.tsx"), "faq");
}

#[test]
fn assignment_through_a_global_is_left_as_written() {
    let src = "export const lock = () => { document.body.style.overflow = 'hidden'; };\n";
    let (out, after) = fix("/lib/scroll.ts", src);
    assert_eq!(out, src);
    assert_eq!(after.len(), 1);
    assert_eq!(after[0].rule, Rule::BrowserGlobal);
    assert!(!after[0].fixable);
}

#[test]
fn assignment_opening_a_statement_is_guarded() {
    let src = "export function lock() {\n  document.body.style.overflow = 'hidden';\n}\n";
    let (out, after) = fix("/lib/scroll.ts", src);
    assert_eq!(out, "export function lock() {\n  if (typeof document !== 'undefined') document.body.style.overflow = 'hidden';\n}\n");
    assert!(after.is_empty());
}

#[test]
fn navigation_link_gets_its_component_import() {
    let src = "import { Github } from 'lucide-react';\n\nexport default function Nav() {\n  return <nav><Link href=\"/about\">About</Link><Github /></nav>;\n}";
    let (out, after) = fix("/components/Nav.tsx", src);
    assert!(out.starts_with("import { Github } from 'lucide-react';\nimport Link from 'next/link';\n\n"));
    assert!(!out.contains("Github, Link"));
    assert!(after.is_empty(), "{after:?}");
}

#[test]
fn icons_and_component_imports_combine() {
    let src = "import clsx from 'clsx';\n\nexport default function Me() {\n  return <div><Image src=\"/me.png\" alt=\"\" /><Star /></div>;\n}";
    let (out, after) = fix("/components/Me.tsx", src);
    assert!(out.starts_with(
        "import clsx from 'clsx';\nimport { Star } from 'lucide-react';\nimport Image from 'next/image';\n\n"
    ));
    assert!(after.is_empty(), "{after:?}");
}
