//! Prompt assembly for a turn.
//!
//! The system prompt is fixed: persona, technical constraints, motion
//! reference and the file-block output format. Everything that changes per
//! turn (current files, the request, the selected element) goes into the
//! final user message.

use std::fmt::Write;

use crate::builder::parser::serialize_updates;
use crate::builder::ProjectFileSet;
use crate::catalog::WHITELISTED_LIBRARIES;
use crate::sandbox::SelectedElement;

pub const PERSONA: &str = "You are a senior front-end engineer and designer who builds personal portfolio \
sites. You write production-quality Next.js (app router) and React code styled with Tailwind CSS, and \
you explain your changes to the site owner in a short, friendly message.";

pub const TECHNICAL_CONSTRAINTS: &str = "Technical constraints:\n\
- The entry point is /app/page.tsx, which default-exports the page component.\n\
- Put sections in /components, one default-exported component per file, imported with the @/ alias.\n\
- Style with Tailwind utility classes. Never emit <style> tags inside components.\n\
- Every <section> needs an id so navigation links can anchor to it.\n\
- Files that use hooks, event handlers or motion components start with 'use client'; on the first line.\n\
- Access window, document, localStorage and sessionStorage only inside useEffect.\n\
- Do not render Date or Math.random values directly; they break hydration.\n\
- Every <button> needs an onClick (or type=\"submit\"); every link needs a real href.\n\
- Only import from these packages: ";

pub const MOTION_REFERENCE: &str = "Motion reference (framer-motion):\n\
- Entrance: <motion.div initial={{ opacity: 0, y: 24 }} animate={{ opacity: 1, y: 0 }} \
transition={{ duration: 0.6, ease: 'easeOut' }}>\n\
- On scroll: whileInView={{ opacity: 1, y: 0 }} viewport={{ once: true, amount: 0.3 }}\n\
- Stagger children with variants and transition={{ staggerChildren: 0.08 }}\n\
- Hover: whileHover={{ scale: 1.03 }}; tap: whileTap={{ scale: 0.97 }}\n\
- Keep durations between 0.2s and 0.8s and prefer transform and opacity.";

pub const OUTPUT_FORMAT: &str = "Output format:\n\
Start with a brief message to the user describing what you changed. Then write every file you \
create or change in full, each introduced by a line of the form\n\
### FILE: /path/to/file.tsx\n\
followed by the complete file content. Do not wrap files in code fences. Omit files you did not \
change. A reply without any file blocks is treated as conversation only.";

#[must_use]
pub fn build_system_prompt() -> String {
    format!(
        "{PERSONA}\n\n{TECHNICAL_CONSTRAINTS}{libraries}.\n\n{MOTION_REFERENCE}\n\n{OUTPUT_FORMAT}",
        libraries = WHITELISTED_LIBRARIES.join(", "),
    )
}

/// The final user message of a turn: the file dump, then the request.
#[must_use]
pub fn build_turn_context(files: &ProjectFileSet, request: &str, selection: Option<&SelectedElement>) -> String {
    let mut context = String::from("Current project files:\n\n");
    if files.is_empty() {
        context.push_str("(no files yet; create the site from scratch)\n");
    } else {
        context.push_str(&serialize_updates(&files.to_updates()));
        context.push('\n');
    }
    context.push_str("\nRequest:\n");
    context.push_str(request.trim());
    if let Some(selected) = selection {
        context.push_str("\n\n");
        context.push_str(&selection_instruction(selected));
    }
    context
}

/// Bracketed instruction scoping the request to the selected element.
#[must_use]
pub fn selection_instruction(selected: &SelectedElement) -> String {
    let mut out = format!("[Focus your changes on the selected element `{}`: <{}>", selected.selector_path, selected.tag);
    if let Some(id) = &selected.id {
        let _ = write!(out, " id=\"{id}\"");
    }
    if let Some(class) = &selected.class_name {
        let _ = write!(out, " class=\"{class}\"");
    }
    if let Some(text) = &selected.text_content {
        let _ = write!(out, " with text \"{text}\"");
    }
    out.push_str(". Leave the rest of the site unchanged.]");
    out
}

/// Opening request for a site generated from a brief.
#[must_use]
pub fn build_brief_message(brief: &str, vibe: Option<&str>) -> String {
    let mut message = format!("Build my portfolio site.\n\nAbout me:\n{}", brief.trim());
    if let Some(vibe) = vibe.map(str::trim).filter(|v| !v.is_empty()) {
        let _ = write!(message, "\n\nVisual vibe: {vibe}");
    }
    message
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn system_prompt_carries_format_and_whitelist() {
        let prompt = build_system_prompt();
        assert!(prompt.contains("### FILE: /path/to/file.tsx"));
        assert!(prompt.contains("framer-motion, lucide-react"));
        assert!(prompt.contains("'use client'"));
        assert!(prompt.contains("whileInView"));
    }

    #[test]
    fn context_dumps_files_then_request() {
        let mut files = ProjectFileSet::new();
        files.insert("/app/page.tsx", "export default function Page() {}");
        let context = build_turn_context(&files, "  make it pop  ", None);
        let dump = context.find("### FILE: /app/page.tsx").unwrap();
        let request = context.find("Request:\nmake it pop").unwrap();
        assert!(dump < request);
        assert!(!context.contains("[Focus"));
    }

    #[test]
    fn empty_project_is_called_out() {
        let context = build_turn_context(&ProjectFileSet::new(), "hi", None);
        assert!(context.contains("(no files yet"));
    }

    #[test]
    fn selection_becomes_a_bracketed_instruction() {
        let selected = SelectedElement {
            tag: "h1".into(),
            id: Some("hero-title".into()),
            class_name: Some("text-5xl".into()),
            text_content: Some("Jane Doe".into()),
            selector_path: "#hero-title".into(),
        };
        let context = build_turn_context(&ProjectFileSet::new(), "make this bigger", Some(&selected));
        assert!(context.ends_with(
            "[Focus your changes on the selected element `#hero-title`: <h1> id=\"hero-title\" class=\"text-5xl\" \
             with text \"Jane Doe\". Leave the rest of the site unchanged.]"
        ));
    }

    #[test]
    fn brief_message_includes_vibe_when_given() {
        assert!(build_brief_message("Jane, a designer", Some("  brutalist ")).ends_with("Visual vibe: brutalist"));
        assert!(!build_brief_message("Jane", Some(" ")).contains("vibe"));
    }
}
