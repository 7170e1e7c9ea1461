//! File delta parser: splits a model reply into prose and file writes.
//!
//! A line of the form `### FILE: <path>` opens a file; its content runs to
//! the next marker or the end of the reply. The matcher tolerates case and
//! spacing variations (`###   file:   /a.tsx   ###`). There is no escaping: a
//! file cannot contain a line that is itself a marker.

use std::sync::LazyLock;

use regex::Regex;

use super::{FileUpdate, normalize_path};

static MARKER_RE: LazyLock<Regex> = LazyLock::new(|| {
    Regex::new(r"(?i)^\s*#{3,}\s*FILE\s*:\s*(.*?)\s*#*\s*$").expect("marker pattern is valid")
});

/// A model reply split into its conversational text and file writes.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct ParsedReply {
    pub natural_message: String,
    pub updates: Vec<FileUpdate>,
}

/// Path named by a marker line, or `None` if the line is not a marker.
fn marker_path(line: &str) -> Option<String> {
    let caps = MARKER_RE.captures(line)?;
    normalize_path(caps.get(1)?.as_str())
}

/// Parse a raw model reply. Never fails: a reply without markers is a purely
/// conversational answer.
#[must_use]
pub fn parse_reply(reply: &str) -> ParsedReply {
    let mut prose: Vec<&str> = Vec::new();
    let mut updates = Vec::new();
    let mut current: Option<(String, Vec<&str>)> = None;

    for line in reply.lines() {
        if let Some(path) = marker_path(line) {
            if let Some((path, lines)) = current.take() {
                updates.push(FileUpdate::new(path, trim_blank_lines(&lines)));
            }
            current = Some((path, Vec::new()));
            continue;
        }
        match current.as_mut() {
            Some((_, lines)) => lines.push(line),
            None => prose.push(line),
        }
    }
    if let Some((path, lines)) = current {
        updates.push(FileUpdate::new(path, trim_blank_lines(&lines)));
    }

    let natural_message = if updates.is_empty() {
        reply.trim().to_string()
    } else {
        prose.join("\n").trim().to_string()
    };
    ParsedReply { natural_message, updates }
}

/// Join lines, dropping blank lines at either end. Interior blank lines and
/// indentation are kept.
fn trim_blank_lines(lines: &[&str]) -> String {
    let first = lines.iter().position(|l| !l.trim().is_empty());
    let last = lines.iter().rposition(|l| !l.trim().is_empty());
    match (first, last) {
        (Some(first), Some(last)) => lines[first..=last].join("\n"),
        _ => String::new(),
    }
}

/// Render updates in the marker format. Also used to dump the current
/// project into the prompt, so the model sees the format it must reply in.
#[must_use]
pub fn serialize_updates(updates: &[FileUpdate]) -> String {
    let mut out = String::new();
    for update in updates {
        if !out.is_empty() {
            out.push_str("\n\n");
        }
        out.push_str("### FILE: ");
        out.push_str(&update.path);
        out.push('\n');
        out.push_str(&update.content);
    }
    out
}

#[cfg(test)]
#[path = "parser_test.rs"]
mod tests;
