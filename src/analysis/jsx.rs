//! Tolerant JSX scanner.
//!
//! Parses the markup portions of a component file into a small element tree
//! with byte spans, without understanding the surrounding script. Spans let
//! the repairer splice edits back into the original text; the sandbox renders
//! the same tree. Scanning never panics on malformed input: an element that
//! does not parse yields a [`ParseError`] with the offending offset.

use std::cell::Cell;

/// Deepest element nesting the scanner follows before giving up.
pub const MAX_NESTING: usize = 256;

// =============================================================================
// TYPES
// =============================================================================

/// Half-open byte range into the scanned source.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct Span {
    pub start: usize,
    pub end: usize,
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub enum AttrValue {
    /// `name="text"`
    Str(String),
    /// `name={expr}` — inner source, trimmed.
    Expr(String),
    /// Bare `name`.
    Flag,
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Attr {
    /// Attribute name; `...` for spread attributes.
    pub name: String,
    pub value: AttrValue,
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Element {
    /// Tag name as written (`div`, `Hero`, `motion.div`); empty for fragments.
    pub name: String,
    pub attrs: Vec<Attr>,
    pub children: Vec<Node>,
    pub span: Span,
    /// Offset just past the tag name, where new attributes can be inserted.
    pub name_end: usize,
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Node {
    Element(Element),
    /// Raw text between tags, whitespace untouched.
    Text(String),
    Expr(Expr),
}

/// A `{...}` child. `markup` holds any elements found inside it, e.g. the
/// body of a `.map(...)` callback.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Expr {
    pub source: String,
    pub span: Span,
    pub markup: Vec<Element>,
}

#[derive(Debug, Clone, PartialEq, Eq, thiserror::Error)]
#[error("{message}")]
pub struct ParseError {
    pub offset: usize,
    pub message: String,
}

impl ParseError {
    fn new(offset: usize, message: impl Into<String>) -> Self {
        Self { offset, message: message.into() }
    }
}

// =============================================================================
// ELEMENT HELPERS
// =============================================================================

impl Element {
    #[must_use]
    pub fn is_fragment(&self) -> bool {
        self.name.is_empty()
    }

    #[must_use]
    pub fn attr(&self, name: &str) -> Option<&AttrValue> {
        self.attrs
            .iter()
            .find(|a| a.name == name)
            .map(|a| &a.value)
    }

    #[must_use]
    pub fn has_attr(&self, name: &str) -> bool {
        self.attr(name).is_some()
    }

    #[must_use]
    pub fn has_spread(&self) -> bool {
        self.has_attr("...")
    }

    /// Attribute value when it is statically known: `a="x"` or `a={"x"}`.
    #[must_use]
    pub fn static_attr(&self, name: &str) -> Option<String> {
        match self.attr(name)? {
            AttrValue::Str(s) => Some(s.clone()),
            AttrValue::Expr(e) => string_literal(e),
            AttrValue::Flag => None,
        }
    }

    /// Visit this element and every nested element, including markup
    /// found inside expression children.
    pub fn visit<'a>(&'a self, f: &mut dyn FnMut(&'a Element)) {
        f(self);
        for child in &self.children {
            match child {
                Node::Element(el) => el.visit(f),
                Node::Expr(expr) => {
                    for el in &expr.markup {
                        el.visit(f);
                    }
                }
                Node::Text(_) => {}
            }
        }
    }

    /// Visit every expression child together with the element that holds it.
    pub fn visit_exprs<'a>(&'a self, f: &mut dyn FnMut(&'a Expr, &'a Element)) {
        for child in &self.children {
            match child {
                Node::Element(el) => el.visit_exprs(f),
                Node::Expr(expr) => {
                    f(expr, self);
                    for el in &expr.markup {
                        el.visit_exprs(f);
                    }
                }
                Node::Text(_) => {}
            }
        }
    }

    /// Concatenated static text of this element's subtree.
    #[must_use]
    pub fn static_text(&self) -> String {
        let mut out = String::new();
        for child in &self.children {
            match child {
                Node::Text(t) => {
                    if let Some(t) = jsx_text(t) {
                        out.push_str(&t);
                    }
                }
                Node::Element(el) => out.push_str(&el.static_text()),
                Node::Expr(e) => {
                    if let Some(s) = string_literal(&e.source) {
                        out.push_str(&s);
                    }
                }
            }
        }
        out
    }
}

/// The value of a single-quoted, double-quoted or interpolation-free
/// template literal; `None` for anything else.
#[must_use]
pub fn string_literal(source: &str) -> Option<String> {
    let s = source.trim();
    let first = s.chars().next()?;
    if !matches!(first, '"' | '\'' | '`') || s.len() < 2 || !s.ends_with(first) {
        return None;
    }
    let inner = &s[1..s.len() - 1];
    if inner.contains(first) || (first == '`' && inner.contains("${")) {
        return None;
    }
    Some(inner.to_string())
}

/// Collapse JSX text the way the compiler does: multi-line text is trimmed
/// per line and joined with single spaces; single-line text is kept as is.
#[must_use]
pub fn jsx_text(raw: &str) -> Option<String> {
    let text = if raw.contains('\n') {
        raw.lines()
            .map(str::trim)
            .filter(|l| !l.is_empty())
            .collect::<Vec<_>>()
            .join(" ")
    } else {
        raw.to_string()
    };
    (!text.is_empty()).then_some(text)
}

/// 1-based line number of a byte offset.
#[must_use]
pub fn line_of(src: &str, offset: usize) -> usize {
    let end = offset.min(src.len());
    src.as_bytes()[..end].iter().filter(|&&b| b == b'\n').count() + 1
}

// =============================================================================
// ENTRY POINTS
// =============================================================================

/// Parse the element starting at `start` (which must point at `<`).
///
/// # Errors
///
/// Returns a [`ParseError`] for unterminated tags, mismatched closing tags,
/// stray `<` in text, unterminated expressions and markup nested deeper than
/// [`MAX_NESTING`].
pub fn parse_element(src: &str, start: usize) -> Result<Element, ParseError> {
    Parser::new(src).element(start)
}

/// Every top-level markup root in a script file. Roots that fail to parse
/// are skipped.
#[must_use]
pub fn find_markup(src: &str) -> Vec<Element> {
    let parser = Parser::new(src);
    let mut out = Vec::new();
    let mut i = 0;
    while i < src.len() {
        if parser.starts_markup(i) && parser.markup_context(i) {
            if let Ok(el) = parser.element(i) {
                i = el.span.end;
                out.push(el);
                continue;
            }
        }
        i += 1;
    }
    out
}

/// Offset of the `}` closing the `{` at `open`, skipping strings, comments
/// and nested markup.
///
/// # Errors
///
/// Returns a [`ParseError`] when the brace is never closed.
pub fn matching_brace(src: &str, open: usize) -> Result<usize, ParseError> {
    Parser::new(src)
        .match_brace(open)
        .map(|(close, _)| close)
}

// =============================================================================
// PARSER
// =============================================================================

fn is_name_start(b: u8) -> bool {
    b.is_ascii_alphabetic() || b == b'_' || b == b'$'
}

fn is_name_char(b: u8) -> bool {
    b.is_ascii_alphanumeric() || matches!(b, b'_' | b'$' | b'.' | b'-' | b':')
}

fn is_ident_char(b: u8) -> bool {
    b.is_ascii_alphanumeric() || b == b'_' || b == b'$'
}

struct Parser<'a> {
    src: &'a str,
    bytes: &'a [u8],
    /// Elements currently open, counting markup inside expressions.
    depth: Cell<usize>,
}

impl<'a> Parser<'a> {
    fn new(src: &'a str) -> Self {
        Self { src, bytes: src.as_bytes(), depth: Cell::new(0) }
    }
}

impl Parser<'_> {
    fn starts_markup(&self, i: usize) -> bool {
        self.bytes.get(i) == Some(&b'<')
            && self
                .bytes
                .get(i + 1)
                .is_some_and(|&b| is_name_start(b) || b == b'>')
    }

    /// Whether a `<` at `i` sits where an expression may begin, so it opens
    /// markup rather than a comparison or a type argument list.
    fn markup_context(&self, i: usize) -> bool {
        let Some(prev) = self.bytes[..i].iter().rposition(|b| !b.is_ascii_whitespace()) else {
            return true;
        };
        match self.bytes[prev] {
            b'(' | b'?' | b':' | b'&' | b'|' | b',' | b'=' | b'>' | b'{' | b'[' | b';' => true,
            _ => {
                let head = &self.src[..=prev];
                head.ends_with("return")
                    && head[..head.len() - "return".len()]
                        .bytes()
                        .last()
                        .is_none_or(|b| !is_ident_char(b))
            }
        }
    }

    fn skip_ws(&self, mut i: usize) -> usize {
        while self.bytes.get(i).is_some_and(u8::is_ascii_whitespace) {
            i += 1;
        }
        i
    }

    fn read_name(&self, mut i: usize) -> usize {
        while self.bytes.get(i).copied().is_some_and(is_name_char) {
            i += 1;
        }
        i
    }

    fn element(&self, start: usize) -> Result<Element, ParseError> {
        let depth = self.depth.get();
        if depth >= MAX_NESTING {
            return Err(ParseError::new(start, "Markup nested too deeply"));
        }
        self.depth.set(depth + 1);
        let result = self.element_body(start);
        self.depth.set(depth);
        result
    }

    fn element_body(&self, start: usize) -> Result<Element, ParseError> {
        let tag = self.open_tag(start)?;
        if tag.self_closing {
            return Ok(Element {
                name: tag.name,
                attrs: tag.attrs,
                children: Vec::new(),
                span: Span { start, end: tag.end },
                name_end: tag.name_end,
            });
        }
        let (children, end) = self.children(tag.end, &tag.name, start)?;
        Ok(Element { name: tag.name, attrs: tag.attrs, children, span: Span { start, end }, name_end: tag.name_end })
    }

    fn open_tag(&self, start: usize) -> Result<OpenTag, ParseError> {
        let mut i = start + 1;
        if self.bytes.get(i) == Some(&b'>') {
            return Ok(OpenTag { name: String::new(), attrs: Vec::new(), self_closing: false, end: i + 1, name_end: i });
        }
        let name_end = self.read_name(i);
        if name_end == i {
            return Err(ParseError::new(start, "Expected a tag name after '<'"));
        }
        let name = self.src[i..name_end].to_string();
        i = name_end;
        let mut attrs = Vec::new();
        loop {
            i = self.skip_ws(i);
            let Some(&b) = self.bytes.get(i) else {
                return Err(ParseError::new(start, format!("Unterminated <{name}> tag")));
            };
            match b {
                b'/' => {
                    if self.bytes.get(i + 1) == Some(&b'>') {
                        return Ok(OpenTag { name, attrs, self_closing: true, end: i + 2, name_end });
                    }
                    return Err(ParseError::new(i, format!("Unexpected '/' in <{name}> tag")));
                }
                b'>' => return Ok(OpenTag { name, attrs, self_closing: false, end: i + 1, name_end }),
                b'{' => {
                    let (close, _) = self.match_brace(i)?;
                    let inner = self.src[i + 1..close].trim();
                    attrs.push(Attr {
                        name: "...".into(),
                        value: AttrValue::Expr(inner.trim_start_matches("...").trim().to_string()),
                    });
                    i = close + 1;
                }
                b if is_name_start(b) => {
                    let attr_end = self.read_name(i);
                    let attr_name = self.src[i..attr_end].to_string();
                    i = self.skip_ws(attr_end);
                    if self.bytes.get(i) != Some(&b'=') {
                        attrs.push(Attr { name: attr_name, value: AttrValue::Flag });
                        continue;
                    }
                    i = self.skip_ws(i + 1);
                    match self.bytes.get(i) {
                        Some(&q @ (b'"' | b'\'')) => {
                            let Some(len) = self.src[i + 1..].find(q as char) else {
                                return Err(ParseError::new(i, format!("Unterminated string for attribute '{attr_name}'")));
                            };
                            let value = self.src[i + 1..i + 1 + len].to_string();
                            attrs.push(Attr { name: attr_name, value: AttrValue::Str(value) });
                            i += len + 2;
                        }
                        Some(b'{') => {
                            let (close, _) = self.match_brace(i)?;
                            let value = self.src[i + 1..close].trim().to_string();
                            attrs.push(Attr { name: attr_name, value: AttrValue::Expr(value) });
                            i = close + 1;
                        }
                        _ => return Err(ParseError::new(i, format!("Attribute '{attr_name}' has no value"))),
                    }
                }
                _ => {
                    let ch = self.src[i..].chars().next().unwrap_or('?');
                    return Err(ParseError::new(i, format!("Unexpected character '{ch}' in <{name}> tag")));
                }
            }
        }
    }

    fn children(&self, mut i: usize, name: &str, open: usize) -> Result<(Vec<Node>, usize), ParseError> {
        let mut children = Vec::new();
        let mut text_start = i;
        let flush = |children: &mut Vec<Node>, from: usize, to: usize| {
            if to > from {
                children.push(Node::Text(self.src[from..to].to_string()));
            }
        };
        loop {
            let Some(&b) = self.bytes.get(i) else {
                let shown = if name.is_empty() { "<>" } else { name };
                return Err(ParseError::new(open, format!("Unclosed <{shown}> element")));
            };
            match b {
                b'<' if self.bytes.get(i + 1) == Some(&b'/') => {
                    flush(&mut children, text_start, i);
                    let name_start = self.skip_ws(i + 2);
                    let name_end = self.read_name(name_start);
                    let closing = &self.src[name_start..name_end];
                    let gt = self.skip_ws(name_end);
                    if self.bytes.get(gt) != Some(&b'>') {
                        return Err(ParseError::new(i, format!("Malformed closing tag </{closing}")));
                    }
                    if closing != name {
                        return Err(ParseError::new(i, format!("Expected closing tag </{name}> but found </{closing}>")));
                    }
                    return Ok((children, gt + 1));
                }
                b'<' => {
                    if !self.starts_markup(i) {
                        return Err(ParseError::new(i, format!("Unexpected '<' in the text of <{name}>")));
                    }
                    flush(&mut children, text_start, i);
                    let child = self.element(i)?;
                    i = child.span.end;
                    children.push(Node::Element(child));
                    text_start = i;
                }
                b'{' => {
                    flush(&mut children, text_start, i);
                    let (close, markup) = self.match_brace(i)?;
                    children.push(Node::Expr(Expr {
                        source: self.src[i + 1..close].to_string(),
                        span: Span { start: i, end: close + 1 },
                        markup,
                    }));
                    i = close + 1;
                    text_start = i;
                }
                _ => i += 1,
            }
        }
    }

    /// Find the `}` matching the `{` at `open`, skipping strings, comments
    /// and nested markup. Returns the closing offset and any markup found.
    fn match_brace(&self, open: usize) -> Result<(usize, Vec<Element>), ParseError> {
        let mut depth = 0usize;
        let mut markup = Vec::new();
        let mut i = open;
        while let Some(&b) = self.bytes.get(i) {
            match b {
                b'{' => depth += 1,
                b'}' => {
                    depth -= 1;
                    if depth == 0 {
                        return Ok((i, markup));
                    }
                }
                b'"' | b'\'' => {
                    // A quote with no partner on the same line is an apostrophe in text.
                    let rest = &self.src[i + 1..];
                    let line_end = rest.find('\n').unwrap_or(rest.len());
                    if let Some(len) = rest[..line_end].find(b as char) {
                        i += len + 2;
                        continue;
                    }
                }
                b'`' => {
                    i = self.skip_template(i)?;
                    continue;
                }
                b'/' if self.bytes.get(i + 1) == Some(&b'/') => {
                    i += self.src[i..].find('\n').unwrap_or(self.src.len() - i);
                    continue;
                }
                b'/' if self.bytes.get(i + 1) == Some(&b'*') => {
                    i += self.src[i..].find("*/").map_or(self.src.len() - i, |n| n + 2);
                    continue;
                }
                b'<' if self.starts_markup(i) && self.markup_context(i) => {
                    if let Ok(el) = self.element(i) {
                        i = el.span.end;
                        markup.push(el);
                        continue;
                    }
                }
                _ => {}
            }
            i += 1;
        }
        Err(ParseError::new(open, "Unterminated expression: missing '}'"))
    }

    /// Skip a template literal starting at the backtick `start`; returns the
    /// offset after the closing backtick.
    fn skip_template(&self, start: usize) -> Result<usize, ParseError> {
        let mut i = start + 1;
        while let Some(&b) = self.bytes.get(i) {
            match b {
                b'\\' => i += 2,
                b'`' => return Ok(i + 1),
                b'$' if self.bytes.get(i + 1) == Some(&b'{') => {
                    let (close, _) = self.match_brace(i + 1)?;
                    i = close + 1;
                }
                _ => i += 1,
            }
        }
        Err(ParseError::new(start, "Unterminated template literal"))
    }
}

struct OpenTag {
    name: String,
    attrs: Vec<Attr>,
    self_closing: bool,
    end: usize,
    name_end: usize,
}

#[cfg(test)]
#[path = "jsx_test.rs"]
mod tests;
