//! Markup - Lenient HTML parsing and serialization.
//!
//! The parser never fails. It understands:
//! - elements with quoted, unquoted and bare attributes
//! - void elements (`<input>`, `<br>`, ...) and `/>` self-closing tags
//! - raw text elements (`<script>`, `<style>`, `<textarea>`)
//! - comments, and skips doctypes
//! - the basic named entities plus numeric character references
//!
//! Unmatched end tags are dropped; unclosed elements are closed at the end
//! of input. Tag and attribute names are lowercased.

use super::registry::with_node;
use super::{append_child, child_nodes, clear_children, create_comment, create_element, create_text};
use super::{get_attribute, set_attribute};
use crate::types::{NodeId, NodeKind};

const VOID_ELEMENTS: &[&str] = &[
    "area", "base", "br", "col", "embed", "hr", "img", "input", "link", "meta", "source",
    "track", "wbr",
];

const RAW_TEXT_ELEMENTS: &[&str] = &["script", "style", "textarea"];

fn is_void(tag: &str) -> bool {
    VOID_ELEMENTS.contains(&tag)
}

// =============================================================================
// Parser
// =============================================================================

struct Parser<'a> {
    src: &'a str,
    pos: usize,
    /// Open elements, innermost last.
    stack: Vec<(NodeId, String)>,
    roots: Vec<NodeId>,
}

impl<'a> Parser<'a> {
    fn new(src: &'a str) -> Self {
        Self {
            src,
            pos: 0,
            stack: Vec::new(),
            roots: Vec::new(),
        }
    }

    fn rest(&self) -> &'a str {
        &self.src[self.pos..]
    }

    fn peek(&self) -> Option<char> {
        self.rest().chars().next()
    }

    fn bump(&mut self) -> Option<char> {
        let c = self.peek()?;
        self.pos += c.len_utf8();
        Some(c)
    }

    fn skip_whitespace(&mut self) {
        while self.peek().is_some_and(char::is_whitespace) {
            self.bump();
        }
    }

    /// Consume characters while `pred` holds and return them.
    fn take_while(&mut self, pred: impl Fn(char) -> bool) -> &'a str {
        let start = self.pos;
        while self.peek().is_some_and(&pred) {
            self.bump();
        }
        &self.src[start..self.pos]
    }

    fn insert(&mut self, node: NodeId) {
        match self.stack.last() {
            Some(&(parent, _)) => append_child(parent, node),
            None => self.roots.push(node),
        }
    }

    fn parse(mut self) -> Vec<NodeId> {
        while self.pos < self.src.len() {
            let rest = self.rest();
            if rest.starts_with("<!--") {
                self.parse_comment();
            } else if rest.starts_with("</") {
                self.parse_end_tag();
            } else if rest.starts_with("<!") || rest.starts_with("<?") {
                // Doctype or processing instruction
                match rest.find('>') {
                    Some(end) => self.pos += end + 1,
                    None => self.pos = self.src.len(),
                }
            } else if rest.starts_with('<')
                && rest[1..].chars().next().is_some_and(|c| c.is_ascii_alphabetic())
            {
                self.parse_start_tag();
            } else {
                self.parse_text();
            }
        }
        self.roots
    }

    fn parse_comment(&mut self) {
        let body_start = self.pos + 4;
        let (data, next) = match self.src[body_start..].find("-->") {
            Some(end) => (&self.src[body_start..body_start + end], body_start + end + 3),
            None => (&self.src[body_start..], self.src.len()),
        };
        let node = create_comment(data);
        self.pos = next;
        self.insert(node);
    }

    fn parse_text(&mut self) {
        let start = self.pos;
        // A lone '<' that does not open a tag is text
        self.bump();
        while let Some(c) = self.peek() {
            if c == '<' {
                let after = &self.rest()[1..];
                let opens = after.starts_with('/')
                    || after.starts_with('!')
                    || after.starts_with('?')
                    || after.chars().next().is_some_and(|c| c.is_ascii_alphabetic());
                if opens {
                    break;
                }
            }
            self.bump();
        }
        let text = decode_entities(&self.src[start..self.pos]);
        let node = create_text(&text);
        self.insert(node);
    }

    fn parse_end_tag(&mut self) {
        self.pos += 2;
        let name = self
            .take_while(|c| !c.is_whitespace() && c != '>')
            .to_ascii_lowercase();
        match self.rest().find('>') {
            Some(end) => self.pos += end + 1,
            None => self.pos = self.src.len(),
        }
        if let Some(index) = self.stack.iter().rposition(|(_, tag)| *tag == name) {
            self.stack.truncate(index);
        }
    }

    fn parse_start_tag(&mut self) {
        self.bump(); // '<'
        let tag = self
            .take_while(|c| !c.is_whitespace() && c != '>' && c != '/')
            .to_ascii_lowercase();
        let element = create_element(&tag);

        let mut self_closing = false;
        loop {
            self.skip_whitespace();
            match self.peek() {
                None => break,
                Some('>') => {
                    self.bump();
                    break;
                }
                Some('/') => {
                    self.bump();
                    if self.peek() == Some('>') {
                        self.bump();
                        self_closing = true;
                        break;
                    }
                }
                Some(_) => self.parse_attribute(element),
            }
        }

        self.insert(element);

        if self_closing || is_void(&tag) {
            return;
        }

        if RAW_TEXT_ELEMENTS.contains(&tag.as_str()) {
            self.parse_raw_text(element, &tag);
            return;
        }

        self.stack.push((element, tag));
    }

    fn parse_attribute(&mut self, element: NodeId) {
        let name = self
            .take_while(|c| !c.is_whitespace() && c != '=' && c != '>' && c != '/')
            .to_ascii_lowercase();
        if name.is_empty() {
            // Stray character such as a lone '='
            self.bump();
            return;
        }

        self.skip_whitespace();
        let value = if self.peek() == Some('=') {
            self.bump();
            self.skip_whitespace();
            match self.peek() {
                Some(quote @ ('"' | '\'')) => {
                    self.bump();
                    let raw = self.take_while(|c| c != quote);
                    self.bump();
                    decode_entities(raw)
                }
                _ => decode_entities(self.take_while(|c| !c.is_whitespace() && c != '>')),
            }
        } else {
            String::new()
        };

        // First occurrence wins
        if get_attribute(element, &name).is_none() {
            set_attribute(element, &name, &value);
        }
    }

    fn parse_raw_text(&mut self, element: NodeId, tag: &str) {
        let close = format!("</{tag}");
        let rest = self.rest();
        let lower = rest.to_ascii_lowercase();
        let end = lower.find(&close).unwrap_or(rest.len());
        let raw = &rest[..end];
        if !raw.is_empty() {
            let text = if tag == "textarea" {
                decode_entities(raw)
            } else {
                raw.to_string()
            };
            append_child(element, create_text(&text));
        }
        self.pos += end;
        if self.pos < self.src.len() {
            match self.rest().find('>') {
                Some(gt) => self.pos += gt + 1,
                None => self.pos = self.src.len(),
            }
        }
    }
}

/// Parse markup into detached nodes and return the top-level ones.
pub fn parse_html(markup: &str) -> Vec<NodeId> {
    Parser::new(markup).parse()
}

/// Replace a node's children with the parsed markup.
pub fn set_inner_html(id: NodeId, markup: &str) {
    clear_children(id);
    for node in parse_html(markup) {
        append_child(id, node);
    }
}

// =============================================================================
// Entities
// =============================================================================

fn decode_entities(raw: &str) -> String {
    if !raw.contains('&') {
        return raw.to_string();
    }
    let mut out = String::with_capacity(raw.len());
    let mut rest = raw;
    while let Some(amp) = rest.find('&') {
        out.push_str(&rest[..amp]);
        rest = &rest[amp..];
        let decoded = rest.find(';').filter(|&semi| semi <= 10).and_then(|semi| {
            let entity = &rest[1..semi];
            let c = match entity {
                "amp" => Some('&'),
                "lt" => Some('<'),
                "gt" => Some('>'),
                "quot" => Some('"'),
                "apos" => Some('\''),
                "nbsp" => Some('\u{a0}'),
                _ => entity.strip_prefix('#').and_then(|num| {
                    let code = match num.strip_prefix(['x', 'X']) {
                        Some(hex) => u32::from_str_radix(hex, 16).ok(),
                        None => num.parse::<u32>().ok(),
                    };
                    code.and_then(char::from_u32)
                }),
            };
            c.map(|c| (c, semi + 1))
        });
        match decoded {
            Some((c, len)) => {
                out.push(c);
                rest = &rest[len..];
            }
            None => {
                out.push('&');
                rest = &rest[1..];
            }
        }
    }
    out.push_str(rest);
    out
}

fn escape_text(text: &str, out: &mut String) {
    for c in text.chars() {
        match c {
            '&' => out.push_str("&amp;"),
            '<' => out.push_str("&lt;"),
            '>' => out.push_str("&gt;"),
            '\u{a0}' => out.push_str("&nbsp;"),
            _ => out.push(c),
        }
    }
}

fn escape_attribute(value: &str, out: &mut String) {
    for c in value.chars() {
        match c {
            '&' => out.push_str("&amp;"),
            '"' => out.push_str("&quot;"),
            '\u{a0}' => out.push_str("&nbsp;"),
            _ => out.push(c),
        }
    }
}

// =============================================================================
// Serializer
// =============================================================================

fn serialize(id: NodeId, out: &mut String) {
    let Some((kind, tag, data, attrs)) =
        with_node(id, |n| (n.kind, n.tag.clone(), n.data.clone(), n.attributes.clone()))
    else {
        return;
    };

    match kind {
        NodeKind::Text => {
            let raw_parent = super::parent(id)
                .map(super::tag_name)
                .is_some_and(|t| t == "script" || t == "style");
            if raw_parent {
                out.push_str(&data);
            } else {
                escape_text(&data, out);
            }
        }
        NodeKind::Comment => {
            out.push_str("<!--");
            out.push_str(&data);
            out.push_str("-->");
        }
        NodeKind::Element => {
            out.push('<');
            out.push_str(&tag);
            for (name, value) in &attrs {
                out.push(' ');
                out.push_str(name);
                out.push_str("=\"");
                escape_attribute(value, out);
                out.push('"');
            }
            out.push('>');
            if is_void(&tag) {
                return;
            }
            for child in child_nodes(id) {
                serialize(child, out);
            }
            out.push_str("</");
            out.push_str(&tag);
            out.push('>');
        }
        NodeKind::Document | NodeKind::Fragment => {
            for child in child_nodes(id) {
                serialize(child, out);
            }
        }
    }
}

/// Serialized markup of a node's children.
pub fn inner_html(id: NodeId) -> String {
    let mut out = String::new();
    for child in child_nodes(id) {
        serialize(child, &mut out);
    }
    out
}

/// Serialized markup of a node including itself.
pub fn outer_html(id: NodeId) -> String {
    let mut out = String::new();
    serialize(id, &mut out);
    out
}
