//! Byte-range edits over the original descriptor text

use roxmltree::Node;
use std::ops::Range;

#[derive(Debug, Clone)]
struct TextEdit {
    start: usize,
    end: usize,
    text: String,
    seq: usize,
}

/// Accumulates non-overlapping edits against one source text
pub(crate) struct EditSet<'s> {
    source: &'s str,
    edits: Vec<TextEdit>,
    /// One level of indentation as used by the document
    pub unit: String,
    pub newline: &'static str,
}

impl<'s> EditSet<'s> {
    pub fn new(source: &'s str, root: Node) -> Self {
        let newline = if source.contains("\r\n") { "\r\n" } else { "\n" };
        let mut set = Self {
            source,
            edits: Vec::new(),
            unit: "  ".to_string(),
            newline,
        };
        if let Some(first) = root.children().find(|c| c.is_element()) {
            if let Some(indent) = set.line_indent(first.range().start) {
                if !indent.is_empty() {
                    set.unit = indent.to_string();
                }
            }
        }
        set
    }

    pub fn is_empty(&self) -> bool {
        self.edits.is_empty()
    }

    fn push(&mut self, range: Range<usize>, text: String) {
        let seq = self.edits.len();
        self.edits.push(TextEdit {
            start: range.start,
            end: range.end,
            text,
            seq,
        });
    }

    pub fn replace(&mut self, range: Range<usize>, text: impl Into<String>) {
        self.push(range, text.into());
    }

    pub fn insert(&mut self, at: usize, text: impl Into<String>) {
        self.push(at..at, text.into());
    }

    /// Whitespace between the start of the line and `pos`, if nothing else precedes it
    pub fn line_indent(&self, pos: usize) -> Option<&'s str> {
        let line_start = self.source[..pos].rfind('\n').map_or(0, |i| i + 1);
        let prefix = &self.source[line_start..pos];
        prefix
            .chars()
            .all(|c| c == ' ' || c == '\t')
            .then_some(prefix)
    }

    /// Indentation of an element: its own line indent, or one unit per nesting level
    pub fn indent_of(&self, node: Node) -> String {
        match self.line_indent(node.range().start) {
            Some(indent) => indent.to_string(),
            None => {
                let depth = node.ancestors().filter(|n| n.is_element()).count();
                self.unit.repeat(depth.saturating_sub(1))
            }
        }
    }

    /// Indentation for children of an element
    pub fn child_indent(&self, node: Node) -> String {
        node.children()
            .find(|c| c.is_element())
            .and_then(|c| self.line_indent(c.range().start))
            .map(str::to_string)
            .unwrap_or_else(|| format!("{}{}", self.indent_of(node), self.unit))
    }

    /// Removes an element, taking its whole line when it stands alone on it
    pub fn remove_element(&mut self, node: Node) {
        let range = node.range();
        let line_start = self.source[..range.start].rfind('\n').map_or(0, |i| i + 1);
        let before = &self.source[line_start..range.start];
        let rest = &self.source[range.end..];
        let line_end = rest.find('\n').map(|i| range.end + i + 1);

        let alone = before.trim().is_empty()
            && line_end.is_some_and(|end| self.source[range.end..end].trim().is_empty());
        match line_end {
            Some(end) if alone => self.replace(line_start..end, ""),
            _ => self.replace(range, ""),
        }
    }

    /// Replaces an element's text content, keeping whitespace padding inside the tags
    pub fn set_text(&mut self, node: Node, value: &str) {
        let escaped = escape(value);
        match node.children().find(|c| c.is_text()) {
            Some(text) if node.children().all(|c| c.is_text()) => {
                let range = text.range();
                let raw = &self.source[range.clone()];
                let lead = raw.len() - raw.trim_start().len();
                let trail = raw.len() - raw.trim_end().len();
                if raw.trim().is_empty() {
                    self.replace(range, escaped);
                } else {
                    self.replace(range.start + lead..range.end - trail, escaped);
                }
            }
            _ if !node.has_children() => {
                let name = raw_tag_name(self.source, node);
                self.replace(node.range(), format!("<{name}>{escaped}</{name}>"));
            }
            _ => {
                // Mixed content: replace everything between the tags
                if let Some(inner) = inner_range(self.source, node) {
                    self.replace(inner, escaped);
                }
            }
        }
    }

    /// Inserts `block` on its own line right after `node`
    pub fn insert_after(&mut self, node: Node, block: &str, indent: &str) {
        let text = format!("{}{}{}", self.newline, indent, block);
        self.insert(node.range().end, text);
    }

    /// Inserts `block` on its own line right before `node`
    pub fn insert_before(&mut self, node: Node, block: &str) {
        let indent = self.indent_of(node);
        let text = format!("{}{}{}", block, self.newline, indent);
        self.insert(node.range().start, text);
    }

    /// Inserts `block` as the last child of `node`, expanding a self-closing element
    pub fn insert_last_child(&mut self, node: Node, block: &str) {
        let indent = self.indent_of(node);
        let child_indent = self.child_indent(node);
        let nl = self.newline;
        let range = node.range();
        let raw = &self.source[range.clone()];

        if raw.ends_with("/>") {
            let name = raw_tag_name(self.source, node);
            self.replace(
                range,
                format!("<{name}>{nl}{child_indent}{block}{nl}{indent}</{name}>"),
            );
            return;
        }

        let Some(close) = raw.rfind("</").map(|i| range.start + i) else {
            return;
        };
        let line_start = self.source[..close].rfind('\n').map_or(0, |i| i + 1);
        if line_start > range.start && self.source[line_start..close].trim().is_empty() {
            self.insert(line_start, format!("{child_indent}{block}{nl}"));
        } else {
            self.insert(close, format!("{nl}{child_indent}{block}{nl}{indent}"));
        }
    }

    /// Inserts `block` as the first child of `node`
    pub fn insert_first_child(&mut self, node: Node, block: &str) {
        match node.children().find(|c| c.is_element()) {
            Some(first) => self.insert_before(first, block),
            None => self.insert_last_child(node, block),
        }
    }

    /// Applies every edit; later edits at the same position land after earlier ones
    pub fn apply(mut self) -> String {
        self.edits.sort_by(|a, b| {
            b.start
                .cmp(&a.start)
                .then(b.end.cmp(&a.end))
                .then(b.seq.cmp(&a.seq))
        });
        let mut out = self.source.to_string();
        for edit in self.edits {
            out.replace_range(edit.start..edit.end, &edit.text);
        }
        out
    }
}

/// Tag name as written in the source, including any prefix
fn raw_tag_name<'s>(source: &'s str, node: Node) -> &'s str {
    let raw = &source[node.range().start + 1..];
    let end = raw
        .find(|c: char| c.is_whitespace() || c == '/' || c == '>')
        .unwrap_or(raw.len());
    &raw[..end]
}

fn inner_range(source: &str, node: Node) -> Option<Range<usize>> {
    let range = node.range();
    let raw = &source[range.clone()];
    let open_end = raw.find('>')? + 1;
    let close = raw.rfind("</")?;
    (open_end <= close).then(|| range.start + open_end..range.start + close)
}

pub(crate) fn escape(value: &str) -> String {
    quick_xml::escape::escape(value).into_owned()
}
