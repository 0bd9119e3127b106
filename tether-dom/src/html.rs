use std::borrow::Cow;

use crate::node::{Node, NodeType};

// http://www.w3.org/html/wg/drafts/html/master/syntax.html#void-elements
const VOID_ELEMENTS: &[&str] = &[
    "area", "base", "br", "col", "embed", "hr", "img", "input", "keygen", "link", "menuitem",
    "meta", "param", "source", "track", "wbr",
];

/// Whether `tag` never has children or a closing tag.
pub fn is_void(tag: &str) -> bool {
    VOID_ELEMENTS
        .iter()
        .any(|v| v.eq_ignore_ascii_case(tag))
}

/// Escapes `&` and `<` for text content.
pub fn escape_text(s: &str) -> Cow<'_, str> {
    escape(s, |c| match c {
        '&' => Some("&amp;"),
        '<' => Some("&lt;"),
        _ => None,
    })
}

/// Escapes `&` and `"` for a double-quoted attribute value.
pub fn escape_attribute(s: &str) -> Cow<'_, str> {
    escape(s, |c| match c {
        '&' => Some("&amp;"),
        '"' => Some("&quot;"),
        _ => None,
    })
}

fn escape(s: &str, entity: impl Fn(char) -> Option<&'static str>) -> Cow<'_, str> {
    if !s.chars().any(|c| entity(c).is_some()) {
        return Cow::Borrowed(s);
    }
    let mut out = String::with_capacity(s.len() + 8);
    for c in s.chars() {
        match entity(c) {
            Some(e) => out.push_str(e),
            None => out.push(c),
        }
    }
    Cow::Owned(out)
}

impl Node {
    /// Serializes this node and its descendants.
    pub fn to_html(&self) -> String {
        let mut out = String::new();
        write_node(self, &mut out);
        out
    }

    /// Serializes the children of this node.
    pub fn inner_html(&self) -> String {
        let mut out = String::new();
        for child in self.children() {
            write_node(&child, &mut out);
        }
        out
    }
}

fn write_node(node: &Node, out: &mut String) {
    match node.node_type() {
        NodeType::Text => out.push_str(&escape_text(&node.data().unwrap_or_default())),
        NodeType::Comment => {
            out.push_str("<!--");
            out.push_str(&node.data().unwrap_or_default());
            out.push_str("-->");
        }
        NodeType::Fragment => {
            for child in node.children() {
                write_node(&child, out);
            }
        }
        NodeType::Element => {
            let tag = node.tag_name().unwrap_or_default();
            out.push('<');
            out.push_str(tag);
            for (name, value) in node.markup_attributes() {
                out.push(' ');
                out.push_str(&name);
                if let Some(value) = value {
                    out.push_str("=\"");
                    out.push_str(&escape_attribute(&value));
                    out.push('"');
                }
            }
            out.push('>');
            if is_void(tag) {
                return;
            }
            for child in node.children() {
                write_node(&child, out);
            }
            out.push_str("</");
            out.push_str(tag);
            out.push('>');
        }
    }
}
