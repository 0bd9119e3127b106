//! Live output tree for tether.
//!
//! Nodes are shared handles with stable identity, mutated in place by the
//! binding engine. The tree can be serialized back to markup, and markup can
//! be parsed into a tree the way a browser materializes server output.

pub mod html;
pub mod markup;
pub mod node;
pub mod props;

pub use html::{escape_attribute, escape_text, is_void};
pub use markup::{ParseError, parse_fragment};
pub use node::{Node, NodeType, WeakNode};
pub use props::PropValue;

/// Attribute list for the [`h`] builder.
#[derive(Debug, Clone, PartialEq, Default)]
pub struct Attrs(pub Vec<(String, String)>);

impl Attrs {
    pub fn new() -> Self {
        Self(Vec::new())
    }
    pub fn set(mut self, k: impl Into<String>, v: impl Into<String>) -> Self {
        self.0.push((k.into(), v.into()));
        self
    }
}

// Allow concise attribute lists
impl From<()> for Attrs {
    fn from(_: ()) -> Self {
        Attrs::default()
    }
}
impl From<Vec<(&str, &str)>> for Attrs {
    fn from(v: Vec<(&str, &str)>) -> Self {
        let mut a = Attrs::new();
        for (k, v) in v {
            a = a.set(k, v);
        }
        a
    }
}

/// Builds a detached element with attributes and children.
pub fn h(tag: impl Into<String>, attrs: impl Into<Attrs>, children: Vec<Node>) -> Node {
    let el = Node::element(tag);
    for (k, v) in attrs.into().0 {
        el.set_attribute(&k, v);
    }
    for child in &children {
        el.append_child(child);
    }
    el
}

pub fn text(t: impl Into<String>) -> Node {
    Node::text(t)
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn build_tree() {
        let node = h(
            "div",
            vec![("class", "app")],
            vec![text("hello"), h("span", (), vec![text("world")])],
        );
        assert_eq!(node.tag_name(), Some("div"));
        assert_eq!(node.attribute("class").as_deref(), Some("app"));
        assert_eq!(node.child_count(), 2);
        assert_eq!(node.to_html(), r#"<div class="app">hello<span>world</span></div>"#);
    }
}
