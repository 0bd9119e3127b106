use std::cell::RefCell;
use std::collections::HashMap;
use std::fmt;
use std::rc::{Rc, Weak};

use crate::props::{PropValue, Reflect, reflection};

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum NodeType {
    Element,
    Text,
    Comment,
    Fragment,
}

struct NodeData {
    parent: RefCell<Weak<NodeData>>,
    children: RefCell<Vec<Node>>,
    kind: Kind,
}

enum Kind {
    Element(ElementData),
    Text(RefCell<String>),
    Comment(RefCell<String>),
    Fragment,
}

struct ElementData {
    tag: String,
    attributes: RefCell<Vec<Attr>>,
    // Live-state properties that are not (or no longer) mirrored by an attribute.
    state: RefCell<HashMap<String, PropValue>>,
}

/// A markup attribute. Bare ones come from boolean `true` and serialize as
/// the name alone.
#[derive(Clone)]
struct Attr {
    name: String,
    value: String,
    bare: bool,
}

/// Shared handle to one node of a live output tree.
///
/// Cloning a `Node` clones the handle, not the node: equality is identity.
#[derive(Clone)]
pub struct Node(Rc<NodeData>);

/// Non-owning handle, used by side tables keyed on node identity.
#[derive(Clone)]
pub struct WeakNode(Weak<NodeData>);

impl WeakNode {
    pub fn upgrade(&self) -> Option<Node> {
        self.0.upgrade().map(Node)
    }

    pub fn is_alive(&self) -> bool {
        self.0.strong_count() > 0
    }
}

impl Node {
    fn new(kind: Kind) -> Self {
        Node(Rc::new(NodeData {
            parent: RefCell::new(Weak::new()),
            children: RefCell::new(Vec::new()),
            kind,
        }))
    }

    pub fn element(tag: impl Into<String>) -> Self {
        Self::new(Kind::Element(ElementData {
            tag: tag.into(),
            attributes: RefCell::new(Vec::new()),
            state: RefCell::new(HashMap::new()),
        }))
    }

    pub fn text(data: impl Into<String>) -> Self {
        Self::new(Kind::Text(RefCell::new(data.into())))
    }

    pub fn comment(data: impl Into<String>) -> Self {
        Self::new(Kind::Comment(RefCell::new(data.into())))
    }

    /// A detached container. Inserting a fragment moves its children.
    pub fn fragment() -> Self {
        Self::new(Kind::Fragment)
    }

    pub fn node_type(&self) -> NodeType {
        match self.0.kind {
            Kind::Element(_) => NodeType::Element,
            Kind::Text(_) => NodeType::Text,
            Kind::Comment(_) => NodeType::Comment,
            Kind::Fragment => NodeType::Fragment,
        }
    }

    pub fn is_text(&self) -> bool {
        self.node_type() == NodeType::Text
    }

    pub fn is_comment(&self) -> bool {
        self.node_type() == NodeType::Comment
    }

    pub fn is_element(&self) -> bool {
        self.node_type() == NodeType::Element
    }

    pub fn tag_name(&self) -> Option<&str> {
        match &self.0.kind {
            Kind::Element(el) => Some(&el.tag),
            _ => None,
        }
    }

    /// Character data of a text or comment node.
    pub fn data(&self) -> Option<String> {
        match &self.0.kind {
            Kind::Text(data) | Kind::Comment(data) => Some(data.borrow().clone()),
            _ => None,
        }
    }

    /// Replaces the character data of a text or comment node. Other kinds are left untouched.
    pub fn set_data(&self, value: impl Into<String>) {
        if let Kind::Text(data) | Kind::Comment(data) = &self.0.kind {
            *data.borrow_mut() = value.into();
        }
    }

    pub fn ptr_eq(&self, other: &Node) -> bool {
        Rc::ptr_eq(&self.0, &other.0)
    }

    pub fn downgrade(&self) -> WeakNode {
        WeakNode(Rc::downgrade(&self.0))
    }

    /// Identity key, stable for as long as this node is alive.
    pub fn key(&self) -> usize {
        Rc::as_ptr(&self.0) as usize
    }

    pub fn parent(&self) -> Option<Node> {
        self.0.parent.borrow().upgrade().map(Node)
    }

    pub fn children(&self) -> Vec<Node> {
        self.0.children.borrow().clone()
    }

    pub fn child_count(&self) -> usize {
        self.0.children.borrow().len()
    }

    pub fn has_child_nodes(&self) -> bool {
        !self.0.children.borrow().is_empty()
    }

    pub fn first_child(&self) -> Option<Node> {
        self.0.children.borrow().first().cloned()
    }

    pub fn last_child(&self) -> Option<Node> {
        self.0.children.borrow().last().cloned()
    }

    fn position_in_parent(&self) -> Option<(Node, usize)> {
        let parent = self.parent()?;
        let index = parent
            .0
            .children
            .borrow()
            .iter()
            .position(|c| c.ptr_eq(self))?;
        Some((parent, index))
    }

    pub fn next_sibling(&self) -> Option<Node> {
        let (parent, index) = self.position_in_parent()?;
        let children = parent.0.children.borrow();
        children.get(index + 1).cloned()
    }

    pub fn previous_sibling(&self) -> Option<Node> {
        let (parent, index) = self.position_in_parent()?;
        let children = parent.0.children.borrow();
        index.checked_sub(1).and_then(|i| children.get(i).cloned())
    }

    pub fn append_child(&self, child: &Node) {
        self.insert_before(child, None);
    }

    /// Inserts `new` before `reference`, or appends when `reference` is `None`
    /// or not a child of `self`. Fragments are emptied into the target.
    pub fn insert_before(&self, new: &Node, reference: Option<&Node>) {
        let moved = if new.node_type() == NodeType::Fragment {
            let moved = std::mem::take(&mut *new.0.children.borrow_mut());
            for child in &moved {
                *child.0.parent.borrow_mut() = Weak::new();
            }
            moved
        } else {
            new.detach();
            vec![new.clone()]
        };

        let mut children = self.0.children.borrow_mut();
        let mut index = reference
            .and_then(|r| children.iter().position(|c| c.ptr_eq(r)))
            .unwrap_or(children.len());
        for child in moved {
            *child.0.parent.borrow_mut() = Rc::downgrade(&self.0);
            children.insert(index, child);
            index += 1;
        }
    }

    /// Returns `false` when `child` was not a child of `self`.
    pub fn remove_child(&self, child: &Node) -> bool {
        let removed = {
            let mut children = self.0.children.borrow_mut();
            match children.iter().position(|c| c.ptr_eq(child)) {
                Some(index) => Some(children.remove(index)),
                None => None,
            }
        };
        match removed {
            Some(node) => {
                *node.0.parent.borrow_mut() = Weak::new();
                true
            }
            None => false,
        }
    }

    pub fn replace_child(&self, new: &Node, old: &Node) {
        self.insert_before(new, Some(old));
        self.remove_child(old);
    }

    /// Removes this node from its parent, if any.
    pub fn detach(&self) {
        if let Some(parent) = self.parent() {
            parent.remove_child(self);
        }
    }

    /// Copies the node without its children.
    pub fn clone_node(&self) -> Node {
        match &self.0.kind {
            Kind::Element(el) => {
                let copy = Node::element(el.tag.clone());
                if let Kind::Element(target) = &copy.0.kind {
                    *target.attributes.borrow_mut() = el.attributes.borrow().clone();
                    *target.state.borrow_mut() = el.state.borrow().clone();
                }
                copy
            }
            Kind::Text(data) => Node::text(data.borrow().clone()),
            Kind::Comment(data) => Node::comment(data.borrow().clone()),
            Kind::Fragment => Node::fragment(),
        }
    }

    /// Splits a text node at byte `offset`, keeping the head in `self` and
    /// inserting the tail as the following sibling. Returns the tail node, or
    /// `None` when this is not a text node or `offset` is not a char boundary.
    pub fn split_text(&self, offset: usize) -> Option<Node> {
        let Kind::Text(data) = &self.0.kind else {
            return None;
        };
        let tail = {
            let mut data = data.borrow_mut();
            if !data.is_char_boundary(offset) {
                return None;
            }
            data.split_off(offset)
        };
        let tail = Node::text(tail);
        if let Some(parent) = self.parent() {
            let next = self.next_sibling();
            parent.insert_before(&tail, next.as_ref());
        }
        Some(tail)
    }

    pub fn attribute(&self, name: &str) -> Option<String> {
        let Kind::Element(el) = &self.0.kind else {
            return None;
        };
        el.attributes
            .borrow()
            .iter()
            .find(|a| a.name == name)
            .map(|a| a.value.clone())
    }

    pub fn has_attribute(&self, name: &str) -> bool {
        self.attribute(name).is_some()
    }

    pub fn attributes(&self) -> Vec<(String, String)> {
        match &self.0.kind {
            Kind::Element(el) => el
                .attributes
                .borrow()
                .iter()
                .map(|a| (a.name.clone(), a.value.clone()))
                .collect(),
            _ => Vec::new(),
        }
    }

    /// Attributes as serialized: `None` for a bare name.
    pub(crate) fn markup_attributes(&self) -> Vec<(String, Option<String>)> {
        match &self.0.kind {
            Kind::Element(el) => el
                .attributes
                .borrow()
                .iter()
                .map(|a| (a.name.clone(), (!a.bare).then(|| a.value.clone())))
                .collect(),
            _ => Vec::new(),
        }
    }

    pub fn set_attribute(&self, name: &str, value: impl Into<String>) {
        self.write_attribute(name, value.into(), false);
    }

    /// Sets a boolean attribute: present with an empty value, written as the
    /// name alone.
    pub fn set_bare_attribute(&self, name: &str) {
        self.write_attribute(name, String::new(), true);
    }

    pub fn is_bare_attribute(&self, name: &str) -> bool {
        match &self.0.kind {
            Kind::Element(el) => el.attributes.borrow().iter().any(|a| a.name == name && a.bare),
            _ => false,
        }
    }

    fn write_attribute(&self, name: &str, value: String, bare: bool) {
        let Kind::Element(el) = &self.0.kind else {
            return;
        };
        let mut attrs = el.attributes.borrow_mut();
        match attrs.iter_mut().find(|a| a.name == name) {
            Some(slot) => {
                slot.value = value;
                slot.bare = bare;
            }
            None => attrs.push(Attr {
                name: name.to_string(),
                value,
                bare,
            }),
        }
    }

    pub fn remove_attribute(&self, name: &str) {
        if let Kind::Element(el) = &self.0.kind {
            el.attributes.borrow_mut().retain(|a| a.name != name);
        }
    }

    /// Reads a live property. Reflected properties are derived from their
    /// attribute; live-state properties fall back to the attribute default
    /// until they have been written.
    pub fn property(&self, name: &str) -> PropValue {
        let Kind::Element(el) = &self.0.kind else {
            return PropValue::Null;
        };
        match reflection(name) {
            Some(Reflect::State { attr, boolean }) => {
                if let Some(value) = el.state.borrow().get(name) {
                    return value.clone();
                }
                self.reflected(attr, boolean)
            }
            Some(Reflect::Attr { attr, boolean }) => self.reflected(attr, boolean),
            None => el.state.borrow().get(name).cloned().unwrap_or(PropValue::Null),
        }
    }

    fn reflected(&self, attr: &str, boolean: bool) -> PropValue {
        if boolean {
            PropValue::Bool(self.has_attribute(attr))
        } else {
            PropValue::Str(self.attribute(attr).unwrap_or_default())
        }
    }

    pub fn set_property(&self, name: &str, value: impl Into<PropValue>) {
        let Kind::Element(el) = &self.0.kind else {
            return;
        };
        let value = value.into();
        match reflection(name) {
            Some(Reflect::State { boolean, .. }) => {
                let value = if boolean {
                    PropValue::Bool(value.is_truthy())
                } else {
                    PropValue::Str(value.to_text())
                };
                el.state.borrow_mut().insert(name.to_string(), value);
            }
            Some(Reflect::Attr { attr, boolean: true }) => {
                if value.is_truthy() {
                    self.set_bare_attribute(attr);
                } else {
                    self.remove_attribute(attr);
                }
            }
            Some(Reflect::Attr { attr, boolean: false }) => match value {
                PropValue::Null => self.remove_attribute(attr),
                other => self.set_attribute(attr, other.to_text()),
            },
            None => {
                el.state.borrow_mut().insert(name.to_string(), value);
            }
        }
    }

    /// Concatenated data of all descendant text nodes.
    pub fn text_content(&self) -> String {
        let mut out = String::new();
        collect_text(self, &mut out);
        out
    }
}

fn collect_text(node: &Node, out: &mut String) {
    match &node.0.kind {
        Kind::Text(data) => out.push_str(&data.borrow()),
        Kind::Comment(_) => {}
        Kind::Element(_) | Kind::Fragment => {
            for child in node.children() {
                collect_text(&child, out);
            }
        }
    }
}

impl PartialEq for Node {
    fn eq(&self, other: &Self) -> bool {
        self.ptr_eq(other)
    }
}

impl Eq for Node {}

impl fmt::Debug for Node {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match &self.0.kind {
            Kind::Element(el) => write!(f, "<{}>", el.tag),
            Kind::Text(data) => write!(f, "#text {:?}", data.borrow()),
            Kind::Comment(data) => write!(f, "<!--{}-->", data.borrow()),
            Kind::Fragment => write!(f, "#fragment"),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn fragment_children_move_on_insert() {
        let parent = Node::element("ul");
        let tail = Node::element("li");
        parent.append_child(&tail);

        let frag = Node::fragment();
        frag.append_child(&Node::text("a"));
        frag.append_child(&Node::text("b"));
        parent.insert_before(&frag, Some(&tail));

        assert!(!frag.has_child_nodes());
        assert_eq!(parent.child_count(), 3);
        assert_eq!(parent.first_child().and_then(|n| n.data()).as_deref(), Some("a"));
        assert_eq!(parent.last_child(), Some(tail));
    }

    #[test]
    fn siblings_follow_document_order() {
        let parent = Node::element("div");
        let a = Node::text("a");
        let b = Node::comment("b");
        parent.append_child(&a);
        parent.append_child(&b);
        assert_eq!(a.next_sibling(), Some(b.clone()));
        assert_eq!(b.previous_sibling(), Some(a.clone()));
        assert_eq!(b.next_sibling(), None);
        assert_eq!(a.previous_sibling(), None);
    }

    #[test]
    fn split_text_inserts_tail_after_head() {
        let parent = Node::element("p");
        let node = Node::text("By Alice");
        parent.append_child(&node);
        let tail = node.split_text(3).unwrap();
        assert_eq!(node.data().as_deref(), Some("By "));
        assert_eq!(tail.data().as_deref(), Some("Alice"));
        assert_eq!(node.next_sibling(), Some(tail));
    }

    #[test]
    fn appending_reparents() {
        let a = Node::element("div");
        let b = Node::element("div");
        let child = Node::text("x");
        a.append_child(&child);
        b.append_child(&child);
        assert_eq!(a.child_count(), 0);
        assert_eq!(child.parent(), Some(b));
    }
}
