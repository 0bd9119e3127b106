//! Live update handles.
//!
//! A binding ties one template position to the output it produced. Holders
//! call [`Binding::update`] after the data changes; the binding re-renders its
//! own position and swaps the output in place. The tree refers back to its
//! bindings through [`crate::tags`].

use std::cell::RefCell;
use std::fmt;
use std::rc::{Rc, Weak};

use tether_dom::{Node, PropValue};
use tracing::{debug, trace, warn};

use crate::context::{Context, Ctx, Expression};
use crate::html;
use crate::live;
use crate::tags::{self, TagKey, read_tags, tag_node};
use crate::template::{Template, update_property};
use crate::value::Value;

/// Sibling span bounded by two marker nodes, inclusive. Both ends are the
/// same node when an item renders to a single node.
#[derive(Debug, Clone, PartialEq)]
pub struct Span {
    pub start: Node,
    pub end: Node,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum BindingKind {
    Node,
    Attribute,
    /// A whole block, conditional or list.
    Range,
    /// One list item, with its index at render time.
    Item(usize),
}

#[derive(Clone)]
pub(crate) enum Target {
    Node {
        template: Rc<Template>,
        node: Node,
    },
    Attribute {
        expression: Rc<dyn Expression>,
        element: Node,
        name: String,
    },
    Range {
        template: Rc<Template>,
        span: Span,
        item: Option<usize>,
    },
}

struct Inner {
    context: RefCell<Ctx>,
    target: RefCell<Target>,
}

/// Shared handle; clones refer to the same binding.
#[derive(Clone)]
pub struct Binding(Rc<Inner>);

/// Non-owning handle kept by the tag table. The binding lives as long as
/// whoever registered it holds on to it.
#[derive(Clone)]
pub(crate) struct WeakBinding(Weak<Inner>);

impl WeakBinding {
    pub(crate) fn upgrade(&self) -> Option<Binding> {
        self.0.upgrade().map(Binding)
    }

    pub(crate) fn is_alive(&self) -> bool {
        self.0.strong_count() > 0
    }
}

impl Binding {
    fn new(context: Ctx, target: Target) -> Binding {
        Binding(Rc::new(Inner {
            context: RefCell::new(context),
            target: RefCell::new(target),
        }))
    }

    pub(crate) fn for_node(template: Rc<Template>, context: Ctx, node: Node) -> Binding {
        let binding = Binding::new(
            context,
            Target::Node {
                template,
                node: node.clone(),
            },
        );
        tag_node(&node, TagKey::Node, &binding);
        binding
    }

    pub(crate) fn for_attribute(
        expression: Rc<dyn Expression>,
        context: Ctx,
        element: Node,
        name: &str,
    ) -> Binding {
        let binding = Binding::new(
            context,
            Target::Attribute {
                expression,
                element: element.clone(),
                name: name.to_string(),
            },
        );
        tag_node(&element, TagKey::Attribute(name.to_string()), &binding);
        binding
    }

    pub(crate) fn for_range(
        template: Rc<Template>,
        context: Ctx,
        span: Span,
        item: Option<usize>,
    ) -> Binding {
        let binding = Binding::new(
            context,
            Target::Range {
                template,
                span: span.clone(),
                item,
            },
        );
        binding.tag_span(&span, item.is_some());
        binding
    }

    fn tag_span(&self, span: &Span, item: bool) {
        let (start, end) = if item {
            (TagKey::ItemStart, TagKey::ItemEnd)
        } else {
            (TagKey::Start, TagKey::End)
        };
        tag_node(&span.start, start, self);
        tag_node(&span.end, end, self);
    }

    pub fn kind(&self) -> BindingKind {
        match &*self.0.target.borrow() {
            Target::Node { .. } => BindingKind::Node,
            Target::Attribute { .. } => BindingKind::Attribute,
            Target::Range { item: None, .. } => BindingKind::Range,
            Target::Range { item: Some(i), .. } => BindingKind::Item(*i),
        }
    }

    /// Template position this binding renders. Attribute bindings have none.
    pub fn template(&self) -> Option<Rc<Template>> {
        match &*self.0.target.borrow() {
            Target::Node { template, .. } | Target::Range { template, .. } => {
                Some(template.clone())
            }
            Target::Attribute { .. } => None,
        }
    }

    pub fn context(&self) -> Ctx {
        self.0.context.borrow().clone()
    }

    /// Text or comment node of a node binding.
    pub fn node(&self) -> Option<Node> {
        match &*self.0.target.borrow() {
            Target::Node { node, .. } => Some(node.clone()),
            _ => None,
        }
    }

    /// Element and attribute name of an attribute binding.
    pub fn attribute(&self) -> Option<(Node, String)> {
        match &*self.0.target.borrow() {
            Target::Attribute { element, name, .. } => Some((element.clone(), name.clone())),
            _ => None,
        }
    }

    pub fn span(&self) -> Option<Span> {
        match &*self.0.target.borrow() {
            Target::Range { span, .. } => Some(span.clone()),
            _ => None,
        }
    }

    pub fn ptr_eq(&self, other: &Binding) -> bool {
        Rc::ptr_eq(&self.0, &other.0)
    }

    pub(crate) fn downgrade(&self) -> WeakBinding {
        WeakBinding(Rc::downgrade(&self.0))
    }

    pub(crate) fn target(&self) -> Target {
        self.0.target.borrow().clone()
    }

    pub(crate) fn renders(&self, template: &Rc<Template>) -> bool {
        match &*self.0.target.borrow() {
            Target::Node { template: t, .. } | Target::Range { template: t, .. } => {
                Rc::ptr_eq(t, template)
            }
            Target::Attribute { .. } => false,
        }
    }

    pub(crate) fn set_item_index(&self, index: usize) {
        if let Target::Range { item: Some(i), .. } = &mut *self.0.target.borrow_mut() {
            *i = index;
        }
    }

    /// Points the binding at new markers and tags them.
    pub(crate) fn repoint(&self, new_span: Span) {
        let item = {
            let mut target = self.0.target.borrow_mut();
            match &mut *target {
                Target::Range { span, item, .. } => {
                    *span = new_span.clone();
                    item.is_some()
                }
                _ => return,
            }
        };
        self.tag_span(&new_span, item);
    }

    /// Moves whatever part of this binding `key` names onto `node`.
    pub(crate) fn retarget(&self, key: &TagKey, to: &Node) {
        let mut target = self.0.target.borrow_mut();
        match (&mut *target, key) {
            (Target::Node { node, .. }, TagKey::Node) => *node = to.clone(),
            (Target::Attribute { element, .. }, TagKey::Attribute(_)) => *element = to.clone(),
            (Target::Range { span, .. }, TagKey::Start | TagKey::ItemStart) => {
                span.start = to.clone()
            }
            (Target::Range { span, .. }, TagKey::End | TagKey::ItemEnd) => span.end = to.clone(),
            _ => {}
        }
    }

    /// Re-renders against the context the binding was created with.
    pub fn update(&self) {
        let context = self.context();
        self.render_update(context);
    }

    /// Re-renders against `context`, which replaces the stored one.
    pub fn update_with(&self, context: Ctx) {
        *self.0.context.borrow_mut() = context.clone();
        self.render_update(context);
    }

    fn render_update(&self, context: Ctx) {
        debug!(kind = ?self.kind(), "updating binding");
        // clone out so no borrow is held while user code runs
        match self.target() {
            Target::Node { template, node } => update_node(&template, &*context, &node),
            Target::Attribute {
                expression,
                element,
                name,
            } => update_attribute(&*expression, &*context, &element, &name),
            Target::Range {
                template,
                span,
                item,
            } => {
                let Some(parent) = span.start.parent() else {
                    warn!("range start is detached; skipping update");
                    return;
                };
                let fragment = Node::fragment();
                match item {
                    None => live::append(&template, &fragment, &context, Some(self)),
                    Some(index) => {
                        if let Template::Each(each) = &*template {
                            live::append_item(&template, each, &fragment, &context, Some(self), index);
                        }
                    }
                }
                replace_range(&context, &parent, &span, &fragment, self);
            }
        }
    }
}

fn update_node(template: &Template, context: &dyn Context, node: &Node) {
    match template {
        Template::DynamicText(expression) => {
            node.set_data(html::sync_text(expression.get(context)));
        }
        Template::DynamicComment(expression) => {
            let value = html::unwrap_template(expression.get(context), context);
            node.set_data(html::sync_text(value));
        }
        _ => {}
    }
}

fn update_attribute(expression: &dyn Expression, context: &dyn Context, element: &Node, name: &str) {
    let value = html::settle_sync(html::unwrap_template(expression.get(context), context));
    if let Some(property) = update_property(name) {
        element.set_property(property, prop_value(value));
        return;
    }
    match value {
        Value::Null | Value::Bool(false) => element.remove_attribute(name),
        Value::Bool(true) => element.set_bare_attribute(name),
        other => element.set_attribute(name, other.to_text()),
    }
}

pub(crate) fn prop_value(value: Value) -> PropValue {
    match html::settle_sync(value) {
        Value::Null | Value::Bool(false) => PropValue::Null,
        Value::Bool(true) => PropValue::Bool(true),
        other => PropValue::Str(other.to_text()),
    }
}

/// Swaps the nodes of `span` for the contents of `fragment`.
///
/// Every removed node is detached before the fragment goes in, and every
/// binding tagged anywhere inside it except `owner` gets a removal
/// notification.
fn replace_range(context: &Ctx, parent: &Node, span: &Span, fragment: &Node, owner: &Binding) {
    let mut nodes = Vec::new();
    let mut cursor = Some(span.start.clone());
    while let Some(node) = cursor {
        cursor = node.next_sibling();
        let last = node == span.end;
        nodes.push(node);
        if last {
            break;
        }
    }
    let after = nodes.last().and_then(Node::next_sibling);

    for node in &nodes {
        emit_removed(context, node, Some(owner));
        parent.remove_child(node);
    }
    let after = after.filter(|n| n.parent().as_ref() == Some(parent));
    parent.insert_before(fragment, after.as_ref());
    for node in &nodes {
        tags::release(node);
    }
}

/// Notifies `context` of every binding tagged on `node` or below it.
pub(crate) fn emit_removed(context: &Ctx, node: &Node, ignore: Option<&Binding>) {
    for (key, binding) in read_tags(node) {
        if matches!(key, TagKey::End | TagKey::ItemEnd) {
            continue;
        }
        if ignore.is_some_and(|b| b.ptr_eq(&binding)) {
            continue;
        }
        trace!(?key, "binding removed");
        context.on_remove(&binding);
    }
    for child in node.children() {
        emit_removed(context, &child, ignore);
    }
}

impl fmt::Debug for Binding {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_tuple("Binding").field(&self.kind()).finish()
    }
}
