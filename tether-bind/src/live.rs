//! Live-tree rendering: materializes a template into host nodes and registers
//! a binding for every dynamic position.

use std::rc::Rc;

use tether_dom::Node;
use tracing::debug;

use crate::binding::{Binding, Span, prop_value};
use crate::context::Ctx;
use crate::html;
use crate::template::{Attribute, Each, Template, create_property};
use crate::value::Value;

impl Template {
    /// Renders into `parent`, registering every binding with `context`.
    pub fn append_to(self: &Rc<Self>, parent: &Node, context: &Ctx) {
        debug!("rendering live tree");
        append(self, parent, context, None);
    }

    /// Renders into a detached fragment.
    pub fn fragment(self: &Rc<Self>, context: &Ctx) -> Node {
        let fragment = Node::fragment();
        self.append_to(&fragment, context);
        fragment
    }
}

/// Renders `template` into `parent`. When `binding` is given, a range
/// position reuses it instead of registering a new one.
pub(crate) fn append(template: &Rc<Template>, parent: &Node, context: &Ctx, binding: Option<&Binding>) {
    match &**template {
        Template::Text(data) => parent.append_child(&Node::text(data.as_str())),
        Template::Comment(data) => parent.append_child(&Node::comment(data.as_str())),
        Template::DynamicText(expression) => {
            let value = expression.get(&**context);
            if let Value::Template(inner) = value {
                append(&inner, parent, context, None);
                return;
            }
            let node = Node::text(html::sync_text(value));
            parent.append_child(&node);
            context.on_add(&Binding::for_node(template.clone(), context.clone(), node));
        }
        Template::DynamicComment(expression) => {
            let value = html::unwrap_template(expression.get(&**context), &**context);
            let node = Node::comment(html::sync_text(value));
            parent.append_child(&node);
            context.on_add(&Binding::for_node(template.clone(), context.clone(), node));
        }
        Template::Element(element) => {
            let node = Node::element(element.tag.as_str());
            for (name, attribute) in element.attributes.iter() {
                let value = match attribute {
                    Attribute::Static(value) => value.clone(),
                    Attribute::Dynamic(expression) => {
                        let binding = Binding::for_attribute(
                            expression.clone(),
                            context.clone(),
                            node.clone(),
                            name,
                        );
                        context.on_add(&binding);
                        html::unwrap_template(expression.get(&**context), &**context)
                    }
                };
                apply_attribute(&node, name, value);
            }
            if !element.is_void {
                append_all(&element.children, &node, context);
            }
            parent.append_child(&node);
        }
        Template::Block(block) => {
            let start = marker(parent, &block.markers.begin);
            let inner = context.child(&*block.expression);
            append_all(&block.children, parent, &inner);
            let end = marker(parent, &block.markers.end);
            bind_range(template, context, binding, Span { start, end }, None);
        }
        Template::Conditional(conditional) => {
            let start = marker(parent, &conditional.markers.begin);
            if let Some(branch) = conditional.select(&**context) {
                let inner = context.child(&*branch.expression);
                append_all(&branch.children, parent, &inner);
            }
            let end = marker(parent, &conditional.markers.end);
            bind_range(template, context, binding, Span { start, end }, None);
        }
        Template::Each(each) => {
            let start = marker(parent, &each.markers.begin);
            let count = html::item_count(&each.expression.get(&**context));
            let items = context.child(&*each.expression);
            if count > 0 {
                for index in 0..count {
                    append_item(template, each, parent, &items.each_child(index), None, index);
                }
            } else if let Some(children) = &each.else_children {
                append_all(children, parent, &items);
            }
            let end = marker(parent, &each.markers.end);
            bind_range(template, context, binding, Span { start, end }, None);
        }
        Template::Root(children) => append_all(children, parent, context),
        Template::Boundary => {}
    }
}

fn append_all(children: &[Rc<Template>], parent: &Node, context: &Ctx) {
    for child in children {
        append(child, parent, context, None);
    }
}

/// Renders one list item and binds its span. An item that produced no nodes
/// gets a single `empty` comment as both of its markers.
pub(crate) fn append_item(
    template: &Rc<Template>,
    each: &Each,
    parent: &Node,
    context: &Ctx,
    binding: Option<&Binding>,
    index: usize,
) {
    let before = parent.last_child();
    append_all(&each.children, parent, context);
    let after = parent.last_child();

    let start = match &before {
        Some(node) => node.next_sibling(),
        None => parent.first_child(),
    };
    let span = match (start, after) {
        (Some(start), Some(end)) => Span { start, end },
        _ => {
            let empty = marker(parent, "empty");
            Span {
                start: empty.clone(),
                end: empty,
            }
        }
    };
    bind_range(template, context, binding, span, Some(index));
}

fn marker(parent: &Node, data: &str) -> Node {
    let node = Node::comment(data);
    parent.append_child(&node);
    node
}

fn bind_range(
    template: &Rc<Template>,
    context: &Ctx,
    binding: Option<&Binding>,
    span: Span,
    item: Option<usize>,
) {
    match binding {
        Some(binding) => binding.repoint(span),
        None => {
            let binding = Binding::for_range(template.clone(), context.clone(), span, item);
            context.on_add(&binding);
        }
    }
}

/// First materialization of an attribute value.
fn apply_attribute(element: &Node, name: &str, value: Value) {
    let value = html::settle_sync(value);
    if let Some(property) = create_property(name) {
        element.set_property(property, prop_value(value));
        return;
    }
    match value {
        Value::Null | Value::Bool(false) => {}
        Value::Bool(true) => element.set_bare_attribute(name),
        other => element.set_attribute(name, other.to_text()),
    }
}
