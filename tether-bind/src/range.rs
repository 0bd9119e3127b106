//! Item-level maintenance of bound lists.
//!
//! Items are addressed by their begin markers rather than by sibling offset,
//! since one item can own any number of host nodes. Walking hops from one
//! item's begin marker straight past its end marker, so nested lists inside
//! an item never disturb the count.

use std::rc::Rc;

use tether_dom::Node;
use tracing::debug;

use crate::binding::{Binding, BindingKind, Span, emit_removed};
use crate::html::item_count;
use crate::live;
use crate::tags::{self, TagKey, read_tag};
use crate::template::Template;

impl Binding {
    /// Renders `count` new items starting at `index` from the current data.
    pub fn insert(&self, index: usize, count: usize) {
        let (template, span) = self.each_range("insert");
        let Template::Each(each) = &*template else {
            return;
        };
        debug!(index, count, "inserting list items");
        let context = self.context();
        if each.else_children.is_some() && items(&template, &span).is_empty() {
            // the else branch is showing; rebuild the whole list
            self.update();
            return;
        }
        let Some(parent) = span.start.parent() else {
            return;
        };
        let at = locate(&template, &span, index);
        let list = context.child(&*each.expression);
        let fragment = Node::fragment();
        for i in index..index + count {
            live::append_item(&template, each, &fragment, &list.each_child(i), None, i);
        }
        parent.insert_before(&fragment, Some(&at));
        reindex(&template, &span);
    }

    /// Removes `count` items starting at `index`, notifying every binding
    /// inside them.
    pub fn remove(&self, index: usize, count: usize) {
        let (template, span) = self.each_range("remove");
        let Template::Each(each) = &*template else {
            return;
        };
        debug!(index, count, "removing list items");
        let context = self.context();
        let Some(parent) = span.start.parent() else {
            return;
        };
        let mut cursor = Some(locate(&template, &span, index));
        let mut removed = 0;
        while removed < count {
            let Some(node) = cursor else { break };
            if node == span.end {
                break;
            }
            cursor = node.next_sibling();
            if read_tag(&node, &TagKey::ItemEnd).is_some_and(|b| b.renders(&template)) {
                removed += 1;
            }
            parent.remove_child(&node);
            emit_removed(&context, &node, Some(self));
            tags::release(&node);
            cursor = cursor.filter(|n| n.parent().as_ref() == Some(&parent));
        }
        if each.else_children.is_some()
            && item_count(&each.expression.get(&*context)) == 0
            && items(&template, &span).is_empty()
        {
            self.update();
            return;
        }
        reindex(&template, &span);
    }

    /// Moves `count` items from `from` to `to`. `to` is an index into the
    /// list as it stands after the moved items are taken out. Nodes keep
    /// their identity and no removal notifications fire.
    pub fn move_items(&self, from: usize, to: usize, count: usize) {
        let (template, span) = self.each_range("move_items");
        debug!(from, to, count, "moving list items");
        let Some(parent) = span.start.parent() else {
            return;
        };
        let fragment = Node::fragment();
        let mut cursor = Some(locate(&template, &span, from));
        let mut moved = 0;
        while moved < count {
            let Some(node) = cursor else { break };
            if node == span.end {
                break;
            }
            cursor = node.next_sibling();
            if read_tag(&node, &TagKey::ItemEnd).is_some_and(|b| b.renders(&template)) {
                moved += 1;
            }
            fragment.append_child(&node);
        }
        let at = locate(&template, &span, to);
        parent.insert_before(&fragment, Some(&at));
        reindex(&template, &span);
    }

    /// Item bindings currently in the list, in document order.
    pub fn items(&self) -> Vec<Binding> {
        let (template, span) = self.each_range("items");
        items(&template, &span)
    }

    fn each_range(&self, operation: &str) -> (Rc<Template>, Span) {
        match (self.kind(), self.template(), self.span()) {
            (BindingKind::Range, Some(template), Some(span))
                if matches!(*template, Template::Each(_)) =>
            {
                (template, span)
            }
            (kind, ..) => panic!("{operation} needs the binding of a whole list, got {kind:?}"),
        }
    }
}

/// Begin marker of item `index`, or the end marker when the list is shorter.
fn locate(template: &Rc<Template>, span: &Span, index: usize) -> Node {
    let mut seen = 0;
    let mut cursor = span.start.next_sibling();
    while let Some(node) = cursor {
        if node == span.end {
            return node;
        }
        match item_at(template, &node) {
            Some(item) => {
                if seen == index {
                    return node;
                }
                seen += 1;
                cursor = item.span().and_then(|s| s.end.next_sibling());
            }
            None => cursor = node.next_sibling(),
        }
    }
    span.end.clone()
}

fn item_at(template: &Rc<Template>, node: &Node) -> Option<Binding> {
    read_tag(node, &TagKey::ItemStart).filter(|b| b.renders(template))
}

fn items(template: &Rc<Template>, span: &Span) -> Vec<Binding> {
    let mut out = Vec::new();
    let mut cursor = span.start.next_sibling();
    while let Some(node) = cursor {
        if node == span.end {
            break;
        }
        match item_at(template, &node) {
            Some(item) => {
                cursor = item.span().and_then(|s| s.end.next_sibling());
                out.push(item);
            }
            None => cursor = node.next_sibling(),
        }
    }
    out
}

fn reindex(template: &Rc<Template>, span: &Span) {
    for (index, item) in items(template, span).iter().enumerate() {
        item.set_item_index(index);
        item.context().set_item_index(index);
    }
}
