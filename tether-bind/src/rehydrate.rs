//! Claims an existing tree for a template.
//!
//! The existing tree is assumed to come from parsing the template's string
//! render. A reference tree is rendered live against the same data, walked in
//! lockstep with the existing one, and every binding is moved across. The
//! existing nodes stay; only marker comments and empty text nodes that a
//! markup parser cannot reproduce are inserted.

use std::rc::Rc;

use tether_dom::{Node, NodeType};
use tracing::{debug, error, trace};

use crate::context::Ctx;
use crate::error::Error;
use crate::tags::{self, read_tags, tag_node};
use crate::template::Template;

/// Renders `template` as a reference tree and attaches its bindings to the
/// children of `existing`. Bindings are registered with `context` as the
/// reference tree is built.
pub fn rehydrate(template: &Rc<Template>, context: &Ctx, existing: &Node) -> Result<(), Error> {
    debug!("rehydrating existing tree");
    let reference = template.fragment(context);
    let result = attach(&reference, existing);
    tags::release(&reference);
    result
}

/// Moves every binding tagged under `reference` onto the matching node under
/// `existing`. Fails on the first node that does not line up.
pub fn attach(reference: &Node, existing: &Node) -> Result<(), Error> {
    attach_children(reference, existing, &mut Vec::new())
}

fn attach_children(reference: &Node, existing: &Node, path: &mut Vec<usize>) -> Result<(), Error> {
    let mut current = existing.first_child();
    for (index, node) in reference.children().into_iter().enumerate() {
        path.push(index);
        let mut next = current.as_ref().and_then(Node::next_sibling);

        match node.node_type() {
            NodeType::Text => match &current {
                Some(target) if target.is_text() => {
                    let data = node.data().unwrap_or_default();
                    let found = target.data().unwrap_or_default();
                    // the parser merged adjacent text; split it back apart
                    if found != data && found.starts_with(&data) {
                        next = target.split_text(data.len());
                    }
                }
                _ => {
                    let empty = Node::text("");
                    existing.insert_before(&empty, current.as_ref());
                    next = current.take();
                    current = Some(empty);
                }
            },
            NodeType::Comment => {
                let matches = current
                    .as_ref()
                    .is_some_and(|t| t.is_comment() && t.data() == node.data());
                if !matches {
                    let copy = node.clone_node();
                    existing.insert_before(&copy, current.as_ref());
                    next = current.take();
                    current = Some(copy);
                }
            }
            _ => {}
        }

        let Some(target) = current else {
            return Err(mismatch(path, describe(Some(&node)), describe(None)));
        };
        if !equivalent(&node, &target) {
            return Err(mismatch(path, describe(Some(&node)), describe(Some(&target))));
        }
        transplant(&node, &target);
        if node.is_element() {
            attach_children(&node, &target, path)?;
        }
        path.pop();
        current = next;
    }
    if let Some(extra) = current {
        return Err(mismatch(path, "no more nodes".to_string(), describe(Some(&extra))));
    }
    Ok(())
}

fn equivalent(reference: &Node, existing: &Node) -> bool {
    if reference.node_type() != existing.node_type() {
        return false;
    }
    match reference.node_type() {
        NodeType::Element => match (reference.tag_name(), existing.tag_name()) {
            (Some(a), Some(b)) => a.eq_ignore_ascii_case(b),
            _ => false,
        },
        NodeType::Text | NodeType::Comment => reference.data() == existing.data(),
        NodeType::Fragment => true,
    }
}

fn transplant(reference: &Node, existing: &Node) {
    for (key, binding) in read_tags(reference) {
        trace!(?key, "moving binding onto existing node");
        binding.retarget(&key, existing);
        tag_node(existing, key.clone(), &binding);
        tags::untag(reference, &key);
    }
}

fn mismatch(path: &[usize], expected: String, found: String) -> Error {
    let path = if path.is_empty() {
        "root".to_string()
    } else {
        path.iter().map(|i| i.to_string()).collect::<Vec<_>>().join("/")
    };
    error!(%path, %expected, %found, "existing markup does not match the template");
    Error::StructuralMismatch {
        path,
        expected,
        found,
    }
}

fn describe(node: Option<&Node>) -> String {
    let Some(node) = node else {
        return "nothing".to_string();
    };
    match node.node_type() {
        NodeType::Element => format!("<{}>", node.tag_name().unwrap_or_default()),
        NodeType::Text => format!("text {:?}", node.data().unwrap_or_default()),
        NodeType::Comment => format!("comment {:?}", node.data().unwrap_or_default()),
        NodeType::Fragment => "fragment".to_string(),
    }
}
