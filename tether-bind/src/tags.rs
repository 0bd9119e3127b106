//! Back-references from tree nodes to the bindings that own them.
//!
//! Host nodes cannot carry arbitrary fields, so tags live in a thread-local
//! side table keyed by node identity. The table holds neither nodes nor
//! bindings alive: every lookup checks the entry still refers to the same
//! node, and entries whose node or bindings are gone are swept as the table
//! grows.

use std::cell::RefCell;
use std::collections::HashMap;

use tether_dom::{Node, WeakNode};

use crate::binding::{Binding, WeakBinding};

/// Role a node plays for the binding tagged on it.
#[derive(Debug, Clone, PartialEq, Eq, Hash)]
pub enum TagKey {
    /// Text or comment owned by a node binding.
    Node,
    /// Begin marker of a block range.
    Start,
    /// End marker of a block range.
    End,
    /// Begin marker of one list item.
    ItemStart,
    /// End marker of one list item.
    ItemEnd,
    /// Element owning a bound attribute.
    Attribute(String),
}

struct Entry {
    node: WeakNode,
    tags: Vec<(TagKey, WeakBinding)>,
}

#[derive(Default)]
struct TagTable {
    entries: HashMap<usize, Entry>,
    inserts: usize,
}

const SWEEP_INTERVAL: usize = 1024;

impl TagTable {
    fn entry(&mut self, node: &Node) -> Option<&mut Entry> {
        let key = node.key();
        let live = self
            .entries
            .get(&key)
            .is_some_and(|e| e.node.upgrade().is_some_and(|n| n.ptr_eq(node)));
        if !live {
            self.entries.remove(&key);
            return None;
        }
        self.entries.get_mut(&key)
    }

    fn sweep(&mut self) {
        self.entries.retain(|_, e| {
            e.tags.retain(|(_, b)| b.is_alive());
            e.node.is_alive() && !e.tags.is_empty()
        });
        self.inserts = 0;
    }
}

thread_local! {
    static TAGS: RefCell<TagTable> = RefCell::new(TagTable::default());
}

/// Tags `node` with `binding` under `key`, replacing an earlier tag.
pub fn tag_node(node: &Node, key: TagKey, binding: &Binding) {
    TAGS.with(|t| {
        let mut table = t.borrow_mut();
        table.inserts += 1;
        if table.inserts >= SWEEP_INTERVAL {
            table.sweep();
        }
        if table.entry(node).is_none() {
            table.entries.insert(
                node.key(),
                Entry {
                    node: node.downgrade(),
                    tags: Vec::new(),
                },
            );
        }
        if let Some(entry) = table.entry(node) {
            match entry.tags.iter_mut().find(|(k, _)| *k == key) {
                Some(slot) => slot.1 = binding.downgrade(),
                None => entry.tags.push((key, binding.downgrade())),
            }
        }
    });
}

pub fn read_tag(node: &Node, key: &TagKey) -> Option<Binding> {
    TAGS.with(|t| {
        let mut table = t.borrow_mut();
        let entry = table.entry(node)?;
        entry
            .tags
            .iter()
            .find(|(k, _)| k == key)
            .and_then(|(_, b)| b.upgrade())
    })
}

/// Every live tag on `node`, in the order they were added.
pub fn read_tags(node: &Node) -> Vec<(TagKey, Binding)> {
    TAGS.with(|t| {
        let mut table = t.borrow_mut();
        table
            .entry(node)
            .map(|e| {
                e.tags
                    .iter()
                    .filter_map(|(k, b)| Some((k.clone(), b.upgrade()?)))
                    .collect()
            })
            .unwrap_or_default()
    })
}

pub fn untag(node: &Node, key: &TagKey) {
    TAGS.with(|t| {
        if let Some(entry) = t.borrow_mut().entry(node) {
            entry.tags.retain(|(k, _)| k != key);
        }
    });
}

/// Drops every tag on `node` and its descendants.
pub fn release(node: &Node) {
    TAGS.with(|t| {
        let mut table = t.borrow_mut();
        let mut stack = vec![node.clone()];
        while let Some(n) = stack.pop() {
            if table.entry(&n).is_some() {
                table.entries.remove(&n.key());
            }
            stack.extend(n.children());
        }
    });
}

#[cfg(test)]
fn table_len() -> usize {
    TAGS.with(|t| t.borrow().entries.len())
}

#[cfg(test)]
fn sweep_now() {
    TAGS.with(|t| t.borrow_mut().sweep());
}
