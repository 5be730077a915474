//! Ordered hook chain with stable node identity.
//!
//! The chain is backed by an arena (`Vec<Option<Arc<dyn HookContract>>>`) plus
//! an explicit traversal order (`Vec<usize>` of arena indices), rather than a
//! hand-rolled doubly linked list of raw pointers — Rust's aliasing rules make
//! raw `prev`/`next` pointers the wrong tool here, and an arena index gives the
//! same "stable identity, may look the node up until it's removed" guarantee
//! without unsafe code.

use std::sync::Arc;

use super::contract::HookContract;

/// Opaque handle to a position in a [`HookChain`].
///
/// Stable for the lifetime of the node it names: the same `NodeId` keeps
/// identifying the same hook across repeated pipeline runs, even as other
/// hooks are appended or removed, until that specific node is removed.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub struct NodeId(usize);

/// An ordered collection of hooks with forward and reverse traversal.
///
/// Hooks are normally registered once at startup and the chain is treated as
/// immutable while messages are flowing through it; `append`/`prepend`/
/// `remove` exist for completeness (and are exercised by tests) rather than as
/// a hot path invoked per message.
#[derive(Default)]
pub struct HookChain {
    arena: Vec<Option<Arc<dyn HookContract>>>,
    order: Vec<usize>,
}

impl HookChain {
    pub fn new() -> Self {
        Self {
            arena: Vec::new(),
            order: Vec::new(),
        }
    }

    pub fn is_empty(&self) -> bool {
        self.order.is_empty()
    }

    pub fn len(&self) -> usize {
        self.order.len()
    }

    /// Add a hook at the end of the chain.
    pub fn append(&mut self, hook: Arc<dyn HookContract>) -> NodeId {
        let index = self.arena.len();
        self.arena.push(Some(hook));
        self.order.push(index);
        NodeId(index)
    }

    /// Add a hook at the start of the chain.
    pub fn prepend(&mut self, hook: Arc<dyn HookContract>) -> NodeId {
        let index = self.arena.len();
        self.arena.push(Some(hook));
        self.order.insert(0, index);
        NodeId(index)
    }

    /// Remove a node from the traversal order. The arena slot is cleared, so
    /// subsequent lookups of this `NodeId` return `None` rather than dangling.
    pub fn remove(&mut self, node: NodeId) -> bool {
        if let Some(pos) = self.order.iter().position(|&idx| idx == node.0) {
            self.order.remove(pos);
            self.arena[node.0] = None;
            true
        } else {
            false
        }
    }

    /// Look up the hook a node identifies, if it has not been removed.
    pub fn get(&self, node: NodeId) -> Option<&Arc<dyn HookContract>> {
        self.arena.get(node.0).and_then(|slot| slot.as_ref())
    }

    /// The first node in forward traversal order, if the chain is non-empty.
    pub fn first(&self) -> Option<NodeId> {
        self.order.first().map(|&idx| NodeId(idx))
    }

    /// The last node in forward traversal order (the first in reverse),
    /// if the chain is non-empty.
    pub fn last(&self) -> Option<NodeId> {
        self.order.last().map(|&idx| NodeId(idx))
    }

    /// The node following `node` in forward order, or `None` at the end.
    pub fn next(&self, node: NodeId) -> Option<NodeId> {
        let pos = self.order.iter().position(|&idx| idx == node.0)?;
        self.order.get(pos + 1).map(|&idx| NodeId(idx))
    }

    /// The node preceding `node` in forward order (i.e. the next node when
    /// traversing in reverse), or `None` at the start.
    pub fn prev(&self, node: NodeId) -> Option<NodeId> {
        let pos = self.order.iter().position(|&idx| idx == node.0)?;
        pos.checked_sub(1).map(|prev_pos| NodeId(self.order[prev_pos]))
    }

    /// Iterate hooks in forward traversal order.
    pub fn iter(&self) -> impl Iterator<Item = (NodeId, &Arc<dyn HookContract>)> {
        self.order.iter().filter_map(move |&idx| {
            self.arena[idx].as_ref().map(|hook| (NodeId(idx), hook))
        })
    }

    /// Remove the first hook in forward order, if any.
    pub fn remove_first(&mut self) -> Option<NodeId> {
        let node = self.first()?;
        self.remove(node);
        Some(node)
    }

    /// Remove the last hook in forward order, if any.
    pub fn remove_last(&mut self) -> Option<NodeId> {
        let node = self.last()?;
        self.remove(node);
        Some(node)
    }

    /// First node (in forward order) whose hook reports the given `name`.
    pub fn find_by_name(&self, name: &str) -> Option<NodeId> {
        self.iter().find(|(_, hook)| hook.name() == name).map(|(node, _)| node)
    }

    /// All hooks, in forward (head-to-tail) traversal order.
    pub fn to_array(&self) -> Vec<Arc<dyn HookContract>> {
        self.iter().map(|(_, hook)| Arc::clone(hook)).collect()
    }

    /// All hooks, in reverse (tail-to-head) traversal order.
    pub fn to_reverse_array(&self) -> Vec<Arc<dyn HookContract>> {
        let mut hooks = self.to_array();
        hooks.reverse();
        hooks
    }
}
