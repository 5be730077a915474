//! Shared traversal direction for the three pipelines.
//!
//! Requests from the host walk the chain head-to-tail; requests from the
//! target walk it tail-to-head so a hook registered "closest to the host"
//! runs last for target-originated traffic, symmetric to running first for
//! host-originated traffic (spec.md P6). Responses and notifications retrace
//! the same chain in the opposite direction from their paired request.

use crate::hook::chain::{HookChain, NodeId};

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum PipelineDirection {
    Forward,
    Reverse,
}

impl PipelineDirection {
    /// The direction a paired response/error traversal runs in, given the
    /// direction its request traversal ran in.
    pub fn reverse(self) -> Self {
        match self {
            PipelineDirection::Forward => PipelineDirection::Reverse,
            PipelineDirection::Reverse => PipelineDirection::Forward,
        }
    }

    pub fn head(self, chain: &HookChain) -> Option<NodeId> {
        match self {
            PipelineDirection::Forward => chain.first(),
            PipelineDirection::Reverse => chain.last(),
        }
    }

    pub fn advance(self, chain: &HookChain, node: NodeId) -> Option<NodeId> {
        match self {
            PipelineDirection::Forward => chain.next(node),
            PipelineDirection::Reverse => chain.prev(node),
        }
    }
}
