//! Hook chain engine: the ordered set of participants that every message
//! passing through a [`crate::passthrough::PassthroughContext`] is run
//! through, and the per-method-family contract each participant implements.

pub mod chain;
pub mod contract;

pub use chain::{HookChain, NodeId};
pub use contract::{
    ContinuationCallback, HookContract, NotificationHookResult, RequestHookResult,
    ResponseHookResult,
};
