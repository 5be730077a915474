//! The `HookContract` trait and the per-pipeline outcomes a hook can return.
//!
//! Each hook in a [`HookChain`](super::chain::HookChain) implements
//! `HookContract`. Every handler slot defaults to "continue unchanged" so a
//! hook author only overrides the method families they actually care about —
//! the same default-no-op-handler shape used by interceptor-style traits
//! elsewhere in this ecosystem.

use async_trait::async_trait;
use serde_json::Value;

use crate::envelope::Envelope;
use crate::error::HookChainError;

/// Invoked exactly once, with the final response-or-error the chain
/// eventually settles on, after a `continueAsync` background continuation
/// finishes (spec.md P8).
pub type ContinuationCallback = Box<dyn FnOnce(Result<Value, HookChainError>) + Send>;

/// Outcome of a hook's request-handling method.
pub enum RequestHookResult {
    /// Pass the (possibly mutated) envelope to the next hook, or to the
    /// target transport if this was the last hook in the chain.
    Continue(Envelope),
    /// Short-circuit the chain and answer the caller directly with `result`,
    /// without forwarding the request further.
    Respond(Value),
    /// Answer the caller immediately with `immediate`, then hand `request`
    /// back to the chain: the framework resumes traversal from the next hook
    /// on its own, forwarding to the target if the chain completes, and
    /// invokes `callback` exactly once with whatever the chain eventually
    /// settles on. See [`crate::pipeline::request`] for the ordering
    /// guarantees this implies.
    ContinueAsync {
        request: Envelope,
        immediate: Value,
        callback: ContinuationCallback,
    },
    /// Stop the chain and fail the request with a normalized error.
    Abort(HookChainError),
}

/// Outcome of a hook's response-handling method.
pub enum ResponseHookResult {
    /// Pass the (possibly mutated) envelope to the next hook in the reverse
    /// traversal.
    Continue(Envelope),
    /// Replace a failed response with a recovered successful result,
    /// re-entering the success path for the remainder of the traversal.
    Recover(Value),
    /// Stop the reverse traversal and fail with a normalized error.
    Abort(HookChainError),
}

/// Outcome of a hook's notification-handling method. Notifications have no
/// reply to recover or respond with, so only `Continue`/`Abort` exist.
pub enum NotificationHookResult {
    Continue(Envelope),
    Abort(HookChainError),
}

impl RequestHookResult {
    pub fn continue_unchanged(envelope: Envelope) -> Self {
        RequestHookResult::Continue(envelope)
    }
}

impl ResponseHookResult {
    pub fn continue_unchanged(envelope: Envelope) -> Self {
        ResponseHookResult::Continue(envelope)
    }
}

impl NotificationHookResult {
    pub fn continue_unchanged(envelope: Envelope) -> Self {
        NotificationHookResult::Continue(envelope)
    }
}

/// Generates one request/response/error handler triple per method family,
/// each defaulting to "continue, unchanged" unless a hook overrides it.
///
/// Mirrors the default-no-op-handler-per-lifecycle-point shape used by
/// interceptor traits in this ecosystem, specialized to MCP's method
/// families instead of a generic request lifecycle.
macro_rules! method_family_hooks {
    ($( $family:ident => ($on_req:ident, $on_res:ident, $on_err:ident) ),+ $(,)?) => {
        $(
            /// Called for an inbound request in this method family.
            async fn $on_req(&self, envelope: Envelope) -> RequestHookResult {
                RequestHookResult::continue_unchanged(envelope)
            }

            /// Called for a successful response in this method family,
            /// during the reverse traversal.
            async fn $on_res(&self, envelope: Envelope) -> ResponseHookResult {
                ResponseHookResult::continue_unchanged(envelope)
            }

            /// Called for an error response in this method family, during
            /// the reverse traversal's failure path.
            async fn $on_err(&self, envelope: Envelope) -> ResponseHookResult {
                ResponseHookResult::continue_unchanged(envelope)
            }
        )+
    };
}

/// A single participant in the hook chain.
///
/// `name` must be stable and unique within a chain; the passthrough context
/// and error-recovery pipeline report it in diagnostics and in
/// [`crate::error::HookChainError::hook_abort`].
#[async_trait]
pub trait HookContract: Send + Sync {
    /// Stable, unique identifier for this hook within its chain.
    fn name(&self) -> &str;

    method_family_hooks! {
        initialize => (on_initialize_request, on_initialize_response, on_initialize_error),
        tools_list => (on_tools_list_request, on_tools_list_response, on_tools_list_error),
        tools_call => (on_tools_call_request, on_tools_call_response, on_tools_call_error),
        prompts_list => (on_prompts_list_request, on_prompts_list_response, on_prompts_list_error),
        resources_list => (on_resources_list_request, on_resources_list_response, on_resources_list_error),
        resources_templates_list => (
            on_resources_templates_list_request,
            on_resources_templates_list_response,
            on_resources_templates_list_error
        ),
        resources_read => (on_resources_read_request, on_resources_read_response, on_resources_read_error),
        other => (on_other_request, on_other_response, on_other_error),
    }

    /// Called for a one-way notification traveling in either direction.
    async fn on_notification(&self, envelope: Envelope) -> NotificationHookResult {
        NotificationHookResult::continue_unchanged(envelope)
    }
}
