//! Forward traversal of the hook chain for inbound requests.

use tracing::trace;

use crate::envelope::{Envelope, MethodFamily};
use crate::error::HookChainError;
use crate::hook::chain::{HookChain, NodeId};
use crate::hook::contract::{ContinuationCallback, HookContract, RequestHookResult};
use crate::pipeline::direction::PipelineDirection;

/// Result of running a request through the chain.
///
/// Every variant carries the `last_node` the traversal stopped at (`None` for
/// an empty chain), so the caller can start the paired response traversal
/// from exactly that position (spec.md I2/P2) instead of re-walking from the
/// opposite end.
pub enum RequestOutcome {
    /// Every hook continued (or the chain was empty); forward `envelope` to
    /// the target transport.
    Forward {
        envelope: Envelope,
        last_node: Option<NodeId>,
    },
    /// A hook answered the caller directly; do not forward to the target.
    /// The response pipeline must start at `last_node`, the hook that
    /// responded (spec.md P4).
    Respond {
        response: serde_json::Value,
        last_node: Option<NodeId>,
    },
    /// A hook answered the caller immediately with `immediate` and handed
    /// `request` back to the chain. The caller must be replied to with
    /// `immediate` right away; the framework then resumes traversal on its
    /// own starting at the node *after* `last_node` in `direction`,
    /// forwarding to the target if the chain completes, and invokes
    /// `callback` exactly once with the eventual outcome (spec.md P8).
    ContinueAsync {
        request: Envelope,
        immediate: serde_json::Value,
        callback: ContinuationCallback,
        last_node: Option<NodeId>,
    },
    /// A hook aborted the chain. The error pipeline must start at
    /// `last_node`, the hook that threw.
    Abort {
        error: HookChainError,
        last_node: Option<NodeId>,
    },
}

async fn dispatch(hook: &dyn HookContract, envelope: Envelope) -> RequestHookResult {
    match envelope.family {
        MethodFamily::Initialize => hook.on_initialize_request(envelope).await,
        MethodFamily::ToolsList => hook.on_tools_list_request(envelope).await,
        MethodFamily::ToolsCall => hook.on_tools_call_request(envelope).await,
        MethodFamily::PromptsList => hook.on_prompts_list_request(envelope).await,
        MethodFamily::ResourcesList => hook.on_resources_list_request(envelope).await,
        MethodFamily::ResourcesTemplatesList => {
            hook.on_resources_templates_list_request(envelope).await
        }
        MethodFamily::ResourcesRead => hook.on_resources_read_request(envelope).await,
        MethodFamily::Other => hook.on_other_request(envelope).await,
    }
}

/// Run `envelope` forward through `chain`, starting at the first hook.
///
/// An empty chain is the identity transformation: the envelope is forwarded
/// unchanged, matching the empty-chain-as-pass-through invariant the rest of
/// the traversal algorithms also honor.
pub async fn run_request_pipeline(chain: &HookChain, envelope: Envelope) -> RequestOutcome {
    run_request_pipeline_from(chain, envelope, chain.first(), PipelineDirection::Forward).await
}

/// Run `envelope` in reverse through `chain`, starting at the last hook.
///
/// Used for requests originating from the target side: the passthrough
/// context walks the chain tail-to-head so a hook registered "closest to the
/// host" still runs last for target-originated traffic, symmetric to how it
/// runs first for host-originated traffic.
pub async fn run_request_pipeline_reverse(chain: &HookChain, envelope: Envelope) -> RequestOutcome {
    run_request_pipeline_from(chain, envelope, chain.last(), PipelineDirection::Reverse).await
}

/// Run `envelope` through `chain` starting at an explicit node, in the given
/// direction. Used to resume a `continueAsync` background continuation from
/// the node after the one that emitted it.
pub async fn run_request_pipeline_from(
    chain: &HookChain,
    mut envelope: Envelope,
    start: Option<NodeId>,
    direction: PipelineDirection,
) -> RequestOutcome {
    let mut cursor = start;
    let mut last_node = None;

    while let Some(node) = cursor {
        let Some(hook) = chain.get(node) else {
            // Node was removed mid-traversal; skip to its successor without
            // treating this position as processed (spec.md 4.2.a).
            cursor = direction.advance(chain, node);
            continue;
        };

        trace!(hook = hook.name(), method = ?envelope.method, "request pipeline: invoking hook");
        last_node = Some(node);

        match dispatch(hook.as_ref(), envelope).await {
            RequestHookResult::Continue(next_envelope) => {
                envelope = next_envelope;
                cursor = direction.advance(chain, node);
            }
            RequestHookResult::Respond(response) => {
                return RequestOutcome::Respond { response, last_node }
            }
            RequestHookResult::ContinueAsync {
                request,
                immediate,
                callback,
            } => {
                return RequestOutcome::ContinueAsync {
                    request,
                    immediate,
                    callback,
                    last_node,
                }
            }
            RequestHookResult::Abort(error) => return RequestOutcome::Abort { error, last_node },
        }
    }

    RequestOutcome::Forward { envelope, last_node }
}
