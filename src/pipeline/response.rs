//! Reverse traversal of the hook chain for responses, with a success/failure
//! state machine and recovery.

use tracing::{trace, warn};

use serde_json::Value;

use crate::envelope::{Envelope, MethodFamily};
use crate::error::HookChainError;
use crate::hook::chain::{HookChain, NodeId};
use crate::hook::contract::{HookContract, ResponseHookResult};
use crate::pipeline::direction::PipelineDirection;

/// Result of running a response through the chain in reverse.
pub enum ResponseOutcome {
    /// Every hook continued (or the chain was empty) and the traversal ended
    /// on the success path; deliver `envelope` to the caller as-is.
    Delivered(Envelope),
    /// The traversal ended on the failure path, whether because it started
    /// there (an error arrived from upstream/a request-pipeline abort) or a
    /// hook threw mid-traversal (spec.md §4.3: a throw "sets the error, stays
    /// on/switches to the failure path" — it does not itself end the walk).
    Abort(HookChainError),
}

/// Best-effort reconstruction of a `HookChainError` from whatever JSON shape
/// an incoming error payload carries, for the case where the pipeline starts
/// already in the failure path (no hook has thrown yet to supply one).
fn error_from_value(value: &Value) -> HookChainError {
    let code = value
        .get("code")
        .and_then(Value::as_i64)
        .map(|c| c as i32)
        .unwrap_or(crate::error::INTERNAL_ERROR_CODE);
    let message = value
        .get("message")
        .and_then(Value::as_str)
        .unwrap_or("error")
        .to_string();
    let mut err = HookChainError::new(code, message);
    if let Some(data) = value.get("data").cloned().filter(|d| !d.is_null()) {
        err = err.with_data(data);
    }
    err
}

async fn dispatch(
    hook: &dyn HookContract,
    envelope: Envelope,
    is_error: bool,
) -> ResponseHookResult {
    match (envelope.family, is_error) {
        (MethodFamily::Initialize, false) => hook.on_initialize_response(envelope).await,
        (MethodFamily::Initialize, true) => hook.on_initialize_error(envelope).await,
        (MethodFamily::ToolsList, false) => hook.on_tools_list_response(envelope).await,
        (MethodFamily::ToolsList, true) => hook.on_tools_list_error(envelope).await,
        (MethodFamily::ToolsCall, false) => hook.on_tools_call_response(envelope).await,
        (MethodFamily::ToolsCall, true) => hook.on_tools_call_error(envelope).await,
        (MethodFamily::PromptsList, false) => hook.on_prompts_list_response(envelope).await,
        (MethodFamily::PromptsList, true) => hook.on_prompts_list_error(envelope).await,
        (MethodFamily::ResourcesList, false) => hook.on_resources_list_response(envelope).await,
        (MethodFamily::ResourcesList, true) => hook.on_resources_list_error(envelope).await,
        (MethodFamily::ResourcesTemplatesList, false) => {
            hook.on_resources_templates_list_response(envelope).await
        }
        (MethodFamily::ResourcesTemplatesList, true) => {
            hook.on_resources_templates_list_error(envelope).await
        }
        (MethodFamily::ResourcesRead, false) => hook.on_resources_read_response(envelope).await,
        (MethodFamily::ResourcesRead, true) => hook.on_resources_read_error(envelope).await,
        (MethodFamily::Other, false) => hook.on_other_response(envelope).await,
        (MethodFamily::Other, true) => hook.on_other_error(envelope).await,
    }
}

/// Run `envelope` (a response, successful or failed) backward through
/// `chain`, starting from the last hook and walking toward the first.
///
/// A hook on the failure path that returns `Recover` switches the remainder
/// of the traversal onto the success path: later (in traversal order,
/// i.e. earlier-registered) hooks see a successful response, not the
/// original error.
pub async fn run_response_pipeline(chain: &HookChain, envelope: Envelope) -> ResponseOutcome {
    run_response_pipeline_from(chain, envelope, chain.last(), PipelineDirection::Reverse).await
}

/// Run `envelope` forward through `chain`, starting from the first hook.
///
/// Used to pair with [`crate::pipeline::request::run_request_pipeline_reverse`]
/// for target-originated requests: the response retraces the chain in the
/// opposite order from the request, just as the host-originated path runs
/// its request forward and its response in reverse.
pub async fn run_response_pipeline_forward(chain: &HookChain, envelope: Envelope) -> ResponseOutcome {
    run_response_pipeline_from(chain, envelope, chain.first(), PipelineDirection::Forward).await
}

/// Run `envelope` through `chain` starting at an explicit node, in the given
/// direction.
///
/// This is the entry point the passthrough context actually drives: the
/// reverse (or forward, for target-originated traffic) traversal must begin
/// at the same node the paired request pipeline last processed, not
/// unconditionally at the opposite end of the chain (spec.md I2/P2/P4) — a
/// hook whose request handler never ran (absent, or skipped by an earlier
/// `respond`) must not have its response/error handler invoked either.
pub async fn run_response_pipeline_from(
    chain: &HookChain,
    mut envelope: Envelope,
    start: Option<NodeId>,
    direction: PipelineDirection,
) -> ResponseOutcome {
    let mut cursor = start;
    let mut is_error = envelope.error.is_some();
    let mut last_error = envelope.error.as_ref().map(error_from_value);

    while let Some(node) = cursor {
        let Some(hook) = chain.get(node) else {
            cursor = direction.advance(chain, node);
            continue;
        };

        trace!(
            hook = hook.name(),
            is_error,
            "response pipeline: invoking hook"
        );

        match dispatch(hook.as_ref(), envelope, is_error).await {
            ResponseHookResult::Continue(next_envelope) => {
                envelope = next_envelope;
                cursor = direction.advance(chain, node);
            }
            ResponseHookResult::Recover(result) => {
                warn!(hook = hook.name(), "response pipeline: recovered from error");
                envelope.result = Some(result);
                envelope.error = None;
                is_error = false;
                last_error = None;
                cursor = direction.advance(chain, node);
            }
            ResponseHookResult::Abort(err) => {
                // A throw replaces the current error and switches to (or stays
                // on) the failure path, but does not end the traversal: an
                // earlier-registered hook still gets a chance to recover
                // (spec.md P5).
                warn!(hook = hook.name(), code = err.code, "response pipeline: hook threw, entering failure path");
                envelope.error = Some(serde_json::json!({
                    "code": err.code,
                    "message": err.message,
                    "data": err.data,
                }));
                is_error = true;
                last_error = Some(err);
                cursor = direction.advance(chain, node);
            }
        }
    }

    if is_error {
        ResponseOutcome::Abort(last_error.unwrap_or_else(|| {
            HookChainError::normalize("response pipeline ended in the failure path with no recorded error")
        }))
    } else {
        ResponseOutcome::Delivered(envelope)
    }
}
