//! Forward traversal of the hook chain for one-way notifications.

use tracing::trace;

use crate::envelope::Envelope;
use crate::error::HookChainError;
use crate::hook::chain::HookChain;
use crate::pipeline::direction::PipelineDirection;

/// Result of running a notification through the chain.
pub enum NotificationOutcome {
    /// Every hook continued (or the chain was empty); deliver the
    /// notification to the other side.
    Delivered(Envelope),
    /// A hook aborted delivery. There is no caller to answer — the
    /// passthrough context only logs and drops the notification (spec.md I4).
    Abort(HookChainError),
}

/// Run `envelope` (a notification) forward through `chain`, from host to target.
pub async fn run_notification_pipeline(
    chain: &HookChain,
    envelope: Envelope,
) -> NotificationOutcome {
    run_notification_pipeline_from(chain, envelope, chain.first(), PipelineDirection::Forward)
        .await
}

/// Run `envelope` (a notification) backward through `chain`, from target to host.
pub async fn run_notification_pipeline_reverse(
    chain: &HookChain,
    envelope: Envelope,
) -> NotificationOutcome {
    run_notification_pipeline_from(chain, envelope, chain.last(), PipelineDirection::Reverse).await
}

async fn run_notification_pipeline_from(
    chain: &HookChain,
    mut envelope: Envelope,
    start: Option<crate::hook::chain::NodeId>,
    direction: PipelineDirection,
) -> NotificationOutcome {
    let mut cursor = start;

    while let Some(node) = cursor {
        let Some(hook) = chain.get(node) else {
            cursor = direction.advance(chain, node);
            continue;
        };

        trace!(hook = hook.name(), method = ?envelope.method, "notification pipeline: invoking hook");

        match hook.on_notification(envelope).await {
            crate::hook::contract::NotificationHookResult::Continue(next_envelope) => {
                envelope = next_envelope;
                cursor = direction.advance(chain, node);
            }
            crate::hook::contract::NotificationHookResult::Abort(err) => {
                return NotificationOutcome::Abort(err)
            }
        }
    }

    NotificationOutcome::Delivered(envelope)
}
