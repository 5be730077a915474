//! Additive `_meta` annotation applied to every message that crosses a
//! [`PassthroughContext`](super::context::PassthroughContext) (spec.md I5/P7).

use chrono::Utc;
use serde_json::Value;

use crate::envelope::Envelope;

/// Stamp `session_id`/`timestamp`/`source` onto `envelope`'s `_meta`.
///
/// `session_id` and any other key a hook already placed survive untouched;
/// `timestamp` is always refreshed and `source` is always set, matching
/// spec.md §4.5's "adds keys only if absent, except timestamp" precedence
/// rule.
pub fn annotate_outbound(envelope: &mut Envelope, session_id: Option<&str>, source_tag: &str) {
    envelope.annotate_meta("timestamp", Value::String(Utc::now().to_rfc3339()), true);
    envelope.annotate_meta("source", Value::String(source_tag.to_string()), true);
    if let Some(session_id) = session_id {
        envelope.annotate_meta("session_id", Value::String(session_id.to_string()), false);
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::base::jsonrpc::RequestId;
    use crate::envelope::{Direction, RequestExtra};

    #[test]
    fn annotation_preserves_hook_set_session_id_but_refreshes_timestamp() {
        let mut envelope = Envelope::request(
            RequestId::new_number(1),
            "tools/call",
            None,
            Direction::Server,
            RequestExtra::new(None, Direction::Server),
        );
        envelope.annotate_meta("session_id", Value::String("hook-chosen".into()), false);
        envelope.annotate_meta("timestamp", Value::String("stale".into()), false);

        annotate_outbound(&mut envelope, Some("transport-session"), "passthrough-server");

        assert_eq!(
            envelope.meta("session_id"),
            Some(&Value::String("hook-chosen".into()))
        );
        assert_ne!(envelope.meta("timestamp"), Some(&Value::String("stale".into())));
        assert_eq!(
            envelope.meta("source"),
            Some(&Value::String("passthrough-server".into()))
        );
    }

    #[test]
    fn annotation_sets_session_id_when_absent() {
        let mut envelope = Envelope::notification(
            "initialized",
            None,
            Direction::Target,
            RequestExtra::new(None, Direction::Target),
        );

        annotate_outbound(&mut envelope, Some("sess-1"), "passthrough-server");

        assert_eq!(envelope.meta("session_id"), Some(&Value::String("sess-1".into())));
    }
}
