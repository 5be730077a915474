//! End-to-end scenarios driving a full [`PassthroughContext`] through both of
//! its transports, exercising hook chains the way a real deployment would
//! configure them.

use std::sync::atomic::{AtomicUsize, Ordering};
use std::sync::{Arc, Mutex as StdMutex};

use async_trait::async_trait;
use mcp_hookchain::envelope::Envelope;
use mcp_hookchain::error::HookChainError;
use mcp_hookchain::hook::contract::{HookContract, RequestHookResult, ResponseHookResult};
use mcp_hookchain::passthrough::PassthroughContext;
use mcp_hookchain::transport::{JsonRpcMessage, MessageContext, MessageHandler, Transport, TransportError};
use serde_json::json;
use tokio::sync::{mpsc, oneshot};

type HandlerSlot = Arc<StdMutex<Option<Arc<dyn MessageHandler>>>>;

struct RecordingTransport {
    session_id: Option<String>,
    connected: bool,
    sent: mpsc::UnboundedSender<JsonRpcMessage>,
    handler: HandlerSlot,
}

impl RecordingTransport {
    /// Builds a transport plus two test-side handles: a receiver for whatever
    /// the context sends out this transport, and a slot that captures the
    /// `MessageHandler` the context installs on `connect`, so the test can
    /// later call it the same way a real transport's I/O loop would for an
    /// inbound message.
    fn new(session_id: Option<&str>) -> (Box<Self>, mpsc::UnboundedReceiver<JsonRpcMessage>, HandlerSlot) {
        let (tx, rx) = mpsc::unbounded_channel();
        let handler: HandlerSlot = Arc::new(StdMutex::new(None));
        (
            Box::new(Self {
                session_id: session_id.map(str::to_string),
                connected: false,
                sent: tx,
                handler: Arc::clone(&handler),
            }),
            rx,
            handler,
        )
    }
}

#[async_trait]
impl Transport for RecordingTransport {
    type Error = TransportError;

    async fn start(&mut self) -> Result<(), Self::Error> {
        self.connected = true;
        Ok(())
    }

    async fn close(&mut self) -> Result<(), Self::Error> {
        self.connected = false;
        Ok(())
    }

    async fn send(&mut self, message: JsonRpcMessage) -> Result<(), Self::Error> {
        let _ = self.sent.send(message);
        Ok(())
    }

    fn set_message_handler(&mut self, handler: Arc<dyn MessageHandler>) {
        *self.handler.lock().unwrap() = Some(handler);
    }

    fn session_id(&self) -> Option<String> {
        self.session_id.clone()
    }

    fn set_session_context(&mut self, session_id: Option<String>) {
        self.session_id = session_id;
    }

    fn is_connected(&self) -> bool {
        self.connected
    }

    fn transport_type(&self) -> &'static str {
        "recording"
    }
}

/// Hand `message` to whatever `MessageHandler` the context installed on this
/// slot's transport during `connect`, exactly as that transport's own I/O
/// loop would for an inbound message.
async fn deliver(handler: &HandlerSlot, message: JsonRpcMessage) {
    let handler = handler.lock().unwrap().clone().expect("transport was connected");
    handler.handle_message(message, MessageContext::without_session()).await;
}

/// S1 — Passthrough tools/call through an empty chain.
#[tokio::test]
async fn s1_passthrough_tools_call() {
    let context = PassthroughContext::new(vec![]).await.expect("context");
    let (host, mut host_rx, host_handler) = RecordingTransport::new(Some("host-session"));
    let (target, mut target_rx, target_handler) = RecordingTransport::new(Some("target-session"));
    context.connect(host, Some(target)).await.expect("connect");

    deliver(
        &host_handler,
        JsonRpcMessage::new_request(
            "tools/call",
            Some(json!({"name": "echo", "arguments": {"x": "hi"}})),
            json!(1),
        ),
    )
    .await;

    let forwarded = target_rx.recv().await.expect("forwarded to target");
    assert_eq!(forwarded.method.as_deref(), Some("tools/call"));
    let forwarded_id = forwarded.id.clone().unwrap();

    deliver(
        &target_handler,
        JsonRpcMessage::new_response(
            json!({"content": [{"type": "text", "text": "hi"}]}),
            forwarded_id,
        ),
    )
    .await;

    let replied = host_rx.recv().await.expect("reply to host");
    let result = replied.result.expect("successful result");
    assert_eq!(result["content"][0]["text"], json!("hi"));
    assert_eq!(result["_meta"]["source"], json!("passthrough-server"));
}

/// S2 — A hook mutates `arguments.x` on the way through; the target must
/// see the mutated value, and the response travels back unchanged.
#[tokio::test]
async fn s2_request_mutation_reaches_target() {
    struct UppercaseArgX;

    #[async_trait]
    impl HookContract for UppercaseArgX {
        fn name(&self) -> &str {
            "uppercase-arg-x"
        }

        async fn on_tools_call_request(&self, mut envelope: Envelope) -> RequestHookResult {
            if let Some(params) = envelope.params.as_mut() {
                if let Some(x) = params.pointer_mut("/arguments/x") {
                    if let Some(s) = x.as_str() {
                        *x = json!(s.to_uppercase());
                    }
                }
            }
            RequestHookResult::Continue(envelope)
        }
    }

    let context = PassthroughContext::new(vec![Arc::new(UppercaseArgX)])
        .await
        .expect("context");
    let (host, mut host_rx, host_handler) = RecordingTransport::new(None);
    let (target, mut target_rx, target_handler) = RecordingTransport::new(None);
    context.connect(host, Some(target)).await.expect("connect");

    deliver(
        &host_handler,
        JsonRpcMessage::new_request(
            "tools/call",
            Some(json!({"name": "echo", "arguments": {"x": "hi"}})),
            json!(1),
        ),
    )
    .await;

    let forwarded = target_rx.recv().await.expect("forwarded to target");
    assert_eq!(forwarded.params.unwrap()["arguments"]["x"], json!("HI"));
    let forwarded_id = forwarded.id.clone().unwrap();

    deliver(
        &target_handler,
        JsonRpcMessage::new_response(json!({"content": [{"type": "text", "text": "HI"}]}), forwarded_id),
    )
    .await;

    let replied = host_rx.recv().await.expect("reply to host");
    let result = replied.result.expect("successful result");
    assert_eq!(result["content"][0]["text"], json!("HI"));
}

/// S3 — A hook that throws on a specific argument aborts the chain before
/// the target is ever contacted.
#[tokio::test]
async fn s3_abort_never_contacts_upstream() {
    struct RejectDangerous;

    #[async_trait]
    impl HookContract for RejectDangerous {
        fn name(&self) -> &str {
            "reject-dangerous"
        }

        async fn on_tools_call_request(&self, envelope: Envelope) -> RequestHookResult {
            let name = envelope
                .params
                .as_ref()
                .and_then(|p| p.get("name"))
                .and_then(|n| n.as_str());
            if name == Some("dangerous") {
                RequestHookResult::Abort(HookChainError::request_rejected("reject-dangerous", "refused dangerous call"))
            } else {
                RequestHookResult::Continue(envelope)
            }
        }
    }

    let context = PassthroughContext::new(vec![Arc::new(RejectDangerous)])
        .await
        .expect("context");
    let (host, mut host_rx, host_handler) = RecordingTransport::new(None);
    let (target, mut target_rx, target_handler) = RecordingTransport::new(None);
    context.connect(host, Some(target)).await.expect("connect");

    deliver(
        &host_handler,
        JsonRpcMessage::new_request("tools/call", Some(json!({"name": "dangerous"})), json!(1)),
    )
    .await;

    let replied = host_rx.recv().await.expect("abort reply");
    let error = replied.error.expect("error response");
    assert_eq!(error.message, "refused dangerous call");
    assert_eq!(error.code, mcp_hookchain::error::NO_TRANSPORT_CODE as i64);
    assert!(target_rx.try_recv().is_err(), "upstream must never be contacted");
}

/// S4 — H2 throws on the request path; H1's error handler recovers with a
/// fallback result, and H1's success handler must not also run.
#[tokio::test]
async fn s4_recovery_lifts_error_into_success_at_recovering_hook() {
    struct H1 {
        success_handler_called: Arc<AtomicUsize>,
    }

    #[async_trait]
    impl HookContract for H1 {
        fn name(&self) -> &str {
            "h1"
        }

        async fn on_tools_call_response(&self, envelope: Envelope) -> ResponseHookResult {
            self.success_handler_called.fetch_add(1, Ordering::SeqCst);
            ResponseHookResult::Continue(envelope)
        }

        async fn on_tools_call_error(&self, _envelope: Envelope) -> ResponseHookResult {
            ResponseHookResult::Recover(json!({"content": [{"type": "text", "text": "fallback"}]}))
        }
    }

    struct H2;

    #[async_trait]
    impl HookContract for H2 {
        fn name(&self) -> &str {
            "h2"
        }

        async fn on_tools_call_request(&self, _envelope: Envelope) -> RequestHookResult {
            RequestHookResult::Abort(HookChainError::new(-32001, "blocked"))
        }
    }

    let success_handler_called = Arc::new(AtomicUsize::new(0));
    let h1 = Arc::new(H1 {
        success_handler_called: Arc::clone(&success_handler_called),
    });
    let context = PassthroughContext::new(vec![h1, Arc::new(H2)])
        .await
        .expect("context");
    let (host, mut host_rx, host_handler) = RecordingTransport::new(None);
    context.connect(host, None).await.expect("connect");

    deliver(
        &host_handler,
        JsonRpcMessage::new_request("tools/call", Some(json!({"name": "whatever"})), json!(1)),
    )
    .await;

    let replied = host_rx.recv().await.expect("recovered reply");
    let result = replied.result.expect("recovery must produce a success response");
    assert_eq!(result["content"][0]["text"], json!("fallback"));
    assert!(replied.error.is_none());
    assert_eq!(
        success_handler_called.load(Ordering::SeqCst),
        0,
        "H1's success handler must not run once recovery already delivered the response"
    );
}

/// S5 — Three hooks each tag a `tools/list` response; reverse traversal
/// means the last-registered hook's tag lands closest to the original text.
#[tokio::test]
async fn s5_reverse_traversal_tags_tools_list_in_registration_reverse_order() {
    struct Tagger {
        tag: &'static str,
    }

    #[async_trait]
    impl HookContract for Tagger {
        fn name(&self) -> &str {
            self.tag
        }

        async fn on_tools_list_response(&self, mut envelope: Envelope) -> ResponseHookResult {
            if let Some(result) = envelope.result.as_mut() {
                if let Some(tools) = result.get_mut("tools").and_then(|t| t.as_array_mut()) {
                    for tool in tools {
                        if let Some(name) = tool.get("name").and_then(|n| n.as_str()) {
                            let tagged = format!("[{}] {}", self.tag, name);
                            tool["name"] = json!(tagged);
                        }
                    }
                }
            }
            ResponseHookResult::Continue(envelope)
        }
    }

    let context = PassthroughContext::new(vec![
        Arc::new(Tagger { tag: "H1" }),
        Arc::new(Tagger { tag: "H2" }),
        Arc::new(Tagger { tag: "H3" }),
    ])
    .await
    .expect("context");

    let (host, mut host_rx, host_handler) = RecordingTransport::new(None);
    let (target, mut target_rx, target_handler) = RecordingTransport::new(None);
    context.connect(host, Some(target)).await.expect("connect");

    deliver(&host_handler, JsonRpcMessage::new_request("tools/list", None, json!(1))).await;

    let forwarded = target_rx.recv().await.expect("forwarded");
    let forwarded_id = forwarded.id.clone().unwrap();

    deliver(
        &target_handler,
        JsonRpcMessage::new_response(json!({"tools": [{"name": "original"}]}), forwarded_id),
    )
    .await;

    let replied = host_rx.recv().await.expect("tagged reply");
    let name = replied.result.unwrap()["tools"][0]["name"].clone();
    assert_eq!(name, json!("[H1] [H2] [H3] original"));
}

/// S6 — Chain = [A, B]. A returns `continueAsync{immediate, callback}`; B
/// returns `respond{final}`. The host must receive `immediate` first; once B
/// runs in the background continuation, `callback` must be invoked with
/// `final` (metadata-annotated, since it never reaches a transport directly).
#[tokio::test]
async fn s6_continue_async_replies_before_the_background_continuation_runs() {
    type FinalSlot = Arc<StdMutex<Option<oneshot::Sender<Result<serde_json::Value, HookChainError>>>>>;

    struct ContinueAsyncHook {
        slot: FinalSlot,
    }

    #[async_trait]
    impl HookContract for ContinueAsyncHook {
        fn name(&self) -> &str {
            "continue-async"
        }

        async fn on_tools_call_request(&self, envelope: Envelope) -> RequestHookResult {
            let slot = Arc::clone(&self.slot);
            RequestHookResult::ContinueAsync {
                request: envelope,
                immediate: json!({"accepted": true}),
                callback: Box::new(move |result| {
                    if let Some(tx) = slot.lock().unwrap().take() {
                        let _ = tx.send(result);
                    }
                }),
            }
        }
    }

    struct RespondFinal;

    #[async_trait]
    impl HookContract for RespondFinal {
        fn name(&self) -> &str {
            "respond-final"
        }

        async fn on_tools_call_request(&self, _envelope: Envelope) -> RequestHookResult {
            RequestHookResult::Respond(json!({"final": true}))
        }
    }

    let (final_tx, final_rx) = oneshot::channel();
    let slot: FinalSlot = Arc::new(StdMutex::new(Some(final_tx)));

    let context = PassthroughContext::new(vec![
        Arc::new(ContinueAsyncHook { slot: Arc::clone(&slot) }),
        Arc::new(RespondFinal),
    ])
    .await
    .expect("context");
    let (host, mut host_rx, host_handler) = RecordingTransport::new(None);
    context.connect(host, None).await.expect("connect");

    deliver(
        &host_handler,
        JsonRpcMessage::new_request("tools/call", Some(json!({"name": "whatever"})), json!(1)),
    )
    .await;

    let immediate = host_rx.recv().await.expect("immediate reply");
    assert_eq!(immediate.result.as_ref().unwrap()["accepted"], json!(true));

    let outcome = final_rx.await.expect("callback invoked exactly once");
    let value = outcome.expect("B's respond must surface as a success, not an error");
    assert_eq!(value["final"], json!(true));
    assert_eq!(value["_meta"]["source"], json!("passthrough-server"));
}
