//! Normalized error carrier for the hook chain and passthrough context.
//!
//! Hooks, pipelines, and transports each fail in their own idiom (a
//! [`crate::transport::error::TransportError`], a [`crate::correlation::error::CorrelationError`],
//! or an arbitrary `anyhow`-style error from hook code). `HookChainError`
//! is the single shape the error-recovery pipeline operates on; every
//! other error type normalizes into it at the boundary where it crosses
//! into chain/pipeline territory.

use serde_json::Value;
use thiserror::Error;

use crate::transport::error::TransportError;

/// How a normalized error should be rendered back to its caller.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ResponseType {
    /// Render as a JSON-RPC error object (`{code, message, data}`).
    JsonRpc,
    /// Render as a bare HTTP-style status/body pair, for transports that
    /// are not JSON-RPC framed end to end.
    Http,
}

/// No upstream transport is attached to serve a request that needs one.
/// Spec.md §6 reuses this same code for a hook aborting on the request path
/// when the hook itself supplied no explicit code, so it is also the default
/// for [`HookChainError::request_rejected`].
pub const NO_TRANSPORT_CODE: i32 = -32001;
/// Default code for a hook aborting on the response/error path (a response
/// or error handler's `Abort`), per spec.md §6's "response rejected by hook".
pub const HOOK_ABORT_CODE: i32 = -32002;
/// Catch-all for normalized, otherwise-unclassified errors.
pub const INTERNAL_ERROR_CODE: i32 = -32603;

/// A normalized hook chain error: a numeric code, a message, optional
/// structured data, and the response shape it should be rendered as.
#[derive(Debug, Clone, Error)]
#[error("hook chain error {code}: {message}")]
pub struct HookChainError {
    pub code: i32,
    pub message: String,
    pub data: Option<Value>,
    pub response_type: ResponseType,
}

impl HookChainError {
    pub fn new(code: i32, message: impl Into<String>) -> Self {
        Self {
            code,
            message: message.into(),
            data: None,
            response_type: ResponseType::JsonRpc,
        }
    }

    pub fn with_data(mut self, data: Value) -> Self {
        self.data = Some(data);
        self
    }

    pub fn with_response_type(mut self, response_type: ResponseType) -> Self {
        self.response_type = response_type;
        self
    }

    /// No transport is attached on the side a request needed to reach.
    pub fn no_transport(direction: impl std::fmt::Display) -> Self {
        Self::new(
            NO_TRANSPORT_CODE,
            format!("no transport attached for {direction}"),
        )
    }

    /// A hook's response/error handler explicitly aborted processing
    /// (spec.md §6: "response rejected by hook", `-32002`).
    pub fn hook_abort(hook_name: &str, message: impl Into<String>) -> Self {
        Self::new(HOOK_ABORT_CODE, message.into()).with_data(Value::String(hook_name.to_string()))
    }

    /// A hook's request handler explicitly aborted processing (spec.md §6:
    /// "request rejected by hook", `-32001` — the same code reserved for "no
    /// upstream transport connected").
    pub fn request_rejected(hook_name: &str, message: impl Into<String>) -> Self {
        Self::new(NO_TRANSPORT_CODE, message.into()).with_data(Value::String(hook_name.to_string()))
    }

    /// Normalize any error into a `HookChainError`.
    ///
    /// A value that already carries a numeric code and message (as produced by
    /// `no_transport`/`hook_abort`, or as passed through unchanged) is returned
    /// unchanged. Anything else is wrapped as an internal error (-32603) with
    /// the original `Display` text as `message` and its `Debug` representation
    /// preserved in `data` for diagnostics.
    pub fn normalize<E: std::fmt::Display + std::fmt::Debug>(err: E) -> Self {
        Self::new(INTERNAL_ERROR_CODE, err.to_string())
            .with_data(Value::String(format!("{err:?}")))
    }
}

impl From<TransportError> for HookChainError {
    fn from(err: TransportError) -> Self {
        match err {
            TransportError::Closed => Self::new(NO_TRANSPORT_CODE, "transport is closed"),
            other => Self::normalize(other),
        }
    }
}
