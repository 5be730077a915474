//! Message envelope and directional addressing for the passthrough context.
//!
//! A [`PassthroughContext`](crate::passthrough::PassthroughContext) sits between a
//! host (downstream MCP client) and a target (upstream MCP server). Every message
//! that crosses the context is wrapped in an [`Envelope`] that records which side
//! it came from, which method family it belongs to, and the hook-visible metadata
//! attached to it.

use std::collections::HashMap;
use std::fmt;

use chrono::{DateTime, Utc};
use serde_json::Value;

use crate::base::jsonrpc::RequestId;

/// Which side of the passthrough a message originated from.
///
/// `Server` names the host-facing side (the downstream MCP client talking to this
/// proxy as if it were the real server). `Target` names the client-facing side
/// (this proxy talking to the real upstream MCP server).
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum Direction {
    /// Traffic flowing between this context and the downstream host.
    Server,
    /// Traffic flowing between this context and the upstream target.
    Target,
}

impl Direction {
    /// The direction a reply to a message from `self` travels in.
    pub fn reverse(self) -> Direction {
        match self {
            Direction::Server => Direction::Target,
            Direction::Target => Direction::Server,
        }
    }
}

impl fmt::Display for Direction {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Direction::Server => write!(f, "server"),
            Direction::Target => write!(f, "target"),
        }
    }
}

/// The MCP method families the hook chain dispatches on.
///
/// Kept as an explicit, closed enumeration rather than a bare method-name string:
/// a hook author selects a method family at compile time instead of probing a
/// method name string at runtime.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum MethodFamily {
    Initialize,
    ToolsList,
    ToolsCall,
    PromptsList,
    ResourcesList,
    ResourcesTemplatesList,
    ResourcesRead,
    /// Any method not named above. Hooks that want exhaustive coverage without
    /// adding a new family per MCP method use this bucket.
    Other,
}

impl MethodFamily {
    /// Classify a raw JSON-RPC method name into its family.
    pub fn classify(method: &str) -> Self {
        match method {
            "initialize" => MethodFamily::Initialize,
            "tools/list" => MethodFamily::ToolsList,
            "tools/call" => MethodFamily::ToolsCall,
            "prompts/list" => MethodFamily::PromptsList,
            "resources/list" => MethodFamily::ResourcesList,
            "resources/templates/list" => MethodFamily::ResourcesTemplatesList,
            "resources/read" => MethodFamily::ResourcesRead,
            _ => MethodFamily::Other,
        }
    }
}

/// Extra, hook-visible fields threaded alongside a request envelope.
///
/// Distinct from the JSON-RPC `params` payload: `RequestExtra` carries
/// passthrough-context bookkeeping (session id, arrival time, source direction)
/// that hooks may read but that is never serialized onto the wire as part of the
/// JSON-RPC message body itself — it rides in the envelope's `_meta` instead.
#[derive(Debug, Clone)]
pub struct RequestExtra {
    pub session_id: Option<String>,
    pub received_at: DateTime<Utc>,
    pub source: Direction,
}

impl RequestExtra {
    pub fn new(session_id: Option<String>, source: Direction) -> Self {
        Self {
            session_id,
            received_at: Utc::now(),
            source,
        }
    }
}

/// A JSON-RPC message in flight through the passthrough context, tagged with
/// the metadata the hook chain and pipelines need to route and annotate it.
///
/// `Envelope` wraps the raw method/params/result/error/id fields (kept as loose
/// `serde_json::Value`s, since the hook chain never needs to parse MCP's typed
/// payload shapes — only the JSON-RPC envelope fields and the method name) plus
/// the bookkeeping fields every hook sees identically regardless of which
/// concrete MCP method is in play.
#[derive(Debug, Clone)]
pub struct Envelope {
    pub id: Option<RequestId>,
    pub method: Option<String>,
    pub params: Option<Value>,
    pub result: Option<Value>,
    pub error: Option<Value>,
    pub direction: Direction,
    pub family: MethodFamily,
    pub extra: RequestExtra,
    meta: HashMap<String, Value>,
}

impl Envelope {
    /// Build an envelope for an inbound request.
    pub fn request(
        id: RequestId,
        method: impl Into<String>,
        params: Option<Value>,
        direction: Direction,
        extra: RequestExtra,
    ) -> Self {
        let method = method.into();
        let family = MethodFamily::classify(&method);
        let meta = extract_meta(&params);
        Self {
            id: Some(id),
            method: Some(method),
            params,
            result: None,
            error: None,
            direction,
            family,
            extra,
            meta,
        }
    }

    /// Build an envelope for a response correlated to `method`'s original call.
    pub fn response(
        id: RequestId,
        method: impl Into<String>,
        result: Option<Value>,
        error: Option<Value>,
        direction: Direction,
        extra: RequestExtra,
    ) -> Self {
        let method = method.into();
        let family = MethodFamily::classify(&method);
        let meta = extract_meta(&result);
        Self {
            id: Some(id),
            method: Some(method),
            params: None,
            result,
            error,
            direction,
            family,
            extra,
            meta,
        }
    }

    /// Build an envelope for a one-way notification.
    pub fn notification(
        method: impl Into<String>,
        params: Option<Value>,
        direction: Direction,
        extra: RequestExtra,
    ) -> Self {
        let method = method.into();
        let family = MethodFamily::classify(&method);
        let meta = extract_meta(&params);
        Self {
            id: None,
            method: Some(method),
            params,
            result: None,
            error: None,
            direction,
            family,
            extra,
            meta,
        }
    }

    /// Read a `_meta` field previously annotated by a hook or the context.
    pub fn meta(&self, key: &str) -> Option<&Value> {
        self.meta.get(key)
    }

    /// Annotate `_meta` additively. An existing key is left untouched unless
    /// `overwrite` is set — the passthrough context's own annotations
    /// (`session_id`, `timestamp`, `source`) never clobber a value a hook
    /// already placed there.
    pub fn annotate_meta(&mut self, key: impl Into<String>, value: Value, overwrite: bool) {
        let key = key.into();
        if overwrite || !self.meta.contains_key(&key) {
            self.meta.insert(key, value);
        }
    }

    pub fn meta_snapshot(&self) -> &HashMap<String, Value> {
        &self.meta
    }

    pub fn is_request(&self) -> bool {
        self.id.is_some() && self.method.is_some() && self.result.is_none() && self.error.is_none()
    }

    pub fn is_response(&self) -> bool {
        self.id.is_some() && (self.result.is_some() || self.error.is_some())
    }

    pub fn is_notification(&self) -> bool {
        self.id.is_none() && self.method.is_some()
    }

    /// `params` with `_meta` merged in, for serializing onto the outbound
    /// request or notification. Existing non-`_meta` params are preserved;
    /// `_meta` is replaced wholesale with this envelope's current meta map,
    /// which was itself built additively (see [`Envelope::annotate_meta`]).
    pub fn params_with_meta(&self) -> Option<Value> {
        merge_meta(self.params.clone(), &self.meta)
    }

    /// `result` with `_meta` merged in, for serializing onto an outbound
    /// successful response. Error responses carry no `_meta` (spec.md §6).
    pub fn result_with_meta(&self) -> Option<Value> {
        merge_meta(self.result.clone(), &self.meta)
    }
}

/// Pull a pre-existing `_meta` object out of a request/notification `params`
/// or a response `result`, so hooks see metadata a previous hop already set.
fn extract_meta(value: &Option<Value>) -> HashMap<String, Value> {
    match value {
        Some(Value::Object(map)) => match map.get("_meta") {
            Some(Value::Object(meta)) => meta.iter().map(|(k, v)| (k.clone(), v.clone())).collect(),
            _ => HashMap::new(),
        },
        _ => HashMap::new(),
    }
}

/// Merge `meta` into `value` as its `_meta` key. `value` is coerced to an
/// object if absent; a non-object `value` (an array or scalar params/result,
/// which MCP payloads never use) is left untouched and the metadata is
/// dropped rather than corrupting the payload shape.
fn merge_meta(value: Option<Value>, meta: &HashMap<String, Value>) -> Option<Value> {
    if meta.is_empty() {
        return value;
    }
    let meta_obj = Value::Object(meta.iter().map(|(k, v)| (k.clone(), v.clone())).collect());
    match value {
        None => {
            let mut map = serde_json::Map::new();
            map.insert("_meta".to_string(), meta_obj);
            Some(Value::Object(map))
        }
        Some(Value::Object(mut map)) => {
            map.insert("_meta".to_string(), meta_obj);
            Some(Value::Object(map))
        }
        other => other,
    }
}
