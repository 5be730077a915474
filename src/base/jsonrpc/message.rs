//! JSON-RPC 2.0 request identifier
//!
//! The rest of the crate carries requests, responses, and notifications as
//! [`crate::envelope::Envelope`] / [`crate::transport::message::JsonRpcMessage`]
//! rather than as standalone JSON-RPC structs; `RequestId` is the one piece of
//! the wire format that's load-bearing on its own, since it's what the
//! correlation layer keys on.

use std::fmt;

use serde::{Deserialize, Serialize};

/// Request ID supporting both string and numeric formats per JSON-RPC 2.0 specification
///
/// The JSON-RPC 2.0 specification allows request IDs to be strings, numbers, or null.
/// This enum supports string and numeric variants. Null IDs are represented by Option<RequestId>.
///
/// # Examples
///
/// ```rust
/// use mcp_hookchain::base::jsonrpc::RequestId;
///
/// let string_id = RequestId::String("req-123".to_string());
/// let numeric_id = RequestId::Number(42);
///
/// // Serialization preserves the original format
/// assert_eq!(serde_json::to_string(&string_id).unwrap(), r#""req-123""#);
/// assert_eq!(serde_json::to_string(&numeric_id).unwrap(), "42");
/// ```
#[derive(Debug, Clone, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(untagged)]
pub enum RequestId {
    /// String-based request identifier
    String(String),
    /// Numeric request identifier
    Number(i64),
}

impl RequestId {
    /// Create a new string-based request ID
    ///
    /// # Examples
    ///
    /// ```rust
    /// use mcp_hookchain::base::jsonrpc::RequestId;
    ///
    /// let id = RequestId::new_string("my-request-id");
    /// ```
    pub fn new_string(id: impl Into<String>) -> Self {
        RequestId::String(id.into())
    }

    /// Create a new numeric request ID
    ///
    /// # Examples
    ///
    /// ```rust
    /// use mcp_hookchain::base::jsonrpc::RequestId;
    ///
    /// let id = RequestId::new_number(123);
    /// ```
    pub fn new_number(id: i64) -> Self {
        RequestId::Number(id)
    }
}

impl fmt::Display for RequestId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            RequestId::String(s) => write!(f, "{}", s),
            RequestId::Number(n) => write!(f, "{}", n),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_request_id_serialization() {
        let string_id = RequestId::String("test-123".to_string());
        let numeric_id = RequestId::Number(42);

        assert_eq!(serde_json::to_string(&string_id).unwrap(), r#""test-123""#);
        assert_eq!(serde_json::to_string(&numeric_id).unwrap(), "42");
    }

    #[test]
    fn test_request_id_display() {
        assert_eq!(RequestId::new_string("abc").to_string(), "abc");
        assert_eq!(RequestId::new_number(7).to_string(), "7");
    }

    #[test]
    fn test_request_id_round_trip() {
        let id = RequestId::new_string("req-789");
        let json = serde_json::to_string(&id).unwrap();
        let parsed: RequestId = serde_json::from_str(&json).unwrap();
        assert_eq!(id, parsed);
    }
}
