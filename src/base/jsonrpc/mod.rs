//! JSON-RPC 2.0 Foundation Implementation
//!
//! This module provides the one piece of the JSON-RPC 2.0 wire format every
//! other module needs on its own: the request identifier. Requests,
//! responses, and notifications themselves travel through the chain as
//! [`crate::envelope::Envelope`] and are framed on the wire as
//! [`crate::transport::message::JsonRpcMessage`].
//!
//! # Examples
//!
//! ```rust
//! use mcp_hookchain::base::jsonrpc::RequestId;
//!
//! let id = RequestId::new_string("req-123");
//! assert_eq!(id.to_string(), "req-123");
//! ```

pub mod message;

// Re-export public API for convenient access
pub use message::*;