//! Transport Abstraction Layer
//!
//! This module provides transport abstractions for JSON-RPC communication.
//! The transport layer sits between the correlation manager and the actual
//! communication protocols (STDIO, HTTP, WebSocket, etc.).
//!
//! # Architecture
//!
//! The transport layer is built around an event-driven pair of traits:
//! [`Transport`] for the side that owns the connection and sends messages,
//! and [`MessageHandler`] for the side that reacts to what arrives on it.
//! This matches the official MCP specification's callback-driven pattern
//! rather than a blocking `send`/`receive` loop.
//!
//! ```rust
//! use mcp_hookchain::transport::{Transport, MessageHandler, JsonRpcMessage, MessageContext, TransportError};
//! use async_trait::async_trait;
//! use std::sync::Arc;
//!
//! struct EchoHandler;
//!
//! #[async_trait]
//! impl MessageHandler for EchoHandler {
//!     async fn handle_message(&self, _message: JsonRpcMessage, _context: MessageContext) {}
//!     async fn handle_error(&self, _error: TransportError) {}
//!     async fn handle_close(&self) {}
//! }
//! ```
//!
//! # Design Principles
//!
//! - **Event-driven**: incoming messages, errors, and closure arrive via
//!   `MessageHandler` callbacks, not a blocking `receive()`.
//! - **Session-aware**: `MessageContext` and `Transport::session_id` support
//!   multi-session transports (e.g. HTTP).
//! - **Lifecycle management**: explicit `start`/`close`, idempotent `close`.
//! - **Transport-agnostic**: a passthrough context holds two `Transport`
//!   trait objects (one per [`crate::envelope::Direction`]) without caring
//!   what concrete protocol backs either side.

pub mod contract;
pub mod context;
pub mod error;
pub mod message;

pub use contract::{MessageHandler, Transport};
pub use context::MessageContext;
pub use error::TransportError;
pub use message::{JsonRpcError, JsonRpcMessage};
