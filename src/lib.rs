//! A bidirectional MCP (Model Context Protocol) hook chain passthrough proxy.
//!
//! This crate sits between a downstream MCP client (the "host" side) and an
//! upstream MCP server (the "target" side), running every JSON-RPC message
//! that crosses it through an ordered chain of hooks before relaying it on.
//!
//! # Architecture
//!
//! The crate is organized in layers:
//!
//! - **Base layer** (`base`): the JSON-RPC 2.0 request-id foundation.
//! - **Envelope** (`envelope`): the directional, method-family-classified
//!   wrapper every message is carried in while it traverses the chain.
//! - **Hook layer** (`hook`): the [`HookChain`](hook::HookChain) arena and
//!   the [`HookContract`](hook::HookContract) trait hooks implement.
//! - **Pipeline layer** (`pipeline`): the three traversal algorithms —
//!   request (forward, short-circuitable), response (reverse, with
//!   recovery), notification (forward, one-way) — that drive a message
//!   through the chain.
//! - **Correlation layer** (`correlation`): matches outbound requests this
//!   proxy originates to their eventual replies.
//! - **Transport layer** (`transport`): the event-driven `Transport`/
//!   `MessageHandler` abstraction a concrete wire protocol implements.
//! - **Passthrough layer** (`passthrough`): [`PassthroughContext`], the
//!   entry point that wires all of the above into a running proxy.
//!
//! # Quick Start
//!
//! ```rust,no_run
//! use mcp_hookchain::passthrough::{PassthroughConfig, PassthroughContext};
//! use mcp_hookchain::hook::HookContract;
//! use std::sync::Arc;
//!
//! # type HostTransport = Box<dyn mcp_hookchain::transport::Transport<Error = mcp_hookchain::transport::TransportError> + Send>;
//! # async fn run(host: HostTransport, hooks: Vec<Arc<dyn HookContract>>) -> Result<(), mcp_hookchain::HookChainError> {
//! let context = PassthroughContext::with_config(hooks, PassthroughConfig::default()).await?;
//! context.connect(host, None).await?;
//! # Ok(())
//! # }
//! ```

pub mod base;
pub mod correlation;
pub mod envelope;
pub mod error;
pub mod hook;
pub mod passthrough;
pub mod pipeline;
pub mod transport;

pub use envelope::{Direction, Envelope, MethodFamily, RequestExtra};
pub use error::{HookChainError, ResponseType};
pub use hook::{ContinuationCallback, HookChain, HookContract, NodeId};
pub use passthrough::{PassthroughConfig, PassthroughContext};

/// The crate's own version, as set in `Cargo.toml`.
pub const VERSION: &str = env!("CARGO_PKG_VERSION");

/// Get the crate version as a string.
pub fn version() -> &'static str {
    VERSION
}
