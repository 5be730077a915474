//! Correlation Module
//!
//! This module provides request/response correlation for bidirectional JSON-RPC communication
//! in the Model Context Protocol implementation.
//!
//! ## Architecture
//!
//! - `manager.rs` - Core CorrelationManager implementation
//! - `types.rs` - Type definitions for correlation system
//! - `error.rs` - Error types and result definitions
//!
//! ## Quick Start
//!
//! ```rust
//! use mcp_hookchain::correlation::{CorrelationManager, CorrelationConfig};
//! use mcp_hookchain::envelope::Direction;
//!
//! # async fn example() -> Result<(), Box<dyn std::error::Error>> {
//! let manager = CorrelationManager::new(CorrelationConfig::default()).await?;
//!
//! // Register a request sent toward the target
//! let (key, receiver) = manager
//!     .register_request(Direction::Target, None, serde_json::json!({"method": "ping"}))
//!     .await?;
//!
//! // Correlate the eventual response (done by the passthrough context)
//! manager.correlate_response(&key, Ok(serde_json::json!({"result": "pong"}))).await?;
//!
//! let response = receiver.await??;
//! println!("Response: {response}");
//!
//! manager.shutdown().await?;
//! # Ok(())
//! # }
//! ```

pub mod error;
pub mod manager;
pub mod types;

// Re-export main types for convenience
pub use error::{CorrelationError, CorrelationResult, RequestId};
pub use manager::{CorrelationConfig, CorrelationManager};
pub use types::{CorrelationKey, PendingRequest, RequestIdGenerator};
