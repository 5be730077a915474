//! Correlation Manager implementation
//!
//! This module provides the main CorrelationManager that handles bidirectional
//! JSON-RPC request/response correlation with timeout management and background cleanup.

use std::sync::{
    atomic::{AtomicBool, Ordering},
    Arc,
};

use chrono::TimeDelta;
use dashmap::DashMap;
use serde_json::Value;
use tokio::{
    sync::{oneshot, RwLock},
    task::JoinHandle,
    time::{interval, Duration},
};
use tracing::{debug, trace};

use crate::correlation::{
    error::{CorrelationError, CorrelationResult},
    types::{CorrelationKey, PendingRequest, RequestIdGenerator},
};
use crate::envelope::Direction;

/// Configuration for the correlation manager
///
/// Controls behavior like cleanup intervals, default timeouts, and capacity limits.
#[derive(Debug, Clone)]
pub struct CorrelationConfig {
    /// Default timeout for requests if not specified
    pub default_timeout: TimeDelta,

    /// How often to run cleanup of expired requests
    pub cleanup_interval: Duration,

    /// Maximum number of pending requests (0 = unlimited)
    pub max_pending_requests: usize,

    /// Whether to enable detailed tracing
    pub enable_tracing: bool,
}

impl Default for CorrelationConfig {
    fn default() -> Self {
        Self {
            default_timeout: TimeDelta::seconds(30),
            cleanup_interval: Duration::from_secs(5),
            max_pending_requests: 1000,
            enable_tracing: true,
        }
    }
}

/// Main correlation manager for JSON-RPC request/response correlation
///
/// Provides thread-safe management of pending requests with automatic timeout
/// handling and background cleanup. Requests are tracked by a
/// [`CorrelationKey`] (direction plus request id) rather than a bare request
/// id, since the host and the target each mint their own independent id
/// sequences and a raw id collision between the two is expected, not an
/// error.
///
/// # Examples
///
/// ```rust
/// use mcp_hookchain::correlation::manager::{CorrelationManager, CorrelationConfig};
/// use mcp_hookchain::envelope::Direction;
/// use chrono::TimeDelta;
/// use serde_json::json;
///
/// # async fn example() -> Result<(), Box<dyn std::error::Error>> {
/// let config = CorrelationConfig {
///     default_timeout: TimeDelta::seconds(60),
///     max_pending_requests: 500,
///     ..Default::default()
/// };
///
/// let manager = CorrelationManager::new(config).await?;
///
/// // Register an outbound request sent to the target
/// let (key, receiver) = manager.register_request(
///     Direction::Target,
///     Some(TimeDelta::seconds(30)),
///     json!({"method": "test", "params": {}})
/// ).await?;
///
/// // Later, correlate the response
/// manager.correlate_response(&key, Ok(json!({"result": "success"}))).await?;
///
/// manager.shutdown().await?;
/// # Ok(())
/// # }
/// ```
#[derive(Debug)]
pub struct CorrelationManager {
    /// Stores pending requests by their correlation key
    requests: Arc<DashMap<CorrelationKey, PendingRequest>>,

    /// Generates unique request IDs
    id_generator: Arc<RequestIdGenerator>,

    /// Configuration settings
    config: CorrelationConfig,

    /// Background cleanup task handle
    cleanup_task: Arc<RwLock<Option<JoinHandle<()>>>>,

    /// Shutdown signal for background tasks
    shutdown_signal: Arc<AtomicBool>,
}

impl CorrelationManager {
    /// Create a new correlation manager with the given configuration
    ///
    /// This starts the background cleanup task immediately.
    pub async fn new(config: CorrelationConfig) -> CorrelationResult<Self> {
        let requests = Arc::new(DashMap::new());
        let id_generator = Arc::new(RequestIdGenerator::new());
        let shutdown_signal = Arc::new(AtomicBool::new(false));

        let manager = Self {
            requests: Arc::clone(&requests),
            id_generator,
            config: config.clone(),
            cleanup_task: Arc::new(RwLock::new(None)),
            shutdown_signal: Arc::clone(&shutdown_signal),
        };

        let cleanup_handle = manager.start_cleanup_task().await;
        *manager.cleanup_task.write().await = Some(cleanup_handle);

        if config.enable_tracing {
            debug!("CorrelationManager initialized with config: {:?}", config);
        }

        Ok(manager)
    }

    /// Create a new correlation manager without starting the background cleanup task
    ///
    /// This is useful for testing and benchmarking where you want to control
    /// cleanup timing manually.
    #[doc(hidden)]
    pub async fn new_without_cleanup(config: CorrelationConfig) -> CorrelationResult<Self> {
        let requests = Arc::new(DashMap::new());
        let id_generator = Arc::new(RequestIdGenerator::new());
        let shutdown_signal = Arc::new(AtomicBool::new(false));

        let manager = Self {
            requests: Arc::clone(&requests),
            id_generator,
            config: config.clone(),
            cleanup_task: Arc::new(RwLock::new(None)),
            shutdown_signal: Arc::clone(&shutdown_signal),
        };

        if config.enable_tracing {
            debug!(
                "CorrelationManager initialized (no cleanup task) with config: {:?}",
                config
            );
        }

        Ok(manager)
    }

    /// Register a new outbound request for correlation.
    ///
    /// `direction` names the side the request was sent toward (the side whose
    /// reply this registration waits on). Creates a new request id, stores
    /// the request details, and returns both the composite correlation key
    /// and a receiver channel for getting the correlated response.
    ///
    /// # Errors
    ///
    /// Returns `CorrelationError::Internal` if the pending-request capacity
    /// configured via `max_pending_requests` has been reached.
    pub async fn register_request(
        &self,
        direction: Direction,
        timeout: Option<TimeDelta>,
        request_data: Value,
    ) -> CorrelationResult<(CorrelationKey, oneshot::Receiver<CorrelationResult<Value>>)> {
        if self.config.max_pending_requests > 0
            && self.requests.len() >= self.config.max_pending_requests
        {
            return Err(CorrelationError::Internal {
                message: "Maximum pending requests exceeded".to_string(),
            });
        }

        let (sender, receiver) = oneshot::channel();
        let request_id = self.id_generator.next_id();
        let key = CorrelationKey::new(direction, request_id);
        let timeout = timeout.unwrap_or(self.config.default_timeout);

        let pending_request = PendingRequest::new(sender, timeout, request_data.clone());

        if self.config.enable_tracing {
            debug!("Registering request {} with timeout {:?}", key, timeout);
            trace!("Request data: {}", request_data);
        }

        self.requests.insert(key.clone(), pending_request);

        Ok((key, receiver))
    }

    /// Correlate a response with a pending request.
    ///
    /// Finds the pending request by its correlation key and sends the
    /// response through its channel. The request is automatically removed
    /// from the pending set.
    ///
    /// # Errors
    ///
    /// * `CorrelationError::RequestNotFound` - No pending request with this key
    /// * `CorrelationError::ChannelClosed` - Response channel was closed
    pub async fn correlate_response(
        &self,
        key: &CorrelationKey,
        response: CorrelationResult<Value>,
    ) -> CorrelationResult<()> {
        let (_, pending_request) =
            self.requests
                .remove(key)
                .ok_or_else(|| CorrelationError::RequestNotFound { id: key.clone() })?;

        if self.config.enable_tracing {
            debug!("Correlating response for request {}", key);
            if let Ok(ref value) = response {
                trace!("Response data: {}", value);
            }
        }

        pending_request
            .sender
            .send(response)
            .map_err(|_| CorrelationError::ChannelClosed {
                id: key.clone(),
                details: "Response channel was closed".to_string(),
            })?;

        Ok(())
    }

    /// Get the current number of pending requests
    pub async fn pending_count(&self) -> usize {
        self.requests.len()
    }

    /// Cancel a pending request
    ///
    /// Removes the request and sends a cancellation error through its channel.
    pub async fn cancel_request(&self, key: &CorrelationKey) -> CorrelationResult<()> {
        let (_, pending_request) =
            self.requests
                .remove(key)
                .ok_or_else(|| CorrelationError::RequestNotFound { id: key.clone() })?;

        if self.config.enable_tracing {
            debug!("Cancelling request {}", key);
        }

        let _ = pending_request
            .sender
            .send(Err(CorrelationError::Cancelled { id: key.clone() }));

        Ok(())
    }

    /// Resolve every pending request waiting on `direction` with a
    /// transport-closed error. Called when the corresponding transport
    /// closes so outbound requests are not left hanging forever.
    ///
    /// Returns the number of requests that were resolved this way.
    pub async fn fail_pending_for_direction(&self, direction: Direction) -> usize {
        let affected: Vec<CorrelationKey> = self
            .requests
            .iter()
            .filter(|entry| entry.key().direction == direction)
            .map(|entry| entry.key().clone())
            .collect();

        let count = affected.len();
        for key in affected {
            if let Some((_, pending_request)) = self.requests.remove(&key) {
                let _ = pending_request
                    .sender
                    .send(Err(CorrelationError::TransportClosed { id: key }));
            }
        }
        count
    }

    /// Check if a request is currently pending
    pub async fn is_pending(&self, key: &CorrelationKey) -> bool {
        self.requests.contains_key(key)
    }

    /// Get all currently pending correlation keys
    pub async fn get_pending_request_ids(&self) -> Vec<CorrelationKey> {
        self.requests
            .iter()
            .map(|entry| entry.key().clone())
            .collect()
    }

    /// Manually trigger cleanup of expired requests
    ///
    /// This is called automatically by the background cleanup task, but can also
    /// be called manually for immediate cleanup.
    ///
    /// # Returns
    ///
    /// The number of requests that were cleaned up
    pub async fn cleanup_expired_requests(&self) -> usize {
        let now = chrono::Utc::now();

        let expired_keys: Vec<CorrelationKey> = self
            .requests
            .iter()
            .filter_map(|entry| {
                if entry.value().is_expired_at(&now) {
                    Some(entry.key().clone())
                } else {
                    None
                }
            })
            .collect();

        let cleaned_count = expired_keys.len();

        if cleaned_count > 0 {
            if self.config.enable_tracing {
                debug!("Cleaning up {} expired requests", cleaned_count);
            }

            for key in expired_keys {
                if let Some((_, pending_request)) = self.requests.remove(&key) {
                    let _ = pending_request.sender.send(Err(CorrelationError::Timeout {
                        id: key.clone(),
                        duration: pending_request.timeout,
                    }));

                    if self.config.enable_tracing {
                        trace!("Request {} timed out", key);
                    }
                }
            }
        }

        cleaned_count
    }

    /// Start the background cleanup task
    ///
    /// This task runs periodically to clean up expired requests automatically.
    async fn start_cleanup_task(&self) -> JoinHandle<()> {
        let requests = Arc::clone(&self.requests);
        let cleanup_interval = self.config.cleanup_interval;
        let shutdown_signal = Arc::clone(&self.shutdown_signal);
        let enable_tracing = self.config.enable_tracing;

        tokio::spawn(async move {
            let mut interval = interval(cleanup_interval);

            while !shutdown_signal.load(Ordering::Relaxed) {
                interval.tick().await;

                let now = chrono::Utc::now();

                let expired_requests: Vec<CorrelationKey> = requests
                    .iter()
                    .filter_map(|entry| {
                        if entry.value().is_expired_at(&now) {
                            Some(entry.key().clone())
                        } else {
                            None
                        }
                    })
                    .collect();

                let cleanup_count = expired_requests.len();

                if cleanup_count > 0 {
                    if enable_tracing {
                        debug!(
                            "Background cleanup: processing {} expired requests",
                            cleanup_count
                        );
                    }

                    for key in expired_requests {
                        if let Some((_, pending_request)) = requests.remove(&key) {
                            let _ = pending_request.sender.send(Err(CorrelationError::Timeout {
                                id: key.clone(),
                                duration: pending_request.timeout,
                            }));

                            if enable_tracing {
                                trace!("Background cleanup: request {} timed out", key);
                            }
                        }
                    }
                }
            }

            if enable_tracing {
                debug!("Background cleanup task shutting down");
            }
        })
    }

    /// Shutdown the correlation manager
    ///
    /// Stops the background cleanup task and cancels all pending requests.
    /// This should be called when the manager is no longer needed.
    pub async fn shutdown(self) -> CorrelationResult<()> {
        if self.config.enable_tracing {
            debug!("Shutting down CorrelationManager");
        }

        self.shutdown_signal.store(true, Ordering::Relaxed);

        if let Some(cleanup_handle) = self.cleanup_task.write().await.take() {
            cleanup_handle
                .await
                .map_err(|e| CorrelationError::Internal {
                    message: format!("Failed to join cleanup task: {e}"),
                })?;
        }

        let pending_keys: Vec<_> = self
            .requests
            .iter()
            .map(|entry| entry.key().clone())
            .collect();

        for key in pending_keys {
            if let Some((_, pending_request)) = self.requests.remove(&key) {
                let _ = pending_request
                    .sender
                    .send(Err(CorrelationError::Cancelled { id: key }));
            }
        }

        if self.config.enable_tracing {
            debug!("CorrelationManager shutdown complete");
        }

        Ok(())
    }
}
