//! The three traversal algorithms that drive messages through a
//! [`HookChain`](crate::hook::HookChain): requests travel forward and may
//! short-circuit, respond-now, or continue asynchronously; responses travel
//! in reverse along a success or failure path with recovery; notifications
//! travel forward with no reply to produce.

pub mod direction;
pub mod notification;
pub mod request;
pub mod response;

pub use direction::PipelineDirection;
pub use notification::{run_notification_pipeline, run_notification_pipeline_reverse, NotificationOutcome};
pub use request::{
    run_request_pipeline, run_request_pipeline_from, run_request_pipeline_reverse, RequestOutcome,
};
pub use response::{
    run_response_pipeline, run_response_pipeline_forward, run_response_pipeline_from,
    ResponseOutcome,
};
