//! ComfyUI job dispatch library for the meshcam bridge.
//!
//! Provides the REST API wrapper for workflow submission and health
//! probing, workflow template patching, and the deferred dispatch
//! scheduler that decouples frame capture from job submission.

pub mod api;
pub mod dispatch;
pub mod workflow;
