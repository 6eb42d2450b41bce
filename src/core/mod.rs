//! Core orchestration logic.
//!
//! This module contains:
//! - Orchestrator: sequences extraction, generation, audio and history
//! - MessageRouter: the `{action, ...}` request/response protocol

pub mod messages;
pub mod orchestrator;

// Re-export commonly used types
pub use messages::{MessageRouter, Request, Response};
pub use orchestrator::{Orchestrator, Stage, StatusListener, TransformOutcome, TransformRequest};
