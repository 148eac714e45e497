//! Data Transfer Objects for the orchestrator HTTP API
//!
//! Request and response bodies shared by the orchestrator handlers and the
//! client library, so both sides agree on the wire format.

pub mod job;
pub mod message;
pub mod program;
