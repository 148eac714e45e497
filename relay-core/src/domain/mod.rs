//! Core domain types
//!
//! This module contains the core domain structures used across Relay services.
//! The orchestrator persists them, execution units and polling callers exchange
//! them through the HTTP API.

pub mod job;
pub mod message;
pub mod program;
