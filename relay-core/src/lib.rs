//! Relay Core
//!
//! Core types shared by the Relay orchestrator, its client library and the CLI.
//!
//! This crate contains:
//! - Domain types: Jobs, result messages and program artifacts
//! - DTOs: Request/response bodies exchanged over the orchestrator HTTP API

pub mod domain;
pub mod dto;
pub mod encoding;
