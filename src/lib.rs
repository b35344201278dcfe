#![forbid(unsafe_code)]

//! Human-in-the-loop event planning coordinator.
//!
//! Concurrent venue, transport, and policy lookups feed a deterministic
//! emissions auditor whose proposal suspends at an approval gate until
//! an external actor resolves it over the HTTP API.

pub mod api;
pub mod config;
pub mod coordinator;
pub mod errors;
pub mod gate;
pub mod models;
pub mod proposer;
pub mod sources;
pub mod store;
pub mod workflow;

pub use config::GlobalConfig;
pub use errors::{AppError, Result};
