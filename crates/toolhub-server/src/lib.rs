//! Toolhub server library - HTTP surface for the tool registry and interaction log.
//!
//! Routes, configuration, logging and application state live here, separate from
//! main.rs, so integration tests can drive the router directly.

pub mod config;
pub mod logging;
pub mod routes;
pub mod state;
