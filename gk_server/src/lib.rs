//! HTTP boundary for the gatekeeper session core.
//!
//! Routes, the bearer-token gate middleware, error-to-response translation,
//! configuration, logging and metrics.

pub mod api;
pub mod config;
pub mod logging;
pub mod metrics;
