//! chatrelay - Minimal chat relay to a hosted LLM completion API
//!
//! This library provides the HTTP surface, configuration, and upstream client
//! for a single-turn chat relay: a message comes in, a reply goes out with a
//! timestamp.

pub mod cli;
pub mod config;
pub mod error;
pub mod handlers;
pub mod metrics;
pub mod middleware;
pub mod provider;
pub mod telemetry;
pub mod timestamp;
