//! AWS-oriented adapters and handlers for the event-source demo functions.
//!
//! Handlers are plain functions over raw event JSON and the sink traits in
//! [`adapters`]. The binaries under `src/bin` own the AWS SDK clients, the
//! Lambda runtime loop, and per-invocation telemetry.

pub mod adapters;
pub mod config;
pub mod handlers;
pub mod telemetry;
