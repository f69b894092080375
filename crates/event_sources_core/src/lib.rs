//! Shared event-source demo primitives.
//!
//! This crate owns the HTTP contract, record id rules, stream image
//! decoding, and metric documents. AWS SDK clients and the Lambda runtime
//! live in `event_sources_lambda`.

pub mod contract;
pub mod metrics;
pub mod records;
