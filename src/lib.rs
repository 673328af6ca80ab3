#![deny(missing_docs)]

//! Core library for the docsplit document partition service.

/// HTTP routing and REST handlers.
pub mod api;
/// Environment-driven configuration management.
pub mod config;
/// Structured logging and tracing setup.
pub mod logging;
/// Partition metrics helpers.
pub mod metrics;
/// Partitioner trait, element model, and backends.
pub mod partition;
/// Partition pipeline: decoding, chunking, and response mapping.
pub mod processing;
