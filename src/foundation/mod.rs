//! Shared primitives: geometry types, errors, configuration and small numeric helpers.

/// Canvas, press ids and re-exported geometry types.
pub mod core;
/// Error taxonomy.
pub mod error;
/// Process-level configuration.
pub mod config;
pub(crate) mod math;
