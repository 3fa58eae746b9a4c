//! Render scheduling.

/// Coalescing single-slot render gate.
pub mod scheduler;
/// Fixed-interval background task.
pub mod ticker;
