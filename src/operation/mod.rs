//! Scene setup vs. production.

/// Operation mode derived from per-press scene assignments.
pub mod mode;
