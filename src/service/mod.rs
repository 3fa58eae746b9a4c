//! Service layer wiring the core to its collaborators.

/// Collaborator contracts and in-process implementations.
pub mod collab;
/// Shared per-press state and exposed operations.
pub mod registry;
