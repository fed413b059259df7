//! Multi-step use cases spanning both record kinds.
//!
//! # Responsibility
//! - Cascade author deletion (`integrity_service`).
//! - Export and restore whole-dataset snapshots (`snapshot_service`).
//!
//! # Invariants
//! - Services never bypass repository normalization on user-facing writes.

pub mod integrity_service;
pub mod snapshot_service;
