//! # Visita Core
//!
//! Domain types for the Visita clinic booking engine: the slot entity and
//! its occupancy states, request/response models, the shared error
//! taxonomy, and the pure clinic-calendar rules (cancellation notice
//! window, working-day slot grid).
//!
//! This crate is free of I/O; the database and HTTP layers build on it.

/// Pure clinic-calendar rules: notice window, day bounds, slot grid
pub mod clinic;
/// Shared error taxonomy for all layers
pub mod errors;
/// Domain models and API request/response types
pub mod models;
