//! Generic repository contract and SQLite implementation.
//!
//! # Responsibility
//! - Offer one CRUD and query surface for every [`crate::Entity`].
//! - Compose registry, query builder, execution and row mapper per call.
//!
//! # Invariants
//! - Every statement is parameterized.
//! - Nothing is cached across calls except derived schemas.
//! - Errors reach the caller unchanged; nothing is retried.

pub mod entity_repo;
mod executor;
