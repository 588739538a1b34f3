//! Entity-facing data model.
//!
//! # Responsibility
//! - Define the contract persistable types implement ([`entity::Entity`]).
//! - Define the typed value and record shapes the core moves around.
//!
//! # Invariants
//! - Every persisted value passes through [`value::Value`]; nothing is
//!   inlined into SQL text.

pub mod entity;
pub mod record;
pub mod value;
