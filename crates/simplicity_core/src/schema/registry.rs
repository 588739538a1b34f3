//! Process-wide entity schema cache.
//!
//! # Responsibility
//! - Derive each entity type's schema at most once and hand out shared
//!   read-only copies afterwards.
//!
//! # Invariants
//! - One slot per `TypeId`; a slot is never removed or replaced.
//! - Derivation for a type runs inside that type's `OnceCell`, outside the
//!   map lock, so concurrent first use of the same type derives once and
//!   other types are not blocked by it.
//! - Cached lookups only take the shared read lock.
//! - A failed derivation leaves the slot empty.

use super::{EntitySchema, SchemaResult};
use crate::model::entity::Entity;
use log::debug;
use once_cell::sync::OnceCell;
use std::any::TypeId;
use std::collections::HashMap;
use std::sync::{Arc, PoisonError, RwLock};
use std::time::Instant;

type Slot = Arc<OnceCell<Arc<EntitySchema>>>;

/// Owned cache of derived schemas, shared by repositories through `Arc`.
///
/// Starts empty and lives as long as its owner; there is no teardown.
#[derive(Debug, Default)]
pub struct SchemaRegistry {
    slots: RwLock<HashMap<TypeId, Slot>>,
}

impl SchemaRegistry {
    pub fn new() -> Self {
        Self::default()
    }

    /// Returns the schema for `E`, deriving it on first use.
    ///
    /// # Errors
    /// Returns [`super::SchemaError`] when `E` cannot be persisted. The error
    /// is not cached; a later call derives again and fails the same way.
    pub fn schema_for<E: Entity>(&self) -> SchemaResult<Arc<EntitySchema>> {
        let slot = self.slot(TypeId::of::<E>());
        let schema = slot.get_or_try_init(derive_schema::<E>)?;
        Ok(Arc::clone(schema))
    }

    /// Returns the cached schema for `E` without deriving it.
    pub fn cached<E: Entity>(&self) -> Option<Arc<EntitySchema>> {
        let slots = self.slots.read().unwrap_or_else(PoisonError::into_inner);
        slots
            .get(&TypeId::of::<E>())
            .and_then(|slot| slot.get().cloned())
    }

    /// All derived schemas, sorted by table name.
    pub fn cached_schemas(&self) -> Vec<Arc<EntitySchema>> {
        let slots = self.slots.read().unwrap_or_else(PoisonError::into_inner);
        let mut schemas: Vec<_> = slots.values().filter_map(|slot| slot.get().cloned()).collect();
        schemas.sort_by(|left, right| left.table_name().cmp(right.table_name()));
        schemas
    }

    /// Number of successfully derived schemas.
    pub fn len(&self) -> usize {
        let slots = self.slots.read().unwrap_or_else(PoisonError::into_inner);
        slots.values().filter(|slot| slot.get().is_some()).count()
    }

    pub fn is_empty(&self) -> bool {
        self.len() == 0
    }

    fn slot(&self, type_id: TypeId) -> Slot {
        {
            // Slots are insert-only, so a poisoned map is still consistent.
            let slots = self.slots.read().unwrap_or_else(PoisonError::into_inner);
            if let Some(slot) = slots.get(&type_id) {
                return Arc::clone(slot);
            }
        }
        let mut slots = self.slots.write().unwrap_or_else(PoisonError::into_inner);
        Arc::clone(slots.entry(type_id).or_default())
    }
}

fn derive_schema<E: Entity>() -> SchemaResult<Arc<EntitySchema>> {
    let started_at = Instant::now();
    let schema = EntitySchema::derive(&E::definition())?;
    debug!(
        "event=schema_derive module=schema status=ok entity={} table={} columns={} duration_ms={}",
        schema.entity_name(),
        schema.table_name(),
        schema.columns().len(),
        started_at.elapsed().as_millis()
    );
    Ok(Arc::new(schema))
}
