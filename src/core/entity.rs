//! Entity, ability and stack item ids

use crate::{EngineError, Result};
use rustc_hash::FxHashMap;
use serde::{Deserialize, Serialize};
use std::fmt;

/// Integer id shared by players, cards and the battlefield
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
pub struct EntityId(u32);

impl EntityId {
    pub fn new(id: u32) -> Self {
        EntityId(id)
    }

    pub fn as_u32(&self) -> u32 {
        self.0
    }
}

impl fmt::Display for EntityId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.0)
    }
}

pub type PlayerId = EntityId;
pub type CardId = EntityId;

/// Identity of a registered ability
///
/// Zero is reserved as the nil value; a constructed ability never carries it.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
pub struct AbilityId(u32);

impl AbilityId {
    pub const NIL: AbilityId = AbilityId(0);

    pub fn new(id: u32) -> Self {
        AbilityId(id)
    }

    pub fn as_u32(&self) -> u32 {
        self.0
    }

    pub fn is_nil(&self) -> bool {
        self.0 == 0
    }
}

impl fmt::Display for AbilityId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "ability#{}", self.0)
    }
}

/// Hands out non-nil ability IDs in increasing order
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct AbilityIdGenerator {
    next: u32,
}

impl AbilityIdGenerator {
    pub fn new() -> Self {
        AbilityIdGenerator { next: 1 }
    }

    pub fn next_id(&mut self) -> AbilityId {
        let id = AbilityId(self.next);
        self.next += 1;
        id
    }
}

impl Default for AbilityIdGenerator {
    fn default() -> Self {
        Self::new()
    }
}

/// Identity of an item on the stack
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
pub struct StackItemId(u32);

impl StackItemId {
    pub fn new(id: u32) -> Self {
        StackItemId(id)
    }

    pub fn as_u32(&self) -> u32 {
        self.0
    }
}

impl fmt::Display for StackItemId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "stack#{}", self.0)
    }
}

/// Cards (or anything else) keyed by entity id
///
/// Ids are assigned by the caller; the store never invents one.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct EntityStore<T> {
    entities: FxHashMap<EntityId, T>,
}

impl<T> EntityStore<T> {
    pub fn new() -> Self {
        EntityStore {
            entities: FxHashMap::default(),
        }
    }

    /// Insert or replace the entity stored under `id`
    pub fn insert(&mut self, id: EntityId, entity: T) {
        self.entities.insert(id, entity);
    }

    pub fn get(&self, id: EntityId) -> Result<&T> {
        self.entities
            .get(&id)
            .ok_or(EngineError::EntityNotFound(id.as_u32()))
    }

    pub fn get_mut(&mut self, id: EntityId) -> Result<&mut T> {
        self.entities
            .get_mut(&id)
            .ok_or(EngineError::EntityNotFound(id.as_u32()))
    }

    pub fn contains(&self, id: EntityId) -> bool {
        self.entities.contains_key(&id)
    }

    pub fn len(&self) -> usize {
        self.entities.len()
    }

    pub fn is_empty(&self) -> bool {
        self.entities.is_empty()
    }
}

impl<T> Default for EntityStore<T> {
    fn default() -> Self {
        Self::new()
    }
}
