//! Registered abilities, keyed by id and by source permanent

use crate::core::{Ability, AbilityId, CardId, TriggerCondition};
use crate::{EngineError, Result};
use rustc_hash::FxHashMap;

#[derive(Debug, Clone, Default)]
pub struct AbilityRegistry {
    abilities: FxHashMap<AbilityId, Ability>,
    by_source: FxHashMap<CardId, Vec<AbilityId>>,
}

impl AbilityRegistry {
    pub fn new() -> Self {
        Self::default()
    }

    /// Register an ability; ids must be unique across the registry
    pub fn register(&mut self, ability: Ability) -> Result<AbilityId> {
        let id = ability.id;
        if id.is_nil() {
            return Err(EngineError::InvalidAbility(format!(
                "'{}' has no id",
                ability.name
            )));
        }
        if self.abilities.contains_key(&id) {
            return Err(EngineError::InvalidAbility(format!("{id} is already registered")));
        }
        self.by_source.entry(ability.source).or_default().push(id);
        self.abilities.insert(id, ability);
        Ok(id)
    }

    pub fn register_all(&mut self, abilities: impl IntoIterator<Item = Ability>) -> Result<Vec<AbilityId>> {
        abilities.into_iter().map(|a| self.register(a)).collect()
    }

    pub fn get(&self, id: AbilityId) -> Result<&Ability> {
        self.abilities.get(&id).ok_or(EngineError::AbilityNotFound(id))
    }

    pub fn get_mut(&mut self, id: AbilityId) -> Result<&mut Ability> {
        self.abilities
            .get_mut(&id)
            .ok_or(EngineError::AbilityNotFound(id))
    }

    pub fn contains(&self, id: AbilityId) -> bool {
        self.abilities.contains_key(&id)
    }

    /// Abilities of one source, in registration order
    pub fn for_source(&self, source: CardId) -> Vec<&Ability> {
        self.by_source
            .get(&source)
            .map(|ids| ids.iter().filter_map(|id| self.abilities.get(id)).collect())
            .unwrap_or_default()
    }

    /// Drop every ability of a source that left the battlefield
    pub fn unregister_source(&mut self, source: CardId) -> Vec<Ability> {
        let ids = self.by_source.remove(&source).unwrap_or_default();
        ids.into_iter()
            .filter_map(|id| self.abilities.remove(&id))
            .collect()
    }

    /// Triggered abilities waiting on `condition`, ordered by id
    ///
    /// With `source` set, only that permanent's abilities are returned.
    pub fn triggered_by(&self, condition: TriggerCondition, source: Option<CardId>) -> Vec<&Ability> {
        let mut found: Vec<&Ability> = self
            .abilities
            .values()
            .filter(|a| a.trigger == Some(condition))
            .filter(|a| source.is_none_or(|s| a.source == s))
            .collect();
        found.sort_by_key(|a| a.id);
        found
    }

    pub fn reset_turn_usage(&mut self) {
        for ability in self.abilities.values_mut() {
            ability.reset_turn_usage();
        }
    }

    pub fn len(&self) -> usize {
        self.abilities.len()
    }

    pub fn is_empty(&self) -> bool {
        self.abilities.is_empty()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::core::{AbilityType, Cost, Effect, EntityId};

    fn ability(id: u32, source: u32) -> Ability {
        Ability::new(
            AbilityId::new(id),
            "draw",
            AbilityType::Triggered,
            EntityId::new(source),
            Cost::new(),
            vec![Effect::draw_cards(1)],
        )
        .unwrap()
        .with_trigger(TriggerCondition::EntersTheBattlefield)
    }

    #[test]
    fn test_duplicate_ids_rejected() {
        let mut registry = AbilityRegistry::new();
        registry.register(ability(1, 10)).unwrap();
        let err = registry.register(ability(1, 11)).unwrap_err();
        assert!(matches!(err, EngineError::InvalidAbility(_)));
        assert_eq!(registry.len(), 1);
    }

    #[test]
    fn test_unregister_source() {
        let mut registry = AbilityRegistry::new();
        registry.register(ability(1, 10)).unwrap();
        registry.register(ability(2, 10)).unwrap();
        registry.register(ability(3, 11)).unwrap();

        let removed = registry.unregister_source(EntityId::new(10));
        assert_eq!(removed.len(), 2);
        assert!(registry.for_source(EntityId::new(10)).is_empty());
        assert!(registry.get(AbilityId::new(1)).is_err());
        assert_eq!(registry.len(), 1);
    }

    #[test]
    fn test_triggered_by_is_ordered() {
        let mut registry = AbilityRegistry::new();
        registry.register(ability(5, 10)).unwrap();
        registry.register(ability(2, 11)).unwrap();

        let ids: Vec<_> = registry
            .triggered_by(TriggerCondition::EntersTheBattlefield, None)
            .iter()
            .map(|a| a.id)
            .collect();
        assert_eq!(ids, vec![AbilityId::new(2), AbilityId::new(5)]);

        let only = registry.triggered_by(TriggerCondition::EntersTheBattlefield, Some(EntityId::new(10)));
        assert_eq!(only.len(), 1);
        assert!(registry.triggered_by(TriggerCondition::Dies, None).is_empty());
    }
}
