//! Execution engine
//!
//! Decides whether an ability may be activated, validates chosen targets,
//! pays costs and applies effects through [`GameCallbacks`]. Mana abilities
//! resolve on the spot; everything else is handed back for the stack.

use crate::core::{
    Ability, AbilityId, CardId, CardType, Color, Cost, Effect, EffectType, Player, PlayerId,
    Target, TargetRef, TriggerCondition,
};
use crate::game::interfaces::{GameCallbacks, GameView};
use crate::game::logger::VerbosityLevel;
use crate::game::registry::AbilityRegistry;
use crate::game::stack::StackObject;
use crate::game::targeting::{TargetCandidate, TargetValidator};
use crate::parser::costs::symbols_in;
use crate::{DenialReason, EngineError, Result};

/// Choices made by the controller when activating or casting
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct ActivationChoices {
    /// Value chosen for X
    pub x_value: Option<u32>,

    /// Color chosen for "any color" and "{R} or {G}" mana
    pub color: Option<Color>,
}

impl ActivationChoices {
    pub fn with_x(x_value: u32) -> Self {
        ActivationChoices {
            x_value: Some(x_value),
            color: None,
        }
    }

    pub fn with_color(color: Color) -> Self {
        ActivationChoices {
            x_value: None,
            color: Some(color),
        }
    }
}

/// What an activation turned into
#[derive(Debug, Clone)]
pub enum Activation {
    /// A mana ability; its effects have already been applied
    ManaResolved,

    /// Costs are paid; the object waits to be put on the stack
    Pending(StackObject),
}

/// Everything an effect needs besides the game itself
#[derive(Debug, Clone, Copy)]
pub struct EffectContext<'a> {
    pub controller: PlayerId,
    pub source: CardId,
    pub targets: &'a [TargetRef],
    pub x_value: Option<u32>,
    pub color: Option<Color>,
    pub oracle_text: &'a str,
}

impl<'a> EffectContext<'a> {
    fn first_target(&self) -> Option<TargetRef> {
        self.targets.first().copied()
    }

    fn player_or_controller(&self) -> PlayerId {
        match self.first_target() {
            Some(TargetRef::Player(player)) => player,
            _ => self.controller,
        }
    }

    fn permanent_or_source(&self) -> CardId {
        match self.first_target() {
            Some(TargetRef::Permanent(card)) => card,
            _ => self.source,
        }
    }

    fn with_targets(self, targets: &'a [TargetRef]) -> Self {
        EffectContext { targets, ..self }
    }
}

/// A dies or leaves-the-battlefield ability whose source is gone
///
/// The turn driver chooses targets and puts it on the stack with
/// [`crate::game::PriorityStack::push_triggered`].
#[derive(Debug, Clone, PartialEq)]
pub struct PendingTrigger {
    pub ability: Ability,
    /// Controller of the source when it left the battlefield
    pub controller: PlayerId,
}

#[derive(Debug, Default)]
pub struct ExecutionEngine {
    registry: AbilityRegistry,
    validator: TargetValidator,
    pending_triggers: Vec<PendingTrigger>,
}

impl ExecutionEngine {
    pub fn new(registry: AbilityRegistry, validator: TargetValidator) -> Self {
        ExecutionEngine {
            registry,
            validator,
            pending_triggers: Vec::new(),
        }
    }

    /// Triggers waiting to go on the stack, oldest first
    pub fn pending_triggers(&self) -> &[PendingTrigger] {
        &self.pending_triggers
    }

    /// Hand the waiting triggers to the turn driver
    pub fn take_pending_triggers(&mut self) -> Vec<PendingTrigger> {
        std::mem::take(&mut self.pending_triggers)
    }

    pub fn registry(&self) -> &AbilityRegistry {
        &self.registry
    }

    pub fn registry_mut(&mut self) -> &mut AbilityRegistry {
        &mut self.registry
    }

    pub fn validator(&self) -> &TargetValidator {
        &self.validator
    }

    pub fn register(&mut self, ability: Ability) -> Result<AbilityId> {
        self.registry.register(ability)
    }

    /// Why `controller` may not activate `ability` right now, if anything
    pub fn check_activation<G: GameView + ?Sized>(
        &self,
        ability: &Ability,
        controller: PlayerId,
        game: &G,
    ) -> Result<()> {
        if !ability.ability_type.is_activatable() {
            return Err(DenialReason::NotActivatable(ability.ability_type).into());
        }

        let source = game.card(ability.source);
        if source.is_some_and(|card| card.controller != controller) {
            return Err(DenialReason::NotController.into());
        }

        let timing = &ability.timing;
        if timing.sorcery_speed && !game.is_main_phase() {
            return Err(DenialReason::SorcerySpeed.into());
        }
        if timing.combat_only && !game.is_combat_phase() {
            return Err(DenialReason::CombatOnly.into());
        }
        if timing.your_turn_only && game.active_player() != controller {
            return Err(DenialReason::NotYourTurn.into());
        }

        if let Some(limit) = ability.usage_exhausted() {
            return Err(DenialReason::UsageExhausted(limit).into());
        }

        if ability.cost.tap {
            let card = source.ok_or(EngineError::EntityNotFound(ability.source.as_u32()))?;
            if card.tapped {
                return Err(DenialReason::SourceTapped.into());
            }
        }

        // X is chosen later; zero is the cheapest it can be
        if !self.can_pay(&ability.cost.without_x(), ability.source, controller, game) {
            return Err(DenialReason::CannotPayCost.into());
        }

        if ability.requires_targets() {
            let player = lookup_player(game, controller)?;
            let candidates = TargetCandidate::all(game);
            let colors = source_colors(game, ability.source);
            let stranded = ability.targets().filter(|t| t.required).any(|target| {
                !self
                    .validator
                    .has_legal_target(target, player, &candidates, &colors)
            });
            if stranded {
                return Err(DenialReason::NoLegalTargets.into());
            }
        }

        Ok(())
    }

    pub fn can_activate<G: GameView + ?Sized>(
        &self,
        ability: &Ability,
        controller: PlayerId,
        game: &G,
    ) -> bool {
        self.check_activation(ability, controller, game).is_ok()
    }

    /// Activate and resolve an ability immediately, without the stack
    pub fn execute(
        &mut self,
        ability_id: AbilityId,
        controller: PlayerId,
        targets: &[TargetRef],
        choices: ActivationChoices,
        game: &mut dyn GameCallbacks,
    ) -> Result<()> {
        let ability = self.prepare(ability_id, controller, targets, choices, game)?;
        self.resolve_ability(&ability, controller, targets, choices, game)
    }

    /// Activate an ability; non-mana abilities come back for the stack
    pub fn activate(
        &mut self,
        ability_id: AbilityId,
        controller: PlayerId,
        targets: &[TargetRef],
        choices: ActivationChoices,
        game: &mut dyn GameCallbacks,
    ) -> Result<Activation> {
        let ability = self.prepare(ability_id, controller, targets, choices, game)?;
        if ability.is_mana_ability() {
            self.resolve_ability(&ability, controller, targets, choices, game)?;
            return Ok(Activation::ManaResolved);
        }
        Ok(Activation::Pending(StackObject::Ability(ability)))
    }

    /// Check, validate targets, pay, and count the use
    fn prepare(
        &mut self,
        ability_id: AbilityId,
        controller: PlayerId,
        targets: &[TargetRef],
        choices: ActivationChoices,
        game: &mut dyn GameCallbacks,
    ) -> Result<Ability> {
        let mut ability = self.registry.get(ability_id)?.clone();
        let checked = self
            .check_activation(&ability, controller, &*game)
            .and_then(|()| fix_x(&ability.cost, choices.x_value));
        let cost = match checked {
            Ok(cost) => cost,
            Err(err) => {
                game.logger().event(
                    VerbosityLevel::Normal,
                    "engine",
                    &format!("denied {ability_id}: {err}"),
                );
                return Err(err);
            }
        };

        let colors = source_colors(&*game, ability.source);
        self.validate_targets(ability.targets(), targets, controller, &colors, &*game)?;

        self.pay_cost(&cost, ability.source, controller, game)?;

        // A sacrificed source is already gone from the registry
        ability.record_use();
        if let Ok(recorded) = self.registry.get_mut(ability_id) {
            recorded.record_use();
        }

        log_if_verbose!(game.logger(), "activated {} ({})", ability.name, ability_id);
        Ok(ability)
    }

    fn resolve_ability(
        &mut self,
        ability: &Ability,
        controller: PlayerId,
        targets: &[TargetRef],
        choices: ActivationChoices,
        game: &mut dyn GameCallbacks,
    ) -> Result<()> {
        let ctx = EffectContext {
            controller,
            source: ability.source,
            targets,
            x_value: choices.x_value,
            color: choices.color,
            oracle_text: &ability.oracle_text,
        };
        self.apply_effects(&ability.effects, ctx, game)
    }

    /// Check chosen targets against target requirements, slot by slot
    pub fn validate_targets<'t, G: GameView + ?Sized>(
        &self,
        requirements: impl Iterator<Item = &'t Target>,
        targets: &[TargetRef],
        controller: PlayerId,
        source_colors: &[Color],
        game: &G,
    ) -> Result<()> {
        let slots: Vec<&Target> = requirements
            .flat_map(|t| std::iter::repeat_n(t, t.count as usize))
            .collect();
        let required = slots.iter().filter(|t| t.required).count();
        if targets.len() < required {
            return Err(EngineError::InsufficientTargets {
                required,
                supplied: targets.len(),
            });
        }
        if targets.len() > slots.len() {
            return Err(EngineError::InvalidTarget {
                index: slots.len(),
                reason: format!("only {} target(s) can be chosen", slots.len()),
            });
        }

        let player = lookup_player(game, controller)?;
        for (index, (target, slot)) in targets.iter().zip(slots).enumerate() {
            let Some(candidate) = TargetCandidate::resolve(*target, game) else {
                return Err(EngineError::InvalidTarget {
                    index,
                    reason: format!("{target} does not exist"),
                });
            };
            let verdict = self
                .validator
                .validate_from_source(&candidate, slot, player, source_colors);
            if !verdict.legal {
                return Err(EngineError::InvalidTarget {
                    index,
                    reason: verdict.reason,
                });
            }
        }
        Ok(())
    }

    /// Whether every chosen target has become illegal
    pub fn all_targets_illegal<'t, G: GameView + ?Sized>(
        &self,
        requirements: impl Iterator<Item = &'t Target>,
        targets: &[TargetRef],
        controller: PlayerId,
        source_colors: &[Color],
        game: &G,
    ) -> bool {
        if targets.is_empty() {
            return false;
        }
        let Some(player) = game.player(controller) else {
            return true;
        };
        let slots = requirements.flat_map(|t| std::iter::repeat_n(t, t.count as usize));
        targets.iter().zip(slots).all(|(target, slot)| {
            TargetCandidate::resolve(*target, game).is_none_or(|candidate| {
                !self
                    .validator
                    .validate_from_source(&candidate, slot, player, source_colors)
                    .legal
            })
        })
    }

    /// Every part of the cost can be paid: mana, life, discards and the sacrifice
    fn can_pay<G: GameView + ?Sized>(
        &self,
        cost: &Cost,
        source: CardId,
        controller: PlayerId,
        game: &G,
    ) -> bool {
        game.can_pay_cost(controller, cost)
            && game.hand_size(controller) >= cost.discard as usize
            && (!cost.sacrifice || game.is_on_battlefield(source))
    }

    /// Pay a cost with X already substituted
    ///
    /// Payability is checked up front; the source is untapped again if the
    /// mana or life payment still fails.
    fn pay_cost(
        &mut self,
        cost: &Cost,
        source: CardId,
        controller: PlayerId,
        game: &mut dyn GameCallbacks,
    ) -> Result<()> {
        if !self.can_pay(cost, source, controller, &*game) {
            return Err(DenialReason::CannotPayCost.into());
        }
        if cost.tap {
            game.tap(source)?;
        }
        if let Err(err) = game.pay_cost(controller, cost) {
            if cost.tap {
                game.untap(source)?;
            }
            return Err(err);
        }
        if cost.discard > 0 {
            game.discard_cards(controller, cost.discard as usize)?;
        }
        if cost.sacrifice {
            game.sacrifice_permanent(source)?;
            self.on_leaves_battlefield(source, controller, &*game);
        }
        Ok(())
    }

    /// Apply effects in order, handing each the targets chosen for its slots
    ///
    /// Stops at the first effect that fails.
    pub fn apply_effects(
        &mut self,
        effects: &[Effect],
        ctx: EffectContext<'_>,
        game: &mut dyn GameCallbacks,
    ) -> Result<()> {
        let mut offset = 0;
        for effect in effects {
            let slots: usize = effect.targets.iter().map(|t| t.count as usize).sum();
            let start = offset.min(ctx.targets.len());
            let end = (offset + slots).min(ctx.targets.len());
            offset += slots;
            self.apply_effect(effect, ctx.with_targets(&ctx.targets[start..end]), game)?;
        }
        Ok(())
    }

    pub fn apply_effect(
        &mut self,
        effect: &Effect,
        ctx: EffectContext<'_>,
        game: &mut dyn GameCallbacks,
    ) -> Result<()> {
        let amount = effect.amount(ctx.x_value);
        match effect.effect_type {
            EffectType::DrawCards => {
                game.draw_cards(ctx.player_or_controller(), amount.max(0) as usize)?;
            }
            EffectType::DealDamage => {
                let target = ctx.first_target().ok_or(EngineError::InsufficientTargets {
                    required: 1,
                    supplied: 0,
                })?;
                game.deal_damage(target, amount, ctx.source)?;
            }
            EffectType::GainLife => {
                game.gain_life(ctx.controller, amount)?;
            }
            EffectType::LoseLife => {
                game.lose_life(ctx.player_or_controller(), amount)?;
            }
            EffectType::AddMana => {
                for (color, n) in produced_mana(ctx.oracle_text, amount, ctx.color) {
                    game.add_mana_to_pool(ctx.controller, color, n)?;
                }
            }
            EffectType::Pump => {
                let (power, toughness) = effect.pump_values();
                game.apply_pump(ctx.permanent_or_source(), power, toughness, effect.duration)?;
            }
            EffectType::Tap => {
                game.tap(ctx.permanent_or_source())?;
            }
            EffectType::Untap => {
                game.untap(ctx.permanent_or_source())?;
            }
            EffectType::Destroy => {
                let Some(TargetRef::Permanent(card)) = ctx.first_target() else {
                    return Err(EngineError::InsufficientTargets {
                        required: 1,
                        supplied: 0,
                    });
                };
                let controller = game.card(card).map(|c| c.controller);
                if game.destroy_permanent(card)? {
                    if let Some(controller) = controller {
                        self.on_leaves_battlefield(card, controller, &*game);
                    }
                }
            }
            EffectType::CounterSpell => match ctx.first_target() {
                Some(TargetRef::Spell(item)) => game.counter_spell(item)?,
                Some(other) => {
                    return Err(EngineError::InvalidTarget {
                        index: 0,
                        reason: format!("{other} is not a spell"),
                    })
                }
                None => {
                    return Err(EngineError::InsufficientTargets {
                        required: 1,
                        supplied: 0,
                    })
                }
            },
            EffectType::Mill => {
                game.mill(ctx.player_or_controller(), amount.max(0) as usize)?;
            }
            EffectType::Exile
            | EffectType::ReturnToHand
            | EffectType::CreateToken
            | EffectType::GrantKeyword
            | EffectType::EntersTapped
            | EffectType::Modal => {
                return Err(EngineError::UnimplementedEffect(effect.effect_type));
            }
        }
        log_if_verbose!(game.logger(), "applied {}", effect.description);
        Ok(())
    }

    /// Forget the abilities of a permanent that went to the graveyard
    ///
    /// Its leaves-the-battlefield abilities, and its dies abilities when it
    /// was a creature, are queued as pending triggers for `controller`. The
    /// other removed abilities are returned.
    pub fn on_leaves_battlefield<G: GameView + ?Sized>(
        &mut self,
        card: CardId,
        controller: PlayerId,
        game: &G,
    ) -> Vec<Ability> {
        let removed = self.registry.unregister_source(card);
        if !removed.is_empty() {
            log_if_verbose!(
                game.logger(),
                "unregistered {} ability(s) of {}",
                removed.len(),
                card
            );
        }

        let died = game
            .card(card)
            .is_some_and(|c| c.is_type(CardType::Creature));
        let (triggered, rest): (Vec<Ability>, Vec<Ability>) =
            removed.into_iter().partition(|ability| match ability.trigger {
                Some(TriggerCondition::LeavesTheBattlefield) => true,
                Some(TriggerCondition::Dies) => died,
                _ => false,
            });
        for ability in triggered {
            game.logger().event(
                VerbosityLevel::Normal,
                "engine",
                &format!("{} triggered ({})", ability.name, ability.id),
            );
            self.pending_triggers.push(PendingTrigger {
                ability,
                controller,
            });
        }
        rest
    }
}

/// The cost with the chosen X folded in; an X too large to pay is denied
fn fix_x(cost: &Cost, x_value: Option<u32>) -> Result<Cost> {
    cost.with_x(x_value.unwrap_or(0))
        .ok_or_else(|| DenialReason::CannotPayCost.into())
}

fn lookup_player<G: GameView + ?Sized>(game: &G, id: PlayerId) -> Result<&Player> {
    game.player(id)
        .ok_or(EngineError::EntityNotFound(id.as_u32()))
}

pub(crate) fn source_colors<G: GameView + ?Sized>(game: &G, source: CardId) -> Vec<Color> {
    game.card(source)
        .map(|card| card.colors.to_vec())
        .unwrap_or_default()
}

/// Mana produced by an "add" effect, read from the symbols after the cost
///
/// "Any color" and "{R} or {G}" use the chosen color, falling back to the
/// first option when the choice is missing or not offered.
fn produced_mana(oracle_text: &str, amount: i32, choice: Option<Color>) -> Vec<(Color, u8)> {
    let amount = u8::try_from(amount.max(0)).unwrap_or(u8::MAX);
    let effect_text = oracle_text
        .rsplit_once(':')
        .map(|(_, rest)| rest)
        .unwrap_or(oracle_text);
    let lower = effect_text.to_ascii_lowercase();

    if lower.contains("any color") || lower.contains("any one color") {
        return vec![(choice.unwrap_or(Color::WUBRG[0]), amount)];
    }

    let symbols = symbols_in(effect_text);
    let options: Vec<Color> = symbols
        .iter()
        .filter_map(|s| single_char(s).and_then(Color::from_symbol))
        .collect();

    if lower.contains(" or ") && !options.is_empty() {
        let color = choice
            .filter(|c| options.contains(c))
            .unwrap_or(options[0]);
        return vec![(color, amount.max(1))];
    }

    let mut produced: Vec<(Color, u8)> = Vec::new();
    for symbol in &symbols {
        let (color, n) = match single_char(symbol).and_then(Color::from_symbol) {
            Some(color) => (color, 1),
            None => match symbol.parse::<u8>() {
                Ok(n) => (Color::Colorless, n),
                Err(_) => continue,
            },
        };
        match produced.iter_mut().find(|(c, _)| *c == color) {
            Some((_, total)) => *total = total.saturating_add(n),
            None => produced.push((color, n)),
        }
    }
    if produced.is_empty() {
        produced.push((Color::Colorless, amount));
    }
    produced
}

fn single_char(symbol: &str) -> Option<char> {
    let mut chars = symbol.chars();
    let first = chars.next()?;
    chars.next().is_none().then_some(first)
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_produced_mana_fixed() {
        assert_eq!(produced_mana("{T}: Add {G}", 1, None), vec![(Color::Green, 1)]);
        assert_eq!(
            produced_mana("{T}: Add {G}{G}", 2, None),
            vec![(Color::Green, 2)]
        );
        assert_eq!(
            produced_mana("{T}: Add {C}{R}", 2, Some(Color::Blue)),
            vec![(Color::Colorless, 1), (Color::Red, 1)]
        );
    }

    #[test]
    fn test_produced_mana_choices() {
        assert_eq!(
            produced_mana("{T}: Add {R} or {G}", 1, Some(Color::Green)),
            vec![(Color::Green, 1)]
        );
        // A color that is not offered falls back to the first option
        assert_eq!(
            produced_mana("{T}: Add {R} or {G}", 1, Some(Color::Blue)),
            vec![(Color::Red, 1)]
        );
        assert_eq!(
            produced_mana("{T}: Add one mana of any color", 1, None),
            vec![(Color::White, 1)]
        );
        assert_eq!(
            produced_mana("{T}: Add one mana of any color", 1, Some(Color::Black)),
            vec![(Color::Black, 1)]
        );
    }

    #[test]
    fn test_choices_constructors() {
        assert_eq!(ActivationChoices::with_x(3).x_value, Some(3));
        assert_eq!(ActivationChoices::with_color(Color::Red).color, Some(Color::Red));
        assert_eq!(ActivationChoices::default(), ActivationChoices { x_value: None, color: None });
    }
}
