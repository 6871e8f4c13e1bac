//! Stack and priority
//!
//! Spells and non-mana abilities wait on a LIFO stack. Only the priority
//! holder may act. When every player passes in a row the top item resolves,
//! or, with an empty stack, control returns to the turn driver.

use crate::core::{
    Ability, AbilityId, Card, CardId, Color, Cost, Duration, Effect, Player, PlayerId, Spell,
    StackItemId, Target, TargetRef,
};
use crate::game::executor::{
    source_colors, Activation, ActivationChoices, EffectContext, ExecutionEngine,
};
use crate::game::interfaces::{GameCallbacks, GameView};
use crate::game::logger::{EngineLogger, VerbosityLevel};
use crate::{DenialReason, EngineError, ProtocolViolation, Result};
use rustc_hash::FxHashSet;

/// What a stack item holds
#[derive(Debug, Clone)]
pub enum StackObject {
    Spell(Spell),
    Ability(Ability),
}

impl StackObject {
    pub fn name(&self) -> &str {
        match self {
            StackObject::Spell(spell) => &spell.name,
            StackObject::Ability(ability) => &ability.name,
        }
    }

    pub fn effects(&self) -> &[Effect] {
        match self {
            StackObject::Spell(spell) => &spell.effects,
            StackObject::Ability(ability) => &ability.effects,
        }
    }

    pub fn source(&self) -> CardId {
        match self {
            StackObject::Spell(spell) => spell.source,
            StackObject::Ability(ability) => ability.source,
        }
    }

    pub fn oracle_text(&self) -> &str {
        match self {
            StackObject::Spell(spell) => &spell.oracle_text,
            StackObject::Ability(ability) => &ability.oracle_text,
        }
    }

    pub fn targets(&self) -> impl Iterator<Item = &Target> {
        self.effects().iter().flat_map(|e| e.targets.iter())
    }

    pub fn is_spell(&self) -> bool {
        matches!(self, StackObject::Spell(_))
    }

    pub fn as_spell(&self) -> Option<&Spell> {
        match self {
            StackObject::Spell(spell) => Some(spell),
            StackObject::Ability(_) => None,
        }
    }
}

#[derive(Debug, Clone)]
pub struct StackItem {
    pub id: StackItemId,
    pub object: StackObject,
    pub controller: PlayerId,
    pub targets: Vec<TargetRef>,
    pub x_value: Option<u32>,
    pub countered: bool,
    pub fizzled: bool,
}

/// Result of passing priority
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum PassOutcome {
    /// Priority moved on to the next player
    Passed { next: PlayerId },

    /// Everyone passed and the top item left the stack
    Resolved(ResolutionOutcome),

    /// Everyone passed on an empty stack; the turn driver takes over
    StackEmpty,
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub enum ResolutionOutcome {
    Resolved(StackItemId),
    Countered(StackItemId),
    /// Every chosen target became illegal
    Fizzled(StackItemId),
}

#[derive(Debug, Clone)]
pub struct PriorityStack {
    /// Top of the stack is the end
    items: Vec<StackItem>,
    players: Vec<PlayerId>,
    active_player: PlayerId,
    priority_holder: PlayerId,
    passed: FxHashSet<PlayerId>,
    next_item_id: u32,
    logger: EngineLogger,
}

impl PriorityStack {
    /// Players in table order; the active player gets priority first
    pub fn new(players: Vec<PlayerId>, active_player: PlayerId) -> Result<Self> {
        if !players.contains(&active_player) {
            return Err(ProtocolViolation::UnknownPlayer(active_player).into());
        }
        Ok(PriorityStack {
            items: Vec::new(),
            players,
            active_player,
            priority_holder: active_player,
            passed: FxHashSet::default(),
            next_item_id: 1,
            logger: EngineLogger::new(),
        })
    }

    /// Seat the players of a game
    pub fn for_game<G: GameView + ?Sized>(game: &G) -> Result<Self> {
        Self::new(game.players(), game.active_player())
    }

    pub fn with_logger(mut self, logger: EngineLogger) -> Self {
        self.logger = logger;
        self
    }

    pub fn logger(&self) -> &EngineLogger {
        &self.logger
    }

    pub fn len(&self) -> usize {
        self.items.len()
    }

    pub fn is_empty(&self) -> bool {
        self.items.is_empty()
    }

    pub fn top(&self) -> Option<&StackItem> {
        self.items.last()
    }

    /// Items bottom first
    pub fn items(&self) -> &[StackItem] {
        &self.items
    }

    pub fn get(&self, id: StackItemId) -> Option<&StackItem> {
        self.items.iter().find(|item| item.id == id)
    }

    pub fn players(&self) -> &[PlayerId] {
        &self.players
    }

    pub fn active_player(&self) -> PlayerId {
        self.active_player
    }

    pub fn priority_holder(&self) -> PlayerId {
        self.priority_holder
    }

    pub fn has_passed(&self, player: PlayerId) -> bool {
        self.passed.contains(&player)
    }

    /// Turn driver hook: a new active player starts a fresh priority round
    pub fn set_active_player(&mut self, player: PlayerId) -> Result<()> {
        self.require_seated(player)?;
        self.active_player = player;
        self.reset_priority();
        Ok(())
    }

    /// Put an object on top of the stack
    ///
    /// Any passes so far are forgotten and the active player receives priority.
    pub fn push(
        &mut self,
        object: StackObject,
        controller: PlayerId,
        targets: Vec<TargetRef>,
        x_value: Option<u32>,
    ) -> StackItemId {
        let id = StackItemId::new(self.next_item_id);
        self.next_item_id += 1;
        self.logger.event(
            VerbosityLevel::Normal,
            "stack",
            &format!("{} put {} on the stack as {}", controller, object.name(), id),
        );
        self.items.push(StackItem {
            id,
            object,
            controller,
            targets,
            x_value,
            countered: false,
            fizzled: false,
        });
        self.reset_priority();
        id
    }

    /// Put a triggered ability on the stack; no priority is needed
    pub fn push_triggered(
        &mut self,
        ability: Ability,
        controller: PlayerId,
        targets: Vec<TargetRef>,
    ) -> StackItemId {
        self.push(StackObject::Ability(ability), controller, targets, None)
    }

    pub fn pass_priority(
        &mut self,
        player: PlayerId,
        engine: &mut ExecutionEngine,
        game: &mut dyn GameCallbacks,
    ) -> Result<PassOutcome> {
        self.require_priority(player)?;
        self.passed.insert(player);
        log_if_verbose!(self.logger, "{} passed priority", player);

        if self.players.iter().all(|p| self.passed.contains(p)) {
            if self.items.is_empty() {
                self.reset_priority();
                return Ok(PassOutcome::StackEmpty);
            }
            let outcome = self.resolve_top(engine, game)?;
            return Ok(PassOutcome::Resolved(outcome));
        }

        let next = self.next_player(player);
        self.priority_holder = next;
        Ok(PassOutcome::Passed { next })
    }

    /// Resolve the top item; priority returns to the active player afterwards
    pub fn resolve_top(
        &mut self,
        engine: &mut ExecutionEngine,
        game: &mut dyn GameCallbacks,
    ) -> Result<ResolutionOutcome> {
        let item = self.items.pop().ok_or(ProtocolViolation::EmptyStack)?;
        let result = self.resolve_item(item, engine, game);
        self.reset_priority();
        result
    }

    fn resolve_item(
        &mut self,
        mut item: StackItem,
        engine: &mut ExecutionEngine,
        game: &mut dyn GameCallbacks,
    ) -> Result<ResolutionOutcome> {
        if item.countered {
            self.logger.normal(&format!("{} was countered", item.object.name()));
            return Ok(ResolutionOutcome::Countered(item.id));
        }

        let mut ctx = StackContext {
            game,
            items: &mut self.items,
        };
        let colors = object_colors(&item.object, &ctx);
        if engine.all_targets_illegal(
            item.object.targets(),
            &item.targets,
            item.controller,
            &colors,
            &ctx,
        ) {
            item.fizzled = true;
            self.logger.normal(&format!(
                "{} fizzled: no legal targets remain",
                item.object.name()
            ));
            return Ok(ResolutionOutcome::Fizzled(item.id));
        }

        let effect_ctx = EffectContext {
            controller: item.controller,
            source: item.object.source(),
            targets: &item.targets,
            x_value: item.x_value,
            color: None,
            oracle_text: item.object.oracle_text(),
        };
        engine.apply_effects(item.object.effects(), effect_ctx, &mut ctx)?;
        self.logger.normal(&format!("{} resolved", item.object.name()));
        Ok(ResolutionOutcome::Resolved(item.id))
    }

    /// Mark a spell on the stack as countered; it is removed when it would resolve
    pub fn counter_spell(&mut self, item: StackItemId, by_player: PlayerId) -> Result<()> {
        self.require_seated(by_player)?;
        flag_countered(&mut self.items, item)?;
        log_if_verbose!(self.logger, "{} countered {}", by_player, item);
        Ok(())
    }

    /// Instants need priority; sorcery-speed spells also need an empty stack in a main phase
    ///
    /// Whose turn it is does not matter: a player handed priority on an empty
    /// stack during the opponent's main phase may cast a sorcery.
    pub fn can_cast_spell<G: GameView + ?Sized>(&self, spell: &Spell, player: PlayerId, game: &G) -> bool {
        if self.priority_holder != player {
            return false;
        }
        !spell.is_sorcery_speed() || (self.items.is_empty() && game.is_main_phase())
    }

    pub fn can_activate_ability<G: GameView + ?Sized>(
        &self,
        ability: &Ability,
        player: PlayerId,
        engine: &ExecutionEngine,
        game: &G,
    ) -> bool {
        let view = StackView {
            game,
            items: &self.items,
        };
        if ability.is_mana_ability() {
            return engine.can_activate(ability, player, &view);
        }
        if self.priority_holder != player {
            return false;
        }
        if ability.timing.sorcery_speed && !self.items.is_empty() {
            return false;
        }
        engine.can_activate(ability, player, &view)
    }

    /// Cast a spell: check timing and targets, pay its mana cost, push it
    pub fn cast_spell(
        &mut self,
        spell: Spell,
        player: PlayerId,
        targets: Vec<TargetRef>,
        x_value: Option<u32>,
        engine: &ExecutionEngine,
        game: &mut dyn GameCallbacks,
    ) -> Result<StackItemId> {
        self.require_priority(player)?;
        if !self.can_cast_spell(&spell, player, &*game) {
            return Err(ProtocolViolation::SpellTiming.into());
        }

        {
            let view = StackView {
                game: &*game,
                items: &self.items,
            };
            engine.validate_targets(
                spell.targets(),
                &targets,
                player,
                &spell.mana_cost.colors(),
                &view,
            )?;
        }

        let Some(mana) = spell.mana_cost.with_x(x_value.unwrap_or(0)) else {
            return Err(DenialReason::CannotPayCost.into());
        };
        let cost = Cost::mana(mana);
        if !game.can_pay_cost(player, &cost) {
            return Err(EngineError::CostPayment(format!(
                "cannot pay {} for {}",
                cost, spell.name
            )));
        }
        game.pay_cost(player, &cost)?;
        Ok(self.push(StackObject::Spell(spell), player, targets, x_value))
    }

    /// Activate a registered ability
    ///
    /// Mana abilities resolve at once and leave the stack and priority alone;
    /// they return `None`. Other abilities need priority and go on the stack.
    pub fn activate_ability(
        &mut self,
        engine: &mut ExecutionEngine,
        ability_id: AbilityId,
        player: PlayerId,
        targets: Vec<TargetRef>,
        choices: ActivationChoices,
        game: &mut dyn GameCallbacks,
    ) -> Result<Option<StackItemId>> {
        self.require_seated(player)?;
        let (is_mana, sorcery_speed) = {
            let ability = engine.registry().get(ability_id)?;
            (ability.is_mana_ability(), ability.timing.sorcery_speed)
        };

        if is_mana {
            engine.activate(ability_id, player, &targets, choices, game)?;
            return Ok(None);
        }

        self.require_priority(player)?;
        if sorcery_speed && !self.items.is_empty() {
            return Err(DenialReason::SorcerySpeed.into());
        }

        let activation = {
            let mut ctx = StackContext {
                game,
                items: &mut self.items,
            };
            engine.activate(ability_id, player, &targets, choices, &mut ctx)?
        };
        match activation {
            Activation::Pending(object) => {
                Ok(Some(self.push(object, player, targets, choices.x_value)))
            }
            Activation::ManaResolved => Ok(None),
        }
    }

    fn require_seated(&self, player: PlayerId) -> Result<()> {
        if self.players.contains(&player) {
            Ok(())
        } else {
            Err(ProtocolViolation::UnknownPlayer(player).into())
        }
    }

    fn require_priority(&self, player: PlayerId) -> Result<()> {
        self.require_seated(player)?;
        if player != self.priority_holder {
            return Err(ProtocolViolation::OutOfTurn {
                player,
                holder: self.priority_holder,
            }
            .into());
        }
        Ok(())
    }

    fn next_player(&self, player: PlayerId) -> PlayerId {
        let index = self
            .players
            .iter()
            .position(|p| *p == player)
            .unwrap_or_default();
        self.players[(index + 1) % self.players.len()]
    }

    fn reset_priority(&mut self) {
        self.passed.clear();
        self.priority_holder = self.active_player;
    }
}

fn flag_countered(items: &mut [StackItem], id: StackItemId) -> Result<()> {
    let item = items
        .iter_mut()
        .find(|item| item.id == id)
        .ok_or(ProtocolViolation::ItemNotFound(id))?;
    if !item.object.is_spell() {
        return Err(ProtocolViolation::CounterNonSpell(id).into());
    }
    item.countered = true;
    Ok(())
}

fn object_colors<G: GameView + ?Sized>(object: &StackObject, game: &G) -> Vec<Color> {
    match object {
        StackObject::Spell(spell) => spell.mana_cost.colors(),
        StackObject::Ability(ability) => source_colors(game, ability.source),
    }
}

fn stack_spell(items: &[StackItem], id: StackItemId) -> Option<(&Spell, PlayerId)> {
    items
        .iter()
        .find(|item| item.id == id && !item.countered)
        .and_then(|item| item.object.as_spell().map(|spell| (spell, item.controller)))
}

fn stack_spell_ids(items: &[StackItem]) -> Vec<StackItemId> {
    items
        .iter()
        .filter(|item| item.object.is_spell() && !item.countered)
        .map(|item| item.id)
        .collect()
}

/// Read-only game view that also sees the spells on the stack
struct StackView<'a, G: ?Sized> {
    game: &'a G,
    items: &'a [StackItem],
}

macro_rules! delegate_view {
    () => {
        fn players(&self) -> Vec<PlayerId> {
            self.game.players()
        }

        fn active_player(&self) -> PlayerId {
            self.game.active_player()
        }

        fn is_main_phase(&self) -> bool {
            self.game.is_main_phase()
        }

        fn is_combat_phase(&self) -> bool {
            self.game.is_combat_phase()
        }

        fn player(&self, id: PlayerId) -> Option<&Player> {
            self.game.player(id)
        }

        fn card(&self, id: CardId) -> Option<&Card> {
            self.game.card(id)
        }

        fn battlefield(&self) -> Vec<CardId> {
            self.game.battlefield()
        }

        fn is_on_battlefield(&self, card: CardId) -> bool {
            self.game.is_on_battlefield(card)
        }

        fn hand_size(&self, player: PlayerId) -> usize {
            self.game.hand_size(player)
        }

        fn spell(&self, item: StackItemId) -> Option<(&Spell, PlayerId)> {
            stack_spell(&self.items[..], item)
        }

        fn stack_spells(&self) -> Vec<StackItemId> {
            stack_spell_ids(&self.items[..])
        }

        fn can_pay_cost(&self, player: PlayerId, cost: &Cost) -> bool {
            self.game.can_pay_cost(player, cost)
        }

        fn logger(&self) -> &EngineLogger {
            self.game.logger()
        }
    };
}

impl<G: GameView + ?Sized> GameView for StackView<'_, G> {
    delegate_view!();
}

/// Game wrapper used while the stack is borrowed: counters land on stack items
struct StackContext<'a> {
    game: &'a mut dyn GameCallbacks,
    items: &'a mut Vec<StackItem>,
}

impl GameView for StackContext<'_> {
    delegate_view!();
}

impl GameCallbacks for StackContext<'_> {
    fn pay_cost(&mut self, player: PlayerId, cost: &Cost) -> Result<()> {
        self.game.pay_cost(player, cost)
    }

    fn discard_cards(&mut self, player: PlayerId, count: usize) -> Result<()> {
        self.game.discard_cards(player, count)
    }

    fn sacrifice_permanent(&mut self, card: CardId) -> Result<()> {
        self.game.sacrifice_permanent(card)
    }

    fn tap(&mut self, card: CardId) -> Result<()> {
        self.game.tap(card)
    }

    fn untap(&mut self, card: CardId) -> Result<()> {
        self.game.untap(card)
    }

    fn add_mana_to_pool(&mut self, player: PlayerId, color: Color, amount: u8) -> Result<()> {
        self.game.add_mana_to_pool(player, color, amount)
    }

    fn deal_damage(&mut self, target: TargetRef, amount: i32, source: CardId) -> Result<()> {
        self.game.deal_damage(target, amount, source)
    }

    fn draw_cards(&mut self, player: PlayerId, count: usize) -> Result<()> {
        self.game.draw_cards(player, count)
    }

    fn gain_life(&mut self, player: PlayerId, amount: i32) -> Result<()> {
        self.game.gain_life(player, amount)
    }

    fn lose_life(&mut self, player: PlayerId, amount: i32) -> Result<()> {
        self.game.lose_life(player, amount)
    }

    fn apply_pump(
        &mut self,
        card: CardId,
        power: i32,
        toughness: i32,
        duration: Duration,
    ) -> Result<()> {
        self.game.apply_pump(card, power, toughness, duration)
    }

    fn destroy_permanent(&mut self, card: CardId) -> Result<bool> {
        self.game.destroy_permanent(card)
    }

    fn mill(&mut self, player: PlayerId, count: usize) -> Result<()> {
        self.game.mill(player, count)
    }

    fn counter_spell(&mut self, item: StackItemId) -> Result<()> {
        flag_countered(&mut self.items[..], item)
    }
}
