//! Capability surfaces the engine needs from its environment
//!
//! The engine holds no battlefield state of its own. Queries go through
//! [`GameView`] and mutations through [`GameCallbacks`];
//! [`crate::game::GameState`] is the reference implementation of both.

use crate::core::{
    Card, CardId, CardType, Color, Cost, Duration, Player, PlayerId, Spell, StackItemId, TargetRef,
};
use crate::game::logger::EngineLogger;
use crate::{EngineError, ProtocolViolation, Result};

/// Read-only queries
pub trait GameView {
    /// Players in table order
    fn players(&self) -> Vec<PlayerId>;

    fn active_player(&self) -> PlayerId;

    fn is_main_phase(&self) -> bool;

    fn is_combat_phase(&self) -> bool;

    fn player(&self, id: PlayerId) -> Option<&Player>;

    fn card(&self, id: CardId) -> Option<&Card>;

    /// Permanents on the battlefield
    fn battlefield(&self) -> Vec<CardId>;

    fn is_on_battlefield(&self, card: CardId) -> bool {
        self.battlefield().contains(&card)
    }

    fn hand_size(&self, player: PlayerId) -> usize;

    fn creatures(&self, player: PlayerId) -> Vec<CardId> {
        self.permanents_of_type(player, CardType::Creature)
    }

    fn lands(&self, player: PlayerId) -> Vec<CardId> {
        self.permanents_of_type(player, CardType::Land)
    }

    fn permanents_of_type(&self, player: PlayerId, card_type: CardType) -> Vec<CardId> {
        self.battlefield()
            .into_iter()
            .filter(|id| {
                self.card(*id)
                    .is_some_and(|c| c.controller == player && c.is_type(card_type))
            })
            .collect()
    }

    /// A spell waiting on the stack and its controller
    fn spell(&self, _item: StackItemId) -> Option<(&Spell, PlayerId)> {
        None
    }

    /// Spells currently on the stack, bottom first
    fn stack_spells(&self) -> Vec<StackItemId> {
        Vec::new()
    }

    fn can_pay_cost(&self, player: PlayerId, cost: &Cost) -> bool;

    fn logger(&self) -> &EngineLogger;
}

/// State changes requested by effects and cost payment
pub trait GameCallbacks: GameView {
    /// Deduct mana and life; nothing changes on failure
    fn pay_cost(&mut self, player: PlayerId, cost: &Cost) -> Result<()>;

    fn discard_cards(&mut self, player: PlayerId, count: usize) -> Result<()>;

    fn sacrifice_permanent(&mut self, card: CardId) -> Result<()>;

    fn tap(&mut self, card: CardId) -> Result<()>;

    fn untap(&mut self, card: CardId) -> Result<()>;

    fn add_mana_to_pool(&mut self, player: PlayerId, color: Color, amount: u8) -> Result<()>;

    fn deal_damage(&mut self, target: TargetRef, amount: i32, source: CardId) -> Result<()>;

    fn draw_cards(&mut self, player: PlayerId, count: usize) -> Result<()>;

    fn gain_life(&mut self, player: PlayerId, amount: i32) -> Result<()>;

    fn lose_life(&mut self, player: PlayerId, amount: i32) -> Result<()>;

    /// Temporary power/toughness change lasting for `duration`
    fn apply_pump(
        &mut self,
        card: CardId,
        power: i32,
        toughness: i32,
        duration: Duration,
    ) -> Result<()>;

    /// Returns whether the permanent actually left the battlefield
    fn destroy_permanent(&mut self, card: CardId) -> Result<bool>;

    fn mill(&mut self, player: PlayerId, count: usize) -> Result<()>;

    /// Flag a spell on the stack as countered
    fn counter_spell(&mut self, item: StackItemId) -> Result<()> {
        Err(EngineError::ProtocolViolation(ProtocolViolation::ItemNotFound(item)))
    }
}
