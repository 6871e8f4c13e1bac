//! Reference game state
//!
//! Players, permanents, zones and the current step, implementing the
//! capability traits the engine calls into. Turn sequencing is left to
//! whoever drives the game.

use crate::core::{
    Card, CardId, Color, Cost, Duration, EntityId, EntityStore, Keyword, Player, PlayerId,
    TargetRef,
};
use crate::game::interfaces::{GameCallbacks, GameView};
use crate::game::logger::EngineLogger;
use crate::game::phase::{Step, TurnStructure};
use crate::zones::{CardZone, PlayerZones, Zone};
use crate::{EngineError, Result};
use serde::{Deserialize, Serialize};

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct GameState {
    /// All cards in the game
    pub cards: EntityStore<Card>,

    /// Players in table order
    pub players: Vec<Player>,

    pub player_zones: Vec<(PlayerId, PlayerZones)>,

    /// Shared by all players
    pub battlefield: CardZone,

    pub turn: TurnStructure,

    /// Unified id counter for players and cards
    next_entity_id: u32,

    pub logger: EngineLogger,
}

impl GameState {
    /// Seat players in the given order; the first one is active
    pub fn new(names: &[&str], starting_life: i32) -> Self {
        let mut next_id = 1;
        let mut players = Vec::with_capacity(names.len());
        let mut player_zones = Vec::with_capacity(names.len());
        for name in names {
            let id = PlayerId::new(next_id);
            next_id += 1;
            players.push(Player::new(id, *name, starting_life));
            player_zones.push((id, PlayerZones::new(id)));
        }

        // The battlefield belongs to nobody; it gets an id of its own
        let shared_id = EntityId::new(next_id);
        next_id += 1;
        let first = players.first().map(|p| p.id).unwrap_or(shared_id);

        GameState {
            cards: EntityStore::new(),
            players,
            player_zones,
            battlefield: CardZone::new(Zone::Battlefield, shared_id),
            turn: TurnStructure::new(first),
            next_entity_id: next_id,
            logger: EngineLogger::new(),
        }
    }

    pub fn new_two_player(player1: &str, player2: &str, starting_life: i32) -> Self {
        Self::new(&[player1, player2], starting_life)
    }

    pub fn with_logger(mut self, logger: EngineLogger) -> Self {
        self.logger = logger;
        self
    }

    pub fn next_card_id(&mut self) -> CardId {
        let id = EntityId::new(self.next_entity_id);
        self.next_entity_id += 1;
        id
    }

    /// Add a card to the game, outside any zone
    pub fn create_card(&mut self, name: &str, owner: PlayerId) -> CardId {
        let id = self.next_card_id();
        self.cards.insert(id, Card::new(id, name, owner));
        id
    }

    /// Add a prepared card, assigning it a fresh id
    pub fn insert_card(&mut self, mut card: Card) -> CardId {
        let id = self.next_card_id();
        card.id = id;
        self.cards.insert(id, card);
        id
    }

    pub fn get_player(&self, id: PlayerId) -> Result<&Player> {
        self.players
            .iter()
            .find(|p| p.id == id)
            .ok_or(EngineError::EntityNotFound(id.as_u32()))
    }

    pub fn get_player_mut(&mut self, id: PlayerId) -> Result<&mut Player> {
        self.players
            .iter_mut()
            .find(|p| p.id == id)
            .ok_or(EngineError::EntityNotFound(id.as_u32()))
    }

    /// The other player of a two-player game
    pub fn opponent_of(&self, player: PlayerId) -> Option<PlayerId> {
        if self.players.len() != 2 {
            return None;
        }
        self.players.iter().find(|p| p.id != player).map(|p| p.id)
    }

    pub fn get_player_zones(&self, player: PlayerId) -> Option<&PlayerZones> {
        self.player_zones
            .iter()
            .find(|(id, _)| *id == player)
            .map(|(_, zones)| zones)
    }

    pub fn get_player_zones_mut(&mut self, player: PlayerId) -> Option<&mut PlayerZones> {
        self.player_zones
            .iter_mut()
            .find(|(id, _)| *id == player)
            .map(|(_, zones)| zones)
    }

    fn zones_mut(&mut self, player: PlayerId) -> Result<&mut PlayerZones> {
        self.get_player_zones_mut(player)
            .ok_or(EngineError::EntityNotFound(player.as_u32()))
    }

    /// Put a card into one of its owner's zones (or onto the battlefield)
    pub fn place_card(&mut self, card: CardId, zone: Zone) -> Result<()> {
        let owner = self.cards.get(card)?.owner;
        match zone {
            Zone::Battlefield => self.battlefield.add(card),
            other => {
                if let Some(pile) = self.zones_mut(owner)?.zone_mut(other) {
                    pile.add(card);
                }
            }
        }
        Ok(())
    }

    /// Move a card between zones; the card must be in `from`
    pub fn move_card(&mut self, card: CardId, from: Zone, to: Zone) -> Result<()> {
        let owner = self.cards.get(card)?.owner;
        let removed = match from {
            Zone::Battlefield => self.battlefield.remove(card),
            other => self
                .zones_mut(owner)?
                .zone_mut(other)
                .is_some_and(|pile| pile.remove(card)),
        };
        if !removed {
            return Err(EngineError::EntityNotFound(card.as_u32()));
        }
        self.place_card(card, to)?;

        if from == Zone::Battlefield {
            let card = self.cards.get_mut(card)?;
            card.tapped = false;
            card.damage = 0;
            card.modifiers.clear();
            card.controller = card.owner;
        }
        log_if_verbose!(self.logger, "{} moved from {:?} to {:?}", card, from, to);
        Ok(())
    }

    /// Create a card directly on the battlefield under its owner's control
    pub fn create_permanent(&mut self, card: Card) -> CardId {
        let id = self.insert_card(card);
        self.battlefield.add(id);
        id
    }

    pub fn set_step(&mut self, step: Step) {
        self.turn.current_step = step;
    }

    /// Move to the next step, ending durations tied to the step being left
    ///
    /// Returns false at the end of the turn.
    pub fn advance_step(&mut self) -> bool {
        let leaving = self.turn.current_step;
        if let Some(elapsed) = leaving.ends_duration() {
            for id in self.battlefield.cards.clone() {
                if let Ok(card) = self.cards.get_mut(id) {
                    card.expire_modifiers(elapsed);
                    if elapsed == Duration::UntilEndOfTurn {
                        card.damage = 0;
                    }
                }
            }
        }
        self.turn.advance_step()
    }

    /// Hand the turn to the next player in table order
    pub fn next_turn(&mut self) {
        if self.players.is_empty() {
            return;
        }
        let index = self
            .players
            .iter()
            .position(|p| p.id == self.turn.active_player)
            .unwrap_or_default();
        let next = self.players[(index + 1) % self.players.len()].id;
        for player in &mut self.players {
            player.empty_mana_pool();
        }
        self.turn.next_turn(next);
    }

    /// Creatures with lethal damage go to the graveyard
    ///
    /// Returns the creatures that died so their abilities can be dropped.
    pub fn check_state_based_actions(&mut self) -> Result<Vec<CardId>> {
        let dying: Vec<CardId> = self
            .battlefield
            .cards
            .iter()
            .copied()
            .filter(|id| {
                self.cards.get(*id).is_ok_and(|card| {
                    let Some(toughness) = card.current_toughness() else {
                        return false;
                    };
                    toughness <= 0
                        || (card.damage >= toughness
                            && !card.has_keyword(&Keyword::Indestructible))
                })
            })
            .collect();
        for id in &dying {
            self.move_card(*id, Zone::Battlefield, Zone::Graveyard)?;
            self.logger.normal(&format!("{} died", self.card_name(*id)));
        }
        Ok(dying)
    }

    fn card_name(&self, id: CardId) -> String {
        self.cards
            .get(id)
            .map(|c| c.name.clone())
            .unwrap_or_else(|_| id.to_string())
    }

    fn card_on_battlefield_mut(&mut self, id: CardId) -> Result<&mut Card> {
        if !self.battlefield.contains(id) {
            return Err(EngineError::EntityNotFound(id.as_u32()));
        }
        self.cards.get_mut(id)
    }
}

impl GameView for GameState {
    fn players(&self) -> Vec<PlayerId> {
        self.players.iter().map(|p| p.id).collect()
    }

    fn active_player(&self) -> PlayerId {
        self.turn.active_player
    }

    fn is_main_phase(&self) -> bool {
        self.turn.current_step.is_main_phase()
    }

    fn is_combat_phase(&self) -> bool {
        self.turn.current_step.is_combat()
    }

    fn player(&self, id: PlayerId) -> Option<&Player> {
        self.get_player(id).ok()
    }

    fn card(&self, id: CardId) -> Option<&Card> {
        self.cards.get(id).ok()
    }

    fn battlefield(&self) -> Vec<CardId> {
        self.battlefield.cards.clone()
    }

    fn is_on_battlefield(&self, card: CardId) -> bool {
        self.battlefield.contains(card)
    }

    fn hand_size(&self, player: PlayerId) -> usize {
        self.get_player_zones(player)
            .map(|zones| zones.hand.len())
            .unwrap_or_default()
    }

    fn can_pay_cost(&self, player: PlayerId, cost: &Cost) -> bool {
        self.get_player(player)
            .is_ok_and(|p| p.can_pay_cost(cost))
    }

    fn logger(&self) -> &EngineLogger {
        &self.logger
    }
}

impl GameCallbacks for GameState {
    fn pay_cost(&mut self, player: PlayerId, cost: &Cost) -> Result<()> {
        self.get_player_mut(player)?.pay_cost(cost)
    }

    fn discard_cards(&mut self, player: PlayerId, count: usize) -> Result<()> {
        let zones = self.zones_mut(player)?;
        if zones.hand.len() < count {
            return Err(EngineError::CostPayment(format!(
                "cannot discard {count} card(s) from a hand of {}",
                zones.hand.len()
            )));
        }
        for _ in 0..count {
            if let Some(card) = zones.hand.take_top() {
                zones.graveyard.add(card);
            }
        }
        Ok(())
    }

    fn sacrifice_permanent(&mut self, card: CardId) -> Result<()> {
        self.move_card(card, Zone::Battlefield, Zone::Graveyard)?;
        self.logger
            .normal(&format!("{} was sacrificed", self.card_name(card)));
        Ok(())
    }

    fn tap(&mut self, card: CardId) -> Result<()> {
        self.card_on_battlefield_mut(card)?.tap();
        Ok(())
    }

    fn untap(&mut self, card: CardId) -> Result<()> {
        self.card_on_battlefield_mut(card)?.untap();
        Ok(())
    }

    fn add_mana_to_pool(&mut self, player: PlayerId, color: Color, amount: u8) -> Result<()> {
        self.get_player_mut(player)?.add_mana(color, amount);
        log_if_verbose!(self.logger, "{} added {} {} mana", player, amount, color);
        Ok(())
    }

    fn deal_damage(&mut self, target: TargetRef, amount: i32, source: CardId) -> Result<()> {
        match target {
            TargetRef::Player(player) => {
                self.get_player_mut(player)?.lose_life(amount);
            }
            TargetRef::Permanent(card) => {
                let permanent = self.card_on_battlefield_mut(card)?;
                permanent.damage = permanent.damage.saturating_add(amount);
            }
            TargetRef::Spell(item) => {
                return Err(EngineError::InvalidTarget {
                    index: 0,
                    reason: format!("{item} cannot be dealt damage"),
                });
            }
        }
        self.logger.normal(&format!(
            "{} deals {} damage to {}",
            self.card_name(source),
            amount,
            target
        ));
        Ok(())
    }

    fn draw_cards(&mut self, player: PlayerId, count: usize) -> Result<()> {
        let drawn = self.zones_mut(player)?.draw(count);
        if drawn.len() < count {
            self.logger.normal(&format!(
                "{} tried to draw {} card(s) from a library of {}",
                player,
                count,
                drawn.len()
            ));
        }
        Ok(())
    }

    fn gain_life(&mut self, player: PlayerId, amount: i32) -> Result<()> {
        self.get_player_mut(player)?.gain_life(amount);
        Ok(())
    }

    fn lose_life(&mut self, player: PlayerId, amount: i32) -> Result<()> {
        self.get_player_mut(player)?.lose_life(amount);
        Ok(())
    }

    fn apply_pump(
        &mut self,
        card: CardId,
        power: i32,
        toughness: i32,
        duration: Duration,
    ) -> Result<()> {
        self.card_on_battlefield_mut(card)?
            .add_modifier(power, toughness, duration);
        Ok(())
    }

    fn destroy_permanent(&mut self, card: CardId) -> Result<bool> {
        let indestructible = self
            .card_on_battlefield_mut(card)?
            .has_keyword(&Keyword::Indestructible);
        if indestructible {
            self.logger
                .normal(&format!("{} is indestructible", self.card_name(card)));
            return Ok(false);
        }
        self.move_card(card, Zone::Battlefield, Zone::Graveyard)?;
        self.logger.normal(&format!("{} was destroyed", self.card_name(card)));
        Ok(true)
    }

    fn mill(&mut self, player: PlayerId, count: usize) -> Result<()> {
        let milled = self.zones_mut(player)?.mill(count);
        log_if_verbose!(self.logger, "{} milled {} card(s)", player, milled);
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::core::CardType;

    fn bears(game: &mut GameState, owner: PlayerId) -> CardId {
        let mut card = Card::new(EntityId::new(0), "Grizzly Bears", owner);
        card.types.push(CardType::Creature);
        card.power = Some(2);
        card.toughness = Some(2);
        game.create_permanent(card)
    }

    #[test]
    fn test_two_player_setup() {
        let game = GameState::new_two_player("Alice", "Bob", 20);
        assert_eq!(game.players.len(), 2);
        let alice = game.players[0].id;
        assert_eq!(game.active_player(), alice);
        assert_eq!(game.opponent_of(alice), Some(game.players[1].id));
        assert_eq!(game.get_player(alice).unwrap().life, 20);
    }

    #[test]
    fn test_pump_expires_at_cleanup() {
        let mut game = GameState::new_two_player("Alice", "Bob", 20);
        let alice = game.players[0].id;
        let bears = bears(&mut game, alice);

        game.apply_pump(bears, 3, 3, Duration::UntilEndOfTurn).unwrap();
        assert_eq!(game.card(bears).unwrap().current_power(), Some(5));

        game.set_step(Step::Cleanup);
        game.advance_step();
        assert_eq!(game.card(bears).unwrap().current_power(), Some(2));
    }

    #[test]
    fn test_lethal_damage_kills() {
        let mut game = GameState::new_two_player("Alice", "Bob", 20);
        let alice = game.players[0].id;
        let bears = bears(&mut game, alice);

        game.deal_damage(TargetRef::Permanent(bears), 2, bears).unwrap();
        let died = game.check_state_based_actions().unwrap();
        assert_eq!(died, vec![bears]);
        assert!(!game.is_on_battlefield(bears));
        assert!(game.get_player_zones(alice).unwrap().graveyard.contains(bears));
    }

    #[test]
    fn test_indestructible_survives_destroy() {
        let mut game = GameState::new_two_player("Alice", "Bob", 20);
        let alice = game.players[0].id;
        let bears = bears(&mut game, alice);
        game.cards
            .get_mut(bears)
            .unwrap()
            .keywords
            .push(Keyword::Indestructible);

        assert!(!game.destroy_permanent(bears).unwrap());
        assert!(game.is_on_battlefield(bears));
    }

    #[test]
    fn test_discard_requires_enough_cards() {
        let mut game = GameState::new_two_player("Alice", "Bob", 20);
        let alice = game.players[0].id;
        let card = game.create_card("Island", alice);
        game.place_card(card, Zone::Hand).unwrap();

        assert!(game.discard_cards(alice, 2).is_err());
        game.discard_cards(alice, 1).unwrap();
        assert_eq!(game.hand_size(alice), 0);
    }
}
