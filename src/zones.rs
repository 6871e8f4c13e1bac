//! Card zones owned by each player
//!
//! The battlefield is shared and lives in the game state; every other zone
//! belongs to one player.

use crate::core::{CardId, PlayerId};
use serde::{Deserialize, Serialize};

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum Zone {
    Library,
    Hand,
    Battlefield,
    Graveyard,
    Exile,
}

/// An ordered pile of cards; the top of a library is the end of `cards`
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct CardZone {
    pub zone_type: Zone,

    pub owner: PlayerId,

    pub cards: Vec<CardId>,
}

impl CardZone {
    pub fn new(zone_type: Zone, owner: PlayerId) -> Self {
        CardZone {
            zone_type,
            owner,
            cards: Vec::new(),
        }
    }

    pub fn add(&mut self, card_id: CardId) {
        self.cards.push(card_id);
    }

    /// Remove a card, keeping the order of the rest
    pub fn remove(&mut self, card_id: CardId) -> bool {
        match self.cards.iter().position(|&id| id == card_id) {
            Some(pos) => {
                self.cards.remove(pos);
                true
            }
            None => false,
        }
    }

    pub fn contains(&self, card_id: CardId) -> bool {
        self.cards.contains(&card_id)
    }

    pub fn len(&self) -> usize {
        self.cards.len()
    }

    pub fn is_empty(&self) -> bool {
        self.cards.is_empty()
    }

    pub fn take_top(&mut self) -> Option<CardId> {
        self.cards.pop()
    }

    pub fn peek_top(&self) -> Option<CardId> {
        self.cards.last().copied()
    }
}

/// A player's library, hand, graveyard and exile
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct PlayerZones {
    pub library: CardZone,
    pub hand: CardZone,
    pub graveyard: CardZone,
    pub exile: CardZone,
}

impl PlayerZones {
    pub fn new(player_id: PlayerId) -> Self {
        PlayerZones {
            library: CardZone::new(Zone::Library, player_id),
            hand: CardZone::new(Zone::Hand, player_id),
            graveyard: CardZone::new(Zone::Graveyard, player_id),
            exile: CardZone::new(Zone::Exile, player_id),
        }
    }

    pub fn zone_mut(&mut self, zone: Zone) -> Option<&mut CardZone> {
        match zone {
            Zone::Library => Some(&mut self.library),
            Zone::Hand => Some(&mut self.hand),
            Zone::Graveyard => Some(&mut self.graveyard),
            Zone::Exile => Some(&mut self.exile),
            Zone::Battlefield => None,
        }
    }

    /// Move up to `count` cards from the top of the library to the hand
    ///
    /// Returns the cards actually drawn; an empty library stops the draw early.
    pub fn draw(&mut self, count: usize) -> Vec<CardId> {
        let drawn = self.take_from_library(count);
        self.hand.cards.extend_from_slice(&drawn);
        drawn
    }

    /// Move up to `count` cards from the top of the library to the graveyard
    pub fn mill(&mut self, count: usize) -> usize {
        let milled = self.take_from_library(count);
        self.graveyard.cards.extend_from_slice(&milled);
        milled.len()
    }

    fn take_from_library(&mut self, count: usize) -> Vec<CardId> {
        std::iter::from_fn(|| self.library.take_top())
            .take(count)
            .collect()
    }
}
