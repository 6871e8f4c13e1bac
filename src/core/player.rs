//! Player representation

use crate::core::{Color, Cost, ManaPool, PlayerId, PlayerName};
use crate::{EngineError, Result};
use serde::{Deserialize, Serialize};

/// A player seated at the table
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Player {
    pub id: PlayerId,

    pub name: PlayerName,

    pub life: i32,

    pub mana_pool: ManaPool,
}

impl Player {
    pub fn new(id: PlayerId, name: impl Into<PlayerName>, starting_life: i32) -> Self {
        Player {
            id,
            name: name.into(),
            life: starting_life,
            mana_pool: ManaPool::new(),
        }
    }

    pub fn life(&self) -> i32 {
        self.life
    }

    pub fn set_life(&mut self, life: i32) {
        self.life = life;
    }

    pub fn gain_life(&mut self, amount: i32) {
        self.life = self.life.saturating_add(amount);
    }

    pub fn lose_life(&mut self, amount: i32) {
        self.life = self.life.saturating_sub(amount);
    }

    pub fn add_mana(&mut self, color: Color, amount: u8) {
        self.mana_pool.add(color, amount);
    }

    pub fn empty_mana_pool(&mut self) {
        self.mana_pool.clear();
    }

    /// Whether the player-owned parts of a cost (mana, life) are payable
    ///
    /// X must already be fixed with [`Cost::with_x`]; unfixed X counts as zero.
    pub fn can_pay_cost(&self, cost: &Cost) -> bool {
        let mana = cost.mana.without_x();
        self.mana_pool.can_pay(&mana) && (cost.life <= 0 || self.life >= cost.life)
    }

    /// Deduct mana and life; the player is unchanged on failure
    pub fn pay_cost(&mut self, cost: &Cost) -> Result<()> {
        if cost.life > 0 && self.life < cost.life {
            return Err(EngineError::CostPayment(format!(
                "{} cannot pay {} life with {} life remaining",
                self.name, cost.life, self.life
            )));
        }
        let mana = cost.mana.without_x();
        self.mana_pool
            .pay_cost(&mana)
            .map_err(EngineError::CostPayment)?;
        if cost.life > 0 {
            self.life -= cost.life;
        }
        Ok(())
    }
}
