//! Turn phases and steps
//!
//! The engine does not sequence turns itself. A turn driver moves the
//! [`TurnStructure`] forward; the engine only asks which step it is in.

use crate::core::{Duration, PlayerId};
use serde::{Deserialize, Serialize};

/// Major phases of a turn
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub enum Phase {
    Beginning,
    PreCombatMain,
    Combat,
    PostCombatMain,
    Ending,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub enum Step {
    Untap,
    Upkeep,
    Draw,
    Main1,
    BeginCombat,
    DeclareAttackers,
    DeclareBlockers,
    CombatDamage,
    EndCombat,
    Main2,
    End,
    Cleanup,
}

/// Every step with the phase it belongs to, in turn order
const TURN_ORDER: [(Step, Phase); 12] = [
    (Step::Untap, Phase::Beginning),
    (Step::Upkeep, Phase::Beginning),
    (Step::Draw, Phase::Beginning),
    (Step::Main1, Phase::PreCombatMain),
    (Step::BeginCombat, Phase::Combat),
    (Step::DeclareAttackers, Phase::Combat),
    (Step::DeclareBlockers, Phase::Combat),
    (Step::CombatDamage, Phase::Combat),
    (Step::EndCombat, Phase::Combat),
    (Step::Main2, Phase::PostCombatMain),
    (Step::End, Phase::Ending),
    (Step::Cleanup, Phase::Ending),
];

impl Step {
    fn position(&self) -> usize {
        TURN_ORDER
            .iter()
            .position(|(step, _)| step == self)
            .unwrap_or_default()
    }

    pub fn phase(&self) -> Phase {
        TURN_ORDER[self.position()].1
    }

    /// The step after this one; `None` after cleanup
    pub fn next(&self) -> Option<Step> {
        TURN_ORDER.get(self.position() + 1).map(|(step, _)| *step)
    }

    /// Main phase steps, where sorcery-speed actions are allowed
    pub fn is_main_phase(&self) -> bool {
        matches!(self.phase(), Phase::PreCombatMain | Phase::PostCombatMain)
    }

    pub fn is_combat(&self) -> bool {
        self.phase() == Phase::Combat
    }

    /// Modifier duration that ends when this step is left
    pub fn ends_duration(&self) -> Option<Duration> {
        match self {
            Step::EndCombat => Some(Duration::UntilEndOfCombat),
            Step::Cleanup => Some(Duration::UntilEndOfTurn),
            _ => None,
        }
    }
}

/// Turn number, step and active player
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct TurnStructure {
    /// Starts at 1
    pub turn_number: u32,
    pub current_step: Step,
    pub active_player: PlayerId,
}

impl TurnStructure {
    pub fn new(starting_player: PlayerId) -> Self {
        TurnStructure {
            turn_number: 1,
            current_step: Step::Untap,
            active_player: starting_player,
        }
    }

    pub fn current_phase(&self) -> Phase {
        self.current_step.phase()
    }

    /// Advance to the next step; false at the end of the turn
    pub fn advance_step(&mut self) -> bool {
        match self.current_step.next() {
            Some(step) => {
                self.current_step = step;
                true
            }
            None => false,
        }
    }

    pub fn next_turn(&mut self, next_player: PlayerId) {
        self.turn_number += 1;
        self.current_step = Step::Untap;
        self.active_player = next_player;
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_turn_order() {
        let mut turn = TurnStructure::new(PlayerId::new(1));
        let mut seen = vec![turn.current_step];
        while turn.advance_step() {
            seen.push(turn.current_step);
        }
        let expected: Vec<Step> = TURN_ORDER.iter().map(|(step, _)| *step).collect();
        assert_eq!(seen, expected);
        assert_eq!(turn.current_phase(), Phase::Ending);

        turn.next_turn(PlayerId::new(2));
        assert_eq!(turn.turn_number, 2);
        assert_eq!(turn.current_step, Step::Untap);
        assert_eq!(turn.active_player, PlayerId::new(2));
    }

    #[test]
    fn test_timing_windows() {
        assert!(Step::Main1.is_main_phase());
        assert!(Step::Main2.is_main_phase());
        assert!(!Step::Upkeep.is_main_phase());
        assert!(Step::DeclareBlockers.is_combat());
        assert!(!Step::Main2.is_combat());
        assert_eq!(Step::Cleanup.ends_duration(), Some(Duration::UntilEndOfTurn));
        assert_eq!(Step::Draw.ends_duration(), None);
    }
}
