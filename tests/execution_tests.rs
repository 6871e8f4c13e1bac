//! Execution engine tests
//!
//! Abilities parsed from oracle text, registered, and activated directly
//! against a `GameState` without going through the stack.

use mtg_oracle_engine::core::{
    AbilityId, AbilityType, Card, CardId, CardType, Color, Effect, EffectType, EntityId, PlayerId,
    TargetRef, TriggerCondition,
};
use mtg_oracle_engine::game::{
    Activation, ActivationChoices, EffectContext, EngineLogger, ExecutionEngine, GameState,
    GameView, StackObject, Step,
};
use mtg_oracle_engine::parser::OracleParser;
use mtg_oracle_engine::zones::Zone;
use mtg_oracle_engine::{DenialReason, EngineError};

struct Board {
    game: GameState,
    engine: ExecutionEngine,
    parser: OracleParser,
    alice: PlayerId,
    bob: PlayerId,
}

impl Board {
    fn new() -> Self {
        let mut game = GameState::new_two_player("Alice", "Bob", 20)
            .with_logger(EngineLogger::capturing());
        game.set_step(Step::Main1);
        let alice = game.players[0].id;
        let bob = game.players[1].id;
        Board {
            game,
            engine: ExecutionEngine::default(),
            parser: OracleParser::new(),
            alice,
            bob,
        }
    }

    fn permanent(
        &mut self,
        name: &str,
        controller: PlayerId,
        card_type: CardType,
        oracle: &str,
    ) -> CardId {
        let mut card = Card::new(EntityId::new(0), name, controller);
        card.types.push(card_type);
        if card_type == CardType::Creature {
            card.power = Some(2);
            card.toughness = Some(2);
        }
        card.text = oracle.to_string();
        let id = self.game.create_permanent(card);
        for ability in self.parser.parse_card(oracle, name, id) {
            self.engine.register(ability).unwrap();
        }
        id
    }

    fn creature(&mut self, name: &str, controller: PlayerId, oracle: &str) -> CardId {
        self.permanent(name, controller, CardType::Creature, oracle)
    }

    fn land(&mut self, name: &str, controller: PlayerId, oracle: &str) -> CardId {
        self.permanent(name, controller, CardType::Land, oracle)
    }

    fn ability_of(&self, card: CardId) -> AbilityId {
        self.engine.registry().for_source(card)[0].id
    }

    fn execute(
        &mut self,
        ability: AbilityId,
        controller: PlayerId,
        targets: &[TargetRef],
        choices: ActivationChoices,
    ) -> mtg_oracle_engine::Result<()> {
        self.engine
            .execute(ability, controller, targets, choices, &mut self.game)
    }

    fn denial(&self, card: CardId, controller: PlayerId) -> EngineError {
        let ability = self.engine.registry().for_source(card)[0];
        self.engine
            .check_activation(ability, controller, &self.game)
            .unwrap_err()
    }

    fn float_colorless(&mut self, player: PlayerId, amount: u8) {
        self.game
            .get_player_mut(player)
            .unwrap()
            .mana_pool
            .add(Color::Colorless, amount);
    }

    fn life(&self, player: PlayerId) -> i32 {
        self.game.player(player).unwrap().life
    }
}

#[test]
fn test_fixed_mana_ability() {
    let mut board = Board::new();
    let alice = board.alice;
    let forest = board.land("Forest", alice, "{T}: Add {G}.");

    let ability = board.ability_of(forest);
    board
        .execute(ability, alice, &[], ActivationChoices::default())
        .unwrap();

    let pool = &board.game.player(alice).unwrap().mana_pool;
    assert_eq!(pool.green, 1);
    assert_eq!(pool.total(), 1);
    assert!(board.game.card(forest).unwrap().tapped);
}

#[test]
fn test_mana_color_choices() {
    let mut board = Board::new();
    let alice = board.alice;
    let karplusan = board.land("Karplusan Forest", alice, "{T}: Add {R} or {G}.");
    let fallback = board.land("Taiga", alice, "{T}: Add {R} or {G}.");
    let prism = board.land("City of Brass", alice, "{T}: Add one mana of any color.");

    let ability = board.ability_of(karplusan);
    board
        .execute(ability, alice, &[], ActivationChoices::with_color(Color::Green))
        .unwrap();
    assert_eq!(board.game.player(alice).unwrap().mana_pool.green, 1);

    // A color the ability doesn't offer falls back to its first option
    let ability = board.ability_of(fallback);
    board
        .execute(ability, alice, &[], ActivationChoices::with_color(Color::Blue))
        .unwrap();
    let pool = &board.game.player(alice).unwrap().mana_pool;
    assert_eq!(pool.red, 1);
    assert_eq!(pool.blue, 0);

    // No choice at all means white
    let ability = board.ability_of(prism);
    board
        .execute(ability, alice, &[], ActivationChoices::default())
        .unwrap();
    assert_eq!(board.game.player(alice).unwrap().mana_pool.white, 1);
}

#[test]
fn test_activate_splits_mana_from_stack_abilities() {
    let mut board = Board::new();
    let (alice, bob) = (board.alice, board.bob);
    let forest = board.land("Forest", alice, "{T}: Add {G}.");
    let pinger = board.creature(
        "Prodigal Pyromancer",
        alice,
        "{T}: Prodigal Pyromancer deals 1 damage to any target.",
    );

    let ability = board.ability_of(forest);
    let activation = board
        .engine
        .activate(ability, alice, &[], ActivationChoices::default(), &mut board.game)
        .unwrap();
    assert!(matches!(activation, Activation::ManaResolved));

    let ability = board.ability_of(pinger);
    let activation = board
        .engine
        .activate(
            ability,
            alice,
            &[TargetRef::Player(bob)],
            ActivationChoices::default(),
            &mut board.game,
        )
        .unwrap();
    match activation {
        Activation::Pending(StackObject::Ability(pending)) => assert_eq!(pending.id, ability),
        other => panic!("expected a pending ability, got {other:?}"),
    }
    // Cost paid, effect not yet applied
    assert!(board.game.card(pinger).unwrap().tapped);
    assert_eq!(board.life(bob), 20);
}

#[test]
fn test_static_ability_is_not_activatable() {
    let mut board = Board::new();
    let alice = board.alice;
    let angel = board.creature("Serra Angel", alice, "Flying, vigilance");

    assert!(matches!(
        board.denial(angel, alice),
        EngineError::ActivationDenied(DenialReason::NotActivatable(AbilityType::Static))
    ));
}

#[test]
fn test_only_the_controller_may_activate() {
    let mut board = Board::new();
    let (alice, bob) = (board.alice, board.bob);
    let healer = board.creature("Healer", alice, "{T}: You gain 1 life.");

    assert!(matches!(
        board.denial(healer, bob),
        EngineError::ActivationDenied(DenialReason::NotController)
    ));
    assert!(board.engine.can_activate(
        board.engine.registry().for_source(healer)[0],
        alice,
        &board.game
    ));
}

#[test]
fn test_timing_restrictions() {
    let mut board = Board::new();
    let (alice, bob) = (board.alice, board.bob);
    let sorcery = board.creature(
        "Scholar",
        alice,
        "{T}: Draw a card. Activate only as a sorcery.",
    );
    let combat = board.creature(
        "Captain",
        alice,
        "{T}: You gain 1 life. Activate only during combat.",
    );
    let own_turn = board.creature(
        "Sentry",
        bob,
        "{T}: You gain 1 life. Activate only during your turn.",
    );

    board.game.set_step(Step::Upkeep);
    assert!(matches!(
        board.denial(sorcery, alice),
        EngineError::ActivationDenied(DenialReason::SorcerySpeed)
    ));

    board.game.set_step(Step::Main1);
    assert!(matches!(
        board.denial(combat, alice),
        EngineError::ActivationDenied(DenialReason::CombatOnly)
    ));
    board.game.set_step(Step::DeclareAttackers);
    let ability = board.engine.registry().for_source(combat)[0];
    assert!(board.engine.can_activate(ability, alice, &board.game));

    // Alice is the active player
    assert!(matches!(
        board.denial(own_turn, bob),
        EngineError::ActivationDenied(DenialReason::NotYourTurn)
    ));
}

#[test]
fn test_once_each_turn_limit() {
    let mut board = Board::new();
    let alice = board.alice;
    let pumper = board.creature(
        "Shade",
        alice,
        "{1}: This creature gets +1/+1 until end of turn. Activate only once each turn.",
    );
    board.float_colorless(alice, 2);
    let ability = board.ability_of(pumper);

    board
        .execute(ability, alice, &[], ActivationChoices::default())
        .unwrap();
    let err = board
        .execute(ability, alice, &[], ActivationChoices::default())
        .unwrap_err();
    assert!(matches!(
        err,
        EngineError::ActivationDenied(DenialReason::UsageExhausted("per-turn"))
    ));
    assert_eq!(board.game.logger.count_matching("denied"), 1);

    board.engine.registry_mut().reset_turn_usage();
    board
        .execute(ability, alice, &[], ActivationChoices::default())
        .unwrap();
    assert_eq!(board.game.card(pumper).unwrap().current_power(), Some(4));
}

#[test]
fn test_tapped_source_and_unpayable_cost() {
    let mut board = Board::new();
    let alice = board.alice;
    let healer = board.creature("Healer", alice, "{T}: You gain 1 life.");
    let priest = board.creature("Priest", alice, "{3}: You gain 1 life.");

    let ability = board.ability_of(healer);
    board
        .execute(ability, alice, &[], ActivationChoices::default())
        .unwrap();
    assert_eq!(board.life(alice), 21);
    assert!(matches!(
        board.denial(healer, alice),
        EngineError::ActivationDenied(DenialReason::SourceTapped)
    ));

    assert!(matches!(
        board.denial(priest, alice),
        EngineError::ActivationDenied(DenialReason::CannotPayCost)
    ));
}

#[test]
fn test_no_legal_targets() {
    let mut board = Board::new();
    let alice = board.alice;
    let shatterer = board.creature("Shatterer", alice, "{T}: Destroy target artifact.");

    assert!(matches!(
        board.denial(shatterer, alice),
        EngineError::ActivationDenied(DenialReason::NoLegalTargets)
    ));
}

#[test]
fn test_target_count_and_legality() {
    let mut board = Board::new();
    let (alice, bob) = (board.alice, board.bob);
    let pinger = board.creature(
        "Prodigal Pyromancer",
        alice,
        "{T}: Prodigal Pyromancer deals 1 damage to any target.",
    );
    let assassin = board.creature("Assassin", alice, "{T}: Destroy target creature.");
    let mountain = board.land("Mountain", bob, "{T}: Add {R}.");
    let ability = board.ability_of(pinger);

    let err = board
        .execute(ability, alice, &[], ActivationChoices::default())
        .unwrap_err();
    assert!(matches!(
        err,
        EngineError::InsufficientTargets {
            required: 1,
            supplied: 0
        }
    ));
    // Rejected before any cost is paid
    assert!(!board.game.card(pinger).unwrap().tapped);

    let err = board
        .execute(
            ability,
            alice,
            &[TargetRef::Player(bob), TargetRef::Player(alice)],
            ActivationChoices::default(),
        )
        .unwrap_err();
    assert!(matches!(err, EngineError::InvalidTarget { index: 1, .. }));

    let ability = board.ability_of(assassin);
    let err = board
        .execute(
            ability,
            alice,
            &[TargetRef::Permanent(mountain)],
            ActivationChoices::default(),
        )
        .unwrap_err();
    assert!(matches!(err, EngineError::InvalidTarget { index: 0, .. }));
    assert!(board.game.is_on_battlefield(mountain));
}

#[test]
fn test_x_damage() {
    let mut board = Board::new();
    let (alice, bob) = (board.alice, board.bob);
    let cannon = board.permanent(
        "Rod of Ruin",
        alice,
        CardType::Artifact,
        "{X}, {T}: This permanent deals X damage to any target.",
    );
    board.float_colorless(alice, 3);

    let ability = board.ability_of(cannon);
    board
        .execute(
            ability,
            alice,
            &[TargetRef::Player(bob)],
            ActivationChoices::with_x(3),
        )
        .unwrap();
    assert_eq!(board.life(bob), 17);
    assert_eq!(board.game.player(alice).unwrap().mana_pool.total(), 0);
}

#[test]
fn test_x_too_large_to_pay_is_denied() {
    let mut board = Board::new();
    let (alice, bob) = (board.alice, board.bob);
    let cannon = board.permanent(
        "Blaster",
        alice,
        CardType::Artifact,
        "{X}, {T}: This permanent deals X damage to any target.",
    );
    board.float_colorless(alice, 255);
    let ability = board.ability_of(cannon);

    for x in [256, u32::MAX] {
        let err = board
            .execute(
                ability,
                alice,
                &[TargetRef::Player(bob)],
                ActivationChoices::with_x(x),
            )
            .unwrap_err();
        assert!(matches!(
            err,
            EngineError::ActivationDenied(DenialReason::CannotPayCost)
        ));
    }
    assert_eq!(board.life(bob), 20);
    assert_eq!(board.game.player(alice).unwrap().mana_pool.total(), 255);
    assert!(!board.game.card(cannon).unwrap().tapped);
    assert_eq!(board.game.logger().count_matching("denied"), 2);

    // The largest X that fits is paid and dealt in full
    board
        .execute(
            ability,
            alice,
            &[TargetRef::Player(bob)],
            ActivationChoices::with_x(255),
        )
        .unwrap();
    assert_eq!(board.life(bob), 20 - 255);
    assert_eq!(board.game.player(alice).unwrap().mana_pool.total(), 0);
}

#[test]
fn test_unpayable_discard_or_sacrifice_pays_nothing() {
    let mut board = Board::new();
    let alice = board.alice;
    let looter = board.creature("Looter", alice, "{1}, {T}, Discard a card: Draw a card.");
    board.float_colorless(alice, 2);

    // Empty hand: nothing to discard
    let loot = board.ability_of(looter);
    let err = board
        .execute(loot, alice, &[], ActivationChoices::default())
        .unwrap_err();
    assert!(matches!(
        err,
        EngineError::ActivationDenied(DenialReason::CannotPayCost)
    ));
    assert_eq!(board.game.player(alice).unwrap().mana_pool.total(), 2);
    assert!(!board.game.card(looter).unwrap().tapped);

    // A card in hand cannot be sacrificed
    let relic = board.game.create_card("Relic", alice);
    board.game.place_card(relic, Zone::Hand).unwrap();
    for ability in board
        .parser
        .parse_card("{1}, Sacrifice this permanent: You gain 2 life.", "Relic", relic)
    {
        board.engine.register(ability).unwrap();
    }
    let sacrifice = board.ability_of(relic);
    let err = board
        .execute(sacrifice, alice, &[], ActivationChoices::default())
        .unwrap_err();
    assert!(matches!(
        err,
        EngineError::ActivationDenied(DenialReason::CannotPayCost)
    ));
    assert_eq!(board.game.player(alice).unwrap().mana_pool.total(), 2);
    assert_eq!(board.life(alice), 20);
    assert!(board.game.get_player_zones(alice).unwrap().hand.contains(relic));
}

#[test]
fn test_draw_from_library() {
    let mut board = Board::new();
    let alice = board.alice;
    for name in ["Island", "Swamp"] {
        let card = board.game.create_card(name, alice);
        board.game.place_card(card, Zone::Library).unwrap();
    }
    let scholar = board.creature("Scholar", alice, "{T}: Draw a card.");

    let ability = board.ability_of(scholar);
    board
        .execute(ability, alice, &[], ActivationChoices::default())
        .unwrap();
    let zones = board.game.get_player_zones(alice).unwrap();
    assert_eq!(zones.hand.len(), 1);
    assert_eq!(zones.library.len(), 1);
}

#[test]
fn test_pump_ends_at_cleanup() {
    let mut board = Board::new();
    let alice = board.alice;
    let shade = board.creature(
        "Shade",
        alice,
        "{1}: This creature gets +2/+2 until end of turn.",
    );
    board.float_colorless(alice, 1);

    let ability = board.ability_of(shade);
    board
        .execute(ability, alice, &[], ActivationChoices::default())
        .unwrap();
    assert_eq!(board.game.card(shade).unwrap().current_power(), Some(4));

    board.game.set_step(Step::Cleanup);
    board.game.advance_step();
    assert_eq!(board.game.card(shade).unwrap().current_power(), Some(2));
}

#[test]
fn test_sacrifice_cost_unregisters_abilities() {
    let mut board = Board::new();
    let alice = board.alice;
    let martyr = board.creature("Martyr", alice, "Sacrifice this creature: You gain 2 life.");

    let ability = board.ability_of(martyr);
    board
        .execute(ability, alice, &[], ActivationChoices::default())
        .unwrap();

    assert_eq!(board.life(alice), 22);
    assert!(!board.game.is_on_battlefield(martyr));
    assert!(board
        .game
        .get_player_zones(alice)
        .unwrap()
        .graveyard
        .contains(martyr));
    assert!(board.engine.registry().for_source(martyr).is_empty());
    assert!(!board.engine.registry().contains(ability));
}

#[test]
fn test_sacrificed_creature_queues_its_dies_trigger() {
    let mut board = Board::new();
    let alice = board.alice;
    let martyr = board.creature(
        "Martyr",
        alice,
        "Sacrifice this creature: You gain 2 life.\nWhen this creature dies, you gain 3 life.",
    );
    assert!(board.engine.pending_triggers().is_empty());

    let ability = board.ability_of(martyr);
    board
        .execute(ability, alice, &[], ActivationChoices::default())
        .unwrap();

    let pending = board.engine.take_pending_triggers();
    assert_eq!(pending.len(), 1);
    assert_eq!(pending[0].controller, alice);
    assert_eq!(pending[0].ability.trigger, Some(TriggerCondition::Dies));
    assert_eq!(pending[0].ability.source, martyr);
    assert!(board.engine.pending_triggers().is_empty());
    assert_eq!(board.life(alice), 22);
}

#[test]
fn test_destroyed_artifact_queues_leave_triggers_only() {
    let mut board = Board::new();
    let (alice, bob) = (board.alice, board.bob);
    let shatterer = board.creature("Shatterer", alice, "{T}: Destroy target artifact.");
    let relic = board.permanent(
        "Relic",
        bob,
        CardType::Artifact,
        "When this artifact leaves the battlefield, you gain 1 life.\n\
         When this artifact dies, you gain 5 life.",
    );

    let shatter = board.ability_of(shatterer);
    board
        .execute(
            shatter,
            alice,
            &[TargetRef::Permanent(relic)],
            ActivationChoices::default(),
        )
        .unwrap();

    // Only creatures die
    let pending = board.engine.take_pending_triggers();
    assert_eq!(pending.len(), 1);
    assert_eq!(
        pending[0].ability.trigger,
        Some(TriggerCondition::LeavesTheBattlefield)
    );
    assert_eq!(pending[0].controller, bob);
}

#[test]
fn test_destroy_unregisters_abilities() {
    let mut board = Board::new();
    let (alice, bob) = (board.alice, board.bob);
    let assassin = board.creature("Assassin", alice, "{T}: Destroy target creature.");
    let pinger = board.creature(
        "Prodigal Pyromancer",
        bob,
        "{T}: Prodigal Pyromancer deals 1 damage to any target.",
    );

    let ability = board.ability_of(assassin);
    board
        .execute(
            ability,
            alice,
            &[TargetRef::Permanent(pinger)],
            ActivationChoices::default(),
        )
        .unwrap();

    assert!(!board.game.is_on_battlefield(pinger));
    assert!(board.engine.registry().for_source(pinger).is_empty());
    assert_eq!(board.engine.registry().for_source(assassin).len(), 1);
}

#[test]
fn test_unimplemented_effect_is_an_error() {
    let mut board = Board::new();
    let (alice, bob) = (board.alice, board.bob);
    let exiler = board.creature("Exiler", alice, "{T}: Exile target creature.");
    let bears = board.creature("Grizzly Bears", bob, "");

    let ability = board.ability_of(exiler);
    let err = board
        .execute(
            ability,
            alice,
            &[TargetRef::Permanent(bears)],
            ActivationChoices::default(),
        )
        .unwrap_err();
    assert!(matches!(
        err,
        EngineError::UnimplementedEffect(EffectType::Exile)
    ));
    assert!(board.game.is_on_battlefield(bears));
}

#[test]
fn test_failed_effect_stops_the_rest() {
    let mut board = Board::new();
    let alice = board.alice;
    let effects = vec![Effect::new(EffectType::Exile, 1), Effect::gain_life(3)];
    let ctx = EffectContext {
        controller: alice,
        source: EntityId::new(99),
        targets: &[],
        x_value: None,
        color: None,
        oracle_text: "",
    };

    let err = board
        .engine
        .apply_effects(&effects, ctx, &mut board.game)
        .unwrap_err();
    assert!(matches!(
        err,
        EngineError::UnimplementedEffect(EffectType::Exile)
    ));
    assert_eq!(board.life(alice), 20);
}
