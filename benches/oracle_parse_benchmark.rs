//! Benchmark for oracle text parsing and stack resolution

use criterion::{black_box, criterion_group, criterion_main, BenchmarkId, Criterion, Throughput};
use mtg_oracle_engine::core::{Color, EntityId, TargetRef};
use mtg_oracle_engine::game::{
    EngineLogger, ExecutionEngine, GameState, GameView, PriorityStack, Step, VerbosityLevel,
};
use mtg_oracle_engine::loader::CardLoader;
use mtg_oracle_engine::parser::OracleParser;

const SAMPLES: &[(&str, &str)] = &[
    ("mana", "{T}: Add {G}."),
    ("bolt", "This permanent deals 3 damage to any target."),
    ("pump", "Target creature gets +3/+3 until end of turn."),
    (
        "restricted",
        "Destroy target nonblack creature an opponent controls with power 3 or greater.",
    ),
    (
        "multi",
        "{2}, {T}, Sacrifice this artifact: You gain 3 life. Draw a card.\nActivate only as a sorcery.",
    ),
    (
        "triggered",
        "When this creature enters the battlefield, draw two cards.",
    ),
];

fn bench_parse(c: &mut Criterion) {
    let mut group = c.benchmark_group("oracle_parse");

    for (name, text) in SAMPLES {
        group.throughput(Throughput::Bytes(text.len() as u64));
        group.bench_with_input(BenchmarkId::new("parse", name), text, |b, text| {
            let mut parser = OracleParser::new();
            b.iter(|| black_box(parser.parse(black_box(text), EntityId::new(1))));
        });
    }

    group.bench_function("parse_all_without_enhanced_targeting", |b| {
        let mut parser = OracleParser::new();
        parser.set_enhanced_targeting(false);
        b.iter(|| {
            for (_, text) in SAMPLES {
                black_box(parser.parse(text, EntityId::new(1)));
            }
        });
    });

    group.finish();
}

fn bench_cast_and_resolve(c: &mut Criterion) {
    let definition = CardLoader::parse(
        "Name:Lightning Bolt\nManaCost:R\nTypes:Instant\nOracle:Lightning Bolt deals 3 damage to any target.\n",
    )
    .expect("bolt card parses");

    c.bench_function("cast_and_resolve_bolt", |b| {
        b.iter(|| {
            let mut game = GameState::new_two_player("Alice", "Bob", 20);
            game.logger.set_verbosity(VerbosityLevel::Silent);
            game.set_step(Step::Main1);
            let alice = game.active_player();
            let bob = game.players()[1];

            let mut parser = OracleParser::new();
            let card_id = game.next_card_id();
            let loaded = definition.build(card_id, alice, &mut parser);
            game.cards.insert(card_id, loaded.card);
            let spell = loaded.spell.expect("bolt is a spell");
            game.get_player_mut(alice)
                .expect("alice is seated")
                .mana_pool
                .add(Color::Red, 1);

            let mut engine = ExecutionEngine::default();
            let mut stack = PriorityStack::for_game(&game)
                .expect("players are seated")
                .with_logger(EngineLogger::with_verbosity(VerbosityLevel::Silent));
            stack
                .cast_spell(spell, alice, vec![TargetRef::Player(bob)], None, &engine, &mut game)
                .expect("bolt can be cast");
            stack.pass_priority(alice, &mut engine, &mut game).expect("alice passes");
            stack.pass_priority(bob, &mut engine, &mut game).expect("bob passes");
            black_box(game.player(bob).map(|p| p.life))
        });
    });
}

criterion_group!(benches, bench_parse, bench_cast_and_resolve);
criterion_main!(benches);
