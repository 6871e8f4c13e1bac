//! MTG Oracle Engine - Main Binary
//!
//! Parse oracle text, inspect card files and resolve a spell end to end

use anyhow::{bail, Context};
use clap::{Parser, Subcommand};
use mtg_oracle_engine::{
    core::{Color, EntityId, PlayerId, Target, TargetRef},
    game::{
        ExecutionEngine, GameState, GameView, PassOutcome, PriorityStack, Step, TargetCandidate,
        VerbosityLevel,
    },
    loader::CardLoader,
    EngineConfig,
};
use std::path::PathBuf;

/// Verbosity level for engine output (custom parser supporting both names and numbers)
#[derive(Debug, Clone, Copy)]
struct VerbosityArg(VerbosityLevel);

impl std::str::FromStr for VerbosityArg {
    type Err = String;

    fn from_str(s: &str) -> std::result::Result<Self, Self::Err> {
        match s.to_lowercase().as_str() {
            "silent" | "0" => Ok(VerbosityArg(VerbosityLevel::Silent)),
            "minimal" | "1" => Ok(VerbosityArg(VerbosityLevel::Minimal)),
            "normal" | "2" => Ok(VerbosityArg(VerbosityLevel::Normal)),
            "verbose" | "3" => Ok(VerbosityArg(VerbosityLevel::Verbose)),
            _ => Err(format!(
                "invalid verbosity level '{s}' (expected: silent/0, minimal/1, normal/2, verbose/3)"
            )),
        }
    }
}

impl From<VerbosityArg> for VerbosityLevel {
    fn from(arg: VerbosityArg) -> Self {
        arg.0
    }
}

#[derive(Parser)]
#[command(name = "oracle")]
#[command(about = "MTG Oracle Engine - oracle text parsing and stack resolution", long_about = None)]
struct Cli {
    /// Engine configuration file (JSON)
    #[arg(long, global = true, value_name = "CONFIG_FILE")]
    config: Option<PathBuf>,

    /// Verbosity level for engine output (0=silent, 1=minimal, 2=normal, 3=verbose)
    #[arg(long, short = 'v', global = true)]
    verbosity: Option<VerbosityArg>,

    #[command(subcommand)]
    command: Commands,
}

#[derive(Subcommand)]
enum Commands {
    /// Parse oracle text and print the abilities it contains
    Parse {
        /// Oracle text, e.g. "{T}: Add {G}."
        text: String,

        /// Card name the text refers to as itself
        #[arg(long)]
        name: Option<String>,

        /// Print abilities as JSON
        #[arg(long)]
        json: bool,
    },

    /// Load a card file (.txt) and print its characteristics and abilities
    Card {
        #[arg(value_name = "CARD_FILE")]
        file: PathBuf,

        /// Print abilities as JSON
        #[arg(long)]
        json: bool,
    },

    /// Cast an instant or sorcery from a card file in a two-player game and resolve it
    Cast {
        #[arg(value_name = "CARD_FILE")]
        file: PathBuf,

        /// Value chosen for X
        #[arg(long, short = 'x')]
        x_value: Option<u32>,
    },
}

fn main() -> anyhow::Result<()> {
    let cli = Cli::parse();

    let mut config = match &cli.config {
        Some(path) => EngineConfig::from_file(path)
            .with_context(|| format!("loading config {}", path.display()))?,
        None => EngineConfig::default(),
    };
    if let Some(verbosity) = cli.verbosity {
        config.verbosity = verbosity.into();
    }

    match cli.command {
        Commands::Parse { text, name, json } => run_parse(&config, &text, name.as_deref(), json),
        Commands::Card { file, json } => run_card(&config, file, json),
        Commands::Cast { file, x_value } => run_cast(&config, file, x_value),
    }
}

fn run_parse(
    config: &EngineConfig,
    text: &str,
    name: Option<&str>,
    json: bool,
) -> anyhow::Result<()> {
    let mut parser = config.build_parser();
    let source = EntityId::new(1);
    let abilities = match name {
        Some(name) => parser.parse_card(text, name, source),
        None => parser.parse(text, source),
    };

    if json {
        println!("{}", serde_json::to_string_pretty(&abilities)?);
        return Ok(());
    }
    if abilities.is_empty() {
        println!("No abilities recognized");
    }
    for ability in &abilities {
        println!("{ability}");
    }
    Ok(())
}

fn run_card(config: &EngineConfig, file: PathBuf, json: bool) -> anyhow::Result<()> {
    let definition = CardLoader::load_from_file(&file)
        .with_context(|| format!("loading card {}", file.display()))?;
    let mut parser = config.build_parser();
    let loaded = definition.build(EntityId::new(1), EntityId::new(1), &mut parser);

    if json {
        println!("{}", serde_json::to_string_pretty(&loaded.abilities)?);
        if let Some(spell) = &loaded.spell {
            println!("{}", serde_json::to_string_pretty(spell)?);
        }
        return Ok(());
    }

    let card = &loaded.card;
    println!("{} {}", card.name, card.mana_cost);
    let types: Vec<String> = card.types.iter().map(|t| format!("{t:?}")).collect();
    let subtypes: Vec<String> = card.subtypes.iter().map(|s| s.to_string()).collect();
    if subtypes.is_empty() {
        println!("{}", types.join(" "));
    } else {
        println!("{} - {}", types.join(" "), subtypes.join(" "));
    }
    if let (Some(power), Some(toughness)) = (card.power, card.toughness) {
        println!("{power}/{toughness}");
    }
    if !card.keywords.is_empty() {
        let keywords: Vec<String> = card.keywords.iter().map(|k| k.to_string()).collect();
        println!("Keywords: {}", keywords.join(", "));
    }
    for ability in &loaded.abilities {
        println!("  {ability}");
    }
    if let Some(spell) = &loaded.spell {
        let effects: Vec<String> = spell.effects.iter().map(|e| e.to_string()).collect();
        println!("  [Spell] {}", effects.join("; "));
    }
    Ok(())
}

fn run_cast(config: &EngineConfig, file: PathBuf, x_value: Option<u32>) -> anyhow::Result<()> {
    let definition = CardLoader::load_from_file(&file)
        .with_context(|| format!("loading card {}", file.display()))?;

    let mut game = GameState::new_two_player("Alice", "Bob", config.starting_life)
        .with_logger(config.build_logger());
    game.set_step(Step::Main1);
    let caster = game.active_player();

    let mut parser = config.build_parser();
    let card_id = game.next_card_id();
    let loaded = definition.build(card_id, caster, &mut parser);
    game.cards.insert(card_id, loaded.card);
    let Some(spell) = loaded.spell else {
        bail!("{} is not an instant or sorcery with parsed effects", definition.name);
    };

    // Float exactly the mana the spell needs
    let Some(cost) = spell.mana_cost.with_x(x_value.unwrap_or(0)) else {
        bail!("X = {} is more mana than a cost can hold", x_value.unwrap_or(0));
    };
    let player = game.get_player_mut(caster)?;
    for color in Color::WUBRG {
        player.mana_pool.add(color, cost.amount_of(color));
    }
    player
        .mana_pool
        .add(Color::Colorless, cost.generic.saturating_add(cost.colorless));

    let mut engine = ExecutionEngine::new(Default::default(), config.build_validator());
    let targets = choose_targets(&engine, spell.targets(), caster, &spell.mana_cost.colors(), &game);
    let mut stack = PriorityStack::for_game(&game)?.with_logger(config.build_logger());
    let item = stack.cast_spell(spell, caster, targets, x_value, &engine, &mut game)?;
    println!("Cast {} as {}", definition.name, item);

    loop {
        let holder = stack.priority_holder();
        match stack.pass_priority(holder, &mut engine, &mut game)? {
            PassOutcome::Passed { .. } => continue,
            PassOutcome::Resolved(outcome) => {
                println!("{outcome:?}");
                break;
            }
            PassOutcome::StackEmpty => break,
        }
    }
    game.check_state_based_actions()?;

    for player in &game.players {
        println!("{}: {} life", player.name, player.life);
    }
    Ok(())
}

/// Pick a legal target for every slot, preferring objects the caster doesn't control
fn choose_targets<'t>(
    engine: &ExecutionEngine,
    requirements: impl Iterator<Item = &'t Target>,
    caster: PlayerId,
    source_colors: &[Color],
    game: &GameState,
) -> Vec<TargetRef> {
    let Some(player) = game.player(caster) else {
        return Vec::new();
    };
    let mut candidates = TargetCandidate::all(game);
    candidates.sort_by_key(|c| c.reference == TargetRef::Player(caster) || c.controller == Some(caster));

    let mut chosen = Vec::new();
    for target in requirements.filter(|t| t.required) {
        for _ in 0..target.count {
            let pick = candidates.iter().find(|c| {
                !chosen.contains(&c.reference)
                    && engine
                        .validator()
                        .validate_from_source(c, target, player, source_colors)
                        .legal
            });
            if let Some(candidate) = pick {
                chosen.push(candidate.reference);
            }
        }
    }
    chosen
}
