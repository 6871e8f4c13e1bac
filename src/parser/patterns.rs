//! Ordered pattern table
//!
//! Patterns are grouped by ability type and tried in a fixed order: groups
//! in the order of [`default_groups`], then patterns in list order within a
//! group. The first pattern whose build step succeeds wins the sentence.

use crate::core::{
    AbilityType, Color, ControlRelation, Cost, Duration, Effect, EffectType, Keyword,
    RestrictionKind, Target, TargetRestriction, TargetType, TimingRestriction, TriggerCondition,
};
use crate::parser::costs::{looks_like_cost, parse_cost, symbols_in};
use crate::parser::numbers::{parse_amount, parse_signed, word_to_number};
use regex::{Captures, Regex};
use std::sync::LazyLock;

/// A matched sentence before it is given an identity and a source
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct AbilityDraft {
    pub name: String,
    pub ability_type: AbilityType,
    pub cost: Cost,
    pub effects: Vec<Effect>,
    pub trigger: Option<TriggerCondition>,
    pub timing: TimingRestriction,
    /// Targets exclude the ability's own source ("other Elf creatures")
    pub excludes_source: bool,
}

impl AbilityDraft {
    fn new(ability_type: AbilityType, cost: Cost, effects: Vec<Effect>) -> Self {
        let name = effects
            .first()
            .map(|e| e.description.clone())
            .unwrap_or_default();
        AbilityDraft {
            name,
            ability_type,
            cost,
            effects,
            trigger: None,
            timing: TimingRestriction::default(),
            excludes_source: false,
        }
    }
}

type BuildFn = fn(&Captures<'_>) -> Option<AbilityDraft>;

/// One recognized phrasing
pub struct Pattern {
    pub name: &'static str,
    regex: &'static LazyLock<Regex>,
    build: BuildFn,
}

impl Pattern {
    /// A structural match followed by a successful build
    pub fn try_match(&self, sentence: &str) -> Option<AbilityDraft> {
        let caps = self.regex.captures(sentence)?;
        (self.build)(&caps)
    }
}

/// Patterns for one ability type, in the order they are tried
pub struct PatternGroup {
    pub ability_type: AbilityType,
    pub patterns: Vec<Pattern>,
}

fn pattern(name: &'static str, regex: &'static LazyLock<Regex>, build: BuildFn) -> Pattern {
    Pattern { name, regex, build }
}

/// The built-in table: Mana, Activated, Triggered, Static, Replacement, Spell
pub fn default_groups() -> Vec<PatternGroup> {
    vec![
        PatternGroup {
            ability_type: AbilityType::Mana,
            patterns: vec![
                pattern("mana-any-color", &MANA_ANY_COLOR, build_mana_any_color),
                pattern("mana-choice", &MANA_CHOICE, build_mana_choice),
                pattern("mana-fixed", &MANA_FIXED, build_mana_fixed),
            ],
        },
        PatternGroup {
            ability_type: AbilityType::Activated,
            patterns: vec![pattern("activated", &ACTIVATED, build_activated)],
        },
        PatternGroup {
            ability_type: AbilityType::Triggered,
            patterns: vec![
                pattern("etb-trigger", &ETB_TRIGGER, build_etb),
                pattern("dies-trigger", &DIES_TRIGGER, build_dies),
                pattern("ltb-trigger", &LTB_TRIGGER, build_ltb),
                pattern("attacks-trigger", &ATTACKS_TRIGGER, build_attacks),
                pattern("upkeep-trigger", &UPKEEP_TRIGGER, build_upkeep),
            ],
        },
        PatternGroup {
            ability_type: AbilityType::Static,
            patterns: vec![
                pattern("lord-pump", &LORD_PUMP, build_lord),
                pattern("keywords", &KEYWORD_LINE, build_keywords),
            ],
        },
        PatternGroup {
            ability_type: AbilityType::Replacement,
            patterns: vec![pattern("enters-tapped", &ENTERS_TAPPED, build_enters_tapped)],
        },
        PatternGroup {
            ability_type: AbilityType::Spell,
            patterns: vec![
                pattern("modal", &MODAL, build_modal),
                pattern("spell-effect", &SPELL_EFFECT, build_spell),
            ],
        },
    ]
}

// Mana abilities

static MANA_ANY_COLOR: LazyLock<Regex> = LazyLock::new(|| {
    Regex::new(r"(?i)^(?P<cost>[^:]+):\s*add (?P<n>\w+) mana of any (?:one )?color$").unwrap()
});
static MANA_CHOICE: LazyLock<Regex> = LazyLock::new(|| {
    Regex::new(r"(?i)^(?P<cost>[^:]+):\s*add (?P<syms>\{[wubrgc]\}(?:,? (?:or )?\{[wubrgc]\})+)$")
        .unwrap()
});
static MANA_FIXED: LazyLock<Regex> = LazyLock::new(|| {
    Regex::new(r"(?i)^(?P<cost>[^:]+):\s*add (?P<syms>(?:\{[wubrgc]\})+)$").unwrap()
});

fn mana_cost(caps: &Captures<'_>) -> Option<Cost> {
    let text = caps.name("cost")?.as_str();
    looks_like_cost(text).then(|| parse_cost(text))
}

fn build_mana_any_color(caps: &Captures<'_>) -> Option<AbilityDraft> {
    let cost = mana_cost(caps)?;
    let n = parse_amount(caps.name("n")?.as_str())?;
    let effect = Effect::add_mana(n).with_description(format!("add {n} mana of any color"));
    Some(AbilityDraft::new(AbilityType::Mana, cost, vec![effect]))
}

fn build_mana_choice(caps: &Captures<'_>) -> Option<AbilityDraft> {
    let cost = mana_cost(caps)?;
    let choices = symbols_in(caps.name("syms")?.as_str()).join(" or ");
    let effect = Effect::add_mana(1).with_description(format!("add one of {choices}"));
    Some(AbilityDraft::new(AbilityType::Mana, cost, vec![effect]))
}

fn build_mana_fixed(caps: &Captures<'_>) -> Option<AbilityDraft> {
    let cost = mana_cost(caps)?;
    let symbols = symbols_in(caps.name("syms")?.as_str());
    let effect = Effect::add_mana(symbols.len() as i32)
        .with_description(format!("add {{{}}}", symbols.join("}{")));
    Some(AbilityDraft::new(AbilityType::Mana, cost, vec![effect]))
}

// Activated abilities

static ACTIVATED: LazyLock<Regex> =
    LazyLock::new(|| Regex::new(r"(?i)^(?P<cost>[^:]+):\s*(?P<effect>.+)$").unwrap());

fn build_activated(caps: &Captures<'_>) -> Option<AbilityDraft> {
    let cost_text = caps.name("cost")?.as_str();
    if !looks_like_cost(cost_text) {
        return None;
    }
    let effects = effect_clause(caps.name("effect")?.as_str())?;
    Some(AbilityDraft::new(
        AbilityType::Activated,
        parse_cost(cost_text),
        effects,
    ))
}

// Triggered abilities

const SELF: &str = r"(?:this permanent|this creature|this artifact|this enchantment|it)";

static ETB_TRIGGER: LazyLock<Regex> = LazyLock::new(|| {
    Regex::new(&format!(
        r"(?i)^(?:when|whenever) {SELF} enters(?: the battlefield)?(?: under your control)?, (?P<effect>.+)$"
    ))
    .unwrap()
});
static DIES_TRIGGER: LazyLock<Regex> = LazyLock::new(|| {
    Regex::new(&format!(
        r"(?i)^(?:when|whenever) {SELF} dies, (?P<effect>.+)$"
    ))
    .unwrap()
});
static LTB_TRIGGER: LazyLock<Regex> = LazyLock::new(|| {
    Regex::new(&format!(
        r"(?i)^(?:when|whenever) {SELF} leaves the battlefield, (?P<effect>.+)$"
    ))
    .unwrap()
});
static ATTACKS_TRIGGER: LazyLock<Regex> = LazyLock::new(|| {
    Regex::new(&format!(
        r"(?i)^whenever {SELF} attacks, (?P<effect>.+)$"
    ))
    .unwrap()
});
static UPKEEP_TRIGGER: LazyLock<Regex> = LazyLock::new(|| {
    Regex::new(r"(?i)^at the beginning of (?:your|each) upkeep, (?P<effect>.+)$").unwrap()
});

fn triggered(caps: &Captures<'_>, trigger: TriggerCondition) -> Option<AbilityDraft> {
    let effects = effect_clause(caps.name("effect")?.as_str())?;
    let mut draft = AbilityDraft::new(AbilityType::Triggered, Cost::new(), effects);
    draft.trigger = Some(trigger);
    Some(draft)
}

fn build_etb(caps: &Captures<'_>) -> Option<AbilityDraft> {
    triggered(caps, TriggerCondition::EntersTheBattlefield)
}

fn build_dies(caps: &Captures<'_>) -> Option<AbilityDraft> {
    triggered(caps, TriggerCondition::Dies)
}

fn build_ltb(caps: &Captures<'_>) -> Option<AbilityDraft> {
    triggered(caps, TriggerCondition::LeavesTheBattlefield)
}

fn build_attacks(caps: &Captures<'_>) -> Option<AbilityDraft> {
    triggered(caps, TriggerCondition::Attacks)
}

fn build_upkeep(caps: &Captures<'_>) -> Option<AbilityDraft> {
    triggered(caps, TriggerCondition::BeginningOfUpkeep)
}

// Static abilities

static LORD_PUMP: LazyLock<Regex> = LazyLock::new(|| {
    Regex::new(
        r"(?i)^(?P<other>other )?(?:(?P<subtype>[a-z]+) )?creatures you control get (?P<p>[+-]\d+)/(?P<t>[+-]\d+)$",
    )
    .unwrap()
});
static KEYWORD_LINE: LazyLock<Regex> =
    LazyLock::new(|| Regex::new(r"(?i)^[a-z ]+(?:, [a-z ]+)*$").unwrap());

fn build_lord(caps: &Captures<'_>) -> Option<AbilityDraft> {
    let power = parse_signed(caps.name("p")?.as_str())?;
    let toughness = parse_signed(caps.name("t")?.as_str())?;

    let mut target = Target::new(TargetType::Creature)
        .optional()
        .with_restriction(TargetRestriction::new(RestrictionKind::Controller(
            ControlRelation::You,
        )));
    if let Some(word) = caps.name("subtype").map(|m| m.as_str()) {
        let kind = match Color::from_word(word) {
            Some(color) => RestrictionKind::Color(color),
            None => RestrictionKind::Subtype(word.to_string()),
        };
        target = target.with_restriction(TargetRestriction::new(kind));
    }
    let effect = Effect::pump(power, toughness, Duration::Permanent)?.with_target(target);
    let mut draft = AbilityDraft::new(AbilityType::Static, Cost::new(), vec![effect]);
    draft.excludes_source = caps.name("other").is_some();
    Some(draft)
}

fn build_keywords(caps: &Captures<'_>) -> Option<AbilityDraft> {
    let line = caps.get(0)?.as_str();
    let effects = line
        .split(',')
        .map(|piece| {
            let keyword = Keyword::parse(piece)?;
            Some(Effect::new(EffectType::GrantKeyword, 1)
                .with_duration(Duration::Permanent)
                .with_description(format!("grant {keyword}")))
        })
        .collect::<Option<Vec<_>>>()?;
    Some(AbilityDraft::new(AbilityType::Static, Cost::new(), effects))
}

/// The keyword a GrantKeyword effect gives
pub fn granted_keyword(effect: &Effect) -> Option<Keyword> {
    if effect.effect_type != EffectType::GrantKeyword {
        return None;
    }
    effect
        .description
        .strip_prefix("grant ")
        .and_then(Keyword::parse)
}

// Replacement effects

static ENTERS_TAPPED: LazyLock<Regex> = LazyLock::new(|| {
    Regex::new(&format!(
        r"(?i)^{SELF} enters(?: the battlefield)? tapped$"
    ))
    .unwrap()
});

fn build_enters_tapped(_caps: &Captures<'_>) -> Option<AbilityDraft> {
    let effect = Effect::new(EffectType::EntersTapped, 1).with_description("enters tapped");
    Some(AbilityDraft::new(
        AbilityType::Replacement,
        Cost::new(),
        vec![effect],
    ))
}

// Spell instructions

static MODAL: LazyLock<Regex> = LazyLock::new(|| {
    Regex::new(r"(?i)^choose (?P<n>one or more|one or both|one|two|three)\s*-*\s*(?P<modes>.*)$")
        .unwrap()
});
static SPELL_EFFECT: LazyLock<Regex> =
    LazyLock::new(|| Regex::new(r"(?i)^(?P<effect>.+)$").unwrap());

/// Modal spells are parsed coarsely: the first mode stands for the spell
fn build_modal(caps: &Captures<'_>) -> Option<AbilityDraft> {
    let count_text = caps.name("n")?.as_str();
    let count = word_to_number(count_text.split_whitespace().next()?).unwrap_or(1);
    let modes = caps.name("modes").map(|m| m.as_str()).unwrap_or_default();
    let first_mode = modes.split(';').map(str::trim).find(|m| !m.is_empty());

    let effects = first_mode.and_then(effect_clause).unwrap_or_else(|| {
        vec![Effect::new(EffectType::Modal, count)
            .with_description(format!("choose {count_text}"))]
    });
    let mut draft = AbilityDraft::new(AbilityType::Spell, Cost::new(), effects);
    draft.name = format!("Choose {count_text}: {}", draft.name);
    Some(draft)
}

fn build_spell(caps: &Captures<'_>) -> Option<AbilityDraft> {
    let effects = effect_clause(caps.name("effect")?.as_str())?;
    Some(AbilityDraft::new(AbilityType::Spell, Cost::new(), effects))
}

// Effect clauses shared by every group

struct ClauseRule {
    regex: &'static LazyLock<Regex>,
    build: fn(&Captures<'_>) -> Option<Effect>,
}

static DRAW: LazyLock<Regex> = LazyLock::new(|| {
    Regex::new(r"(?i)^(?:(?P<who>target player|you) )?draws? (?P<n>\w+) cards?$").unwrap()
});
static DAMAGE: LazyLock<Regex> = LazyLock::new(|| {
    Regex::new(&format!(
        r"(?i)^(?:{SELF} )?deals? (?P<n>\w+) damage to (?P<target>.+)$"
    ))
    .unwrap()
});
static GAIN_LIFE: LazyLock<Regex> =
    LazyLock::new(|| Regex::new(r"(?i)^(?:you )?gains? (?P<n>\w+) life$").unwrap());
static LOSE_LIFE: LazyLock<Regex> = LazyLock::new(|| {
    Regex::new(r"(?i)^(?P<who>target player|target opponent|you) loses? (?P<n>\w+) life$").unwrap()
});
static PUMP: LazyLock<Regex> = LazyLock::new(|| {
    Regex::new(&format!(
        r"(?i)^(?P<who>{SELF}|target .+?) gets? (?P<p>[+-]\w+)/(?P<t>[+-]\w+)(?: until end of (?P<until>turn|combat))?$"
    ))
    .unwrap()
});
static DESTROY: LazyLock<Regex> =
    LazyLock::new(|| Regex::new(r"(?i)^destroy (?P<target>target .+)$").unwrap());
static COUNTER: LazyLock<Regex> =
    LazyLock::new(|| Regex::new(r"(?i)^counter (?P<target>target .+)$").unwrap());
static TAP: LazyLock<Regex> = LazyLock::new(|| {
    Regex::new(r"(?i)^tap (?P<target>(?:up to \w+ )?target .+)$").unwrap()
});
static UNTAP: LazyLock<Regex> = LazyLock::new(|| {
    Regex::new(&format!(
        r"(?i)^untap (?P<target>(?:up to \w+ )?target .+|{SELF})$"
    ))
    .unwrap()
});
static MILL: LazyLock<Regex> = LazyLock::new(|| {
    Regex::new(r"(?i)^(?:(?P<who>target player|you) )?mills? (?P<n>\w+) cards?$").unwrap()
});
static EXILE: LazyLock<Regex> =
    LazyLock::new(|| Regex::new(r"(?i)^exile (?P<target>target .+)$").unwrap());
static RETURN_TO_HAND: LazyLock<Regex> = LazyLock::new(|| {
    Regex::new(r"(?i)^return (?P<target>target .+?) to (?:its|their) owner'?s'? hands?$").unwrap()
});
static CREATE_TOKEN: LazyLock<Regex> = LazyLock::new(|| {
    Regex::new(r"(?i)^create (?P<n>\w+) (?P<what>.+?) tokens?$").unwrap()
});

static CLAUSES: [ClauseRule; 13] = [
    ClauseRule { regex: &DRAW, build: draw_clause },
    ClauseRule { regex: &DAMAGE, build: damage_clause },
    ClauseRule { regex: &GAIN_LIFE, build: gain_life_clause },
    ClauseRule { regex: &LOSE_LIFE, build: lose_life_clause },
    ClauseRule { regex: &PUMP, build: pump_clause },
    ClauseRule { regex: &DESTROY, build: destroy_clause },
    ClauseRule { regex: &COUNTER, build: counter_clause },
    ClauseRule { regex: &TAP, build: tap_clause },
    ClauseRule { regex: &UNTAP, build: untap_clause },
    ClauseRule { regex: &MILL, build: mill_clause },
    ClauseRule { regex: &EXILE, build: exile_clause },
    ClauseRule { regex: &RETURN_TO_HAND, build: return_clause },
    ClauseRule { regex: &CREATE_TOKEN, build: token_clause },
];

/// Parse an effect clause ("draw two cards", "you gain 2 life and draw a card")
pub fn effect_clause(text: &str) -> Option<Vec<Effect>> {
    let text = text.trim().trim_end_matches('.');
    let text = strip_prefix_ignore_case(text, "you may ").unwrap_or(text);

    if let Some(effect) = single_clause(text) {
        return Some(vec![effect]);
    }
    for separator in [", then ", ", and ", " and "] {
        let Some((first, second)) = text.split_once(separator) else {
            continue;
        };
        if let (Some(mut effects), Some(rest)) = (effect_clause(first), effect_clause(second)) {
            effects.extend(rest);
            return Some(effects);
        }
    }
    None
}

fn strip_prefix_ignore_case<'a>(text: &'a str, prefix: &str) -> Option<&'a str> {
    let head = text.get(..prefix.len())?;
    head.eq_ignore_ascii_case(prefix).then(|| &text[prefix.len()..])
}

fn single_clause(text: &str) -> Option<Effect> {
    CLAUSES.iter().find_map(|rule| {
        let caps = rule.regex.captures(text)?;
        (rule.build)(&caps)
    })
}

/// Basic target of a phrase: only the noun, restrictions come later
pub fn basic_target(phrase: &str) -> Option<Target> {
    let phrase = phrase.trim().to_ascii_lowercase();
    if phrase == "any target" {
        return Some(Target::new(TargetType::Any));
    }

    let (optional, count, rest) = match phrase.strip_prefix("up to ") {
        Some(rest) => {
            let (n, rest) = rest.split_once(' ')?;
            let n = u8::try_from(parse_amount(n)?).ok()?;
            (true, n, rest)
        }
        None => (false, 1, phrase.as_str()),
    };
    let rest = rest
        .strip_prefix("target ")
        .or_else(|| rest.strip_prefix("targets "))?;

    if rest.starts_with("creature or player") || rest.starts_with("player or creature") {
        return Some(Target::new(TargetType::CreatureOrPlayer));
    }
    let target_type = rest
        .split_whitespace()
        .map(|w| w.trim_end_matches([',', '.']))
        .find_map(TargetType::from_noun)?;

    let mut target = Target::new(target_type).with_count(count);
    if optional {
        target = target.optional();
    }
    Some(target)
}

fn amount(caps: &Captures<'_>) -> Option<i32> {
    parse_amount(caps.name("n")?.as_str())
}

fn player_target(caps: &Captures<'_>) -> Option<Target> {
    match caps.name("who")?.as_str().to_ascii_lowercase().as_str() {
        "target player" => Some(Target::new(TargetType::Player)),
        "target opponent" => Some(Target::new(TargetType::Opponent)),
        _ => None,
    }
}

fn with_optional_target(effect: Effect, target: Option<Target>) -> Effect {
    match target {
        Some(target) => effect.with_target(target),
        None => effect,
    }
}

fn draw_clause(caps: &Captures<'_>) -> Option<Effect> {
    let effect = Effect::draw_cards(amount(caps)?);
    Some(with_optional_target(effect, player_target(caps)))
}

fn damage_clause(caps: &Captures<'_>) -> Option<Effect> {
    let target = basic_target(caps.name("target")?.as_str())?;
    Some(Effect::deal_damage(amount(caps)?, target))
}

fn gain_life_clause(caps: &Captures<'_>) -> Option<Effect> {
    Some(Effect::gain_life(amount(caps)?))
}

fn lose_life_clause(caps: &Captures<'_>) -> Option<Effect> {
    let effect = Effect::new(EffectType::LoseLife, amount(caps)?);
    Some(with_optional_target(effect, player_target(caps)))
}

fn pump_clause(caps: &Captures<'_>) -> Option<Effect> {
    let power = parse_signed(caps.name("p")?.as_str())?;
    let toughness = parse_signed(caps.name("t")?.as_str())?;
    let duration = match caps.name("until").map(|m| m.as_str().to_ascii_lowercase()) {
        Some(until) if until == "combat" => Duration::UntilEndOfCombat,
        _ => Duration::UntilEndOfTurn,
    };
    let who = caps.name("who")?.as_str();
    let target = if who.to_ascii_lowercase().starts_with("target") {
        Some(basic_target(who)?)
    } else {
        None
    };
    Some(with_optional_target(
        Effect::pump(power, toughness, duration)?,
        target,
    ))
}

fn targeted(effect_type: EffectType, caps: &Captures<'_>) -> Option<Effect> {
    let target = basic_target(caps.name("target")?.as_str())?;
    Some(Effect::new(effect_type, 1).with_target(target))
}

fn destroy_clause(caps: &Captures<'_>) -> Option<Effect> {
    targeted(EffectType::Destroy, caps)
}

fn counter_clause(caps: &Captures<'_>) -> Option<Effect> {
    let effect = targeted(EffectType::CounterSpell, caps)?;
    (effect.targets.first()?.target_type == TargetType::Spell).then_some(effect)
}

fn tap_clause(caps: &Captures<'_>) -> Option<Effect> {
    targeted(EffectType::Tap, caps)
}

fn untap_clause(caps: &Captures<'_>) -> Option<Effect> {
    let phrase = caps.name("target")?.as_str();
    if phrase.to_ascii_lowercase().contains("target") {
        targeted(EffectType::Untap, caps)
    } else {
        Some(Effect::new(EffectType::Untap, 1))
    }
}

fn mill_clause(caps: &Captures<'_>) -> Option<Effect> {
    let effect = Effect::new(EffectType::Mill, amount(caps)?);
    Some(with_optional_target(effect, player_target(caps)))
}

fn exile_clause(caps: &Captures<'_>) -> Option<Effect> {
    targeted(EffectType::Exile, caps)
}

fn return_clause(caps: &Captures<'_>) -> Option<Effect> {
    targeted(EffectType::ReturnToHand, caps)
}

fn token_clause(caps: &Captures<'_>) -> Option<Effect> {
    let what = caps.name("what")?.as_str();
    Some(Effect::new(EffectType::CreateToken, amount(caps)?).with_description(format!(
        "create {} {what} token(s)",
        caps.name("n")?.as_str()
    )))
}
