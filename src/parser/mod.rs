//! Oracle text parser
//!
//! Best-effort conversion of card rules text into [`Ability`] values. Text is
//! normalized, split into sentences, and each sentence is offered to a
//! [`SentenceMatcher`]. Sentences nobody recognizes produce nothing; they are
//! logged at verbose level and never reported as errors.

pub mod costs;
pub mod numbers;
pub mod patterns;
pub mod sentences;
pub mod targeting;

use crate::core::{
    Ability, AbilityIdGenerator, CardId, Effect, RestrictionKind, TargetRestriction, UsageLimit,
};
use crate::game::logger::{EngineLogger, VerbosityLevel};
use patterns::{default_groups, AbilityDraft, PatternGroup};
use regex::Regex;
use std::sync::LazyLock;

pub use patterns::granted_keyword;

/// Turns one sentence into at most one ability
///
/// The matching strategy is swappable without touching the data model or
/// the engine.
pub trait SentenceMatcher {
    fn match_sentence(
        &self,
        sentence: &str,
        source: CardId,
        ids: &mut AbilityIdGenerator,
    ) -> Option<Ability>;
}

/// Regex pattern table matcher
pub struct RegexMatcher {
    groups: Vec<PatternGroup>,
}

impl RegexMatcher {
    pub fn new() -> Self {
        RegexMatcher {
            groups: default_groups(),
        }
    }

    pub fn with_groups(groups: Vec<PatternGroup>) -> Self {
        RegexMatcher { groups }
    }

    /// Pattern names in the order they are tried
    pub fn pattern_order(&self) -> Vec<&'static str> {
        self.groups
            .iter()
            .flat_map(|g| g.patterns.iter().map(|p| p.name))
            .collect()
    }

    /// First draft produced by the table for this sentence
    pub fn draft(&self, sentence: &str) -> Option<AbilityDraft> {
        self.groups
            .iter()
            .flat_map(|group| group.patterns.iter())
            .find_map(|pattern| pattern.try_match(sentence))
    }
}

impl Default for RegexMatcher {
    fn default() -> Self {
        Self::new()
    }
}

impl SentenceMatcher for RegexMatcher {
    fn match_sentence(
        &self,
        sentence: &str,
        source: CardId,
        ids: &mut AbilityIdGenerator,
    ) -> Option<Ability> {
        let mut draft = self.draft(sentence)?;
        if draft.excludes_source {
            exclude_source(&mut draft.effects, source);
        }
        let mut ability = Ability::new(
            ids.next_id(),
            draft.name,
            draft.ability_type,
            source,
            draft.cost,
            draft.effects,
        )
        .ok()?
        .with_timing(draft.timing)
        .with_oracle_text(sentence);
        ability.trigger = draft.trigger;
        ability.parsed = true;
        Some(ability)
    }
}

/// Keep every target of `effects` off the source permanent itself
fn exclude_source(effects: &mut [Effect], source: CardId) {
    for effect in effects {
        for target in &mut effect.targets {
            target
                .restrictions
                .push(TargetRestriction::negated(RestrictionKind::Card(source)));
        }
        effect.refresh_description();
    }
}

static ACTIVATION_RESTRICTION: LazyLock<Regex> = LazyLock::new(|| {
    Regex::new(r"(?i)^activate (?:this ability )?only (?P<when>.+)$").unwrap()
});

/// Parses oracle text into abilities
pub struct OracleParser {
    matcher: Box<dyn SentenceMatcher>,
    ids: AbilityIdGenerator,
    enhanced_targeting: bool,
    logger: EngineLogger,
}

impl OracleParser {
    pub fn new() -> Self {
        Self::with_matcher(Box::new(RegexMatcher::new()))
    }

    pub fn with_matcher(matcher: Box<dyn SentenceMatcher>) -> Self {
        OracleParser {
            matcher,
            ids: AbilityIdGenerator::new(),
            enhanced_targeting: true,
            logger: EngineLogger::with_verbosity(VerbosityLevel::Silent),
        }
    }

    pub fn with_logger(mut self, logger: EngineLogger) -> Self {
        self.logger = logger;
        self
    }

    pub fn logger(&self) -> &EngineLogger {
        &self.logger
    }

    pub fn set_enhanced_targeting(&mut self, enabled: bool) {
        self.enhanced_targeting = enabled;
    }

    /// Parse free-standing oracle text
    pub fn parse(&mut self, text: &str, source: CardId) -> Vec<Ability> {
        let normalized = sentences::normalize(text, None);
        self.parse_normalized(&normalized, source)
    }

    /// Parse a card's oracle text, treating its own name as "this permanent"
    pub fn parse_card(&mut self, text: &str, card_name: &str, source: CardId) -> Vec<Ability> {
        let normalized = sentences::normalize(text, Some(card_name));
        self.parse_normalized(&normalized, source)
    }

    fn parse_normalized(&mut self, text: &str, source: CardId) -> Vec<Ability> {
        let mut abilities: Vec<Ability> = Vec::new();

        for sentence in sentences::split_sentences(text) {
            if let Some(caps) = ACTIVATION_RESTRICTION.captures(&sentence) {
                let when = caps.name("when").map(|m| m.as_str()).unwrap_or_default();
                let target = abilities
                    .iter_mut()
                    .rev()
                    .find(|a| a.ability_type.is_activatable());
                if let Some(ability) = target {
                    if apply_restriction(ability, when) {
                        continue;
                    }
                }
            }

            match self.matcher.match_sentence(&sentence, source, &mut self.ids) {
                Some(mut ability) => {
                    if self.enhanced_targeting && targeting::enhance_targets(&mut ability) {
                        log_if_verbose!(self.logger, "enhanced targets for '{}'", sentence);
                    }
                    self.logger.event(
                        VerbosityLevel::Verbose,
                        "parser",
                        &format!("parsed {ability}"),
                    );
                    abilities.push(ability);
                }
                None => {
                    log_if_verbose!(self.logger, "no pattern matched: '{}'", sentence);
                }
            }
        }
        abilities
    }
}

impl Default for OracleParser {
    fn default() -> Self {
        Self::new()
    }
}

/// Annotate an activated ability with an "Activate only ..." sentence
fn apply_restriction(ability: &mut Ability, when: &str) -> bool {
    let when = when.to_ascii_lowercase();
    let mut applied = false;
    if when.contains("as a sorcery") || when.contains("any time you could cast a sorcery") {
        ability.timing.sorcery_speed = true;
        applied = true;
    }
    if when.contains("during combat") {
        ability.timing.combat_only = true;
        applied = true;
    }
    if when.contains("during your turn") {
        ability.timing.your_turn_only = true;
        applied = true;
    }
    if when.contains("once each turn") {
        ability.usage_limit = UsageLimit {
            per_turn: Some(1),
            ..ability.usage_limit
        };
        applied = true;
    }
    applied
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::core::{AbilityType, EffectType, EntityId, TriggerCondition};

    fn source() -> CardId {
        EntityId::new(1)
    }

    #[test]
    fn test_tap_for_mana() {
        let mut parser = OracleParser::new();
        let abilities = parser.parse("{T}: Add {G}.", source());

        assert_eq!(abilities.len(), 1);
        let ability = &abilities[0];
        assert_eq!(ability.ability_type, AbilityType::Mana);
        assert!(ability.cost.tap);
        assert_eq!(ability.effects.len(), 1);
        assert_eq!(ability.effects[0].effect_type, EffectType::AddMana);
        assert_eq!(ability.effects[0].magnitude, 1);
        assert!(ability.parsed);
        assert!(!ability.id.is_nil());
    }

    #[test]
    fn test_etb_trigger() {
        let mut parser = OracleParser::new();
        let abilities =
            parser.parse("When this creature enters the battlefield, draw a card.", source());

        assert_eq!(abilities.len(), 1);
        assert_eq!(abilities[0].ability_type, AbilityType::Triggered);
        assert_eq!(abilities[0].trigger, Some(TriggerCondition::EntersTheBattlefield));
        assert_eq!(abilities[0].effects[0].effect_type, EffectType::DrawCards);
        assert_eq!(abilities[0].effects[0].magnitude, 1);
    }

    #[test]
    fn test_unrecognized_text_is_not_an_error() {
        let mut parser = OracleParser::new().with_logger(EngineLogger::capturing());
        let abilities = parser.parse("Whenever the moon is full, howl.", source());
        assert!(abilities.is_empty());
        assert_eq!(parser.logger().count_matching("no pattern matched"), 1);
    }

    #[test]
    fn test_activation_restriction_annotates_previous() {
        let mut parser = OracleParser::new();
        let abilities = parser.parse(
            "{1}: this creature gets +1/+1 until end of turn. Activate only once each turn.",
            source(),
        );
        assert_eq!(abilities.len(), 1);
        assert_eq!(abilities[0].usage_limit.per_turn, Some(1));

        let abilities = parser.parse(
            "{T}: Draw a card. Activate only as a sorcery.",
            source(),
        );
        assert!(abilities[0].timing.sorcery_speed);
    }

    #[test]
    fn test_card_name_becomes_self_reference() {
        let mut parser = OracleParser::new();
        let abilities = parser.parse_card(
            "{T}: Prodigal Pyromancer deals 1 damage to any target.",
            "Prodigal Pyromancer",
            source(),
        );
        assert_eq!(abilities.len(), 1);
        assert_eq!(abilities[0].effects[0].effect_type, EffectType::DealDamage);
    }

    #[test]
    fn test_enhanced_targeting_can_be_disabled() {
        let text = "Destroy target nonblack creature.";
        let mut parser = OracleParser::new();
        let enhanced = parser.parse(text, source());
        assert_eq!(enhanced[0].effects[0].targets[0].restrictions.len(), 1);

        parser.set_enhanced_targeting(false);
        let basic = parser.parse(text, source());
        assert!(basic[0].effects[0].targets[0].restrictions.is_empty());
    }
}
