//! Target restriction evaluator
//!
//! Checks, in order and short-circuiting: the candidate's basic category,
//! untargetability (shroud, hexproof, protection), then every restriction.
//! A restriction that needs a capability the candidate does not have is not
//! satisfied. `RestrictionKind::Other` is always satisfied.

use crate::core::{
    Card, CardType, Color, ControlRelation, Keyword, Player, PlayerId, RestrictionKind, Spell,
    StackItemId, Subtype, Target, TargetRef, TargetRestriction, TargetType,
};
use crate::game::interfaces::GameView;

/// Read-only view of something that could be targeted
///
/// Capabilities the object does not have are `None`.
#[derive(Debug, Clone, PartialEq)]
pub struct TargetCandidate {
    pub reference: TargetRef,
    pub controller: Option<PlayerId>,
    pub controller_name: Option<String>,
    pub types: Option<Vec<CardType>>,
    pub subtypes: Option<Vec<Subtype>>,
    pub colors: Option<Vec<Color>>,
    pub keywords: Option<Vec<Keyword>>,
    pub power: Option<i32>,
    pub toughness: Option<i32>,
    pub mana_value: Option<i32>,
    pub tapped: Option<bool>,
    /// Player name, for players
    pub player_name: Option<String>,
}

impl TargetCandidate {
    pub fn from_player(player: &Player) -> Self {
        TargetCandidate {
            reference: TargetRef::Player(player.id),
            controller: None,
            controller_name: None,
            types: None,
            subtypes: None,
            colors: None,
            keywords: None,
            power: None,
            toughness: None,
            mana_value: None,
            tapped: None,
            player_name: Some(player.name.to_string()),
        }
    }

    pub fn from_card(card: &Card, controller_name: Option<&str>) -> Self {
        TargetCandidate {
            reference: TargetRef::Permanent(card.id),
            controller: Some(card.controller),
            controller_name: controller_name.map(str::to_string),
            types: Some(card.types.to_vec()),
            subtypes: Some(card.subtypes.to_vec()),
            colors: Some(card.colors.to_vec()),
            keywords: Some(card.keywords.clone()),
            power: card.current_power(),
            toughness: card.current_toughness(),
            mana_value: Some(card.mana_cost.cmc() as i32),
            tapped: Some(card.tapped),
            player_name: None,
        }
    }

    pub fn from_spell(
        item: StackItemId,
        spell: &Spell,
        controller: PlayerId,
        controller_name: Option<&str>,
    ) -> Self {
        TargetCandidate {
            reference: TargetRef::Spell(item),
            controller: Some(controller),
            controller_name: controller_name.map(str::to_string),
            types: Some(spell.types.to_vec()),
            subtypes: None,
            colors: Some(spell.mana_cost.colors()),
            keywords: None,
            power: None,
            toughness: None,
            mana_value: Some(spell.mana_cost.cmc() as i32),
            tapped: None,
            player_name: None,
        }
    }

    /// Look up a chosen target; `None` if it no longer exists where it was
    pub fn resolve<G: GameView + ?Sized>(target: TargetRef, game: &G) -> Option<TargetCandidate> {
        let name_of = |id: PlayerId| game.player(id).map(|p| p.name.to_string());
        match target {
            TargetRef::Player(id) => game.player(id).map(TargetCandidate::from_player),
            TargetRef::Permanent(id) => {
                if !game.is_on_battlefield(id) {
                    return None;
                }
                let card = game.card(id)?;
                Some(TargetCandidate::from_card(
                    card,
                    name_of(card.controller).as_deref(),
                ))
            }
            TargetRef::Spell(item) => {
                let (spell, controller) = game.spell(item)?;
                Some(TargetCandidate::from_spell(
                    item,
                    spell,
                    controller,
                    name_of(controller).as_deref(),
                ))
            }
        }
    }

    /// Every player, permanent and spell in the game
    pub fn all<G: GameView + ?Sized>(game: &G) -> Vec<TargetCandidate> {
        let players = game.players().into_iter().map(TargetRef::Player);
        let permanents = game.battlefield().into_iter().map(TargetRef::Permanent);
        let spells = game.stack_spells().into_iter().map(TargetRef::Spell);
        players
            .chain(permanents)
            .chain(spells)
            .filter_map(|r| TargetCandidate::resolve(r, game))
            .collect()
    }

    fn has_type(&self, card_type: CardType) -> bool {
        self.types.as_ref().is_some_and(|t| t.contains(&card_type))
    }

    fn has_keyword(&self, keyword: &Keyword) -> bool {
        self.keywords.as_ref().is_some_and(|k| k.contains(keyword))
    }
}

/// Outcome of a legality check
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct TargetVerdict {
    pub legal: bool,
    pub reason: String,
}

impl TargetVerdict {
    pub fn legal() -> Self {
        TargetVerdict {
            legal: true,
            reason: String::new(),
        }
    }

    pub fn illegal(reason: impl Into<String>) -> Self {
        TargetVerdict {
            legal: false,
            reason: reason.into(),
        }
    }
}

/// Predicates deciding whether an object cannot be targeted
pub trait UntargetabilityRules {
    /// Untargetable by anything
    fn has_shroud(&self, candidate: &TargetCandidate) -> bool;

    /// Untargetable by anyone except its controller
    fn has_hexproof(&self, candidate: &TargetCandidate) -> bool;

    fn is_protected_from(&self, candidate: &TargetCandidate, source_colors: &[Color]) -> bool;
}

/// Shroud, hexproof and protection are not modeled: nothing is untargetable
#[derive(Debug, Clone, Copy, Default)]
pub struct DefaultUntargetability;

impl UntargetabilityRules for DefaultUntargetability {
    fn has_shroud(&self, _candidate: &TargetCandidate) -> bool {
        false
    }

    fn has_hexproof(&self, _candidate: &TargetCandidate) -> bool {
        false
    }

    fn is_protected_from(&self, _candidate: &TargetCandidate, _source_colors: &[Color]) -> bool {
        false
    }
}

/// Untargetability read from the candidate's keywords
#[derive(Debug, Clone, Copy, Default)]
pub struct KeywordUntargetability;

impl UntargetabilityRules for KeywordUntargetability {
    fn has_shroud(&self, candidate: &TargetCandidate) -> bool {
        candidate.has_keyword(&Keyword::Shroud)
    }

    fn has_hexproof(&self, candidate: &TargetCandidate) -> bool {
        candidate.has_keyword(&Keyword::Hexproof)
    }

    fn is_protected_from(&self, candidate: &TargetCandidate, source_colors: &[Color]) -> bool {
        source_colors
            .iter()
            .any(|c| candidate.has_keyword(&Keyword::ProtectionFrom(*c)))
    }
}

pub struct TargetValidator {
    rules: Box<dyn UntargetabilityRules>,
}

impl TargetValidator {
    pub fn new(rules: Box<dyn UntargetabilityRules>) -> Self {
        TargetValidator { rules }
    }

    pub fn with_keyword_rules() -> Self {
        Self::new(Box::new(KeywordUntargetability))
    }

    /// Validate a candidate for a colorless source
    pub fn validate(
        &self,
        candidate: &TargetCandidate,
        target: &Target,
        controller: &Player,
    ) -> TargetVerdict {
        self.validate_from_source(candidate, target, controller, &[])
    }

    pub fn validate_from_source(
        &self,
        candidate: &TargetCandidate,
        target: &Target,
        controller: &Player,
        source_colors: &[Color],
    ) -> TargetVerdict {
        if !category_matches(candidate, target.target_type, controller) {
            return TargetVerdict::illegal(format!(
                "{} is not a legal {}",
                candidate.reference, target.target_type
            ));
        }

        if self.rules.has_shroud(candidate) {
            return TargetVerdict::illegal(format!("{} has shroud", candidate.reference));
        }
        let controlled_by_caster = candidate.controller == Some(controller.id);
        if !controlled_by_caster && self.rules.has_hexproof(candidate) {
            return TargetVerdict::illegal(format!("{} has hexproof", candidate.reference));
        }
        if self.rules.is_protected_from(candidate, source_colors) {
            return TargetVerdict::illegal(format!(
                "{} has protection from the source",
                candidate.reference
            ));
        }

        for restriction in &target.restrictions {
            if !restriction_holds(candidate, restriction, controller) {
                return TargetVerdict::illegal(format!(
                    "{} fails restriction '{}'",
                    candidate.reference, restriction
                ));
            }
        }
        TargetVerdict::legal()
    }

    /// Whether any candidate is a legal choice for `target`
    pub fn has_legal_target(
        &self,
        target: &Target,
        controller: &Player,
        candidates: &[TargetCandidate],
        source_colors: &[Color],
    ) -> bool {
        candidates
            .iter()
            .any(|c| self.validate_from_source(c, target, controller, source_colors).legal)
    }
}

impl Default for TargetValidator {
    fn default() -> Self {
        Self::new(Box::new(DefaultUntargetability))
    }
}

impl std::fmt::Debug for TargetValidator {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("TargetValidator").finish_non_exhaustive()
    }
}

fn category_matches(candidate: &TargetCandidate, target_type: TargetType, controller: &Player) -> bool {
    let is_player = matches!(candidate.reference, TargetRef::Player(_));
    let is_permanent = matches!(candidate.reference, TargetRef::Permanent(_));
    match target_type {
        TargetType::Any => {
            is_player
                || (is_permanent
                    && (candidate.has_type(CardType::Creature)
                        || candidate.has_type(CardType::Planeswalker)))
        }
        TargetType::CreatureOrPlayer => {
            is_player || (is_permanent && candidate.has_type(CardType::Creature))
        }
        TargetType::Player => is_player,
        TargetType::Opponent => is_player && candidate.reference != TargetRef::Player(controller.id),
        TargetType::Permanent => is_permanent,
        TargetType::Spell => matches!(candidate.reference, TargetRef::Spell(_)),
        TargetType::Creature => is_permanent && candidate.has_type(CardType::Creature),
        TargetType::Artifact => is_permanent && candidate.has_type(CardType::Artifact),
        TargetType::Enchantment => is_permanent && candidate.has_type(CardType::Enchantment),
        TargetType::Land => is_permanent && candidate.has_type(CardType::Land),
        TargetType::Planeswalker => is_permanent && candidate.has_type(CardType::Planeswalker),
    }
}

/// `None` when the candidate lacks the capability the restriction reads
fn evaluate(candidate: &TargetCandidate, kind: &RestrictionKind, controller: &Player) -> Option<bool> {
    let result = match kind {
        RestrictionKind::CardType(t) => candidate.types.as_ref()?.contains(t),
        RestrictionKind::Subtype(s) => candidate.subtypes.as_ref()?.iter().any(|x| x.matches(s)),
        RestrictionKind::Keyword(k) => candidate.keywords.as_ref()?.contains(k),
        RestrictionKind::Power(cmp, n) => cmp.holds(candidate.power?, *n),
        RestrictionKind::Toughness(cmp, n) => cmp.holds(candidate.toughness?, *n),
        RestrictionKind::ManaValue(cmp, n) => cmp.holds(candidate.mana_value?, *n),
        RestrictionKind::Controller(relation) => {
            let is_yours = candidate.controller_name.as_deref()? == controller.name.as_str();
            match relation {
                ControlRelation::You => is_yours,
                ControlRelation::Opponent => !is_yours,
            }
        }
        RestrictionKind::Color(c) => candidate.colors.as_ref()?.contains(c),
        RestrictionKind::Tapped => candidate.tapped?,
        RestrictionKind::Untapped => !candidate.tapped?,
        RestrictionKind::Card(card) => candidate.reference == TargetRef::Permanent(*card),
        RestrictionKind::Other(_) => true,
    };
    Some(result)
}

fn restriction_holds(
    candidate: &TargetCandidate,
    restriction: &TargetRestriction,
    controller: &Player,
) -> bool {
    if matches!(restriction.kind, RestrictionKind::Other(_)) {
        return true;
    }
    match evaluate(candidate, &restriction.kind, controller) {
        Some(holds) => holds != restriction.negated,
        None => false,
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::core::{Comparison, EntityId};

    fn alice() -> Player {
        Player::new(EntityId::new(1), "Alice", 20)
    }

    fn bob() -> Player {
        Player::new(EntityId::new(2), "Bob", 20)
    }

    fn bears(controller: &Player) -> TargetCandidate {
        let mut card = Card::new(EntityId::new(10), "Grizzly Bears", controller.id);
        card.types.push(CardType::Creature);
        card.colors.push(Color::Green);
        card.power = Some(2);
        card.toughness = Some(2);
        TargetCandidate::from_card(&card, Some(controller.name.as_str()))
    }

    #[test]
    fn test_category_check_comes_first() {
        let validator = TargetValidator::default();
        let verdict = validator.validate(
            &TargetCandidate::from_player(&bob()),
            &Target::new(TargetType::Creature),
            &alice(),
        );
        assert!(!verdict.legal);
        assert!(verdict.reason.contains("not a legal creature"));
    }

    #[test]
    fn test_restrictions_are_conjunctive() {
        let validator = TargetValidator::default();
        let target = Target::new(TargetType::Creature)
            .with_restriction(TargetRestriction::new(RestrictionKind::Power(
                Comparison::LessOrEqual,
                2,
            )))
            .with_restriction(TargetRestriction::new(RestrictionKind::Controller(
                ControlRelation::Opponent,
            )));

        assert!(validator.validate(&bears(&bob()), &target, &alice()).legal);
        assert!(!validator.validate(&bears(&alice()), &target, &alice()).legal);
    }

    #[test]
    fn test_missing_capability_fails_closed() {
        let validator = TargetValidator::default();
        let target = Target::new(TargetType::Any).with_restriction(TargetRestriction::negated(
            RestrictionKind::Power(Comparison::Greater, 5),
        ));
        let verdict = validator.validate(&TargetCandidate::from_player(&bob()), &target, &alice());
        assert!(!verdict.legal);
    }

    #[test]
    fn test_other_restriction_is_permissive() {
        let validator = TargetValidator::default();
        let target = Target::new(TargetType::Player)
            .with_restriction(TargetRestriction::new(RestrictionKind::Other("attacking".into())));
        assert!(validator.validate(&TargetCandidate::from_player(&bob()), &target, &alice()).legal);
    }

    #[test]
    fn test_default_rules_ignore_hexproof() {
        let mut candidate = bears(&bob());
        candidate.keywords = Some(vec![Keyword::Hexproof]);
        let target = Target::new(TargetType::Creature);

        assert!(TargetValidator::default().validate(&candidate, &target, &alice()).legal);
        let keyword_rules = TargetValidator::with_keyword_rules();
        assert!(!keyword_rules.validate(&candidate, &target, &alice()).legal);
        assert!(keyword_rules.validate(&candidate, &target, &bob()).legal);
    }

    #[test]
    fn test_protection_from_source_color() {
        let mut candidate = bears(&bob());
        candidate.keywords = Some(vec![Keyword::ProtectionFrom(Color::Red)]);
        let validator = TargetValidator::with_keyword_rules();
        let target = Target::new(TargetType::Creature);

        assert!(!validator
            .validate_from_source(&candidate, &target, &alice(), &[Color::Red])
            .legal);
        assert!(validator
            .validate_from_source(&candidate, &target, &alice(), &[Color::Blue])
            .legal);
    }
}
