//! Enhanced target pass
//!
//! After an ability is matched, its oracle text is scanned again for target
//! phrases ("target nonartifact creature with power 2 or less an opponent
//! controls") and the restrictions found are attached to the effects' target
//! slots. The pass only ever adds detail: when the phrases found do not line
//! up with the ability's target slots, the ability keeps its basic targets.

use crate::core::{
    Ability, CardType, Color, Comparison, ControlRelation, Keyword, RestrictionKind, Target,
    TargetRestriction, TargetType,
};
use crate::parser::numbers::parse_amount;

/// A word of oracle text and whether punctuation ended the clause after it
#[derive(Debug, Clone, Copy)]
struct Word<'a> {
    text: &'a str,
    lower_ascii: bool,
    boundary: bool,
}

impl<'a> Word<'a> {
    fn is(&self, other: &str) -> bool {
        self.text.eq_ignore_ascii_case(other)
    }

    fn is_capitalized(&self) -> bool {
        self.text.chars().next().is_some_and(|c| c.is_ascii_uppercase())
    }
}

fn words(text: &str) -> Vec<Word<'_>> {
    text.split_whitespace()
        .map(|raw| {
            let trimmed = raw.trim_end_matches([',', '.', ';', ':']);
            Word {
                text: trimmed,
                lower_ascii: trimmed.chars().all(|c| !c.is_ascii_uppercase()),
                boundary: trimmed.len() != raw.len(),
            }
        })
        .collect()
}

/// Every target phrase in `text`, in order of appearance
pub fn target_phrases(text: &str) -> Vec<Target> {
    let words = words(text);
    let mut targets = Vec::new();
    for (i, word) in words.iter().enumerate() {
        if !(word.is("target") || word.is("targets")) {
            continue;
        }
        if i > 0 && words[i - 1].is("any") {
            targets.push(Target::new(TargetType::Any));
            continue;
        }
        if word.boundary {
            continue;
        }
        if let Some(target) = scan_phrase(&words[i + 1..]) {
            targets.push(target);
        }
    }
    targets
}

/// The restriction an adjective word stands for ("nonartifact", "tapped", "Elf")
fn adjective(word: &Word<'_>) -> Option<TargetRestriction> {
    let lower = word.text.to_ascii_lowercase();
    if let Some(rest) = lower.strip_prefix("non") {
        let rest = rest.trim_start_matches('-');
        if let Some(card_type) = CardType::from_word(rest) {
            return Some(TargetRestriction::negated(RestrictionKind::CardType(card_type)));
        }
        if let Some(color) = Color::from_word(rest) {
            return Some(TargetRestriction::negated(RestrictionKind::Color(color)));
        }
        if !rest.is_empty() && rest.chars().all(|c| c.is_ascii_alphabetic()) && !word.lower_ascii {
            let original = &word.text[word.text.len() - rest.len()..];
            return Some(TargetRestriction::negated(RestrictionKind::Subtype(
                original.to_string(),
            )));
        }
    }
    match lower.as_str() {
        "tapped" => return Some(TargetRestriction::new(RestrictionKind::Tapped)),
        "untapped" => return Some(TargetRestriction::new(RestrictionKind::Untapped)),
        "attacking" | "blocking" | "other" | "another" => {
            return Some(TargetRestriction::new(RestrictionKind::Other(lower)))
        }
        _ => {}
    }
    if let Some(color) = Color::from_word(&lower) {
        return Some(TargetRestriction::new(RestrictionKind::Color(color)));
    }
    if word.is_capitalized() && TargetType::from_noun(&lower).is_none() {
        return Some(TargetRestriction::new(RestrictionKind::Subtype(
            word.text.to_string(),
        )));
    }
    None
}

fn scan_phrase(words: &[Word<'_>]) -> Option<Target> {
    let mut restrictions = Vec::new();
    let mut i = 0;

    // Adjectives up to the noun
    let target_type = loop {
        let word = words.get(i)?;
        let lower = word.text.to_ascii_lowercase();
        let next_is_noun = words
            .get(i + 1)
            .is_some_and(|w| TargetType::from_noun(w.text).is_some());

        if let Some(noun) = TargetType::from_noun(&lower) {
            // "artifact creature": a type word followed by a noun is an adjective
            if next_is_noun && !word.boundary {
                if let Some(card_type) = CardType::from_word(&lower) {
                    restrictions.push(TargetRestriction::new(RestrictionKind::CardType(card_type)));
                    i += 1;
                    continue;
                }
            }
            i += 1;
            break combine_or(noun, words, &mut i, &mut restrictions);
        }
        if word.boundary {
            return None;
        }
        restrictions.push(adjective(word)?);
        i += 1;
    };

    if !words[i - 1].boundary {
        scan_tail(&words[i..], &mut restrictions);
    }

    let mut target = Target::new(target_type);
    target.restrictions = restrictions;
    Some(target)
}

/// "creature or player", "creature or planeswalker"
fn combine_or(
    noun: TargetType,
    words: &[Word<'_>],
    i: &mut usize,
    restrictions: &mut Vec<TargetRestriction>,
) -> TargetType {
    let prev = &words[*i - 1];
    if prev.boundary || !words.get(*i).is_some_and(|w| w.is("or")) {
        return noun;
    }
    let Some(other) = words.get(*i + 1).and_then(|w| TargetType::from_noun(w.text)) else {
        return noun;
    };
    *i += 2;
    match (noun, other) {
        (TargetType::Creature, TargetType::Player) | (TargetType::Player, TargetType::Creature) => {
            TargetType::CreatureOrPlayer
        }
        (a, b) => {
            restrictions.push(TargetRestriction::new(RestrictionKind::Other(format!(
                "{a} or {b}"
            ))));
            TargetType::Permanent
        }
    }
}

fn comparison(words: &[Word<'_>]) -> Option<(Comparison, i32, usize)> {
    let n = parse_amount(words.first()?.text)?;
    let trailing = words.get(1).zip(words.get(2));
    match trailing {
        Some((or, bound)) if or.is("or") && (bound.is("less") || bound.is("fewer")) => {
            Some((Comparison::LessOrEqual, n, 3))
        }
        Some((or, bound)) if or.is("or") && (bound.is("greater") || bound.is("more")) => {
            Some((Comparison::GreaterOrEqual, n, 3))
        }
        _ => Some((Comparison::Equal, n, 1)),
    }
}

/// "with power 2 or less", "with flying", "you control", "an opponent controls"
fn scan_tail(words: &[Word<'_>], restrictions: &mut Vec<TargetRestriction>) {
    let mut i = 0;
    while let Some(word) = words.get(i) {
        let consumed = if word.is("with") || word.is("without") {
            let negated = word.is("without");
            let rest = &words[i + 1..];
            match with_clause(rest) {
                Some((kind, used)) => {
                    restrictions.push(TargetRestriction { kind, negated });
                    used + 1
                }
                None => break,
            }
        } else if word.is("you") && words.get(i + 1).is_some_and(|w| w.is("control")) {
            restrictions.push(TargetRestriction::new(RestrictionKind::Controller(
                ControlRelation::You,
            )));
            2
        } else if word.is("you")
            && words.get(i + 1).is_some_and(|w| w.is("don't"))
            && words.get(i + 2).is_some_and(|w| w.is("control"))
        {
            restrictions.push(TargetRestriction::negated(RestrictionKind::Controller(
                ControlRelation::You,
            )));
            3
        } else if (word.is("an") || word.is("your"))
            && words.get(i + 1).is_some_and(|w| w.is("opponent") || w.is("opponents"))
            && words.get(i + 2).is_some_and(|w| w.is("controls") || w.is("control"))
        {
            restrictions.push(TargetRestriction::new(RestrictionKind::Controller(
                ControlRelation::Opponent,
            )));
            3
        } else {
            break;
        };
        let last = i + consumed - 1;
        if words.get(last).is_some_and(|w| w.boundary) {
            break;
        }
        i += consumed;
    }
}

fn with_clause(words: &[Word<'_>]) -> Option<(RestrictionKind, usize)> {
    let first = words.first()?;
    if first.is("power") {
        let (cmp, n, used) = comparison(&words[1..])?;
        return Some((RestrictionKind::Power(cmp, n), used + 1));
    }
    if first.is("toughness") {
        let (cmp, n, used) = comparison(&words[1..])?;
        return Some((RestrictionKind::Toughness(cmp, n), used + 1));
    }
    if first.is("mana") && words.get(1).is_some_and(|w| w.is("value")) {
        let (cmp, n, used) = comparison(&words[2..])?;
        return Some((RestrictionKind::ManaValue(cmp, n), used + 2));
    }
    if let Some(second) = words.get(1) {
        let two = format!("{} {}", first.text, second.text);
        if let Some(keyword) = Keyword::parse(&two) {
            return Some((RestrictionKind::Keyword(keyword), 2));
        }
    }
    let keyword = Keyword::parse(first.text)?;
    Some((RestrictionKind::Keyword(keyword), 1))
}

/// Attach restriction data from the oracle text to the ability's target slots
///
/// Returns whether any slot gained restrictions. Slots whose basic type does
/// not agree with the phrase found are left alone.
pub fn enhance_targets(ability: &mut Ability) -> bool {
    let phrases = target_phrases(&ability.oracle_text);
    let slots: usize = ability.effects.iter().map(|e| e.targets.len()).sum();
    if phrases.is_empty() || phrases.len() != slots {
        return false;
    }

    let mut phrases = phrases.into_iter();
    let mut enhanced = false;
    for effect in &mut ability.effects {
        let mut changed = false;
        for slot in &mut effect.targets {
            let Some(phrase) = phrases.next() else {
                break;
            };
            if phrase.target_type == slot.target_type && !phrase.restrictions.is_empty() {
                slot.restrictions = phrase.restrictions;
                changed = true;
            }
        }
        if changed {
            effect.refresh_description();
            enhanced = true;
        }
    }
    enhanced
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_any_target() {
        let targets = target_phrases("this permanent deals 2 damage to any target");
        assert_eq!(targets, vec![Target::new(TargetType::Any)]);
    }

    #[test]
    fn test_negated_type_and_power() {
        let targets =
            target_phrases("Destroy target nonartifact creature with power 2 or less");
        assert_eq!(targets.len(), 1);
        let target = &targets[0];
        assert_eq!(target.target_type, TargetType::Creature);
        assert_eq!(
            target.restrictions,
            vec![
                TargetRestriction::negated(RestrictionKind::CardType(CardType::Artifact)),
                TargetRestriction::new(RestrictionKind::Power(Comparison::LessOrEqual, 2)),
            ]
        );
    }

    #[test]
    fn test_controller_and_keyword() {
        let targets = target_phrases("Tap target creature with flying an opponent controls.");
        assert_eq!(
            targets[0].restrictions,
            vec![
                TargetRestriction::new(RestrictionKind::Keyword(Keyword::Flying)),
                TargetRestriction::new(RestrictionKind::Controller(ControlRelation::Opponent)),
            ]
        );
    }

    #[test]
    fn test_subtype_and_color() {
        let targets = target_phrases("target black Zombie creature you control gets +1/+1");
        assert_eq!(
            targets[0].restrictions,
            vec![
                TargetRestriction::new(RestrictionKind::Color(Color::Black)),
                TargetRestriction::new(RestrictionKind::Subtype("Zombie".to_string())),
                TargetRestriction::new(RestrictionKind::Controller(ControlRelation::You)),
            ]
        );
    }

    #[test]
    fn test_type_adjective_before_noun() {
        let targets = target_phrases("Destroy target artifact creature");
        assert_eq!(targets[0].target_type, TargetType::Creature);
        assert_eq!(
            targets[0].restrictions,
            vec![TargetRestriction::new(RestrictionKind::CardType(CardType::Artifact))]
        );
    }

    #[test]
    fn test_creature_or_player() {
        let targets = target_phrases("deals 1 damage to target creature or player");
        assert_eq!(targets[0].target_type, TargetType::CreatureOrPlayer);
    }

    #[test]
    fn test_unrecognized_phrase_is_skipped() {
        assert!(target_phrases("Return target 17 to nowhere").is_empty());
    }
}
