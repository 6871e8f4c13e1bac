//! Cost grammar for activated abilities
//!
//! The cost is everything before the colon of "[Cost]: [Effect]". Fragments
//! are comma-separated; each is either a run of bracketed symbols or one of
//! the worded costs below. Anything else is kept verbatim in `Cost::other`.

use crate::core::Cost;
use crate::parser::numbers::word_to_number;
use nom::{
    branch::alt,
    bytes::complete::{tag_no_case, take_while1},
    character::complete::{char, digit1, space0, space1},
    combinator::{all_consuming, map, map_res},
    multi::many1,
    sequence::{delimited, preceded, terminated, tuple},
    IResult,
};

/// One comma-separated piece of a cost
#[derive(Debug, Clone, PartialEq, Eq)]
enum CostPart<'a> {
    Symbols(Vec<&'a str>),
    SacrificeSelf,
    Discard(u8),
    Life(i32),
}

/// A single `{...}` symbol, returning its contents
pub fn symbol(input: &str) -> IResult<&str, &str> {
    delimited(char('{'), take_while1(|c: char| c != '}'), char('}'))(input)
}

/// A run of symbols, optionally space separated ("{2}{G}", "{T}")
pub fn symbols(input: &str) -> IResult<&str, Vec<&str>> {
    many1(preceded(space0, symbol))(input)
}

fn self_reference(input: &str) -> IResult<&str, &str> {
    alt((
        tag_no_case("this permanent"),
        tag_no_case("this creature"),
        tag_no_case("this artifact"),
        tag_no_case("this land"),
        tag_no_case("this enchantment"),
    ))(input)
}

fn sacrifice_self(input: &str) -> IResult<&str, CostPart<'_>> {
    map(
        preceded(tuple((tag_no_case("sacrifice"), space1)), self_reference),
        |_| CostPart::SacrificeSelf,
    )(input)
}

fn discard(input: &str) -> IResult<&str, CostPart<'_>> {
    let (input, _) = tuple((tag_no_case("discard"), space1))(input)?;
    let (input, count) = map_res(take_while1(|c: char| c.is_ascii_alphanumeric()), |w: &str| {
        w.parse::<i32>()
            .ok()
            .or_else(|| word_to_number(w))
            .and_then(|n| u8::try_from(n).ok())
            .ok_or(())
    })(input)?;
    let (input, _) = preceded(space1, alt((tag_no_case("cards"), tag_no_case("card"))))(input)?;
    Ok((input, CostPart::Discard(count)))
}

fn pay_life(input: &str) -> IResult<&str, CostPart<'_>> {
    map(
        delimited(
            tuple((tag_no_case("pay"), space1)),
            map_res(digit1, str::parse::<i32>),
            tuple((space1, tag_no_case("life"))),
        ),
        CostPart::Life,
    )(input)
}

fn cost_part(input: &str) -> IResult<&str, CostPart<'_>> {
    all_consuming(terminated(
        alt((
            map(symbols, CostPart::Symbols),
            sacrifice_self,
            discard,
            pay_life,
        )),
        space0,
    ))(input)
}

/// Parse the cost half of an activated ability
///
/// Never fails: unrecognized fragments land in `other`.
pub fn parse_cost(text: &str) -> Cost {
    let mut cost = Cost::new();
    for fragment in text.split(',').map(str::trim).filter(|f| !f.is_empty()) {
        match cost_part(fragment) {
            Ok((_, CostPart::Symbols(symbols))) => {
                for symbol in symbols {
                    if symbol.eq_ignore_ascii_case("t") {
                        cost.tap = true;
                    } else if symbol.eq_ignore_ascii_case("q") {
                        cost.other.push("{Q}".to_string());
                    } else {
                        cost.mana.add_symbol(symbol);
                    }
                }
            }
            Ok((_, CostPart::SacrificeSelf)) => cost.sacrifice = true,
            Ok((_, CostPart::Discard(n))) => cost.discard = cost.discard.saturating_add(n),
            Ok((_, CostPart::Life(n))) => cost.life += n,
            Err(_) => cost.other.push(fragment.to_string()),
        }
    }
    cost
}

/// Every `{...}` symbol in a piece of text, in order
pub fn symbols_in(text: &str) -> Vec<&str> {
    let mut found = Vec::new();
    let mut remaining = text;
    while let Some(start) = remaining.find('{') {
        match symbol(&remaining[start..]) {
            Ok((rest_input, sym)) => {
                found.push(sym);
                remaining = rest_input;
            }
            Err(_) => remaining = &remaining[start + 1..],
        }
    }
    found
}

/// Whether a string could be the cost half of "[Cost]: [Effect]"
pub fn looks_like_cost(text: &str) -> bool {
    let text = text.trim();
    if text.is_empty() {
        return false;
    }
    text.split(',').map(str::trim).all(|fragment| {
        cost_part(fragment).is_ok() || starts_with_cost_verb(fragment)
    })
}

fn starts_with_cost_verb(fragment: &str) -> bool {
    let verb: IResult<&str, &str> = alt((
        tag_no_case("sacrifice "),
        tag_no_case("discard "),
        tag_no_case("pay "),
        tag_no_case("exile "),
        tag_no_case("remove "),
        tag_no_case("tap "),
        tag_no_case("return "),
    ))(fragment);
    verb.is_ok()
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_tap_and_mana() {
        let cost = parse_cost("{1}{R}, {T}");
        assert!(cost.tap);
        assert_eq!(cost.mana.generic, 1);
        assert_eq!(cost.mana.red, 1);
        assert!(cost.other.is_empty());
    }

    #[test]
    fn test_x_cost() {
        let cost = parse_cost("{X}{U}{U}");
        assert_eq!(cost.mana.x, 1);
        assert_eq!(cost.mana.blue, 2);
        assert!(!cost.tap);
    }

    #[test]
    fn test_worded_costs() {
        let cost = parse_cost("{T}, Sacrifice this permanent");
        assert!(cost.tap);
        assert!(cost.sacrifice);

        let cost = parse_cost("Discard two cards, Pay 2 life");
        assert_eq!(cost.discard, 2);
        assert_eq!(cost.life, 2);
    }

    #[test]
    fn test_unstructured_costs_are_kept() {
        let cost = parse_cost("{1}, Remove a +1/+1 counter from this creature");
        assert_eq!(cost.mana.generic, 1);
        assert_eq!(cost.other, vec!["Remove a +1/+1 counter from this creature"]);
    }

    #[test]
    fn test_symbols_in() {
        assert_eq!(symbols_in("Add {R}{G} or {C}."), vec!["R", "G", "C"]);
        assert!(symbols_in("Add one mana").is_empty());
    }

    #[test]
    fn test_looks_like_cost() {
        assert!(looks_like_cost("{2}{G}, {T}"));
        assert!(looks_like_cost("Sacrifice a creature"));
        assert!(!looks_like_cost("Choose one"));
        assert!(!looks_like_cost(""));
    }
}
