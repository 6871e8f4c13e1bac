//! Number words in oracle text

use crate::core::VARIABLE_AMOUNT;

const NUMBER_WORDS: [(&str, i32); 23] = [
    ("a", 1),
    ("an", 1),
    ("one", 1),
    ("two", 2),
    ("three", 3),
    ("four", 4),
    ("five", 5),
    ("six", 6),
    ("seven", 7),
    ("eight", 8),
    ("nine", 9),
    ("ten", 10),
    ("eleven", 11),
    ("twelve", 12),
    ("thirteen", 13),
    ("fourteen", 14),
    ("fifteen", 15),
    ("sixteen", 16),
    ("seventeen", 17),
    ("eighteen", 18),
    ("nineteen", 19),
    ("twenty", 20),
    ("zero", 0),
];

/// Look up a spelled-out number ("two" -> 2)
pub fn word_to_number(word: &str) -> Option<i32> {
    let word = word.trim();
    NUMBER_WORDS
        .iter()
        .find(|(name, _)| name.eq_ignore_ascii_case(word))
        .map(|&(_, value)| value)
}

/// Parse an amount written as digits, a number word or X
///
/// X yields [`VARIABLE_AMOUNT`]. Anything else is `None`, which aborts the
/// pattern attempt that captured it.
pub fn parse_amount(text: &str) -> Option<i32> {
    let text = text.trim();
    if text.eq_ignore_ascii_case("x") {
        return Some(VARIABLE_AMOUNT);
    }
    if let Ok(n) = text.parse::<i32>() {
        return Some(n);
    }
    word_to_number(text)
}

/// Parse a signed pump component ("+2", "-1", "+X")
pub fn parse_signed(text: &str) -> Option<i32> {
    let text = text.trim();
    let (sign, digits) = match text.strip_prefix('-') {
        Some(rest) => (-1, rest),
        None => (1, text.strip_prefix('+').unwrap_or(text)),
    };
    if digits.eq_ignore_ascii_case("x") {
        return None;
    }
    digits.parse::<i32>().ok().map(|n| sign * n)
}
