//! Mana costs, mana pools and colors

use serde::{Deserialize, Serialize};
use std::fmt;

/// Mana colors
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
pub enum Color {
    White,
    Blue,
    Black,
    Red,
    Green,
    Colorless,
}

impl Color {
    /// The five colors in WUBRG order
    pub const WUBRG: [Color; 5] = [Color::White, Color::Blue, Color::Black, Color::Red, Color::Green];

    /// Parse a single mana symbol letter (case-insensitive)
    pub fn from_symbol(symbol: char) -> Option<Color> {
        match symbol.to_ascii_uppercase() {
            'W' => Some(Color::White),
            'U' => Some(Color::Blue),
            'B' => Some(Color::Black),
            'R' => Some(Color::Red),
            'G' => Some(Color::Green),
            'C' => Some(Color::Colorless),
            _ => None,
        }
    }

    /// Parse a color word as it appears in oracle text ("red", "nonblack" is handled by callers)
    pub fn from_word(word: &str) -> Option<Color> {
        match word.to_ascii_lowercase().as_str() {
            "white" => Some(Color::White),
            "blue" => Some(Color::Blue),
            "black" => Some(Color::Black),
            "red" => Some(Color::Red),
            "green" => Some(Color::Green),
            "colorless" => Some(Color::Colorless),
            _ => None,
        }
    }

    pub fn symbol(&self) -> char {
        match self {
            Color::White => 'W',
            Color::Blue => 'U',
            Color::Black => 'B',
            Color::Red => 'R',
            Color::Green => 'G',
            Color::Colorless => 'C',
        }
    }
}

impl fmt::Display for Color {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.symbol())
    }
}

/// Pool and cost slots, in the order generic mana is spent
const ALL_COLORS: [Color; 6] = [
    Color::White,
    Color::Blue,
    Color::Black,
    Color::Red,
    Color::Green,
    Color::Colorless,
];

/// A mana cost (e.g. "{2}{R}{R}" = 2 generic + 2 red)
///
/// `x` counts X symbols; their value is chosen when the spell is cast or the
/// ability is activated (see [`ManaCost::with_x`]).
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
pub struct ManaCost {
    pub generic: u8,
    pub white: u8,
    pub blue: u8,
    pub black: u8,
    pub red: u8,
    pub green: u8,
    pub colorless: u8,
    pub x: u8,
}

impl ManaCost {
    pub fn new() -> Self {
        Self::default()
    }

    /// Parse either bracketed oracle notation ("{2}{R}{R}", "{X}{G}") or the
    /// compact card-file notation ("2RR", "1 U B")
    pub fn from_string(s: &str) -> Self {
        let mut cost = ManaCost::new();

        if s.contains('{') {
            for symbol in s.split('{').skip(1) {
                let Some(symbol) = symbol.split('}').next() else {
                    continue;
                };
                cost.add_symbol(symbol);
            }
            return cost;
        }

        let mut generic_str = String::new();
        for c in s.chars() {
            match c {
                '0'..='9' => generic_str.push(c),
                'X' | 'x' => cost.x += 1,
                _ => {
                    if let Some(color) = Color::from_symbol(c) {
                        cost.add_color(color, 1);
                    }
                }
            }
        }
        if !generic_str.is_empty() {
            cost.generic = generic_str.parse().unwrap_or(0);
        }
        cost
    }

    /// Add one bracketed symbol's worth of mana ("2", "G", "X")
    pub fn add_symbol(&mut self, symbol: &str) {
        let symbol = symbol.trim();
        if let Ok(n) = symbol.parse::<u8>() {
            self.generic = self.generic.saturating_add(n);
        } else if symbol.eq_ignore_ascii_case("x") {
            self.x += 1;
        } else if let Some(color) = symbol.chars().next().and_then(Color::from_symbol) {
            if symbol.len() == 1 {
                self.add_color(color, 1);
            }
        }
    }

    pub fn add_color(&mut self, color: Color, amount: u8) {
        let slot = match color {
            Color::White => &mut self.white,
            Color::Blue => &mut self.blue,
            Color::Black => &mut self.black,
            Color::Red => &mut self.red,
            Color::Green => &mut self.green,
            Color::Colorless => &mut self.colorless,
        };
        *slot = slot.saturating_add(amount);
    }

    pub fn amount_of(&self, color: Color) -> u8 {
        match color {
            Color::White => self.white,
            Color::Blue => self.blue,
            Color::Black => self.black,
            Color::Red => self.red,
            Color::Green => self.green,
            Color::Colorless => self.colorless,
        }
    }

    /// Mana value; X counts as zero
    pub fn cmc(&self) -> u8 {
        ALL_COLORS
            .iter()
            .fold(self.generic, |sum, c| sum.saturating_add(self.amount_of(*c)))
    }

    pub fn has_x(&self) -> bool {
        self.x > 0
    }

    pub fn is_free(&self) -> bool {
        self.cmc() == 0 && !self.has_x()
    }

    /// Fix the value of X, folding it into the generic component
    ///
    /// `None` when the resulting generic amount does not fit in a cost.
    pub fn with_x(&self, x_value: u32) -> Option<ManaCost> {
        let extra = x_value
            .checked_mul(u32::from(self.x))
            .and_then(|n| u8::try_from(n).ok())?;
        Some(ManaCost {
            generic: self.generic.checked_add(extra)?,
            x: 0,
            ..*self
        })
    }

    /// The cost with X counted as zero
    pub fn without_x(&self) -> ManaCost {
        ManaCost { x: 0, ..*self }
    }

    /// Colors present in this cost, in WUBRG order
    pub fn colors(&self) -> Vec<Color> {
        Color::WUBRG
            .into_iter()
            .filter(|c| self.amount_of(*c) > 0)
            .collect()
    }
}

impl fmt::Display for ManaCost {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        for _ in 0..self.x {
            write!(f, "{{X}}")?;
        }
        if self.generic > 0 || (self.cmc() == 0 && self.x == 0) {
            write!(f, "{{{}}}", self.generic)?;
        }
        for color in ALL_COLORS {
            for _ in 0..self.amount_of(color) {
                write!(f, "{{{}}}", color.symbol())?;
            }
        }
        Ok(())
    }
}

/// Mana a player has floating
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
pub struct ManaPool {
    pub white: u8,
    pub blue: u8,
    pub black: u8,
    pub red: u8,
    pub green: u8,
    pub colorless: u8,
}

impl ManaPool {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn add(&mut self, color: Color, amount: u8) {
        let slot = self.slot_mut(color);
        *slot = slot.saturating_add(amount);
    }

    pub fn amount_of(&self, color: Color) -> u8 {
        match color {
            Color::White => self.white,
            Color::Blue => self.blue,
            Color::Black => self.black,
            Color::Red => self.red,
            Color::Green => self.green,
            Color::Colorless => self.colorless,
        }
    }

    fn slot_mut(&mut self, color: Color) -> &mut u8 {
        match color {
            Color::White => &mut self.white,
            Color::Blue => &mut self.blue,
            Color::Black => &mut self.black,
            Color::Red => &mut self.red,
            Color::Green => &mut self.green,
            Color::Colorless => &mut self.colorless,
        }
    }

    pub fn clear(&mut self) {
        *self = ManaPool::new();
    }

    /// Whether the pool covers `cost`; X must already be fixed with [`ManaCost::with_x`]
    pub fn can_pay(&self, cost: &ManaCost) -> bool {
        ALL_COLORS
            .iter()
            .all(|c| self.amount_of(*c) >= cost.amount_of(*c))
            && self.total() >= cost.cmc()
    }

    /// Spend mana for `cost`, colored symbols first
    ///
    /// Generic mana is taken in WUBRG order, colorless last. The pool is left
    /// untouched when it cannot cover the cost.
    pub fn pay_cost(&mut self, cost: &ManaCost) -> std::result::Result<(), String> {
        if !self.can_pay(cost) {
            return Err(format!("cannot pay {cost} from a pool of {self}"));
        }

        for color in ALL_COLORS {
            *self.slot_mut(color) -= cost.amount_of(color);
        }
        let mut generic = cost.generic;
        for color in ALL_COLORS {
            let slot = self.slot_mut(color);
            let used = generic.min(*slot);
            *slot -= used;
            generic -= used;
        }
        Ok(())
    }

    pub fn total(&self) -> u8 {
        ALL_COLORS
            .iter()
            .fold(0u8, |sum, c| sum.saturating_add(self.amount_of(*c)))
    }
}

impl fmt::Display for ManaPool {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        if self.total() == 0 {
            return write!(f, "nothing");
        }
        for color in ALL_COLORS {
            for _ in 0..self.amount_of(color) {
                write!(f, "{{{}}}", color.symbol())?;
            }
        }
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_bracketed_cost_parsing() {
        let cost = ManaCost::from_string("{2}{R}{R}");
        assert_eq!(cost.generic, 2);
        assert_eq!(cost.red, 2);
        assert_eq!(cost.cmc(), 4);

        let x_cost = ManaCost::from_string("{X}{G}");
        assert_eq!(x_cost.x, 1);
        assert_eq!(x_cost.green, 1);
        assert_eq!(x_cost.cmc(), 1);
    }

    #[test]
    fn test_compact_cost_parsing() {
        let cost = ManaCost::from_string("1 U B");
        assert_eq!(cost.generic, 1);
        assert_eq!(cost.blue, 1);
        assert_eq!(cost.black, 1);
    }

    #[test]
    fn test_with_x_folds_into_generic() {
        let cost = ManaCost::from_string("{X}{X}{R}").with_x(3).unwrap();
        assert_eq!(cost.generic, 6);
        assert_eq!(cost.x, 0);
        assert_eq!(cost.red, 1);
    }

    #[test]
    fn test_with_x_rejects_unpayable_amounts() {
        let double = ManaCost::from_string("{X}{X}{R}");
        assert!(double.with_x(127).is_some());
        assert_eq!(double.with_x(128), None);
        assert_eq!(double.with_x(u32::MAX), None);
        assert_eq!(ManaCost::from_string("{5}{X}").with_x(251), None);
        // No X symbol: any X costs nothing extra
        assert_eq!(
            ManaCost::from_string("{R}").with_x(u32::MAX),
            Some(ManaCost::from_string("{R}"))
        );
        assert_eq!(double.without_x().cmc(), 1);
    }

    #[test]
    fn test_display_round_trip_notation() {
        assert_eq!(ManaCost::from_string("{3}{U}{U}").to_string(), "{3}{U}{U}");
        assert_eq!(ManaCost::new().to_string(), "{0}");
    }

    #[test]
    fn test_pay_cost_with_generic() {
        let mut pool = ManaPool::new();
        pool.add(Color::Red, 2);
        pool.add(Color::Blue, 1);

        let cost = ManaCost::from_string("1R");
        assert!(pool.pay_cost(&cost).is_ok());
        assert_eq!(pool.red, 1);
        assert_eq!(pool.blue, 0);
        assert_eq!(pool.total(), 1);
        assert_eq!(pool.to_string(), "{R}");
    }

    #[test]
    fn test_pay_cost_insufficient_mana_leaves_pool() {
        let mut pool = ManaPool::new();
        pool.add(Color::Red, 1);

        let cost = ManaCost::from_string("2R");
        assert!(pool.pay_cost(&cost).is_err());
        assert_eq!(pool.red, 1);
    }

    #[test]
    fn test_pay_cost_wrong_color() {
        let mut pool = ManaPool::new();
        pool.add(Color::Blue, 2);

        assert!(!pool.can_pay(&ManaCost::from_string("RR")));
        assert!(pool.can_pay(&ManaCost::from_string("2")));
    }
}
