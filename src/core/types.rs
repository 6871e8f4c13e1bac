//! String newtypes for names and subtypes

use serde::{Deserialize, Serialize};
use std::fmt;

/// A string newtype with `new`, `as_str`, `Display` and `From` conversions
macro_rules! string_newtype {
    ($(#[$meta:meta])* $name:ident) => {
        $(#[$meta])*
        #[derive(Debug, Clone, PartialEq, Eq, Hash, Serialize, Deserialize)]
        pub struct $name(String);

        impl $name {
            pub fn new(s: impl Into<String>) -> Self {
                $name(s.into())
            }

            pub fn as_str(&self) -> &str {
                &self.0
            }
        }

        impl fmt::Display for $name {
            fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
                f.write_str(&self.0)
            }
        }

        impl From<String> for $name {
            fn from(s: String) -> Self {
                $name(s)
            }
        }

        impl From<&str> for $name {
            fn from(s: &str) -> Self {
                $name(s.to_string())
            }
        }
    };
}

string_newtype!(CardName);

string_newtype!(
    /// Control relations ("you control", "an opponent controls") compare
    /// players by name
    PlayerName
);

/// Creature, land or artifact type
///
/// Equality ignores ASCII case: "elf" in rules text is the type line's "Elf".
#[derive(Debug, Clone, Eq, Serialize, Deserialize)]
pub struct Subtype(String);

impl Subtype {
    pub fn new(s: impl Into<String>) -> Self {
        Subtype(s.into())
    }

    pub fn matches(&self, other: &str) -> bool {
        self.0.eq_ignore_ascii_case(other)
    }
}

impl PartialEq for Subtype {
    fn eq(&self, other: &Self) -> bool {
        self.matches(&other.0)
    }
}

impl fmt::Display for Subtype {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.0)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_subtype_ignores_case() {
        let subtype = Subtype::new("Elf");
        assert!(subtype.matches("elf"));
        assert_eq!(subtype, Subtype::new("ELF"));
        assert_eq!(subtype.to_string(), "Elf");
    }

    #[test]
    fn test_names() {
        assert_eq!(CardName::new("Prodigal Pyromancer").as_str(), "Prodigal Pyromancer");
        assert_eq!(PlayerName::from("Alice"), PlayerName::new("Alice"));
        assert_eq!(PlayerName::from(String::from("Bob")).to_string(), "Bob");
    }
}
