//! Ability scores - the six D&D 5e stats and their bonus ledgers.
//!
//! Each score keeps a nullable base (unset until the point-buy / roll step
//! runs) and an ordered list of bonuses, each tagged with where it came from.

use serde::{Deserialize, Serialize};
use std::fmt;
use std::str::FromStr;

use crate::error::DomainError;

/// One of the six ability scores.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
#[serde(rename_all = "SCREAMING_SNAKE_CASE")]
pub enum Ability {
    Str,
    Dex,
    Con,
    Int,
    Wis,
    Cha,
}

impl Ability {
    /// Returns the short uppercase string representation (e.g., "STR", "DEX").
    pub fn as_str(&self) -> &'static str {
        match self {
            Self::Str => "STR",
            Self::Dex => "DEX",
            Self::Con => "CON",
            Self::Int => "INT",
            Self::Wis => "WIS",
            Self::Cha => "CHA",
        }
    }

    /// Returns the full name of the ability (e.g., "Strength").
    pub fn display_name(&self) -> &'static str {
        match self {
            Self::Str => "Strength",
            Self::Dex => "Dexterity",
            Self::Con => "Constitution",
            Self::Int => "Intelligence",
            Self::Wis => "Wisdom",
            Self::Cha => "Charisma",
        }
    }

    pub fn all() -> [Ability; 6] {
        [
            Self::Str,
            Self::Dex,
            Self::Con,
            Self::Int,
            Self::Wis,
            Self::Cha,
        ]
    }
}

impl fmt::Display for Ability {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.as_str())
    }
}

impl FromStr for Ability {
    type Err = DomainError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.to_uppercase().as_str() {
            "STR" | "STRENGTH" => Ok(Self::Str),
            "DEX" | "DEXTERITY" => Ok(Self::Dex),
            "CON" | "CONSTITUTION" => Ok(Self::Con),
            "INT" | "INTELLIGENCE" => Ok(Self::Int),
            "WIS" | "WISDOM" => Ok(Self::Wis),
            "CHA" | "CHARISMA" => Ok(Self::Cha),
            _ => Err(DomainError::parse(format!("Unknown ability: {}", s))),
        }
    }
}

/// A bonus applied on top of an ability's base score.
#[derive(Debug, Clone, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct AbilityBonus {
    pub value: i8,
    /// Origin tag shown on the sheet (e.g., "Half-Elf", "Ability Score Improvement")
    pub origin: String,
}

impl AbilityBonus {
    pub fn new(value: i8, origin: impl Into<String>) -> Self {
        Self {
            value,
            origin: origin.into(),
        }
    }
}

/// A single ability: optional base plus the ordered bonus list.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct AbilityScore {
    pub base: Option<u8>,
    #[serde(default)]
    pub bonuses: Vec<AbilityBonus>,
}

impl AbilityScore {
    /// Base plus all bonuses, or `None` while the base is unset.
    pub fn total(&self) -> Option<i16> {
        let base = i16::from(self.base?);
        Some(base + self.bonuses.iter().map(|b| i16::from(b.value)).sum::<i16>())
    }

    /// Standard 5e modifier: floor((total - 10) / 2).
    pub fn modifier(&self) -> Option<i16> {
        self.total().map(|t| (t - 10).div_euclid(2))
    }
}

/// The six scores of a character.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct AbilityScores {
    #[serde(rename = "STR")]
    strength: AbilityScore,
    #[serde(rename = "DEX")]
    dexterity: AbilityScore,
    #[serde(rename = "CON")]
    constitution: AbilityScore,
    #[serde(rename = "INT")]
    intelligence: AbilityScore,
    #[serde(rename = "WIS")]
    wisdom: AbilityScore,
    #[serde(rename = "CHA")]
    charisma: AbilityScore,
}

impl AbilityScores {
    pub fn get(&self, ability: Ability) -> &AbilityScore {
        match ability {
            Ability::Str => &self.strength,
            Ability::Dex => &self.dexterity,
            Ability::Con => &self.constitution,
            Ability::Int => &self.intelligence,
            Ability::Wis => &self.wisdom,
            Ability::Cha => &self.charisma,
        }
    }

    pub(crate) fn get_mut(&mut self, ability: Ability) -> &mut AbilityScore {
        match ability {
            Ability::Str => &mut self.strength,
            Ability::Dex => &mut self.dexterity,
            Ability::Con => &mut self.constitution,
            Ability::Int => &mut self.intelligence,
            Ability::Wis => &mut self.wisdom,
            Ability::Cha => &mut self.charisma,
        }
    }
}
