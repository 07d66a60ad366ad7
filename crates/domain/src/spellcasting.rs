//! Spellcasting contracts consumed by conflict detection and cleanup.
//!
//! The domain does not know which class learns which spell. Reference data
//! arrives through two collaborators:
//!
//! - `SpellAccessProvider`: what a class/subclass/race lets the character pick
//! - `SpellCatalog`: which spells exist at a given level
//!
//! Only levels 0 through 2 are tracked; higher levels never reach the wizard.

use serde::{Deserialize, Serialize};
use std::fmt;

use crate::error::DomainError;

/// Highest spell level the wizard tracks.
pub const MAX_TRACKED_LEVEL: u8 = 2;

/// What grants a spell-access entry.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum SpellSource {
    Class,
    Subclass,
    Race,
    Background,
    Feature,
}

impl SpellSource {
    /// Race- and background-granted picks do not count against class limits.
    pub fn counts_toward_limits(&self) -> bool {
        matches!(self, Self::Class | Self::Subclass | Self::Feature)
    }
}

/// One entry of spell access: the picks a source grants.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct SpellAccess {
    pub source: SpellSource,
    #[serde(default)]
    pub chooseable: bool,
    #[serde(default)]
    pub choose_cantrip_count: Option<u32>,
    #[serde(default)]
    pub choose_spell_count: Option<u32>,
    /// Older descriptors carry a single count for leveled picks.
    #[serde(default)]
    pub choose_count: Option<u32>,
    /// Level of the leveled picks (1 unless stated).
    #[serde(default = "default_spell_level")]
    pub spell_level: u8,
    /// Leveled picks come from one pool spanning every tracked level.
    #[serde(default)]
    pub shared_pool: bool,
    #[serde(default)]
    pub choose_from: Vec<String>,
}

fn default_spell_level() -> u8 {
    1
}

impl SpellAccess {
    /// Leveled picks granted, folding in the legacy count.
    pub fn leveled_choices(&self) -> u32 {
        self.choose_spell_count.or(self.choose_count).unwrap_or(0)
    }

    pub fn cantrip_choices(&self) -> u32 {
        self.choose_cantrip_count.unwrap_or(0)
    }

    pub fn offers(&self, spell: &str) -> bool {
        self.choose_from.iter().any(|s| s == spell)
    }

    /// # Errors
    ///
    /// Returns `DomainError::Validation` when the leveled picks target an
    /// untracked level.
    pub fn validate(&self) -> Result<(), DomainError> {
        if self.spell_level == 0 || self.spell_level > MAX_TRACKED_LEVEL {
            return Err(DomainError::validation(format!(
                "Spell access level must be between 1 and {}, got {}",
                MAX_TRACKED_LEVEL, self.spell_level
            )));
        }
        Ok(())
    }
}

/// Minimal spell row from a level table.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct SpellSummary {
    pub name: String,
    pub level: u8,
}

/// Bucket a selected spell is counted in.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum SpellLevelBucket {
    Cantrips,
    Level1,
    Level2,
    /// Level 1 and 2 picks counted together against a shared pool
    Leveled,
}

impl SpellLevelBucket {
    pub fn for_level(level: u8) -> Option<Self> {
        match level {
            0 => Some(Self::Cantrips),
            1 => Some(Self::Level1),
            2 => Some(Self::Level2),
            _ => None,
        }
    }
}

impl fmt::Display for SpellLevelBucket {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::Cantrips => write!(f, "cantrips"),
            Self::Level1 => write!(f, "level 1"),
            Self::Level2 => write!(f, "level 2"),
            Self::Leveled => write!(f, "level 1-2"),
        }
    }
}

/// Character attributes spell access depends on.
#[derive(Debug, Clone, Default, PartialEq, Eq, Hash)]
pub struct CasterProfile {
    pub class: Option<String>,
    pub subclass: Option<String>,
    pub race: Option<String>,
}

/// Supplies spell-access descriptors for a character.
#[cfg_attr(test, mockall::automock)]
pub trait SpellAccessProvider: Send + Sync {
    fn spell_access(&self, profile: &CasterProfile) -> Vec<SpellAccess>;
}

/// Supplies the spells of one level (0..=2).
#[cfg_attr(test, mockall::automock)]
pub trait SpellCatalog: Send + Sync {
    fn spells_of_level(&self, level: u8) -> Vec<SpellSummary>;
}

/// Level of a spell by name, searching tracked levels only.
pub fn level_of(catalog: &dyn SpellCatalog, name: &str) -> Option<u8> {
    (0..=MAX_TRACKED_LEVEL).find(|level| {
        catalog
            .spells_of_level(*level)
            .iter()
            .any(|spell| spell.name == name)
    })
}
