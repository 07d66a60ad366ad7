//! Spell reference data loaded from JSON.
//!
//! File shape:
//!
//! ```json
//! {
//!   "spells": [{ "name": "Find Familiar", "level": 1 }],
//!   "access": [
//!     {
//!       "class": "Wizard",
//!       "entries": [{ "source": "class", "chooseable": true, "chooseCantripCount": 3,
//!                     "chooseSpellCount": 6, "chooseFrom": ["Find Familiar"] }]
//!     }
//!   ]
//! }
//! ```
//!
//! An access rule applies when every key it names (`class`, `subclass`,
//! `race`) matches the character; a rule naming none applies to everyone.

use std::path::Path;

use charforge_domain::spellcasting::MAX_TRACKED_LEVEL;
use charforge_domain::{CasterProfile, SpellAccess, SpellAccessProvider, SpellCatalog, SpellSummary};
use serde::Deserialize;
use tokio::fs;

use crate::infrastructure::ports::ReferenceDataError;

#[derive(Debug, Clone, Default, PartialEq, Eq, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct AccessRule {
    #[serde(default)]
    pub class: Option<String>,
    #[serde(default)]
    pub subclass: Option<String>,
    #[serde(default)]
    pub race: Option<String>,
    pub entries: Vec<SpellAccess>,
}

impl AccessRule {
    fn matches(&self, profile: &CasterProfile) -> bool {
        let key_matches = |want: &Option<String>, have: &Option<String>| match want {
            Some(want) => have.as_deref() == Some(want.as_str()),
            None => true,
        };
        key_matches(&self.class, &profile.class)
            && key_matches(&self.subclass, &profile.subclass)
            && key_matches(&self.race, &profile.race)
    }
}

/// In-memory spell tables and access rules.
#[derive(Debug, Clone, Default, PartialEq, Eq, Deserialize)]
pub struct StaticSpellData {
    #[serde(default)]
    spells: Vec<SpellSummary>,
    #[serde(default)]
    access: Vec<AccessRule>,
}

impl StaticSpellData {
    /// No spells, no access.
    pub fn empty() -> Self {
        Self::default()
    }

    pub fn new(spells: Vec<SpellSummary>, access: Vec<AccessRule>) -> Result<Self, ReferenceDataError> {
        let data = Self { spells, access };
        data.validate()?;
        Ok(data)
    }

    pub fn from_json_str(json: &str) -> Result<Self, ReferenceDataError> {
        let data: Self = serde_json::from_str(json)?;
        data.validate()?;
        Ok(data)
    }

    pub async fn load(path: impl AsRef<Path>) -> Result<Self, ReferenceDataError> {
        let path = path.as_ref();
        let content = fs::read_to_string(path)
            .await
            .map_err(|source| ReferenceDataError::Io {
                path: path.to_path_buf(),
                source,
            })?;
        let data = Self::from_json_str(&content)?;
        tracing::info!(
            path = %path.display(),
            spells = data.spells.len(),
            access_rules = data.access.len(),
            "Loaded spell reference data"
        );
        Ok(data)
    }

    fn validate(&self) -> Result<(), ReferenceDataError> {
        for entry in self.access.iter().flat_map(|rule| &rule.entries) {
            entry.validate()?;
        }
        Ok(())
    }
}

impl SpellAccessProvider for StaticSpellData {
    fn spell_access(&self, profile: &CasterProfile) -> Vec<SpellAccess> {
        self.access
            .iter()
            .filter(|rule| rule.matches(profile))
            .flat_map(|rule| rule.entries.iter().cloned())
            .collect()
    }
}

impl SpellCatalog for StaticSpellData {
    fn spells_of_level(&self, level: u8) -> Vec<SpellSummary> {
        if level > MAX_TRACKED_LEVEL {
            return Vec::new();
        }
        self.spells
            .iter()
            .filter(|spell| spell.level == level)
            .cloned()
            .collect()
    }
}
