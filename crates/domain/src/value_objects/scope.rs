//! Choice scopes - identifiers and metadata for one discrete wizard step.
//!
//! A scope id names the step (`class:Bard`, `feature:Skill Proficiencies:0`,
//! `spell_selections`). The metadata a step declares when it applies a
//! choice says which tab owns it and whether the user picked the value or
//! the rules granted it; conflict routing and auto-resolution read that
//! metadata instead of guessing from the id.

use serde::{Deserialize, Serialize};
use std::fmt;

use crate::error::DomainError;

/// Scope owned by the spell picker.
pub const SPELL_SELECTIONS: &str = "spell_selections";

/// Scope owned by the beast picker (familiars, companions, wild shapes).
pub const BEAST_SELECTIONS: &str = "beast_selections";

const CLASS_EQUIPMENT_PREFIX: &str = "class_equipment_";

// ============================================================================
// ScopeId
// ============================================================================

/// A validated scope identifier (non-empty, trimmed)
#[derive(Debug, Clone, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
#[serde(try_from = "String", into = "String")]
pub struct ScopeId(String);

impl ScopeId {
    /// Create a new validated scope id.
    ///
    /// # Errors
    ///
    /// Returns `DomainError::InvalidScope` if the id is empty after trimming.
    pub fn new(id: impl Into<String>) -> Result<Self, DomainError> {
        let id = id.into();
        let trimmed = id.trim();
        if trimmed.is_empty() {
            return Err(DomainError::invalid_scope("scope id cannot be empty"));
        }
        Ok(Self(trimmed.to_string()))
    }

    pub fn spell_selections() -> Self {
        Self(SPELL_SELECTIONS.to_string())
    }

    pub fn beast_selections() -> Self {
        Self(BEAST_SELECTIONS.to_string())
    }

    /// Scope for the `n`th starting-equipment choice of the class.
    pub fn class_equipment(n: usize) -> Self {
        Self(format!("{CLASS_EQUIPMENT_PREFIX}{n}"))
    }

    pub fn as_str(&self) -> &str {
        &self.0
    }
}

impl fmt::Display for ScopeId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.0)
    }
}

impl TryFrom<String> for ScopeId {
    type Error = DomainError;

    fn try_from(s: String) -> Result<Self, Self::Error> {
        Self::new(s)
    }
}

impl From<ScopeId> for String {
    fn from(scope: ScopeId) -> String {
        scope.0
    }
}

// ============================================================================
// Tab
// ============================================================================

/// Wizard tab a scope belongs to; conflict warnings are routed per tab.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum Tab {
    Class,
    Species,
    Background,
    Abilities,
    Spells,
    Equipment,
    Beasts,
}

impl Tab {
    pub fn as_str(&self) -> &'static str {
        match self {
            Self::Class => "class",
            Self::Species => "species",
            Self::Background => "background",
            Self::Abilities => "abilities",
            Self::Spells => "spells",
            Self::Equipment => "equipment",
            Self::Beasts => "beasts",
        }
    }
}

impl fmt::Display for Tab {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.as_str())
    }
}

// ============================================================================
// ScopeMeta
// ============================================================================

/// Metadata a wizard step declares alongside its contribution.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct ScopeMeta {
    pub tab: Tab,
    /// The user picked these values (as opposed to the rules granting them).
    #[serde(default)]
    pub user_selectable: bool,
    /// Human-readable name for resolution prompts.
    #[serde(default)]
    pub label: Option<String>,
}

impl ScopeMeta {
    /// Metadata for a contribution the rules grant automatically.
    pub fn granted(tab: Tab) -> Self {
        Self {
            tab,
            user_selectable: false,
            label: None,
        }
    }

    /// Metadata for a contribution the user picked.
    pub fn selected(tab: Tab) -> Self {
        Self {
            tab,
            user_selectable: true,
            label: None,
        }
    }

    pub fn with_label(mut self, label: impl Into<String>) -> Self {
        self.label = Some(label.into());
        self
    }
}
