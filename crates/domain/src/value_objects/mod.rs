//! Value objects - Immutable objects defined by their attributes

mod ability;
mod items;
mod scope;

pub use ability::{Ability, AbilityBonus, AbilityScore, AbilityScores};
pub use items::{Attack, BeastKind, BeastSelection, InventoryItem, SpellEntry};
pub use scope::{ScopeId, ScopeMeta, Tab, BEAST_SELECTIONS, SPELL_SELECTIONS};
