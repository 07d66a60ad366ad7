//! Charforge domain: the character record a creation wizard builds, and the
//! provenance bookkeeping that lets each wizard step be undone cleanly.
//!
//! Everything here is synchronous and free of I/O. The reactive session
//! layer lives in `charforge-engine`.

pub mod conflicts;
pub mod error;
pub mod feature_effects;
pub mod ids;
pub mod record;
pub mod spellcasting;
pub mod value_objects;

pub use error::DomainError;
pub use ids::CharacterId;

pub use record::{
    CharacterRecord, CharacterSheet, Choice, ChoiceChanges, Field, FieldChange, FieldKind,
    FieldValue, Provenance, ScopeContribution,
};

pub use conflicts::{
    auto_resolve_conflicts, detect_conflicts, has_manual_conflicts, resolution_options,
    resolve_conflict_by_reverting, spell_limit_violations, AlternativeTable, AutoResolveOutcome,
    Conflict, ConflictKind, ConflictReport, DuplicateConflict, ResolutionAction,
    ResolutionOptions, SpellLimitConflict, SpellLimitViolation, SpellRules,
};

pub use feature_effects::{compile_effects, effect_needs_choice, FeatureEffect, ListTarget, ScalarTarget};

pub use spellcasting::{
    CasterProfile, SpellAccess, SpellAccessProvider, SpellCatalog, SpellLevelBucket, SpellSource,
    SpellSummary,
};

pub use value_objects::{
    Ability, AbilityBonus, AbilityScore, AbilityScores, Attack, BeastKind, BeastSelection,
    InventoryItem, ScopeId, ScopeMeta, SpellEntry, Tab,
};
