//! Use cases - User story orchestration.
//!
//! Each module contains use cases for a specific area of the wizard session.

pub mod cleanup;
pub mod conflicts;

pub use cleanup::{
    BeastCleanupRules, CleanupPlan, CleanupRules, CleanupService, EquipmentCleanupRules,
    SpellCleanupRules,
};
pub use conflicts::ConflictUseCases;
