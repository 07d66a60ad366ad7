//! Character record aggregate - the wizard's single source of truth
//!
//! # Provenance
//!
//! Every value in the record was put there by a scope: one discrete wizard
//! step such as "class:Bard" or "feature:Skill Proficiencies:0". The record
//! keeps, per scope, exactly the changes that scope most recently applied.
//!
//! # Invariants
//!
//! - Each list field equals the concatenation, in ledger order, of every
//!   recorded scope's contribution to it (`is_consistent`).
//! - A scope has at most one contribution; applying it again replaces it.
//! - Reverting a scope that is not recorded is a no-op.
//!
//! # Mutation boundary
//!
//! Fields are private. The only writers are `apply_choice`, `apply_batch` and
//! `smart_revert_scope` (plus the conflict resolution helpers built on them).

mod choice;
mod field;
mod provenance;
mod sheet;

pub use choice::Choice;
pub use field::{ChoiceChanges, Field, FieldChange, FieldKind, FieldValue};
pub use provenance::{Provenance, ScopeContribution};
pub use sheet::CharacterSheet;

use serde::Serialize;

use crate::ids::CharacterId;
use crate::value_objects::ScopeId;

/// A character being built in one wizard session.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct CharacterRecord {
    id: CharacterId,
    #[serde(flatten)]
    sheet: CharacterSheet,
    #[serde(rename = "_provenance")]
    provenance: Provenance,
}

impl Default for CharacterRecord {
    fn default() -> Self {
        Self::new()
    }
}

impl CharacterRecord {
    /// Create an empty record for a new session.
    pub fn new() -> Self {
        Self {
            id: CharacterId::new(),
            sheet: CharacterSheet::default(),
            provenance: Provenance::default(),
        }
    }

    // =========================================================================
    // Accessors (read-only)
    // =========================================================================

    #[inline]
    pub fn id(&self) -> CharacterId {
        self.id
    }

    #[inline]
    pub fn sheet(&self) -> &CharacterSheet {
        &self.sheet
    }

    #[inline]
    pub fn provenance(&self) -> &Provenance {
        &self.provenance
    }

    /// The changes a scope currently contributes, if any.
    pub fn contribution(&self, scope: &ScopeId) -> Option<&ScopeContribution> {
        self.provenance.get(scope)
    }

    // =========================================================================
    // Mutations
    // =========================================================================

    /// Apply a scope's contribution, replacing whatever that scope applied before.
    ///
    /// List payloads are appended to the current field (duplicates kept);
    /// scalar payloads overwrite it.
    pub fn apply_choice(&mut self, choice: Choice) {
        let (scope, meta, changes) = choice.into_parts();

        let replaced = self.retract(&scope).is_some();

        for (field, value) in changes.iter() {
            choice::write_slot(self.sheet.slot_mut(field), value);
        }

        tracing::debug!(
            character_id = %self.id,
            scope = %scope,
            tab = %meta.tab,
            fields = changes.fields().count(),
            replaced,
            "Applied choice"
        );

        self.provenance.push(ScopeContribution {
            scope,
            meta,
            changes,
        });
    }

    /// Apply several scopes as one step.
    ///
    /// Every scope in the batch is retracted before any of them is applied,
    /// so the result does not depend on the batch order.
    pub fn apply_batch(&mut self, choices: Vec<Choice>) {
        for choice in &choices {
            self.retract(choice.scope());
        }
        for choice in choices {
            self.apply_choice(choice);
        }
    }

    /// Remove a scope's contribution, keeping values other scopes also contributed.
    ///
    /// Returns `false` (and changes nothing) if the scope is not recorded.
    pub fn smart_revert_scope(&mut self, scope: &ScopeId) -> bool {
        match self.retract(scope) {
            Some(_) => true,
            None => {
                tracing::trace!(scope = %scope, "Revert of unrecorded scope ignored");
                false
            }
        }
    }

    /// Whether automatic resolution may revert this scope.
    ///
    /// Only scopes the user picked qualify; rule-granted contributions are
    /// never retracted automatically.
    pub fn can_safely_revert_scope(&self, scope: &ScopeId) -> bool {
        self.provenance
            .get(scope)
            .is_some_and(|c| c.meta.user_selectable)
    }

    /// Check the provenance invariant for every field.
    pub fn is_consistent(&self) -> bool {
        Field::all().into_iter().all(|field| {
            let replayed = self.provenance.replay(field);
            let current = self.sheet.value_of(field);
            if field.is_list() {
                let current_empty = current.as_ref().map_or(true, FieldValue::is_empty);
                match replayed {
                    Some(replayed) => current.as_ref() == Some(&replayed),
                    None => current_empty,
                }
            } else {
                current == replayed
            }
        })
    }

    fn retract(&mut self, scope: &ScopeId) -> Option<ScopeContribution> {
        // Spans are located before the entry leaves the ledger
        let offsets: Vec<usize> = {
            let contribution = self.provenance.get(scope)?;
            contribution
                .changes
                .fields()
                .map(|field| self.provenance.preceding_len(scope, field))
                .collect()
        };
        let contribution = self.provenance.remove(scope)?;

        let mut dropped = 0;
        for ((field, own), offset) in contribution.changes.iter().zip(offsets) {
            let others = self.provenance.values_for(field);
            dropped += choice::retract_slot(self.sheet.slot_mut(field), own, offset, others);
        }

        tracing::debug!(
            character_id = %self.id,
            scope = %scope,
            dropped,
            "Retracted scope contribution"
        );

        Some(contribution)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::value_objects::{Ability, AbilityBonus, InventoryItem, ScopeMeta, Tab};

    fn scope(id: &str) -> ScopeId {
        ScopeId::new(id).unwrap()
    }

    fn skills_choice(id: &str, skills: &[&str]) -> Choice {
        Choice::new(scope(id), ScopeMeta::granted(Tab::Class)).skills(skills.iter().copied())
    }

    mod apply {
        use super::*;

        #[test]
        fn reapplying_between_interleaved_scopes_keeps_ledger_order() {
            let mut record = CharacterRecord::new();
            record.apply_choice(skills_choice("race:Elf", &["Perception"]));
            record.apply_choice(skills_choice("class:Rogue", &["Stealth"]));
            record.apply_choice(skills_choice("background:Outlander", &["Perception"]));

            record.apply_choice(skills_choice("race:Elf", &["Insight"]));

            assert_eq!(
                record.sheet().skills(),
                &["Stealth", "Perception", "Insight"]
            );
            assert!(record.is_consistent());
        }

        #[test]
        fn lists_concatenate_across_scopes() {
            let mut record = CharacterRecord::new();
            record.apply_choice(skills_choice("a", &["Perception"]));
            record.apply_choice(skills_choice("b", &["Perception", "Stealth"]));

            assert_eq!(
                record.sheet().skills(),
                &["Perception", "Perception", "Stealth"]
            );
            assert!(record.is_consistent());
        }

        #[test]
        fn reapplying_a_scope_replaces_its_contribution() {
            let mut record = CharacterRecord::new();
            record.apply_choice(skills_choice("a", &["Arcana", "History"]));
            record.apply_choice(skills_choice("a", &["Insight"]));

            assert_eq!(record.sheet().skills(), &["Insight"]);
            assert_eq!(record.provenance().len(), 1);
            assert!(record.is_consistent());
        }

        #[test]
        fn reapplying_keeps_values_shared_with_other_scopes() {
            let mut record = CharacterRecord::new();
            record.apply_choice(skills_choice("a", &["Perception"]));
            record.apply_choice(skills_choice("b", &["Perception"]));
            record.apply_choice(skills_choice("a", &["Stealth"]));

            assert_eq!(record.sheet().skills(), &["Perception", "Stealth"]);
            assert!(record.is_consistent());
        }

        #[test]
        fn scalars_are_last_write_wins() {
            let mut record = CharacterRecord::new();
            let meta = ScopeMeta::granted(Tab::Class);
            record.apply_choice(Choice::new(scope("class:Bard"), meta.clone()).class("Bard"));
            record.apply_choice(Choice::new(scope("class:Wizard"), meta).class("Wizard"));

            assert_eq!(record.sheet().class(), Some("Wizard"));
        }

        #[test]
        fn ability_bonuses_accumulate() {
            let mut record = CharacterRecord::new();
            record.apply_choice(
                Choice::new(scope("abilities"), ScopeMeta::selected(Tab::Abilities))
                    .ability_base(Ability::Cha, 14),
            );
            record.apply_choice(
                Choice::new(scope("race:Half-Elf"), ScopeMeta::granted(Tab::Species))
                    .ability_bonus(Ability::Cha, AbilityBonus::new(2, "Half-Elf")),
            );

            let cha = record.sheet().abilities().get(Ability::Cha);
            assert_eq!(cha.total(), Some(16));
            assert!(record.is_consistent());
        }

        #[test]
        fn batch_result_is_order_independent() {
            let batch = |order: [&str; 2]| {
                let mut record = CharacterRecord::new();
                record.apply_choice(skills_choice("a", &["Perception"]));
                record.apply_choice(skills_choice("b", &["Perception"]));
                record.apply_batch(
                    order
                        .iter()
                        .map(|id| skills_choice(id, &["Athletics"]))
                        .collect(),
                );
                let mut skills = record.sheet().skills().to_vec();
                skills.sort();
                skills
            };

            assert_eq!(batch(["a", "b"]), batch(["b", "a"]));
            assert_eq!(batch(["a", "b"]), vec!["Athletics", "Athletics"]);
        }
    }

    mod revert {
        use super::*;

        #[test]
        fn reverting_before_an_interleaved_copy_keeps_ledger_order() {
            let mut record = CharacterRecord::new();
            record.apply_choice(skills_choice("a", &["Perception"]));
            record.apply_choice(skills_choice("b", &["Stealth"]));
            record.apply_choice(skills_choice("c", &["Perception"]));

            assert!(record.smart_revert_scope(&scope("a")));

            assert_eq!(record.sheet().skills(), &["Stealth", "Perception"]);
            assert!(record.is_consistent());
        }

        #[test]
        fn reverting_a_middle_scope_with_several_fields() {
            let mut record = CharacterRecord::new();
            let meta = ScopeMeta::granted(Tab::Class);
            record.apply_choice(
                Choice::new(scope("a"), meta.clone())
                    .skills(["Arcana"])
                    .languages(["Elvish"]),
            );
            record.apply_choice(
                Choice::new(scope("b"), meta.clone())
                    .skills(["Arcana", "History"])
                    .languages(["Dwarvish"]),
            );
            record.apply_choice(
                Choice::new(scope("c"), meta)
                    .skills(["History"])
                    .languages(["Elvish"]),
            );

            assert!(record.smart_revert_scope(&scope("b")));

            assert_eq!(record.sheet().skills(), &["Arcana", "History"]);
            assert_eq!(record.sheet().languages(), &["Elvish", "Elvish"]);
            assert!(record.is_consistent());
        }

        #[test]
        fn smart_revert_preserves_shared_values() {
            let mut record = CharacterRecord::new();
            record.apply_choice(skills_choice("a", &["Perception"]));
            record.apply_choice(skills_choice("b", &["Perception"]));

            assert!(record.smart_revert_scope(&scope("a")));

            assert_eq!(record.sheet().skills(), &["Perception"]);
            assert!(record.contribution(&scope("a")).is_none());
            assert!(record.contribution(&scope("b")).is_some());
            assert!(record.is_consistent());
        }

        #[test]
        fn smart_revert_removes_duplicates_only_this_scope_owned() {
            let mut record = CharacterRecord::new();
            record.apply_choice(skills_choice("a", &["Arcana", "Arcana"]));
            record.apply_choice(skills_choice("b", &["History"]));

            record.smart_revert_scope(&scope("a"));

            assert_eq!(record.sheet().skills(), &["History"]);
        }

        #[test]
        fn revert_is_idempotent() {
            let mut record = CharacterRecord::new();
            record.apply_choice(skills_choice("a", &["Perception"]));
            record.apply_choice(skills_choice("b", &["Stealth"]));

            assert!(record.smart_revert_scope(&scope("a")));
            let after_first = record.clone();
            assert!(!record.smart_revert_scope(&scope("a")));

            assert_eq!(record, after_first);
        }

        #[test]
        fn reverting_unknown_scope_is_a_noop() {
            let mut record = CharacterRecord::new();
            record.apply_choice(skills_choice("a", &["Perception"]));
            let before = record.clone();

            assert!(!record.smart_revert_scope(&scope("nobody")));
            assert_eq!(record, before);
        }

        #[test]
        fn scalar_revert_falls_back_to_remaining_contributor() {
            let mut record = CharacterRecord::new();
            let meta = ScopeMeta::granted(Tab::Species);
            record.apply_choice(Choice::new(scope("race:Elf"), meta.clone()).race("Elf"));
            record.apply_choice(Choice::new(scope("race:override"), meta).race("Drow"));

            record.smart_revert_scope(&scope("race:override"));
            assert_eq!(record.sheet().race(), Some("Elf"));

            record.smart_revert_scope(&scope("race:Elf"));
            assert_eq!(record.sheet().race(), None);
            assert!(record.is_consistent());
        }

        #[test]
        fn structured_items_are_counted_by_value() {
            let mut record = CharacterRecord::new();
            let meta = ScopeMeta::selected(Tab::Equipment);
            let pack = InventoryItem::new("Explorer's Pack");
            record.apply_choice(
                Choice::new(ScopeId::class_equipment(0), meta.clone()).inventory(vec![pack.clone()]),
            );
            record.apply_choice(
                Choice::new(scope("background:Soldier"), ScopeMeta::granted(Tab::Background))
                    .inventory(vec![pack.clone()]),
            );

            record.smart_revert_scope(&ScopeId::class_equipment(0));

            assert_eq!(record.sheet().inventory(), &[pack]);
            assert!(record.is_consistent());
        }
    }

    mod safety {
        use super::*;

        #[test]
        fn only_user_selected_scopes_are_safe_to_revert() {
            let mut record = CharacterRecord::new();
            record.apply_choice(skills_choice("class:Rogue", &["Stealth"]));
            record.apply_choice(
                Choice::new(
                    scope("feature:Skill Proficiencies:0"),
                    ScopeMeta::selected(Tab::Class),
                )
                .skills(["Stealth"]),
            );

            assert!(!record.can_safely_revert_scope(&scope("class:Rogue")));
            assert!(record.can_safely_revert_scope(&scope("feature:Skill Proficiencies:0")));
            assert!(!record.can_safely_revert_scope(&scope("missing")));
        }
    }

    #[test]
    fn export_flattens_sheet_and_keeps_provenance() {
        let mut record = CharacterRecord::new();
        record.apply_choice(skills_choice("a", &["Perception"]));

        let json = serde_json::to_value(&record).unwrap();
        assert_eq!(json["skills"][0], "Perception");
        assert_eq!(json["_provenance"][0]["scope"], "a");
    }
}
