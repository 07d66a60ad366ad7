//! Provenance ledger - which scope contributed what.
//!
//! The ledger keeps one contribution per scope in insertion order. Re-applying
//! a scope removes its old entry and appends the new one, so iterating the
//! ledger replays contributions in the order their values sit in the record.

use serde::{Deserialize, Serialize};

use super::choice::Choice;
use super::field::{ChoiceChanges, Field, FieldValue};
use crate::error::DomainError;
use crate::value_objects::{ScopeId, ScopeMeta, Tab};

/// The changes one scope most recently applied, with the metadata it declared.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct ScopeContribution {
    pub scope: ScopeId,
    pub meta: ScopeMeta,
    pub changes: ChoiceChanges,
}

impl ScopeContribution {
    /// Re-apply this contribution with one field's payload swapped out.
    ///
    /// Cleanup passes use this to keep a scope's other fields intact while
    /// filtering one list.
    ///
    /// # Errors
    ///
    /// Returns `DomainError::FieldMismatch` if the payload does not fit the field.
    pub fn to_choice_with(&self, field: Field, value: FieldValue) -> Result<Choice, DomainError> {
        let mut changes = self.changes.clone();
        changes.set(field, value)?;
        Ok(Choice::with_changes(
            self.scope.clone(),
            self.meta.clone(),
            changes,
        ))
    }
}

/// Insertion-ordered map from scope id to its contribution.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(transparent)]
pub struct Provenance {
    entries: Vec<ScopeContribution>,
}

impl Provenance {
    pub fn get(&self, scope: &ScopeId) -> Option<&ScopeContribution> {
        self.entries.iter().find(|c| &c.scope == scope)
    }

    pub fn contains(&self, scope: &ScopeId) -> bool {
        self.get(scope).is_some()
    }

    pub fn iter(&self) -> impl Iterator<Item = &ScopeContribution> {
        self.entries.iter()
    }

    pub fn len(&self) -> usize {
        self.entries.len()
    }

    pub fn is_empty(&self) -> bool {
        self.entries.is_empty()
    }

    /// Contributions declared on the given tab, in ledger order.
    pub fn on_tab(&self, tab: Tab) -> impl Iterator<Item = &ScopeContribution> {
        self.entries.iter().filter(move |c| c.meta.tab == tab)
    }

    /// Every recorded payload for `field`, in ledger order.
    pub fn values_for(&self, field: Field) -> impl Iterator<Item = &FieldValue> {
        self.entries.iter().filter_map(move |c| c.changes.get(field))
    }

    /// Total length of the `field` payloads recorded before `scope`: where
    /// that scope's span starts in the record's list.
    pub(crate) fn preceding_len(&self, scope: &ScopeId, field: Field) -> usize {
        self.entries
            .iter()
            .take_while(|c| &c.scope != scope)
            .filter_map(|c| c.changes.get(field))
            .map(FieldValue::len)
            .sum()
    }

    /// Concatenation of every scope's contribution to a list field.
    ///
    /// For scalar fields, the latest remaining payload. This is what the
    /// record's field must equal at all times.
    pub fn replay(&self, field: Field) -> Option<FieldValue> {
        let mut acc: Option<ChoiceChanges> = None;
        for value in self.values_for(field) {
            acc.get_or_insert_with(ChoiceChanges::new)
                .insert_checked(field, value.clone());
        }
        acc.and_then(|changes| changes.get(field).cloned())
    }

    /// Scope must not be present; callers retract first.
    pub(crate) fn push(&mut self, contribution: ScopeContribution) {
        debug_assert!(!self.contains(&contribution.scope));
        self.entries.push(contribution);
    }

    pub(crate) fn remove(&mut self, scope: &ScopeId) -> Option<ScopeContribution> {
        let index = self.entries.iter().position(|c| &c.scope == scope)?;
        Some(self.entries.remove(index))
    }
}
