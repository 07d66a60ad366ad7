//! Choices and the list arithmetic behind applying and retracting them.

use super::field::{ChoiceChanges, Field, FieldValue};
use super::sheet::FieldSlot;
use crate::error::DomainError;
use crate::value_objects::{
    Ability, AbilityBonus, Attack, BeastSelection, InventoryItem, ScopeId, ScopeMeta, SpellEntry,
};

/// One wizard step's contribution, ready to apply.
///
/// # Example
///
/// ```
/// use charforge_domain::record::{CharacterRecord, Choice};
/// use charforge_domain::value_objects::{ScopeId, ScopeMeta, Tab};
///
/// let mut record = CharacterRecord::new();
/// let scope = ScopeId::new("class:Bard").unwrap();
/// record.apply_choice(
///     Choice::new(scope, ScopeMeta::granted(Tab::Class))
///         .class("Bard")
///         .proficiencies(["Light Armor", "Simple Weapons"]),
/// );
///
/// assert_eq!(record.sheet().class(), Some("Bard"));
/// assert_eq!(record.sheet().proficiencies().len(), 2);
/// ```
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Choice {
    scope: ScopeId,
    meta: ScopeMeta,
    changes: ChoiceChanges,
}

impl Choice {
    pub fn new(scope: ScopeId, meta: ScopeMeta) -> Self {
        Self {
            scope,
            meta,
            changes: ChoiceChanges::new(),
        }
    }

    pub fn with_changes(scope: ScopeId, meta: ScopeMeta, changes: ChoiceChanges) -> Self {
        Self {
            scope,
            meta,
            changes,
        }
    }

    pub fn scope(&self) -> &ScopeId {
        &self.scope
    }

    pub fn meta(&self) -> &ScopeMeta {
        &self.meta
    }

    pub fn changes(&self) -> &ChoiceChanges {
        &self.changes
    }

    pub(crate) fn into_parts(self) -> (ScopeId, ScopeMeta, ChoiceChanges) {
        (self.scope, self.meta, self.changes)
    }

    /// Add an arbitrary payload.
    ///
    /// # Errors
    ///
    /// Returns `DomainError::FieldMismatch` if the payload does not fit the field.
    pub fn change(mut self, field: Field, value: FieldValue) -> Result<Self, DomainError> {
        self.changes.insert(field, value)?;
        Ok(self)
    }

    fn text(mut self, field: Field, value: impl Into<String>) -> Self {
        self.changes
            .insert_checked(field, FieldValue::Text(value.into()));
        self
    }

    fn strings<I, S>(mut self, field: Field, values: I) -> Self
    where
        I: IntoIterator<Item = S>,
        S: Into<String>,
    {
        let values = values.into_iter().map(Into::into).collect();
        self.changes
            .insert_checked(field, FieldValue::Strings(values));
        self
    }

    // =========================================================================
    // Scalars
    // =========================================================================

    pub fn name(self, value: impl Into<String>) -> Self {
        self.text(Field::Name, value)
    }

    pub fn race(self, value: impl Into<String>) -> Self {
        self.text(Field::Race, value)
    }

    pub fn subrace(self, value: impl Into<String>) -> Self {
        self.text(Field::Subrace, value)
    }

    pub fn class(self, value: impl Into<String>) -> Self {
        self.text(Field::Class, value)
    }

    pub fn subclass(self, value: impl Into<String>) -> Self {
        self.text(Field::Subclass, value)
    }

    pub fn background(self, value: impl Into<String>) -> Self {
        self.text(Field::Background, value)
    }

    pub fn alignment(self, value: impl Into<String>) -> Self {
        self.text(Field::Alignment, value)
    }

    pub fn ability_base(mut self, ability: Ability, score: u8) -> Self {
        self.changes
            .insert_checked(Field::AbilityBase(ability), FieldValue::Score(score));
        self
    }

    // =========================================================================
    // Accumulators
    // =========================================================================

    pub fn ability_bonus(mut self, ability: Ability, bonus: AbilityBonus) -> Self {
        self.changes.insert_checked(
            Field::AbilityBonuses(ability),
            FieldValue::Bonuses(vec![bonus]),
        );
        self
    }

    pub fn skills<I, S>(self, values: I) -> Self
    where
        I: IntoIterator<Item = S>,
        S: Into<String>,
    {
        self.strings(Field::Skills, values)
    }

    pub fn proficiencies<I, S>(self, values: I) -> Self
    where
        I: IntoIterator<Item = S>,
        S: Into<String>,
    {
        self.strings(Field::Proficiencies, values)
    }

    pub fn languages<I, S>(self, values: I) -> Self
    where
        I: IntoIterator<Item = S>,
        S: Into<String>,
    {
        self.strings(Field::Languages, values)
    }

    pub fn features<I, S>(self, values: I) -> Self
    where
        I: IntoIterator<Item = S>,
        S: Into<String>,
    {
        self.strings(Field::Features, values)
    }

    pub fn spells(mut self, values: Vec<SpellEntry>) -> Self {
        self.changes
            .insert_checked(Field::Spells, FieldValue::Spells(values));
        self
    }

    pub fn inventory(mut self, values: Vec<InventoryItem>) -> Self {
        self.changes
            .insert_checked(Field::Inventory, FieldValue::Items(values));
        self
    }

    pub fn attacks(mut self, values: Vec<Attack>) -> Self {
        self.changes
            .insert_checked(Field::Attacks, FieldValue::Attacks(values));
        self
    }

    pub fn beasts(mut self, values: Vec<BeastSelection>) -> Self {
        self.changes
            .insert_checked(Field::Beasts, FieldValue::Beasts(values));
        self
    }
}

// =============================================================================
// List arithmetic
// =============================================================================

/// Write a payload into its slot: lists append, scalars overwrite.
pub(crate) fn write_slot(slot: FieldSlot<'_>, value: &FieldValue) {
    match (slot, value) {
        (FieldSlot::Text(s), FieldValue::Text(v)) => *s = Some(v.clone()),
        (FieldSlot::Score(s), FieldValue::Score(v)) => *s = Some(*v),
        (FieldSlot::Strings(l), FieldValue::Strings(v)) => l.extend(v.iter().cloned()),
        (FieldSlot::Bonuses(l), FieldValue::Bonuses(v)) => l.extend(v.iter().cloned()),
        (FieldSlot::Spells(l), FieldValue::Spells(v)) => l.extend(v.iter().cloned()),
        (FieldSlot::Items(l), FieldValue::Items(v)) => l.extend(v.iter().cloned()),
        (FieldSlot::Attacks(l), FieldValue::Attacks(v)) => l.extend(v.iter().cloned()),
        (FieldSlot::Beasts(l), FieldValue::Beasts(v)) => l.extend(v.iter().cloned()),
        // ChoiceChanges never holds a payload of the wrong kind
        _ => {}
    }
}

/// Remove one scope's payload from its slot. Returns how many list entries
/// were dropped.
///
/// `offset` is where the scope's span starts in the list: the total length
/// of the payloads of the scopes recorded before it. Because a list is the
/// concatenation of every scope's payload in ledger order, dropping that span
/// leaves exactly the concatenation of the remaining scopes, other scopes'
/// copies of shared values included.
///
/// Scalars fall back to the latest remaining contributor, or unset.
pub(crate) fn retract_slot<'a>(
    slot: FieldSlot<'_>,
    own: &FieldValue,
    offset: usize,
    others: impl Iterator<Item = &'a FieldValue>,
) -> usize {
    match (slot, own) {
        (FieldSlot::Text(s), FieldValue::Text(_)) => {
            *s = others
                .filter_map(|v| match v {
                    FieldValue::Text(t) => Some(t.clone()),
                    _ => None,
                })
                .last();
            0
        }
        (FieldSlot::Score(s), FieldValue::Score(_)) => {
            *s = others
                .filter_map(|v| match v {
                    FieldValue::Score(n) => Some(*n),
                    _ => None,
                })
                .last();
            0
        }
        (FieldSlot::Strings(l), FieldValue::Strings(own)) => remove_span(l, offset, own.len()),
        (FieldSlot::Bonuses(l), FieldValue::Bonuses(own)) => remove_span(l, offset, own.len()),
        (FieldSlot::Spells(l), FieldValue::Spells(own)) => remove_span(l, offset, own.len()),
        (FieldSlot::Items(l), FieldValue::Items(own)) => remove_span(l, offset, own.len()),
        (FieldSlot::Attacks(l), FieldValue::Attacks(own)) => remove_span(l, offset, own.len()),
        (FieldSlot::Beasts(l), FieldValue::Beasts(own)) => remove_span(l, offset, own.len()),
        _ => 0,
    }
}

fn remove_span<T>(current: &mut Vec<T>, offset: usize, len: usize) -> usize {
    let end = offset.saturating_add(len).min(current.len());
    let start = offset.min(end);
    current.drain(start..end).count()
}
