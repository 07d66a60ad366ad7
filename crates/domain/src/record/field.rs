//! Record schema: which fields a choice may touch and what payload each takes.
//!
//! The schema is closed. A contribution can only name a `Field`, and every
//! payload is checked against the field's kind when the change set is built,
//! so an applied choice can never corrupt an unrelated field.

use serde::{Deserialize, Serialize};
use std::fmt;

use crate::error::DomainError;
use crate::value_objects::{
    Ability, AbilityBonus, Attack, BeastSelection, InventoryItem, SpellEntry,
};

/// A field of the character record.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum Field {
    Name,
    Race,
    Subrace,
    Class,
    Subclass,
    Background,
    Alignment,
    AbilityBase(Ability),
    AbilityBonuses(Ability),
    Skills,
    Proficiencies,
    Languages,
    Features,
    Spells,
    Inventory,
    Attacks,
    Beasts,
}

impl Field {
    pub fn kind(&self) -> FieldKind {
        match self {
            Self::Name
            | Self::Race
            | Self::Subrace
            | Self::Class
            | Self::Subclass
            | Self::Background
            | Self::Alignment => FieldKind::Text,
            Self::AbilityBase(_) => FieldKind::Score,
            Self::AbilityBonuses(_) => FieldKind::Bonuses,
            Self::Skills | Self::Proficiencies | Self::Languages | Self::Features => {
                FieldKind::Strings
            }
            Self::Spells => FieldKind::Spells,
            Self::Inventory => FieldKind::Items,
            Self::Attacks => FieldKind::Attacks,
            Self::Beasts => FieldKind::Beasts,
        }
    }

    /// Accumulator fields append; everything else is last-write-wins.
    pub fn is_list(&self) -> bool {
        self.kind().is_list()
    }

    /// Every field of the schema, abilities expanded.
    pub fn all() -> Vec<Field> {
        let mut fields = vec![
            Self::Name,
            Self::Race,
            Self::Subrace,
            Self::Class,
            Self::Subclass,
            Self::Background,
            Self::Alignment,
        ];
        for ability in Ability::all() {
            fields.push(Self::AbilityBase(ability));
            fields.push(Self::AbilityBonuses(ability));
        }
        fields.extend([
            Self::Skills,
            Self::Proficiencies,
            Self::Languages,
            Self::Features,
            Self::Spells,
            Self::Inventory,
            Self::Attacks,
            Self::Beasts,
        ]);
        fields
    }
}

impl fmt::Display for Field {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::Name => write!(f, "name"),
            Self::Race => write!(f, "race"),
            Self::Subrace => write!(f, "subrace"),
            Self::Class => write!(f, "class"),
            Self::Subclass => write!(f, "subclass"),
            Self::Background => write!(f, "background"),
            Self::Alignment => write!(f, "alignment"),
            Self::AbilityBase(a) => write!(f, "abilities.{}.base", a),
            Self::AbilityBonuses(a) => write!(f, "abilities.{}.bonuses", a),
            Self::Skills => write!(f, "skills"),
            Self::Proficiencies => write!(f, "proficiencies"),
            Self::Languages => write!(f, "languages"),
            Self::Features => write!(f, "features"),
            Self::Spells => write!(f, "spells"),
            Self::Inventory => write!(f, "inventory"),
            Self::Attacks => write!(f, "attacks"),
            Self::Beasts => write!(f, "beasts"),
        }
    }
}

/// Payload shape a field accepts.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum FieldKind {
    Text,
    Score,
    Strings,
    Bonuses,
    Spells,
    Items,
    Attacks,
    Beasts,
}

impl FieldKind {
    pub fn is_list(&self) -> bool {
        !matches!(self, Self::Text | Self::Score)
    }

    pub fn describe(&self) -> &'static str {
        match self {
            Self::Text => "text",
            Self::Score => "a score",
            Self::Strings => "a list of strings",
            Self::Bonuses => "a list of ability bonuses",
            Self::Spells => "a list of spells",
            Self::Items => "a list of inventory items",
            Self::Attacks => "a list of attacks",
            Self::Beasts => "a list of beasts",
        }
    }
}

/// A typed payload for one field.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(tag = "type", content = "value", rename_all = "snake_case")]
pub enum FieldValue {
    Text(String),
    Score(u8),
    Strings(Vec<String>),
    Bonuses(Vec<AbilityBonus>),
    Spells(Vec<SpellEntry>),
    Items(Vec<InventoryItem>),
    Attacks(Vec<Attack>),
    Beasts(Vec<BeastSelection>),
}

impl FieldValue {
    pub fn kind(&self) -> FieldKind {
        match self {
            Self::Text(_) => FieldKind::Text,
            Self::Score(_) => FieldKind::Score,
            Self::Strings(_) => FieldKind::Strings,
            Self::Bonuses(_) => FieldKind::Bonuses,
            Self::Spells(_) => FieldKind::Spells,
            Self::Items(_) => FieldKind::Items,
            Self::Attacks(_) => FieldKind::Attacks,
            Self::Beasts(_) => FieldKind::Beasts,
        }
    }

    pub fn as_strings(&self) -> Option<&[String]> {
        match self {
            Self::Strings(values) => Some(values),
            _ => None,
        }
    }

    /// Number of entries carried by a list payload (scalars count as one).
    pub fn len(&self) -> usize {
        match self {
            Self::Text(_) | Self::Score(_) => 1,
            Self::Strings(v) => v.len(),
            Self::Bonuses(v) => v.len(),
            Self::Spells(v) => v.len(),
            Self::Items(v) => v.len(),
            Self::Attacks(v) => v.len(),
            Self::Beasts(v) => v.len(),
        }
    }

    pub fn is_empty(&self) -> bool {
        self.len() == 0
    }

    /// Merge a later payload for the same field: lists append, scalars overwrite.
    fn merge(&mut self, later: FieldValue) {
        match (self, later) {
            (Self::Strings(a), Self::Strings(b)) => a.extend(b),
            (Self::Bonuses(a), Self::Bonuses(b)) => a.extend(b),
            (Self::Spells(a), Self::Spells(b)) => a.extend(b),
            (Self::Items(a), Self::Items(b)) => a.extend(b),
            (Self::Attacks(a), Self::Attacks(b)) => a.extend(b),
            (Self::Beasts(a), Self::Beasts(b)) => a.extend(b),
            (slot, later) => *slot = later,
        }
    }
}

/// One field/payload pair of a change set, as it appears on the wire.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct FieldChange {
    pub field: Field,
    pub value: FieldValue,
}

/// A scope's contribution: at most one payload per field, in first-touch order.
///
/// Valid by construction: every payload matches its field's kind.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(try_from = "Vec<FieldChange>", into = "Vec<FieldChange>")]
pub struct ChoiceChanges {
    entries: Vec<(Field, FieldValue)>,
}

impl ChoiceChanges {
    pub fn new() -> Self {
        Self::default()
    }

    /// Add a payload, merging with an earlier payload for the same field.
    ///
    /// # Errors
    ///
    /// Returns `DomainError::FieldMismatch` if the payload kind does not fit
    /// the field.
    pub fn insert(&mut self, field: Field, value: FieldValue) -> Result<(), DomainError> {
        if field.kind() != value.kind() {
            return Err(DomainError::field_mismatch(
                field.to_string(),
                field.kind().describe(),
                value.kind().describe(),
            ));
        }
        self.insert_checked(field, value);
        Ok(())
    }

    /// Caller guarantees `field.kind() == value.kind()`.
    pub(crate) fn insert_checked(&mut self, field: Field, value: FieldValue) {
        debug_assert_eq!(field.kind(), value.kind());
        match self.entries.iter_mut().find(|(f, _)| *f == field) {
            Some((_, existing)) => existing.merge(value),
            None => self.entries.push((field, value)),
        }
    }

    pub fn get(&self, field: Field) -> Option<&FieldValue> {
        self.entries
            .iter()
            .find(|(f, _)| *f == field)
            .map(|(_, v)| v)
    }

    /// Overwrite the payload for a field instead of merging into it.
    ///
    /// # Errors
    ///
    /// Returns `DomainError::FieldMismatch` if the payload kind does not fit
    /// the field.
    pub fn set(&mut self, field: Field, value: FieldValue) -> Result<(), DomainError> {
        if field.kind() != value.kind() {
            return Err(DomainError::field_mismatch(
                field.to_string(),
                field.kind().describe(),
                value.kind().describe(),
            ));
        }
        self.entries.retain(|(f, _)| *f != field);
        self.entries.push((field, value));
        Ok(())
    }

    pub fn iter(&self) -> impl Iterator<Item = (Field, &FieldValue)> {
        self.entries.iter().map(|(f, v)| (*f, v))
    }

    pub fn fields(&self) -> impl Iterator<Item = Field> + '_ {
        self.entries.iter().map(|(f, _)| *f)
    }

    pub fn is_empty(&self) -> bool {
        self.entries.is_empty()
    }
}

impl TryFrom<Vec<FieldChange>> for ChoiceChanges {
    type Error = DomainError;

    fn try_from(changes: Vec<FieldChange>) -> Result<Self, Self::Error> {
        let mut out = ChoiceChanges::new();
        for change in changes {
            out.insert(change.field, change.value)?;
        }
        Ok(out)
    }
}

impl From<ChoiceChanges> for Vec<FieldChange> {
    fn from(changes: ChoiceChanges) -> Self {
        changes
            .entries
            .into_iter()
            .map(|(field, value)| FieldChange { field, value })
            .collect()
    }
}
