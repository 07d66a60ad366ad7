//! The character's data, as the PDF mapper and the cleanup services read it.

use serde::Serialize;

use super::field::{Field, FieldValue};
use crate::value_objects::{
    AbilityBonus, AbilityScores, Attack, BeastSelection, InventoryItem, SpellEntry,
};

/// Every field of the record except provenance.
///
/// Read-only outside the crate; `CharacterRecord` is the only writer.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct CharacterSheet {
    name: Option<String>,
    race: Option<String>,
    subrace: Option<String>,
    class: Option<String>,
    subclass: Option<String>,
    background: Option<String>,
    alignment: Option<String>,
    abilities: AbilityScores,
    skills: Vec<String>,
    proficiencies: Vec<String>,
    languages: Vec<String>,
    features: Vec<String>,
    spells: Vec<SpellEntry>,
    inventory: Vec<InventoryItem>,
    attacks: Vec<Attack>,
    beasts: Vec<BeastSelection>,
}

/// Mutable view of one field, typed by its kind.
pub(crate) enum FieldSlot<'a> {
    Text(&'a mut Option<String>),
    Score(&'a mut Option<u8>),
    Strings(&'a mut Vec<String>),
    Bonuses(&'a mut Vec<AbilityBonus>),
    Spells(&'a mut Vec<SpellEntry>),
    Items(&'a mut Vec<InventoryItem>),
    Attacks(&'a mut Vec<Attack>),
    Beasts(&'a mut Vec<BeastSelection>),
}

impl CharacterSheet {
    // =========================================================================
    // Identity
    // =========================================================================

    pub fn name(&self) -> Option<&str> {
        self.name.as_deref()
    }

    pub fn race(&self) -> Option<&str> {
        self.race.as_deref()
    }

    pub fn subrace(&self) -> Option<&str> {
        self.subrace.as_deref()
    }

    pub fn class(&self) -> Option<&str> {
        self.class.as_deref()
    }

    pub fn subclass(&self) -> Option<&str> {
        self.subclass.as_deref()
    }

    pub fn background(&self) -> Option<&str> {
        self.background.as_deref()
    }

    pub fn alignment(&self) -> Option<&str> {
        self.alignment.as_deref()
    }

    // =========================================================================
    // Accumulators
    // =========================================================================

    pub fn abilities(&self) -> &AbilityScores {
        &self.abilities
    }

    pub fn skills(&self) -> &[String] {
        &self.skills
    }

    pub fn proficiencies(&self) -> &[String] {
        &self.proficiencies
    }

    pub fn languages(&self) -> &[String] {
        &self.languages
    }

    pub fn features(&self) -> &[String] {
        &self.features
    }

    pub fn spells(&self) -> &[SpellEntry] {
        &self.spells
    }

    pub fn inventory(&self) -> &[InventoryItem] {
        &self.inventory
    }

    pub fn attacks(&self) -> &[Attack] {
        &self.attacks
    }

    pub fn beasts(&self) -> &[BeastSelection] {
        &self.beasts
    }

    pub fn has_feature(&self, name: &str) -> bool {
        self.features.iter().any(|f| f == name)
    }

    pub fn has_spell(&self, name: &str) -> bool {
        self.spells.iter().any(|s| s.name == name)
    }

    pub fn has_proficiency(&self, name: &str) -> bool {
        self.proficiencies.iter().any(|p| p == name)
    }

    /// Current contents of the list of strings backing a string field.
    pub fn strings(&self, field: Field) -> Option<&[String]> {
        match field {
            Field::Skills => Some(&self.skills),
            Field::Proficiencies => Some(&self.proficiencies),
            Field::Languages => Some(&self.languages),
            Field::Features => Some(&self.features),
            _ => None,
        }
    }

    /// Snapshot of one field as a payload (`None` for unset scalars).
    pub fn value_of(&self, field: Field) -> Option<FieldValue> {
        let text = |v: &Option<String>| v.clone().map(FieldValue::Text);
        match field {
            Field::Name => text(&self.name),
            Field::Race => text(&self.race),
            Field::Subrace => text(&self.subrace),
            Field::Class => text(&self.class),
            Field::Subclass => text(&self.subclass),
            Field::Background => text(&self.background),
            Field::Alignment => text(&self.alignment),
            Field::AbilityBase(a) => self.abilities.get(a).base.map(FieldValue::Score),
            Field::AbilityBonuses(a) => {
                Some(FieldValue::Bonuses(self.abilities.get(a).bonuses.clone()))
            }
            Field::Skills => Some(FieldValue::Strings(self.skills.clone())),
            Field::Proficiencies => Some(FieldValue::Strings(self.proficiencies.clone())),
            Field::Languages => Some(FieldValue::Strings(self.languages.clone())),
            Field::Features => Some(FieldValue::Strings(self.features.clone())),
            Field::Spells => Some(FieldValue::Spells(self.spells.clone())),
            Field::Inventory => Some(FieldValue::Items(self.inventory.clone())),
            Field::Attacks => Some(FieldValue::Attacks(self.attacks.clone())),
            Field::Beasts => Some(FieldValue::Beasts(self.beasts.clone())),
        }
    }

    pub(crate) fn slot_mut(&mut self, field: Field) -> FieldSlot<'_> {
        match field {
            Field::Name => FieldSlot::Text(&mut self.name),
            Field::Race => FieldSlot::Text(&mut self.race),
            Field::Subrace => FieldSlot::Text(&mut self.subrace),
            Field::Class => FieldSlot::Text(&mut self.class),
            Field::Subclass => FieldSlot::Text(&mut self.subclass),
            Field::Background => FieldSlot::Text(&mut self.background),
            Field::Alignment => FieldSlot::Text(&mut self.alignment),
            Field::AbilityBase(a) => FieldSlot::Score(&mut self.abilities.get_mut(a).base),
            Field::AbilityBonuses(a) => FieldSlot::Bonuses(&mut self.abilities.get_mut(a).bonuses),
            Field::Skills => FieldSlot::Strings(&mut self.skills),
            Field::Proficiencies => FieldSlot::Strings(&mut self.proficiencies),
            Field::Languages => FieldSlot::Strings(&mut self.languages),
            Field::Features => FieldSlot::Strings(&mut self.features),
            Field::Spells => FieldSlot::Spells(&mut self.spells),
            Field::Inventory => FieldSlot::Items(&mut self.inventory),
            Field::Attacks => FieldSlot::Attacks(&mut self.attacks),
            Field::Beasts => FieldSlot::Beasts(&mut self.beasts),
        }
    }
}
