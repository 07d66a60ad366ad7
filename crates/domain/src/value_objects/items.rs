//! Structured entries of the record's list fields.
//!
//! Entries compare by value: two scopes granting the same item with the same
//! payload contribute equal entries, which is what provenance accounting
//! counts against.

use serde::{Deserialize, Serialize};

/// A piece of equipment on the character.
#[derive(Debug, Clone, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct InventoryItem {
    pub name: String,
    #[serde(default = "default_quantity")]
    pub quantity: u32,
    /// Proficiencies the character must hold for this choice to stay valid
    #[serde(default)]
    pub requires: Vec<String>,
}

fn default_quantity() -> u32 {
    1
}

impl InventoryItem {
    pub fn new(name: impl Into<String>) -> Self {
        Self {
            name: name.into(),
            quantity: 1,
            requires: Vec::new(),
        }
    }

    pub fn with_quantity(mut self, quantity: u32) -> Self {
        self.quantity = quantity;
        self
    }

    pub fn requiring(mut self, proficiency: impl Into<String>) -> Self {
        self.requires.push(proficiency.into());
        self
    }
}

/// An attack row on the sheet.
#[derive(Debug, Clone, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Attack {
    pub name: String,
    /// Attack bonus as printed (e.g., "+5")
    pub bonus: String,
    /// Damage expression (e.g., "1d8+3 slashing")
    pub damage: String,
}

/// A spell on the character's list.
#[derive(Debug, Clone, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct SpellEntry {
    pub name: String,
    /// Where the spell came from (e.g., "Wizard", "High Elf")
    #[serde(default)]
    pub origin: Option<String>,
}

impl SpellEntry {
    pub fn new(name: impl Into<String>) -> Self {
        Self {
            name: name.into(),
            origin: None,
        }
    }

    pub fn from_origin(name: impl Into<String>, origin: impl Into<String>) -> Self {
        Self {
            name: name.into(),
            origin: Some(origin.into()),
        }
    }
}

/// What granted a beast selection.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum BeastKind {
    /// Summoned through the Find Familiar spell
    Familiar,
    /// Warlock Pact of the Chain familiar
    ChainPact,
    /// Ranger companion
    Companion,
    /// Druid wild shape form
    WildShape,
}

/// A beast chosen in the beast picker.
#[derive(Debug, Clone, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct BeastSelection {
    pub name: String,
    pub kind: BeastKind,
}

impl BeastSelection {
    pub fn new(name: impl Into<String>, kind: BeastKind) -> Self {
        Self {
            name: name.into(),
            kind,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn inventory_item_defaults_quantity_when_deserializing() {
        let item: InventoryItem = serde_json::from_str(r#"{"name":"Rapier"}"#).unwrap();
        assert_eq!(item.quantity, 1);
        assert!(item.requires.is_empty());
    }

    #[test]
    fn items_with_same_payload_are_equal() {
        let a = InventoryItem::new("Longbow").requiring("Martial Weapons");
        let b = InventoryItem::new("Longbow").requiring("Martial Weapons");
        assert_eq!(a, b);
        assert_ne!(a, InventoryItem::new("Longbow"));
    }

    #[test]
    fn beast_kind_serializes_snake_case() {
        let beast = BeastSelection::new("Owl", BeastKind::ChainPact);
        let json = serde_json::to_value(&beast).unwrap();
        assert_eq!(json["kind"], "chain_pact");
    }
}
