//! Suggested replacements for a duplicated pick.

use std::collections::HashMap;

use super::ConflictKind;

const SKILLS: &[&str] = &[
    "Acrobatics",
    "Animal Handling",
    "Arcana",
    "Athletics",
    "Deception",
    "History",
    "Insight",
    "Intimidation",
    "Investigation",
    "Medicine",
    "Nature",
    "Perception",
    "Performance",
    "Persuasion",
    "Religion",
    "Sleight of Hand",
    "Stealth",
    "Survival",
];

const LANGUAGES: &[&str] = &[
    "Common",
    "Dwarvish",
    "Elvish",
    "Giant",
    "Gnomish",
    "Goblin",
    "Halfling",
    "Orc",
    "Abyssal",
    "Celestial",
    "Draconic",
    "Deep Speech",
    "Infernal",
    "Primordial",
    "Sylvan",
    "Undercommon",
];

const TOOLS: &[&str] = &[
    "Alchemist's Supplies",
    "Brewer's Supplies",
    "Calligrapher's Supplies",
    "Carpenter's Tools",
    "Cartographer's Tools",
    "Cobbler's Tools",
    "Cook's Utensils",
    "Disguise Kit",
    "Forgery Kit",
    "Glassblower's Tools",
    "Herbalism Kit",
    "Jeweler's Tools",
    "Leatherworker's Tools",
    "Mason's Tools",
    "Navigator's Tools",
    "Painter's Supplies",
    "Poisoner's Kit",
    "Potter's Tools",
    "Smith's Tools",
    "Thieves' Tools",
    "Tinker's Tools",
    "Weaver's Tools",
    "Woodcarver's Tools",
];

const INSTRUMENTS: &[&str] = &[
    "Bagpipes",
    "Drum",
    "Dulcimer",
    "Flute",
    "Lute",
    "Lyre",
    "Horn",
    "Pan Flute",
    "Shawm",
    "Viol",
];

/// Groups of interchangeable picks, keyed by conflict kind.
///
/// A duplicated value's alternatives are the other members of its group.
#[derive(Debug, Clone, Default)]
pub struct AlternativeTable {
    groups: HashMap<ConflictKind, Vec<Vec<String>>>,
}

impl AlternativeTable {
    /// Skills, languages, artisan tools and instruments from the SRD.
    pub fn standard() -> Self {
        Self::default()
            .with_group(ConflictKind::Skill, SKILLS.iter().copied())
            .with_group(ConflictKind::Language, LANGUAGES.iter().copied())
            .with_group(ConflictKind::Proficiency, TOOLS.iter().copied())
            .with_group(ConflictKind::Proficiency, INSTRUMENTS.iter().copied())
    }

    pub fn with_group<I, S>(mut self, kind: ConflictKind, values: I) -> Self
    where
        I: IntoIterator<Item = S>,
        S: Into<String>,
    {
        self.groups
            .entry(kind)
            .or_default()
            .push(values.into_iter().map(Into::into).collect());
        self
    }

    /// Other members of the group holding `value`, in table order.
    ///
    /// Empty when no group of this kind contains the value.
    pub fn alternatives(&self, kind: ConflictKind, value: &str) -> Vec<&str> {
        self.groups
            .get(&kind)
            .and_then(|groups| groups.iter().find(|g| g.iter().any(|v| v == value)))
            .map(|group| {
                group
                    .iter()
                    .map(String::as_str)
                    .filter(|v| *v != value)
                    .collect()
            })
            .unwrap_or_default()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn skill_alternatives_exclude_the_value() {
        let table = AlternativeTable::standard();
        let alts = table.alternatives(ConflictKind::Skill, "Perception");
        assert_eq!(alts.len(), SKILLS.len() - 1);
        assert!(!alts.contains(&"Perception"));
    }

    #[test]
    fn tools_and_instruments_are_separate_groups() {
        let table = AlternativeTable::standard();
        let alts = table.alternatives(ConflictKind::Proficiency, "Lute");
        assert!(alts.contains(&"Flute"));
        assert!(!alts.contains(&"Smith's Tools"));
    }

    #[test]
    fn unknown_values_have_no_alternatives() {
        let table = AlternativeTable::standard();
        assert!(table
            .alternatives(ConflictKind::Proficiency, "Light Armor")
            .is_empty());
        assert!(table.alternatives(ConflictKind::Feature, "Darkvision").is_empty());
    }
}
