//! Spell cleanup: drop selected spells the character can no longer pick.

use std::sync::Arc;

use charforge_domain::spellcasting::level_of;
use charforge_domain::{
    CasterProfile, CharacterRecord, Field, FieldValue, ScopeId, SpellAccessProvider,
    SpellCatalog, SpellEntry,
};

use super::{CleanupPlan, CleanupRules};

const PACT_OF_THE_TOME: &str = "Pact of the Tome";
const PACT_PREFIX: &str = "Pact of the ";

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct SpellSnapshot {
    pub profile: CasterProfile,
    pub subrace: Option<String>,
    pub pact_boon: Option<String>,
    pub features: Vec<String>,
}

pub struct SpellCleanupRules {
    access: Arc<dyn SpellAccessProvider>,
    catalog: Arc<dyn SpellCatalog>,
}

impl SpellCleanupRules {
    pub fn new(access: Arc<dyn SpellAccessProvider>, catalog: Arc<dyn SpellCatalog>) -> Self {
        Self { access, catalog }
    }

    fn allows(&self, snapshot: &SpellSnapshot, spell: &SpellEntry) -> bool {
        let offered = self
            .access
            .spell_access(&snapshot.profile)
            .iter()
            .any(|entry| entry.chooseable && entry.offers(&spell.name));
        if offered {
            return true;
        }
        // The Book of Shadows holds cantrips from any class list
        snapshot.pact_boon.as_deref() == Some(PACT_OF_THE_TOME)
            && level_of(self.catalog.as_ref(), &spell.name) == Some(0)
    }
}

impl CleanupRules for SpellCleanupRules {
    type Snapshot = SpellSnapshot;

    fn name(&self) -> &'static str {
        "spells"
    }

    fn title(&self) -> &'static str {
        "Spells removed"
    }

    fn snapshot(&self, record: &CharacterRecord) -> SpellSnapshot {
        let sheet = record.sheet();
        SpellSnapshot {
            profile: CasterProfile {
                class: sheet.class().map(str::to_string),
                subclass: sheet.subclass().map(str::to_string),
                race: sheet.race().map(str::to_string),
            },
            subrace: sheet.subrace().map(str::to_string),
            pact_boon: sheet
                .features()
                .iter()
                .find(|f| f.starts_with(PACT_PREFIX))
                .cloned(),
            features: sheet.features().to_vec(),
        }
    }

    fn plan(
        &self,
        _previous: &SpellSnapshot,
        current: &SpellSnapshot,
        record: &CharacterRecord,
    ) -> Option<CleanupPlan> {
        let contribution = record.contribution(&ScopeId::spell_selections())?;
        let Some(FieldValue::Spells(selected)) = contribution.changes.get(Field::Spells) else {
            return None;
        };

        let (kept, dropped): (Vec<SpellEntry>, Vec<SpellEntry>) = selected
            .iter()
            .cloned()
            .partition(|spell| self.allows(current, spell));
        if dropped.is_empty() {
            return None;
        }

        let caster = [
            current.profile.class.as_deref(),
            current.profile.subclass.as_deref(),
        ]
        .into_iter()
        .flatten()
        .collect::<Vec<_>>()
        .join(" / ");
        let reason = if caster.is_empty() {
            "no longer available".to_string()
        } else {
            format!("no longer available to {}", caster)
        };

        let choice = contribution
            .to_choice_with(Field::Spells, FieldValue::Spells(kept))
            .ok()?;
        Some(CleanupPlan {
            choices: vec![choice],
            reverts: Vec::new(),
            removed: dropped.into_iter().map(|s| s.name).collect(),
            reason,
        })
    }
}

#[cfg(test)]
mod tests {
    use std::time::Duration;

    use super::*;
    use crate::infrastructure::notifications::InMemoryNotifier;
    use crate::infrastructure::reference_data::StaticSpellData;
    use crate::stores::CharacterStore;
    use crate::use_cases::cleanup::test_support::settle;
    use crate::use_cases::cleanup::CleanupService;
    use charforge_domain::{Choice, ScopeMeta, Tab};

    const DATA: &str = r#"{
        "spells": [
            { "name": "Eldritch Blast", "level": 0 },
            { "name": "Guidance", "level": 0 },
            { "name": "Hex", "level": 1 }
        ],
        "access": [
            { "class": "Warlock", "entries": [
                { "source": "class", "chooseable": true, "chooseCantripCount": 2,
                  "chooseSpellCount": 2, "chooseFrom": ["Eldritch Blast", "Hex"] }
            ]}
        ]
    }"#;

    fn rules() -> SpellCleanupRules {
        let data = Arc::new(StaticSpellData::from_json_str(DATA).unwrap());
        SpellCleanupRules::new(data.clone(), data)
    }

    fn warlock(features: &[&str]) -> Choice {
        Choice::new(
            ScopeId::new("class:Warlock").unwrap(),
            ScopeMeta::granted(Tab::Class),
        )
        .class("Warlock")
        .features(features.iter().copied())
    }

    fn selections(names: &[&str]) -> Choice {
        Choice::new(ScopeId::spell_selections(), ScopeMeta::selected(Tab::Spells))
            .spells(names.iter().map(|n| SpellEntry::new(*n)).collect())
    }

    #[test]
    fn tome_keeps_foreign_cantrips() {
        let rules = rules();
        let mut record = CharacterRecord::new();
        record.apply_choice(warlock(&["Pact of the Tome"]));
        record.apply_choice(selections(&["Eldritch Blast", "Guidance", "Hex"]));
        let with_tome = rules.snapshot(&record);
        assert_eq!(with_tome.pact_boon.as_deref(), Some("Pact of the Tome"));

        record.apply_choice(warlock(&["Pact of the Blade"]));
        let with_blade = rules.snapshot(&record);

        assert!(rules.plan(&with_blade, &with_tome, &record).is_none());
        let plan = rules.plan(&with_tome, &with_blade, &record).unwrap();
        assert_eq!(plan.removed, vec!["Guidance".to_string()]);
        assert_eq!(plan.reason, "no longer available to Warlock");
    }

    #[tokio::test(start_paused = true)]
    async fn class_change_drops_unavailable_spells() {
        let store = Arc::new(CharacterStore::new());
        store.apply_choice(warlock(&[]));
        store.apply_choice(selections(&["Eldritch Blast", "Hex"]));
        let notifier = Arc::new(InMemoryNotifier::new());
        let service = CleanupService::new(
            store.clone(),
            notifier.clone(),
            rules(),
            Duration::from_secs(5),
        );
        service.initialize();

        store.apply_choice(
            Choice::new(
                ScopeId::new("class:Warlock").unwrap(),
                ScopeMeta::granted(Tab::Class),
            )
            .class("Sorcerer"),
        );
        settle().await;

        assert!(store.read(|r| r.sheet().spells().is_empty()));
        let received = notifier.take();
        assert_eq!(received.len(), 1);
        assert_eq!(
            received[0].message,
            "Removed Eldritch Blast, Hex: no longer available to Sorcerer"
        );
        service.shutdown().await;
    }
}
