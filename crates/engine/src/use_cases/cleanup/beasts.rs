//! Beast cleanup: familiars, pact companions, animal companions, wild shapes.

use charforge_domain::{
    BeastKind, BeastSelection, CharacterRecord, Field, FieldValue, ScopeId,
};

use super::{CleanupPlan, CleanupRules};

const FIND_FAMILIAR: &str = "Find Familiar";
const PACT_OF_THE_CHAIN: &str = "Pact of the Chain";
const BEAST_MASTER: &str = "Beast Master";
const DRUID: &str = "Druid";

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct BeastSnapshot {
    pub class: Option<String>,
    pub subclass: Option<String>,
    pub race: Option<String>,
    pub subrace: Option<String>,
    pub spells: Vec<String>,
    pub features: Vec<String>,
}

impl BeastSnapshot {
    /// Why a beast of this kind is not allowed, or `None` if it is.
    fn rejects(&self, kind: BeastKind) -> Option<&'static str> {
        match kind {
            BeastKind::Familiar if !self.spells.iter().any(|s| s == FIND_FAMILIAR) => {
                Some("Find Familiar is no longer known")
            }
            BeastKind::ChainPact if !self.features.iter().any(|f| f == PACT_OF_THE_CHAIN) => {
                Some("Pact of the Chain is no longer chosen")
            }
            BeastKind::Companion if self.subclass.as_deref() != Some(BEAST_MASTER) => {
                Some("the Beast Master subclass is no longer chosen")
            }
            BeastKind::WildShape if self.class.as_deref() != Some(DRUID) => {
                Some("only druids can wild shape")
            }
            _ => None,
        }
    }
}

#[derive(Debug, Default)]
pub struct BeastCleanupRules;

impl BeastCleanupRules {
    pub fn new() -> Self {
        Self
    }
}

impl CleanupRules for BeastCleanupRules {
    type Snapshot = BeastSnapshot;

    fn name(&self) -> &'static str {
        "beasts"
    }

    fn title(&self) -> &'static str {
        "Beasts removed"
    }

    fn snapshot(&self, record: &CharacterRecord) -> BeastSnapshot {
        let sheet = record.sheet();
        BeastSnapshot {
            class: sheet.class().map(str::to_string),
            subclass: sheet.subclass().map(str::to_string),
            race: sheet.race().map(str::to_string),
            subrace: sheet.subrace().map(str::to_string),
            spells: sheet.spells().iter().map(|s| s.name.clone()).collect(),
            features: sheet.features().to_vec(),
        }
    }

    fn plan(
        &self,
        previous: &BeastSnapshot,
        current: &BeastSnapshot,
        record: &CharacterRecord,
    ) -> Option<CleanupPlan> {
        let contribution = record.contribution(&ScopeId::beast_selections())?;
        let Some(FieldValue::Beasts(selected)) = contribution.changes.get(Field::Beasts) else {
            return None;
        };
        if selected.is_empty() {
            return None;
        }

        let (kept, removed, reasons): (Vec<BeastSelection>, Vec<String>, Vec<&str>) =
            if previous.class != current.class {
                // Any class change clears beasts, even to a class that has them
                (
                    Vec::new(),
                    selected.iter().map(|b| b.name.clone()).collect(),
                    vec!["the class changed"],
                )
            } else {
                let mut kept = Vec::new();
                let mut removed = Vec::new();
                let mut reasons = Vec::new();
                for beast in selected {
                    match current.rejects(beast.kind) {
                        Some(reason) => {
                            removed.push(beast.name.clone());
                            if !reasons.contains(&reason) {
                                reasons.push(reason);
                            }
                        }
                        None => kept.push(beast.clone()),
                    }
                }
                (kept, removed, reasons)
            };

        if removed.is_empty() {
            return None;
        }

        let choice = contribution
            .to_choice_with(Field::Beasts, FieldValue::Beasts(kept))
            .ok()?;
        Some(CleanupPlan {
            choices: vec![choice],
            reverts: Vec::new(),
            removed,
            reason: reasons.join("; "),
        })
    }
}

#[cfg(test)]
mod tests {
    use std::sync::Arc;
    use std::time::Duration;

    use super::*;
    use crate::infrastructure::notifications::InMemoryNotifier;
    use crate::stores::CharacterStore;
    use crate::use_cases::cleanup::test_support::settle;
    use crate::use_cases::cleanup::CleanupService;
    use charforge_domain::{Choice, ScopeMeta, SpellEntry, Tab};

    fn scope(id: &str) -> ScopeId {
        ScopeId::new(id).unwrap()
    }

    fn wizard_with_familiar() -> Arc<CharacterStore> {
        let store = Arc::new(CharacterStore::new());
        store.apply_choice(
            Choice::new(scope("class:Wizard"), ScopeMeta::granted(Tab::Class)).class("Wizard"),
        );
        store.apply_choice(
            Choice::new(ScopeId::spell_selections(), ScopeMeta::selected(Tab::Spells)).spells(
                vec![SpellEntry::new("Find Familiar"), SpellEntry::new("Sleep")],
            ),
        );
        store.apply_choice(
            Choice::new(ScopeId::beast_selections(), ScopeMeta::selected(Tab::Beasts))
                .beasts(vec![BeastSelection::new("Owl", BeastKind::Familiar)]),
        );
        store
    }

    fn armed(store: &Arc<CharacterStore>) -> (CleanupService<BeastCleanupRules>, Arc<InMemoryNotifier>) {
        let notifier = Arc::new(InMemoryNotifier::new());
        let service = CleanupService::new(
            store.clone(),
            notifier.clone(),
            BeastCleanupRules::new(),
            Duration::from_secs(5),
        );
        service.initialize();
        (service, notifier)
    }

    #[tokio::test(start_paused = true)]
    async fn losing_find_familiar_removes_the_familiar() {
        let store = wizard_with_familiar();
        let (service, notifier) = armed(&store);

        store.apply_choice(
            Choice::new(ScopeId::spell_selections(), ScopeMeta::selected(Tab::Spells))
                .spells(vec![SpellEntry::new("Sleep")]),
        );
        settle().await;

        assert!(store.read(|r| r.sheet().beasts().is_empty()));
        let received = notifier.take();
        assert_eq!(received.len(), 1);
        assert!(received[0].message.contains("Owl"));
        assert!(received[0].message.contains("Find Familiar"));
        service.shutdown().await;
    }

    #[tokio::test(start_paused = true)]
    async fn class_change_removes_every_beast() {
        let store = wizard_with_familiar();
        let (service, notifier) = armed(&store);

        store.apply_choice(
            Choice::new(scope("class:Wizard"), ScopeMeta::granted(Tab::Class)).class("Fighter"),
        );
        settle().await;

        assert!(store.read(|r| r.sheet().beasts().is_empty()));
        assert!(store.read(|r| r.sheet().has_spell("Find Familiar")));
        assert_eq!(notifier.len(), 1);
        service.shutdown().await;
    }

    #[tokio::test(start_paused = true)]
    async fn valid_beasts_survive_unrelated_changes() {
        let store = wizard_with_familiar();
        let (service, notifier) = armed(&store);

        store.apply_choice(
            Choice::new(scope("race:Gnome"), ScopeMeta::granted(Tab::Species)).race("Gnome"),
        );
        settle().await;

        assert_eq!(store.read(|r| r.sheet().beasts().len()), 1);
        assert!(notifier.is_empty());
        service.shutdown().await;
    }

    #[test]
    fn chain_pact_needs_the_feature() {
        let rules = BeastCleanupRules::new();
        let mut record = CharacterRecord::new();
        record.apply_choice(
            Choice::new(scope("class:Warlock"), ScopeMeta::granted(Tab::Class))
                .class("Warlock")
                .features(["Pact of the Chain"]),
        );
        record.apply_choice(
            Choice::new(ScopeId::beast_selections(), ScopeMeta::selected(Tab::Beasts))
                .beasts(vec![BeastSelection::new("Imp", BeastKind::ChainPact)]),
        );
        let before = rules.snapshot(&record);

        record.smart_revert_scope(&scope("class:Warlock"));
        record.apply_choice(
            Choice::new(scope("class:Warlock"), ScopeMeta::granted(Tab::Class)).class("Warlock"),
        );
        let after = rules.snapshot(&record);

        let plan = rules.plan(&before, &after, &record).unwrap();
        assert_eq!(plan.removed, vec!["Imp".to_string()]);
        assert_eq!(plan.reason, "Pact of the Chain is no longer chosen");
    }
}
