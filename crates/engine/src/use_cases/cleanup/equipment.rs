//! Equipment cleanup: drop equipment choices that need a lost proficiency.
//!
//! Swapping a subclass retracts the old subclass's proficiencies and grants
//! the new one's in quick succession. The pass is debounced so equipment that
//! is valid again once the swap settles is left alone.

use std::time::Duration;

use charforge_domain::{CharacterRecord, Field, FieldValue, InventoryItem, Tab};

use super::{CleanupPlan, CleanupRules};

pub const DEFAULT_EQUIPMENT_DEBOUNCE: Duration = Duration::from_millis(250);

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct EquipmentSnapshot {
    pub class: Option<String>,
    pub subclass: Option<String>,
    pub race: Option<String>,
    pub subrace: Option<String>,
    pub proficiencies: Vec<String>,
}

#[derive(Debug)]
pub struct EquipmentCleanupRules {
    debounce: Duration,
}

impl Default for EquipmentCleanupRules {
    fn default() -> Self {
        Self::new(DEFAULT_EQUIPMENT_DEBOUNCE)
    }
}

impl EquipmentCleanupRules {
    pub fn new(debounce: Duration) -> Self {
        Self { debounce }
    }
}

impl CleanupRules for EquipmentCleanupRules {
    type Snapshot = EquipmentSnapshot;

    fn name(&self) -> &'static str {
        "equipment"
    }

    fn title(&self) -> &'static str {
        "Equipment removed"
    }

    fn debounce(&self) -> Option<Duration> {
        Some(self.debounce)
    }

    fn snapshot(&self, record: &CharacterRecord) -> EquipmentSnapshot {
        let sheet = record.sheet();
        EquipmentSnapshot {
            class: sheet.class().map(str::to_string),
            subclass: sheet.subclass().map(str::to_string),
            race: sheet.race().map(str::to_string),
            subrace: sheet.subrace().map(str::to_string),
            proficiencies: sheet.proficiencies().to_vec(),
        }
    }

    fn plan(
        &self,
        previous: &EquipmentSnapshot,
        current: &EquipmentSnapshot,
        record: &CharacterRecord,
    ) -> Option<CleanupPlan> {
        // Only lost proficiencies matter; gaining one never invalidates gear
        let lost: Vec<&str> = previous
            .proficiencies
            .iter()
            .filter(|p| !current.proficiencies.contains(p))
            .map(String::as_str)
            .collect();
        if lost.is_empty() {
            return None;
        }

        let invalid = |item: &InventoryItem| item.requires.iter().any(|r| lost.contains(&r.as_str()));

        let mut plan = CleanupPlan {
            reason: format!("lost proficiency in {}", lost.join(", ")),
            ..CleanupPlan::default()
        };
        for contribution in record.provenance().on_tab(Tab::Equipment) {
            let Some(FieldValue::Items(items)) = contribution.changes.get(Field::Inventory) else {
                continue;
            };
            if !items.iter().any(invalid) {
                continue;
            }
            let (dropped, kept): (Vec<InventoryItem>, Vec<InventoryItem>) =
                items.iter().cloned().partition(|item| invalid(item));
            match contribution.to_choice_with(Field::Inventory, FieldValue::Items(kept)) {
                Ok(choice) => {
                    plan.removed.extend(dropped.into_iter().map(|item| item.name));
                    plan.choices.push(choice);
                }
                Err(e) => tracing::warn!(scope = %contribution.scope, error = %e, "Skipping equipment cleanup"),
            }
        }

        (!plan.is_empty()).then_some(plan)
    }
}

#[cfg(test)]
mod tests {
    use std::sync::Arc;

    use super::*;
    use crate::infrastructure::notifications::InMemoryNotifier;
    use crate::stores::CharacterStore;
    use crate::use_cases::cleanup::test_support::settle;
    use crate::use_cases::cleanup::CleanupService;
    use charforge_domain::{Choice, ScopeId, ScopeMeta};

    fn subclass(name: &str, proficiencies: &[&str]) -> Choice {
        Choice::new(
            ScopeId::new("subclass").unwrap(),
            ScopeMeta::selected(Tab::Class),
        )
        .subclass(name)
        .proficiencies(proficiencies.iter().copied())
    }

    fn cleric_with_heavy_armor() -> Arc<CharacterStore> {
        let store = Arc::new(CharacterStore::new());
        store.apply_choice(
            Choice::new(ScopeId::new("class:Cleric").unwrap(), ScopeMeta::granted(Tab::Class))
                .class("Cleric")
                .proficiencies(["Light Armor", "Medium Armor"]),
        );
        store.apply_choice(subclass("Life Domain", &["Heavy Armor"]));
        store.apply_choice(
            Choice::new(ScopeId::class_equipment(0), ScopeMeta::selected(Tab::Equipment))
                .inventory(vec![
                    InventoryItem::new("Chain Mail").requiring("Heavy Armor"),
                    InventoryItem::new("Mace"),
                ]),
        );
        store
    }

    fn armed(store: &Arc<CharacterStore>) -> (CleanupService<EquipmentCleanupRules>, Arc<InMemoryNotifier>) {
        let notifier = Arc::new(InMemoryNotifier::new());
        let service = CleanupService::new(
            store.clone(),
            notifier.clone(),
            EquipmentCleanupRules::default(),
            Duration::from_secs(5),
        );
        service.initialize();
        (service, notifier)
    }

    #[tokio::test(start_paused = true)]
    async fn regaining_within_the_window_keeps_equipment() {
        let store = cleric_with_heavy_armor();
        let (service, notifier) = armed(&store);

        store.apply_choice(subclass("Trickery Domain", &[]));
        settle().await;
        tokio::time::sleep(Duration::from_millis(100)).await;
        store.apply_choice(subclass("War Domain", &["Heavy Armor"]));
        settle().await;

        tokio::time::sleep(Duration::from_millis(500)).await;

        let names: Vec<String> =
            store.read(|r| r.sheet().inventory().iter().map(|i| i.name.clone()).collect());
        assert_eq!(names, vec!["Chain Mail", "Mace"]);
        assert!(notifier.is_empty());
        service.shutdown().await;
    }

    #[tokio::test(start_paused = true)]
    async fn losing_for_good_removes_dependent_equipment() {
        let store = cleric_with_heavy_armor();
        let (service, notifier) = armed(&store);

        store.apply_choice(subclass("Trickery Domain", &[]));
        settle().await;

        // Still inside the window
        tokio::time::sleep(Duration::from_millis(100)).await;
        assert_eq!(store.read(|r| r.sheet().inventory().len()), 2);

        tokio::time::sleep(Duration::from_millis(300)).await;

        let names: Vec<String> =
            store.read(|r| r.sheet().inventory().iter().map(|i| i.name.clone()).collect());
        assert_eq!(names, vec!["Mace"]);
        let received = notifier.take();
        assert_eq!(received.len(), 1);
        assert_eq!(
            received[0].message,
            "Removed Chain Mail: lost proficiency in Heavy Armor"
        );
        service.shutdown().await;
    }

    #[tokio::test(start_paused = true)]
    async fn shutdown_drops_a_pending_pass() {
        let store = cleric_with_heavy_armor();
        let (service, notifier) = armed(&store);

        store.apply_choice(subclass("Trickery Domain", &[]));
        settle().await;
        service.shutdown().await;

        tokio::time::sleep(Duration::from_millis(500)).await;

        assert_eq!(store.read(|r| r.sheet().inventory().len()), 2);
        assert!(notifier.is_empty());
    }

    #[test]
    fn gained_proficiencies_never_invalidate() {
        let rules = EquipmentCleanupRules::default();
        let store = cleric_with_heavy_armor();
        let record = store.snapshot();
        let current = rules.snapshot(&record);
        let mut previous = current.clone();
        previous.proficiencies.retain(|p| p != "Heavy Armor");

        assert!(rules.plan(&previous, &current, &record).is_none());
    }
}
