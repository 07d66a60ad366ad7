//! Reactive character store.
//!
//! The store owns the session's `CharacterRecord` inside a `watch` channel.
//! Every mutation runs to completion under the channel's write lock, so a
//! subscriber only ever observes whole post-mutation snapshots, never a
//! record halfway through an apply or revert.

use charforge_domain::{CharacterRecord, Choice, ScopeId};
use tokio::sync::watch;

pub struct CharacterStore {
    tx: watch::Sender<CharacterRecord>,
}

impl Default for CharacterStore {
    fn default() -> Self {
        Self::new()
    }
}

impl CharacterStore {
    pub fn new() -> Self {
        Self::with_record(CharacterRecord::new())
    }

    pub fn with_record(record: CharacterRecord) -> Self {
        let (tx, _rx) = watch::channel(record);
        Self { tx }
    }

    /// Change stream. The current record counts as already seen.
    pub fn subscribe(&self) -> watch::Receiver<CharacterRecord> {
        self.tx.subscribe()
    }

    /// Run a read-only closure against the current record.
    pub fn read<R>(&self, f: impl FnOnce(&CharacterRecord) -> R) -> R {
        f(&self.tx.borrow())
    }

    pub fn snapshot(&self) -> CharacterRecord {
        self.tx.borrow().clone()
    }

    pub fn apply_choice(&self, choice: Choice) {
        self.tx.send_modify(|record| {
            record.apply_choice(choice);
            debug_assert!(record.is_consistent());
        });
    }

    pub fn apply_batch(&self, choices: Vec<Choice>) {
        self.tx.send_modify(|record| {
            record.apply_batch(choices);
            debug_assert!(record.is_consistent());
        });
    }

    /// Subscribers are only woken when a contribution was actually removed.
    pub fn smart_revert_scope(&self, scope: &ScopeId) -> bool {
        self.tx.send_if_modified(|record| {
            let reverted = record.smart_revert_scope(scope);
            debug_assert!(record.is_consistent());
            reverted
        })
    }

    pub fn can_safely_revert_scope(&self, scope: &ScopeId) -> bool {
        self.read(|record| record.can_safely_revert_scope(scope))
    }

    /// Run a compound mutation as one step.
    ///
    /// The closure reports whether it changed anything; subscribers are woken
    /// only if it did.
    pub(crate) fn modify_if(&self, f: impl FnOnce(&mut CharacterRecord) -> bool) -> bool {
        self.tx.send_if_modified(|record| {
            let modified = f(record);
            debug_assert!(record.is_consistent());
            modified
        })
    }

    /// The record as exported to downstream consumers.
    pub fn export_json(&self) -> Result<serde_json::Value, serde_json::Error> {
        self.read(|record| serde_json::to_value(record))
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use charforge_domain::{ScopeMeta, Tab};

    fn skills(id: &str, values: &[&str]) -> Choice {
        Choice::new(ScopeId::new(id).unwrap(), ScopeMeta::granted(Tab::Class))
            .skills(values.iter().copied())
    }

    #[tokio::test]
    async fn subscribers_see_each_mutation() {
        let store = CharacterStore::new();
        let mut rx = store.subscribe();

        store.apply_choice(skills("a", &["Perception"]));

        assert!(rx.has_changed().unwrap());
        assert_eq!(rx.borrow_and_update().sheet().skills(), &["Perception"]);
    }

    #[tokio::test]
    async fn reverting_an_absent_scope_does_not_notify() {
        let store = CharacterStore::new();
        store.apply_choice(skills("a", &["Perception"]));
        let mut rx = store.subscribe();

        assert!(!store.smart_revert_scope(&ScopeId::new("missing").unwrap()));
        assert!(!rx.has_changed().unwrap());

        assert!(store.smart_revert_scope(&ScopeId::new("a").unwrap()));
        assert!(rx.has_changed().unwrap());
        assert!(rx.borrow_and_update().sheet().skills().is_empty());
    }

    #[test]
    fn reapplying_a_scope_between_shared_values_stays_consistent() {
        let store = CharacterStore::new();
        store.apply_choice(skills("race:Elf", &["Perception"]));
        store.apply_choice(skills("class:Rogue", &["Stealth"]));
        store.apply_choice(skills("background:Outlander", &["Perception"]));

        store.apply_choice(skills("race:Elf", &["Insight"]));

        store.read(|record| {
            assert!(record.is_consistent());
            assert_eq!(record.sheet().skills(), &["Stealth", "Perception", "Insight"]);
        });
        assert!(store.smart_revert_scope(&ScopeId::new("class:Rogue").unwrap()));
        assert_eq!(store.read(|r| r.sheet().skills().to_vec()), vec!["Perception", "Insight"]);
    }

    #[test]
    fn export_includes_provenance() {
        let store = CharacterStore::new();
        store.apply_choice(skills("a", &["Perception"]));

        let json = store.export_json().unwrap();
        assert_eq!(json["skills"][0], "Perception");
        assert_eq!(json["_provenance"][0]["scope"], "a");
    }
}
