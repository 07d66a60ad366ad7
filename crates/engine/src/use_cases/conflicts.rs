//! Conflict use cases - detection and resolution against the live store.

use std::sync::Arc;

use charforge_domain::conflicts::{self, AlternativeTable, AutoResolveOutcome, ResolutionOptions};
use charforge_domain::{
    Conflict, ConflictReport, ScopeId, SpellAccessProvider, SpellCatalog, SpellRules,
};

use crate::stores::CharacterStore;

pub struct ConflictUseCases {
    store: Arc<CharacterStore>,
    access: Arc<dyn SpellAccessProvider>,
    catalog: Arc<dyn SpellCatalog>,
    alternatives: AlternativeTable,
}

impl ConflictUseCases {
    pub fn new(
        store: Arc<CharacterStore>,
        access: Arc<dyn SpellAccessProvider>,
        catalog: Arc<dyn SpellCatalog>,
    ) -> Self {
        Self {
            store,
            access,
            catalog,
            alternatives: AlternativeTable::standard(),
        }
    }

    pub fn with_alternatives(mut self, alternatives: AlternativeTable) -> Self {
        self.alternatives = alternatives;
        self
    }

    fn rules(&self) -> SpellRules<'_> {
        SpellRules::new(self.access.as_ref(), self.catalog.as_ref())
    }

    pub fn detect(&self) -> ConflictReport {
        self.store
            .read(|record| conflicts::detect_conflicts(record, self.rules()))
    }

    pub fn options(&self, conflict: &Conflict) -> ResolutionOptions {
        self.store.read(|record| {
            conflicts::resolution_options(record, conflict, &self.alternatives)
        })
    }

    /// Revert the user's side of every mixed conflict in one store update.
    pub fn auto_resolve(&self) -> AutoResolveOutcome {
        let rules = self.rules();
        let mut outcome = AutoResolveOutcome::default();
        self.store.modify_if(|record| {
            outcome = conflicts::auto_resolve_conflicts(record, rules);
            outcome.resolved > 0
        });
        outcome
    }

    /// Revert one source of a conflict; `true` if the conflict is gone.
    pub fn resolve_by_reverting(&self, conflict: &Conflict, scope: &ScopeId) -> bool {
        let rules = self.rules();
        let mut resolved = false;
        self.store.modify_if(|record| {
            let before = record.provenance().len();
            resolved = conflicts::resolve_conflict_by_reverting(record, rules, conflict, scope);
            record.provenance().len() != before
        });
        resolved
    }

    pub fn has_manual_conflicts(&self) -> bool {
        self.store
            .read(|record| conflicts::has_manual_conflicts(record, self.rules()))
    }
}
