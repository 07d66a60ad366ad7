//! Conflict detection over the provenance ledger.
//!
//! A conflict is a value more than one scope contributed (a character
//! proficient in Perception twice over), or spell selections that exceed what
//! the character's spell access allows. Detection is a pure function of the
//! record; resolution lives in [`resolution`].

mod alternatives;
pub mod resolution;
mod spell_limits;

pub use alternatives::AlternativeTable;
pub use resolution::{
    auto_resolve_conflicts, describe_scope, has_manual_conflicts, resolution_options,
    resolve_conflict_by_reverting, AutoResolveOutcome, ResolutionAction, ResolutionOptions,
};
pub use spell_limits::{spell_limit_violations, SpellLimitViolation};

use std::collections::BTreeMap;
use std::fmt;

use serde::{Deserialize, Serialize};

use crate::record::{CharacterRecord, Field};
use crate::spellcasting::{SpellAccessProvider, SpellCatalog};
use crate::value_objects::{ScopeId, Tab};

/// Spell reference data conflict detection reads.
#[derive(Clone, Copy)]
pub struct SpellRules<'a> {
    pub access: &'a dyn SpellAccessProvider,
    pub catalog: &'a dyn SpellCatalog,
}

impl<'a> SpellRules<'a> {
    pub fn new(access: &'a dyn SpellAccessProvider, catalog: &'a dyn SpellCatalog) -> Self {
        Self { access, catalog }
    }
}

impl fmt::Debug for SpellRules<'_> {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("SpellRules").finish_non_exhaustive()
    }
}

/// What a conflict is about.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum ConflictKind {
    Skill,
    Proficiency,
    Language,
    Feature,
    SpellLimit,
}

impl ConflictKind {
    /// Kinds checked for duplicate contributions, in report order.
    pub const DUPLICATE_KINDS: [ConflictKind; 4] =
        [Self::Skill, Self::Proficiency, Self::Language, Self::Feature];

    /// Record field a duplicate of this kind lives in.
    pub fn field(&self) -> Option<Field> {
        match self {
            Self::Skill => Some(Field::Skills),
            Self::Proficiency => Some(Field::Proficiencies),
            Self::Language => Some(Field::Languages),
            Self::Feature => Some(Field::Features),
            Self::SpellLimit => None,
        }
    }

    pub fn as_str(&self) -> &'static str {
        match self {
            Self::Skill => "skill",
            Self::Proficiency => "proficiency",
            Self::Language => "language",
            Self::Feature => "feature",
            Self::SpellLimit => "spell_limit",
        }
    }
}

impl fmt::Display for ConflictKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.as_str())
    }
}

/// One value contributed by more than one scope.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct DuplicateConflict {
    pub kind: ConflictKind,
    pub value: String,
    /// Contributing scopes, in ledger order
    pub sources: Vec<ScopeId>,
    pub affected_tabs: Vec<Tab>,
}

/// Spell selections over the character's limits.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct SpellLimitConflict {
    pub violations: Vec<SpellLimitViolation>,
    /// Class and subclass the limits were computed for
    pub causes: Vec<String>,
    /// The spell selection scope, when recorded
    pub sources: Vec<ScopeId>,
    pub affected_tabs: Vec<Tab>,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
#[serde(tag = "type", rename_all = "snake_case")]
pub enum Conflict {
    Duplicate(DuplicateConflict),
    SpellLimit(SpellLimitConflict),
}

impl Conflict {
    pub fn kind(&self) -> ConflictKind {
        match self {
            Self::Duplicate(c) => c.kind,
            Self::SpellLimit(_) => ConflictKind::SpellLimit,
        }
    }

    /// The conflicting value; `None` for spell limits.
    pub fn value(&self) -> Option<&str> {
        match self {
            Self::Duplicate(c) => Some(&c.value),
            Self::SpellLimit(_) => None,
        }
    }

    pub fn sources(&self) -> &[ScopeId] {
        match self {
            Self::Duplicate(c) => &c.sources,
            Self::SpellLimit(c) => &c.sources,
        }
    }

    pub fn affected_tabs(&self) -> &[Tab] {
        match self {
            Self::Duplicate(c) => &c.affected_tabs,
            Self::SpellLimit(c) => &c.affected_tabs,
        }
    }

    /// Whether `other` reports the same problem (same kind and value).
    pub fn same_issue(&self, other: &Conflict) -> bool {
        self.kind() == other.kind() && self.value() == other.value()
    }
}

impl fmt::Display for Conflict {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::Duplicate(c) => write!(
                f,
                "{} '{}' granted by {} sources",
                c.kind,
                c.value,
                c.sources.len()
            ),
            Self::SpellLimit(c) => {
                let parts: Vec<String> = c
                    .violations
                    .iter()
                    .map(|v| format!("{} {}/{}", v.level, v.selected, v.limit))
                    .collect();
                write!(f, "spell limits exceeded ({})", parts.join(", "))
            }
        }
    }
}

#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct ConflictReport {
    pub has_conflicts: bool,
    pub conflicts: Vec<Conflict>,
    pub tabs_needing_attention: Vec<Tab>,
}

impl ConflictReport {
    fn from_conflicts(conflicts: Vec<Conflict>) -> Self {
        let mut tabs = Vec::new();
        for tab in conflicts.iter().flat_map(|c| c.affected_tabs()) {
            if !tabs.contains(tab) {
                tabs.push(*tab);
            }
        }
        Self {
            has_conflicts: !conflicts.is_empty(),
            conflicts,
            tabs_needing_attention: tabs,
        }
    }
}

/// Detect every conflict on the record.
///
/// Duplicates come first, ordered by kind then value; a spell-limit
/// conflict, if any, comes last.
pub fn detect_conflicts(record: &CharacterRecord, spells: SpellRules<'_>) -> ConflictReport {
    let mut index: BTreeMap<(ConflictKind, &str), Vec<&ScopeId>> = BTreeMap::new();

    for contribution in record.provenance().iter() {
        for kind in ConflictKind::DUPLICATE_KINDS {
            let Some(values) = kind
                .field()
                .and_then(|field| contribution.changes.get(field))
                .and_then(|value| value.as_strings())
            else {
                continue;
            };
            for value in values {
                let sources = index.entry((kind, value.as_str())).or_default();
                if !sources.contains(&&contribution.scope) {
                    sources.push(&contribution.scope);
                }
            }
        }
    }

    let mut conflicts: Vec<Conflict> = index
        .into_iter()
        .filter(|(_, sources)| sources.len() > 1)
        .map(|((kind, value), sources)| {
            let sources: Vec<ScopeId> = sources.into_iter().cloned().collect();
            Conflict::Duplicate(DuplicateConflict {
                kind,
                value: value.to_string(),
                affected_tabs: affected_tabs(record, &sources),
                sources,
            })
        })
        .collect();

    let violations = spell_limit_violations(record, spells);
    if !violations.is_empty() {
        let sheet = record.sheet();
        let causes = [sheet.class(), sheet.subclass()]
            .into_iter()
            .flatten()
            .map(str::to_string)
            .collect();
        let selections = ScopeId::spell_selections();
        let sources = if record.provenance().contains(&selections) {
            vec![selections]
        } else {
            Vec::new()
        };
        conflicts.push(Conflict::SpellLimit(SpellLimitConflict {
            violations,
            causes,
            sources,
            affected_tabs: vec![Tab::Spells],
        }));
    }

    tracing::trace!(count = conflicts.len(), "Detected conflicts");

    ConflictReport::from_conflicts(conflicts)
}

/// Tabs of the given sources, tabs the user can change first.
fn affected_tabs(record: &CharacterRecord, sources: &[ScopeId]) -> Vec<Tab> {
    let metas: Vec<_> = sources
        .iter()
        .filter_map(|scope| record.contribution(scope))
        .map(|c| &c.meta)
        .collect();

    let mut tabs = Vec::new();
    let changeable = metas.iter().filter(|m| m.user_selectable);
    let fixed = metas.iter().filter(|m| !m.user_selectable);
    for meta in changeable.chain(fixed) {
        if !tabs.contains(&meta.tab) {
            tabs.push(meta.tab);
        }
    }
    tabs
}

#[cfg(test)]
pub(crate) mod test_support {
    use crate::spellcasting::{MockSpellAccessProvider, MockSpellCatalog, SpellAccess};

    /// Spell ports with no casters and no spells.
    pub fn no_spells() -> (MockSpellAccessProvider, MockSpellCatalog) {
        let mut access = MockSpellAccessProvider::new();
        access.expect_spell_access().returning(|_| Vec::<SpellAccess>::new());
        let mut catalog = MockSpellCatalog::new();
        catalog.expect_spells_of_level().returning(|_| Vec::new());
        (access, catalog)
    }
}
