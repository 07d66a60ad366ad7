//! Spell selections against the character's spell-access limits.

use serde::Serialize;

use super::SpellRules;
use crate::record::{CharacterRecord, Field, FieldValue};
use crate::spellcasting::{level_of, CasterProfile, SpellAccess, SpellLevelBucket};
use crate::value_objects::ScopeId;

/// Selected spells over the limit in one bucket.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct SpellLimitViolation {
    pub level: SpellLevelBucket,
    pub selected: u32,
    pub limit: u32,
    pub excess: u32,
}

#[derive(Debug, Default, PartialEq, Eq)]
struct Limits {
    cantrips: u32,
    level1: u32,
    level2: u32,
    shared: u32,
    shared_pool: bool,
}

impl Limits {
    fn from_access(entries: &[SpellAccess]) -> Self {
        let mut limits = Limits::default();
        for entry in entries.iter().filter(|e| e.source.counts_toward_limits()) {
            if let Err(e) = entry.validate() {
                tracing::warn!(error = %e, "Ignoring spell access entry");
                continue;
            }
            limits.cantrips += entry.cantrip_choices();
            let leveled = entry.leveled_choices();
            if entry.shared_pool {
                limits.shared_pool = true;
                limits.shared += leveled;
            } else if entry.spell_level == 2 {
                limits.level2 += leveled;
            } else {
                limits.level1 += leveled;
            }
        }
        limits
    }
}

#[derive(Debug, Default)]
struct Selected {
    cantrips: u32,
    level1: u32,
    level2: u32,
}

/// Compare the spell selection scope against the character's limits.
///
/// Only class, subclass and feature access counts. Spells above level 2, or
/// missing from the catalog, are not counted. A character with no counted
/// access has no limits to break.
pub fn spell_limit_violations(
    record: &CharacterRecord,
    spells: SpellRules<'_>,
) -> Vec<SpellLimitViolation> {
    let sheet = record.sheet();
    let profile = CasterProfile {
        class: sheet.class().map(str::to_string),
        subclass: sheet.subclass().map(str::to_string),
        race: sheet.race().map(str::to_string),
    };

    let access = spells.access.spell_access(&profile);
    if !access.iter().any(|e| e.source.counts_toward_limits()) {
        return Vec::new();
    }
    let limits = Limits::from_access(&access);

    let selections = ScopeId::spell_selections();
    let Some(FieldValue::Spells(chosen)) = record
        .contribution(&selections)
        .and_then(|c| c.changes.get(Field::Spells))
    else {
        return Vec::new();
    };

    let mut selected = Selected::default();
    for spell in chosen {
        match level_of(spells.catalog, &spell.name) {
            Some(0) => selected.cantrips += 1,
            Some(1) => selected.level1 += 1,
            Some(2) => selected.level2 += 1,
            _ => {}
        }
    }

    let mut violations = Vec::new();
    let mut check = |level: SpellLevelBucket, selected: u32, limit: u32| {
        if selected > limit {
            violations.push(SpellLimitViolation {
                level,
                selected,
                limit,
                excess: selected - limit,
            });
        }
    };

    check(SpellLevelBucket::Cantrips, selected.cantrips, limits.cantrips);
    if limits.shared_pool {
        check(
            SpellLevelBucket::Leveled,
            selected.level1 + selected.level2,
            limits.shared + limits.level1 + limits.level2,
        );
    } else {
        check(SpellLevelBucket::Level1, selected.level1, limits.level1);
        check(SpellLevelBucket::Level2, selected.level2, limits.level2);
    }

    violations
}
