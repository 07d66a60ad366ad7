//! Resolution advisor: what the user (or auto-resolve) can do about a conflict.
//!
//! A conflict with both rule-granted and user-picked sources is fixable
//! without losing anything the rules grant: revert the user's pick and let
//! them choose again. Conflicts whose sources are all granted, or all picked,
//! need a human decision and are never touched automatically.

use serde::Serialize;

use super::{detect_conflicts, AlternativeTable, Conflict, ConflictKind, SpellRules};
use crate::record::CharacterRecord;
use crate::value_objects::{ScopeId, ScopeMeta, SPELL_SELECTIONS, BEAST_SELECTIONS};

#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
#[serde(tag = "type", rename_all = "snake_case")]
pub enum ResolutionAction {
    RevertScope {
        scope: ScopeId,
        description: String,
    },
    SuggestAlternative {
        kind: ConflictKind,
        value: String,
        alternatives: Vec<String>,
        description: String,
    },
}

impl ResolutionAction {
    pub fn description(&self) -> &str {
        match self {
            Self::RevertScope { description, .. } => description,
            Self::SuggestAlternative { description, .. } => description,
        }
    }
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct ResolutionOptions {
    pub conflict: Conflict,
    pub possible_actions: Vec<ResolutionAction>,
    pub recommended_action: Option<ResolutionAction>,
}

#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct AutoResolveOutcome {
    pub resolved: usize,
    pub remaining: Vec<Conflict>,
}

/// Human-readable name for a scope.
///
/// Uses the label declared with the scope when there is one, otherwise
/// formats the id: `class:Bard` reads "Bard (class)" and
/// `feature:Skill Proficiencies:0` reads "Skill Proficiencies (choice 1)".
pub fn describe_scope(scope: &ScopeId, meta: Option<&ScopeMeta>) -> String {
    if let Some(label) = meta.and_then(|m| m.label.as_deref()) {
        return label.to_string();
    }

    let id = scope.as_str();
    match id {
        SPELL_SELECTIONS => return "Spell selections".to_string(),
        BEAST_SELECTIONS => return "Beast selections".to_string(),
        _ => {}
    }
    if let Some(n) = id
        .strip_prefix("class_equipment_")
        .and_then(|n| n.parse::<usize>().ok())
    {
        return format!("Class equipment (option {})", n + 1);
    }

    let parts: Vec<&str> = id.split(':').collect();
    match parts.as_slice() {
        [_, name, index] => match index.parse::<usize>() {
            Ok(i) => format!("{} (choice {})", name, i + 1),
            Err(_) => id.to_string(),
        },
        [category, name] => format!("{} ({})", name, category),
        _ => id.to_string(),
    }
}

/// Sources split into (user-selectable, rule-granted), in source order.
fn split_sources<'c>(
    record: &CharacterRecord,
    conflict: &'c Conflict,
) -> (Vec<&'c ScopeId>, Vec<&'c ScopeId>) {
    conflict.sources().iter().partition(|scope| {
        record
            .contribution(scope)
            .is_some_and(|c| c.meta.user_selectable)
    })
}

fn is_mixed(record: &CharacterRecord, conflict: &Conflict) -> bool {
    let (user, auto) = split_sources(record, conflict);
    !user.is_empty() && !auto.is_empty()
}

/// Every action available for a conflict, and the one to suggest first.
pub fn resolution_options(
    record: &CharacterRecord,
    conflict: &Conflict,
    alternatives: &AlternativeTable,
) -> ResolutionOptions {
    let mut actions: Vec<ResolutionAction> = conflict
        .sources()
        .iter()
        .map(|scope| {
            let name = describe_scope(scope, record.contribution(scope).map(|c| &c.meta));
            let description = match conflict.value() {
                Some(value) => format!("Remove {} from {}", value, name),
                None => format!("Clear {}", name),
            };
            ResolutionAction::RevertScope {
                scope: scope.clone(),
                description,
            }
        })
        .collect();

    let (user, _) = split_sources(record, conflict);
    let mut suggestion = None;
    if let (Some(value), Some(field), false) =
        (conflict.value(), conflict.kind().field(), user.is_empty())
    {
        let taken = record.sheet().strings(field).unwrap_or_default();
        let options: Vec<String> = alternatives
            .alternatives(conflict.kind(), value)
            .into_iter()
            .filter(|alt| !taken.iter().any(|t| t == alt))
            .map(str::to_string)
            .collect();
        if !options.is_empty() {
            let action = ResolutionAction::SuggestAlternative {
                kind: conflict.kind(),
                value: value.to_string(),
                alternatives: options,
                description: format!("Pick a different {} instead of {}", conflict.kind(), value),
            };
            suggestion = Some(action.clone());
            actions.push(action);
        }
    }

    let recommended_action = match suggestion {
        Some(action) if is_mixed(record, conflict) => Some(action),
        _ => actions.first().cloned(),
    };

    ResolutionOptions {
        conflict: conflict.clone(),
        possible_actions: actions,
        recommended_action,
    }
}

/// Revert the user's side of every mixed conflict.
///
/// Only scopes that pass `can_safely_revert_scope` are touched.
pub fn auto_resolve_conflicts(
    record: &mut CharacterRecord,
    spells: SpellRules<'_>,
) -> AutoResolveOutcome {
    let report = detect_conflicts(record, spells);

    let mut resolved = 0;
    for conflict in &report.conflicts {
        if !is_mixed(record, conflict) {
            continue;
        }
        let (user, _) = split_sources(record, conflict);
        for scope in user {
            if record.can_safely_revert_scope(scope) && record.smart_revert_scope(scope) {
                resolved += 1;
            }
        }
    }

    let remaining = detect_conflicts(record, spells).conflicts;

    tracing::info!(
        character_id = %record.id(),
        resolved,
        remaining = remaining.len(),
        "Auto-resolved conflicts"
    );

    AutoResolveOutcome {
        resolved,
        remaining,
    }
}

/// Revert one source of a conflict and report whether the conflict is gone.
pub fn resolve_conflict_by_reverting(
    record: &mut CharacterRecord,
    spells: SpellRules<'_>,
    conflict: &Conflict,
    scope: &ScopeId,
) -> bool {
    if !conflict.sources().contains(scope) {
        tracing::warn!(
            scope = %scope,
            conflict = %conflict,
            "Scope is not a source of the conflict"
        );
        return false;
    }

    record.smart_revert_scope(scope);

    let report = detect_conflicts(record, spells);
    !report.conflicts.iter().any(|c| c.same_issue(conflict))
}

/// Whether any conflict needs the user to decide.
///
/// Spell-limit conflicts always do: their only source is the user's own
/// spell selection.
pub fn has_manual_conflicts(record: &CharacterRecord, spells: SpellRules<'_>) -> bool {
    detect_conflicts(record, spells)
        .conflicts
        .iter()
        .any(|c| !is_mixed(record, c))
}
